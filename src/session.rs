//! The typing loop.
//!
//! A [`Session`] owns everything the loop mutates: the input cursor, the log of typed
//! characters, the outstanding correction and the random source. The only state shared with
//! other threads is the [`ModeControl`].

use std::sync::Arc;

use anyhow::{anyhow, Result};
use rand::Rng;

use crate::cadence::Cadence;
use crate::config::{validate_config, TypistConfig};
use crate::correction::{CorrectionScheduler, PendingCorrection};
use crate::mode::{ModeControl, RunMode};
use crate::model::Action;
use crate::output::{print_trace_line, ActionSink};
use crate::pause::PauseModel;
use crate::typo::{TypoGenerator, TypoPlan, TypoShape};

/// Backspaces run a little faster than typing.
const BACKSPACE_PACE: f64 = 0.6;
/// Gap between the toggle keystroke landing and erasing it.
const TOGGLE_ERASE_DELAY_MS: u64 = 10;

/// The text being typed and how far typing has got.
#[derive(Debug, Clone)]
pub struct InputStream {
    chars: Vec<char>,
    cursor: usize,
}

impl InputStream {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.chars.len()
    }

    pub fn get(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    pub fn current(&self) -> Option<char> {
        self.get(self.cursor)
    }

    pub fn lookahead(&self) -> Option<char> {
        self.get(self.cursor + 1)
    }

    fn advance(&mut self, n: usize) {
        self.cursor = (self.cursor + n).min(self.chars.len());
    }
}

/// Every printable character sent so far, mistakes included. Append only.
#[derive(Debug, Default, Clone)]
pub struct TypedBuffer {
    chars: Vec<char>,
}

impl TypedBuffer {
    fn push(&mut self, c: char) {
        self.chars.push(c);
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn as_slice(&self) -> &[char] {
        &self.chars
    }

    /// The most recent `n` entries, oldest first.
    pub fn last(&self, n: usize) -> &[char] {
        &self.chars[self.chars.len().saturating_sub(n)..]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub typos: usize,
    pub fixed_immediately: usize,
    pub fixed_later: usize,
    pub left_uncorrected: usize,
}

/// What one call to [`Session::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Idle,
    Typed(char),
    Typo(TypoPlan),
    Corrected,
    Finished,
}

pub struct Session<S, R> {
    cfg: TypistConfig,
    cadence: Cadence,
    pauses: PauseModel,
    typos: TypoGenerator,
    scheduler: CorrectionScheduler,
    stream: InputStream,
    typed: TypedBuffer,
    control: Arc<ModeControl>,
    sink: S,
    rng: R,
    trace: bool,
    stats: SessionStats,
}

impl<S: ActionSink, R: Rng> Session<S, R> {
    pub fn new(
        text: &str,
        cfg: TypistConfig,
        control: Arc<ModeControl>,
        sink: S,
        rng: R,
    ) -> Result<Self> {
        validate_config(&cfg)?;

        Ok(Self {
            cadence: Cadence::from_config(&cfg),
            pauses: PauseModel::from_config(&cfg),
            typos: TypoGenerator::from_config(&cfg)?,
            scheduler: CorrectionScheduler::new(),
            stream: InputStream::new(text),
            typed: TypedBuffer::default(),
            control,
            sink,
            rng,
            trace: false,
            stats: SessionStats::default(),
            cfg,
        })
    }

    /// Print a console line for each mistake and fix.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn stream(&self) -> &InputStream {
        &self.stream
    }

    pub fn typed(&self) -> &TypedBuffer {
        &self.typed
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Done once every character is typed and no fix is outstanding.
    pub fn is_done(&self) -> bool {
        self.stream.is_finished() && !self.scheduler.is_pending()
    }

    /// Runs until the text is fully typed, or fails with "aborted" on a stop request.
    pub fn run(&mut self) -> Result<SessionStats> {
        while !self.is_done() {
            self.step()?;
        }
        self.erase_toggle_keys()?;
        Ok(self.stats)
    }

    /// One loop iteration: idle while paused, otherwise a fix, a mistake or one character.
    pub fn step(&mut self) -> Result<Step> {
        if self.control.stop_requested() {
            return Err(anyhow!("aborted"));
        }

        self.erase_toggle_keys()?;

        if self.is_done() {
            return Ok(Step::Finished);
        }

        if self.control.mode() == RunMode::Paused {
            self.sink
                .perform(Action::wait_secs(self.cfg.idle_poll_secs))?;
            return Ok(Step::Idle);
        }

        if let Some(due) = self.scheduler.take_due() {
            self.run_correction(due)?;
            return Ok(Step::Corrected);
        }

        let Some(current) = self.stream.current() else {
            // Text ran out before the mistake was noticed; fix it now.
            if let Some(late) = self.scheduler.take() {
                self.run_correction(late)?;
            }
            return Ok(Step::Corrected);
        };

        if !self.scheduler.is_pending() {
            let next = self.stream.lookahead();
            if let Some(plan) = self.typos.maybe_typo(current, next, &mut self.rng) {
                self.make_typo(plan, current, next)?;
                return Ok(Step::Typo(plan));
            }
        }

        let position = self.stream.cursor();
        self.emit(current, position)?;
        self.stream.advance(1);
        self.scheduler.tick();
        self.maybe_pause(current)?;

        Ok(Step::Typed(current))
    }

    fn wait(&mut self, secs: f64) -> Result<()> {
        let action = Action::wait_secs(secs);
        if action == (Action::Wait { ms: 0 }) {
            return Ok(());
        }
        self.sink.perform(action)
    }

    fn char_delay(&self, position: usize) -> f64 {
        self.cadence
            .delay(position, self.cfg.base_chars_per_minute())
    }

    /// Types `c` as if it were the character at `position` and waits the cadence delay.
    fn emit(&mut self, c: char, position: usize) -> Result<()> {
        self.erase_toggle_keys()?;
        self.sink.perform(Action::Char { ch: c })?;
        self.typed.push(c);
        self.wait(self.char_delay(position))
    }

    fn backspace(&mut self, position: usize) -> Result<()> {
        self.erase_toggle_keys()?;
        self.sink.perform(Action::Backspace)?;
        self.wait(self.char_delay(position) * BACKSPACE_PACE)
    }

    fn maybe_pause(&mut self, c: char) -> Result<()> {
        let secs = self.pauses.maybe_pause(c, &mut self.rng)?;
        self.wait(secs)
    }

    /// Backspaces over every toggle keystroke that landed since the last check.
    ///
    /// Runs before each key the session sends, so a toggle pressed mid-step is removed before
    /// anything is typed after it. Call once more after the listener is closed to catch a
    /// press that arrived after [`Session::run`] returned.
    pub fn erase_toggle_keys(&mut self) -> Result<()> {
        loop {
            let n = self.control.take_backspace_requests();
            if n == 0 {
                return Ok(());
            }
            for _ in 0..n {
                self.sink.perform(Action::Wait {
                    ms: TOGGLE_ERASE_DELAY_MS,
                })?;
                self.sink.perform(Action::Backspace)?;
            }
        }
    }

    fn make_typo(&mut self, plan: TypoPlan, current: char, next: Option<char>) -> Result<()> {
        let start = self.stream.cursor();
        let shown: Vec<char> = match (plan.shape, next) {
            (TypoShape::Double, _) => vec![current, current],
            (TypoShape::Skip, Some(next)) => vec![next],
            (TypoShape::Swap, Some(next)) => vec![next, current],
            (TypoShape::Adjacent { wrong }, _) => vec![wrong],
            (TypoShape::Skip | TypoShape::Swap, None) => {
                return Err(anyhow!("{} typo planned at the end of the text", plan.shape.name()))
            }
        };

        for (offset, c) in shown.iter().enumerate() {
            self.emit(*c, start + offset)?;
        }
        self.stream.advance(plan.shape.consumed());
        self.stats.typos += 1;

        let erase = plan.shape.emitted() - plan.shape.correct_prefix();
        let fix_from = start + plan.shape.correct_prefix();

        let shown: String = shown.into_iter().collect();
        log::debug!(
            "typo {} at {start}: {shown:?} (corrected={}, delay={})",
            plan.shape.name(),
            plan.corrected,
            plan.delay
        );
        if self.trace {
            let fate = match (plan.corrected, plan.delay) {
                (false, _) => "left in".to_string(),
                (true, 0) => "fixing now".to_string(),
                (true, d) => format!("fixing after {d} more"),
            };
            print_trace_line(&format!(
                "Typo {} {:?}, {fate}",
                plan.shape.name(),
                shown
            ));
        }

        if plan.is_immediate() {
            self.erase_and_retype(erase, fix_from)?;
            self.stats.fixed_immediately += 1;
        } else if plan.corrected {
            self.scheduler.schedule(plan.delay, erase, fix_from)?;
        } else {
            self.stats.left_uncorrected += 1;
        }

        let last = start + plan.shape.consumed() - 1;
        if let Some(c) = self.stream.get(last) {
            self.maybe_pause(c)?;
        }
        Ok(())
    }

    fn run_correction(&mut self, pending: PendingCorrection) -> Result<()> {
        let end = self.stream.cursor();
        if self.trace {
            let erased: String = self.typed.last(pending.erase).iter().collect();
            let retyped: String = (pending.source_start..end)
                .filter_map(|i| self.stream.get(i))
                .collect();
            print_trace_line(&format!("Fix {erased:?}, retyping {retyped:?}"));
        }
        log::debug!(
            "correction: erase {} and retype from {}",
            pending.erase,
            pending.source_start
        );

        self.erase_and_retype(pending.erase, pending.source_start)?;
        self.stats.fixed_later += 1;
        Ok(())
    }

    /// Hesitates, backspaces `erase` characters, then retypes the input from `from` up to the
    /// cursor.
    fn erase_and_retype(&mut self, erase: usize, from: usize) -> Result<()> {
        let end = self.stream.cursor();
        self.wait(self.cfg.realize_delay_secs)?;

        for _ in 0..erase {
            self.backspace(end)?;
        }

        for position in from..end {
            let c = self
                .stream
                .get(position)
                .ok_or_else(|| anyhow!("retype position {position} past end of text"))?;
            self.emit(c, position)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::output::Recorder;

    fn session(text: &str, cfg: TypistConfig) -> Session<Recorder<crate::output::NullSink>, StdRng> {
        let control = Arc::new(ModeControl::starting_in(RunMode::Typing));
        Session::new(text, cfg, control, Recorder::dry(), StdRng::seed_from_u64(0)).unwrap()
    }

    #[test]
    fn input_stream_lookahead_stops_at_end() {
        let mut s = InputStream::new("ab");
        assert_eq!(s.current(), Some('a'));
        assert_eq!(s.lookahead(), Some('b'));
        s.advance(1);
        assert_eq!(s.lookahead(), None);
        s.advance(5);
        assert_eq!(s.cursor(), 2);
        assert!(s.is_finished());
    }

    #[test]
    fn typed_buffer_last_returns_tail() {
        let mut b = TypedBuffer::default();
        for c in "hello".chars() {
            b.push(c);
        }
        assert_eq!(b.last(3), &['l', 'l', 'o']);
        assert_eq!(b.last(10).len(), 5);
    }

    #[test]
    fn empty_text_is_done_immediately() {
        let mut s = session("", TypistConfig::default());
        assert!(s.is_done());
        assert_eq!(s.step().unwrap(), Step::Finished);
        assert!(s.sink().actions().is_empty());
    }

    #[test]
    fn stop_request_aborts_the_run() {
        let mut s = session("abc", TypistConfig::default());
        s.control.request_stop();
        let err = s.run().unwrap_err();
        assert_eq!(format!("{err}"), "aborted");
    }

    #[test]
    fn toggle_after_the_run_is_still_erased() {
        let mut s = session("ok", TypistConfig::default());
        s.run().unwrap();
        let typed = s.sink().actions().len();

        s.control.toggle();
        s.erase_toggle_keys().unwrap();
        assert_eq!(
            &s.sink().actions()[typed..],
            &[Action::Wait { ms: TOGGLE_ERASE_DELAY_MS }, Action::Backspace]
        );
    }
}
