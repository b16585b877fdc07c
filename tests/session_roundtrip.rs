use std::sync::Arc;

use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use typist::config::{PauseSettings, ShapeWeights, TypistConfig};
use typist::keyboard::qwerty_neighbors;
use typist::mode::{ModeControl, RunMode};
use typist::model::Action;
use typist::output::{NullSink, Recorder};
use typist::session::{Session, SessionStats, Step};
use typist::sim::{keys_only, simulate_visible_text, stats};

const SAMPLE: &str = "The quick brown fox, jumps over the lazy dog.\nThen it naps; twice!\n\tDone?";

#[derive(Debug, Clone, Copy)]
enum Only {
    Double,
    Skip,
    Swap,
    Adjacent,
}

fn only(shape: Only) -> ShapeWeights {
    let mut w = ShapeWeights {
        double: 0.0,
        skip: 0.0,
        swap: 0.0,
        adjacent: 0.0,
    };
    match shape {
        Only::Double => w.double = 1.0,
        Only::Skip => w.skip = 1.0,
        Only::Swap => w.swap = 1.0,
        Only::Adjacent => w.adjacent = 1.0,
    }
    w
}

fn delay_exactly(n: usize) -> [f64; 6] {
    let mut weights = [0.0; 6];
    weights[n] = 1.0;
    weights
}

fn every_char_wrong(shape: Only, corrected: bool, delay: usize) -> TypistConfig {
    TypistConfig {
        typo_probability: 1.0,
        uncorrected_probability: if corrected { 0.0 } else { 1.0 },
        shape_weights: only(shape),
        correction_delay_weights: delay_exactly(delay),
        ..Default::default()
    }
}

fn typing_session(
    text: &str,
    cfg: TypistConfig,
    seed: u64,
) -> Session<Recorder<NullSink>, StdRng> {
    let control = Arc::new(ModeControl::starting_in(RunMode::Typing));
    Session::new(
        text,
        cfg,
        control,
        Recorder::dry(),
        StdRng::seed_from_u64(seed),
    )
    .unwrap()
}

fn run(text: &str, cfg: TypistConfig, seed: u64) -> (Vec<Action>, SessionStats) {
    let mut session = typing_session(text, cfg, seed);
    let stats = session.run().unwrap();
    (session.into_sink().into_actions(), stats)
}

fn visible(text: &str, cfg: TypistConfig) -> String {
    simulate_visible_text(&run(text, cfg, 0).0)
}

fn chars(s: &str) -> Vec<Action> {
    s.chars().map(|ch| Action::Char { ch }).collect()
}

#[test]
fn hi_there_with_an_immediate_double_starts_h_h_backspace() {
    let (actions, stats) = run("hi there", every_char_wrong(Only::Double, true, 0), 0);

    let keys = keys_only(&actions);
    assert_eq!(
        &keys[..3],
        &[
            Action::Char { ch: 'h' },
            Action::Char { ch: 'h' },
            Action::Backspace
        ]
    );
    assert_eq!(simulate_visible_text(&actions), "hi there");
    assert_eq!(stats.typos, 8);
    assert_eq!(stats.fixed_immediately, 8);
}

#[test]
fn zero_typo_probability_types_the_text_verbatim() {
    let cfg = TypistConfig {
        typo_probability: 0.0,
        ..Default::default()
    };
    for seed in 0..5 {
        let (actions, stats) = run(SAMPLE, cfg.clone(), seed);
        assert_eq!(keys_only(&actions), chars(SAMPLE));
        assert_eq!(stats, SessionStats::default());
    }
}

#[test]
fn immediate_fixes_reproduce_the_text_for_every_shape() {
    for shape in [Only::Double, Only::Skip, Only::Swap, Only::Adjacent] {
        assert_eq!(
            visible(SAMPLE, every_char_wrong(shape, true, 0)),
            SAMPLE,
            "shape {shape:?}"
        );
    }
}

#[test]
fn deferred_fixes_reproduce_the_text_for_every_shape_and_delay() {
    for shape in [Only::Double, Only::Skip, Only::Swap, Only::Adjacent] {
        for delay in 1..=5 {
            let (actions, stats) = run(SAMPLE, every_char_wrong(shape, true, delay), 7);
            assert_eq!(
                simulate_visible_text(&actions),
                SAMPLE,
                "shape {shape:?}, delay {delay}"
            );
            assert_eq!(stats.fixed_immediately, 0);
            assert_eq!(stats.fixed_later, stats.typos);
            assert_eq!(stats.left_uncorrected, 0);
        }
    }
}

#[test]
fn default_mix_always_ends_with_the_source_text_when_everything_is_fixed() {
    let cfg = TypistConfig {
        typo_probability: 0.3,
        uncorrected_probability: 0.0,
        ..Default::default()
    };
    for seed in 0..50 {
        let (actions, _) = run(SAMPLE, cfg.clone(), seed);
        assert_eq!(simulate_visible_text(&actions), SAMPLE, "seed {seed}");
    }
}

#[test]
fn mistake_near_the_end_is_fixed_before_finishing() {
    // Delay 5 on a two-character text can never be reached by typing alone.
    let (actions, stats) = run("ab", every_char_wrong(Only::Swap, true, 5), 0);
    assert_eq!(simulate_visible_text(&actions), "ab");
    assert_eq!(stats.fixed_later, 1);
}

#[test]
fn uncorrected_double_duplicates_each_character() {
    assert_eq!(
        visible("abc", every_char_wrong(Only::Double, false, 0)),
        "aabbcc"
    );
}

#[test]
fn uncorrected_skip_drops_characters() {
    assert_eq!(visible("abcd", every_char_wrong(Only::Skip, false, 0)), "bd");
}

#[test]
fn uncorrected_swap_transposes_pairs() {
    assert_eq!(
        visible("abcd", every_char_wrong(Only::Swap, false, 0)),
        "badc"
    );
}

#[test]
fn uncorrected_adjacent_hits_a_neighbouring_key() {
    let typed = visible("a", every_char_wrong(Only::Adjacent, false, 0));
    let typed: Vec<char> = typed.chars().collect();
    assert_eq!(typed.len(), 1);
    assert!(qwerty_neighbors('a').unwrap().contains(&typed[0]));
}

#[test]
fn skip_and_swap_never_happen_on_the_last_character() {
    assert_eq!(visible("abc", every_char_wrong(Only::Swap, false, 0)), "bac");
    assert_eq!(visible("a", every_char_wrong(Only::Skip, false, 0)), "a");
    assert_eq!(visible("a", every_char_wrong(Only::Swap, false, 0)), "a");
}

#[test]
fn even_toggles_while_paused_only_erase_the_toggle_keys() {
    let control = Arc::new(ModeControl::new());
    let mut session = Session::new(
        "hello",
        TypistConfig::default(),
        Arc::clone(&control),
        Recorder::dry(),
        StdRng::seed_from_u64(0),
    )
    .unwrap();

    control.toggle();
    control.toggle();
    for _ in 0..5 {
        assert_eq!(session.step().unwrap(), Step::Idle);
    }

    assert_eq!(control.mode(), RunMode::Paused);
    assert_eq!(session.stream().cursor(), 0);
    assert!(session.typed().is_empty());

    let actions = session.sink().actions();
    assert!(actions
        .iter()
        .all(|a| matches!(a, Action::Wait { .. } | Action::Backspace)));
    assert_eq!(stats(actions).backspaces, 2);
}

#[test]
fn pausing_mid_text_resumes_where_it_stopped() {
    let cfg = TypistConfig {
        typo_probability: 0.0,
        ..Default::default()
    };
    let control = Arc::new(ModeControl::starting_in(RunMode::Typing));
    let mut session = Session::new(
        "hello",
        cfg,
        Arc::clone(&control),
        Recorder::dry(),
        StdRng::seed_from_u64(0),
    )
    .unwrap();

    assert_eq!(session.step().unwrap(), Step::Typed('h'));
    assert_eq!(session.step().unwrap(), Step::Typed('e'));

    control.toggle();
    assert_eq!(session.step().unwrap(), Step::Idle);
    assert_eq!(session.step().unwrap(), Step::Idle);
    assert_eq!(session.stream().cursor(), 2);

    control.toggle();
    session.run().unwrap();

    let keys = keys_only(session.sink().actions());
    assert_eq!(
        keys,
        vec![
            Action::Char { ch: 'h' },
            Action::Char { ch: 'e' },
            Action::Backspace,
            Action::Backspace,
            Action::Char { ch: 'l' },
            Action::Char { ch: 'l' },
            Action::Char { ch: 'o' },
        ]
    );
    assert_eq!(session.typed().as_slice(), &['h', 'e', 'l', 'l', 'o']);
}

#[test]
fn waits_follow_the_cadence_when_nothing_else_happens() {
    let no_pause = PauseSettings::new(0.0, 0.2, 0.6);
    let cfg = TypistConfig {
        typo_probability: 0.0,
        space_pause: no_pause,
        punctuation_pause: no_pause,
        newline_pause: no_pause,
        ..Default::default()
    };
    let cadence = typist::cadence::Cadence::from_config(&cfg);
    let text = "typing along at a steady pace";

    let (actions, _) = run(text, cfg.clone(), 0);
    let waits: Vec<u64> = actions
        .iter()
        .filter_map(|a| match a {
            Action::Wait { ms } => Some(*ms),
            _ => None,
        })
        .collect();
    let expected: Vec<u64> = (0..text.chars().count())
        .map(|i| match Action::wait_secs(cadence.delay(i, cfg.base_chars_per_minute())) {
            Action::Wait { ms } => ms,
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(waits, expected);
}

#[test]
fn same_seed_gives_the_same_actions() {
    let cfg = TypistConfig {
        typo_probability: 0.2,
        ..Default::default()
    };
    assert_eq!(run(SAMPLE, cfg.clone(), 42).0, run(SAMPLE, cfg, 42).0);
}

/// Models an editor: keys land in `screen`, and the user presses the toggle key while the
/// session is waiting.
struct ToggleDuringWaits {
    control: Arc<ModeControl>,
    screen: Vec<char>,
    waits: usize,
}

impl typist::output::ActionSink for ToggleDuringWaits {
    fn perform(&mut self, action: Action) -> anyhow::Result<()> {
        match action {
            Action::Char { ch } => self.screen.push(ch),
            Action::Backspace => {
                self.screen.pop();
            }
            Action::Wait { .. } => {
                self.waits += 1;
                // Pause on the first wait, resume on the next wait seen while paused.
                if self.waits == 1 || self.control.mode() == RunMode::Paused {
                    self.screen.push('`');
                    self.control.toggle();
                }
            }
        }
        Ok(())
    }
}

#[test]
fn toggle_pressed_in_the_middle_of_a_mistake_is_erased_in_place() {
    let control = Arc::new(ModeControl::starting_in(RunMode::Typing));
    let sink = ToggleDuringWaits {
        control: Arc::clone(&control),
        screen: Vec::new(),
        waits: 0,
    };
    let mut session = Session::new(
        "hi there",
        every_char_wrong(Only::Swap, true, 0),
        Arc::clone(&control),
        sink,
        StdRng::seed_from_u64(0),
    )
    .unwrap();

    session.run().unwrap();

    let sink = session.into_sink();
    assert!(sink.waits > 1);
    assert_eq!(control.mode(), RunMode::Typing);
    assert_eq!(sink.screen.iter().collect::<String>(), "hi there");
}
