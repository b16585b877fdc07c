use anyhow::{ensure, Result};

/// A mistake that will be fixed after a few more ordinary characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCorrection {
    /// Ordinary characters still to be typed before the fix.
    pub remaining: usize,
    /// Visible characters to backspace once the fix starts.
    pub erase: usize,
    /// Input index the retyped span starts at.
    pub source_start: usize,
}

/// Holds at most one outstanding correction.
#[derive(Debug, Default, Clone)]
pub struct CorrectionScheduler {
    pending: Option<PendingCorrection>,
}

impl CorrectionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a deferred fix for a mistake spanning `erase` visible characters that began at
    /// input index `source_start`.
    ///
    /// Fails if a correction is already outstanding or `delay` is zero.
    pub fn schedule(&mut self, delay: usize, erase: usize, source_start: usize) -> Result<()> {
        ensure!(self.pending.is_none(), "correction already outstanding");
        ensure!(delay > 0, "immediate fixes are not scheduled");
        self.pending = Some(PendingCorrection {
            remaining: delay,
            erase,
            source_start,
        });
        Ok(())
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Records one ordinary character typed while a fix is outstanding.
    pub fn tick(&mut self) {
        if let Some(p) = &mut self.pending {
            p.remaining = p.remaining.saturating_sub(1);
            p.erase += 1;
        }
    }

    pub fn is_due(&self) -> bool {
        self.pending.is_some_and(|p| p.remaining == 0)
    }

    /// Removes and returns the correction once it is due.
    pub fn take_due(&mut self) -> Option<PendingCorrection> {
        if self.is_due() {
            self.pending.take()
        } else {
            None
        }
    }

    /// Removes the correction regardless of how many characters it still waits for.
    pub fn take(&mut self) -> Option<PendingCorrection> {
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn becomes_due_after_delay_ticks() {
        let mut s = CorrectionScheduler::new();
        s.schedule(2, 2, 10).unwrap();
        assert!(s.is_pending());
        assert!(!s.is_due());
        assert_eq!(s.take_due(), None);

        s.tick();
        assert!(!s.is_due());
        s.tick();
        assert!(s.is_due());

        let due = s.take_due().unwrap();
        assert_eq!(
            due,
            PendingCorrection {
                remaining: 0,
                erase: 4,
                source_start: 10
            }
        );
        assert!(!s.is_pending());
    }

    #[test]
    fn tick_without_pending_is_a_no_op() {
        let mut s = CorrectionScheduler::new();
        s.tick();
        assert!(!s.is_pending());
    }

    #[test]
    fn only_one_correction_at_a_time() {
        let mut s = CorrectionScheduler::new();
        s.schedule(1, 1, 0).unwrap();
        let err = s.schedule(3, 1, 4).unwrap_err();
        assert!(format!("{err:#}").contains("already outstanding"));
        assert_eq!(s.take().map(|p| p.source_start), Some(0));
    }

    #[test]
    fn zero_delay_is_rejected() {
        let mut s = CorrectionScheduler::new();
        let err = s.schedule(0, 1, 0).unwrap_err();
        assert!(format!("{err:#}").contains("immediate"));
        assert!(!s.is_pending());
    }
}
