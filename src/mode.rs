//! Pause/resume state shared between the typing loop and the toggle-key listener.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Paused,
    Typing,
}

/// The only state the listener thread may touch.
#[derive(Debug, Default)]
pub struct ModeControl {
    typing: AtomicBool,
    backspace_requests: AtomicUsize,
    stop: AtomicBool,
}

impl ModeControl {
    /// Starts paused.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_in(mode: RunMode) -> Self {
        let control = Self::new();
        control
            .typing
            .store(mode == RunMode::Typing, Ordering::SeqCst);
        control
    }

    pub fn mode(&self) -> RunMode {
        if self.typing.load(Ordering::SeqCst) {
            RunMode::Typing
        } else {
            RunMode::Paused
        }
    }

    /// Flips the mode once and asks the loop to erase the toggle keystroke.
    pub fn toggle(&self) -> RunMode {
        let was_typing = self.typing.fetch_xor(true, Ordering::SeqCst);
        self.backspace_requests.fetch_add(1, Ordering::SeqCst);
        if was_typing {
            RunMode::Paused
        } else {
            RunMode::Typing
        }
    }

    /// Returns and clears the number of toggle keystrokes waiting to be erased.
    pub fn take_backspace_requests(&self) -> usize {
        self.backspace_requests.swap(0, Ordering::SeqCst)
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    pub fn stop_flag(&self) -> &AtomicBool {
        &self.stop
    }
}
