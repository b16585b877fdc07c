//! Global toggle key, backed by `rdev`.
//!
//! `rdev::listen` blocks forever and has no shutdown API, so it lives on its own OS thread.
//! Dropping the [`HotkeyListener`] closes it: the callback keeps receiving events until the
//! process exits but ignores all of them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{Context, Result};

use crate::mode::{ModeControl, RunMode};

/// The physical key that produces `c` on a US layout, for the keys we allow as toggles.
pub fn key_for_char(c: char) -> Option<rdev::Key> {
    use rdev::Key::*;

    let key = match c.to_ascii_lowercase() {
        '`' => BackQuote,
        'a' => KeyA,
        'b' => KeyB,
        'c' => KeyC,
        'd' => KeyD,
        'e' => KeyE,
        'f' => KeyF,
        'g' => KeyG,
        'h' => KeyH,
        'i' => KeyI,
        'j' => KeyJ,
        'k' => KeyK,
        'l' => KeyL,
        'm' => KeyM,
        'n' => KeyN,
        'o' => KeyO,
        'p' => KeyP,
        'q' => KeyQ,
        'r' => KeyR,
        's' => KeyS,
        't' => KeyT,
        'u' => KeyU,
        'v' => KeyV,
        'w' => KeyW,
        'x' => KeyX,
        'y' => KeyY,
        'z' => KeyZ,
        '0' => Num0,
        '1' => Num1,
        '2' => Num2,
        '3' => Num3,
        '4' => Num4,
        '5' => Num5,
        '6' => Num6,
        '7' => Num7,
        '8' => Num8,
        '9' => Num9,
        '\\' => BackSlash,
        ';' => SemiColon,
        '\'' => Quote,
        ',' => Comma,
        '.' => Dot,
        '/' => Slash,
        '-' => Minus,
        '=' => Equal,
        _ => return None,
    };
    Some(key)
}

/// Flips the mode when `event` is a press of `key`. Releases and other keys are ignored.
pub fn handle_event(
    event: &rdev::EventType,
    key: &rdev::Key,
    control: &ModeControl,
) -> Option<RunMode> {
    match event {
        rdev::EventType::KeyPress(k) if k == key => Some(control.toggle()),
        _ => None,
    }
}

/// Handle to the listener thread. Drop it to stop reacting to the toggle key.
pub struct HotkeyListener {
    closed: Arc<AtomicBool>,
    _thread: JoinHandle<()>,
}

impl HotkeyListener {
    pub fn start(key: rdev::Key, control: Arc<ModeControl>) -> Result<Self> {
        let closed = Arc::new(AtomicBool::new(false));
        let closed_in_callback = Arc::clone(&closed);

        let thread = std::thread::Builder::new()
            .name("toggle-key".into())
            .spawn(move || {
                let result = rdev::listen(move |event| {
                    if closed_in_callback.load(Ordering::SeqCst) {
                        return;
                    }
                    match handle_event(&event.event_type, &key, &control) {
                        Some(RunMode::Typing) => println!("▶ Started typing"),
                        Some(RunMode::Paused) => println!("⏸ Paused typing"),
                        None => {}
                    }
                });

                if let Err(e) = result {
                    log::error!("toggle-key listener exited: {e:?}");
                }
            })
            .context("failed to spawn toggle-key listener thread")?;

        Ok(Self {
            closed,
            _thread: thread,
        })
    }

    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for HotkeyListener {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
