use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::ConnectionExt as _;
use x11rb::protocol::xtest::ConnectionExt as _;
use x11rb::protocol::{xproto, xtest};
use x11rb::rust_connection::RustConnection;

use super::{key_events_for, KeyEvent, COMMON_MODIFIER_KEYCODES};
use crate::keyboard::{keystroke_for_output_char, KEY_BACKSPACE};
use crate::mode::ModeControl;
use crate::model::Action;
use crate::output::{sleep_interruptible, ActionSink};

fn evdev_to_x11_keycode(evdev_keycode: u32) -> Result<u8> {
    // Xorg with the evdev/libinput driver offsets keycodes by 8.
    let x11 = evdev_keycode
        .checked_add(8)
        .ok_or_else(|| anyhow!("evdev keycode overflow"))?;
    u8::try_from(x11).map_err(|_| anyhow!("evdev keycode {evdev_keycode} out of range for X11"))
}

fn require_xtest(conn: &impl Connection) -> Result<()> {
    let ext = conn
        .extension_information(xtest::X11_EXTENSION_NAME)
        .context("failed to query X11 extension info")?;

    if ext.is_none() {
        return Err(anyhow!(
            "X11 backend requires the XTEST extension (not present on this X server)"
        ));
    }

    Ok(())
}

fn keysyms_for_keycode(conn: &impl Connection, keycode: u8) -> Result<(u32, u32)> {
    let reply = conn
        .get_keyboard_mapping(keycode, 1)
        .context("failed to request keyboard mapping")?
        .reply()
        .context("failed to read keyboard mapping")?;

    if reply.keysyms_per_keycode == 0 {
        return Err(anyhow!("X server returned 0 keysyms per keycode"));
    }

    let at = |i: usize| reply.keysyms.get(i).copied().unwrap_or(x11rb::NO_SYMBOL);
    Ok((at(0), at(1)))
}

/// Spot-checks that the server keymap agrees with our US keystroke table.
fn validate_us_keymap(conn: &impl Connection) -> Result<()> {
    for probe in ['a', 'q', '1', '-', '\'', '[', '`'] {
        let stroke = crate::keyboard::char_to_keystroke(probe)
            .ok_or_else(|| anyhow!("no keystroke for probe {probe:?}"))?;
        let keycode = evdev_to_x11_keycode(stroke.keycode)?;
        let (plain, _shifted) = keysyms_for_keycode(conn, keycode)?;

        // Latin-1 keysyms equal their character code.
        if plain == x11rb::NO_SYMBOL {
            return Err(anyhow!(
                "X11 keymap returned NoSymbol for keycode {keycode}; this backend assumes evdev+8 keycodes and a US layout"
            ));
        }
        if plain != probe as u32 {
            return Err(anyhow!(
                "X11 backend requires a US keyboard layout, but keycode {keycode} produces {plain:#x} instead of {probe:?}. Try `setxkbmap us`."
            ));
        }
    }

    Ok(())
}

/// Types through the XTEST extension on the default screen.
pub struct X11Sink {
    conn: RustConnection,
    root: xproto::Window,
    control: Arc<ModeControl>,
}

impl X11Sink {
    pub fn connect(control: Arc<ModeControl>) -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).context("failed to connect to X11")?;
        require_xtest(&conn)?;
        validate_us_keymap(&conn)?;

        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .map(|screen| screen.root)
            .ok_or_else(|| anyhow!("invalid X11 screen index"))?;

        let sink = Self {
            conn,
            root,
            control,
        };
        sink.release_modifiers_best_effort();
        log::debug!("x11: connected, screen {screen_num}");
        Ok(sink)
    }

    fn send(&self, event: KeyEvent) -> Result<()> {
        let keycode = evdev_to_x11_keycode(event.keycode)?;
        let type_ = if event.pressed {
            xproto::KEY_PRESS_EVENT
        } else {
            xproto::KEY_RELEASE_EVENT
        };
        self.conn
            .xtest_fake_input(type_, keycode, x11rb::CURRENT_TIME, self.root, 0, 0, 0)
            .context("failed to send XTEST fake input")?;
        Ok(())
    }

    fn send_all(&self, events: &[KeyEvent]) -> Result<()> {
        for event in events {
            self.send(*event)?;
        }
        self.conn.flush().context("failed to flush X11 connection")?;
        Ok(())
    }

    fn release_modifiers_best_effort(&self) {
        for keycode in COMMON_MODIFIER_KEYCODES {
            let _ = self.send(KeyEvent {
                keycode,
                pressed: false,
            });
        }
        let _ = self.conn.flush();
    }
}

impl ActionSink for X11Sink {
    fn perform(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Wait { ms } => {
                sleep_interruptible(self.control.stop_flag(), ms);
                Ok(())
            }
            Action::Char { ch } => {
                let stroke = keystroke_for_output_char(ch)
                    .ok_or_else(|| anyhow!("cannot type {ch:?} on a US layout"))?;
                self.send_all(&key_events_for(stroke))
            }
            Action::Backspace => self.send_all(&key_events_for(crate::keyboard::KeyStroke {
                keycode: KEY_BACKSPACE,
                shift: false,
            })),
        }
    }
}

impl Drop for X11Sink {
    fn drop(&mut self) {
        self.release_modifiers_best_effort();
    }
}
