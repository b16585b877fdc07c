#[cfg(feature = "wayland")]
pub mod wayland;

#[cfg(feature = "x11")]
pub mod x11;

use crate::keyboard::KeyStroke;

// Released on connect and on drop so a run never starts or ends with a modifier held.
#[allow(dead_code)]
pub(crate) const COMMON_MODIFIER_KEYCODES: [u32; 6] = [
    crate::keyboard::KEY_LEFTSHIFT,
    crate::keyboard::KEY_RIGHTSHIFT,
    crate::keyboard::KEY_LEFTCTRL,
    crate::keyboard::KEY_RIGHTCTRL,
    crate::keyboard::KEY_LEFTALT,
    crate::keyboard::KEY_RIGHTALT,
];

/// A single key event in evdev terms.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct KeyEvent {
    pub keycode: u32,
    pub pressed: bool,
}

/// The press/release sequence that types `stroke`, wrapping it in Shift when needed.
#[allow(dead_code)]
pub(crate) fn key_events_for(stroke: KeyStroke) -> Vec<KeyEvent> {
    let press = |keycode| KeyEvent {
        keycode,
        pressed: true,
    };
    let release = |keycode| KeyEvent {
        keycode,
        pressed: false,
    };

    if stroke.shift {
        vec![
            press(crate::keyboard::KEY_LEFTSHIFT),
            press(stroke.keycode),
            release(stroke.keycode),
            release(crate::keyboard::KEY_LEFTSHIFT),
        ]
    } else {
        vec![press(stroke.keycode), release(stroke.keycode)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::{char_to_keystroke, KEY_A, KEY_LEFTSHIFT};

    #[test]
    fn common_modifier_list_contains_shift_keys() {
        assert!(COMMON_MODIFIER_KEYCODES.contains(&crate::keyboard::KEY_LEFTSHIFT));
        assert!(COMMON_MODIFIER_KEYCODES.contains(&crate::keyboard::KEY_RIGHTSHIFT));
    }

    #[test]
    fn uppercase_is_wrapped_in_shift() {
        let events = key_events_for(char_to_keystroke('A').unwrap());
        let flat: Vec<(u32, bool)> = events.iter().map(|e| (e.keycode, e.pressed)).collect();
        assert_eq!(
            flat,
            vec![
                (KEY_LEFTSHIFT, true),
                (KEY_A, true),
                (KEY_A, false),
                (KEY_LEFTSHIFT, false)
            ]
        );
    }

    #[test]
    fn lowercase_is_a_plain_tap() {
        let events = key_events_for(char_to_keystroke('a').unwrap());
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.keycode == KEY_A));
    }
}
