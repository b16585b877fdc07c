use std::collections::HashMap;
use std::io::Write;
use std::os::fd::{AsFd, OwnedFd};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use memfd::MemfdOptions;
use wayland_client::globals::{registry_queue_init, GlobalListContents};
use wayland_client::protocol::{wl_registry, wl_seat};
use wayland_client::{Connection, Dispatch, Proxy, QueueHandle};

use self::protocol::zwp_virtual_keyboard_manager_v1::ZwpVirtualKeyboardManagerV1;
use self::protocol::zwp_virtual_keyboard_v1::ZwpVirtualKeyboardV1;
use super::{key_events_for, KeyEvent, COMMON_MODIFIER_KEYCODES};
use crate::keyboard::{keystroke_for_output_char, KeyStroke, KEY_BACKSPACE, KEY_LEFTSHIFT};
use crate::keymap::us_qwerty_keymap;
use crate::mode::ModeControl;
use crate::model::Action;
use crate::output::{sleep_interruptible, ActionSink};

#[allow(non_upper_case_globals, non_camel_case_types, unused_imports, missing_docs)]
mod protocol {
    use wayland_client;
    use wayland_client::protocol::*;

    pub mod __interfaces {
        use wayland_client::protocol::__interfaces::*;
        wayland_scanner::generate_interfaces!("protocol/virtual-keyboard-unstable-v1.xml");
    }

    use self::__interfaces::*;

    wayland_scanner::generate_client_code!("protocol/virtual-keyboard-unstable-v1.xml");
}

#[derive(Debug, Clone)]
struct SeatData {
    global_name: u32,
}

#[derive(Debug, Default)]
struct State {
    seat_names_by_global: HashMap<u32, String>,
}

impl Dispatch<wl_registry::WlRegistry, GlobalListContents> for State {
    fn event(
        _state: &mut Self,
        _proxy: &wl_registry::WlRegistry,
        _event: wl_registry::Event,
        _data: &GlobalListContents,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<wl_seat::WlSeat, SeatData> for State {
    fn event(
        state: &mut Self,
        _proxy: &wl_seat::WlSeat,
        event: wl_seat::Event,
        data: &SeatData,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let wl_seat::Event::Name { name } = event {
            state.seat_names_by_global.insert(data.global_name, name);
        }
    }
}

impl Dispatch<ZwpVirtualKeyboardManagerV1, ()> for State {
    fn event(
        _state: &mut Self,
        _proxy: &ZwpVirtualKeyboardManagerV1,
        _event: <ZwpVirtualKeyboardManagerV1 as Proxy>::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<ZwpVirtualKeyboardV1, ()> for State {
    fn event(
        _state: &mut Self,
        _proxy: &ZwpVirtualKeyboardV1,
        _event: <ZwpVirtualKeyboardV1 as Proxy>::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
    }
}

fn keymap_fd(keymap: &str) -> Result<(OwnedFd, u32)> {
    let memfd = MemfdOptions::default()
        .allow_sealing(true)
        .create("typist-xkb-keymap")
        .context("failed to create memfd for keymap")?;

    let mut file = memfd.into_file();
    file.write_all(keymap.as_bytes())?;
    file.write_all(&[0])?;

    let size = (keymap.len() + 1)
        .try_into()
        .map_err(|_| anyhow!("keymap too large"))?;

    Ok((OwnedFd::from(file), size))
}

/// Binds the requested seat by its `wl_seat.name`, or the first advertised one.
fn bind_seat(
    globals: &wayland_client::globals::GlobalList,
    event_queue: &mut wayland_client::EventQueue<State>,
    state: &mut State,
    seat_name: Option<&str>,
) -> Result<wl_seat::WlSeat> {
    let qh = event_queue.handle();
    let seat_globals: Vec<_> = globals
        .contents()
        .clone_list()
        .into_iter()
        .filter(|g| g.interface == wl_seat::WlSeat::interface().name)
        .collect();

    let bind = |name: u32, version: u32| -> wl_seat::WlSeat {
        globals.registry().bind(
            name,
            version.min(7),
            &qh,
            SeatData { global_name: name },
        )
    };

    let Some(requested) = seat_name else {
        let first = seat_globals
            .first()
            .ok_or_else(|| anyhow!("wl_seat not available (no seats advertised)"))?;
        return Ok(bind(first.name, first.version));
    };

    let seats: Vec<(u32, wl_seat::WlSeat)> = seat_globals
        .iter()
        .map(|g| (g.name, bind(g.name, g.version)))
        .collect();

    event_queue
        .roundtrip(state)
        .context("Wayland roundtrip (seat discovery) failed")?;

    if let Some((_, seat)) = seats.into_iter().find(|(global, _)| {
        state
            .seat_names_by_global
            .get(global)
            .is_some_and(|n| n == requested)
    }) {
        return Ok(seat);
    }

    let mut names: Vec<String> = state.seat_names_by_global.values().cloned().collect();
    names.sort();
    names.dedup();
    if names.is_empty() {
        return Err(anyhow!(
            "requested seat {requested:?}, but the compositor did not advertise any seat names (requires wl_seat v2+)"
        ));
    }
    Err(anyhow!(
        "requested seat {requested:?} not found; available seats: {}",
        names.join(", ")
    ))
}

/// Types through a `zwp_virtual_keyboard_v1` attached to one seat.
pub struct WaylandSink {
    conn: Connection,
    keyboard: ZwpVirtualKeyboardV1,
    shift_mask: u32,
    started: Instant,
    control: Arc<ModeControl>,
}

impl WaylandSink {
    pub fn connect(seat_name: Option<&str>, control: Arc<ModeControl>) -> Result<Self> {
        let conn = Connection::connect_to_env().context("failed to connect to Wayland")?;
        let (globals, mut event_queue) =
            registry_queue_init(&conn).context("failed to init Wayland registry")?;
        let qh = event_queue.handle();
        let mut state = State::default();

        let manager: ZwpVirtualKeyboardManagerV1 = globals
            .bind(&qh, 1..=1, ())
            .context("zwp_virtual_keyboard_manager_v1 not available (is the compositor wlroots-based?)")?;

        let seat = bind_seat(&globals, &mut event_queue, &mut state, seat_name)?;
        let keyboard = manager.create_virtual_keyboard(&seat, &qh, ());
        event_queue
            .roundtrip(&mut state)
            .context("Wayland roundtrip failed")?;

        let keymap = us_qwerty_keymap()?;
        let (fd, size) = keymap_fd(&keymap.keymap)?;
        keyboard.keymap(keymap.keymap_format, fd.as_fd(), size);
        conn.flush().context("Wayland flush failed")?;

        log::debug!("wayland: virtual keyboard ready (seat {seat_name:?})");

        Ok(Self {
            conn,
            keyboard,
            shift_mask: keymap.shift_mask,
            started: Instant::now(),
            control,
        })
    }

    fn timestamp_ms(&self) -> u32 {
        self.started
            .elapsed()
            .as_millis()
            .try_into()
            .unwrap_or(u32::MAX)
    }

    fn send_all(&self, events: &[KeyEvent]) -> Result<()> {
        for event in events {
            let time = self.timestamp_ms();
            self.keyboard
                .key(time, event.keycode, u32::from(event.pressed));

            // The compositor tracks modifier state separately from key events.
            if event.keycode == KEY_LEFTSHIFT {
                let depressed = if event.pressed { self.shift_mask } else { 0 };
                self.keyboard.modifiers(depressed, 0, 0, 0);
            }
        }

        if let Err(e) = self.conn.flush().context("Wayland flush failed") {
            self.release_modifiers_best_effort();
            return Err(e);
        }
        Ok(())
    }

    fn release_modifiers_best_effort(&self) {
        self.keyboard.modifiers(0, 0, 0, 0);
        let time = self.timestamp_ms();
        for keycode in COMMON_MODIFIER_KEYCODES {
            self.keyboard.key(time, keycode, 0);
        }
        let _ = self.conn.flush();
    }
}

impl ActionSink for WaylandSink {
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
            Action::Backspace => self.send_all(&key_events_for(KeyStroke {
                keycode: KEY_BACKSPACE,
                shift: false,
            })),
        }
    }
}

impl Drop for WaylandSink {
    fn drop(&mut self) {
        self.release_modifiers_best_effort();
    }
}
