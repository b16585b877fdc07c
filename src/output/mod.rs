//! Where engine actions end up: a real virtual keyboard or an in-memory recording.

pub mod backends;
mod util;

use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::mode::ModeControl;
use crate::model::Action;

pub use util::{print_trace_line, sleep_interruptible};

/// Consumer of the actions the typing session produces.
pub trait ActionSink {
    fn perform(&mut self, action: Action) -> Result<()>;
}

impl<S: ActionSink + ?Sized> ActionSink for Box<S> {
    fn perform(&mut self, action: Action) -> Result<()> {
        (**self).perform(action)
    }
}

/// Drops every action. Used for dry runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ActionSink for NullSink {
    fn perform(&mut self, _action: Action) -> Result<()> {
        Ok(())
    }
}

/// Forwards actions to `inner` and keeps a copy of each one.
#[derive(Debug, Default)]
pub struct Recorder<S> {
    inner: S,
    actions: Vec<Action>,
}

impl Recorder<NullSink> {
    pub fn dry() -> Self {
        Self::new(NullSink)
    }
}

impl<S: ActionSink> Recorder<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            actions: Vec::new(),
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn into_actions(self) -> Vec<Action> {
        self.actions
    }
}

impl<S: ActionSink> ActionSink for Recorder<S> {
    fn perform(&mut self, action: Action) -> Result<()> {
        self.inner.perform(action)?;
        // Back-to-back waits (idle polling, pause after delay) collapse into one.
        match (self.actions.last_mut(), action) {
            (Some(Action::Wait { ms: total }), Action::Wait { ms }) => {
                *total = total.saturating_add(ms);
            }
            _ => self.actions.push(action),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputBackend {
    Auto,
    Wayland,
    X11,
}

impl OutputBackend {
    fn label(self) -> &'static str {
        match self {
            OutputBackend::Auto => "auto",
            OutputBackend::Wayland => "Wayland",
            OutputBackend::X11 => "X11",
        }
    }

    fn compiled_in(self) -> bool {
        match self {
            OutputBackend::Auto => false,
            OutputBackend::Wayland => cfg!(feature = "wayland"),
            OutputBackend::X11 => cfg!(feature = "x11"),
        }
    }
}

fn env_is_set(name: &str) -> bool {
    std::env::var_os(name).is_some_and(|v| !v.is_empty())
}

fn detect_backend() -> OutputBackend {
    let wayland_session = env_is_set("WAYLAND_DISPLAY") || env_is_set("WAYLAND_SOCKET");
    let x11_session = env_is_set("DISPLAY");

    // Xwayland sessions set both; the native protocol wins when it is built in.
    if wayland_session {
        if OutputBackend::Wayland.compiled_in() || !(x11_session && OutputBackend::X11.compiled_in())
        {
            return OutputBackend::Wayland;
        }
        return OutputBackend::X11;
    }

    if x11_session {
        OutputBackend::X11
    } else {
        OutputBackend::Auto
    }
}

fn describe_session() -> String {
    let mut seen: Vec<String> = ["WAYLAND_DISPLAY", "WAYLAND_SOCKET", "DISPLAY"]
        .into_iter()
        .filter(|name| env_is_set(name))
        .map(|name| format!("{name} is set"))
        .collect();

    if let Ok(kind) = std::env::var("XDG_SESSION_TYPE") {
        if !kind.is_empty() {
            seen.push(format!("XDG_SESSION_TYPE={kind}"));
        }
    }

    if seen.is_empty() {
        "No display session detected (expected Wayland or X11 environment variables).".to_string()
    } else {
        format!("Detected environment: {}", seen.join(", "))
    }
}

/// Resolves `Auto` against the environment and checks the result is built in.
pub fn resolve_backend(requested: OutputBackend) -> Result<OutputBackend> {
    let resolved = match requested {
        OutputBackend::Auto => detect_backend(),
        other => other,
    };

    if resolved == OutputBackend::Auto {
        let available: Vec<&str> = [OutputBackend::Wayland, OutputBackend::X11]
            .into_iter()
            .filter(|b| b.compiled_in())
            .map(|b| match b {
                OutputBackend::Wayland => "--backend wayland",
                _ => "--backend x11",
            })
            .collect();
        let hint = if available.is_empty() {
            "This build has no output backends enabled.".to_string()
        } else {
            format!("Try forcing one: {}", available.join(" or "))
        };
        return Err(anyhow!(
            "No supported output backend detected. {}\n{hint}",
            describe_session()
        ));
    }

    if !resolved.compiled_in() {
        let how = if requested == OutputBackend::Auto {
            "detected"
        } else {
            "requested"
        };
        let feature = resolved.label().to_ascii_lowercase();
        return Err(anyhow!(
            "{} backend {how} but is disabled in this build (rebuild with `--features {feature}`). {}",
            resolved.label(),
            describe_session()
        ));
    }

    Ok(resolved)
}

/// Validates flags against the resolved backend before anything is opened.
pub fn preflight_backend(
    requested: OutputBackend,
    seat_name: Option<&str>,
) -> Result<OutputBackend> {
    if seat_name.is_some_and(|name| name.trim().is_empty()) {
        return Err(anyhow!("--seat must not be empty"));
    }

    let resolved = resolve_backend(requested)?;

    if seat_name.is_some() && resolved == OutputBackend::X11 {
        return Err(anyhow!("--seat is Wayland-only and is not supported on X11"));
    }

    Ok(resolved)
}

/// Opens a live virtual keyboard. Waits are interrupted by `control`'s stop flag.
pub fn open_sink(
    requested: OutputBackend,
    seat_name: Option<&str>,
    control: Arc<ModeControl>,
) -> Result<Box<dyn ActionSink>> {
    #[cfg(all(not(feature = "wayland"), not(feature = "x11")))]
    let _ = (&seat_name, &control);

    match preflight_backend(requested, seat_name)? {
        #[cfg(feature = "wayland")]
        OutputBackend::Wayland => Ok(Box::new(backends::wayland::WaylandSink::connect(
            seat_name, control,
        )?)),
        #[cfg(feature = "x11")]
        OutputBackend::X11 => Ok(Box::new(backends::x11::X11Sink::connect(control)?)),
        other => Err(anyhow!("{} backend is not available", other.label())),
    }
}
