use crate::model::Action;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionStats {
    pub actions: usize,
    pub chars: usize,
    pub backspaces: usize,
    pub total_wait_ms: u64,
}

pub fn stats(actions: &[Action]) -> ActionStats {
    let mut out = ActionStats {
        actions: actions.len(),
        ..Default::default()
    };

    for a in actions {
        match a {
            Action::Wait { ms } => {
                out.total_wait_ms = out.total_wait_ms.saturating_add(*ms);
            }
            Action::Char { .. } => out.chars += 1,
            Action::Backspace => out.backspaces += 1,
        }
    }

    out
}

/// Replays `actions` into an editor whose cursor always sits at the end of the text.
///
/// Intended for tests and dry runs. A backspace on empty text does nothing.
pub fn simulate_visible_text(actions: &[Action]) -> String {
    let mut buf: Vec<char> = Vec::new();
    for a in actions {
        match a {
            Action::Char { ch } => buf.push(*ch),
            Action::Backspace => {
                buf.pop();
            }
            Action::Wait { .. } => {}
        }
    }
    buf.into_iter().collect()
}

/// Only the key actions, with waits removed.
pub fn keys_only(actions: &[Action]) -> Vec<Action> {
    actions
        .iter()
        .copied()
        .filter(|a| !matches!(a, Action::Wait { .. }))
        .collect()
}
