use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub version: u32,
    pub config: TranscriptConfig,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    pub wpm: f64,
    pub source_chars: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Wait { ms: u64 },
    Char { ch: char },
    Backspace,
}

impl Action {
    /// Builds a wait from fractional seconds, rounded to whole milliseconds.
    pub fn wait_secs(secs: f64) -> Self {
        let ms = (secs.max(0.0) * 1000.0).round() as u64;
        Action::Wait { ms }
    }
}
