//! Position-driven typing speed.
//!
//! The speed multiplier follows a sine wave over the character index, so the pace drifts
//! smoothly between `min_speed` and `max_speed` and is reproducible for a given position.

use crate::config::TypistConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cadence {
    min_speed: f64,
    max_speed: f64,
    wave_frequency: f64,
}

impl Cadence {
    pub fn from_config(cfg: &TypistConfig) -> Self {
        Self {
            min_speed: cfg.min_speed,
            max_speed: cfg.max_speed,
            wave_frequency: cfg.wave_frequency,
        }
    }

    pub fn speed_multiplier(&self, position: usize) -> f64 {
        let wave = (position as f64 * self.wave_frequency).sin();
        let midpoint = (self.min_speed + self.max_speed) / 2.0;
        let half_range = (self.max_speed - self.min_speed) / 2.0;
        midpoint + wave * half_range
    }

    /// Seconds to wait after typing the character at `position`.
    pub fn delay(&self, position: usize, base_chars_per_minute: f64) -> f64 {
        let current_rate = base_chars_per_minute * self.speed_multiplier(position);
        60.0 / current_rate
    }

    /// Distance in characters after which the speed wave repeats.
    pub fn period(&self) -> f64 {
        std::f64::consts::TAU / self.wave_frequency
    }
}
