use anyhow::{ensure, Result};

/// Probability and duration range for one pausing character class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PauseSettings {
    pub probability: f64,
    pub min_secs: f64,
    pub max_secs: f64,
}

impl PauseSettings {
    pub const fn new(probability: f64, min_secs: f64, max_secs: f64) -> Self {
        Self {
            probability,
            min_secs,
            max_secs,
        }
    }
}

/// Relative weights of the four mistake shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeWeights {
    pub double: f64,
    pub skip: f64,
    pub swap: f64,
    pub adjacent: f64,
}

impl ShapeWeights {
    pub fn as_array(&self) -> [f64; 4] {
        [self.double, self.skip, self.swap, self.adjacent]
    }
}

impl Default for ShapeWeights {
    fn default() -> Self {
        Self {
            double: 0.25,
            skip: 0.20,
            swap: 0.25,
            adjacent: 0.30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TypistConfig {
    pub wpm: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    pub wave_frequency: f64,
    pub chars_per_word: f64,
    pub typo_probability: f64,
    pub shape_weights: ShapeWeights,
    /// Weights for noticing a mistake after 0, 1, .. 5 further characters.
    pub correction_delay_weights: [f64; 6],
    pub uncorrected_probability: f64,
    /// Hesitation before starting to backspace a noticed mistake.
    pub realize_delay_secs: f64,
    pub space_pause: PauseSettings,
    pub punctuation_pause: PauseSettings,
    pub newline_pause: PauseSettings,
    pub idle_poll_secs: f64,
    pub toggle_key: char,
}

impl Default for TypistConfig {
    fn default() -> Self {
        Self {
            wpm: 120.0,
            min_speed: 0.80,
            max_speed: 1.20,
            wave_frequency: 0.1,
            chars_per_word: 5.0,
            typo_probability: 0.02,
            shape_weights: ShapeWeights::default(),
            correction_delay_weights: [0.45, 0.20, 0.13, 0.10, 0.07, 0.05],
            uncorrected_probability: 0.10,
            realize_delay_secs: 0.35,
            space_pause: PauseSettings::new(0.04, 0.2, 0.6),
            punctuation_pause: PauseSettings::new(0.25, 0.4, 1.4),
            newline_pause: PauseSettings::new(0.5, 0.8, 2.5),
            idle_poll_secs: 0.1,
            toggle_key: '`',
        }
    }
}

impl TypistConfig {
    pub fn base_chars_per_minute(&self) -> f64 {
        self.wpm * self.chars_per_word
    }
}

fn validate_weights(name: &str, weights: &[f64]) -> Result<()> {
    ensure!(
        weights.iter().all(|w| w.is_finite() && *w >= 0.0),
        "{name} must be finite and >= 0"
    );
    ensure!(
        weights.iter().any(|w| *w > 0.0),
        "{name} must contain at least one positive weight"
    );
    Ok(())
}

fn validate_pause(name: &str, pause: &PauseSettings) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&pause.probability),
        "{name} probability must be between 0.0 and 1.0"
    );
    ensure!(
        pause.min_secs.is_finite() && pause.max_secs.is_finite(),
        "{name} durations must be finite"
    );
    ensure!(pause.min_secs >= 0.0, "{name} minimum must be >= 0");
    ensure!(
        pause.min_secs <= pause.max_secs,
        "{name} minimum must be <= maximum"
    );
    Ok(())
}

pub fn validate_config(cfg: &TypistConfig) -> Result<()> {
    ensure!(cfg.wpm.is_finite() && cfg.wpm > 0.0, "wpm must be > 0");
    ensure!(
        cfg.chars_per_word.is_finite() && cfg.chars_per_word > 0.0,
        "chars_per_word must be > 0"
    );
    ensure!(
        cfg.min_speed.is_finite() && cfg.max_speed.is_finite(),
        "speed multipliers must be finite"
    );
    ensure!(cfg.min_speed > 0.0, "min_speed must be > 0");
    ensure!(cfg.min_speed <= cfg.max_speed, "min_speed must be <= max_speed");
    ensure!(
        cfg.wave_frequency.is_finite() && cfg.wave_frequency > 0.0,
        "wave_frequency must be > 0"
    );

    ensure!(
        (0.0..=1.0).contains(&cfg.typo_probability),
        "typo_probability must be between 0.0 and 1.0"
    );
    ensure!(
        (0.0..=1.0).contains(&cfg.uncorrected_probability),
        "uncorrected_probability must be between 0.0 and 1.0"
    );
    validate_weights("shape_weights", &cfg.shape_weights.as_array())?;
    validate_weights("correction_delay_weights", &cfg.correction_delay_weights)?;

    ensure!(
        cfg.realize_delay_secs.is_finite() && cfg.realize_delay_secs >= 0.0,
        "realize_delay_secs must be >= 0"
    );
    ensure!(
        cfg.idle_poll_secs.is_finite() && cfg.idle_poll_secs > 0.0,
        "idle_poll_secs must be > 0"
    );

    validate_pause("space pause", &cfg.space_pause)?;
    validate_pause("punctuation pause", &cfg.punctuation_pause)?;
    validate_pause("newline pause", &cfg.newline_pause)?;

    Ok(())
}
