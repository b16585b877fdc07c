use anyhow::{anyhow, Result};
use rand::Rng;
use rand_distr::{Distribution, Triangular};

use crate::config::{PauseSettings, TypistConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Space,
    Punctuation,
    Newline,
    Other,
}

pub fn classify(c: char) -> CharClass {
    if c == ' ' {
        CharClass::Space
    } else if matches!(c, '.' | '/' | ';' | ':' | '(' | ')' | '?' | '!') {
        CharClass::Punctuation
    } else if c == '\n' {
        CharClass::Newline
    } else {
        CharClass::Other
    }
}

/// Occasional thinking pauses after spaces, punctuation and line breaks.
#[derive(Debug, Clone)]
pub struct PauseModel {
    space: PauseSettings,
    punctuation: PauseSettings,
    newline: PauseSettings,
}

impl PauseModel {
    pub fn from_config(cfg: &TypistConfig) -> Self {
        Self {
            space: cfg.space_pause,
            punctuation: cfg.punctuation_pause,
            newline: cfg.newline_pause,
        }
    }

    fn settings_for(&self, class: CharClass) -> Option<&PauseSettings> {
        match class {
            CharClass::Space => Some(&self.space),
            CharClass::Punctuation => Some(&self.punctuation),
            CharClass::Newline => Some(&self.newline),
            CharClass::Other => None,
        }
    }

    /// Seconds of extra pause after `c`, or 0.0.
    pub fn maybe_pause(&self, c: char, rng: &mut impl Rng) -> Result<f64> {
        let Some(settings) = self.settings_for(classify(c)) else {
            return Ok(0.0);
        };

        if rng.gen::<f64>() >= settings.probability {
            return Ok(0.0);
        }

        // Mode sits on the maximum, so long pauses are the common case.
        let dist = Triangular::new(settings.min_secs, settings.max_secs, settings.max_secs)
            .map_err(|e| anyhow!("invalid pause range: {e:?}"))?;
        Ok(dist.sample(rng))
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn always_pause() -> TypistConfig {
        TypistConfig {
            space_pause: PauseSettings::new(1.0, 0.2, 0.6),
            punctuation_pause: PauseSettings::new(1.0, 0.4, 1.4),
            newline_pause: PauseSettings::new(1.0, 0.8, 2.5),
            ..Default::default()
        }
    }

    #[test]
    fn classifies_in_priority_order() {
        assert_eq!(classify(' '), CharClass::Space);
        for c in ['.', '/', ';', ':', '(', ')', '?', '!'] {
            assert_eq!(classify(c), CharClass::Punctuation, "{c:?}");
        }
        assert_eq!(classify('\n'), CharClass::Newline);
        assert_eq!(classify(','), CharClass::Other);
        assert_eq!(classify('a'), CharClass::Other);
    }

    #[test]
    fn other_characters_never_pause() {
        let model = PauseModel::from_config(&always_pause());
        let mut rng = StdRng::seed_from_u64(7);
        for c in ['a', 'Z', '3', ',', '-', '\t'] {
            assert_eq!(model.maybe_pause(c, &mut rng).unwrap(), 0.0);
        }
    }

    #[test]
    fn pauses_stay_within_class_range() {
        let cfg = always_pause();
        let model = PauseModel::from_config(&cfg);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let s = model.maybe_pause(' ', &mut rng).unwrap();
            assert!((0.2..=0.6).contains(&s), "space pause {s}");
            let p = model.maybe_pause('.', &mut rng).unwrap();
            assert!((0.4..=1.4).contains(&p), "punctuation pause {p}");
            let n = model.maybe_pause('\n', &mut rng).unwrap();
            assert!((0.8..=2.5).contains(&n), "newline pause {n}");
        }
    }

    #[test]
    fn pauses_skew_toward_the_maximum() {
        let model = PauseModel::from_config(&always_pause());
        let mut rng = StdRng::seed_from_u64(3);
        let n = 2_000;
        let mean = (0..n)
            .map(|_| model.maybe_pause('\n', &mut rng).unwrap())
            .sum::<f64>()
            / n as f64;
        // Triangular(0.8, 2.5, 2.5) has mean 1.933.
        assert!(mean > 1.8 && mean < 2.1, "mean {mean}");
    }

    #[test]
    fn zero_probability_disables_the_class() {
        let cfg = TypistConfig {
            space_pause: PauseSettings::new(0.0, 0.2, 0.6),
            ..always_pause()
        };
        let model = PauseModel::from_config(&cfg);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            assert_eq!(model.maybe_pause(' ', &mut rng).unwrap(), 0.0);
        }
    }
}
