//! Mistake selection.
//!
//! A [`TypoGenerator`] only decides *what* goes wrong; the session performs the keystrokes
//! for the chosen [`TypoPlan`].

use anyhow::{anyhow, Result};
use rand::distributions::WeightedIndex;
use rand::Rng;
use rand_distr::Distribution;

use crate::config::TypistConfig;
use crate::keyboard::qwerty_adjacent_char;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypoShape {
    /// The character is typed twice.
    Double,
    /// The character is left out and the next one typed in its place.
    Skip,
    /// The character and the next one are typed in reverse order.
    Swap,
    /// A neighbouring key is hit instead.
    Adjacent { wrong: char },
}

impl TypoShape {
    /// Source characters the mistake consumes from the input stream.
    pub fn consumed(&self) -> usize {
        match self {
            TypoShape::Double | TypoShape::Adjacent { .. } => 1,
            TypoShape::Skip | TypoShape::Swap => 2,
        }
    }

    /// Characters the mistake puts on screen.
    pub fn emitted(&self) -> usize {
        match self {
            TypoShape::Double | TypoShape::Swap => 2,
            TypoShape::Skip | TypoShape::Adjacent { .. } => 1,
        }
    }

    /// Leading emitted characters that are already right and survive the fix.
    pub fn correct_prefix(&self) -> usize {
        match self {
            TypoShape::Double => 1,
            _ => 0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TypoShape::Double => "double",
            TypoShape::Skip => "skip",
            TypoShape::Swap => "swap",
            TypoShape::Adjacent { .. } => "adjacent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypoPlan {
    pub shape: TypoShape,
    pub corrected: bool,
    /// Ordinary characters typed after the mistake before it is noticed.
    pub delay: usize,
}

impl TypoPlan {
    pub fn is_immediate(&self) -> bool {
        self.corrected && self.delay == 0
    }
}

const SHAPE_ORDER: [ShapeKind; 4] = [
    ShapeKind::Double,
    ShapeKind::Skip,
    ShapeKind::Swap,
    ShapeKind::Adjacent,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShapeKind {
    Double,
    Skip,
    Swap,
    Adjacent,
}

#[derive(Debug, Clone)]
pub struct TypoGenerator {
    typo_probability: f64,
    uncorrected_probability: f64,
    shapes: WeightedIndex<f64>,
    correction_delays: WeightedIndex<f64>,
}

impl TypoGenerator {
    pub fn from_config(cfg: &TypistConfig) -> Result<Self> {
        let shapes = WeightedIndex::new(cfg.shape_weights.as_array())
            .map_err(|e| anyhow!("invalid shape weights: {e}"))?;
        let correction_delays = WeightedIndex::new(cfg.correction_delay_weights)
            .map_err(|e| anyhow!("invalid correction delay weights: {e}"))?;

        Ok(Self {
            typo_probability: cfg.typo_probability,
            uncorrected_probability: cfg.uncorrected_probability,
            shapes,
            correction_delays,
        })
    }

    /// Decides whether typing `current` goes wrong.
    ///
    /// `next` is the character after `current`, if any. Skip and Swap need it; without it no
    /// mistake is made at this position.
    pub fn maybe_typo(
        &self,
        current: char,
        next: Option<char>,
        rng: &mut impl Rng,
    ) -> Option<TypoPlan> {
        if rng.gen::<f64>() >= self.typo_probability {
            return None;
        }

        let corrected = rng.gen::<f64>() >= self.uncorrected_probability;
        let delay = if corrected {
            self.correction_delays.sample(rng)
        } else {
            0
        };

        let shape = match SHAPE_ORDER[self.shapes.sample(rng)] {
            ShapeKind::Double => TypoShape::Double,
            ShapeKind::Skip => {
                next?;
                TypoShape::Skip
            }
            ShapeKind::Swap => {
                next?;
                TypoShape::Swap
            }
            ShapeKind::Adjacent => match qwerty_adjacent_char(current, rng) {
                Some(wrong) => TypoShape::Adjacent { wrong },
                None => TypoShape::Double,
            },
        };

        Some(TypoPlan {
            shape,
            corrected,
            delay,
        })
    }
}
