//! Easing curves for the progress ramp and the weighted policy that picks one per cycle.

use std::f32::consts::FRAC_PI_2;

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::error::{MorphError, MorphResult};

pub const DEFAULT_BACK_OVERSHOOT: f32 = 1.70158;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EaseKind {
    InCubic,
    InExpo,
    /// Pulls back below 0 before accelerating; `overshoot` sets how far.
    InBack { overshoot: f32 },
    InSine,
}

impl EaseKind {
    /// Map linear time `t` in [0, 1] to eased progress. Every curve maps 0 → 0 and 1 → 1.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            EaseKind::InCubic => t * t * t,
            EaseKind::InExpo => {
                if t <= 0.0 {
                    0.0
                } else {
                    2f32.powf(10.0 * t - 10.0)
                }
            }
            EaseKind::InBack { overshoot } => {
                let c3 = overshoot + 1.0;
                c3 * t * t * t - overshoot * t * t
            }
            EaseKind::InSine => 1.0 - (t * FRAC_PI_2).cos(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EaseKind::InCubic => "in-cubic",
            EaseKind::InExpo => "in-expo",
            EaseKind::InBack { .. } => "in-back",
            EaseKind::InSine => "in-sine",
        }
    }
}

/// Weighted draw over {InCubic, InExpo, InBack, InSine}.
#[derive(Debug, Clone)]
pub struct EasePolicy {
    weights: WeightedIndex<f32>,
    overshoot: f32,
}

impl EasePolicy {
    pub fn new(weights: [f32; 4], overshoot: f32) -> MorphResult<Self> {
        let weights = WeightedIndex::new(weights).map_err(|e| MorphError::Config(format!("ease_weights: {}", e)))?;
        Ok(Self { weights, overshoot })
    }

    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> EaseKind {
        match self.weights.sample(rng) {
            0 => EaseKind::InCubic,
            1 => EaseKind::InExpo,
            2 => EaseKind::InBack { overshoot: self.overshoot },
            _ => EaseKind::InSine,
        }
    }
}
