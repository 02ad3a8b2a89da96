//! Verdict shown on the plate after a knock

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::CIRCLE;

/// Message for the right barrel
pub const SUCCESS: &str = "Come in!";

/// Every refusal starts with this
pub const DENIAL_PREFIX: &str = "Go away! ";

/// Reasons the wrong barrel gives for not opening
pub const DENIAL_REASONS: &[&str] = &[
    "There is nobody home.",
    "We are not expecting visitors today.",
    "This barrel is full of pickles.",
    "Wrong time, come back at another hour.",
    "The owner is asleep and does not want to be disturbed.",
    "This barrel has been empty for a hundred years.",
    "Knock on another barrel, this one is painted on.",
    "Nobody here can tell the time.",
];

/// Outcome of a knock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Granted,
    /// Index into `DENIAL_REASONS`
    Denied { reason: usize },
}

impl Verdict {
    /// Compare the tapped barrel against the target
    pub fn judge(tapped: usize, target: usize, rng: &mut impl Rng) -> Self {
        if tapped == target {
            Verdict::Granted
        } else {
            Verdict::Denied {
                reason: rng.random_range(0..DENIAL_REASONS.len()),
            }
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Verdict::Granted)
    }

    /// Text for the plate
    pub fn message(&self) -> String {
        match self {
            Verdict::Granted => SUCCESS.to_string(),
            Verdict::Denied { reason } => {
                let reason = DENIAL_REASONS[reason % DENIAL_REASONS.len()];
                format!("{}{}", DENIAL_PREFIX, reason)
            }
        }
    }

    /// Barrel spin: a full turn forward when granted, backward otherwise
    pub fn spin(&self) -> f32 {
        if self.is_granted() { CIRCLE } else { -CIRCLE }
    }
}
