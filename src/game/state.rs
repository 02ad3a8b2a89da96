//! Session state
//!
//! One `Session` lives for the lifetime of the page. It owns the barrels, the
//! secret, and the RNG that picks both.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::command::TimerId;
use super::verdict::Verdict;
use crate::consts::*;
use crate::is_clock_angle;
use crate::layout::{Geometry, RowPlan, Slot, Viewport};
use crate::settings::{Settings, TargetRule};

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Assets loaded or loading, welcome not yet finished
    Startup,
    /// Waiting for a tap
    Idle,
    /// Knock clip playing
    Knocking,
    /// Plate flying to its corner
    FadingIn,
    /// Plate shown, waiting for a dismiss
    Waiting,
}

/// One barrel on the wall
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Barrel {
    pub index: usize,
    pub slot: Slot,
    /// Displayed rotation in degrees (may exceed a full turn after spins)
    pub angle: f32,
    pub highlighted: bool,
}

/// Durations and visual tunables the state machine needs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    pub transition_ms: u32,
    pub plate_timeout_ms: u32,
    pub highlight: f32,
}

impl From<&Settings> for Timing {
    fn from(settings: &Settings) -> Self {
        Self {
            transition_ms: settings.transition_ms,
            plate_timeout_ms: settings.plate_timeout_ms,
            highlight: settings.highlight,
        }
    }
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct Session {
    /// Seed for reproducibility
    pub seed: u64,
    rng: Pcg32,
    /// Current phase
    pub phase: Phase,
    pub rule: TargetRule,
    pub timing: Timing,
    pub plan: RowPlan,
    /// Barrels in index order
    pub barrels: Vec<Barrel>,
    /// Pixel layout for the last known viewport
    pub geometry: Geometry,
    /// Barrel that opens
    pub target: usize,
    /// Hour shown by the marked barrel (1..=12)
    pub hour: u32,
    /// Barrel being knocked on; only set outside Idle
    pub tapped: Option<usize>,
    /// Verdict on the plate, if one is showing
    pub verdict: Option<Verdict>,
    /// Armed auto-dismiss timer
    pub dismiss_timer: Option<TimerId>,
    /// Welcome clip has been requested
    pub(crate) welcomed: bool,
    next_timer: u64,
}

impl Session {
    /// Create a session with the given settings and seed
    pub fn new(settings: &Settings, seed: u64) -> Self {
        let settings = settings.clone().validated();
        let plan = RowPlan::new(settings.num_barrels);
        let barrels = plan
            .slots()
            .iter()
            .enumerate()
            .map(|(index, &slot)| Barrel {
                index,
                slot,
                angle: 0.0,
                highlighted: false,
            })
            .collect();

        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: Phase::Startup,
            rule: settings.rule,
            timing: Timing::from(&settings),
            geometry: Geometry::new(&plan, Viewport::default()),
            plan,
            barrels,
            target: 0,
            hour: HOURS,
            tapped: None,
            verdict: None,
            dismiss_timer: None,
            welcomed: false,
            next_timer: 1,
        }
    }

    /// Allocate a new timer ID
    pub fn next_timer_id(&mut self) -> TimerId {
        let id = TimerId(self.next_timer);
        self.next_timer += 1;
        id
    }

    pub fn rng_mut(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Rule actually in force; the pointer needs a second barrel to point at
    pub fn effective_rule(&self) -> TargetRule {
        match self.rule {
            TargetRule::Pointer if self.barrels.len() >= 2 => TargetRule::Pointer,
            _ => TargetRule::Marked,
        }
    }

    /// Barrel that displays the clock hour
    pub fn marked_barrel(&self) -> usize {
        match self.effective_rule() {
            TargetRule::Marked => self.target,
            TargetRule::Pointer => 0,
        }
    }

    /// Choose a new secret and turn every barrel
    pub fn reshuffle(&mut self) {
        let count = self.barrels.len();
        match self.effective_rule() {
            TargetRule::Marked => {
                self.target = self.rng.random_range(0..count);
                self.hour = self.rng.random_range(1..=HOURS);
            }
            TargetRule::Pointer => {
                let max_hour = HOURS.min(count as u32 - 1);
                self.hour = self.rng.random_range(1..=max_hour);
                self.target = self.hour as usize;
            }
        }

        let marked = self.marked_barrel();
        for i in 0..count {
            let angle = if i == marked {
                self.hour as f32 * HOUR_ANGLE
            } else {
                decoy_angle(&mut self.rng)
            };
            let barrel = &mut self.barrels[i];
            barrel.angle = angle;
            barrel.highlighted = false;
        }
    }

    /// Recompute pixel layout for a new viewport
    pub fn resize(&mut self, viewport: Viewport) {
        self.geometry = Geometry::new(&self.plan, viewport);
    }

    /// Barrels currently resting on a clock position
    pub fn clock_barrels(&self) -> Vec<usize> {
        self.barrels
            .iter()
            .filter(|b| is_clock_angle(b.angle))
            .map(|b| b.index)
            .collect()
    }
}

/// Uniform angle over the full circle that is not a clock position
fn decoy_angle(rng: &mut impl Rng) -> f32 {
    loop {
        let angle = rng.random_range(0.0..CIRCLE);
        if !is_clock_angle(angle) {
            return angle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock_hour;

    fn session(rule: TargetRule, barrels: usize, seed: u64) -> Session {
        let settings = Settings {
            num_barrels: barrels,
            rule,
            ..Default::default()
        };
        Session::new(&settings, seed)
    }

    #[test]
    fn test_new_session() {
        let s = session(TargetRule::Marked, 19, 1);
        assert_eq!(s.phase, Phase::Startup);
        assert_eq!(s.barrels.len(), 19);
        assert_eq!(s.barrels[7].slot, Slot { row: 1, column: 1 });
        assert!(s.tapped.is_none());
    }

    #[test]
    fn test_reshuffle_marks_target() {
        let mut s = session(TargetRule::Marked, 19, 42);
        for _ in 0..50 {
            s.reshuffle();
            assert_eq!(s.clock_barrels(), vec![s.target]);
            assert_eq!(clock_hour(s.barrels[s.target].angle), Some(s.hour));
        }
    }

    #[test]
    fn test_reshuffle_pointer_rule() {
        let mut s = session(TargetRule::Pointer, 19, 42);
        for _ in 0..50 {
            s.reshuffle();
            assert_eq!(s.clock_barrels(), vec![0]);
            assert_eq!(s.target, s.hour as usize);
            assert!((1..=12).contains(&s.target));
        }
    }

    #[test]
    fn test_pointer_rule_small_wall() {
        // Four barrels: the head can only point at 1..=3
        let mut s = session(TargetRule::Pointer, 4, 9);
        for _ in 0..30 {
            s.reshuffle();
            assert!((1..=3).contains(&s.target));
        }
        // A single barrel cannot point anywhere
        let s = session(TargetRule::Pointer, 1, 9);
        assert_eq!(s.effective_rule(), TargetRule::Marked);
    }

    #[test]
    fn test_reshuffle_moves_target() {
        let mut s = session(TargetRule::Marked, 19, 5);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            s.reshuffle();
            seen.insert(s.target);
        }
        // Uniform over 19 barrels: 200 draws hit nearly all of them
        assert!(seen.len() > 15);
    }

    #[test]
    fn test_timer_ids_increase() {
        let mut s = session(TargetRule::Marked, 3, 0);
        let a = s.next_timer_id();
        let b = s.next_timer_id();
        assert!(b > a);
    }
}
