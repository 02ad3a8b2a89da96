//! Headless runtime
//!
//! Runs a session against a virtual clock. Timers and clip endings are queued
//! by due time and fired in order; render commands update a `StageState` that
//! tests (and the native demo) can inspect.

use std::collections::{BTreeMap, VecDeque};

use crate::audio::{Clip, ClipBank};
use crate::game::{
    Command, Event, PlatePose, PlateTransform, Session, Timer, TimerId, Transition, Verdict,
    dispatch,
};
use crate::layout::Geometry;

/// Default length of every simulated clip (ms)
pub const CLIP_MS: u64 = 600;

/// What a browser would currently be showing
#[derive(Debug, Clone)]
pub struct StageState {
    pub geometry: Option<Geometry>,
    pub rotations: Vec<f32>,
    pub highlights: Vec<f32>,
    pub plate: PlatePose,
    pub transition: Option<Transition>,
    pub verdict: Option<Verdict>,
    pub board_shown: bool,
}

impl StageState {
    fn new(barrels: usize) -> Self {
        Self {
            geometry: None,
            rotations: vec![0.0; barrels],
            highlights: vec![0.0; barrels],
            plate: PlatePose::parked(),
            transition: None,
            verdict: None,
            board_shown: false,
        }
    }

    fn apply(&mut self, cmd: &Command) {
        match cmd {
            Command::Reflow(geometry) => self.geometry = Some(geometry.clone()),
            Command::RotateBarrel { index, degrees } => {
                if let Some(r) = self.rotations.get_mut(*index) {
                    *r = *degrees;
                }
            }
            Command::SetHighlight { index, opacity } => {
                if let Some(h) = self.highlights.get_mut(*index) {
                    *h = *opacity;
                }
            }
            Command::PlacePlate(pose) => {
                let transform = match pose.transform {
                    PlateTransform::Keep => self.plate.transform,
                    other => other,
                };
                self.plate = PlatePose {
                    transform,
                    ..*pose
                };
            }
            Command::SetPlateTransition(t) => self.transition = *t,
            Command::ShowVerdict(v) => self.verdict = Some(*v),
            Command::ShowBoard => self.board_shown = true,
            Command::Play { .. } | Command::StartTimer { .. } | Command::CancelTimer(_) => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Pending {
    Timer(TimerId, Timer),
    ClipEnd(Clip),
}

/// Session plus simulated collaborators
pub struct Headless {
    pub session: Session,
    pub stage: StageState,
    bank: ClipBank,
    /// Clips the player refuses to start, like a browser without a user gesture
    refused: Vec<Clip>,
    clip_ms: u64,
    now_ms: u64,
    /// Keyed by (due time, insertion order)
    pending: BTreeMap<(u64, u64), Pending>,
    seq: u64,
    /// Every clip that actually made a sound, in order
    pub played: Vec<Clip>,
    /// Every command executed, in order
    pub history: Vec<Command>,
}

impl Headless {
    pub fn new(session: Session) -> Self {
        let stage = StageState::new(session.barrels.len());
        Self {
            session,
            stage,
            bank: ClipBank::all_ready(),
            refused: Vec::new(),
            clip_ms: CLIP_MS,
            now_ms: 0,
            pending: BTreeMap::new(),
            seq: 0,
            played: Vec::new(),
            history: Vec::new(),
        }
    }

    /// Use a bank with missing clips
    pub fn with_bank(mut self, bank: ClipBank) -> Self {
        self.bank = bank;
        self
    }

    /// Refuse to play `clip`; the refusal arrives after the current event
    pub fn with_refused(mut self, clip: Clip) -> Self {
        self.refused.push(clip);
        self
    }

    pub fn with_clip_ms(mut self, ms: u64) -> Self {
        self.clip_ms = ms;
        self
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Timers and clip endings still to come
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Armed timers of one kind
    pub fn pending_timers(&self, kind: Timer) -> usize {
        self.pending
            .values()
            .filter(|p| matches!(p, Pending::Timer(_, t) if *t == kind))
            .count()
    }

    /// Deliver an event now, along with anything it triggers synchronously
    pub fn send(&mut self, event: Event) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            for cmd in dispatch(&mut self.session, event) {
                self.execute(cmd, &mut queue);
            }
        }
    }

    /// Move the clock forward, firing everything that falls due
    pub fn advance(&mut self, ms: u64) {
        let until = self.now_ms + ms;
        while let Some((&(due, seq), _)) = self.pending.first_key_value() {
            if due > until {
                break;
            }
            let Some(item) = self.pending.remove(&(due, seq)) else {
                break;
            };
            self.now_ms = due;
            self.fire(item);
        }
        self.now_ms = until;
    }

    /// Fire the next pending item, jumping the clock to it
    pub fn step(&mut self) -> bool {
        let Some(((due, _), item)) = self.pending.pop_first() else {
            return false;
        };
        self.now_ms = due;
        self.fire(item);
        true
    }

    fn fire(&mut self, item: Pending) {
        match item {
            Pending::Timer(id, timer) => self.send(Event::TimerFired { id, timer }),
            Pending::ClipEnd(clip) => self.send(Event::ClipEnded(clip)),
        }
    }

    fn schedule(&mut self, delay_ms: u64, item: Pending) {
        self.seq += 1;
        self.pending.insert((self.now_ms + delay_ms, self.seq), item);
    }

    fn execute(&mut self, cmd: Command, queue: &mut VecDeque<Event>) {
        self.stage.apply(&cmd);
        match &cmd {
            Command::Play { clip, notify } => {
                if self.refused.contains(clip) {
                    log::warn!("{} was refused", clip.name());
                    if *notify {
                        self.schedule(0, Pending::ClipEnd(*clip));
                    }
                } else if self.bank.is_available(*clip) {
                    self.played.push(*clip);
                    if *notify {
                        self.schedule(self.clip_ms, Pending::ClipEnd(*clip));
                    }
                } else if *notify {
                    log::debug!("{} is absent, completing at once", clip.name());
                    queue.push_back(Event::ClipEnded(*clip));
                }
            }
            Command::StartTimer {
                id,
                timer,
                delay_ms,
            } => self.schedule(*delay_ms as u64, Pending::Timer(*id, *timer)),
            Command::CancelTimer(id) => {
                self.pending
                    .retain(|_, p| !matches!(p, Pending::Timer(t, _) if t == id));
            }
            _ => {}
        }
        self.history.push(cmd);
    }
}
