//! Session state machine
//!
//! `dispatch` is the only way the session changes. Every handler first checks
//! that the session is still in the phase the event was meant for; late clip
//! endings and timers from an earlier round fall through as no-ops.

use super::command::{Command, Event, PlatePose, PlateTransform, Timer, TimerId, Transition};
use super::state::{Phase, Session};
use super::verdict::Verdict;
use crate::audio::Clip;
use crate::layout::Viewport;

/// Apply one event and return the side effects it asks for
pub fn dispatch(session: &mut Session, event: Event) -> Vec<Command> {
    let mut out = Vec::new();
    match event {
        Event::Start => start(session, &mut out),
        Event::ClipEnded(Clip::Welcome) => welcomed(session, &mut out),
        Event::ClipEnded(Clip::Knock) => answer(session, &mut out),
        Event::ClipEnded(clip) => log::debug!("{} finished", clip.name()),
        Event::Tap(index) => tap(session, index, &mut out),
        Event::Dismiss => dismiss(session, None, &mut out),
        Event::PointerOver(index) => highlight(session, index, true, &mut out),
        Event::PointerOut(index) => highlight(session, index, false, &mut out),
        Event::TimerFired {
            timer: Timer::FadeIn,
            ..
        } => fade_in(session, &mut out),
        Event::TimerFired {
            id,
            timer: Timer::AutoDismiss,
        } => {
            if session.dismiss_timer == Some(id) {
                log::info!("Plate timed out");
                dismiss(session, Some(id), &mut out);
            } else {
                log::debug!("Stale auto-dismiss {:?} ignored", id);
            }
        }
        Event::Resize(viewport) => resize(session, viewport, &mut out),
    }
    out
}

fn start(session: &mut Session, out: &mut Vec<Command>) {
    if session.phase != Phase::Startup || session.welcomed {
        log::debug!("Start ignored in {:?}", session.phase);
        return;
    }
    session.welcomed = true;
    log::info!("Welcome (seed {})", session.seed);
    out.push(Command::Play {
        clip: Clip::Welcome,
        notify: true,
    });
}

fn welcomed(session: &mut Session, out: &mut Vec<Command>) {
    if session.phase != Phase::Startup {
        log::debug!("Late welcome ending ignored");
        return;
    }
    enter_idle(session, out);
}

/// New secret, fresh angles, board open for taps
fn enter_idle(session: &mut Session, out: &mut Vec<Command>) {
    session.reshuffle();
    session.tapped = None;
    session.verdict = None;
    for barrel in &session.barrels {
        out.push(Command::RotateBarrel {
            index: barrel.index,
            degrees: barrel.angle,
        });
        out.push(Command::SetHighlight {
            index: barrel.index,
            opacity: 0.0,
        });
    }
    out.push(Command::ShowBoard);
    session.phase = Phase::Idle;
    log::info!("Idle: barrel {} shows hour {}", session.marked_barrel(), session.hour);
}

fn tap(session: &mut Session, index: usize, out: &mut Vec<Command>) {
    if session.phase != Phase::Idle {
        return;
    }
    if index >= session.barrels.len() {
        log::debug!("Tap on unknown barrel {}", index);
        return;
    }
    session.tapped = Some(index);
    out.push(Command::SetPlateTransition(None));
    out.push(Command::PlacePlate(PlatePose {
        position: session.geometry.plate_anchor(index),
        centered: true,
        transform: PlateTransform::Reset,
    }));
    out.push(Command::Play {
        clip: Clip::Knock,
        notify: true,
    });
    session.phase = Phase::Knocking;
    log::info!("Knocking on barrel {}", index);
}

fn answer(session: &mut Session, out: &mut Vec<Command>) {
    if session.phase != Phase::Knocking {
        log::debug!("Stale knock ending ignored in {:?}", session.phase);
        return;
    }
    let Some(tapped) = session.tapped else {
        return;
    };

    let target = session.target;
    let verdict = Verdict::judge(tapped, target, session.rng_mut());
    session.verdict = Some(verdict);

    let spin = verdict.spin();
    let barrel = &mut session.barrels[tapped];
    barrel.highlighted = false;
    barrel.angle += spin;
    out.push(Command::SetHighlight {
        index: tapped,
        opacity: 0.0,
    });
    out.push(Command::ShowVerdict(verdict));
    out.push(Command::RotateBarrel {
        index: tapped,
        degrees: barrel.angle,
    });

    let transition_ms = session.timing.transition_ms;
    out.push(Command::SetPlateTransition(Some(Transition::linear(
        transition_ms,
    ))));
    out.push(Command::PlacePlate(PlatePose {
        position: Some(session.geometry.plate.corner),
        centered: false,
        transform: PlateTransform::Spin(2.0 * spin),
    }));
    out.push(Command::Play {
        clip: if verdict.is_granted() {
            Clip::Granted
        } else {
            Clip::Denied
        },
        notify: false,
    });

    // Re-arm auto-dismiss
    if let Some(old) = session.dismiss_timer.take() {
        out.push(Command::CancelTimer(old));
    }
    let dismiss_id = session.next_timer_id();
    session.dismiss_timer = Some(dismiss_id);
    out.push(Command::StartTimer {
        id: dismiss_id,
        timer: Timer::AutoDismiss,
        delay_ms: session.timing.plate_timeout_ms,
    });
    let fade_id = session.next_timer_id();
    out.push(Command::StartTimer {
        id: fade_id,
        timer: Timer::FadeIn,
        delay_ms: transition_ms,
    });

    session.phase = Phase::FadingIn;
    log::info!(
        "Barrel {} answers: {}",
        tapped,
        if verdict.is_granted() { "granted" } else { "denied" }
    );
}

fn fade_in(session: &mut Session, out: &mut Vec<Command>) {
    if session.phase != Phase::FadingIn {
        log::debug!("Stale fade-in ignored in {:?}", session.phase);
        return;
    }
    out.push(Command::SetPlateTransition(None));
    session.phase = Phase::Waiting;
}

/// Close the plate and start a new round. `fired` is the auto-dismiss timer
/// that triggered this, which needs no cancelling.
fn dismiss(session: &mut Session, fired: Option<TimerId>, out: &mut Vec<Command>) {
    if session.phase != Phase::Waiting {
        return;
    }
    if let Some(id) = session.dismiss_timer.take() {
        if Some(id) != fired {
            out.push(Command::CancelTimer(id));
        }
    }
    out.push(Command::SetPlateTransition(Some(Transition::ease_in(
        session.timing.transition_ms,
    ))));
    out.push(Command::PlacePlate(PlatePose {
        position: Some(session.geometry.plate_offscreen()),
        centered: false,
        transform: PlateTransform::Keep,
    }));
    // The slide-out plays on while the next round begins
    enter_idle(session, out);
}

fn highlight(session: &mut Session, index: usize, on: bool, out: &mut Vec<Command>) {
    if session.phase != Phase::Idle {
        return;
    }
    let opacity = if on { session.timing.highlight } else { 0.0 };
    let Some(barrel) = session.barrels.get_mut(index) else {
        return;
    };
    if barrel.highlighted == on {
        return;
    }
    barrel.highlighted = on;
    out.push(Command::SetHighlight { index, opacity });
}

fn resize(session: &mut Session, viewport: Viewport, out: &mut Vec<Command>) {
    session.resize(viewport);
    log::debug!(
        "Resized to {}x{}, radius {}",
        viewport.width,
        viewport.height,
        session.geometry.radius
    );
    out.push(Command::Reflow(session.geometry.clone()));
    match session.phase {
        Phase::Idle => {
            out.push(Command::SetPlateTransition(None));
            out.push(Command::PlacePlate(PlatePose::parked()));
        }
        Phase::FadingIn | Phase::Waiting => {
            out.push(Command::PlacePlate(PlatePose {
                position: Some(session.geometry.plate.corner),
                centered: false,
                transform: PlateTransform::Keep,
            }));
        }
        Phase::Startup | Phase::Knocking => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn idle_session(seed: u64) -> Session {
        let mut s = Session::new(&Settings::default(), seed);
        dispatch(&mut s, Event::Resize(Viewport::new(1024.0, 768.0)));
        let cmds = dispatch(&mut s, Event::Start);
        assert_eq!(
            cmds,
            vec![Command::Play {
                clip: Clip::Welcome,
                notify: true
            }]
        );
        dispatch(&mut s, Event::ClipEnded(Clip::Welcome));
        assert_eq!(s.phase, Phase::Idle);
        s
    }

    fn timer(cmds: &[Command], kind: Timer) -> Option<TimerId> {
        cmds.iter().find_map(|c| match c {
            Command::StartTimer { id, timer, .. } if *timer == kind => Some(*id),
            _ => None,
        })
    }

    #[test]
    fn test_tap_ignored_before_welcome() {
        let mut s = Session::new(&Settings::default(), 1);
        assert!(dispatch(&mut s, Event::Tap(0)).is_empty());
        dispatch(&mut s, Event::Start);
        assert!(dispatch(&mut s, Event::Tap(0)).is_empty());
        // Second start does not replay the welcome
        assert!(dispatch(&mut s, Event::Start).is_empty());
    }

    #[test]
    fn test_enter_idle_rotates_every_barrel() {
        let mut s = Session::new(&Settings::default(), 3);
        dispatch(&mut s, Event::Start);
        let cmds = dispatch(&mut s, Event::ClipEnded(Clip::Welcome));
        let rotations = cmds
            .iter()
            .filter(|c| matches!(c, Command::RotateBarrel { .. }))
            .count();
        assert_eq!(rotations, 19);
        assert_eq!(cmds.last(), Some(&Command::ShowBoard));
    }

    #[test]
    fn test_tap_places_plate_at_barrel() {
        let mut s = idle_session(11);
        let cmds = dispatch(&mut s, Event::Tap(4));
        assert_eq!(s.phase, Phase::Knocking);
        assert_eq!(s.tapped, Some(4));
        let anchor = s.geometry.plate_anchor(4);
        assert!(cmds.contains(&Command::PlacePlate(PlatePose {
            position: anchor,
            centered: true,
            transform: PlateTransform::Reset,
        })));
        assert!(cmds.contains(&Command::Play {
            clip: Clip::Knock,
            notify: true
        }));
        // Taps while knocking are swallowed
        assert!(dispatch(&mut s, Event::Tap(5)).is_empty());
        assert_eq!(s.tapped, Some(4));
    }

    #[test]
    fn test_tap_out_of_range() {
        let mut s = idle_session(11);
        assert!(dispatch(&mut s, Event::Tap(99)).is_empty());
        assert_eq!(s.phase, Phase::Idle);
    }

    #[test]
    fn test_granted_round() {
        let mut s = idle_session(21);
        let target = s.target;
        let before = s.barrels[target].angle;

        dispatch(&mut s, Event::Tap(target));
        let cmds = dispatch(&mut s, Event::ClipEnded(Clip::Knock));
        assert_eq!(s.phase, Phase::FadingIn);
        assert_eq!(s.verdict, Some(Verdict::Granted));
        assert_eq!(s.barrels[target].angle, before + 360.0);
        assert!(cmds.contains(&Command::Play {
            clip: Clip::Granted,
            notify: false
        }));
        assert!(cmds.contains(&Command::PlacePlate(PlatePose {
            position: Some(s.geometry.plate.corner),
            centered: false,
            transform: PlateTransform::Spin(720.0),
        })));

        let fade = timer(&cmds, Timer::FadeIn).unwrap();
        let cmds = dispatch(
            &mut s,
            Event::TimerFired {
                id: fade,
                timer: Timer::FadeIn,
            },
        );
        assert_eq!(cmds, vec![Command::SetPlateTransition(None)]);
        assert_eq!(s.phase, Phase::Waiting);

        let dismiss_id = s.dismiss_timer.unwrap();
        let cmds = dispatch(&mut s, Event::Dismiss);
        assert_eq!(s.phase, Phase::Idle);
        assert_eq!(cmds[0], Command::CancelTimer(dismiss_id));
        assert!(s.dismiss_timer.is_none());
        assert!(s.tapped.is_none());
    }

    #[test]
    fn test_denied_round() {
        let mut s = idle_session(5);
        let wrong = (s.target + 1) % s.barrels.len();
        dispatch(&mut s, Event::Tap(wrong));
        let cmds = dispatch(&mut s, Event::ClipEnded(Clip::Knock));
        let verdict = s.verdict.unwrap();
        assert!(!verdict.is_granted());
        assert!(cmds.contains(&Command::ShowVerdict(verdict)));
        assert!(cmds.contains(&Command::Play {
            clip: Clip::Denied,
            notify: false
        }));
        assert!(cmds.iter().any(|c| matches!(
            c,
            Command::PlacePlate(PlatePose {
                transform: PlateTransform::Spin(deg),
                ..
            }) if *deg == -720.0
        )));
    }

    #[test]
    fn test_dismiss_outside_waiting_is_inert() {
        let mut s = Session::new(&Settings::default(), 2);
        assert!(dispatch(&mut s, Event::Dismiss).is_empty());
        let mut s = idle_session(2);
        assert!(dispatch(&mut s, Event::Dismiss).is_empty());
        dispatch(&mut s, Event::Tap(0));
        assert!(dispatch(&mut s, Event::Dismiss).is_empty());
        dispatch(&mut s, Event::ClipEnded(Clip::Knock));
        assert!(dispatch(&mut s, Event::Dismiss).is_empty());
        assert_eq!(s.phase, Phase::FadingIn);
    }

    #[test]
    fn test_stale_knock_ending() {
        let mut s = idle_session(8);
        dispatch(&mut s, Event::Tap(1));
        dispatch(&mut s, Event::ClipEnded(Clip::Knock));
        let verdict = s.verdict;
        // A second ending of the same knock changes nothing
        assert!(dispatch(&mut s, Event::ClipEnded(Clip::Knock)).is_empty());
        assert_eq!(s.phase, Phase::FadingIn);
        assert_eq!(s.verdict, verdict);
    }

    #[test]
    fn test_auto_dismiss_only_when_armed() {
        let mut s = idle_session(13);
        dispatch(&mut s, Event::Tap(2));
        let cmds = dispatch(&mut s, Event::ClipEnded(Clip::Knock));
        let auto = timer(&cmds, Timer::AutoDismiss).unwrap();
        let fade = timer(&cmds, Timer::FadeIn).unwrap();
        dispatch(
            &mut s,
            Event::TimerFired {
                id: fade,
                timer: Timer::FadeIn,
            },
        );

        // Unknown id is ignored
        let stale = Event::TimerFired {
            id: TimerId(9999),
            timer: Timer::AutoDismiss,
        };
        assert!(dispatch(&mut s, stale).is_empty());
        assert_eq!(s.phase, Phase::Waiting);

        let cmds = dispatch(
            &mut s,
            Event::TimerFired {
                id: auto,
                timer: Timer::AutoDismiss,
            },
        );
        assert_eq!(s.phase, Phase::Idle);
        // The firing timer is not cancelled again
        assert!(!cmds.iter().any(|c| matches!(c, Command::CancelTimer(_))));
    }

    #[test]
    fn test_highlight_only_in_idle() {
        let mut s = idle_session(4);
        let cmds = dispatch(&mut s, Event::PointerOver(3));
        assert_eq!(
            cmds,
            vec![Command::SetHighlight {
                index: 3,
                opacity: 0.33
            }]
        );
        // Repeated hover is coalesced
        assert!(dispatch(&mut s, Event::PointerOver(3)).is_empty());
        dispatch(&mut s, Event::Tap(3));
        assert!(dispatch(&mut s, Event::PointerOut(3)).is_empty());
        let cmds = dispatch(&mut s, Event::ClipEnded(Clip::Knock));
        assert!(cmds.contains(&Command::SetHighlight {
            index: 3,
            opacity: 0.0
        }));
    }

    #[test]
    fn test_resize_moves_shown_plate() {
        let mut s = idle_session(6);
        let cmds = dispatch(&mut s, Event::Resize(Viewport::new(800.0, 600.0)));
        assert!(cmds.contains(&Command::PlacePlate(PlatePose::parked())));

        dispatch(&mut s, Event::Tap(0));
        dispatch(&mut s, Event::ClipEnded(Clip::Knock));
        let cmds = dispatch(&mut s, Event::Resize(Viewport::new(640.0, 480.0)));
        assert!(matches!(cmds[0], Command::Reflow(_)));
        assert!(cmds.contains(&Command::PlacePlate(PlatePose {
            position: Some(s.geometry.plate.corner),
            centered: false,
            transform: PlateTransform::Keep,
        })));
    }

    #[test]
    fn test_resize_after_round_hides_old_plate() {
        let mut s = idle_session(8);
        dispatch(&mut s, Event::Tap(2));
        let cmds = dispatch(&mut s, Event::ClipEnded(Clip::Knock));
        let fade = timer(&cmds, Timer::FadeIn).unwrap();
        dispatch(
            &mut s,
            Event::TimerFired {
                id: fade,
                timer: Timer::FadeIn,
            },
        );
        assert_eq!(s.phase, Phase::Waiting);
        dispatch(&mut s, Event::Dismiss);
        assert_eq!(s.phase, Phase::Idle);

        let cmds = dispatch(&mut s, Event::Resize(Viewport::new(1000.0, 700.0)));
        let pose = cmds.iter().find_map(|c| match c {
            Command::PlacePlate(pose) => Some(*pose),
            _ => None,
        });
        assert_eq!(pose.map(|p| p.transform), Some(PlateTransform::Reset));
        assert_eq!(pose.and_then(|p| p.position), None);
    }
}
