//! Pointer tracking for hover highlights
//!
//! Turns raw "barrel under the pointer" samples into `PointerOver` /
//! `PointerOut` events, and forgets the hovered barrel whenever the board is
//! redrawn for a new round (all highlights are dimmed then).

use crate::game::{Command, Event};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hover {
    current: Option<usize>,
}

impl Hover {
    pub fn new() -> Self {
        Self::default()
    }

    /// Barrel the pointer is believed to be over
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Pointer moved; `hit` is the barrel now under it, if any
    pub fn moved(&mut self, hit: Option<usize>) -> Vec<Event> {
        if hit == self.current {
            return Vec::new();
        }
        let mut events = Vec::with_capacity(2);
        if let Some(old) = std::mem::replace(&mut self.current, hit) {
            events.push(Event::PointerOut(old));
        }
        if let Some(new) = hit {
            events.push(Event::PointerOver(new));
        }
        events
    }

    /// Pointer left the board
    pub fn left(&mut self) -> Option<Event> {
        self.current.take().map(Event::PointerOut)
    }

    /// Forget the hovered barrel without an event (tap, board redraw)
    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Track commands on their way to the stage
    pub fn observe(&mut self, cmd: &Command) {
        if matches!(cmd, Command::ShowBoard) {
            self.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Clip;
    use crate::game::{Phase, Session, Timer, dispatch};
    use crate::layout::Viewport;
    use crate::settings::Settings;

    #[test]
    fn test_moves_between_barrels() {
        let mut h = Hover::new();
        assert_eq!(h.moved(Some(2)), vec![Event::PointerOver(2)]);
        assert!(h.moved(Some(2)).is_empty());
        assert_eq!(
            h.moved(Some(5)),
            vec![Event::PointerOut(2), Event::PointerOver(5)]
        );
        assert_eq!(h.moved(None), vec![Event::PointerOut(5)]);
        assert_eq!(h.left(), None);
    }

    #[test]
    fn test_left_board() {
        let mut h = Hover::new();
        h.moved(Some(1));
        assert_eq!(h.left(), Some(Event::PointerOut(1)));
        assert_eq!(h.current(), None);
    }

    #[test]
    fn test_resting_pointer_relights_after_round() {
        fn run(s: &mut Session, h: &mut Hover, event: Event) -> Vec<Command> {
            let cmds = dispatch(s, event);
            for cmd in &cmds {
                h.observe(cmd);
            }
            cmds
        }

        let mut s = Session::new(&Settings::default(), 11);
        let mut h = Hover::new();
        run(&mut s, &mut h, Event::Resize(Viewport::new(1024.0, 768.0)));
        run(&mut s, &mut h, Event::Start);
        run(&mut s, &mut h, Event::ClipEnded(Clip::Welcome));
        assert_eq!(s.phase, Phase::Idle);

        // Pointer rests on barrel 4 and stays there through a whole round
        for event in h.moved(Some(4)) {
            run(&mut s, &mut h, event);
        }
        h.clear();
        run(&mut s, &mut h, Event::Tap(4));
        let cmds = run(&mut s, &mut h, Event::ClipEnded(Clip::Knock));
        let fade = cmds.iter().find_map(|c| match c {
            Command::StartTimer {
                id,
                timer: Timer::FadeIn,
                ..
            } => Some(*id),
            _ => None,
        });
        run(
            &mut s,
            &mut h,
            Event::TimerFired {
                id: fade.unwrap(),
                timer: Timer::FadeIn,
            },
        );
        // A move onto barrel 4 during the round is swallowed by the session
        for event in h.moved(Some(4)) {
            run(&mut s, &mut h, event);
        }
        run(&mut s, &mut h, Event::Dismiss);
        assert_eq!(s.phase, Phase::Idle);
        assert_eq!(h.current(), None);

        // The next sample over the same barrel lights it again
        let events = h.moved(Some(4));
        assert_eq!(events, vec![Event::PointerOver(4)]);
        let cmds = run(&mut s, &mut h, events[0].clone());
        assert!(cmds.contains(&Command::SetHighlight {
            index: 4,
            opacity: s.timing.highlight
        }));
    }
}
