use std::collections::HashMap;
use std::fmt;

use log::warn;

use super::store::{GraphStore, LockStatus, Signal};
use crate::input::layout::SignalKind;

/// Number of signals ahead considered when deriving a phase.
pub const LOOKAHEAD_HOPS: i64 = 6;

/// Context train name for read-only dashboard queries. Matches no real
/// train, so every occupied block reads as stop.
pub const DISPLAY_CONTEXT: &str = "*display*";

/// Displayable signal indication, ordered from most to least restrictive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    R,
    YY,
    Y,
    YG,
    G,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match *self {
            Phase::R => "R",
            Phase::YY => "YY",
            Phase::Y => "Y",
            Phase::YG => "YG",
            Phase::G => "G",
        };
        write!(f, "{}", s)
    }
}

/// What the head actually displays. Shunting signals show a dedicated
/// green aspect instead of the running-line G.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Aspect {
    Running(Phase),
    SwitchG,
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Aspect::Running(p) => write!(f, "{}", p),
            Aspect::SwitchG => write!(f, "SwitchG"),
        }
    }
}

impl SignalKind {
    /// Ordered aspects the head can show, most restrictive first.
    pub fn ladder(&self) -> &'static [Phase] {
        use self::Phase::*;
        match *self {
            SignalKind::One => &[R],
            SignalKind::TwoA => &[R, Y],
            SignalKind::TwoB => &[R, G],
            SignalKind::ThreeA => &[R, YY, Y],
            SignalKind::ThreeB => &[R, Y, G],
            SignalKind::FourA => &[R, YY, Y, G],
            SignalKind::FourB => &[R, Y, YG, G],
            SignalKind::Five => &[R, YY, Y, YG, G],
        }
    }
}

/// One rung up the head's aspect ladder, clamped at the top. A phase the
/// head cannot show falls back to the bottom rung (stop).
pub fn step_up(phase: Phase, kind: SignalKind) -> Phase {
    let ladder = kind.ladder();
    match ladder.iter().position(|p| *p == phase) {
        Some(i) if i + 1 < ladder.len() => ladder[i + 1],
        Some(_) => ladder[ladder.len() - 1],
        None => ladder[0],
    }
}

/// Station/route check for interlocking (non-block) signals.
pub fn may_clear(signal: &Signal, train: &str) -> bool {
    match signal.occupant {
        Some(ref t) if t != train => false,
        Some(_) => signal.lock == LockStatus::Entering || signal.lock == LockStatus::Entered,
        None => signal.lock == LockStatus::Opened,
    }
}

/// Phase of one signal as seen by `train`, over the `[order, order + 6]`
/// window of its direction. Unknown signals read as stop.
pub fn phase_of(store: &dyn GraphStore, name: &str, train: &str) -> Phase {
    let signal = match store.get_signal(name) {
        Some(s) => s,
        None => {
            warn!("phase query for unknown signal {}", name);
            return Phase::R;
        }
    };
    let window: HashMap<&str, &Signal> = store
        .signals_in_window(signal.direction, signal.order, signal.order + LOOKAHEAD_HOPS)
        .into_iter()
        .map(|s| (s.name.as_str(), s))
        .collect();
    let mut memo = HashMap::new();
    resolve(&window, name, train, &mut memo)
}

/// Displayed aspect: `phase_of`, with G on a shunting signal shown as
/// SwitchG.
pub fn aspect_of(store: &dyn GraphStore, name: &str, train: &str) -> Aspect {
    let phase = phase_of(store, name, train);
    match store.get_signal(name) {
        Some(s) if s.is_shunt && phase == Phase::G => Aspect::SwitchG,
        _ => Aspect::Running(phase),
    }
}

/// Phases for every signal in one pass, ordered by `(direction, order)`,
/// sharing one memo table under the display context. Successor links never
/// cross directions, so a single table is safe.
pub fn all_phases(store: &dyn GraphStore) -> Vec<(String, Aspect, SignalKind)> {
    let signals = store.all_signals();
    let window: HashMap<&str, &Signal> = signals.iter().map(|s| (s.name.as_str(), *s)).collect();
    let mut memo = HashMap::new();
    signals
        .iter()
        .map(|s| {
            let phase = resolve(&window, &s.name, DISPLAY_CONTEXT, &mut memo);
            let aspect = if s.is_shunt && phase == Phase::G {
                Aspect::SwitchG
            } else {
                Aspect::Running(phase)
            };
            (s.name.clone(), aspect, s.kind)
        })
        .collect()
}

fn resolve(
    window: &HashMap<&str, &Signal>,
    name: &str,
    train: &str,
    memo: &mut HashMap<String, Phase>,
) -> Phase {
    if let Some(p) = memo.get(name) {
        return *p;
    }
    // Recursion exhausted the lookahead window: fail to stop.
    let signal = match window.get(name) {
        Some(s) => *s,
        None => return Phase::R,
    };
    // In-progress marker: a store whose links loop back into this signal
    // reads its own entry as stop instead of recursing without bound.
    memo.insert(signal.name.clone(), Phase::R);
    let phase = resolve_signal(window, signal, train, memo);
    memo.insert(signal.name.clone(), phase);
    phase
}

fn resolve_signal(
    window: &HashMap<&str, &Signal>,
    signal: &Signal,
    train: &str,
    memo: &mut HashMap<String, Phase>,
) -> Phase {
    if signal.occupant.as_ref().map_or(false, |t| t != train) {
        return Phase::R;
    }
    if !signal.is_block_signal && !may_clear(signal, train) {
        return Phase::R;
    }
    // Locking keeps at most one branch unlocked at a junction, so the max
    // selects the live branch and defaults to R.
    let mut best = Phase::R;
    let mut live = 0;
    for next in &signal.successors {
        let p = resolve(window, next, train, memo);
        if p > Phase::R {
            live += 1;
        }
        if p > best {
            best = p;
        }
    }
    if live > 1 {
        warn!("signal {}: {} branches show a proceed aspect at once", signal.name, live);
    }
    step_up(best, signal.kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::layout::{Direction, Layout, SignalSpec};
    use crate::railway::locking;
    use crate::railway::store::{MemoryStore, SignalPatch};

    fn sig(name: &str, order: i64, kind: SignalKind, next: &[&str]) -> SignalSpec {
        SignalSpec {
            name: name.to_string(),
            direction: Direction::Up,
            order: order,
            kind: kind,
            is_block_signal: true,
            is_shunt: false,
            successors: next.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn interlocking(name: &str, order: i64, kind: SignalKind, next: &[&str]) -> SignalSpec {
        SignalSpec { is_block_signal: false, ..sig(name, order, kind, next) }
    }

    fn store_of(signals: Vec<SignalSpec>) -> MemoryStore {
        MemoryStore::from_layout(&Layout { signals: signals, closures: vec![] }).unwrap()
    }

    fn occupy(store: &mut MemoryStore, name: &str, train: &str) {
        store.update_signal(
            name,
            SignalPatch { occupant: Some(Some(train.to_string())), ..Default::default() },
        );
    }

    #[test]
    fn ladders_are_monotone_and_clamped() {
        let kinds = [
            SignalKind::One,
            SignalKind::TwoA,
            SignalKind::TwoB,
            SignalKind::ThreeA,
            SignalKind::ThreeB,
            SignalKind::FourA,
            SignalKind::FourB,
            SignalKind::Five,
        ];
        for &kind in &kinds {
            let ladder = kind.ladder();
            assert_eq!(ladder[0], Phase::R);
            for &p in ladder {
                let up = step_up(p, kind);
                assert!(up >= p);
                assert!(ladder.contains(&up));
            }
            assert_eq!(step_up(*ladder.last().unwrap(), kind), *ladder.last().unwrap());
        }
    }

    #[test]
    fn two_a_never_exceeds_caution() {
        for &p in &[Phase::R, Phase::YY, Phase::Y, Phase::YG, Phase::G] {
            let up = step_up(p, SignalKind::TwoA);
            assert!(up == Phase::R || up == Phase::Y, "got {:?}", up);
        }
    }

    #[test]
    fn off_ladder_phase_drops_to_stop() {
        // TWO_B cannot show Y; stepping from it falls back to the bottom rung.
        assert_eq!(step_up(Phase::Y, SignalKind::TwoB), Phase::R);
    }

    #[test]
    fn cascade_reaches_green() {
        let store = store_of(vec![
            sig("a", 0, SignalKind::ThreeB, &["b"]),
            sig("b", 1, SignalKind::TwoB, &[]),
        ]);
        // b: step_up(R, TWO_B) = G; a: step_up(G, THREE_B) = G.
        assert_eq!(phase_of(&store, "b", "551"), Phase::G);
        assert_eq!(phase_of(&store, "a", "551"), Phase::G);
    }

    #[test]
    fn foreign_occupant_reads_stop() {
        let mut store = store_of(vec![
            sig("a", 0, SignalKind::ThreeB, &["b"]),
            sig("b", 1, SignalKind::TwoB, &[]),
        ]);
        occupy(&mut store, "b", "770");
        assert_eq!(phase_of(&store, "b", "551"), Phase::R);
        // The signal in rear steps up from the stop aspect.
        assert_eq!(phase_of(&store, "a", "551"), Phase::Y);
        // The occupying train itself is not stopped by its own claim.
        assert_eq!(phase_of(&store, "b", "770"), Phase::G);
    }

    #[test]
    fn unknown_signal_reads_stop() {
        let store = store_of(vec![]);
        assert_eq!(phase_of(&store, "ghost", "551"), Phase::R);
    }

    #[test]
    fn lookahead_window_is_six_hops() {
        // Successor beyond the window reads as absent (R); inside it, clear.
        let far = store_of(vec![
            sig("a", 0, SignalKind::ThreeB, &["b"]),
            sig("b", 7, SignalKind::TwoB, &[]),
        ]);
        assert_eq!(phase_of(&far, "a", "551"), Phase::Y);

        let near = store_of(vec![
            sig("a", 0, SignalKind::ThreeB, &["b"]),
            sig("b", 6, SignalKind::TwoB, &[]),
        ]);
        assert_eq!(phase_of(&near, "a", "551"), Phase::G);
    }

    #[test]
    fn junction_follows_the_open_branch() {
        let mut store = store_of(vec![
            sig("p", 0, SignalKind::ThreeB, &["left", "right"]),
            interlocking("left", 1, SignalKind::TwoB, &[]),
            interlocking("right", 2, SignalKind::TwoB, &[]),
        ]);
        // Both branches locked: nothing ahead clears.
        assert_eq!(phase_of(&store, "p", "551"), Phase::Y);

        assert!(locking::open_route(&mut store, "left").ok());
        assert_eq!(phase_of(&store, "left", "551"), Phase::G);
        assert_eq!(phase_of(&store, "right", "551"), Phase::R);
        // Parent steps up from the open branch, independent of the other.
        assert_eq!(phase_of(&store, "p", "551"), Phase::G);

        assert!(locking::close_route(&mut store, "left").ok());
        assert!(locking::open_route(&mut store, "right").ok());
        assert_eq!(phase_of(&store, "p", "551"), Phase::G);
    }

    #[test]
    fn interlocking_signal_requires_open_route() {
        let mut store = store_of(vec![interlocking("home", 0, SignalKind::TwoB, &[])]);
        assert_eq!(phase_of(&store, "home", "551"), Phase::R);
        assert!(locking::open_route(&mut store, "home").ok());
        assert_eq!(phase_of(&store, "home", "551"), Phase::G);
    }

    #[test]
    fn own_entering_train_keeps_clearance() {
        let mut store = store_of(vec![interlocking("home", 0, SignalKind::TwoB, &[])]);
        assert!(locking::open_route(&mut store, "home").ok());
        locking::enter_block(&mut store, "home", "551");
        assert_eq!(phase_of(&store, "home", "551"), Phase::G);
        assert_eq!(phase_of(&store, "home", "770"), Phase::R);
    }

    #[test]
    fn shunting_green_displays_switch_g() {
        let mut store = store_of(vec![SignalSpec {
            is_shunt: true,
            ..interlocking("shunt", 0, SignalKind::TwoB, &[])
        }]);
        assert_eq!(aspect_of(&store, "shunt", "551"), Aspect::Running(Phase::R));
        assert!(locking::open_route(&mut store, "shunt").ok());
        assert_eq!(aspect_of(&store, "shunt", "551"), Aspect::SwitchG);
    }

    #[test]
    fn whole_network_pass_uses_display_context() {
        use maplit::hashmap;
        let mut store = store_of(vec![
            sig("a", 0, SignalKind::ThreeB, &["b"]),
            sig("b", 1, SignalKind::ThreeB, &["c"]),
            sig("c", 2, SignalKind::TwoB, &[]),
        ]);
        occupy(&mut store, "c", "770");
        let phases: std::collections::HashMap<String, Aspect> =
            all_phases(&store).into_iter().map(|(n, a, _)| (n, a)).collect();
        // Occupied c reads R even for the occupying train's dashboard view.
        let expected = hashmap! {
            "a".to_string() => Aspect::Running(Phase::G),
            "b".to_string() => Aspect::Running(Phase::Y),
            "c".to_string() => Aspect::Running(Phase::R),
        };
        assert_eq!(phases, expected);
    }
}
