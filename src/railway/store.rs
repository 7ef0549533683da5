use std::collections::HashMap;

use failure_derive::Fail;
use smallvec::SmallVec;

use crate::input::dispatch::TrainName;
use crate::input::layout::{Direction, Layout, SignalKind};

/// Administrative route lock, meaningful for interlocking (non-block)
/// signals. Cycles CLOSED -> ENTERING -> ENTERED -> OPENED -> CLOSED.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LockStatus {
    Closed,
    Entering,
    Entered,
    Opened,
}

#[derive(Debug, Clone)]
pub struct Signal {
    pub name: String,
    pub direction: Direction,
    pub order: i64,
    pub kind: SignalKind,
    pub is_block_signal: bool,
    pub is_shunt: bool,
    pub occupant: Option<TrainName>,
    pub lock: LockStatus,
    pub successors: SmallVec<[String; 2]>,
}

/// Track circuit block, used by the stop-limit subsystem.
#[derive(Debug, Clone)]
pub struct Closure {
    pub name: String,
    pub direction: Direction,
    pub order: i64,
    pub length: f64,
    pub occupant: Option<TrainName>,
}

/// Partial update of a signal record. `None` leaves the field alone.
#[derive(Debug, Default)]
pub struct SignalPatch {
    pub occupant: Option<Option<TrainName>>,
    pub lock: Option<LockStatus>,
}

#[derive(Debug, Default)]
pub struct ClosurePatch {
    pub occupant: Option<Option<TrainName>>,
}

/// Storage seam for the interlocking core. Updates are atomic per record;
/// the core never depends on a concrete storage technology.
pub trait GraphStore {
    fn get_signal(&self, name: &str) -> Option<&Signal>;
    /// Signals of one direction with `order` in the closed interval
    /// `[min_order, max_order]`, ordered by `order`.
    fn signals_in_window(&self, direction: Direction, min_order: i64, max_order: i64) -> Vec<&Signal>;
    /// Every signal, ordered by `(direction, order)`.
    fn all_signals(&self) -> Vec<&Signal>;
    /// Signals listing `name` among their successors.
    fn predecessors(&self, name: &str) -> Vec<&Signal>;
    fn update_signal(&mut self, name: &str, patch: SignalPatch) -> bool;

    fn get_closure(&self, name: &str) -> Option<&Closure>;
    fn closures_in_window(&self, direction: Direction, min_order: i64, max_order: i64) -> Vec<&Closure>;
    fn update_closure(&mut self, name: &str, patch: ClosurePatch) -> bool;
}

#[derive(Debug, Fail)]
pub enum LayoutError {
    #[fail(display = "duplicate record name: {}", _0)]
    DuplicateName(String),
    #[fail(display = "duplicate {} order {}, orders must be strictly increasing", _0, _1)]
    DuplicateOrder(&'static str, i64),
    #[fail(display = "signal {} links to unknown signal {}", _0, _1)]
    UnknownSuccessor(String, String),
    #[fail(display = "signal {} links across directions to {}", _0, _1)]
    DirectionMismatch(String, String),
    #[fail(display = "signal {} links upstream to {}, successors must lie ahead", _0, _1)]
    BackwardSuccessor(String, String),
}

/// In-memory graph store with per-direction order indexes and derived
/// predecessor links.
#[derive(Debug)]
pub struct MemoryStore {
    signals: HashMap<String, Signal>,
    closures: HashMap<String, Closure>,
    signal_index: Vec<(Direction, i64, String)>,
    closure_index: Vec<(Direction, i64, String)>,
    predecessor_names: HashMap<String, Vec<String>>,
}

impl MemoryStore {
    pub fn from_layout(layout: &Layout) -> Result<MemoryStore, LayoutError> {
        let mut signals = HashMap::new();
        let mut closures = HashMap::new();

        for spec in &layout.signals {
            let signal = Signal {
                name: spec.name.clone(),
                direction: spec.direction,
                order: spec.order,
                kind: spec.kind,
                is_block_signal: spec.is_block_signal,
                is_shunt: spec.is_shunt,
                occupant: None,
                lock: LockStatus::Closed,
                successors: spec.successors.clone(),
            };
            if signals.insert(spec.name.clone(), signal).is_some() {
                return Err(LayoutError::DuplicateName(spec.name.clone()));
            }
        }
        for spec in &layout.closures {
            let closure = Closure {
                name: spec.name.clone(),
                direction: spec.direction,
                order: spec.order,
                length: spec.length,
                occupant: None,
            };
            if closures.insert(spec.name.clone(), closure).is_some() {
                return Err(LayoutError::DuplicateName(spec.name.clone()));
            }
        }

        let signal_index = build_index("signal", layout.signals.iter().map(|s| (s.direction, s.order, s.name.clone())))?;
        let closure_index = build_index("closure", layout.closures.iter().map(|c| (c.direction, c.order, c.name.clone())))?;

        // Predecessors are the inverse of the successor links.
        let mut predecessor_names: HashMap<String, Vec<String>> = HashMap::new();
        for spec in &layout.signals {
            for next in &spec.successors {
                match signals.get(next.as_str()) {
                    None => {
                        return Err(LayoutError::UnknownSuccessor(spec.name.clone(), next.clone()));
                    }
                    Some(target) if target.direction != spec.direction => {
                        return Err(LayoutError::DirectionMismatch(spec.name.clone(), next.clone()));
                    }
                    // Successors are downstream by definition; a link that
                    // does not advance the order would make the graph cyclic.
                    Some(target) if target.order <= spec.order => {
                        return Err(LayoutError::BackwardSuccessor(spec.name.clone(), next.clone()));
                    }
                    Some(_) => {}
                }
                predecessor_names.entry(next.clone()).or_insert_with(Vec::new).push(spec.name.clone());
            }
        }

        Ok(MemoryStore {
            signals: signals,
            closures: closures,
            signal_index: signal_index,
            closure_index: closure_index,
            predecessor_names: predecessor_names,
        })
    }
}

fn build_index<I>(class: &'static str, records: I) -> Result<Vec<(Direction, i64, String)>, LayoutError>
where
    I: Iterator<Item = (Direction, i64, String)>,
{
    let mut index: Vec<_> = records.collect();
    index.sort();
    for pair in index.windows(2) {
        if pair[0].0 == pair[1].0 && pair[0].1 == pair[1].1 {
            return Err(LayoutError::DuplicateOrder(class, pair[0].1));
        }
    }
    Ok(index)
}

impl GraphStore for MemoryStore {
    fn get_signal(&self, name: &str) -> Option<&Signal> {
        self.signals.get(name)
    }

    fn signals_in_window(&self, direction: Direction, min_order: i64, max_order: i64) -> Vec<&Signal> {
        self.signal_index
            .iter()
            .filter(|&&(d, o, _)| d == direction && min_order <= o && o <= max_order)
            .map(|&(_, _, ref name)| &self.signals[name])
            .collect()
    }

    fn all_signals(&self) -> Vec<&Signal> {
        self.signal_index.iter().map(|&(_, _, ref name)| &self.signals[name]).collect()
    }

    fn predecessors(&self, name: &str) -> Vec<&Signal> {
        match self.predecessor_names.get(name) {
            Some(names) => names.iter().map(|n| &self.signals[n]).collect(),
            None => vec![],
        }
    }

    fn update_signal(&mut self, name: &str, patch: SignalPatch) -> bool {
        match self.signals.get_mut(name) {
            Some(signal) => {
                if let Some(occupant) = patch.occupant {
                    signal.occupant = occupant;
                }
                if let Some(lock) = patch.lock {
                    signal.lock = lock;
                }
                true
            }
            None => false,
        }
    }

    fn get_closure(&self, name: &str) -> Option<&Closure> {
        self.closures.get(name)
    }

    fn closures_in_window(&self, direction: Direction, min_order: i64, max_order: i64) -> Vec<&Closure> {
        self.closure_index
            .iter()
            .filter(|&&(d, o, _)| d == direction && min_order <= o && o <= max_order)
            .map(|&(_, _, ref name)| &self.closures[name])
            .collect()
    }

    fn update_closure(&mut self, name: &str, patch: ClosurePatch) -> bool {
        match self.closures.get_mut(name) {
            Some(closure) => {
                if let Some(occupant) = patch.occupant {
                    closure.occupant = occupant;
                }
                true
            }
            None => false,
        }
    }
}
