use log::{info, warn};

use super::store::{ClosurePatch, GraphStore, LockStatus, SignalPatch};

/// Result of an operator route command. Rejections carry the reason and
/// are normal outcomes, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Accepted,
    Rejected(String),
}

impl CommandOutcome {
    pub fn ok(&self) -> bool {
        match *self {
            CommandOutcome::Accepted => true,
            CommandOutcome::Rejected(_) => false,
        }
    }

    pub fn message(&self) -> &str {
        match *self {
            CommandOutcome::Accepted => "",
            CommandOutcome::Rejected(ref m) => m,
        }
    }
}

/// Train claims a block: occupancy set and lock forced to ENTERING,
/// whatever the previous state. Unknown names are tolerated no-ops,
/// telemetry may mention blocks outside this interlocking.
pub fn enter_block(store: &mut dyn GraphStore, name: &str, train: &str) {
    let mut known = false;
    if store.get_signal(name).is_some() {
        store.update_signal(
            name,
            SignalPatch {
                occupant: Some(Some(train.to_string())),
                lock: Some(LockStatus::Entering),
            },
        );
        known = true;
    }
    if store.get_closure(name).is_some() {
        store.update_closure(name, ClosurePatch { occupant: Some(Some(train.to_string())) });
        known = true;
    }
    if known {
        info!("train {} entering {}", train, name);
    } else {
        warn!("enter event for unknown block {} (train {})", name, train);
    }
}

/// ENTERING -> ENTERED once the train is fully inside. Requires the
/// occupant to match; a mismatch is a stale or duplicate event.
pub fn entering_complete(store: &mut dyn GraphStore, name: &str, train: &str) {
    let occupant = store.get_signal(name).map(|s| s.occupant.clone());
    match occupant {
        Some(Some(ref t)) if t == train => {
            store.update_signal(name, SignalPatch { lock: Some(LockStatus::Entered), ..Default::default() });
            info!("train {} entered {}", train, name);
        }
        Some(Some(t)) => {
            warn!("entering-complete for {} from train {}, but occupant is {}", name, train, t);
        }
        Some(None) => {
            warn!("entering-complete for unoccupied signal {} (train {})", name, train);
        }
        None => {
            warn!("entering-complete for unknown signal {} (train {})", name, train);
        }
    }
}

/// Train cleared the block: release occupancy, lock back to CLOSED. A
/// mismatched occupant leaves the record alone so a late event cannot
/// clear another train's claim.
pub fn leave_block(store: &mut dyn GraphStore, name: &str, train: &str) {
    let signal_occupant = store.get_signal(name).map(|s| s.occupant.clone());
    match signal_occupant {
        Some(Some(ref t)) if t == train => {
            store.update_signal(
                name,
                SignalPatch { occupant: Some(None), lock: Some(LockStatus::Closed) },
            );
            info!("train {} left {}", train, name);
        }
        Some(Some(ref t)) => {
            warn!("leave event for {} from train {}, but occupant is {}", name, train, t);
        }
        Some(None) => {
            warn!("leave event for unoccupied signal {} (train {})", name, train);
        }
        None => {}
    }

    let closure_occupant = store.get_closure(name).map(|c| c.occupant.clone());
    if let Some(Some(ref t)) = closure_occupant {
        if t == train {
            store.update_closure(name, ClosurePatch { occupant: Some(None) });
        }
    }

    if signal_occupant.is_none() && closure_occupant.is_none() {
        warn!("leave event for unknown block {} (train {})", name, train);
    }
}

/// Open a route: requires the signal CLOSED and every predecessor CLOSED
/// or ENTERED. A predecessor mid-ENTERING, or already OPENED for a
/// conflicting route, blocks the command.
pub fn open_route(store: &mut dyn GraphStore, name: &str) -> CommandOutcome {
    let lock = match store.get_signal(name) {
        Some(s) => s.lock,
        None => return CommandOutcome::Rejected(format!("no such signal: {}", name)),
    };
    if lock != LockStatus::Closed {
        return CommandOutcome::Rejected(format!("{} is not closed: {:?}", name, lock));
    }
    for pred in store.predecessors(name) {
        match pred.lock {
            LockStatus::Closed | LockStatus::Entered => {}
            status => {
                return CommandOutcome::Rejected(format!(
                    "{} is neither closed nor entered: {:?}",
                    pred.name, status
                ));
            }
        }
    }
    store.update_signal(name, SignalPatch { lock: Some(LockStatus::Opened), ..Default::default() });
    info!("route opened at {}", name);
    CommandOutcome::Accepted
}

/// Close an open route again.
pub fn close_route(store: &mut dyn GraphStore, name: &str) -> CommandOutcome {
    let lock = match store.get_signal(name) {
        Some(s) => s.lock,
        None => return CommandOutcome::Rejected(format!("no such signal: {}", name)),
    };
    if lock != LockStatus::Opened {
        return CommandOutcome::Rejected(format!("{} is not opened: {:?}", name, lock));
    }
    store.update_signal(name, SignalPatch { lock: Some(LockStatus::Closed), ..Default::default() });
    info!("route closed at {}", name);
    CommandOutcome::Accepted
}
