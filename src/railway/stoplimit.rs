use log::warn;

use super::store::GraphStore;

/// Number of blocks ahead considered when computing a stop limit.
pub const LOOKAHEAD_BLOCKS: i64 = 6;

/// Fixed safety buffer subtracted from the raw clear distance.
pub const STOP_MARGIN: f64 = 50.0;

/// Safe remaining distance for `train` from its current closure: block
/// lengths ahead up to the first foreign-occupied block, net of the
/// margin. Never negative; an unknown or foreign-occupied current block
/// forces an immediate stop.
pub fn stop_limit(store: &dyn GraphStore, name: &str, train: &str) -> f64 {
    let current = match store.get_closure(name) {
        Some(c) => c,
        None => {
            warn!("stop limit query for unknown closure {}", name);
            return 0.0;
        }
    };
    // Two trains in one block is never expected; emergency stop.
    if current.occupant.as_ref().map_or(false, |t| t != train) {
        return 0.0;
    }

    let mut clear = 0.0;
    let ahead = store.closures_in_window(
        current.direction,
        current.order + 1,
        current.order + LOOKAHEAD_BLOCKS,
    );
    for closure in ahead {
        if closure.occupant.as_ref().map_or(false, |t| t != train) {
            break;
        }
        clear += closure.length;
    }

    (clear - STOP_MARGIN + current.length).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::layout::{ClosureSpec, Direction, Layout};
    use crate::railway::store::{ClosurePatch, MemoryStore};

    fn clo(name: &str, order: i64, length: f64) -> ClosureSpec {
        ClosureSpec {
            name: name.to_string(),
            direction: Direction::Up,
            order: order,
            length: length,
        }
    }

    fn store_of(closures: Vec<ClosureSpec>) -> MemoryStore {
        MemoryStore::from_layout(&Layout { signals: vec![], closures: closures }).unwrap()
    }

    fn occupy(store: &mut MemoryStore, name: &str, train: &str) {
        store.update_closure(name, ClosurePatch { occupant: Some(Some(train.to_string())) });
    }

    #[test]
    fn clamped_at_zero_before_an_occupied_block() {
        // Ahead: [10, 20 (occupied), 30], current length 5.
        let mut store = store_of(vec![
            clo("cur", 0, 5.0),
            clo("b1", 1, 10.0),
            clo("b2", 2, 20.0),
            clo("b3", 3, 30.0),
        ]);
        occupy(&mut store, "b2", "X");
        // max(0, 10 - 50 + 5) = 0.
        assert_eq!(stop_limit(&store, "cur", "Y"), 0.0);
    }

    #[test]
    fn clear_line_sums_the_horizon() {
        let store = store_of(vec![
            clo("cur", 0, 50.0),
            clo("b1", 1, 100.0),
            clo("b2", 2, 100.0),
            clo("b3", 3, 100.0),
        ]);
        assert_eq!(stop_limit(&store, "cur", "551"), 300.0 - 50.0 + 50.0);
    }

    #[test]
    fn horizon_stops_after_six_blocks() {
        let mut closures = vec![clo("cur", 0, 50.0)];
        for i in 1..=8 {
            closures.push(clo(&format!("b{}", i), i, 100.0));
        }
        let store = store_of(closures);
        // Only six of the eight blocks ahead are counted.
        assert_eq!(stop_limit(&store, "cur", "551"), 600.0 - 50.0 + 50.0);
    }

    #[test]
    fn foreign_occupied_current_block_is_emergency() {
        let mut store = store_of(vec![clo("cur", 0, 50.0), clo("b1", 1, 100.0)]);
        occupy(&mut store, "cur", "X");
        assert_eq!(stop_limit(&store, "cur", "Y"), 0.0);
        // The occupant itself still gets its clear distance.
        assert_eq!(stop_limit(&store, "cur", "X"), 100.0 - 50.0 + 50.0);
    }

    #[test]
    fn own_occupancy_ahead_does_not_cut_the_sum() {
        let mut store = store_of(vec![
            clo("cur", 0, 50.0),
            clo("b1", 1, 100.0),
            clo("b2", 2, 100.0),
        ]);
        occupy(&mut store, "b1", "551");
        assert_eq!(stop_limit(&store, "cur", "551"), 200.0 - 50.0 + 50.0);
    }

    #[test]
    fn unknown_closure_is_a_stop() {
        let store = store_of(vec![]);
        assert_eq!(stop_limit(&store, "ghost", "551"), 0.0);
    }

    #[test]
    fn never_negative() {
        let store = store_of(vec![clo("cur", 0, 1.0)]);
        assert_eq!(stop_limit(&store, "cur", "551"), 0.0);
    }
}
