pub mod input;
pub mod output;
pub mod railway;

use std::path::Path;

use log::warn;

use crate::input::dispatch::{Dispatch, DispatchAction};
use crate::input::layout::Layout;
use crate::output::history::{History, Output};
use crate::railway::locking::{self, CommandOutcome};
use crate::railway::phase;
use crate::railway::store::GraphStore;
use crate::railway::stoplimit;

pub type AppResult<T> = Result<T, failure::Error>;

/// Feed an event script through the interlocking: mutate the store action
/// by action, strictly in order, and collect the outbound results.
pub fn evaluate_dispatch(store: &mut dyn GraphStore, dispatch: &Dispatch) -> History {
    let mut outputs = Vec::new();

    for action in &dispatch.actions {
        match *action {
            DispatchAction::Enter(ref train, ref name) => {
                locking::enter_block(store, name, train);
            }
            DispatchAction::EnteringComplete(ref train, ref name) => {
                locking::entering_complete(store, name, train);
            }
            DispatchAction::Leave(ref train, ref name) => {
                locking::leave_block(store, name, train);
            }
            DispatchAction::OpenRoute(ref name) => {
                let outcome = locking::open_route(store, name);
                outputs.push(route_output(name, outcome));
            }
            DispatchAction::CloseRoute(ref name) => {
                let outcome = locking::close_route(store, name);
                outputs.push(route_output(name, outcome));
            }
            DispatchAction::Elapse(ref train, ref name) => {
                let mut known = false;
                if let Some(kind) = store.get_signal(name).map(|s| s.kind) {
                    let aspect = phase::aspect_of(&*store, name, train);
                    outputs.push(Output::Phase {
                        signal: name.clone(),
                        phase: aspect.to_string(),
                        kind: kind.label().to_string(),
                    });
                    known = true;
                }
                if store.get_closure(name).is_some() {
                    let limit = stoplimit::stop_limit(&*store, name, train);
                    outputs.push(Output::StopLimit { closure: name.clone(), limit: limit });
                    known = true;
                }
                if !known {
                    warn!("elapse event for unknown block {} (train {})", name, train);
                }
            }
            DispatchAction::AllSignals => {
                for (signal, aspect, kind) in phase::all_phases(&*store) {
                    outputs.push(Output::Phase {
                        signal: signal,
                        phase: aspect.to_string(),
                        kind: kind.label().to_string(),
                    });
                }
            }
        }
    }

    History { outputs: outputs }
}

fn route_output(name: &str, outcome: CommandOutcome) -> Output {
    Output::Route {
        signal: name.to_string(),
        ok: outcome.ok(),
        message: outcome.message().to_string(),
    }
}

pub fn read_file(f: &Path) -> AppResult<String> {
    use std::fs::File;
    use std::io::prelude::*;
    use std::io::BufReader;

    let file = File::open(f)?;
    let mut file = BufReader::new(&file);
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

pub fn get_layout(s: &Path) -> AppResult<Layout> {
    let contents = read_file(s)?;
    get_layout_string(&contents)
}

pub fn get_layout_string(s: &str) -> AppResult<Layout> {
    Ok(input::layout::parse_layout(s)?)
}

pub fn get_dispatch(s: &Path) -> AppResult<Dispatch> {
    let contents = read_file(s)?;
    let d = input::dispatch::parse_dispatch(&contents)?;
    Ok(d)
}
