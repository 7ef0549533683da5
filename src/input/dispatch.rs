use failure_derive::Fail;
use regex::Regex;

pub type TrainName = String;

/// Inbound events, in arrival order. Occupancy events come from train
/// telemetry, route commands from the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchAction {
    /// Train claims a block: any lock state -> ENTERING.
    Enter(TrainName, String),
    /// Train fully inside the block: ENTERING -> ENTERED.
    EnteringComplete(TrainName, String),
    /// Train cleared the block: release occupancy, lock -> CLOSED.
    Leave(TrainName, String),
    OpenRoute(String),
    CloseRoute(String),
    /// Recompute the phase or stop limit a train is looking at.
    Elapse(TrainName, String),
    /// Bulk phase dump over the whole network.
    AllSignals,
}

#[derive(Debug)]
pub struct Dispatch {
    pub actions: Vec<DispatchAction>,
}

#[derive(Debug, Fail)]
pub enum ParseError {
    #[fail(display = "error in regular expression: {}", _0)]
    RegexError(String),
    #[fail(display = "unrecognized dispatch: {}", _0)]
    Unrecognized(String),
}

/// Parses the event script format
///
/// * enter 551 up_block_1
/// * entered 551 up_block_1
/// * leave 551 up_block_1
/// * open tatehama_up_departure
/// * close tatehama_up_departure
/// * elapse 551 up_block_2
/// * signals
///
pub fn parse_dispatch(input: &str) -> Result<Dispatch, ParseError> {
    let mut actions = Vec::new();
    let occupancy_re = Regex::new(r"^\s*(?P<verb>entered|enter|leave|elapse)\s+(?P<train>\S+)\s+(?P<name>\S+)\s*$")
        .map_err(|e| ParseError::RegexError(format!("{:?}", e)))?;
    let route_re = Regex::new(r"^\s*(?P<verb>open|close)\s+(?P<name>\S+)\s*$")
        .map_err(|e| ParseError::RegexError(format!("{:?}", e)))?;
    let signals_re = Regex::new(r"^\s*signals\s*$")
        .map_err(|e| ParseError::RegexError(format!("{:?}", e)))?;

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(groups) = occupancy_re.captures(line) {
            let train = groups["train"].to_string();
            let name = groups["name"].to_string();
            actions.push(match &groups["verb"] {
                "enter" => DispatchAction::Enter(train, name),
                "entered" => DispatchAction::EnteringComplete(train, name),
                "leave" => DispatchAction::Leave(train, name),
                _ => DispatchAction::Elapse(train, name),
            });
            continue;
        }
        if let Some(groups) = route_re.captures(line) {
            let name = groups["name"].to_string();
            actions.push(if &groups["verb"] == "open" {
                DispatchAction::OpenRoute(name)
            } else {
                DispatchAction::CloseRoute(name)
            });
            continue;
        }
        if signals_re.captures(line).is_some() {
            actions.push(DispatchAction::AllSignals);
            continue;
        }
        return Err(ParseError::Unrecognized(line.to_string()));
    }

    Ok(Dispatch { actions: actions })
}
