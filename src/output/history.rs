use serde::Serialize;

/// Outbound results, forwarded to the transport by the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Output {
    /// Displayable aspect of one signal.
    Phase { signal: String, phase: String, kind: String },
    /// Safe remaining distance from one closure.
    StopLimit { closure: String, limit: f64 },
    /// Operator route command result.
    Route { signal: String, ok: bool, message: String },
}

/// Everything one dispatch run produced, in event order.
#[derive(Debug, Default, Serialize)]
pub struct History {
    pub outputs: Vec<Output>,
}
