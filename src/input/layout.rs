use failure_derive::Fail;
use regex::Regex;
use smallvec::SmallVec;

/// Track direction a signal or closure governs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Up,
    Down,
}

/// Signal head type, determining which aspects the head can physically show.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SignalKind {
    One,
    TwoA,
    TwoB,
    ThreeA,
    ThreeB,
    FourA,
    FourB,
    Five,
}

impl SignalKind {
    pub fn label(&self) -> &'static str {
        match *self {
            SignalKind::One => "ONE",
            SignalKind::TwoA => "TWO_A",
            SignalKind::TwoB => "TWO_B",
            SignalKind::ThreeA => "THREE_A",
            SignalKind::ThreeB => "THREE_B",
            SignalKind::FourA => "FOUR_A",
            SignalKind::FourB => "FOUR_B",
            SignalKind::Five => "FIVE",
        }
    }

    pub fn from_label(s: &str) -> Option<SignalKind> {
        match s {
            "ONE" => Some(SignalKind::One),
            "TWO_A" => Some(SignalKind::TwoA),
            "TWO_B" => Some(SignalKind::TwoB),
            "THREE_A" => Some(SignalKind::ThreeA),
            "THREE_B" => Some(SignalKind::ThreeB),
            "FOUR_A" => Some(SignalKind::FourA),
            "FOUR_B" => Some(SignalKind::FourB),
            "FIVE" => Some(SignalKind::Five),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignalSpec {
    pub name: String,
    pub direction: Direction,
    pub order: i64,
    pub kind: SignalKind,
    pub is_block_signal: bool,
    pub is_shunt: bool,
    pub successors: SmallVec<[String; 2]>,
}

#[derive(Debug, Clone)]
pub struct ClosureSpec {
    pub name: String,
    pub direction: Direction,
    pub order: i64,
    pub length: f64,
}

/// Static track layout, provisioned once at startup.
#[derive(Debug, Default)]
pub struct Layout {
    pub signals: Vec<SignalSpec>,
    pub closures: Vec<ClosureSpec>,
}

#[derive(Debug, Fail)]
pub enum ParseError {
    #[fail(display = "error in regular expression: {}", _0)]
    RegexError(String),
    #[fail(display = "error converting number")]
    NumberError,
    #[fail(display = "unknown signal kind: {}", _0)]
    UnknownKind(String),
    #[fail(display = "unrecognized layout line: {}", _0)]
    Unrecognized(String),
}

/// Parses the track layout format
///
/// * signal up_block_1 up 2 THREE_B block next=up_block_2
/// * signal ozaki_up_shunt up 6 TWO_B shunt
/// * closure up_block_1 up 2 l=420.0
///
/// Lines starting with `#` and blank lines are skipped.
pub fn parse_layout(input: &str) -> Result<Layout, ParseError> {
    let mut layout = Layout::default();
    let signal_re = Regex::new(
        r"(?x) ^ \s* signal \s+ (?P<name>\S+) \s+
            (?P<dir>up|down) \s+
            (?P<order>-?\d+) \s+
            (?P<kind>\w+)
            (?P<rest>(?:\s+\S+)*) \s* $",
    )
    .map_err(|e| ParseError::RegexError(format!("{:?}", e)))?;
    let closure_re = Regex::new(
        r"(?x) ^ \s* closure \s+ (?P<name>\S+) \s+
            (?P<dir>up|down) \s+
            (?P<order>-?\d+) \s+
            l \s* = \s* (?P<len>[\d\.]+) \s* $",
    )
    .map_err(|e| ParseError::RegexError(format!("{:?}", e)))?;

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(groups) = signal_re.captures(line) {
            let mut spec = SignalSpec {
                name: groups["name"].to_string(),
                direction: parse_direction(&groups["dir"]),
                order: groups["order"].parse::<i64>().map_err(|_e| ParseError::NumberError)?,
                kind: SignalKind::from_label(&groups["kind"])
                    .ok_or_else(|| ParseError::UnknownKind(groups["kind"].to_string()))?,
                is_block_signal: false,
                is_shunt: false,
                successors: SmallVec::new(),
            };
            for token in groups["rest"].split_whitespace() {
                if token == "block" {
                    spec.is_block_signal = true;
                } else if token == "shunt" {
                    spec.is_shunt = true;
                } else if let Some(list) = token.strip_prefix("next=") {
                    spec.successors = list.split(',').map(|s| s.to_string()).collect();
                } else {
                    return Err(ParseError::Unrecognized(line.to_string()));
                }
            }
            layout.signals.push(spec);
            continue;
        }
        if let Some(groups) = closure_re.captures(line) {
            layout.closures.push(ClosureSpec {
                name: groups["name"].to_string(),
                direction: parse_direction(&groups["dir"]),
                order: groups["order"].parse::<i64>().map_err(|_e| ParseError::NumberError)?,
                length: groups["len"].parse::<f64>().map_err(|_e| ParseError::NumberError)?,
            });
            continue;
        }
        return Err(ParseError::Unrecognized(line.to_string()));
    }

    Ok(layout)
}

fn parse_direction(s: &str) -> Direction {
    // The regex only admits these two tokens.
    if s == "up" {
        Direction::Up
    } else {
        Direction::Down
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_signals_and_closures() {
        let layout = parse_layout(
            "# demo line
             signal a up 0 FOUR_B next=b
             signal b up 1 THREE_B block shunt next=c,d
             closure a up 0 l=210.5
            ",
        )
        .unwrap();
        assert_eq!(layout.signals.len(), 2);
        assert_eq!(layout.closures.len(), 1);

        let a = &layout.signals[0];
        assert_eq!(a.name, "a");
        assert_eq!(a.direction, Direction::Up);
        assert_eq!(a.kind, SignalKind::FourB);
        assert!(!a.is_block_signal);
        assert_eq!(a.successors.len(), 1);
        assert_eq!(a.successors[0], "b");

        let b = &layout.signals[1];
        assert!(b.is_block_signal);
        assert!(b.is_shunt);
        assert_eq!(b.successors.len(), 2);

        assert_eq!(layout.closures[0].length, 210.5);
    }

    #[test]
    fn reject_unknown_kind() {
        match parse_layout("signal a up 0 SIX_Z") {
            Err(ParseError::UnknownKind(k)) => assert_eq!(k, "SIX_Z"),
            other => panic!("expected UnknownKind, got {:?}", other),
        }
    }

    #[test]
    fn reject_garbage_line() {
        assert!(parse_layout("switch a left").is_err());
        assert!(parse_layout("signal a sideways 0 ONE").is_err());
    }
}
