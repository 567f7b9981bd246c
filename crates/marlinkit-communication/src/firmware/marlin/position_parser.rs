//! Marlin position report parsing (M114 reply)
//!
//! ```text
//! X:1.529 Y:-5.440 Z:0.00 E:0.00 Count X:0 Y:0 Z:0
//! X:20.000 Y:41.000 Z:38.000 A:34.000 B:24.000 C:17.000 Count X:9311 Y:18922 Z:15200 A:536 B:378 C:268
//! ```
//!
//! Everything from the `Count` marker on is stepper counts and is ignored.
//! Coordinates stay as the strings the firmware printed.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// Marker that starts the step count section of a position report
const COUNT_MARKER: &str = "Count";

/// Axis letters a position report can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
    /// Extruder
    E,
    A,
    B,
    C,
}

impl Axis {
    /// Axis for an upper-case report letter
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'X' => Some(Self::X),
            'Y' => Some(Self::Y),
            'Z' => Some(Self::Z),
            'E' => Some(Self::E),
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            _ => None,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::E => "e",
            Self::A => "a",
            Self::B => "b",
            Self::C => "c",
        };
        write!(f, "{}", name)
    }
}

/// Parsed position report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionReport {
    /// Original line
    pub raw: String,
    /// Reported coordinates, only for axes present before `Count`
    #[serde(rename = "pos")]
    pub axes: BTreeMap<Axis, String>,
}

impl PositionReport {
    /// Parse a position report
    ///
    /// X, Y and Z must all be present before the `Count` marker.
    pub fn parse(line: &str) -> Option<Self> {
        let head = match line.find(COUNT_MARKER) {
            Some(idx) => &line[..idx],
            None => line,
        };

        let mut axes = BTreeMap::new();
        for caps in axis_regex().captures_iter(head) {
            let axis = caps
                .get(1)
                .and_then(|m| m.as_str().chars().next())
                .and_then(Axis::from_letter);
            if let (Some(axis), Some(value)) = (axis, caps.get(2)) {
                axes.entry(axis).or_insert_with(|| value.as_str().to_string());
            }
        }

        let has_xyz = [Axis::X, Axis::Y, Axis::Z]
            .iter()
            .all(|axis| axes.contains_key(axis));
        if !has_xyz {
            return None;
        }

        Some(Self {
            raw: line.to_string(),
            axes,
        })
    }

    /// Coordinate for one axis
    pub fn get(&self, axis: Axis) -> Option<&str> {
        self.axes.get(&axis).map(String::as_str)
    }
}

fn axis_regex() -> &'static Regex {
    static AXIS_REGEX: OnceLock<Regex> = OnceLock::new();
    AXIS_REGEX.get_or_init(|| {
        Regex::new(r"(?:^|\s)([XYZEABC]):(-?[0-9]+(?:\.[0-9]*)?|-?\.[0-9]+)")
            .expect("invalid regex pattern")
    })
}
