//! Marlin temperature report parsing (M105 reply and auto-reports)
//!
//! The shape of the line depends on extruder count, bed presence and on
//! whether the report answers a query (`ok` prefix) or is unsolicited:
//!
//! ```text
//! ok T:293.0 /0.0 B:25.9 /0.0 @:0 B@:0
//! ok T:293.0 /0.0 (0.0) B:25.9 /0.0 T0:293.0 /0.0 (0.0) T1:100.0 /0.0 (0.0) @:0 B@:0 @0:0 @1:0 W:?
//!  T0:27.72 /0.00 B:28.38 /0.00 T0:27.72 /0.00 T1:27.28 /0.00 @:0 B@:0 @0:0 @1:0
//! ```
//!
//! A heater token is `KEY:<deg> /<target>`; a lone `T:0` without a target is
//! not a reading. Temperatures stay as the strings the firmware printed.

use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// One heater's reading
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaterReading {
    /// Current temperature
    pub deg: String,
    /// Target temperature
    pub deg_target: String,
    /// Heater PWM duty
    pub power: u32,
}

/// Parsed temperature report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureReport {
    /// Original line
    pub raw: String,
    /// The report was prefixed with `ok` (a reply to M105)
    pub ok: bool,
    /// Active extruder
    #[serde(serialize_with = "heater_or_empty")]
    pub extruder: Option<HeaterReading>,
    /// Heated bed
    #[serde(serialize_with = "heater_or_empty")]
    pub heated_bed: Option<HeaterReading>,
    /// Per-tool readings keyed `T0`, `T1`, ...
    pub hotend: BTreeMap<String, HeaterReading>,
    /// `W:` value while waiting for temperature: `?` or seconds remaining
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait: Option<String>,
}

/// Heater token before power is resolved
#[derive(Clone, Copy)]
struct RawHeater<'a> {
    deg: &'a str,
    target: &'a str,
    reading: Option<&'a str>,
}

impl TemperatureReport {
    /// Check whether a line carries a `T:` or `T<n>:` token
    pub fn is_temperature_line(line: &str) -> bool {
        detect_regex().is_match(line)
    }

    /// Parse a temperature report
    pub fn parse(line: &str) -> Option<Self> {
        if !Self::is_temperature_line(line) {
            return None;
        }

        let ok = line
            .strip_prefix("ok")
            .is_some_and(|rest| rest.starts_with(char::is_whitespace));

        let mut bare_extruder: Option<RawHeater> = None;
        let mut leading_tool: Option<(&str, RawHeater)> = None;
        let mut bed: Option<RawHeater> = None;
        let mut tools: BTreeMap<String, RawHeater> = BTreeMap::new();

        for caps in heater_regex().captures_iter(line) {
            let (Some(key), Some(deg), Some(target)) = (caps.get(1), caps.get(2), caps.get(3))
            else {
                continue;
            };
            let heater = RawHeater {
                deg: deg.as_str(),
                target: target.as_str(),
                reading: caps.get(4).map(|m| m.as_str()),
            };
            match key.as_str() {
                "T" => {
                    if bare_extruder.is_none() {
                        bare_extruder = Some(heater);
                    }
                }
                "B" => {
                    if bed.is_none() {
                        bed = Some(heater);
                    }
                }
                tool => {
                    if leading_tool.is_none() {
                        leading_tool = Some((tool, heater));
                    }
                    tools.insert(tool.to_string(), heater);
                }
            }
        }

        let mut extruder_power = None;
        let mut bed_power = None;
        let mut tool_power: BTreeMap<String, &str> = BTreeMap::new();
        for caps in power_regex().captures_iter(line) {
            let (Some(key), Some(value)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            match key.as_str() {
                "@" => {
                    extruder_power.get_or_insert(value.as_str());
                }
                "B@" => {
                    bed_power.get_or_insert(value.as_str());
                }
                index => {
                    let tool = format!("T{}", &index[1..]);
                    tool_power.entry(tool).or_insert(value.as_str());
                }
            }
        }

        let wait = wait_regex()
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());

        // Without a bare `T:` the firmware lists the active tool first; its
        // `@<n>:` power stands in when there is no `@:` token.
        let extruder = match (bare_extruder, leading_tool) {
            (Some(heater), _) => Some(resolve(heater, extruder_power, "extruder")),
            (None, Some((tool, heater))) => {
                let power = extruder_power.or_else(|| tool_power.get(tool).copied());
                Some(resolve(heater, power, "extruder"))
            }
            (None, None) => None,
        };
        let heated_bed = bed.map(|heater| resolve(heater, bed_power, "bed"));
        let hotend = tools
            .into_iter()
            .map(|(tool, heater)| {
                let power = tool_power.get(&tool).copied();
                let reading = resolve(heater, power, &tool);
                (tool, reading)
            })
            .collect();

        Some(Self {
            raw: line.to_string(),
            ok,
            extruder,
            heated_bed,
            hotend,
            wait,
        })
    }
}

/// Combine a heater token with its power source
///
/// An `@` token wins over the parenthesized reading.
fn resolve(heater: RawHeater<'_>, power_token: Option<&str>, name: &str) -> HeaterReading {
    let from_token = power_token.and_then(parse_power);
    let from_reading = heater.reading.and_then(parse_power);

    if let (Some(token), Some(reading)) = (from_token, from_reading) {
        if token != reading {
            tracing::debug!(
                "{} power disagrees: @ token {} vs parenthesized {}; using @ token",
                name,
                token,
                reading
            );
        }
    }

    HeaterReading {
        deg: heater.deg.to_string(),
        deg_target: heater.target.to_string(),
        power: from_token.or(from_reading).unwrap_or(0),
    }
}

/// Power values are integers; decimals are truncated, negatives clamp to 0
fn parse_power(value: &str) -> Option<u32> {
    if let Ok(power) = value.parse::<u32>() {
        return Some(power);
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|power| power.is_finite())
        .map(|power| power.max(0.0).trunc() as u32)
}

fn heater_or_empty<S: Serializer>(
    heater: &Option<HeaterReading>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match heater {
        Some(heater) => heater.serialize(serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}

fn detect_regex() -> &'static Regex {
    static DETECT_REGEX: OnceLock<Regex> = OnceLock::new();
    DETECT_REGEX.get_or_init(|| Regex::new(r"(?:^|\s)T[0-9]*:").expect("invalid regex pattern"))
}

fn heater_regex() -> &'static Regex {
    static HEATER_REGEX: OnceLock<Regex> = OnceLock::new();
    HEATER_REGEX.get_or_init(|| {
        Regex::new(
            r"(?:^|\s)(T[0-9]*|B):(-?[0-9.]+)\s*/(-?[0-9.]+)(?:\s+\((-?[0-9.]+)\))?",
        )
        .expect("invalid regex pattern")
    })
}

fn power_regex() -> &'static Regex {
    static POWER_REGEX: OnceLock<Regex> = OnceLock::new();
    POWER_REGEX.get_or_init(|| {
        Regex::new(r"(?:^|\s)(B@|@[0-9]*):(-?[0-9.]+)").expect("invalid regex pattern")
    })
}

fn wait_regex() -> &'static Regex {
    static WAIT_REGEX: OnceLock<Regex> = OnceLock::new();
    WAIT_REGEX.get_or_init(|| Regex::new(r"(?:^|\s)W:(\?|[0-9]+)").expect("invalid regex pattern"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(deg: &str, target: &str, power: u32) -> HeaterReading {
        HeaterReading {
            deg: deg.to_string(),
            deg_target: target.to_string(),
            power,
        }
    }

    #[test]
    fn test_detection() {
        assert!(TemperatureReport::is_temperature_line("ok T:0"));
        assert!(TemperatureReport::is_temperature_line(" T0:27.72 /0.00"));
        assert!(!TemperatureReport::is_temperature_line("ok"));
        assert!(!TemperatureReport::is_temperature_line("echo:busy: processing"));
    }

    #[test]
    fn test_bare_t_without_target() {
        let report = TemperatureReport::parse("ok T:0").unwrap();
        assert!(report.ok);
        assert_eq!(report.extruder, None);
        assert_eq!(report.heated_bed, None);
        assert!(report.hotend.is_empty());
        assert_eq!(report.wait, None);
    }

    #[test]
    fn test_power_tokens() {
        let report = TemperatureReport::parse("ok T:210.0 /210.0 B:60.0 /60.0 @:127 B@:64").unwrap();
        assert_eq!(report.extruder, Some(reading("210.0", "210.0", 127)));
        assert_eq!(report.heated_bed, Some(reading("60.0", "60.0", 64)));
    }

    #[test]
    fn test_parenthesized_reading_supplies_missing_power() {
        let report = TemperatureReport::parse(" T:200.0 /200.0 (87)").unwrap();
        assert!(!report.ok);
        assert_eq!(report.extruder, Some(reading("200.0", "200.0", 87)));
    }

    #[test]
    fn test_power_token_beats_parenthesized_reading() {
        let report = TemperatureReport::parse("ok T:200.0 /200.0 (87) @:100").unwrap();
        assert_eq!(report.extruder, Some(reading("200.0", "200.0", 100)));
    }

    #[test]
    fn test_hotend_power_by_index() {
        let report =
            TemperatureReport::parse("ok T:20.0 /0.0 T0:20.0 /0.0 T1:30.0 /200.0 @:0 @0:0 @1:255")
                .unwrap();
        assert_eq!(report.hotend.get("T0"), Some(&reading("20.0", "0.0", 0)));
        assert_eq!(report.hotend.get("T1"), Some(&reading("30.0", "200.0", 255)));
    }

    #[test]
    fn test_leading_tool_takes_indexed_power() {
        let report = TemperatureReport::parse("ok T0:20.0 /0.0 @0:9").unwrap();
        assert_eq!(report.extruder, Some(reading("20.0", "0.0", 9)));
        assert_eq!(report.hotend.get("T0"), Some(&reading("20.0", "0.0", 9)));

        let report =
            TemperatureReport::parse(" T1:200.0 /210.0 T0:25.0 /0.0 T1:200.0 /210.0 @0:0 @1:120")
                .unwrap();
        assert_eq!(report.extruder, Some(reading("200.0", "210.0", 120)));

        // A plain `@:` token still wins
        let report = TemperatureReport::parse("ok T0:20.0 /0.0 @:5 @0:9").unwrap();
        assert_eq!(report.extruder, Some(reading("20.0", "0.0", 5)));
    }

    #[test]
    fn test_wait_values() {
        let report = TemperatureReport::parse("ok T:20.0 /0.0 W:?").unwrap();
        assert_eq!(report.wait.as_deref(), Some("?"));
        let report = TemperatureReport::parse("ok T:20.0 /0.0 W:12").unwrap();
        assert_eq!(report.wait.as_deref(), Some("12"));
    }

    #[test]
    fn test_ok_requires_separator() {
        let report = TemperatureReport::parse("okT:20.0 /0.0");
        assert!(report.is_none());
    }

    #[test]
    fn test_parse_power() {
        assert_eq!(parse_power("127"), Some(127));
        assert_eq!(parse_power("0.0"), Some(0));
        assert_eq!(parse_power("12.9"), Some(12));
        assert_eq!(parse_power("-3"), Some(0));
        assert_eq!(parse_power("."), None);
    }
}
