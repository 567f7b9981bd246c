//! Marlin firmware identification (M115 reply)
//!
//! ```text
//! FIRMWARE_NAME:Marlin 1.1.0 (Github) SOURCE_CODE_URL:https://github.com/MarlinFirmware/Marlin PROTOCOL_VERSION:1.0 MACHINE_TYPE:RepRap EXTRUDER_COUNT:1 UUID:cede2a2f-41a2-4748-9b12-c55c62f367ff
//! ```
//!
//! Values may contain spaces ("Marlin 1.1.0 (Github)", "3D Printer"), so the
//! line is cut at key tokens rather than split on whitespace.

use marlinkit_core::FirmwareError;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::OnceLock;

/// Keys recognized in an identification line, in the order Marlin prints them
pub const FIRMWARE_KEYS: [&str; 6] = [
    "FIRMWARE_NAME",
    "SOURCE_CODE_URL",
    "PROTOCOL_VERSION",
    "MACHINE_TYPE",
    "EXTRUDER_COUNT",
    "UUID",
];

/// Firmware identity announced by the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FirmwareInfo {
    /// Original line
    pub raw: String,
    /// Firmware name and version without build annotation, e.g. "Marlin 1.1.0"
    pub firmware_name: String,
    /// Host protocol version
    pub protocol_version: String,
    /// Machine type, e.g. "RepRap"
    pub machine_type: Option<String>,
    /// Number of extruders
    pub extruder_count: Option<u32>,
    /// Machine UUID
    pub uuid: Option<String>,
    /// Where the firmware source lives
    pub source_code_url: Option<String>,
}

impl FirmwareInfo {
    /// Parse an identification line
    ///
    /// Returns `None` unless both `FIRMWARE_NAME:` and `PROTOCOL_VERSION:`
    /// are present.
    pub fn parse(line: &str) -> Option<Self> {
        if !line.contains("FIRMWARE_NAME:") || !line.contains("PROTOCOL_VERSION:") {
            return None;
        }

        let fields = split_fields(line);
        let field = |key: &str| fields.get(key).map(|value| value.to_string());

        Some(Self {
            raw: line.to_string(),
            firmware_name: strip_annotation(fields.get("FIRMWARE_NAME")?).to_string(),
            protocol_version: field("PROTOCOL_VERSION")?,
            machine_type: field("MACHINE_TYPE"),
            extruder_count: fields
                .get("EXTRUDER_COUNT")
                .and_then(|count| count.parse::<u32>().ok()),
            uuid: field("UUID"),
            source_code_url: field("SOURCE_CODE_URL"),
        })
    }
}

impl FromStr for FirmwareInfo {
    type Err = FirmwareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| FirmwareError::ResponseParseError {
            reason: "expected FIRMWARE_NAME: and PROTOCOL_VERSION:".to_string(),
        })
    }
}

/// Drop a trailing parenthesized build annotation: "Marlin 1.1.0 (Github)"
fn strip_annotation(name: &str) -> &str {
    match name.rfind(" (") {
        Some(idx) if name.ends_with(')') => name[..idx].trim_end(),
        _ => name,
    }
}

fn key_regex() -> &'static Regex {
    static KEY_REGEX: OnceLock<Regex> = OnceLock::new();
    KEY_REGEX.get_or_init(|| {
        let keys = FIRMWARE_KEYS.join("|");
        Regex::new(&format!(r"(?:^|\s)({keys}):")).expect("invalid regex pattern")
    })
}

/// Map each key to the trimmed text between it and the next key token
fn split_fields(line: &str) -> HashMap<&'static str, &str> {
    let markers: Vec<(&'static str, usize, usize)> = key_regex()
        .captures_iter(line)
        .filter_map(|caps| {
            let key = caps.get(1)?;
            let name = FIRMWARE_KEYS.iter().find(|k| **k == key.as_str())?;
            Some((*name, key.start(), caps.get(0)?.end()))
        })
        .collect();

    let mut fields = HashMap::new();
    for (i, (name, _, value_start)) in markers.iter().enumerate() {
        let value_end = markers
            .get(i + 1)
            .map(|(_, key_start, _)| *key_start)
            .unwrap_or(line.len());
        fields
            .entry(*name)
            .or_insert_with(|| line[*value_start..value_end].trim());
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    const M115: &str = "FIRMWARE_NAME:Marlin 1.1.0 (Github) SOURCE_CODE_URL:https://github.com/MarlinFirmware/Marlin PROTOCOL_VERSION:1.0 MACHINE_TYPE:RepRap EXTRUDER_COUNT:1 UUID:cede2a2f-41a2-4748-9b12-c55c62f367ff";

    #[test]
    fn test_parse_identification() {
        let info = FirmwareInfo::parse(M115).unwrap();
        assert_eq!(info.raw, M115);
        assert_eq!(info.firmware_name, "Marlin 1.1.0");
        assert_eq!(
            info.source_code_url.as_deref(),
            Some("https://github.com/MarlinFirmware/Marlin")
        );
        assert_eq!(info.protocol_version, "1.0");
        assert_eq!(info.machine_type.as_deref(), Some("RepRap"));
        assert_eq!(info.extruder_count, Some(1));
        assert_eq!(
            info.uuid.as_deref(),
            Some("cede2a2f-41a2-4748-9b12-c55c62f367ff")
        );
    }

    #[test]
    fn test_machine_type_with_spaces() {
        let line = "FIRMWARE_NAME:Marlin bugfix-2.0.x PROTOCOL_VERSION:1.0 MACHINE_TYPE:3D Printer EXTRUDER_COUNT:2";
        let info = FirmwareInfo::parse(line).unwrap();
        assert_eq!(info.firmware_name, "Marlin bugfix-2.0.x");
        assert_eq!(info.machine_type.as_deref(), Some("3D Printer"));
        assert_eq!(info.extruder_count, Some(2));
        assert_eq!(info.uuid, None);
    }

    #[test]
    fn test_strip_annotation() {
        assert_eq!(strip_annotation("Marlin 2.1.2 (Sep 28 2023)"), "Marlin 2.1.2");
        assert_eq!(strip_annotation("Marlin (custom"), "Marlin (custom");
        assert_eq!(strip_annotation("Marlin"), "Marlin");
    }

    #[test]
    fn test_requires_protocol_version() {
        assert!(FirmwareInfo::parse("FIRMWARE_NAME:Marlin 2.1").is_none());
        assert!(FirmwareInfo::parse("PROTOCOL_VERSION:1.0").is_none());
    }

    #[test]
    fn test_from_str() {
        let info: FirmwareInfo = M115.parse().unwrap();
        assert_eq!(info.protocol_version, "1.0");

        let err = "echo:Marlin".parse::<FirmwareInfo>().unwrap_err();
        assert!(matches!(err, FirmwareError::ResponseParseError { .. }));
    }

    #[test]
    fn test_bad_extruder_count() {
        let line = "FIRMWARE_NAME:Marlin PROTOCOL_VERSION:1.0 EXTRUDER_COUNT:many";
        let info = FirmwareInfo::parse(line).unwrap();
        assert_eq!(info.extruder_count, None);
    }
}
