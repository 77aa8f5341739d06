//! Typed view of `location.conf`
//!
//! Covers the fields the on-device module reads, with its defaults. Parsing is
//! lenient: a value that does not parse keeps the field's default and logs a
//! warning, so one bad line never hides the rest of the document.
//!
//! Flags are read more generously than on the device. The module takes the
//! integer prefix of `enabled`/`hidedev` (`true` counts as 0) and matches keys
//! untrimmed, so `enabled=true` or `enabled = 1` show as on here while the
//! device treats them as off. `to_document` therefore writes flags as `1`/`0`.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

use crate::codec::ConfigDocument;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    pub enabled: bool,
    pub lat: f64,
    pub lng: f64,
    pub accuracy: f32,
    pub altitude: f64,
    pub speed: f32,
    pub bearing: f32,
    /// Hide developer options from hooked apps
    #[serde(rename = "hidedev")]
    pub hide_dev: bool,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            lat: 0.0,
            lng: 0.0,
            accuracy: 5.0,
            altitude: 0.0,
            speed: 0.0,
            bearing: 0.0,
            hide_dev: true,
        }
    }
}

impl LocationConfig {
    pub fn from_document(doc: &ConfigDocument) -> Self {
        let defaults = Self::default();
        Self {
            enabled: read_bool(doc, "enabled", defaults.enabled),
            lat: read_num(doc, "lat", defaults.lat),
            lng: read_num(doc, "lng", defaults.lng),
            accuracy: read_num(doc, "accuracy", defaults.accuracy),
            altitude: read_num(doc, "altitude", defaults.altitude),
            speed: read_num(doc, "speed", defaults.speed),
            bearing: read_num(doc, "bearing", defaults.bearing),
            hide_dev: read_bool(doc, "hidedev", defaults.hide_dev),
        }
    }

    pub fn to_document(&self) -> ConfigDocument {
        let mut doc = ConfigDocument::new();
        doc.set("enabled", flag_value(self.enabled));
        doc.set("lat", self.lat.to_string());
        doc.set("lng", self.lng.to_string());
        doc.set("accuracy", self.accuracy.to_string());
        doc.set("altitude", self.altitude.to_string());
        doc.set("speed", self.speed.to_string());
        doc.set("bearing", self.bearing.to_string());
        doc.set("hidedev", flag_value(self.hide_dev));
        doc
    }

    /// True when the module has anything to hook
    pub fn is_active(&self) -> bool {
        self.enabled || self.hide_dev
    }
}

/// Accepts `true`/`false` as well as integers (non-zero is true)
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        other => other.parse::<i64>().ok().map(|n| n != 0),
    }
}

/// How the device reads a flag: leading integer, non-zero is on
pub fn device_flag(raw: &str) -> bool {
    let digits = raw.trim_start();
    let unsigned = digits.strip_prefix(['+', '-']).unwrap_or(digits);
    unsigned
        .chars()
        .take_while(char::is_ascii_digit)
        .any(|c| c != '0')
}

fn flag_value(on: bool) -> &'static str {
    if on { "1" } else { "0" }
}

fn read_bool(doc: &ConfigDocument, key: &str, default: bool) -> bool {
    let Some(raw) = doc.get(key) else {
        return default;
    };
    let value = parse_flag(raw).unwrap_or_else(|| {
        warn!(key = %key, value = %raw, default = default, "Unparseable flag, using default");
        default
    });
    if value != device_flag(raw) {
        warn!(key = %key, value = %raw, device = !value, "Device reads this flag differently");
    }
    value
}

fn read_num<T>(doc: &ConfigDocument, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    let Some(raw) = doc.get(key) else {
        return default;
    };
    raw.parse::<T>().unwrap_or_else(|_| {
        warn!(key = %key, value = %raw, default = %default, "Unparseable number, using default");
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::parse;

    #[test]
    fn test_defaults_for_empty_document() {
        let cfg = LocationConfig::from_document(&ConfigDocument::new());
        assert_eq!(cfg, LocationConfig::default());
        assert!(cfg.is_active());
    }

    #[test]
    fn test_reads_all_fields() {
        let doc = parse(
            "enabled=true\nlat=48.8584\nlng=2.2945\naccuracy=3.5\naltitude=35\nspeed=1.2\nbearing=90\nhidedev=false\n",
        );
        let cfg = LocationConfig::from_document(&doc);
        assert!(cfg.enabled);
        assert_eq!(cfg.lat, 48.8584);
        assert_eq!(cfg.lng, 2.2945);
        assert_eq!(cfg.accuracy, 3.5);
        assert_eq!(cfg.altitude, 35.0);
        assert_eq!(cfg.speed, 1.2);
        assert_eq!(cfg.bearing, 90.0);
        assert!(!cfg.hide_dev);
    }

    #[test]
    fn test_integer_flags() {
        let cfg = LocationConfig::from_document(&parse("enabled=1\nhidedev=0\n"));
        assert!(cfg.enabled);
        assert!(!cfg.hide_dev);
        assert!(!LocationConfig::from_document(&parse("enabled=0\nhidedev=0")).is_active());
    }

    #[test]
    fn test_device_flag_uses_integer_prefix() {
        assert!(device_flag("1"));
        assert!(device_flag("12abc"));
        assert!(device_flag("-3"));
        assert!(!device_flag("0"));
        assert!(!device_flag("true"));
        assert!(!device_flag(""));
    }

    #[test]
    fn test_bad_values_fall_back_to_defaults() {
        let cfg = LocationConfig::from_document(&parse("lat=north\naccuracy=\nenabled=maybe\n"));
        assert_eq!(cfg.lat, 0.0);
        assert_eq!(cfg.accuracy, 5.0);
        assert!(!cfg.enabled);
    }

    #[test]
    fn test_to_document_roundtrip() {
        let cfg = LocationConfig {
            enabled: true,
            lat: -33.8688,
            lng: 151.2093,
            hide_dev: false,
            ..LocationConfig::default()
        };
        let doc = cfg.to_document();
        assert_eq!(
            doc.keys().collect::<Vec<_>>(),
            vec!["enabled", "lat", "lng", "accuracy", "altitude", "speed", "bearing", "hidedev"]
        );
        assert_eq!(doc.get("accuracy"), Some("5"));
        assert_eq!(doc.get("enabled"), Some("1"));
        assert_eq!(doc.get("hidedev"), Some("0"));
        assert!(device_flag(doc.get("enabled").unwrap()));
        assert_eq!(LocationConfig::from_document(&doc), cfg);
    }
}
