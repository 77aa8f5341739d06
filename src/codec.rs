//! Line-oriented `key=value` document codec
//!
//! Pure text handling: no I/O and no privilege. Everything that touches the
//! device goes through the bridge.

use thiserror::Error;
use tracing::trace;

/// An entry that cannot be stored as a single `key=value` line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("key {0:?} contains '=', a newline or NUL")]
    InvalidKey(String),
    #[error("value for {key:?} contains a newline or NUL")]
    InvalidValue { key: String },
}

/// Check that `key=value` survives being written as one line
pub fn check_entry(key: &str, value: &str) -> Result<(), EntryError> {
    if key.contains(['=', '\n', '\0']) {
        return Err(EntryError::InvalidKey(key.to_string()));
    }
    if value.contains(['\n', '\0']) {
        return Err(EntryError::InvalidValue {
            key: key.to_string(),
        });
    }
    Ok(())
}

/// Ordered key/value document backing `location.conf`
///
/// Keys are unique; iteration follows insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDocument {
    entries: Vec<(String, String)>,
}

impl ConfigDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Insert with parse semantics: a key seen again moves to the end
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.entries.retain(|(k, _)| *k != key);
        self.entries.push((key, value.into()));
    }

    /// Replace the value in place, appending when the key is new
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// First entry that would not serialize back to itself
    pub fn validate(&self) -> Result<(), EntryError> {
        self.iter().try_for_each(|(key, value)| check_entry(key, value))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConfigDocument {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut doc = ConfigDocument::new();
        for (key, value) in iter {
            doc.insert(key, value);
        }
        doc
    }
}

/// Parse document text, silently skipping lines without `=`
pub fn parse(text: &str) -> ConfigDocument {
    parse_with_report(text).0
}

/// Parse document text and report the 1-based line numbers that were skipped
///
/// Blank lines are ignored without being reported.
pub fn parse_with_report(text: &str) -> (ConfigDocument, Vec<usize>) {
    let mut doc = ConfigDocument::new();
    let mut skipped = Vec::new();

    for (index, line) in text.lines().enumerate() {
        match line.split_once('=') {
            Some((key, value)) => doc.insert(key.trim(), value.trim()),
            None => {
                if !line.trim().is_empty() {
                    trace!(line = index + 1, "Skipping config line without '='");
                    skipped.push(index + 1);
                }
            }
        }
    }

    (doc, skipped)
}

/// Render one `key=value` line per entry, newline-terminated
pub fn serialize(doc: &ConfigDocument) -> String {
    let mut out = String::new();
    for (key, value) in doc.iter() {
        out.push_str(key);
        out.push('=');
        out.push_str(value);
        out.push('\n');
    }
    out
}

/// JSON view of the document in stored order
///
/// Values that already are JSON literal tokens (`true`, `false`, `null`,
/// numbers) are emitted bare; anything else becomes a quoted JSON string, so
/// the output is always valid JSON.
pub fn to_json_projection(doc: &ConfigDocument) -> String {
    let mut out = String::from("{");
    for (index, (key, value)) in doc.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        out.push_str(&quote_json(key));
        out.push(':');
        if is_json_literal(value) {
            out.push_str(value);
        } else {
            out.push_str(&quote_json(value));
        }
    }
    out.push('}');
    out
}

/// True when `value` can be embedded into JSON without quoting
pub fn is_json_literal(value: &str) -> bool {
    matches!(value, "true" | "false" | "null") || value.parse::<serde_json::Number>().is_ok()
}

fn quote_json(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn doc(pairs: &[(&str, &str)]) -> ConfigDocument {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_parse_skips_lines_without_equals() {
        let parsed = parse("a=1\njunk\nb=2\n");
        assert_eq!(parsed, doc(&[("a", "1"), ("b", "2")]));
        assert_eq!(parsed.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse("").is_empty());
        assert!(parse("\n\n").is_empty());
    }

    #[test]
    fn test_parse_duplicate_key_last_wins_and_moves() {
        assert_eq!(parse("a=1\na=2\n"), doc(&[("a", "2")]));

        let parsed = parse("a=1\nb=2\na=3\n");
        assert_eq!(parsed.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(parsed.get("a"), Some("3"));
    }

    #[test]
    fn test_parse_splits_on_first_equals_and_trims() {
        let parsed = parse("  url = http://x/?q=1&r=2  \n");
        assert_eq!(parsed.get("url"), Some("http://x/?q=1&r=2"));
    }

    #[test]
    fn test_parse_handles_crlf_and_missing_trailing_newline() {
        let parsed = parse("enabled=true\r\nlat=1.5");
        assert_eq!(parsed, doc(&[("enabled", "true"), ("lat", "1.5")]));
    }

    #[test]
    fn test_parse_with_report_lists_skipped_lines() {
        let (parsed, skipped) = parse_with_report("a=1\n\n# comment\nb=2\nnoise");
        assert_eq!(parsed.len(), 2);
        assert_eq!(skipped, vec![3, 5]);
    }

    #[test]
    fn test_serialize_preserves_order() {
        let d = doc(&[("enabled", "true"), ("lat", "52.1"), ("hidedev", "false")]);
        assert_eq!(serialize(&d), "enabled=true\nlat=52.1\nhidedev=false\n");
        assert_eq!(serialize(&ConfigDocument::new()), "");
    }

    #[test]
    fn test_roundtrip_preserves_keys_order_and_values() {
        let d = doc(&[("z", "last"), ("a", "x y z"), ("m", "'quoted' $HOME `id`")]);
        assert_eq!(parse(&serialize(&d)), d);
    }

    #[test]
    fn test_validate_rejects_line_breaking_entries() {
        assert!(doc(&[("name", "a = b; 'c'")]).validate().is_ok());
        assert_eq!(
            doc(&[("name", "home\nenabled=true")]).validate(),
            Err(EntryError::InvalidValue {
                key: "name".to_string()
            })
        );
        assert_eq!(
            doc(&[("a=b", "1")]).validate(),
            Err(EntryError::InvalidKey("a=b".to_string()))
        );
        assert!(doc(&[("a\nb", "1")]).validate().is_err());
        assert!(doc(&[("name", "a\0b")]).validate().is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_roundtrip_any_single_line_document(
            pairs in prop::collection::vec(
                ("[A-Za-z_][A-Za-z0-9_.-]{0,12}", "([!-~]([ -~]{0,24}[!-~])?)?"),
                0..8,
            )
        ) {
            let d: ConfigDocument = pairs.into_iter().collect();
            prop_assert!(d.validate().is_ok());
            prop_assert_eq!(parse(&serialize(&d)), d);
        }
    }

    #[test]
    fn test_set_keeps_position_insert_moves() {
        let mut d = doc(&[("a", "1"), ("b", "2")]);
        d.set("a", "9");
        assert_eq!(d.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        d.insert("a", "10");
        assert_eq!(d.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        d.set("c", "3");
        assert_eq!(d.get("c"), Some("3"));
        assert_eq!(d.remove("b"), Some("2".to_string()));
        assert_eq!(d.remove("b"), None);
    }

    #[test]
    fn test_json_projection_literals_are_bare() {
        let d = doc(&[("enabled", "true"), ("hidedev", "false")]);
        assert_eq!(to_json_projection(&d), r#"{"enabled":true,"hidedev":false}"#);

        let d = doc(&[("lat", "-33.8688"), ("accuracy", "5"), ("x", "1e3")]);
        assert_eq!(to_json_projection(&d), r#"{"lat":-33.8688,"accuracy":5,"x":1e3}"#);
    }

    #[test]
    fn test_json_projection_quotes_non_literals() {
        let d = doc(&[("name", "home \"base\""), ("odd", "1."), ("empty", "")]);
        let json = to_json_projection(&d);
        assert_eq!(json, r#"{"name":"home \"base\"","odd":"1.","empty":""}"#);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "home \"base\"");
    }

    #[test]
    fn test_json_projection_empty_document() {
        assert_eq!(to_json_projection(&ConfigDocument::new()), "{}");
    }

    #[test]
    fn test_is_json_literal() {
        assert!(is_json_literal("true"));
        assert!(is_json_literal("0"));
        assert!(is_json_literal("-0.5"));
        assert!(!is_json_literal("True"));
        assert!(!is_json_literal("+1"));
        assert!(!is_json_literal("NaN"));
        assert!(!is_json_literal("01"));
        assert!(!is_json_literal(""));
    }
}
