//! Marker labels: storage encoding and input sanitation.
//!
//! Labels travel as a JSON array of strings on the wire but are persisted
//! as JSON-encoded text. Reads are lenient: a stored value that does not
//! parse as a string array is treated as "no labels" and logged.

use std::collections::BTreeSet;

/// Encodes labels into the JSON text stored alongside a marker.
#[must_use]
pub fn encode(labels: &[String]) -> String {
    serde_json::to_string(labels).unwrap_or_else(|_| "[]".to_string())
}

/// Decodes stored label text.
///
/// # Errors
///
/// Returns the parse error if `text` is not a JSON array of strings.
pub fn decode(text: &str) -> Result<Vec<String>, serde_json::Error> {
    serde_json::from_str(text)
}

/// Decodes stored label text, falling back to an empty list.
#[must_use]
pub fn decode_lenient(text: &str) -> Vec<String> {
    match decode(text) {
        Ok(labels) => labels,
        Err(err) => {
            tracing::warn!(%err, stored = text, "ignoring malformed labels");
            Vec::new()
        }
    }
}

/// Builds the sorted, deduplicated union of every parseable label text.
///
/// Texts that fail to parse are skipped.
pub fn collect_unique<'a, I>(texts: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut set = BTreeSet::new();
    for text in texts {
        match decode(text) {
            Ok(labels) => set.extend(labels),
            Err(err) => tracing::warn!(%err, stored = text, "skipping malformed labels"),
        }
    }
    set.into_iter().collect()
}

/// Trims labels and drops blanks and repeats, keeping first-seen order.
#[must_use]
pub fn normalize(labels: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    labels
        .into_iter()
        .map(|label| label.trim().to_string())
        .filter(|label| !label.is_empty() && seen.insert(label.clone()))
        .collect()
}

/// Turns free text into a label: whitespace runs become `-`, lowercase.
#[must_use]
pub fn sanitize(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Splits typed input on whitespace and commas into sanitized labels,
/// skipping any already present in `existing`.
#[must_use]
pub fn parse_input(input: &str, existing: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in input.split(|c: char| c.is_whitespace() || c == ',') {
        let label = sanitize(part);
        if label.is_empty() || existing.contains(&label) || out.contains(&label) {
            continue;
        }
        out.push(label);
    }
    out
}
