use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;

/// Why a sidecar did not contribute to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The file could not be read.
    Unreadable,
    /// Not valid JSON, or not a JSON object.
    NotJson,
    /// `title` absent, empty, or not a string.
    MissingTitle,
    /// `photoTakenTime.timestamp` absent.
    MissingTimestamp,
    /// Timestamp present but not a usable number of seconds.
    InvalidTimestamp,
}

/// Result of parsing one sidecar file.
#[derive(Debug, Clone, PartialEq)]
pub enum SidecarOutcome {
    Parsed { title: String, taken: NaiveDateTime },
    Skipped(SkipReason),
}

/// Parse Google's JSON metadata and extract `title` + `photoTakenTime`.
pub fn parse_google_json(json_bytes: &[u8]) -> SidecarOutcome {
    match extract(json_bytes) {
        Ok((title, taken)) => SidecarOutcome::Parsed { title, taken },
        Err(reason) => SidecarOutcome::Skipped(reason),
    }
}

fn extract(json_bytes: &[u8]) -> Result<(String, NaiveDateTime), SkipReason> {
    let data: Value = serde_json::from_slice(json_bytes).map_err(|_| SkipReason::NotJson)?;
    if !data.is_object() {
        return Err(SkipReason::NotJson);
    }

    let title = data
        .get("title")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or(SkipReason::MissingTitle)?;

    let ts = data
        .get("photoTakenTime")
        .and_then(|p| p.get("timestamp"))
        .ok_or(SkipReason::MissingTimestamp)?;

    let epoch = parse_epoch(ts).ok_or(SkipReason::InvalidTimestamp)?;

    // Convert UTC epoch to local naive datetime
    let taken = super::local_from_epoch(epoch).ok_or(SkipReason::InvalidTimestamp)?;
    Ok((title.to_string(), taken))
}

/// Google writes the timestamp as a decimal string; accept plain numbers too.
fn parse_epoch(ts: &Value) -> Option<i64> {
    match ts {
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            (f.is_finite() && f.abs() < i64::MAX as f64).then(|| f.trunc() as i64)
        }),
        _ => None,
    }
}
