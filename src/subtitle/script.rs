//! ASS/SSA script dialogue extraction
//!
//! Reads the `[Events]` section of a caption script and turns every
//! `Dialogue:` event into a [`DialogueLine`] carrying both the raw markup
//! and its plain-text form.

use serde::Serialize;

use super::normalize::normalize;
use crate::error::{Result, StudioError};

/// One dialogue event from a caption script
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DialogueLine {
    /// Render layer (0 for SSA scripts, which have no layers)
    pub layer: u32,
    /// Start time in milliseconds
    pub start_ms: u64,
    /// End time in milliseconds
    pub end_ms: u64,
    /// Style name
    pub style: String,
    /// Speaker name
    pub name: String,
    /// Text as written in the script, tags and escapes included
    pub raw_text: String,
    /// Text as shown in the editor
    pub text: String,
}

impl DialogueLine {
    /// Get the duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// Column layout of event lines, taken from the `Format:` line.
#[derive(Debug, Clone, PartialEq)]
struct EventFormat {
    layer: Option<usize>,
    start: usize,
    end: usize,
    style: Option<usize>,
    name: Option<usize>,
    /// Total columns; Text is always the last one.
    columns: usize,
}

impl Default for EventFormat {
    fn default() -> Self {
        // Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
        Self {
            layer: Some(0),
            start: 1,
            end: 2,
            style: Some(3),
            name: Some(4),
            columns: 10,
        }
    }
}

impl EventFormat {
    fn parse(columns: &str) -> Result<Self> {
        let fields: Vec<String> = columns
            .split(',')
            .map(|f| f.trim().to_ascii_lowercase())
            .collect();
        let position = |name: &str| fields.iter().position(|f| f == name);

        if fields.last().map(String::as_str) != Some("text") {
            return Err(StudioError::Caption(format!(
                "event format must end with Text: {}",
                columns.trim()
            )));
        }
        let start = position("start")
            .ok_or_else(|| StudioError::Caption("event format has no Start".into()))?;
        let end = position("end")
            .ok_or_else(|| StudioError::Caption("event format has no End".into()))?;

        Ok(Self {
            layer: position("layer"),
            start,
            end,
            style: position("style"),
            name: position("name"),
            columns: fields.len(),
        })
    }

    fn parse_event(&self, body: &str) -> Result<DialogueLine> {
        let fields: Vec<&str> = body.trim_start().splitn(self.columns, ',').collect();
        if fields.len() < self.columns {
            return Err(StudioError::Caption(format!(
                "expected {} fields, found {}: {}",
                self.columns,
                fields.len(),
                body.trim()
            )));
        }

        let field = |idx: Option<usize>| {
            idx.map(|i| fields[i].trim().to_string())
                .unwrap_or_default()
        };
        let raw_text = fields[self.columns - 1].trim_end_matches(['\r', '\n']).to_string();

        Ok(DialogueLine {
            layer: self
                .layer
                .and_then(|i| fields[i].trim().parse().ok())
                .unwrap_or(0),
            start_ms: parse_timestamp(fields[self.start])?,
            end_ms: parse_timestamp(fields[self.end])?,
            style: field(self.style),
            name: field(self.name),
            text: normalize(&raw_text),
            raw_text,
        })
    }
}

/// Parse an ASS timestamp (`H:MM:SS.cc`) into milliseconds.
///
/// The fraction is read as a decimal fraction of a second, so both the
/// usual centiseconds and millisecond precision are accepted.
pub fn parse_timestamp(ts: &str) -> Result<u64> {
    let ts = ts.trim();
    let invalid = || StudioError::Caption(format!("invalid timestamp: {:?}", ts));

    let mut parts = ts.split(':');
    let (Some(h), Some(m), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };
    let (secs, frac) = s.split_once('.').unwrap_or((s, ""));

    let number = |v: &str| -> Result<u64> {
        if v.is_empty() || !v.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        v.parse::<u64>().map_err(|_| invalid())
    };

    let hours = number(h)?;
    let minutes = number(m)?;
    let seconds = number(secs)?;
    if minutes >= 60 || seconds >= 60 {
        return Err(invalid());
    }

    let millis = if frac.is_empty() {
        0
    } else {
        let digits: String = frac.chars().chain("000".chars()).take(3).collect();
        number(&digits)?
    };

    hours
        .checked_mul(3600)
        .and_then(|s| s.checked_add(minutes * 60 + seconds))
        .and_then(|s| s.checked_mul(1000))
        .and_then(|ms| ms.checked_add(millis))
        .ok_or_else(invalid)
}

/// Parse a single `Dialogue:` line using the standard ASS column layout.
pub fn parse_dialogue(line: &str) -> Result<DialogueLine> {
    let body = line
        .trim_start()
        .strip_prefix("Dialogue:")
        .ok_or_else(|| StudioError::Caption(format!("not a dialogue line: {}", line.trim())))?;
    EventFormat::default().parse_event(body)
}

/// Extract every dialogue event of a script, ordered by start time.
pub fn parse_script(script: &str) -> Result<Vec<DialogueLine>> {
    let mut in_events = false;
    let mut format = EventFormat::default();
    let mut lines = Vec::new();

    for (lineno, line) in script.lines().enumerate() {
        let line = line.trim_start_matches('\u{feff}').trim();
        if line.starts_with('[') && line.ends_with(']') {
            in_events = line.eq_ignore_ascii_case("[events]");
            continue;
        }
        if !in_events {
            continue;
        }

        if let Some(columns) = line.strip_prefix("Format:") {
            format = EventFormat::parse(columns)?;
        } else if let Some(body) = line.strip_prefix("Dialogue:") {
            let dialogue = format.parse_event(body).map_err(|e| match e {
                StudioError::Caption(msg) => {
                    StudioError::Caption(format!("line {}: {}", lineno + 1, msg))
                }
                other => other,
            })?;
            lines.push(dialogue);
        }
    }

    tracing::debug!("Parsed {} dialogue line(s) from script", lines.len());

    // Stable, so simultaneous events keep script order.
    lines.sort_by_key(|l| l.start_ms);
    Ok(lines)
}

/// Join the plain text of all lines, one event per line.
pub fn plain_text(lines: &[DialogueLine]) -> String {
    lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
