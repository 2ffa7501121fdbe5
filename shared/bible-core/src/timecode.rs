//! Marker time codes
//!
//! Verse marker tables carry `HH:MM:SS:FF`, `HH:MM:SS`, `MM:SS` or bare `SS`. Frames are dropped.

use crate::{BibleCoreError, Result};

/// Parse a marker time code to seconds
pub fn parse_timecode(timecode: &str) -> Result<f64> {
    let trimmed = timecode.trim();
    let invalid = || BibleCoreError::InvalidTimecode(timecode.to_string());

    if trimmed.is_empty() {
        return Err(invalid());
    }

    let parts: Vec<&str> = trimmed.split(':').map(str::trim).collect();

    let (hours, minutes, seconds) = match parts.as_slice() {
        // HH:MM:SS or HH:MM:SS:FF, frame component ignored
        [h, m, s] | [h, m, s, _] => (parse_whole(h), parse_whole(m), parse_seconds(s)),
        [m, s] => (Some(0), parse_whole(m), parse_seconds(s)),
        [s] => (Some(0), Some(0), parse_seconds(s)),
        _ => return Err(invalid()),
    };

    match (hours, minutes, seconds) {
        (Some(h), Some(m), Some(s)) => h
            .checked_mul(3600)
            .zip(m.checked_mul(60))
            .and_then(|(h, m)| h.checked_add(m))
            .map(|whole| whole as f64 + s)
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

fn parse_whole(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn parse_seconds(text: &str) -> Option<f64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }
    text.parse::<f64>().ok().filter(|s| s.is_finite())
}

/// Format seconds the way the player seek bar shows them (`MM:SS` or `HH:MM:SS`)
pub fn format_timecode(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "00:00".to_string();
    }

    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
