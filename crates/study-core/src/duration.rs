//! Colon-delimited duration strings as reported by the device.

/// Outcome of parsing an elapsed-time report.
///
/// `Malformed` is kept apart from `Parsed(0)` so callers can tell an
/// unreadable report from a genuine zero.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DurationParse {
    Parsed(u64),
    Malformed,
}

impl DurationParse {
    pub fn seconds(self) -> Option<u64> {
        match self {
            DurationParse::Parsed(secs) => Some(secs),
            DurationParse::Malformed => None,
        }
    }

    pub fn seconds_or_zero(self) -> u64 {
        self.seconds().unwrap_or(0)
    }

    pub fn is_malformed(self) -> bool {
        matches!(self, DurationParse::Malformed)
    }
}

/// Parses `H:MM:SS`, `HH:MM:SS`, `MM:SS` or bare seconds.
pub fn parse_duration(text: &str) -> DurationParse {
    if text.trim().is_empty() {
        return DurationParse::Malformed;
    }
    let mut components = Vec::with_capacity(3);
    for part in text.split(':') {
        match parse_component(part) {
            Some(value) => components.push(value),
            None => return DurationParse::Malformed,
        }
    }
    let total = match components.as_slice() {
        [secs] => Some(*secs),
        [mins, secs] => mins.checked_mul(60).and_then(|v| v.checked_add(*secs)),
        [hours, mins, secs] => hours
            .checked_mul(3600)
            .and_then(|v| v.checked_add(mins.checked_mul(60)?))
            .and_then(|v| v.checked_add(*secs)),
        _ => None,
    };
    match total {
        Some(secs) => DurationParse::Parsed(secs),
        None => DurationParse::Malformed,
    }
}

fn parse_component(part: &str) -> Option<u64> {
    let part = part.trim();
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse::<u64>().ok()
}

/// Formats seconds as zero-padded `HH:MM:SS`; negative input renders as zero.
pub fn format_duration(seconds: i64) -> String {
    let secs = seconds.max(0) as u64;
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let rest = secs % 60;
    format!("{hours:02}:{minutes:02}:{rest:02}")
}

/// Rounds to whole seconds; negative and NaN input become 0.
pub fn normalize_seconds(value: f64) -> u64 {
    value.max(0.0).round() as u64
}
