// ── Modem reply parsing ──
//
// Both transports end up with text: CLI replies or HTML pages. These
// helpers normalize that text into field maps and reports.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use super::{DeviceOverview, FormMap, PingReport};
use crate::enums::{DeviceState, EnumFamily};
use crate::model::Faults;

static PING_COUNTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s+packets?\s+transmitted,\s*(\d+)\s+(?:packets?\s+)?received")
        .expect("static regex")
});
static PING_RTT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)min/avg/max[^=]*=\s*([\d.]+)/([\d.]+)/([\d.]+)").expect("static regex")
});
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("static regex"));

/// Extract the packet counts and average round trip from ping output.
pub fn parse_ping(text: &str) -> Option<PingReport> {
    let counts = PING_COUNTS_RE.captures(text)?;
    let sent = counts.get(1)?.as_str().parse().ok()?;
    let received = counts.get(2)?.as_str().parse().ok()?;
    let rtt_avg_ms = PING_RTT_RE
        .captures(text)
        .and_then(|c| c.get(2))
        .and_then(|m| m.as_str().parse().ok());

    Some(PingReport {
        sent,
        received,
        rtt_avg_ms,
    })
}

/// Parse `Key: value` lines. Keys are lowercased with spaces turned into
/// underscores; lines without a colon are skipped.
pub fn parse_key_values(text: &str) -> FormMap {
    text.lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            let key = key
                .split_whitespace()
                .collect::<Vec<_>>()
                .join("_")
                .to_ascii_lowercase();
            Some((key, value.trim().to_owned()))
        })
        .collect()
}

/// Drop HTML tags so page text can go through the line parsers.
pub(crate) fn strip_tags(html: &str) -> String {
    TAG_RE
        .replace_all(html, "\n")
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build an overview out of a status field map.
pub(crate) fn overview_from_fields(fields: FormMap) -> DeviceOverview {
    let text = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| fields.get(*k))
            .filter(|v| !v.is_empty())
            .cloned()
    };

    DeviceOverview {
        state: fields.get("state").and_then(|s| DeviceState::parse(s).ok()),
        model: text(&["model", "hardware"]),
        serial: text(&["serial", "serial_number", "sn"]),
        software: text(&["software", "sw_version", "version"]),
        faults: fields
            .get("faults")
            .map(|raw| parse_faults(raw))
            .unwrap_or_default(),
        fields,
    }
}

/// Faults as a decimal mask or as space/comma/pipe separated flag names.
///
/// Known names are kept even when others are not recognized.
fn parse_faults(raw: &str) -> Faults {
    let raw = raw.trim();
    if let Ok(mask) = raw.parse::<u64>() {
        return Faults::decode(mask);
    }
    let mut unknown = Vec::new();
    let faults = raw
        .split(|c: char| c == ',' || c == '|' || c.is_whitespace())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("none"))
        .fold(Faults::empty(), |acc, name| match Faults::from_names(&[name]) {
            Ok(flag) => acc | flag,
            Err(_) => {
                unknown.push(name);
                acc
            }
        });
    if !unknown.is_empty() {
        warn!(unknown = ?unknown, reported = raw, "device reported unrecognized fault names");
    }
    faults
}
