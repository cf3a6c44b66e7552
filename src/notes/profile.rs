//! Note format profiles.
//!
//! Each broker layout is a declarative rule set: how the trade date is
//! announced, which markers identify an options trade line, and how the
//! fields are pulled out of that line. The scanning loop in
//! [`super::scan`] is shared by every profile.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::fields::{parse_day_first, parse_decimal, parse_quantity};
use super::{Side, SkipReason, TradeFields};
use crate::error::NoteError;

static DATE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{2}/\d{2}/\d{4})\b").expect("valid date token regex"));

// Option series: underlying root, series letter (A-L calls, M-X puts), strike code
static OPTION_SERIES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{4}[A-X]\d{1,4}[A-Z]?$").expect("valid option series regex"));

static PREGAO_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"DATA\s+(?:DO\s+)?PREGAO").expect("valid pregao label regex"));

static LISTADO_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bB3\s+RV\s+LISTADO\b").expect("valid listado segment regex"));

static BOVESPA_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d-BOVESPA\b").expect("valid bovespa segment regex"));

static BOVESPA_TRADE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*\d-BOVESPA\s+(?P<side>[CV])\s+(?:\S+\s+)*?OPCAO\s+DE\s+(?:COMPRA|VENDA)\s+(?:\d{2}/\d{2}\s+)?(?P<asset>[A-Z0-9]+)\b.*?\s(?P<qty>\d{1,3}(?:\.\d{3})+|\d+)\s+(?P<price>[\d.]+,\d+)\s+(?P<value>[\d.]+,\d+)\s+[DC]\s*$",
    )
    .expect("valid bovespa trade regex")
});

const INSTRUMENT_MARKER: &str = "OPCAO DE";

/// Closed set of supported brokerage-note layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FormatProfile {
    /// Layout "A": column-oriented note, trade lines tagged `B3 RV LISTADO`,
    /// date printed under the `Data pregão` header.
    Columnar,
    /// Layout "B": segmented note, trade lines tagged `1-BOVESPA`,
    /// `Data pregão: DD/MM/YYYY` on one line.
    Segmented,
}

impl FormatProfile {
    pub const ALL: [FormatProfile; 2] = [FormatProfile::Columnar, FormatProfile::Segmented];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormatProfile::Columnar => "A",
            FormatProfile::Segmented => "B",
        }
    }

    pub(crate) fn rules(&self) -> &'static ProfileRules {
        match self {
            FormatProfile::Columnar => &COLUMNAR,
            FormatProfile::Segmented => &SEGMENTED,
        }
    }

    /// Pick the profile whose trade signature appears most often in `text`.
    ///
    /// Returns `None` when no line matches any profile (a document with no
    /// options trades, or an unsupported layout).
    pub fn detect(text: &str) -> Option<FormatProfile> {
        let folded: Vec<String> = text.lines().map(super::fields::fold_line).collect();

        Self::ALL
            .iter()
            .map(|profile| {
                let hits = folded
                    .iter()
                    .filter(|line| profile.rules().is_trade_line(line))
                    .count();
                (*profile, hits)
            })
            .filter(|(_, hits)| *hits > 0)
            // max_by_key keeps the last maximum; reverse so ties go to the first profile
            .rev()
            .max_by_key(|(_, hits)| *hits)
            .map(|(profile, _)| profile)
    }
}

impl fmt::Display for FormatProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatProfile {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" | "COLUMNAR" => Ok(FormatProfile::Columnar),
            "B" | "SEGMENTED" => Ok(FormatProfile::Segmented),
            other => Err(NoteError::UnknownProfile(other.to_lowercase())),
        }
    }
}

/// How a profile announces the trade date of the trades that follow
pub(crate) struct DateMarker {
    label: &'static Lazy<Regex>,
    /// Look at the next non-blank line when the label line carries no date
    next_line: bool,
}

/// How fields are pulled out of a recognized trade line
pub(crate) enum FieldRule {
    /// Whitespace tokens counted from the right: `... qty price value D/C`.
    /// Asset falls back to a fixed token index when no option series is found.
    Trailing { asset_index: usize },
    /// One regex with `side`, `asset`, `qty`, `price` and `value` groups
    Pattern(&'static Lazy<Regex>),
}

pub(crate) struct ProfileRules {
    date_marker: DateMarker,
    segment: &'static Lazy<Regex>,
    instrument: &'static str,
    fields: FieldRule,
}

static COLUMNAR: ProfileRules = ProfileRules {
    date_marker: DateMarker {
        label: &PREGAO_LABEL,
        next_line: true,
    },
    segment: &LISTADO_SEGMENT,
    instrument: INSTRUMENT_MARKER,
    fields: FieldRule::Trailing { asset_index: 7 },
};

static SEGMENTED: ProfileRules = ProfileRules {
    date_marker: DateMarker {
        label: &PREGAO_LABEL,
        next_line: false,
    },
    segment: &BOVESPA_SEGMENT,
    instrument: INSTRUMENT_MARKER,
    fields: FieldRule::Pattern(&BOVESPA_TRADE),
};

impl ProfileRules {
    /// Check a folded line against the date marker.
    ///
    /// `None`: not a date marker line. `Some(None)`: the marker is there but
    /// no readable date follows, which clears the current trade date.
    pub(crate) fn match_date(&self, folded: &[String], idx: usize) -> Option<Option<NaiveDate>> {
        let line = &folded[idx];
        let label = self.date_marker.label.find(line)?;

        let on_line = DATE_TOKEN
            .captures(&line[label.end()..])
            .and_then(|c| parse_day_first(&c[1]));
        if on_line.is_some() || !self.date_marker.next_line {
            return Some(on_line);
        }

        let next = folded[idx + 1..]
            .iter()
            .find(|l| !l.trim().is_empty())
            .and_then(|l| DATE_TOKEN.captures(l))
            .and_then(|c| parse_day_first(&c[1]));
        Some(next)
    }

    pub(crate) fn is_trade_line(&self, folded: &str) -> bool {
        self.segment.is_match(folded) && folded.contains(self.instrument)
    }

    pub(crate) fn extract(&self, folded: &str) -> Result<TradeFields, SkipReason> {
        match self.fields {
            FieldRule::Trailing { asset_index } => extract_trailing(folded, asset_index),
            FieldRule::Pattern(regex) => extract_pattern(folded, regex),
        }
    }
}

fn extract_trailing(folded: &str, asset_index: usize) -> Result<TradeFields, SkipReason> {
    let tokens: Vec<&str> = folded.split_whitespace().collect();
    if tokens.len() < 5 {
        return Err(SkipReason::MissingField("quantity"));
    }

    let n = tokens.len();
    let head = &tokens[..n - 4];

    let side = head
        .iter()
        .find_map(|t| Side::from_marker(t))
        .ok_or(SkipReason::MissingSide)?;

    let asset_code = head
        .iter()
        .find(|t| OPTION_SERIES.is_match(t))
        .or_else(|| tokens.get(asset_index))
        .filter(|t| t.chars().all(|ch| ch.is_ascii_alphanumeric()))
        .map(|t| t.to_string())
        .ok_or(SkipReason::MissingAsset)?;

    Ok(TradeFields {
        asset_code,
        side,
        quantity: parse_quantity(tokens[n - 4])?,
        unit_price: parse_decimal(tokens[n - 3], "price")?,
        gross_value: parse_decimal(tokens[n - 2], "value")?,
    })
}

fn extract_pattern(folded: &str, regex: &Regex) -> Result<TradeFields, SkipReason> {
    let caps = regex.captures(folded).ok_or(SkipReason::UnrecognizedLayout)?;

    let group = |name: &'static str| {
        caps.name(name)
            .map(|m| m.as_str())
            .ok_or(SkipReason::MissingField(name))
    };

    let side = Side::from_marker(group("side")?).ok_or(SkipReason::MissingSide)?;
    let asset_code = group("asset")?.to_string();
    if !OPTION_SERIES.is_match(&asset_code) {
        return Err(SkipReason::MissingAsset);
    }

    Ok(TradeFields {
        asset_code,
        side,
        quantity: parse_quantity(group("qty")?)?,
        unit_price: parse_decimal(group("price")?, "price")?,
        gross_value: parse_decimal(group("value")?, "value")?,
    })
}
