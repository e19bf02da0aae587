// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

//! Cookie expiry arithmetic and human-readable lifetimes.
//!
//! Browsers report cookie expiry as seconds since the epoch, with `-1` (or
//! any non-positive value) meaning "session cookie". The crawler stores the
//! lifetime relative to the moment the cookie was observed so reports stay
//! meaningful without knowing when the crawl ran.

use std::collections::BTreeSet;

use crate::types::{Language, Lifetime, ReadableLifetime};

/// Word used for session cookies. Identical in every supported language.
pub const SESSION_LABEL: &str = "Session";

const SECOND_MS: i64 = 1_000;
const MINUTE_MS: i64 = 60 * SECOND_MS;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;
const WEEK_MS: i64 = 7 * DAY_MS;
const YEAR_MS: i64 = 31_557_600_000;
const MONTH_MS: i64 = YEAR_MS / 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
}

/// Largest first.
const UNITS: [(Unit, i64); 8] = [
    (Unit::Year, YEAR_MS),
    (Unit::Month, MONTH_MS),
    (Unit::Week, WEEK_MS),
    (Unit::Day, DAY_MS),
    (Unit::Hour, HOUR_MS),
    (Unit::Minute, MINUTE_MS),
    (Unit::Second, SECOND_MS),
    (Unit::Millisecond, 1),
];

impl Unit {
    fn label(self, lang: Language, count: i64) -> &'static str {
        let one = count == 1;
        match (lang, self) {
            (Language::En, Unit::Year) => if one { "year" } else { "years" },
            (Language::En, Unit::Month) => if one { "month" } else { "months" },
            (Language::En, Unit::Week) => if one { "week" } else { "weeks" },
            (Language::En, Unit::Day) => if one { "day" } else { "days" },
            (Language::En, Unit::Hour) => if one { "hour" } else { "hours" },
            (Language::En, Unit::Minute) => if one { "minute" } else { "minutes" },
            (Language::En, Unit::Second) => if one { "second" } else { "seconds" },
            (Language::En, Unit::Millisecond) => {
                if one { "millisecond" } else { "milliseconds" }
            }
            (Language::De, Unit::Year) => if one { "Jahr" } else { "Jahre" },
            (Language::De, Unit::Month) => if one { "Monat" } else { "Monate" },
            (Language::De, Unit::Week) => if one { "Woche" } else { "Wochen" },
            (Language::De, Unit::Day) => if one { "Tag" } else { "Tage" },
            (Language::De, Unit::Hour) => if one { "Stunde" } else { "Stunden" },
            (Language::De, Unit::Minute) => if one { "Minute" } else { "Minuten" },
            (Language::De, Unit::Second) => if one { "Sekunde" } else { "Sekunden" },
            (Language::De, Unit::Millisecond) => {
                if one { "Millisekunde" } else { "Millisekunden" }
            }
        }
    }
}

fn expired_label(lang: Language) -> &'static str {
    match lang {
        Language::En => "expired",
        Language::De => "abgelaufen",
    }
}

/// Compute the remaining lifetime of a cookie.
///
/// `raw_expiry_secs` is the browser's expiry (seconds since epoch),
/// `reference_ms` the observation instant (milliseconds since epoch).
/// Already-expired cookies yield a negative duration.
pub fn remaining_lifetime(raw_expiry_secs: f64, reference_ms: i64) -> Lifetime {
    // `!(x > 0)` also routes NaN to the session branch.
    if !(raw_expiry_secs > 0.0) {
        return Lifetime::Session;
    }
    let expiry_ms = (raw_expiry_secs * 1000.0).trunc() as i64;
    Lifetime::Remaining(expiry_ms.saturating_sub(reference_ms))
}

/// Render a single duration as "<n> <unit>" using only its largest unit.
pub fn render_duration(ms: i64, lang: Language) -> String {
    if ms <= 0 {
        return expired_label(lang).to_string();
    }

    let idx = UNITS
        .iter()
        .position(|(_, unit_ms)| ms >= *unit_ms)
        .unwrap_or(UNITS.len() - 1);
    let (mut unit, unit_ms) = UNITS[idx];
    let mut count = (ms as f64 / unit_ms as f64).round() as i64;

    // 59.6 minutes reads better as "1 hour" than "60 minutes".
    if idx > 0 {
        let (larger, larger_ms) = UNITS[idx - 1];
        if count.saturating_mul(unit_ms) >= larger_ms {
            unit = larger;
            count = ((ms as f64 / larger_ms as f64).round() as i64).max(1);
        }
    }

    format!("{count} {}", unit.label(lang, count))
}

/// Render a lifetime in every requested language.
pub fn render_human(lifetime: Lifetime, languages: &BTreeSet<Language>) -> ReadableLifetime {
    languages
        .iter()
        .map(|lang| {
            let text = match lifetime {
                Lifetime::Session => SESSION_LABEL.to_string(),
                Lifetime::Remaining(ms) => render_duration(ms, *lang),
            };
            (*lang, text)
        })
        .collect()
}

/// Lifetime computation bound to the crawl's configured languages.
#[derive(Debug, Clone)]
pub struct ExpiryCalculator {
    languages: BTreeSet<Language>,
}

impl ExpiryCalculator {
    pub fn new(languages: impl IntoIterator<Item = Language>) -> Self {
        Self {
            languages: languages.into_iter().collect(),
        }
    }

    pub fn languages(&self) -> &BTreeSet<Language> {
        &self.languages
    }

    pub fn lifetime(&self, raw_expiry_secs: f64, reference_ms: i64) -> Lifetime {
        remaining_lifetime(raw_expiry_secs, reference_ms)
    }

    pub fn render(&self, lifetime: Lifetime) -> ReadableLifetime {
        render_human(lifetime, &self.languages)
    }
}

impl Default for ExpiryCalculator {
    fn default() -> Self {
        Self::new([Language::De, Language::En])
    }
}
