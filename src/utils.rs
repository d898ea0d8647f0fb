// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

use crate::error::{ValidationError, ValidationResult};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Parses an ISO-8601 timestamp. Offset-aware input keeps its offset; naive
/// input (including a bare date) is taken as UTC.
pub fn parse_timestamp(s: &str) -> ValidationResult<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt);
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(assume_utc(naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(assume_utc(date.and_time(NaiveTime::MIN)));
    }
    Err(ValidationError::InvalidTimestamp(s.to_string()))
}

pub fn assume_utc(naive: NaiveDateTime) -> DateTime<FixedOffset> {
    naive.and_utc().fixed_offset()
}

/// RFC 3339 with an explicit numeric offset (`+00:00`, never `Z`).
pub fn format_timestamp(dt: &DateTime<FixedOffset>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

pub fn now_utc() -> DateTime<FixedOffset> {
    chrono::Utc::now().fixed_offset()
}

/// Serde adapter for timestamps stored with an explicit offset.
pub mod timestamp {
    use super::{format_timestamp, parse_timestamp};
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<FixedOffset>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_timestamp(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<FixedOffset>, D::Error> {
        let raw = String::deserialize(d)?;
        parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use super::super::{format_timestamp, parse_timestamp};
        use chrono::{DateTime, FixedOffset};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<FixedOffset>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => s.serialize_some(&format_timestamp(dt)),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<FixedOffset>>, D::Error> {
            let raw = Option::<String>::deserialize(d)?;
            raw.map(|s| parse_timestamp(&s))
                .transpose()
                .map_err(serde::de::Error::custom)
        }
    }
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn parse_id(s: &str) -> Result<i64> {
    s.trim()
        .parse::<i64>()
        .with_context(|| format!("Invalid id '{}'", s))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn id_for_category(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM categories WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name.trim()], |r| r.get(0))
        .with_context(|| format!("Category '{}' not found", name.trim()))?;
    Ok(id)
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

pub fn required_arg<'m>(m: &'m clap::ArgMatches, id: &str) -> Result<&'m str> {
    m.get_one::<String>(id)
        .map(String::as_str)
        .with_context(|| format!("Missing required argument '{}'", id))
}

/// Cuts `s` to at most `max` characters.
pub fn clip(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naive_timestamp_gets_utc_offset() {
        let dt = parse_timestamp("2024-01-01T00:00:00").unwrap();
        assert_eq!(format_timestamp(&dt), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn offset_timestamp_is_kept() {
        let dt = parse_timestamp("2024-01-01T00:00:00+05:00").unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 5 * 3600);
        assert_eq!(format_timestamp(&dt), "2024-01-01T00:00:00+05:00");
    }

    #[test]
    fn bare_date_is_midnight_utc() {
        let dt = parse_timestamp(" 2025-03-14 ").unwrap();
        assert_eq!(format_timestamp(&dt), "2025-03-14T00:00:00+00:00");
    }

    #[test]
    fn fractional_seconds_survive() {
        let dt = parse_timestamp("2024-06-30 18:45:12.250").unwrap();
        assert_eq!(format_timestamp(&dt), "2024-06-30T18:45:12.250+00:00");
    }

    #[test]
    fn garbage_timestamp_is_rejected() {
        let err = parse_timestamp("yesterday").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidTimestamp(_)));
    }

    #[test]
    fn clip_counts_characters() {
        assert_eq!(clip("héllo", 2), "hé");
    }
}
