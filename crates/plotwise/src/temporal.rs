// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

pub fn default_temporal_formats() -> Vec<String> {
    [
        "%Y-%m-%d",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d",
        "%m/%d/%Y",
        "%d/%m/%Y",
        "%d-%m-%Y",
        "%d %b %Y",
        "%b %d, %Y",
        "%B %d, %Y",
    ]
    .iter()
    .map(|f| (*f).to_string())
    .collect()
}

/// Best-effort timestamp parser. Tries RFC 3339 first, then every format
/// as a date-time and as a date.
#[derive(Debug, Clone)]
pub struct TimestampParser {
    formats: Vec<String>,
}
impl TimestampParser {
    pub fn new() -> Self {
        Self::with_formats(default_temporal_formats())
    }
    pub fn with_formats(formats: Vec<String>) -> Self {
        Self { formats }
    }
    pub fn formats(&self) -> &[String] {
        &self.formats
    }
    pub fn parse(&self, value: &str) -> Option<NaiveDateTime> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(dt.naive_utc());
        }
        self.formats
            .iter()
            .find_map(|format| parse_with_format(value, format))
    }
    pub fn parses(&self, value: &str) -> bool {
        self.parse(value).is_some()
    }
}
impl Default for TimestampParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_with_format(value: &str, format: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
        return Some(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, format) {
        return date.and_hms_opt(0, 0, 0);
    }
    // Zone-suffixed renderings such as "2024-01-01 10:00:00 +0100".
    DateTime::parse_from_str(value, &format!("{format} %z"))
        .ok()
        .map(|dt| dt.naive_utc())
}
