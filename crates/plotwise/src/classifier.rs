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

use crate::dataset::{Column, ColumnValues, Dataset};
use crate::error::{ConfigError, ConfigResult};
use crate::temporal::{default_temporal_formats, TimestampParser};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    /// chrono formats tried, in order, when a text column is tested for dates.
    pub temporal_formats: Vec<String>,
}
impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            temporal_formats: default_temporal_formats(),
        }
    }
}
impl ClassifierConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(empty) = self.temporal_formats.iter().position(|f| f.trim().is_empty()) {
            return Err(ConfigError::InvalidClassifierConfig {
                field: format!("temporal_formats[{empty}]"),
                reason: "must not be blank".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnRole {
    Numeric,
    Categorical,
    Datetime,
}
impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColumnRole::Numeric => "numeric",
            ColumnRole::Categorical => "categorical",
            ColumnRole::Datetime => "datetime",
        })
    }
}

/// Disjoint role buckets covering every column of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRoleSets {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    pub datetime: Vec<String>,
}
impl ColumnRoleSets {
    pub fn get(&self, role: ColumnRole) -> &[String] {
        match role {
            ColumnRole::Numeric => &self.numeric,
            ColumnRole::Categorical => &self.categorical,
            ColumnRole::Datetime => &self.datetime,
        }
    }
    pub fn role_of(&self, column: &str) -> Option<ColumnRole> {
        [ColumnRole::Numeric, ColumnRole::Categorical, ColumnRole::Datetime]
            .into_iter()
            .find(|&role| self.get(role).iter().any(|c| c == column))
    }
    pub fn contains(&self, column: &str) -> bool {
        self.role_of(column).is_some()
    }
    pub fn total(&self) -> usize {
        self.numeric.len() + self.categorical.len() + self.datetime.len()
    }
    pub fn first_numeric(&self) -> Option<&str> {
        self.numeric.first().map(String::as_str)
    }
    pub fn first_categorical(&self) -> Option<&str> {
        self.categorical.first().map(String::as_str)
    }
}

pub struct ColumnClassifier {
    parser: TimestampParser,
}
impl ColumnClassifier {
    pub fn new() -> Self {
        Self::with_config(&ClassifierConfig::default())
    }
    pub fn with_config(config: &ClassifierConfig) -> Self {
        Self {
            parser: TimestampParser::with_formats(config.temporal_formats.clone()),
        }
    }
    pub fn parser(&self) -> &TimestampParser {
        &self.parser
    }
    pub fn classify(&self, dataset: &Dataset) -> ColumnRoleSets {
        let roles: Vec<ColumnRole> = dataset
            .columns()
            .par_iter()
            .map(|column| self.role_for(column))
            .collect();
        let mut sets = ColumnRoleSets::default();
        for (column, role) in dataset.columns().iter().zip(roles) {
            let name = column.name().to_string();
            match role {
                ColumnRole::Numeric => sets.numeric.push(name),
                ColumnRole::Categorical => sets.categorical.push(name),
                ColumnRole::Datetime => sets.datetime.push(name),
            }
        }
        debug!(
            numeric = sets.numeric.len(),
            categorical = sets.categorical.len(),
            datetime = sets.datetime.len(),
            "classified columns"
        );
        sets
    }
    fn role_for(&self, column: &Column) -> ColumnRole {
        match column.values() {
            ColumnValues::Number(_) => ColumnRole::Numeric,
            ColumnValues::Timestamp(_) => ColumnRole::Datetime,
            ColumnValues::Text(values) => {
                if self.all_present_parse(values) {
                    debug!(column = column.name(), "text column reclassified as datetime");
                    ColumnRole::Datetime
                } else {
                    ColumnRole::Categorical
                }
            }
        }
    }
    /// True only when at least one value is present and every present value
    /// parses; empty and all-missing columns stay categorical.
    fn all_present_parse(&self, values: &[Option<String>]) -> bool {
        let mut present = values.iter().flatten().peekable();
        if present.peek().is_none() {
            return false;
        }
        present.all(|v| self.parser.parses(v))
    }
}
impl Default for ColumnClassifier {
    fn default() -> Self {
        Self::new()
    }
}

pub fn classify(dataset: &Dataset) -> ColumnRoleSets {
    ColumnClassifier::new().classify(dataset)
}
