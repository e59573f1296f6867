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

use crate::classifier::ColumnRoleSets;
use crate::dataset::{ColumnKind, Dataset};
use serde::Serialize;
use std::fmt;

pub const PREVIEW_ROWS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "columns", rename_all = "snake_case")]
pub enum MissingValues {
    None,
    /// Columns with at least one missing cell, in column order.
    Columns(Vec<(String, usize)>),
}

/// Headline figures shown above the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetOverview {
    pub row_count: usize,
    pub column_count: usize,
    pub numeric_count: usize,
    pub categorical_count: usize,
    pub column_kinds: Vec<(String, ColumnKind)>,
    pub missing: MissingValues,
}
impl DatasetOverview {
    pub fn new(dataset: &Dataset, roles: &ColumnRoleSets) -> Self {
        let column_kinds = dataset
            .columns()
            .iter()
            .map(|c| (c.name().to_string(), c.kind()))
            .collect();
        let with_gaps: Vec<(String, usize)> = dataset
            .missing_counts()
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(name, count)| (name.to_string(), count))
            .collect();
        let missing = if with_gaps.is_empty() {
            MissingValues::None
        } else {
            MissingValues::Columns(with_gaps)
        };
        Self {
            row_count: dataset.row_count(),
            column_count: dataset.column_count(),
            numeric_count: roles.numeric.len(),
            categorical_count: roles.categorical.len(),
            column_kinds,
            missing,
        }
    }
    pub fn has_missing_values(&self) -> bool {
        matches!(self.missing, MissingValues::Columns(_))
    }
    pub fn report(&self) -> String {
        self.to_string()
    }
}
impl fmt::Display for DatasetOverview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset Overview")?;
        writeln!(f, "================")?;
        writeln!(f, "Rows: {}", self.row_count)?;
        writeln!(f, "Columns: {}", self.column_count)?;
        writeln!(f, "  - Numeric: {}", self.numeric_count)?;
        writeln!(f, "  - Categorical: {}", self.categorical_count)?;
        writeln!(f, "\nColumn Types:")?;
        for (name, kind) in &self.column_kinds {
            writeln!(f, "  - {name}: {kind}")?;
        }
        writeln!(f, "\nMissing Values:")?;
        match &self.missing {
            MissingValues::None => writeln!(f, "  No missing values"),
            MissingValues::Columns(columns) => {
                for (name, count) in columns {
                    writeln!(f, "  - {name}: {count}")?;
                }
                Ok(())
            }
        }
    }
}

/// First rows of the dataset for the raw-data table.
pub fn preview(dataset: &Dataset) -> Dataset {
    dataset.head(PREVIEW_ROWS)
}
