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

use crate::error::{DataError, DataResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Storage kind of a column, fixed once when the file is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Number,
    Text,
    Timestamp,
}
impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Number => "number",
            ColumnKind::Text => "text",
            ColumnKind::Timestamp => "timestamp",
        }
    }
}
impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "lowercase")]
pub enum ColumnValues {
    Number(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Timestamp(Vec<Option<NaiveDateTime>>),
}
impl ColumnValues {
    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnValues::Number(_) => ColumnKind::Number,
            ColumnValues::Text(_) => ColumnKind::Text,
            ColumnValues::Timestamp(_) => ColumnKind::Timestamp,
        }
    }
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Number(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
            ColumnValues::Timestamp(v) => v.len(),
        }
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn is_missing(&self, index: usize) -> bool {
        match self {
            ColumnValues::Number(v) => v.get(index).map_or(true, |x| x.map_or(true, f64::is_nan)),
            ColumnValues::Text(v) => v.get(index).map_or(true, Option::is_none),
            ColumnValues::Timestamp(v) => v.get(index).map_or(true, Option::is_none),
        }
    }
    fn select(&self, indices: &[usize]) -> ColumnValues {
        match self {
            ColumnValues::Number(v) => {
                ColumnValues::Number(indices.iter().map(|&i| v[i]).collect())
            }
            ColumnValues::Text(v) => {
                ColumnValues::Text(indices.iter().map(|&i| v[i].clone()).collect())
            }
            ColumnValues::Timestamp(v) => {
                ColumnValues::Timestamp(indices.iter().map(|&i| v[i]).collect())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    name: String,
    values: ColumnValues,
}
impl Column {
    pub fn new(name: impl Into<String>, values: ColumnValues) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
    pub fn numbers(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnValues::Number(values))
    }
    pub fn texts(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self::new(name, ColumnValues::Text(values))
    }
    pub fn timestamps(name: impl Into<String>, values: Vec<Option<NaiveDateTime>>) -> Self {
        Self::new(name, ColumnValues::Timestamp(values))
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn kind(&self) -> ColumnKind {
        self.values.kind()
    }
    pub fn values(&self) -> &ColumnValues {
        &self.values
    }
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
    /// Missing cells: nulls, and NaN for numbers.
    pub fn missing_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.values.is_missing(i)).count()
    }
    pub fn as_numbers(&self) -> Option<&[Option<f64>]> {
        match &self.values {
            ColumnValues::Number(v) => Some(v),
            _ => None,
        }
    }
    pub fn as_texts(&self) -> Option<&[Option<String>]> {
        match &self.values {
            ColumnValues::Text(v) => Some(v),
            _ => None,
        }
    }
    pub fn as_timestamps(&self) -> Option<&[Option<NaiveDateTime>]> {
        match &self.values {
            ColumnValues::Timestamp(v) => Some(v),
            _ => None,
        }
    }
    /// Numeric view of a cell, if the column is numeric and the cell present.
    pub fn number_at(&self, index: usize) -> Option<f64> {
        self.as_numbers()?.get(index).copied().flatten().filter(|v| !v.is_nan())
    }
    /// Display form of a cell, `None` when missing.
    pub fn display_at(&self, index: usize) -> Option<String> {
        if self.values.is_missing(index) {
            return None;
        }
        match &self.values {
            ColumnValues::Number(v) => v[index].map(format_number),
            ColumnValues::Text(v) => v[index].clone(),
            ColumnValues::Timestamp(v) => v[index].map(|ts| {
                if ts.time() == chrono::NaiveTime::MIN {
                    ts.format("%Y-%m-%d").to_string()
                } else {
                    ts.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }),
        }
    }
    fn select(&self, indices: &[usize]) -> Column {
        Column {
            name: self.name.clone(),
            values: self.values.select(indices),
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// In-memory table: uniquely named columns sharing one row count.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}
impl Dataset {
    pub fn new(columns: Vec<Column>) -> DataResult<Self> {
        let row_count = columns.first().map_or(0, Column::len);
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(DataError::DuplicateColumn {
                    column: column.name.clone(),
                });
            }
            if column.len() != row_count {
                return Err(DataError::LengthMismatch {
                    column: column.name.clone(),
                    expected: row_count,
                    found: column.len(),
                });
            }
        }
        Ok(Self { columns, row_count })
    }
    pub fn row_count(&self) -> usize {
        self.row_count
    }
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
    /// The first `n` rows, used for the raw-data preview.
    pub fn head(&self, n: usize) -> Dataset {
        let indices: Vec<usize> = (0..self.row_count.min(n)).collect();
        self.take_rows(&indices)
    }
    pub(crate) fn take_rows(&self, indices: &[usize]) -> Dataset {
        Dataset {
            columns: self.columns.iter().map(|c| c.select(indices)).collect(),
            row_count: indices.len(),
        }
    }
    /// Subset of columns in the requested order.
    pub fn project(&self, names: &[&str]) -> DataResult<Dataset> {
        let columns = names
            .iter()
            .map(|name| {
                self.column(name)
                    .cloned()
                    .ok_or_else(|| DataError::ColumnNotFound {
                        column: (*name).to_string(),
                    })
            })
            .collect::<DataResult<Vec<_>>>()?;
        Dataset::new(columns)
    }
    /// Missing-value count per column, in column order.
    pub fn missing_counts(&self) -> Vec<(&str, usize)> {
        self.columns
            .iter()
            .map(|c| (c.name.as_str(), c.missing_count()))
            .collect()
    }
}
