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

use crate::classifier::ColumnRole;
use crate::dataset::Dataset;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartKind {
    Pie,
    Donut,
    Bar,
    HorizontalBar,
    Column,
    Scatter,
    Bubble,
    Histogram,
    RadialBar,
}
impl ChartKind {
    pub const ALL: [ChartKind; 9] = [
        ChartKind::Pie,
        ChartKind::Donut,
        ChartKind::Bar,
        ChartKind::HorizontalBar,
        ChartKind::Column,
        ChartKind::Scatter,
        ChartKind::Bubble,
        ChartKind::Histogram,
        ChartKind::RadialBar,
    ];
    pub fn display_name(&self) -> &'static str {
        match self {
            ChartKind::Pie => "Pie Chart",
            ChartKind::Donut => "Donut Chart",
            ChartKind::Bar => "Bar Chart",
            ChartKind::HorizontalBar => "Horizontal Bar Chart",
            ChartKind::Column => "Column Chart",
            ChartKind::Scatter => "Scatter Plot",
            ChartKind::Bubble => "Bubble Chart",
            ChartKind::Histogram => "Histogram",
            ChartKind::RadialBar => "Radial Bar Chart",
        }
    }
    /// Preferred role for each column picker of the manual panel, in the
    /// order the pickers are shown.
    pub fn manual_roles(&self) -> &'static [(EncodingRole, ColumnRole)] {
        match self {
            ChartKind::Pie
            | ChartKind::Donut
            | ChartKind::Bar
            | ChartKind::HorizontalBar
            | ChartKind::Column
            | ChartKind::RadialBar => &[
                (EncodingRole::Category, ColumnRole::Categorical),
                (EncodingRole::Value, ColumnRole::Numeric),
            ],
            ChartKind::Scatter => &[
                (EncodingRole::X, ColumnRole::Numeric),
                (EncodingRole::Y, ColumnRole::Numeric),
            ],
            ChartKind::Bubble => &[
                (EncodingRole::X, ColumnRole::Numeric),
                (EncodingRole::Y, ColumnRole::Numeric),
                (EncodingRole::Size, ColumnRole::Numeric),
            ],
            ChartKind::Histogram => &[(EncodingRole::X, ColumnRole::Numeric)],
        }
    }
    pub fn supports_color(&self) -> bool {
        matches!(self, ChartKind::Scatter | ChartKind::Bubble)
    }
}
impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingRole {
    Category,
    Value,
    X,
    Y,
    Color,
    Size,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub role: EncodingRole,
    pub column: String,
}
impl Binding {
    pub fn new(role: EncodingRole, column: impl Into<String>) -> Self {
        Self {
            role,
            column: column.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hole: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bins: Option<usize>,
    /// Label each point with its row position.
    #[serde(default)]
    pub point_labels: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_max: Option<f64>,
}

/// How a spec's data was derived from the source dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    pub group_by: String,
    pub summed: String,
    pub top_n: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub bindings: Vec<Binding>,
    pub options: ChartOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<Aggregation>,
    #[serde(skip)]
    pub data: Arc<Dataset>,
}
impl ChartSpec {
    pub fn new(kind: ChartKind, data: Arc<Dataset>) -> Self {
        Self {
            kind,
            title: kind.display_name().to_string(),
            bindings: Vec::new(),
            options: ChartOptions::default(),
            aggregation: None,
            data,
        }
    }
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
    pub fn bind(mut self, role: EncodingRole, column: impl Into<String>) -> Self {
        self.bindings.push(Binding::new(role, column));
        self
    }
    pub fn bind_opt(self, role: EncodingRole, column: Option<&str>) -> Self {
        match column {
            Some(column) => self.bind(role, column),
            None => self,
        }
    }
    pub fn with_options(mut self, options: ChartOptions) -> Self {
        self.options = options;
        self
    }
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = Some(aggregation);
        self
    }
    pub fn column_for(&self, role: EncodingRole) -> Option<&str> {
        self.bindings
            .iter()
            .find(|b| b.role == role)
            .map(|b| b.column.as_str())
    }
    pub fn is_aggregated(&self) -> bool {
        self.aggregation.is_some()
    }
    /// Bound columns absent from the spec's data.
    pub fn missing_columns(&self) -> Vec<&str> {
        self.bindings
            .iter()
            .filter(|b| !self.data.has_column(&b.column))
            .map(|b| b.column.as_str())
            .collect()
    }
}

/// One entry of the automatic dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedChart {
    pub label: String,
    pub spec: ChartSpec,
}

/// Turns a chart specification into something displayable.
pub trait ChartRenderer {
    type Figure;
    type Error;
    fn render(&self, spec: &ChartSpec) -> Result<Self::Figure, Self::Error>;
}
