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

//! Single-chart constructors. Each one maps chosen columns onto encodings
//! without aggregating or checking that the columns exist.

use crate::chart::{ChartKind, ChartOptions, ChartSpec, EncodingRole};
use crate::classifier::{ColumnRole, ColumnRoleSets};
use crate::dataset::Dataset;
use crate::planner::PlannerConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

fn category_chart(kind: ChartKind, data: Arc<Dataset>, category: &str, value: &str) -> ChartSpec {
    ChartSpec::new(kind, data)
        .with_title(format!("{value} by {category}"))
        .bind(EncodingRole::Category, category)
        .bind(EncodingRole::Value, value)
}

pub fn pie(data: Arc<Dataset>, category: &str, value: &str) -> ChartSpec {
    category_chart(ChartKind::Pie, data, category, value)
}

pub fn donut(data: Arc<Dataset>, category: &str, value: &str, hole: f64) -> ChartSpec {
    category_chart(ChartKind::Donut, data, category, value).with_options(ChartOptions {
        hole: Some(hole),
        ..ChartOptions::default()
    })
}

pub fn bar(data: Arc<Dataset>, category: &str, value: &str) -> ChartSpec {
    category_chart(ChartKind::Bar, data, category, value)
}

pub fn column(data: Arc<Dataset>, category: &str, value: &str) -> ChartSpec {
    category_chart(ChartKind::Column, data, category, value)
}

pub fn horizontal_bar(data: Arc<Dataset>, category: &str, value: &str) -> ChartSpec {
    category_chart(ChartKind::HorizontalBar, data, category, value)
}

pub fn radial_bar(data: Arc<Dataset>, category: &str, value: &str) -> ChartSpec {
    category_chart(ChartKind::RadialBar, data, category, value)
}

pub fn scatter(data: Arc<Dataset>, x: &str, y: &str, color: Option<&str>) -> ChartSpec {
    ChartSpec::new(ChartKind::Scatter, data)
        .with_title(format!("{y} vs {x}"))
        .bind(EncodingRole::X, x)
        .bind(EncodingRole::Y, y)
        .bind_opt(EncodingRole::Color, color)
}

pub fn bubble(
    data: Arc<Dataset>,
    x: &str,
    y: &str,
    size: &str,
    color: Option<&str>,
) -> ChartSpec {
    ChartSpec::new(ChartKind::Bubble, data)
        .with_title(format!("{y} vs {x}, sized by {size}"))
        .bind(EncodingRole::X, x)
        .bind(EncodingRole::Y, y)
        .bind(EncodingRole::Size, size)
        .bind_opt(EncodingRole::Color, color)
}

pub fn histogram(data: Arc<Dataset>, column: &str, bins: usize) -> ChartSpec {
    ChartSpec::new(ChartKind::Histogram, data)
        .with_title(format!("Distribution of {column}"))
        .bind(EncodingRole::X, column)
        .with_options(ChartOptions {
            bins: Some(bins),
            ..ChartOptions::default()
        })
}

/// Selections from the manual chart panel.
///
/// `primary` is the category column (or x for point charts and histograms),
/// `secondary` the value column (or y). Unused fields are ignored for kinds
/// that do not take them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualRequest {
    pub kind: ChartKind,
    pub primary: String,
    #[serde(default)]
    pub secondary: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub bins: Option<usize>,
}
impl ManualRequest {
    pub fn new(kind: ChartKind, primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            kind,
            primary: primary.into(),
            secondary: secondary.into(),
            color: None,
            size: None,
            bins: None,
        }
    }
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }
    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = Some(bins);
        self
    }
}

/// Dispatches a manual request to the constructor for its kind, on raw data.
pub fn build_manual(
    data: Arc<Dataset>,
    request: &ManualRequest,
    config: &PlannerConfig,
) -> ChartSpec {
    let (a, b) = (request.primary.as_str(), request.secondary.as_str());
    let color = request.color.as_deref();
    match request.kind {
        ChartKind::Pie => pie(data, a, b),
        ChartKind::Donut => donut(data, a, b, config.donut_hole),
        ChartKind::Bar => bar(data, a, b),
        ChartKind::Column => column(data, a, b),
        ChartKind::HorizontalBar => horizontal_bar(data, a, b),
        ChartKind::RadialBar => radial_bar(data, a, b),
        ChartKind::Scatter => scatter(data, a, b, color),
        ChartKind::Bubble => {
            let size = request.size.as_deref().unwrap_or_default();
            bubble(data, a, b, size, color).with_options(ChartOptions {
                size_max: Some(config.bubble_size_max),
                ..ChartOptions::default()
            })
        }
        ChartKind::Histogram => {
            let bins = config.clamp_bins(request.bins.unwrap_or(config.default_bins));
            histogram(data, a, bins)
        }
    }
}

/// Columns offered for a picker: the preferred role set, or every column
/// when that set is empty.
pub fn column_choices(
    preferred: ColumnRole,
    roles: &ColumnRoleSets,
    dataset: &Dataset,
) -> Vec<String> {
    let preferred = roles.get(preferred);
    if preferred.is_empty() {
        dataset.column_names().into_iter().map(str::to_string).collect()
    } else {
        preferred.to_vec()
    }
}
