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

use crate::aggregate::top_n_sum;
use crate::builders::{self, ManualRequest};
use crate::chart::{Aggregation, ChartKind, ChartOptions, ChartSpec, PlannedChart};
use crate::classifier::ColumnRoleSets;
use crate::dataset::Dataset;
use crate::error::{ConfigError, ConfigResult, DataResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlannerConfig {
    /// Category charts aggregate when the row count is strictly above this.
    pub aggregation_threshold: usize,
    pub pie_top_n: usize,
    pub bar_top_n: usize,
    pub max_histograms: usize,
    pub default_bins: usize,
    pub min_bins: usize,
    pub max_bins: usize,
    pub donut_hole: f64,
    /// Bubble points are labelled only below this row count.
    pub label_row_limit: usize,
    pub bubble_size_max: f64,
}
impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            aggregation_threshold: 20,
            pie_top_n: 10,
            bar_top_n: 15,
            max_histograms: 3,
            default_bins: 30,
            min_bins: 10,
            max_bins: 100,
            donut_hole: 0.4,
            label_row_limit: 100,
            bubble_size_max: 60.0,
        }
    }
}
impl PlannerConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        let positive = [
            ("pie_top_n", self.pie_top_n),
            ("bar_top_n", self.bar_top_n),
            ("max_histograms", self.max_histograms),
            ("default_bins", self.default_bins),
            ("min_bins", self.min_bins),
            ("max_bins", self.max_bins),
        ];
        if let Some((field, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(invalid(field, "must be greater than 0"));
        }
        if self.min_bins > self.max_bins {
            return Err(invalid("min_bins", "must not exceed max_bins"));
        }
        if !(self.min_bins..=self.max_bins).contains(&self.default_bins) {
            return Err(invalid("default_bins", "must lie between min_bins and max_bins"));
        }
        if !(self.donut_hole > 0.0 && self.donut_hole < 1.0) {
            return Err(invalid("donut_hole", "must be between 0.0 and 1.0 exclusive"));
        }
        if !(self.bubble_size_max.is_finite() && self.bubble_size_max > 0.0) {
            return Err(invalid("bubble_size_max", "must be a positive number"));
        }
        Ok(())
    }
    pub fn for_large_datasets() -> Self {
        Self {
            pie_top_n: 8,
            bar_top_n: 12,
            max_histograms: 2,
            label_row_limit: 50,
            ..Default::default()
        }
    }
    pub fn for_presentation() -> Self {
        Self {
            pie_top_n: 6,
            bar_top_n: 10,
            max_histograms: 2,
            default_bins: 20,
            donut_hole: 0.5,
            ..Default::default()
        }
    }
    pub fn clamp_bins(&self, bins: usize) -> usize {
        bins.clamp(self.min_bins, self.max_bins)
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidPlannerConfig {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Chooses charts for a dataset from its column roles.
#[derive(Debug, Clone, Default)]
pub struct ChartPlanner {
    config: PlannerConfig,
}
impl ChartPlanner {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_config(config: PlannerConfig) -> Self {
        Self { config }
    }
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Ordered dashboard for `dataset`. An empty result means nothing could
    /// be drawn and is not an error.
    pub fn auto_plan(&self, dataset: &Arc<Dataset>, roles: &ColumnRoleSets) -> Vec<PlannedChart> {
        let mut plan = Vec::new();
        self.plan_category_charts(dataset, roles, &mut plan);
        self.plan_numeric_charts(dataset, roles, &mut plan);
        self.plan_radial_chart(dataset, roles, &mut plan);
        info!(
            rows = dataset.row_count(),
            charts = plan.len(),
            "auto plan built"
        );
        plan
    }

    pub fn build_manual(&self, data: Arc<Dataset>, request: &ManualRequest) -> ChartSpec {
        builders::build_manual(data, request, &self.config)
    }

    fn plan_category_charts(
        &self,
        dataset: &Arc<Dataset>,
        roles: &ColumnRoleSets,
        plan: &mut Vec<PlannedChart>,
    ) {
        let (Some(category), Some(value)) = (roles.first_categorical(), roles.first_numeric())
        else {
            debug!("no categorical and numeric pair; skipping pie and bar charts");
            return;
        };
        if let Some((data, aggregation)) =
            self.category_data(dataset, category, value, self.config.pie_top_n)
        {
            let pie = builders::pie(Arc::clone(&data), category, value);
            let donut = builders::donut(data, category, value, self.config.donut_hole);
            push(plan, ChartKind::Pie.display_name(), attach(pie, aggregation.clone()));
            push(plan, ChartKind::Donut.display_name(), attach(donut, aggregation));
        }
        if let Some((data, aggregation)) =
            self.category_data(dataset, category, value, self.config.bar_top_n)
        {
            let bars = [
                builders::bar(Arc::clone(&data), category, value),
                builders::column(Arc::clone(&data), category, value),
                builders::horizontal_bar(data, category, value),
            ];
            for spec in bars {
                let label = spec.kind.display_name();
                push(plan, label, attach(spec, aggregation.clone()));
            }
        }
    }

    fn plan_numeric_charts(
        &self,
        dataset: &Arc<Dataset>,
        roles: &ColumnRoleSets,
        plan: &mut Vec<PlannedChart>,
    ) {
        let color = roles.first_categorical();
        if let [x, y, ..] = roles.numeric.as_slice() {
            let scatter = builders::scatter(Arc::clone(dataset), x, y, color);
            push(plan, ChartKind::Scatter.display_name(), scatter);
        }
        if let [x, y, size, ..] = roles.numeric.as_slice() {
            let options = ChartOptions {
                point_labels: dataset.row_count() < self.config.label_row_limit,
                size_max: Some(self.config.bubble_size_max),
                ..ChartOptions::default()
            };
            let bubble =
                builders::bubble(Arc::clone(dataset), x, y, size, color).with_options(options);
            push(plan, ChartKind::Bubble.display_name(), bubble);
        }
        for column in roles.numeric.iter().take(self.config.max_histograms) {
            let spec = builders::histogram(Arc::clone(dataset), column, self.config.default_bins);
            push(plan, &format!("Histogram: {column}"), spec);
        }
    }

    fn plan_radial_chart(
        &self,
        dataset: &Arc<Dataset>,
        roles: &ColumnRoleSets,
        plan: &mut Vec<PlannedChart>,
    ) {
        let (Some(category), Some(value)) = (roles.first_categorical(), roles.first_numeric())
        else {
            return;
        };
        if let Some((data, aggregation)) =
            self.category_data(dataset, category, value, self.config.pie_top_n)
        {
            let radial = builders::radial_bar(data, category, value);
            push(plan, ChartKind::RadialBar.display_name(), attach(radial, aggregation));
        }
    }

    /// Raw two-column projection, or the top-N group sums once the dataset
    /// is larger than the aggregation threshold.
    fn category_data(
        &self,
        dataset: &Dataset,
        category: &str,
        value: &str,
        top_n: usize,
    ) -> Option<(Arc<Dataset>, Option<Aggregation>)> {
        let derived: DataResult<(Dataset, Option<Aggregation>)> =
            if dataset.row_count() > self.config.aggregation_threshold {
                top_n_sum(dataset, category, value, top_n).map(|view| {
                    debug!(category, value, top_n, groups = view.row_count(), "aggregated");
                    let aggregation = Aggregation {
                        group_by: category.to_string(),
                        summed: value.to_string(),
                        top_n,
                    };
                    (view, Some(aggregation))
                })
            } else {
                dataset.project(&[category, value]).map(|view| (view, None))
            };
        match derived {
            Ok((view, aggregation)) => Some((Arc::new(view), aggregation)),
            Err(e) => {
                warn!(category, value, error = %e, "role sets do not match dataset");
                None
            }
        }
    }
}

fn attach(spec: ChartSpec, aggregation: Option<Aggregation>) -> ChartSpec {
    match aggregation {
        Some(aggregation) => spec.with_aggregation(aggregation),
        None => spec,
    }
}

fn push(plan: &mut Vec<PlannedChart>, label: &str, spec: ChartSpec) {
    debug!(label, kind = ?spec.kind, "planned chart");
    plan.push(PlannedChart {
        label: label.to_string(),
        spec,
    });
}
