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

pub mod aggregate;
pub mod builders;
pub mod chart;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod error;
pub mod loader;
pub mod planner;
pub mod session;
pub mod summary;
pub mod temporal;

pub use builders::{build_manual, column_choices, ManualRequest};
pub use chart::{
    Aggregation, Binding, ChartKind, ChartOptions, ChartRenderer, ChartSpec, EncodingRole,
    PlannedChart,
};
pub use classifier::{classify, ClassifierConfig, ColumnClassifier, ColumnRole, ColumnRoleSets};
pub use config::DashboardConfig;
pub use dataset::{Column, ColumnKind, ColumnValues, Dataset};
pub use error::{
    ConfigError, DashboardError, DataError, DecodeError, ErrorReporter, ErrorSeverity, Result,
};
pub use loader::{load, FileFormat, TableLoader};
pub use planner::{ChartPlanner, PlannerConfig};
pub use session::{DashboardSession, UploadKey};
pub use summary::{DatasetOverview, MissingValues};

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Classifier and planner sharing one configuration.
pub struct Dashboard {
    config: DashboardConfig,
    classifier: ColumnClassifier,
    planner: ChartPlanner,
}
impl Dashboard {
    pub fn new() -> Self {
        Self::from_parts(DashboardConfig::default())
    }
    pub fn with_config(config: DashboardConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(config))
    }
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = DashboardConfig::from_yaml_file(path)?;
        Ok(Self::from_parts(config))
    }
    fn from_parts(config: DashboardConfig) -> Self {
        Self {
            classifier: ColumnClassifier::with_config(&config.classifier),
            planner: ChartPlanner::with_config(config.planner.clone()),
            config,
        }
    }
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }
    pub fn classifier(&self) -> &ColumnClassifier {
        &self.classifier
    }
    pub fn planner(&self) -> &ChartPlanner {
        &self.planner
    }
    pub fn analyse(&self, dataset: Arc<Dataset>) -> Analysis {
        let roles = self.classifier.classify(&dataset);
        let overview = DatasetOverview::new(&dataset, &roles);
        let charts = self.planner.auto_plan(&dataset, &roles);
        info!(
            rows = overview.row_count,
            columns = overview.column_count,
            charts = charts.len(),
            "analysis complete"
        );
        Analysis {
            dataset,
            roles,
            overview,
            charts,
        }
    }
    pub fn analyse_bytes(&self, bytes: &[u8], file_name: &str) -> Result<Analysis> {
        let dataset = TableLoader::new().load(bytes, file_name)?;
        Ok(self.analyse(Arc::new(dataset)))
    }
    pub fn build_manual(&self, analysis: &Analysis, request: &ManualRequest) -> ChartSpec {
        self.planner.build_manual(Arc::clone(&analysis.dataset), request)
    }
}
impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the host shows for one dataset.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    #[serde(skip)]
    pub dataset: Arc<Dataset>,
    pub roles: ColumnRoleSets,
    pub overview: DatasetOverview,
    pub charts: Vec<PlannedChart>,
}
impl Analysis {
    /// False when no chart rule applied; hosts show a neutral notice.
    pub fn has_charts(&self) -> bool {
        !self.charts.is_empty()
    }
    pub fn preview(&self) -> Dataset {
        summary::preview(&self.dataset)
    }
    pub fn column_choices(&self, role: ColumnRole) -> Vec<String> {
        column_choices(role, &self.roles, &self.dataset)
    }
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
