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

use crate::classifier::ClassifierConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::planner::PlannerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub classifier: ClassifierConfig,
    pub planner: PlannerConfig,
}
impl DashboardConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ConfigFile {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "loading dashboard config");
        Self::from_yaml_str(&content)
    }
    /// Parses and validates; fields left out keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: DashboardConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }
    pub fn to_yaml_string(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
    pub fn validate(&self) -> ConfigResult<()> {
        self.classifier.validate()?;
        self.planner.validate()
    }
    pub fn for_large_datasets() -> Self {
        Self {
            planner: PlannerConfig::for_large_datasets(),
            ..Default::default()
        }
    }
    pub fn for_presentation() -> Self {
        Self {
            planner: PlannerConfig::for_presentation(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = DashboardConfig::from_yaml_str("planner:\n  pie_top_n: 5\n").unwrap();
        assert_eq!(config.planner.pie_top_n, 5);
        assert_eq!(config.planner.bar_top_n, 15);
        assert_eq!(config.classifier, ClassifierConfig::default());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = DashboardConfig::from_yaml_str("planner:\n  donut_hole: 1.5\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidPlannerConfig { ref field, .. } if field == "donut_hole"
        ));

        let err = DashboardConfig::from_yaml_str("planner: [1, 2]").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn yaml_round_trip() {
        let config = DashboardConfig::for_presentation();
        let yaml = config.to_yaml_string().unwrap();
        assert_eq!(DashboardConfig::from_yaml_str(&yaml).unwrap(), config);
    }
}
