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

use crate::loader::FileFormat;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("Dataset error: {0}")]
    Data(#[from] DataError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Unsupported file format '{extension}' for '{file_name}'")]
    UnsupportedFormat { file_name: String, extension: String },
    #[error("Failed to decode {format} file '{file_name}': {source}")]
    Polars {
        format: FileFormat,
        file_name: String,
        #[source]
        source: polars::error::PolarsError,
    },
    #[error("Failed to decode Excel workbook '{file_name}': {source}")]
    Excel {
        file_name: String,
        #[source]
        source: calamine::Error,
    },
    #[error("Workbook '{file_name}' contains no worksheet")]
    NoWorksheet { file_name: String },
    #[error("Failed to read data file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("File '{file_name}' does not form a valid table: {source}")]
    InvalidTable {
        file_name: String,
        #[source]
        source: DataError,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    #[error("Column '{column}' appears more than once")]
    DuplicateColumn { column: String },
    #[error("Column '{column}' has {found} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid planner configuration: {field} {reason}")]
    InvalidPlannerConfig { field: String, reason: String },
    #[error("Invalid classifier configuration: {field} {reason}")]
    InvalidClassifierConfig { field: String, reason: String },
    #[error("Failed to parse YAML configuration: {source}")]
    Yaml {
        #[from]
        source: serde_yaml::Error,
    },
    #[error("Failed to read configuration file '{path}': {source}")]
    ConfigFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, DashboardError>;
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;
pub type DataResult<T> = std::result::Result<T, DataError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl DecodeError {
    pub fn file_name(&self) -> &str {
        match self {
            DecodeError::UnsupportedFormat { file_name, .. }
            | DecodeError::Polars { file_name, .. }
            | DecodeError::Excel { file_name, .. }
            | DecodeError::NoWorksheet { file_name }
            | DecodeError::InvalidTable { file_name, .. } => file_name,
            DecodeError::Io { path, .. } => path,
        }
    }
}

impl DashboardError {
    /// Errors the user can fix by choosing another file or adjusting settings.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DashboardError::Decode(_)
                | DashboardError::Config(ConfigError::InvalidPlannerConfig { .. })
        )
    }
    pub fn category(&self) -> &'static str {
        match self {
            DashboardError::Decode(_) => "Decode",
            DashboardError::Data(_) => "Data",
            DashboardError::Config(_) => "Configuration",
            DashboardError::Serialisation(_) => "Serialisation",
        }
    }
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DashboardError::Decode(DecodeError::UnsupportedFormat { .. }) => ErrorSeverity::Warning,
            DashboardError::Decode(_) | DashboardError::Data(_) => ErrorSeverity::Error,
            DashboardError::Config(_) => ErrorSeverity::Error,
            DashboardError::Serialisation(_) => ErrorSeverity::Critical,
        }
    }
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            DashboardError::Decode(DecodeError::UnsupportedFormat { .. }) => vec![
                format!("Upload one of: {}", FileFormat::supported_extensions().join(", ")),
                "Check that the file name carries its extension".to_string(),
            ],
            DashboardError::Decode(DecodeError::Polars { format, .. }) => vec![
                format!("Check that the file is valid {format}"),
                "Open the file in another tool to confirm it is not truncated".to_string(),
            ],
            DashboardError::Decode(DecodeError::Excel { .. } | DecodeError::NoWorksheet { .. }) => {
                vec![
                    "Make sure the first worksheet holds the table".to_string(),
                    "Re-save the workbook as .xlsx".to_string(),
                ]
            }
            DashboardError::Decode(DecodeError::InvalidTable { .. }) | DashboardError::Data(_) => {
                vec!["Make column headers unique and rows the same length".to_string()]
            }
            DashboardError::Config(_) => vec![
                "Check config/dashboard.yml against the documented fields".to_string(),
                "Reset the settings to their defaults".to_string(),
            ],
            _ => vec!["Check the error message for specific guidance".to_string()],
        }
    }
    pub fn user_message(&self) -> String {
        match self {
            DashboardError::Decode(DecodeError::UnsupportedFormat { extension, .. }) => format!(
                "Files of type '{extension}' are not supported. Please upload a CSV, Excel, JSON or Parquet file."
            ),
            DashboardError::Decode(err) => {
                format!("Could not read '{}'. {}", err.file_name(), err)
            }
            _ => self.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Warning,
    Error,
    Critical,
}
impl ErrorSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Warning => "WARNING",
            ErrorSeverity::Error => "ERROR",
            ErrorSeverity::Critical => "CRITICAL",
        }
    }
}

/// Plain-text error report for widgets and logs.
pub struct ErrorReporter {
    pub show_suggestions: bool,
}
impl Default for ErrorReporter {
    fn default() -> Self {
        Self {
            show_suggestions: true,
        }
    }
}
impl ErrorReporter {
    pub fn report(&self, error: &DashboardError) -> String {
        let mut output = format!("[{}] {}\n", error.severity().as_str(), error.user_message());
        if self.show_suggestions {
            let suggestions = error.suggestions();
            if !suggestions.is_empty() {
                output.push_str("\nSuggestions:\n");
                for suggestion in suggestions {
                    output.push_str(&format!("  • {suggestion}\n"));
                }
            }
        }
        output
    }
}
