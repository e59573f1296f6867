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
use crate::error::{DecodeError, DecodeResult};
use crate::temporal::{default_temporal_formats, TimestampParser};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use polars::prelude::{
    CsvReader, DataFrame, DataType as PolarsType, JsonReader, ParquetReader, PolarsResult,
    SerReader, Series,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::Cursor;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileFormat {
    Csv,
    Excel,
    Json,
    Parquet,
}
impl FileFormat {
    pub fn supported_extensions() -> &'static [&'static str] {
        &[".csv", ".xlsx", ".xls", ".json", ".parquet"]
    }
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "csv" => Some(FileFormat::Csv),
            "xlsx" | "xls" => Some(FileFormat::Excel),
            "json" => Some(FileFormat::Json),
            "parquet" => Some(FileFormat::Parquet),
            _ => None,
        }
    }
    pub fn from_file_name(file_name: &str) -> DecodeResult<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_extension(extension).ok_or_else(|| DecodeError::UnsupportedFormat {
            file_name: file_name.to_string(),
            extension: if extension.is_empty() {
                "(none)".to_string()
            } else {
                extension.to_ascii_lowercase()
            },
        })
    }
}
impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileFormat::Csv => "CSV",
            FileFormat::Excel => "Excel",
            FileFormat::Json => "JSON",
            FileFormat::Parquet => "Parquet",
        })
    }
}

/// Decodes uploaded bytes into a [`Dataset`], choosing the decoder from the
/// file-name suffix.
pub struct TableLoader {
    timestamps: TimestampParser,
}
impl TableLoader {
    pub fn new() -> Self {
        let mut formats = default_temporal_formats();
        // Rendering of zone-aware polars datetimes.
        formats.push("%Y-%m-%d %H:%M:%S%.f UTC".to_string());
        Self {
            timestamps: TimestampParser::with_formats(formats),
        }
    }
    pub fn load(&self, bytes: &[u8], file_name: &str) -> DecodeResult<Dataset> {
        let format = FileFormat::from_file_name(file_name)?;
        let dataset = match format {
            FileFormat::Excel => self.decode_excel(bytes, file_name)?,
            FileFormat::Csv => {
                let frame = CsvReader::new(cursor(bytes)).finish();
                self.decode_polars(format, file_name, frame)?
            }
            FileFormat::Json => {
                let frame = JsonReader::new(cursor(bytes)).finish();
                self.decode_polars(format, file_name, frame)?
            }
            FileFormat::Parquet => {
                let frame = ParquetReader::new(cursor(bytes)).finish();
                self.decode_polars(format, file_name, frame)?
            }
        };
        info!(
            file_name,
            %format,
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            "decoded table"
        );
        Ok(dataset)
    }
    pub fn load_path<P: AsRef<Path>>(&self, path: P) -> DecodeResult<Dataset> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| DecodeError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.load(&bytes, &file_name)
    }
    fn decode_polars(
        &self,
        format: FileFormat,
        file_name: &str,
        frame: PolarsResult<DataFrame>,
    ) -> DecodeResult<Dataset> {
        let polars_error = |source| DecodeError::Polars {
            format,
            file_name: file_name.to_string(),
            source,
        };
        let df = frame.map_err(polars_error)?;
        let columns = df
            .get_columns()
            .iter()
            .map(|c| self.column_from_series(c.as_materialized_series()))
            .collect::<PolarsResult<Vec<_>>>()
            .map_err(polars_error)?;
        Dataset::new(columns).map_err(|source| DecodeError::InvalidTable {
            file_name: file_name.to_string(),
            source,
        })
    }
    fn column_from_series(&self, series: &Series) -> PolarsResult<Column> {
        let name = series.name().to_string();
        let values = match series.dtype() {
            PolarsType::Int32
            | PolarsType::Int64
            | PolarsType::UInt32
            | PolarsType::UInt64
            | PolarsType::Float32
            | PolarsType::Float64 => {
                let cast = series.cast(&PolarsType::Float64)?;
                ColumnValues::Number(cast.f64()?.into_iter().collect())
            }
            PolarsType::Date | PolarsType::Datetime(_, _) => {
                let cast = series.cast(&PolarsType::String)?;
                let rendered = cast.str()?;
                let mut unparsed = 0usize;
                let values = rendered
                    .into_iter()
                    .map(|v| {
                        let parsed = v.and_then(|s| self.timestamps.parse(s));
                        if v.is_some() && parsed.is_none() {
                            unparsed += 1;
                        }
                        parsed
                    })
                    .collect();
                if unparsed > 0 {
                    warn!(column = %name, unparsed, "timestamp cells could not be converted");
                }
                ColumnValues::Timestamp(values)
            }
            _ => ColumnValues::Text(text_values(series)?),
        };
        Ok(Column::new(name, values))
    }
    fn decode_excel(&self, bytes: &[u8], file_name: &str) -> DecodeResult<Dataset> {
        let excel_error = |source| DecodeError::Excel {
            file_name: file_name.to_string(),
            source,
        };
        let mut workbook = open_workbook_auto_from_rs(cursor(bytes)).map_err(excel_error)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| DecodeError::NoWorksheet {
                file_name: file_name.to_string(),
            })?
            .map_err(excel_error)?;
        let mut rows = range.rows();
        let Some(header) = rows.next() else {
            return Ok(Dataset::default());
        };
        let body: Vec<&[Data]> = rows.collect();
        let columns = header_names(header)
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                let cells: Vec<&Data> = body
                    .iter()
                    .map(|row| row.get(idx).unwrap_or(&Data::Empty))
                    .collect();
                Column::new(name, self.excel_values(&cells))
            })
            .collect();
        Dataset::new(columns).map_err(|source| DecodeError::InvalidTable {
            file_name: file_name.to_string(),
            source,
        })
    }
    fn excel_values(&self, cells: &[&Data]) -> ColumnValues {
        let present: Vec<&&Data> = cells.iter().filter(|c| !is_blank(c)).collect();
        let all_numeric = !present.is_empty()
            && present
                .iter()
                .all(|c| matches!(c, Data::Int(_) | Data::Float(_)));
        let all_temporal = !present.is_empty()
            && present
                .iter()
                .all(|c| matches!(c, Data::DateTime(_) | Data::DateTimeIso(_)));
        if all_numeric {
            ColumnValues::Number(
                cells
                    .iter()
                    .map(|c| match c {
                        Data::Int(i) => Some(*i as f64),
                        Data::Float(f) => Some(*f),
                        _ => None,
                    })
                    .collect(),
            )
        } else if all_temporal {
            ColumnValues::Timestamp(
                cells
                    .iter()
                    .map(|c| match c {
                        Data::DateTime(dt) => dt.as_datetime(),
                        Data::DateTimeIso(s) => self.timestamps.parse(s),
                        _ => None,
                    })
                    .collect(),
            )
        } else {
            ColumnValues::Text(
                cells
                    .iter()
                    .map(|c| (!is_blank(c)).then(|| c.to_string()))
                    .collect(),
            )
        }
    }
}
impl Default for TableLoader {
    fn default() -> Self {
        Self::new()
    }
}

pub fn load(bytes: &[u8], file_name: &str) -> DecodeResult<Dataset> {
    TableLoader::new().load(bytes, file_name)
}

fn cursor(bytes: &[u8]) -> Cursor<Vec<u8>> {
    Cursor::new(bytes.to_vec())
}

fn text_values(series: &Series) -> PolarsResult<Vec<Option<String>>> {
    if let Ok(cast) = series.cast(&PolarsType::String) {
        return Ok(cast.str()?.into_iter().map(|v| v.map(String::from)).collect());
    }
    // Nested values (lists, structs) have no string cast; fall back to display.
    let series = series.rechunk();
    Ok(series
        .iter()
        .map(|v| (!v.is_null()).then(|| v.to_string()))
        .collect())
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty | Data::Error(_) => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Header cells as unique column names. Repeats get `.1`, `.2`, ...,
/// skipping any suffix another header already took.
fn header_names(header: &[Data]) -> Vec<String> {
    let mut suffixes: HashMap<String, usize> = HashMap::new();
    let mut taken: HashSet<String> = HashSet::new();
    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let base = if is_blank(cell) {
                format!("Unnamed: {idx}")
            } else {
                cell.to_string().trim().to_string()
            };
            let count = suffixes.entry(base.clone()).or_insert(0);
            let mut name = base.clone();
            while taken.contains(&name) {
                *count += 1;
                name = format!("{base}.{count}");
            }
            taken.insert(name.clone());
            name
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_suffix_is_case_insensitive() {
        assert_eq!(FileFormat::from_file_name("a.CSV").unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::from_file_name("b.xls").unwrap(), FileFormat::Excel);
        assert_eq!(FileFormat::from_file_name("c.Parquet").unwrap(), FileFormat::Parquet);
        assert_eq!(FileFormat::from_file_name("dir/d.json").unwrap(), FileFormat::Json);
    }

    #[test]
    fn unknown_or_missing_suffix_is_unsupported() {
        match FileFormat::from_file_name("notes.txt") {
            Err(DecodeError::UnsupportedFormat { extension, .. }) => assert_eq!(extension, "txt"),
            other => panic!("unexpected {other:?}"),
        }
        match FileFormat::from_file_name("README") {
            Err(DecodeError::UnsupportedFormat { extension, .. }) => {
                assert_eq!(extension, "(none)")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn duplicate_and_blank_headers_are_renamed() {
        let header = vec![
            Data::String("a".into()),
            Data::Empty,
            Data::String("a".into()),
            Data::String("a".into()),
        ];
        assert_eq!(header_names(&header), vec!["a", "Unnamed: 1", "a.1", "a.2"]);
    }

    #[test]
    fn renamed_headers_skip_suffixes_already_in_use() {
        let header = vec![
            Data::String("a".into()),
            Data::String("a".into()),
            Data::String("a.1".into()),
            Data::String("a".into()),
        ];
        let names = header_names(&header);
        assert_eq!(names, vec!["a", "a.1", "a.1.1", "a.2"]);
        let unique: HashSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn excel_cells_pick_a_single_kind() {
        let loader = TableLoader::new();
        let numbers = [&Data::Int(3), &Data::Empty, &Data::Float(1.5)];
        assert_eq!(
            loader.excel_values(&numbers),
            ColumnValues::Number(vec![Some(3.0), None, Some(1.5)])
        );
        let mixed = [&Data::Int(3), &Data::String("x".into())];
        assert_eq!(
            loader.excel_values(&mixed),
            ColumnValues::Text(vec![Some("3".into()), Some("x".into())])
        );
        let iso = [&Data::DateTimeIso("2024-02-01T00:00:00".into())];
        assert!(matches!(
            loader.excel_values(&iso),
            ColumnValues::Timestamp(v) if v[0].is_some()
        ));
    }
}
