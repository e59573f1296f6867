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

use anyhow::Result;
use plotwise::{ColumnKind, DashboardError, DecodeError, FileFormat, TableLoader};
use chrono::NaiveDate;
use polars::prelude::{df, ParquetWriter};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use std::io::Write;

const SALES_CSV: &str = "region,sales,when\nNorth,10,2024-01-01\nSouth,20,2024-01-02\nNorth,5,2024-01-03\nEast,,2024-01-04\n";

#[test]
fn test_csv_decodes_with_storage_kinds() -> Result<()> {
    let dataset = TableLoader::new().load(SALES_CSV.as_bytes(), "sales.csv")?;
    assert_eq!(dataset.row_count(), 4);
    assert_eq!(dataset.column_names(), vec!["region", "sales", "when"]);

    let kinds: Vec<ColumnKind> = dataset.columns().iter().map(|c| c.kind()).collect();
    assert_eq!(kinds[0], ColumnKind::Text);
    assert_eq!(kinds[1], ColumnKind::Number);

    let sales = dataset.column("sales").expect("sales column");
    assert_eq!(sales.missing_count(), 1);
    assert_eq!(sales.number_at(1), Some(20.0));
    Ok(())
}

#[test]
fn test_json_records_decode() -> Result<()> {
    let json = br#"[{"city":"Oslo","temp":4.5},{"city":"Rome","temp":18.0}]"#;
    let dataset = plotwise::load(json, "weather.JSON")?;
    assert_eq!(dataset.row_count(), 2);
    assert_eq!(dataset.column("temp").map(|c| c.kind()), Some(ColumnKind::Number));
    assert_eq!(dataset.column("city").map(|c| c.kind()), Some(ColumnKind::Text));
    Ok(())
}

#[test]
fn test_parquet_decodes() -> Result<()> {
    let mut frame = df!(
        "product" => ["a", "b", "c"],
        "units" => [3i64, 4, 5],
    )?;
    let mut bytes = Vec::new();
    ParquetWriter::new(&mut bytes).finish(&mut frame)?;

    let dataset = plotwise::load(&bytes, "inventory.parquet")?;
    assert_eq!(dataset.row_count(), 3);
    assert_eq!(dataset.column("units").map(|c| c.kind()), Some(ColumnKind::Number));
    assert_eq!(dataset.column("units").and_then(|c| c.number_at(2)), Some(5.0));
    Ok(())
}

#[test]
fn test_excel_workbook_decodes() -> Result<()> {
    let date = Format::new().set_num_format("yyyy-mm-dd");
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, header) in [(0, "region"), (1, "sales"), (2, "when"), (4, "sales")] {
        sheet.write_string(0, col, header)?;
    }
    let rows = [("North", Some(10.0), 1), ("South", None, 2), ("North", Some(5.5), 3)];
    for (i, (region, sales, day)) in rows.into_iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, region)?;
        if let Some(sales) = sales {
            sheet.write_number(row, 1, sales)?;
        }
        let when = ExcelDateTime::from_ymd(2024, 3, day)?;
        sheet.write_datetime_with_format(row, 2, &when, &date)?;
        sheet.write_string(row, 3, "note")?;
        sheet.write_number(row, 4, f64::from(day))?;
    }
    let bytes = workbook.save_to_buffer()?;

    let dataset = plotwise::load(&bytes, "sales.xlsx")?;
    assert_eq!(dataset.row_count(), 3);
    assert_eq!(
        dataset.column_names(),
        vec!["region", "sales", "when", "Unnamed: 3", "sales.1"]
    );
    let kinds: Vec<ColumnKind> = dataset.columns().iter().map(|c| c.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            ColumnKind::Text,
            ColumnKind::Number,
            ColumnKind::Timestamp,
            ColumnKind::Text,
            ColumnKind::Number,
        ]
    );

    let sales = dataset.column("sales").expect("sales column");
    assert_eq!(sales.missing_count(), 1);
    assert_eq!(sales.number_at(2), Some(5.5));
    let when = dataset
        .column("when")
        .and_then(|c| c.as_timestamps())
        .expect("timestamp column");
    assert_eq!(
        when[1],
        NaiveDate::from_ymd_opt(2024, 3, 2).and_then(|d| d.and_hms_opt(0, 0, 0))
    );

    let analysis = plotwise::Dashboard::new().analyse(std::sync::Arc::new(dataset));
    assert_eq!(analysis.roles.datetime, vec!["when"]);
    assert_eq!(analysis.roles.categorical, vec!["region", "Unnamed: 3"]);
    Ok(())
}

#[test]
fn test_unsupported_suffixes_are_rejected() {
    for name in ["notes.txt", "archive.tar.gz", "README"] {
        let err = plotwise::load(b"a,b\n1,2\n", name).unwrap_err();
        assert!(
            matches!(err, DecodeError::UnsupportedFormat { .. }),
            "{name} gave {err:?}"
        );
    }
}

#[test]
fn test_malformed_payloads_are_decode_errors() {
    let err = plotwise::load(br#"[{"a": 1,"#, "broken.json").unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Polars {
            format: FileFormat::Json,
            ..
        }
    ));

    let err = plotwise::load(b"definitely not parquet", "broken.parquet").unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Polars {
            format: FileFormat::Parquet,
            ..
        }
    ));

    let err = plotwise::load(b"definitely not a workbook", "broken.xlsx").unwrap_err();
    assert!(matches!(err, DecodeError::Excel { .. }));
    assert_eq!(err.file_name(), "broken.xlsx");
}

#[test]
fn test_decode_errors_carry_user_guidance() {
    let err = DashboardError::from(plotwise::load(b"", "data.txt").unwrap_err());
    assert!(err.is_recoverable());
    assert!(err.user_message().contains("not supported"));
    assert!(err
        .suggestions()
        .iter()
        .any(|s| s.contains(".csv") && s.contains(".parquet")));
}

#[test]
fn test_load_path_reads_from_disk() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("sales.csv");
    let mut file = std::fs::File::create(&path)?;
    file.write_all(SALES_CSV.as_bytes())?;
    drop(file);

    let dataset = TableLoader::new().load_path(&path)?;
    assert_eq!(dataset.row_count(), 4);

    let missing = TableLoader::new()
        .load_path(dir.path().join("absent.csv"))
        .unwrap_err();
    assert!(matches!(missing, DecodeError::Io { .. }));
    Ok(())
}
