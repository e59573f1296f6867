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
use plotwise::{
    classify, ChartKind, ChartPlanner, ColumnRole, Dashboard, DashboardConfig, DashboardSession,
    EncodingRole, ManualRequest, MissingValues,
};
use std::fmt::Write as _;
use std::sync::Arc;

fn labels(analysis: &plotwise::Analysis) -> Vec<&str> {
    analysis.charts.iter().map(|c| c.label.as_str()).collect()
}

fn region_csv(rows: usize) -> String {
    let regions = ["North", "South", "East", "West", "Central"];
    let mut csv = String::from("region,sales\n");
    for i in 0..rows {
        writeln!(csv, "{},{}", regions[i % regions.len()], i + 1).unwrap();
    }
    csv
}

#[test]
fn test_scenario_region_sales() -> Result<()> {
    let csv = "region,sales\nNorth,10\nSouth,20\nNorth,5\nEast,15\n";
    let analysis = Dashboard::new().analyse_bytes(csv.as_bytes(), "sales.csv")?;

    assert_eq!(
        labels(&analysis),
        vec![
            "Pie Chart",
            "Donut Chart",
            "Bar Chart",
            "Column Chart",
            "Horizontal Bar Chart",
            "Histogram: sales",
            "Radial Bar Chart",
        ]
    );
    for chart in analysis.charts.iter().filter(|c| c.spec.kind != ChartKind::Histogram) {
        assert!(!chart.spec.is_aggregated());
        assert_eq!(chart.spec.data.column_names(), vec!["region", "sales"]);
        assert_eq!(chart.spec.data.row_count(), 4);
        assert!(chart.spec.missing_columns().is_empty());
    }
    assert!(analysis
        .charts
        .iter()
        .all(|c| !matches!(c.spec.kind, ChartKind::Scatter | ChartKind::Bubble)));
    Ok(())
}

#[test]
fn test_scenario_three_numeric_columns() -> Result<()> {
    let mut csv = String::from("x,y,z\n");
    for i in 0..50 {
        writeln!(csv, "{},{},{}", i, i * 2, 100 - i)?;
    }
    let analysis = Dashboard::new().analyse_bytes(csv.as_bytes(), "points.csv")?;
    assert_eq!(
        labels(&analysis),
        vec![
            "Scatter Plot",
            "Bubble Chart",
            "Histogram: x",
            "Histogram: y",
            "Histogram: z",
        ]
    );
    let scatter = &analysis.charts[0].spec;
    assert_eq!(scatter.column_for(EncodingRole::X), Some("x"));
    assert_eq!(scatter.column_for(EncodingRole::Y), Some("y"));
    assert_eq!(scatter.column_for(EncodingRole::Color), None);

    let bubble = &analysis.charts[1].spec;
    assert_eq!(bubble.column_for(EncodingRole::Size), Some("z"));
    assert_eq!(bubble.column_for(EncodingRole::Color), None);
    assert!(bubble.options.point_labels);
    Ok(())
}

#[test]
fn test_point_charts_colour_by_first_categorical_column() -> Result<()> {
    let segments = ["retail", "wholesale", "online"];
    let mut csv = String::from("x,segment,y,channel,z\n");
    for i in 0..120 {
        writeln!(csv, "{},{},{},c{},{}", i, segments[i % 3], i * 3, i % 2, i + 7)?;
    }
    let analysis = Dashboard::new().analyse_bytes(csv.as_bytes(), "segments.csv")?;
    assert_eq!(analysis.roles.categorical, vec!["segment", "channel"]);

    let find = |kind: ChartKind| {
        analysis
            .charts
            .iter()
            .find(|c| c.spec.kind == kind)
            .map(|c| &c.spec)
    };
    let scatter = find(ChartKind::Scatter).expect("scatter planned");
    assert_eq!(scatter.column_for(EncodingRole::X), Some("x"));
    assert_eq!(scatter.column_for(EncodingRole::Y), Some("y"));
    assert_eq!(scatter.column_for(EncodingRole::Color), Some("segment"));
    assert_eq!(scatter.data.row_count(), 120);

    let bubble = find(ChartKind::Bubble).expect("bubble planned");
    assert_eq!(bubble.column_for(EncodingRole::Size), Some("z"));
    assert_eq!(bubble.column_for(EncodingRole::Color), Some("segment"));
    assert!(!bubble.options.point_labels);
    assert!(bubble.missing_columns().is_empty());
    Ok(())
}

#[test]
fn test_scenario_date_strings() -> Result<()> {
    let csv = "day,mixed,amount\n2024-01-01,2024-01-01,1\n2024-02-01,soon,2\n2024-03-01,2024-03-01,3\n";
    let analysis = Dashboard::new().analyse_bytes(csv.as_bytes(), "dates.csv")?;
    assert_eq!(analysis.roles.datetime, vec!["day"]);
    assert_eq!(analysis.roles.categorical, vec!["mixed"]);
    assert_eq!(analysis.roles.numeric, vec!["amount"]);
    Ok(())
}

#[test]
fn test_aggregation_boundary_is_strictly_above_twenty() -> Result<()> {
    let dashboard = Dashboard::new();

    let at = dashboard.analyse_bytes(region_csv(20).as_bytes(), "twenty.csv")?;
    let pie = &at.charts[0].spec;
    assert_eq!(pie.kind, ChartKind::Pie);
    assert!(!pie.is_aggregated());
    assert_eq!(pie.data.row_count(), 20);

    let above = dashboard.analyse_bytes(region_csv(21).as_bytes(), "twentyone.csv")?;
    let pie = &above.charts[0].spec;
    assert!(pie.is_aggregated());
    assert_eq!(pie.data.row_count(), 5);

    // 21 rows over 5 regions: North holds rows 1, 6, 11, 16, 21.
    let regions = pie.data.column("region").and_then(|c| c.as_texts()).unwrap();
    let sums = pie.data.column("sales").and_then(|c| c.as_numbers()).unwrap();
    assert_eq!(regions[0].as_deref(), Some("North"));
    assert_eq!(sums[0], Some(55.0));
    assert!(sums.windows(2).all(|w| w[0] >= w[1]));
    Ok(())
}

#[test]
fn test_top_n_truncation() -> Result<()> {
    let mut csv = String::from("item,qty\n");
    for i in 0..40 {
        writeln!(csv, "item{i},{i}")?;
    }
    let analysis = Dashboard::new().analyse_bytes(csv.as_bytes(), "items.csv")?;
    let by_kind = |kind| {
        analysis
            .charts
            .iter()
            .find(|c| c.spec.kind == kind)
            .map(|c| c.spec.data.row_count())
    };
    assert_eq!(by_kind(ChartKind::Pie), Some(10));
    assert_eq!(by_kind(ChartKind::Donut), Some(10));
    assert_eq!(by_kind(ChartKind::Bar), Some(15));
    assert_eq!(by_kind(ChartKind::HorizontalBar), Some(15));
    assert_eq!(by_kind(ChartKind::RadialBar), Some(10));
    Ok(())
}

#[test]
fn test_rule_gating_follows_numeric_count() -> Result<()> {
    let csv = "region,segment,sales\nNorth,A,1\nSouth,B,2\n";
    let full = Dashboard::new().analyse_bytes(csv.as_bytes(), "full.csv")?;
    assert_eq!(full.charts.len(), 7);

    let dataset = Arc::new(full.dataset.project(&["region", "segment"])?);
    let trimmed = Dashboard::new().analyse(dataset);
    assert!(!trimmed.has_charts());
    assert!(trimmed.charts.is_empty());
    Ok(())
}

#[test]
fn test_planning_is_idempotent() -> Result<()> {
    let dashboard = Dashboard::new();
    let first = dashboard.analyse_bytes(region_csv(30).as_bytes(), "a.csv")?;
    let roles = classify(&first.dataset);
    assert_eq!(roles, classify(&first.dataset));

    let planner = ChartPlanner::new();
    assert_eq!(
        planner.auto_plan(&first.dataset, &roles),
        planner.auto_plan(&first.dataset, &roles)
    );
    assert_eq!(planner.auto_plan(&first.dataset, &roles), first.charts);
    Ok(())
}

#[test]
fn test_overview_and_manual_panel() -> Result<()> {
    let csv = "region,sales,units\nNorth,10,\nSouth,,3\nEast,7,4\n";
    let dashboard = Dashboard::new();
    let analysis = dashboard.analyse_bytes(csv.as_bytes(), "gaps.csv")?;

    let overview = &analysis.overview;
    assert_eq!((overview.row_count, overview.column_count), (3, 3));
    assert_eq!((overview.numeric_count, overview.categorical_count), (2, 1));
    assert_eq!(
        overview.missing,
        MissingValues::Columns(vec![("sales".to_string(), 1), ("units".to_string(), 1)])
    );
    assert_eq!(analysis.preview().row_count(), 3);

    assert_eq!(analysis.column_choices(ColumnRole::Categorical), vec!["region"]);
    assert_eq!(
        analysis.column_choices(ColumnRole::Datetime),
        vec!["region", "sales", "units"]
    );

    let request = ManualRequest::new(ChartKind::Bubble, "sales", "units")
        .with_size("units")
        .with_color("region");
    let spec = dashboard.build_manual(&analysis, &request);
    assert!(Arc::ptr_eq(&spec.data, &analysis.dataset));
    assert!(spec.missing_columns().is_empty());
    assert_eq!(spec.options.size_max, Some(60.0));

    let json = analysis.export_json()?;
    assert!(json.contains("\"Pie Chart\""));
    Ok(())
}

#[test]
fn test_config_file_drives_planner() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("dashboard.yml");
    std::fs::write(&path, "planner:\n  pie_top_n: 3\n  max_histograms: 1\n")?;

    let dashboard = Dashboard::from_yaml_file(&path)?;
    assert_eq!(dashboard.config().planner.pie_top_n, 3);
    let analysis = dashboard.analyse_bytes(region_csv(25).as_bytes(), "r.csv")?;
    assert_eq!(analysis.charts[0].spec.data.row_count(), 3);

    let invalid = DashboardConfig {
        planner: plotwise::PlannerConfig {
            bar_top_n: 0,
            ..Default::default()
        },
        ..Default::default()
    };
    assert!(Dashboard::with_config(invalid).is_err());
    assert!(Dashboard::from_yaml_file(dir.path().join("missing.yml")).is_err());
    Ok(())
}

#[test]
fn test_session_reuses_identical_upload() -> Result<()> {
    let mut session = DashboardSession::new();
    let csv = region_csv(5);

    let first = session.load(csv.as_bytes(), "r.csv")?;
    let again = session.load(csv.as_bytes(), "r.csv")?;
    assert!(Arc::ptr_eq(&first, &again));

    let renamed = session.load(csv.as_bytes(), "other.csv")?;
    assert!(!Arc::ptr_eq(&first, &renamed));

    let changed = session.load(region_csv(6).as_bytes(), "other.csv")?;
    assert_eq!(changed.row_count(), 6);
    assert_eq!(session.current_key().map(|k| k.file_name()), Some("other.csv"));
    Ok(())
}
