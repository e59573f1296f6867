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

mod render;

use anyhow::Context as _;
use eframe::egui;
use plotwise::{
    Analysis, ChartKind, ChartRenderer, ChartSpec, ColumnRole, Dashboard, DashboardConfig,
    DashboardError, DashboardSession, EncodingRole, ErrorReporter, FileFormat, ManualRequest,
    MissingValues,
};
use render::PlotlyRenderer;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const CONFIG_PATHS: [&str; 3] = [
    "config/dashboard.yml",
    "bin/demos/plotwise-demo/config/dashboard.yml",
    "../../../bin/demos/plotwise-demo/config/dashboard.yml",
];

fn main() -> std::result::Result<(), eframe::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
    info!("Starting plotwise dashboard");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_title("Plotwise Dashboard"),
        ..Default::default()
    };
    eframe::run_native(
        "Plotwise Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new()))),
    )
}

fn load_config() -> DashboardConfig {
    for path in CONFIG_PATHS {
        if !Path::new(path).exists() {
            continue;
        }
        match DashboardConfig::from_yaml_file(path) {
            Ok(config) => {
                info!(path, "loaded dashboard config");
                return config;
            }
            Err(e) => warn!(path, error = %e, "ignoring invalid dashboard config"),
        }
    }
    info!("no dashboard config found, using defaults");
    DashboardConfig::default()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ActiveTab {
    Overview,
    AutoDashboard,
    ManualBuilder,
}

struct ManualState {
    kind: ChartKind,
    picks: Vec<String>,
    color: Option<String>,
    bins: usize,
    spec: Option<ChartSpec>,
}
impl ManualState {
    fn new(bins: usize) -> Self {
        Self {
            kind: ChartKind::Bar,
            picks: Vec::new(),
            color: None,
            bins,
            spec: None,
        }
    }
    fn request(&self) -> ManualRequest {
        let pick = |i: usize| self.picks.get(i).cloned().unwrap_or_default();
        let mut request = ManualRequest::new(self.kind, pick(0), pick(1)).with_bins(self.bins);
        if self.kind == ChartKind::Bubble {
            request = request.with_size(pick(2));
        }
        if let Some(color) = &self.color {
            request = request.with_color(color.clone());
        }
        request
    }
}

struct DashboardApp {
    session: DashboardSession,
    dashboard: Dashboard,
    config: DashboardConfig,
    renderer: PlotlyRenderer,
    analysis: Option<Analysis>,
    selected_file: Option<PathBuf>,
    active_tab: ActiveTab,
    show_config: bool,
    manual: ManualState,
    chart_html_files: HashMap<String, PathBuf>,
    error_message: Option<String>,
    status_message: String,
    error_reporter: ErrorReporter,
}

impl DashboardApp {
    fn new() -> Self {
        let config = load_config();
        let dashboard = Dashboard::with_config(config.clone()).unwrap_or_else(|e| {
            warn!(error = %e, "falling back to default configuration");
            Dashboard::new()
        });
        let config = dashboard.config().clone();
        Self {
            session: DashboardSession::new(),
            manual: ManualState::new(config.planner.default_bins),
            dashboard,
            config,
            renderer: PlotlyRenderer,
            analysis: None,
            selected_file: None,
            active_tab: ActiveTab::Overview,
            show_config: false,
            chart_html_files: HashMap::new(),
            error_message: None,
            status_message: "Select a data file to begin".to_string(),
            error_reporter: ErrorReporter::default(),
        }
    }

    fn process_file(&mut self, path: PathBuf) {
        self.error_message = None;
        self.chart_html_files.clear();
        self.manual.spec = None;
        match self.analyse_file(&path) {
            Ok(()) => {
                self.status_message = "Analysis complete".to_string();
            }
            Err(e) => {
                error!(error = %e, "analysis failed");
                self.analysis = None;
                match e.downcast_ref::<DashboardError>() {
                    Some(err) => {
                        self.error_message = Some(self.error_reporter.report(err));
                        self.status_message = failure_status(err);
                    }
                    None => {
                        self.error_message = Some(format!("{e:#}"));
                        self.status_message = "Analysis failed".to_string();
                    }
                }
            }
        }
        self.selected_file = Some(path);
    }

    fn analyse_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dataset = self
            .session
            .load(&bytes, &file_name)
            .map_err(DashboardError::from)?;
        self.analysis = Some(self.dashboard.analyse(dataset));
        Ok(())
    }

    /// Re-plans the held dataset; the upload itself is not decoded again.
    fn apply_config(&mut self) {
        match Dashboard::with_config(self.config.clone()) {
            Ok(dashboard) => {
                self.dashboard = dashboard;
                self.error_message = None;
                self.chart_html_files.clear();
                self.manual.bins = self.config.planner.clamp_bins(self.manual.bins);
                if let Some(dataset) = self.session.current().cloned() {
                    self.analysis = Some(self.dashboard.analyse(dataset));
                }
            }
            Err(e) => {
                self.error_message = Some(self.error_reporter.report(&e));
            }
        }
    }

    fn open_chart(&mut self, key: String, spec: &ChartSpec) {
        let result = render::write_chart_html(&self.renderer, spec).and_then(|path| {
            render::open_in_browser(&path)?;
            Ok(path)
        });
        match result {
            Ok(path) => {
                info!(chart = %spec.title, path = %path.display(), "chart opened");
                self.chart_html_files.insert(key, path);
            }
            Err(e) => {
                self.error_message = Some(format!("Failed to open chart: {e}"));
            }
        }
    }

    fn render_overview_tab(&self, ui: &mut egui::Ui) {
        let Some(analysis) = &self.analysis else {
            ui.label("No dataset loaded.");
            return;
        };
        let overview = &analysis.overview;
        ui.heading("Dataset Overview");
        ui.horizontal(|ui| {
            for (label, value) in [
                ("Rows", overview.row_count),
                ("Columns", overview.column_count),
                ("Numeric", overview.numeric_count),
                ("Categorical", overview.categorical_count),
            ] {
                ui.group(|ui| {
                    ui.vertical(|ui| {
                        ui.label(label);
                        ui.strong(value.to_string());
                    });
                });
            }
        });
        ui.separator();

        ui.horizontal_top(|ui| {
            ui.vertical(|ui| {
                ui.strong("Column Types");
                for (name, kind) in &overview.column_kinds {
                    ui.horizontal(|ui| {
                        ui.monospace(name);
                        ui.label(kind.as_str());
                        if let Some(role) = analysis.roles.role_of(name) {
                            ui.weak(format!("({role})"));
                        }
                    });
                }
            });
            ui.separator();
            ui.vertical(|ui| {
                ui.strong("Missing Values");
                match &overview.missing {
                    MissingValues::None => {
                        ui.colored_label(egui::Color32::GREEN, "No missing values");
                    }
                    MissingValues::Columns(columns) => {
                        for (name, count) in columns {
                            ui.label(format!("{name}: {count}"));
                        }
                    }
                }
            });
        });
        ui.separator();

        ui.strong("Preview");
        let preview = analysis.preview();
        egui::ScrollArea::both().max_height(400.0).show(ui, |ui| {
            egui::Grid::new("preview_grid")
                .striped(true)
                .show(ui, |ui| {
                    for column in preview.columns() {
                        ui.strong(column.name());
                    }
                    ui.end_row();
                    for row in 0..preview.row_count() {
                        for column in preview.columns() {
                            ui.label(column.display_at(row).unwrap_or_default());
                        }
                        ui.end_row();
                    }
                });
        });
    }

    fn render_auto_tab(&mut self, ui: &mut egui::Ui) {
        ui.heading("Auto Dashboard");
        let Some(analysis) = &self.analysis else {
            ui.label("No dataset loaded.");
            return;
        };
        if !analysis.has_charts() {
            ui.label("Could not generate charts for this dataset.");
            return;
        }
        let charts = analysis.charts.clone();
        let mut to_open = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            for (i, chart) in charts.iter().enumerate() {
                ui.push_id(i, |ui| {
                    ui.group(|ui| {
                        ui.horizontal(|ui| {
                            ui.vertical(|ui| {
                                ui.horizontal(|ui| {
                                    ui.strong(&chart.label);
                                    ui.label(format!("({})", chart.spec.title));
                                    if let Some(agg) = &chart.spec.aggregation {
                                        ui.weak(format!(
                                            "top {} of {} by {}",
                                            agg.top_n, agg.summed, agg.group_by
                                        ));
                                    }
                                });
                                egui::CollapsingHeader::new("Bindings")
                                    .id_salt(format!("bindings_{i}"))
                                    .show(ui, |ui| {
                                        for binding in &chart.spec.bindings {
                                            ui.horizontal(|ui| {
                                                ui.label(format!("{:?}: ", binding.role));
                                                ui.monospace(&binding.column);
                                            });
                                        }
                                    });
                                if let Some(path) = self.chart_html_files.get(&chart.label) {
                                    ui.horizontal(|ui| {
                                        ui.label("HTML file:");
                                        ui.monospace(path.display().to_string());
                                    });
                                }
                            });
                            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                if ui.button("Open in Browser").clicked() {
                                    to_open = Some(i);
                                }
                                if ui.button("Copy Figure").clicked() {
                                    match self.renderer.render(&chart.spec) {
                                        Ok(figure) => ui.ctx().copy_text(figure.to_string()),
                                        Err(e) => warn!(error = %e, "render failed"),
                                    }
                                }
                            });
                        });
                    });
                });
                ui.separator();
            }
        });
        if let Some(i) = to_open {
            let chart = &charts[i];
            self.open_chart(chart.label.clone(), &chart.spec);
        }
    }

    fn render_manual_tab(&mut self, ui: &mut egui::Ui) {
        ui.heading("Manual Chart Builder");
        let Some(analysis) = &self.analysis else {
            ui.label("No dataset loaded.");
            return;
        };

        let previous_kind = self.manual.kind;
        egui::ComboBox::from_label("Chart type")
            .selected_text(self.manual.kind.display_name())
            .show_ui(ui, |ui| {
                for kind in ChartKind::ALL {
                    ui.selectable_value(&mut self.manual.kind, kind, kind.display_name());
                }
            });
        if previous_kind != self.manual.kind {
            self.manual.picks.clear();
            self.manual.color = None;
            self.manual.spec = None;
        }

        let roles = self.manual.kind.manual_roles();
        self.manual.picks.resize(roles.len(), String::new());
        for (i, (encoding, role)) in roles.iter().enumerate() {
            let choices = analysis.column_choices(*role);
            if self.manual.picks[i].is_empty() || !choices.contains(&self.manual.picks[i]) {
                let role_slot = roles[..i].iter().filter(|(_, r)| r == role).count();
                self.manual.picks[i] = default_pick(&choices, role_slot);
            }
            egui::ComboBox::from_label(encoding_label(*encoding))
                .selected_text(self.manual.picks[i].clone())
                .show_ui(ui, |ui| {
                    for choice in &choices {
                        ui.selectable_value(
                            &mut self.manual.picks[i],
                            choice.clone(),
                            choice.as_str(),
                        );
                    }
                });
        }

        if self.manual.kind.supports_color() {
            let choices = analysis.column_choices(ColumnRole::Categorical);
            egui::ComboBox::from_label("Colour")
                .selected_text(self.manual.color.clone().unwrap_or_else(|| "None".to_string()))
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut self.manual.color, None, "None");
                    for choice in &choices {
                        ui.selectable_value(
                            &mut self.manual.color,
                            Some(choice.clone()),
                            choice.as_str(),
                        );
                    }
                });
        }

        if self.manual.kind == ChartKind::Histogram {
            let planner = &self.config.planner;
            ui.add(
                egui::Slider::new(&mut self.manual.bins, planner.min_bins..=planner.max_bins)
                    .text("Bins"),
            );
        }

        ui.separator();
        if ui.button("Build chart").clicked() {
            let spec = self.dashboard.build_manual(analysis, &self.manual.request());
            self.manual.spec = Some(spec);
        }

        if let Some(spec) = self.manual.spec.clone() {
            ui.horizontal(|ui| {
                ui.strong(&spec.title);
                ui.label(spec.kind.display_name());
            });
            match self.renderer.render(&spec) {
                Ok(figure) => {
                    egui::CollapsingHeader::new("Figure JSON").show(ui, |ui| {
                        egui::ScrollArea::vertical().max_height(300.0).show(ui, |ui| {
                            ui.monospace(
                                serde_json::to_string_pretty(&figure).unwrap_or_default(),
                            );
                        });
                    });
                    if ui.button("Open in Browser").clicked() {
                        self.open_chart(format!("manual:{}", spec.title), &spec);
                    }
                }
                Err(e) => {
                    ui.colored_label(egui::Color32::RED, format!("Cannot render: {e}"));
                }
            }
        }
    }

    fn render_config_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Configuration");
        let planner = &mut self.config.planner;
        ui.collapsing("Aggregation", |ui| {
            ui.label("Aggregate above rows:");
            ui.add(egui::Slider::new(&mut planner.aggregation_threshold, 5..=500));
            ui.label("Pie / donut / radial top N:");
            ui.add(egui::Slider::new(&mut planner.pie_top_n, 1..=30));
            ui.label("Bar family top N:");
            ui.add(egui::Slider::new(&mut planner.bar_top_n, 1..=50));
        });
        ui.collapsing("Charts", |ui| {
            ui.label("Donut hole:");
            ui.add(egui::Slider::new(&mut planner.donut_hole, 0.05..=0.9));
            ui.label("Histograms:");
            ui.add(egui::Slider::new(&mut planner.max_histograms, 1..=10));
            ui.label("Default bins:");
            ui.add(egui::Slider::new(
                &mut planner.default_bins,
                planner.min_bins..=planner.max_bins,
            ));
            ui.label("Bubble labels below rows:");
            ui.add(egui::Slider::new(&mut planner.label_row_limit, 0..=1000));
            ui.label("Max bubble size:");
            ui.add(egui::Slider::new(&mut planner.bubble_size_max, 10.0..=120.0));
        });
        ui.separator();
        ui.horizontal(|ui| {
            if ui.button("Apply").clicked() {
                self.apply_config();
            }
            if ui.button("Presentation").clicked() {
                self.config = DashboardConfig::for_presentation();
                self.apply_config();
            }
            if ui.button("Large datasets").clicked() {
                self.config = DashboardConfig::for_large_datasets();
                self.apply_config();
            }
            if ui.button("Reset").clicked() {
                self.config = DashboardConfig::default();
                self.apply_config();
            }
        });
    }
}

fn failure_status(err: &DashboardError) -> String {
    if err.is_recoverable() {
        format!("{} error: select another file or adjust the settings", err.category())
    } else {
        format!("{} error: analysis failed", err.category())
    }
}

/// Default column for the `role_slot`-th picker asking for a role.
fn default_pick(choices: &[String], role_slot: usize) -> String {
    choices
        .get(role_slot)
        .or_else(|| choices.first())
        .cloned()
        .unwrap_or_default()
}

fn encoding_label(role: EncodingRole) -> &'static str {
    match role {
        EncodingRole::Category => "Category column",
        EncodingRole::Value => "Value column",
        EncodingRole::X => "X axis",
        EncodingRole::Y => "Y axis",
        EncodingRole::Color => "Colour",
        EncodingRole::Size => "Size",
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Plotwise Dashboard");
                ui.separator();
                if ui.button("Select Data File").clicked() {
                    let extensions: Vec<&str> = FileFormat::supported_extensions()
                        .iter()
                        .map(|e| e.trim_start_matches('.'))
                        .collect();
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Data files", &extensions)
                        .add_filter("All files", &["*"])
                        .pick_file()
                    {
                        self.process_file(path);
                    }
                }
                if let Some(path) = &self.selected_file {
                    ui.label(format!("File: {}", path.display()));
                }
            });
        });

        egui::TopBottomPanel::bottom("bottom_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status_message);
                if let Some(analysis) = &self.analysis {
                    ui.separator();
                    ui.label(format!("Charts: {}", analysis.charts.len()));
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.toggle_value(&mut self.show_config, "Config");
                });
            });
        });

        if self.show_config {
            egui::SidePanel::left("config_panel").show(ctx, |ui| {
                self.render_config_panel(ui);
            });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(message) = &self.error_message {
                ui.colored_label(egui::Color32::RED, message);
                ui.separator();
            }
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.active_tab, ActiveTab::Overview, "Overview");
                ui.selectable_value(
                    &mut self.active_tab,
                    ActiveTab::AutoDashboard,
                    "Auto Dashboard",
                );
                ui.selectable_value(
                    &mut self.active_tab,
                    ActiveTab::ManualBuilder,
                    "Manual Builder",
                );
            });
            ui.separator();
            match self.active_tab {
                ActiveTab::Overview => self.render_overview_tab(ui),
                ActiveTab::AutoDashboard => self.render_auto_tab(ui),
                ActiveTab::ManualBuilder => self.render_manual_tab(ui),
            }
        });
    }
}
