//! Table body demo.
//!
//! Renders a generated (or loaded) row forest through the body engine using
//! egui:
//! - Windowed rendering with spacer padding above and below
//! - Row and checkbox selection, tree expansion toggles
//! - Measured row heights fed back to the engine
//! - A log of boundary and selection events
//!
//! Usage: `tbody-demo [rows.json]`. Set `RUST_LOG=rtbody=debug` to trace
//! recomputation passes.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use eframe::egui;
use egui::ScrollArea;
use rtbody::{
    load_rows_from_file, BodyConfig, BodyController, BodyEvent, BodyInput, EdgeKind, InputQueue,
    RenderedRow, RowGenerator, SelectionMode, SelectionSource, SelectionValue,
};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const BODY_CONFIG_KEY: &str = "body_config";
const EVENT_LOG_CAPACITY: usize = 200;
const INDENT_WIDTH: f32 = 16.0;
const COLUMNS: [&str; 3] = ["name", "status", "size"];

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let initial_file = std::env::args().nth(1).map(PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 700.0])
            .with_title("Table Body Demo"),
        ..Default::default()
    };

    eframe::run_native(
        "Table Body Demo",
        options,
        Box::new(move |cc| Ok(Box::new(TbodyDemoApp::new(cc, initial_file)?))),
    )
}

type EventLog = Rc<RefCell<VecDeque<String>>>;

struct TbodyDemoApp {
    body: BodyController,
    config: BodyConfig,
    /// Rows currently fed to the engine
    rows: Vec<Value>,
    log: EventLog,
    error: Option<String>,
    pending_file_load: Option<PathBuf>,
    /// Engine scroll offset to push into the scroll area on the next frame
    pending_scroll: Option<f32>,
}

impl TbodyDemoApp {
    fn new(cc: &eframe::CreationContext, initial_file: Option<PathBuf>) -> anyhow::Result<Self> {
        let config = cc
            .storage
            .and_then(|storage| storage.get_string(BODY_CONFIG_KEY))
            .and_then(|json| match BodyConfig::from_json_str(&json) {
                Ok(config) => Some(config),
                Err(e) => {
                    warn!("Ignoring stored body configuration: {e:#}");
                    None
                }
            })
            .unwrap_or_else(default_config);

        let log: EventLog = Rc::new(RefCell::new(VecDeque::new()));
        let rows = RowGenerator::new().generate(500);
        let body = build_body(config.clone(), &log, rows.clone())?;
        let pending_scroll = Some(engine_scroll_offset(&body));

        Ok(Self {
            body,
            config,
            rows,
            log,
            error: None,
            pending_file_load: initial_file,
            pending_scroll,
        })
    }

    fn open_file(&mut self, path: PathBuf) {
        match load_rows_from_file(&path) {
            Ok(rows) => {
                info!(path = %path.display(), roots = rows.len(), "Loaded rows");
                self.set_rows(rows);
                self.error = None;
            }
            Err(e) => self.error = Some(format!("{e:#}")),
        }
    }

    fn set_rows(&mut self, rows: Vec<Value>) {
        self.rows = rows.clone();
        self.body.dispatch(BodyInput::SetRows(rows));
    }

    /// Rebuilds the controller after a configuration change, keeping rows.
    fn apply_config(&mut self) {
        match build_body(self.config.clone(), &self.log, self.rows.clone()) {
            Ok(body) => {
                self.pending_scroll = Some(engine_scroll_offset(&body));
                self.body = body;
                self.error = None;
            }
            Err(e) => self.error = Some(format!("{e:#}")),
        }
    }

    fn render_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("📁 Open Rows").clicked() {
                let mut dialog = rfd::FileDialog::new().add_filter("JSON Rows", &["json"]);
                if let Ok(cwd) = std::env::current_dir() {
                    dialog = dialog.set_directory(cwd);
                }
                if let Some(path) = dialog.pick_file() {
                    self.open_file(path);
                }
            }

            if ui.button("🎲 Generate").clicked() {
                let seed = rand::random::<u64>();
                self.set_rows(RowGenerator::with_config(3, 6, seed).generate(500));
            }

            ui.separator();

            let mut changed = false;
            changed |= mode_combo(ui, "Row", &mut self.config.selection.row_mode);
            changed |= mode_combo(ui, "Checkbox", &mut self.config.selection.checkbox_mode);
            changed |= ui
                .checkbox(&mut self.config.selection.children_select_parents, "Children select parents")
                .changed();
            if changed {
                self.apply_config();
            }

            ui.separator();
            ui.label(format!("{} selected", self.body.selection().len()));
        });

        if let Some(error) = &self.error {
            ui.colored_label(egui::Color32::RED, error);
        }
    }

    fn render_body(&mut self, ui: &mut egui::Ui) {
        let container_height = ui.available_height();
        let mut inputs: Vec<BodyInput<Value>> = Vec::new();

        let mut scroll_area = ScrollArea::vertical()
            .id_salt("body_scroll_area")
            .auto_shrink([false, false]);
        // Starts at the engine's offset, e.g. the `id_for_first_item` anchor
        if let Some(offset) = self.pending_scroll.take() {
            scroll_area = scroll_area.vertical_scroll_offset(offset);
        }
        let scroll_area = scroll_area.show(ui, |ui| {
            let top_padding = self.body.top_padding() as f32;
            if top_padding > 0.0 {
                ui.add_space(top_padding);
            }

            for row in self.body.visible_rows() {
                render_row(ui, &row, &mut inputs);
            }

            let bottom_padding = self.body.bottom_padding() as f32;
            if bottom_padding > 0.0 {
                ui.add_space(bottom_padding);
            }
        });

        inputs.push(BodyInput::Scroll {
            scroll_top: f64::from(scroll_area.state.offset.y),
            container_height: f64::from(container_height),
        });
        for input in inputs {
            self.body.dispatch(input);
        }
    }

    fn render_log(&self, ui: &mut egui::Ui) {
        ScrollArea::vertical()
            .id_salt("event_log")
            .stick_to_bottom(true)
            .max_height(120.0)
            .show(ui, |ui| {
                for line in self.log.borrow().iter() {
                    ui.monospace(line);
                }
            });
    }
}

impl eframe::App for TbodyDemoApp {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        match self.config.to_json_string() {
            Ok(json) => storage.set_string(BODY_CONFIG_KEY, json),
            Err(e) => warn!("Failed to save body configuration: {e:#}"),
        }
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(path) = self.pending_file_load.take() {
            self.open_file(path);
        }

        egui::TopBottomPanel::top("header").show(ctx, |ui| self.render_header(ui));
        egui::TopBottomPanel::bottom("event_log_panel").show(ctx, |ui| self.render_log(ui));
        egui::CentralPanel::default().show(ctx, |ui| self.render_body(ui));
    }
}

fn default_config() -> BodyConfig {
    BodyConfig { key: Some("id".to_string()), ..Default::default() }
}

fn build_body(config: BodyConfig, log: &EventLog, rows: Vec<Value>) -> anyhow::Result<BodyController> {
    let mut body = BodyController::new(config)?;
    body.set_columns(COLUMNS);

    let log = Rc::clone(log);
    body.subscribe(move |event: &BodyEvent<Value>, _queue: &mut InputQueue<Value>| {
        let line = describe_event(event);
        let mut log = log.borrow_mut();
        if log.len() == EVENT_LOG_CAPACITY {
            log.pop_front();
        }
        log.push_back(line);
    });

    body.dispatch(BodyInput::SetRows(rows));
    Ok(body)
}

/// Offset the scroll area must start from to agree with the engine, which
/// already applied any `id_for_first_item` anchor.
fn engine_scroll_offset(body: &BodyController) -> f32 {
    body.scroll_top() as f32
}

fn describe_event(event: &BodyEvent<Value>) -> String {
    match event {
        BodyEvent::Edge(signal) => {
            let kind = match signal.kind {
                EdgeKind::FirstReached => "first reached",
                EdgeKind::LastReached => "last reached",
                EdgeKind::FirstVisibleChanged => "first visible",
                EdgeKind::LastVisibleChanged => "last visible",
            };
            format!("{kind}: {}", signal.key)
        }
        BodyEvent::Select(SelectionValue::Single(value)) => match value {
            Some(row) => format!("select: {}", cell_text(row.get("id"))),
            None => "select: none".to_string(),
        },
        BodyEvent::Select(SelectionValue::Multiple(values)) => {
            format!("select: {} rows", values.len())
        }
    }
}

fn mode_combo(ui: &mut egui::Ui, label: &str, mode: &mut SelectionMode) -> bool {
    let before = *mode;
    egui::ComboBox::from_label(label)
        .selected_text(format!("{before:?}"))
        .show_ui(ui, |ui| {
            for candidate in [SelectionMode::None, SelectionMode::Single, SelectionMode::Multiple] {
                ui.selectable_value(mode, candidate, format!("{candidate:?}"));
            }
        });
    *mode != before
}

/// Draws one row and collects the inputs its interactions produce.
fn render_row(ui: &mut egui::Ui, row: &RenderedRow<'_, Value>, inputs: &mut Vec<BodyInput<Value>>) {
    let meta = &row.row_meta;
    let response = ui.horizontal(|ui| {
        ui.add_space(meta.depth as f32 * INDENT_WIDTH);

        if meta.has_children {
            let icon = if meta.is_expanded { "▼" } else { "▶" };
            if ui.add_enabled(meta.can_collapse, egui::Button::new(icon).small()).clicked() {
                inputs.push(row.actions.toggle_expansion());
            }
        } else {
            ui.add_space(INDENT_WIDTH);
        }

        if row.checkbox_selection_mode != SelectionMode::None {
            let mut checked = meta.is_selected;
            if ui.checkbox(&mut checked, "").clicked() {
                inputs.push(row.actions.toggle_selection(SelectionSource::Checkbox));
            }
        }

        for cell in &row.cells {
            let text = cell_text(cell.value.as_ref());
            let clicked = ui.selectable_label(meta.is_selected, text).clicked();
            if clicked && row.row_toggle_mode {
                inputs.push(row.actions.toggle_selection(SelectionSource::Row));
            }
        }
    });

    inputs.push(row.actions.measured(f64::from(response.response.rect.height())));
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
