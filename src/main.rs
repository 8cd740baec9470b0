//! M3U Editor
//! A desktop editor for M3U playlists: import, regroup, validate and export

// Hide console window on Windows release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use eframe::egui;
use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use m3u_editor::ai::{AiJob, GeminiClient};
use m3u_editor::config::AppConfig;
use m3u_editor::m3u_parser::{self, ParseEvent, ParseTask};
use m3u_editor::models::Entry;
use m3u_editor::prober::Prober;
use m3u_editor::query::{self, CategoryFilter, GroupFilter, PlaylistStats, ViewCriteria};
use m3u_editor::sources::{self, ImportSource, XtreamLogin};
use m3u_editor::{Category, Collection, EntryId, SortOption, StreamStatus};

const TOAST_DURATION: Duration = Duration::from_secs(3);
const MAX_LOG_LINES: usize = 500;

/// Get current local time as HH:MM:SS
fn timestamp_now() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// Application icon: a list sheet on a teal gradient
fn load_icon() -> egui::IconData {
    let size: usize = 64;
    let mut rgba = vec![0u8; size * size * 4];

    for y in 0..size {
        for x in 0..size {
            let idx = (y * size + x) * 4;
            let nx = x as f32 / size as f32;
            let ny = y as f32 / size as f32;

            let corner_radius = 0.125;
            let in_rounded_rect = {
                let dx = if nx < corner_radius { corner_radius - nx }
                         else if nx > 1.0 - corner_radius { nx - (1.0 - corner_radius) }
                         else { 0.0 };
                let dy = if ny < corner_radius { corner_radius - ny }
                         else if ny > 1.0 - corner_radius { ny - (1.0 - corner_radius) }
                         else { 0.0 };
                dx * dx + dy * dy <= corner_radius * corner_radius
            };
            if !in_rounded_rect {
                continue;
            }

            // Teal to indigo
            let t = nx * 0.5 + ny * 0.5;
            let bg = [
                (20.0 + (79.0 - 20.0) * t) as u8,
                (184.0 + (70.0 - 184.0) * t) as u8,
                (166.0 + (229.0 - 166.0) * t) as u8,
            ];

            let in_sheet = (0.2..=0.8).contains(&nx) && (0.15..=0.85).contains(&ny);
            // Four list rows, each with a bullet and a line
            let row = ((ny - 0.25) / 0.15).floor();
            let row_y = 0.25 + row * 0.15;
            let on_row = (0.0..4.0).contains(&row) && ny >= row_y && ny <= row_y + 0.05;
            let in_bullet = on_row && (0.28..=0.34).contains(&nx);
            let in_line = on_row && (0.40..=0.72).contains(&nx);

            let color = if in_bullet {
                [79, 70, 229]
            } else if in_line {
                [45, 55, 72]
            } else if in_sheet {
                [255, 255, 255]
            } else {
                bg
            };
            rgba[idx] = color[0];
            rgba[idx + 1] = color[1];
            rgba[idx + 2] = color[2];
            rgba[idx + 3] = 255;
        }
    }

    egui::IconData {
        rgba,
        width: size as u32,
        height: size as u32,
    }
}

/// Background task messages
enum TaskResult {
    SourceLoaded { content: String, origin: String },
    ProbeFinished(HashMap<EntryId, StreamStatus>),
    AiSuggested(AiJob, m3u_editor::Result<HashMap<EntryId, String>>),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ToastKind {
    Success,
    Error,
}

struct Toast {
    message: String,
    kind: ToastKind,
    shown_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GroupMode {
    Move,
    Copy,
}

/// Pending move/copy of a set of entries
struct GroupAction {
    mode: GroupMode,
    ids: HashSet<EntryId>,
    input: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ImportTab {
    File,
    Url,
    Xtream,
}

/// Owned copy of one table row
struct Row {
    id: EntryId,
    name: String,
    url: String,
    category: Category,
    group: String,
    status: StreamStatus,
}

impl Row {
    fn from_entry(entry: &Entry) -> Self {
        Self {
            id: entry.id(),
            name: entry.name.clone(),
            url: entry.url.clone(),
            category: entry.category,
            group: entry.group().to_string(),
            status: entry.status,
        }
    }
}

/// Derived view for one (criteria, revision) pair
struct ViewCache {
    criteria: ViewCriteria,
    revision: u64,
    rows: Vec<Row>,
    total_matched: usize,
    total_pages: usize,
    stats: PlaylistStats,
}

enum RowAction {
    Group(GroupMode, EntryId),
    Remove(EntryId),
}

fn main() -> Result<(), eframe::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("m3u_editor=info")),
        )
        .init();

    let icon = load_icon();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1250.0, 750.0])
            .with_min_inner_size([900.0, 550.0])
            .with_icon(icon),
        vsync: true,
        hardware_acceleration: eframe::HardwareAcceleration::Preferred,
        ..Default::default()
    };

    eframe::run_native(
        "M3U Editor",
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Ok(Box::new(M3uEditorApp::new()))
        }),
    )
}

struct M3uEditorApp {
    config: AppConfig,
    collection: Collection,
    /// Bumped on every collection mutation
    revision: u64,
    criteria: ViewCriteria,
    view_cache: Option<ViewCache>,
    selected: HashSet<EntryId>,

    // Background work
    task_sender: Sender<TaskResult>,
    task_receiver: Receiver<TaskResult>,
    parse_task: Option<ParseTask>,
    parse_progress: u8,
    import_origin: String,
    /// Set while a fetch, probe or AI request is in flight
    processing: Option<String>,

    // Import window
    show_import: bool,
    import_tab: ImportTab,
    url_input: String,
    xtream_host: String,
    xtream_username: String,
    xtream_password: String,

    // Group manager
    show_group_manager: bool,
    group_search: String,
    new_group_name: String,
    editing_group: Option<(String, String)>,
    pending_group_delete: Option<String>,

    group_action: Option<GroupAction>,

    toast: Option<Toast>,
    status_message: String,
    show_console: bool,
    console_log: Vec<String>,
}

impl M3uEditorApp {
    fn new() -> Self {
        let config = AppConfig::load();
        let (task_sender, task_receiver) = channel();

        Self {
            xtream_host: config.xtream_host.clone(),
            xtream_username: config.xtream_username.clone(),
            config,
            collection: Collection::new(),
            revision: 0,
            criteria: ViewCriteria::default(),
            view_cache: None,
            selected: HashSet::new(),
            task_sender,
            task_receiver,
            parse_task: None,
            parse_progress: 0,
            import_origin: String::new(),
            processing: None,
            show_import: false,
            import_tab: ImportTab::File,
            url_input: String::new(),
            xtream_password: String::new(),
            show_group_manager: false,
            group_search: String::new(),
            new_group_name: String::new(),
            editing_group: None,
            pending_group_delete: None,
            group_action: None,
            toast: None,
            status_message: "Ready".to_string(),
            show_console: false,
            console_log: vec![format!("[{}] [INFO] M3U Editor started", timestamp_now())],
        }
    }

    fn log(&mut self, message: &str) {
        self.console_log.push(format!("[{}] {}", timestamp_now(), message));
        if self.console_log.len() > MAX_LOG_LINES {
            self.console_log.remove(0);
        }
    }

    fn notify(&mut self, kind: ToastKind, message: impl Into<String>) {
        let message = message.into();
        let tag = match kind {
            ToastKind::Success => "[INFO]",
            ToastKind::Error => "[ERROR]",
        };
        self.log(&format!("{} {}", tag, message));
        self.status_message = message.clone();
        self.toast = Some(Toast {
            message,
            kind,
            shown_at: Instant::now(),
        });
    }

    fn mutated(&mut self) {
        self.revision += 1;
    }

    fn is_busy(&self) -> bool {
        self.processing.is_some() || self.parse_task.is_some()
    }

    /// Rebuild the cached page when the criteria or the collection changed
    fn refresh_view(&mut self) {
        let stale = match &self.view_cache {
            Some(cache) => cache.revision != self.revision || cache.criteria != self.criteria,
            None => true,
        };
        if !stale {
            return;
        }

        let mut view = query::derive(&self.collection, &self.criteria);
        // Deletions can leave the current page past the end
        let page = query::clamp_page(self.criteria.page, view.total_pages);
        if page != self.criteria.page {
            self.criteria.page = page;
            view = query::derive(&self.collection, &self.criteria);
        }
        self.view_cache = Some(ViewCache {
            criteria: self.criteria.clone(),
            revision: self.revision,
            rows: view.page.iter().map(|e| Row::from_entry(e)).collect(),
            total_matched: view.total_matched,
            total_pages: view.total_pages,
            stats: view.stats,
        });
    }

    fn reset_page(&mut self) {
        self.criteria.page = 1;
    }

    // === Import / export ===

    fn start_import(&mut self, source: ImportSource) {
        if let Err(e) = source.validate() {
            self.notify(ToastKind::Error, e.to_string());
            return;
        }
        if let ImportSource::Xtream(login) = &source {
            self.config.xtream_host = login.host.trim().to_string();
            self.config.xtream_username = login.username.clone();
            self.config.save();
        }

        let origin = source.describe();
        let sender = self.task_sender.clone();
        let options = self.config.fetch_options();

        self.show_import = false;
        self.processing = Some(format!("Loading {}...", origin));
        self.log(&format!("[INFO] Importing from {}", origin));

        thread::spawn(move || {
            let result = match sources::read_source(&source, &options) {
                Ok(content) => TaskResult::SourceLoaded { content, origin },
                Err(e) => TaskResult::Error(e.to_string()),
            };
            let _ = sender.send(result);
        });
    }

    fn finish_import(&mut self, result: m3u_editor::Result<Vec<Entry>>) {
        match result {
            Ok(entries) => {
                let count = entries.len();
                self.collection.add_all(entries);
                self.selected.clear();
                self.criteria.group = GroupFilter::All;
                self.reset_page();
                self.mutated();
                info!("Imported {} entries from {}", count, self.import_origin);
                self.notify(ToastKind::Success, format!("Imported {} streams from {}", count, self.import_origin));
            }
            Err(e) => {
                warn!("Import failed: {}", e);
                self.notify(ToastKind::Error, e.to_string());
            }
        }
    }

    fn export(&mut self) {
        if self.collection.is_empty() {
            self.notify(ToastKind::Error, "Nothing to export");
            return;
        }
        let Some(path) = rfd::FileDialog::new()
            .set_title("Export Playlist")
            .set_file_name(sources::DEFAULT_EXPORT_NAME)
            .add_filter("M3U Playlist", &["m3u", "m3u8"])
            .save_file()
        else {
            return;
        };

        match sources::save_playlist(&path, self.collection.entries()) {
            Ok(()) => self.notify(ToastKind::Success, format!("Exported {} streams", self.collection.len())),
            Err(e) => self.notify(ToastKind::Error, format!("Export failed: {}", e)),
        }
    }

    // === Validation and AI ===

    fn validate_streams(&mut self) {
        let prober = Prober::http(self.config.probe_config(), &self.config.user_agent);
        let targets: Vec<Entry> = prober.targets(self.collection.entries()).to_vec();
        if targets.is_empty() {
            return;
        }

        let ids: HashSet<EntryId> = targets.iter().map(|e| e.id()).collect();
        self.collection.mark_checking(&ids);
        self.mutated();
        self.processing = Some("Validating stream health...".to_string());
        self.log(&format!("[INFO] Validating {} streams", targets.len()));

        let sender = self.task_sender.clone();
        thread::spawn(move || {
            let results = prober.probe(&targets);
            let _ = sender.send(TaskResult::ProbeFinished(results));
        });
    }

    fn run_ai(&mut self, job: AiJob) {
        let client = match GeminiClient::from_env(&self.config.ai_model) {
            Ok(client) => client,
            Err(e) => {
                self.notify(ToastKind::Error, e.to_string());
                return;
            }
        };

        let batch = match job.prepare(&self.collection, &self.selected, self.config.ai_batch_cap) {
            Ok(batch) => batch,
            Err(e) => {
                self.notify(ToastKind::Error, e.to_string());
                return;
            }
        };

        self.processing = Some(match job {
            AiJob::CleanNames => format!("AI is cleaning {} titles...", batch.len()),
            AiJob::Categorize => format!("AI is categorizing {} items...", batch.len()),
        });
        self.log(&format!("[INFO] Sending {} items to {}", batch.len(), self.config.ai_model));

        let sender = self.task_sender.clone();
        thread::spawn(move || {
            let updates = job.suggest(&client, &batch);
            let _ = sender.send(TaskResult::AiSuggested(job, updates));
        });
    }

    // === Collection mutations ===

    fn delete_selected(&mut self) {
        let removed = self.collection.delete(&self.selected);
        self.selected.clear();
        self.mutated();
        self.notify(ToastKind::Success, format!("Deleted {} items", removed));
    }

    fn remove_entry(&mut self, id: EntryId) {
        let ids: HashSet<EntryId> = [id].into_iter().collect();
        self.collection.delete(&ids);
        self.selected.remove(&id);
        self.mutated();
    }

    fn apply_group_action(&mut self, mode: GroupMode, ids: HashSet<EntryId>, group: &str) -> bool {
        let result = match mode {
            GroupMode::Move => self.collection.move_to_group(&ids, group),
            GroupMode::Copy => self.collection.copy_to_group(&ids, group),
        };
        match result {
            Ok(_) => {
                self.selected.clear();
                self.mutated();
                let verb = if mode == GroupMode::Move { "moved" } else { "copied" };
                self.notify(ToastKind::Success, format!("Items {} to \"{}\"", verb, group.trim()));
                true
            }
            Err(e) => {
                self.notify(ToastKind::Error, e.to_string());
                false
            }
        }
    }

    fn create_group(&mut self) {
        let name = self.new_group_name.trim().to_string();
        if name.is_empty() {
            return;
        }
        match self.collection.create_empty_group(&name) {
            Ok(()) => {
                self.new_group_name.clear();
                self.mutated();
                self.notify(ToastKind::Success, format!("Folder \"{}\" created successfully!", name));
            }
            Err(e) => self.notify(ToastKind::Error, e.to_string()),
        }
    }

    fn rename_group(&mut self, old: &str, new: &str) {
        if new.trim().is_empty() || new == old {
            return;
        }
        self.collection.rename_group(old, new);
        if self.criteria.group == GroupFilter::Named(old.to_string()) {
            self.criteria.group = GroupFilter::Named(new.to_string());
        }
        self.mutated();
        self.notify(ToastKind::Success, format!("Group renamed to \"{}\"", new));
    }

    fn delete_group(&mut self, name: &str) {
        let removed = self.collection.delete_group(name);
        let remaining: HashSet<EntryId> = self.collection.entries().iter().map(|e| e.id()).collect();
        self.selected.retain(|id| remaining.contains(id));
        if self.criteria.group == GroupFilter::Named(name.to_string()) {
            self.criteria.group = GroupFilter::All;
            self.reset_page();
        }
        self.mutated();
        self.notify(ToastKind::Success, format!("Folder \"{}\" deleted ({} items)", name, removed));
    }

    // === Background results ===

    fn process_tasks(&mut self) {
        while let Ok(result) = self.task_receiver.try_recv() {
            match result {
                TaskResult::SourceLoaded { content, origin } => {
                    self.log(&format!("[INFO] Downloaded {} bytes, parsing", content.len()));
                    self.processing = None;
                    self.import_origin = origin;
                    self.parse_progress = 0;
                    self.parse_task = Some(m3u_parser::spawn_parse(content));
                }
                TaskResult::ProbeFinished(statuses) => {
                    self.processing = None;
                    self.collection.apply_statuses(&statuses);
                    self.mutated();
                    let online = statuses.values().filter(|s| **s == StreamStatus::Online).count();
                    self.notify(
                        ToastKind::Success,
                        format!("Validation complete for {} streams ({} online)", statuses.len(), online),
                    );
                }
                TaskResult::AiSuggested(job, result) => {
                    self.processing = None;
                    match (job, result) {
                        (_, Ok(updates)) => {
                            let changed = job.apply(&mut self.collection, &updates);
                            self.mutated();
                            let message = match job {
                                AiJob::CleanNames => format!("AI cleaned {} titles!", changed),
                                AiJob::Categorize => format!("AI categorized {} items!", changed),
                            };
                            self.notify(ToastKind::Success, message);
                        }
                        (AiJob::CleanNames, Err(e)) => {
                            self.notify(ToastKind::Error, format!("AI cleanup failed: {}", e))
                        }
                        (AiJob::Categorize, Err(e)) => {
                            self.notify(ToastKind::Error, format!("AI grouping failed: {}", e))
                        }
                    }
                }
                TaskResult::Error(msg) => {
                    self.processing = None;
                    self.notify(ToastKind::Error, msg);
                }
            }
        }

        let mut finished = None;
        if let Some(task) = &self.parse_task {
            while let Some(event) = task.poll() {
                match event {
                    ParseEvent::Progress(p) => self.parse_progress = p,
                    ParseEvent::Finished(result) => {
                        finished = Some(result);
                        break;
                    }
                }
            }
        }
        if let Some(result) = finished {
            self.parse_task = None;
            self.finish_import(result);
        }
    }
}

impl eframe::App for M3uEditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_tasks();

        if self.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
        if let Some(toast) = &self.toast {
            if toast.shown_at.elapsed() >= TOAST_DURATION {
                self.toast = None;
            } else {
                ctx.request_repaint_after(Duration::from_millis(250));
            }
        }

        if self.config.dark_mode {
            ctx.set_visuals(egui::Visuals::dark());
        } else {
            ctx.set_visuals(egui::Visuals::light());
        }

        self.show_header(ctx);
        self.show_status_bar(ctx);
        if self.show_console {
            self.show_console_panel(ctx);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_main(ui);
        });

        self.show_import_window(ctx);
        self.show_group_manager_window(ctx);
        self.show_group_action_window(ctx);
        self.show_delete_confirm(ctx);
        self.show_toast(ctx);
    }
}

impl M3uEditorApp {
    fn show_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.add_space(5.0);
            ui.horizontal(|ui| {
                ui.heading("📝 M3U Editor");
                ui.separator();

                if ui.add_enabled(!self.is_busy(), egui::Button::new("📥 Import")).clicked() {
                    self.show_import = true;
                }
                if ui.add_enabled(!self.collection.is_empty(), egui::Button::new("💾 Export")).clicked() {
                    self.export();
                }
                if ui.button("📁 Groups").on_hover_text("Manage folders").clicked() {
                    self.show_group_manager = true;
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.checkbox(&mut self.config.dark_mode, "🌙 Dark").changed() {
                        self.config.save();
                    }
                    ui.toggle_value(&mut self.show_console, "🖥 Console");
                });
            });

            if self.parse_task.is_some() {
                ui.horizontal(|ui| {
                    ui.label(format!("Parsing {}", self.import_origin));
                    ui.add(
                        egui::ProgressBar::new(self.parse_progress as f32 / 100.0)
                            .desired_width(300.0)
                            .show_percentage(),
                    );
                    if ui.button("Cancel").clicked() {
                        // Dropping the handle stops the worker
                        self.parse_task = None;
                        self.log("[WARN] Import cancelled");
                        self.status_message = "Import cancelled".to_string();
                    }
                });
            }
            ui.add_space(5.0);
        });
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("bottom_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(message) = &self.processing {
                    ui.spinner();
                    ui.label(message);
                } else {
                    ui.label(&self.status_message);
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if !self.selected.is_empty() {
                        ui.label(egui::RichText::new(format!("{} selected", self.selected.len())).strong());
                    }
                });
            });
        });
    }

    fn show_console_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("console_panel")
            .resizable(true)
            .default_height(160.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.strong("Console Log");
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("🗑 Clear").clicked() {
                            self.console_log.clear();
                            self.console_log.push(format!("[{}] Console cleared", timestamp_now()));
                        }
                    });
                });
                ui.separator();
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for line in &self.console_log {
                            let color = if line.contains("[ERROR]") {
                                egui::Color32::RED
                            } else if line.contains("[WARN]") {
                                egui::Color32::YELLOW
                            } else if line.contains("[INFO]") {
                                egui::Color32::LIGHT_BLUE
                            } else {
                                egui::Color32::GRAY
                            };
                            ui.label(egui::RichText::new(line).monospace().color(color));
                        }
                    });
            });
    }

    fn show_main(&mut self, ui: &mut egui::Ui) {
        self.refresh_view();
        let Some(cache) = self.view_cache.take() else {
            return;
        };

        self.show_stats(ui, &cache.stats);
        ui.separator();
        self.show_filters(ui);
        ui.add_space(4.0);
        self.show_toolbar(ui);
        ui.separator();

        let action = self.show_table(ui, &cache);
        self.show_pagination(ui, &cache);
        self.view_cache = Some(cache);

        match action {
            Some(RowAction::Group(mode, id)) => {
                self.group_action = Some(GroupAction {
                    mode,
                    ids: [id].into_iter().collect(),
                    input: String::new(),
                });
            }
            Some(RowAction::Remove(id)) => self.remove_entry(id),
            None => {}
        }
    }

    fn show_stats(&self, ui: &mut egui::Ui, stats: &PlaylistStats) {
        ui.horizontal_wrapped(|ui| {
            let stat = |ui: &mut egui::Ui, label: &str, value: usize, color: egui::Color32| {
                ui.label(egui::RichText::new(label).small().weak());
                ui.label(egui::RichText::new(value.to_string()).strong().color(color));
                ui.add_space(12.0);
            };
            stat(ui, "TOTAL", stats.total, egui::Color32::LIGHT_BLUE);
            stat(ui, "ONLINE", stats.online, egui::Color32::from_rgb(16, 185, 129));
            stat(ui, "OFFLINE", stats.offline, egui::Color32::from_rgb(225, 29, 72));
            stat(ui, "UNKNOWN", stats.unknown(), egui::Color32::GRAY);
            stat(ui, "GROUPS", stats.groups, egui::Color32::from_rgb(129, 140, 248));
            stat(ui, "DUPLICATES", stats.duplicates, egui::Color32::from_rgb(245, 158, 11));
            ui.separator();
            stat(ui, "TV", stats.tv_count, egui::Color32::GRAY);
            stat(ui, "MOVIES", stats.movie_count, egui::Color32::GRAY);
            stat(ui, "SERIES", stats.series_count, egui::Color32::GRAY);
            stat(ui, "OTHER", stats.other_count, egui::Color32::GRAY);
        });
    }

    fn show_filters(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let before = self.criteria.category;
            ui.selectable_value(&mut self.criteria.category, CategoryFilter::All, "▦ ALL");
            ui.selectable_value(&mut self.criteria.category, CategoryFilter::Only(Category::Tv), "📺 TV");
            ui.selectable_value(&mut self.criteria.category, CategoryFilter::Only(Category::Movie), "🎬 MOVIES");
            ui.selectable_value(&mut self.criteria.category, CategoryFilter::Only(Category::Series), "🎞 SERIES");
            if self.criteria.category != before {
                self.reset_page();
            }

            ui.separator();
            ui.label("🔍");
            if ui
                .add(egui::TextEdit::singleline(&mut self.criteria.search)
                    .hint_text("Search name or URL...")
                    .desired_width(220.0))
                .changed()
            {
                self.reset_page();
            }

            let options = query::group_filter_options(&self.collection, self.criteria.category);
            let mut picked = None;
            egui::ComboBox::from_id_salt("group_filter")
                .selected_text(format!("📁 {}", self.criteria.group.label()))
                .width(180.0)
                .show_ui(ui, |ui| {
                    for option in &options {
                        let current = self.criteria.group.label() == option;
                        if ui.selectable_label(current, option).clicked() {
                            picked = Some(GroupFilter::from_option(option));
                        }
                    }
                });
            if let Some(group) = picked {
                self.criteria.group = group;
                self.reset_page();
            }

            egui::ComboBox::from_id_salt("sort_order")
                .selected_text(self.criteria.sort.label())
                .show_ui(ui, |ui| {
                    for option in SortOption::ALL {
                        ui.selectable_value(&mut self.criteria.sort, option, option.label());
                    }
                });
        });
    }

    fn show_toolbar(&mut self, ui: &mut egui::Ui) {
        let idle = !self.is_busy() && !self.collection.is_empty();
        ui.horizontal(|ui| {
            if ui
                .add_enabled(idle, egui::Button::new("🛡 Validate"))
                .on_hover_text(format!("Check the first {} streams", self.config.probe_cap))
                .clicked()
            {
                self.validate_streams();
            }
            if ui
                .add_enabled(idle, egui::Button::new("✨ AI Cleanup"))
                .on_hover_text("Clean titles of the selection, or the first batch")
                .clicked()
            {
                self.run_ai(AiJob::CleanNames);
            }
            if ui
                .add_enabled(idle, egui::Button::new("🏷 AI Grouping"))
                .on_hover_text("Assign groups to the selection, or the first batch")
                .clicked()
            {
                self.run_ai(AiJob::Categorize);
            }

            if !self.selected.is_empty() {
                ui.separator();
                if ui.button(format!("📂 Move Selected ({})", self.selected.len())).clicked() {
                    self.group_action = Some(GroupAction {
                        mode: GroupMode::Move,
                        ids: self.selected.clone(),
                        input: String::new(),
                    });
                }
                if ui.button("📋 Copy Selected").clicked() {
                    self.group_action = Some(GroupAction {
                        mode: GroupMode::Copy,
                        ids: self.selected.clone(),
                        input: String::new(),
                    });
                }
                let mut retype = None;
                ui.menu_button("🏷 Set Type", |ui| {
                    for category in Category::ALL {
                        if ui.button(category.label()).clicked() {
                            retype = Some(category);
                            ui.close();
                        }
                    }
                });
                if let Some(category) = retype {
                    let changed = self.collection.set_category(&self.selected, category);
                    self.mutated();
                    self.notify(ToastKind::Success, format!("{} items set to {}", changed, category));
                }
                let delete = egui::RichText::new(format!("🗑 Delete Selected ({})", self.selected.len()))
                    .color(egui::Color32::from_rgb(225, 29, 72));
                if ui.button(delete).clicked() {
                    self.delete_selected();
                }
            }
        });
    }

    fn show_table(&mut self, ui: &mut egui::Ui, cache: &ViewCache) -> Option<RowAction> {
        if cache.rows.is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(80.0);
                ui.heading("No content found");
                ui.label(egui::RichText::new("Import a playlist or change filters to see streams.").weak());
            });
            return None;
        }

        let mut action = None;
        let mut toggle_all = false;
        let all_selected = cache.total_matched > 0 && self.selected.len() == cache.total_matched
            && cache.rows.iter().all(|r| self.selected.contains(&r.id));

        let table_height = ui.available_height() - 36.0;
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .max_height(table_height.max(100.0))
            .show(ui, |ui| {
                egui::Grid::new("entries_table")
                    .striped(true)
                    .num_columns(6)
                    .spacing([16.0, 6.0])
                    .show(ui, |ui| {
                        let mut header_checked = all_selected;
                        if ui.checkbox(&mut header_checked, "").changed() {
                            toggle_all = true;
                        }
                        ui.strong("STREAM INFO");
                        ui.strong("TYPE");
                        ui.strong("GROUP");
                        ui.strong("STATUS");
                        ui.strong("ACTIONS");
                        ui.end_row();

                        for row in &cache.rows {
                            let mut checked = self.selected.contains(&row.id);
                            if ui.checkbox(&mut checked, "").changed() {
                                if checked {
                                    self.selected.insert(row.id);
                                } else {
                                    self.selected.remove(&row.id);
                                }
                            }

                            ui.vertical(|ui| {
                                ui.set_max_width(420.0);
                                ui.add(egui::Label::new(egui::RichText::new(&row.name).strong()).truncate())
                                    .on_hover_text(&row.name);
                                ui.add(egui::Label::new(egui::RichText::new(&row.url).small().monospace().weak()).truncate())
                                    .on_hover_text(&row.url);
                            });

                            let (icon, color) = match row.category {
                                Category::Tv => ("📺", egui::Color32::from_rgb(99, 102, 241)),
                                Category::Movie => ("🎬", egui::Color32::from_rgb(244, 63, 94)),
                                Category::Series => ("🎞", egui::Color32::from_rgb(245, 158, 11)),
                                Category::Other => ("▶", egui::Color32::GRAY),
                            };
                            ui.label(egui::RichText::new(format!("{} {}", icon, row.category.label())).color(color));

                            ui.label(egui::RichText::new(&row.group).small().strong());

                            let (status_text, status_color) = match row.status {
                                StreamStatus::Online => ("✔ Online", egui::Color32::from_rgb(16, 185, 129)),
                                StreamStatus::Offline => ("✖ Offline", egui::Color32::from_rgb(225, 29, 72)),
                                StreamStatus::Checking => ("… Checking", egui::Color32::LIGHT_BLUE),
                                StreamStatus::Unknown => ("? Unknown", egui::Color32::GRAY),
                            };
                            ui.label(egui::RichText::new(status_text).small().color(status_color));

                            ui.menu_button("⋮", |ui| {
                                if ui.button("📂 Move to Group").clicked() {
                                    action = Some(RowAction::Group(GroupMode::Move, row.id));
                                    ui.close();
                                }
                                if ui.button("📋 Copy to Group").clicked() {
                                    action = Some(RowAction::Group(GroupMode::Copy, row.id));
                                    ui.close();
                                }
                                ui.separator();
                                let remove = egui::RichText::new("🗑 Remove").color(egui::Color32::from_rgb(225, 29, 72));
                                if ui.button(remove).clicked() {
                                    action = Some(RowAction::Remove(row.id));
                                    ui.close();
                                }
                            });
                            ui.end_row();
                        }
                    });
            });

        if toggle_all {
            if all_selected {
                self.selected.clear();
            } else {
                self.selected = query::filter_and_sort(self.collection.entries(), &self.criteria)
                    .into_iter()
                    .map(|e| e.id())
                    .collect();
            }
        }
        action
    }

    fn show_pagination(&mut self, ui: &mut egui::Ui, cache: &ViewCache) {
        if cache.total_pages <= 1 {
            return;
        }
        let page = query::clamp_page(self.criteria.page, cache.total_pages);
        let first = (page - 1) * query::PAGE_SIZE + 1;
        let last = (page * query::PAGE_SIZE).min(cache.total_matched);

        ui.horizontal(|ui| {
            ui.label(format!("Displaying {} to {} of {} items", first, last, cache.total_matched));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let mut page = page;
                if ui.add_enabled(page < cache.total_pages, egui::Button::new("▶")).clicked() {
                    page += 1;
                }
                ui.label(format!("of {}", cache.total_pages));
                ui.add(egui::DragValue::new(&mut page).range(1..=cache.total_pages));
                ui.label("Page");
                if ui.add_enabled(page > 1, egui::Button::new("◀")).clicked() {
                    page -= 1;
                }
                self.criteria.page = page;
            });
        });
    }

    fn show_import_window(&mut self, ctx: &egui::Context) {
        if !self.show_import {
            return;
        }
        let mut source = None;
        let mut close = false;

        egui::Window::new("📥 Import Playlist")
            .collapsible(false)
            .resizable(false)
            .min_width(420.0)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.selectable_value(&mut self.import_tab, ImportTab::File, "📄 File");
                    ui.selectable_value(&mut self.import_tab, ImportTab::Url, "🌐 URL");
                    ui.selectable_value(&mut self.import_tab, ImportTab::Xtream, "🔑 Xtream");
                });
                ui.separator();

                match self.import_tab {
                    ImportTab::File => {
                        ui.label("Pick a local .m3u or .m3u8 file (gzip-compressed files are fine).");
                        ui.add_space(6.0);
                        if ui.button("📁 Browse...").clicked() {
                            if let Some(path) = rfd::FileDialog::new()
                                .set_title("Open Playlist")
                                .add_filter("Playlist", &["m3u", "m3u8", "gz"])
                                .pick_file()
                            {
                                source = Some(ImportSource::File(path));
                            }
                        }
                    }
                    ImportTab::Url => {
                        ui.horizontal(|ui| {
                            ui.label("URL:");
                            ui.add(egui::TextEdit::singleline(&mut self.url_input)
                                .hint_text("http://server.com/playlist.m3u")
                                .desired_width(320.0));
                        });
                        ui.add_space(6.0);
                        if ui.button("⬇ Fetch").clicked() {
                            source = Some(ImportSource::Url(self.url_input.clone()));
                        }
                    }
                    ImportTab::Xtream => {
                        egui::Grid::new("xtream_form").num_columns(2).spacing([8.0, 6.0]).show(ui, |ui| {
                            ui.label("Host:");
                            ui.add(egui::TextEdit::singleline(&mut self.xtream_host)
                                .hint_text("provider.com:8080")
                                .desired_width(260.0));
                            ui.end_row();
                            ui.label("Username:");
                            ui.add(egui::TextEdit::singleline(&mut self.xtream_username).desired_width(260.0));
                            ui.end_row();
                            ui.label("Password:");
                            ui.add(egui::TextEdit::singleline(&mut self.xtream_password)
                                .password(true)
                                .desired_width(260.0));
                            ui.end_row();
                        });
                        ui.add_space(6.0);
                        if ui.button("🔑 Connect").clicked() {
                            source = Some(ImportSource::Xtream(XtreamLogin {
                                host: self.xtream_host.clone(),
                                username: self.xtream_username.clone(),
                                password: self.xtream_password.clone(),
                            }));
                        }
                    }
                }

                ui.add_space(8.0);
                ui.label(egui::RichText::new("Importing replaces the current playlist.").small().weak());
                if ui.button("Close").clicked() {
                    close = true;
                }
            });

        if close {
            self.show_import = false;
        }
        if let Some(source) = source {
            self.start_import(source);
        }
    }

    fn show_group_manager_window(&mut self, ctx: &egui::Context) {
        if !self.show_group_manager {
            return;
        }
        let counts = self.collection.group_counts();
        let groups = query::filter_groups(&self.collection, &self.group_search);

        let mut create = false;
        let mut rename: Option<(String, String)> = None;
        let mut show_group: Option<String> = None;
        let mut close = false;

        egui::Window::new("📁 Group Manager")
            .collapsible(false)
            .resizable(true)
            .min_width(420.0)
            .default_height(480.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.add(egui::TextEdit::singleline(&mut self.new_group_name)
                        .hint_text("New folder name")
                        .desired_width(220.0));
                    if ui.button("➕ Create").clicked() {
                        create = true;
                    }
                });
                ui.horizontal(|ui| {
                    ui.label("🔍");
                    ui.add(egui::TextEdit::singleline(&mut self.group_search)
                        .hint_text("Search folders...")
                        .desired_width(220.0));
                });
                ui.separator();

                egui::ScrollArea::vertical().max_height(360.0).show(ui, |ui| {
                    if groups.is_empty() {
                        ui.label(egui::RichText::new("No folders").weak());
                    }
                    for group in &groups {
                        let count = counts.get(group).copied().unwrap_or(0);
                        ui.horizontal(|ui| {
                            match &mut self.editing_group {
                                Some((old, input)) if old == group => {
                                    let response = ui.add(egui::TextEdit::singleline(input).desired_width(200.0));
                                    let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                                    if ui.button("✔").clicked() || submitted {
                                        rename = Some((old.clone(), input.clone()));
                                    }
                                }
                                _ => {
                                    if ui.link(format!("📁 {}", group)).on_hover_text("Show this folder").clicked() {
                                        show_group = Some(group.clone());
                                    }
                                    ui.label(egui::RichText::new(format!("{} items", count)).small().weak());
                                }
                            }
                            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                if ui.button("🗑").on_hover_text("Delete folder and its items").clicked() {
                                    self.pending_group_delete = Some(group.clone());
                                }
                                if ui.button("✏").on_hover_text("Rename").clicked() {
                                    self.editing_group = Some((group.clone(), group.clone()));
                                }
                            });
                        });
                    }
                });

                ui.separator();
                if ui.button("Close").clicked() {
                    close = true;
                }
            });

        if create {
            self.create_group();
        }
        if let Some((old, new)) = rename {
            self.editing_group = None;
            self.rename_group(&old, &new);
        }
        if let Some(group) = show_group {
            self.criteria.group = GroupFilter::Named(group.clone());
            self.reset_page();
            self.show_group_manager = false;
            self.group_search.clear();
            self.status_message = format!("Showing folder: {}", group);
        }
        if close {
            self.show_group_manager = false;
            self.editing_group = None;
        }
    }

    fn show_group_action_window(&mut self, ctx: &egui::Context) {
        let Some(pending) = &mut self.group_action else {
            return;
        };
        let groups = self.collection.all_groups();
        let title = match pending.mode {
            GroupMode::Move => "📂 Move to Group",
            GroupMode::Copy => "📋 Copy to Group",
        };
        let mut target: Option<String> = None;
        let mut cancel = false;

        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(format!("{} item(s)", pending.ids.len()));
                ui.horizontal(|ui| {
                    ui.add(egui::TextEdit::singleline(&mut pending.input)
                        .hint_text("New or existing group")
                        .desired_width(220.0));
                    if ui.button("✔ Apply").clicked() {
                        target = Some(pending.input.clone());
                    }
                });
                ui.separator();
                egui::ScrollArea::vertical().max_height(260.0).show(ui, |ui| {
                    for group in &groups {
                        if ui.button(format!("📁 {}", group)).clicked() {
                            target = Some(group.clone());
                        }
                    }
                });
                ui.separator();
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
            });

        if cancel {
            self.group_action = None;
            return;
        }
        if let Some(group) = target {
            if let Some(action) = self.group_action.take() {
                if !self.apply_group_action(action.mode, action.ids.clone(), &group) {
                    // Keep the dialog open so the name can be corrected
                    self.group_action = Some(action);
                }
            }
        }
    }

    fn show_delete_confirm(&mut self, ctx: &egui::Context) {
        let Some(group) = self.pending_group_delete.clone() else {
            return;
        };
        let count = self.collection.group_counts().get(&group).copied().unwrap_or(0);
        let mut confirmed = false;
        let mut cancel = false;

        egui::Window::new("⚠ Delete Folder")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.add_space(6.0);
                ui.label(egui::RichText::new(format!(
                    "Delete the folder \"{}\" and all its {} items?",
                    group, count
                )).strong());
                ui.label(egui::RichText::new("This cannot be undone.").color(egui::Color32::from_rgb(200, 80, 80)));
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        cancel = true;
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let delete = egui::RichText::new("Delete").color(egui::Color32::from_rgb(200, 80, 80));
                        if ui.button(delete).clicked() {
                            confirmed = true;
                        }
                    });
                });
            });

        if confirmed {
            self.pending_group_delete = None;
            self.delete_group(&group);
        } else if cancel {
            self.pending_group_delete = None;
        }
    }

    fn show_toast(&self, ctx: &egui::Context) {
        let Some(toast) = &self.toast else {
            return;
        };
        let (icon, color) = match toast.kind {
            ToastKind::Success => ("✔", egui::Color32::from_rgb(16, 185, 129)),
            ToastKind::Error => ("⚠", egui::Color32::from_rgb(225, 29, 72)),
        };
        egui::Area::new(egui::Id::new("toast"))
            .anchor(egui::Align2::RIGHT_BOTTOM, [-16.0, -40.0])
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.label(egui::RichText::new(format!("{} {}", icon, toast.message)).color(color).strong());
                });
            });
    }
}
