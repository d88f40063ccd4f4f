use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Instant;

use eframe::egui::{self, Button, CentralPanel, RichText, ScrollArea, Slider, Spinner, TextEdit};
use eframe::{App, CreationContext, Frame, NativeOptions};
use rfd::FileDialog;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use qa_client::{ClientConfig, ClientError, HttpBackend};
use qa_model::{FtsHit, SemanticHit, SourceRef};
use qa_service::{Intent, Outcome, QaService, Request, RequestKind, SessionState, Snippet, Status, Threshold, Ticket};

fn main() -> eframe::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let options = NativeOptions::default();
    eframe::run_native(
        "PDF QA",
        options,
        Box::new(|cc| Box::new(AppState::new(cc))),
    )
}

/// A request running on a worker thread.
struct PendingTask {
    rx: Receiver<Outcome>,
    ticket: Ticket,
    started: Instant,
}

struct AppState {
    ctx: egui::Context,

    // Connection
    backend_url: String,
    timeout: Option<std::time::Duration>,
    backend_error: String,
    svc: Option<QaService>,

    // Inputs (mirrored into the session on change)
    fts_query: String,
    semantic_query: String,
    question: String,
    threshold: f32,

    tasks: Vec<PendingTask>,
    // Snapshot of the session taken at the start of each frame
    view: SessionState,
    last_elapsed: Option<(RequestKind, f32)>,
}

/// Connection settings persisted via Load/Save Config.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GuiConfig {
    backend_url: String,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

impl AppState {
    fn new(cc: &CreationContext<'_>) -> Self {
        Self::with_context(cc.egui_ctx.clone(), ClientConfig::from_env(None))
    }

    fn with_context(ctx: egui::Context, cfg: ClientConfig) -> Self {
        let mut app = Self {
            ctx,
            backend_url: cfg.base_url.clone(),
            timeout: cfg.timeout,
            backend_error: String::new(),
            svc: None,
            fts_query: String::new(),
            semantic_query: String::new(),
            question: String::new(),
            threshold: Threshold::default().value(),
            tasks: Vec::new(),
            view: SessionState::new(),
            last_elapsed: None,
        };
        app.apply_backend_url();
        app
    }

    fn apply_backend_url(&mut self) {
        let cfg = ClientConfig { base_url: self.backend_url.clone(), timeout: self.timeout }
            .with_base_url(self.backend_url.trim());
        match HttpBackend::new(cfg) {
            Ok(backend) => {
                info!(base_url = backend.config().base_url.as_str(), "backend applied");
                self.backend_url = backend.config().base_url.clone();
                let backend = Arc::new(backend);
                match &mut self.svc {
                    Some(svc) => svc.replace_backend(backend),
                    None => self.svc = Some(QaService::new(backend)),
                }
                self.backend_error.clear();
            }
            Err(e) => {
                self.backend_error = e.to_string();
            }
        }
    }

    /// Cards stay disabled until a usable backend URL has been applied.
    fn is_connected(&self) -> bool {
        self.svc.is_some()
    }

    fn update_session(&mut self, intent: Intent) {
        let Some(svc) = &self.svc else { return; };
        let request = svc.update(intent);
        self.view = svc.state();
        if let Some(request) = request {
            self.spawn_request(request);
        }
    }

    fn spawn_request(&mut self, request: Request) {
        let Some(svc) = &self.svc else { return; };
        let backend = svc.backend();
        let (tx, rx) = mpsc::channel();
        let ctx = self.ctx.clone();
        let ticket = request.ticket();
        std::thread::spawn(move || {
            let outcome = request.execute(backend.as_ref());
            let _ = tx.send(outcome);
            ctx.request_repaint();
        });
        self.tasks.push(PendingTask { rx, ticket, started: Instant::now() });
    }

    fn poll_tasks(&mut self) {
        let Some(svc) = &self.svc else { return; };
        let mut still_running = Vec::with_capacity(self.tasks.len());
        for task in self.tasks.drain(..) {
            match task.rx.try_recv() {
                Ok(outcome) => {
                    svc.complete(outcome);
                    self.last_elapsed = Some((task.ticket.kind, task.started.elapsed().as_secs_f32()));
                }
                Err(TryRecvError::Empty) => still_running.push(task),
                Err(TryRecvError::Disconnected) => {
                    warn!(ticket = ?task.ticket, "worker disconnected");
                    svc.complete(worker_lost(task.ticket));
                }
            }
        }
        self.tasks = still_running;
        self.view = svc.state();
    }

    fn open_pdf(&self, page: u32, highlight: &str) {
        let Some(svc) = &self.svc else { return; };
        if let Some(url) = svc.pdf_link(page, highlight) {
            info!(%url, "opening pdf viewer");
            self.ctx.open_url(egui::OpenUrl::new_tab(url));
        }
    }

    fn ui_connection(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Backend");
            let resp = ui.add(TextEdit::singleline(&mut self.backend_url).desired_width(320.0));
            let commit_enter = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Apply").clicked() || commit_enter {
                self.apply_backend_url();
            }
            ui.separator();
            if ui.button("Load Config").clicked() { self.load_config_via_dialog(); }
            if ui.button("Save Config").clicked() { self.save_config_via_dialog(); }
            if !self.tasks.is_empty() { ui.add(Spinner::new()); }
        });
        if !self.backend_error.is_empty() {
            ui.label(RichText::new(&self.backend_error).color(ui.visuals().warn_fg_color));
        }
    }

    fn ui_upload(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.horizontal(|ui| {
                if ui.button("Choose PDF").clicked() {
                    if let Some(p) = FileDialog::new().add_filter("PDF", &["pdf"]).pick_file() {
                        self.update_session(Intent::SelectFile(p));
                    }
                }
                let file_label = self
                    .view
                    .file
                    .as_ref()
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| String::from("no file chosen"));
                ui.label(file_label);
                let busy = self.view.is_pending(RequestKind::Index);
                if ui.add_enabled(!busy, Button::new("Upload & Index")).clicked() {
                    self.update_session(Intent::SubmitIndex);
                }
                ui.label(RichText::new(status_text(&self.view)).strong());
            });
            let db = if self.view.db_path.is_empty() { "none" } else { self.view.db_path.as_str() };
            let meta = match self.view.lines_indexed {
                Some(n) => format!("DB: {db} ({n} lines)"),
                None => format!("DB: {db}"),
            };
            ui.label(RichText::new(meta).weak());
        });
    }

    fn ui_fts(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.heading("FTS Keyword Search");
            ui.horizontal(|ui| {
                let resp = ui.add(
                    TextEdit::singleline(&mut self.fts_query)
                        .hint_text("Search exact words")
                        .desired_width(400.0)
                        .id_source("fts_query"),
                );
                if resp.changed() {
                    self.update_session(Intent::SetFtsQuery(self.fts_query.clone()));
                }
                let enter = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Search").clicked() || enter {
                    self.update_session(Intent::SubmitFts);
                }
            });
            let mut clicked: Option<u32> = None;
            for (i, hit) in self.view.fts_results.iter().enumerate() {
                if fts_row(ui, i, hit) {
                    clicked = Some(hit.page);
                }
            }
            if let Some(page) = clicked {
                self.open_pdf(page, &self.view.fts_query);
            }
        });
    }

    fn ui_semantic(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.heading("Semantic Search");
            ui.horizontal(|ui| {
                let resp = ui.add(
                    TextEdit::singleline(&mut self.semantic_query)
                        .hint_text("Search by meaning")
                        .desired_width(400.0)
                        .id_source("semantic_query"),
                );
                if resp.changed() {
                    self.update_session(Intent::SetSemanticQuery(self.semantic_query.clone()));
                }
                let enter = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Semantic Search").clicked() || enter {
                    self.update_session(Intent::SubmitSemantic);
                }
            });
            let mut clicked: Option<u32> = None;
            for (i, hit) in self.view.semantic_results.iter().enumerate() {
                if semantic_row(ui, i, hit) {
                    clicked = Some(hit.page);
                }
            }
            if let Some(page) = clicked {
                self.open_pdf(page, &self.view.semantic_query);
            }
        });
    }

    fn ui_ask(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.heading("Ask a Question");
            ui.horizontal(|ui| {
                let resp = ui.add(
                    TextEdit::singleline(&mut self.question)
                        .hint_text("Ask about the document")
                        .desired_width(400.0)
                        .id_source("question"),
                );
                if resp.changed() {
                    self.update_session(Intent::SetQuestion(self.question.clone()));
                }
                let enter = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                let busy = self.view.is_pending(RequestKind::Ask);
                if ui.add_enabled(!busy, Button::new("Ask")).clicked() || (enter && !busy) {
                    self.update_session(Intent::SubmitAsk);
                }
            });
            ui.horizontal(|ui| {
                ui.label("Confidence threshold:");
                ui.label(RichText::new(self.view.threshold.to_string()).strong());
                let (min, max) = (Threshold::min().value(), Threshold::max().value());
                let slider = Slider::new(&mut self.threshold, min..=max)
                    .step_by(f64::from(qa_model::THRESHOLD_RANGE.step))
                    .show_value(false);
                if ui.add(slider).changed() {
                    self.update_session(Intent::SetThreshold(self.threshold));
                    self.threshold = self.view.threshold.value();
                }
            });

            if !self.view.answer.is_empty() {
                ui.separator();
                ScrollArea::vertical().max_height(220.0).id_source("answer_scroll").show(ui, |ui| {
                    ui.label(&self.view.answer);
                });
            }

            if !self.view.sources.is_empty() {
                ui.separator();
                ui.label(RichText::new("Sources").strong());
                let mut clicked: Option<u32> = None;
                for src in &self.view.sources {
                    if source_row(ui, src) {
                        clicked = Some(src.page);
                    }
                }
                if let Some(page) = clicked {
                    self.open_pdf(page, "");
                }
            }
        });
    }

    fn load_config_via_dialog(&mut self) {
        if let Some(path) = FileDialog::new().add_filter("JSON", &["json"]).pick_file() {
            match std::fs::read_to_string(&path) {
                Ok(s) => match serde_json::from_str::<GuiConfig>(&s) {
                    Ok(cfg) => {
                        self.backend_url = cfg.backend_url;
                        if let Some(secs) = cfg.timeout_secs {
                            self.timeout = (secs > 0).then(|| std::time::Duration::from_secs(secs));
                        }
                        self.apply_backend_url();
                        info!(path = %path.display(), "loaded config");
                    }
                    Err(e) => self.backend_error = format!("Load config failed: {e}"),
                },
                Err(e) => self.backend_error = format!("Load config failed: {e}"),
            }
        }
    }

    fn save_config_via_dialog(&mut self) {
        let dialog = FileDialog::new().add_filter("JSON", &["json"]).set_file_name("qa-gui.json");
        if let Some(path) = dialog.save_file() {
            let cfg = GuiConfig {
                backend_url: self.backend_url.trim().to_string(),
                timeout_secs: Some(self.timeout.map(|t| t.as_secs()).unwrap_or(0)),
            };
            let written = serde_json::to_string_pretty(&cfg)
                .map_err(|e| e.to_string())
                .and_then(|body| std::fs::write(&path, body).map_err(|e| e.to_string()));
            match written {
                Ok(()) => info!(path = %path.display(), "saved config"),
                Err(e) => self.backend_error = format!("Save config failed: {e}"),
            }
        }
    }
}

impl App for AppState {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.poll_tasks();
        CentralPanel::default().show(ctx, |ui| {
            ui.heading("PDF QA");
            self.ui_connection(ui);
            ui.separator();
            if !self.is_connected() {
                ui.label(RichText::new("Apply a valid backend URL to start.").color(ui.visuals().warn_fg_color));
            }
            let connected = self.is_connected();
            ScrollArea::vertical().id_source("cards").show(ui, |ui| {
                ui.add_enabled_ui(connected, |ui| {
                    self.ui_upload(ui);
                    ui.add_space(8.0);
                    self.ui_fts(ui);
                    ui.add_space(8.0);
                    self.ui_semantic(ui);
                    ui.add_space(8.0);
                    self.ui_ask(ui);
                });
            });
            ui.separator();
            if let Some((kind, secs)) = self.last_elapsed {
                ui.label(RichText::new(format!("Last {kind:?} request took {secs:.1}s")).weak());
            }
        });
        if !self.tasks.is_empty() {
            ctx.request_repaint_after(std::time::Duration::from_millis(200));
        }
    }
}

fn status_text(view: &SessionState) -> String {
    match (&view.status, &view.last_error) {
        (Status::Error, Some(msg)) => format!("Error: {msg}"),
        (status, _) => status.label().to_string(),
    }
}

/// Draws one keyword hit; returns true when clicked.
fn fts_row(ui: &mut egui::Ui, index: usize, hit: &FtsHit) -> bool {
    let snippet = Snippet::parse(&hit.snippet);
    let resp = ui
        .push_id(("fts", index), |ui| {
            ui.group(|ui| {
                ui.label(RichText::new(format!("Page {}, Line {}", hit.page, hit.line)).weak());
                ui.horizontal_wrapped(|ui| {
                    ui.spacing_mut().item_spacing.x = 0.0;
                    let mark_bg = ui.visuals().selection.bg_fill;
                    for span in snippet.spans() {
                        if span.highlighted {
                            ui.label(RichText::new(&span.text).strong().background_color(mark_bg));
                        } else {
                            ui.label(&span.text);
                        }
                    }
                });
            })
            .response
        })
        .inner;
    clickable(resp).clicked()
}

fn semantic_row(ui: &mut egui::Ui, index: usize, hit: &SemanticHit) -> bool {
    let resp = ui
        .push_id(("semantic", index), |ui| {
            ui.group(|ui| {
                ui.label(
                    RichText::new(format!("Score {:.3} — Page {}, Line {}", hit.score, hit.page, hit.line)).weak(),
                );
                ui.label(&hit.text);
            })
            .response
        })
        .inner;
    clickable(resp).clicked()
}

fn source_row(ui: &mut egui::Ui, src: &SourceRef) -> bool {
    ui.link(format!("Page {}, Line {} (score {})", src.page, src.line, src.score))
        .clicked()
}

fn clickable(resp: egui::Response) -> egui::Response {
    resp.interact(egui::Sense::click())
        .on_hover_cursor(egui::CursorIcon::PointingHand)
}

/// Outcome used when a worker thread died without reporting back.
fn worker_lost(ticket: Ticket) -> Outcome {
    let err = ClientError::Transport {
        endpoint: String::from("worker"),
        message: String::from("worker thread exited without a result"),
    };
    match ticket.kind {
        RequestKind::Index => Outcome::Indexed { ticket, result: Err(err) },
        RequestKind::Fts => Outcome::Fts { ticket, result: Err(err) },
        RequestKind::Semantic => Outcome::Semantic { ticket, result: Err(err) },
        RequestKind::Ask => Outcome::Answered { ticket, result: Err(err) },
    }
}
