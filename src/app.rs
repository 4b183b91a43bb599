// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! The app owns the open project, the image folder and its approval
//! status, and at most one running work mode. It turns UI actions into
//! editor calls and file operations, polls the background image loader
//! and detector, and drives the frame-polled timers.

use crate::config::AppConfig;
use crate::detector::{self, DetectorWorker};
use crate::editor::machine::PressOutcome;
use crate::editor::selection::hit_test;
use crate::editor::Editor;
use crate::io::activity::ActivityLog;
use crate::io::export::export_approved;
use crate::io::labels::{load_labels, save_labels};
use crate::io::media::{load_image, LoadedImage};
use crate::io::serialization::{load_session, save_session, EditorOptions, SessionRecord};
use crate::models::annotation::{BoxId, BoxStore};
use crate::models::approval::{ApprovalState, ApprovalStatus, DashboardStats, WorkMode};
use crate::models::history::History;
use crate::models::progress::Progress;
use crate::models::project::{ImageFolder, Project};
use crate::ui::canvas::{self, CanvasAction, CanvasView};
use crate::ui::class_prompt::{ClassPrompt, PromptResult};
use crate::ui::properties::{self, PropertiesAction, PropertiesView};
use crate::ui::start_screen::{self, StartAction, StartView};
use crate::ui::toolbar::{self, ToolbarAction, ToolbarState};
use crate::ui::options;
use crate::util::geometry::CoordinateMapper;
use crate::util::timer::{RepeatingTimer, Timer};
use std::sync::mpsc::{channel, Receiver};
use std::time::{Duration, Instant};

/// Enter is ignored this long after a class prompt confirms.
const ENTER_GUARD: Duration = Duration::from_millis(500);
const CELEBRATION: Duration = Duration::from_secs(4);

const DIGIT_KEYS: [egui::Key; 10] = [
    egui::Key::Num0,
    egui::Key::Num1,
    egui::Key::Num2,
    egui::Key::Num3,
    egui::Key::Num4,
    egui::Key::Num5,
    egui::Key::Num6,
    egui::Key::Num7,
    egui::Key::Num8,
    egui::Key::Num9,
];

/// Keyboard commands of the working view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shortcut {
    Next,
    Prev,
    Save,
    SaveAndNext,
    Undo,
    Redo,
    Cancel,
    Delete,
    Class(usize),
}

fn read_shortcuts(i: &egui::InputState) -> Vec<Shortcut> {
    let mut shortcuts = Vec::new();
    let command = i.modifiers.command;

    if i.key_pressed(egui::Key::ArrowRight) {
        shortcuts.push(Shortcut::Next);
    }
    if i.key_pressed(egui::Key::ArrowLeft) {
        shortcuts.push(Shortcut::Prev);
    }
    if command && i.key_pressed(egui::Key::S) {
        shortcuts.push(Shortcut::Save);
    }
    if command && i.key_pressed(egui::Key::Z) && !i.modifiers.shift {
        shortcuts.push(Shortcut::Undo);
    }
    let redo_chord =
        i.key_pressed(egui::Key::Y) || (i.modifiers.shift && i.key_pressed(egui::Key::Z));
    if command && redo_chord {
        shortcuts.push(Shortcut::Redo);
    }
    if i.key_pressed(egui::Key::Escape) {
        shortcuts.push(Shortcut::Cancel);
    }
    if i.key_pressed(egui::Key::Delete) {
        shortcuts.push(Shortcut::Delete);
    }
    if i.key_pressed(egui::Key::Enter) {
        shortcuts.push(Shortcut::SaveAndNext);
    }
    if !command {
        for (digit, key) in DIGIT_KEYS.iter().enumerate() {
            if i.key_pressed(*key) {
                shortcuts.push(Shortcut::Class(digit));
            }
        }
    }
    shortcuts
}

/// Result of background image loading.
struct LoadedFrame {
    filename: String,
    image: LoadedImage,
}

/// The image currently on the canvas.
struct CurrentImage {
    filename: String,
    width: u32,
    height: u32,
    texture: egui::TextureHandle,
}

/// Boxes and history to put back once the resumed image has loaded.
struct PendingRestore {
    filename: String,
    boxes: BoxStore,
    history: History,
}

/// A saved session waiting for the operator's answer.
struct PendingResume {
    mode: WorkMode,
    images: Vec<String>,
    record: SessionRecord,
}

/// A running work mode.
struct WorkSession {
    mode: WorkMode,
    images: Vec<String>,
    index: usize,
    editor: Editor,
    image: Option<CurrentImage>,
    progress: Progress,
    started: Instant,
    /// Boxes changed since the last save or load.
    dirty: bool,
}

impl WorkSession {
    fn current_filename(&self) -> Option<&str> {
        self.images.get(self.index).map(String::as_str)
    }

    /// Loaded image, only if it is the one at the current index.
    fn current_image(&self) -> Option<&CurrentImage> {
        self.image
            .as_ref()
            .filter(|image| Some(image.filename.as_str()) == self.current_filename())
    }
}

/// Main application state.
pub struct LabelbenchApp {
    config: AppConfig,
    project: Option<Project>,
    folder: Option<ImageFolder>,
    status: ApprovalStatus,
    stats: DashboardStats,
    image_bytes: u64,
    label_bytes: u64,
    options: EditorOptions,
    session: Option<WorkSession>,
    log: ActivityLog,
    detector: DetectorWorker,

    /// Receiver for background image loading
    image_loader: Option<Receiver<Result<LoadedFrame, String>>>,
    loading_message: Option<String>,

    pending_restore: Option<PendingRestore>,
    pending_resume: Option<PendingResume>,
    prompt: Option<ClassPrompt>,
    last_class: usize,

    enter_guard: Timer,
    auto_save: RepeatingTimer,
    resize_debounce: Timer,
    celebration: Timer,
    canvas_size: egui::Vec2,

    show_options: bool,
    /// Operator-facing notice on the start screen.
    message: Option<String>,
}

impl LabelbenchApp {
    pub fn new(config: AppConfig) -> Self {
        let detector = DetectorWorker::new(detector::from_config(config.detector.as_ref()));
        let auto_save = RepeatingTimer::new(config.auto_save_interval());
        Self {
            config,
            project: None,
            folder: None,
            status: ApprovalStatus::new(),
            stats: DashboardStats::default(),
            image_bytes: 0,
            label_bytes: 0,
            options: EditorOptions::default(),
            session: None,
            log: ActivityLog::new(),
            detector,
            image_loader: None,
            loading_message: None,
            pending_restore: None,
            pending_resume: None,
            prompt: None,
            last_class: 0,
            enter_guard: Timer::new(),
            auto_save,
            resize_debounce: Timer::new(),
            celebration: Timer::new(),
            canvas_size: egui::Vec2::ZERO,
            show_options: false,
            message: None,
        }
    }

    fn class_count(&self) -> usize {
        self.project.as_ref().map_or(0, |p| p.class_names.len())
    }

    fn class_name(&self, class_id: usize) -> &str {
        self.project.as_ref().map_or("?", |p| p.class_name(class_id))
    }

    fn pick_project(&mut self) {
        let Some(dir) = rfd::FileDialog::new()
            .set_title("Choose project folder")
            .pick_folder()
        else {
            return;
        };
        match Project::open(&dir) {
            Ok(project) => {
                self.project = Some(project);
                self.message = None;
                self.load_status();
            }
            Err(e) => {
                log::error!("Failed to open project {}: {}", dir.display(), e);
                self.message = Some(e.to_string());
            }
        }
    }

    fn pick_images(&mut self) {
        let Some(dir) = rfd::FileDialog::new()
            .set_title("Choose image folder")
            .pick_folder()
        else {
            return;
        };
        match ImageFolder::open(&dir) {
            Ok(folder) => {
                self.folder = Some(folder);
                self.message = None;
                self.load_status();
            }
            Err(e) => {
                log::error!("Failed to open image folder {}: {:#}", dir.display(), e);
                self.message = Some(format!("Cannot open {}: {}", dir.display(), e));
            }
        }
    }

    /// Read the approval sidecar of the current project/folder pair.
    fn load_status(&mut self) {
        self.status = match (&self.project, &self.folder) {
            (Some(project), Some(folder)) => {
                ApprovalStatus::load(&project.approval_path(folder)).unwrap_or_else(|e| {
                    log::error!("{:#}", e);
                    ApprovalStatus::new()
                })
            }
            _ => ApprovalStatus::new(),
        };
        self.refresh_dashboard();
    }

    fn refresh_dashboard(&mut self) {
        let Some(folder) = &self.folder else { return };
        self.stats = DashboardStats::collect(&folder.images, &self.status, |name| {
            folder.has_label(name)
        });
        self.image_bytes = folder.total_image_bytes();
        self.label_bytes = folder.total_label_bytes();
    }

    fn save_status(&self) {
        if let (Some(project), Some(folder)) = (&self.project, &self.folder) {
            if let Err(e) = self.status.save(&project.approval_path(folder)) {
                log::error!("{:#}", e);
            }
        }
    }

    fn start_mode(&mut self, mode: WorkMode) {
        let (Some(project), Some(folder)) = (&self.project, &self.folder) else {
            return;
        };
        let images = match mode.target_images(&folder.images, &self.status, |name| {
            folder.has_label(name)
        }) {
            Ok(images) => images,
            Err(e) => {
                log::warn!("{}", e);
                self.message = Some(e.to_string());
                return;
            }
        };

        let session_path = project.session_path(folder);
        if session_path.exists() {
            match load_session(&session_path) {
                Ok(record) if record.image_dir == folder.image_dir => {
                    self.pending_resume = Some(PendingResume {
                        mode,
                        images,
                        record,
                    });
                    return;
                }
                Ok(_) => log::warn!("Session {} belongs to another folder", session_path.display()),
                Err(e) => log::warn!("Ignoring session: {:#}", e),
            }
        }
        self.begin_mode(mode, images, 0);
    }

    /// Apply the operator's answer to the resume prompt.
    fn resume(&mut self, accept: bool) {
        let Some(PendingResume {
            mode,
            images,
            record,
        }) = self.pending_resume.take()
        else {
            return;
        };
        if !accept {
            self.begin_mode(mode, images, 0);
            return;
        }

        let index = record.resume_index(images.len(), mode);
        if self.status.is_empty() {
            self.status = record.approval_status.clone();
        }
        self.options = record.options.clone().clamped();

        let resumed_here = images
            .get(index)
            .is_some_and(|name| record.current_image.as_deref() == Some(name.as_str()));
        if mode.is_editing() && resumed_here {
            self.pending_restore = Some(PendingRestore {
                filename: images[index].clone(),
                boxes: record.boxes,
                history: History::from_stacks(record.undo_stack, record.redo_stack),
            });
        }
        self.begin_mode(mode, images, index);
    }

    fn begin_mode(&mut self, mode: WorkMode, images: Vec<String>, index: usize) {
        let (Some(project), Some(folder)) = (&self.project, &self.folder) else {
            return;
        };
        self.log.open_file(&project.dir, &folder.name, mode.name());
        self.log.record(format!(
            "Started {} mode: {} images, starting at {}",
            mode,
            images.len(),
            index + 1
        ));

        let now = Instant::now();
        self.session = Some(WorkSession {
            mode,
            progress: Progress::new(images.len(), self.options.target_count),
            images,
            index,
            editor: Editor::new(mode, project.class_names.len()),
            image: None,
            started: now,
            dirty: false,
        });
        self.message = None;
        self.auto_save.start(now);
        self.update_progress();
        self.load_current();
    }

    fn finish_mode(&mut self) {
        if self.session.as_ref().is_some_and(|s| s.dirty) {
            self.save_annotations();
        }
        self.save_session(true);
        if let Some(session) = self.session.take() {
            self.log.record(format!("Finished {} mode", session.mode));
        }
        self.auto_save.stop();
        self.resize_debounce.cancel();
        self.celebration.cancel();
        self.log.close_file();
        self.prompt = None;
        self.pending_restore = None;
        self.image_loader = None;
        self.loading_message = None;
        self.refresh_dashboard();
    }

    /// Start loading the image at the current index (asynchronously).
    fn load_current(&mut self) {
        let (Some(session), Some(folder)) = (self.session.as_mut(), &self.folder) else {
            return;
        };
        let Some(filename) = session.current_filename().map(str::to_string) else {
            return;
        };
        session.editor.cancel();
        session.dirty = false;
        self.prompt = None;

        let path = folder.image_path(&filename);
        let (sender, receiver) = channel();
        self.image_loader = Some(receiver);
        self.loading_message = Some(format!("Loading {}...", filename));

        // Spawn background thread for loading
        std::thread::spawn(move || {
            let result = load_image(&path)
                .map(|image| LoadedFrame { filename, image })
                .map_err(|e| format!("{:#}", e));
            let _ = sender.send(result);
        });
    }

    fn on_image_loaded(&mut self, ctx: &egui::Context, frame: LoadedFrame) {
        let (Some(session), Some(folder)) = (self.session.as_mut(), &self.folder) else {
            return;
        };
        if session.current_filename() != Some(frame.filename.as_str()) {
            log::debug!("Dropping stale image {}", frame.filename);
            return;
        }

        let LoadedFrame { filename, image } = frame;
        let class_count = self.project.as_ref().map_or(0, |p| p.class_names.len());
        let size = [image.width as usize, image.height as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &image.pixels);
        let texture = ctx.load_texture(&filename, color_image, egui::TextureOptions::LINEAR);

        let restore = self
            .pending_restore
            .take()
            .filter(|restore| restore.filename == filename);
        if let Some(restore) = restore {
            self.log.record(format!(
                "Resumed {} with {} boxes",
                filename,
                restore.boxes.len()
            ));
            session.editor.restore(restore.boxes, restore.history);
        } else {
            let label_path = folder.label_path(&filename);
            let boxes = if label_path.exists() {
                load_labels(&label_path, image.width, image.height, class_count)
                    .unwrap_or_else(|e| {
                        log::error!("{:#}", e);
                        self.log.record(format!("Could not read labels of {}", filename));
                        BoxStore::new()
                    })
            } else {
                if session.mode == WorkMode::Annotation {
                    self.detector
                        .request(filename.clone(), folder.image_path(&filename));
                }
                BoxStore::new()
            };
            session.editor.load(boxes);
        }

        session.editor.set_viewport(CoordinateMapper::fit(
            self.canvas_size.x,
            self.canvas_size.y,
            image.width,
            image.height,
        ));
        log::info!("Loaded image: {} ({}x{})", filename, image.width, image.height);
        session.image = Some(CurrentImage {
            filename,
            width: image.width,
            height: image.height,
            texture,
        });
    }

    fn poll_loader(&mut self, ctx: &egui::Context) {
        let Some(receiver) = &self.image_loader else { return };
        let Ok(result) = receiver.try_recv() else { return };
        self.image_loader = None;
        self.loading_message = None;

        match result {
            Ok(frame) => self.on_image_loaded(ctx, frame),
            Err(e) => {
                log::error!("Failed to load image: {}", e);
                self.log.record(format!("Failed to load image: {}", e));
            }
        }
    }

    fn poll_detector(&mut self) {
        let Some(result) = self.detector.poll() else { return };
        let Some(session) = self.session.as_mut() else { return };
        if session.current_image().map(|image| image.filename.as_str())
            != Some(result.filename.as_str())
        {
            log::debug!("Dropping detections for {}", result.filename);
            return;
        }

        match result.detections {
            Ok(detections) if detections.is_empty() => {}
            Ok(detections) => {
                let before = session.editor.boxes().len();
                let applied = session
                    .editor
                    .bootstrap(detections.into_iter().map(|d| (d.rect, d.class_id)));
                if applied {
                    let added = session.editor.boxes().len() - before;
                    self.log.record(format!(
                        "Detector proposed {} boxes for {}",
                        added, result.filename
                    ));
                } else {
                    log::info!("Ignoring detections for {}: already edited", result.filename);
                }
            }
            Err(e) => {
                log::error!("Detector failed on {}: {:#}", result.filename, e);
                self.log.record(format!("Detector failed on {}", result.filename));
            }
        }
    }

    fn poll_timers(&mut self, ctx: &egui::Context) {
        let now = Instant::now();
        self.enter_guard.fire_if_due(now);
        self.celebration.fire_if_due(now);
        if self.auto_save.poll(now) {
            self.save_session(false);
        }
        if self.resize_debounce.fire_if_due(now) && !self.apply_viewport() {
            // Still dragging; try again later.
            self.resize_debounce.schedule(now, self.config.resize_debounce());
        }

        let next = [
            self.enter_guard.remaining(now),
            self.auto_save.remaining(now),
            self.resize_debounce.remaining(now),
            self.celebration.remaining(now),
        ]
        .into_iter()
        .flatten()
        .min();
        if let Some(wait) = next {
            ctx.request_repaint_after(wait);
        }
        let animating = self.celebration.is_pending()
            || self.loading_message.is_some()
            || self.detector.is_busy();
        if animating {
            ctx.request_repaint();
        }
        if self.session.is_some() {
            // Elapsed-time display.
            ctx.request_repaint_after(Duration::from_secs(1));
        }
    }

    /// Refit the image into the canvas. False if the editor is busy.
    fn apply_viewport(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else { return true };
        let Some(image) = session.current_image() else { return true };
        let mapper = CoordinateMapper::fit(
            self.canvas_size.x,
            self.canvas_size.y,
            image.width,
            image.height,
        );
        session.editor.set_viewport(mapper)
    }

    fn on_canvas_resized(&mut self, size: egui::Vec2) {
        if size == self.canvas_size {
            return;
        }
        self.canvas_size = size;
        let unfitted = self
            .session
            .as_ref()
            .is_some_and(|s| s.current_image().is_some() && s.editor.mapper().is_none());
        if unfitted {
            self.apply_viewport();
        } else {
            self.resize_debounce
                .schedule(Instant::now(), self.config.resize_debounce());
        }
    }

    fn navigate(&mut self, forward: bool) {
        if self.session.as_ref().is_some_and(|s| s.dirty && s.mode.is_editing()) {
            self.save_annotations();
        }
        let Some(session) = self.session.as_mut() else { return };
        if forward {
            if session.index + 1 >= session.images.len() {
                self.log.record("Last image reached");
                return;
            }
            session.index += 1;
        } else {
            if session.index == 0 {
                self.log.record("Already at the first image");
                return;
            }
            session.index -= 1;
        }
        self.load_current();
    }

    /// Write the current image's label file. Returns true on success.
    fn save_annotations(&mut self) -> bool {
        let (Some(session), Some(folder)) = (self.session.as_mut(), &self.folder) else {
            return false;
        };
        if !session.mode.is_editing() {
            return false;
        }
        let Some(image) = session.current_image() else {
            return false;
        };
        let filename = image.filename.clone();
        let path = folder.label_path(&filename);
        let boxes = session.editor.boxes();

        match save_labels(&path, boxes, image.width, image.height) {
            Ok(change) => {
                self.label_bytes = change.apply(self.label_bytes);
                self.log.record(format!("Saved {} ({} boxes)", filename, boxes.len()));
                session.dirty = false;
            }
            Err(e) => {
                log::error!("{:#}", e);
                self.log.record(format!("Failed to save {}", filename));
                return false;
            }
        }

        let approval_path = self.project.as_ref().map(|p| p.approval_path(folder));
        if let Some(approval_path) = approval_path {
            match self.status.record_save(&filename, &approval_path) {
                Ok(true) => self.log.record(format!("{}: rejected -> fixed", filename)),
                Ok(false) => {}
                Err(e) => log::error!("{:#}", e),
            }
        }
        self.update_progress();
        true
    }

    fn set_approval(&mut self, state: ApprovalState) {
        let Some(session) = &self.session else { return };
        if !session.mode.is_review() {
            return;
        }
        let Some(image) = session.current_image() else { return };
        let filename = image.filename.clone();

        self.status.set(&filename, state);
        self.save_status();
        self.log.record(format!("{}: {}", filename, ApprovalState::label(Some(state))));
        self.save_session(false);
        self.update_progress();
        self.navigate(true);
    }

    /// Persist the session. Silent unless `explicit`.
    fn save_session(&mut self, explicit: bool) {
        let (Some(project), Some(folder), Some(session)) =
            (&self.project, &self.folder, &self.session)
        else {
            return;
        };
        let history = session.editor.history();
        let record = SessionRecord {
            project_dir: project.dir.clone(),
            image_dir: folder.image_dir.clone(),
            labels_dir: folder.labels_dir.clone(),
            current_image_index: session.index,
            current_image: session.current_filename().map(str::to_string),
            boxes: session.editor.boxes().clone(),
            undo_stack: history.undo_stack().to_vec(),
            redo_stack: history.redo_stack().to_vec(),
            approval_status: self.status.clone(),
            options: self.options.clone(),
        };
        let path = project.session_path(folder);
        match save_session(&record, &path) {
            Ok(()) if explicit => self.log.record("Session saved"),
            Ok(()) => log::debug!("Auto-saved session to {}", path.display()),
            Err(e) => log::error!("{:#}", e),
        }
    }

    fn update_progress(&mut self) {
        let (Some(session), Some(folder)) = (self.session.as_mut(), &self.folder) else {
            return;
        };
        let mode = session.mode;
        let done = session
            .images
            .iter()
            .filter(|name| mode.is_done(self.status.get(name), folder.has_label(name)))
            .count();
        session.progress.target = self.options.target_count;
        if session.progress.update(done) {
            self.celebration.schedule(Instant::now(), CELEBRATION);
            self.log.record(format!("Target of {} images reached", session.progress.target));
        }
    }

    fn undo(&mut self) {
        let Some(session) = self.session.as_mut() else { return };
        if session.editor.undo() {
            session.dirty = true;
            self.log.record("Undo");
        }
    }

    fn redo(&mut self) {
        let Some(session) = self.session.as_mut() else { return };
        if session.editor.redo() {
            session.dirty = true;
            self.log.record("Redo");
        }
    }

    fn box_label(&self, id: BoxId) -> String {
        let Some(session) = &self.session else {
            return String::new();
        };
        let boxes = session.editor.boxes();
        match (boxes.display_index(id), boxes.get(id)) {
            (Some(index), Some(bbox)) => {
                format!("box {} ({})", index, self.class_name(bbox.class_id))
            }
            _ => format!("box #{}", id),
        }
    }

    fn assign_class(&mut self, class_id: usize) {
        let Some(session) = self.session.as_mut() else { return };
        let Some(id) = session.editor.assign_class(class_id) else { return };
        session.dirty = true;
        let label = self.box_label(id);
        self.log.record(format!("Changed class of {}", label));
    }

    fn delete_selected(&mut self) {
        let Some(session) = self.session.as_mut() else { return };
        let Some(id) = session.editor.delete_selected() else { return };
        session.dirty = true;
        self.log.record(format!("Deleted box #{}", id));
    }

    fn handle_canvas(&mut self, actions: Vec<CanvasAction>) {
        let class_count = self.class_count();
        for action in actions {
            let Some(session) = self.session.as_mut() else { return };
            match action {
                CanvasAction::Pressed(p) => match session.editor.pointer_pressed(p) {
                    PressOutcome::ClassRequested(rect) => {
                        log::debug!("Awaiting class for {:?}", rect);
                        self.prompt = Some(ClassPrompt::new(self.last_class, class_count));
                    }
                    PressOutcome::Grabbed(hit) => {
                        log::debug!("Grabbed box {} ({:?})", hit.id, hit.target);
                    }
                    PressOutcome::DrawingStarted
                    | PressOutcome::Discarded
                    | PressOutcome::Ignored => {}
                },
                CanvasAction::Moved(p) => session.editor.pointer_moved(p),
                CanvasAction::Released => {
                    if session.editor.pointer_released() {
                        session.dirty = true;
                    }
                }
                CanvasAction::ContextSelect(p) => {
                    let hit = hit_test(session.editor.cache(), p);
                    session.editor.select(hit.map(|hit| hit.id));
                }
                CanvasAction::AssignClass(class_id) => self.assign_class(class_id),
                CanvasAction::DeleteSelected => self.delete_selected(),
            }
        }
    }

    fn handle_toolbar(&mut self, action: ToolbarAction) {
        match action {
            ToolbarAction::None => {}
            ToolbarAction::Prev => self.navigate(false),
            ToolbarAction::Next => self.navigate(true),
            ToolbarAction::Save => {
                self.save_annotations();
            }
            ToolbarAction::Approve => self.set_approval(ApprovalState::Approved),
            ToolbarAction::Reject => self.set_approval(ApprovalState::Rejected),
            ToolbarAction::Undo => self.undo(),
            ToolbarAction::Redo => self.redo(),
            ToolbarAction::Finish => self.finish_mode(),
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let blocked = self.prompt.is_some() || self.pending_resume.is_some();
        if blocked || ctx.wants_keyboard_input() {
            return;
        }
        let Some(editing) = self.session.as_ref().map(|s| s.mode.is_editing()) else {
            return;
        };

        for shortcut in ctx.input(read_shortcuts) {
            match shortcut {
                Shortcut::Next => self.navigate(true),
                Shortcut::Prev => self.navigate(false),
                Shortcut::Cancel => {
                    if let Some(session) = self.session.as_mut() {
                        session.editor.cancel();
                    }
                }
                _ if !editing => {}
                Shortcut::Save => {
                    self.save_annotations();
                }
                Shortcut::SaveAndNext => {
                    if self.enter_guard.is_pending() {
                        log::debug!("Enter ignored right after a class prompt");
                    } else if self.save_annotations() {
                        self.navigate(true);
                    }
                }
                Shortcut::Undo => self.undo(),
                Shortcut::Redo => self.redo(),
                Shortcut::Delete => self.delete_selected(),
                Shortcut::Class(class_id) => self.assign_class(class_id),
            }
        }
    }

    fn show_prompt(&mut self, ctx: &egui::Context) {
        let awaiting = self
            .session
            .as_ref()
            .is_some_and(|s| s.editor.awaiting_class());
        if !awaiting {
            self.prompt = None;
            return;
        }
        let Some(prompt) = self.prompt.as_mut() else {
            // Nothing can answer; drop the pending box.
            if let Some(session) = self.session.as_mut() {
                session.editor.resolve_class(None);
            }
            return;
        };
        let class_names = self
            .project
            .as_ref()
            .map(|p| p.class_names.as_slice())
            .unwrap_or(&[]);

        let result = prompt.show(ctx, class_names);
        let Some(session) = self.session.as_mut() else { return };
        match result {
            PromptResult::Pending => {}
            PromptResult::Confirmed(class_id) => {
                self.prompt = None;
                self.last_class = class_id;
                self.enter_guard.schedule(Instant::now(), ENTER_GUARD);
                if let Some(id) = session.editor.resolve_class(Some(class_id)) {
                    session.dirty = true;
                    let label = self.box_label(id);
                    self.log.record(format!("Added {}", label));
                }
            }
            PromptResult::Cancelled => {
                self.prompt = None;
                session.editor.resolve_class(None);
                log::debug!("Class prompt cancelled");
            }
        }
    }

    fn show_menu(&mut self, ctx: &egui::Context) {
        let editing = self.session.as_ref().is_some_and(|s| s.mode.is_editing());
        let has_session = self.session.is_some();

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.add_enabled(has_session, egui::Button::new("Save session")).clicked() {
                        self.save_session(true);
                        ui.close_menu();
                    }
                    if ui.button("Options...").clicked() {
                        self.show_options = true;
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Edit", |ui| {
                    if ui.add_enabled(editing, egui::Button::new("Undo (Ctrl+Z)")).clicked() {
                        self.undo();
                        ui.close_menu();
                    }
                    if ui.add_enabled(editing, egui::Button::new("Redo (Ctrl+Y)")).clicked() {
                        self.redo();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.add_enabled(editing, egui::Button::new("Delete Selected")).clicked() {
                        self.delete_selected();
                        ui.close_menu();
                    }
                });
            });
        });
    }

    fn show_start(&mut self, ctx: &egui::Context) {
        let action = egui::CentralPanel::default()
            .show(ctx, |ui| {
                start_screen::show(
                    ui,
                    StartView {
                        project: self.project.as_ref(),
                        folder: self.folder.as_ref(),
                        stats: &self.stats,
                        image_bytes: self.image_bytes,
                        label_bytes: self.label_bytes,
                        message: self.message.as_deref(),
                    },
                )
            })
            .inner;

        match action {
            StartAction::None => {}
            StartAction::PickProject => self.pick_project(),
            StartAction::PickImages => self.pick_images(),
            StartAction::StartMode(mode) => self.start_mode(mode),
            StartAction::Export => self.export(),
        }
    }

    fn export(&mut self) {
        let Some(folder) = &self.folder else { return };
        let Some(dest) = rfd::FileDialog::new()
            .set_title("Export approved images to")
            .pick_folder()
        else {
            return;
        };
        match export_approved(&self.status, &folder.image_dir, &folder.labels_dir, &dest) {
            Ok(count) => {
                let text = format!("Exported {} approved pairs to {}", count, dest.display());
                self.log.record(text.clone());
                self.message = Some(text);
            }
            Err(e) => {
                log::error!("{:#}", e);
                self.message = Some(format!("Export failed: {}", e));
            }
        }
    }

    fn show_work(&mut self, ctx: &egui::Context) {
        let class_names: &[String] = self
            .project
            .as_ref()
            .map(|p| p.class_names.as_slice())
            .unwrap_or(&[]);

        let toolbar_action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| {
                let Some(session) = &self.session else {
                    return ToolbarAction::None;
                };
                let filename = session.current_filename().unwrap_or_default();
                let history = session.editor.history();
                toolbar::show(
                    ui,
                    &ToolbarState {
                        mode: session.mode,
                        position: session.index,
                        total: session.images.len(),
                        filename,
                        status: self.status.get(filename),
                        can_undo: history.can_undo(),
                        can_redo: history.can_redo(),
                        detecting: self.detector.is_busy(),
                    },
                )
            })
            .inner;

        let properties_action = egui::SidePanel::right("properties")
            .default_width(260.0)
            .show(ctx, |ui| {
                let Some(session) = &self.session else {
                    return PropertiesAction::None;
                };
                properties::show(
                    ui,
                    PropertiesView {
                        editor: &session.editor,
                        class_names,
                        progress: &session.progress,
                        elapsed: session.started.elapsed(),
                        options: &self.options,
                        log: &self.log,
                        celebrating: self.celebration.is_pending(),
                    },
                )
            })
            .inner;

        let canvas_output = egui::CentralPanel::default()
            .show(ctx, |ui| {
                let session = self.session.as_ref()?;
                if let Some(message) = &self.loading_message {
                    ui.centered_and_justified(|ui| {
                        ui.vertical_centered(|ui| {
                            ui.add_space(20.0);
                            ui.spinner();
                            ui.label(egui::RichText::new(message).size(16.0));
                        });
                    });
                    return None;
                }
                Some(canvas::show(
                    ui,
                    CanvasView {
                        editor: &session.editor,
                        texture: session.current_image().map(|image| &image.texture),
                        class_names,
                        options: &self.options,
                        interactive: self.prompt.is_none(),
                    },
                ))
            })
            .inner;

        self.handle_toolbar(toolbar_action);
        if let PropertiesAction::SelectBox(id) = properties_action {
            if let Some(session) = self.session.as_mut() {
                session.editor.select(Some(id));
            }
        }
        if let Some(output) = canvas_output {
            self.on_canvas_resized(output.size);
            self.handle_canvas(output.actions);
        }
        self.handle_shortcuts(ctx);
    }

    fn show_windows(&mut self, ctx: &egui::Context) {
        self.show_prompt(ctx);

        if self.show_options {
            let target = self.options.target_count;
            if options::show(ctx, &mut self.show_options, &mut self.options)
                && self.options.target_count != target
            {
                self.update_progress();
            }
        }

        if let Some(pending) = &self.pending_resume {
            let index = pending.record.resume_index(pending.images.len(), pending.mode);
            if let Some(accept) =
                start_screen::resume_prompt(ctx, pending.mode, index, pending.images.len())
            {
                self.resume(accept);
            }
        }
    }
}

impl eframe::App for LabelbenchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_loader(ctx);
        self.poll_detector();
        self.poll_timers(ctx);

        if ctx.input(|i| i.viewport().close_requested()) && self.session.is_some() {
            if self.session.as_ref().is_some_and(|s| s.dirty) {
                self.save_annotations();
            }
            self.save_session(true);
        }

        self.show_menu(ctx);
        if self.session.is_some() {
            self.show_work(ctx);
        } else {
            self.show_start(ctx);
        }
        self.show_windows(ctx);
    }
}
