use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::catalog::{Catalog, ImageUpload};
use crate::editor::Editor;
use crate::models::{EntityKind, Record};
use crate::tui::{AppAction, InputMode};

/// Outcome of a background save, reported back to the UI loop.
pub struct SaveResult {
    pub kind: EntityKind,
    pub result: std::result::Result<Record, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

pub struct App {
    // Data
    pub active_kind: EntityKind,
    pub records: Vec<Record>,

    // UI State
    pub selected_index: usize,
    pub search_term: String,
    pub search_active: bool,
    pub editor: Option<Editor>,
    pub pending_delete: Option<String>,
    pub show_help: bool,
    pub status: Option<StatusMessage>,
    spinner_frame: usize,

    // Async state
    save_rx: mpsc::Receiver<SaveResult>,
    save_tx: mpsc::Sender<SaveResult>,

    // Services
    catalog: Catalog,
}

impl App {
    pub async fn new(catalog: Catalog) -> Self {
        let (save_tx, save_rx) = mpsc::channel(1);

        let mut app = Self {
            active_kind: EntityKind::default(),
            records: Vec::new(),
            selected_index: 0,
            search_term: String::new(),
            search_active: false,
            editor: None,
            pending_delete: None,
            show_help: false,
            status: None,
            spinner_frame: 0,
            save_rx,
            save_tx,
            catalog,
        };
        app.reload().await;
        app
    }

    pub fn filtered_records(&self) -> Vec<&Record> {
        self.records
            .iter()
            .filter(|r| r.matches(&self.search_term))
            .collect()
    }

    pub fn selected_record(&self) -> Option<&Record> {
        self.filtered_records().get(self.selected_index).copied()
    }

    pub fn input_mode(&self) -> InputMode {
        if self.show_help {
            InputMode::Help
        } else if self.pending_delete.is_some() {
            InputMode::ConfirmDelete
        } else if let Some(editor) = &self.editor {
            if editor.image_input_active {
                InputMode::ImagePath
            } else {
                InputMode::Editor
            }
        } else if self.search_active {
            InputMode::Search
        } else {
            InputMode::Normal
        }
    }

    pub fn is_saving(&self) -> bool {
        self.editor.as_ref().is_some_and(|e| e.is_saving)
    }

    pub fn spinner_char(&self) -> char {
        const FRAMES: [char; 4] = ['|', '/', '-', '\\'];
        FRAMES[self.spinner_frame % FRAMES.len()]
    }

    pub fn tick_spinner(&mut self) {
        if self.is_saving() {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
        }
    }

    pub async fn handle_action(&mut self, action: AppAction) -> bool {
        match action {
            AppAction::Quit => return true,

            AppAction::MoveUp => {
                if self.selected_index > 0 {
                    self.selected_index -= 1;
                }
            }

            AppAction::MoveDown => {
                let len = self.filtered_records().len();
                if len > 0 && self.selected_index < len - 1 {
                    self.selected_index += 1;
                }
            }

            AppAction::NextTab => self.switch_tab(self.active_kind.next()).await,
            AppAction::PrevTab => self.switch_tab(self.active_kind.prev()).await,
            AppAction::SelectTab(kind) => self.switch_tab(kind).await,

            AppAction::Refresh => {
                self.reload().await;
            }

            AppAction::StartSearch => {
                self.search_active = true;
            }

            AppAction::SearchChar(c) => {
                self.search_term.push(c);
                self.selected_index = 0;
            }

            AppAction::SearchBackspace => {
                self.search_term.pop();
                self.selected_index = 0;
            }

            AppAction::SearchConfirm => {
                self.search_active = false;
            }

            AppAction::SearchCancel => {
                self.search_active = false;
                self.search_term.clear();
                self.selected_index = 0;
            }

            AppAction::EditSelected => {
                if let Some(record) = self.selected_record() {
                    self.editor = Some(Editor::open(record));
                }
            }

            AppAction::NewRecord => {
                self.editor = Some(Editor::create(self.active_kind));
            }

            AppAction::RequestDelete => {
                if let Some(id) = self.selected_record().and_then(|r| r.id.clone()) {
                    self.pending_delete = Some(id);
                }
            }

            AppAction::ConfirmDelete => self.delete_pending().await,

            AppAction::CancelDelete => {
                self.pending_delete = None;
            }

            AppAction::MarkDownloaded => self.mark_selected_downloaded().await,

            AppAction::OpenImage => self.open_selected_image(),

            AppAction::ShowHelp => {
                self.show_help = true;
            }

            AppAction::HideHelp => {
                self.show_help = false;
            }

            AppAction::EditorNextField => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.focus_next();
                }
            }

            AppAction::EditorPrevField => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.focus_prev();
                }
            }

            AppAction::EditorChar(c) => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.input_char(c);
                }
            }

            AppAction::EditorBackspace => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.backspace();
                }
            }

            AppAction::EditorCycleCategory(forward) => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.cycle_category(forward);
                }
            }

            AppAction::EditorSave => self.start_save(),

            AppAction::EditorCancel => {
                // A running save still needs the modal to report into.
                if !self.is_saving() {
                    self.editor = None;
                }
            }

            AppAction::ImageInputStart => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.start_image_input();
                }
            }

            AppAction::ImageInputChar(c) => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.image_input.push(c);
                }
            }

            AppAction::ImageInputBackspace => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.image_input.pop();
                }
            }

            AppAction::ImageInputConfirm => self.stage_image().await,

            AppAction::ImageInputCancel => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.cancel_image_input();
                }
            }
        }

        false
    }

    async fn switch_tab(&mut self, kind: EntityKind) {
        self.active_kind = kind;
        self.search_term.clear();
        self.search_active = false;
        self.selected_index = 0;
        self.pending_delete = None;
        self.reload().await;
    }

    /// Re-fetches the active tab. A failed fetch leaves an empty table and
    /// an error in the status line.
    pub async fn reload(&mut self) {
        match self.catalog.try_list(self.active_kind).await {
            Ok(records) => {
                self.records = records;
            }
            Err(e) => {
                tracing::error!("Failed to load {}: {}", self.active_kind.table(), e);
                self.records.clear();
                self.set_error(format!("Could not load {}: {}", self.active_kind.table(), e));
            }
        }
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let len = self.filtered_records().len();
        if len == 0 {
            self.selected_index = 0;
        } else if self.selected_index >= len {
            self.selected_index = len - 1;
        }
    }

    fn start_save(&mut self) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        if editor.is_saving || editor.image_input_active {
            return;
        }

        editor.is_saving = true;
        editor.error = None;

        let record = editor.draft.clone();
        let image = editor.staged_image.clone();
        let kind = record.kind;
        let catalog = self.catalog.clone();
        let tx = self.save_tx.clone();

        tokio::spawn(async move {
            let result = catalog.save(record, image).await.map_err(|e| e.to_string());
            let _ = tx.send(SaveResult { kind, result }).await;
        });
    }

    /// Poll for a finished background save (non-blocking)
    pub async fn poll_save_result(&mut self) {
        let Ok(saved) = self.save_rx.try_recv() else {
            return;
        };

        match saved.result {
            Ok(record) => {
                self.editor = None;
                self.set_info(format!(
                    "Saved {} {}",
                    saved.kind.singular().to_lowercase(),
                    record.id.as_deref().unwrap_or_default()
                ));
                if saved.kind == self.active_kind {
                    self.reload().await;
                }
            }
            Err(message) => {
                tracing::error!("Failed to save {}: {}", saved.kind.singular().to_lowercase(), message);
                if let Some(editor) = self.editor.as_mut() {
                    editor.is_saving = false;
                    editor.error = Some(message.clone());
                }
                self.set_error(message);
            }
        }
    }

    async fn stage_image(&mut self) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        let input = editor.image_input.trim();
        if input.is_empty() {
            editor.cancel_image_input();
            return;
        }

        let path = expand_home(input);
        match ImageUpload::from_path(&path).await {
            Ok(upload) => editor.stage_image(upload, path),
            Err(e) => {
                editor.error = Some(format!("Could not read {}: {}", path.display(), e));
                editor.cancel_image_input();
            }
        }
    }

    async fn delete_pending(&mut self) {
        let Some(id) = self.pending_delete.take() else {
            return;
        };
        let kind = self.active_kind;

        match self.catalog.delete(kind, &id).await {
            Ok(()) => {
                self.records.retain(|r| r.id.as_deref() != Some(id.as_str()));
                self.clamp_selection();
                self.set_info(format!("Deleted {} {}", kind.singular().to_lowercase(), id));
            }
            Err(e) => {
                tracing::error!("Failed to delete {} {}: {}", kind.table(), id, e);
                self.set_error(format!("Delete failed: {e}"));
            }
        }
    }

    async fn mark_selected_downloaded(&mut self) {
        let Some(id) = self.selected_record().and_then(|r| r.id.clone()) else {
            return;
        };
        let kind = self.active_kind;

        match self.catalog.mark_downloaded(kind, &id).await {
            Ok(()) => {
                self.reload().await;
                self.set_info(format!("Marked {} {} as downloaded", kind.singular().to_lowercase(), id));
            }
            Err(e) => self.set_error(format!("Could not mark as downloaded: {e}")),
        }
    }

    fn open_selected_image(&mut self) {
        let Some(url) = self
            .selected_record()
            .map(|r| r.image().to_string())
            .filter(|url| !url.is_empty())
        else {
            self.set_info("Selected row has no image".to_string());
            return;
        };

        if let Err(e) = open::that(&url) {
            tracing::warn!("Failed to open {}: {}", url, e);
            self.set_error(format!("Could not open {url}: {e}"));
        }
    }

    fn set_info(&mut self, text: String) {
        self.status = Some(StatusMessage { text, is_error: false });
    }

    fn set_error(&mut self, text: String) {
        self.status = Some(StatusMessage { text, is_error: true });
    }
}

fn expand_home(input: &str) -> PathBuf {
    match input.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(input)),
        None => PathBuf::from(input),
    }
}
