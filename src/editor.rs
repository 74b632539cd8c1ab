use std::path::PathBuf;

use crate::catalog::ImageUpload;
use crate::models::{EntityKind, FieldInput, FieldSpec, Record};

/// State of the edit modal: a working copy of one record plus an image the
/// operator picked but has not uploaded yet.
#[derive(Debug, Clone)]
pub struct Editor {
    pub draft: Record,
    pub focus: usize,
    pub staged_image: Option<ImageUpload>,
    pub staged_path: Option<PathBuf>,
    pub image_input_active: bool,
    pub image_input: String,
    pub is_saving: bool,
    pub error: Option<String>,
}

impl Editor {
    pub fn open(record: &Record) -> Self {
        Self {
            draft: record.clone(),
            focus: 0,
            staged_image: None,
            staged_path: None,
            image_input_active: false,
            image_input: String::new(),
            is_saving: false,
            error: None,
        }
    }

    pub fn create(kind: EntityKind) -> Self {
        let draft = match kind.categories().first() {
            Some(first) => Record::new(kind).with("category", *first),
            None => Record::new(kind),
        };
        Self::open(&draft)
    }

    pub fn is_new(&self) -> bool {
        self.draft.id.is_none()
    }

    /// Form fields the operator types into. The image field is only ever
    /// replaced by an upload.
    pub fn editable_fields(&self) -> Vec<&'static FieldSpec> {
        let kind = self.draft.kind;
        kind.fields()
            .iter()
            .filter(|spec| spec.name != kind.image_field())
            .collect()
    }

    pub fn focused_field(&self) -> Option<&'static FieldSpec> {
        self.editable_fields().get(self.focus).copied()
    }

    pub fn focus_next(&mut self) {
        let len = self.editable_fields().len();
        if len > 0 {
            self.focus = (self.focus + 1) % len;
        }
    }

    pub fn focus_prev(&mut self) {
        let len = self.editable_fields().len();
        if len > 0 {
            self.focus = (self.focus + len - 1) % len;
        }
    }

    pub fn input_char(&mut self, c: char) {
        let Some(spec) = self.focused_field() else {
            return;
        };
        if spec.input == FieldInput::Number && !(c.is_ascii_digit() || c == '-' || c == '.') {
            return;
        }
        let mut value = self.draft.get(spec.name).to_string();
        if spec.input == FieldInput::Number && value == "0" {
            value.clear();
        }
        value.push(c);
        self.draft.set(spec.name, value);
    }

    pub fn backspace(&mut self) {
        let Some(spec) = self.focused_field() else {
            return;
        };
        let mut value = self.draft.get(spec.name).to_string();
        value.pop();
        self.draft.set(spec.name, value);
    }

    /// Steps a category field through the kind's suggestions. Values typed
    /// by hand that are not in the list restart at the first suggestion.
    pub fn cycle_category(&mut self, forward: bool) {
        let Some(spec) = self.focused_field() else {
            return;
        };
        let options = self.draft.kind.categories();
        if spec.input != FieldInput::Category || options.is_empty() {
            return;
        }

        let current = self.draft.get(spec.name);
        let next = match options.iter().position(|c| *c == current) {
            Some(i) if forward => (i + 1) % options.len(),
            Some(i) => (i + options.len() - 1) % options.len(),
            None => 0,
        };
        self.draft.set(spec.name, options[next]);
    }

    pub fn start_image_input(&mut self) {
        self.image_input_active = true;
        self.image_input.clear();
    }

    pub fn cancel_image_input(&mut self) {
        self.image_input_active = false;
        self.image_input.clear();
    }

    pub fn stage_image(&mut self, upload: ImageUpload, path: PathBuf) {
        self.staged_image = Some(upload);
        self.staged_path = Some(path);
        self.image_input_active = false;
        self.image_input.clear();
        self.error = None;
    }

    /// What the image area shows: the staged local file, else the stored URL.
    pub fn image_preview(&self) -> String {
        match (&self.staged_image, &self.staged_path) {
            (Some(upload), Some(path)) => format!(
                "{} ({}, pending upload)",
                path.display(),
                human_size(upload.bytes.len())
            ),
            (Some(upload), None) => format!(
                "{} ({}, pending upload)",
                upload.file_name,
                human_size(upload.bytes.len())
            ),
            _ if self.draft.image().is_empty() => "(no image)".to_string(),
            _ => self.draft.image().to_string(),
        }
    }
}

fn human_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}
