use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::models::EntityKind;

#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    Quit,
    MoveUp,
    MoveDown,
    NextTab,
    PrevTab,
    SelectTab(EntityKind),
    Refresh,
    EditSelected,
    NewRecord,
    RequestDelete,
    ConfirmDelete,
    CancelDelete,
    MarkDownloaded,
    OpenImage,
    ShowHelp,
    HideHelp,
    // Search input actions
    StartSearch,
    SearchChar(char),
    SearchBackspace,
    SearchConfirm,
    SearchCancel,
    // Edit modal actions
    EditorNextField,
    EditorPrevField,
    EditorChar(char),
    EditorBackspace,
    EditorCycleCategory(bool),
    EditorSave,
    EditorCancel,
    // Image path input actions
    ImageInputStart,
    ImageInputChar(char),
    ImageInputBackspace,
    ImageInputConfirm,
    ImageInputCancel,
}

/// Which widget currently owns the keyboard, innermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Help,
    ConfirmDelete,
    ImagePath,
    Editor,
    Search,
    Normal,
}

pub fn handle_key_event(key: KeyEvent, mode: InputMode) -> Option<AppAction> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(AppAction::Quit);
    }

    match mode {
        // Any key closes help
        InputMode::Help => Some(AppAction::HideHelp),

        InputMode::ConfirmDelete => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(AppAction::ConfirmDelete),
            _ => Some(AppAction::CancelDelete),
        },

        InputMode::ImagePath => match key.code {
            KeyCode::Enter => Some(AppAction::ImageInputConfirm),
            KeyCode::Esc => Some(AppAction::ImageInputCancel),
            KeyCode::Backspace => Some(AppAction::ImageInputBackspace),
            KeyCode::Char(c) => Some(AppAction::ImageInputChar(c)),
            _ => None,
        },

        InputMode::Editor => handle_editor_key(key),

        InputMode::Search => match key.code {
            KeyCode::Enter => Some(AppAction::SearchConfirm),
            KeyCode::Esc => Some(AppAction::SearchCancel),
            KeyCode::Backspace => Some(AppAction::SearchBackspace),
            KeyCode::Char(c) => Some(AppAction::SearchChar(c)),
            _ => None,
        },

        InputMode::Normal => handle_normal_key(key),
    }
}

fn handle_editor_key(key: KeyEvent) -> Option<AppAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('s') => Some(AppAction::EditorSave),
            KeyCode::Char('o') => Some(AppAction::ImageInputStart),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Esc => Some(AppAction::EditorCancel),
        KeyCode::Tab | KeyCode::Down | KeyCode::Enter => Some(AppAction::EditorNextField),
        KeyCode::BackTab | KeyCode::Up => Some(AppAction::EditorPrevField),
        KeyCode::Left => Some(AppAction::EditorCycleCategory(false)),
        KeyCode::Right => Some(AppAction::EditorCycleCategory(true)),
        KeyCode::Backspace => Some(AppAction::EditorBackspace),
        KeyCode::Char(c) => Some(AppAction::EditorChar(c)),
        _ => None,
    }
}

fn handle_normal_key(key: KeyEvent) -> Option<AppAction> {
    match key.code {
        KeyCode::Char('q') => Some(AppAction::Quit),

        KeyCode::Char('j') | KeyCode::Down => Some(AppAction::MoveDown),
        KeyCode::Char('k') | KeyCode::Up => Some(AppAction::MoveUp),

        KeyCode::Tab | KeyCode::Char('l') | KeyCode::Right => Some(AppAction::NextTab),
        KeyCode::BackTab | KeyCode::Char('h') | KeyCode::Left => Some(AppAction::PrevTab),
        KeyCode::Char('1') => Some(AppAction::SelectTab(EntityKind::Quote)),
        KeyCode::Char('2') => Some(AppAction::SelectTab(EntityKind::Book)),
        KeyCode::Char('3') => Some(AppAction::SelectTab(EntityKind::Job)),

        KeyCode::Enter => Some(AppAction::EditSelected),
        KeyCode::Char('n') => Some(AppAction::NewRecord),
        KeyCode::Char('d') => Some(AppAction::RequestDelete),
        KeyCode::Char('x') => Some(AppAction::MarkDownloaded),
        KeyCode::Char('o') => Some(AppAction::OpenImage),
        KeyCode::Char('r') => Some(AppAction::Refresh),
        KeyCode::Char('/') => Some(AppAction::StartSearch),

        KeyCode::Char('?') => Some(AppAction::ShowHelp),

        _ => None,
    }
}
