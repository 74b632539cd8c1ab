use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame,
};

use crate::app::App;
use crate::editor::Editor;
use crate::models::{EntityKind, FieldInput};

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tabs
            Constraint::Length(1), // Search line
            Constraint::Min(0),    // Record table
            Constraint::Length(1), // Status line
        ])
        .split(frame.area());

    render_tabs(frame, app, chunks[0]);
    render_search(frame, app, chunks[1]);
    render_table(frame, app, chunks[2]);
    render_status(frame, app, chunks[3]);

    if let Some(editor) = &app.editor {
        render_editor(frame, app, editor);
    }

    if app.pending_delete.is_some() {
        render_confirm_delete(frame, app);
    }

    if app.show_help {
        render_help(frame);
    }
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = EntityKind::ALL
        .iter()
        .enumerate()
        .map(|(i, kind)| Line::from(format!(" {} {} ", i + 1, kind.label())))
        .collect();
    let selected = EntityKind::ALL
        .iter()
        .position(|k| *k == app.active_kind)
        .unwrap_or(0);

    let stats = format!(
        " Content Admin | {} of {} {} ",
        app.filtered_records().len(),
        app.records.len(),
        app.active_kind.table()
    );

    let tabs = Tabs::new(titles)
        .select(selected)
        .block(
            Block::default()
                .title(stats)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(tabs, area);
}

fn render_search(frame: &mut Frame, app: &App, area: Rect) {
    let line = if app.search_active {
        Line::from(vec![
            Span::styled(" Search: ", Style::default().fg(Color::Yellow)),
            Span::raw(format!("{}_", app.search_term)),
        ])
    } else if !app.search_term.is_empty() {
        Line::from(vec![
            Span::styled(" Filter: ", Style::default().fg(Color::Blue)),
            Span::raw(app.search_term.as_str()),
            Span::styled("  (/ to change)", Style::default().fg(Color::DarkGray)),
        ])
    } else {
        Line::from(Span::styled(" / to search", Style::default().fg(Color::DarkGray)))
    };

    frame.render_widget(Paragraph::new(line), area);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let kind = app.active_kind;
    let records = app.filtered_records();

    if records.is_empty() {
        let message = if app.records.is_empty() {
            format!("No {} yet. Press n to add one.", kind.table())
        } else {
            "No rows match the search.".to_string()
        };
        let paragraph = Paragraph::new(message)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, area);
        return;
    }

    let title_width = (area.width as usize * 45 / 100).saturating_sub(1);
    let detail_width = (area.width as usize * 20 / 100).saturating_sub(1);

    let header = Row::new(vec![
        Cell::from(""),
        Cell::from(title_label(kind)),
        Cell::from(detail_label(kind)),
        Cell::from(if kind == EntityKind::Job { "Sector" } else { "Category" }),
        Cell::from("Downloaded"),
    ])
    .style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = records
        .iter()
        .map(|record| {
            let marker = if record.image().is_empty() { " " } else { "▣" };
            let downloaded = record
                .last_downloaded
                .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());

            Row::new(vec![
                Cell::from(Span::styled(marker, Style::default().fg(Color::Green))),
                Cell::from(truncate(record.title(), title_width)),
                Cell::from(truncate(record.detail(), detail_width)),
                Cell::from(Span::styled(
                    record.category().to_string(),
                    Style::default().fg(Color::Blue),
                )),
                Cell::from(Span::styled(downloaded, Style::default().fg(Color::DarkGray))),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(2),
        Constraint::Percentage(45),
        Constraint::Percentage(20),
        Constraint::Percentage(15),
        Constraint::Length(16),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL))
        .row_highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = TableState::default().with_selected(Some(app.selected_index));
    frame.render_stateful_widget(table, area, &mut state);
}

fn title_label(kind: EntityKind) -> &'static str {
    kind.field(kind.title_field())
        .map(|f| f.label)
        .unwrap_or("Title")
}

fn detail_label(kind: EntityKind) -> &'static str {
    kind.field(kind.detail_field())
        .map(|f| f.label)
        .unwrap_or("Detail")
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let (text, style) = match &app.status {
        Some(status) if status.is_error => {
            (format!(" {}", status.text), Style::default().fg(Color::Red))
        }
        Some(status) => (format!(" {}", status.text), Style::default().fg(Color::Green)),
        None => (
            " j/k:nav  Tab:kind  Enter:edit  n:new  d:delete  x:downloaded  ?:help  q:quit"
                .to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    };

    frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_editor(frame: &mut Frame, app: &App, editor: &Editor) {
    let area = centered_rect(70, 80, frame.area());
    let kind = editor.draft.kind;

    let title = if editor.is_new() {
        format!(" New {} ", kind.singular())
    } else {
        format!(" Edit {} ", kind.singular())
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(area);

    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Image
            Constraint::Min(0),    // Fields
            Constraint::Length(2), // Error / saving
            Constraint::Length(1), // Hints
        ])
        .split(inner);

    let image_label = kind.field(kind.image_field()).map(|f| f.label).unwrap_or("Image");
    let mut image_spans = vec![
        Span::styled(format!("{image_label}: "), Style::default().fg(Color::Cyan)),
        Span::raw(editor.image_preview()),
    ];
    if kind == EntityKind::Quote {
        let offset = editor.draft.offset();
        image_spans.push(Span::styled(
            format!("  offset {}, {}", offset.x, offset.y),
            Style::default().fg(Color::DarkGray),
        ));
    }
    let mut image_lines = vec![Line::from(image_spans)];
    if editor.image_input_active {
        image_lines.push(Line::from(vec![
            Span::styled("File path: ", Style::default().fg(Color::Yellow)),
            Span::raw(format!("{}_", editor.image_input)),
        ]));
    }
    frame.render_widget(Paragraph::new(image_lines), chunks[0]);

    let value_width = (chunks[1].width as usize).saturating_sub(22);
    let lines: Vec<Line> = editor
        .editable_fields()
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            let focused = i == editor.focus && !editor.image_input_active;
            let label_style = if focused {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan)
            };

            let value = if focused {
                // Keep the end visible: that is where typing lands.
                format!("{}_", tail(editor.draft.get(spec.name), value_width.saturating_sub(1)))
            } else {
                truncate(editor.draft.get(spec.name), value_width)
            };
            let hint = match spec.input {
                FieldInput::Category if focused && !kind.categories().is_empty() => "  ◀ ▶",
                _ => "",
            };

            Line::from(vec![
                Span::styled(format!("{:>20}: ", spec.label), label_style),
                Span::raw(value),
                Span::styled(hint, Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), chunks[1]);

    let feedback = if editor.is_saving {
        Paragraph::new(format!("Saving… {}", app.spinner_char()))
            .style(Style::default().fg(Color::Yellow))
    } else if let Some(error) = &editor.error {
        Paragraph::new(error.as_str())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true })
    } else {
        Paragraph::new("")
    };
    frame.render_widget(feedback, chunks[2]);

    let hints = if editor.image_input_active {
        "Enter:stage image  Esc:cancel"
    } else {
        "Tab/↑↓:field  ◀▶:category  Ctrl-O:image  Ctrl-S:save  Esc:close"
    };
    frame.render_widget(
        Paragraph::new(hints).style(Style::default().fg(Color::DarkGray)),
        chunks[3],
    );
}

fn render_confirm_delete(frame: &mut Frame, app: &App) {
    let area = centered_rect(50, 20, frame.area());
    let kind = app.active_kind;

    let what = app
        .selected_record()
        .map(|r| truncate(r.title(), 40))
        .unwrap_or_default();

    let block = Block::default()
        .title(format!(" Delete {} ", kind.singular()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let text = format!("\"{what}\"\n\nThis cannot be undone. Press y to delete, any other key to cancel.");
    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(50, 70, frame.area());

    let help_text = vec![
        "",
        " Navigation:",
        "   j / ↓      Move down",
        "   k / ↑      Move up",
        "   Tab / l    Next kind",
        "   1 2 3      Quotes / Books / Jobs",
        "   /          Search",
        "",
        " Actions:",
        "   Enter      Edit selected",
        "   n          New record",
        "   d          Delete (asks first)",
        "   x          Mark as downloaded",
        "   o          Open image in browser",
        "   r          Refresh",
        "",
        " Edit form:",
        "   Tab / ↑↓   Move between fields",
        "   ◀ ▶        Cycle category",
        "   Ctrl-O     Pick an image file",
        "   Ctrl-S     Save",
        "   Esc        Close without saving",
        "",
        " General:",
        "   ?          Toggle this help",
        "   q          Quit",
        "",
        " Press any key to close",
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(help_text.join("\n"))
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

/// First wrapped line of `text`, with an ellipsis when more was cut.
fn truncate(text: &str, width: usize) -> String {
    let flat = text.replace('\n', " ");
    let lines = textwrap::wrap(&flat, width.max(1));
    match lines.len() {
        0 => String::new(),
        1 => lines[0].to_string(),
        _ => format!("{}…", lines[0]),
    }
}

/// Last `width` characters of `text` on one line, led by an ellipsis when
/// the start was cut.
fn tail(text: &str, width: usize) -> String {
    let flat = text.replace('\n', " ");
    let count = flat.chars().count();
    if count <= width {
        return flat;
    }
    let keep = width.saturating_sub(1);
    let rest: String = flat.chars().skip(count - keep).collect();
    format!("…{rest}")
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
