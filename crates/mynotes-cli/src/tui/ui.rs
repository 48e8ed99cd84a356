//! UI rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use mynotes_core::presenter::{date_label, row_title, NoteRow};
use mynotes_core::{NoteColor, SortOrder};

use super::app::{App, InputMode, Screen};
use super::form::{EditField, NoteForm};

/// Main UI rendering function
pub fn draw(frame: &mut Frame, app: &App) {
    let outer_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    match (app.screen, app.form.as_ref()) {
        (Screen::Edit, Some(form)) => {
            draw_form(frame, form, outer_chunks[0]);
            draw_form_status(frame, app, form, outer_chunks[1]);
        }
        _ => {
            let pane_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
                .split(outer_chunks[0]);

            draw_list_pane(frame, app, pane_chunks[0]);
            draw_preview_pane(frame, app, pane_chunks[1]);

            match app.input_mode {
                InputMode::Search => draw_search_input(frame, app, outer_chunks[1]),
                InputMode::ConfirmDelete => draw_confirm_delete(frame, app, outer_chunks[1]),
                InputMode::Normal | InputMode::SortPicker => {
                    draw_status_bar(frame, app, outer_chunks[1])
                }
            }

            if app.input_mode == InputMode::SortPicker {
                draw_sort_picker(frame, app);
            }
        }
    }

    if app.show_help {
        draw_help_overlay(frame);
    }
}

fn swatch_color(color: NoteColor) -> Color {
    let (r, g, b) = color.rgb();
    Color::Rgb(r, g, b)
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

/// Draw the notes list (left)
fn draw_list_pane(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .presenter
        .rows()
        .into_iter()
        .map(|row| ListItem::new(row_lines(&row)))
        .collect();

    let block = Block::default()
        .title(app.list_title())
        .borders(Borders::ALL)
        .border_style(bold());

    if items.is_empty() {
        let message = if app.is_loading {
            "Loading..."
        } else if app.presenter.total() == 0 {
            "No notes yet. Press n to write one."
        } else {
            "No notes match"
        };
        let paragraph =
            Paragraph::new(vec![Line::from(""), Line::from(Span::styled(message, dim()))])
                .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .add_modifier(Modifier::BOLD)
            .add_modifier(Modifier::REVERSED),
    );

    let mut state = ListState::default();
    state.select(Some(app.selected));

    frame.render_stateful_widget(list, area, &mut state);
}

fn row_lines<'a>(row: &NoteRow<'a>) -> Vec<Line<'a>> {
    let mut title = vec![
        Span::styled("█ ", Style::default().fg(swatch_color(row.color))),
        Span::styled(row.title, bold()),
    ];
    if row.has_link {
        title.push(Span::styled(" [link]", dim()));
    }
    if row.has_image {
        title.push(Span::styled(" [image]", dim()));
    }

    let mut lines = vec![Line::from(title)];
    if let Some(subtitle) = row.subtitle {
        lines.push(Line::from(format!("  {}", subtitle)));
    }
    lines.push(Line::from(Span::styled(
        format!("  {}", row.date_label),
        dim(),
    )));
    lines
}

/// Draw the selected note (right)
fn draw_preview_pane(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().title(" Note ").borders(Borders::ALL);

    let content = if let Some(note) = app.current_note() {
        let mut lines = vec![Line::from(Span::styled(row_title(note), bold()))];
        if !note.subtitle.trim().is_empty() {
            lines.push(Line::from(note.subtitle.as_str()));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Color: ", bold()),
            Span::styled("█ ", Style::default().fg(swatch_color(note.color))),
            Span::raw(note.color.name()),
        ]));
        if let Some(link) = &note.web_link {
            lines.push(Line::from(vec![
                Span::styled("Link: ", bold()),
                Span::styled(link.as_str(), Style::default().fg(Color::Cyan)),
            ]));
        }
        if let Some(image) = &note.image_path {
            lines.push(Line::from(vec![
                Span::styled("Image: ", bold()),
                Span::raw(image.as_str()),
            ]));
        }
        lines.push(Line::from(vec![
            Span::styled("Updated: ", bold()),
            Span::raw(date_label(note)),
        ]));

        let header = "── ";
        let remaining = area.width.saturating_sub(header.len() as u16 + 2) as usize;
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("{}{}", header, "─".repeat(remaining)),
            dim(),
        )));
        for body_line in note.body.lines() {
            lines.push(Line::from(body_line));
        }
        lines
    } else {
        vec![
            Line::from(""),
            Line::from(Span::styled("Select a note to preview it", dim())),
        ]
    };

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

/// Draw the status bar at the bottom
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (content, style) = if let Some(msg) = &app.status_message {
        let style = if app.status_is_error {
            Style::default().fg(Color::Red)
        } else {
            dim()
        };
        (msg.clone(), style)
    } else if app.is_loading {
        ("Loading...".to_string(), dim())
    } else {
        (
            "n:new  e:edit  d:del  u:undo  /:search  s:sort  c:color  o:open  ?:help  q:quit"
                .to_string(),
            dim(),
        )
    };

    frame.render_widget(Paragraph::new(content).style(style), area);
}

/// Draw search input at the bottom
fn draw_search_input(frame: &mut Frame, app: &App, area: Rect) {
    let prefix = "/";

    let line = Line::from(vec![
        Span::styled(prefix, Style::default().fg(Color::Cyan)),
        Span::raw(app.search.value()),
        Span::styled(format!("  ({} matches)", app.presenter.len()), dim()),
    ]);

    frame.render_widget(Paragraph::new(line), area);

    let cursor_x = area.x + prefix.len() as u16 + app.search.cursor() as u16;
    frame.set_cursor_position((cursor_x, area.y));
}

fn draw_confirm_delete(frame: &mut Frame, app: &App, area: Rect) {
    let title = app.current_note().map(row_title).unwrap_or_default();
    let line = Line::from(vec![
        Span::styled("Delete ", Style::default().fg(Color::Yellow)),
        Span::styled(format!("'{}'", title), bold()),
        Span::styled("? (y/n)", Style::default().fg(Color::Yellow)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Draw the edit screen
fn draw_form(frame: &mut Frame, form: &NoteForm, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
        ])
        .split(area);

    let detail_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(40),
            Constraint::Percentage(35),
        ])
        .split(chunks[2]);

    draw_text_field(frame, form, EditField::Title, chunks[0]);
    draw_text_field(frame, form, EditField::Subtitle, chunks[1]);
    draw_color_field(frame, form, detail_chunks[0]);
    draw_text_field(frame, form, EditField::WebLink, detail_chunks[1]);
    draw_text_field(frame, form, EditField::ImagePath, detail_chunks[2]);
    draw_text_field(frame, form, EditField::Body, chunks[3]);
}

fn field_block(form: &NoteForm, field: EditField) -> Block<'static> {
    let focused = form.focus == field;
    let issue = form.issue_for(field);

    let mut title = vec![Span::raw(format!(" {} ", field.label()))];
    if let Some(issue) = issue {
        title.push(Span::styled(
            format!("{} ", issue),
            Style::default().fg(Color::Red),
        ));
    }

    let mut border_style = Style::default();
    if issue.is_some() {
        border_style = border_style.fg(Color::Red);
    } else if focused {
        border_style = border_style.fg(Color::Cyan);
    }
    if focused {
        border_style = border_style.add_modifier(Modifier::BOLD);
    }

    Block::default()
        .title(Line::from(title))
        .borders(Borders::ALL)
        .border_style(border_style)
}

fn draw_text_field(frame: &mut Frame, form: &NoteForm, field: EditField, area: Rect) {
    let Some(input) = form.input(field) else {
        return;
    };

    // Keep the cursor line visible in the body
    let (line, col) = input.cursor_position();
    let inner_height = area.height.saturating_sub(2) as usize;
    let scroll = (line + 1).saturating_sub(inner_height.max(1));

    let paragraph = Paragraph::new(input.value())
        .block(field_block(form, field))
        .scroll((scroll as u16, 0));
    frame.render_widget(paragraph, area);

    if form.focus == field && !form.saving {
        let x = area.x + 1 + col as u16;
        let y = area.y + 1 + (line - scroll) as u16;
        frame.set_cursor_position((x.min(area.right().saturating_sub(2)), y));
    }
}

fn draw_color_field(frame: &mut Frame, form: &NoteForm, area: Rect) {
    let hint = if form.focus == EditField::Color {
        "◀ ▶ "
    } else {
        ""
    };
    let line = Line::from(vec![
        Span::raw(hint),
        Span::styled("██ ", Style::default().fg(swatch_color(form.color))),
        Span::raw(form.color.name()),
    ]);
    frame.render_widget(
        Paragraph::new(line).block(field_block(form, EditField::Color)),
        area,
    );
}

fn draw_form_status(frame: &mut Frame, app: &App, form: &NoteForm, area: Rect) {
    let (content, style) = if form.confirm_delete {
        (
            "Delete this note? (y/n)".to_string(),
            Style::default().fg(Color::Yellow),
        )
    } else if form.saving {
        ("Saving...".to_string(), dim())
    } else if let Some(msg) = &app.status_message {
        let style = if app.status_is_error {
            Style::default().fg(Color::Red)
        } else {
            dim()
        };
        (msg.clone(), style)
    } else {
        let verb = if form.is_new() { "create" } else { "save" };
        let mut hints = format!("Tab:next field  Ctrl+s:{}  Esc:cancel  Ctrl+e:$EDITOR", verb);
        if !form.is_new() {
            hints.push_str("  Ctrl+d:delete");
        }
        (hints, dim())
    };

    frame.render_widget(Paragraph::new(content).style(style), area);
}

/// Centered popup area
fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let popup_width = width.min(area.width.saturating_sub(4));
    let popup_height = height.min(area.height.saturating_sub(4));
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    Rect::new(popup_x, popup_y, popup_width, popup_height)
}

fn draw_sort_picker(frame: &mut Frame, app: &App) {
    let area = popup_area(frame.area(), 30, SortOrder::ALL.len() as u16 + 2);
    frame.render_widget(Clear, area);

    let items: Vec<ListItem> = SortOrder::ALL
        .iter()
        .map(|sort| {
            let marker = if *sort == app.presenter.sort() { "● " } else { "  " };
            ListItem::new(format!("{}{}", marker, sort.label()))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(" Sort by ")
                .borders(Borders::ALL)
                .border_style(bold()),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = ListState::default();
    state.select(Some(app.sort_cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

/// Draw help overlay
fn draw_help_overlay(frame: &mut Frame) {
    let popup_area = popup_area(frame.area(), 52, 26);
    frame.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(Span::styled("Keyboard Shortcuts", bold())),
        Line::from(""),
        Line::from("Notes list:"),
        Line::from("  j/k, ↑/↓    Move up/down"),
        Line::from("  gg / G      Jump to first / last note"),
        Line::from("  Enter, e    Edit note"),
        Line::from("  n, a        New note"),
        Line::from("  d           Delete note"),
        Line::from("  u           Undo"),
        Line::from("  U, Ctrl+r   Redo"),
        Line::from("  /           Search"),
        Line::from("  s           Sort order"),
        Line::from("  c           Cycle color filter"),
        Line::from("  o           Open web link"),
        Line::from("  r           Reload"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from("Editing:"),
        Line::from("  Tab         Next field"),
        Line::from("  ←/→         Change color"),
        Line::from("  Ctrl+s      Save"),
        Line::from("  Ctrl+e      Edit body in $EDITOR"),
        Line::from("  Esc         Cancel"),
        Line::from(""),
        Line::from(Span::styled("Press any key to close", dim())),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(bold());

    frame.render_widget(Paragraph::new(help_text).block(block), popup_area);
}
