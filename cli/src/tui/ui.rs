use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph, Row, Table, Wrap,
    },
    Frame,
};
use taskdesk_core::{Field, Priority, TaskApi, TaskStatus};
use unicode_width::UnicodeWidthStr;

use crate::tui::app::{App, Mode};
use crate::tui::form::FormState;

const ACCENT: Color = Color::Rgb(111, 164, 255);

pub fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Pending => Color::Gray,
        TaskStatus::InProgress => Color::Blue,
        TaskStatus::Completed => Color::Green,
        TaskStatus::Cancelled => Color::Red,
    }
}

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Low => Color::Green,
        Priority::Medium => Color::Yellow,
        Priority::High => Color::LightRed,
        Priority::Urgent => Color::Red,
    }
}

pub fn draw<A: TaskApi>(f: &mut Frame, app: &mut App<A>) {
    let size = f.area();

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(40)])
        .split(size);

    draw_sidebar(f, columns[0]);

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header
            Constraint::Min(1),    // Content
            Constraint::Length(1), // Footer
        ])
        .split(columns[1]);

    draw_header(f, app, main_chunks[0]);
    draw_content(f, app, main_chunks[1]);
    draw_footer(f, app, main_chunks[2]);

    match &app.mode {
        Mode::Form(state) => draw_form(f, state, size),
        Mode::ConfirmDelete { title, .. } => draw_confirm_delete(f, title, size),
        Mode::StatusPicker { selected, .. } => draw_status_picker(f, *selected, size),
        Mode::Normal | Mode::QuickAdd => {}
    }
}

fn accent_bold() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

fn draw_sidebar(f: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let key = |k: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("{k:>3} "), accent_bold()),
            Span::raw(what),
        ])
    };

    let text = vec![
        Line::from(Span::styled("Task Manager", accent_bold())),
        Line::from(Span::styled(
            "Organize your tasks efficiently",
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
        key("j/k", "move"),
        key("n", "new task"),
        key("a", "quick add"),
        key("e", "edit"),
        key("s", "change status"),
        key("d", "delete"),
        key("f", "filter status"),
        key("p", "filter priority"),
        key("o", "sort"),
        key("r", "reload"),
        key("q", "quit"),
    ];
    f.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), chunks[0]);

    let logout = Paragraph::new("L: log out")
        .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    f.render_widget(logout, chunks[1]);
}

fn draw_header<A: TaskApi>(f: &mut Frame, app: &App<A>, area: Rect) {
    let filter_status = app.filter.status.map(|s| s.label()).unwrap_or("all");
    let filter_priority = app.filter.priority.map(|p| p.label()).unwrap_or("all");

    let text = vec![
        Line::from(Span::styled("Tasks", Style::default().add_modifier(Modifier::BOLD))),
        Line::from(Span::styled(
            "Stay focused! One task at a time.",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(
            format!(
                "status: {filter_status} | priority: {filter_priority} | sort: {}",
                app.sort.label()
            ),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    f.render_widget(Paragraph::new(text), area);
}

fn draw_content<A: TaskApi>(f: &mut Frame, app: &mut App<A>, area: Rect) {
    let block = Block::default().borders(Borders::ALL).border_type(BorderType::Rounded);

    if let Some(error) = &app.load_error {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(error.as_str(), Style::default().fg(Color::Red))),
            Line::from(""),
            Line::from(Span::styled("r: retry", Style::default().fg(Color::Blue))),
        ];
        f.render_widget(Paragraph::new(text).alignment(Alignment::Center).block(block), area);
        return;
    }

    if app.is_loading() {
        let text = Paragraph::new("Loading tasks...")
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(text, area);
        return;
    }

    if app.tasks.is_empty() {
        let hint = if app.filter.is_active() {
            "Nothing matches the current filter."
        } else {
            "Create your first task with 'n'."
        };
        let text = vec![
            Line::from(""),
            Line::from(Span::styled("No tasks found.", Style::default().fg(Color::Gray))),
            Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))),
        ];
        f.render_widget(Paragraph::new(text).alignment(Alignment::Center).block(block), area);
        return;
    }

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    draw_task_list(f, app, content_chunks[0]);
    draw_detail_view(f, app, content_chunks[1]);
}

fn draw_task_list<A: TaskApi>(f: &mut Frame, app: &mut App<A>, area: Rect) {
    let rows: Vec<Row> = app.tasks.iter().map(|task| {
        Row::new(vec![
            Span::styled(task.status.label(), Style::default().fg(status_color(task.status))),
            Span::styled(task.priority.label(), Style::default().fg(priority_color(task.priority))),
            Span::raw(task.due_display().unwrap_or_else(|| "-".to_string())),
            Span::styled(task.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
        ])
    }).collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(12), // Status
            Constraint::Length(7),  // Priority
            Constraint::Length(10), // Due
            Constraint::Min(10),    // Title
        ]
    )
    .header(
        Row::new(vec!["Status", "Pri", "Due", "Title"]).style(Style::default().fg(Color::Yellow)),
    )
    .block(Block::default().title(" Tasks ").borders(Borders::ALL).border_type(BorderType::Rounded))
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn draw_detail_view<A: TaskApi>(f: &mut Frame, app: &App<A>, area: Rect) {
    let block = Block::default()
        .title(" Detail ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);

    let Some(task) = app.selected_task() else {
        f.render_widget(block, area);
        return;
    };

    let label = |s: &'static str| Span::styled(s, Style::default().fg(Color::Blue));
    let mut detail_text = vec![
        Line::from(Span::styled(
            task.title.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![label("ID: "), Span::raw(task.id.to_string())]),
        Line::from(vec![
            label("Status: "),
            Span::styled(task.status.label(), Style::default().fg(status_color(task.status))),
        ]),
        Line::from(vec![
            label("Priority: "),
            Span::styled(task.priority.label(), Style::default().fg(priority_color(task.priority))),
        ]),
        Line::from(vec![label("Created: "), Span::raw(task.created_display())]),
    ];
    if let Some(due) = task.due_display() {
        detail_text.push(Line::from(vec![label("Due: "), Span::raw(due)]));
    }
    if let Some(desc) = &task.description {
        detail_text.push(Line::from(""));
        detail_text.push(Line::from(desc.as_str()));
    }

    let detail = Paragraph::new(detail_text).block(block).wrap(Wrap { trim: true });
    f.render_widget(detail, area);
}

fn draw_footer<A: TaskApi>(f: &mut Frame, app: &App<A>, area: Rect) {
    if let Mode::QuickAdd = app.mode {
        let prompt = "add> ";
        let line = Line::from(vec![
            Span::styled(prompt, Style::default().fg(ACCENT)),
            Span::raw(app.input.as_str()),
        ]);
        f.render_widget(Paragraph::new(line), area);

        let before: String = app.input.chars().take(app.cursor_position).collect();
        let x = area.x + (prompt.width() + before.width()) as u16;
        f.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y));
        return;
    }

    let footer = match &app.flash {
        Some(msg) => Paragraph::new(msg.as_str()).style(Style::default().fg(Color::Red)),
        None => Paragraph::new("title words desc:.. pri:.. st:.. due:.. in quick add")
            .style(Style::default().fg(Color::DarkGray)),
    };
    f.render_widget(footer.alignment(Alignment::Center), area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}

fn field_label(field: Field) -> &'static str {
    match field {
        Field::Title => "Title",
        Field::Description => "Description",
        Field::Priority => "Priority",
        Field::Status => "Status",
        Field::DueDate => "Due date",
    }
}

fn draw_form(f: &mut Frame, state: &FormState, size: Rect) {
    let area = centered_rect(64, 24, size);
    f.render_widget(Clear, area);

    let block = Block::default()
        .title(state.title())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut constraints = vec![Constraint::Length(1), Constraint::Length(1)];
    constraints.extend(Field::ALL.iter().map(|_| Constraint::Length(4)));
    constraints.push(Constraint::Min(0));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    f.render_widget(
        Paragraph::new("Fill in the fields and press Enter to save. Esc cancels.")
            .style(Style::default().fg(Color::Gray)),
        rows[0],
    );
    if let Some(err) = &state.server_error {
        let server_error = Paragraph::new(err.as_str()).style(Style::default().fg(Color::Red));
        f.render_widget(server_error, rows[1]);
    }

    for (i, field) in Field::ALL.iter().enumerate() {
        let row = rows[i + 2];
        let focused = state.focus == *field;
        let border = Style::default().fg(if focused { ACCENT } else { Color::DarkGray });

        let field_area = Rect { height: 3, ..row };
        let value: Line = match field {
            Field::Priority => {
                let priority = state.form.priority;
                choice_line(priority.label(), priority_color(priority), focused)
            }
            Field::Status => {
                let status = state.form.status;
                choice_line(status.label(), status_color(status), focused)
            }
            _ => Line::from(state.text(*field).unwrap_or_default()),
        };
        let input = Paragraph::new(value).block(
            Block::default()
                .title(format!(" {} ", field_label(*field)))
                .borders(Borders::ALL)
                .border_style(border),
        );
        f.render_widget(input, field_area);

        if let Some(msg) = state.errors.for_field(*field) {
            let err_area = Rect { y: row.y + 3, height: 1, ..row };
            f.render_widget(Paragraph::new(msg).style(Style::default().fg(Color::Red)), err_area);
        }

        if focused {
            if let Some(text) = state.text(*field) {
                let before: String = text.chars().take(state.cursor).collect();
                let x = field_area.x + 1 + before.width() as u16;
                let x = x.min(field_area.right().saturating_sub(2));
                f.set_cursor_position((x, field_area.y + 1));
            }
        }
    }
}

fn choice_line(label: &str, color: Color, focused: bool) -> Line<'_> {
    if focused {
        Line::from(vec![
            Span::styled("< ", Style::default().fg(Color::DarkGray)),
            Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::styled(" >", Style::default().fg(Color::DarkGray)),
        ])
    } else {
        Line::from(Span::styled(label, Style::default().fg(color)))
    }
}

fn draw_confirm_delete(f: &mut Frame, title: &str, size: Rect) {
    let area = centered_rect(50, 7, size);
    f.render_widget(Clear, area);
    let text = vec![
        Line::from("Are you sure you want to delete this task?"),
        Line::from(Span::styled(title, Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(Span::styled("y: delete   n/Esc: keep", Style::default().fg(Color::Gray))),
    ];
    let popup = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(" Delete Task ")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Red)),
        );
    f.render_widget(popup, area);
}

fn draw_status_picker(f: &mut Frame, selected: usize, size: Rect) {
    let area = centered_rect(30, TaskStatus::ALL.len() as u16 + 2, size);
    f.render_widget(Clear, area);

    let items: Vec<ListItem> = TaskStatus::ALL
        .iter()
        .map(|s| ListItem::new(Span::styled(s.label(), Style::default().fg(status_color(*s)))))
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .title(" Status ")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(selected));
    f.render_stateful_widget(list, area, &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_fits_inside() {
        let area = Rect { x: 0, y: 0, width: 100, height: 40 };
        let r = centered_rect(64, 24, area);
        assert_eq!((r.x, r.y, r.width, r.height), (18, 8, 64, 24));

        let small = Rect { x: 5, y: 5, width: 20, height: 10 };
        let r = centered_rect(64, 24, small);
        assert_eq!((r.x, r.y, r.width, r.height), (5, 5, 20, 10));
    }
}
