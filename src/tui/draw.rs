use ratatui::{
    backend::TestBackend,
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Clear, List, ListItem, Paragraph, Scrollbar,
        ScrollbarOrientation, ScrollbarState, Wrap,
    },
    Frame, Terminal,
};
use crate::tui::input::TextInput;
use crate::tui::markdown;
use crate::tui::providers::Provider;
use crate::tui::state::conversation::{Message, Role};
use crate::tui::state::{App, Focus, Overlay};

const BG: Color = Color::Rgb(15, 15, 25);
const BORDER: Color = Color::Rgb(50, 50, 80);

fn panel(title: &str, focused: bool) -> Block<'_> {
    Block::default()
        .title(title)
        .title_style(Style::default().fg(if focused { Color::Yellow } else { Color::DarkGray }))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { Color::Yellow } else { BORDER }))
}

// ── Drawing ───────────────────────────────────────────────────────────────────

pub fn draw(f: &mut Frame, app: &mut App) {
    let area = f.area();

    f.render_widget(Block::default().style(Style::default().bg(BG)), area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    draw_header(f, chunks[0], app);
    draw_chat(f, chunks[1], app);
    draw_footer(f, chunks[2], app);

    match &app.overlay {
        Some(Overlay::Settings(input)) => {
            draw_overlay(f, area, " Settings · API base URL ", input, "Enter save & reload   Esc cancel")
        }
        Some(Overlay::Attach(input)) => {
            draw_overlay(f, area, " Attach file · path ", input, "Enter attach   Esc cancel")
        }
        None => {}
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" mia-chat ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled(format!(" API {}", app.api_base), Style::default().fg(Color::DarkGray)),
    ]));
    f.render_widget(header, area);
}

fn draw_footer(f: &mut Frame, area: Rect, app: &App) {
    let hint = if app.status.is_empty() {
        Span::styled(
            " Enter send  Shift+Enter newline  Tab focus  ^U attach  ^N new chat  ^S settings  ^Y copy  Esc quit ",
            Style::default().fg(Color::DarkGray),
        )
    } else {
        Span::styled(format!(" {}", app.status), Style::default().fg(Color::Yellow))
    };
    let footer = Paragraph::new(Line::from(hint))
        .style(Style::default().bg(BG))
        .alignment(Alignment::Center);
    f.render_widget(footer, area);
}

fn draw_chat(f: &mut Frame, area: Rect, app: &mut App) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(area);

    draw_sidebar(f, cols[0], app);

    let right_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // conversation
            Constraint::Length(1), // file badge + usage
            Constraint::Length(5), // message input
            Constraint::Length(1), // controls
        ])
        .split(cols[1]);

    draw_conversation(f, right_rows[0], app);
    draw_info_row(f, right_rows[1], app);
    draw_input(f, right_rows[2], app);
    draw_controls(f, right_rows[3], app);
}

fn draw_sidebar(f: &mut Frame, area: Rect, app: &App) {
    let providers = Provider::all();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(providers.len() as u16 + 2),
            Constraint::Min(4),
            Constraint::Length(3),
        ])
        .split(area);

    let provider_items: Vec<ListItem> = providers.iter().map(|p| ListItem::new(p.label())).collect();
    let mut pstate = app.provider_list_state;
    let provider_list = List::new(provider_items)
        .block(panel(" Provider ", app.focus == Focus::ProviderList))
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        .highlight_symbol("▶ ");
    f.render_stateful_widget(provider_list, rows[0], &mut pstate);

    let model_focused = app.focus == Focus::ModelList;
    let models = app.models();
    if models.is_empty() {
        let hint = Paragraph::new(Span::styled(
            format!(" No models for \"{}\"", app.conversation.provider),
            Style::default().fg(Color::DarkGray),
        ))
        .block(panel(" Model ", model_focused))
        .wrap(Wrap { trim: false });
        f.render_widget(hint, rows[1]);
    } else {
        let model_items: Vec<ListItem> = models
            .iter()
            .map(|m| {
                let style = if m.disabled {
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
                } else {
                    Style::default().fg(Color::White)
                };
                ListItem::new(Span::styled(m.label, style))
            })
            .collect();
        let mut mstate = app.model_list_state;
        let model_list = List::new(model_items)
            .block(panel(" Model (↑/↓) ", model_focused))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::Green))
            .highlight_symbol("▶ ");
        f.render_stateful_widget(model_list, rows[1], &mut mstate);
    }

    let active = Paragraph::new(Span::styled(
        format!(" {}", app.model_label),
        Style::default().fg(Color::Green),
    ))
    .block(panel(" Active Model ", false));
    f.render_widget(active, rows[2]);
}

// ── Conversation ──────────────────────────────────────────────────────────────

fn role_label(role: Role) -> (&'static str, Color) {
    match role {
        Role::User => ("You", Color::Cyan),
        Role::Assistant => ("Assistant", Color::Green),
        Role::System => ("System", Color::Magenta),
    }
}

/// Rebuilds the whole log. Only assistant content is interpreted as Markdown.
pub fn message_lines(messages: &[Message]) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    for msg in messages {
        let (label, color) = role_label(msg.role);
        lines.push(Line::from(Span::styled(
            format!(" {label}: "),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        match msg.role {
            Role::Assistant => {
                for line in markdown::render(&msg.content) {
                    let mut spans = vec![Span::raw("   ")];
                    spans.extend(line.spans);
                    lines.push(Line::from(spans));
                }
            }
            Role::User | Role::System => {
                for line in msg.content.lines() {
                    lines.push(Line::from(Span::styled(
                        format!("   {line}"),
                        Style::default().fg(Color::White),
                    )));
                }
            }
        }
        lines.push(Line::from(""));
    }
    lines
}

fn draw_conversation(f: &mut Frame, area: Rect, app: &mut App) {
    let conv_lines = message_lines(&app.conversation.messages);

    let conv_area_height = area.height.saturating_sub(2) as usize;
    let conv_inner_width = area.width.saturating_sub(3) as usize;
    let total_lines: usize = conv_lines.iter().map(|line| {
        let w = line.width();
        if conv_inner_width == 0 || w == 0 { 1 } else { w.div_ceil(conv_inner_width) }
    }).sum::<usize>().max(1);
    let max_scroll = total_lines.saturating_sub(conv_area_height) as u16;
    let effective_scroll = if app.chat_scroll_manual {
        app.chat_scroll.min(max_scroll)
    } else {
        max_scroll
    };
    app.conv_max_scroll = max_scroll;

    let focused = app.focus == Focus::Conversation;
    let title = if app.chat_scroll_manual {
        " Conversation  [End: follow newest] "
    } else {
        " Conversation "
    };
    let conv = Paragraph::new(conv_lines)
        .block(panel(title, focused))
        .wrap(Wrap { trim: false })
        .scroll((effective_scroll, 0));
    f.render_widget(conv, area);

    if max_scroll > 0 {
        let mut scrollbar_state = ScrollbarState::new(max_scroll as usize)
            .position(effective_scroll as usize);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("▲"))
            .end_symbol(Some("▼"))
            .track_symbol(Some("│"))
            .thumb_symbol("█");
        f.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
    }
}

fn draw_info_row(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = Vec::new();
    if let Some(badge) = app.file_badge() {
        spans.push(Span::styled(
            format!(" {badge} "),
            Style::default().fg(Color::Black).bg(Color::Yellow),
        ));
        spans.push(Span::raw(" "));
    }
    if !app.usage_line.is_empty() {
        spans.push(Span::styled(app.usage_line.clone(), Style::default().fg(Color::DarkGray)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ── Input & controls ──────────────────────────────────────────────────────────

fn input_lines(input: &TextInput, focused: bool) -> Vec<Line<'static>> {
    let cursor_style = if focused {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let text_style = Style::default().fg(Color::White);
    let (before, cursor, after) = input.split_at_cursor();

    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut before_lines: Vec<&str> = before.split('\n').collect();
    let cursor_line_head = before_lines.pop().unwrap_or_default();
    for l in before_lines {
        lines.push(Line::from(Span::styled(l.to_string(), text_style)));
    }
    let mut after_lines = after.split('\n');
    let cursor_line_tail = after_lines.next().unwrap_or_default();
    lines.push(Line::from(vec![
        Span::styled(cursor_line_head.to_string(), text_style),
        Span::styled(cursor.to_string(), cursor_style),
        Span::styled(cursor_line_tail.to_string(), text_style),
    ]));
    for l in after_lines {
        lines.push(Line::from(Span::styled(l.to_string(), text_style)));
    }
    lines
}

fn draw_input(f: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Message && app.overlay.is_none();
    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2);
    let cursor_row = app.message_input.cursor_row(inner_width.max(1));
    let scroll = cursor_row.saturating_sub(inner_height.saturating_sub(1));

    let input = Paragraph::new(input_lines(&app.message_input, focused))
        .block(panel(" Message ", focused))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(input, area);
}

fn button(label: &str, enabled: bool) -> Span<'static> {
    let style = if enabled {
        Style::default().fg(Color::Black).bg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
    };
    Span::styled(format!("[ {label} ]"), style)
}

fn draw_controls(f: &mut Frame, area: Rect, app: &App) {
    let c = app.controls;
    let bar = Line::from(vec![
        Span::raw(" "),
        button(c.send_label, c.send_enabled),
        Span::raw(" "),
        button("Attach", c.upload_enabled),
        Span::raw(" "),
        button("New chat", true),
        Span::raw(" "),
        button("Settings", true),
    ]);
    f.render_widget(Paragraph::new(bar), area);
}

// ── Overlays ──────────────────────────────────────────────────────────────────

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

fn draw_overlay(f: &mut Frame, area: Rect, title: &str, input: &TextInput, hint: &str) {
    let popup = centered_rect(area.width.saturating_mul(3) / 4, 5, area);
    f.render_widget(Clear, popup);
    let lines = vec![
        input_lines(input, true).into_iter().next().unwrap_or_default(),
        Line::from(""),
        Line::from(Span::styled(hint.to_string(), Style::default().fg(Color::DarkGray))),
    ];
    let p = Paragraph::new(lines)
        .block(
            Block::default()
                .title(title)
                .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .style(Style::default().bg(BG));
    f.render_widget(p, popup);
}

// ── Test helpers ──────────────────────────────────────────────────────────────

/// Render the current app state into an in-memory buffer using `TestBackend`.
/// Useful for tests that need to assert on rendered output without a real terminal.
pub fn render_to_buffer(app: &mut App, width: u16, height: u16) -> Buffer {
    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend).expect("TestBackend terminal");
    terminal.draw(|f| draw(f, app)).expect("draw");
    terminal.backend().buffer().clone()
}
