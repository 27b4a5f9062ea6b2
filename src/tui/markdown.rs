// ── Markdown → terminal lines ─────────────────────────────────────────────────

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

const CODE_BG: Color = Color::Rgb(30, 30, 45);

struct Renderer {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    /// One entry per open list: next ordinal for numbered lists.
    lists: Vec<Option<u64>>,
    quote_depth: usize,
    in_code_block: bool,
    link_dest: Option<String>,
    /// Cells already emitted in the current table row.
    table_cells: usize,
}

impl Renderer {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            current: Vec::new(),
            styles: vec![Style::default().fg(Color::White)],
            lists: Vec::new(),
            quote_depth: 0,
            in_code_block: false,
            link_dest: None,
            table_cells: 0,
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, f: impl FnOnce(Style) -> Style) {
        let next = f(self.style());
        self.styles.push(next);
    }

    fn pop_style(&mut self) {
        if self.styles.len() > 1 {
            self.styles.pop();
        }
    }

    fn prefix(&self) -> Vec<Span<'static>> {
        let mut spans = Vec::new();
        for _ in 0..self.quote_depth {
            spans.push(Span::styled("│ ", Style::default().fg(Color::DarkGray)));
        }
        spans
    }

    fn text(&mut self, text: &str) {
        if self.current.is_empty() {
            self.current = self.prefix();
        }
        self.current.push(Span::styled(text.to_string(), self.style()));
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            let spans = std::mem::take(&mut self.current);
            self.lines.push(Line::from(spans));
        }
    }

    /// Separates blocks with one blank line.
    fn blank(&mut self) {
        self.flush();
        if self.lines.last().is_some_and(|l| l.width() > 0) {
            self.lines.push(Line::from(""));
        }
    }

    fn code_block(&mut self, text: &str) {
        let style = Style::default().fg(Color::Yellow).bg(CODE_BG);
        for line in text.lines() {
            let mut spans = self.prefix();
            spans.push(Span::styled(format!("  {line}"), style));
            self.lines.push(Line::from(spans));
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {}
            Tag::Heading { level, .. } => {
                self.blank();
                let color = if level == HeadingLevel::H1 { Color::Cyan } else { Color::LightCyan };
                self.push_style(|s| s.fg(color).add_modifier(Modifier::BOLD));
            }
            Tag::BlockQuote { .. } => {
                self.blank();
                self.quote_depth += 1;
                self.push_style(|s| s.fg(Color::Gray).add_modifier(Modifier::ITALIC));
            }
            Tag::CodeBlock { .. } => {
                self.flush();
                self.in_code_block = true;
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.blank();
                } else {
                    self.flush();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let m = format!("{indent}{n}. ");
                        *n += 1;
                        m
                    }
                    _ => format!("{indent}• "),
                };
                self.current = self.prefix();
                self.current.push(Span::styled(marker, Style::default().fg(Color::Cyan)));
            }
            Tag::Table(_) => self.blank(),
            Tag::TableHead => {
                self.flush();
                self.table_cells = 0;
                self.push_style(|s| s.add_modifier(Modifier::BOLD));
            }
            Tag::TableRow => {
                self.flush();
                self.table_cells = 0;
            }
            Tag::TableCell => {
                if self.current.is_empty() {
                    self.current = self.prefix();
                }
                if self.table_cells > 0 {
                    self.current.push(Span::styled(" │ ", Style::default().fg(Color::DarkGray)));
                }
                self.table_cells += 1;
            }
            Tag::Emphasis => self.push_style(|s| s.add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(|s| s.add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => self.push_style(|s| s.add_modifier(Modifier::CROSSED_OUT)),
            Tag::Link { dest_url, .. } => {
                self.link_dest = Some(dest_url.to_string());
                self.push_style(|s| s.fg(Color::LightBlue).add_modifier(Modifier::UNDERLINED));
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.blank(),
            TagEnd::Heading { .. } => {
                self.pop_style();
                self.blank();
            }
            TagEnd::BlockQuote { .. } => {
                self.pop_style();
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.blank();
            }
            TagEnd::CodeBlock { .. } => {
                self.in_code_block = false;
                self.blank();
            }
            TagEnd::List { .. } => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Item { .. } => self.flush(),
            TagEnd::TableHead => {
                self.pop_style();
                let width = self.current.iter().map(|s| s.width()).sum::<usize>();
                self.flush();
                let mut spans = self.prefix();
                spans.push(Span::styled("─".repeat(width), Style::default().fg(Color::DarkGray)));
                self.lines.push(Line::from(spans));
            }
            TagEnd::TableRow => self.flush(),
            TagEnd::Table => self.blank(),
            TagEnd::Emphasis { .. } | TagEnd::Strong { .. } | TagEnd::Strikethrough { .. } => {
                self.pop_style()
            }
            TagEnd::Link { .. } => {
                self.pop_style();
                if let Some(dest) = self.link_dest.take() {
                    self.text(&format!(" ({dest})"));
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(|l| l.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }
}

/// Renders Markdown into styled lines. Single newlines break the line and GFM
/// tables are drawn one row per line. Raw HTML is shown as literal text.
pub fn render(text: &str) -> Vec<Line<'static>> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_TABLES);

    let mut r = Renderer::new();
    for event in Parser::new_ext(text, options) {
        match event {
            Event::Start(tag) => r.start(tag),
            Event::End(tag) => r.end(tag),
            Event::Text(t) if r.in_code_block => r.code_block(&t),
            Event::Text(t) => r.text(&t),
            Event::Code(code) => {
                if r.current.is_empty() {
                    r.current = r.prefix();
                }
                r.current.push(Span::styled(
                    code.to_string(),
                    Style::default().fg(Color::Yellow).bg(CODE_BG),
                ));
            }
            Event::Html(html) | Event::InlineHtml(html) => r.text(html.trim_end_matches('\n')),
            Event::SoftBreak | Event::HardBreak => r.flush(),
            Event::Rule => {
                r.blank();
                r.lines.push(Line::from(Span::styled(
                    "─".repeat(24),
                    Style::default().fg(Color::DarkGray),
                )));
                r.blank();
            }
            Event::TaskListMarker(done) => r.text(if done { "[x] " } else { "[ ] " }),
            _ => {}
        }
    }
    r.finish()
}
