use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthChar;
use crate::app::App;
use crate::chat::{ChatRole, ChatView};
use crate::markdown::render_markdown;

fn user_style() -> Style {
    Style::default().fg(Color::Cyan)
}

fn assistant_label_style() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

/// Build the transcript: user turns on the right, assistant turns on the
/// left, then the thinking placeholder while a request is in flight.
pub fn transcript_lines(chat: &ChatView, animation_frame: u8) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in chat.messages() {
        match msg.role {
            ChatRole::User => {
                lines.push(
                    Line::from(Span::styled("You", user_style().add_modifier(Modifier::BOLD)))
                        .right_aligned(),
                );
                for line in msg.content.lines() {
                    lines.push(Line::from(Span::styled(line.to_string(), user_style())).right_aligned());
                }
            }
            ChatRole::Assistant => {
                lines.push(Line::from(Span::styled("Assistant", assistant_label_style())));
                lines.extend(render_markdown(&msg.content));
            }
        }
        lines.push(Line::default());
    }

    if chat.is_loading() {
        lines.push(Line::from(Span::styled("Assistant", assistant_label_style())));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat(animation_frame as usize + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

/// Slice of the input that fits in `width` columns with the cursor visible.
///
/// Returns the visible text and the cursor's column within it. Columns are
/// display width, so wide (CJK, emoji) characters take two.
fn input_window(input: &str, cursor: usize, width: usize) -> (String, u16) {
    if width == 0 {
        return (String::new(), 0);
    }

    let widths: Vec<usize> = input.chars().map(|c| c.width().unwrap_or(0)).collect();
    let cursor = cursor.min(widths.len());

    // Drop chars from the left until the cursor cell fits
    let mut start = 0;
    let mut before: usize = widths[..cursor].iter().sum();
    while start < cursor && before + 1 > width {
        before -= widths[start];
        start += 1;
    }

    let mut used = 0;
    let visible: String = input
        .chars()
        .skip(start)
        .take_while(|c| {
            let w = c.width().unwrap_or(0);
            if used + w > width {
                return false;
            }
            used += w;
            true
        })
        .collect();

    (visible, before.min(u16::MAX as usize) as u16)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" AI Profs ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.client.base_url().to_string(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store dimensions for scroll calculations (inner size minus borders)
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Chat ");

    if app.chat.messages().is_empty() && !app.chat.is_loading() {
        let hint = Paragraph::new(Text::from(Span::styled(
            "Ask a question about your course material...",
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        frame.render_widget(hint, area);
        return;
    }

    let lines = transcript_lines(&app.chat, app.animation_frame);
    let chat = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });

    // Measured without the block so the count is inner rows only
    let rows = chat.line_count(app.chat_width);
    app.clamp_scroll(rows.min(u16::MAX as usize) as u16);

    let chat = chat.block(block).scroll((app.scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let loading = app.chat.is_loading();
    let border_color = if loading { Color::DarkGray } else { Color::Yellow };
    let title = if loading {
        " Waiting for reply... "
    } else {
        " Message (Enter to send) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) = input_window(&app.chat.input, app.cursor, inner_width);

    let input = Paragraph::new(visible_text).style(user_style()).block(block);
    frame.render_widget(input, area);

    if !loading {
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = if app.chat.is_loading() {
        (" WAITING ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" READY ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    let hints = " Enter send | ↑↓/PgUp/PgDn scroll | Esc quit ";

    let footer = Line::from(vec![
        Span::styled(mode_text, mode_style),
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
    ]);

    frame.render_widget(Paragraph::new(footer), area);
}
