//! Markdown rendering for assistant replies

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Parser, Tag, TagEnd};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

pub fn heading_style(level: HeadingLevel) -> Style {
    match level {
        HeadingLevel::H1 => Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        HeadingLevel::H2 => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        HeadingLevel::H3 => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        _ => Style::default().add_modifier(Modifier::BOLD),
    }
}

pub fn inline_code_style() -> Style {
    Style::default().fg(Color::LightRed).bg(Color::Black)
}

fn code_block_style() -> Style {
    Style::default().fg(Color::Green)
}

fn marker_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

/// One level of list nesting; `next` is the upcoming number for ordered lists
struct ListLevel {
    next: Option<u64>,
    // Width of the current item's marker, so continuation lines line up
    indent: usize,
}

struct Renderer {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    lists: Vec<ListLevel>,
    in_code_block: bool,
    code: String,
    // A list marker has been pushed but no item text follows it yet
    marker_pending: bool,
}

impl Renderer {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            current: Vec::new(),
            styles: vec![Style::default()],
            lists: Vec::new(),
            in_code_block: false,
            code: String::new(),
            marker_pending: false,
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, patch: Style) {
        let style = self.style().patch(patch);
        self.styles.push(style);
    }

    fn pop_style(&mut self) {
        if self.styles.len() > 1 {
            self.styles.pop();
        }
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.current)));
        }
    }

    fn blank(&mut self) {
        let last_blank = self.lines.last().map_or(true, |l| l.width() == 0);
        if !last_blank {
            self.lines.push(Line::default());
        }
    }

    fn start(&mut self, tag: Tag) {
        match tag {
            Tag::Paragraph => {
                if !self.marker_pending {
                    self.flush();
                    self.continue_item();
                }
            }
            Tag::Heading { level, .. } => {
                self.flush();
                self.push_style(heading_style(level));
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                self.in_code_block = true;
                self.code.clear();
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        self.lines
                            .push(Line::from(Span::styled(format!("  [{}]", lang), marker_style())));
                    }
                }
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(ListLevel { next: start, indent: 0 });
            }
            Tag::Item => {
                self.flush();
                let depth = self.lists.len().saturating_sub(1);
                let indent = "  ".repeat(depth);
                let marker = match self.lists.last_mut() {
                    Some(ListLevel { next: Some(n), .. }) => {
                        let marker = format!("{}{}. ", indent, n);
                        *n += 1;
                        marker
                    }
                    _ => format!("{}• ", indent),
                };
                let marker = Span::styled(marker, marker_style());
                if let Some(level) = self.lists.last_mut() {
                    level.indent = marker.width();
                }
                self.current.push(marker);
                self.marker_pending = true;
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { .. } => self.push_style(
                Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::UNDERLINED),
            ),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Heading(_) => {
                self.flush();
                self.pop_style();
                self.blank();
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                let code = std::mem::take(&mut self.code);
                for code_line in code.lines() {
                    self.lines.push(Line::from(Span::styled(
                        format!("  {}", code_line),
                        code_block_style(),
                    )));
                }
                self.blank();
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Item => {
                self.flush();
                self.marker_pending = false;
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                self.pop_style()
            }
            _ => {}
        }
    }

    /// Line break: inside a list item the next line is indented under the
    /// item text instead of starting at the margin.
    fn line_break(&mut self) {
        self.flush();
        self.continue_item();
    }

    fn continue_item(&mut self) {
        if let Some(level) = self.lists.last() {
            if level.indent > 0 {
                self.current.push(Span::raw(" ".repeat(level.indent)));
            }
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_code_block {
            self.code.push_str(text);
            return;
        }
        self.marker_pending = false;
        let style = self.style();
        self.current.push(Span::styled(text.to_string(), style));
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(|l| l.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }
}

/// Convert a markdown reply into styled lines.
///
/// Line breaks inside a paragraph are kept as written rather than reflowed,
/// since replies often use them for layout.
pub fn render_markdown(text: &str) -> Vec<Line<'static>> {
    let mut renderer = Renderer::new();

    for event in Parser::new(text) {
        match event {
            Event::Start(tag) => renderer.start(tag),
            Event::End(tag) => renderer.end(tag),
            Event::Text(text) => renderer.text(&text),
            Event::Code(code) => {
                renderer.marker_pending = false;
                renderer
                    .current
                    .push(Span::styled(code.to_string(), inline_code_style()));
            }
            // Block HTML arrives one source line per event
            Event::Html(html) => {
                renderer.text(html.trim_end_matches('\n'));
                renderer.flush();
            }
            Event::InlineHtml(html) => renderer.text(&html),
            Event::SoftBreak | Event::HardBreak => renderer.line_break(),
            Event::Rule => {
                renderer.flush();
                renderer
                    .lines
                    .push(Line::from(Span::styled("─".repeat(24), marker_style())));
                renderer.blank();
            }
            _ => {}
        }
    }

    renderer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn texts(lines: &[Line]) -> Vec<String> {
        lines.iter().map(text_of).collect()
    }

    #[test]
    fn test_plain_paragraph() {
        let lines = render_markdown("Hello, world!");
        assert_eq!(texts(&lines), vec!["Hello, world!"]);
    }

    #[test]
    fn test_line_breaks_preserved() {
        let lines = render_markdown("first line\nsecond line\n\nnext paragraph");
        assert_eq!(
            texts(&lines),
            vec!["first line", "second line", "", "next paragraph"]
        );
    }

    #[test]
    fn test_inline_code_styled() {
        let lines = render_markdown("run `cargo test` now");
        assert_eq!(texts(&lines), vec!["run cargo test now"]);
        let code = lines[0]
            .spans
            .iter()
            .find(|s| s.content == "cargo test")
            .unwrap();
        assert_eq!(code.style, inline_code_style());
        let plain = lines[0].spans.iter().find(|s| s.content == "run ").unwrap();
        assert_ne!(plain.style, code.style);
    }

    #[test]
    fn test_heading_levels_distinct() {
        let lines = render_markdown("# One\n## Two\n### Three\nbody");
        let style_of = |wanted: &str| {
            lines
                .iter()
                .find(|l| text_of(l) == wanted)
                .map(|l| l.spans[0].style)
                .unwrap()
        };

        let (h1, h2, h3, body) = (style_of("One"), style_of("Two"), style_of("Three"), style_of("body"));
        assert_eq!(h1, heading_style(HeadingLevel::H1));
        assert_ne!(h1, h2);
        assert_ne!(h2, h3);
        assert_ne!(h1, h3);
        assert_eq!(body, Style::default());
    }

    #[test]
    fn test_unordered_list() {
        let lines = render_markdown("- apples\n- pears");
        assert_eq!(texts(&lines), vec!["• apples", "• pears"]);
    }

    #[test]
    fn test_ordered_list_numbering() {
        let lines = render_markdown("3. third\n4. fourth\n5. fifth");
        assert_eq!(texts(&lines), vec!["3. third", "4. fourth", "5. fifth"]);
    }

    #[test]
    fn test_nested_list_indents() {
        let lines = render_markdown("1. outer\n   - inner\n2. next");
        assert_eq!(texts(&lines), vec!["1. outer", "  • inner", "2. next"]);
    }

    #[test]
    fn test_loose_list_keeps_marker_with_text() {
        let lines = render_markdown("- one\n\n- two");
        assert_eq!(texts(&lines), vec!["• one", "• two"]);
    }

    #[test]
    fn test_list_item_continuation_indented() {
        let lines = render_markdown("- one\n  two\n- three");
        assert_eq!(texts(&lines), vec!["• one", "  two", "• three"]);

        let lines = render_markdown("1. first\n   second");
        assert_eq!(texts(&lines), vec!["1. first", "   second"]);
    }

    #[test]
    fn test_loose_item_second_paragraph_indented() {
        let lines = render_markdown("- one\n\n  more\n\n- two");
        assert_eq!(texts(&lines), vec!["• one", "  more", "• two"]);
    }

    #[test]
    fn test_html_block_keeps_lines() {
        let lines = render_markdown("<div>\n<p>hi</p>\n</div>");
        assert_eq!(texts(&lines), vec!["<div>", "<p>hi</p>", "</div>"]);
    }

    #[test]
    fn test_bold_text() {
        let lines = render_markdown("a **strong** point");
        let strong = lines[0].spans.iter().find(|s| s.content == "strong").unwrap();
        assert!(strong.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_code_block_indented() {
        let lines = render_markdown("```\nfn main() {}\n```");
        assert_eq!(texts(&lines), vec!["  fn main() {}"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(render_markdown("").is_empty());
    }
}
