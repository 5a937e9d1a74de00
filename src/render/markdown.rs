use crossterm::style::{Color, ContentStyle, Stylize};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use super::syntax::highlight_code;

mod code_block {
    pub const TOP_LEFT: &str = "┌";
    pub const TOP_RIGHT: &str = "┐";
    pub const BOTTOM_LEFT: &str = "└";
    pub const BOTTOM_RIGHT: &str = "┘";
    pub const HORIZONTAL: &str = "─";
    pub const VERTICAL: &str = "│";
}

struct MarkdownStyles {
    h1: ContentStyle,
    h2: ContentStyle,
    h3: ContentStyle,
    code: ContentStyle,
    emphasis: ContentStyle,
    strong: ContentStyle,
    strikethrough: ContentStyle,
    list_marker: ContentStyle,
    link: ContentStyle,
    blockquote: ContentStyle,
    code_border: ContentStyle,
}

impl Default for MarkdownStyles {
    fn default() -> Self {
        let accent = Color::Rgb {
            r: 217,
            g: 119,
            b: 87,
        };
        let dim_gray = Color::Rgb {
            r: 100,
            g: 95,
            b: 90,
        };
        let muted_gray = Color::Rgb {
            r: 140,
            g: 135,
            b: 130,
        };
        Self {
            h1: ContentStyle::new().bold().underlined(),
            h2: ContentStyle::new().bold(),
            h3: ContentStyle::new().bold().italic(),
            code: ContentStyle::new().with(accent).bold(),
            emphasis: ContentStyle::new().italic(),
            strong: ContentStyle::new().bold(),
            strikethrough: ContentStyle::new().crossed_out(),
            list_marker: ContentStyle::new().with(accent),
            link: ContentStyle::new().with(accent).underlined(),
            blockquote: ContentStyle::new().with(muted_gray).italic(),
            code_border: ContentStyle::new().with(dim_gray),
        }
    }
}

/// Renders Markdown into ANSI-styled terminal text.
pub fn render_markdown(input: &str) -> String {
    let mut renderer = Renderer::new();
    renderer.run(input);
    renderer.lines.join("\n")
}

struct Renderer {
    lines: Vec<String>,
    current: String,
    styles: MarkdownStyles,
    inline_styles: Vec<ContentStyle>,
    list_stack: Vec<Option<u64>>,
    pending_marker: Option<String>,
    in_code_block: bool,
    code_block_lang: Option<String>,
    code_block_buf: String,
}

impl Renderer {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            current: String::new(),
            styles: MarkdownStyles::default(),
            inline_styles: Vec::new(),
            list_stack: Vec::new(),
            pending_marker: None,
            in_code_block: false,
            code_block_lang: None,
            code_block_buf: String::new(),
        }
    }

    fn run(&mut self, input: &str) {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        for event in Parser::new_ext(input, options) {
            self.handle_event(event);
        }
        self.flush_line();
    }

    fn handle_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.push_text(&text),
            Event::Code(code) => {
                let styled = self.styles.code.apply(code.to_string());
                self.current.push_str(&styled.to_string());
            }
            Event::SoftBreak => self.push_text(" "),
            Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.flush_line();
                self.lines.push(code_block::HORIZONTAL.repeat(24));
            }
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                let style = match level {
                    HeadingLevel::H1 => self.styles.h1,
                    HeadingLevel::H2 => self.styles.h2,
                    _ => self.styles.h3,
                };
                self.inline_styles.push(style);
            }
            Tag::Emphasis => self.inline_styles.push(self.styles.emphasis),
            Tag::Strong => self.inline_styles.push(self.styles.strong),
            Tag::Strikethrough => self.inline_styles.push(self.styles.strikethrough),
            Tag::BlockQuote(_) => self.inline_styles.push(self.styles.blockquote),
            Tag::Link { .. } => self.inline_styles.push(self.styles.link),
            Tag::List(start) => {
                self.flush_line();
                self.list_stack.push(start);
            }
            Tag::Item => self.push_list_marker(),
            Tag::CodeBlock(kind) => self.start_code_block(kind),
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) | TagEnd::Paragraph => self.flush_line(),
            TagEnd::Emphasis
            | TagEnd::Strong
            | TagEnd::Strikethrough
            | TagEnd::Link => {
                self.inline_styles.pop();
            }
            TagEnd::BlockQuote(_) => {
                self.inline_styles.pop();
                self.flush_line();
            }
            TagEnd::List(_) => {
                self.list_stack.pop();
                self.flush_line();
            }
            TagEnd::Item => self.flush_line(),
            TagEnd::CodeBlock => self.end_code_block(),
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.in_code_block {
            self.code_block_buf.push_str(text);
            return;
        }
        match self.inline_styles.last() {
            Some(style) => self.current.push_str(&style.apply(text).to_string()),
            None => self.current.push_str(text),
        }
    }

    fn push_list_marker(&mut self) {
        let depth = self.list_stack.len().saturating_sub(1);
        let marker = match self.list_stack.last_mut() {
            Some(Some(num)) => {
                let marker = format!("{num}. ");
                *num += 1;
                marker
            }
            _ => "• ".to_string(),
        };
        let indent = "  ".repeat(depth);
        self.pending_marker = Some(format!(
            "{indent}{}",
            self.styles.list_marker.apply(marker)
        ));
    }

    fn start_code_block(&mut self, kind: CodeBlockKind<'_>) {
        self.flush_line();
        self.in_code_block = true;
        self.code_block_buf.clear();
        self.code_block_lang = match kind {
            CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
            _ => None,
        };
    }

    fn end_code_block(&mut self) {
        let lang = self.code_block_lang.take();
        let code_lines = highlight_code(&self.code_block_buf, lang.as_deref());
        let content_width = self
            .code_block_buf
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(20)
            .max(20);
        let box_width = content_width + 4;
        let border = self.styles.code_border;

        let header = format!(" {} ", lang.as_deref().unwrap_or("code"));
        let remaining = box_width.saturating_sub(3 + header.chars().count());
        self.lines.push(format!(
            "{}{}{}{}",
            border.apply(format!("{}{}", code_block::TOP_LEFT, code_block::HORIZONTAL)),
            header,
            border.apply(code_block::HORIZONTAL.repeat(remaining)),
            border.apply(code_block::TOP_RIGHT),
        ));
        for line in code_lines {
            self.lines
                .push(format!("{} {line}", border.apply(code_block::VERTICAL)));
        }
        self.lines.push(
            border
                .apply(format!(
                    "{}{}{}",
                    code_block::BOTTOM_LEFT,
                    code_block::HORIZONTAL.repeat(box_width.saturating_sub(2)),
                    code_block::BOTTOM_RIGHT
                ))
                .to_string(),
        );

        self.in_code_block = false;
        self.code_block_buf.clear();
    }

    fn flush_line(&mut self) {
        if self.current.is_empty() && self.pending_marker.is_none() {
            return;
        }
        let mut line = self.pending_marker.take().unwrap_or_default();
        line.push_str(&self.current);
        self.current.clear();
        self.lines.push(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_plain_text() {
        let text = render_markdown("Hello world");
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("Hello world"));
    }

    #[test]
    fn renders_code_block_with_language_header() {
        let text = render_markdown("```bash\nls -la\n```");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("bash"));
        assert!(lines[1].contains("ls"));
        assert!(lines[2].contains(code_block::BOTTOM_LEFT));
    }

    #[test]
    fn numbers_ordered_lists() {
        let text = render_markdown("1. first\n2. second");
        assert!(text.contains("1. "));
        assert!(text.contains("2. "));
        assert!(text.contains("second"));
    }

    #[test]
    fn marks_bullet_items() {
        let text = render_markdown("- item 1\n- item 2");
        assert_eq!(text.matches('•').count(), 2);
    }
}
