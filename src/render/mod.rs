//! Terminal output for completions, notices and chat history.

mod markdown;
mod syntax;

pub use markdown::render_markdown;
pub use syntax::highlight_code;

use crossterm::style::{Color, Stylize};
use crossterm::terminal;

use crate::chat::{Message, MessageRole};

const FALLBACK_WIDTH: u16 = 80;

/// Sink for everything the assistant shows the user.
pub trait Printer: Send + Sync {
    /// Prints a model answer, rendered as Markdown when `markdown` is set.
    fn completion(&self, text: &str, markdown: bool);
    /// Repeats a line of user input that did not come from the keyboard.
    fn echo(&self, text: &str);
    /// Informational message, styled apart from model output.
    fn notice(&self, text: &str);
    /// Horizontal separator, optionally titled.
    fn rule(&self, title: Option<&str>);
    /// Replays a stored conversation.
    fn history(&self, messages: &[Message]);
}

/// Writes to stdout with ANSI styling.
#[derive(Debug, Clone)]
pub struct TerminalPrinter {
    color: Color,
    prettify: bool,
}

impl TerminalPrinter {
    /// `prettify` turns Markdown rendering on for completions that ask for it.
    pub fn new(color: Color, prettify: bool) -> Self {
        Self { color, prettify }
    }

    /// Builds a printer from a color name such as `magenta` or `dark_cyan`.
    pub fn from_color_name(name: &str, prettify: bool) -> Self {
        let color = Color::try_from(name).unwrap_or(Color::Magenta);
        Self::new(color, prettify)
    }

    fn width() -> usize {
        terminal::size()
            .map(|(cols, _)| cols)
            .unwrap_or(FALLBACK_WIDTH)
            .into()
    }
}

impl Default for TerminalPrinter {
    fn default() -> Self {
        Self::new(Color::Magenta, true)
    }
}

impl Printer for TerminalPrinter {
    fn completion(&self, text: &str, markdown: bool) {
        if markdown && self.prettify {
            println!("{}", render_markdown(text));
        } else {
            println!("{}", text.with(self.color));
        }
    }

    fn echo(&self, text: &str) {
        println!("{text}");
    }

    fn notice(&self, text: &str) {
        println!("{}", text.italic().dim());
    }

    fn rule(&self, title: Option<&str>) {
        println!("{}", rule_line(Self::width(), title).dim());
    }

    fn history(&self, messages: &[Message]) {
        for message in messages {
            match message.role {
                MessageRole::User => println!("{}", format!(">>> {}", message.content).bold()),
                MessageRole::Assistant if !message.content.is_empty() => {
                    println!("{}", message.content.as_str().with(self.color))
                }
                _ => {}
            }
        }
    }
}

/// A rule of `width` columns with `title` centered in it.
fn rule_line(width: usize, title: Option<&str>) -> String {
    let Some(title) = title.filter(|t| !t.is_empty()) else {
        return "─".repeat(width);
    };
    let label = format!(" {title} ");
    let side = width.saturating_sub(label.chars().count());
    let left = side / 2;
    format!("{}{label}{}", "─".repeat(left), "─".repeat(side - left))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titled_rule_is_centered() {
        assert_eq!(rule_line(12, Some("Chat")), "─── Chat ───");
        assert_eq!(rule_line(13, Some("Chat")).chars().count(), 13);
    }

    #[test]
    fn untitled_rule_fills_width() {
        assert_eq!(rule_line(5, None), "─────");
        assert_eq!(rule_line(3, Some("")), "───");
    }

    #[test]
    fn unknown_color_name_falls_back_to_magenta() {
        let printer = TerminalPrinter::from_color_name("not-a-color", false);
        assert_eq!(printer.color, Color::Magenta);
        let printer = TerminalPrinter::from_color_name("cyan", false);
        assert_eq!(printer.color, Color::Cyan);
    }
}
