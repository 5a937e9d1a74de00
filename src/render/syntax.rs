use std::sync::OnceLock;

use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME: OnceLock<Theme> = OnceLock::new();

/// Highlights `code` as ANSI-escaped lines, without trailing newlines.
pub fn highlight_code(code: &str, language: Option<&str>) -> Vec<String> {
    let syntax_set = syntax_set();
    let syntax = language
        .and_then(|lang| syntax_set.find_syntax_by_token(lang))
        .unwrap_or_else(|| syntax_set.find_syntax_plain_text());
    let mut highlighter = HighlightLines::new(syntax, theme());
    LinesWithEndings::from(code)
        .map(|line| {
            let regions = highlighter
                .highlight_line(line, syntax_set)
                .unwrap_or_default();
            let escaped = as_24_bit_terminal_escaped(&regions, false);
            format!("{}\x1b[0m", escaped.trim_end_matches(['\n', '\r']))
        })
        .collect()
}

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme() -> &'static Theme {
    THEME.get_or_init(|| {
        let themes = ThemeSet::load_defaults();
        themes
            .themes
            .get("base16-ocean.dark")
            .cloned()
            .unwrap_or_else(|| themes.themes.values().next().cloned().unwrap_or_default())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_one_output_line_per_input_line() {
        let lines = highlight_code("fn main() {\n    println!(\"hi\");\n}\n", Some("rust"));
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("println"));
    }

    #[test]
    fn unknown_language_falls_back_to_plain_text() {
        let lines = highlight_code("just words", Some("no-such-language"));
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("just words"));
    }
}
