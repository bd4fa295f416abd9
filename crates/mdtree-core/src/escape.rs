//! Escaping of literal Markdown metacharacters in text runs

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static LINE_START_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\+ |[\-*>])").expect("valid regex"));
static LINE_START_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)(#{1,6})(\s|$)").expect("valid regex"));
static LINE_START_ORDERED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*[0-9]+)([.)])(\s|$)").expect("valid regex"));

/// Where the text being escaped is written
#[derive(Debug, Clone, Copy, Default)]
pub struct EscapeContext<'a> {
    /// The text starts a line, so block markers must be neutralized
    pub start_of_line: bool,
    /// The text sits in a pipe table cell
    pub in_table: bool,
    /// Extra characters to escape everywhere
    pub extra: Option<&'a Regex>,
}

/// Backslash-escape Markdown metacharacters in `text`.
///
/// `` ` * \ ~ [ ] _ `` are always escaped, except an underscore between two
/// word characters. `#`, `-`, `+ `, `>` and `1.` / `1)` markers are escaped
/// only at the start of a line.
pub fn escape(text: &str, cx: EscapeContext<'_>) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);

    for (i, &c) in chars.iter().enumerate() {
        let special = match c {
            '`' | '*' | '\\' | '~' | '[' | ']' => true,
            '_' => !is_intraword(&chars, i),
            '|' => cx.in_table,
            _ => false,
        };
        if special {
            out.push('\\');
        }
        out.push(c);
    }

    if cx.start_of_line {
        out = LINE_START_MARKER.replace(&out, "\\$1").into_owned();
        out = LINE_START_HEADING
            .replace(&out, |caps: &Captures| format!("{}\\{}{}", &caps[1], &caps[2], &caps[3]))
            .into_owned();
        out = LINE_START_ORDERED
            .replace(&out, |caps: &Captures| format!("{}\\{}{}", &caps[1], &caps[2], &caps[3]))
            .into_owned();
    }

    if let Some(extra) = cx.extra {
        out = extra.replace_all(&out, "\\$0").into_owned();
    }

    out
}

fn is_intraword(chars: &[char], i: usize) -> bool {
    let is_word = |c: &char| c.is_ascii_alphanumeric() || *c == '_';
    i > 0
        && chars.get(i - 1).is_some_and(is_word)
        && chars.get(i + 1).is_some_and(is_word)
}

/// Wrap a link or image title in the first delimiter pair it does not contain
pub fn quote(text: &str) -> String {
    let (open, close) = if !text.contains('"') {
        ('"', '"')
    } else if !text.contains('\'') {
        ('\'', '\'')
    } else {
        ('(', ')')
    };
    format!("{open}{text}{close}")
}

/// Length of the longest run of `c` in `text`
pub fn longest_run(text: &str, c: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == c {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn esc(text: &str) -> String {
        escape(text, EscapeContext::default())
    }

    fn esc_line(text: &str) -> String {
        escape(
            text,
            EscapeContext {
                start_of_line: true,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_escape_inline_metacharacters() {
        assert_eq!(esc("*test*"), "\\*test\\*");
        assert_eq!(esc("_test_"), "\\_test\\_");
        assert_eq!(esc("[link]"), "\\[link\\]");
        assert_eq!(esc("a\\b `c` ~d~"), "a\\\\b \\`c\\` \\~d\\~");
        assert_eq!(esc("normal text"), "normal text");
    }

    #[test]
    fn test_intraword_underscore_kept() {
        assert_eq!(esc("snake_case_name"), "snake_case_name");
        assert_eq!(esc("_private"), "\\_private");
        assert_eq!(esc("trailing_"), "trailing\\_");
    }

    #[test]
    fn test_line_start_only_escapes() {
        assert_eq!(esc("# not a heading"), "# not a heading");
        assert_eq!(esc_line("# not a heading"), "\\# not a heading");
        assert_eq!(esc_line("#hashtag"), "#hashtag");
        assert_eq!(esc_line("1. first"), "1\\. first");
        assert_eq!(esc_line("2) second"), "2\\) second");
        assert_eq!(esc("1. mid-line"), "1. mid-line");
        assert_eq!(esc_line("> quote"), "\\> quote");
        assert_eq!(esc_line("- item"), "\\- item");
        assert_eq!(esc_line("+ item"), "\\+ item");
        assert_eq!(esc_line("+1"), "+1");
        assert_eq!(esc_line("* star"), "\\* star");
    }

    #[test]
    fn test_bare_ordered_marker_escaped() {
        assert_eq!(esc_line("1."), "1\\.");
        assert_eq!(esc_line("2)"), "2\\)");
        assert_eq!(esc_line("3.\tthird"), "3\\.\tthird");
        assert_eq!(esc_line("1.5 liters"), "1.5 liters");
        assert_eq!(esc_line("-"), "\\-");
    }

    #[test]
    fn test_table_pipes() {
        let cx = EscapeContext {
            in_table: true,
            ..Default::default()
        };
        assert_eq!(escape("a | b", cx), "a \\| b");
        assert_eq!(esc("a | b"), "a | b");
    }

    #[test]
    fn test_extra_characters() {
        let extra = Regex::new(r"[<>]").unwrap();
        let cx = EscapeContext {
            extra: Some(&extra),
            ..Default::default()
        };
        assert_eq!(escape("a <b>", cx), "a \\<b\\>");
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("title"), "\"title\"");
        assert_eq!(quote("say \"hi\""), "'say \"hi\"'");
        assert_eq!(quote("it's \"x\""), "(it's \"x\")");
    }

    #[test]
    fn test_longest_run() {
        assert_eq!(longest_run("a``b```c`", '`'), 3);
        assert_eq!(longest_run("none", '`'), 0);
    }
}
