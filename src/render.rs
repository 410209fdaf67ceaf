//! Terminal rendering of a formatted report.
//!
//! Rendering is a pure function of the [`FormattedResult`]: the output is
//! built line by line and returned, nothing is written to the terminal here.
//!
//! ```text
//! red                      <- group header, colored by name
//!   PASS (1)               <- status summary, colored by status
//!     #1 login
//!   FAIL (1)
//!     #2 checkout
//!       expected 200 got 500...   <- first 60 chars of errorDetails
//! ```

use console::{Color, Style};

use crate::model::{FormattedResult, StatusBucket, TestRecord, TestStatus};

/// Message rendered when there is nothing to show.
pub const NO_DATA_MESSAGE: &str = "No formatted data to display.";

/// Maximum number of characters of error details shown per item.
pub const ERROR_PREVIEW_CHARS: usize = 60;

/// Known color words, checked in order against group names.
const GROUP_COLORS: &[(&str, Color)] = &[
    ("red", Color::Red),
    ("green", Color::Green),
    ("yellow", Color::Yellow),
    ("blue", Color::Blue),
    ("magenta", Color::Magenta),
    ("purple", Color::Magenta),
    ("cyan", Color::Cyan),
    ("orange", Color::Color256(208)),
    ("black", Color::Black),
];

/// Color used for groups whose name contains no known color word.
const OTHER_GROUP_COLOR: Color = Color::White;

/// Picks the header color for a group name.
///
/// This is a case-insensitive substring lookup, so "DarkRed" is red and
/// "TestColor" falls back to the default.
pub fn group_color(name: &str) -> Color {
    let name = name.to_lowercase();
    GROUP_COLORS
        .iter()
        .find(|(word, _)| name.contains(word))
        .map(|(_, color)| *color)
        .unwrap_or(OTHER_GROUP_COLOR)
}

fn status_style(status: TestStatus) -> Style {
    match status {
        TestStatus::Pass => Style::new().green(),
        TestStatus::Fail => Style::new().red(),
        TestStatus::Pending => Style::new().yellow(),
        TestStatus::Skipped => Style::new().dim(),
    }
}

/// Shortens error details for display.
///
/// The ellipsis is always appended, even when nothing was cut.
pub fn error_preview(details: &str) -> String {
    let head: String = details.chars().take(ERROR_PREVIEW_CHARS).collect();
    format!("{}...", head)
}

/// Renders formatted reports as text.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    styled: bool,
}

impl Renderer {
    /// Creates a renderer. When `styled` is false no ANSI codes are emitted.
    pub fn new(styled: bool) -> Self {
        Self { styled }
    }

    /// A renderer that never emits ANSI codes.
    pub fn plain() -> Self {
        Self::new(false)
    }

    /// Renders the result into a single multi-line string.
    pub fn render(&self, result: Option<&FormattedResult>) -> String {
        self.render_lines(result).join("\n")
    }

    /// Renders the result into display lines.
    pub fn render_lines(&self, result: Option<&FormattedResult>) -> Vec<String> {
        let result = match result {
            Some(result) if !result.is_empty() => result,
            _ => return vec![self.paint(NO_DATA_MESSAGE, Style::new().dim())],
        };

        let mut lines = Vec::new();
        for (group, bucket) in result {
            self.render_group(group, bucket, &mut lines);
        }
        lines
    }

    fn render_group(&self, group: &str, bucket: &StatusBucket, lines: &mut Vec<String>) {
        let header = Style::new().fg(group_color(group)).bold();
        lines.push(self.paint(group, header));

        for status in TestStatus::ALL {
            let records = bucket.records(status);
            if records.is_empty() {
                continue;
            }

            let summary = format!(
                "{} ({})",
                status.label().to_uppercase(),
                records.len()
            );
            lines.push(format!("  {}", self.paint(&summary, status_style(status))));

            for record in records {
                self.render_item(record, lines);
            }
        }
    }

    fn render_item(&self, record: &TestRecord, lines: &mut Vec<String>) {
        lines.push(format!("    #{} {}", record.id, record.value));

        if let Some(details) = &record.error_details {
            let preview = error_preview(details);
            lines.push(format!("      {}", self.paint(&preview, Style::new().dim())));
        }
    }

    fn paint(&self, text: &str, style: Style) -> String {
        style.force_styling(self.styled).apply_to(text).to_string()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_of_each() -> FormattedResult {
        let mut bucket = StatusBucket::default();
        bucket.push(TestRecord::new(1, "login", "red", TestStatus::Pass));
        bucket.push(
            TestRecord::new(2, "checkout", "red", TestStatus::Fail)
                .with_error_details("x".repeat(75)),
        );
        bucket.push(TestRecord::new(3, "search", "red", TestStatus::Pending));
        bucket.push(TestRecord::new(4, "export", "red", TestStatus::Skipped));

        let mut result = FormattedResult::new();
        result.insert("red".to_string(), bucket);
        result
    }

    #[test]
    fn test_render_none_and_empty() {
        let renderer = Renderer::plain();

        assert_eq!(renderer.render(None), NO_DATA_MESSAGE);
        assert_eq!(renderer.render(Some(&FormattedResult::new())), NO_DATA_MESSAGE);
    }

    #[test]
    fn test_render_one_item_per_status() {
        let lines = Renderer::plain().render_lines(Some(&one_of_each()));

        assert_eq!(
            lines,
            vec![
                "red".to_string(),
                "  PASS (1)".to_string(),
                "    #1 login".to_string(),
                "  FAIL (1)".to_string(),
                "    #2 checkout".to_string(),
                format!("      {}...", "x".repeat(60)),
                "  PENDING (1)".to_string(),
                "    #3 search".to_string(),
                "  SKIPPED (1)".to_string(),
                "    #4 export".to_string(),
            ]
        );
    }

    #[test]
    fn test_short_error_details_still_get_ellipsis() {
        assert_eq!(error_preview("timeout"), "timeout...");
        assert_eq!(error_preview(""), "...");
    }

    #[test]
    fn test_error_preview_counts_chars_not_bytes() {
        let details = "é".repeat(70);
        assert_eq!(error_preview(&details), format!("{}...", "é".repeat(60)));
    }

    #[test]
    fn test_empty_bucket_renders_header_only() {
        let mut result = FormattedResult::new();
        result.insert("blue".to_string(), StatusBucket::default());

        assert_eq!(Renderer::plain().render_lines(Some(&result)), vec!["blue"]);
    }

    #[test]
    fn test_groups_render_in_key_order() {
        let result: FormattedResult =
            serde_json::from_str(r#"{"zeta":{},"alpha":{}}"#).unwrap();

        assert_eq!(Renderer::plain().render(Some(&result)), "zeta\nalpha");
    }

    #[test]
    fn test_group_color_substring_lookup() {
        assert_eq!(group_color("red"), Color::Red);
        assert_eq!(group_color("DarkRed"), Color::Red);
        assert_eq!(group_color("Purple Rain"), Color::Magenta);
        assert_eq!(group_color("orange"), Color::Color256(208));
        assert_eq!(group_color("TestColor"), OTHER_GROUP_COLOR);
    }

    #[test]
    fn test_styled_output_contains_ansi() {
        let styled = Renderer::new(true).render(Some(&one_of_each()));
        let plain = Renderer::plain().render(Some(&one_of_each()));

        assert!(styled.contains("\u{1b}["));
        assert!(!plain.contains("\u{1b}["));
        assert_eq!(console::strip_ansi_codes(&styled), plain);
    }
}
