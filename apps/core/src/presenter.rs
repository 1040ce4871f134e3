use std::fmt::{Display, Formatter};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::HighlightSpan;
use crate::search::ActiveList;

pub const EMPTY_MESSAGE: &str = "No results found.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSegment {
    pub text: String,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRow {
    pub segments: Vec<TextSegment>,
    pub url: String,
    pub is_selected: bool,
}

impl RenderRow {
    pub fn plain_text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Wraps every highlighted segment in `open`/`close`, e.g. `<b>`/`</b>`.
    pub fn to_markup(&self, open: &str, close: &str) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            if segment.highlighted {
                out.push_str(open);
                out.push_str(&segment.text);
                out.push_str(close);
            } else {
                out.push_str(&segment.text);
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderInstruction {
    Empty { message: String },
    Rows { rows: Vec<RenderRow> },
}

impl RenderInstruction {
    pub fn rows(&self) -> &[RenderRow] {
        match self {
            Self::Empty { .. } => &[],
            Self::Rows { rows } => rows,
        }
    }

    pub fn selected_row(&self) -> Option<&RenderRow> {
        self.rows().iter().find(|row| row.is_selected)
    }
}

/// Pure view of the active list; calling it twice with the same input yields the same output.
pub fn render(active: &ActiveList, selected_index: usize) -> RenderInstruction {
    if active.is_empty() {
        return RenderInstruction::Empty {
            message: EMPTY_MESSAGE.to_string(),
        };
    }

    let rows = (0..active.len())
        .filter_map(|index| {
            let entry = active.entry(index)?;
            let segments = match active.match_at(index) {
                Some(hit) => highlight_segments(&entry.title, &hit.highlight_spans),
                None => vec![TextSegment {
                    text: entry.title.clone(),
                    highlighted: false,
                }],
            };
            Some(RenderRow {
                segments,
                url: entry.url.clone(),
                is_selected: index == selected_index,
            })
        })
        .collect();

    RenderInstruction::Rows { rows }
}

/// Splits `title` into alternating plain/highlighted runs. Span offsets are in
/// characters; anything past the end of the title is ignored.
pub fn highlight_segments(title: &str, spans: &[HighlightSpan]) -> Vec<TextSegment> {
    let mut segments: Vec<TextSegment> = Vec::new();
    for (position, c) in title.chars().enumerate() {
        let highlighted = spans.iter().any(|span| span.contains(position));
        match segments.last_mut() {
            Some(last) if last.highlighted == highlighted => last.text.push(c),
            _ => segments.push(TextSegment {
                text: c.to_string(),
                highlighted,
            }),
        }
    }
    segments
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsInfo {
    pub count: usize,
    pub elapsed: Duration,
}

impl Display for ResultsInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "found {} results in {:.2} seconds",
            self.count,
            self.elapsed.as_secs_f64()
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::{highlight_segments, render, RenderInstruction, ResultsInfo, EMPTY_MESSAGE};
    use crate::model::{BookmarkEntry, HighlightSpan, MatchResult};
    use crate::search::ActiveList;

    fn ranked(title: &str, spans: Vec<HighlightSpan>) -> ActiveList {
        ActiveList::Ranked(vec![MatchResult {
            entry: Arc::new(BookmarkEntry::new("1", title, "https://example.com")),
            score: 10,
            highlight_spans: spans,
        }])
    }

    #[test]
    fn empty_list_renders_message() {
        assert_eq!(
            render(&ActiveList::default(), 0),
            RenderInstruction::Empty {
                message: EMPTY_MESSAGE.to_string()
            }
        );
    }

    #[test]
    fn marks_exactly_the_given_spans() {
        let list = ranked(
            "Rust / The Book",
            vec![HighlightSpan::new(0, 2), HighlightSpan::new(7, 10)],
        );
        let out = render(&list, 0);
        let row = &out.rows()[0];
        assert_eq!(row.to_markup("[", "]"), "[Ru]st / [The] Book");
        assert_eq!(row.plain_text(), "Rust / The Book");
        assert!(row.is_selected);
    }

    #[test]
    fn unfiltered_rows_are_plain_and_single_selected() {
        let list = ActiveList::Unfiltered(vec![
            Arc::new(BookmarkEntry::new("1", "GitHub", "https://github.com")),
            Arc::new(BookmarkEntry::new("2", "Gmail", "https://mail.google.com")),
        ]);
        let out = render(&list, 1);
        assert_eq!(out.rows().len(), 2);
        assert!(out.rows().iter().all(|r| r.segments.iter().all(|s| !s.highlighted)));
        assert_eq!(out.rows().iter().filter(|r| r.is_selected).count(), 1);
        assert_eq!(out.selected_row().unwrap().url, "https://mail.google.com");
        assert_eq!(render(&list, 1), out);
    }

    #[test]
    fn spans_use_character_offsets_and_ignore_overflow() {
        let segments = highlight_segments("héllo", &[HighlightSpan::new(1, 2), HighlightSpan::new(4, 9)]);
        let marked: Vec<(&str, bool)> = segments
            .iter()
            .map(|s| (s.text.as_str(), s.highlighted))
            .collect();
        assert_eq!(marked, vec![("h", false), ("é", true), ("ll", false), ("o", true)]);
    }

    #[test]
    fn results_info_formats_seconds() {
        let info = ResultsInfo {
            count: 3,
            elapsed: Duration::from_millis(1234),
        };
        assert_eq!(info.to_string(), "found 3 results in 1.23 seconds");
    }
}
