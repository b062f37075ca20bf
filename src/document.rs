use crate::markers::is_last_review_line;
use crate::text::{normalize, similarity};

const WINDOW_BEFORE: usize = 2;
const WINDOW_AFTER: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineMatch {
    pub index: usize,
    pub score: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Insertion {
    /// Note landed at this index of the current lines, marker right after it.
    Inserted(usize),
    AlreadyPresent,
}

/// Markdown lines plus an insertion queue keyed by original line indices.
///
/// Matching always runs against the lines as downloaded; every accepted
/// insertion shifts later targets by two.
#[derive(Debug, Clone)]
pub struct Document {
    original: Vec<String>,
    lines: Vec<String>,
    offset: usize,
    trailing_newline: bool,
}

impl Document {
    pub fn parse(content: &str) -> Self {
        // Splits on LF and CRLF only; other Unicode line breaks stay inside a line.
        let original: Vec<String> = content.lines().map(str::to_string).collect();
        Self {
            lines: original.clone(),
            original,
            offset: 0,
            trailing_newline: content.ends_with('\n'),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Best-scoring original line; earlier lines win ties.
    pub fn best_match(&self, original: &str, floor: f64) -> Option<LineMatch> {
        let needle = normalize(original);
        let mut best: Option<LineMatch> = None;
        let mut best_score = 0.0;

        for (index, line) in self.original.iter().enumerate() {
            let score = similarity(&needle, &normalize(line));
            if score > best_score {
                best_score = score;
                best = Some(LineMatch { index, score });
            }
        }

        best.filter(|m| m.score >= floor)
    }

    /// Queues a note/marker pair after `original_index`, unless either text
    /// already sits in the neighbourhood of the target position.
    pub fn insert_after(
        &mut self,
        original_index: usize,
        note: String,
        marker: String,
    ) -> Insertion {
        let idx = (original_index + 1 + self.offset).min(self.lines.len());
        let start = idx.saturating_sub(WINDOW_BEFORE);
        let end = (idx + WINDOW_AFTER).min(self.lines.len());
        let window = self.lines[start..end].join("\n");

        if window.contains(note.trim()) || window.contains(&marker) {
            return Insertion::AlreadyPresent;
        }

        self.lines.insert(idx, note);
        self.lines.insert(idx + 1, marker);
        self.offset += 2;
        Insertion::Inserted(idx)
    }

    /// Replaces an existing `last_review` header on line 0 or inserts one.
    pub fn stamp_header(&mut self, header: String) {
        if self.lines.first().is_some_and(|line| is_last_review_line(line)) {
            self.lines[0] = header;
        } else {
            self.lines.insert(0, header);
        }
    }

    pub fn render(&self) -> String {
        let mut content = self.lines.join("\n");
        if self.trailing_newline {
            content.push('\n');
        }
        content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "<!-- bot: last_review --> 2026-10-14T00:00:00Z model=m hash=h";

    fn doc(lines: &[&str]) -> Document {
        let mut content = lines.join("\n");
        content.push('\n');
        Document::parse(&content)
    }

    #[test]
    fn parse_and_render_preserve_trailing_newline() {
        assert_eq!(Document::parse("a\nb\n").render(), "a\nb\n");
        assert_eq!(Document::parse("a\nb").render(), "a\nb");
        assert_eq!(Document::parse("").render(), "");
        assert!(Document::parse("").lines().is_empty());
        assert_eq!(Document::parse("a\r\nb\n").lines(), ["a", "b"]);
        assert_eq!(Document::parse("a\rb\n").lines(), ["a\rb"]);
    }

    #[test]
    fn best_match_picks_highest_score_first_on_ties() {
        let document = doc(&["# Todo", "- [ ] Team standup notes", "- [ ] Team standup notes"]);
        let found = document.best_match("Team standup notes", 0.2).expect("match");
        assert_eq!(found.index, 1);
        assert!(found.score > 0.8);
    }

    #[test]
    fn best_match_respects_floor() {
        let document = doc(&["# Todo", "- [ ] groceries"]);
        assert!(document.best_match("Quarterly budget review", 0.9).is_none());
        assert!(Document::parse("").best_match("anything", 0.2).is_none());
        assert!(doc(&["!!!", "???"]).best_match("anything", 0.0).is_none());
    }

    #[test]
    fn insertions_track_offset() {
        let mut document = doc(&["l0", "l1", "l2", "l3", "l4", "l5", "l6"]);
        let first = document.insert_after(2, note("n1"), "m1".to_string());
        assert_eq!(first, Insertion::Inserted(3));
        let second = document.insert_after(5, note("n2"), "m2".to_string());
        assert_eq!(second, Insertion::Inserted(8));

        let lines = document.lines();
        assert_eq!(lines[2], "l2");
        assert_eq!(lines[3], note("n1"));
        assert_eq!(lines[4], "m1");
        assert_eq!(lines[7], "l5");
        assert_eq!(lines[8], note("n2"));
        assert_eq!(lines[9], "m2");
        assert_eq!(lines.len(), 11);
    }

    #[test]
    fn insertion_skips_when_note_is_nearby() {
        let existing = note("Create retro plan");
        let content = format!("- [ ] Team standup\n{existing}\n<!-- bot: subtask {{}} -->\n");
        let mut document = Document::parse(&content);
        let result =
            document.insert_after(0, note("Create retro plan"), "<!-- new -->".to_string());
        assert_eq!(result, Insertion::AlreadyPresent);
        assert_eq!(document.lines().len(), 3);
    }

    /// Ten filler lines with `line` at `position`; target index 4 inserts at 5.
    fn doc_with_line_at(position: usize, line: &str) -> Document {
        let mut lines: Vec<String> = (0..10).map(|i| format!("l{i}")).collect();
        lines[position] = line.to_string();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        doc(&refs)
    }

    #[test]
    fn guard_window_spans_two_before_to_two_after() {
        for position in [3, 4, 5, 6, 7] {
            let mut document = doc_with_line_at(position, &note("Draft plan"));
            assert_eq!(
                document.insert_after(4, note("Draft plan"), "<!-- m -->".to_string()),
                Insertion::AlreadyPresent,
                "note at line {position}"
            );
            assert_eq!(document.lines().len(), 10);
        }
        for position in [2, 8] {
            let mut document = doc_with_line_at(position, &note("Draft plan"));
            assert_eq!(
                document.insert_after(4, note("Draft plan"), "<!-- m -->".to_string()),
                Insertion::Inserted(5),
                "note at line {position}"
            );
            assert_eq!(document.lines().len(), 12);
        }
    }

    #[test]
    fn marker_text_alone_blocks_insertion() {
        let marker = r#"  <!-- bot: subtask {"id": "sub:0000abcd"} -->"#;
        let mut document = doc_with_line_at(6, marker);
        assert_eq!(
            document.insert_after(4, note("Unrelated title"), marker.to_string()),
            Insertion::AlreadyPresent
        );
        assert_eq!(document.lines().len(), 10);
    }

    #[test]
    fn insertion_at_document_end() {
        let mut document = doc(&["only line"]);
        assert_eq!(
            document.insert_after(0, note("Draft plan"), "m".to_string()),
            Insertion::Inserted(1)
        );
        assert_eq!(document.render(), format!("only line\n{}\nm\n", note("Draft plan")));
    }

    #[test]
    fn header_is_inserted_once_then_replaced() {
        let mut document = doc(&["# Todo", "- [ ] task"]);
        document.stamp_header(HEADER.to_string());
        assert_eq!(document.lines()[0], HEADER);
        assert_eq!(document.lines().len(), 3);

        let mut rerun = Document::parse(&document.render());
        let updated = HEADER.replace("hash=h", "hash=h2");
        rerun.stamp_header(updated.clone());
        assert_eq!(rerun.lines()[0], updated);
        assert_eq!(rerun.lines().len(), 3);
        assert_eq!(
            rerun.lines().iter().filter(|l| is_last_review_line(l)).count(),
            1
        );
    }

    #[test]
    fn header_on_empty_document() {
        let mut document = Document::parse("");
        document.stamp_header(HEADER.to_string());
        assert_eq!(document.render(), HEADER);
    }

    fn note(title: &str) -> String {
        crate::markers::note_line(title)
    }
}
