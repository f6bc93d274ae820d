//! Reference extraction.
//!
//! A document body is free-form prose, so extraction is permissive: anything that does not form
//! a well-formed reference is plain text. The scan is a single forward pass over the body.
//!
//! Recognized forms:
//!
//! - `[[target]]`, `[[target|display]]`, `[[target#fragment]]`, `[[target#fragment|display]]`
//! - `#tag`, where the `#` starts the text or follows whitespace or `(`

use std::{collections::BTreeSet, ops::Range};

use crate::{
    config::BuildConfig,
    properties::{RawReference, ReferenceKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub inline_tags: bool,
    pub skip_code: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            inline_tags: true,
            skip_code: true,
        }
    }
}

impl From<&BuildConfig> for ScanOptions {
    fn from(config: &BuildConfig) -> Self {
        ScanOptions {
            inline_tags: config.inline_tags,
            skip_code: config.skip_code,
        }
    }
}

/// One segment of a scanned body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scanned {
    Token(RawReference),
    PlainText(Range<usize>),
}

/// Scan `body` into an ordered sequence of reference tokens and plain text ranges that together
/// cover the whole body. `line_offset` is the number of source lines preceding the body.
pub fn scan(body: &str, options: &ScanOptions, line_offset: usize) -> Vec<Scanned> {
    Scanner::new(body, *options, line_offset).run()
}

/// The reference tokens of `body`, in first-occurrence order.
pub fn extract_references(
    body: &str,
    options: &ScanOptions,
    line_offset: usize,
) -> Vec<RawReference> {
    scan(body, options, line_offset)
        .into_iter()
        .filter_map(|segment| match segment {
            Scanned::Token(reference) => Some(reference),
            Scanned::PlainText(_) => None,
        })
        .collect()
}

struct Scanner<'a> {
    body: &'a str,
    bytes: &'a [u8],
    options: ScanOptions,
    out: Vec<Scanned>,
    plain_start: usize,
    // Line tracking is lazy: tokens are emitted in increasing position order, so the cursor only
    // ever moves forward.
    cursor: usize,
    line: usize,
    line_start: usize,
    // Backtick run lengths known to have no closing run later in the body.
    unclosed_runs: BTreeSet<usize>,
}

impl<'a> Scanner<'a> {
    fn new(body: &'a str, options: ScanOptions, line_offset: usize) -> Self {
        Scanner {
            body,
            bytes: body.as_bytes(),
            options,
            out: Vec::new(),
            plain_start: 0,
            cursor: 0,
            line: line_offset + 1,
            line_start: 0,
            unclosed_runs: BTreeSet::new(),
        }
    }

    fn run(mut self) -> Vec<Scanned> {
        let len = self.bytes.len();
        let mut i = 0;
        let mut at_line_start = true;
        while i < len {
            if at_line_start {
                at_line_start = false;
                if self.options.skip_code {
                    if let Some(fence) = self.fence_at(i) {
                        i = self.skip_fenced_block(i, fence);
                        at_line_start = true;
                        continue;
                    }
                }
            }
            match self.bytes[i] {
                b'\n' => {
                    i += 1;
                    at_line_start = true;
                }
                b'`' if self.options.skip_code => i = self.skip_code_span(i),
                b'[' if self.bytes.get(i + 1) == Some(&b'[') => i = self.scan_link(i),
                b'#' if self.options.inline_tags && self.is_tag_boundary(i) => {
                    i = self.scan_tag(i)
                }
                _ => i += 1,
            }
        }
        if self.plain_start < len {
            self.out.push(Scanned::PlainText(self.plain_start..len));
        }
        self.out
    }

    /// A fence opens with at most three spaces of indent and at least three backticks or tildes.
    fn fence_at(&self, i: usize) -> Option<(u8, usize)> {
        let mut j = i;
        while j < self.bytes.len() && j - i < 3 && self.bytes[j] == b' ' {
            j += 1;
        }
        let ch = *self.bytes.get(j)?;
        if ch != b'`' && ch != b'~' {
            return None;
        }
        let run = self.bytes[j..].iter().take_while(|b| **b == ch).count();
        (run >= 3).then_some((ch, run))
    }

    /// Returns the index just past the closing fence line, or the end of the body.
    fn skip_fenced_block(&self, start: usize, (ch, run): (u8, usize)) -> usize {
        let mut i = self.next_line(start);
        while i < self.bytes.len() {
            let next = self.next_line(i);
            if let Some((close_ch, close_run)) = self.fence_at(i) {
                let rest = &self.body[i..next];
                let rest = rest.trim_start().trim_start_matches(close_ch as char);
                if close_ch == ch && close_run >= run && rest.trim().is_empty() {
                    return next;
                }
            }
            i = next;
        }
        self.bytes.len()
    }

    fn next_line(&self, i: usize) -> usize {
        self.bytes[i..]
            .iter()
            .position(|b| *b == b'\n')
            .map(|p| i + p + 1)
            .unwrap_or(self.bytes.len())
    }

    /// Skip an inline code span opened by the backtick run at `i`. An unclosed run is literal.
    fn skip_code_span(&mut self, i: usize) -> usize {
        let run = self.bytes[i..].iter().take_while(|b| **b == b'`').count();
        let after_open = i + run;
        if self.unclosed_runs.contains(&run) {
            return after_open;
        }
        let mut j = after_open;
        while j < self.bytes.len() {
            if self.bytes[j] == b'`' {
                let close = self.bytes[j..].iter().take_while(|b| **b == b'`').count();
                if close == run {
                    return j + close;
                }
                j += close;
            } else {
                j += 1;
            }
        }
        self.unclosed_runs.insert(run);
        after_open
    }

    /// An opener without a closer on the same line is plain text. Scanning resumes right after
    /// it, so tags and a nested opener that follow are still seen. The text between is revisited
    /// at most once: it contains no other opener.
    fn scan_link(&mut self, start: usize) -> usize {
        let mut j = start + 2;
        loop {
            match self.bytes.get(j) {
                None | Some(b'\n') => return start + 2,
                Some(b'[') if self.bytes.get(j + 1) == Some(&b'[') => return start + 2,
                Some(b']') if self.bytes.get(j + 1) == Some(&b']') => break,
                Some(_) => j += 1,
            }
        }
        let end = j + 2;
        let inner = &self.body[start + 2..j];
        if let Some((target, fragment, display)) = split_link(inner) {
            self.emit(start..end, ReferenceKind::Document, target, fragment, display);
        }
        end
    }

    fn is_tag_boundary(&self, i: usize) -> bool {
        if i == 0 {
            return true;
        }
        self.body[..i]
            .chars()
            .next_back()
            .map(|c| c.is_whitespace() || c == '(')
            .unwrap_or(true)
    }

    fn scan_tag(&mut self, start: usize) -> usize {
        let name_start = start + 1;
        let name_len = self.body[name_start..]
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '-' || *c == '_' || *c == '/'))
            .map(|(idx, _)| idx)
            .unwrap_or(self.body.len() - name_start);
        let name = self.body[name_start..name_start + name_len].trim_end_matches('/');
        if name.is_empty() || name.chars().all(|c| c.is_ascii_digit()) {
            return name_start;
        }
        let end = name_start + name.len();
        self.emit(start..end, ReferenceKind::Tag, name.to_string(), None, None);
        end
    }

    fn emit(
        &mut self,
        span: Range<usize>,
        kind: ReferenceKind,
        target: String,
        fragment: Option<String>,
        display: Option<String>,
    ) {
        if self.plain_start < span.start {
            self.out
                .push(Scanned::PlainText(self.plain_start..span.start));
        }
        self.plain_start = span.end;
        let location = self.locate(span.start);
        self.out.push(Scanned::Token(RawReference {
            kind,
            raw: self.body[span.clone()].to_string(),
            target,
            fragment,
            display,
            span,
            location,
        }));
    }

    fn locate(&mut self, pos: usize) -> (usize, usize) {
        for (offset, byte) in self.bytes[self.cursor..pos].iter().enumerate() {
            if *byte == b'\n' {
                self.line += 1;
                self.line_start = self.cursor + offset + 1;
            }
        }
        self.cursor = pos;
        let column = self.body[self.line_start..pos].chars().count() + 1;
        (self.line, column)
    }
}

/// Split link contents into (target, fragment, display). `None` when no target remains.
fn split_link(inner: &str) -> Option<(String, Option<String>, Option<String>)> {
    let (target_part, display) = match inner.split_once('|') {
        // `\|` is how a pipe is written inside a markdown table cell.
        Some((target, display)) => (target.strip_suffix('\\').unwrap_or(target), Some(display)),
        None => (inner, None),
    };
    let (target, fragment) = match target_part.split_once('#') {
        Some((target, fragment)) => (target, Some(fragment.trim())),
        None => (target_part, None),
    };
    let target = target.trim();
    if target.is_empty() {
        return None;
    }
    Some((
        target.to_string(),
        fragment.filter(|f| !f.is_empty()).map(str::to_string),
        display
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn refs(body: &str) -> Vec<RawReference> {
        extract_references(body, &ScanOptions::default(), 0)
    }

    fn targets(body: &str) -> Vec<(ReferenceKind, String)> {
        refs(body).into_iter().map(|r| (r.kind, r.target)).collect()
    }

    #[test]
    fn test_link_forms() {
        let found = refs("see [[b]], [[Bee|the bee]] and [[c#Intro|intro]] or [[d#Part]]");
        assert_eq!(found.len(), 4);
        assert_eq!(found[0].target, "b");
        assert_eq!(found[0].raw, "[[b]]");
        assert_eq!(found[1].display.as_deref(), Some("the bee"));
        assert_eq!(found[2].fragment.as_deref(), Some("Intro"));
        assert_eq!(found[2].display.as_deref(), Some("intro"));
        assert_eq!(found[3].fragment.as_deref(), Some("Part"));
        assert!(found[3].display.is_none());
    }

    #[test]
    fn test_duplicates_keep_occurrence_order() {
        let found = targets("[[b]] then [[a]] then [[b]]");
        assert_eq!(
            found,
            vec![
                (ReferenceKind::Document, "b".to_string()),
                (ReferenceKind::Document, "a".to_string()),
                (ReferenceKind::Document, "b".to_string()),
            ]
        );
    }

    #[test]
    fn test_malformed_brackets_are_plain_text() {
        assert!(refs("[[]] [[ ]] [[unterminated").is_empty());
        assert!(refs("[[split\nacross]]").is_empty());
        assert!(refs("[[#only-fragment]]").is_empty());
        // Text after a broken opener is still scanned.
        assert_eq!(
            targets("oops [[broken #idea"),
            vec![(ReferenceKind::Tag, "idea".to_string())]
        );
        assert_eq!(
            targets("[[half #open\n[[next]] and [[a #b [[c]]"),
            vec![
                (ReferenceKind::Tag, "open".to_string()),
                (ReferenceKind::Document, "next".to_string()),
                (ReferenceKind::Tag, "b".to_string()),
                (ReferenceKind::Document, "c".to_string()),
            ]
        );
        // The outer opener is plain text; the inner link survives.
        assert_eq!(
            targets("[[outer [[inner]]"),
            vec![(ReferenceKind::Document, "inner".to_string())]
        );
    }

    #[test]
    fn test_table_escaped_pipe() {
        let found = refs("| [[b\\|Bee]] |");
        assert_eq!(found[0].target, "b");
        assert_eq!(found[0].display.as_deref(), Some("Bee"));
    }

    #[test]
    fn test_tags() {
        assert_eq!(
            targets("#start and #project/alpha, (#paren) but not a#b, #123 or # heading"),
            vec![
                (ReferenceKind::Tag, "start".to_string()),
                (ReferenceKind::Tag, "project/alpha".to_string()),
                (ReferenceKind::Tag, "paren".to_string()),
            ]
        );
        assert!(refs("## Heading\n# Title").is_empty());
    }

    #[test]
    fn test_tags_disabled() {
        let options = ScanOptions {
            inline_tags: false,
            ..Default::default()
        };
        assert!(extract_references("#tag", &options, 0).is_empty());
    }

    #[test]
    fn test_code_is_skipped() {
        let body = concat!(
            "`[[not]]` and ``[[nor` this]]`` but [[yes]]\n",
            "```\n[[fenced]] #fenced\n```\n#after"
        );
        assert_eq!(
            targets(body),
            vec![
                (ReferenceKind::Document, "yes".to_string()),
                (ReferenceKind::Tag, "after".to_string()),
            ]
        );
        let unclosed = "``` never closed\n[[hidden]]";
        assert!(refs(unclosed).is_empty());
        let keep_code = ScanOptions {
            skip_code: false,
            ..Default::default()
        };
        assert_eq!(extract_references("`[[b]]`", &keep_code, 0).len(), 1);
    }

    #[test]
    fn test_unclosed_backtick_is_literal() {
        assert_eq!(
            targets("a ` stray [[b]] and ` another ``[[c]]"),
            vec![(ReferenceKind::Document, "c".to_string())]
        );
        assert_eq!(
            targets("only one ` here [[b]]"),
            vec![(ReferenceKind::Document, "b".to_string())]
        );
    }

    #[test]
    fn test_locations_include_line_offset() {
        let found = extract_references("first\n  ünï [[b]]\n#t", &ScanOptions::default(), 3);
        assert_eq!(found[0].location, (5, 7));
        assert_eq!(found[1].location, (6, 1));
    }

    #[test]
    fn test_scan_covers_body() {
        let body = "a [[b]] c #d e";
        let segments = scan(body, &ScanOptions::default(), 0);
        let mut rebuilt = String::new();
        for segment in &segments {
            match segment {
                Scanned::Token(reference) => rebuilt += &reference.raw,
                Scanned::PlainText(range) => rebuilt += &body[range.clone()],
            }
        }
        assert_eq!(rebuilt, body);
        assert_eq!(segments.len(), 5);
    }
}
