use regex::Regex;
use std::sync::OnceLock;

static ENTRY_MARKER: OnceLock<Regex> = OnceLock::new();
static NUMBERED_ENTRY: OnceLock<Regex> = OnceLock::new();

fn entry_marker_pattern() -> &'static Regex {
    ENTRY_MARKER.get_or_init(|| Regex::new(r"\d+\)").expect("entry marker pattern is valid"))
}

fn numbered_entry_pattern() -> &'static Regex {
    NUMBERED_ENTRY.get_or_init(|| {
        Regex::new(r"\d+\)\s*(?:(?:\d+조|[가-힣]+조)[\s/]*)?([\w가-힣/_]+(?:[\s/][\w가-힣/_]+)*)")
            .expect("numbered entry pattern is valid")
    })
}

/// Pulls the raw name span out of one line of a log.
///
/// Implementations decide which lines count as entries at all; the pipeline
/// only reports a warning for lines that qualify but yield no span.
pub trait NameSpanExtractor {
    fn qualifies(&self, line: &str) -> bool;

    fn extract_span(&self, line: &str) -> Option<String>;
}

/// Numbered sign-up lists such as `3) 1조 홍길동` or `12) 하고랩스/김민수`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NumberedEntryExtractor;

impl NameSpanExtractor for NumberedEntryExtractor {
    fn qualifies(&self, line: &str) -> bool {
        entry_marker_pattern().is_match(line)
    }

    fn extract_span(&self, line: &str) -> Option<String> {
        let captures = numbered_entry_pattern().captures(line)?;
        let span = captures.get(1)?.as_str().trim();
        Some(span.split_whitespace().collect::<Vec<_>>().join(" "))
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Raw names in line order.
    pub names: Vec<String>,
    /// Trimmed qualifying lines that produced no name.
    pub unmatched: Vec<String>,
}

pub fn extract_names<E>(extractor: &E, text: &str) -> Extraction
where
    E: NameSpanExtractor + ?Sized,
{
    let mut extraction = Extraction::default();

    for line in text.split('\n') {
        let line = line.trim();
        if line.is_empty() || !extractor.qualifies(line) {
            continue;
        }

        match extractor.extract_span(line) {
            Some(name) => extraction.names.push(name),
            None => extraction.unmatched.push(line.to_string()),
        }
    }

    extraction
}
