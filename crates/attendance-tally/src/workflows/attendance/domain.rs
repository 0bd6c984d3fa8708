use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::fmt;
use std::path::Path;

/// Year applied to filenames that only carry a month and a day.
pub const DEFAULT_ASSUMED_YEAR: i32 = 2024;

/// Longest name a spreadsheet cell can hold.
pub const MAX_NAME_CHARS: usize = 32_767;

const STANDARD_BLACKLIST: &[&str] = &["하고랩스", "사부작사부작", "으랏차", "인스피레이션", "BGO"];

/// One text log handed to the pipeline by the CLI or the HTTP service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub filename: String,
    pub content: String,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    pub fn is_text_log(&self) -> bool {
        has_text_extension(&self.filename)
    }

    /// Decodes raw file bytes as UTF-8, dropping a leading byte order mark.
    pub fn from_bytes(filename: impl Into<String>, bytes: Vec<u8>) -> Result<Self, RunNotice> {
        let filename = filename.into();
        match String::from_utf8(bytes) {
            Ok(content) => {
                let content = match content.strip_prefix('\u{feff}') {
                    Some(stripped) => stripped.to_string(),
                    None => content,
                };
                Ok(Self { filename, content })
            }
            Err(_) => Err(RunNotice::UndecodableContent { file: filename }),
        }
    }
}

/// True when `name` ends in `.txt`, ignoring ASCII case.
pub fn has_text_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    /// The filename spelled out the year.
    Explicit,
    /// The year came from the run context.
    AssumedYear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ParsedDate {
    pub date: NaiveDate,
    pub source: DateSource,
}

impl ParsedDate {
    pub fn explicit(date: NaiveDate) -> Self {
        Self {
            date,
            source: DateSource::Explicit,
        }
    }

    pub fn assumed(date: NaiveDate) -> Self {
        Self {
            date,
            source: DateSource::AssumedYear,
        }
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

/// Brand and decoration words that never identify a participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blacklist {
    words: BTreeSet<String>,
}

impl Blacklist {
    pub fn standard() -> Self {
        Self {
            words: STANDARD_BLACKLIST.iter().map(|word| word.to_string()).collect(),
        }
    }

    pub fn with_extra<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in extra {
            let word = word.as_ref().trim();
            if !word.is_empty() {
                self.words.insert(word.to_string());
            }
        }
        self
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for Blacklist {
    fn default() -> Self {
        Self::standard()
    }
}

/// Everything a run depends on besides the uploaded files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub assumed_year: i32,
    pub blacklist: Blacklist,
}

impl RunContext {
    pub fn new(assumed_year: i32) -> Self {
        Self {
            assumed_year,
            blacklist: Blacklist::standard(),
        }
    }

    pub fn with_blacklist(mut self, blacklist: Blacklist) -> Self {
        self.blacklist = blacklist;
        self
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new(DEFAULT_ASSUMED_YEAR)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeSeverity {
    Warning,
    Error,
}

impl NoticeSeverity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Advisory message produced while tallying. None of these abort a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunNotice {
    UnmatchedLine { file: String, line: String },
    UnrecognizedDate { file: String },
    UndecodableContent { file: String },
    UnsupportedExtension { file: String },
    OversizedName { file: String, chars: usize },
    AmbiguousYear { assumed_year: i32, explicit_years: Vec<i32> },
}

impl RunNotice {
    pub const fn severity(&self) -> NoticeSeverity {
        match self {
            Self::UnmatchedLine { .. }
            | Self::OversizedName { .. }
            | Self::AmbiguousYear { .. } => NoticeSeverity::Warning,
            Self::UnrecognizedDate { .. }
            | Self::UndecodableContent { .. }
            | Self::UnsupportedExtension { .. } => NoticeSeverity::Error,
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnmatchedLine { .. } => "unmatched_line",
            Self::UnrecognizedDate { .. } => "unrecognized_date",
            Self::UndecodableContent { .. } => "undecodable_content",
            Self::UnsupportedExtension { .. } => "unsupported_extension",
            Self::OversizedName { .. } => "oversized_name",
            Self::AmbiguousYear { .. } => "ambiguous_year",
        }
    }

    pub fn file(&self) -> Option<&str> {
        match self {
            Self::UnmatchedLine { file, .. }
            | Self::UnrecognizedDate { file }
            | Self::UndecodableContent { file }
            | Self::UnsupportedExtension { file }
            | Self::OversizedName { file, .. } => Some(file),
            Self::AmbiguousYear { .. } => None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity() == NoticeSeverity::Error
    }
}

impl fmt::Display for RunNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunNotice::UnmatchedLine { file, line } => {
                write!(f, "could not extract a name from '{line}' ({file})")
            }
            RunNotice::UnrecognizedDate { file } => {
                write!(f, "no date could be read from file name '{file}'")
            }
            RunNotice::UndecodableContent { file } => {
                write!(f, "'{file}' is not valid UTF-8 text")
            }
            RunNotice::UnsupportedExtension { file } => {
                write!(f, "'{file}' is not a .txt file")
            }
            RunNotice::OversizedName { file, chars } => write!(
                f,
                "skipped a {chars}-character name in {file}; spreadsheet cells hold at most {MAX_NAME_CHARS}"
            ),
            RunNotice::AmbiguousYear {
                assumed_year,
                explicit_years,
            } => {
                let years = explicit_years
                    .iter()
                    .map(|year| year.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(
                    f,
                    "month/day file names were placed in {assumed_year} while other files name {years}"
                )
            }
        }
    }
}
