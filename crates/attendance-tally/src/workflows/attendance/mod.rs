mod aggregator;
mod date;
pub mod domain;
mod extractor;
mod normalizer;
pub mod report;

pub use aggregator::{AttendanceAggregator, AttendanceRecord};
pub use date::parse_filename_date;
pub use domain::{
    has_text_extension, Blacklist, DateSource, NoticeSeverity, ParsedDate, RunContext, RunNotice,
    UploadedFile, DEFAULT_ASSUMED_YEAR, MAX_NAME_CHARS,
};
pub use extractor::{extract_names, Extraction, NameSpanExtractor, NumberedEntryExtractor};
pub use normalizer::normalize_name;
pub use report::views::{AttendanceReportView, RunNoticeView};
pub use report::{AttendanceRow, AttendanceTable, ExportError, PresenceMark};

use tracing::{debug, error, info, warn};

/// Result of one tally: the presence matrix plus advisory notices in the
/// order they were raised.
#[derive(Debug, Clone)]
pub struct AttendanceOutcome {
    pub assumed_year: i32,
    pub table: AttendanceTable,
    pub notices: Vec<RunNotice>,
}

impl AttendanceOutcome {
    pub fn view(&self) -> AttendanceReportView {
        AttendanceReportView::new(self.assumed_year, &self.table, &self.notices)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &RunNotice> {
        self.notices.iter().filter(|notice| !notice.is_error())
    }

    pub fn errors(&self) -> impl Iterator<Item = &RunNotice> {
        self.notices.iter().filter(|notice| notice.is_error())
    }

    /// Puts notices raised before the run (e.g. while loading files) first.
    pub fn with_leading_notices(mut self, mut leading: Vec<RunNotice>) -> Self {
        leading.append(&mut self.notices);
        self.notices = leading;
        self
    }
}

/// Runs the date, extraction, normalization and pivot stages over a batch of
/// files.
#[derive(Debug, Default, Clone)]
pub struct AttendanceTally<E = NumberedEntryExtractor> {
    extractor: E,
}

impl AttendanceTally {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: NameSpanExtractor> AttendanceTally<E> {
    pub fn with_extractor(extractor: E) -> Self {
        Self { extractor }
    }

    pub fn run(&self, context: &RunContext, files: &[UploadedFile]) -> AttendanceOutcome {
        let mut aggregator = AttendanceAggregator::new(&context.blacklist);
        let mut notices = Vec::new();

        for file in files {
            let Some(date) = parse_filename_date(&file.filename, context.assumed_year) else {
                error!(file = %file.filename, "no date in file name; skipping");
                notices.push(RunNotice::UnrecognizedDate {
                    file: file.filename.clone(),
                });
                continue;
            };

            let extraction = extract_names(&self.extractor, &file.content);
            let (names, oversized): (Vec<String>, Vec<String>) = extraction
                .names
                .into_iter()
                .partition(|name| name.chars().count() <= MAX_NAME_CHARS);
            for name in oversized {
                let chars = name.chars().count();
                warn!(file = %file.filename, chars, "name too long for a spreadsheet cell");
                notices.push(RunNotice::OversizedName {
                    file: file.filename.clone(),
                    chars,
                });
            }
            for line in extraction.unmatched {
                warn!(file = %file.filename, %line, "name extraction failed");
                notices.push(RunNotice::UnmatchedLine {
                    file: file.filename.clone(),
                    line,
                });
            }

            debug!(
                file = %file.filename,
                date = %date.date,
                names = names.len(),
                "file tallied"
            );
            aggregator.record_file(date, &names);
        }

        if let Some(explicit_years) = aggregator.conflicting_years(context.assumed_year) {
            warn!(
                assumed_year = context.assumed_year,
                ?explicit_years,
                "month/day file names may belong to another year"
            );
            notices.push(RunNotice::AmbiguousYear {
                assumed_year: context.assumed_year,
                explicit_years,
            });
        }

        let record = aggregator.into_record();
        let table = AttendanceTable::from_record(&record);
        info!(
            files = files.len(),
            dates = table.dates().len(),
            participants = table.rows().len(),
            notices = notices.len(),
            "attendance tallied"
        );

        AttendanceOutcome {
            assumed_year: context.assumed_year,
            table,
            notices,
        }
    }
}

/// Tallies `files` with the numbered-entry log format.
pub fn tally(context: &RunContext, files: &[UploadedFile]) -> AttendanceOutcome {
    AttendanceTally::new().run(context, files)
}
