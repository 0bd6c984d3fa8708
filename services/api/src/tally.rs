use crate::infra::{load_uploads, parse_year};
use attendance_tally::config::AppConfig;
use attendance_tally::error::AppError;
use attendance_tally::telemetry;
use attendance_tally::workflows::attendance::report::{
    write_csv_file, write_xlsx_file, CSV_FILE_NAME, XLSX_FILE_NAME,
};
use attendance_tally::workflows::attendance::{AttendanceOutcome, AttendanceTally, RunNotice};
use clap::Args;
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::info;
use unicode_width::UnicodeWidthStr;

#[derive(Args, Debug)]
pub(crate) struct TallyArgs {
    /// Text logs, or directories holding them, whose file names carry the date
    #[arg(required = true)]
    pub(crate) paths: Vec<PathBuf>,
    /// Year for file names that only give a month and day
    #[arg(long, value_parser = parse_year)]
    pub(crate) year: Option<i32>,
    /// Write both CSV and XLSX exports into this directory
    #[arg(long)]
    pub(crate) out_dir: Option<PathBuf>,
    /// Write the CSV export to this path
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
    /// Write the XLSX export to this path
    #[arg(long)]
    pub(crate) xlsx: Option<PathBuf>,
    /// Print the report as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_tally(args: TallyArgs) -> Result<(), AppError> {
    let TallyArgs {
        paths,
        year,
        out_dir,
        csv,
        xlsx,
        json,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let mut context = config.attendance.run_context();
    if let Some(year) = year {
        context.assumed_year = year;
    }

    let loaded = load_uploads(&paths)?;
    let outcome = AttendanceTally::new()
        .run(&context, &loaded.files)
        .with_leading_notices(loaded.notices);

    let mut csv_targets: Vec<PathBuf> = csv.into_iter().collect();
    let mut xlsx_targets: Vec<PathBuf> = xlsx.into_iter().collect();
    if let Some(dir) = out_dir {
        std::fs::create_dir_all(&dir)?;
        csv_targets.push(dir.join(CSV_FILE_NAME));
        xlsx_targets.push(dir.join(XLSX_FILE_NAME));
    }

    for path in &csv_targets {
        write_csv_file(&outcome.table, path)?;
        info!(path = %path.display(), "csv export written");
    }
    for path in &xlsx_targets {
        write_xlsx_file(&outcome.table, path)?;
        info!(path = %path.display(), "xlsx export written");
    }

    if json {
        let body = serde_json::to_string_pretty(&outcome.view())
            .map_err(|err| AppError::Io(err.into()))?;
        println!("{body}");
    } else {
        print!("{}", render_outcome(&outcome));
        for path in csv_targets.iter().chain(&xlsx_targets) {
            println!("Saved {}", path.display());
        }
    }

    Ok(())
}

fn pad(cell: &str, width: usize) -> String {
    let fill = width.saturating_sub(cell.width());
    format!("{cell}{}", " ".repeat(fill))
}

/// Renders the table with columns aligned by terminal display width,
/// followed by any notices.
pub(crate) fn render_outcome(outcome: &AttendanceOutcome) -> String {
    let header = outcome.table.header();
    let records = outcome.table.records();

    let mut widths: Vec<usize> = header.iter().map(|cell| cell.width()).collect();
    for record in &records {
        for (width, cell) in widths.iter_mut().zip(record) {
            *width = (*width).max(cell.width());
        }
    }

    let render_line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| pad(cell, *width))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Attendance by date ({} participants, {} dates, assumed year {})",
        records.len(),
        outcome.table.dates().len(),
        outcome.assumed_year
    );
    let _ = writeln!(out, "{}", render_line(&header));
    let rule = widths
        .iter()
        .map(|width| "-".repeat(*width))
        .collect::<Vec<_>>()
        .join("-+-");
    let _ = writeln!(out, "{rule}");
    for record in &records {
        let _ = writeln!(out, "{}", render_line(record));
    }

    if !outcome.notices.is_empty() {
        let _ = writeln!(out, "\nNotices");
        for notice in &outcome.notices {
            let _ = writeln!(out, "- {}", render_notice(notice));
        }
    }

    out
}

fn render_notice(notice: &RunNotice) -> String {
    format!("[{}] {}", notice.severity().label(), notice)
}
