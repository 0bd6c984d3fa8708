use super::table::AttendanceTable;
use rust_xlsxwriter::{Workbook, XlsxError};
use std::io::{self, Write};
use std::path::Path;

/// Default download name for the CSV export.
pub const CSV_FILE_NAME: &str = "날짜별_참여현황.csv";
/// Default download name for the spreadsheet export.
pub const XLSX_FILE_NAME: &str = "날짜별_참여현황.xlsx";

const SHEET_NAME: &str = "Sheet1";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode CSV export: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to encode spreadsheet export: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("table of {rows} rows and {columns} columns does not fit in a worksheet")]
    TooLarge { rows: usize, columns: usize },
}

/// Writes the header and rows as comma separated text with `\n` line endings.
pub fn write_csv<W: Write>(table: &AttendanceTable, writer: W) -> Result<(), ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv_writer.write_record(table.header())?;
    for record in table.records() {
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn to_csv_string(table: &AttendanceTable) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_csv(table, &mut buffer)?;
    String::from_utf8(buffer).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err).into())
}

fn build_workbook(table: &AttendanceTable) -> Result<Workbook, ExportError> {
    let header = table.header();
    let records = table.records();
    let too_large = || ExportError::TooLarge {
        rows: records.len() + 1,
        columns: header.len(),
    };
    let total_column = header.len() - 1;

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, title) in header.iter().enumerate() {
        let col = u16::try_from(col).map_err(|_| too_large())?;
        worksheet.write_string(0, col, title)?;
    }

    for (index, (record, row)) in records.iter().zip(table.rows()).enumerate() {
        let row_number = u32::try_from(index + 1).map_err(|_| too_large())?;
        for (col, cell) in record.iter().enumerate() {
            let col_number = u16::try_from(col).map_err(|_| too_large())?;
            if col == total_column {
                worksheet.write_number(row_number, col_number, row.total as f64)?;
            } else {
                worksheet.write_string(row_number, col_number, cell)?;
            }
        }
    }

    Ok(workbook)
}

/// Encodes the table as a single-sheet XLSX workbook. The total column is
/// numeric; every other cell is text.
pub fn to_xlsx_bytes(table: &AttendanceTable) -> Result<Vec<u8>, ExportError> {
    let mut workbook = build_workbook(table)?;
    Ok(workbook.save_to_buffer()?)
}

pub fn write_csv_file<P: AsRef<Path>>(table: &AttendanceTable, path: P) -> Result<(), ExportError> {
    let file = std::fs::File::create(path)?;
    write_csv(table, io::BufWriter::new(file))
}

pub fn write_xlsx_file<P: AsRef<Path>>(
    table: &AttendanceTable,
    path: P,
) -> Result<(), ExportError> {
    let bytes = to_xlsx_bytes(table)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
