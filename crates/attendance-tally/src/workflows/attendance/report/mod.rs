mod export;
mod table;
pub mod views;

pub use export::{
    to_csv_string, to_xlsx_bytes, write_csv, write_csv_file, write_xlsx_file, ExportError,
    CSV_FILE_NAME, XLSX_FILE_NAME,
};
pub use table::{AttendanceRow, AttendanceTable, PresenceMark, NAME_COLUMN, TOTAL_COLUMN};
