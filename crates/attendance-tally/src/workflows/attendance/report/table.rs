use super::super::aggregator::AttendanceRecord;
use chrono::NaiveDate;
use serde::Serialize;

pub const NAME_COLUMN: &str = "이름";
pub const TOTAL_COLUMN: &str = "총 횟수";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PresenceMark {
    #[serde(rename = "O")]
    Present,
    #[serde(rename = "X")]
    Absent,
}

impl PresenceMark {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Present => "O",
            Self::Absent => "X",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRow {
    pub name: String,
    pub marks: Vec<PresenceMark>,
    pub total: usize,
}

impl AttendanceRow {
    fn cells(&self) -> Vec<String> {
        let mut cells = Vec::with_capacity(self.marks.len() + 2);
        cells.push(self.name.clone());
        cells.extend(self.marks.iter().map(|mark| mark.as_str().to_string()));
        cells.push(self.total.to_string());
        cells
    }
}

/// Presence matrix: one row per participant, one column per date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceTable {
    dates: Vec<NaiveDate>,
    rows: Vec<AttendanceRow>,
}

impl AttendanceTable {
    pub fn from_record(record: &AttendanceRecord) -> Self {
        let dates: Vec<NaiveDate> = record.dates().iter().copied().collect();
        let rows = record
            .names()
            .map(|name| {
                let marks: Vec<PresenceMark> = dates
                    .iter()
                    .map(|date| {
                        if record.attended(name, *date) {
                            PresenceMark::Present
                        } else {
                            PresenceMark::Absent
                        }
                    })
                    .collect();
                let total = marks
                    .iter()
                    .filter(|mark| **mark == PresenceMark::Present)
                    .count();
                AttendanceRow {
                    name: name.to_string(),
                    marks,
                    total,
                }
            })
            .collect();

        Self { dates, rows }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn rows(&self) -> &[AttendanceRow] {
        &self.rows
    }

    pub fn row(&self, name: &str) -> Option<&AttendanceRow> {
        self.rows.iter().find(|row| row.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn header(&self) -> Vec<String> {
        let mut header = Vec::with_capacity(self.dates.len() + 2);
        header.push(NAME_COLUMN.to_string());
        header.extend(self.dates.iter().map(NaiveDate::to_string));
        header.push(TOTAL_COLUMN.to_string());
        header
    }

    /// Data rows as strings, in the same column order as [`Self::header`].
    pub fn records(&self) -> Vec<Vec<String>> {
        self.rows.iter().map(AttendanceRow::cells).collect()
    }
}
