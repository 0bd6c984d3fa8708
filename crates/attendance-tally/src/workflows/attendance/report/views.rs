use super::super::domain::{NoticeSeverity, RunNotice};
use super::table::AttendanceTable;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct RunNoticeView {
    pub severity: NoticeSeverity,
    pub severity_label: &'static str,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub message: String,
}

impl From<&RunNotice> for RunNoticeView {
    fn from(notice: &RunNotice) -> Self {
        let severity = notice.severity();
        Self {
            severity,
            severity_label: severity.label(),
            kind: notice.kind(),
            file: notice.file().map(str::to_string),
            message: notice.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceReportView {
    pub assumed_year: i32,
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub participants: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<RunNoticeView>,
}

impl AttendanceReportView {
    pub fn new(assumed_year: i32, table: &AttendanceTable, notices: &[RunNotice]) -> Self {
        Self {
            assumed_year,
            dates: table.dates().to_vec(),
            columns: table.header(),
            rows: table.records(),
            participants: table.rows().len(),
            notices: notices.iter().map(RunNoticeView::from).collect(),
        }
    }
}
