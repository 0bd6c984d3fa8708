use crate::infra::AppState;
use attendance_tally::config::validate_assumed_year;
use attendance_tally::error::AppError;
use attendance_tally::workflows::attendance::report::{
    to_csv_string, to_xlsx_bytes, CSV_FILE_NAME, XLSX_FILE_NAME,
};
use attendance_tally::workflows::attendance::{
    AttendanceOutcome, AttendanceReportView, AttendanceTally, RunNotice, UploadedFile,
};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const CSV_FALLBACK_NAME: &str = "attendance_by_date.csv";
const XLSX_FALLBACK_NAME: &str = "attendance_by_date.xlsx";

/// Escapes everything but ASCII alphanumerics, `.`, `_` and `-`.
const FILENAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'.').remove(b'_').remove(b'-');

/// Offers the Korean download name with an ASCII fallback for older clients.
fn attachment_disposition(fallback: &str, file_name: &str) -> String {
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        utf8_percent_encode(file_name, FILENAME_ENCODE_SET)
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttendanceReportRequest {
    pub(crate) files: Vec<UploadedFile>,
    #[serde(default)]
    pub(crate) assumed_year: Option<i32>,
}

pub(crate) fn attendance_routes() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/attendance/report", post(report_endpoint))
        .route("/api/v1/attendance/report.csv", post(report_csv_endpoint))
        .route("/api/v1/attendance/report.xlsx", post(report_xlsx_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

fn run_request(
    state: &AppState,
    request: AttendanceReportRequest,
) -> Result<AttendanceOutcome, AppError> {
    let AttendanceReportRequest {
        files,
        assumed_year,
    } = request;

    if files.is_empty() {
        return Err(AppError::InvalidRequest(
            "at least one file is required".to_string(),
        ));
    }

    let mut context = (*state.context).clone();
    if let Some(year) = assumed_year {
        context.assumed_year = validate_assumed_year(year)
            .map_err(|err| AppError::InvalidRequest(err.to_string()))?;
    }

    let (files, rejected): (Vec<_>, Vec<_>) =
        files.into_iter().partition(UploadedFile::is_text_log);
    let notices = rejected
        .into_iter()
        .map(|file| {
            warn!(file = %file.filename, "not a .txt log; skipping");
            RunNotice::UnsupportedExtension {
                file: file.filename,
            }
        })
        .collect();

    Ok(AttendanceTally::new()
        .run(&context, &files)
        .with_leading_notices(notices))
}

pub(crate) async fn report_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<AttendanceReportRequest>,
) -> Result<Json<AttendanceReportView>, AppError> {
    let outcome = run_request(&state, payload)?;
    Ok(Json(outcome.view()))
}

pub(crate) async fn report_csv_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<AttendanceReportRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = run_request(&state, payload)?;
    let body = to_csv_string(&outcome.table)?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                attachment_disposition(CSV_FALLBACK_NAME, CSV_FILE_NAME),
            ),
        ],
        body,
    ))
}

pub(crate) async fn report_xlsx_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<AttendanceReportRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = run_request(&state, payload)?;
    let body = to_xlsx_bytes(&outcome.table)?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                attachment_disposition(XLSX_FALLBACK_NAME, XLSX_FILE_NAME),
            ),
        ],
        body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use attendance_tally::workflows::attendance::RunContext;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state(ready: bool) -> AppState {
        let recorder = PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(recorder.handle()),
            context: Arc::new(RunContext::default()),
        }
    }

    fn app(ready: bool) -> Router {
        attendance_routes().layer(Extension(test_state(ready)))
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    fn sample_body() -> serde_json::Value {
        json!({
            "files": [
                { "filename": "0509출석.txt", "content": "1) 1조 홍길동\n2) 하고랩스 김민수" },
                { "filename": "0510.txt", "content": "1) ???" },
                { "filename": "메모.txt", "content": "1) 홍길동" }
            ]
        })
    }

    #[tokio::test]
    async fn report_endpoint_returns_table_and_notices() {
        let response = app(true)
            .oneshot(post_json("/api/v1/attendance/report", sample_body()))
            .await
            .expect("request handled");
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(
            body["columns"],
            json!(["이름", "2024-05-09", "2024-05-10", "총 횟수"])
        );
        assert_eq!(
            body["rows"],
            json!([["홍길동", "O", "X", "1"], ["김민수", "O", "X", "1"]])
        );
        assert_eq!(body["notices"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["notices"][0]["kind"], "unmatched_line");
        assert_eq!(body["notices"][1]["kind"], "unrecognized_date");
    }

    #[tokio::test]
    async fn assumed_year_can_be_overridden_per_request() {
        let body = json!({
            "files": [{ "filename": "5월 9일.txt", "content": "1) 홍길동" }],
            "assumed_year": 2025
        });
        let Json(view) = report_endpoint(
            Extension(test_state(true)),
            Json(serde_json::from_value(body).expect("request parses")),
        )
        .await
        .expect("report builds");

        assert_eq!(view.assumed_year, 2025);
        assert_eq!(view.columns[1], "2025-05-09");
    }

    #[tokio::test]
    async fn uploads_without_a_txt_extension_are_skipped() {
        let body = json!({
            "files": [
                { "filename": "0509.md", "content": "1) 홍길동" },
                { "filename": "0510.TXT", "content": "1) 김민수" }
            ]
        });
        let Json(view) = report_endpoint(
            Extension(test_state(true)),
            Json(serde_json::from_value(body).expect("request parses")),
        )
        .await
        .expect("report builds");

        assert_eq!(view.columns, vec!["이름", "2024-05-10", "총 횟수"]);
        assert_eq!(view.rows, vec![vec!["김민수", "O", "1"]]);
        assert_eq!(view.notices.len(), 1);
        assert_eq!(view.notices[0].kind, "unsupported_extension");
        assert_eq!(view.notices[0].file.as_deref(), Some("0509.md"));
    }

    #[tokio::test]
    async fn empty_batches_are_rejected() {
        let response = app(true)
            .oneshot(post_json(
                "/api/v1/attendance/report",
                json!({ "files": [] }),
            ))
            .await
            .expect("request handled");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn csv_download_matches_the_json_rows() {
        let response = app(true)
            .oneshot(post_json("/api/v1/attendance/report.csv", sample_body()))
            .await
            .expect("request handled");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            CSV_CONTENT_TYPE
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            attachment_disposition(CSV_FALLBACK_NAME, CSV_FILE_NAME).as_str()
        );

        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        assert_eq!(
            String::from_utf8(bytes.to_vec()).expect("utf-8 body"),
            "이름,2024-05-09,2024-05-10,총 횟수\n홍길동,O,X,1\n김민수,O,X,1\n"
        );
    }

    #[tokio::test]
    async fn xlsx_download_is_an_attachment() {
        let response = app(true)
            .oneshot(post_json("/api/v1/attendance/report.xlsx", sample_body()))
            .await
            .expect("request handled");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"attendance_by_date.xlsx\"; \
             filename*=UTF-8''%EB%82%A0%EC%A7%9C%EB%B3%84_%EC%B0%B8%EC%97%AC%ED%98%84%ED%99%A9.xlsx"
        );

        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        assert_eq!(&bytes[..2], b"PK");
    }

    #[tokio::test]
    async fn readiness_reflects_the_flag() {
        let response = app(false)
            .oneshot(
                Request::builder()
                    .uri("/ready")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("request handled");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = app(true)
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("request handled");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
