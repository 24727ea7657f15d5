use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::AttendancePolicy;
use crate::error::ApiError;
use crate::models::{AttendanceSummary, StudentProfile};
use crate::roster;
use crate::source::GridSource;

/// Shared, read-only state handed to every request.
pub struct AppState {
    pub source: GridSource,
    pub students_range: String,
    pub attendance_range: String,
    pub policy: AttendancePolicy,
    pub config_presence: ConfigPresence,
}

/// Which optional settings were supplied. Values are never exposed.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPresence {
    pub sheet_id: bool,
    pub api_key: bool,
    pub access_token: bool,
    pub data_dir: bool,
}

impl AppState {
    pub async fn student(&self, roll: &str) -> Result<StudentProfile, ApiError> {
        let grid = self
            .source
            .fetch(&self.students_range)
            .await?
            .ok_or_else(|| ApiError::not_found("No data found in Students sheet"))?;
        roster::find_student(&grid, roll)
    }

    pub async fn attendance(&self, roll: &str) -> Result<AttendanceSummary, ApiError> {
        let grid = self
            .source
            .fetch(&self.attendance_range)
            .await?
            .ok_or_else(|| ApiError::not_found("No attendance data found"))?;
        roster::attendance_for(&grid, roll, &self.policy)
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/test", web::get().to(config_check))
        .service(
            web::scope("/api/student")
                .route("/{roll}", web::get().to(student))
                .route("/{roll}/attendance", web::get().to(attendance))
                .route("/{roll}/combined", web::get().to(combined)),
        );
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "API is running" }))
}

async fn config_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Configuration check",
        "source": state.source.kind(),
        "config": state.config_presence,
    }))
}

async fn student(
    state: web::Data<AppState>,
    roll: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let roll = roll.into_inner();
    let span = tracing::info_span!("student", request_id = %Uuid::new_v4(), roll = %roll);
    async {
        let profile = state.student(&roll).await.inspect_err(log_failure)?;
        tracing::info!("student found");
        Ok::<_, ApiError>(HttpResponse::Ok().json(json!({ "success": true, "data": profile })))
    }
    .instrument(span)
    .await
}

async fn attendance(
    state: web::Data<AppState>,
    roll: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let roll = roll.into_inner();
    let span = tracing::info_span!("attendance", request_id = %Uuid::new_v4(), roll = %roll);
    async {
        let summary = state.attendance(&roll).await.inspect_err(log_failure)?;
        tracing::info!(months = summary.months.len(), "attendance built");
        Ok::<_, ApiError>(HttpResponse::Ok().json(json!({
            "success": true,
            "data": { "attendance": summary },
        })))
    }
    .instrument(span)
    .await
}

async fn combined(
    state: web::Data<AppState>,
    roll: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let roll = roll.into_inner();
    let span = tracing::info_span!("combined", request_id = %Uuid::new_v4(), roll = %roll);
    async {
        let profile = state.student(&roll).await.inspect_err(log_failure)?;
        let summary = match state.attendance(&roll).await {
            Ok(summary) => summary,
            Err(err @ (ApiError::NotFound(_) | ApiError::BadRequest(_))) => {
                tracing::warn!(reason = %err, "attendance unavailable, returning empty calendar");
                AttendanceSummary::empty()
            }
            Err(err) => {
                log_failure(&err);
                return Err(err);
            }
        };
        Ok::<_, ApiError>(HttpResponse::Ok().json(json!({
            "success": true,
            "data": { "student": profile, "attendance": summary },
        })))
    }
    .instrument(span)
    .await
}

fn log_failure(err: &ApiError) {
    match err {
        ApiError::Upstream(source) => tracing::error!(error = %format!("{source:#}"), "request failed"),
        other => tracing::info!(reason = %other, "request rejected"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::Value;

    use super::*;
    use crate::source::CellGrid;

    fn grid(rows: &[&[&str]]) -> CellGrid {
        CellGrid::new(
            rows.iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
        )
    }

    fn state_with(grids: Vec<(&str, CellGrid)>) -> web::Data<AppState> {
        let grids: HashMap<String, CellGrid> = grids
            .into_iter()
            .map(|(name, grid)| (name.to_string(), grid))
            .collect();
        web::Data::new(AppState {
            source: GridSource::InMemory(grids),
            students_range: "Students!A:Z".to_string(),
            attendance_range: "Attendance!A:ZZ".to_string(),
            policy: AttendancePolicy::default(),
            config_presence: ConfigPresence {
                sheet_id: true,
                ..ConfigPresence::default()
            },
        })
    }

    fn school() -> web::Data<AppState> {
        state_with(vec![
            (
                "Students",
                grid(&[
                    &["Roll No", "Name", "Class", "School", "DOB", "Father Name", "Mother Name"],
                    &["101", "Asha Rao", "5A", "Hill View", "2014-03-02", "Vikram", "Meera"],
                    &["102", "Ravi Das", "5B", "Hill View", "2014-07-19", "Suresh", "Lata"],
                ]),
            ),
            (
                "Attendance",
                grid(&[
                    &["Roll No", "Date", "Status", "Time"],
                    &["101", "15/01/2024", "P", "08:01"],
                    &["101", "16/01/2024", "A", ""],
                    &["101", "01/02/2024", "P", "late"],
                ]),
            ),
        ])
    }

    async fn get(state: web::Data<AppState>, uri: &str) -> (StatusCode, Value) {
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }

    #[actix_web::test]
    async fn root_reports_running() {
        let (status, body) = get(school(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "API is running");
    }

    #[actix_web::test]
    async fn config_check_reports_presence_only() {
        let (status, body) = get(school(), "/test").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["source"], "memory");
        assert_eq!(body["config"]["sheetId"], true);
        assert_eq!(body["config"]["apiKey"], false);
    }

    #[actix_web::test]
    async fn student_profile() {
        let (status, body) = get(school(), "/api/student/101").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["name"], "Asha Rao");
        assert_eq!(body["data"]["fatherName"], "Vikram");
        assert_eq!(body["data"]["motherName"], "Meera");
        assert_eq!(body["data"]["rollNumber"], "101");
    }

    #[actix_web::test]
    async fn unknown_student_is_404() {
        let (status, body) = get(school(), "/api/student/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Student not found");
    }

    #[actix_web::test]
    async fn attendance_calendar() {
        let (status, body) = get(school(), "/api/student/101/attendance").await;
        assert_eq!(status, StatusCode::OK);
        let attendance = &body["data"]["attendance"];
        assert_eq!(attendance["yearToDate"]["totalDays"], 3);
        assert_eq!(attendance["yearToDate"]["daysPresent"], 2);
        assert_eq!(attendance["yearToDate"]["percentage"], "66.7");

        let months = attendance["months"].as_array().unwrap();
        assert_eq!(months.len(), 2);
        assert_eq!(months[0]["month"], 0);
        assert_eq!(months[0]["percentage"], "50.0");
        let days = months[0]["days"].as_array().unwrap();
        assert_eq!(days.len(), 31);
        assert_eq!(days[14]["status"], "present");
        assert_eq!(days[14]["timeStatus"], "on-time");
        assert_eq!(days[15]["status"], "absent");
        assert_eq!(days[15]["timeStatus"], "");
        assert_eq!(days[0]["status"], "no-school");
        assert_eq!(days[0]["isSchoolDay"], false);
        assert_eq!(months[1]["days"][0]["timeStatus"], "late");
    }

    #[actix_web::test]
    async fn empty_attendance_range_is_404() {
        let state = state_with(vec![
            ("Students", grid(&[&["Roll"], &["1"]])),
            ("Attendance", grid(&[&["Roll", "Date", "Status"]])),
        ]);
        let (status, body) = get(state, "/api/student/1/attendance").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "No attendance data found");
    }

    #[actix_web::test]
    async fn missing_date_columns_is_400() {
        let state = state_with(vec![
            ("Students", grid(&[&["Roll"], &["1"]])),
            ("Attendance", grid(&[&["Roll", "Status"], &["1", "P"]])),
        ]);
        let (status, _) = get(state, "/api/student/1/attendance").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn upstream_failure_is_500_with_message() {
        let state = state_with(vec![]);
        let (status, body) = get(state, "/api/student/1").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("unknown range"));
    }

    #[actix_web::test]
    async fn combined_returns_both() {
        let (status, body) = get(school(), "/api/student/101/combined").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["student"]["class"], "5A");
        assert_eq!(body["data"]["attendance"]["yearToDate"]["totalDays"], 3);
    }

    #[actix_web::test]
    async fn combined_falls_back_to_empty_attendance() {
        let (status, body) = get(school(), "/api/student/102/combined").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["student"]["name"], "Ravi Das");
        let attendance = &body["data"]["attendance"];
        assert_eq!(attendance["yearToDate"]["totalDays"], 0);
        assert_eq!(attendance["yearToDate"]["percentage"], "0");
        assert!(attendance["months"].as_array().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn combined_unknown_student_is_404() {
        let (status, _) = get(school(), "/api/student/999/combined").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
