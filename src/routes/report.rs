use crate::{
    auth::VaxSession,
    data::{ApiDate, report::ReportRow},
    error::VaxResult,
    export::{ExportFormat, HEADER},
    maud_conveniences::{INPUT_CLASSES, LABEL_CLASSES, alert, form_submit_button, notice, table, title},
    routes::{page_card, urlencode},
    state::VaxState,
};
use axum::{
    Form,
    body::Body,
    extract::{Query, State},
    http::{Response, header},
    response::IntoResponse,
};
use maud::{Markup, html};
use serde::Deserialize;

pub const NO_STUDENT_MESSAGE: &str = "Please enter a Student ID.";
pub const NO_RECORDS_MESSAGE: &str = "No vaccination records found for this student.";
pub const NO_DATA_MESSAGE: &str = "No data to download.";

pub async fn get_report_page(State(state): State<VaxState>, session: VaxSession) -> Markup {
    let page = report_page(&state, None).await;
    state.render(session, page)
}

async fn report_page(state: &VaxState, status: Option<Markup>) -> Markup {
    //only used to suggest ids, a failure here shouldn't stop anyone typing one in
    let student_ids = match state.students().await {
        Ok(students) => students
            .iter()
            .map(|s| (s.student_id.clone(), s.name.clone()))
            .collect(),
        Err(e) => {
            warn!(?e, "unable to fetch students for the report picker");
            vec![]
        }
    };

    page_card(html! {
        (title("Vaccination Report"))
        form hx-post="/report/generate" hx-target="#report" class="p-4" {
            div class="mb-4" {
                label for="student_id" class=(LABEL_CLASSES) {"Student ID"}
                input type="text" list="student_ids" id="student_id" name="student_id" class=(INPUT_CLASSES) {}
                datalist id="student_ids" {
                    @for (student_id, name) in student_ids {
                        option value=(student_id) {(name)}
                    }
                }
            }
            (form_submit_button(Some("Generate Report")))
        }
        div id="report" {
            @if let Some(status) = status {
                (status)
            }
        }
    })
}

#[derive(Deserialize)]
pub struct GenerateForm {
    #[serde(default)]
    student_id: String,
}

pub async fn post_generate_report(
    State(state): State<VaxState>,
    Form(GenerateForm { student_id }): Form<GenerateForm>,
) -> Markup {
    let student_id = student_id.trim();
    if student_id.is_empty() {
        return alert("Error", NO_STUDENT_MESSAGE);
    }

    match state.fresh_report(student_id).await {
        Ok(rows) if rows.is_empty() => notice(NO_RECORDS_MESSAGE),
        Ok(rows) => report_table(student_id, &rows),
        Err(e) => alert("Error", e.user_message("Failed to generate report.")),
    }
}

pub fn report_table(student_id: &str, rows: &[ReportRow]) -> Markup {
    let long = |date: Option<&ApiDate>| {
        date.map_or_else(String::new, |date| {
            date.long().unwrap_or_else(|| "Invalid Date".to_string())
        })
    };

    html! {
        div class="flex flex-row space-x-4 mb-4" {
            @for format in [ExportFormat::Csv, ExportFormat::Xlsx] {
                a href={"/report/download?student_id=" (urlencode(student_id)) "&format=" (format_name(format))}
                    class="bg-green-700 hover:bg-green-900 font-bold py-2 px-4 rounded" {
                    "Download " (format_name(format).to_uppercase())
                }
            }
        }
        (table(
            HEADER,
            rows.iter()
                .map(|row| [
                    html! {(row.vaccine_name)},
                    html! {(long(row.date.as_ref()))},
                    html! {(long(row.drive_date.as_ref()))},
                    html! {(row.drive_id.as_deref().unwrap_or_default())},
                ])
                .collect(),
        ))
    }
}

const fn format_name(format: ExportFormat) -> &'static str {
    match format {
        ExportFormat::Csv => "csv",
        ExportFormat::Xlsx => "xlsx",
    }
}


#[derive(Deserialize)]
pub struct DownloadQuery {
    #[serde(default)]
    student_id: String,
    #[serde(default)]
    format: String,
}

/// Exports whatever report was last generated for the student. Nothing is fetched here.
pub async fn get_download_report(
    State(state): State<VaxState>,
    session: VaxSession,
    Query(DownloadQuery { student_id, format }): Query<DownloadQuery>,
) -> VaxResult<Response<Body>> {
    let format = ExportFormat::parse(&format).unwrap_or(ExportFormat::Csv);
    let rows = state
        .held_report(student_id.trim())
        .await
        .unwrap_or_default();

    let Some(bytes) = format.render(&rows)? else {
        info!(%student_id, "nothing to download");
        let page = report_page(&state, Some(notice(NO_DATA_MESSAGE))).await;
        return Ok(state.render(session, page).into_response());
    };

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", format.file_name()),
            ),
        ],
        bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::recording::RecordingApi, data::student::test_student, routes::test_server::logged_in,
    };
    use jiff::civil::date;
    use std::sync::Arc;

    fn bcg_row() -> ReportRow {
        ReportRow {
            vaccine_name: "BCG".into(),
            date: Some(ApiDate::from(date(2020, 1, 1))),
            drive_date: Some(ApiDate::from(date(2020, 1, 5))),
            drive_id: Some("D1".into()),
        }
    }

    fn api_with_report() -> Arc<RecordingApi> {
        let api = RecordingApi::default();
        *api.report.lock().unwrap() = vec![bcg_row()];
        Arc::new(api)
    }

    #[test]
    fn table_uses_long_dates() {
        let rows = [ReportRow {
            vaccine_name: "MMR".into(),
            date: Some(serde_json::from_str("\"junk\"").unwrap()),
            drive_date: Some(ApiDate::from(date(2021, 3, 9))),
            drive_id: None,
        }];
        let markup = report_table("S 1", &rows).into_string();
        assert!(markup.contains("Invalid Date"));
        assert!(markup.contains("March 9, 2021"));
        assert!(markup.contains("student_id=S+1&amp;format=csv"));
    }

    #[tokio::test]
    async fn generating_needs_a_student() {
        let api = api_with_report();
        let server = logged_in(api.clone()).await;
        let body = server
            .post_form("/report/generate", &[("student_id", "  ")])
            .await
            .text()
            .await
            .unwrap();
        assert!(body.contains(NO_STUDENT_MESSAGE));
        assert_eq!(api.count("get_vaccination_report"), 0);
    }

    #[tokio::test]
    async fn empty_reports_are_a_notice_not_an_error() {
        let api = Arc::new(RecordingApi::default());
        let server = logged_in(api).await;
        let body = server
            .post_form("/report/generate", &[("student_id", "S-1")])
            .await
            .text()
            .await
            .unwrap();
        assert!(body.contains(NO_RECORDS_MESSAGE));
        assert!(body.contains("role=\"status\""));
    }

    #[tokio::test]
    async fn downloads_export_the_generated_report_without_refetching() {
        let api = api_with_report();
        let server = logged_in(api.clone()).await;

        let before = server.get("/report/download?student_id=S-1&format=csv").await;
        assert!(before.text().await.unwrap().contains(NO_DATA_MESSAGE));

        let generated = server
            .post_form("/report/generate", &[("student_id", "S-1")])
            .await
            .text()
            .await
            .unwrap();
        assert!(generated.contains("January 1, 2020"));

        let csv = server.get("/report/download?student_id=S-1&format=csv").await;
        assert_eq!(
            csv.headers().get("content-disposition").and_then(|v| v.to_str().ok()),
            Some("attachment; filename=\"vaccination_report.csv\"")
        );
        let text = csv.text().await.unwrap();
        assert_eq!(text.lines().nth(1), Some("BCG,2020-01-01,2020-01-05,D1"));

        let xlsx = server.get("/report/download?student_id=S-1&format=xlsx").await;
        assert_eq!(
            xlsx.headers().get("content-type").and_then(|v| v.to_str().ok()),
            Some(ExportFormat::Xlsx.content_type())
        );
        assert!(xlsx.bytes().await.unwrap().starts_with(b"PK"));

        assert_eq!(api.count("get_vaccination_report"), 1);
    }

    #[tokio::test]
    async fn editing_another_student_keeps_the_loaded_report_downloadable() {
        let api = RecordingApi::with_students(vec![test_student("abc", "Asha", "S-2", "Class 1")]);
        *api.report.lock().unwrap() = vec![bcg_row()];
        let api = Arc::new(api);
        let server = logged_in(api.clone()).await;

        server
            .post_form("/report/generate", &[("student_id", "S-1")])
            .await;
        let saved = server
            .post_form(
                "/students/edit/abc",
                &[("name", "Asha K"), ("student_id", "S-2"), ("class", "Class 1"), ("action", "save")],
            )
            .await;
        assert!(saved.status().is_redirection());

        let csv = server
            .get("/report/download?student_id=S-1&format=csv")
            .await
            .text()
            .await
            .unwrap();
        assert!(!csv.contains(NO_DATA_MESSAGE));
        assert_eq!(csv.lines().nth(1), Some("BCG,2020-01-01,2020-01-05,D1"));
        assert_eq!(api.count("get_vaccination_report"), 1);
    }
}
