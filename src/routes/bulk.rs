use crate::{
    api::{IMPORT_FIELD_NAME, PortalApi},
    auth::VaxSession,
    data::student::VaccinateRequest,
    error::{MultipartSnafu, VaxResult},
    maud_conveniences::{INPUT_CLASSES, LABEL_CLASSES, alert, form_submit_button, notice, title},
    routes::{page_card, students_tabs},
    state::VaxState,
};
use axum::{
    Form,
    extract::{Multipart, State},
};
use maud::{Markup, html};
use serde::Deserialize;
use snafu::ResultExt;

pub const NO_FILE_MESSAGE: &str = "Please select a file to upload.";
pub const IMPORTED_MESSAGE: &str = "Students imported successfully.";

/// A file picked for import: its name as uploaded, and its bytes.
pub struct Upload {
    pub file_name: String,
    pub contents: Vec<u8>,
}

pub async fn get_import_page(State(state): State<VaxState>, session: VaxSession) -> Markup {
    state.render(session, page_card(html! {
        (students_tabs(2))
        (title("Upload Students CSV"))
        p class="text-sm text-gray-300 mb-4" {
            "The file is sent to the backend as-is, which checks every row."
        }
        div id="import_status" {}
        (import_form(false))
    }))
}

/// `oob` renders it to replace the form already on the page, which clears the picked file.
fn import_form(oob: bool) -> Markup {
    html! {
        form id="import_form" hx-swap-oob=[oob.then_some("true")] hx-post="/students/import" hx-encoding="multipart/form-data" hx-target="#import_status" class="p-4" {
            div class="mb-4" {
                label for=(IMPORT_FIELD_NAME) class=(LABEL_CLASSES) {"CSV File"}
                input type="file" accept=".csv,text/csv" id=(IMPORT_FIELD_NAME) name=(IMPORT_FIELD_NAME) class=(INPUT_CLASSES) {}
            }
            (form_submit_button(Some("Upload")))
        }
    }
}

pub async fn post_import(
    State(state): State<VaxState>,
    mut multipart: Multipart,
) -> VaxResult<Markup> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.context(MultipartSnafu)? {
        if field.name() != Some(IMPORT_FIELD_NAME) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let contents = field.bytes().await.context(MultipartSnafu)?;
        upload = Some(Upload {
            file_name,
            contents: contents.to_vec(),
        });
    }

    Ok(match import(state.api(), upload).await {
        Ok(()) => {
            state.students_changed().await;
            html! {
                (notice(IMPORTED_MESSAGE))
                (import_form(true))
            }
        }
        Err(message) => alert("Import failed", message),
    })
}

/// Forwards the upload to the backend, or says why it couldn't.
pub async fn import(api: &dyn PortalApi, upload: Option<Upload>) -> Result<(), String> {
    let Some(upload) = upload.filter(|u| !u.file_name.is_empty() && !u.contents.is_empty()) else {
        return Err(NO_FILE_MESSAGE.to_string());
    };

    info!(file_name = %upload.file_name, bytes = upload.contents.len(), "importing students");
    api.import_students(upload.file_name, upload.contents)
        .await
        .map_err(|e| {
            warn!(?e, "import refused");
            e.user_message("Failed to import students.")
        })
}

pub async fn get_vaccinate_page(
    State(state): State<VaxState>,
    session: VaxSession,
) -> Markup {
    let contents = match (state.students().await, state.drives().await) {
        (Ok(students), Ok(drives)) => html! {
            div id="vaccinate_status" {}
            form hx-post="/students/vaccinate" hx-target="#vaccinate_status" class="p-4" {
                div class="mb-4" {
                    label for="student_id" class=(LABEL_CLASSES) {"Student"}
                    select required id="student_id" name="student_id" class=(INPUT_CLASSES) {
                        option value="" {"Select a student..."}
                        @for student in students.iter() {
                            option value=(student.student_id) {
                                (student.name) " (" (student.student_id) ", " (student.class) ")"
                            }
                        }
                    }
                }
                div class="mb-4" {
                    label for="drive_id" class=(LABEL_CLASSES) {"Vaccination Drive"}
                    select required id="drive_id" name="drive_id" class=(INPUT_CLASSES) {
                        option value="" {"Select a drive..."}
                        @for drive in drives.iter() {
                            @if let Some(id) = &drive.id {
                                option value=(id) {
                                    (drive.vaccine_name) " - "
                                    (drive.date.long().unwrap_or_else(|| "Invalid Date".to_string()))
                                    " (" (drive.available_doses) " doses left)"
                                }
                            }
                        }
                    }
                }
                (form_submit_button(Some("Record Vaccination")))
            }
        },
        (Err(e), _) | (_, Err(e)) => alert("Error", e.user_message("Failed to load students and drives.")),
    };

    state.render(session, page_card(html! {
        (students_tabs(3))
        (title("Vaccinate a Student"))
        (contents)
    }))
}

#[derive(Deserialize)]
pub struct VaccinateForm {
    #[serde(default)]
    student_id: String,
    #[serde(default)]
    drive_id: String,
}

pub async fn post_vaccinate(
    State(state): State<VaxState>,
    Form(VaccinateForm {
        student_id,
        drive_id,
    }): Form<VaccinateForm>,
) -> Markup {
    let (student_id, drive_id) = (student_id.trim(), drive_id.trim());
    if student_id.is_empty() || drive_id.is_empty() {
        return alert("Error", "Please select a student and a drive.");
    }

    let request = VaccinateRequest {
        student_id: student_id.to_string(),
        drive_id: drive_id.to_string(),
    };
    match state.api().vaccinate_student(&request).await {
        Ok(()) => {
            info!(?request, "recorded vaccination");
            state.students_changed().await;
            state.drives_changed().await;
            notice("Vaccination recorded.")
        }
        Err(e) => {
            warn!(?e, ?request, "unable to record vaccination");
            alert("Error", e.user_message("Failed to record vaccination"))
        }
    }
}
