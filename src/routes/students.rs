use crate::{
    auth::VaxSession,
    data::{
        remove_by_id,
        student::{Student, filter_students},
    },
    error::VaxResult,
    maud_conveniences::{INPUT_CLASSES, alert, title},
    routes::{HX_RESWAP, NO_SWAP, oob_alert, page_card, students_tabs},
    state::VaxState,
};
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub search: String,
}

pub async fn get_students(
    State(state): State<VaxState>,
    session: VaxSession,
) -> VaxResult<Markup> {
    let list = match state.students().await {
        Ok(students) => students_table(&filter_students(&students, "")),
        Err(e) => alert("Error", e.user_message("Failed to fetch students.")),
    };

    Ok(state.render(session, page_card(html! {
        (students_tabs(0))
        (title("Students"))
        input type="search" name="search" placeholder="Search by name, ID or class..."
            class={(INPUT_CLASSES) " mb-4"}
            hx-get="/internal/students" hx-trigger="input changed delay:300ms, search" hx-target="#student_rows" {}
        (list)
    })))
}

/// Rows matching `search`, from the held list. Typing never refetches, however old the list is.
pub async fn internal_get_student_rows(
    State(state): State<VaxState>,
    Query(SearchQuery { search }): Query<SearchQuery>,
) -> Markup {
    match state.held_students().await {
        Ok(students) => student_rows(&filter_students(&students, &search)),
        Err(e) => oob_alert(&e.user_message("Failed to fetch students.")),
    }
}

pub async fn delete_student(State(state): State<VaxState>, Path(id): Path<String>) -> Response {
    match state.api().delete_student(&id).await {
        Ok(()) => {
            info!(%id, "deleted student");
            let pruned = state
                .update_students(|students| {
                    remove_by_id(students, &id);
                })
                .await;
            if !pruned {
                state.students_changed().await;
            }
            state.dashboard_changed().await;
            //the row is swapped for nothing
            html! {}.into_response()
        }
        Err(e) => {
            warn!(?e, %id, "unable to delete student");
            (
                [(HX_RESWAP, NO_SWAP)],
                oob_alert(&e.user_message("Failed to delete student")),
            )
                .into_response()
        }
    }
}

pub fn students_table(students: &[&Student]) -> Markup {
    html! {
        div class="overflow-x-auto" {
            table class="min-w-full bg-gray-800 rounded shadow-md" {
                thead class="bg-gray-700" {
                    tr {
                        @for heading in ["Name", "Student ID", "Class", "Date of Birth", "Vaccinations", ""] {
                            th class="py-2 px-4 text-left font-semibold text-gray-300" {(heading)}
                        }
                    }
                }
                tbody id="student_rows" {
                    (student_rows(students))
                }
            }
        }
    }
}

pub fn student_rows(students: &[&Student]) -> Markup {
    html! {
        @if students.is_empty() {
            tr {
                td colspan="6" class="py-2 px-4 italic text-gray-400" {"No students found."}
            }
        }
        @for student in students {
            (student_row(student))
        }
    }
}

fn student_row(student: &Student) -> Markup {
    const CELL: &str = "py-2 px-4 border-b border-gray-600 text-gray-200";

    let date_of_birth = student.date_of_birth.as_ref().map_or_else(
        || "N/A".to_string(),
        |dob| dob.long().unwrap_or_else(|| "Invalid Date".to_string()),
    );

    html! {
        tr {
            td class=(CELL) {(student.name)}
            td class=(CELL) {(student.student_id)}
            td class=(CELL) {(student.class)}
            td class=(CELL) {(date_of_birth)}
            td class=(CELL) {
                @if student.is_vaccinated() {
                    ul {
                        @for vaccination in &student.vaccination_status {
                            li {
                                (vaccination.vaccine_name)
                                " ("
                                (vaccination.date.long().unwrap_or_else(|| "Invalid Date".to_string()))
                                ")"
                            }
                        }
                    }
                } @else {
                    span class="italic text-gray-400" {"Not Vaccinated"}
                }
            }
            td class=(CELL) {
                @if let Some(id) = &student.id {
                    div class="flex flex-row space-x-2" {
                        a href={"/students/edit/" (id)} class="bg-blue-600 hover:bg-blue-800 font-bold py-1 px-3 rounded" {"Edit"}
                        button class="bg-red-600 hover:bg-red-800 font-bold py-1 px-3 rounded"
                            hx-delete={"/students/" (id)}
                            hx-confirm={"Are you sure you want to delete " (student.name) "?"}
                            hx-target="closest tr" hx-swap="outerHTML" {
                            "Delete"
                        }
                    }
                }
            }
        }
    }
}
