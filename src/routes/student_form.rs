use crate::{
    auth::VaxSession,
    data::{CLASS_LABELS, today},
    forms::{
        FormAction, FormMode, FormPairs, SubmitOutcome,
        student::StudentForm,
        vaccination_entries::VaccinationEntries,
    },
    maud_conveniences::{
        INPUT_CLASSES, LABEL_CLASSES, alert, errors_list, form_element, select_element, subtitle,
        title,
    },
    routes::{page_card, students_tabs},
    state::VaxState,
};
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use maud::{Markup, html};

pub async fn get_add_student(State(state): State<VaxState>, session: VaxSession) -> Markup {
    state.render(session, student_page(&StudentForm::new(), None))
}

pub async fn get_edit_student(
    State(state): State<VaxState>,
    session: VaxSession,
    Path(id): Path<String>,
) -> Markup {
    let contents = match StudentForm::load(state.api(), id).await {
        Ok(form) => student_page(&form, None),
        Err(message) => page_card(html! {
            (students_tabs(usize::MAX))
            (alert("Error", message))
        }),
    };
    state.render(session, contents)
}

pub async fn post_add_student(
    State(state): State<VaxState>,
    session: VaxSession,
    Form(pairs): Form<FormPairs>,
) -> Response {
    handle_submission(state, session, FormMode::Create, &pairs).await
}

pub async fn post_edit_student(
    State(state): State<VaxState>,
    session: VaxSession,
    Path(id): Path<String>,
    Form(pairs): Form<FormPairs>,
) -> Response {
    handle_submission(state, session, FormMode::Edit { id }, &pairs).await
}

async fn handle_submission(
    state: VaxState,
    session: VaxSession,
    mode: FormMode,
    pairs: &[(String, String)],
) -> Response {
    let mut form = StudentForm::from_pairs(mode, pairs);
    if form.apply_local(FormAction::from_pairs(pairs), today()) {
        return state.render(session, student_page(&form, None)).into_response();
    }

    let problems = match form.submit(state.api()).await {
        SubmitOutcome::Saved(student) => {
            info!(student_id = %student.student_id, "saved student");
            state.students_changed().await;
            return Redirect::to("/students").into_response();
        }
        SubmitOutcome::Invalid(messages) => errors_list(None, messages),
        SubmitOutcome::Rejected(message) => alert("Error", message),
    };

    state
        .render(session, student_page(&form, Some(problems)))
        .into_response()
}

fn student_page(form: &StudentForm, problems: Option<Markup>) -> Markup {
    let (tab, heading) = if form.mode.is_edit() {
        (usize::MAX, "Edit Student")
    } else {
        (1, "Add Student")
    };

    page_card(html! {
        (students_tabs(tab))
        (title(heading))
        @if let Some(problems) = problems {
            (problems)
        }
        (student_form(form))
    })
}

pub fn student_form(form: &StudentForm) -> Markup {
    let submit_text = if form.mode.is_edit() {
        "Update Student"
    } else {
        "Add Student"
    };

    html! {
        form method="post" action=(form.mode.action_url("/students")) class="p-4" {
            @if let Some(version) = form.version {
                input type="hidden" name="version" value=(version) {}
            }
            (form_element("name", "Name", true, None, Some(form.name.as_str())))
            (form_element("student_id", "Student ID", true, None, Some(form.student_id.as_str())))
            (select_element("class", "Class", true, CLASS_LABELS, &form.class))
            (form_element("date_of_birth", "Date of Birth (optional)", false, Some("date"), Some(form.date_of_birth.as_str())))
            (form_element("drive_date", "Drive Date (optional)", false, Some("date"), Some(form.drive_date.as_str())))
            (form_element("drive_id", "Drive ID (optional)", false, None, Some(form.drive_id.as_str())))

            (subtitle("Vaccinations"))
            (vaccination_entries(&form.vaccinations))

            div class="flex items-center justify-between mt-4" {
                button type="submit" name=(FormAction::FIELD) value=(FormAction::Save.value())
                    class="bg-blue-500 hover:bg-blue-700 font-bold py-2 px-4 rounded focus:outline-none focus:shadow-outline" {
                    (submit_text)
                }
            }
        }
    }
}

fn vaccination_entries(entries: &VaccinationEntries) -> Markup {
    let add_button = |text: &str| {
        html! {
            button type="submit" formnovalidate name=(FormAction::FIELD) value=(FormAction::AddVaccination.value())
                class="bg-slate-600 hover:bg-slate-800 font-bold py-1 px-3 rounded" {
                (text)
            }
        }
    };
    let last = entries.last_id();

    html! {
        div class="mb-4 space-y-2" {
            @if entries.is_empty() {
                (add_button("Add Vaccination"))
            }
            @for (id, entry) in entries.iter() {
                div class="flex flex-row space-x-2 items-end" {
                    div {
                        label class=(LABEL_CLASSES) {"Vaccine"}
                        input type="text" name=(VaccinationEntries::field_name(id, "vaccine_name")) value=(entry.vaccine_name) class=(INPUT_CLASSES) {}
                    }
                    div {
                        label class=(LABEL_CLASSES) {"Date"}
                        input type="date" name=(VaccinationEntries::field_name(id, "date")) value=(entry.date) class=(INPUT_CLASSES) {}
                    }
                    div {
                        label class=(LABEL_CLASSES) {"Drive ID"}
                        input type="text" name=(VaccinationEntries::field_name(id, "drive_id")) value=(entry.drive_id) class=(INPUT_CLASSES) {}
                    }
                    button type="submit" formnovalidate name=(FormAction::FIELD) value=(FormAction::RemoveVaccination(id).value())
                        class="bg-red-600 hover:bg-red-800 font-bold py-1 px-3 rounded" {
                        "Remove"
                    }
                    @if last == Some(id) {
                        (add_button("Add Another"))
                    }
                }
            }
        }
    }
}
