use crate::{
    auth::VaxSession,
    data::{CLASS_LABELS, drive::VaccinationDrive, remove_by_id},
    forms::{FormMode, FormPairs, SubmitOutcome, drive::DriveForm},
    maud_conveniences::{
        LABEL_CLASSES, alert, errors_list, form_element, form_submit_button, render_table, title,
    },
    routes::{HX_RESWAP, NO_SWAP, drives_tabs, oob_alert, page_card},
    state::VaxState,
};
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use maud::{Markup, html};

pub async fn get_drives(State(state): State<VaxState>, session: VaxSession) -> Markup {
    let list = match state.drives().await {
        Ok(drives) => drives_table(&drives),
        Err(e) => alert("Error", e.user_message("Failed to fetch vaccination drives.")),
    };

    state.render(session, page_card(html! {
        (drives_tabs(0))
        (list)
    }))
}

pub fn drives_table(drives: &[VaccinationDrive]) -> Markup {
    if drives.is_empty() {
        return html! {
            (title("Vaccination Drives"))
            p class="italic text-gray-400" {"No vaccination drives scheduled."}
        };
    }

    render_table(
        "Vaccination Drives",
        ["Vaccine", "Date", "Available Doses", "Classes", ""],
        drives
            .iter()
            .map(|drive| {
                [
                    html! {(drive.vaccine_name)},
                    html! {(drive.date.long().unwrap_or_else(|| "Invalid Date".to_string()))},
                    html! {(drive.available_doses)},
                    html! {(drive.applicable_classes.join(", "))},
                    drive_actions(drive),
                ]
            })
            .collect(),
    )
}

fn drive_actions(drive: &VaccinationDrive) -> Markup {
    let Some(id) = &drive.id else {
        return html! {};
    };

    //the delete swaps out the whole row, so it targets the `tr` the table wraps this cell in
    html! {
        div class="flex flex-row space-x-2" {
            a href={"/vaccination-drives/edit/" (id)} class="bg-blue-600 hover:bg-blue-800 font-bold py-1 px-3 rounded" {"Edit"}
            button class="bg-red-600 hover:bg-red-800 font-bold py-1 px-3 rounded"
                hx-delete={"/vaccination-drives/" (id)}
                hx-confirm={"Are you sure you want to delete the " (drive.vaccine_name) " drive?"}
                hx-target="closest tr" hx-swap="outerHTML" {
                "Delete"
            }
        }
    }
}

pub async fn delete_drive(State(state): State<VaxState>, Path(id): Path<String>) -> Response {
    match state.api().delete_drive(&id).await {
        Ok(()) => {
            info!(%id, "deleted vaccination drive");
            let pruned = state
                .update_drives(|drives| {
                    remove_by_id(drives, &id);
                })
                .await;
            if !pruned {
                state.drives_changed().await;
            }
            state.dashboard_changed().await;
            html! {}.into_response()
        }
        Err(e) => {
            warn!(?e, %id, "unable to delete vaccination drive");
            (
                [(HX_RESWAP, NO_SWAP)],
                oob_alert(&e.user_message("Failed to delete drive")),
            )
                .into_response()
        }
    }
}

pub async fn get_add_drive(State(state): State<VaxState>, session: VaxSession) -> Markup {
    state.render(session, drive_page(&DriveForm::new(), None))
}

pub async fn get_edit_drive(
    State(state): State<VaxState>,
    session: VaxSession,
    Path(id): Path<String>,
) -> Markup {
    let contents = match DriveForm::load(state.api(), id).await {
        Ok(form) => drive_page(&form, None),
        Err(message) => page_card(html! {
            (drives_tabs(usize::MAX))
            (alert("Error", message))
        }),
    };
    state.render(session, contents)
}

pub async fn post_add_drive(
    State(state): State<VaxState>,
    session: VaxSession,
    Form(pairs): Form<FormPairs>,
) -> Response {
    handle_submission(state, session, DriveForm::from_pairs(FormMode::Create, &pairs)).await
}

pub async fn post_edit_drive(
    State(state): State<VaxState>,
    session: VaxSession,
    Path(id): Path<String>,
    Form(pairs): Form<FormPairs>,
) -> Response {
    handle_submission(
        state,
        session,
        DriveForm::from_pairs(FormMode::Edit { id }, &pairs),
    )
    .await
}

async fn handle_submission(state: VaxState, session: VaxSession, form: DriveForm) -> Response {
    let problems = match form.submit(state.api()).await {
        SubmitOutcome::Saved(drive) => {
            info!(vaccine_name = %drive.vaccine_name, "saved vaccination drive");
            state.drives_changed().await;
            return Redirect::to("/vaccination-drives").into_response();
        }
        SubmitOutcome::Invalid(messages) => errors_list(None, messages),
        SubmitOutcome::Rejected(message) => alert("Error", message),
    };

    state
        .render(session, drive_page(&form, Some(problems)))
        .into_response()
}

fn drive_page(form: &DriveForm, problems: Option<Markup>) -> Markup {
    let (tab, heading) = if form.mode.is_edit() {
        (usize::MAX, "Edit Vaccination Drive")
    } else {
        (1, "Add Vaccination Drive")
    };

    page_card(html! {
        (drives_tabs(tab))
        (title(heading))
        @if let Some(problems) = problems {
            (problems)
        }
        (drive_form(form))
    })
}

pub fn drive_form(form: &DriveForm) -> Markup {
    html! {
        form method="post" action=(form.mode.action_url("/vaccination-drives")) class="p-4" {
            @if let Some(version) = form.version {
                input type="hidden" name="version" value=(version) {}
            }
            (form_element("vaccine_name", "Vaccine Name", true, None, Some(form.vaccine_name.as_str())))
            (form_element("date", "Date", true, Some("date"), Some(form.date.as_str())))
            (form_element("available_doses", "Available Doses", true, Some("number"), Some(form.available_doses.as_str())))

            fieldset class="mb-4" {
                legend class=(LABEL_CLASSES) {"Applicable Classes"}
                div class="grid grid-cols-2 sm:grid-cols-5 gap-2" {
                    @for class in CLASS_LABELS {
                        label class="flex items-center space-x-2" {
                            input type="checkbox" name="applicable_classes" value=(class)
                                checked[form.applicable_classes.iter().any(|c| c == class)] {}
                            span {(class)}
                        }
                    }
                }
            }

            (form_submit_button(Some(if form.mode.is_edit() { "Update Drive" } else { "Add Drive" })))
        }
    }
}
