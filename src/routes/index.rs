use crate::{
    auth::VaxSession,
    data::dashboard::DashboardData,
    error::VaxResult,
    maud_conveniences::{alert, subtitle, title},
    state::VaxState,
};
use axum::{extract::State, response::Redirect};
use maud::{Markup, html};

pub const MAX_UPCOMING_DRIVES: usize = 5;

pub async fn get_index_route() -> Redirect {
    Redirect::to("/dashboard")
}

pub async fn get_dashboard(
    State(state): State<VaxState>,
    session: VaxSession,
) -> VaxResult<Markup> {
    let contents = match state.dashboard().await {
        Ok(data) => render_dashboard(&data),
        Err(e) => alert("Error", e.user_message("Failed to fetch dashboard data.")),
    };

    Ok(state.render(session, html! {
        div class="bg-gray-800 p-8 rounded shadow-md max-w-4xl w-full" {
            (title("Dashboard"))
            (contents)
        }
    }))
}

pub fn render_dashboard(data: &DashboardData) -> Markup {
    let stat = |label: &str, value: String| {
        html! {
            div class="bg-gray-700 rounded-lg shadow-md p-4 text-center" {
                p class="text-sm text-gray-300" {(label)}
                p class="text-3xl font-bold" {(value)}
            }
        }
    };

    html! {
        div class="grid grid-cols-1 sm:grid-cols-3 gap-4 mb-8" {
            (stat("Total Students", data.total_students.to_string()))
            (stat("Vaccinated Students", data.vaccinated_students.to_string()))
            (stat("Vaccination Rate", format!("{}%", data.percentage_display())))
        }

        (subtitle("Upcoming Vaccination Drives"))
        @if data.upcoming_drives.is_empty() {
            p class="italic text-gray-400" {"No upcoming drives"}
        } @else {
            ul class="list-disc list-inside space-y-1" {
                @for drive in data.upcoming_drives.iter().take(MAX_UPCOMING_DRIVES) {
                    li {
                        (drive.vaccine_name)
                        " on "
                        (drive.date.long().unwrap_or_else(|| "Date not available".to_string()))
                    }
                }
            }
        }
    }
}
