use crate::{
    auth::{backend::VaxAuthBackend, memory_store::MemorySessionStore},
    maud_conveniences::{alert, tabs},
    state::VaxState,
};
use axum::{
    Router,
    http::{HeaderName, HeaderValue},
    routing::{delete, get, post},
};
use axum_login::{
    AuthManagerLayerBuilder, login_required,
    tower_sessions::{Expiry, SessionManagerLayer, cookie::time::Duration},
};
use maud::{Markup, html};
use tower_http::trace::TraceLayer;

pub mod bulk;
pub mod drives;
pub mod index;
pub mod login;
pub mod report;
pub mod student_form;
pub mod students;

/// Tells htmx to leave the triggering element alone. Out-of-band swaps still happen.
pub const HX_RESWAP: HeaderName = HeaderName::from_static("hx-reswap");
pub const NO_SWAP: HeaderValue = HeaderValue::from_static("none");

pub fn router(state: VaxState, session_store: MemorySessionStore) -> Router {
    let session_layer = SessionManagerLayer::new(session_store).with_expiry(Expiry::OnInactivity(
        Duration::days(state.config().session_idle_days()),
    ));
    let auth_backend = VaxAuthBackend::new(state.config().admin());
    let auth_layer = AuthManagerLayerBuilder::new(auth_backend, session_layer).build();

    let trace_layer = TraceLayer::new_for_http();

    Router::new()
        .route("/", get(index::get_index_route))
        .route("/dashboard", get(index::get_dashboard))
        .route("/students", get(students::get_students))
        .route(
            "/students/add",
            get(student_form::get_add_student).post(student_form::post_add_student),
        )
        .route(
            "/students/edit/{id}",
            get(student_form::get_edit_student).post(student_form::post_edit_student),
        )
        .route("/students/{id}", delete(students::delete_student))
        .route(
            "/students/import",
            get(bulk::get_import_page).post(bulk::post_import),
        )
        .route(
            "/students/vaccinate",
            get(bulk::get_vaccinate_page).post(bulk::post_vaccinate),
        )
        .route("/internal/students", get(students::internal_get_student_rows))
        .route("/vaccination-drives", get(drives::get_drives))
        .route(
            "/vaccination-drives/add",
            get(drives::get_add_drive).post(drives::post_add_drive),
        )
        .route(
            "/vaccination-drives/edit/{id}",
            get(drives::get_edit_drive).post(drives::post_edit_drive),
        )
        .route("/vaccination-drives/{id}", delete(drives::delete_drive))
        .route("/report", get(report::get_report_page))
        .route("/report/generate", post(report::post_generate_report))
        .route("/report/download", get(report::get_download_report))
        .route_layer(login_required!(VaxAuthBackend, login_url = "/login"))
        .route("/login", get(login::get_login).post(login::post_login))
        .route("/logout", post(login::post_logout))
        .layer(auth_layer)
        .layer(trace_layer)
        .with_state(state)
}

pub fn students_tabs(active: usize) -> Markup {
    tabs(
        &[
            ("/students", "All Students"),
            ("/students/add", "Add Student"),
            ("/students/import", "Upload CSV"),
            ("/students/vaccinate", "Vaccinate"),
        ],
        active,
    )
}

pub fn drives_tabs(active: usize) -> Markup {
    tabs(
        &[
            ("/vaccination-drives", "All Drives"),
            ("/vaccination-drives/add", "Add Drive"),
        ],
        active,
    )
}

/// Percent-encodes a query parameter value.
pub fn urlencode(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

/// An alert swapped into the page's alert area, whatever the request's own target was.
pub fn oob_alert(message: &str) -> Markup {
    html! {
        div id="alerts" hx-swap-oob="true" class="w-full max-w-4xl" {
            (alert("Error", message))
        }
    }
}

pub fn page_card(contents: Markup) -> Markup {
    html! {
        div class="bg-gray-800 p-8 rounded shadow-md max-w-4xl w-full" {
            (contents)
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_server::*;
    use crate::api::recording::RecordingApi;
    use std::sync::Arc;

    #[tokio::test]
    async fn pages_need_a_login() {
        let server = unauthenticated(Arc::new(RecordingApi::default())).await;
        for path in ["/dashboard", "/students", "/vaccination-drives", "/report"] {
            let response = server.get(path).await;
            assert!(response.status().is_redirection(), "{path} was served");
            assert!(location(&response).starts_with("/login"), "{path}");
        }

        let login_page = server.get("/login").await;
        assert!(login_page.status().is_success());
        assert!(!login_page.text().await.unwrap().contains("Log Out"));
    }

    #[tokio::test]
    async fn wrong_credentials_are_refused() {
        let server = unauthenticated(Arc::new(RecordingApi::default())).await;
        let response = server
            .post_form(
                "/login",
                &[("username", "admin"), ("password", "nope"), ("next", "/students")],
            )
            .await;
        assert_eq!(
            location(&response),
            "/login?login_failed=true&next=%2Fstudents"
        );

        let page = server.get(location(&response)).await.text().await.unwrap();
        assert!(page.contains("Invalid credentials. Please try again."));
    }

    #[tokio::test]
    async fn logging_in_shows_the_side_panel_and_logging_out_ends_it() {
        let server = logged_in(Arc::new(RecordingApi::default())).await;
        let dashboard = server.get("/dashboard").await;
        assert!(dashboard.status().is_success());
        let body = dashboard.text().await.unwrap();
        for link in ["Dashboard", "Students", "Vaccination Drives", "Report", "Log Out"] {
            assert!(body.contains(link), "missing {link}");
        }

        let logout = server.post_form("/logout", &[]).await;
        assert_eq!(location(&logout), "/login");
        assert!(server.get("/dashboard").await.status().is_redirection());
    }

    #[tokio::test]
    async fn root_goes_to_the_dashboard() {
        let server = logged_in(Arc::new(RecordingApi::default())).await;
        assert_eq!(location(&server.get("/").await), "/dashboard");
    }
}
