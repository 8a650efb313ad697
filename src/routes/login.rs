use crate::{
    auth::{VaxSession, backend::VaxAuthCredentials},
    error::VaxResult,
    maud_conveniences::{alert, form_element, form_submit_button, title},
    routes::urlencode,
    state::VaxState,
};
use axum::{
    Form,
    body::Body,
    extract::{Query, State},
    http::Response,
    response::{IntoResponse, Redirect},
};
use maud::html;
use secrecy::SecretString;
use serde::Deserialize;

pub const LOGIN_FAILED_MESSAGE: &str = "Invalid credentials. Please try again.";

#[derive(Deserialize)]
pub struct LoginOptions {
    pub next: Option<String>,
    pub login_failed: Option<bool>,
}

/// Only same-site paths, so the login form can't be used to bounce people elsewhere.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(next) if next.starts_with('/') && !next.starts_with("//") => next,
        _ => "/dashboard",
    }
}

pub async fn get_login(
    State(state): State<VaxState>,
    session: VaxSession,
    Query(LoginOptions { next, login_failed }): Query<LoginOptions>,
) -> Response<Body> {
    if session.user.is_some() {
        return Redirect::to(safe_next(next.as_deref())).into_response();
    }

    let login_failed = login_failed.unwrap_or(false);

    state.render(session, html! {
        div class="bg-gray-800 shadow-md rounded px-8 pt-6 pb-8 mb-4 w-full max-w-sm" {
            (title("School Vaccination Portal"))
            @if login_failed {
                (alert("Alert!", LOGIN_FAILED_MESSAGE))
            }

            form method="post" action="/login" {
                @if let Some(next) = next {
                    input type="hidden" name="next" value=(next) {}
                }
                (form_element("username", "Username", true, None, None))
                (form_element("password", "Password", true, Some("password"), None))
                (form_submit_button(Some("Login")))
            }
        }
    }).into_response()
}

#[derive(Deserialize)]
pub struct LoginForm {
    username: String,
    password: SecretString,
    next: Option<String>,
}

pub async fn post_login(
    mut session: VaxSession,
    Form(LoginForm {
        username,
        password,
        next,
    }): Form<LoginForm>,
) -> VaxResult<Redirect> {
    match session
        .authenticate(VaxAuthCredentials::UsernamePassword { username, password })
        .await?
    {
        Some(admin) => {
            session.login(&admin).await?;
            info!(username = admin.username(), "admin logged in");
            Ok(Redirect::to(safe_next(next.as_deref())))
        }
        None => {
            warn!("failed login attempt");
            let mut redirect = "/login?login_failed=true".to_string();
            if let Some(next) = next.filter(|next| !next.is_empty()) {
                redirect += "&next=";
                redirect += &urlencode(&next);
            }
            Ok(Redirect::to(&redirect))
        }
    }
}


pub async fn post_logout(mut session: VaxSession) -> VaxResult<Redirect> {
    session.logout().await?;
    Ok(Redirect::to("/login"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_must_stay_on_site() {
        assert_eq!(safe_next(Some("/students")), "/students");
        assert_eq!(safe_next(Some("//evil.example")), "/dashboard");
        assert_eq!(safe_next(Some("https://evil.example")), "/dashboard");
        assert_eq!(safe_next(None), "/dashboard");
    }

    #[test]
    fn next_survives_a_failed_login() {
        assert_eq!(urlencode("/students?search=a b"), "%2Fstudents%3Fsearch%3Da+b");
    }
}
