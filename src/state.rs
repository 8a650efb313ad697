use crate::{
    api::PortalApi,
    auth::VaxSession,
    config::RuntimeConfiguration,
    data::{dashboard::DashboardData, drive::VaccinationDrive, report::ReportRow, student::Student},
    error::VaxResult,
    query::QueryCache,
};
use maud::{DOCTYPE, Markup, html};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct VaxState {
    api: Arc<dyn PortalApi>,
    config: RuntimeConfiguration,
    students: QueryCache<(), Vec<Student>>,
    drives: QueryCache<(), Vec<VaccinationDrive>>,
    reports: QueryCache<String, Vec<ReportRow>>,
    dashboard: QueryCache<(), DashboardData>,
}

impl VaxState {
    pub fn new(api: Arc<dyn PortalApi>, config: RuntimeConfiguration) -> Self {
        let stale_after = config.cache_stale_after();
        Self {
            api,
            config,
            students: QueryCache::new(stale_after),
            drives: QueryCache::new(stale_after),
            reports: QueryCache::new(stale_after),
            dashboard: QueryCache::new(stale_after),
        }
    }

    pub fn api(&self) -> &dyn PortalApi {
        self.api.as_ref()
    }

    pub const fn config(&self) -> &RuntimeConfiguration {
        &self.config
    }

    pub async fn students(&self) -> VaxResult<Arc<Vec<Student>>> {
        let api = Arc::clone(&self.api);
        self.students
            .get_or_fetch((), move || async move { api.get_all_students().await })
            .await
    }

    /// The student list as already loaded, however old, for filtering. Only fetches when nothing was ever
    /// loaded.
    pub async fn held_students(&self) -> VaxResult<Arc<Vec<Student>>> {
        match self.students.peek(&()).await {
            Some(students) => Ok(students),
            None => self.students().await,
        }
    }

    pub async fn drives(&self) -> VaxResult<Arc<Vec<VaccinationDrive>>> {
        let api = Arc::clone(&self.api);
        self.drives
            .get_or_fetch((), move || async move { api.get_all_drives().await })
            .await
    }

    pub async fn dashboard(&self) -> VaxResult<Arc<DashboardData>> {
        let api = Arc::clone(&self.api);
        self.dashboard
            .get_or_fetch((), move || async move { api.get_dashboard_data().await })
            .await
    }

    /// Always asks the backend, replacing whatever report was held for `student_id`.
    pub async fn fresh_report(&self, student_id: &str) -> VaxResult<Arc<Vec<ReportRow>>> {
        let api = Arc::clone(&self.api);
        let key = student_id.to_string();
        self.reports
            .refresh(key.clone(), move || async move {
                api.get_vaccination_report(&key).await
            })
            .await
    }

    /// The last report generated for `student_id`, if any. Never fetches.
    pub async fn held_report(&self, student_id: &str) -> Option<Arc<Vec<ReportRow>>> {
        self.reports.peek(&student_id.to_string()).await
    }

    /// Edits the held student list without a round trip. `false` if no list was held.
    pub async fn update_students(&self, edit: impl FnOnce(&mut Vec<Student>)) -> bool {
        self.students.update((), edit).await
    }

    pub async fn update_drives(&self, edit: impl FnOnce(&mut Vec<VaccinationDrive>)) -> bool {
        self.drives.update((), edit).await
    }

    /// After any student write the list and the counts may be out of date. Held reports are left alone, they
    /// only change when a report is generated again.
    pub async fn students_changed(&self) {
        self.students.invalidate(()).await;
        self.dashboard.invalidate(()).await;
    }

    /// Dashboard counts stay valid after a delete that has already been applied to the held list, but the
    /// upcoming drives list does not.
    pub async fn dashboard_changed(&self) {
        self.dashboard.invalidate(()).await;
    }

    pub async fn drives_changed(&self) {
        self.drives.invalidate(()).await;
        self.dashboard.invalidate(()).await;
    }

    #[allow(clippy::unused_self, clippy::needless_pass_by_value)] //in case self is ever needed :), and to allow direct html! usage
    pub fn render(&self, auth_session: VaxSession, markup: Markup) -> Markup {
        let logged_in = auth_session.user.is_some();

        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="UTF-8" {}
                    meta name="viewport" content="width=device-width, initial-scale=1.0" {}
                    script src="https://unpkg.com/htmx.org@2.0.4" integrity="sha384-HGfztofotfshcF7+8n44JQL2oJmowVChPTg48S+jvZoztPfvwD79OC/LTtG6dMp+" crossorigin="anonymous" {}
                    script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4" {}
                    title { "School Vaccination Portal" }
                }
                body class="bg-gray-900 min-h-screen flex flex-row text-white" {
                    @if logged_in {
                        (side_panel())
                    }
                    main class="flex-1 p-8 flex flex-col items-center" {
                        div id="alerts" class="w-full max-w-4xl" {}
                        (markup)
                    }
                }
            }
        }
    }
}

fn side_panel() -> Markup {
    const LINKS: [(&str, &str); 4] = [
        ("/dashboard", "Dashboard"),
        ("/students", "Students"),
        ("/vaccination-drives", "Vaccination Drives"),
        ("/report", "Report"),
    ];

    html! {
        nav class="w-56 bg-gray-800 p-4 flex flex-col space-y-2" {
            h2 class="text-lg font-bold mb-4" {"Vaccination Portal"}
            @for (href, label) in LINKS {
                a href=(href) class="py-2 px-4 rounded hover:bg-gray-700" {(label)}
            }
            form method="post" action="/logout" class="mt-auto" {
                button type="submit" class="w-full text-left py-2 px-4 rounded bg-red-700 hover:bg-red-900" {"Log Out"}
            }
        }
    }
}

#[cfg(test)]
pub fn test_state(api: Arc<dyn PortalApi>) -> VaxState {
    VaxState::new(
        api,
        RuntimeConfiguration::for_tests(crate::auth::backend::test_admin_config()),
    )
}

#[cfg(test)]
pub fn test_state_stale_after(api: Arc<dyn PortalApi>, stale_after: std::time::Duration) -> VaxState {
    VaxState::new(
        api,
        RuntimeConfiguration::for_tests(crate::auth::backend::test_admin_config())
            .with_cache_stale_after(stale_after),
    )
}
