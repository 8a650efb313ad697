use crate::{
    api::{IMPORT_FIELD_NAME, PortalApi},
    data::{
        Entity,
        dashboard::DashboardData,
        drive::VaccinationDrive,
        report::ReportRow,
        student::{Student, VaccinateRequest},
    },
    error::{DecodeResponseSnafu, HttpSnafu, VaxError, VaxResult},
};
use async_trait::async_trait;
use reqwest::{
    Client, Method, RequestBuilder, Response, StatusCode, Url,
    multipart::{Form, Part},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use snafu::ResultExt;

/// Talks JSON over HTTP to the vaccination backend.
#[derive(Debug, Clone)]
pub struct HttpPortalApi {
    client: Client,
    base_url: Url,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl HttpPortalApi {
    pub fn new(base_url: &str) -> VaxResult<Self> {
        let trimmed = base_url.trim_end_matches('/');
        let base_url = Url::parse(trimmed).map_err(|e| VaxError::InvalidBaseUrl {
            url: trimmed.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(VaxError::InvalidBaseUrl {
                url: trimmed.to_string(),
                reason: "not a base url".to_string(),
            });
        }

        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    /// Appends path segments to the base, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.url(segments);
        debug!(%method, %url, "backend request");
        self.client.request(method, url)
    }

    async fn send(request: RequestBuilder) -> VaxResult<Response> {
        let response = request.send().await.context(HttpSnafu)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&error_text)
            .ok()
            .and_then(|body| body.message)
            .filter(|message| !message.trim().is_empty());
        warn!(%status, body = %error_text, "backend refused request");

        Err(match status {
            StatusCode::NOT_FOUND => VaxError::NotFound { message },
            StatusCode::CONFLICT => VaxError::Conflict { message },
            _ => VaxError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn json<T: DeserializeOwned>(request: RequestBuilder) -> VaxResult<T> {
        Self::send(request)
            .await?
            .json::<T>()
            .await
            .context(DecodeResponseSnafu)
    }

    async fn list<T: Entity>(&self) -> VaxResult<Vec<T>> {
        Self::json(self.request(Method::GET, &[collection(T::COLLECTION)])).await
    }

    async fn get<T: Entity>(&self, id: &str) -> VaxResult<T> {
        Self::json(self.request(Method::GET, &[collection(T::COLLECTION), id])).await
    }

    async fn create<T: Entity>(&self, entity: &T) -> VaxResult<T> {
        Self::json(
            self.request(Method::POST, &[collection(T::COLLECTION)])
                .json(entity),
        )
        .await
    }

    async fn update<T: Entity>(&self, id: &str, entity: &T) -> VaxResult<T> {
        Self::json(
            self.request(Method::PUT, &[collection(T::COLLECTION), id])
                .json(entity),
        )
        .await
    }

    async fn delete<T: Entity>(&self, id: &str) -> VaxResult<()> {
        Self::send(self.request(Method::DELETE, &[collection(T::COLLECTION), id])).await?;
        Ok(())
    }

    async fn post_status(&self, segments: &[&str], body: &impl Serialize) -> VaxResult<()> {
        Self::send(self.request(Method::POST, segments).json(body)).await?;
        Ok(())
    }
}

fn collection(path: &'static str) -> &'static str {
    path.trim_start_matches('/')
}

#[async_trait]
impl PortalApi for HttpPortalApi {
    async fn get_all_students(&self) -> VaxResult<Vec<Student>> {
        self.list().await
    }

    async fn get_student(&self, id: &str) -> VaxResult<Student> {
        self.get(id).await
    }

    async fn create_student(&self, student: &Student) -> VaxResult<Student> {
        self.create(student).await
    }

    async fn update_student(&self, id: &str, student: &Student) -> VaxResult<Student> {
        self.update(id, student).await
    }

    async fn delete_student(&self, id: &str) -> VaxResult<()> {
        self.delete::<Student>(id).await
    }

    async fn import_students(&self, file_name: String, contents: Vec<u8>) -> VaxResult<()> {
        let part = Part::bytes(contents)
            .file_name(file_name)
            .mime_str("text/csv")
            .context(HttpSnafu)?;
        let form = Form::new().part(IMPORT_FIELD_NAME, part);

        Self::send(
            self.request(Method::POST, &["students", "import"])
                .multipart(form),
        )
        .await?;
        Ok(())
    }

    async fn vaccinate_student(&self, request: &VaccinateRequest) -> VaxResult<()> {
        self.post_status(&["students", "vaccinate"], request).await
    }

    async fn get_vaccination_report(&self, student_id: &str) -> VaxResult<Vec<ReportRow>> {
        Self::json(self.request(Method::GET, &["students", "report", student_id])).await
    }

    async fn get_dashboard_data(&self) -> VaxResult<DashboardData> {
        Self::json(self.request(Method::GET, &["students", "dashboard", "data"])).await
    }

    async fn get_all_drives(&self) -> VaxResult<Vec<VaccinationDrive>> {
        self.list().await
    }

    async fn get_drive(&self, id: &str) -> VaxResult<VaccinationDrive> {
        self.get(id).await
    }

    async fn create_drive(&self, drive: &VaccinationDrive) -> VaxResult<VaccinationDrive> {
        self.create(drive).await
    }

    async fn update_drive(&self, id: &str, drive: &VaccinationDrive) -> VaxResult<VaccinationDrive> {
        self.update(id, drive).await
    }

    async fn delete_drive(&self, id: &str) -> VaxResult<()> {
        self.delete::<VaccinationDrive>(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::student::test_student;
    use axum::{
        Json, Router,
        extract::{Multipart, Path},
        http::StatusCode as AxumStatus,
        routing::{get, post},
    };
    use serde_json::json;

    async fn fake_backend() -> String {
        let app = Router::new()
            .route(
                "/api/students",
                get(|| async { Json(json!([{"_id": "1", "name": "Asha", "class": "Class 1", "studentId": "S-1", "vaccinationStatus": []}])) })
                    .post(|Json(body): Json<serde_json::Value>| async move {
                        if body.get("_id").is_some() {
                            return (AxumStatus::BAD_REQUEST, Json(json!({"message": "client sent an id"})));
                        }
                        let mut created = body;
                        created["_id"] = json!("new-id");
                        (AxumStatus::CREATED, Json(created))
                    }),
            )
            .route(
                "/api/students/{id}",
                get(|Path(id): Path<String>| async move {
                    (AxumStatus::NOT_FOUND, Json(json!({"message": format!("Student {id} not found")})))
                })
                .put(|| async { (AxumStatus::CONFLICT, "stale") })
                .delete(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "<html>boom</html>") }),
            )
            .route(
                "/api/students/report/{student_id}",
                get(|Path(student_id): Path<String>| async move {
                    Json(json!([{"vaccineName": student_id, "date": "2020-01-01", "driveDate": "2020-01-05", "driveId": "D1"}]))
                }),
            )
            .route(
                "/api/students/import",
                post(|mut multipart: Multipart| async move {
                    let Ok(Some(field)) = multipart.next_field().await else {
                        return (AxumStatus::BAD_REQUEST, Json(json!({"message": "no file"})));
                    };
                    let name = field.name().map(ToString::to_string);
                    let file_name = field.file_name().map(ToString::to_string);
                    let text = field.text().await.unwrap_or_default();
                    if name.as_deref() == Some("file") && file_name.as_deref() == Some("roster.csv") && text.starts_with("name,") {
                        (AxumStatus::OK, Json(json!({"message": "imported"})))
                    } else {
                        (AxumStatus::BAD_REQUEST, Json(json!({"message": "wrong field"})))
                    }
                }),
            )
            .route(
                "/api/students/vaccinate",
                post(|Json(body): Json<serde_json::Value>| async move {
                    if body == json!({"studentId": "S-1", "driveId": "D1"}) {
                        (AxumStatus::OK, Json(json!({"message": "ok"})))
                    } else {
                        (AxumStatus::BAD_REQUEST, Json(json!({"message": "Drive is full"})))
                    }
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}/api/")
    }

    #[tokio::test]
    async fn lists_and_creates() {
        let api = HttpPortalApi::new(&fake_backend().await).unwrap();

        let students = api.get_all_students().await.unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].name, "Asha");

        let mut new_student = test_student("ignored", "Bilal", "S-2", "Class 2");
        new_student.id = None;
        let created = api.create_student(&new_student).await.unwrap();
        assert_eq!(created.id.as_deref(), Some("new-id"));
        assert_eq!(created.student_id, "S-2");
    }

    #[tokio::test]
    async fn maps_error_statuses() {
        let api = HttpPortalApi::new(&fake_backend().await).unwrap();

        let not_found = api.get_student("abc").await.unwrap_err();
        assert_eq!(not_found.user_message("generic"), "Student abc not found");

        let conflict = api
            .update_student("abc", &test_student("abc", "A", "S", "Class 1"))
            .await
            .unwrap_err();
        assert!(conflict.is_conflict());

        let html_error = api.delete_student("abc").await.unwrap_err();
        assert!(matches!(
            html_error,
            VaxError::Api {
                status: 500,
                message: None
            }
        ));
        assert_eq!(html_error.user_message("Failed to delete student"), "Failed to delete student");
    }

    #[tokio::test]
    async fn report_ids_are_path_encoded() {
        let api = HttpPortalApi::new(&fake_backend().await).unwrap();
        let rows = api.get_vaccination_report("S 1/2").await.unwrap();
        assert_eq!(rows[0].vaccine_name, "S 1/2");
        assert_eq!(rows[0].drive_id.as_deref(), Some("D1"));
    }

    #[tokio::test]
    async fn import_uses_the_file_field() {
        let api = HttpPortalApi::new(&fake_backend().await).unwrap();
        api.import_students("roster.csv".into(), b"name,studentId\nAsha,S-1\n".to_vec())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn vaccinate_surfaces_backend_message() {
        let api = HttpPortalApi::new(&fake_backend().await).unwrap();
        api.vaccinate_student(&VaccinateRequest {
            student_id: "S-1".into(),
            drive_id: "D1".into(),
        })
        .await
        .unwrap();

        let err = api
            .vaccinate_student(&VaccinateRequest {
                student_id: "S-1".into(),
                drive_id: "D9".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.user_message("Failed to record vaccination"), "Drive is full");
    }

    #[test]
    fn rejects_unusable_base_urls() {
        assert!(HttpPortalApi::new("not a url").is_err());
        let api = HttpPortalApi::new("http://localhost:5000/api/").unwrap();
        assert_eq!(
            api.url(&["students", "42"]).as_str(),
            "http://localhost:5000/api/students/42"
        );
    }
}
