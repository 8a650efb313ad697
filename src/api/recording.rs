use crate::{
    api::PortalApi,
    data::{
        dashboard::DashboardData,
        drive::VaccinationDrive,
        report::ReportRow,
        student::{Student, VaccinateRequest},
    },
    error::{VaxError, VaxResult},
};
use async_trait::async_trait;
use std::sync::Mutex;

/// In-memory stand-in for the backend that remembers every call made to it.
#[derive(Debug, Default)]
pub struct RecordingApi {
    pub students: Mutex<Vec<Student>>,
    pub drives: Mutex<Vec<VaccinationDrive>>,
    pub report: Mutex<Vec<ReportRow>>,
    pub dashboard: Mutex<DashboardData>,
    /// When set, every mutating call fails with this backend message.
    pub fail_with: Mutex<Option<String>>,
    pub calls: Mutex<Vec<String>>,
    pub sent_students: Mutex<Vec<Student>>,
    pub sent_drives: Mutex<Vec<VaccinationDrive>>,
}

impl RecordingApi {
    pub fn with_students(students: Vec<Student>) -> Self {
        let api = Self::default();
        *api.students.lock().unwrap() = students;
        api
    }

    pub fn failing(self, message: &str) -> Self {
        *self.fail_with.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn check_failure(&self) -> VaxResult<()> {
        match self.fail_with.lock().unwrap().clone() {
            Some(message) => Err(VaxError::Api {
                status: 400,
                message: Some(message),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PortalApi for RecordingApi {
    async fn get_all_students(&self) -> VaxResult<Vec<Student>> {
        self.record("get_all_students");
        Ok(self.students.lock().unwrap().clone())
    }

    async fn get_student(&self, id: &str) -> VaxResult<Student> {
        self.record(format!("get_student {id}"));
        self.students
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id.as_deref() == Some(id))
            .cloned()
            .ok_or(VaxError::NotFound { message: None })
    }

    async fn create_student(&self, student: &Student) -> VaxResult<Student> {
        self.record("create_student");
        self.sent_students.lock().unwrap().push(student.clone());
        self.check_failure()?;
        let mut created = student.clone();
        created.id = Some("created".into());
        Ok(created)
    }

    async fn update_student(&self, id: &str, student: &Student) -> VaxResult<Student> {
        self.record(format!("update_student {id}"));
        self.sent_students.lock().unwrap().push(student.clone());
        self.check_failure()?;
        let mut updated = student.clone();
        updated.id = Some(id.to_string());
        Ok(updated)
    }

    async fn delete_student(&self, id: &str) -> VaxResult<()> {
        self.record(format!("delete_student {id}"));
        self.check_failure()
    }

    async fn import_students(&self, file_name: String, _contents: Vec<u8>) -> VaxResult<()> {
        self.record(format!("import_students {file_name}"));
        self.check_failure()
    }

    async fn vaccinate_student(&self, request: &VaccinateRequest) -> VaxResult<()> {
        self.record(format!(
            "vaccinate_student {} {}",
            request.student_id, request.drive_id
        ));
        self.check_failure()
    }

    async fn get_vaccination_report(&self, student_id: &str) -> VaxResult<Vec<ReportRow>> {
        self.record(format!("get_vaccination_report {student_id}"));
        Ok(self.report.lock().unwrap().clone())
    }

    async fn get_dashboard_data(&self) -> VaxResult<DashboardData> {
        self.record("get_dashboard_data");
        Ok(self.dashboard.lock().unwrap().clone())
    }

    async fn get_all_drives(&self) -> VaxResult<Vec<VaccinationDrive>> {
        self.record("get_all_drives");
        Ok(self.drives.lock().unwrap().clone())
    }

    async fn get_drive(&self, id: &str) -> VaxResult<VaccinationDrive> {
        self.record(format!("get_drive {id}"));
        self.drives
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id.as_deref() == Some(id))
            .cloned()
            .ok_or(VaxError::NotFound { message: None })
    }

    async fn create_drive(&self, drive: &VaccinationDrive) -> VaxResult<VaccinationDrive> {
        self.record("create_drive");
        self.sent_drives.lock().unwrap().push(drive.clone());
        self.check_failure()?;
        let mut created = drive.clone();
        created.id = Some("created".into());
        Ok(created)
    }

    async fn update_drive(&self, id: &str, drive: &VaccinationDrive) -> VaxResult<VaccinationDrive> {
        self.record(format!("update_drive {id}"));
        self.sent_drives.lock().unwrap().push(drive.clone());
        self.check_failure()?;
        Ok(drive.clone())
    }

    async fn delete_drive(&self, id: &str) -> VaxResult<()> {
        self.record(format!("delete_drive {id}"));
        self.check_failure()
    }
}
