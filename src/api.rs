//! The vaccination backend, as seen by the portal.
//!
//! Every operation is one request/response round trip. Nothing here retries or caches: that is the job of
//! [`crate::query`]. Errors from the backend are passed straight back to the caller.

use crate::{
    data::{
        dashboard::DashboardData,
        drive::VaccinationDrive,
        report::ReportRow,
        student::{Student, VaccinateRequest},
    },
    error::VaxResult,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod http;
#[cfg(test)]
pub mod recording;

/// Multipart field name the backend reads the uploaded roster from.
pub const IMPORT_FIELD_NAME: &str = "file";

#[async_trait]
pub trait PortalApi: Send + Sync + Debug {
    async fn get_all_students(&self) -> VaxResult<Vec<Student>>;
    async fn get_student(&self, id: &str) -> VaxResult<Student>;
    async fn create_student(&self, student: &Student) -> VaxResult<Student>;
    async fn update_student(&self, id: &str, student: &Student) -> VaxResult<Student>;
    async fn delete_student(&self, id: &str) -> VaxResult<()>;
    async fn import_students(&self, file_name: String, contents: Vec<u8>) -> VaxResult<()>;
    async fn vaccinate_student(&self, request: &VaccinateRequest) -> VaxResult<()>;
    async fn get_vaccination_report(&self, student_id: &str) -> VaxResult<Vec<ReportRow>>;
    async fn get_dashboard_data(&self) -> VaxResult<DashboardData>;

    async fn get_all_drives(&self) -> VaxResult<Vec<VaccinationDrive>>;
    async fn get_drive(&self, id: &str) -> VaxResult<VaccinationDrive>;
    async fn create_drive(&self, drive: &VaccinationDrive) -> VaxResult<VaccinationDrive>;
    async fn update_drive(&self, id: &str, drive: &VaccinationDrive) -> VaxResult<VaccinationDrive>;
    async fn delete_drive(&self, id: &str) -> VaxResult<()>;
}
