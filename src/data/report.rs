use crate::data::{ApiDate, number_or_string};
use serde::{Deserialize, Serialize};

/// One line of `GET /students/report/{studentId}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    #[serde(default)]
    pub vaccine_name: String,
    #[serde(default)]
    pub date: Option<ApiDate>,
    #[serde(default)]
    pub drive_date: Option<ApiDate>,
    #[serde(default, deserialize_with = "number_or_string")]
    pub drive_id: Option<String>,
}

impl ReportRow {
    /// Cells in export column order, dates as `yyyy-MM-dd` and blank when they can't be read.
    pub fn export_cells(&self) -> [String; 4] {
        [
            self.vaccine_name.clone(),
            self.date.as_ref().and_then(ApiDate::iso).unwrap_or_default(),
            self.drive_date
                .as_ref()
                .and_then(ApiDate::iso)
                .unwrap_or_default(),
            self.drive_id.clone().unwrap_or_default(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_blank_unreadable_dates() {
        let row: ReportRow = serde_json::from_str(
            r#"{"vaccineName":"MMR","date":"garbage","driveDate":null,"driveId":12}"#,
        )
        .unwrap();
        assert_eq!(row.export_cells(), ["MMR", "", "", "12"].map(String::from));
    }
}
