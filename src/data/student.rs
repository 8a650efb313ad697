use crate::data::{ApiDate, Entity, number_or_string};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaccinationStatus {
    pub vaccine_name: String,
    #[serde(default)]
    pub date: ApiDate,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "number_or_string")]
    pub drive_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub class: String,
    pub student_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<ApiDate>,
    #[serde(default)]
    pub vaccination_status: Vec<VaccinationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_date: Option<ApiDate>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "number_or_string")]
    pub drive_id: Option<String>,
    #[serde(rename = "__v", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

impl Student {
    /// Case-insensitive substring match over name, student id and class.
    pub fn matches(&self, lowercase_term: &str) -> bool {
        [&self.name, &self.student_id, &self.class]
            .into_iter()
            .any(|field| field.to_lowercase().contains(lowercase_term))
    }

    pub fn is_vaccinated(&self) -> bool {
        !self.vaccination_status.is_empty()
    }
}

impl Entity for Student {
    const COLLECTION: &'static str = "/students";
    const NOUN: &'static str = "student";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// Filters already-fetched students, keeping their order.
pub fn filter_students<'a>(students: &'a [Student], term: &str) -> Vec<&'a Student> {
    let term = term.to_lowercase();
    students
        .iter()
        .filter(|student| term.is_empty() || student.matches(&term))
        .collect()
}

/// Body of `POST /students/vaccinate`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VaccinateRequest {
    pub student_id: String,
    pub drive_id: String,
}

#[cfg(test)]
pub fn test_student(id: &str, name: &str, student_id: &str, class: &str) -> Student {
    Student {
        id: Some(id.into()),
        name: name.into(),
        class: class.into(),
        student_id: student_id.into(),
        date_of_birth: None,
        vaccination_status: vec![],
        drive_date: None,
        drive_id: None,
        version: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::remove_by_id;

    #[test]
    fn deserialises_backend_shape() {
        let json = r#"{
            "_id": "65f0",
            "name": "Asha",
            "class": "Class 4",
            "studentId": "S-104",
            "dateOfBirth": "2015-06-01T00:00:00.000Z",
            "vaccinationStatus": [{"vaccineName": "BCG", "date": "2020-01-01T00:00:00.000Z", "driveId": "D1"}],
            "driveId": 7,
            "__v": 3
        }"#;
        let student: Student = serde_json::from_str(json).unwrap();
        assert_eq!(student.id.as_deref(), Some("65f0"));
        assert_eq!(student.drive_id.as_deref(), Some("7"));
        assert_eq!(student.version, Some(3));
        assert_eq!(
            student.date_of_birth.and_then(|d| d.iso()).as_deref(),
            Some("2015-06-01")
        );
        assert_eq!(student.vaccination_status[0].drive_id.as_deref(), Some("D1"));
    }

    #[test]
    fn vaccinations_without_dates_are_kept() {
        let json = r#"{"_id":"1","name":"Asha","class":"Class 4","studentId":"S-1",
            "dateOfBirth":null,
            "vaccinationStatus":[{"vaccineName":"BCG","date":null},{"vaccineName":"MMR"}]}"#;
        let student: Student = serde_json::from_str(json).unwrap();
        assert!(student.date_of_birth.is_none());
        assert_eq!(student.vaccination_status.len(), 2);
        assert!(student.vaccination_status.iter().all(|v| v.date.long().is_none()));
    }

    #[test]
    fn new_students_have_no_identity_on_the_wire() {
        let mut student = test_student("x", "Asha", "S-1", "Class 1");
        student.id = None;
        let value = serde_json::to_value(&student).unwrap();
        assert!(value.get("_id").is_none());
        assert!(value.get("__v").is_none());
        assert_eq!(value["studentId"], "S-1");
        assert_eq!(value["vaccinationStatus"], serde_json::json!([]));
    }

    #[test]
    fn filtering_ten_matches_any_field_in_any_order() {
        let students = vec![
            test_student("1", "Ten Tenison", "S-001", "Class 1"),
            test_student("2", "Priya", "S-100", "Class 2"),
            test_student("3", "Ravi", "S-003", "Class 10"),
            test_student("4", "Meera", "S-004", "Class 3"),
            test_student("5", "Room 10 kid", "S-005", "Class 4"),
        ];
        let matched: Vec<_> = filter_students(&students, "10")
            .into_iter()
            .map(|s| s.id.clone().unwrap())
            .collect();
        assert_eq!(matched, vec!["2", "3", "5"]);

        let mut reversed = students.clone();
        reversed.reverse();
        let mut matched_reversed: Vec<_> = filter_students(&reversed, "10")
            .into_iter()
            .map(|s| s.id.clone().unwrap())
            .collect();
        matched_reversed.sort();
        assert_eq!(matched_reversed, vec!["2", "3", "5"]);
    }

    #[test]
    fn filtering_is_case_insensitive() {
        let students = vec![
            test_student("1", "Asha", "abc-1", "Class 1"),
            test_student("2", "Bilal", "XYZ-2", "Class 2"),
        ];
        assert_eq!(filter_students(&students, "ABC").len(), 1);
        assert_eq!(filter_students(&students, "class").len(), 2);
        assert_eq!(filter_students(&students, "").len(), 2);
        //the term is matched as typed, surrounding spaces included
        assert!(filter_students(&students, " abc").is_empty());
        assert_eq!(filter_students(&students, "class 2").len(), 1);
    }

    #[test]
    fn removing_by_id_takes_exactly_one() {
        let mut students = vec![
            test_student("1", "A", "S-1", "Class 1"),
            test_student("2", "B", "S-2", "Class 1"),
            test_student("3", "C", "S-3", "Class 1"),
        ];
        assert!(remove_by_id(&mut students, "2"));
        assert_eq!(students.len(), 2);
        assert!(students.iter().all(|s| s.id.as_deref() != Some("2")));
        assert!(!remove_by_id(&mut students, "missing"));
        assert_eq!(students.len(), 2);
    }
}
