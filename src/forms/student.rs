use crate::{
    api::PortalApi,
    data::{ApiDate, is_class_label, parse_date_input, student::Student},
    forms::{
        FormAction, FormMode, REQUIRED_FIELDS_MESSAGE, SubmitOutcome, field,
        vaccination_entries::VaccinationEntries,
    },
};
use bitflags::bitflags;
use jiff::civil::Date;

pub const SAVE_FAILED_MESSAGE: &str = "Failed to save student";
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch student details.";

bitflags! {
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct StudentValidationError: u8 {
        const MISSING_REQUIRED =       0b0000_0001;
        const UNKNOWN_CLASS =          0b0000_0010;
        const BAD_DATE =               0b0000_0100;
        const INCOMPLETE_VACCINATION = 0b0000_1000;
    }
}

impl StudentValidationError {
    pub fn as_nice_list(&self) -> impl Iterator<Item = &'static str> {
        self.iter().filter_map(|e| match e {
            Self::MISSING_REQUIRED => Some(REQUIRED_FIELDS_MESSAGE),
            Self::UNKNOWN_CLASS => Some("Class must be one of Class 1 to Class 10."),
            Self::BAD_DATE => Some("Dates must be entered as yyyy-MM-dd."),
            Self::INCOMPLETE_VACCINATION => {
                Some("Every vaccination needs a vaccine name and a date.")
            }
            _ => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StudentForm {
    pub mode: FormMode,
    pub name: String,
    pub student_id: String,
    pub class: String,
    pub date_of_birth: String,
    pub drive_date: String,
    pub drive_id: String,
    pub version: Option<u32>,
    pub vaccinations: VaccinationEntries,
}

impl StudentForm {
    pub fn new() -> Self {
        Self {
            mode: FormMode::Create,
            name: String::new(),
            student_id: String::new(),
            class: String::new(),
            date_of_birth: String::new(),
            drive_date: String::new(),
            drive_id: String::new(),
            version: None,
            vaccinations: VaccinationEntries::default(),
        }
    }

    /// Pre-populates every field from a fetched student.
    pub fn hydrate(id: String, student: &Student) -> Self {
        let date_input = |date: &Option<ApiDate>| {
            date.as_ref()
                .and_then(ApiDate::iso)
                .unwrap_or_default()
        };

        Self {
            mode: FormMode::Edit { id },
            name: student.name.clone(),
            student_id: student.student_id.clone(),
            class: student.class.clone(),
            date_of_birth: date_input(&student.date_of_birth),
            drive_date: date_input(&student.drive_date),
            drive_id: student.drive_id.clone().unwrap_or_default(),
            version: student.version,
            vaccinations: VaccinationEntries::from_statuses(&student.vaccination_status),
        }
    }

    /// Fetches the student and hydrates a form for it, or gives the message to show instead.
    pub async fn load(api: &dyn PortalApi, id: String) -> Result<Self, String> {
        match api.get_student(&id).await {
            Ok(student) => Ok(Self::hydrate(id, &student)),
            Err(e) => {
                warn!(?e, %id, "unable to fetch student for editing");
                Err(e.user_message(FETCH_FAILED_MESSAGE))
            }
        }
    }

    pub fn from_pairs(mode: FormMode, pairs: &[(String, String)]) -> Self {
        Self {
            mode,
            name: field(pairs, "name").to_string(),
            student_id: field(pairs, "student_id").to_string(),
            class: field(pairs, "class").to_string(),
            date_of_birth: field(pairs, "date_of_birth").to_string(),
            drive_date: field(pairs, "drive_date").to_string(),
            drive_id: field(pairs, "drive_id").to_string(),
            version: field(pairs, "version").trim().parse().ok(),
            vaccinations: VaccinationEntries::from_form_pairs(
                pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            ),
        }
    }

    /// Applies an add/remove of a vaccination entry. Returns `false` for [`FormAction::Save`], which needs
    /// the backend.
    pub fn apply_local(&mut self, action: FormAction, today: Date) -> bool {
        match action {
            FormAction::Save => false,
            FormAction::AddVaccination => {
                self.vaccinations.push_empty(today);
                true
            }
            FormAction::RemoveVaccination(id) => {
                if !self.vaccinations.remove(id) {
                    debug!(%id, "vaccination entry already gone");
                }
                true
            }
        }
    }

    pub fn validate(&self) -> Result<Student, StudentValidationError> {
        let mut errors = StudentValidationError::empty();

        let name = self.name.trim();
        let student_id = self.student_id.trim();
        let class = self.class.trim();
        if name.is_empty() || student_id.is_empty() || class.is_empty() {
            errors |= StudentValidationError::MISSING_REQUIRED;
        } else if !is_class_label(class) {
            errors |= StudentValidationError::UNKNOWN_CLASS;
        }

        let mut optional_date = |raw: &str| {
            if raw.trim().is_empty() {
                return None;
            }
            let parsed = parse_date_input(raw);
            if parsed.is_none() {
                errors |= StudentValidationError::BAD_DATE;
            }
            parsed.map(ApiDate::from)
        };
        let date_of_birth = optional_date(&self.date_of_birth);
        let drive_date = optional_date(&self.drive_date);

        let vaccination_status = self.vaccinations.to_statuses();
        if vaccination_status.is_none() {
            errors |= StudentValidationError::INCOMPLETE_VACCINATION;
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let drive_id = self.drive_id.trim();
        Ok(Student {
            id: match &self.mode {
                FormMode::Create => None,
                FormMode::Edit { id } => Some(id.clone()),
            },
            name: name.to_string(),
            class: class.to_string(),
            student_id: student_id.to_string(),
            date_of_birth,
            vaccination_status: vaccination_status.unwrap_or_default(),
            drive_date,
            drive_id: (!drive_id.is_empty()).then(|| drive_id.to_string()),
            version: self.version,
        })
    }

    pub async fn submit(&self, api: &dyn PortalApi) -> SubmitOutcome<Student> {
        let student = match self.validate() {
            Ok(student) => student,
            Err(errors) => return SubmitOutcome::Invalid(errors.as_nice_list().collect()),
        };

        let result = match &self.mode {
            FormMode::Create => api.create_student(&student).await,
            FormMode::Edit { id } => api.update_student(id, &student).await,
        };
        SubmitOutcome::from_backend(result, SAVE_FAILED_MESSAGE)
    }
}

impl Default for StudentForm {
    fn default() -> Self {
        Self::new()
    }
}
