use crate::{
    api::PortalApi,
    data::{ApiDate, drive::VaccinationDrive, is_class_label, parse_date_input},
    forms::{FormMode, REQUIRED_FIELDS_MESSAGE, SubmitOutcome, field, fields},
};
use bitflags::bitflags;

pub const SAVE_FAILED_MESSAGE: &str = "Failed to save drive";
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch drive details.";

bitflags! {
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct DriveValidationError: u8 {
        const MISSING_REQUIRED = 0b0000_0001;
        const BAD_DOSES =        0b0000_0010;
        const BAD_DATE =         0b0000_0100;
        const UNKNOWN_CLASS =    0b0000_1000;
    }
}

impl DriveValidationError {
    pub fn as_nice_list(&self) -> impl Iterator<Item = &'static str> {
        self.iter().filter_map(|e| match e {
            Self::MISSING_REQUIRED => Some(REQUIRED_FIELDS_MESSAGE),
            Self::BAD_DOSES => Some("Available doses must be a non-negative number."),
            Self::BAD_DATE => Some("Dates must be entered as yyyy-MM-dd."),
            Self::UNKNOWN_CLASS => Some("Classes must be between Class 1 and Class 10."),
            _ => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DriveForm {
    pub mode: FormMode,
    pub vaccine_name: String,
    pub date: String,
    pub available_doses: String,
    pub applicable_classes: Vec<String>,
    pub version: Option<u32>,
}

impl DriveForm {
    pub const fn new() -> Self {
        Self {
            mode: FormMode::Create,
            vaccine_name: String::new(),
            date: String::new(),
            available_doses: String::new(),
            applicable_classes: vec![],
            version: None,
        }
    }

    pub fn hydrate(id: String, drive: &VaccinationDrive) -> Self {
        Self {
            mode: FormMode::Edit { id },
            vaccine_name: drive.vaccine_name.clone(),
            date: drive.date.iso().unwrap_or_default(),
            available_doses: drive.available_doses.to_string(),
            applicable_classes: drive.applicable_classes.clone(),
            version: drive.version,
        }
    }

    pub async fn load(api: &dyn PortalApi, id: String) -> Result<Self, String> {
        match api.get_drive(&id).await {
            Ok(drive) => Ok(Self::hydrate(id, &drive)),
            Err(e) => {
                warn!(?e, %id, "unable to fetch drive for editing");
                Err(e.user_message(FETCH_FAILED_MESSAGE))
            }
        }
    }

    pub fn from_pairs(mode: FormMode, pairs: &[(String, String)]) -> Self {
        Self {
            mode,
            vaccine_name: field(pairs, "vaccine_name").to_string(),
            date: field(pairs, "date").to_string(),
            available_doses: field(pairs, "available_doses").to_string(),
            applicable_classes: fields(pairs, "applicable_classes")
                .map(ToString::to_string)
                .collect(),
            version: field(pairs, "version").trim().parse().ok(),
        }
    }

    pub fn validate(&self) -> Result<VaccinationDrive, DriveValidationError> {
        let mut errors = DriveValidationError::empty();

        let vaccine_name = self.vaccine_name.trim();
        let doses = self.available_doses.trim();
        if vaccine_name.is_empty()
            || self.date.trim().is_empty()
            || doses.is_empty()
            || self.applicable_classes.is_empty()
        {
            errors |= DriveValidationError::MISSING_REQUIRED;
        }

        let date = parse_date_input(&self.date);
        if date.is_none() && !self.date.trim().is_empty() {
            errors |= DriveValidationError::BAD_DATE;
        }

        let available_doses = doses.parse::<u32>().ok();
        if available_doses.is_none() && !doses.is_empty() {
            errors |= DriveValidationError::BAD_DOSES;
        }

        if self.applicable_classes.iter().any(|c| !is_class_label(c)) {
            errors |= DriveValidationError::UNKNOWN_CLASS;
        }

        match (date, available_doses) {
            (Some(date), Some(available_doses)) if errors.is_empty() => Ok(VaccinationDrive {
                id: match &self.mode {
                    FormMode::Create => None,
                    FormMode::Edit { id } => Some(id.clone()),
                },
                vaccine_name: vaccine_name.to_string(),
                date: ApiDate::from(date),
                available_doses,
                applicable_classes: self.applicable_classes.clone(),
                version: self.version,
            }),
            _ => Err(errors),
        }
    }

    pub async fn submit(&self, api: &dyn PortalApi) -> SubmitOutcome<VaccinationDrive> {
        let drive = match self.validate() {
            Ok(drive) => drive,
            Err(errors) => return SubmitOutcome::Invalid(errors.as_nice_list().collect()),
        };

        let result = match &self.mode {
            FormMode::Create => api.create_drive(&drive).await,
            FormMode::Edit { id } => api.update_drive(id, &drive).await,
        };
        SubmitOutcome::from_backend(result, SAVE_FAILED_MESSAGE)
    }
}

impl Default for DriveForm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{api::recording::RecordingApi, data::drive::test_drive};

    fn filled() -> DriveForm {
        DriveForm {
            vaccine_name: "Polio".into(),
            date: "2025-07-01".into(),
            available_doses: "120".into(),
            applicable_classes: vec!["Class 2".into(), "Class 1".into()],
            ..DriveForm::new()
        }
    }

    #[tokio::test]
    async fn bad_dose_counts_are_rejected_locally() {
        let api = RecordingApi::default();
        for doses in ["-1", "abc", "1.5"] {
            let form = DriveForm {
                available_doses: doses.into(),
                ..filled()
            };
            let SubmitOutcome::Invalid(messages) = form.submit(&api).await else {
                panic!("{doses} doses were accepted");
            };
            assert_eq!(messages, vec!["Available doses must be a non-negative number."]);
        }
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_fields_are_rejected_locally() {
        let api = RecordingApi::default();
        let form = DriveForm {
            applicable_classes: vec![],
            ..filled()
        };
        let SubmitOutcome::Invalid(messages) = form.submit(&api).await else {
            panic!("classless drive was accepted");
        };
        assert_eq!(messages, vec![REQUIRED_FIELDS_MESSAGE]);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn zero_doses_are_fine() {
        let api = RecordingApi::default();
        let form = DriveForm {
            available_doses: "0".into(),
            ..filled()
        };
        assert!(matches!(form.submit(&api).await, SubmitOutcome::Saved(_)));
        let sent = api.sent_drives.lock().unwrap()[0].clone();
        assert_eq!(sent.available_doses, 0);
        assert_eq!(sent.date.raw(), "2025-07-01");
        assert_eq!(sent.applicable_classes, vec!["Class 2", "Class 1"]);
    }

    #[tokio::test]
    async fn editing_prepopulates_every_field() {
        let drive = test_drive("d1", "Hepatitis B", "2025-09-15T00:00:00.000Z");
        let api = RecordingApi::default();
        api.drives.lock().unwrap().push(drive.clone());

        let form = DriveForm::load(&api, "d1".into()).await.unwrap();
        assert_eq!(form.mode, FormMode::Edit { id: "d1".into() });
        assert_eq!(form.vaccine_name, "Hepatitis B");
        assert_eq!(form.date, "2025-09-15");
        assert_eq!(form.available_doses, "50");
        assert_eq!(form.applicable_classes, vec!["Class 5", "Class 6"]);
        assert_eq!(form.version, Some(0));
        assert_eq!(api.calls(), vec!["get_drive d1"]);

        //and saving it unchanged sends the same drive back
        assert!(matches!(form.submit(&api).await, SubmitOutcome::Saved(_)));
        let sent = api.sent_drives.lock().unwrap()[0].clone();
        assert_eq!(sent.vaccine_name, drive.vaccine_name);
        assert_eq!(sent.available_doses, drive.available_doses);
        assert_eq!(sent.applicable_classes, drive.applicable_classes);
        assert_eq!(sent.date.date(), drive.date.date());
    }

    #[tokio::test]
    async fn failed_hydration_has_its_own_message() {
        let api = RecordingApi::default();
        assert_eq!(
            DriveForm::load(&api, "nope".into()).await.unwrap_err(),
            FETCH_FAILED_MESSAGE
        );
    }

    #[test]
    fn repeated_class_fields_are_collected() {
        let pairs = vec![
            ("vaccine_name".to_string(), "Polio".to_string()),
            ("applicable_classes".to_string(), "Class 3".to_string()),
            ("applicable_classes".to_string(), "Class 7".to_string()),
            ("available_doses".to_string(), " 12 ".to_string()),
        ];
        let form = DriveForm::from_pairs(FormMode::Create, &pairs);
        assert_eq!(form.applicable_classes, vec!["Class 3", "Class 7"]);
        assert_eq!(form.available_doses, " 12 ");
        assert_eq!(
            form.validate().unwrap_err(),
            DriveValidationError::MISSING_REQUIRED
        );
    }
}
