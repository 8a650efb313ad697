use crate::data::{ApiDate, Entity};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaccinationDrive {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub vaccine_name: String,
    #[serde(default)]
    pub date: ApiDate,
    #[serde(default)]
    pub available_doses: u32,
    #[serde(default)]
    pub applicable_classes: Vec<String>,
    #[serde(rename = "__v", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

impl Entity for VaccinationDrive {
    const COLLECTION: &'static str = "/vaccination-drives";
    const NOUN: &'static str = "vaccination drive";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[cfg(test)]
pub fn test_drive(id: &str, vaccine_name: &str, date: &str) -> VaccinationDrive {
    VaccinationDrive {
        id: Some(id.into()),
        vaccine_name: vaccine_name.into(),
        date: serde_json::from_value(serde_json::Value::String(date.into())).unwrap(),
        available_doses: 50,
        applicable_classes: vec!["Class 5".into(), "Class 6".into()],
        version: Some(0),
    }
}
