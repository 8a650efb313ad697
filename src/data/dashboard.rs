use crate::data::drive::VaccinationDrive;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    #[serde(default)]
    pub total_students: u64,
    #[serde(default)]
    pub vaccinated_students: u64,
    #[serde(default, deserialize_with = "percentage")]
    pub vaccination_percentage: Option<f64>,
    #[serde(default)]
    pub upcoming_drives: Vec<VaccinationDrive>,
}

impl DashboardData {
    /// The backend's figure when it sent one, otherwise derived from the two counts.
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage(&self) -> f64 {
        self.vaccination_percentage.unwrap_or_else(|| {
            if self.total_students == 0 {
                0.0
            } else {
                self.vaccinated_students as f64 * 100.0 / self.total_students as f64
            }
        })
    }

    pub fn percentage_display(&self) -> String {
        let percentage = self.percentage();
        if percentage.fract() == 0.0 {
            format!("{percentage:.0}")
        } else {
            format!("{percentage:.2}")
        }
    }
}

//the backend sends this as a pre-formatted string ("90.00"), but some deployments send a plain number
fn percentage<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        String(String),
    }

    Ok(match Option::<Raw>::deserialize(d)? {
        Some(Raw::Number(n)) => Some(n),
        Some(Raw::String(s)) => s.trim().trim_end_matches('%').parse().ok(),
        None => None,
    })
}
