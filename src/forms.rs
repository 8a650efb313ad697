//! Form state for creating and editing backend entities.
//!
//! Forms are plain data rebuilt from every submission, so they can be re-rendered exactly as the user left
//! them after a failed save or an add/remove of a vaccination entry.

use crate::error::VaxError;
use uuid::Uuid;

pub mod drive;
pub mod student;
pub mod vaccination_entries;

pub const REQUIRED_FIELDS_MESSAGE: &str = "Please fill in all required fields.";

/// Submitted `application/x-www-form-urlencoded` pairs, repeated keys included.
pub type FormPairs = Vec<(String, String)>;

/// First value submitted under `name`, or `""`.
pub fn field<'a>(pairs: &'a [(String, String)], name: &str) -> &'a str {
    pairs
        .iter()
        .find(|(key, _)| key == name)
        .map_or("", |(_, value)| value.as_str())
}

/// Every value submitted under `name`, in order.
pub fn fields<'a>(pairs: &'a [(String, String)], name: &'a str) -> impl Iterator<Item = &'a str> {
    pairs
        .iter()
        .filter(move |(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { id: String },
}

impl FormMode {
    /// Where the form posts back to, under `collection` (eg. `/students`).
    pub fn action_url(&self, collection: &str) -> String {
        match self {
            Self::Create => format!("{collection}/add"),
            Self::Edit { id } => format!("{collection}/edit/{id}"),
        }
    }

    pub const fn is_edit(&self) -> bool {
        matches!(self, Self::Edit { .. })
    }
}

/// Which submit button was pressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormAction {
    Save,
    AddVaccination,
    RemoveVaccination(Uuid),
}

impl FormAction {
    pub const FIELD: &'static str = "action";

    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let action = field(pairs, Self::FIELD);
        if action == "add_vaccination" {
            return Self::AddVaccination;
        }
        action
            .strip_prefix("remove_vaccination:")
            .and_then(|id| Uuid::parse_str(id).ok())
            .map_or(Self::Save, Self::RemoveVaccination)
    }

    pub fn value(self) -> String {
        match self {
            Self::Save => "save".to_string(),
            Self::AddVaccination => "add_vaccination".to_string(),
            Self::RemoveVaccination(id) => format!("remove_vaccination:{id}"),
        }
    }
}

/// How a save attempt went.
#[derive(Debug)]
pub enum SubmitOutcome<T> {
    /// Local validation failed, nothing was sent.
    Invalid(Vec<&'static str>),
    /// The backend refused, with the message to show.
    Rejected(String),
    Saved(T),
}

impl<T> SubmitOutcome<T> {
    pub fn from_backend(result: Result<T, VaxError>, fallback: &str) -> Self {
        match result {
            Ok(saved) => Self::Saved(saved),
            Err(e) => {
                warn!(?e, "backend refused save");
                Self::Rejected(e.user_message(fallback))
            }
        }
    }
}
