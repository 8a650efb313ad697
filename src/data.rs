use jiff::{Timestamp, Zoned, civil::Date, tz::TimeZone};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use std::fmt::{Display, Formatter};

pub mod dashboard;
pub mod drive;
pub mod report;
pub mod student;

/// Every class a student can be in, and every class a drive can target.
pub const CLASS_LABELS: [&str; 10] = [
    "Class 1", "Class 2", "Class 3", "Class 4", "Class 5", "Class 6", "Class 7", "Class 8",
    "Class 9", "Class 10",
];

pub fn is_class_label(candidate: &str) -> bool {
    CLASS_LABELS.contains(&candidate)
}

/// Something the backend owns and hands out identities for.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection path under the API base, eg. `/students`.
    const COLLECTION: &'static str;
    /// Used in log lines and user-facing messages.
    const NOUN: &'static str;

    /// `None` until the backend has assigned one.
    fn id(&self) -> Option<&str>;
}

/// A date exactly as the backend sent it.
///
/// The backend is inconsistent about dates (full ISO timestamps, plain dates, sometimes junk), so the raw
/// text is kept and only parsed when something needs the calendar date. `null`, numbers and missing
/// values are kept as unreadable dates rather than failing the whole response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ApiDate(String);

impl<'de> Deserialize<'de> for ApiDate {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(Self(match Option::<serde_json::Value>::deserialize(d)? {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }))
    }
}

impl ApiDate {
    pub fn raw(&self) -> &str {
        &self.0
    }

    pub fn date(&self) -> Option<Date> {
        parse_backend_date(&self.0)
    }

    /// `yyyy-MM-dd`, the format date inputs and exports use.
    pub fn iso(&self) -> Option<String> {
        self.date().map(|date| date.strftime("%Y-%m-%d").to_string())
    }

    /// eg. `January 5, 2020`
    pub fn long(&self) -> Option<String> {
        self.date().map(|date| date.strftime("%B %-d, %Y").to_string())
    }
}

impl From<Date> for ApiDate {
    fn from(value: Date) -> Self {
        Self(value.strftime("%Y-%m-%d").to_string())
    }
}

impl Display for ApiDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn parse_backend_date(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = raw.parse::<Timestamp>() {
        return Some(ts.to_zoned(TimeZone::UTC).date());
    }
    if let Ok(dt) = raw.parse::<jiff::civil::DateTime>() {
        return Some(dt.date());
    }
    raw.parse::<Date>().ok()
}

/// Today in the server's local time zone.
pub fn today() -> Date {
    Zoned::now().date()
}

/// Parses the `yyyy-MM-dd` value of an `<input type="date">`.
pub fn parse_date_input(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    if raw.is_empty() {
        None
    } else {
        raw.parse::<Date>().ok()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(serde_json::Number),
    String(String),
}

/// Drive ids show up as both numbers and strings depending on which backend route produced them.
pub fn number_or_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<NumberOrString>::deserialize(d)?
        .map(|value| match value {
            NumberOrString::Number(n) => n.to_string(),
            NumberOrString::String(s) => s,
        })
        .filter(|s| !s.is_empty()))
}

pub fn remove_by_id<T: Entity>(items: &mut Vec<T>, id: &str) -> bool {
    let Some(index) = items.iter().position(|item| item.id() == Some(id)) else {
        return false;
    };
    items.remove(index);
    true
}
