use crate::data::{ApiDate, parse_date_input, student::VaccinationStatus};
use jiff::civil::Date;
use uuid::Uuid;

const KEY_PREFIX: &str = "vaccination.";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VaccinationEntry {
    pub vaccine_name: String,
    /// raw `<input type="date">` value
    pub date: String,
    pub drive_id: String,
}

impl VaccinationEntry {
    fn is_complete(&self) -> bool {
        !self.vaccine_name.trim().is_empty() && parse_date_input(&self.date).is_some()
    }
}

/// A student's vaccinations while they're being edited.
///
/// Entries are keyed by an id minted when they enter the form, so removing one never changes which row
/// another id refers to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VaccinationEntries {
    entries: Vec<(Uuid, VaccinationEntry)>,
}

impl VaccinationEntries {
    pub fn from_statuses(statuses: &[VaccinationStatus]) -> Self {
        Self {
            entries: statuses
                .iter()
                .map(|status| {
                    (
                        Uuid::new_v4(),
                        VaccinationEntry {
                            vaccine_name: status.vaccine_name.clone(),
                            date: status.date.iso().unwrap_or_default(),
                            drive_id: status.drive_id.clone().unwrap_or_default(),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Rebuilds the entries from submitted form fields named `vaccination.<id>.<field>`, in the order each id
    /// first appears.
    pub fn from_form_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut entries: Vec<(Uuid, VaccinationEntry)> = vec![];

        for (key, value) in pairs {
            let Some((id, field)) = key
                .strip_prefix(KEY_PREFIX)
                .and_then(|rest| rest.split_once('.'))
            else {
                continue;
            };
            let Ok(id) = Uuid::parse_str(id) else {
                warn!(?key, "ignoring vaccination field with a malformed id");
                continue;
            };

            let index = if let Some(index) = entries.iter().position(|(existing, _)| *existing == id) {
                index
            } else {
                entries.push((id, VaccinationEntry::default()));
                entries.len() - 1
            };
            let entry = &mut entries[index].1;

            match field {
                "vaccine_name" => entry.vaccine_name = value.to_string(),
                "date" => entry.date = value.to_string(),
                "drive_id" => entry.drive_id = value.to_string(),
                _ => {}
            }
        }

        Self { entries }
    }

    /// Appends a blank entry dated `today` and returns its id.
    pub fn push_empty(&mut self, today: Date) -> Uuid {
        let id = Uuid::new_v4();
        self.entries.push((
            id,
            VaccinationEntry {
                date: ApiDate::from(today).raw().to_string(),
                ..VaccinationEntry::default()
            },
        ));
        id
    }

    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(existing, _)| *existing != id);
        before != self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Uuid, &VaccinationEntry)> {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    /// The only entry that gets an "add another" control.
    pub fn last_id(&self) -> Option<Uuid> {
        self.entries.last().map(|(id, _)| *id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `None` if any entry lacks a vaccine name or a readable date.
    pub fn to_statuses(&self) -> Option<Vec<VaccinationStatus>> {
        self.entries
            .iter()
            .map(|(_, entry)| {
                if !entry.is_complete() {
                    return None;
                }
                let date = parse_date_input(&entry.date)?;
                let drive_id = entry.drive_id.trim();
                Some(VaccinationStatus {
                    vaccine_name: entry.vaccine_name.trim().to_string(),
                    date: ApiDate::from(date),
                    drive_id: (!drive_id.is_empty()).then(|| drive_id.to_string()),
                })
            })
            .collect()
    }

    pub fn field_name(id: Uuid, field: &str) -> String {
        format!("{KEY_PREFIX}{id}.{field}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    fn three() -> VaccinationEntries {
        let mut entries = VaccinationEntries::default();
        for _ in 0..3 {
            entries.push_empty(date(2024, 2, 29));
        }
        entries
    }

    #[test]
    fn removal_keeps_other_ids_and_order() {
        let mut entries = three();
        let ids = entries.ids();

        assert!(entries.remove(ids[1]));
        assert_eq!(entries.ids(), vec![ids[0], ids[2]]);
        assert_eq!(entries.last_id(), Some(ids[2]));

        assert!(!entries.remove(ids[1]));
        assert!(entries.remove(ids[2]));
        assert_eq!(entries.last_id(), Some(ids[0]));
    }

    #[test]
    fn new_entries_are_dated_and_appended_last() {
        let mut entries = three();
        let id = entries.push_empty(date(2025, 1, 2));
        assert_eq!(entries.last_id(), Some(id));
        assert_eq!(entries.iter().last().unwrap().1.date, "2025-01-02");
    }

    #[test]
    fn parses_form_pairs_in_first_seen_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let pairs = [
            (VaccinationEntries::field_name(b, "vaccine_name"), "Polio"),
            (VaccinationEntries::field_name(a, "vaccine_name"), "BCG"),
            (VaccinationEntries::field_name(b, "date"), "2020-02-02"),
            (VaccinationEntries::field_name(a, "date"), "2020-01-01"),
            (VaccinationEntries::field_name(a, "drive_id"), "D1"),
            ("vaccination.not-a-uuid.date".to_string(), "2020-01-01"),
            ("name".to_string(), "Asha"),
        ];
        let entries =
            VaccinationEntries::from_form_pairs(pairs.iter().map(|(k, v)| (k.as_str(), *v)));

        assert_eq!(entries.ids(), vec![b, a]);
        let statuses = entries.to_statuses().unwrap();
        assert_eq!(statuses[0].vaccine_name, "Polio");
        assert_eq!(statuses[1].date.raw(), "2020-01-01");
        assert_eq!(statuses[1].drive_id.as_deref(), Some("D1"));
        assert_eq!(statuses[0].drive_id, None);
    }

    #[test]
    fn incomplete_entries_block_submission() {
        let mut entries = three();
        assert!(entries.to_statuses().is_none());

        let mut filled = VaccinationEntries::default();
        filled.push_empty(date(2024, 1, 1));
        filled.entries[0].1.vaccine_name = "BCG".into();
        assert_eq!(filled.to_statuses().unwrap().len(), 1);

        entries.entries.clear();
        assert_eq!(entries.to_statuses(), Some(vec![]));
    }
}
