//! The Patient aggregate: Patient, its single name, and the name's
//! ordered given-name values.
//!
//! Invariants:
//! - `birth_date` is never strictly in the future at the moment it is set
//! - ids are assigned once and never reassigned
//! - the family name never becomes empty through an update
//! - a new `given` list replaces the old one wholesale, with fresh ids

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Administrative gender, FHIR value set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
    Unknown,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
            Gender::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "other" => Some(Gender::Other),
            "unknown" => Some(Gender::Unknown),
            _ => None,
        }
    }
}

/// Qualifier for how a name is used, FHIR name-use value set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameUse {
    Usual,
    Official,
    Temp,
    Nickname,
    Anonymous,
    Old,
    Maiden,
}

impl NameUse {
    pub fn as_str(&self) -> &'static str {
        match self {
            NameUse::Usual => "usual",
            NameUse::Official => "official",
            NameUse::Temp => "temp",
            NameUse::Nickname => "nickname",
            NameUse::Anonymous => "anonymous",
            NameUse::Old => "old",
            NameUse::Maiden => "maiden",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "usual" => Some(NameUse::Usual),
            "official" => Some(NameUse::Official),
            "temp" => Some(NameUse::Temp),
            "nickname" => Some(NameUse::Nickname),
            "anonymous" => Some(NameUse::Anonymous),
            "old" => Some(NameUse::Old),
            "maiden" => Some(NameUse::Maiden),
            _ => None,
        }
    }
}

/// A single given-name value, owned by a [`PatientName`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GivenName {
    pub id: Uuid,
    pub value: String,
}

/// The patient's name. Owned exclusively by one [`Patient`].
#[derive(Debug, Clone, PartialEq)]
pub struct PatientName {
    pub id: Uuid,
    pub family: String,
    pub name_use: Option<NameUse>,
    pub given: Vec<GivenName>,
}

impl PatientName {
    /// Build a name with a fresh id, generating ids for each given value.
    pub fn new(
        family: impl Into<String>,
        given: Option<Vec<String>>,
        name_use: Option<NameUse>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            family: family.into(),
            name_use,
            given: given.map(fresh_given).unwrap_or_default(),
        }
    }

    /// Discard the current given names and install a fresh sequence.
    ///
    /// Given names are never patched element-by-element; old ids are
    /// dropped and new ones generated.
    fn replace_given(&mut self, values: &[String]) {
        self.given = fresh_given(values.to_vec());
    }

    pub fn given_values(&self) -> Vec<String> {
        self.given.iter().map(|g| g.value.clone()).collect()
    }
}

fn fresh_given(values: Vec<String>) -> Vec<GivenName> {
    values
        .into_iter()
        .map(|value| GivenName {
            id: Uuid::new_v4(),
            value,
        })
        .collect()
}

/// Partial change set for [`Patient::update`]. `None` means "leave
/// unchanged"; `Some` overwrites (for `given`, wholesale replacement).
#[derive(Debug, Clone, Default)]
pub struct PatientUpdate {
    pub family: Option<String>,
    pub name_use: Option<NameUse>,
    pub given: Option<Vec<String>>,
    pub birth_date: Option<DateTime<Utc>>,
    pub gender: Option<Gender>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Patient {
    pub id: Uuid,
    pub name: PatientName,
    pub gender: Option<Gender>,
    pub birth_date: DateTime<Utc>,
    pub active: Option<bool>,
}

impl Patient {
    /// Validated factory. Rejects birth dates strictly in the future.
    pub fn create(
        name: PatientName,
        birth_date_utc: DateTime<Utc>,
        id: Uuid,
        gender: Option<Gender>,
        active: Option<bool>,
    ) -> Result<Self> {
        if birth_date_utc > Utc::now() {
            return Err(Error::InvalidBirthDate);
        }

        Ok(Self {
            id,
            name,
            gender,
            birth_date: birth_date_utc,
            active,
        })
    }

    /// Apply a partial change set.
    ///
    /// All validation runs before any field is touched, so a rejected
    /// change leaves the aggregate exactly as it was.
    pub fn update(&mut self, change: &PatientUpdate) -> Result<()> {
        if let Some(birth_date) = change.birth_date {
            if birth_date > Utc::now() {
                return Err(Error::InvalidBirthDate);
            }
        }
        if let Some(family) = &change.family {
            if family.is_empty() {
                return Err(Error::Validation(
                    "Family name must not be empty".to_string(),
                ));
            }
        }

        if let Some(birth_date) = change.birth_date {
            self.birth_date = birth_date;
        }
        if let Some(gender) = change.gender {
            self.gender = Some(gender);
        }
        if let Some(active) = change.active {
            self.active = Some(active);
        }
        if let Some(family) = &change.family {
            self.name.family = family.clone();
        }
        if let Some(name_use) = change.name_use {
            self.name.name_use = Some(name_use);
        }
        if let Some(given) = &change.given {
            self.name.replace_given(given);
        }

        Ok(())
    }

    /// Isolated birth date setter with the same future-date validation.
    pub fn set_birth_date(&mut self, birth_date_utc: DateTime<Utc>) -> Result<()> {
        if birth_date_utc > Utc::now() {
            return Err(Error::InvalidBirthDate);
        }
        self.birth_date = birth_date_utc;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_patient() -> Patient {
        let name = PatientName::new(
            "Smith",
            Some(vec!["Ann".to_string()]),
            Some(NameUse::Official),
        );
        Patient::create(
            name,
            Utc::now() - Duration::days(365 * 30),
            Uuid::new_v4(),
            Some(Gender::Female),
            Some(true),
        )
        .unwrap()
    }

    #[test]
    fn create_rejects_future_birth_date() {
        let name = PatientName::new("Smith", None, None);
        let result = Patient::create(
            name,
            Utc::now() + Duration::seconds(1),
            Uuid::new_v4(),
            None,
            None,
        );
        assert!(matches!(result, Err(Error::InvalidBirthDate)));
    }

    #[test]
    fn create_accepts_birth_date_just_in_the_past() {
        let name = PatientName::new("Smith", None, None);
        let result = Patient::create(
            name,
            Utc::now() - Duration::seconds(1),
            Uuid::new_v4(),
            None,
            None,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn update_with_absent_fields_changes_nothing() {
        let mut patient = sample_patient();
        let before = patient.clone();

        patient.update(&PatientUpdate::default()).unwrap();

        assert_eq!(patient, before);
    }

    #[test]
    fn update_overwrites_present_fields_only() {
        let mut patient = sample_patient();
        let change = PatientUpdate {
            family: Some("Jones".to_string()),
            ..Default::default()
        };

        patient.update(&change).unwrap();

        assert_eq!(patient.name.family, "Jones");
        assert_eq!(patient.gender, Some(Gender::Female));
        assert_eq!(patient.active, Some(true));
        assert_eq!(patient.name.given_values(), vec!["Ann".to_string()]);
    }

    #[test]
    fn update_replaces_given_names_with_fresh_ids() {
        let mut patient = sample_patient();
        let old_id = patient.name.given[0].id;

        let change = PatientUpdate {
            given: Some(vec!["Ann".to_string()]),
            ..Default::default()
        };
        patient.update(&change).unwrap();

        assert_eq!(patient.name.given.len(), 1);
        assert_eq!(patient.name.given[0].value, "Ann");
        assert_ne!(patient.name.given[0].id, old_id);
    }

    #[test]
    fn update_with_future_birth_date_leaves_aggregate_untouched() {
        let mut patient = sample_patient();
        let before = patient.clone();

        let change = PatientUpdate {
            family: Some("Jones".to_string()),
            given: Some(vec!["Bob".to_string()]),
            birth_date: Some(Utc::now() + Duration::days(1)),
            ..Default::default()
        };
        let result = patient.update(&change);

        assert!(matches!(result, Err(Error::InvalidBirthDate)));
        assert_eq!(patient, before);
    }

    #[test]
    fn update_rejects_empty_family() {
        let mut patient = sample_patient();
        let before = patient.clone();

        let change = PatientUpdate {
            family: Some(String::new()),
            ..Default::default()
        };
        let result = patient.update(&change);

        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(patient, before);
    }

    #[test]
    fn set_birth_date_validates_future() {
        let mut patient = sample_patient();
        let result = patient.set_birth_date(Utc::now() + Duration::seconds(1));
        assert!(matches!(result, Err(Error::InvalidBirthDate)));

        let past = Utc::now() - Duration::days(1);
        patient.set_birth_date(past).unwrap();
        assert_eq!(patient.birth_date, past);
    }

    #[test]
    fn name_ids_are_stable_across_scalar_updates() {
        let mut patient = sample_patient();
        let name_id = patient.name.id;

        let change = PatientUpdate {
            family: Some("Jones".to_string()),
            name_use: Some(NameUse::Usual),
            ..Default::default()
        };
        patient.update(&change).unwrap();

        assert_eq!(patient.name.id, name_id);
    }
}
