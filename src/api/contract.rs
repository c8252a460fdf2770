//! Request/response contract for the v1 patients API
//!
//! Kept separate from the domain model: absent JSON fields map to `None`
//! and mean "leave unchanged" on update; enums travel as lowercase
//! strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Gender, NameUse, Patient};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatientRequest {
    pub name: Option<CreatePatientName>,
    pub gender: Option<Gender>,
    pub birth_date: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePatientName {
    #[serde(rename = "use")]
    pub name_use: Option<NameUse>,
    pub family: Option<String>,
    pub given: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatientRequest {
    pub name: Option<UpdatePatientName>,
    pub gender: Option<Gender>,
    pub birth_date: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePatientName {
    #[serde(rename = "use")]
    pub name_use: Option<NameUse>,
    pub family: Option<String>,
    pub given: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientResponse {
    pub id: Uuid,
    pub name: PatientNameResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    pub birth_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct PatientNameResponse {
    pub id: Uuid,
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub name_use: Option<NameUse>,
    pub family: String,
    pub given: Vec<String>,
}

impl From<Patient> for PatientResponse {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            name: PatientNameResponse {
                id: patient.name.id,
                name_use: patient.name.name_use,
                family: patient.name.family.clone(),
                given: patient.name.given_values(),
            },
            gender: patient.gender,
            birth_date: patient.birth_date,
            active: patient.active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PatientName;
    use chrono::TimeZone;

    #[test]
    fn response_serializes_with_camel_case_and_lowercase_enums() {
        let name = PatientName::new(
            "Smith",
            Some(vec!["Ann".to_string()]),
            Some(NameUse::Official),
        );
        let patient = Patient::create(
            name,
            Utc.with_ymd_and_hms(1990, 1, 1, 0, 0, 0).unwrap(),
            Uuid::new_v4(),
            Some(Gender::Female),
            Some(true),
        )
        .unwrap();

        let json = serde_json::to_value(PatientResponse::from(patient)).unwrap();

        assert_eq!(json["gender"], "female");
        assert_eq!(json["name"]["use"], "official");
        assert_eq!(json["name"]["family"], "Smith");
        assert_eq!(json["name"]["given"][0], "Ann");
        assert!(json["birthDate"].is_string());
    }

    #[test]
    fn absent_update_fields_deserialize_to_none() {
        let body: UpdatePatientRequest =
            serde_json::from_str(r#"{"name": {"family": "Jones"}}"#).unwrap();

        assert_eq!(body.name.as_ref().unwrap().family.as_deref(), Some("Jones"));
        assert!(body.name.as_ref().unwrap().given.is_none());
        assert!(body.birth_date.is_none());
        assert!(body.gender.is_none());
        assert!(body.active.is_none());
    }
}
