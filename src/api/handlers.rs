//! HTTP handlers for the patients API

use axum::{
    extract::{Path, RawQuery, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    api::contract::{CreatePatientRequest, PatientResponse, UpdatePatientRequest},
    db::search::{datetime::parse_instant_utc, BirthDateQuery, DateFilter},
    db::PatientStore as _,
    models::{Patient, PatientName, PatientUpdate},
    state::AppState,
    Error, Result,
};

pub async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PatientResponse>> {
    let id = validate_id(id)?;
    let patient = state.store.get(id).await?;
    Ok(Json(PatientResponse::from(patient)))
}

/// `GET /api/v1/patients?birthDate=<token>&birthDate=<token>...`
///
/// Every token must parse; one malformed token fails the whole request.
pub async fn search_patients(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<Vec<PatientResponse>>> {
    let tokens = birth_date_tokens(raw_query.as_deref());
    if tokens.is_empty() {
        return Err(Error::Validation("Birth date is required".to_string()));
    }

    let filters = tokens
        .iter()
        .map(|token| DateFilter::parse(token))
        .collect::<Result<Vec<_>>>()?;
    let query = BirthDateQuery::compile(filters)?;

    let patients = state.store.find_by_birth_date(&query).await?;
    Ok(Json(patients.into_iter().map(PatientResponse::from).collect()))
}

pub async fn create_patient(
    State(state): State<AppState>,
    Json(body): Json<CreatePatientRequest>,
) -> Result<impl IntoResponse> {
    let name = body
        .name
        .ok_or_else(|| Error::Validation("Family name is required".to_string()))?;
    let family = match name.family {
        Some(f) if !f.is_empty() => f,
        _ => return Err(Error::Validation("Family name is required".to_string())),
    };

    let birth_date_raw = body
        .birth_date
        .ok_or_else(|| Error::Validation("Birth date is required".to_string()))?;
    let birth_date = parse_instant_utc(&birth_date_raw).ok_or(Error::InvalidBirthDate)?;

    let patient_name = PatientName::new(family, name.given, name.name_use);
    let patient = Patient::create(
        patient_name,
        birth_date,
        Uuid::new_v4(),
        body.gender,
        body.active,
    )?;

    let id = state.store.create(&patient).await?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/api/v1/patients/{id}"))],
        Json(PatientResponse::from(patient)),
    ))
}

pub async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdatePatientRequest>,
) -> Result<Json<PatientResponse>> {
    let id = validate_id(id)?;

    let birth_date = match body.birth_date.as_deref() {
        Some(raw) => Some(parse_instant_utc(raw).ok_or(Error::InvalidBirthDate)?),
        None => None,
    };

    let (family, name_use, given) = match body.name {
        Some(name) => (name.family, name.name_use, name.given),
        None => (None, None, None),
    };

    let change = PatientUpdate {
        family,
        name_use,
        given,
        birth_date,
        gender: body.gender,
        active: body.active,
    };

    let patient = state.store.update(id, &change).await?;
    Ok(Json(PatientResponse::from(patient)))
}

pub async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Uuid>> {
    let id = validate_id(id)?;
    state.store.delete(id).await?;
    Ok(Json(id))
}

fn validate_id(id: Uuid) -> Result<Uuid> {
    if id.is_nil() {
        return Err(Error::Validation("Patient id is invalid".to_string()));
    }
    Ok(id)
}

/// Collect repeated `birthDate` query parameters in request order.
fn birth_date_tokens(raw_query: Option<&str>) -> Vec<String> {
    let Some(raw_query) = raw_query else {
        return Vec::new();
    };
    url::form_urlencoded::parse(raw_query.as_bytes())
        .filter(|(key, _)| key == "birthDate")
        .map(|(_, value)| value.into_owned())
        .collect()
}
