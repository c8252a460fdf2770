//! Storage contract for the Patient aggregate
//!
//! The service only talks to storage through this trait; any backend
//! able to persist the aggregate and evaluate a compiled birth date
//! query can implement it.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    db::search::BirthDateQuery,
    models::{Patient, PatientUpdate},
    Result,
};

#[async_trait]
pub trait PatientStore: Send + Sync + Clone {
    /// Insert a new patient.
    ///
    /// Ids are assigned upfront by the caller, so create is not
    /// idempotent: re-inserting an existing id fails with
    /// [`crate::Error::PatientAlreadyExists`].
    async fn create(&self, patient: &Patient) -> Result<Uuid>;

    /// Fetch the full aggregate by id, or `PatientNotFound`.
    async fn get(&self, id: Uuid) -> Result<Patient>;

    /// Fetch every patient whose birth instant satisfies the compiled
    /// query. No matches is an empty list, not an error.
    async fn find_by_birth_date(&self, query: &BirthDateQuery) -> Result<Vec<Patient>>;

    /// Load the current aggregate, apply the partial change set, persist
    /// and return the refreshed view. Atomic: a validation failure or a
    /// persistence failure discards the whole attempted mutation.
    async fn update(&self, id: Uuid, change: &PatientUpdate) -> Result<Patient>;

    /// Delete the aggregate (name and given names cascade).
    async fn delete(&self, id: Uuid) -> Result<()>;
}
