//! Domain model - the Patient aggregate

pub mod patient;

pub use patient::{Gender, GivenName, NameUse, Patient, PatientName, PatientUpdate};
