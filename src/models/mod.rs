//! Domain models for synthetic clinical registry data

pub mod patient;
pub mod types;

pub use patient::{PatientRecord, Site};
pub use types::{Gender, PatientStatus};
