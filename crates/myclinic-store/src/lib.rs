// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use chrono::NaiveDate;
use myclinic_model::{
    Appointment, AppointmentId, NewAppointment, NewPatient, Patient, PatientId,
};
use std::fmt::{Display, Formatter};

pub const CRATE_NAME: &str = "myclinic-store";

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug)]
pub struct StoreError(pub String);

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for StoreError {}

/// Persistence boundary for the two entity kinds. One mutex-guarded
/// operation at a time; conflicting writes are last-write-wins.
///
/// `get_*` return `Ok(None)` for absent ids; `update_*` and `delete_*`
/// report whether the row existed. `delete_patient` cascades to every
/// appointment referencing the patient. The `*_admin` writers are the only
/// paths that touch `verified_by_admin` and `internal_admin_notes`.
pub trait ClinicStore: Send + Sync {
    fn create_patient(&self, draft: &NewPatient) -> Result<Patient, StoreError>;
    fn get_patient(&self, id: PatientId) -> Result<Option<Patient>, StoreError>;
    /// Id-ordered listing; `name_contains` is a case-insensitive substring
    /// filter on the name.
    fn list_patients(&self, name_contains: Option<&str>) -> Result<Vec<Patient>, StoreError>;
    fn list_patients_admin(
        &self,
        name_contains: Option<&str>,
        verified: Option<bool>,
    ) -> Result<Vec<Patient>, StoreError>;
    /// Standard update: privileged fields untouched.
    fn update_patient(&self, id: PatientId, fields: &NewPatient) -> Result<bool, StoreError>;
    fn update_patient_admin(
        &self,
        id: PatientId,
        fields: &NewPatient,
        verified_by_admin: bool,
    ) -> Result<bool, StoreError>;
    fn delete_patient(&self, id: PatientId) -> Result<bool, StoreError>;
    fn patient_exists(&self, id: PatientId) -> Result<bool, StoreError>;

    fn create_appointment(&self, draft: &NewAppointment) -> Result<Appointment, StoreError>;
    fn get_appointment(&self, id: AppointmentId) -> Result<Option<Appointment>, StoreError>;
    /// Ordered by `(date, time)` ascending.
    fn list_appointments(&self) -> Result<Vec<Appointment>, StoreError>;
    /// Admin listing: substring filters on doctor name and patient name
    /// (both case-insensitive, metacharacters literal) plus an exact date.
    fn list_appointments_admin(
        &self,
        doctor_contains: Option<&str>,
        patient_contains: Option<&str>,
        on_date: Option<NaiveDate>,
    ) -> Result<Vec<Appointment>, StoreError>;
    fn update_appointment(
        &self,
        id: AppointmentId,
        fields: &NewAppointment,
    ) -> Result<bool, StoreError>;
    fn update_appointment_admin(
        &self,
        id: AppointmentId,
        fields: &NewAppointment,
        internal_admin_notes: Option<&str>,
    ) -> Result<bool, StoreError>;
    fn delete_appointment(&self, id: AppointmentId) -> Result<bool, StoreError>;

    /// Bulk population for the seed collaborator; not part of the runtime
    /// request paths. Seeded patients may arrive pre-verified.
    fn bulk_insert_patients(
        &self,
        rows: &[(NewPatient, bool)],
    ) -> Result<Vec<PatientId>, StoreError>;
    fn bulk_insert_appointments(&self, rows: &[NewAppointment]) -> Result<usize, StoreError>;
}
