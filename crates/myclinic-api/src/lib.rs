// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub const CRATE_NAME: &str = "myclinic-api";

pub mod dto;
pub mod errors;
pub mod validate;

pub use dto::{AppointmentPublic, PatientPublic};
pub use errors::{ApiError, ApiErrorCode};
pub use validate::{
    validate_appointment, validate_appointment_admin, validate_patient, validate_patient_admin,
    FieldErrors, FormInput,
};
