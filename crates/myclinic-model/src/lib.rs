// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub const CRATE_NAME: &str = "myclinic-model";

mod appointment;
mod patient;

pub use appointment::{Appointment, AppointmentId, NewAppointment, DOCTOR_NAME_MAX_LEN};
pub use patient::{
    NewPatient, ParseError, Patient, PatientId, CONTACT_INFO_MAX_LEN, PATIENT_NAME_MAX_LEN,
};
