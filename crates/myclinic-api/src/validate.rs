// SPDX-License-Identifier: Apache-2.0

//! Per-entity validation: raw form fields in, either a typed draft record or
//! a field-to-messages mapping out. Every invalid field is reported in a
//! single pass; nothing here touches the store except the patient resolver
//! passed in by the caller.

use chrono::{NaiveDate, NaiveTime};
use myclinic_model::{
    NewAppointment, NewPatient, PatientId, CONTACT_INFO_MAX_LEN, DOCTOR_NAME_MAX_LEN,
    PATIENT_NAME_MAX_LEN,
};
use std::collections::BTreeMap;

/// Raw submitted fields, HTML-form shaped.
pub type FormInput = BTreeMap<String, String>;

/// Field name to a non-empty list of error messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub const MSG_REQUIRED: &str = "this field is required";
pub const MSG_INVALID_DATE: &str = "enter a valid date";
pub const MSG_INVALID_TIME: &str = "enter a valid time";
pub const MSG_INVALID_PATIENT: &str = "select a valid patient";
pub const MSG_INVALID_BOOL: &str = "enter a valid boolean value";

const DATE_FORMAT: &str = "%Y-%m-%d";

fn push_error(errors: &mut FieldErrors, field: &str, message: String) {
    errors.entry(field.to_string()).or_default().push(message);
}

fn too_long_message(max: usize) -> String {
    format!("ensure this value has at most {max} characters")
}

/// Missing key and empty/blank string are both treated as "required".
/// Values are whitespace-trimmed before any further checks.
fn required_text(
    input: &FormInput,
    field: &str,
    max_len: usize,
    errors: &mut FieldErrors,
) -> Option<String> {
    let value = input.get(field).map(|v| v.trim()).unwrap_or("");
    if value.is_empty() {
        push_error(errors, field, MSG_REQUIRED.to_string());
        return None;
    }
    if value.chars().count() > max_len {
        push_error(errors, field, too_long_message(max_len));
        return None;
    }
    Some(value.to_string())
}

/// Optional field: absent or blank collapses to `None`.
fn optional_text(
    input: &FormInput,
    field: &str,
    max_len: Option<usize>,
    errors: &mut FieldErrors,
) -> Option<String> {
    let value = input.get(field).map(|v| v.trim()).unwrap_or("");
    if value.is_empty() {
        return None;
    }
    if let Some(max) = max_len {
        if value.chars().count() > max {
            push_error(errors, field, too_long_message(max));
            return None;
        }
    }
    Some(value.to_string())
}

/// A missing value and an unparseable value are distinct errors surfaced
/// under the same field key.
fn required_date(input: &FormInput, field: &str, errors: &mut FieldErrors) -> Option<NaiveDate> {
    let value = input.get(field).map(|v| v.trim()).unwrap_or("");
    if value.is_empty() {
        push_error(errors, field, MSG_REQUIRED.to_string());
        return None;
    }
    match NaiveDate::parse_from_str(value, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            push_error(errors, field, MSG_INVALID_DATE.to_string());
            None
        }
    }
}

fn required_time(input: &FormInput, field: &str, errors: &mut FieldErrors) -> Option<NaiveTime> {
    let value = input.get(field).map(|v| v.trim()).unwrap_or("");
    if value.is_empty() {
        push_error(errors, field, MSG_REQUIRED.to_string());
        return None;
    }
    let parsed = NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"));
    match parsed {
        Ok(time) => Some(time),
        Err(_) => {
            push_error(errors, field, MSG_INVALID_TIME.to_string());
            None
        }
    }
}

/// Checkbox grammar. A missing key is `false`, not an error.
fn optional_bool(input: &FormInput, field: &str, errors: &mut FieldErrors) -> bool {
    let value = input.get(field).map(|v| v.trim()).unwrap_or("");
    match value {
        "" | "0" | "false" | "no" | "off" => false,
        "1" | "true" | "yes" | "on" => true,
        _ => {
            push_error(errors, field, MSG_INVALID_BOOL.to_string());
            false
        }
    }
}

/// Standard patient form: `verified_by_admin` is never read here, even when
/// submitted.
pub fn validate_patient(input: &FormInput) -> Result<NewPatient, FieldErrors> {
    let mut errors = FieldErrors::new();
    let name = required_text(input, "name", PATIENT_NAME_MAX_LEN, &mut errors);
    let date_of_birth = required_date(input, "date_of_birth", &mut errors);
    let contact_info = optional_text(input, "contact_info", Some(CONTACT_INFO_MAX_LEN), &mut errors);
    let basic_medical_history = optional_text(input, "basic_medical_history", None, &mut errors);
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(NewPatient {
        // both unwraps guarded by the empty-errors check above
        name: name.unwrap_or_default(),
        date_of_birth: date_of_birth.unwrap_or_default(),
        contact_info,
        basic_medical_history,
    })
}

/// Administrative patient form: standard fields plus `verified_by_admin`.
pub fn validate_patient_admin(input: &FormInput) -> Result<(NewPatient, bool), FieldErrors> {
    let mut errors = FieldErrors::new();
    let name = required_text(input, "name", PATIENT_NAME_MAX_LEN, &mut errors);
    let date_of_birth = required_date(input, "date_of_birth", &mut errors);
    let contact_info = optional_text(input, "contact_info", Some(CONTACT_INFO_MAX_LEN), &mut errors);
    let basic_medical_history = optional_text(input, "basic_medical_history", None, &mut errors);
    let verified_by_admin = optional_bool(input, "verified_by_admin", &mut errors);
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok((
        NewPatient {
            name: name.unwrap_or_default(),
            date_of_birth: date_of_birth.unwrap_or_default(),
            contact_info,
            basic_medical_history,
        },
        verified_by_admin,
    ))
}

/// The `patient` field must parse as an id and resolve to a live patient via
/// the caller-supplied resolver; an unresolvable reference is a validation
/// error on `patient`, not a storage fault.
fn required_patient_ref(
    input: &FormInput,
    errors: &mut FieldErrors,
    patient_exists: &dyn Fn(PatientId) -> bool,
) -> Option<PatientId> {
    let value = input.get("patient").map(|v| v.trim()).unwrap_or("");
    if value.is_empty() {
        push_error(errors, "patient", MSG_REQUIRED.to_string());
        return None;
    }
    match PatientId::parse(value) {
        Ok(id) if patient_exists(id) => Some(id),
        _ => {
            push_error(errors, "patient", MSG_INVALID_PATIENT.to_string());
            None
        }
    }
}

/// Standard appointment form: `internal_admin_notes` is never read here.
pub fn validate_appointment(
    input: &FormInput,
    patient_exists: &dyn Fn(PatientId) -> bool,
) -> Result<NewAppointment, FieldErrors> {
    let mut errors = FieldErrors::new();
    let patient_id = required_patient_ref(input, &mut errors, patient_exists);
    let date = required_date(input, "date", &mut errors);
    let time = required_time(input, "time", &mut errors);
    let doctor_name = required_text(input, "doctor_name", DOCTOR_NAME_MAX_LEN, &mut errors);
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(NewAppointment {
        patient_id: patient_id.unwrap_or(PatientId::new(0)),
        date: date.unwrap_or_default(),
        time: time.unwrap_or_default(),
        doctor_name: doctor_name.unwrap_or_default(),
    })
}

/// Administrative appointment form: standard fields plus
/// `internal_admin_notes` (trusted free text).
pub fn validate_appointment_admin(
    input: &FormInput,
    patient_exists: &dyn Fn(PatientId) -> bool,
) -> Result<(NewAppointment, Option<String>), FieldErrors> {
    let mut errors = FieldErrors::new();
    let draft = match validate_appointment(input, patient_exists) {
        Ok(draft) => Some(draft),
        Err(inner) => {
            errors.extend(inner);
            None
        }
    };
    let notes = optional_text(input, "internal_admin_notes", None, &mut errors);
    match draft {
        Some(draft) if errors.is_empty() => Ok((draft, notes)),
        _ => Err(errors),
    }
}
