// SPDX-License-Identifier: Apache-2.0

//! Administrative surface. These handlers require an `is_admin` session and
//! are the only ones that read or write `verified_by_admin` and
//! `internal_admin_notes`, and the only ones that serialize the full records.

use axum::extract::{Form, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use chrono::NaiveDate;
use myclinic_api::{validate_appointment_admin, validate_patient_admin, ApiError, FormInput};
use myclinic_model::{AppointmentId, PatientId};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use super::{
    api_error_response, json_response, not_found_response, request_id, require_admin,
    store_error_response, validation_response, with_request_id,
};
use crate::AppState;

const ADMIN_PATIENT_LIST_PATH: &str = "/admin/patients";
const ADMIN_APPOINTMENT_LIST_PATH: &str = "/admin/appointments";

/// `verified` filter grammar: `1`/`true` and `0`/`false` select a side,
/// anything else (including absence) selects both.
fn parse_verified_filter(params: &HashMap<String, String>) -> Option<bool> {
    match params.get("verified").map(String::as_str) {
        Some("1" | "true") => Some(true),
        Some("0" | "false") => Some(false),
        _ => None,
    }
}

pub async fn patient_list_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let rid = request_id(&state, &headers);
    if let Err(response) = require_admin(&state, &headers, ADMIN_PATIENT_LIST_PATH) {
        return with_request_id(response, &rid);
    }
    let q = params.get("q").map(String::as_str).filter(|q| !q.is_empty());
    let verified = parse_verified_filter(&params);
    let response = match state.store.list_patients_admin(q, verified) {
        Ok(rows) => json_response(StatusCode::OK, json!({"patients": rows})),
        Err(err) => store_error_response("list_patients_admin", &err),
    };
    with_request_id(response, &rid)
}

pub async fn patient_detail_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let rid = request_id(&state, &headers);
    let next = format!("{ADMIN_PATIENT_LIST_PATH}/{id}");
    if let Err(response) = require_admin(&state, &headers, &next) {
        return with_request_id(response, &rid);
    }
    let response = match state.store.get_patient(PatientId::new(id)) {
        Ok(Some(patient)) => json_response(StatusCode::OK, json!({"patient": patient})),
        Ok(None) => not_found_response("patient", id),
        Err(err) => store_error_response("get_patient", &err),
    };
    with_request_id(response, &rid)
}

pub async fn patient_update_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Form(input): Form<FormInput>,
) -> Response {
    let rid = request_id(&state, &headers);
    let next = format!("{ADMIN_PATIENT_LIST_PATH}/{id}");
    let session = match require_admin(&state, &headers, &next) {
        Ok(session) => session,
        Err(response) => return with_request_id(response, &rid),
    };
    let response = match validate_patient_admin(&input) {
        Ok((fields, verified_by_admin)) => {
            match state
                .store
                .update_patient_admin(PatientId::new(id), &fields, verified_by_admin)
            {
                Ok(true) => {
                    tracing::info!(
                        patient = id,
                        verified_by_admin,
                        admin = %session.username,
                        request_id = %rid,
                        "patient updated via admin surface"
                    );
                    Redirect::to(ADMIN_PATIENT_LIST_PATH).into_response()
                }
                Ok(false) => not_found_response("patient", id),
                Err(err) => store_error_response("update_patient_admin", &err),
            }
        }
        Err(errors) => validation_response(&errors, &input),
    };
    with_request_id(response, &rid)
}

pub async fn appointment_list_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let rid = request_id(&state, &headers);
    if let Err(response) = require_admin(&state, &headers, ADMIN_APPOINTMENT_LIST_PATH) {
        return with_request_id(response, &rid);
    }
    let doctor = params
        .get("doctor")
        .map(String::as_str)
        .filter(|d| !d.is_empty());
    let patient = params
        .get("patient")
        .map(String::as_str)
        .filter(|p| !p.is_empty());
    let on_date = match params.get("date").map(String::as_str).filter(|d| !d.is_empty()) {
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                return with_request_id(
                    api_error_response(
                        StatusCode::BAD_REQUEST,
                        &ApiError::invalid_request("date filter must be YYYY-MM-DD"),
                    ),
                    &rid,
                )
            }
        },
        None => None,
    };
    let response = match state.store.list_appointments_admin(doctor, patient, on_date) {
        Ok(rows) => json_response(StatusCode::OK, json!({"appointments": rows})),
        Err(err) => store_error_response("list_appointments_admin", &err),
    };
    with_request_id(response, &rid)
}

pub async fn appointment_detail_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let rid = request_id(&state, &headers);
    let next = format!("{ADMIN_APPOINTMENT_LIST_PATH}/{id}");
    if let Err(response) = require_admin(&state, &headers, &next) {
        return with_request_id(response, &rid);
    }
    let response = match state.store.get_appointment(AppointmentId::new(id)) {
        Ok(Some(appointment)) => {
            json_response(StatusCode::OK, json!({"appointment": appointment}))
        }
        Ok(None) => not_found_response("appointment", id),
        Err(err) => store_error_response("get_appointment", &err),
    };
    with_request_id(response, &rid)
}

pub async fn appointment_update_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Form(input): Form<FormInput>,
) -> Response {
    let rid = request_id(&state, &headers);
    let next = format!("{ADMIN_APPOINTMENT_LIST_PATH}/{id}");
    let session = match require_admin(&state, &headers, &next) {
        Ok(session) => session,
        Err(response) => return with_request_id(response, &rid),
    };
    let store = Arc::clone(&state.store);
    let patient_exists = move |pid: PatientId| store.patient_exists(pid).unwrap_or(false);
    let response = match validate_appointment_admin(&input, &patient_exists) {
        Ok((fields, notes)) => {
            match state.store.update_appointment_admin(
                AppointmentId::new(id),
                &fields,
                notes.as_deref(),
            ) {
                Ok(true) => {
                    tracing::info!(
                        appointment = id,
                        admin = %session.username,
                        request_id = %rid,
                        "appointment updated via admin surface"
                    );
                    Redirect::to(ADMIN_APPOINTMENT_LIST_PATH).into_response()
                }
                Ok(false) => not_found_response("appointment", id),
                Err(err) => store_error_response("update_appointment_admin", &err),
            }
        }
        Err(errors) => validation_response(&errors, &input),
    };
    with_request_id(response, &rid)
}

#[cfg(test)]
mod tests {
    use super::parse_verified_filter;
    use std::collections::HashMap;

    #[test]
    fn verified_filter_grammar() {
        let mut params = HashMap::new();
        assert_eq!(parse_verified_filter(&params), None);
        params.insert("verified".to_string(), "1".to_string());
        assert_eq!(parse_verified_filter(&params), Some(true));
        params.insert("verified".to_string(), "false".to_string());
        assert_eq!(parse_verified_filter(&params), Some(false));
        params.insert("verified".to_string(), "maybe".to_string());
        assert_eq!(parse_verified_filter(&params), None);
    }
}
