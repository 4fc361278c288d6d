// SPDX-License-Identifier: Apache-2.0

//! Standard (non-administrative) surface: session login, patient CRUD and
//! appointment CRUD. Every entity route sits behind the session gate;
//! privileged fields never appear in these responses and are ignored when
//! submitted here.

use axum::extract::{Form, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use myclinic_api::{
    validate_appointment, validate_patient, ApiError, AppointmentPublic, FormInput, PatientPublic,
};
use myclinic_model::{AppointmentId, PatientId};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use super::{
    api_error_response, not_found_response, request_id, require_session, store_error_response,
    validation_response, with_request_id,
};
use crate::{AppState, LOGIN_PATH, SESSION_COOKIE};

const PATIENT_LIST_PATH: &str = "/patients";
const APPOINTMENT_LIST_PATH: &str = "/appointments";

pub async fn landing_handler() -> Response {
    Html(concat!(
        "<!doctype html><html><head><title>myclinic</title></head><body>",
        "<h1>myclinic</h1>",
        "<p>Patient and appointment management.</p>",
        "<ul><li><a href=\"/patients\">Patients</a></li>",
        "<li><a href=\"/appointments\">Appointments</a></li></ul>",
        "</body></html>"
    ))
    .into_response()
}

pub async fn healthz_handler() -> Response {
    super::json_response(StatusCode::OK, json!({"status": "ok"}))
}

pub async fn version_handler() -> Response {
    super::json_response(
        StatusCode::OK,
        json!({"name": crate::CRATE_NAME, "version": env!("CARGO_PKG_VERSION")}),
    )
}

/// Post-login destinations must be local paths. `//` and `/\` are treated as
/// scheme-relative by browsers, so both fall back to the patient list.
fn sanitize_next(raw: Option<&str>) -> &str {
    match raw {
        Some(next)
            if next.starts_with('/')
                && !matches!(next.as_bytes().get(1), Some(b'/') | Some(b'\\')) =>
        {
            next
        }
        _ => PATIENT_LIST_PATH,
    }
}

fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

pub async fn login_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(input): Form<FormInput>,
) -> Response {
    let rid = request_id(&state, &headers);
    let username = input.get("username").map(String::as_str).unwrap_or("");
    let password = input.get("password").map(String::as_str).unwrap_or("");
    let response = match state.sessions.login(&state.api.users, username, password) {
        Some(token) => {
            tracing::info!(username, request_id = %rid, "login succeeded");
            let next = sanitize_next(input.get("next").map(String::as_str));
            let mut response = Redirect::to(next).into_response();
            if let Ok(value) = session_cookie(&token).parse() {
                response.headers_mut().insert("set-cookie", value);
            }
            response
        }
        None => {
            tracing::info!(username, request_id = %rid, "login rejected");
            api_error_response(
                StatusCode::UNAUTHORIZED,
                &ApiError::new(
                    myclinic_api::ApiErrorCode::LoginRequired,
                    "invalid username or password",
                    json!({}),
                ),
            )
        }
    };
    with_request_id(response, &rid)
}

pub async fn logout_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let rid = request_id(&state, &headers);
    if let Some(token) = crate::auth::session_token_from_headers(&headers) {
        state.sessions.revoke(&token);
    }
    let mut response = Redirect::to(LOGIN_PATH).into_response();
    if let Ok(value) = clear_session_cookie().parse() {
        response.headers_mut().insert("set-cookie", value);
    }
    with_request_id(response, &rid)
}

pub async fn patient_list_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let rid = request_id(&state, &headers);
    if let Err(response) = require_session(&state, &headers, PATIENT_LIST_PATH) {
        return with_request_id(response, &rid);
    }
    let q = params.get("q").map(String::as_str).filter(|q| !q.is_empty());
    let response = match state.store.list_patients(q) {
        Ok(rows) => {
            let body: Vec<PatientPublic> = rows.iter().map(PatientPublic::from).collect();
            super::json_response(StatusCode::OK, json!({"patients": body}))
        }
        Err(err) => store_error_response("list_patients", &err),
    };
    with_request_id(response, &rid)
}

pub async fn patient_create_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(input): Form<FormInput>,
) -> Response {
    let rid = request_id(&state, &headers);
    if let Err(response) = require_session(&state, &headers, PATIENT_LIST_PATH) {
        return with_request_id(response, &rid);
    }
    let response = match validate_patient(&input) {
        Ok(draft) => match state.store.create_patient(&draft) {
            Ok(created) => {
                tracing::info!(patient = %created.id, request_id = %rid, "patient created");
                Redirect::to(PATIENT_LIST_PATH).into_response()
            }
            Err(err) => store_error_response("create_patient", &err),
        },
        Err(errors) => validation_response(&errors, &input),
    };
    with_request_id(response, &rid)
}

pub async fn patient_detail_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let rid = request_id(&state, &headers);
    let next = format!("{PATIENT_LIST_PATH}/{id}");
    if let Err(response) = require_session(&state, &headers, &next) {
        return with_request_id(response, &rid);
    }
    let response = match state.store.get_patient(PatientId::new(id)) {
        Ok(Some(patient)) => {
            super::json_response(StatusCode::OK, json!({"patient": PatientPublic::from(&patient)}))
        }
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
    let detail_path = format!("{PATIENT_LIST_PATH}/{id}");
    if let Err(response) = require_session(&state, &headers, &detail_path) {
        return with_request_id(response, &rid);
    }
    let response = match validate_patient(&input) {
        Ok(fields) => match state.store.update_patient(PatientId::new(id), &fields) {
            Ok(true) => {
                tracing::info!(patient = id, request_id = %rid, "patient updated");
                Redirect::to(&detail_path).into_response()
            }
            Ok(false) => not_found_response("patient", id),
            Err(err) => store_error_response("update_patient", &err),
        },
        Err(errors) => validation_response(&errors, &input),
    };
    with_request_id(response, &rid)
}

pub async fn patient_delete_confirm_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let rid = request_id(&state, &headers);
    let next = format!("{PATIENT_LIST_PATH}/{id}/delete");
    if let Err(response) = require_session(&state, &headers, &next) {
        return with_request_id(response, &rid);
    }
    // Confirmation step only; the record is untouched until the POST.
    let response = match state.store.get_patient(PatientId::new(id)) {
        Ok(Some(patient)) => super::json_response(
            StatusCode::OK,
            json!({"confirm_delete": {"entity": "patient", "id": id, "name": patient.name}}),
        ),
        Ok(None) => not_found_response("patient", id),
        Err(err) => store_error_response("get_patient", &err),
    };
    with_request_id(response, &rid)
}

pub async fn patient_delete_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let rid = request_id(&state, &headers);
    let next = format!("{PATIENT_LIST_PATH}/{id}/delete");
    if let Err(response) = require_session(&state, &headers, &next) {
        return with_request_id(response, &rid);
    }
    let response = match state.store.delete_patient(PatientId::new(id)) {
        Ok(true) => {
            tracing::info!(patient = id, request_id = %rid, "patient deleted");
            Redirect::to(PATIENT_LIST_PATH).into_response()
        }
        Ok(false) => not_found_response("patient", id),
        Err(err) => store_error_response("delete_patient", &err),
    };
    with_request_id(response, &rid)
}

fn patient_resolver(state: &AppState) -> impl Fn(PatientId) -> bool {
    let store = Arc::clone(&state.store);
    move |id| store.patient_exists(id).unwrap_or(false)
}

pub async fn appointment_list_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let rid = request_id(&state, &headers);
    if let Err(response) = require_session(&state, &headers, APPOINTMENT_LIST_PATH) {
        return with_request_id(response, &rid);
    }
    let response = match state.store.list_appointments() {
        Ok(rows) => {
            let body: Vec<AppointmentPublic> = rows.iter().map(AppointmentPublic::from).collect();
            super::json_response(StatusCode::OK, json!({"appointments": body}))
        }
        Err(err) => store_error_response("list_appointments", &err),
    };
    with_request_id(response, &rid)
}

pub async fn appointment_create_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(input): Form<FormInput>,
) -> Response {
    let rid = request_id(&state, &headers);
    if let Err(response) = require_session(&state, &headers, APPOINTMENT_LIST_PATH) {
        return with_request_id(response, &rid);
    }
    let response = match validate_appointment(&input, &patient_resolver(&state)) {
        Ok(draft) => match state.store.create_appointment(&draft) {
            Ok(created) => {
                tracing::info!(appointment = %created.id, request_id = %rid, "appointment created");
                Redirect::to(APPOINTMENT_LIST_PATH).into_response()
            }
            Err(err) => store_error_response("create_appointment", &err),
        },
        Err(errors) => validation_response(&errors, &input),
    };
    with_request_id(response, &rid)
}

pub async fn appointment_detail_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let rid = request_id(&state, &headers);
    let next = format!("{APPOINTMENT_LIST_PATH}/{id}");
    if let Err(response) = require_session(&state, &headers, &next) {
        return with_request_id(response, &rid);
    }
    let response = match state.store.get_appointment(AppointmentId::new(id)) {
        Ok(Some(appointment)) => super::json_response(
            StatusCode::OK,
            json!({"appointment": AppointmentPublic::from(&appointment)}),
        ),
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
    let next = format!("{APPOINTMENT_LIST_PATH}/{id}");
    if let Err(response) = require_session(&state, &headers, &next) {
        return with_request_id(response, &rid);
    }
    let response = match validate_appointment(&input, &patient_resolver(&state)) {
        Ok(fields) => match state.store.update_appointment(AppointmentId::new(id), &fields) {
            Ok(true) => {
                tracing::info!(appointment = id, request_id = %rid, "appointment updated");
                Redirect::to(APPOINTMENT_LIST_PATH).into_response()
            }
            Ok(false) => not_found_response("appointment", id),
            Err(err) => store_error_response("update_appointment", &err),
        },
        Err(errors) => validation_response(&errors, &input),
    };
    with_request_id(response, &rid)
}

pub async fn appointment_delete_confirm_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let rid = request_id(&state, &headers);
    let next = format!("{APPOINTMENT_LIST_PATH}/{id}/delete");
    if let Err(response) = require_session(&state, &headers, &next) {
        return with_request_id(response, &rid);
    }
    let response = match state.store.get_appointment(AppointmentId::new(id)) {
        Ok(Some(appointment)) => super::json_response(
            StatusCode::OK,
            json!({"confirm_delete": {
                "entity": "appointment",
                "id": id,
                "date": appointment.date,
                "doctor_name": appointment.doctor_name,
            }}),
        ),
        Ok(None) => not_found_response("appointment", id),
        Err(err) => store_error_response("get_appointment", &err),
    };
    with_request_id(response, &rid)
}

pub async fn appointment_delete_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let rid = request_id(&state, &headers);
    let next = format!("{APPOINTMENT_LIST_PATH}/{id}/delete");
    if let Err(response) = require_session(&state, &headers, &next) {
        return with_request_id(response, &rid);
    }
    let response = match state.store.delete_appointment(AppointmentId::new(id)) {
        Ok(true) => {
            tracing::info!(appointment = id, request_id = %rid, "appointment deleted");
            Redirect::to(APPOINTMENT_LIST_PATH).into_response()
        }
        Ok(false) => not_found_response("appointment", id),
        Err(err) => store_error_response("delete_appointment", &err),
    };
    with_request_id(response, &rid)
}

#[cfg(test)]
mod tests {
    use super::sanitize_next;

    #[test]
    fn sanitize_next_only_accepts_local_paths() {
        assert_eq!(sanitize_next(Some("/appointments")), "/appointments");
        assert_eq!(sanitize_next(Some("https://evil.example")), "/patients");
        assert_eq!(sanitize_next(Some("//evil.example")), "/patients");
        assert_eq!(sanitize_next(Some("/\\evil.example")), "/patients");
        assert_eq!(sanitize_next(None), "/patients");
    }
}
