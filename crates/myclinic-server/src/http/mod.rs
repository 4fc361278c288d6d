// SPDX-License-Identifier: Apache-2.0

//! Request plumbing shared by the standard and administrative handler sets:
//! the access gate, the error envelope, and request-id propagation.

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use myclinic_api::{ApiError, FieldErrors, FormInput};
use myclinic_store::StoreError;
use serde_json::{json, Value};
use std::sync::atomic::Ordering;

use crate::auth::{session_token_from_headers, Session};
use crate::{AppState, LOGIN_PATH};

pub mod admin;
pub mod handlers;

pub(crate) const REQUEST_ID_HEADER: &str = "x-request-id";

pub(crate) fn propagated_request_id(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(REQUEST_ID_HEADER)?.to_str().ok()?.trim();
    if raw.is_empty() || raw.len() > 128 {
        return None;
    }
    Some(raw.to_string())
}

pub(crate) fn make_request_id(state: &AppState) -> String {
    let n = state.request_id_seed.fetch_add(1, Ordering::Relaxed);
    format!("req-{n:016x}")
}

pub(crate) fn request_id(state: &AppState, headers: &HeaderMap) -> String {
    propagated_request_id(headers).unwrap_or_else(|| make_request_id(state))
}

pub(crate) fn with_request_id(mut response: Response, request_id: &str) -> Response {
    if let Ok(value) = request_id.parse() {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

pub(crate) fn json_response(status: StatusCode, body: Value) -> Response {
    let mut response = axum::Json(body).into_response();
    *response.status_mut() = status;
    response
}

pub(crate) fn api_error_response(status: StatusCode, err: &ApiError) -> Response {
    json_response(status, json!({ "error": err }))
}

/// 303 to the login form, carrying the originally requested path so a
/// successful login can land back where the client was headed.
pub(crate) fn login_redirect(next: &str) -> Response {
    Redirect::to(&format!("{LOGIN_PATH}?next={next}")).into_response()
}

/// Every entity and admin handler calls this before touching the store.
pub(crate) fn require_session(
    state: &AppState,
    headers: &HeaderMap,
    next: &str,
) -> Result<Session, Response> {
    let token = session_token_from_headers(headers)
        .ok_or_else(|| login_redirect(next))?;
    state
        .sessions
        .authenticate(&token)
        .ok_or_else(|| login_redirect(next))
}

/// Admin gate: anonymous callers get the login redirect, authenticated
/// non-admin callers get a 403.
pub(crate) fn require_admin(
    state: &AppState,
    headers: &HeaderMap,
    next: &str,
) -> Result<Session, Response> {
    let session = require_session(state, headers, next)?;
    if !session.is_admin {
        return Err(api_error_response(
            StatusCode::FORBIDDEN,
            &ApiError::forbidden("administrative access required"),
        ));
    }
    Ok(session)
}

/// 422 carrying the per-field messages and the raw submission.
pub(crate) fn validation_response(errors: &FieldErrors, submitted: &FormInput) -> Response {
    api_error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        &ApiError::validation_failed(json!(errors), json!(submitted)),
    )
}

pub(crate) fn not_found_response(entity: &str, id: i64) -> Response {
    api_error_response(StatusCode::NOT_FOUND, &ApiError::not_found(entity, id))
}

pub(crate) fn store_error_response(op: &str, err: &StoreError) -> Response {
    tracing::error!(op, error = %err, "store operation failed");
    api_error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        &ApiError::internal("storage failure"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn propagated_request_id_rejects_blank_and_oversized_values() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("  "));
        assert!(propagated_request_id(&headers).is_none());
        let long = "x".repeat(200);
        headers.insert(
            REQUEST_ID_HEADER,
            HeaderValue::from_str(&long).expect("header"),
        );
        assert!(propagated_request_id(&headers).is_none());
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("abc-123"));
        assert_eq!(propagated_request_id(&headers).as_deref(), Some("abc-123"));
    }

    #[test]
    fn login_redirect_points_at_the_login_form_with_next() {
        let response = login_redirect("/patients");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response
                .headers()
                .get("location")
                .and_then(|v| v.to_str().ok()),
            Some("/login?next=/patients")
        );
    }
}
