//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::{Method, StatusCode, header::CONTENT_TYPE, request, response},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Form fields whose values never appear in the logs.
const REDACTED_FIELDS: [&str; 2] = ["password", "confirm_password"];

const REDACTED_VALUE: &str = "********";

/// Bodies longer than this many characters are shortened in the `info` logs.
const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level with their
/// bodies shortened to [LOG_BODY_LENGTH_LIMIT] characters. Full bodies are
/// logged at the `debug` level. Passwords in submitted forms are redacted.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_text = match read_body(body).await {
        Ok(body_text) => body_text,
        Err(error) => {
            tracing::warn!("Could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    if is_form_submission(&parts) {
        log_request(&parts, &redact_form(&body_text));
    } else {
        log_request(&parts, &body_text);
    }

    let request = Request::from_parts(parts, Body::from(body_text));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_text = match read_body(body).await {
        Ok(body_text) => body_text,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    log_response(&parts, &body_text);

    Response::from_parts(parts, Body::from(body_text))
}

async fn read_body(body: Body) -> Result<String, axum::Error> {
    let bytes = axum::body::to_bytes(body, usize::MAX).await?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn is_form_submission(parts: &request::Parts) -> bool {
    let is_form = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|content_type| content_type.to_str().ok())
        .is_some_and(|content_type| content_type.starts_with("application/x-www-form-urlencoded"));

    is_form && matches!(parts.method, Method::POST | Method::PUT)
}

/// Replace the values of [REDACTED_FIELDS] in a url-encoded form.
///
/// Bodies that are not valid forms are replaced entirely.
fn redact_form(form_text: &str) -> String {
    let Ok(fields) = serde_urlencoded::from_str::<Vec<(String, String)>>(form_text) else {
        return REDACTED_VALUE.to_owned();
    };

    let fields: Vec<(String, String)> = fields
        .into_iter()
        .map(|(key, value)| {
            if REDACTED_FIELDS.contains(&key.as_str()) {
                (key, REDACTED_VALUE.to_owned())
            } else {
                (key, value)
            }
        })
        .collect();

    serde_urlencoded::to_string(&fields).unwrap_or_else(|_| REDACTED_VALUE.to_owned())
}

/// The first [LOG_BODY_LENGTH_LIMIT] characters of `body`, or `None` if it is
/// short enough to log in full.
fn truncate(body: &str) -> Option<&str> {
    body.char_indices()
        .nth(LOG_BODY_LENGTH_LIMIT)
        .map(|(end, _)| &body[..end])
}

fn log_request(parts: &request::Parts, body: &str) {
    match truncate(body) {
        Some(start) => {
            tracing::info!("Received request: {parts:#?}\nbody: {start}...");
            tracing::debug!("Full request body: {body:?}");
        }
        None => tracing::info!("Received request: {parts:#?}\nbody: {body:?}"),
    }
}

fn log_response(parts: &response::Parts, body: &str) {
    match truncate(body) {
        Some(start) => {
            tracing::info!("Sending response: {parts:#?}\nbody: {start}...");
            tracing::debug!("Full response body: {body:?}");
        }
        None => tracing::info!("Sending response: {parts:#?}\nbody: {body:?}"),
    }
}

#[cfg(test)]
mod redact_form_tests {
    use super::{LOG_BODY_LENGTH_LIMIT, redact_form, truncate};

    #[test]
    fn redacts_password_fields() {
        let form = "email=test%40example.com&password=hunter2&confirm_password=hunter2";

        let redacted = redact_form(form);

        assert_eq!(
            redacted,
            "email=test%40example.com&password=********&confirm_password=********"
        );
    }

    #[test]
    fn keeps_forms_without_passwords() {
        let form = "name=Investments&parent_id=3&category=";

        assert_eq!(redact_form(form), form);
    }

    #[test]
    fn does_not_redact_fields_that_only_contain_password() {
        let form = "password_hint=pets&password=hunter2";

        assert_eq!(redact_form(form), "password_hint=pets&password=********");
    }

    #[test]
    fn truncates_long_bodies_on_character_boundaries() {
        let body = "é".repeat(LOG_BODY_LENGTH_LIMIT + 1);

        let start = truncate(&body).expect("body should be truncated");

        assert_eq!(start.chars().count(), LOG_BODY_LENGTH_LIMIT);
    }

    #[test]
    fn keeps_short_bodies() {
        assert_eq!(truncate("name=Household"), None);
    }
}
