use super::*;
use serde_json::json;

// =============================================================
// Role
// =============================================================

#[test]
fn role_serializes_lowercase() {
    assert_eq!(serde_json::to_value(Role::Tutor).unwrap(), json!("tutor"));
}

#[test]
fn role_parses_case_insensitively() {
    assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
    assert_eq!(" student ".parse::<Role>(), Ok(Role::Student));
}

#[test]
fn role_parse_rejects_unknown() {
    let err = "parent".parse::<Role>().unwrap_err();
    assert_eq!(err, UnknownRole("parent".to_owned()));
}

// =============================================================
// User
// =============================================================

#[test]
fn user_accepts_numeric_id() {
    let user: User =
        serde_json::from_value(json!({ "id": 42, "email": "a@b.com", "name": "A", "role": "student" })).unwrap();
    assert_eq!(user.id, "42");
}

#[test]
fn user_name_defaults_when_missing() {
    let user: User = serde_json::from_value(json!({ "id": "7", "email": "s@x.com", "role": "student" })).unwrap();
    assert_eq!(user.name, "");
}

#[test]
fn user_rejects_unknown_role() {
    let parsed = serde_json::from_value::<User>(json!({ "id": "1", "email": "a@b.com", "role": "guest" }));
    assert!(parsed.is_err());
}

#[test]
fn user_rejects_empty_id() {
    let parsed = serde_json::from_value::<User>(json!({ "id": "", "email": "a@b.com", "role": "admin" }));
    assert!(parsed.is_err());
}

// =============================================================
// parse_identity
// =============================================================

#[test]
fn identity_wrapped_payload() {
    let user =
        parse_identity(r#"{"success":true,"user":{"id":"1","email":"a@b.com","name":"A","role":"student"}}"#).unwrap();
    assert_eq!(user.email, "a@b.com");
    assert_eq!(user.role, Role::Student);
}

#[test]
fn identity_bare_payload() {
    let user = parse_identity(r#"{"id":"2","email":"c@d.com","name":"C","role":"tutor"}"#).unwrap();
    assert_eq!(user.id, "2");
    assert_eq!(user.role, Role::Tutor);
}

#[test]
fn identity_null_user_is_malformed() {
    assert!(matches!(parse_identity(r#"{"user":null}"#), Err(ApiError::Parse(_))));
}

#[test]
fn identity_non_json_is_malformed() {
    assert!(matches!(parse_identity("<html>"), Err(ApiError::Parse(_))));
}

// =============================================================
// Requests / responses
// =============================================================

#[test]
fn login_request_omits_missing_role() {
    let body = LoginRequest { email: "a@b.com".into(), password: "pw".into(), role: None };
    assert_eq!(serde_json::to_value(&body).unwrap(), json!({ "email": "a@b.com", "password": "pw" }));
}

#[test]
fn login_request_forwards_role_hint() {
    let body = LoginRequest { email: "a@b.com".into(), password: "pw".into(), role: Some(Role::Admin) };
    assert_eq!(serde_json::to_value(&body).unwrap()["role"], json!("admin"));
}

#[test]
fn accepted_user_requires_success_flag() {
    let response: AuthResponse =
        serde_json::from_value(json!({ "user": { "id": "1", "email": "a@b.com", "role": "student" } })).unwrap();
    assert!(response.accepted_user().is_none());
}

#[test]
fn accepted_user_requires_user() {
    let response: AuthResponse = serde_json::from_value(json!({ "success": true })).unwrap();
    assert!(response.accepted_user().is_none());
}

#[test]
fn failure_message_prefers_error_then_message() {
    let response: AuthResponse =
        serde_json::from_value(json!({ "success": false, "error": "Invalid credentials", "message": "nope" })).unwrap();
    assert_eq!(response.failure_message(), Some("Invalid credentials"));

    let response: AuthResponse = serde_json::from_value(json!({ "message": "Account locked" })).unwrap();
    assert_eq!(response.failure_message(), Some("Account locked"));
}

#[test]
fn failure_message_ignores_blank_text() {
    let response: AuthResponse = serde_json::from_value(json!({ "success": false, "error": "   " })).unwrap();
    assert_eq!(response.failure_message(), None);
}

#[test]
fn only_transport_request_errors_are_retryable() {
    assert!(ApiError::Request { message: "timeout".into(), retryable: true }.is_retryable());
    assert!(!ApiError::Request { message: "body".into(), retryable: false }.is_retryable());
    assert!(!ApiError::Status { status: 503, body: String::new() }.is_retryable());
}
