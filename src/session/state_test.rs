use super::*;

fn student() -> User {
    User { id: "1".into(), email: "a@b.com".into(), name: "A".into(), role: Role::Student }
}

// =============================================================
// construction
// =============================================================

#[test]
fn default_is_unresolved() {
    let state = SessionState::default();
    assert!(state.loading());
    assert!(state.user().is_none());
    assert!(!state.is_authenticated());
    assert_eq!(state.phase(), SessionPhase::Unresolved);
}

#[test]
fn anonymous_and_authenticated_are_resolved() {
    assert_eq!(SessionState::anonymous().phase(), SessionPhase::Anonymous);
    let state = SessionState::authenticated(student());
    assert_eq!(state.phase(), SessionPhase::Authenticated);
    assert!(state.is_authenticated());
}

// =============================================================
// mutation
// =============================================================

#[test]
fn set_user_keeps_flag_in_step() {
    let mut state = SessionState::anonymous();
    state.set_user(Some(student()));
    assert_eq!(state.is_authenticated(), state.user().is_some());
    state.set_user(None);
    assert_eq!(state.is_authenticated(), state.user().is_some());
    assert!(!state.is_authenticated());
}

#[test]
fn finish_loading_reports_first_transition_only() {
    let mut state = SessionState::unresolved();
    assert!(state.finish_loading());
    assert!(!state.finish_loading());
    assert!(!state.loading());
}

#[test]
fn login_before_resolution_stays_unresolved() {
    let mut state = SessionState::unresolved();
    state.set_user(Some(student()));
    assert_eq!(state.phase(), SessionPhase::Unresolved);
    assert!(state.is_authenticated());
}

// =============================================================
// role helpers
// =============================================================

#[test]
fn role_helpers_follow_user_role() {
    let state = SessionState::authenticated(User { role: Role::Tutor, ..student() });
    assert!(state.is_tutor());
    assert!(!state.is_admin());
    assert!(!state.is_student());
    assert_eq!(state.role(), Some(Role::Tutor));
}

#[test]
fn anonymous_has_no_role() {
    let state = SessionState::anonymous();
    assert_eq!(state.role(), None);
    assert!(!state.has_role(Role::Student));
}
