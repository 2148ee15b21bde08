use super::{FormFeedback, ViewMode};
use crate::error::FetchError;

// Exactly one of the three views exists for any (flag, toggle) pair, and the
// authenticated flag alone decides the Home branch.

#[test]
fn authenticated_always_shows_home() {
    assert_eq!(ViewMode::current(true, false), ViewMode::Home);
    assert_eq!(ViewMode::current(true, true), ViewMode::Home);
}

#[test]
fn unauthenticated_defaults_to_login() {
    assert_eq!(ViewMode::current(false, false), ViewMode::Login);
}

#[test]
fn signup_toggle_only_matters_while_unauthenticated() {
    assert_eq!(ViewMode::current(false, true), ViewMode::SignUp);
    assert_eq!(ViewMode::current(true, true), ViewMode::Home);
}

#[test]
fn toggling_flips_between_the_two_forms() {
    let mut show_signup = false;
    assert_eq!(ViewMode::current(false, show_signup), ViewMode::Login);
    show_signup = !show_signup;
    assert_eq!(ViewMode::current(false, show_signup), ViewMode::SignUp);
    show_signup = !show_signup;
    assert_eq!(ViewMode::current(false, show_signup), ViewMode::Login);
}

// The login form's feedback over one submit round trip.

#[test]
fn submitting_clears_a_stale_error_and_disables_the_form() {
    let feedback = FormFeedback::pending();
    assert!(feedback.error.is_empty());
    assert!(feedback.loading);
}

#[test]
fn login_success_clears_the_error_and_stops_loading() {
    let feedback = FormFeedback::settled(&Ok(()), "Login failed");
    assert!(feedback.error.is_empty());
    assert!(!feedback.loading);
}

#[test]
fn login_failure_shows_the_fixed_message_and_re_enables_the_form() {
    let result = Err(FetchError::Http { status: 401 });
    let feedback = FormFeedback::settled(&result, "Login failed");
    assert_eq!(feedback.error, "Login failed");
    assert!(!feedback.loading);
}
