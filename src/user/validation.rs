use crate::error::{Constraint, FieldViolation};

use super::model::NewUser;

pub const MIN_NAME_LEN: usize = 3;
pub const MIN_EMAIL_LEN: usize = 3;

/// Checks every field-level constraint of a user about to be stored.
///
/// Collects all violations rather than stopping at the first one. Email
/// uniqueness is left to the store.
pub fn validate_new_user(user: &NewUser) -> Result<(), Vec<FieldViolation>> {
    let mut violations = Vec::new();

    required_min_len(
        &mut violations,
        "fullname.firstname",
        &user.fullname.firstname,
        MIN_NAME_LEN,
        "Firstname",
    );
    if let Some(lastname) = &user.fullname.lastname {
        min_len(&mut violations, "fullname.lastname", lastname, MIN_NAME_LEN, "Lastname");
    }
    required_min_len(&mut violations, "email", &user.email, MIN_EMAIL_LEN, "Email");
    if user.password.as_str().is_empty() {
        violations.push(required("password", "Password"));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

// An empty string does not satisfy "required".
fn required_min_len(
    out: &mut Vec<FieldViolation>,
    field: &'static str,
    value: &str,
    min: usize,
    label: &str,
) {
    if value.is_empty() {
        out.push(required(field, label));
    } else {
        min_len(out, field, value, min, label);
    }
}

fn min_len(out: &mut Vec<FieldViolation>, field: &'static str, value: &str, min: usize, label: &str) {
    if value.encode_utf16().count() < min {
        out.push(FieldViolation {
            field,
            constraint: Constraint::MinLength(min),
            message: format!("{label} must be at least {min} characters long"),
        });
    }
}

fn required(field: &'static str, label: &str) -> FieldViolation {
    FieldViolation {
        field,
        constraint: Constraint::Required,
        message: format!("{label} is required"),
    }
}
