//! Validation and sanitising of user-supplied text.

use std::sync::LazyLock;

use regex::Regex;

use crate::{Error, Result};

static EMAIL: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn is_valid_email(email: &str) -> bool { EMAIL.is_match(email) }

pub fn email(email: &str) -> Result<()> {
  if is_valid_email(email) {
    Ok(())
  } else {
    Err(Error::Validation(format!("invalid email address: {email:?}")))
  }
}

pub fn password(password: &str) -> Result<()> {
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(Error::Validation(format!(
      "password must be at least {MIN_PASSWORD_LEN} characters long"
    )));
  }
  Ok(())
}

/// Check the trimmed length of `value` against `min..=max` characters.
fn length(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
  let len = value.trim().chars().count();
  if len < min {
    Err(Error::Validation(format!(
      "{field} must be at least {min} characters long"
    )))
  } else if len > max {
    Err(Error::Validation(format!(
      "{field} must be at most {max} characters long"
    )))
  } else {
    Ok(())
  }
}

pub fn display_name(name: &str) -> Result<()> { length("display name", name, 2, 50) }

pub fn location_name(name: &str) -> Result<()> { length("location name", name, 3, 100) }

pub fn location_description(description: &str) -> Result<()> {
  length("description", description, 10, 500)
}

/// Trim and strip angle brackets.
pub fn sanitize_input(input: &str) -> String {
  input.trim().chars().filter(|c| !matches!(c, '<' | '>')).collect()
}
