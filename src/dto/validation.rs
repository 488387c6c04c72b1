//! Validation helpers for DTOs.

use time::{Date, macros::format_description};
use validator::ValidationError;

/// Minimum length of team and tournament names, after trimming.
pub const MIN_NAME_LEN: usize = 3;

/// Validates that a team or tournament name has at least [`MIN_NAME_LEN`]
/// characters once surrounding whitespace is removed.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let len = name.trim().chars().count();
    if len < MIN_NAME_LEN {
        let mut err = ValidationError::new("name_length");
        err.message = Some(
            format!("Name must be at least {MIN_NAME_LEN} characters long (got {len})").into(),
        );
        return Err(err);
    }
    Ok(())
}

/// Validates a calendar day written as `YYYY-MM-DD`.
///
/// ```ignore
/// validate_session_date("2025-03-14") // Ok
/// validate_session_date("2025-02-30") // Err - no such day
/// validate_session_date("14/03/2025") // Err - wrong format
/// ```
pub fn validate_session_date(date: &str) -> Result<(), ValidationError> {
    parse_session_date(date).map(|_| ())
}

pub fn parse_session_date(date: &str) -> Result<Date, ValidationError> {
    Date::parse(date, format_description!("[year]-[month]-[day]")).map_err(|_| {
        let mut err = ValidationError::new("session_date");
        err.message = Some("Date must be a valid day formatted as YYYY-MM-DD".into());
        err
    })
}

/// Validates that every roster entry looks like an email address.
pub fn validate_roster(players: &[String]) -> Result<(), ValidationError> {
    match players.iter().find(|raw| !looks_like_email(raw)) {
        Some(raw) => {
            let mut err = ValidationError::new("roster_email");
            err.message = Some(format!("`{raw}` is not an email address").into());
            Err(err)
        }
        None => Ok(()),
    }
}

fn looks_like_email(raw: &str) -> bool {
    let raw = raw.trim();
    matches!(raw.split_once('@'), Some((local, domain)) if !local.is_empty() && !domain.is_empty())
}
