use chrono::NaiveDate;

use super::domain::{ApplicantDetails, ApplicationSubmission};
use crate::workflows::review::{normalize_notes, ValidationError};

const MAX_DEPENDENTS: u8 = 30;

/// Converts inbound application forms into validated applicant details.
#[derive(Debug, Clone, Default)]
pub struct IntakeGuard;

impl IntakeGuard {
    pub fn applicant_from_submission(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<ApplicantDetails, ValidationError> {
        let full_name = required_text("full_name", &submission.full_name)?;
        let ic_number = normalize_ic_number(&submission.ic_number)?;
        let phone = normalize_phone(&submission.phone)?;
        let address = required_text("address", &submission.address)?;

        if submission.dependents > MAX_DEPENDENTS {
            return Err(ValidationError::InvalidField {
                field: "dependents",
                reason: format!("at most {MAX_DEPENDENTS} dependents may be declared"),
            });
        }

        Ok(ApplicantDetails {
            full_name,
            ic_number,
            phone,
            address,
            occupation: normalize_notes(submission.occupation.as_deref()),
            dependents: submission.dependents,
        })
    }
}

pub(crate) fn required_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::MissingField { field })
    } else {
        Ok(trimmed.to_string())
    }
}

/// Accepts `YYMMDD-PB-####` with or without dashes and returns the dashed form.
pub fn normalize_ic_number(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField { field: "ic_number" });
    }

    let digits: String = trimmed.chars().filter(|c| *c != '-').collect();
    let dashed_shape = trimmed.len() == 14
        && trimmed.as_bytes()[6] == b'-'
        && trimmed.as_bytes()[9] == b'-';
    if digits.len() != 12
        || !digits.chars().all(|c| c.is_ascii_digit())
        || (trimmed.contains('-') && !dashed_shape)
    {
        return Err(ValidationError::InvalidField {
            field: "ic_number",
            reason: "expected 12 digits in the form YYMMDD-PB-####".to_string(),
        });
    }

    if NaiveDate::parse_from_str(&digits[..6], "%y%m%d").is_err() {
        return Err(ValidationError::InvalidField {
            field: "ic_number",
            reason: format!("'{}' is not a valid birth date", &digits[..6]),
        });
    }

    Ok(format!("{}-{}-{}", &digits[..6], &digits[6..8], &digits[8..]))
}

fn normalize_phone(raw: &str) -> Result<String, ValidationError> {
    let trimmed = required_text("phone", raw)?;
    let (prefix, rest) = match trimmed.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", trimmed.as_str()),
    };

    if rest
        .chars()
        .any(|c| !(c.is_ascii_digit() || c == '-' || c == ' '))
    {
        return Err(ValidationError::InvalidField {
            field: "phone",
            reason: "only digits, spaces and dashes are allowed".to_string(),
        });
    }

    let digits: String = rest.chars().filter(char::is_ascii_digit).collect();
    if !(9..=13).contains(&digits.len()) {
        return Err(ValidationError::InvalidField {
            field: "phone",
            reason: "expected between 9 and 13 digits".to_string(),
        });
    }

    Ok(format!("{prefix}{digits}"))
}
