//! Input validation for chat requests and feedback.

use std::fmt;

use database::Feedback;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid email format.
    InvalidEmail(String),
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Empty value where one is required.
    Empty(String),
    /// Number outside its allowed range.
    OutOfRange { field: String, min: i32, max: i32, actual: i32 },
    /// Text contains a NUL character, which PostgreSQL cannot store.
    NulCharacter(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidEmail(msg) => write!(f, "Invalid email: {}", msg),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
            ValidationError::OutOfRange { field, min, max, actual } => {
                write!(f, "{} must be between {} and {} (got {})", field, min, max, actual)
            }
            ValidationError::NulCharacter(field) => {
                write!(f, "{} contains a NUL character", field)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for email addresses.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum allowed length for a session ID.
pub const MAX_SESSION_ID_LENGTH: usize = 64;

/// Maximum allowed length for a chat message.
pub const MAX_MESSAGE_LENGTH: usize = 4000;

/// Maximum allowed length for a feedback comment.
pub const MAX_COMMENT_LENGTH: usize = 2000;

/// Lowest and highest feedback rating.
pub const RATING_RANGE: (i32, i32) = (1, 5);

/// Validate an email address.
///
/// Only the shape is checked: one `@`, a non-empty local part, and a dotted
/// domain without empty labels at either end.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Empty("email".to_string()));
    }

    reject_nul("email", email)?;

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LENGTH,
            actual: email.len(),
        });
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::InvalidEmail("missing @ symbol".to_string()));
    };

    if domain.contains('@') {
        return Err(ValidationError::InvalidEmail(
            "must contain exactly one @ symbol".to_string(),
        ));
    }

    if local.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing local part (before @)".to_string(),
        ));
    }

    if !domain.contains('.') {
        return Err(ValidationError::InvalidEmail(
            "domain must contain at least one dot".to_string(),
        ));
    }

    if domain.starts_with('.') || domain.ends_with('.') || domain.contains("..") {
        return Err(ValidationError::InvalidEmail(
            "domain has an empty label".to_string(),
        ));
    }

    Ok(())
}

/// Validate a caller-supplied session ID.
pub fn validate_session_id(session_id: &str) -> Result<(), ValidationError> {
    if session_id.trim().is_empty() {
        return Err(ValidationError::Empty("session ID".to_string()));
    }

    reject_nul("session ID", session_id)?;

    let length = session_id.chars().count();
    if length > MAX_SESSION_ID_LENGTH {
        return Err(ValidationError::TooLong {
            field: "session ID".to_string(),
            max: MAX_SESSION_ID_LENGTH,
            actual: length,
        });
    }

    Ok(())
}

/// Validate an inbound chat message.
pub fn validate_message(message: &str) -> Result<(), ValidationError> {
    if message.trim().is_empty() {
        return Err(ValidationError::Empty("message".to_string()));
    }

    reject_nul("message", message)?;

    let length = message.chars().count();
    if length > MAX_MESSAGE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "message".to_string(),
            max: MAX_MESSAGE_LENGTH,
            actual: length,
        });
    }

    Ok(())
}

/// Validate end-of-session feedback.
pub fn validate_feedback(feedback: &Feedback) -> Result<(), ValidationError> {
    if let Some(rating) = feedback.rating {
        let (min, max) = RATING_RANGE;
        if !(min..=max).contains(&rating) {
            return Err(ValidationError::OutOfRange {
                field: "rating".to_string(),
                min,
                max,
                actual: rating,
            });
        }
    }

    if let Some(comments) = &feedback.comments {
        reject_nul("comments", comments)?;

        let length = comments.chars().count();
        if length > MAX_COMMENT_LENGTH {
            return Err(ValidationError::TooLong {
                field: "comments".to_string(),
                max: MAX_COMMENT_LENGTH,
                actual: length,
            });
        }
    }

    Ok(())
}

/// Reject text containing a NUL character.
pub fn reject_nul(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.contains('\0') {
        return Err(ValidationError::NulCharacter(field.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("user.name@domain.co.uk").is_ok());
        assert!(validate_email(" test@example.com ").is_ok()); // trimmed
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(matches!(validate_email(""), Err(ValidationError::Empty(_))));
        assert!(matches!(
            validate_email("no-at-sign.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("a@b@c.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("@x.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("a@localhost"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("a@x..com"),
            Err(ValidationError::InvalidEmail(_))
        ));

        let long = format!("{}@x.com", "a".repeat(MAX_EMAIL_LENGTH));
        assert!(matches!(
            validate_email(&long),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_validate_message() {
        assert!(validate_message("hi").is_ok());
        assert!(matches!(validate_message("   "), Err(ValidationError::Empty(_))));

        let long = "x".repeat(MAX_MESSAGE_LENGTH + 1);
        assert!(matches!(
            validate_message(&long),
            Err(ValidationError::TooLong { actual, .. }) if actual == MAX_MESSAGE_LENGTH + 1
        ));

        assert!(matches!(
            validate_message("a\0b"),
            Err(ValidationError::NulCharacter(_))
        ));
    }

    #[test]
    fn test_validate_session_id() {
        assert!(validate_session_id("s1").is_ok());
        assert!(validate_session_id(&"x".repeat(MAX_SESSION_ID_LENGTH)).is_ok());
        assert!(matches!(validate_session_id(" "), Err(ValidationError::Empty(_))));
        assert!(matches!(
            validate_session_id("s\01"),
            Err(ValidationError::NulCharacter(_))
        ));

        let err = validate_session_id(&"x".repeat(100)).unwrap_err();
        assert_eq!(err.to_string(), "session ID is too long (100 chars, max 64)");
    }

    #[test]
    fn test_nul_rejected_in_email_and_comments() {
        assert!(matches!(
            validate_email("a\0@x.com"),
            Err(ValidationError::NulCharacter(_))
        ));
        assert!(matches!(
            validate_feedback(&Feedback {
                comments: Some("nice\0".to_string()),
                ..Feedback::default()
            }),
            Err(ValidationError::NulCharacter(_))
        ));
    }

    #[test]
    fn test_validate_feedback() {
        assert!(validate_feedback(&Feedback::default()).is_ok());
        assert!(validate_feedback(&Feedback {
            rating: Some(5),
            comments: Some("lovely".to_string()),
            helpful: Some(true),
        })
        .is_ok());

        let err = validate_feedback(&Feedback {
            rating: Some(6),
            ..Feedback::default()
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "rating must be between 1 and 5 (got 6)");

        assert!(matches!(
            validate_feedback(&Feedback {
                comments: Some("x".repeat(MAX_COMMENT_LENGTH + 1)),
                ..Feedback::default()
            }),
            Err(ValidationError::TooLong { .. })
        ));
    }
}
