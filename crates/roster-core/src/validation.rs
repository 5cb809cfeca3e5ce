//! Declarative field constraints for student input.
//!
//! Rules are plain data: each field carries an ordered list of constraints
//! with the message shown when one fails. Only the first failing constraint
//! per field is reported. Validation never touches the store.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{FieldError, Result, RosterError};
use crate::model::{NewStudent, StudentPatch};

/// Pattern for syntactically valid email addresses.
const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$";

static EMAIL_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(EMAIL_PATTERN).ok());

// ============================================================================
// Constraints and rules
// ============================================================================

/// A single shape check on a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Value must not be blank.
    Required,
    /// Value must have at least this many characters.
    MinLen(usize),
    /// Value must be a syntactically valid email address.
    Email,
    /// Value must consist of ASCII digits only.
    Digits,
}

impl Constraint {
    /// Returns `true` if `value` satisfies this constraint.
    #[must_use]
    pub fn check(self, value: &str) -> bool {
        match self {
            Self::Required => !value.trim().is_empty(),
            Self::MinLen(min) => value.chars().count() >= min,
            Self::Email => EMAIL_RE.as_ref().is_some_and(|re| re.is_match(value)),
            Self::Digits => value.bytes().all(|b| b.is_ascii_digit()),
        }
    }
}

/// The constraints attached to one field.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    /// Wire name of the field.
    pub field: &'static str,
    /// Constraints in evaluation order, each with its failure message.
    pub checks: &'static [(Constraint, &'static str)],
}

/// Rules shared by registration, edit and the HTTP surface.
pub const STUDENT_RULES: &[FieldRule] = &[
    FieldRule {
        field: "firstName",
        checks: &[(
            Constraint::MinLen(2),
            "First name must be at least 2 characters",
        )],
    },
    FieldRule {
        field: "lastName",
        checks: &[(
            Constraint::MinLen(2),
            "Last name must be at least 2 characters",
        )],
    },
    FieldRule {
        field: "email",
        checks: &[(Constraint::Email, "Invalid email address")],
    },
    FieldRule {
        field: "studentId",
        checks: &[(
            Constraint::MinLen(5),
            "Student ID must be at least 5 characters",
        )],
    },
    FieldRule {
        field: "contactNumber",
        checks: &[
            (
                Constraint::MinLen(10),
                "Contact number must be at least 10 digits",
            ),
            (Constraint::Digits, "Contact number must contain digits only"),
        ],
    },
    FieldRule {
        field: "course",
        checks: &[(Constraint::Required, "Please select a course")],
    },
];

/// Section rule, applied wherever the section is user-chosen or stored.
pub const SECTION_RULE: FieldRule = FieldRule {
    field: "section",
    checks: &[(Constraint::Required, "Please select a section")],
};

// ============================================================================
// Field sources
// ============================================================================

/// Anything whose fields can be looked up by wire name.
///
/// Returning `None` means the field is absent and its rule is skipped.
pub trait FieldSource {
    /// Current value of `field`, if present.
    fn field(&self, field: &str) -> Option<&str>;
}

impl FieldSource for NewStudent {
    fn field(&self, field: &str) -> Option<&str> {
        let value = match field {
            "firstName" => &self.first_name,
            "lastName" => &self.last_name,
            "email" => &self.email,
            "studentId" => &self.student_id,
            "contactNumber" => &self.contact_number,
            "course" => &self.course,
            "section" => &self.section,
            _ => return None,
        };
        Some(value.as_str())
    }
}

impl FieldSource for StudentPatch {
    fn field(&self, field: &str) -> Option<&str> {
        let value = match field {
            "firstName" => &self.first_name,
            "lastName" => &self.last_name,
            "email" => &self.email,
            "studentId" => &self.student_id,
            "contactNumber" => &self.contact_number,
            "course" => &self.course,
            "section" => &self.section,
            _ => return None,
        };
        value.as_deref()
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Evaluates `rules` against `source`, returning one error per failing field.
pub fn evaluate<'a>(
    rules: impl IntoIterator<Item = &'a FieldRule>,
    source: &impl FieldSource,
) -> Vec<FieldError> {
    rules
        .into_iter()
        .filter_map(|rule| {
            let value = source.field(rule.field)?;
            rule.checks
                .iter()
                .find(|(constraint, _)| !constraint.check(value))
                .map(|(_, message)| FieldError::new(rule.field, *message))
        })
        .collect()
}

/// Converts a list of field errors into a `Result`.
pub fn into_result(errors: Vec<FieldError>) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(RosterError::validation(errors))
    }
}

/// Validates a full creation body, section included.
pub fn validate_new_student(new: &NewStudent) -> Result<()> {
    into_result(evaluate(
        STUDENT_RULES.iter().chain(std::iter::once(&SECTION_RULE)),
        new,
    ))
}

/// Validates only the fields present in `patch`.
pub fn validate_patch(patch: &StudentPatch) -> Result<()> {
    into_result(evaluate(
        STUDENT_RULES.iter().chain(std::iter::once(&SECTION_RULE)),
        patch,
    ))
}
