//! Strongly-typed value objects used by domain entities.
//!
//! These wrappers enforce basic invariants (e.g., positive identifiers,
//! normalized/validated email, well-formed controller keys) so that once a
//! value reaches the domain layer it can be treated as trusted.
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::str::FromStr;

use phonenumber::{Mode, parse};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::ValidateEmail;

/// Errors produced when attempting to construct a constrained value object.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeConstraintError {
    /// Provided identifier is zero or negative.
    #[error("id must be greater than zero")]
    NonPositiveId,
    /// Provided email failed format validation.
    #[error("invalid email address")]
    InvalidEmail,
    /// Provided string contained no non-whitespace characters.
    #[error("value cannot be empty")]
    EmptyString,
    /// Provided value failed custom validation.
    #[error("invalid value: {0}")]
    InvalidValue(String),
    /// Phone number did not meet expected format.
    #[error("invalid phone number")]
    InvalidPhone,
    /// Controller or action key contained unsupported characters.
    #[error("invalid key: {0}")]
    InvalidKey(String),
}

/// Normalizes and validates an email string.
fn normalize_email<S: Into<String>>(email: S) -> Result<String, TypeConstraintError> {
    let normalized = email.into().trim().to_lowercase();
    if normalized.validate_email() {
        Ok(normalized)
    } else {
        Err(TypeConstraintError::InvalidEmail)
    }
}

/// Macro to generate lightweight newtypes for positive identifiers.
macro_rules! id_newtype {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(i32);

        impl $name {
            /// Creates a new identifier ensuring it is greater than zero.
            pub fn new(value: i32) -> Result<Self, TypeConstraintError> {
                if value > 0 {
                    Ok(Self(value))
                } else {
                    Err(TypeConstraintError::NonPositiveId)
                }
            }

            /// Returns the raw `i32` backing this identifier.
            pub const fn get(self) -> i32 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<i32> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

id_newtype!(UserId, "Unique identifier for a user.");
id_newtype!(RoleId, "Unique identifier for a role.");
id_newtype!(PermissionId, "Unique identifier for a permission.");
id_newtype!(PermissionGroupId, "Unique identifier for a permission group.");
id_newtype!(EmployeeId, "Unique identifier for an employee.");
id_newtype!(EnquiryId, "Unique identifier for an enquiry.");

/// Lower-cased and validated email address.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// Validates and normalizes an email string.
    pub fn new<S: Into<String>>(email: S) -> Result<Self, TypeConstraintError> {
        let normalized = normalize_email(email)?;
        Ok(Self(normalized))
    }

    /// Borrow the email as a `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into the owned inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = TypeConstraintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Email {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

/// Wrapper for non-empty, trimmed strings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Trims whitespace and rejects empty inputs.
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let trimmed = value.into().trim().to_string();
        if trimmed.is_empty() {
            return Err(TypeConstraintError::EmptyString);
        }
        Ok(Self(trimmed))
    }

    /// Borrow the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper returning the owned string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

macro_rules! non_empty_string_newtype {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// Constructs a trimmed, non-empty value.
            pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
                let inner = NonEmptyString::new(value)?;
                Ok(Self(inner.into_inner()))
            }

            /// Borrow the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the owned string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

non_empty_string_newtype!(PersonName, "Display name of a user, employee or enquirer.");
non_empty_string_newtype!(RoleName, "Role name enforcing trimmed, non-empty values.");
non_empty_string_newtype!(
    PermissionName,
    "Permission name enforcing trimmed, non-empty values."
);
non_empty_string_newtype!(
    PermissionGroupName,
    "Permission group label enforcing trimmed, non-empty values."
);
non_empty_string_newtype!(EmployeeCode, "Unique employee code.");

/// Validates a lower-case, kebab-case key such as `permission-groups`.
fn normalize_key(value: &str) -> Result<String, TypeConstraintError> {
    let key = value.trim().to_lowercase();
    if key.is_empty() {
        return Err(TypeConstraintError::EmptyString);
    }
    let valid = key
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        && !key.starts_with('-')
        && !key.ends_with('-');
    if valid {
        Ok(key)
    } else {
        Err(TypeConstraintError::InvalidKey(key))
    }
}

macro_rules! key_newtype {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// Lower-cases the input and checks it only holds `[a-z0-9_-]`.
            pub fn new<S: AsRef<str>>(value: S) -> Result<Self, TypeConstraintError> {
                Ok(Self(normalize_key(value.as_ref())?))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

key_newtype!(
    ControllerKey,
    "Resource key naming the controller a route belongs to, e.g. `users`."
);
key_newtype!(
    ActionName,
    "Controller action such as `index`, `store` or `toggle-status`."
);

/// Parses a comma separated list of actions into a sorted, deduplicated set.
///
/// Empty entries are skipped; invalid ones fail the whole list.
pub fn parse_actions(value: &str) -> Result<Vec<ActionName>, TypeConstraintError> {
    let mut actions = value
        .split([',', '\n'])
        .map(str::trim)
        .filter(|action| !action.is_empty())
        .map(ActionName::new)
        .collect::<Result<Vec<_>, _>>()?;
    actions.sort();
    actions.dedup();
    Ok(actions)
}

/// Joins actions back into the comma separated storage form.
pub fn join_actions(actions: &[ActionName]) -> String {
    actions
        .iter()
        .map(ActionName::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

/// Authentication context a role or permission applies to.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Guard {
    #[default]
    Web,
    Api,
}

impl Guard {
    pub const fn as_str(self) -> &'static str {
        match self {
            Guard::Web => "web",
            Guard::Api => "api",
        }
    }
}

impl Display for Guard {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Guard {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "web" => Ok(Guard::Web),
            "api" => Ok(Guard::Api),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unknown guard `{other}`"
            ))),
        }
    }
}

/// Account status checked before any permission lookup.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
}

impl UserStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
        }
    }

    pub const fn is_active(self) -> bool {
        matches!(self, UserStatus::Active)
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            UserStatus::Active => UserStatus::Inactive,
            UserStatus::Inactive => UserStatus::Active,
        }
    }
}

impl Display for UserStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Legacy rows store the status as 1/0.
        match s.trim() {
            "active" | "1" => Ok(UserStatus::Active),
            "inactive" | "0" => Ok(UserStatus::Inactive),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unknown status `{other}`"
            ))),
        }
    }
}

/// Normalizes a phone number string to E.164 format.
pub fn normalize_phone_to_e164(value: &str) -> Result<String, TypeConstraintError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TypeConstraintError::EmptyString);
    }
    let parsed = parse(None, trimmed).map_err(|_| TypeConstraintError::InvalidPhone)?;
    Ok(parsed.format().mode(Mode::E164).to_string())
}

/// Normalized phone number wrapper (expected E.164).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Constructs a phone number ensuring it is valid and normalizes to E.164 format.
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let normalized = normalize_phone_to_e164(&value.into())?;
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for PhoneNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = TypeConstraintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for PhoneNumber {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Free text submitted by visitors, sanitized of markup.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SanitizedText(String);

impl SanitizedText {
    /// Constructs a sanitized, trimmed, non-empty value.
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let sanitized = ammonia::clean(&value.into());
        let inner = NonEmptyString::new(sanitized)?;
        Ok(Self(inner.into_inner()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for SanitizedText {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trims optional text and drops it when empty.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_positive() {
        assert!(UserId::new(1).is_ok());
        assert_eq!(UserId::new(0), Err(TypeConstraintError::NonPositiveId));
        assert_eq!(RoleId::new(-3), Err(TypeConstraintError::NonPositiveId));
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        let email = Email::new("  Admin@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "admin@example.com");
        assert_eq!(Email::new("nope"), Err(TypeConstraintError::InvalidEmail));
    }

    #[test]
    fn controller_keys_are_kebab_case() {
        assert_eq!(
            ControllerKey::new(" Permission-Groups ").unwrap().as_str(),
            "permission-groups"
        );
        assert!(matches!(
            ControllerKey::new("users/1"),
            Err(TypeConstraintError::InvalidKey(_))
        ));
        assert_eq!(ControllerKey::new("  "), Err(TypeConstraintError::EmptyString));
    }

    #[test]
    fn actions_are_normalized() {
        let actions = parse_actions(" Show, index,,index\nstore ").unwrap();
        assert_eq!(join_actions(&actions), "index,show,store");
        assert!(parse_actions("index, bad action").is_err());
        assert!(parse_actions("").unwrap().is_empty());
    }

    #[test]
    fn status_parses_legacy_values() {
        assert_eq!("1".parse::<UserStatus>().unwrap(), UserStatus::Active);
        assert_eq!("inactive".parse::<UserStatus>().unwrap(), UserStatus::Inactive);
        assert!("banned".parse::<UserStatus>().is_err());
        assert_eq!(UserStatus::Active.toggled(), UserStatus::Inactive);
    }

    #[test]
    fn guard_round_trips_through_str() {
        assert_eq!("api".parse::<Guard>().unwrap(), Guard::Api);
        assert_eq!(Guard::Web.to_string(), "web");
        assert!("admin".parse::<Guard>().is_err());
    }

    #[test]
    fn sanitized_text_strips_scripts() {
        let text = SanitizedText::new("<script>alert(1)</script>Hello <b>there</b>").unwrap();
        assert_eq!(text.as_str(), "Hello <b>there</b>");
        assert!(SanitizedText::new("<script>x</script>").is_err());
    }

    #[test]
    fn phone_is_normalized() {
        let phone = PhoneNumber::new("+1 (415) 555-2671").unwrap();
        assert_eq!(phone.as_str(), "+14155552671");
        assert_eq!(PhoneNumber::new("abc"), Err(TypeConstraintError::InvalidPhone));
    }
}
