use crate::error::{Error, Result};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

const MAX_ID_LEN: usize = 128;
const MAX_EMAIL_LEN: usize = 254;

fn validate_id(value: &str, kind: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidId(format!("{kind} must not be empty")));
    }
    if trimmed.len() > MAX_ID_LEN {
        return Err(Error::InvalidId(format!(
            "{kind} length must be <= {MAX_ID_LEN}"
        )));
    }
    if !trimmed.chars().all(is_allowed_id_char) {
        return Err(Error::InvalidId(format!("{kind} contains invalid characters")));
    }
    Ok(trimmed.to_string())
}

fn is_allowed_id_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, ':' | '_' | '-')
}

macro_rules! define_id_type {
    ($(#[$doc:meta])* $name:ident, $kind:expr) => {
        $(#[$doc])*
        #[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(String);

        impl $name {
            /// Creates a validated identifier.
            pub fn new(value: impl AsRef<str>) -> Result<Self> {
                validate_id(value.as_ref(), $kind).map(Self)
            }

            /// Creates an identifier from a trusted string without validation.
            pub fn from_string(value: String) -> Self {
                Self(value)
            }

            /// Returns the underlying string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<&str> for $name {
            type Error = Error;

            fn try_from(value: &str) -> Result<Self> {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::from_string(value)
            }
        }
    };
}

define_id_type!(
    /// Organization node identifier.
    NodeId,
    "node id"
);
define_id_type!(
    /// User identifier.
    UserId,
    "user id"
);

/// Email address, normalized to lowercase so that uniqueness is case-insensitive.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Email(String);

impl Email {
    /// Parses, trims and lowercases an email address.
    pub fn new(value: impl AsRef<str>) -> Result<Self> {
        let normalized = value.as_ref().trim().to_lowercase();
        if normalized.is_empty() {
            return Err(Error::InvalidEmail("email must not be empty".to_string()));
        }
        if normalized.len() > MAX_EMAIL_LEN {
            return Err(Error::InvalidEmail(format!(
                "email length must be <= {MAX_EMAIL_LEN}"
            )));
        }
        let Some((local, domain)) = normalized.split_once('@') else {
            return Err(Error::InvalidEmail("email must contain '@'".to_string()));
        };
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(Error::InvalidEmail(
                "email must be in local@domain format".to_string(),
            ));
        }
        if normalized.chars().any(char::is_whitespace) {
            return Err(Error::InvalidEmail(
                "email must not contain whitespace".to_string(),
            ));
        }
        Ok(Self(normalized))
    }

    /// Creates an email from a trusted, already normalized string.
    pub fn from_string(value: String) -> Self {
        Self(value)
    }

    /// Returns the underlying string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Email {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<String> for Email {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

/// User role.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Role {
    /// Regular staff member.
    Employee,
    /// Staff member allowed to manage other users.
    Manager,
}

impl Role {
    /// Returns the upper-case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "EMPLOYEE",
            Self::Manager => "MANAGER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "EMPLOYEE" => Ok(Self::Employee),
            "MANAGER" => Ok(Self::Manager),
            _ => Err(Error::InvalidValue(format!(
                "role must be EMPLOYEE or MANAGER, got {value:?}"
            ))),
        }
    }
}

/// Kind of organization node.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum NodeKind {
    /// Administrative office.
    Office,
    /// Retail store.
    Store,
}

impl NodeKind {
    /// Returns the upper-case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Office => "OFFICE",
            Self::Store => "STORE",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "OFFICE" => Ok(Self::Office),
            "STORE" => Ok(Self::Store),
            _ => Err(Error::InvalidValue(format!(
                "node kind must be OFFICE or STORE, got {value:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_rejects_malformed_input() {
        let err = NodeId::new("  ").expect_err("must reject");
        assert!(err.to_string().contains("node id"));

        let err = NodeId::new("node 1").expect_err("must reject");
        assert!(err.to_string().contains("invalid characters"));

        assert!(NodeId::new("x".repeat(MAX_ID_LEN + 1)).is_err());
    }

    #[test]
    fn node_id_trims_surrounding_whitespace() {
        let id = NodeId::new(" node_1 ").expect("node id");
        assert_eq!(id.as_str(), "node_1");
    }

    #[test]
    fn email_is_normalized_to_lowercase() {
        let email = Email::new("  A@Demo.RS ").expect("email");
        assert_eq!(email.as_str(), "a@demo.rs");
        assert_eq!(email, Email::new("a@demo.rs").unwrap());
    }

    #[test]
    fn email_requires_local_and_domain() {
        assert!(Email::new("demo.rs").is_err());
        assert!(Email::new("@demo.rs").is_err());
        assert!(Email::new("a@").is_err());
        assert!(Email::new("a@b@c").is_err());
        assert!(Email::new("a b@demo.rs").is_err());
    }

    #[test]
    fn role_and_kind_parse_wire_names() {
        assert_eq!("MANAGER".parse::<Role>().unwrap(), Role::Manager);
        assert_eq!("employee".parse::<Role>().unwrap(), Role::Employee);
        assert!("admin".parse::<Role>().is_err());
        assert_eq!("STORE".parse::<NodeKind>().unwrap(), NodeKind::Store);
        assert_eq!(NodeKind::Office.to_string(), "OFFICE");
    }
}
