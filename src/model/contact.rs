//! Sender and recipient entries as stored in the backup metadata.

/// A contact attached to a mail record.
///
/// Either part may be missing in the backup database.
///
/// # Examples
/// - `{name: "Juan García", email: "juan@ejemplo.com"}` → `"Juan García <juan@ejemplo.com>"`
/// - `{name: null, email: "user@example.com"}` → `"user@example.com"`
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Contact {
    /// Human-readable display name.
    #[serde(default)]
    pub name: Option<String>,
    /// The bare email address (`user@domain`).
    #[serde(default)]
    pub email: Option<String>,
}

impl Contact {
    /// Create a contact from a display name and address.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
        }
    }

    /// Display name, or an empty string.
    pub fn name(&self) -> &str {
        self.name.as_deref().map(str::trim).unwrap_or("")
    }

    /// Email address, or an empty string.
    pub fn email(&self) -> &str {
        self.email.as_deref().map(str::trim).unwrap_or("")
    }

    /// Format for display: `"Display Name <address>"`, or whichever part exists.
    pub fn display(&self) -> String {
        match (self.name(), self.email()) {
            ("", email) => email.to_string(),
            (name, "") => name.to_string(),
            (name, email) => format!("{name} <{email}>"),
        }
    }

    /// `true` if neither a name nor an address is present.
    pub fn is_empty(&self) -> bool {
        self.name().is_empty() && self.email().is_empty()
    }
}

impl std::fmt::Display for Contact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Flatten a recipient list where `null` entries mean "nobody".
pub fn present(list: &[Option<Contact>]) -> impl Iterator<Item = &Contact> {
    list.iter().flatten().filter(|c| !c.is_empty())
}
