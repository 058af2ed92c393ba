//! Mail records and decoded message bodies.

use chrono::DateTime;

use super::contact::Contact;
use crate::olk15;

/// Metadata for a single mail, as enumerated from the backup database.
///
/// Only `subject` and `content_path` matter to the container decoder; the
/// remaining fields are passed through to the archivers.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MailRecord {
    /// Record id in the backup database. Used as the archived file name.
    pub id: u64,

    /// Subject line, exactly as the client stored it.
    #[serde(default)]
    pub subject: String,

    /// Send time as Unix seconds.
    pub time: i64,

    /// Sender, if the database has one.
    #[serde(default)]
    pub sender: Option<Contact>,

    /// Primary recipients. A single `null` entry means "no recipients".
    #[serde(default)]
    pub recipients: Vec<Option<Contact>>,

    /// Carbon-copy recipients.
    #[serde(default)]
    pub cc: Vec<Option<Contact>>,

    /// Container path relative to the backup profile directory.
    pub content_path: String,
}

impl MailRecord {
    /// Send time as a UTC timestamp, falling back to the Unix epoch when out of range.
    pub fn date(&self) -> DateTime<chrono::Utc> {
        DateTime::from_timestamp(self.time, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }
}

/// Message body recovered from a container.
///
/// The bytes are kept in the container's UTF-16LE form; [`MessageBody::text`]
/// decodes them lossily for embedding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageBody(Vec<u8>);

impl MessageBody {
    /// An empty body (subject not found, or nothing recoverable).
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Raw UTF-16LE bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume into the raw UTF-16LE bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decoded text with trailing NUL padding removed.
    pub fn text(&self) -> String {
        let mut text = olk15::decode_text(&self.0);
        let trimmed = text.trim_end_matches('\0').len();
        text.truncate(trimmed);
        text
    }
}

impl From<Vec<u8>> for MessageBody {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}
