//! Backup profile access: mail metadata and attachment container discovery.

pub mod manifest;

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::mail::MailRecord;

pub use self::manifest::BackupDir;

/// Enumerates mail records and attachment containers of one backup.
pub trait MetadataSource {
    /// All mail records, in database order.
    fn mails(&self) -> Result<Vec<MailRecord>>;

    /// Attachment container paths, in a stable order.
    fn attachments(&self) -> Result<Vec<PathBuf>>;

    /// Absolute path of a record's message container.
    fn content_path(&self, mail: &MailRecord) -> PathBuf;

    /// Root directory of the backup profile.
    fn root(&self) -> &Path;
}
