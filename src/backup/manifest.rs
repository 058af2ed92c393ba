//! Backup directory reader.
//!
//! Expected layout of a profile directory:
//!
//! ```text
//! <profile>/
//!   mails.json                  array of mail records (content_path relative to <profile>)
//!   Message Sources/...         message containers
//!   Message Attachments/...     attachment containers (walked recursively)
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::MetadataSource;
use crate::error::{ArchiveError, Result};
use crate::model::mail::MailRecord;

/// Manifest file name inside the profile directory.
pub const MANIFEST_FILE: &str = "mails.json";

/// Attachment folder name inside the profile directory.
pub const ATTACHMENTS_DIR: &str = "Message Attachments";

/// Environment variable naming the default profile directory.
pub const PROFILE_ENV: &str = "OLKARCHIVE_PROFILE";

/// A backup profile on disk.
#[derive(Debug, Clone)]
pub struct BackupDir {
    root: PathBuf,
}

impl BackupDir {
    /// Open a profile directory. Fails if it does not exist.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let meta = std::fs::metadata(&root).map_err(|e| ArchiveError::io(&root, e))?;
        if !meta.is_dir() {
            return Err(ArchiveError::Manifest {
                path: root,
                reason: "not a directory".into(),
            });
        }
        Ok(Self { root })
    }

    /// Resolve the profile from an explicit argument, then `$OLKARCHIVE_PROFILE`.
    pub fn locate(arg: Option<&Path>) -> Result<Self> {
        match arg {
            Some(path) => Self::open(path),
            None => match std::env::var_os(PROFILE_ENV) {
                Some(path) => Self::open(PathBuf::from(path)),
                None => Err(ArchiveError::Manifest {
                    path: PathBuf::from("."),
                    reason: format!("no profile directory given and ${PROFILE_ENV} is not set"),
                }),
            },
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn attachments_dir(&self) -> PathBuf {
        self.root.join(ATTACHMENTS_DIR)
    }
}

impl MetadataSource for BackupDir {
    fn mails(&self) -> Result<Vec<MailRecord>> {
        let path = self.manifest_path();
        let data = std::fs::read(&path).map_err(|e| ArchiveError::io(&path, e))?;
        let mails: Vec<MailRecord> =
            serde_json::from_slice(&data).map_err(|e| ArchiveError::Manifest {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        info!(path = %path.display(), count = mails.len(), "Loaded mail manifest");
        Ok(mails)
    }

    fn attachments(&self) -> Result<Vec<PathBuf>> {
        let dir = self.attachments_dir();
        if !dir.is_dir() {
            debug!(path = %dir.display(), "No attachment folder");
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        collect_files(&dir, &mut files)?;
        files.sort();
        info!(path = %dir.display(), count = files.len(), "Found attachment containers");
        Ok(files)
    }

    fn content_path(&self, mail: &MailRecord) -> PathBuf {
        self.root
            .join(mail.content_path.trim_start_matches(['/', '\\']))
    }

    fn root(&self) -> &Path {
        &self.root
    }
}

/// Recursively gather regular, non-hidden files below `dir`.
fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| ArchiveError::io(dir, e))?;
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "Unreadable directory entry");
                continue;
            }
        };
        let path = entry.path();
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        if path.is_dir() {
            collect_files(&path, out)?;
        } else if path.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_manifest_and_attachments() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join(MANIFEST_FILE),
            r#"[{"id": 1, "subject": "Hi", "time": 0, "sender": null,
                 "recipients": [null], "content_path": "/Message Sources/1.olk15Message"}]"#,
        )
        .unwrap();
        let att = tmp.path().join(ATTACHMENTS_DIR).join("0");
        std::fs::create_dir_all(&att).unwrap();
        std::fs::write(att.join("b"), b"").unwrap();
        std::fs::write(att.join("a"), b"").unwrap();
        std::fs::write(att.join(".DS_Store"), b"").unwrap();

        let backup = BackupDir::open(tmp.path()).unwrap();
        let mails = backup.mails().unwrap();
        assert_eq!(mails.len(), 1);
        assert_eq!(
            backup.content_path(&mails[0]),
            tmp.path().join("Message Sources/1.olk15Message")
        );

        let files = backup.attachments().unwrap();
        assert_eq!(files, vec![att.join("a"), att.join("b")]);
    }

    #[test]
    fn test_invalid_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(MANIFEST_FILE), "{not json").unwrap();
        let backup = BackupDir::open(tmp.path()).unwrap();
        assert!(matches!(
            backup.mails(),
            Err(ArchiveError::Manifest { .. })
        ));
    }

    #[test]
    fn test_missing_attachment_folder_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let backup = BackupDir::open(tmp.path()).unwrap();
        assert!(backup.attachments().unwrap().is_empty());
    }

    #[test]
    fn test_open_missing_dir() {
        assert!(matches!(
            BackupDir::open("/no/such/profile"),
            Err(ArchiveError::FileNotFound(_))
        ));
    }
}
