//! Archive output: HTML tree with index, MBOX, attachments.
//!
//! ```text
//! <root>/
//!   index.html
//!   static/css/custom.css
//!   Mails/YYYY/MM/DD/<id>.html     (html format)
//!   Mails/inbox.mbox               (mbox format)
//!   Attachments/<n>_<name>
//! ```

pub mod attachment;
pub mod html;
pub mod index;
pub mod mbox;
pub mod style;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::attachment::AttachmentFile;
use crate::model::mail::{MailRecord, MessageBody};

/// Output format of an archive run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    Html,
    Mbox,
}

/// Time zone used to bucket and print mail dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeZoneChoice {
    Local,
    Utc,
}

/// Explicit date formatting settings handed to every archiver.
#[derive(Debug, Clone)]
pub struct DateOptions {
    pub time_zone: TimeZoneChoice,
    /// `strftime` format for the date shown in archived mails.
    pub date_format: String,
}

impl Default for DateOptions {
    fn default() -> Self {
        Self {
            time_zone: TimeZoneChoice::Local,
            date_format: "%H:%M:%S %d/%m/%Y".to_string(),
        }
    }
}

impl DateOptions {
    /// Wall-clock time of `date` in the configured zone.
    pub fn local(&self, date: DateTime<Utc>) -> NaiveDateTime {
        match self.time_zone {
            TimeZoneChoice::Utc => date.naive_utc(),
            TimeZoneChoice::Local => date.with_timezone(&Local).naive_local(),
        }
    }

    /// Zero-padded `(year, month, day)` directory components.
    pub fn bucket(&self, date: DateTime<Utc>) -> (String, String, String) {
        let t = self.local(date);
        (
            format!("{:04}", t.year()),
            format!("{:02}", t.month()),
            format!("{:02}", t.day()),
        )
    }

    /// Display text for `date`.
    pub fn display(&self, date: DateTime<Utc>) -> String {
        self.local(date).format(&self.date_format).to_string()
    }
}

/// Paths inside an archive root.
#[derive(Debug, Clone)]
pub struct ArchiveLayout {
    root: PathBuf,
}

impl ArchiveLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mails_dir(&self) -> PathBuf {
        self.root.join("Mails")
    }

    pub fn attachments_dir(&self) -> PathBuf {
        self.root.join("Attachments")
    }

    pub fn stylesheet_path(&self) -> PathBuf {
        self.root.join("static").join("css").join("custom.css")
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join("index.html")
    }

    pub fn mbox_path(&self) -> PathBuf {
        self.mails_dir().join("inbox.mbox")
    }

    /// Relative link from the archive root to a mail page.
    pub fn mail_link(year: &str, month: &str, day: &str, id: u64) -> String {
        format!("Mails/{year}/{month}/{day}/{id}.html")
    }

    /// `true` if a previous run left mails behind.
    pub fn has_previous_run(&self) -> bool {
        self.mails_dir().is_dir()
    }

    /// Remove mails from a previous run.
    pub fn clear_mails(&self) -> std::io::Result<()> {
        let dir = self.mails_dir();
        if dir.is_dir() {
            tracing::info!(path = %dir.display(), "Removing previous mails");
            std::fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }
}

/// Destination for decoded mails and attachments.
pub trait Archiver {
    /// Store one mail with its decoded body.
    fn archive_mail(&mut self, mail: &MailRecord, body: &MessageBody) -> anyhow::Result<()>;

    /// Store one attachment; `seq` disambiguates equal names. Empty payloads
    /// are skipped and return `None`.
    fn archive_attachment(
        &mut self,
        file: &AttachmentFile,
        seq: usize,
    ) -> anyhow::Result<Option<PathBuf>>;

    /// Flush buffers and write any index pages.
    fn finish(&mut self) -> anyhow::Result<()>;
}

/// Create the archiver for `format` rooted at `layout`.
pub fn create_archiver(
    format: ArchiveFormat,
    layout: ArchiveLayout,
    dates: DateOptions,
) -> Box<dyn Archiver> {
    match format {
        ArchiveFormat::Html => Box::new(html::HtmlArchiver::new(layout, dates)),
        ArchiveFormat::Mbox => Box::new(mbox::MboxArchiver::new(layout, dates)),
    }
}
