//! One HTML page per mail, bucketed by date.

use std::path::PathBuf;

use tracing::debug;

use super::attachment::write_attachment;
use super::index::{ArchiveIndex, IndexEntry};
use super::{ArchiveLayout, Archiver, DateOptions};
use crate::model::attachment::AttachmentFile;
use crate::model::contact::{self, Contact};
use crate::model::mail::{MailRecord, MessageBody};

/// Writes `Mails/YYYY/MM/DD/<id>.html` pages and the root `index.html`.
pub struct HtmlArchiver {
    layout: ArchiveLayout,
    dates: DateOptions,
    index: ArchiveIndex,
}

impl HtmlArchiver {
    pub fn new(layout: ArchiveLayout, dates: DateOptions) -> Self {
        Self {
            layout,
            dates,
            index: ArchiveIndex::new(),
        }
    }

    /// Mails archived so far.
    pub fn index(&self) -> &ArchiveIndex {
        &self.index
    }

    /// Render the page for one mail.
    pub fn render_mail(&self, mail: &MailRecord, body: &MessageBody) -> String {
        let mut html = String::new();
        html.push_str("<html>\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(
            "<link rel=\"stylesheet\" href=\"../../../../static/css/custom.css\">\n</head>\n<body>\n",
        );
        html.push_str(&self.render_meta(mail));
        html.push_str("\n<div class=\"bordermail\">\n");
        html.push_str(&body.text());
        html.push_str("\n</div>\n</body>\n</html>\n");
        html
    }

    fn render_meta(&self, mail: &MailRecord) -> String {
        let sender = mail.sender.as_ref().map(contact_html).unwrap_or_default();
        let recipients = join_contacts(&mail.recipients);
        let cc = join_contacts(&mail.cc);
        format!(
            "\n<div class=\"bordermeta\">\n<p>\nSubject: <b>{subject}</b>\n</p>\n\
             <p>\nFrom: {sender}\n</p>\n<p>\nTo: {recipients}\n</p>\n\
             <p>\nCC: {cc}\n</p>\n<p>\nDate: {date}\n</p>\n</div>\n",
            subject = escape_html(&mail.subject),
            date = escape_html(&self.dates.display(mail.date())),
        )
    }
}

impl Archiver for HtmlArchiver {
    fn archive_mail(&mut self, mail: &MailRecord, body: &MessageBody) -> anyhow::Result<()> {
        let (year, month, day) = self.dates.bucket(mail.date());
        let dir: PathBuf = self
            .layout
            .mails_dir()
            .join(&year)
            .join(&month)
            .join(&day);
        std::fs::create_dir_all(&dir)?;

        let path = dir.join(format!("{}.html", mail.id));
        std::fs::write(&path, self.render_mail(mail, body))?;
        debug!(path = %path.display(), "Mail page written");

        self.index.insert(
            &year,
            &month,
            &day,
            IndexEntry {
                path: ArchiveLayout::mail_link(&year, &month, &day, mail.id),
                subject: mail.subject.clone(),
                id: mail.id,
            },
        );
        Ok(())
    }

    fn archive_attachment(
        &mut self,
        file: &AttachmentFile,
        seq: usize,
    ) -> anyhow::Result<Option<PathBuf>> {
        write_attachment(&self.layout.attachments_dir(), file, seq)
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        self.index.write(&self.layout)
    }
}

fn contact_html(c: &Contact) -> String {
    format!(
        "<b>{}</b> - <b>{}</b>",
        escape_html(c.name()),
        escape_html(c.email())
    )
}

fn join_contacts(list: &[Option<Contact>]) -> String {
    contact::present(list)
        .map(contact_html)
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
