//! Single-file MBOX archive (`Mails/inbox.mbox`).

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use super::attachment::write_attachment;
use super::{ArchiveLayout, Archiver, DateOptions};
use crate::model::attachment::AttachmentFile;
use crate::model::contact::{self, Contact};
use crate::model::mail::{MailRecord, MessageBody};

/// Appends every mail to one MBOX file in the `mboxrd` style.
pub struct MboxArchiver {
    layout: ArchiveLayout,
    dates: DateOptions,
    out: Option<BufWriter<File>>,
    count: u64,
}

impl MboxArchiver {
    pub fn new(layout: ArchiveLayout, dates: DateOptions) -> Self {
        Self {
            layout,
            dates,
            out: None,
            count: 0,
        }
    }

    /// Mails written so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    fn writer(&mut self) -> anyhow::Result<&mut BufWriter<File>> {
        if self.out.is_none() {
            let path = self.layout.mbox_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            tracing::info!(path = %path.display(), "Opened MBOX output");
            self.out = Some(BufWriter::new(file));
        }
        self.out
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("MBOX writer unavailable"))
    }
}

/// Render one mail as an MBOX entry, including the trailing blank line.
pub fn render_entry(mail: &MailRecord, body: &MessageBody, dates: &DateOptions) -> String {
    let date = mail.date();
    let from_addr = mail
        .sender
        .as_ref()
        .map(|c| c.email())
        .filter(|e| !e.is_empty())
        .unwrap_or("MAILER-DAEMON");

    let mut out = String::new();
    out.push_str(&format!(
        "From {} {}\n",
        header_value(from_addr),
        date.format("%a %b %e %H:%M:%S %Y")
    ));
    if let Some(sender) = &mail.sender {
        out.push_str(&format!("From: {}\n", header_value(&sender.display())));
    }
    let to = join(&mail.recipients);
    if !to.is_empty() {
        out.push_str(&format!("To: {}\n", header_value(&to)));
    }
    let cc = join(&mail.cc);
    if !cc.is_empty() {
        out.push_str(&format!("Cc: {}\n", header_value(&cc)));
    }
    out.push_str(&format!("Subject: {}\n", header_value(&mail.subject)));
    out.push_str(&format!("Date: {}\n", date.to_rfc2822()));
    out.push_str(&format!("X-Archive-Date: {}\n", header_value(&dates.display(date))));
    out.push_str(&format!("X-Record-Id: {}\n", mail.id));
    out.push_str("MIME-Version: 1.0\n");
    out.push_str("Content-Type: text/html; charset=utf-8\n");
    out.push('\n');

    for line in body.text().lines() {
        if is_from_line(line) {
            out.push('>');
        }
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
    out
}

impl Archiver for MboxArchiver {
    fn archive_mail(&mut self, mail: &MailRecord, body: &MessageBody) -> anyhow::Result<()> {
        let entry = render_entry(mail, body, &self.dates);
        self.writer()?.write_all(entry.as_bytes())?;
        self.count += 1;
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
        if let Some(out) = self.out.as_mut() {
            out.flush()?;
        }
        Ok(())
    }
}

/// `mboxrd` quoting: any line matching `^>*From ` gains one more `>`.
fn is_from_line(line: &str) -> bool {
    line.trim_start_matches('>').starts_with("From ")
}

/// Collapse line breaks so a value cannot inject extra headers.
fn header_value(s: &str) -> String {
    s.split(['\r', '\n'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn join(list: &[Option<Contact>]) -> String {
    contact::present(list)
        .map(Contact::display)
        .collect::<Vec<_>>()
        .join(", ")
}
