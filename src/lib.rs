//! `olkarchive` - migrate an Outlook for Mac (OLK15) backup into a browsable archive.
//!
//! The core of the crate is [`olk15`], a decoder for the undocumented binary
//! containers that hold mail bodies and attachments, exposed through the
//! [`store::MailStore`] facade. The remaining modules read the backup
//! metadata, drive extraction in parallel and write HTML or MBOX archives.

pub mod archive;
pub mod backup;
pub mod batch;
pub mod config;
pub mod error;
pub mod model;
pub mod olk15;
pub mod store;
