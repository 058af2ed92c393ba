//! Core data model: mail records from the backup metadata, contacts,
//! decoded message bodies and attachments.

pub mod attachment;
pub mod contact;
pub mod mail;
