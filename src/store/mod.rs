//! Container store: the public entry point for decoding mail and attachment files.

pub mod reader;

pub use self::reader::MailStore;
