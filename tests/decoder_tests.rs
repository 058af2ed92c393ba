//! Integration tests for the container decoder and the store facade.

use std::path::{Path, PathBuf};

use olkarchive::error::{ArchiveError, FrameError};
use olkarchive::olk15::format::{LengthUnit, NameLayout};
use olkarchive::olk15::scanner::encode_utf16le;
use olkarchive::olk15::{self, FormatProfile};
use olkarchive::store::MailStore;

/// Attachment frame: the length counts bytes.
fn frame(payload: &[u8]) -> Vec<u8> {
    let mut out = (payload.len() as u32).to_le_bytes().to_vec();
    out.extend_from_slice(payload);
    out
}

/// Message frame: the length counts UTF-16 code units.
fn text_frame(payload: &[u8]) -> Vec<u8> {
    assert!(payload.len() % 2 == 0, "text frames hold whole code units");
    let mut out = ((payload.len() / 2) as u32).to_le_bytes().to_vec();
    out.extend_from_slice(payload);
    out
}

fn message_container(subject: &str, frames: &[&[u8]]) -> Vec<u8> {
    let mut buf = vec![0xA5; 32];
    buf.extend(encode_utf16le(subject));
    for payload in frames {
        buf.extend(text_frame(payload));
    }
    buf.extend([0, 0, 0, 0]);
    buf
}

fn attachment_container(name: &str, frames: &[&[u8]]) -> Vec<u8> {
    let mut buf = name.as_bytes().to_vec();
    buf.resize(256, 0);
    for payload in frames {
        buf.extend(frame(payload));
    }
    buf
}

fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

// ─── Message containers ─────────────────────────────────────────────

/// 32-byte header, "Hi", length 4, "test" (8 bytes), length 0.
fn hi_container() -> Vec<u8> {
    let mut buf = vec![0u8; 32];
    buf.extend([b'H', 0, b'i', 0]);
    buf.extend([4, 0, 0, 0]);
    buf.extend([b't', 0, b'e', 0, b's', 0, b't', 0]);
    buf.extend([0, 0, 0, 0]);
    buf
}

#[test]
fn test_hi_container_decodes_test() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write(tmp.path(), "1.olk15MsgSource", &hi_container());

    let body = MailStore::default().get_mail_content(&path, "Hi").unwrap();
    assert_eq!(body.text(), "test");
    assert_eq!(body.as_bytes(), encode_utf16le("test").as_slice());
}

#[test]
fn test_byte_length_profile() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write(tmp.path(), "units.olk15MsgSource", &hi_container());
    let store = MailStore::new(FormatProfile {
        text_length_unit: LengthUnit::Bytes,
        ..FormatProfile::default()
    });
    // Four bytes cover "te"; the next "length" is the text "st".
    assert_eq!(store.get_mail_content(&path, "Hi").unwrap().text(), "te");

    let mut buf = vec![0u8; 32];
    buf.extend(encode_utf16le("Hi"));
    buf.extend(frame(&encode_utf16le("test")));
    buf.extend(frame(&[]));
    let path = write(tmp.path(), "bytes.olk15MsgSource", &buf);
    assert_eq!(store.get_mail_content(&path, "Hi").unwrap().text(), "test");
}

#[test]
fn test_frames_concatenate_byte_for_byte() {
    let payloads: Vec<Vec<u8>> = (0..7u8)
        .map(|i| (0..2 * (i + 1)).map(|b| b.wrapping_mul(37)).collect())
        .collect();
    let refs: Vec<&[u8]> = payloads.iter().map(Vec::as_slice).collect();
    let buf = message_container("Quarterly report", &refs);

    let out = olk15::decode_message(&buf, "Quarterly report", &FormatProfile::default()).unwrap();
    assert_eq!(out, payloads.concat());
}

#[test]
fn test_missing_subject_is_empty_not_error() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write(
        tmp.path(),
        "2.olk15MsgSource",
        &message_container("Hi", &[encode_utf16le("test").as_slice()]),
    );

    let body = MailStore::default()
        .get_mail_content(&path, "Not the subject")
        .unwrap();
    assert!(body.is_empty());
    assert_eq!(body.text(), "");
}

#[test]
fn test_subject_echo_in_header_is_skipped() {
    let mut buf = Vec::new();
    buf.extend(encode_utf16le("Hi"));
    buf.resize(32, 0);
    buf.extend(encode_utf16le("Hi"));
    buf.extend(text_frame(&encode_utf16le("body")));
    buf.extend([0, 0, 0, 0]);

    let out = olk15::decode_message(&buf, "Hi", &FormatProfile::default()).unwrap();
    assert_eq!(olk15::decode_text(&out), "body");
}

#[test]
fn test_decoding_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write(
        tmp.path(),
        "3.olk15MsgSource",
        &message_container("Re: lunch", &[encode_utf16le("see ").as_slice(), encode_utf16le("you").as_slice()]),
    );

    let store = MailStore::default();
    let first = store.get_mail_content(&path, "Re: lunch").unwrap();
    let second = store.get_mail_content(&path, "Re: lunch").unwrap();
    assert_eq!(first, second);
    assert_eq!(first.text(), "see you");
}

#[test]
fn test_truncated_frame_keeps_partial_body() {
    let mut buf = message_container("Hi", &[encode_utf16le("kept").as_slice()]);
    // Replace the sentinel with a frame declaring more than remains.
    buf.truncate(buf.len() - 4);
    buf.extend(10u32.to_le_bytes());
    buf.extend(encode_utf16le("cut"));

    assert!(matches!(
        olk15::decode_message(&buf, "Hi", &FormatProfile::default()),
        Err(ArchiveError::Frame(FrameError::Truncated { .. }))
    ));

    let body = MailStore::default().extract_mail(Path::new("t"), &buf, "Hi");
    assert_eq!(body.text(), "kept");
}

#[test]
fn test_runaway_extraction_is_bounded() {
    let unit = [1u8, 1];
    let refs: Vec<&[u8]> = std::iter::repeat(&unit[..]).take(10).collect();
    let buf = message_container("Hi", &refs);
    let profile = FormatProfile {
        max_frames: 4,
        ..FormatProfile::default()
    };

    let err = olk15::decode_message(&buf, "Hi", &profile).unwrap_err();
    assert!(matches!(
        err,
        ArchiveError::Frame(FrameError::RunawayExtraction { frames: 4, .. })
    ));
    assert!(err.is_recoverable());

    let body = MailStore::new(profile).extract_mail(Path::new("r"), &buf, "Hi");
    assert_eq!(body.as_bytes(), &[1u8; 8]);
}

#[test]
fn test_missing_file_is_error() {
    let tmp = tempfile::tempdir().unwrap();
    let err = MailStore::default()
        .get_mail_content(tmp.path().join("absent"), "Hi")
        .unwrap_err();
    assert!(matches!(err, ArchiveError::FileNotFound(_)));
}

#[test]
fn test_length_error_boundary() {
    // 40-byte container; the frame field sits at offset 36, 0 bytes follow it.
    let mut buf = vec![0u8; 32];
    buf.extend(encode_utf16le("Hi"));
    let profile = FormatProfile {
        text_length_unit: LengthUnit::Bytes,
        ..FormatProfile::default()
    };

    // Up to the container size: plausible but past the end.
    let mut at_ceiling = buf.clone();
    at_ceiling.extend(36u32.to_le_bytes());
    assert!(matches!(
        olk15::decode_message(&at_ceiling, "Hi", &profile),
        Err(ArchiveError::Frame(FrameError::Truncated { offset: 36, .. }))
    ));

    // One byte more than the container holds.
    let mut over = buf.clone();
    over.extend(41u32.to_le_bytes());
    assert!(matches!(
        olk15::decode_message(&over, "Hi", &profile),
        Err(ArchiveError::Frame(FrameError::UnreasonableLength {
            offset: 36,
            length: 41,
            ceiling: 40
        }))
    ));
}

#[test]
fn test_unusable_profiles_do_not_panic() {
    let tmp = tempfile::tempdir().unwrap();
    let att = write(tmp.path(), "5.olk15MsgAttachment", &[7, 0, 0, 0]);
    let store = MailStore::new(FormatProfile {
        name_layout: NameLayout::LengthPrefixed,
        name_width: 1,
        ..FormatProfile::default()
    });
    let file = store.get_file_content(&att).unwrap();
    assert!(file.is_empty());
    assert_eq!(file.name, "5");

    let msg = write(tmp.path(), "6.olk15MsgSource", &hi_container());
    for length_width in [0, 12] {
        let store = MailStore::new(FormatProfile {
            length_width,
            ..FormatProfile::default()
        });
        assert!(store.get_mail_content(&msg, "Hi").unwrap().is_empty());
        assert!(matches!(
            olk15::decode_message(&hi_container(), "Hi", store.profile()),
            Err(ArchiveError::Frame(FrameError::InvalidLayout { .. }))
        ));
    }
}

// ─── Attachment containers ──────────────────────────────────────────

#[test]
fn test_report_pdf_attachment() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write(
        tmp.path(),
        "9.olk15MsgAttachment",
        &attachment_container("report.pdf", &[&[0x01u8, 0x02, 0x03][..]]),
    );

    let file = MailStore::default().get_file_content(&path).unwrap();
    assert_eq!(file.data, vec![0x01, 0x02, 0x03]);
    assert_eq!(file.name, "report.pdf");
}

#[test]
fn test_zero_length_attachment() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write(
        tmp.path(),
        "10.olk15MsgAttachment",
        &attachment_container("empty.txt", &[&[][..]]),
    );

    let file = MailStore::default().get_file_content(&path).unwrap();
    assert!(file.is_empty());
    assert_eq!(file.name, "empty.txt");
}

#[test]
fn test_attachment_frames_concatenate() {
    let buf = attachment_container("a.bin", &[&b"abc"[..], &b"de"[..], &b"f"[..]]);
    let raw = olk15::decode_attachment(&buf, &FormatProfile::default()).unwrap();
    assert_eq!(raw.data, b"abcdef");
    assert_eq!(raw.name.as_deref(), Some("a.bin"));
}

#[test]
fn test_utf16_length_prefixed_name() {
    let profile = FormatProfile {
        name_layout: NameLayout::LengthPrefixed,
        name_width: 64,
        ..FormatProfile::default()
    };
    let name = encode_utf16le("résumé.docx");
    let mut buf = (name.len() as u16).to_le_bytes().to_vec();
    buf.extend(&name);
    buf.resize(64, 0);
    buf.extend(frame(b"PK"));

    let raw = olk15::decode_attachment(&buf, &profile).unwrap();
    assert_eq!(raw.name.as_deref(), Some("résumé.docx"));
    assert_eq!(raw.data, b"PK");
}

#[test]
fn test_malformed_attachment_falls_back() {
    let mut buf = attachment_container("broken.zip", &[]);
    buf.extend(1000u32.to_le_bytes());
    buf.extend([1, 2, 3]);

    let tmp = tempfile::tempdir().unwrap();
    let path = write(tmp.path(), "11.olk15MsgAttachment", &buf);
    let file = MailStore::default().get_file_content(&path).unwrap();
    assert!(file.is_empty());
    assert_eq!(file.name, "broken.zip");

    let nameless = write(tmp.path(), "12.olk15MsgAttachment", &[0u8; 10]);
    let file = MailStore::default().get_file_content(&nameless).unwrap();
    assert!(file.is_empty());
    assert_eq!(file.name, "12");
}

#[test]
fn test_wide_cjk_name() {
    let mut buf = encode_utf16le("報告書.pdf");
    buf.resize(256, 0);
    buf.extend(frame(b"%PDF"));
    let raw = olk15::decode_attachment(&buf, &FormatProfile::default()).unwrap();
    assert_eq!(raw.name.as_deref(), Some("報告書.pdf"));
    assert_eq!(raw.data, b"%PDF");
}
