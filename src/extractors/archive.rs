// src/extractors/archive.rs

use crate::utils::error::ExtractError;
use encoding_rs::{SHIFT_JIS, UTF_16LE};
use std::io::{Cursor, Read};

const CSV_SUFFIX: &str = ".csv";

/// One CSV file pulled out of a document archive, already decoded to text.
#[derive(Debug, Clone)]
pub struct CsvEntry {
    pub name: String,
    pub content: String,
}

/// Ordered decoding attempts for archive entries. EDINET ships its CSV files
/// as UTF-16LE; older filings occasionally use Shift_JIS. The lossy UTF-8
/// interpretation is the last resort.
const DECODE_CHAIN: &[(&str, fn(&[u8]) -> Option<String>)] = &[
    ("UTF-16LE", decode_utf16le),
    ("Shift_JIS", decode_shift_jis),
    ("UTF-8", decode_utf8_lossy),
];

/// Extracts every `.csv` entry (case-insensitive suffix, directories skipped)
/// from a zip archive and decodes it. An archive with no CSV entries yields
/// an empty list.
pub fn extract_csv_entries(data: &[u8]) -> Result<Vec<CsvEntry>, ExtractError> {
    let cursor = Cursor::new(data);
    let mut archive = zip::ZipArchive::new(cursor)?;
    let mut entries = Vec::new();

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }

        let name = file.name().to_string();
        if !name.to_lowercase().ends_with(CSV_SUFFIX) {
            continue;
        }

        let mut raw = Vec::new();
        file.read_to_end(&mut raw)?;

        let content = decode_entry(&raw, &name)?;
        tracing::debug!("Extracted {} ({} chars)", name, content.len());
        entries.push(CsvEntry { name, content });
    }

    Ok(entries)
}

/// Runs the decode chain in order; the first successful attempt wins.
fn decode_entry(raw: &[u8], entry: &str) -> Result<String, ExtractError> {
    for (label, attempt) in DECODE_CHAIN {
        if let Some(text) = attempt(raw) {
            tracing::trace!("Decoded {} as {}", entry, label);
            return Ok(text);
        }
        tracing::debug!("Decoding {} as {} failed, trying next candidate", entry, label);
    }

    Err(ExtractError::Decode {
        entry: entry.to_string(),
        attempted: DECODE_CHAIN
            .iter()
            .map(|(label, _)| *label)
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// A replacement character in the output means the bytes were not really
/// UTF-16LE; treat that as a failed attempt rather than keeping mojibake.
fn decode_utf16le(raw: &[u8]) -> Option<String> {
    let (text, _, _) = UTF_16LE.decode(raw);
    if text.contains('\u{FFFD}') {
        return None;
    }
    Some(text.into_owned())
}

fn decode_shift_jis(raw: &[u8]) -> Option<String> {
    let (text, _, _) = SHIFT_JIS.decode(raw);
    if text.contains('\u{FFFD}') {
        return None;
    }
    Some(text.into_owned())
}

fn decode_utf8_lossy(raw: &[u8]) -> Option<String> {
    Some(String::from_utf8_lossy(raw).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn utf16le_bytes(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
    }

    fn build_zip(entries: &[(&str, &[u8])], directories: &[&str]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::FileOptions::default();
        for dir in directories {
            writer.add_directory(*dir, options).unwrap();
        }
        for (name, data) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn utf16le_roundtrip() {
        let bytes = utf16le_bytes("要素ID\t値\nX\t1000");
        assert_eq!(decode_utf16le(&bytes).unwrap(), "要素ID\t値\nX\t1000");
    }

    #[test]
    fn utf16le_rejects_odd_length_input() {
        // Trailing byte decodes to a replacement character.
        assert!(decode_utf16le(b"abc").is_none());
    }

    #[test]
    fn shift_jis_accepts_ascii_and_katakana() {
        assert_eq!(decode_shift_jis(b"abc").unwrap(), "abc");
        // 0x83 0x4A is katakana KA in Shift_JIS
        assert_eq!(decode_shift_jis(&[0x83, 0x4A]).unwrap(), "カ");
    }

    #[test]
    fn shift_jis_rejects_invalid_sequences() {
        // A lone lead byte cannot be completed.
        assert!(decode_shift_jis(&[0x83]).is_none());
    }

    #[test]
    fn utf8_fallback_always_succeeds() {
        assert!(decode_utf8_lossy(&[0xFF, 0xFE, 0x00]).is_some());
    }

    #[test]
    fn decode_chain_falls_back_in_order() {
        // Odd length fails UTF-16LE, plain ASCII is valid Shift_JIS.
        assert_eq!(decode_entry(b"abc", "x.csv").unwrap(), "abc");
    }

    #[test]
    fn extracts_only_csv_entries() {
        let csv = utf16le_bytes("要素ID\t値\nX\t1");
        let data = build_zip(
            &[
                ("XBRL_TO_CSV/jpcrp030000-asr-001.csv", &csv),
                ("XBRL_TO_CSV/manifest.xml", b"<manifest/>"),
                ("AuditDoc/report.CSV", &csv),
            ],
            &["XBRL_TO_CSV/"],
        );

        let entries = extract_csv_entries(&data).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["XBRL_TO_CSV/jpcrp030000-asr-001.csv", "AuditDoc/report.CSV"]
        );
        assert!(entries.iter().all(|e| e.content.contains("要素ID")));
    }

    #[test]
    fn archive_without_csv_yields_empty_list() {
        let data = build_zip(&[("doc.xbrl", b"<xbrl/>")], &[]);
        assert!(extract_csv_entries(&data).unwrap().is_empty());
    }

    #[test]
    fn invalid_archive_is_an_error() {
        assert!(extract_csv_entries(b"not a zip").is_err());
    }
}
