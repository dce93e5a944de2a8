// tests/common/mod.rs
//! Shared helpers for integration tests: in-memory zip archives with
//! UTF-16LE encoded CSV entries, the way EDINET ships them.

use std::io::{Cursor, Write};

pub fn utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
}

pub fn build_zip(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::FileOptions::default();
    for (name, data) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Archive with a single CSV entry carrying the given decoded content.
pub fn csv_zip(entry_name: &str, content: &str) -> Vec<u8> {
    build_zip(&[(entry_name, utf16le(content))])
}

/// A small but fully-populated filing table: two periods, one concept.
pub fn sample_report_csv() -> &'static str {
    "要素ID\t項目名\t値\tコンテキストID\t相対年度\t期間・時点\t連結・個別\t単位ID\n\
     jppfs_cor:NetSales\t売上高\t1000\tCurrentYearDuration\t0\t期間\t連結\tJPY\n\
     jppfs_cor:NetSales\t売上高\t800\tPrior1YearDuration\t-1\t期間\t連結\tJPY"
}
