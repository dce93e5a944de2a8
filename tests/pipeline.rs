// tests/pipeline.rs
//! End-to-end pipeline tests: archive bytes through the normalized model
//! and its JSON export.

mod common;

use common::{build_zip, csv_zip, sample_report_csv, utf16le};
use edinet_extractor::extractors::csv::RawValue;
use edinet_extractor::normalize::fact::parse_value;
use edinet_extractor::normalize::processor::NormalizedProcessor;
use edinet_extractor::normalize::types::{ConsolidatedType, NormalizedJson, PeriodType, UnitType};

#[test]
fn numeric_and_text_values_survive_extraction() {
    // One entry named data.csv with a numeric and a non-numeric value cell.
    let data = csv_zip("data.csv", "要素ID\t値\nX\t1000\nY\tabc");
    let processor = NormalizedProcessor::new();

    let edinet = processor.process_zip(&data, "S100TEST").unwrap();
    assert_eq!(edinet.facts.len(), 2);
    assert_eq!(edinet.facts[0].value, Some(RawValue::Number(1000.0)));
    assert_eq!(edinet.facts[1].value, Some(RawValue::Text("abc".to_string())));

    let x = parse_value(edinet.facts[0].value.as_ref());
    assert_eq!(x.value_num, Some(1000.0));
    assert!(x.is_numeric);

    let y = parse_value(edinet.facts[1].value.as_ref());
    assert_eq!(y.value_str.as_deref(), Some("abc"));
    assert_eq!(y.value_num, None);
    assert!(!y.is_numeric);
}

#[test]
fn extraction_is_deterministic() {
    let data = csv_zip("data.csv", sample_report_csv());
    let processor = NormalizedProcessor::new();

    let first = processor.process_zip(&data, "S100TEST").unwrap();
    let second = processor.process_zip(&data, "S100TEST").unwrap();
    assert_eq!(first, second);
}

#[test]
fn shared_context_is_emitted_once() {
    let content = "要素ID\t項目名\t値\tコンテキストID\n\
                   NetSales\t売上高\t1000\tC1\n\
                   Assets\t総資産\t2000\tC1";
    let data = csv_zip("data.csv", content);
    let processor = NormalizedProcessor::new();

    let result = processor.process_zip_to_normalized(&data, "S100TEST").unwrap();
    assert_eq!(result.contexts.len(), 1);
    assert_eq!(result.contexts[0].context_id, "C1");
    assert_eq!(result.facts.len(), 2);
    assert!(result.facts.iter().all(|f| f.context_id == "C1"));
}

#[test]
fn full_report_normalizes_with_denormalized_context_fields() {
    let data = csv_zip("jpcrp030000-asr-001.csv", sample_report_csv());
    let processor = NormalizedProcessor::new();

    let result = processor.process_zip_to_normalized(&data, "S100W523").unwrap();

    assert!(result.documents[0].has_csv);
    assert_eq!(result.contexts.len(), 2);
    assert_eq!(result.facts.len(), 2);
    assert_eq!(result.summary.numeric_facts, 2);

    let current = &result.facts[0];
    assert_eq!(current.concept, "jppfs_cor:NetSales");
    assert_eq!(current.unit, Some(UnitType::Jpy));
    assert_eq!(current.period_type, PeriodType::Duration);
    assert_eq!(current.period_label, "当期");
    assert_eq!(current.consolidated_flag, ConsolidatedType::Consolidated);

    assert_eq!(result.facts[1].period_label, "前期");
}

#[test]
fn facts_from_multiple_entries_are_concatenated() {
    let data = build_zip(&[
        ("one.csv", utf16le("要素ID\t値\tコンテキストID\nA\t1\tC1")),
        ("two.csv", utf16le("要素ID\t値\tコンテキストID\nB\t2\tC2")),
    ]);
    let processor = NormalizedProcessor::new();

    let edinet = processor.process_zip(&data, "S100TEST").unwrap();
    assert_eq!(edinet.facts.len(), 2);
    assert_eq!(edinet.facts[0].source_file, "one.csv");
    assert_eq!(edinet.facts[1].source_file, "two.csv");
    assert_eq!(edinet.index.statements["two.csv"], vec![1]);
}

#[test]
fn archive_without_csv_normalizes_to_empty_document() {
    let data = build_zip(&[("manifest.xml", b"<manifest/>".to_vec())]);
    let processor = NormalizedProcessor::new();

    let result = processor.process_zip_to_normalized(&data, "S100TEST").unwrap();
    assert!(result.facts.is_empty());
    assert!(result.contexts.is_empty());
    assert!(!result.documents[0].has_csv);
}

#[test]
fn export_round_trips_through_json() {
    let data = csv_zip("data.csv", sample_report_csv());
    let processor = NormalizedProcessor::new();

    let result = processor.process_zip_to_normalized(&data, "S100W523").unwrap();
    let exported = processor.export_to_json(&result);

    let json = serde_json::to_string_pretty(&exported).unwrap();
    let restored: NormalizedJson = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.documents, exported.documents);
    assert_eq!(restored.contexts, exported.contexts);
    assert_eq!(restored.facts, exported.facts);
    assert_eq!(restored.meta, exported.meta);
}

#[test]
fn value_exclusivity_holds_for_every_fact() {
    let content = "要素ID\t値\tコンテキストID\n\
                   A\t1000\tC1\n\
                   B\t1,234\tC1\n\
                   C\tabc\tC1\n\
                   D\t-\tC1\n\
                   E\t\tC1";
    let data = csv_zip("data.csv", content);
    let processor = NormalizedProcessor::new();

    let result = processor.process_zip_to_normalized(&data, "S100TEST").unwrap();
    assert_eq!(result.facts.len(), 5);

    for fact in &result.facts {
        if fact.is_numeric {
            assert!(fact.value_num.is_some() && fact.value_str.is_none());
        } else {
            // Absent source values leave both sides empty.
            assert!(fact.value_num.is_none());
        }
    }

    let e = result.facts.iter().find(|f| f.concept == "E").unwrap();
    assert_eq!(e.value_num, None);
    assert_eq!(e.value_str, None);
    assert!(!e.is_numeric);
}
