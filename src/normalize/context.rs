// src/normalize/context.rs

use crate::extractors::csv::RawFact;
use crate::normalize::types::{ConsolidatedType, ContextRecord, PeriodType};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::collections::HashSet;

/// Derives the deduplicated context set of one document. Facts are visited
/// in row order and the first occurrence of each context id wins; later
/// facts with the same id reuse the stored record.
pub fn build_contexts(document_id: &str, facts: &[RawFact]) -> Vec<ContextRecord> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut contexts = Vec::new();

    for fact in facts {
        let Some(context_id) = fact.context_id.as_deref() else {
            continue;
        };
        if !seen.insert(context_id) {
            continue;
        }

        contexts.push(ContextRecord {
            document_id: document_id.to_string(),
            context_id: context_id.to_string(),
            period_type: classify_period_type(fact.period_type.as_deref()),
            period_label: period_label(fact.relative_year.as_deref(), fact.period_type.as_deref()),
            consolidated_flag: classify_consolidation(fact.consolidation.as_deref()),
            relative_year: parse_relative_year(fact.relative_year.as_deref()),
            hashkey: context_hashkey(
                context_id,
                fact.period_type.as_deref(),
                fact.consolidation.as_deref(),
            ),
        });
    }

    contexts
}

/// Cross-document deduplication by `(period_type, period_label,
/// consolidated_flag, relative_year)`. The first record in input order is
/// retained as representative; its original `document_id`/`context_id` stand
/// in for all duplicates.
pub fn deduplicate_globally(contexts: Vec<ContextRecord>) -> Vec<ContextRecord> {
    let mut seen = HashSet::new();
    let mut deduplicated = Vec::with_capacity(contexts.len());

    for context in contexts {
        let key = (
            context.period_type,
            context.period_label.clone(),
            context.consolidated_flag,
            context.relative_year,
        );
        if seen.insert(key) {
            deduplicated.push(context);
        }
    }

    deduplicated
}

/// Number of distinct context ids referenced by the raw facts. Used to
/// report deduplication savings.
pub fn count_distinct_context_ids(facts: &[RawFact]) -> usize {
    facts
        .iter()
        .filter_map(|fact| fact.context_id.as_deref())
        .collect::<HashSet<_>>()
        .len()
}

pub fn classify_period_type(raw: Option<&str>) -> PeriodType {
    let Some(raw) = raw else {
        return PeriodType::Unknown;
    };

    let normalized = raw.trim().to_lowercase();
    if normalized.contains("duration") || normalized.contains("期間") {
        PeriodType::Duration
    } else if normalized.contains("instant") || normalized.contains("時点") {
        PeriodType::Instant
    } else {
        PeriodType::Unknown
    }
}

/// Substring classification of the consolidation column. The nonconsolidated
/// tokens are checked first because "nonconsolidated" contains "consolidated".
pub fn classify_consolidation(raw: Option<&str>) -> ConsolidatedType {
    let Some(raw) = raw else {
        return ConsolidatedType::Unknown;
    };

    let trimmed = raw.trim();
    let lowered = trimmed.to_lowercase();
    if trimmed.contains("個別") || lowered.contains("nonconsolidated") {
        ConsolidatedType::NonConsolidated
    } else if trimmed.contains("連結") || lowered.contains("consolidated") {
        ConsolidatedType::Consolidated
    } else if trimmed.is_empty() || trimmed == "Unknown" {
        ConsolidatedType::Unknown
    } else {
        ConsolidatedType::Other
    }
}

pub fn parse_relative_year(raw: Option<&str>) -> Option<i32> {
    raw?.trim().parse().ok()
}

/// Human label for the reporting period: 当期/前期 for relative years 0/-1,
/// "{n}期" for other known years, generic 期間/時点 when the year is unknown.
/// Instant contexts get the end-of-period 末 qualifier.
pub fn period_label(relative_year_raw: Option<&str>, period_type_raw: Option<&str>) -> String {
    let year = parse_relative_year(relative_year_raw);
    let is_duration = classify_period_type(period_type_raw) == PeriodType::Duration;

    match year {
        Some(0) => if is_duration { "当期" } else { "当期末" }.to_string(),
        Some(-1) => if is_duration { "前期" } else { "前期末" }.to_string(),
        Some(year) => format!("{}期{}", year, if is_duration { "" } else { "末" }),
        None => if is_duration { "期間" } else { "時点" }.to_string(),
    }
}

/// Opaque per-context fingerprint: base64 of the pipe-joined raw tuple.
/// Not used for cross-document identity.
pub fn context_hashkey(
    context_id: &str,
    period_type: Option<&str>,
    consolidation: Option<&str>,
) -> String {
    let joined = [
        context_id,
        period_type.unwrap_or(""),
        consolidation.unwrap_or(""),
    ]
    .join("|");
    BASE64.encode(joined.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::csv::parse_csv_to_facts;

    #[test]
    fn period_type_classification() {
        assert_eq!(classify_period_type(None), PeriodType::Unknown);
        assert_eq!(classify_period_type(Some("Duration")), PeriodType::Duration);
        assert_eq!(classify_period_type(Some("当期間")), PeriodType::Duration);
        assert_eq!(classify_period_type(Some("INSTANT")), PeriodType::Instant);
        assert_eq!(classify_period_type(Some("当時点")), PeriodType::Instant);
        assert_eq!(classify_period_type(Some("その他")), PeriodType::Unknown);
    }

    #[test]
    fn consolidation_classification() {
        assert_eq!(classify_consolidation(None), ConsolidatedType::Unknown);
        assert_eq!(classify_consolidation(Some("連結")), ConsolidatedType::Consolidated);
        assert_eq!(
            classify_consolidation(Some("Consolidated")),
            ConsolidatedType::Consolidated
        );
        assert_eq!(classify_consolidation(Some("個別")), ConsolidatedType::NonConsolidated);
        assert_eq!(
            classify_consolidation(Some("NonConsolidated")),
            ConsolidatedType::NonConsolidated
        );
        assert_eq!(classify_consolidation(Some("Unknown")), ConsolidatedType::Unknown);
        assert_eq!(classify_consolidation(Some("その他")), ConsolidatedType::Other);
        assert_eq!(classify_consolidation(Some("   ")), ConsolidatedType::Unknown);
    }

    #[test]
    fn relative_year_parsing() {
        assert_eq!(parse_relative_year(None), None);
        assert_eq!(parse_relative_year(Some("0")), Some(0));
        assert_eq!(parse_relative_year(Some(" -1 ")), Some(-1));
        assert_eq!(parse_relative_year(Some("abc")), None);
    }

    #[test]
    fn period_labels() {
        assert_eq!(period_label(Some("0"), Some("期間")), "当期");
        assert_eq!(period_label(Some("0"), Some("時点")), "当期末");
        assert_eq!(period_label(Some("-1"), Some("期間")), "前期");
        assert_eq!(period_label(Some("-1"), Some("時点")), "前期末");
        assert_eq!(period_label(Some("-2"), Some("期間")), "-2期");
        assert_eq!(period_label(Some("-2"), Some("時点")), "-2期末");
        assert_eq!(period_label(None, Some("期間")), "期間");
        assert_eq!(period_label(None, Some("時点")), "時点");
        assert_eq!(period_label(None, None), "時点");
    }

    #[test]
    fn hashkey_is_stable_and_distinct() {
        let a = context_hashkey("C1", Some("期間"), Some("連結"));
        let b = context_hashkey("C1", Some("期間"), Some("連結"));
        let c = context_hashkey("C2", Some("期間"), Some("連結"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(context_hashkey("C1", None, None), BASE64.encode("C1||"));
    }

    #[test]
    fn first_seen_context_wins_within_document() {
        let content = "要素ID\t値\tコンテキストID\t相対年度\t期間・時点\t連結・個別\n\
                       A\t1\tC1\t0\t期間\t連結\n\
                       B\t2\tC1\t-1\t時点\t個別\n\
                       C\t3\tC2\t-1\t時点\t個別";
        let facts = parse_csv_to_facts(content, "a.csv");
        let contexts = build_contexts("DOC1", &facts);

        assert_eq!(contexts.len(), 2);
        assert_eq!(contexts[0].context_id, "C1");
        // First row's attributes were retained for C1.
        assert_eq!(contexts[0].period_label, "当期");
        assert_eq!(contexts[0].consolidated_flag, ConsolidatedType::Consolidated);
        assert_eq!(contexts[1].context_id, "C2");
    }

    #[test]
    fn facts_without_context_produce_no_contexts() {
        let facts = parse_csv_to_facts("要素ID\t値\nX\t1", "a.csv");
        assert!(build_contexts("DOC1", &facts).is_empty());
    }

    #[test]
    fn context_count_bounded_by_distinct_ids() {
        let content = "コンテキストID\nC1\nC2\nC1\nC3";
        let facts = parse_csv_to_facts(content, "a.csv");
        let contexts = build_contexts("DOC1", &facts);
        assert!(contexts.len() <= count_distinct_context_ids(&facts));
        assert_eq!(contexts.len(), 3);
    }

    #[test]
    fn global_dedup_keeps_first_representative() {
        let make = |document_id: &str, context_id: &str, year: i32| ContextRecord {
            document_id: document_id.to_string(),
            context_id: context_id.to_string(),
            period_type: PeriodType::Duration,
            period_label: "当期".to_string(),
            consolidated_flag: ConsolidatedType::Consolidated,
            relative_year: Some(year),
            hashkey: context_hashkey(context_id, Some("期間"), Some("連結")),
        };

        let contexts = vec![
            make("DOC1", "C1", 0),
            make("DOC2", "C9", 0), // duplicate of the first by the 4-tuple
            make("DOC2", "C9", -1),
        ];

        let deduplicated = deduplicate_globally(contexts);
        assert_eq!(deduplicated.len(), 2);
        // The first-encountered record keeps its original identifiers.
        assert_eq!(deduplicated[0].document_id, "DOC1");
        assert_eq!(deduplicated[0].context_id, "C1");
        assert_eq!(deduplicated[1].relative_year, Some(-1));
    }
}
