// src/normalize/fact.rs

use crate::extractors::csv::{RawFact, RawValue};
use crate::normalize::types::{ContextRecord, FactRecord, UnitType};
use std::collections::HashMap;
use uuid::Uuid;

/// Disambiguated fact value. At most one of `value_num`/`value_str` is set;
/// both stay `None` only when the source value was absent.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedValue {
    pub value_num: Option<f64>,
    pub value_str: Option<String>,
    pub is_numeric: bool,
}

/// Converts raw facts into context-bound fact records. Facts missing either
/// `context_id` or `element_id`, or whose context cannot be found for this
/// document, are skipped silently; tolerance here is deliberate.
pub fn build_facts(
    document_id: &str,
    facts: &[RawFact],
    contexts: &[ContextRecord],
) -> Vec<FactRecord> {
    let contexts_by_id: HashMap<&str, &ContextRecord> = contexts
        .iter()
        .filter(|context| context.document_id == document_id)
        .map(|context| (context.context_id.as_str(), context))
        .collect();

    let mut records = Vec::new();

    for fact in facts {
        let (Some(context_id), Some(element_id)) =
            (fact.context_id.as_deref(), fact.element_id.as_deref())
        else {
            continue;
        };
        let Some(context) = contexts_by_id.get(context_id) else {
            continue;
        };

        let parsed = parse_value(fact.value.as_ref());

        records.push(FactRecord {
            document_id: document_id.to_string(),
            fact_id: Uuid::new_v4().to_string(),
            context_id: context_id.to_string(),
            concept: element_id.to_string(),
            account_label: fact.label.clone().unwrap_or_default(),
            value_num: parsed.value_num,
            value_str: parsed.value_str,
            unit: classify_unit(fact.unit_id.as_deref()),
            is_numeric: parsed.is_numeric,
            consolidated_flag: context.consolidated_flag,
            period_type: context.period_type,
            period_label: context.period_label.clone(),
        });
    }

    records
}

/// Numeric/string disambiguation. "" and "-" are placeholder cells and stay
/// strings; otherwise thousands separators are stripped before the numeric
/// parse is attempted.
pub fn parse_value(value: Option<&RawValue>) -> ParsedValue {
    let Some(value) = value else {
        return ParsedValue {
            value_num: None,
            value_str: None,
            is_numeric: false,
        };
    };

    match value {
        RawValue::Number(n) => ParsedValue {
            value_num: Some(*n),
            value_str: None,
            is_numeric: true,
        },
        RawValue::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() || trimmed == "-" {
                return ParsedValue {
                    value_num: None,
                    value_str: Some(trimmed.to_string()),
                    is_numeric: false,
                };
            }

            let without_commas = trimmed.replace(',', "");
            match without_commas.parse::<f64>() {
                Ok(n) if n.is_finite() => ParsedValue {
                    value_num: Some(n),
                    value_str: None,
                    is_numeric: true,
                },
                _ => ParsedValue {
                    value_num: None,
                    value_str: Some(trimmed.to_string()),
                    is_numeric: false,
                },
            }
        }
    }
}

/// Substring classification of the unit id. No unit text at all maps to
/// `None`; unrecognized text maps to `Other`.
pub fn classify_unit(unit_id: Option<&str>) -> Option<UnitType> {
    let unit_id = unit_id?;
    let normalized = unit_id.trim().to_lowercase();

    let unit = if normalized.contains("jpy") || normalized.contains("円") {
        UnitType::Jpy
    } else if normalized.contains("shares") || normalized.contains("株") {
        UnitType::Shares
    } else if normalized.contains("percent") || normalized.contains('%') {
        UnitType::Percent
    } else if normalized.contains("count") || normalized.contains("件数") {
        UnitType::Count
    } else {
        UnitType::Other
    };

    Some(unit)
}
