// src/extractors/csv.rs

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One parsed row of an EDINET CSV table. All columns are optional because
/// the header vocabulary differs between filing types; absent columns stay
/// `None` instead of failing the row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFact {
    pub element_id: Option<String>,
    pub label: Option<String>,
    pub value: Option<RawValue>,
    pub context_id: Option<String>,
    pub relative_year: Option<String>,
    pub consolidation: Option<String>,
    pub period_type: Option<String>,
    pub unit_id: Option<String>,
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub decimals: Option<String>,
    pub source_file: String,
}

/// The 値 column is stored as a number when the cell parses as one,
/// otherwise as the raw text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

/// Row indexes keyed by element id and by source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactIndex {
    pub facts_by_element: HashMap<String, Vec<usize>>,
    pub statements: HashMap<String, Vec<usize>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    ElementId,
    Label,
    Value,
    ContextId,
    RelativeYear,
    Consolidation,
    PeriodType,
    UnitId,
    PeriodStart,
    PeriodEnd,
    Decimals,
}

/// Fixed mapping from EDINET CSV header text to fact fields. Headers outside
/// this table are ignored. 単位ID and ユニットID both occur in the wild.
static COLUMN_MAP: Lazy<HashMap<&'static str, Column>> = Lazy::new(|| {
    HashMap::from([
        ("要素ID", Column::ElementId),
        ("項目名", Column::Label),
        ("値", Column::Value),
        ("コンテキストID", Column::ContextId),
        ("相対年度", Column::RelativeYear),
        ("連結・個別", Column::Consolidation),
        ("期間・時点", Column::PeriodType),
        ("単位ID", Column::UnitId),
        ("ユニットID", Column::UnitId),
        ("開始日", Column::PeriodStart),
        ("終了日", Column::PeriodEnd),
        ("精度", Column::Decimals),
    ])
});

/// Parses one decoded CSV blob into raw facts. The first non-empty line is
/// the tab-delimited header; every later line is a data row. Rows shorter
/// than the header leave the missing columns `None`.
pub fn parse_csv_to_facts(content: &str, source_file: &str) -> Vec<RawFact> {
    let lines: Vec<&str> = content
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Vec::new();
    }

    let headers: Vec<&str> = lines[0].split('\t').collect();
    let mut facts = Vec::with_capacity(lines.len() - 1);

    for line in &lines[1..] {
        let cells: Vec<&str> = line.split('\t').collect();
        if cells.len() > headers.len() {
            // Shape anomalies are non-fatal; the surplus cells are dropped.
            tracing::warn!(
                "Row in {} has {} cells for {} headers",
                source_file,
                cells.len(),
                headers.len()
            );
        }
        let mut fact = RawFact {
            source_file: source_file.to_string(),
            ..RawFact::default()
        };

        for (header, cell) in headers.iter().zip(cells.iter()) {
            let header = strip_quotes(header.trim());
            let cell = strip_quotes(cell.trim());
            if cell.is_empty() {
                continue;
            }

            let Some(column) = COLUMN_MAP.get(header) else {
                continue;
            };

            match column {
                Column::ElementId => fact.element_id = Some(cell.to_string()),
                Column::Label => fact.label = Some(cell.to_string()),
                Column::Value => fact.value = Some(parse_cell_value(cell)),
                Column::ContextId => fact.context_id = Some(cell.to_string()),
                Column::RelativeYear => fact.relative_year = Some(cell.to_string()),
                Column::Consolidation => fact.consolidation = Some(cell.to_string()),
                Column::PeriodType => fact.period_type = Some(cell.to_string()),
                Column::UnitId => fact.unit_id = Some(cell.to_string()),
                Column::PeriodStart => fact.period_start = Some(cell.to_string()),
                Column::PeriodEnd => fact.period_end = Some(cell.to_string()),
                Column::Decimals => fact.decimals = Some(cell.to_string()),
            }
        }

        facts.push(fact);
    }

    facts
}

/// Builds the per-document row index over element ids and source files.
pub fn build_fact_index(facts: &[RawFact]) -> FactIndex {
    let mut index = FactIndex::default();

    for (i, fact) in facts.iter().enumerate() {
        if let Some(element_id) = &fact.element_id {
            index
                .facts_by_element
                .entry(element_id.clone())
                .or_default()
                .push(i);
        }
        index
            .statements
            .entry(fact.source_file.clone())
            .or_default()
            .push(i);
    }

    index
}

// Removes one surrounding quote pair; inner quotes stay untouched.
fn strip_quotes(s: &str) -> &str {
    let s = s.strip_prefix('"').unwrap_or(s);
    s.strip_suffix('"').unwrap_or(s)
}

fn parse_cell_value(cell: &str) -> RawValue {
    match cell.parse::<f64>() {
        Ok(n) if n.is_finite() => RawValue::Number(n),
        _ => RawValue::Text(cell.to_string()),
    }
}
