// src/normalize/types.rs

use serde::{Deserialize, Serialize};

/// Provenance tag stamped on every document record.
pub const SOURCE_TAG: &str = "EDINET v2";
/// Format tag of the exported JSON envelope.
pub const SOURCE_FORMAT: &str = "EdinetJSON v1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Duration,
    Instant,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsolidatedType {
    Consolidated,
    NonConsolidated,
    Other,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitType {
    #[serde(rename = "JPY")]
    Jpy,
    #[serde(rename = "shares")]
    Shares,
    #[serde(rename = "percent")]
    Percent,
    #[serde(rename = "count")]
    Count,
    #[serde(rename = "other")]
    Other,
}

/// One filing's metadata envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub document_id: String,
    pub edinet_code: Option<String>,
    pub filer_name: Option<String>,
    pub doc_type: Option<String>,
    pub form_code: Option<String>,
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub filed_at_jst: Option<String>,
    pub has_csv: bool,
    pub processed_at: String,
    pub source: String,
}

/// A deduplicated reporting context. Within one document the uniqueness key
/// is `(document_id, context_id)`; across documents the merged key is
/// `(period_type, period_label, consolidated_flag, relative_year)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRecord {
    pub document_id: String,
    pub context_id: String,
    pub period_type: PeriodType,
    pub period_label: String,
    pub consolidated_flag: ConsolidatedType,
    pub relative_year: Option<i32>,
    pub hashkey: String,
}

/// A normalized, context-bound fact. The consolidation and period fields are
/// copied from the bound context so downstream filters need no join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactRecord {
    pub document_id: String,
    pub fact_id: String,
    pub context_id: String,
    pub concept: String,
    pub account_label: String,
    pub value_num: Option<f64>,
    pub value_str: Option<String>,
    pub unit: Option<UnitType>,
    pub is_numeric: bool,

    pub consolidated_flag: ConsolidatedType,
    pub period_type: PeriodType,
    pub period_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingSummary {
    pub document_count: usize,
    pub total_facts: usize,
    pub total_contexts: usize,
    /// Distinct source context ids minus emitted contexts.
    pub contexts_deduplicated: usize,
    pub numeric_facts: usize,
    pub processing_time_ms: u64,
}

/// Aggregate output of one normalization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedResult {
    pub documents: Vec<DocumentRecord>,
    pub contexts: Vec<ContextRecord>,
    pub facts: Vec<FactRecord>,
    pub summary: ProcessingSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMeta {
    pub processed_at: String,
    pub document_count: usize,
    pub total_facts: usize,
    pub total_contexts: usize,
    pub source_format: String,
}

/// JSON export envelope of a [`NormalizedResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedJson {
    pub meta: NormalizedMeta,
    pub documents: Vec<DocumentRecord>,
    pub contexts: Vec<ContextRecord>,
    pub facts: Vec<FactRecord>,
}

/// Document record enriched with batch bookkeeping fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDocumentRecord {
    #[serde(flatten)]
    pub document: DocumentRecord,
    pub seq_number: u32,
    pub doc_description: Option<String>,
    pub batch_date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchErrorType {
    FetchError,
    ProcessingError,
    SaveError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchErrorRecord {
    pub doc_id: String,
    pub filer_name: Option<String>,
    pub error_type: BatchErrorType,
    pub error_message: String,
    pub timestamp: String,
}

/// Outcome of one daily batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub batch_date: String,
    pub total_documents: usize,
    pub target_documents: usize,
    pub processed_documents: usize,
    pub failed_documents: usize,
    pub processing_time_ms: u64,
    pub documents: Vec<BatchDocumentRecord>,
    pub errors: Vec<BatchErrorRecord>,
}

impl BatchResult {
    pub fn new(batch_date: &str) -> Self {
        Self {
            batch_date: batch_date.to_string(),
            total_documents: 0,
            target_documents: 0,
            processed_documents: 0,
            failed_documents: 0,
            processing_time_ms: 0,
            documents: Vec::new(),
            errors: Vec::new(),
        }
    }
}
