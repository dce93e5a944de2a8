// src/normalize/processor.rs

use crate::extractors::archive;
use crate::extractors::csv::{self, FactIndex, RawFact};
use crate::normalize::context::{build_contexts, count_distinct_context_ids, deduplicate_globally};
use crate::normalize::fact::build_facts;
use crate::normalize::types::{
    ContextRecord, DocumentRecord, FactRecord, NormalizedJson, NormalizedMeta, NormalizedResult,
    ProcessingSummary, SOURCE_FORMAT, SOURCE_TAG,
};
use crate::utils::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Metadata envelope of the intermediate document JSON. Only the document id
/// and provenance tag are known at extraction time; the rest is merged in
/// later from the API document list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub doc_id: String,
    pub submit_date: Option<String>,
    pub filer_name: Option<String>,
    pub edinet_code: Option<String>,
    pub form_code: Option<String>,
    pub source: String,
}

/// Flat extraction output of one document: raw facts plus row indexes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdinetJson {
    pub meta: DocumentMeta,
    pub facts: Vec<RawFact>,
    pub index: FactIndex,
}

/// Pipeline facade: archive bytes → raw facts → normalized relational model.
pub struct NormalizedProcessor;

impl NormalizedProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Extracts and parses every CSV entry of a document archive. An archive
    /// with no CSV entries yields an empty fact list, not an error.
    pub fn process_zip(&self, data: &[u8], doc_id: &str) -> Result<EdinetJson, ExtractError> {
        let entries = archive::extract_csv_entries(data)?;

        let mut facts = Vec::new();
        for entry in &entries {
            facts.extend(csv::parse_csv_to_facts(&entry.content, &entry.name));
        }
        tracing::debug!(
            "Parsed {} facts from {} CSV entries for {}",
            facts.len(),
            entries.len(),
            doc_id
        );

        let index = csv::build_fact_index(&facts);
        Ok(EdinetJson {
            meta: DocumentMeta {
                doc_id: doc_id.to_string(),
                source: SOURCE_TAG.to_string(),
                ..DocumentMeta::default()
            },
            facts,
            index,
        })
    }

    /// Normalizes one extracted document.
    pub fn normalize(&self, edinet: &EdinetJson) -> NormalizedResult {
        let started = Instant::now();

        let document = self.create_document_record(edinet);
        let contexts = build_contexts(&edinet.meta.doc_id, &edinet.facts);
        let facts = build_facts(&edinet.meta.doc_id, &edinet.facts, &contexts);

        let summary = ProcessingSummary {
            document_count: 1,
            total_facts: facts.len(),
            total_contexts: contexts.len(),
            contexts_deduplicated: count_distinct_context_ids(&edinet.facts) - contexts.len(),
            numeric_facts: facts.iter().filter(|f| f.is_numeric).count(),
            processing_time_ms: started.elapsed().as_millis() as u64,
        };

        NormalizedResult {
            documents: vec![document],
            contexts,
            facts,
            summary,
        }
    }

    /// Normalizes several extracted documents into one result with
    /// cross-document context deduplication.
    pub fn normalize_multiple(&self, edinet_jsons: &[EdinetJson]) -> NormalizedResult {
        let started = Instant::now();

        let mut documents: Vec<DocumentRecord> = Vec::new();
        let mut contexts: Vec<ContextRecord> = Vec::new();
        let mut facts: Vec<FactRecord> = Vec::new();
        let mut total_original_contexts = 0;

        for edinet in edinet_jsons {
            let document_contexts = build_contexts(&edinet.meta.doc_id, &edinet.facts);
            facts.extend(build_facts(&edinet.meta.doc_id, &edinet.facts, &document_contexts));
            documents.push(self.create_document_record(edinet));
            contexts.extend(document_contexts);
            total_original_contexts += count_distinct_context_ids(&edinet.facts);
        }

        let contexts = deduplicate_globally(contexts);

        let summary = ProcessingSummary {
            document_count: documents.len(),
            total_facts: facts.len(),
            total_contexts: contexts.len(),
            contexts_deduplicated: total_original_contexts - contexts.len(),
            numeric_facts: facts.iter().filter(|f| f.is_numeric).count(),
            processing_time_ms: started.elapsed().as_millis() as u64,
        };

        NormalizedResult {
            documents,
            contexts,
            facts,
            summary,
        }
    }

    /// Convenience composition: archive bytes straight to the normalized model.
    pub fn process_zip_to_normalized(
        &self,
        data: &[u8],
        doc_id: &str,
    ) -> Result<NormalizedResult, ExtractError> {
        let edinet = self.process_zip(data, doc_id)?;
        Ok(self.normalize(&edinet))
    }

    /// Builds the JSON export envelope of a normalized result.
    pub fn export_to_json(&self, result: &NormalizedResult) -> NormalizedJson {
        NormalizedJson {
            meta: NormalizedMeta {
                processed_at: chrono::Utc::now().to_rfc3339(),
                document_count: result.summary.document_count,
                total_facts: result.summary.total_facts,
                total_contexts: result.summary.total_contexts,
                source_format: SOURCE_FORMAT.to_string(),
            },
            documents: result.documents.clone(),
            contexts: result.contexts.clone(),
            facts: result.facts.clone(),
        }
    }

    fn create_document_record(&self, edinet: &EdinetJson) -> DocumentRecord {
        DocumentRecord {
            document_id: edinet.meta.doc_id.clone(),
            edinet_code: edinet.meta.edinet_code.clone(),
            filer_name: edinet.meta.filer_name.clone(),
            doc_type: None, // not carried by the extraction layer
            form_code: edinet.meta.form_code.clone(),
            period_start: None,
            period_end: None,
            filed_at_jst: edinet.meta.submit_date.clone(),
            has_csv: !edinet.facts.is_empty(),
            processed_at: chrono::Utc::now().to_rfc3339(),
            source: SOURCE_TAG.to_string(),
        }
    }
}

impl Default for NormalizedProcessor {
    fn default() -> Self {
        Self::new()
    }
}
