// src/batch/mod.rs

use crate::edinet::client::EdinetClient;
use crate::edinet::models::{DocumentListResponse, EdinetDocument};
use crate::normalize::processor::NormalizedProcessor;
use crate::normalize::types::{
    BatchDocumentRecord, BatchErrorRecord, BatchErrorType, BatchResult, NormalizedResult,
};
use crate::storage::StorageManager;
use crate::utils::error::{AppError, EdinetError};
use std::time::Instant;

/// Document type codes processed by the daily batch:
/// 120 = annual securities report, 130 = quarterly report.
pub const TARGET_DOC_TYPES: &[&str] = &["120", "130"];

/// CSV archive variant of the document endpoint.
const CSV_ARCHIVE_TYPE: &str = "5";

/// Where a batch run currently is. Terminal states are `Done` and `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    FetchingList,
    Filtering,
    Processing(usize),
    Aggregating,
    Done,
    Failed,
}

/// Source of document lists and archive bytes. The production implementation
/// is [`EdinetClient`]; tests substitute canned responses.
#[allow(async_fn_in_trait)]
pub trait DocumentSource {
    async fn fetch_documents_list(&self, date: &str) -> Result<DocumentListResponse, EdinetError>;
    async fn fetch_document(&self, doc_id: &str, doc_type: &str) -> Result<Vec<u8>, EdinetError>;
}

impl DocumentSource for EdinetClient {
    async fn fetch_documents_list(&self, date: &str) -> Result<DocumentListResponse, EdinetError> {
        EdinetClient::fetch_documents_list(self, date).await
    }

    async fn fetch_document(&self, doc_id: &str, doc_type: &str) -> Result<Vec<u8>, EdinetError> {
        EdinetClient::fetch_document(self, doc_id, doc_type).await
    }
}

/// Sequential daily batch over one calendar date. Documents are processed
/// strictly one at a time; the first per-document failure aborts the whole
/// run after persisting whatever summary exists so far.
pub struct DailyBatchProcessor<S: DocumentSource> {
    source: S,
    processor: NormalizedProcessor,
    storage: StorageManager,
    state: BatchState,
}

impl<S: DocumentSource> DailyBatchProcessor<S> {
    pub fn new(source: S, processor: NormalizedProcessor, storage: StorageManager) -> Self {
        Self {
            source,
            processor,
            storage,
            state: BatchState::Idle,
        }
    }

    pub fn state(&self) -> &BatchState {
        &self.state
    }

    /// Runs the batch for one date. Returns the aggregate result on success;
    /// on the first per-document error the partial summary is persisted, the
    /// state machine lands in `Failed` and the error is surfaced.
    pub async fn run(&mut self, target_date: &str) -> Result<BatchResult, AppError> {
        let started = Instant::now();
        let mut result = BatchResult::new(target_date);

        tracing::info!("Starting daily batch for {}", target_date);

        self.state = BatchState::FetchingList;
        let list = match self.source.fetch_documents_list(target_date).await {
            Ok(list) => list,
            Err(e) => {
                self.state = BatchState::Failed;
                return Err(e.into());
            }
        };

        result.total_documents = list.results.len();
        if list.results.is_empty() {
            tracing::info!("No documents filed on {}", target_date);
            result.processing_time_ms = started.elapsed().as_millis() as u64;
            self.state = BatchState::Done;
            return Ok(result);
        }
        tracing::info!("Fetched {} documents for {}", result.total_documents, target_date);

        self.state = BatchState::Filtering;
        let targets = filter_target_documents(&list.results);
        result.target_documents = targets.len();
        tracing::info!("{} documents match the batch filter", targets.len());

        if targets.is_empty() {
            result.processing_time_ms = started.elapsed().as_millis() as u64;
            self.state = BatchState::Done;
            return Ok(result);
        }

        for (i, document) in targets.iter().enumerate() {
            self.state = BatchState::Processing(i);
            tracing::info!(
                "[{}/{}] Processing {} ({})",
                i + 1,
                targets.len(),
                document.docID,
                document.filerName.as_deref().unwrap_or("unknown filer")
            );

            match self.process_one(document, target_date).await {
                Ok(record) => {
                    result.documents.push(record);
                    result.processed_documents += 1;
                    tracing::info!("[{}/{}] Completed {}", i + 1, targets.len(), document.docID);
                }
                Err((error_type, error)) => {
                    tracing::error!(
                        "[{}/{}] Failed {}: {}",
                        i + 1,
                        targets.len(),
                        document.docID,
                        error
                    );

                    result.errors.push(BatchErrorRecord {
                        doc_id: document.docID.clone(),
                        filer_name: document.filerName.clone(),
                        error_type,
                        error_message: error.to_string(),
                        timestamp: chrono::Utc::now().to_rfc3339(),
                    });
                    result.failed_documents += 1;
                    result.processing_time_ms = started.elapsed().as_millis() as u64;

                    // Fail fast: persist what we have, then abort the batch.
                    if let Err(save_error) = self.storage.save_batch_results(target_date, &result) {
                        tracing::error!("Could not persist partial batch results: {}", save_error);
                    }
                    self.state = BatchState::Failed;
                    return Err(error);
                }
            }
        }

        self.state = BatchState::Aggregating;
        result.processing_time_ms = started.elapsed().as_millis() as u64;
        self.storage.save_batch_results(target_date, &result)?;

        self.state = BatchState::Done;
        tracing::info!(
            "Batch finished: {}/{} documents processed in {} ms",
            result.processed_documents,
            result.target_documents,
            result.processing_time_ms
        );
        Ok(result)
    }

    /// Fetch, normalize and persist a single document. The error side carries
    /// the batch error category of the failing stage.
    async fn process_one(
        &self,
        document: &EdinetDocument,
        target_date: &str,
    ) -> Result<BatchDocumentRecord, (BatchErrorType, AppError)> {
        let archive = self
            .source
            .fetch_document(&document.docID, CSV_ARCHIVE_TYPE)
            .await
            .map_err(|e| (BatchErrorType::FetchError, AppError::from(e)))?;

        let normalized = self
            .processor
            .process_zip_to_normalized(&archive, &document.docID)
            .map_err(|e| (BatchErrorType::ProcessingError, AppError::from(e)))?;

        let record = merge_document_record(document, &normalized, target_date).map_err(|e| {
            (BatchErrorType::ProcessingError, e)
        })?;

        let exported = self.processor.export_to_json(&normalized);
        self.storage
            .save_document_result(target_date, &document.docID, &exported)
            .map_err(|e| (BatchErrorType::SaveError, AppError::from(e)))?;

        Ok(record)
    }
}

/// Batch filtering predicate: CSV available, not withdrawn, and one of the
/// targeted report types.
pub fn filter_target_documents(documents: &[EdinetDocument]) -> Vec<EdinetDocument> {
    documents
        .iter()
        .filter(|doc| {
            doc.has_csv()
                && !doc.is_withdrawn()
                && doc
                    .docTypeCode
                    .as_deref()
                    .is_some_and(|code| TARGET_DOC_TYPES.contains(&code))
        })
        .cloned()
        .collect()
}

/// Overlays API-sourced metadata over the pipeline-derived document record;
/// API values take precedence.
fn merge_document_record(
    document: &EdinetDocument,
    normalized: &NormalizedResult,
    target_date: &str,
) -> Result<BatchDocumentRecord, AppError> {
    let mut base = normalized
        .documents
        .first()
        .cloned()
        .ok_or_else(|| AppError::Processing(format!("No document record for {}", document.docID)))?;

    base.edinet_code = document.edinetCode.clone();
    base.filer_name = document.filerName.clone();
    base.doc_type = map_doc_type_code(document.docTypeCode.as_deref());
    base.form_code = document.formCode.clone();
    base.period_start = document.periodStart.clone();
    base.period_end = document.periodEnd.clone();
    base.filed_at_jst = document.submitDateTime.clone();
    base.has_csv = document.has_csv();

    Ok(BatchDocumentRecord {
        document: base,
        seq_number: document.seqNumber,
        doc_description: document.docDescription.clone(),
        batch_date: target_date.to_string(),
    })
}

/// Maps a document type code to its display name; unknown codes pass through.
fn map_doc_type_code(code: Option<&str>) -> Option<String> {
    let code = code?;
    let name = match code {
        "120" => "有価証券報告書",
        "130" => "四半期報告書",
        other => other,
    };
    Some(name.to_string())
}
