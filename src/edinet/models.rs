// src/edinet/models.rs
#![allow(dead_code, non_snake_case)]
use serde::{Deserialize, Serialize};

/// Response of the EDINET v2 document list endpoint.
/// Example: https://api.edinet-fsa.go.jp/api/v2/documents.json?date=2024-01-15&type=2
#[derive(Debug, Deserialize)]
pub struct DocumentListResponse {
    pub metadata: Option<ListMetadata>,
    #[serde(default)]
    pub results: Vec<EdinetDocument>,
}

#[derive(Debug, Deserialize)]
pub struct ListMetadata {
    pub title: Option<String>,
    pub status: Option<String>,
    pub message: Option<String>,
}

/// One entry of the daily document list.
///
/// EDINET reports most flag fields as strings ("0"/"1"), not booleans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdinetDocument {
    pub seqNumber: u32,
    pub docID: String,
    pub edinetCode: Option<String>,
    pub secCode: Option<String>,
    pub JCN: Option<String>,
    pub filerName: Option<String>,
    pub fundCode: Option<String>,
    pub ordinanceCode: Option<String>,
    pub formCode: Option<String>,
    pub docTypeCode: Option<String>,
    pub periodStart: Option<String>,
    pub periodEnd: Option<String>,
    pub submitDateTime: Option<String>,
    pub docDescription: Option<String>,
    pub withdrawalStatus: Option<String>,
    pub xbrlFlag: Option<String>,
    pub pdfFlag: Option<String>,
    pub csvFlag: Option<String>,
}

impl EdinetDocument {
    /// CSV archive is downloadable for this document.
    pub fn has_csv(&self) -> bool {
        self.csvFlag.as_deref() == Some("1")
    }

    /// Filing has been withdrawn by the submitter.
    pub fn is_withdrawn(&self) -> bool {
        self.withdrawalStatus.as_deref() == Some("1")
    }
}
