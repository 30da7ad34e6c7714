use axum::Json;
use serde::{Deserialize, Serialize};

use invoice_types::{InvoiceDocument, IssueKind, Totals};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueResponse {
    pub field: String,
    pub kind: IssueKind,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsResponse {
    pub totals: Totals,
    pub issues: Vec<IssueResponse>,
    /// Client name, or the drafting placeholder
    pub heading: String,
    /// Formatted total, or the empty-draft label
    pub total_label: String,
}

/// Compute totals for a possibly partial invoice draft
///
/// Never fails on missing or malformed numbers; schema problems come back
/// as `issues` alongside the totals.
pub async fn compute_totals(Json(doc): Json<InvoiceDocument>) -> Json<TotalsResponse> {
    let totals = doc.totals();
    let issues = doc
        .validate()
        .into_iter()
        .map(|issue| IssueResponse {
            message: issue.message(),
            field: issue.field,
            kind: issue.kind,
        })
        .collect();

    Json(TotalsResponse {
        total_label: totals.total_label(),
        heading: doc.heading().to_string(),
        totals,
        issues,
    })
}
