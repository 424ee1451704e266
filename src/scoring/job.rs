//! Rescoring workflows: one company, or the whole table in pages.

use serde::Serialize;

use crate::observability::metrics;
use crate::scoring::{ScoringClient, ScoringError};
use crate::store::types::{Direction, ListQuery, SortOrder};
use crate::store::{Company, DataStoreClient, StoreError};

/// Failure while rescoring a company.
#[derive(Debug, thiserror::Error)]
pub enum RescoreError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

/// Result of rescoring one company.
#[derive(Debug, Clone, Serialize)]
pub struct Rescored {
    pub id: String,
    pub score: i32,
    pub reason: String,
    pub updated: Company,
}

/// Totals reported by a bulk run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RescoreSummary {
    pub rescored: u64,
    pub failed: u64,
}

/// Fetch, score and write back a single company.
pub async fn rescore_one(
    store: &DataStoreClient,
    scorer: &ScoringClient,
    id: &str,
) -> Result<Rescored, RescoreError> {
    let company = store
        .fetch_company(id)
        .await?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

    let assessment = scorer.assess(&company).await?;
    let updated = store
        .update_score(id, assessment.score, &assessment.reason)
        .await?;

    tracing::info!(company_id = %id, score = assessment.score, "Company rescored");

    Ok(Rescored {
        id: id.to_string(),
        score: assessment.score,
        reason: assessment.reason,
        updated,
    })
}

/// Rescore every company, `batch_size` at a time.
///
/// Pages are ordered by id so writing new scores does not shift later pages.
/// The next page starts after the rows actually returned, and only an empty
/// page ends the run, so a server-side row cap smaller than `batch_size` still
/// reaches every company. A company that fails is logged and skipped; a page
/// that cannot be listed aborts the run.
pub async fn rescore_all(
    store: &DataStoreClient,
    scorer: &ScoringClient,
    batch_size: u32,
) -> Result<RescoreSummary, RescoreError> {
    let mut summary = RescoreSummary::default();
    let mut offset = 0u32;

    loop {
        let mut page = ListQuery::page(batch_size, offset);
        page.order = SortOrder {
            column: "id".to_string(),
            direction: Direction::Asc,
        };

        let companies = store.list_companies(&page).await?;
        if companies.is_empty() {
            break;
        }
        let fetched = companies.len();

        for company in companies {
            match rescore_one(store, scorer, &company.id).await {
                Ok(_) => {
                    summary.rescored += 1;
                    metrics::record_rescore("success");
                }
                Err(e) => {
                    summary.failed += 1;
                    metrics::record_rescore("failure");
                    tracing::error!(company_id = %company.id, error = %e, "Error rescoring company");
                }
            }
        }

        offset = offset.saturating_add(u32::try_from(fetched).unwrap_or(u32::MAX));
    }

    tracing::info!(
        rescored = summary.rescored,
        failed = summary.failed,
        "Bulk rescoring finished"
    );
    Ok(summary)
}
