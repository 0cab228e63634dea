//! Batch prefix reconciliation
//!
//! Each queried CIDR is searched once (NetBox `q` search returns the prefix
//! itself and every containing prefix) and the candidates are classified as an
//! exact match, the most specific containing prefix, or not found.

use netbox_client::{Filters, NetBoxClientTrait, NetBoxError, Prefix};
use serde::Serialize;
use tracing::{debug, info};

/// Classification of one queried key
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "match", content = "prefix", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// A candidate's prefix equals the key
    ExactMatch(Prefix),
    /// No exact match; the most specific candidate, which is not the key itself
    ApproximateMatch(Prefix),
    /// NetBox returned no candidates
    NotFound,
}

impl BatchOutcome {
    /// The selected record, if any
    pub fn matched(&self) -> Option<&Prefix> {
        match self {
            BatchOutcome::ExactMatch(p) | BatchOutcome::ApproximateMatch(p) => Some(p),
            BatchOutcome::NotFound => None,
        }
    }

    /// Whether any record was selected
    pub fn is_found(&self) -> bool {
        !matches!(self, BatchOutcome::NotFound)
    }

    pub fn is_approximate(&self) -> bool {
        matches!(self, BatchOutcome::ApproximateMatch(_))
    }
}

/// Result for one queried key, with every candidate NetBox returned
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    /// Key as written in the batch file
    pub query: String,
    /// Records returned for the key, in server order
    pub candidates: Vec<Prefix>,
    pub outcome: BatchOutcome,
}

/// Mask length of a CIDR string; 0 when the mask is missing or not a number
pub fn mask_length(cidr: &str) -> u32 {
    cidr.split_once('/')
        .and_then(|(_, mask)| mask.trim().parse().ok())
        .unwrap_or(0)
}

/// Classify the candidates returned for `key`
///
/// Exact matches win (first in returned order). Otherwise the candidate with
/// the longest mask is chosen, ties going to the first occurrence.
pub fn classify(key: &str, candidates: &[Prefix]) -> BatchOutcome {
    if let Some(exact) = candidates.iter().find(|p| p.prefix == key) {
        return BatchOutcome::ExactMatch(exact.clone());
    }

    let mut best: Option<&Prefix> = None;
    for candidate in candidates {
        match best {
            Some(current) if mask_length(&candidate.prefix) <= mask_length(&current.prefix) => {}
            _ => best = Some(candidate),
        }
    }

    match best {
        Some(p) => BatchOutcome::ApproximateMatch(p.clone()),
        None => BatchOutcome::NotFound,
    }
}

/// Query each key in order and classify the results
///
/// `filters` apply to every query; the key always replaces any `q` they carry.
/// The first failed query aborts the batch.
pub async fn reconcile(
    client: &dyn NetBoxClientTrait,
    keys: &[String],
    filters: &Filters,
) -> Result<Vec<BatchResult>, NetBoxError> {
    let mut results = Vec::with_capacity(keys.len());

    for key in keys {
        let mut query_filters = filters.clone();
        query_filters.insert("q".to_string(), key.clone());

        debug!("Querying prefix {}", key);
        let candidates = client.query_prefixes(&query_filters, None).await?;
        let outcome = classify(key, &candidates);
        debug!(query = %key, candidates = candidates.len(), found = outcome.is_found(), "Classified");

        results.push(BatchResult {
            query: key.clone(),
            candidates,
            outcome,
        });
    }

    let (found, not_found) = tally(&results);
    info!("Batch complete: {} found, {} not found", found, not_found);
    Ok(results)
}

/// Count found and not-found results
pub fn tally(results: &[BatchResult]) -> (usize, usize) {
    let found = results.iter().filter(|r| r.outcome.is_found()).count();
    (found, results.len() - found)
}
