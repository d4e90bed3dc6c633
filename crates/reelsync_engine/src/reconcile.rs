use std::sync::Arc;

use reelsync_core::{plan_merge, MergeOutcome, SubscriptionSnapshot};
use reelsync_logging::{sync_info, sync_warn};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::CollaboratorError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// Nothing was written.
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    /// The merged links were saved; only the execution trigger failed.
    #[error("links saved, but starting execution failed: {reason}")]
    TriggerFailed {
        outcome: MergeOutcome,
        reason: CollaboratorError,
    },
}

/// Idempotent merge of discovered links into a subscription's link set.
///
/// At most three collaborator round trips per merge regardless of how many
/// candidates arrive: one read of the current links, one write of the merged
/// list, one execution trigger. Nothing is written when every candidate is
/// already known.
pub struct LinkReconciler {
    catalog: Arc<Catalog>,
}

impl LinkReconciler {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub async fn merge(
        &self,
        subscription: &SubscriptionSnapshot,
        candidates: &[String],
    ) -> Result<MergeOutcome, MergeError> {
        if candidates.is_empty() {
            return Ok(MergeOutcome::default());
        }

        // The caller's snapshot may predate an earlier merge.
        let current = self
            .catalog
            .subscription(&subscription.id)
            .await?
            .ok_or_else(|| CollaboratorError::NotFound(subscription.id.clone()))?;

        let plan = plan_merge(&current.links, candidates);
        if !plan.needs_write() {
            return Ok(plan.outcome);
        }

        self.catalog.update_links(&current.id, &plan.merged).await?;
        if let Err(reason) = self.catalog.trigger_execution(&current.id).await {
            sync_warn!(
                "reconcile",
                "{}: saved {} new links but the execution trigger failed: {}",
                current.title,
                plan.outcome.added,
                reason
            );
            return Err(MergeError::TriggerFailed {
                outcome: plan.outcome,
                reason,
            });
        }
        sync_info!(
            "reconcile",
            "{}: added {} links ({} duplicate)",
            current.title,
            plan.outcome.added,
            plan.outcome.duplicate
        );
        Ok(plan.outcome)
    }
}
