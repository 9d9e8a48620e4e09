use crate::middleware::error_handling::{AppError, Result};
use crate::models::inquiry::{
    CreateInquiryRequest, InquiryFilter, InquiryResponse, InquiryStats, InquiryStatus,
};
use crate::repositories::InquiryRepository;

/// The notes save gate: a draft is dirty when it differs from the saved value
/// after trimming both ends. The comparison is trimmed; the persisted text is
/// the raw draft.
pub fn notes_dirty(draft: &str, saved: &str) -> bool {
    draft.trim() != saved.trim()
}

pub struct InquiryService {
    repo: InquiryRepository,
}

impl InquiryService {
    pub fn new(repo: InquiryRepository) -> Self {
        Self { repo }
    }

    pub async fn submit(&self, request: &CreateInquiryRequest) -> Result<InquiryResponse> {
        let inquiry = self.repo.create(request).await?;
        tracing::info!(
            "Inquiry {} submitted for {}",
            inquiry.id,
            inquiry.service_type
        );
        Ok(inquiry.into())
    }

    pub async fn list(&self, filter: &InquiryFilter) -> Result<Vec<InquiryResponse>> {
        let inquiries = self.repo.list_all().await?;
        Ok(filter
            .apply(inquiries)
            .into_iter()
            .map(Into::into)
            .collect())
    }

    pub async fn get(&self, id: &str) -> Result<InquiryResponse> {
        let inquiry = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Inquiry not found".to_string()))?;
        Ok(inquiry.into())
    }

    /// Staff status transition, re-validated against the guard table before
    /// anything is written. The write itself is additionally guarded at the
    /// storage layer, so a transition raced by another session fails rather
    /// than skipping a state.
    pub async fn update_status(
        &self,
        id: &str,
        target: InquiryStatus,
    ) -> Result<InquiryResponse> {
        let current = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Inquiry not found".to_string()))?;

        if !current.status.can_transition_to(target) {
            return Err(AppError::Conflict(format!(
                "Cannot change status from {} to {}",
                current.status, target
            )));
        }

        let allowed_from = InquiryStatus::allowed_sources(target);
        let updated = self
            .repo
            .update_status(id, target, &allowed_from)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(format!(
                    "Inquiry status changed concurrently; {} is no longer reachable",
                    target
                ))
            })?;

        Ok(updated.into())
    }

    /// Notes save. A clean draft (trimmed-equal to the stored value) performs
    /// no write and returns the stored record unchanged.
    pub async fn save_notes(&self, id: &str, draft: &str) -> Result<InquiryResponse> {
        let current = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Inquiry not found".to_string()))?;

        if !notes_dirty(draft, &current.notes) {
            return Ok(current.into());
        }

        let updated = self
            .repo
            .update_notes(id, draft)
            .await?
            .ok_or_else(|| AppError::NotFound("Inquiry not found".to_string()))?;

        Ok(updated.into())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound("Inquiry not found".to_string()));
        }
        tracing::info!("Inquiry {} deleted", id);
        Ok(())
    }

    pub async fn stats(&self) -> Result<InquiryStats> {
        let inquiries = self.repo.list_all().await?;
        Ok(InquiryStats::tally(&inquiries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_draft_is_clean() {
        assert!(!notes_dirty("follow up by phone", "follow up by phone"));
    }

    #[test]
    fn whitespace_only_edits_are_clean() {
        assert!(!notes_dirty("  follow up by phone  ", "follow up by phone"));
        assert!(!notes_dirty("follow up by phone", "\tfollow up by phone\n"));
    }

    #[test]
    fn internal_whitespace_still_counts_as_dirty() {
        assert!(notes_dirty("follow  up", "follow up"));
    }

    #[test]
    fn empty_draft_against_empty_saved_is_clean() {
        assert!(!notes_dirty("", ""));
        assert!(!notes_dirty("   ", ""));
    }

    #[test]
    fn changed_draft_is_dirty() {
        assert!(notes_dirty("call scheduled", "follow up by phone"));
        assert!(notes_dirty("something", ""));
    }
}
