use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::api::error::AppError;
use crate::db::EntityStore;
use crate::db::store::{AffiliateStore, CategoryStore, JobStore};
use super::models::{Feed, JobFeedEntry};

/// Builds the job listing served to affiliates
pub struct FeedService {
    store: Arc<dyn EntityStore>,
}

impl FeedService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Active public jobs of an approved affiliate's categories, keyed by
    /// `{base_url}{public_path}`
    pub async fn affiliate_feed(
        &self,
        token: &str,
        limit: i64,
        base_url: &str,
        now: DateTime<Utc>,
    ) -> Result<Feed, AppError> {
        let affiliate = self
            .store
            .find_active_affiliate_by_token(token)
            .await?
            .ok_or_else(|| AppError::not_found("Affiliate not found"))?;

        let categories: HashMap<i32, String> = self
            .store
            .all_categories()
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let jobs = self
            .store
            .public_jobs(&affiliate.category_ids, now, Some(limit))
            .await?;
        debug!("Feed for affiliate {}: {} jobs", affiliate.id, jobs.len());

        let entries = jobs
            .iter()
            .map(|job| {
                let category = categories.get(&job.category_id).map(String::as_str).unwrap_or_default();
                (
                    format!("{base_url}{}", job.public_path()),
                    JobFeedEntry::new(job, category, base_url),
                )
            })
            .collect();

        Ok(Feed(entries))
    }
}
