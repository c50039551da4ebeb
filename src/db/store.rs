use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::db::affiliate_repository::AffiliateRepository;
use crate::db::category_repository::CategoryRepository;
use crate::db::job_repository::JobRepository;
use crate::db::models::{AffiliateRow, CategoryRow, JobFields, JobRow, NewAffiliate, NewJob};

/// Job persistence and queries
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn find_job(&self, id: i32) -> Result<Option<JobRow>, sqlx::Error>;

    async fn find_job_by_token(&self, token: &str) -> Result<Option<JobRow>, sqlx::Error>;

    async fn insert_job(&self, job: &NewJob) -> Result<JobRow, sqlx::Error>;

    /// Overwrite the editable columns of a job
    async fn update_job_fields(
        &self,
        id: i32,
        fields: &JobFields,
        now: DateTime<Utc>,
    ) -> Result<Option<JobRow>, sqlx::Error>;

    /// Persist activation state, expiry and extension counter of a job
    async fn save_job_schedule(&self, job: &JobRow) -> Result<Option<JobRow>, sqlx::Error>;

    async fn delete_job(&self, id: i32) -> Result<bool, sqlx::Error>;

    /// Active jobs in the given categories, latest expiry first
    async fn active_jobs(
        &self,
        category_ids: &[i32],
        now: DateTime<Utc>,
        limit: Option<i64>,
    ) -> Result<Vec<JobRow>, sqlx::Error>;

    /// Like `active_jobs`, restricted to jobs marked public
    async fn public_jobs(
        &self,
        category_ids: &[i32],
        now: DateTime<Utc>,
        limit: Option<i64>,
    ) -> Result<Vec<JobRow>, sqlx::Error>;

    async fn count_active_jobs(&self, category_id: i32, now: DateTime<Utc>) -> Result<i64, sqlx::Error>;

    async fn jobs_by_ids(&self, ids: &[i32]) -> Result<Vec<JobRow>, sqlx::Error>;

    /// Remove unactivated jobs created before the cutoff, returning them
    async fn delete_stale_jobs(&self, created_before: DateTime<Utc>) -> Result<Vec<JobRow>, sqlx::Error>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn all_categories(&self) -> Result<Vec<CategoryRow>, sqlx::Error>;

    async fn find_category(&self, id: i32) -> Result<Option<CategoryRow>, sqlx::Error>;

    /// Categories holding at least one active job
    async fn categories_with_active_jobs(&self, now: DateTime<Utc>) -> Result<Vec<CategoryRow>, sqlx::Error>;
}

#[async_trait]
pub trait AffiliateStore: Send + Sync {
    async fn all_affiliates(&self) -> Result<Vec<AffiliateRow>, sqlx::Error>;

    async fn find_affiliate_by_email(&self, email: &str) -> Result<Option<AffiliateRow>, sqlx::Error>;

    async fn find_active_affiliate_by_token(&self, token: &str) -> Result<Option<AffiliateRow>, sqlx::Error>;

    async fn insert_affiliate(&self, affiliate: &NewAffiliate) -> Result<AffiliateRow, sqlx::Error>;

    async fn activate_affiliate(&self, id: i32) -> Result<Option<AffiliateRow>, sqlx::Error>;
}

/// Everything the request handlers need from persistence
#[async_trait]
pub trait EntityStore: JobStore + CategoryStore + AffiliateStore {
    /// Connectivity check used by the health endpoints
    async fn ping(&self) -> Result<(), sqlx::Error>;
}

/// PostgreSQL-backed entity store
#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn find_job(&self, id: i32) -> Result<Option<JobRow>, sqlx::Error> {
        JobRepository::find(&self.pool, id).await
    }

    async fn find_job_by_token(&self, token: &str) -> Result<Option<JobRow>, sqlx::Error> {
        JobRepository::find_by_token(&self.pool, token).await
    }

    async fn insert_job(&self, job: &NewJob) -> Result<JobRow, sqlx::Error> {
        JobRepository::create(&self.pool, job).await
    }

    async fn update_job_fields(
        &self,
        id: i32,
        fields: &JobFields,
        now: DateTime<Utc>,
    ) -> Result<Option<JobRow>, sqlx::Error> {
        JobRepository::update_fields(&self.pool, id, fields, now).await
    }

    async fn save_job_schedule(&self, job: &JobRow) -> Result<Option<JobRow>, sqlx::Error> {
        JobRepository::update_schedule(&self.pool, job).await
    }

    async fn delete_job(&self, id: i32) -> Result<bool, sqlx::Error> {
        JobRepository::delete(&self.pool, id).await
    }

    async fn active_jobs(
        &self,
        category_ids: &[i32],
        now: DateTime<Utc>,
        limit: Option<i64>,
    ) -> Result<Vec<JobRow>, sqlx::Error> {
        JobRepository::active_in_categories(&self.pool, category_ids, now, limit).await
    }

    async fn public_jobs(
        &self,
        category_ids: &[i32],
        now: DateTime<Utc>,
        limit: Option<i64>,
    ) -> Result<Vec<JobRow>, sqlx::Error> {
        JobRepository::public_in_categories(&self.pool, category_ids, now, limit).await
    }

    async fn count_active_jobs(&self, category_id: i32, now: DateTime<Utc>) -> Result<i64, sqlx::Error> {
        JobRepository::count_active(&self.pool, category_id, now).await
    }

    async fn jobs_by_ids(&self, ids: &[i32]) -> Result<Vec<JobRow>, sqlx::Error> {
        JobRepository::find_many(&self.pool, ids).await
    }

    async fn delete_stale_jobs(&self, created_before: DateTime<Utc>) -> Result<Vec<JobRow>, sqlx::Error> {
        JobRepository::delete_stale(&self.pool, created_before).await
    }
}

#[async_trait]
impl CategoryStore for PgStore {
    async fn all_categories(&self) -> Result<Vec<CategoryRow>, sqlx::Error> {
        CategoryRepository::all(&self.pool).await
    }

    async fn find_category(&self, id: i32) -> Result<Option<CategoryRow>, sqlx::Error> {
        CategoryRepository::find(&self.pool, id).await
    }

    async fn categories_with_active_jobs(&self, now: DateTime<Utc>) -> Result<Vec<CategoryRow>, sqlx::Error> {
        CategoryRepository::with_active_jobs(&self.pool, now).await
    }
}

#[async_trait]
impl AffiliateStore for PgStore {
    async fn all_affiliates(&self) -> Result<Vec<AffiliateRow>, sqlx::Error> {
        AffiliateRepository::all(&self.pool).await
    }

    async fn find_affiliate_by_email(&self, email: &str) -> Result<Option<AffiliateRow>, sqlx::Error> {
        AffiliateRepository::find_by_email(&self.pool, email).await
    }

    async fn find_active_affiliate_by_token(&self, token: &str) -> Result<Option<AffiliateRow>, sqlx::Error> {
        AffiliateRepository::find_active_by_token(&self.pool, token).await
    }

    async fn insert_affiliate(&self, affiliate: &NewAffiliate) -> Result<AffiliateRow, sqlx::Error> {
        AffiliateRepository::create(&self.pool, affiliate).await
    }

    async fn activate_affiliate(&self, id: i32) -> Result<Option<AffiliateRow>, sqlx::Error> {
        AffiliateRepository::activate(&self.pool, id).await
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
