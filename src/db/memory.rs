use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::models::{
    AffiliateRow, CategoryRow, JobFields, JobRow, NewAffiliate, NewJob,
};
use crate::db::store::{AffiliateStore, CategoryStore, EntityStore, JobStore};

#[derive(Default)]
struct Tables {
    categories: Vec<CategoryRow>,
    jobs: Vec<JobRow>,
    affiliates: Vec<AffiliateRow>,
    next_job_id: i32,
    next_affiliate_id: i32,
}

/// In-memory entity store mirroring the PostgreSQL queries, seeded with
/// the same categories as the migrations
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let categories = ["Design", "Programming", "Manager", "Administrator"]
            .iter()
            .enumerate()
            .map(|(i, name)| CategoryRow {
                id: i as i32 + 1,
                name: name.to_string(),
                slug: name.to_lowercase(),
            })
            .collect();

        Self {
            tables: Mutex::new(Tables {
                categories,
                next_job_id: 1,
                next_affiliate_id: 1,
                ..Tables::default()
            }),
        }
    }

    pub fn job_count(&self) -> usize {
        self.tables.lock().unwrap().jobs.len()
    }

    pub fn affiliate_count(&self) -> usize {
        self.tables.lock().unwrap().affiliates.len()
    }
}

fn sort_by_expiry(jobs: &mut [JobRow]) {
    jobs.sort_by(|a, b| b.expires_at.cmp(&a.expires_at).then(b.id.cmp(&a.id)));
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn find_job(&self, id: i32) -> Result<Option<JobRow>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.jobs.iter().find(|job| job.id == id).cloned())
    }

    async fn find_job_by_token(&self, token: &str) -> Result<Option<JobRow>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.jobs.iter().find(|job| job.token == token).cloned())
    }

    async fn insert_job(&self, job: &NewJob) -> Result<JobRow, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let fields = job.fields.clone();
        let row = JobRow {
            id: tables.next_job_id,
            category_id: fields.category_id,
            job_type: fields.job_type,
            company: fields.company,
            logo: fields.logo,
            url: fields.url,
            position: fields.position,
            location: fields.location,
            description: fields.description,
            how_to_apply: fields.how_to_apply,
            email: fields.email,
            is_public: fields.is_public,
            is_activated: false,
            token: job.token.clone(),
            extension_count: 0,
            created_at: job.created_at,
            updated_at: job.created_at,
            expires_at: job.expires_at,
        };
        tables.next_job_id += 1;
        tables.jobs.push(row.clone());
        Ok(row)
    }

    async fn update_job_fields(
        &self,
        id: i32,
        fields: &JobFields,
        now: DateTime<Utc>,
    ) -> Result<Option<JobRow>, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let Some(row) = tables.jobs.iter_mut().find(|job| job.id == id) else {
            return Ok(None);
        };
        let fields = fields.clone();
        row.category_id = fields.category_id;
        row.job_type = fields.job_type;
        row.company = fields.company;
        row.logo = fields.logo;
        row.url = fields.url;
        row.position = fields.position;
        row.location = fields.location;
        row.description = fields.description;
        row.how_to_apply = fields.how_to_apply;
        row.email = fields.email;
        row.is_public = fields.is_public;
        row.updated_at = now;
        Ok(Some(row.clone()))
    }

    async fn save_job_schedule(&self, job: &JobRow) -> Result<Option<JobRow>, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let Some(row) = tables.jobs.iter_mut().find(|row| row.id == job.id) else {
            return Ok(None);
        };
        row.is_activated = job.is_activated;
        row.expires_at = job.expires_at;
        row.extension_count = job.extension_count;
        row.updated_at = job.updated_at;
        Ok(Some(row.clone()))
    }

    async fn delete_job(&self, id: i32) -> Result<bool, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.jobs.len();
        tables.jobs.retain(|job| job.id != id);
        Ok(tables.jobs.len() < before)
    }

    async fn active_jobs(
        &self,
        category_ids: &[i32],
        now: DateTime<Utc>,
        limit: Option<i64>,
    ) -> Result<Vec<JobRow>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        let mut jobs: Vec<JobRow> = tables
            .jobs
            .iter()
            .filter(|job| category_ids.contains(&job.category_id) && job.is_active(now))
            .cloned()
            .collect();
        sort_by_expiry(&mut jobs);
        if let Some(limit) = limit {
            jobs.truncate(limit.max(0) as usize);
        }
        Ok(jobs)
    }

    async fn public_jobs(
        &self,
        category_ids: &[i32],
        now: DateTime<Utc>,
        limit: Option<i64>,
    ) -> Result<Vec<JobRow>, sqlx::Error> {
        let mut jobs = self.active_jobs(category_ids, now, None).await?;
        jobs.retain(|job| job.is_public);
        if let Some(limit) = limit {
            jobs.truncate(limit.max(0) as usize);
        }
        Ok(jobs)
    }

    async fn count_active_jobs(&self, category_id: i32, now: DateTime<Utc>) -> Result<i64, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .jobs
            .iter()
            .filter(|job| job.category_id == category_id && job.is_active(now))
            .count() as i64)
    }

    async fn jobs_by_ids(&self, ids: &[i32]) -> Result<Vec<JobRow>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .jobs
            .iter()
            .filter(|job| ids.contains(&job.id))
            .cloned()
            .collect())
    }

    async fn delete_stale_jobs(&self, created_before: DateTime<Utc>) -> Result<Vec<JobRow>, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let (stale, kept): (Vec<JobRow>, Vec<JobRow>) = tables
            .jobs
            .drain(..)
            .partition(|job| !job.is_activated && job.created_at < created_before);
        tables.jobs = kept;
        Ok(stale)
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn all_categories(&self) -> Result<Vec<CategoryRow>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        let mut categories = tables.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_category(&self, id: i32) -> Result<Option<CategoryRow>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn categories_with_active_jobs(&self, now: DateTime<Utc>) -> Result<Vec<CategoryRow>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        let mut categories: Vec<CategoryRow> = tables
            .categories
            .iter()
            .filter(|c| {
                tables
                    .jobs
                    .iter()
                    .any(|job| job.category_id == c.id && job.is_active(now))
            })
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }
}

#[async_trait]
impl AffiliateStore for MemoryStore {
    async fn all_affiliates(&self) -> Result<Vec<AffiliateRow>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        let mut affiliates = tables.affiliates.clone();
        affiliates.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(affiliates)
    }

    async fn find_affiliate_by_email(&self, email: &str) -> Result<Option<AffiliateRow>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .affiliates
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_active_affiliate_by_token(&self, token: &str) -> Result<Option<AffiliateRow>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .affiliates
            .iter()
            .find(|a| a.token == token && a.is_active)
            .cloned())
    }

    async fn insert_affiliate(&self, affiliate: &NewAffiliate) -> Result<AffiliateRow, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let row = AffiliateRow {
            id: tables.next_affiliate_id,
            url: affiliate.url.clone(),
            email: affiliate.email.clone(),
            token: affiliate.token.clone(),
            is_active: false,
            created_at: affiliate.created_at,
            category_ids: affiliate.category_ids.clone(),
        };
        tables.next_affiliate_id += 1;
        tables.affiliates.push(row.clone());
        Ok(row)
    }

    async fn activate_affiliate(&self, id: i32) -> Result<Option<AffiliateRow>, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let Some(row) = tables.affiliates.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        row.is_active = true;
        Ok(Some(row.clone()))
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn ping(&self) -> Result<(), sqlx::Error> {
        Ok(())
    }
}
