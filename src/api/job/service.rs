use std::sync::Arc;

use actix_multipart::form::tempfile::TempFile;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::api::error::AppError;
use crate::api::validation::{FieldErrors, Submission};
use crate::config::JobSettings;
use crate::db::EntityStore;
use crate::db::store::{CategoryStore, JobStore};
use crate::db::models::{CategoryRow, JobFields, JobRow, NewJob};
use crate::token::owner_token;
use super::logo::{LogoStorage, PendingLogo};
use super::models::JobForm;

/// A homepage category block
#[derive(Debug)]
pub struct CategoryListing {
    pub category: CategoryRow,
    pub jobs: Vec<JobRow>,
    /// Active jobs not shown on the homepage
    pub more: i64,
}

/// Job service containing business logic
pub struct JobService {
    store: Arc<dyn EntityStore>,
    settings: JobSettings,
    logos: LogoStorage,
}

impl JobService {
    pub fn new(store: Arc<dyn EntityStore>, settings: JobSettings, logos: LogoStorage) -> Self {
        Self { store, settings, logos }
    }

    pub fn settings(&self) -> &JobSettings {
        &self.settings
    }

    pub fn logos(&self) -> &LogoStorage {
        &self.logos
    }

    /// Categories holding active jobs, each with its newest jobs
    pub async fn homepage(&self, now: DateTime<Utc>) -> Result<Vec<CategoryListing>, AppError> {
        let categories = self.store.categories_with_active_jobs(now).await?;
        let mut listings = Vec::with_capacity(categories.len());

        for category in categories {
            let jobs = self
                .store
                .active_jobs(&[category.id], now, Some(self.settings.max_jobs_on_homepage))
                .await?;
            let total = self.store.count_active_jobs(category.id, now).await?;
            let more = (total - jobs.len() as i64).max(0);
            listings.push(CategoryListing { category, jobs, more });
        }

        Ok(listings)
    }

    pub async fn categories(&self) -> Result<Vec<CategoryRow>, AppError> {
        Ok(self.store.all_categories().await?)
    }

    pub async fn find_by_token(&self, token: &str) -> Result<JobRow, AppError> {
        self.store
            .find_job_by_token(token)
            .await?
            .ok_or_else(|| AppError::not_found("Job not found"))
    }

    /// Resolve a job by id, only while it is publicly visible
    pub async fn find_public(&self, id: i32, now: DateTime<Utc>) -> Result<JobRow, AppError> {
        self.store
            .find_job(id)
            .await?
            .filter(|job| job.is_active(now))
            .ok_or_else(|| AppError::not_found(format!("Job with id {} not found", id)))
    }

    /// Jobs of a view history, in history order, skipping deleted ones
    pub async fn history(&self, ids: &[i32]) -> Result<Vec<JobRow>, AppError> {
        let mut jobs = self.store.jobs_by_ids(ids).await?;
        jobs.sort_by_key(|job| ids.iter().position(|id| *id == job.id));
        Ok(jobs)
    }

    /// Run every field rule, including the ones needing the store or the upload
    async fn check<'a>(
        &self,
        form: &JobForm,
        logo: Option<&'a TempFile>,
    ) -> Result<Result<(JobFields, Option<PendingLogo<'a>>), FieldErrors>, AppError> {
        let mut errors = FieldErrors::new();

        let fields = match form.bind() {
            Ok(fields) => Some(fields),
            Err(field_errors) => {
                errors.merge(field_errors);
                None
            }
        };

        if let Some(category_id) = form.parsed_category_id() {
            if self.store.find_category(category_id).await?.is_none() {
                errors.add("category_id", "Invalid.");
            }
        }

        let pending = match self.logos.inspect(logo) {
            Ok(pending) => pending,
            Err(message) => {
                errors.add("logo", message);
                None
            }
        };

        match fields {
            Some(fields) if errors.is_empty() => Ok(Ok((fields, pending))),
            _ => Ok(Err(errors)),
        }
    }

    /// Create a job from a submitted form
    ///
    /// Nothing is written, neither row nor logo file, unless every field is valid.
    /// The job starts unactivated with a fresh owner token.
    pub async fn create(
        &self,
        form: &JobForm,
        logo: Option<&TempFile>,
        now: DateTime<Utc>,
    ) -> Result<Submission<JobRow>, AppError> {
        let (mut fields, pending) = match self.check(form, logo).await? {
            Ok(checked) => checked,
            Err(errors) => {
                warn!("Service: Job form rejected: {:?}", errors);
                return Ok(Submission::Invalid(errors));
            }
        };

        if let Some(pending) = &pending {
            fields.logo = Some(self.logos.save(pending)?);
        }

        let new_job = NewJob {
            token: owner_token(&fields.email),
            fields,
            created_at: now,
            expires_at: now + Duration::days(self.settings.active_days),
        };

        match self.store.insert_job(&new_job).await {
            Ok(job) => {
                info!("Service: Job created successfully with id={}", job.id);
                Ok(Submission::Saved(job))
            }
            Err(e) => {
                if let Some(name) = &new_job.fields.logo {
                    self.logos.remove(name);
                }
                Err(e.into())
            }
        }
    }

    /// Update the editable fields of a job. Without a new upload the current
    /// logo is kept.
    pub async fn update(
        &self,
        job: &JobRow,
        form: &JobForm,
        logo: Option<&TempFile>,
        now: DateTime<Utc>,
    ) -> Result<Submission<JobRow>, AppError> {
        let (mut fields, pending) = match self.check(form, logo).await? {
            Ok(checked) => checked,
            Err(errors) => {
                warn!("Service: Job form rejected for id={}: {:?}", job.id, errors);
                return Ok(Submission::Invalid(errors));
            }
        };

        let new_logo = match &pending {
            Some(pending) => Some(self.logos.save(pending)?),
            None => None,
        };
        fields.logo = new_logo.clone().or_else(|| job.logo.clone());

        let updated = match self.store.update_job_fields(job.id, &fields, now).await {
            Ok(updated) => updated,
            Err(e) => {
                if let Some(name) = &new_logo {
                    self.logos.remove(name);
                }
                return Err(e.into());
            }
        };

        let Some(updated) = updated else {
            if let Some(name) = &new_logo {
                self.logos.remove(name);
            }
            return Err(AppError::not_found(format!("Job with id {} not found", job.id)));
        };

        if let (Some(_), Some(old)) = (&new_logo, &job.logo) {
            self.logos.remove(old);
        }

        info!("Service: Job updated: id={}", updated.id);
        Ok(Submission::Saved(updated))
    }

    pub async fn delete(&self, job: &JobRow) -> Result<(), AppError> {
        if !self.store.delete_job(job.id).await? {
            return Err(AppError::not_found(format!("Job with id {} not found", job.id)));
        }
        if let Some(logo) = &job.logo {
            self.logos.remove(logo);
        }

        info!("Service: Job deleted: id={}", job.id);
        Ok(())
    }

    /// Activate a job. The expiry is recomputed from `now` on every call.
    pub async fn publish(&self, job: &JobRow, now: DateTime<Utc>) -> Result<JobRow, AppError> {
        let mut job = job.clone();
        job.is_activated = true;
        job.expires_at = now + Duration::days(self.settings.active_days);
        job.updated_at = now;

        let job = self
            .store
            .save_job_schedule(&job)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Job with id {} not found", job.id)))?;

        info!("Service: Job published: id={}, expires_at={}", job.id, job.expires_at);
        Ok(job)
    }

    /// Extension policy: activated, expiring within the configured window,
    /// and below the extension limit when one is set
    pub fn can_extend(&self, job: &JobRow, now: DateTime<Utc>) -> bool {
        let within_window = job.expires_at - now < Duration::days(self.settings.extend_window_days);
        let below_limit = self.settings.max_extensions == 0
            || u32::try_from(job.extension_count).unwrap_or(u32::MAX) < self.settings.max_extensions;

        job.is_activated && within_window && below_limit
    }

    /// Push the expiry of an eligible job; ineligible jobs are reported as not found
    pub async fn extend(&self, job: &JobRow, now: DateTime<Utc>) -> Result<JobRow, AppError> {
        if !self.can_extend(job, now) {
            return Err(AppError::not_found(format!("Job with id {} cannot be extended", job.id)));
        }

        let mut job = job.clone();
        job.expires_at = now + Duration::days(self.settings.active_days);
        job.extension_count += 1;
        job.updated_at = now;

        let job = self
            .store
            .save_job_schedule(&job)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Job with id {} not found", job.id)))?;

        info!("Service: Job extended: id={}, expires_at={}", job.id, job.expires_at);
        Ok(job)
    }

    /// Delete unactivated jobs older than `days`, returning how many went
    pub async fn cleanup(&self, days: i64, now: DateTime<Utc>) -> Result<usize, AppError> {
        let stale = self.store.delete_stale_jobs(now - Duration::days(days)).await?;
        for logo in stale.iter().filter_map(|job| job.logo.as_deref()) {
            self.logos.remove(logo);
        }

        info!("Service: Removed {} stale jobs older than {} days", stale.len(), days);
        Ok(stale.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::job::logo::tests::{PNG_BYTES, temp_upload};
    use crate::db::memory::MemoryStore;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: JobService,
        _uploads: tempfile::TempDir,
    }

    fn fixture(settings: JobSettings) -> Fixture {
        let uploads = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let service = JobService::new(
            store.clone(),
            settings,
            LogoStorage::new(uploads.path().join("jobs"), 64 * 1024),
        );
        Fixture {
            store,
            service,
            _uploads: uploads,
        }
    }

    fn form() -> JobForm {
        JobForm {
            category_id: Some("2".to_string()),
            job_type: Some("full-time".to_string()),
            company: Some("Acme".to_string()),
            url: None,
            position: Some("Engineer".to_string()),
            location: Some("NYC".to_string()),
            description: Some("...".to_string()),
            how_to_apply: Some("Apply online".to_string()),
            is_public: true,
            email: Some("hr@acme.com".to_string()),
        }
    }

    async fn created(f: &Fixture, now: DateTime<Utc>) -> JobRow {
        match f.service.create(&form(), None, now).await.unwrap() {
            Submission::Saved(job) => job,
            Submission::Invalid(errors) => panic!("unexpected errors: {errors:?}"),
        }
    }

    #[actix_web::test]
    async fn create_persists_one_unactivated_job() {
        let f = fixture(JobSettings::default());
        let now = Utc::now();
        let job = created(&f, now).await;

        assert_eq!(f.store.job_count(), 1);
        assert!(!job.is_activated);
        assert_eq!(job.company, "Acme");
        assert_eq!(job.expires_at, now + Duration::days(30));
        assert_eq!(job.token.len(), 64);
    }

    #[actix_web::test]
    async fn create_with_bad_email_persists_nothing() {
        let f = fixture(JobSettings::default());
        let bad = JobForm {
            email: Some("not-an-email".to_string()),
            ..form()
        };

        match f.service.create(&bad, None, Utc::now()).await.unwrap() {
            Submission::Invalid(errors) => assert!(errors.has("email")),
            Submission::Saved(_) => panic!("invalid form was saved"),
        }
        assert_eq!(f.store.job_count(), 0);
    }

    #[actix_web::test]
    async fn unknown_category_is_rejected() {
        let f = fixture(JobSettings::default());
        let bad = JobForm {
            category_id: Some("99".to_string()),
            ..form()
        };

        match f.service.create(&bad, None, Utc::now()).await.unwrap() {
            Submission::Invalid(errors) => assert_eq!(errors.joined("category_id"), "Invalid."),
            Submission::Saved(_) => panic!("job saved with unknown category"),
        }
    }

    #[actix_web::test]
    async fn invalid_logo_writes_no_file() {
        let f = fixture(JobSettings::default());
        let upload = temp_upload(b"plain text", "text/plain");

        match f.service.create(&form(), Some(&upload), Utc::now()).await.unwrap() {
            Submission::Invalid(errors) => assert!(errors.has("logo")),
            Submission::Saved(_) => panic!("job saved with invalid logo"),
        }
        assert_eq!(f.store.job_count(), 0);
        assert!(!f.service.logos().dir().exists());
    }

    #[actix_web::test]
    async fn update_keeps_logo_when_none_uploaded() {
        let f = fixture(JobSettings::default());
        let upload = temp_upload(PNG_BYTES, "image/png");
        let job = match f.service.create(&form(), Some(&upload), Utc::now()).await.unwrap() {
            Submission::Saved(job) => job,
            Submission::Invalid(errors) => panic!("unexpected errors: {errors:?}"),
        };
        let logo = job.logo.clone().expect("logo stored");

        let changed = JobForm {
            position: Some("Senior Engineer".to_string()),
            ..form()
        };
        let updated = match f.service.update(&job, &changed, None, Utc::now()).await.unwrap() {
            Submission::Saved(job) => job,
            Submission::Invalid(errors) => panic!("unexpected errors: {errors:?}"),
        };

        assert_eq!(updated.position, "Senior Engineer");
        assert_eq!(updated.logo.as_deref(), Some(logo.as_str()));
        assert!(f.service.logos().dir().join(&logo).exists());
    }

    #[actix_web::test]
    async fn publish_recomputes_expiry_from_call_time() {
        let f = fixture(JobSettings::default());
        let start = Utc::now();
        let job = created(&f, start).await;

        let first = f.service.publish(&job, start + Duration::days(1)).await.unwrap();
        assert!(first.is_activated);
        assert_eq!(first.expires_at, start + Duration::days(31));

        let second = f.service.publish(&first, start + Duration::days(3)).await.unwrap();
        assert!(second.is_activated);
        assert_eq!(second.expires_at, start + Duration::days(33));
    }

    #[actix_web::test]
    async fn extend_rejects_ineligible_jobs_without_changes() {
        let f = fixture(JobSettings::default());
        let now = Utc::now();
        let job = created(&f, now).await;

        // Unactivated
        assert!(matches!(f.service.extend(&job, now).await, Err(AppError::NotFound(_))));

        // Expiring far in the future
        let job = f.service.publish(&job, now).await.unwrap();
        assert!(matches!(f.service.extend(&job, now).await, Err(AppError::NotFound(_))));

        let stored = f.store.find_job(job.id).await.unwrap().unwrap();
        assert_eq!(stored.expires_at, job.expires_at);
        assert_eq!(stored.extension_count, 0);
    }

    #[actix_web::test]
    async fn extend_pushes_expiry_inside_window() {
        let f = fixture(JobSettings::default());
        let start = Utc::now();
        let job = created(&f, start).await;
        let job = f.service.publish(&job, start).await.unwrap();

        let later = start + Duration::days(27);
        let extended = f.service.extend(&job, later).await.unwrap();
        assert_eq!(extended.expires_at, later + Duration::days(30));
        assert_eq!(extended.extension_count, 1);
        assert!(extended.expires_at > job.expires_at);
    }

    #[actix_web::test]
    async fn extension_limit_is_enforced() {
        let f = fixture(JobSettings {
            max_extensions: 1,
            ..JobSettings::default()
        });
        let start = Utc::now();
        let job = created(&f, start).await;
        let job = f.service.publish(&job, start).await.unwrap();

        let job = f.service.extend(&job, start + Duration::days(27)).await.unwrap();
        let again = f.service.extend(&job, start + Duration::days(56)).await;
        assert!(matches!(again, Err(AppError::NotFound(_))));
    }

    #[actix_web::test]
    async fn homepage_lists_categories_with_active_jobs() {
        let f = fixture(JobSettings {
            max_jobs_on_homepage: 1,
            ..JobSettings::default()
        });
        let now = Utc::now();
        assert!(f.service.homepage(now).await.unwrap().is_empty());

        let a = created(&f, now).await;
        let b = created(&f, now).await;
        created(&f, now).await;
        f.service.publish(&a, now).await.unwrap();
        f.service.publish(&b, now).await.unwrap();

        let listings = f.service.homepage(now).await.unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].category.name, "Programming");
        assert_eq!(listings[0].jobs.len(), 1);
        assert_eq!(listings[0].more, 1);
    }

    #[actix_web::test]
    async fn expired_jobs_are_not_public() {
        let f = fixture(JobSettings::default());
        let start = Utc::now();
        let job = created(&f, start).await;
        assert!(f.service.find_public(job.id, start).await.is_err());

        let job = f.service.publish(&job, start).await.unwrap();
        assert!(f.service.find_public(job.id, start).await.is_ok());
        assert!(f.service.find_public(job.id, start + Duration::days(31)).await.is_err());
    }

    #[actix_web::test]
    async fn history_follows_requested_order() {
        let f = fixture(JobSettings::default());
        let now = Utc::now();
        let a = created(&f, now).await;
        let b = created(&f, now).await;

        let jobs = f.service.history(&[b.id, 404, a.id]).await.unwrap();
        let ids: Vec<i32> = jobs.iter().map(|job| job.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[actix_web::test]
    async fn cleanup_only_removes_old_unactivated_jobs() {
        let f = fixture(JobSettings::default());
        let now = Utc::now();
        let old = created(&f, now - Duration::days(90)).await;
        let published = created(&f, now - Duration::days(90)).await;
        f.service.publish(&published, now).await.unwrap();
        let fresh = created(&f, now).await;

        assert_eq!(f.service.cleanup(60, now).await.unwrap(), 1);
        assert!(f.store.find_job(old.id).await.unwrap().is_none());
        assert!(f.store.find_job(published.id).await.unwrap().is_some());
        assert!(f.store.find_job(fresh.id).await.unwrap().is_some());
    }

    #[actix_web::test]
    async fn delete_removes_job() {
        let f = fixture(JobSettings::default());
        let job = created(&f, Utc::now()).await;
        f.service.delete(&job).await.unwrap();
        assert_eq!(f.store.job_count(), 0);
        assert!(matches!(f.service.delete(&job).await, Err(AppError::NotFound(_))));
    }
}
