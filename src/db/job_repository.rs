use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use tracing::debug;

use crate::db::models::{JobFields, JobRow, NewJob};

const JOB_COLUMNS: &str = r#"id, category_id, "type", company, logo, url, position, location,
    description, how_to_apply, email, is_public, is_activated, token, extension_count,
    created_at, updated_at, expires_at"#;

/// Repository for Job database operations
pub struct JobRepository;

impl JobRepository {
    pub async fn find(pool: &Pool<Postgres>, id: i32) -> Result<Option<JobRow>, sqlx::Error> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, JobRow>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_token(
        pool: &Pool<Postgres>,
        token: &str,
    ) -> Result<Option<JobRow>, sqlx::Error> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE token = $1");
        sqlx::query_as::<_, JobRow>(&sql)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_many(pool: &Pool<Postgres>, ids: &[i32]) -> Result<Vec<JobRow>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ANY($1)");
        sqlx::query_as::<_, JobRow>(&sql)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Create a new job in the database and return the full job record
    pub async fn create(pool: &Pool<Postgres>, job: &NewJob) -> Result<JobRow, sqlx::Error> {
        let fields = &job.fields;
        debug!(
            "Creating job: company={}, position={}, type={}",
            fields.company, fields.position, fields.job_type
        );

        let sql = format!(
            r#"
            INSERT INTO jobs (category_id, "type", company, logo, url, position, location,
                description, how_to_apply, email, is_public, token, created_at, updated_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13, $14)
            RETURNING {JOB_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, JobRow>(&sql)
            .bind(fields.category_id)
            .bind(&fields.job_type)
            .bind(&fields.company)
            .bind(&fields.logo)
            .bind(&fields.url)
            .bind(&fields.position)
            .bind(&fields.location)
            .bind(&fields.description)
            .bind(&fields.how_to_apply)
            .bind(&fields.email)
            .bind(fields.is_public)
            .bind(&job.token)
            .bind(job.created_at)
            .bind(job.expires_at)
            .fetch_one(pool)
            .await?;

        debug!("Job created with id={}", row.id);
        Ok(row)
    }

    pub async fn update_fields(
        pool: &Pool<Postgres>,
        id: i32,
        fields: &JobFields,
        now: DateTime<Utc>,
    ) -> Result<Option<JobRow>, sqlx::Error> {
        debug!("Updating job fields: id={}", id);

        let sql = format!(
            r#"
            UPDATE jobs
            SET category_id = $2, "type" = $3, company = $4, logo = $5, url = $6, position = $7,
                location = $8, description = $9, how_to_apply = $10, email = $11, is_public = $12,
                updated_at = $13
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#
        );

        sqlx::query_as::<_, JobRow>(&sql)
            .bind(id)
            .bind(fields.category_id)
            .bind(&fields.job_type)
            .bind(&fields.company)
            .bind(&fields.logo)
            .bind(&fields.url)
            .bind(&fields.position)
            .bind(&fields.location)
            .bind(&fields.description)
            .bind(&fields.how_to_apply)
            .bind(&fields.email)
            .bind(fields.is_public)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    pub async fn update_schedule(
        pool: &Pool<Postgres>,
        job: &JobRow,
    ) -> Result<Option<JobRow>, sqlx::Error> {
        debug!(
            "Updating job schedule: id={}, activated={}, expires_at={}",
            job.id, job.is_activated, job.expires_at
        );

        let sql = format!(
            r#"
            UPDATE jobs
            SET is_activated = $2, expires_at = $3, extension_count = $4, updated_at = $5
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#
        );

        sqlx::query_as::<_, JobRow>(&sql)
            .bind(job.id)
            .bind(job.is_activated)
            .bind(job.expires_at)
            .bind(job.extension_count)
            .bind(job.updated_at)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &Pool<Postgres>, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        debug!("Deleted job id={}: {} rows", id, result.rows_affected());
        Ok(result.rows_affected() > 0)
    }

    pub async fn active_in_categories(
        pool: &Pool<Postgres>,
        category_ids: &[i32],
        now: DateTime<Utc>,
        limit: Option<i64>,
    ) -> Result<Vec<JobRow>, sqlx::Error> {
        Self::select_active(pool, category_ids, now, limit, false).await
    }

    /// Active jobs whose owner allowed publication on affiliate sites
    pub async fn public_in_categories(
        pool: &Pool<Postgres>,
        category_ids: &[i32],
        now: DateTime<Utc>,
        limit: Option<i64>,
    ) -> Result<Vec<JobRow>, sqlx::Error> {
        Self::select_active(pool, category_ids, now, limit, true).await
    }

    async fn select_active(
        pool: &Pool<Postgres>,
        category_ids: &[i32],
        now: DateTime<Utc>,
        limit: Option<i64>,
        public_only: bool,
    ) -> Result<Vec<JobRow>, sqlx::Error> {
        if category_ids.is_empty() {
            return Ok(Vec::new());
        }

        // LIMIT NULL means no limit in PostgreSQL
        let sql = format!(
            r#"
            SELECT {JOB_COLUMNS} FROM jobs
            WHERE category_id = ANY($1) AND is_activated = TRUE AND expires_at > $2
                AND (is_public = TRUE OR $4 = FALSE)
            ORDER BY expires_at DESC
            LIMIT $3
            "#
        );

        sqlx::query_as::<_, JobRow>(&sql)
            .bind(category_ids)
            .bind(now)
            .bind(limit)
            .bind(public_only)
            .fetch_all(pool)
            .await
    }

    pub async fn count_active(
        pool: &Pool<Postgres>,
        category_id: i32,
        now: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM jobs WHERE category_id = $1 AND is_activated = TRUE AND expires_at > $2",
        )
        .bind(category_id)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Delete unactivated jobs older than the cutoff in one statement
    pub async fn delete_stale(
        pool: &Pool<Postgres>,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<JobRow>, sqlx::Error> {
        let sql = format!(
            r#"
            DELETE FROM jobs
            WHERE is_activated = FALSE AND created_at < $1
            RETURNING {JOB_COLUMNS}
            "#
        );

        let rows = sqlx::query_as::<_, JobRow>(&sql)
            .bind(created_before)
            .fetch_all(pool)
            .await?;

        debug!("Deleted {} stale jobs created before {}", rows.len(), created_before);
        Ok(rows)
    }
}
