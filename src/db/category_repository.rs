use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::db::models::CategoryRow;

/// Repository for Category database operations
pub struct CategoryRepository;

impl CategoryRepository {
    pub async fn all(pool: &Pool<Postgres>) -> Result<Vec<CategoryRow>, sqlx::Error> {
        sqlx::query_as::<_, CategoryRow>("SELECT id, name, slug FROM categories ORDER BY name")
            .fetch_all(pool)
            .await
    }

    pub async fn find(pool: &Pool<Postgres>, id: i32) -> Result<Option<CategoryRow>, sqlx::Error> {
        sqlx::query_as::<_, CategoryRow>("SELECT id, name, slug FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn with_active_jobs(
        pool: &Pool<Postgres>,
        now: DateTime<Utc>,
    ) -> Result<Vec<CategoryRow>, sqlx::Error> {
        sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT c.id, c.name, c.slug
            FROM categories c
            WHERE EXISTS (
                SELECT 1 FROM jobs j
                WHERE j.category_id = c.id AND j.is_activated = TRUE AND j.expires_at > $1
            )
            ORDER BY c.name
            "#,
        )
        .bind(now)
        .fetch_all(pool)
        .await
    }
}
