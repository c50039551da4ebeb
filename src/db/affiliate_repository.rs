use std::collections::HashMap;

use sqlx::{Pool, Postgres};
use tracing::debug;

use crate::db::models::{AffiliateRow, NewAffiliate};

const AFFILIATE_COLUMNS: &str = "id, url, email, token, is_active, created_at";

/// Repository for Affiliate database operations
pub struct AffiliateRepository;

impl AffiliateRepository {
    pub async fn all(pool: &Pool<Postgres>) -> Result<Vec<AffiliateRow>, sqlx::Error> {
        let sql = format!("SELECT {AFFILIATE_COLUMNS} FROM affiliates ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query_as::<_, AffiliateRow>(&sql).fetch_all(pool).await?;
        Self::with_categories(pool, rows).await
    }

    pub async fn find_by_email(
        pool: &Pool<Postgres>,
        email: &str,
    ) -> Result<Option<AffiliateRow>, sqlx::Error> {
        let sql = format!("SELECT {AFFILIATE_COLUMNS} FROM affiliates WHERE lower(email) = lower($1)");
        let row = sqlx::query_as::<_, AffiliateRow>(&sql)
            .bind(email)
            .fetch_optional(pool)
            .await?;
        Self::with_optional_categories(pool, row).await
    }

    pub async fn find_active_by_token(
        pool: &Pool<Postgres>,
        token: &str,
    ) -> Result<Option<AffiliateRow>, sqlx::Error> {
        let sql = format!("SELECT {AFFILIATE_COLUMNS} FROM affiliates WHERE token = $1 AND is_active = TRUE");
        let row = sqlx::query_as::<_, AffiliateRow>(&sql)
            .bind(token)
            .fetch_optional(pool)
            .await?;
        Self::with_optional_categories(pool, row).await
    }

    /// Insert the affiliate and its category links in a single transaction
    pub async fn create(
        pool: &Pool<Postgres>,
        affiliate: &NewAffiliate,
    ) -> Result<AffiliateRow, sqlx::Error> {
        debug!("Creating affiliate: url={}, email={}", affiliate.url, affiliate.email);

        let mut tx = pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO affiliates (url, email, token, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING {AFFILIATE_COLUMNS}
            "#
        );
        let mut row = sqlx::query_as::<_, AffiliateRow>(&sql)
            .bind(&affiliate.url)
            .bind(&affiliate.email)
            .bind(&affiliate.token)
            .bind(affiliate.created_at)
            .fetch_one(&mut *tx)
            .await?;

        for category_id in &affiliate.category_ids {
            sqlx::query("INSERT INTO affiliate_categories (affiliate_id, category_id) VALUES ($1, $2)")
                .bind(row.id)
                .bind(category_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        row.category_ids = affiliate.category_ids.clone();
        debug!("Affiliate created with id={}", row.id);
        Ok(row)
    }

    pub async fn activate(pool: &Pool<Postgres>, id: i32) -> Result<Option<AffiliateRow>, sqlx::Error> {
        let sql = format!("UPDATE affiliates SET is_active = TRUE WHERE id = $1 RETURNING {AFFILIATE_COLUMNS}");
        let row = sqlx::query_as::<_, AffiliateRow>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Self::with_optional_categories(pool, row).await
    }

    async fn with_optional_categories(
        pool: &Pool<Postgres>,
        row: Option<AffiliateRow>,
    ) -> Result<Option<AffiliateRow>, sqlx::Error> {
        match row {
            Some(row) => Ok(Self::with_categories(pool, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Fill `category_ids` for a batch of affiliates with one query
    async fn with_categories(
        pool: &Pool<Postgres>,
        mut rows: Vec<AffiliateRow>,
    ) -> Result<Vec<AffiliateRow>, sqlx::Error> {
        if rows.is_empty() {
            return Ok(rows);
        }

        let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();
        let links: Vec<(i32, i32)> = sqlx::query_as(
            "SELECT affiliate_id, category_id FROM affiliate_categories WHERE affiliate_id = ANY($1) ORDER BY category_id",
        )
        .bind(&ids)
        .fetch_all(pool)
        .await?;

        let mut by_affiliate: HashMap<i32, Vec<i32>> = HashMap::new();
        for (affiliate_id, category_id) in links {
            by_affiliate.entry(affiliate_id).or_default().push(category_id);
        }

        for row in &mut rows {
            row.category_ids = by_affiliate.remove(&row.id).unwrap_or_default();
        }

        Ok(rows)
    }
}
