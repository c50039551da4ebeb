use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database representation of a job posting with all fields
#[derive(Debug, Clone, FromRow)]
pub struct JobRow {
    pub id: i32,
    pub category_id: i32,
    #[sqlx(rename = "type")]
    pub job_type: String,
    pub company: String,
    pub logo: Option<String>,
    pub url: Option<String>,
    pub position: String,
    pub location: String,
    pub description: String,
    pub how_to_apply: String,
    pub email: String,
    pub is_public: bool,
    pub is_activated: bool,
    pub token: String,
    pub extension_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl JobRow {
    /// A job is publicly visible once activated and until it expires
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.is_activated && now < self.expires_at
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whole days left before expiry, negative once expired
    pub fn days_before_expires(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_days()
    }

    pub fn company_slug(&self) -> String {
        slugify(&self.company)
    }

    pub fn location_slug(&self) -> String {
        slugify(&self.location)
    }

    pub fn position_slug(&self) -> String {
        slugify(&self.position)
    }

    /// Public URL path of the job, matched by the public show route
    pub fn public_path(&self) -> String {
        format!(
            "/job/{}/{}/{}/{}",
            self.company_slug(),
            self.location_slug(),
            self.id,
            self.position_slug()
        )
    }

    /// Owner URL path, keyed by the private token
    pub fn owner_path(&self) -> String {
        format!("/job/{}", self.token)
    }
}

/// Editable job columns, bound from a validated form
#[derive(Debug, Clone, PartialEq)]
pub struct JobFields {
    pub category_id: i32,
    pub job_type: String,
    pub company: String,
    pub logo: Option<String>,
    pub url: Option<String>,
    pub position: String,
    pub location: String,
    pub description: String,
    pub how_to_apply: String,
    pub email: String,
    pub is_public: bool,
}

/// Data required to insert a new [`JobRow`]
#[derive(Debug, Clone)]
pub struct NewJob {
    pub fields: JobFields,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CategoryRow {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

/// Database representation of an affiliate partner
#[derive(Debug, Clone, FromRow)]
pub struct AffiliateRow {
    pub id: i32,
    pub url: String,
    pub email: String,
    pub token: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub category_ids: Vec<i32>,
}

/// Data required to insert a new [`AffiliateRow`]
#[derive(Debug, Clone)]
pub struct NewAffiliate {
    pub url: String,
    pub email: String,
    pub token: String,
    pub category_ids: Vec<i32>,
    pub created_at: DateTime<Utc>,
}

/// Lowercases text and collapses every run of non-alphanumerics into `-`.
/// Unicode letters are kept, so "Zürich" stays "zürich".
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');

    if slug.is_empty() {
        "n-a".to_string()
    } else {
        slug.to_string()
    }
}
