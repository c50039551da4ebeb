use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap};
use validator::Validate;

use crate::api::job::LogoStorage;
use crate::db::models::JobRow;

pub const DEFAULT_FEED_LIMIT: i64 = 100;

/// Serialization format of the affiliate feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Format named by a `jobs.{format}` suffix; unknown suffixes have no format
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            _ => None,
        }
    }

    /// Negotiate from an `Accept` header, JSON unless YAML is asked for
    pub fn from_accept(accept: Option<&str>) -> Self {
        let wants_yaml = accept.is_some_and(|accept| {
            accept.split(',').any(|media| {
                let media = media.split(';').next().unwrap_or_default().trim();
                matches!(media, "text/yaml" | "application/yaml" | "application/x-yaml" | "text/x-yaml")
            })
        });
        if wants_yaml { Format::Yaml } else { Format::Json }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct FeedQuery {
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<i64>,
}

impl FeedQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_FEED_LIMIT)
    }
}

/// One job as exposed to affiliates
#[derive(Debug, Serialize)]
pub struct JobFeedEntry {
    pub category: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub company: String,
    pub logo: Option<String>,
    pub url: Option<String>,
    pub position: String,
    pub location: String,
    pub description: String,
    pub how_to_apply: String,
    pub expires_at: DateTime<Utc>,
}

impl JobFeedEntry {
    pub fn new(job: &JobRow, category: &str, base_url: &str) -> Self {
        Self {
            category: category.to_string(),
            job_type: job.job_type.clone(),
            company: job.company.clone(),
            logo: job.logo.as_deref().map(|name| format!("{base_url}{}", LogoStorage::url(name))),
            url: job.url.clone(),
            position: job.position.clone(),
            location: job.location.clone(),
            description: job.description.clone(),
            how_to_apply: job.how_to_apply.clone(),
            expires_at: job.expires_at,
        }
    }
}

/// Jobs keyed by their absolute public URL, serialized as a mapping in
/// listing order
#[derive(Debug, Default)]
pub struct Feed(pub Vec<(String, JobFeedEntry)>);

impl Serialize for Feed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (url, entry) in &self.0 {
            map.serialize_entry(url, entry)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_selects_known_formats_only() {
        assert_eq!(Format::from_suffix("json"), Some(Format::Json));
        assert_eq!(Format::from_suffix("yaml"), Some(Format::Yaml));
        assert_eq!(Format::from_suffix("xml"), None);
    }

    #[test]
    fn accept_header_defaults_to_json() {
        assert_eq!(Format::from_accept(None), Format::Json);
        assert_eq!(Format::from_accept(Some("*/*")), Format::Json);
        assert_eq!(Format::from_accept(Some("text/html, text/yaml;q=0.9")), Format::Yaml);
        assert_eq!(Format::from_accept(Some("application/x-yaml")), Format::Yaml);
    }

    #[test]
    fn limit_is_bounded() {
        assert!(FeedQuery { limit: Some(0) }.validate().is_err());
        assert!(FeedQuery { limit: Some(101) }.validate().is_err());
        assert!(FeedQuery { limit: Some(100) }.validate().is_ok());
        assert_eq!(FeedQuery { limit: None }.limit(), DEFAULT_FEED_LIMIT);
    }
}
