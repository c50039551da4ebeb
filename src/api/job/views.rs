use askama::Template;
use chrono::{DateTime, Utc};

use crate::api::validation::FieldErrors;
use crate::api::views::Choice;
use crate::db::models::{CategoryRow, JobRow};
use super::logo::LogoStorage;
use super::models::{JobForm, JobType, field_spec};
use super::service::CategoryListing;

/// One row of a job table
pub struct JobLine {
    pub path: String,
    pub position: String,
    pub company: String,
    pub location: String,
}

impl From<&JobRow> for JobLine {
    fn from(job: &JobRow) -> Self {
        Self {
            path: job.public_path(),
            position: job.position.clone(),
            company: job.company.clone(),
            location: job.location.clone(),
        }
    }
}

pub struct CategoryBlock {
    pub name: String,
    pub jobs: Vec<JobLine>,
    pub more: i64,
}

/// A recently viewed job
pub struct HistoryLink {
    pub path: String,
    pub label: String,
}

impl HistoryLink {
    /// Only publicly visible jobs are linked; the owner path is never
    /// rendered from session history.
    pub fn from_jobs(jobs: &[JobRow], now: DateTime<Utc>) -> Vec<Self> {
        jobs.iter()
            .filter(|job| job.is_active(now))
            .map(|job| Self {
                path: job.public_path(),
                label: format!("{} - {}", job.position, job.company),
            })
            .collect()
    }
}

#[derive(Template)]
#[template(path = "job/index.html")]
pub struct JobIndexView {
    pub categories: Vec<CategoryBlock>,
    pub history: Vec<HistoryLink>,
}

impl JobIndexView {
    pub fn new(listings: Vec<CategoryListing>, history: Vec<HistoryLink>) -> Self {
        let categories = listings
            .into_iter()
            .map(|listing| CategoryBlock {
                name: listing.category.name,
                jobs: listing.jobs.iter().map(JobLine::from).collect(),
                more: listing.more,
            })
            .collect();

        Self { categories, history }
    }
}

#[derive(Template)]
#[template(path = "job/show.html")]
pub struct JobShowView {
    pub job: JobRow,
    pub logo_url: Option<String>,
    pub job_type: &'static str,
    pub posted_on: String,
    pub flash: Option<String>,
    pub history: Vec<HistoryLink>,
    /// Present when the page was reached through the owner token
    pub owner: Option<OwnerBar>,
}

/// Controls shown to the job owner
pub struct OwnerBar {
    pub csrf_token: String,
    pub owner_path: String,
    pub is_activated: bool,
    pub is_expired: bool,
    pub days_before_expires: i64,
    pub can_extend: bool,
    pub active_days: i64,
}

impl JobShowView {
    pub fn new(job: JobRow, flash: Option<String>, history: Vec<HistoryLink>) -> Self {
        Self {
            logo_url: job.logo.as_deref().map(LogoStorage::url),
            job_type: JobType::parse(&job.job_type).map(JobType::label).unwrap_or_default(),
            posted_on: job.created_at.format("%m/%d/%Y").to_string(),
            job,
            flash,
            history,
            owner: None,
        }
    }

    pub fn with_owner_bar(mut self, csrf_token: &str, can_extend: bool, active_days: i64, now: DateTime<Utc>) -> Self {
        self.owner = Some(OwnerBar {
            csrf_token: csrf_token.to_string(),
            owner_path: self.job.owner_path(),
            is_activated: self.job.is_activated,
            is_expired: self.job.is_expired(now),
            days_before_expires: self.job.days_before_expires(now),
            can_extend,
            active_days,
        });
        self
    }
}

/// New and edit job form
#[derive(Template)]
#[template(path = "job/form.html")]
pub struct JobFormView {
    pub title: &'static str,
    pub action: String,
    pub form: JobForm,
    pub errors: FieldErrors,
    pub categories: Vec<Choice>,
    pub types: Vec<Choice>,
    pub current_logo: Option<String>,
    /// Owner page of the job being edited
    pub back: Option<String>,
}

impl JobFormView {
    fn build(title: &'static str, action: String, form: JobForm, errors: FieldErrors, categories: &[CategoryRow]) -> Self {
        let selected_category = form.category_id.clone().unwrap_or_default();
        let selected_type = form.job_type.clone().unwrap_or_default();

        Self {
            title,
            action,
            categories: categories
                .iter()
                .map(|c| Choice {
                    value: c.id.to_string(),
                    label: c.name.clone(),
                    selected: c.id.to_string() == selected_category,
                })
                .collect(),
            types: JobType::ALL
                .iter()
                .map(|t| Choice {
                    value: t.as_str().to_string(),
                    label: t.label().to_string(),
                    selected: t.as_str() == selected_type,
                })
                .collect(),
            form,
            errors,
            current_logo: None,
            back: None,
        }
    }

    pub fn new_job(form: JobForm, errors: FieldErrors, categories: &[CategoryRow]) -> Self {
        Self::build("New Job", "/job/create".to_string(), form, errors, categories)
    }

    pub fn edit_job(job: &JobRow, form: JobForm, errors: FieldErrors, categories: &[CategoryRow]) -> Self {
        let mut view = Self::build("Edit Job", format!("{}/update", job.owner_path()), form, errors, categories);
        view.current_logo = job.logo.as_deref().map(LogoStorage::url);
        view.back = Some(job.owner_path());
        view
    }

    pub fn label(&self, field: &str) -> &'static str {
        field_spec(field).map(|spec| spec.label).unwrap_or_default()
    }

    pub fn help(&self, field: &str) -> &'static str {
        field_spec(field).map(|spec| spec.help).unwrap_or_default()
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.has(field)
    }

    pub fn error(&self, field: &str) -> String {
        self.errors.joined(field)
    }

    /// Submitted value of a text input
    pub fn value(&self, field: &str) -> &str {
        let value = match field {
            "company" => &self.form.company,
            "url" => &self.form.url,
            "position" => &self.form.position,
            "location" => &self.form.location,
            "description" => &self.form.description,
            "how_to_apply" => &self.form.how_to_apply,
            "email" => &self.form.email,
            _ => return "",
        };
        value.as_deref().unwrap_or_default()
    }
}
