use actix_multipart::form::{MultipartForm, tempfile::TempFile, text::Text};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::validation::FieldErrors;
use crate::db::models::{JobFields, JobRow};

/// Employment type of a job posting
#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    #[default]
    FullTime,
    PartTime,
    Freelance,
}

impl JobType {
    pub const ALL: [JobType; 3] = [JobType::FullTime, JobType::PartTime, JobType::Freelance];

    pub fn as_str(self) -> &'static str {
        match self {
            JobType::FullTime => "full-time",
            JobType::PartTime => "part-time",
            JobType::Freelance => "freelance",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            JobType::FullTime => "Full time",
            JobType::PartTime => "Part time",
            JobType::Freelance => "Freelance",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

/// Widget hints of one form field
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub help: &'static str,
}

/// Editable job fields in display order. Server-managed columns (token,
/// activation, timestamps, extension counter) are never bound from input.
pub const JOB_FIELDS: [FieldSpec; 11] = [
    FieldSpec { name: "category_id", label: "Category", help: "" },
    FieldSpec { name: "type", label: "Type", help: "" },
    FieldSpec { name: "company", label: "Company", help: "" },
    FieldSpec { name: "logo", label: "Company logo", help: "" },
    FieldSpec { name: "url", label: "Url", help: "" },
    FieldSpec { name: "position", label: "Position", help: "" },
    FieldSpec { name: "location", label: "Location", help: "" },
    FieldSpec { name: "description", label: "Description", help: "" },
    FieldSpec { name: "how_to_apply", label: "How to apply?", help: "" },
    FieldSpec {
        name: "is_public",
        label: "Public?",
        help: "Whether the job can also be published on affiliate websites or not.",
    },
    FieldSpec { name: "email", label: "Email", help: "" },
];

pub fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    JOB_FIELDS.iter().find(|spec| spec.name == name)
}

/// Multipart submission of the job form
#[derive(Debug, MultipartForm)]
pub struct JobUpload {
    pub category_id: Option<Text<String>>,
    #[multipart(rename = "type")]
    pub job_type: Option<Text<String>>,
    pub company: Option<Text<String>>,
    pub logo: Option<TempFile>,
    pub url: Option<Text<String>>,
    pub position: Option<Text<String>>,
    pub location: Option<Text<String>>,
    pub description: Option<Text<String>>,
    pub how_to_apply: Option<Text<String>>,
    pub is_public: Option<Text<String>>,
    pub email: Option<Text<String>>,
}

/// Submitted job values, blank inputs normalized to `None`
#[derive(Debug, Default, Clone, Validate, PartialEq)]
pub struct JobForm {
    pub category_id: Option<String>,
    pub job_type: Option<String>,
    #[validate(
        required(message = "Required."),
        length(max = 255, message = "At most 255 characters.")
    )]
    pub company: Option<String>,
    #[validate(
        url(message = "Invalid URL."),
        length(max = 255, message = "At most 255 characters.")
    )]
    pub url: Option<String>,
    #[validate(
        required(message = "Required."),
        length(max = 255, message = "At most 255 characters.")
    )]
    pub position: Option<String>,
    #[validate(
        required(message = "Required."),
        length(max = 255, message = "At most 255 characters.")
    )]
    pub location: Option<String>,
    #[validate(required(message = "Required."))]
    pub description: Option<String>,
    #[validate(required(message = "Required."))]
    pub how_to_apply: Option<String>,
    pub is_public: bool,
    #[validate(
        required(message = "Required."),
        email(message = "Invalid email address."),
        length(max = 255, message = "At most 255 characters.")
    )]
    pub email: Option<String>,
}

fn text(field: &Option<Text<String>>) -> Option<String> {
    field
        .as_ref()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

impl JobForm {
    /// Blank form with the defaults a new posting starts from
    pub fn for_new() -> Self {
        Self {
            job_type: Some(JobType::default().as_str().to_string()),
            is_public: true,
            ..Self::default()
        }
    }

    pub fn from_upload(upload: &JobUpload) -> Self {
        Self {
            category_id: text(&upload.category_id),
            job_type: text(&upload.job_type),
            company: text(&upload.company),
            url: text(&upload.url),
            position: text(&upload.position),
            location: text(&upload.location),
            description: text(&upload.description),
            how_to_apply: text(&upload.how_to_apply),
            // Unchecked checkboxes are not submitted at all
            is_public: matches!(text(&upload.is_public).as_deref(), Some(v) if v != "0" && v != "false"),
            email: text(&upload.email),
        }
    }

    pub fn from_job(job: &JobRow) -> Self {
        Self {
            category_id: Some(job.category_id.to_string()),
            job_type: Some(job.job_type.clone()),
            company: Some(job.company.clone()),
            url: job.url.clone(),
            position: Some(job.position.clone()),
            location: Some(job.location.clone()),
            description: Some(job.description.clone()),
            how_to_apply: Some(job.how_to_apply.clone()),
            is_public: job.is_public,
            email: Some(job.email.clone()),
        }
    }

    pub fn parsed_category_id(&self) -> Option<i32> {
        self.category_id.as_deref().and_then(|id| id.parse().ok())
    }

    /// Apply the field rules and produce the columns to persist. The logo
    /// and category existence are checked by the service.
    pub fn bind(&self) -> Result<JobFields, FieldErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(validation_errors) => FieldErrors::from(validation_errors),
        };

        let category_id = match (&self.category_id, self.parsed_category_id()) {
            (None, _) => {
                errors.add("category_id", "Required.");
                None
            }
            (Some(_), None) => {
                errors.add("category_id", "Invalid.");
                None
            }
            (Some(_), Some(id)) => Some(id),
        };

        let job_type = match self.job_type.as_deref().map(JobType::parse) {
            None => {
                errors.add("type", "Required.");
                None
            }
            Some(None) => {
                errors.add("type", "Invalid.");
                None
            }
            Some(Some(job_type)) => Some(job_type),
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        match (category_id, job_type) {
            (Some(category_id), Some(job_type)) => Ok(JobFields {
                category_id,
                job_type: job_type.as_str().to_string(),
                company: self.company.clone().unwrap_or_default(),
                logo: None,
                url: self.url.clone(),
                position: self.position.clone().unwrap_or_default(),
                location: self.location.clone().unwrap_or_default(),
                description: self.description.clone().unwrap_or_default(),
                how_to_apply: self.how_to_apply.clone().unwrap_or_default(),
                email: self.email.clone().unwrap_or_default(),
                is_public: self.is_public,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> JobForm {
        JobForm {
            category_id: Some("2".to_string()),
            job_type: Some("full-time".to_string()),
            company: Some("Acme".to_string()),
            url: None,
            position: Some("Engineer".to_string()),
            location: Some("NYC".to_string()),
            description: Some("Build things".to_string()),
            how_to_apply: Some("Apply online".to_string()),
            is_public: true,
            email: Some("hr@acme.com".to_string()),
        }
    }

    #[test]
    fn job_type_parses_known_values_only() {
        assert_eq!(JobType::parse("part-time"), Some(JobType::PartTime));
        assert_eq!(JobType::parse("freelance"), Some(JobType::Freelance));
        assert_eq!(JobType::parse("contract"), None);
        assert_eq!(JobType::default().as_str(), "full-time");
    }

    #[test]
    fn valid_form_binds_fields() {
        let fields = valid_form().bind().unwrap();
        assert_eq!(fields.category_id, 2);
        assert_eq!(fields.job_type, "full-time");
        assert_eq!(fields.company, "Acme");
        assert_eq!(fields.logo, None);
        assert!(fields.is_public);
    }

    #[test]
    fn malformed_email_is_attached_to_email_field() {
        let form = JobForm {
            email: Some("not-an-email".to_string()),
            ..valid_form()
        };
        let errors = form.bind().unwrap_err();
        assert_eq!(errors.joined("email"), "Invalid email address.");
        assert!(!errors.has("company"));
    }

    #[test]
    fn missing_required_fields_are_reported() {
        let errors = JobForm::default().bind().unwrap_err();
        for field in ["category_id", "type", "company", "position", "location", "description", "how_to_apply", "email"] {
            assert!(errors.has(field), "expected an error on {field}");
        }
        assert!(!errors.has("url"));
        assert!(!errors.has("logo"));
    }

    #[test]
    fn unknown_type_and_bad_category_are_invalid() {
        let form = JobForm {
            job_type: Some("contract".to_string()),
            category_id: Some("design".to_string()),
            ..valid_form()
        };
        let errors = form.bind().unwrap_err();
        assert_eq!(errors.joined("type"), "Invalid.");
        assert_eq!(errors.joined("category_id"), "Invalid.");
    }

    #[test]
    fn url_must_be_absolute_when_given() {
        let form = JobForm {
            url: Some("acme dot com".to_string()),
            ..valid_form()
        };
        assert_eq!(form.bind().unwrap_err().joined("url"), "Invalid URL.");

        let form = JobForm {
            url: Some("https://acme.example.com/jobs".to_string()),
            ..valid_form()
        };
        assert!(form.bind().is_ok());
    }

    #[test]
    fn new_form_defaults_to_full_time() {
        let form = JobForm::for_new();
        assert_eq!(form.job_type.as_deref(), Some("full-time"));
        assert!(form.is_public);
    }

    #[test]
    fn field_table_carries_labels_and_help() {
        assert_eq!(field_spec("how_to_apply").map(|f| f.label), Some("How to apply?"));
        assert_eq!(field_spec("category_id").map(|f| f.label), Some("Category"));
        assert!(field_spec("is_public").is_some_and(|f| !f.help.is_empty()));
        assert!(field_spec("token").is_none());
        assert!(field_spec("expires_at").is_none());
    }
}
