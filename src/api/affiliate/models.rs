use validator::Validate;

/// Url-encoded affiliate submission. Checkbox lists repeat their key, so the
/// raw body is read as ordered pairs.
#[derive(Debug, Default, Clone, Validate, PartialEq)]
pub struct AffiliateForm {
    #[validate(
        required(message = "Required."),
        url(message = "Invalid URL."),
        length(max = 255, message = "At most 255 characters.")
    )]
    pub url: Option<String>,
    #[validate(
        required(message = "Required."),
        email(message = "Invalid email address."),
        length(max = 255, message = "At most 255 characters.")
    )]
    pub email: Option<String>,
    pub category_ids: Vec<String>,
}

impl AffiliateForm {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut form = AffiliateForm::default();
        for (key, value) in pairs {
            let value = value.trim();
            match key.as_str() {
                "url" if !value.is_empty() => form.url = Some(value.to_string()),
                "email" if !value.is_empty() => form.email = Some(value.to_string()),
                "category_ids" | "category_ids[]" => form.category_ids.push(value.to_string()),
                _ => {}
            }
        }
        form
    }

    pub fn is_checked(&self, category_id: i32) -> bool {
        let id = category_id.to_string();
        self.category_ids.iter().any(|c| *c == id)
    }
}
