use crate::captcha::CaptchaStatus;
use crate::storage::RecordFields;

use super::parser::FormData;

pub const CAPTCHA_TOKEN_FIELD: &str = "cf-turnstile-response";
pub const STATUS_PARAM: &str = "turnstile_status";

const REQUIRED_FIELDS: [&str; 3] = ["first_name", "last_name", "message"];

/// A contact-form submission as read from one request body.
#[derive(Debug, Clone)]
pub struct Submission {
    pub first_name: String,
    pub last_name: String,
    pub message: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub captcha_token: Option<String>,
}

impl Submission {
    /// Read the known fields. Required fields must be present and non-empty.
    pub fn from_form(form: &FormData) -> Result<Self, String> {
        for name in REQUIRED_FIELDS {
            if form.get(name).is_none_or(|v| v.trim().is_empty()) {
                return Err(format!("Missing required field: {name}"));
            }
        }

        let text = |name: &str| form.get(name).unwrap_or_default().to_string();
        let optional = |name: &str| {
            form.get(name)
                .filter(|v| !v.is_empty())
                .map(|v| v.to_string())
        };

        Ok(Submission {
            first_name: text("first_name"),
            last_name: text("last_name"),
            message: text("message"),
            email: optional("email"),
            phone: optional("phone"),
            subject: optional("subject"),
            captcha_token: optional(CAPTCHA_TOKEN_FIELD),
        })
    }

    pub fn to_record(&self, status: CaptchaStatus) -> RecordFields {
        RecordFields {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            message: self.message.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            subject: self.subject.clone(),
            turnstile_status: status,
        }
    }
}

/// Query string echoing the form back to the landing page.
///
/// Every field is kept in order except the CAPTCHA token and any
/// client-supplied status, then `turnstile_status` is appended.
pub fn echo_query(form: &FormData, status: CaptchaStatus) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in form.iter() {
        if key == CAPTCHA_TOKEN_FIELD || key == STATUS_PARAM {
            continue;
        }
        serializer.append_pair(key, value);
    }
    serializer.append_pair(STATUS_PARAM, status.as_str());
    serializer.finish()
}

/// Append a query string to a configured landing URL, which may already carry one.
pub fn with_query(base: &str, query: &str) -> String {
    let (base, fragment) = match base.split_once('#') {
        Some((b, f)) => (b, Some(f)),
        None => (base, None),
    };

    let separator = if !base.contains('?') {
        "?"
    } else if base.ends_with('?') || base.ends_with('&') {
        ""
    } else {
        "&"
    };

    match fragment {
        Some(f) => format!("{base}{separator}{query}#{f}"),
        None => format!("{base}{separator}{query}"),
    }
}
