use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use ipnet::IpNet;

const DEFAULT_AIRTABLE_API_URL: &str = "https://api.airtable.com/v0";
const DEFAULT_TURNSTILE_VERIFY_URL: &str =
    "https://challenges.cloudflare.com/turnstile/v0/siteverify";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub max_body_size: usize,
    pub upstream_timeout: Duration,
    pub trusted_proxies: Vec<IpNet>,
    pub log_level: String,
    pub redirects: RedirectConfig,
    pub form: FormConfig,
    pub bypass: Option<BypassPair>,
    pub turnstile: TurnstileConfig,
    pub airtable: AirtableConfig,
}

#[derive(Debug, Clone)]
pub struct RedirectConfig {
    pub success_url: String,
    pub intermediate_url: String,
}

#[derive(Debug, Clone)]
pub struct FormConfig {
    /// Where the rendered form posts to.
    pub action: String,
    /// Page the form script falls back to when the submit request itself fails.
    pub failure_url: String,
}

/// Name combination that skips CAPTCHA verification. Disabled unless both names are configured.
#[derive(Debug, Clone, PartialEq)]
pub struct BypassPair {
    pub first_name: String,
    pub last_name: String,
}

impl BypassPair {
    pub fn matches(&self, first_name: &str, last_name: &str) -> bool {
        self.first_name == first_name && self.last_name == last_name
    }
}

#[derive(Clone)]
pub struct TurnstileConfig {
    pub secret: String,
    pub site_key: String,
    pub verify_url: String,
}

#[derive(Clone)]
pub struct AirtableConfig {
    pub api_key: String,
    pub base_id: String,
    pub table_name: String,
    pub api_url: String,
}

impl fmt::Debug for TurnstileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnstileConfig")
            .field("secret", &"[redacted]")
            .field("site_key", &self.site_key)
            .field("verify_url", &self.verify_url)
            .finish()
    }
}

impl fmt::Debug for AirtableConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AirtableConfig")
            .field("api_key", &"[redacted]")
            .field("base_id", &self.base_id)
            .field("table_name", &self.table_name)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let host: IpAddr = env
            .or("FORMRELAY_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid FORMRELAY_HOST: {e}"))?;

        let port: u16 = env
            .or("FORMRELAY_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid FORMRELAY_PORT: {e}"))?;

        let max_body_size: usize = env
            .or("FORMRELAY_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid FORMRELAY_MAX_BODY_SIZE: {e}"))?;

        let upstream_timeout: u64 = env
            .or("FORMRELAY_UPSTREAM_TIMEOUT_SECS", "30")
            .parse()
            .map_err(|e| format!("Invalid FORMRELAY_UPSTREAM_TIMEOUT_SECS: {e}"))?;

        let trusted_proxies: Vec<IpNet> = env
            .or("FORMRELAY_TRUSTED_PROXIES", "")
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| format!("Invalid FORMRELAY_TRUSTED_PROXIES entry '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let log_level = env.or("FORMRELAY_LOG_LEVEL", "info");

        let redirects = RedirectConfig {
            success_url: env.required("FORMRELAY_SUCCESS_URL")?,
            intermediate_url: env.required("FORMRELAY_INTERMEDIATE_URL")?,
        };

        let form = FormConfig {
            action: env.or("FORMRELAY_FORM_ACTION", "/submit"),
            failure_url: env.or("FORMRELAY_FAILURE_URL", "/failure.html"),
        };

        let bypass = match (
            env.optional("FORMRELAY_BYPASS_FIRST_NAME"),
            env.optional("FORMRELAY_BYPASS_LAST_NAME"),
        ) {
            (Some(first_name), Some(last_name)) => Some(BypassPair {
                first_name,
                last_name,
            }),
            (None, None) => None,
            _ => {
                return Err(
                    "FORMRELAY_BYPASS_FIRST_NAME and FORMRELAY_BYPASS_LAST_NAME must be set together"
                        .to_string(),
                );
            }
        };

        let turnstile = TurnstileConfig {
            secret: env.required("TURNSTILE_SECRET")?,
            site_key: env.required("TURNSTILE_SITE_KEY")?,
            verify_url: env.or("TURNSTILE_VERIFY_URL", DEFAULT_TURNSTILE_VERIFY_URL),
        };

        let airtable = AirtableConfig {
            api_key: env.required("AIRTABLE_API_KEY")?,
            base_id: env.required("AIRTABLE_BASE_ID")?,
            table_name: env.required("AIRTABLE_TABLE_NAME")?,
            api_url: env.or("AIRTABLE_API_URL", DEFAULT_AIRTABLE_API_URL),
        };

        Ok(Config {
            host,
            port,
            max_body_size,
            upstream_timeout: Duration::from_secs(upstream_timeout),
            trusted_proxies,
            log_level,
            redirects,
            form,
            bypass,
            turnstile,
            airtable,
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, String> {
        self.optional(key)
            .ok_or_else(|| format!("Missing required environment variable: {key}"))
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }
}
