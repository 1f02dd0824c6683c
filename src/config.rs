use worker::Env;

use crate::models::{DEFAULT_COOKIE_NAME, DEFAULT_INVOICE_PREFIX, DEFAULT_QUOTATION_PREFIX};
use crate::schema::{Collection, DocumentType};

/// Per-request settings read from Worker vars and secrets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub admin_token: Option<String>,
    pub cookie_name: String,
    pub secure_cookies: bool,
    pub invoice_prefix: String,
    pub quotation_prefix: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            admin_token: None,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            secure_cookies: false,
            invoice_prefix: DEFAULT_INVOICE_PREFIX.to_string(),
            quotation_prefix: DEFAULT_QUOTATION_PREFIX.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env(env: &Env) -> Self {
        let defaults = Self::default();
        let var = |name: &str| {
            env.var(name)
                .map(|value| value.to_string())
                .ok()
                .filter(|value| !value.trim().is_empty())
        };

        let admin_token = env
            .secret("ADMIN_ACCESS_TOKEN")
            .map(|value| value.to_string())
            .ok()
            .or_else(|| var("ADMIN_ACCESS_TOKEN"))
            .filter(|value| !value.is_empty());

        Self {
            admin_token,
            cookie_name: var("COOKIE_NAME").unwrap_or(defaults.cookie_name),
            secure_cookies: var("ENVIRONMENT").is_some_and(|value| value == "production"),
            invoice_prefix: var("INVOICE_PREFIX").unwrap_or(defaults.invoice_prefix),
            quotation_prefix: var("QUOTATION_PREFIX").unwrap_or(defaults.quotation_prefix),
        }
    }

    pub fn number_prefix(&self, document_type: DocumentType) -> &str {
        match document_type.collection() {
            Collection::Invoice => &self.invoice_prefix,
            Collection::Quotation => &self.quotation_prefix,
        }
    }
}
