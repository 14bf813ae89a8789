use std::env;

use crate::parser::DEFAULT_PRIMARY;

/// Largest page size `from_env` accepts.
pub const MAX_PAGE_SIZE: u64 = i64::MAX as u64 - 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Page size used when a query leaves `size` unset.
    pub default_page_size: u64,
    /// Largest `size` a query may ask for.
    pub max_page_size: u64,
    /// Category for bare terms when a schema marks no primary field.
    pub primary_fallback: String,
    /// Decode `b"..."` literals in searches.
    pub decode_base64: bool,
    /// Session setting that carries the tenant id inside each transaction.
    pub tenant_setting: String,
    /// Reconnect and retry once on transport failures.
    pub retry_transient: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_page_size: 100,
            max_page_size: 1000,
            primary_fallback: DEFAULT_PRIMARY.to_string(),
            decode_base64: true,
            tenant_setting: "app.current_tenant".to_string(),
            retry_transient: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let default_page_size = env::var("TAGQL_DEFAULT_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.default_page_size);
        let max_page_size = env::var("TAGQL_MAX_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.max_page_size);
        let primary_fallback =
            env::var("TAGQL_PRIMARY_FALLBACK").unwrap_or(defaults.primary_fallback);
        let decode_base64 = env::var("TAGQL_DECODE_BASE64")
            .map(|v| !matches!(v.as_str(), "0" | "false" | "off"))
            .unwrap_or(defaults.decode_base64);
        let tenant_setting = env::var("TAGQL_TENANT_SETTING").unwrap_or(defaults.tenant_setting);
        let retry_transient = env::var("TAGQL_RETRY_TRANSIENT")
            .map(|v| !matches!(v.as_str(), "0" | "false" | "off"))
            .unwrap_or(defaults.retry_transient);

        let (default_page_size, max_page_size) = page_sizes(default_page_size, max_page_size);

        Self {
            default_page_size,
            max_page_size,
            primary_fallback,
            decode_base64,
            tenant_setting,
            retry_transient,
        }
    }
}

/// Raises the maximum to the default, then caps both so that a page plus its
/// lookahead row still fits a BIGINT limit.
fn page_sizes(default_page_size: u64, max_page_size: u64) -> (u64, u64) {
    let max_page_size = max_page_size.max(default_page_size).min(MAX_PAGE_SIZE);
    (default_page_size.min(max_page_size), max_page_size)
}
