//! Central configuration for the identity_merge crate

use chrono::Duration;
use std::env;
use std::sync::LazyLock;

/// Plans from lowest to highest rank, comma separated.
/// Default: "free,subscribed,vip,unlimited"
pub static ACCOUNT_PLANS: LazyLock<Vec<String>> = LazyLock::new(|| {
    parse_list(
        &env::var("ACCOUNT_PLANS").unwrap_or_else(|_| "free,subscribed,vip,unlimited".to_string()),
    )
});

/// Plan assigned to newly created accounts. Default: "free"
pub static ACCOUNT_DEFAULT_PLAN: LazyLock<String> =
    LazyLock::new(|| env::var("ACCOUNT_DEFAULT_PLAN").unwrap_or_else(|_| "free".to_string()));

/// Role assigned to newly created accounts. Default: "member"
pub static ACCOUNT_DEFAULT_ROLE: LazyLock<String> =
    LazyLock::new(|| env::var("ACCOUNT_DEFAULT_ROLE").unwrap_or_else(|_| "member".to_string()));

/// Role reserved for the very first account. Default: "root"
pub static ACCOUNT_ROOT_ROLE: LazyLock<String> =
    LazyLock::new(|| env::var("ACCOUNT_ROOT_ROLE").unwrap_or_else(|_| "root".to_string()));

/// Lifetime of email confirmation tokens in seconds. Default: 86400
pub static EMAIL_CONFIRMATION_TTL_SECS: LazyLock<i64> = LazyLock::new(|| {
    env::var("EMAIL_CONFIRMATION_TTL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|v: &i64| *v > 0)
        .unwrap_or(86400)
});

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim().to_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Settings consumed by the resolver
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    /// Plans from lowest to highest rank
    pub plans: Vec<String>,
    pub default_plan: String,
    pub default_role: String,
    pub root_role: String,
    pub confirmation_ttl: Duration,
}

impl ResolverConfig {
    /// Snapshot of the environment-backed settings
    pub fn from_env() -> Self {
        Self {
            plans: ACCOUNT_PLANS.clone(),
            default_plan: ACCOUNT_DEFAULT_PLAN.clone(),
            default_role: ACCOUNT_DEFAULT_ROLE.clone(),
            root_role: ACCOUNT_ROOT_ROLE.clone(),
            confirmation_ttl: Duration::seconds(*EMAIL_CONFIRMATION_TTL_SECS),
        }
    }

    /// Rank of a plan; unknown plans rank below every configured plan
    pub fn plan_rank(&self, plan: &str) -> Option<usize> {
        self.plans.iter().position(|p| p == plan)
    }

    /// The higher-ranked of two plans. Ties keep `current`.
    pub fn higher_plan<'a>(&self, current: &'a str, other: &'a str) -> &'a str {
        if self.plan_rank(other) > self.plan_rank(current) {
            other
        } else {
            current
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            plans: parse_list("free,subscribed,vip,unlimited"),
            default_plan: "free".to_string(),
            default_role: "member".to_string(),
            root_role: "root".to_string(),
            confirmation_ttl: Duration::seconds(86400),
        }
    }
}
