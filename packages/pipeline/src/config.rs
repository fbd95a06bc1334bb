use std::time::Duration;

/// Settings for the enrichment fan-out.
#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    /// Maximum number of simultaneous outbound classifier/risk calls.
    pub max_concurrent_calls: usize,
    /// Deadline for a single outbound call. Expiry counts as a failure.
    pub call_timeout: Duration,
}

impl EnrichmentConfig {
    pub fn from_env() -> Self {
        let max_concurrent_calls = std::env::var("ENRICH_MAX_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8);

        let call_timeout_secs: u64 = std::env::var("ENRICH_CALL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(15);

        Self::default()
            .with_max_concurrent_calls(max_concurrent_calls)
            .with_call_timeout(Duration::from_secs(call_timeout_secs))
    }

    pub fn with_max_concurrent_calls(mut self, max_concurrent_calls: usize) -> Self {
        self.max_concurrent_calls = max_concurrent_calls.max(1);
        self
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            max_concurrent_calls: 8,
            call_timeout: Duration::from_secs(15),
        }
    }
}

/// Settings for response suggestion generation.
#[derive(Debug, Clone)]
pub struct AssistConfig {
    /// Deadline for the single generation call.
    pub timeout: Duration,
}

impl AssistConfig {
    pub fn from_env() -> Self {
        let timeout_secs: u64 = std::env::var("ASSIST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        Self {
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
        }
    }
}

/// Credentials and endpoints for the Reddit mention source.
///
/// NOTE: Do NOT derive `Debug` here, the secrets would be exposed in logs.
#[derive(Clone)]
pub struct RedditConfig {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
    pub auth_base_url: String,
    pub api_base_url: String,
    pub search_limit: u32,
}

impl RedditConfig {
    /// Load Reddit settings. Returns `None` (source disabled) when
    /// `REDDIT_CLIENT_ID` is unset or a companion variable is missing.
    pub fn from_env() -> Option<Self> {
        let client_id = std::env::var("REDDIT_CLIENT_ID").ok()?;
        let client_secret = std::env::var("REDDIT_CLIENT_SECRET").unwrap_or_default();
        let username = std::env::var("REDDIT_USERNAME").unwrap_or_default();
        let password = std::env::var("REDDIT_PASSWORD").unwrap_or_default();

        let mut missing = Vec::new();
        if client_secret.is_empty() {
            missing.push("REDDIT_CLIENT_SECRET");
        }
        if username.is_empty() {
            missing.push("REDDIT_USERNAME");
        }
        if password.is_empty() {
            missing.push("REDDIT_PASSWORD");
        }

        if !missing.is_empty() {
            tracing::warn!(
                "REDDIT_CLIENT_ID is set but required vars are missing: {}. Reddit source disabled.",
                missing.join(", ")
            );
            return None;
        }

        let mut config = Self::new(client_id, client_secret, username, password);
        if let Ok(user_agent) = std::env::var("REDDIT_USER_AGENT") {
            config.user_agent = user_agent;
        }
        if let Ok(limit) = std::env::var("REDDIT_SEARCH_LIMIT") {
            config.search_limit = limit.parse().unwrap_or(config.search_limit);
        }
        Some(config)
    }

    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            username: username.into(),
            password: password.into(),
            user_agent: concat!("brandpulse/", env!("CARGO_PKG_VERSION")).into(),
            auth_base_url: "https://www.reddit.com".into(),
            api_base_url: "https://oauth.reddit.com".into(),
            search_limit: 25,
        }
    }

    pub fn with_base_urls(
        mut self,
        auth_base_url: impl Into<String>,
        api_base_url: impl Into<String>,
    ) -> Self {
        self.auth_base_url = auth_base_url.into();
        self.api_base_url = api_base_url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concurrency_has_floor_of_one() {
        let config = EnrichmentConfig::default().with_max_concurrent_calls(0);
        assert_eq!(config.max_concurrent_calls, 1);
    }

    #[test]
    fn test_reddit_defaults() {
        let config = RedditConfig::new("id", "secret", "user", "pass")
            .with_base_urls("http://localhost:1", "http://localhost:2");
        assert_eq!(config.search_limit, 25);
        assert!(config.user_agent.starts_with("brandpulse/"));
        assert_eq!(config.api_base_url, "http://localhost:2");
    }
}
