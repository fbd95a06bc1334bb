use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::config::RedditConfig;
use crate::error::{PipelineError, Result};
use crate::models::RawMention;
use crate::sources::MentionSource;

const SOURCE_NAME: &str = "reddit";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Reddit search via the OAuth API (script-app password grant).
///
/// NOTE: Do NOT derive `Debug`, the config holds credentials.
pub struct RedditSource {
    http: reqwest::Client,
    config: RedditConfig,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Thing>,
}

#[derive(Deserialize)]
struct Thing {
    data: Option<Post>,
}

#[derive(Deserialize)]
struct Post {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    author: Option<String>,
    permalink: Option<String>,
    created_utc: Option<f64>,
}

impl RedditSource {
    pub fn new(config: RedditConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PipelineError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    async fn access_token(&self) -> Result<String> {
        let url = format!(
            "{}/api/v1/access_token",
            self.config.auth_base_url.trim_end_matches('/')
        );

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
            ])
            .send()
            .await
            .map_err(source_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::MentionSource(format!(
                "reddit authentication failed with status {status}"
            )));
        }

        let token: TokenResponse = response.json().await.map_err(source_error)?;
        match token {
            TokenResponse {
                access_token: Some(token),
                ..
            } if !token.is_empty() => Ok(token),
            TokenResponse { error, .. } => Err(PipelineError::MentionSource(format!(
                "reddit authentication failed: {}",
                error.as_deref().unwrap_or("no access token in response")
            ))),
        }
    }
}

#[async_trait]
impl MentionSource for RedditSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch_mentions(&self, brand_query: &str) -> Result<Vec<RawMention>> {
        let token = self.access_token().await?;
        let url = format!("{}/search", self.config.api_base_url.trim_end_matches('/'));
        let limit = self.config.search_limit.to_string();

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&[
                ("q", brand_query),
                ("type", "link"),
                ("sort", "new"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(source_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::MentionSource(format!(
                "reddit search failed with status {status}"
            )));
        }

        let listing: Listing = response.json().await.map_err(source_error)?;
        let found = listing.data.children.len();
        let mentions: Vec<RawMention> = listing
            .data
            .children
            .into_iter()
            .filter_map(|thing| thing.data)
            .filter_map(to_raw_mention)
            .collect();

        debug!(found, kept = mentions.len(), "reddit search results");
        Ok(mentions)
    }
}

fn source_error(e: reqwest::Error) -> PipelineError {
    PipelineError::MentionSource(format!("reddit request failed: {e}"))
}

/// Map a post to a mention. Posts with neither body nor title are dropped.
fn to_raw_mention(post: Post) -> Option<RawMention> {
    let text = [post.selftext.trim(), post.title.trim()]
        .into_iter()
        .find(|t| !t.is_empty())?
        .to_string();

    let created_at = post
        .created_utc
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs as i64, 0))
        .unwrap_or_else(Utc::now);

    let mut mention = RawMention::new(format!("reddit_{}", post.id), text, SOURCE_NAME, created_at);
    mention.author = post.author;
    mention.url = post
        .permalink
        .map(|permalink| format!("https://www.reddit.com{permalink}"));
    Some(mention)
}
