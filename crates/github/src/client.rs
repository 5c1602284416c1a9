use async_trait::async_trait;
use octocrab::{Octocrab, Page};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use sync_core::SyncConfig;
use tracing::{debug, info};

use crate::error::{GitHubError, Result};
use crate::tracker::Tracker;
use crate::types::{
    CommitDetail, CreatePrRequest, CreatedPullRequest, PrCommit, PrState, RepoConfig,
};

const USER_AGENT: &str = "Servo web-platform-test sync service";
const ACCEPT: &str = "application/vnd.github+json";

pub struct GitHubClient {
    octocrab: Octocrab,
    http: reqwest::Client,
    api_base: String,
    token: String,
    upstream: RepoConfig,
    source: RepoConfig,
}

impl GitHubClient {
    pub fn new(
        token: &str,
        api_base: &str,
        upstream: RepoConfig,
        source: RepoConfig,
    ) -> Result<Self> {
        let octocrab = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(api_base)
            .map_err(|e| GitHubError::Config(e.to_string()))?
            .build()
            .map_err(|e| GitHubError::Config(e.to_string()))?;

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| GitHubError::Config(e.to_string()))?;

        Ok(Self {
            octocrab,
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            upstream,
            source,
        })
    }

    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        Self::new(
            &config.token,
            &config.api_base,
            RepoConfig::new(&config.upstream_org, &config.upstream_repo),
            RepoConfig::new(&config.source_org, &config.source_repo),
        )
    }

    pub fn upstream(&self) -> &RepoConfig {
        &self.upstream
    }

    pub fn source(&self) -> &RepoConfig {
        &self.source
    }

    fn upstream_pull(&self, number: u64) -> String {
        format!("{}/pulls/{}", self.upstream.route(), number)
    }

    fn upstream_labels(&self, number: u64) -> String {
        format!("{}/issues/{}/labels", self.upstream.route(), number)
    }

    /// Send a JSON request to an API route and return the response body.
    ///
    /// Any non-2xx status becomes [`GitHubError::Api`], whatever the body looks
    /// like (proxies answer with HTML).
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        route: &str,
        body: Option<&B>,
    ) -> Result<String> {
        let url = format!("{}{}", self.api_base, route);
        debug!(method = %method, url = %url, "GitHub request");

        let mut request = self
            .http
            .request(method, &url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, ACCEPT);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(GitHubError::from_response(status.as_u16(), &text));
        }
        Ok(text)
    }

    /// GET a full URL (commit API URLs, `.diff` pages).
    async fn get_absolute(&self, url: &str) -> Result<String> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(GitHubError::from_response(status.as_u16(), &text));
        }
        Ok(text)
    }

    async fn send_for<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        route: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let text = self.send(method, route, body).await?;
        serde_json::from_str(&text).map_err(|e| GitHubError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Tracker for GitHubClient {
    async fn list_pr_commits(&self, commits_url: &str) -> Result<Vec<PrCommit>> {
        debug!("Listing commits at {}", commits_url);

        let first: Page<PrCommit> = self.octocrab.get(commits_url, None::<&()>).await?;
        let commits = self.octocrab.all_pages(first).await?;

        debug!(count = commits.len(), "Fetched pull request commits");
        Ok(commits)
    }

    async fn get_commit(&self, url: &str) -> Result<CommitDetail> {
        debug!("Getting commit {}", url);

        let body = self.get_absolute(url).await?;
        serde_json::from_str(&body).map_err(|e| GitHubError::Decode(e.to_string()))
    }

    async fn get_diff(&self, url: &str) -> Result<String> {
        debug!("Fetching diff {}", url);

        self.get_absolute(url).await
    }

    async fn create_pull_request(&self, request: &CreatePrRequest) -> Result<CreatedPullRequest> {
        info!(
            "Creating PR: {} ({} -> {})",
            request.title, request.head, request.base
        );

        let route = format!("{}/pulls", self.upstream.route());
        let created: CreatedPullRequest =
            self.send_for(Method::POST, &route, Some(request)).await?;

        info!(number = created.number, url = %created.html_url, "Upstream PR created");
        Ok(created)
    }

    async fn set_pull_request_state(&self, number: u64, state: PrState) -> Result<()> {
        info!("Setting upstream PR #{} state to {}", number, state);

        self.send(
            Method::PATCH,
            &self.upstream_pull(number),
            Some(&json!({ "state": state })),
        )
        .await?;

        Ok(())
    }

    async fn add_labels(&self, number: u64, labels: &[&str]) -> Result<()> {
        debug!("Adding labels {:?} to upstream PR #{}", labels, number);

        self.send(
            Method::POST,
            &self.upstream_labels(number),
            Some(&json!({ "labels": labels })),
        )
        .await?;

        Ok(())
    }

    async fn remove_label(&self, number: u64, label: &str) -> Result<()> {
        debug!("Removing label {:?} from upstream PR #{}", label, number);

        let route = format!(
            "{}/{}",
            self.upstream_labels(number),
            urlencoding::encode(label)
        );
        match self.send(Method::DELETE, &route, None::<&()>).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => {
                debug!("Label {:?} was not set on upstream PR #{}", label, number);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn merge_pull_request(&self, number: u64) -> Result<()> {
        info!("Merging upstream PR #{}", number);

        let route = format!("{}/merge", self.upstream_pull(number));
        self.send(Method::PUT, &route, Some(&json!({ "merge_method": "merge" })))
            .await?;

        Ok(())
    }

    async fn comment_on_source_pr(&self, number: u64, body: &str) -> Result<()> {
        info!("Commenting on source PR #{}", number);

        let route = format!("{}/issues/{}/comments", self.source.route(), number);
        self.send(Method::POST, &route, Some(&json!({ "body": body })))
            .await?;

        Ok(())
    }
}
