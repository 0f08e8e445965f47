//! HTTP implementation of [`RemoteGateway`] using reqwest

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use url::Url;

use crate::api::auth::{
    CiToken, CodeExchangeRequest, ErrorResponse, SourceHostToken, StoredCiToken,
    StoredSourceHostToken, TravisAuthRequest, TOKEN_URL, TRAVIS_AUTH_PATH,
};
use crate::api::error_handler::classify_status;
use crate::api::gateway::RemoteGateway;
use crate::api::models::{AccountProfile, AccountsResponse, BuildList, ReposResponse, TrackedRepo};
use crate::core::config::Config;
use crate::error::{BuildTrackerError, Result};

/// Media type selecting Travis API v2.1
const TRAVIS_ACCEPT: &str = "application/vnd.travis-ci.2.1+json";

const USER_AGENT: &str = concat!("build-tracker/", env!("CARGO_PKG_VERSION"));

/// Travis API client
///
/// Built from [`Config`]; attach the stored CI token with
/// [`TravisGateway::with_ci_token`] before making authenticated calls.
pub struct TravisGateway {
    client: Client,
    base_url: Url,
    client_id: String,
    client_secret: Option<SecretString>,
    ci_token: Option<SecretString>,
}

impl TravisGateway {
    /// Create a gateway for the configured API endpoint
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = Url::parse(&config.api_base_url).map_err(|e| {
            BuildTrackerError::Config(format!(
                "Invalid api_base_url '{}': {}",
                config.api_base_url, e
            ))
        })?;

        let client = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            client,
            base_url,
            client_id: config.github_client_id.clone(),
            client_secret: config.client_secret(),
            ci_token: None,
        })
    }

    /// Authorize subsequent Travis calls with this token
    pub fn with_ci_token(mut self, token: Option<&CiToken>) -> Self {
        self.ci_token = token.map(|t| t.token.clone());
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| BuildTrackerError::InvalidInput(format!("Invalid API path '{}': {}", path, e)))
    }

    fn authorized(&self, method: Method, url: Url) -> Result<RequestBuilder> {
        let token = self
            .ci_token
            .as_ref()
            .ok_or(BuildTrackerError::Unauthenticated)?;

        Ok(self
            .client
            .request(method, url)
            .header("Authorization", format!("token {}", token.expose_secret()))
            .header("Accept", TRAVIS_ACCEPT))
    }

    /// Send a request and return the body of a successful response
    async fn send(request: RequestBuilder) -> Result<String> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(classify_status(status, &text));
        }

        Ok(text)
    }

    async fn travis_get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!(path = url.path(), "travis GET");
        let text = Self::send(self.authorized(Method::GET, url)?).await?;
        decode(&text)
    }

    async fn travis_post(&self, url: Url) -> Result<()> {
        tracing::debug!(path = url.path(), "travis POST");
        Self::send(self.authorized(Method::POST, url)?).await?;
        Ok(())
    }

    async fn get_repos(&self, url: Url) -> Result<Vec<TrackedRepo>> {
        let response: ReposResponse = self.travis_get(url).await?;
        Ok(response.repos)
    }
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| BuildTrackerError::DecodeFailure(e.to_string()))
}

#[async_trait]
impl RemoteGateway for TravisGateway {
    async fn exchange_authorization_code(
        &self,
        code: &str,
        state: &str,
    ) -> Result<SourceHostToken> {
        let client_secret = self.client_secret.as_ref().ok_or_else(|| {
            BuildTrackerError::Config(
                "GitHub client secret is not set.\n\n  → Run 'bt config set github-client-secret <secret>' or export BT_GITHUB_CLIENT_SECRET."
                    .to_string(),
            )
        })?;

        let body = CodeExchangeRequest {
            client_id: &self.client_id,
            client_secret: client_secret.expose_secret(),
            code,
            state,
        };

        let response = self
            .client
            .post(TOKEN_URL)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if let Ok(token) = serde_json::from_str::<StoredSourceHostToken>(&text) {
            return Ok(SourceHostToken::from_stored(token));
        }

        // GitHub reports bad codes as 200 with an error document
        if let Ok(error) = serde_json::from_str::<ErrorResponse>(&text) {
            return Err(BuildTrackerError::Api {
                status: status.as_u16(),
                message: error.error_description.unwrap_or(error.error),
            });
        }

        if !status.is_success() {
            return Err(classify_status(status, &text));
        }

        Err(BuildTrackerError::DecodeFailure(
            "Unexpected response from GitHub token endpoint".to_string(),
        ))
    }

    async fn exchange_for_service_token(&self, token: &SourceHostToken) -> Result<CiToken> {
        let url = self.endpoint(TRAVIS_AUTH_PATH)?;
        let body = TravisAuthRequest {
            github_token: token.token.expose_secret(),
        };

        let request = self
            .client
            .post(url)
            .header("Accept", TRAVIS_ACCEPT)
            .json(&body);
        let text = Self::send(request).await?;

        let stored: StoredCiToken = decode(&text)?;
        Ok(CiToken::from_stored(stored))
    }

    async fn fetch_accounts(&self) -> Result<Vec<AccountProfile>> {
        let response: AccountsResponse = self.travis_get(self.endpoint("accounts")?).await?;
        Ok(response.accounts)
    }

    async fn fetch_repos(&self, ids: &[String]) -> Result<Vec<TrackedRepo>> {
        let mut url = self.endpoint("repos")?;
        url.query_pairs_mut().append_pair("ids", &ids.join(","));
        self.get_repos(url).await
    }

    async fn fetch_build_status(&self, slug: &str) -> Result<BuildList> {
        let url = self.endpoint(&format!("repos/{}/builds", slug))?;
        self.travis_get(url).await
    }

    async fn search_repos(&self, query: &str) -> Result<Vec<TrackedRepo>> {
        let mut url = self.endpoint("repos")?;
        url.query_pairs_mut()
            .append_pair("search", query)
            .append_pair("active", "true");
        self.get_repos(url).await
    }

    async fn fetch_owner_repos(&self, owner: &str, member: &str) -> Result<Vec<TrackedRepo>> {
        let mut url = self.endpoint("repos")?;
        url.query_pairs_mut()
            .append_pair("active", "true")
            .append_pair("slug", owner)
            .append_pair("member", member);
        self.get_repos(url).await
    }

    async fn restart_build(&self, build_id: u64) -> Result<()> {
        let url = self.endpoint(&format!("builds/{}/restart", build_id))?;
        self.travis_post(url).await
    }

    async fn cancel_build(&self, build_id: u64) -> Result<()> {
        let url = self.endpoint(&format!("builds/{}/cancel", build_id))?;
        self.travis_post(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> TravisGateway {
        TravisGateway::new(&Config::default()).unwrap()
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let gw = gateway();
        assert_eq!(
            gw.endpoint("repos/octo/widgets/builds").unwrap().as_str(),
            "https://api.travis-ci.com/repos/octo/widgets/builds"
        );
    }

    #[tokio::test]
    async fn test_calls_without_token_are_unauthenticated() {
        let gw = gateway();
        assert!(matches!(
            gw.fetch_accounts().await,
            Err(BuildTrackerError::Unauthenticated)
        ));
        assert!(matches!(
            gw.fetch_repos(&["1".to_string()]).await,
            Err(BuildTrackerError::Unauthenticated)
        ));
        assert!(matches!(
            gw.restart_build(1).await,
            Err(BuildTrackerError::Unauthenticated)
        ));
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let config = Config {
            api_base_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            TravisGateway::new(&config),
            Err(BuildTrackerError::Config(_))
        ));
    }

    #[test]
    fn test_decode_failure_is_typed() {
        let result: Result<ReposResponse> = decode(r#"{"repositories": []}"#);
        assert!(matches!(result, Err(BuildTrackerError::DecodeFailure(_))));
    }
}
