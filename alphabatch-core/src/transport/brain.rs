use std::fmt;
use std::time::Duration;

use alphabatch_model::{
    AcceptResponse, AlphaId, AlphaResult, PollLocator, PollSnapshot,
    RunningSimulation, SimulationProgress, SimulationRequest, SubmissionCheck,
};
use async_trait::async_trait;
use reqwest::{Response, StatusCode, header};
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use super::{
    SimulationTransport, SubmissionTransport, SubmitOutcome, TransportError,
};

pub const DEFAULT_BASE_URL: &str = "https://api.worldquantbrain.com";

/// Account credentials for the simulation service.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct BrainClientConfig {
    pub base_url: Url,
    pub request_timeout: Duration,
    /// Applied to simulation polls, which should fail fast.
    pub poll_timeout: Duration,
}

impl BrainClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            request_timeout: Duration::from_secs(30),
            poll_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }
}

/// Listing shapes returned by `GET /simulations`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RunningListing {
    Bare(Vec<RunningSimulation>),
    Paged { results: Vec<RunningSimulation> },
}

impl RunningListing {
    fn into_items(self) -> Vec<RunningSimulation> {
        match self {
            RunningListing::Bare(items) => items,
            RunningListing::Paged { results } => results,
        }
    }
}

/// reqwest-backed client for the BRAIN-style REST API.
///
/// The session cookie obtained by [`BrainClient::authenticate`] is kept in
/// the client's cookie store and sent with every later request.
#[derive(Clone)]
pub struct BrainClient {
    http: reqwest::Client,
    base_url: Url,
    poll_timeout: Duration,
}

impl fmt::Debug for BrainClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrainClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl BrainClient {
    pub fn new(config: BrainClientConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()?;

        let mut base_url = config.base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http,
            base_url,
            poll_timeout: config.poll_timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url.join(path).map_err(|err| {
            TransportError::Protocol(format!("invalid endpoint '{path}': {err}"))
        })
    }

    /// Opens a session with HTTP basic credentials.
    pub async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<(), TransportError> {
        let url = self.endpoint("authentication")?;
        let response = self
            .http
            .post(url)
            .basic_auth(&credentials.username, Some(credentials.password()))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                info!(
                    target: "alphabatch::transport",
                    username = %credentials.username,
                    "authenticated"
                );
                Ok(())
            }
            StatusCode::UNAUTHORIZED => Err(TransportError::Unauthorized),
            _ => Err(status_error(response).await),
        }
    }
}

fn retry_after_secs(response: &Response) -> Option<f64> {
    response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
}

/// Submission status polls must carry a readable hint when one is present;
/// a garbled hint is not treated as completion.
fn submission_retry_after(response: &Response) -> Result<Option<f64>, TransportError> {
    let Some(value) = response.headers().get(header::RETRY_AFTER) else {
        return Ok(None);
    };
    let raw = value.to_str().unwrap_or_default().trim();
    match raw.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => Ok(Some(secs)),
        _ => Err(TransportError::Protocol(format!(
            "unreadable Retry-After '{raw}' on submission status"
        ))),
    }
}

async fn status_error(response: Response) -> TransportError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    TransportError::Status { status, body }
}

#[async_trait]
impl SimulationTransport for BrainClient {
    async fn submit_simulation(
        &self,
        request: &SimulationRequest,
    ) -> Result<SubmitOutcome, TransportError> {
        let url = self.endpoint("simulations")?;
        let response = self.http.post(url).json(request).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(SubmitOutcome::RateLimited);
        }

        if status == StatusCode::OK || status == StatusCode::CREATED {
            let location = response
                .headers()
                .get(header::LOCATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
                .ok_or_else(|| {
                    TransportError::Protocol(
                        "submission accepted without a Location header"
                            .to_string(),
                    )
                })?;
            let resolved = self.endpoint(&location)?;
            debug!(
                target: "alphabatch::transport",
                locator = %resolved,
                "simulation accepted"
            );
            return Ok(SubmitOutcome::Accepted(PollLocator::new(
                resolved.to_string(),
            )));
        }

        let body = response.text().await.unwrap_or_default();
        Ok(SubmitOutcome::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    async fn poll_simulation(
        &self,
        locator: &PollLocator,
    ) -> Result<PollSnapshot, TransportError> {
        let url = self.endpoint(locator.as_str())?;
        let response = self
            .http
            .get(url)
            .timeout(self.poll_timeout)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(TransportError::NotFound(locator.to_string()));
        }
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let retry_after = retry_after_secs(&response);
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            SimulationProgress::default()
        } else {
            serde_json::from_str(&text)?
        };

        Ok(PollSnapshot::new(body, retry_after))
    }

    async fn fetch_alpha(
        &self,
        alpha_id: &AlphaId,
    ) -> Result<AlphaResult, TransportError> {
        let url = self.endpoint(&format!("alphas/{alpha_id}"))?;
        let response = self.http.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(TransportError::NotFound(alpha_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn running_simulations(&self) -> Result<usize, TransportError> {
        let url = self.endpoint("simulations")?;
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let text = response.text().await?;
        let listing: RunningListing = serde_json::from_str(&text)?;
        Ok(listing
            .into_items()
            .iter()
            .filter(|item| item.is_running())
            .count())
    }
}

#[async_trait]
impl SubmissionTransport for BrainClient {
    async fn submit_alpha(
        &self,
        alpha_id: &AlphaId,
    ) -> Result<AcceptResponse, TransportError> {
        let url = self.endpoint(&format!("alphas/{alpha_id}/submit"))?;
        let response = self.http.post(url).send().await?;
        let accept = AcceptResponse::from_status(response.status().as_u16());
        if let AcceptResponse::Other(status) = accept {
            warn!(
                target: "alphabatch::transport",
                alpha_id = %alpha_id,
                status,
                "unexpected submit response"
            );
        }
        Ok(accept)
    }

    async fn check_submission(
        &self,
        alpha_id: &AlphaId,
    ) -> Result<SubmissionCheck, TransportError> {
        let url = self.endpoint(&format!("alphas/{alpha_id}/submit"))?;
        let response = self.http.get(url).send().await?;
        let status = response.status().as_u16();
        let retry_after = if status == 200 {
            submission_retry_after(&response)?
        } else {
            None
        };
        Ok(SubmissionCheck::from_response(status, retry_after))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alphabatch_model::SimulationSettings;
    use mockito::{Matcher, Server};

    fn client_for(server: &Server) -> BrainClient {
        let base = Url::parse(&server.url()).unwrap();
        BrainClient::new(BrainClientConfig::new(base)).unwrap()
    }

    #[tokio::test]
    async fn authenticate_maps_401_to_unauthorized() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/authentication")
            .match_header("authorization", Matcher::Regex("^Basic ".into()))
            .with_status(401)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .authenticate(&Credentials::new("user", "wrong"))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Unauthorized));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn submit_resolves_location_against_base() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/simulations")
            .match_body(Matcher::PartialJsonString(
                r#"{"type":"REGULAR","regular":"rank(close)"}"#.to_string(),
            ))
            .with_status(201)
            .with_header("location", "/simulations/abc123")
            .create_async()
            .await;

        let client = client_for(&server);
        let request =
            SimulationRequest::regular(SimulationSettings::default(), "rank(close)");
        let outcome = client.submit_simulation(&request).await.unwrap();

        let expected = format!("{}/simulations/abc123", server.url());
        assert_eq!(
            outcome,
            SubmitOutcome::Accepted(PollLocator::new(expected))
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn submit_reports_rate_limit_and_missing_location() {
        let mut server = Server::new_async().await;
        let _limited = server
            .mock("POST", "/simulations")
            .with_status(429)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server);
        let request =
            SimulationRequest::regular(SimulationSettings::default(), "x");
        assert_eq!(
            client.submit_simulation(&request).await.unwrap(),
            SubmitOutcome::RateLimited
        );

        server.reset_async().await;
        let _accepted = server
            .mock("POST", "/simulations")
            .with_status(201)
            .create_async()
            .await;
        let err = client.submit_simulation(&request).await.unwrap_err();
        assert!(matches!(err, TransportError::Protocol(_)));
    }

    #[tokio::test]
    async fn poll_reads_body_and_fractional_retry_hint() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/simulations/abc")
            .with_status(200)
            .with_header("retry-after", "2.5")
            .with_header("content-type", "application/json")
            .with_body(r#"{"progress": 0.35}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let snapshot = client
            .poll_simulation(&PollLocator::new("simulations/abc"))
            .await
            .unwrap();

        assert_eq!(snapshot.retry_after_secs, Some(2.5));
        assert_eq!(snapshot.fraction(), Some(0.35));
        assert!(!snapshot.is_complete());
    }

    #[tokio::test]
    async fn poll_maps_404_to_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/simulations/gone")
            .with_status(404)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .poll_simulation(&PollLocator::new("simulations/gone"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::NotFound(_)));
    }

    #[tokio::test]
    async fn running_count_accepts_both_listing_shapes() {
        let mut server = Server::new_async().await;
        let _bare = server
            .mock("GET", "/simulations")
            .with_status(200)
            .with_body(
                r#"[{"status":"RUNNING"},{"status":"running"},{"status":"COMPLETE"}]"#,
            )
            .create_async()
            .await;

        let client = client_for(&server);
        assert_eq!(client.running_simulations().await.unwrap(), 2);

        server.reset_async().await;
        let _paged = server
            .mock("GET", "/simulations")
            .with_status(200)
            .with_body(r#"{"count":1,"results":[{"id":"s1","status":"RUNNING"}]}"#)
            .create_async()
            .await;
        assert_eq!(client.running_simulations().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn fetch_alpha_parses_checks() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/alphas/A1")
            .with_status(200)
            .with_body(
                r#"{"id":"A1","dateCreated":"2024-01-05T09:00:00Z",
                    "regular":{"code":"rank(close)"},
                    "is":{"checks":[{"name":"LOW_SHARPE","result":"PASS","value":1.3}]}}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let alpha = client.fetch_alpha(&AlphaId::from("A1")).await.unwrap();
        assert_eq!(alpha.formula(), "rank(close)");
        assert_eq!(alpha.checks()[0].value, Some(1.3));
    }

    #[tokio::test]
    async fn submission_endpoints_classify_status() {
        let mut server = Server::new_async().await;
        let _post = server
            .mock("POST", "/alphas/A1/submit")
            .with_status(403)
            .create_async()
            .await;
        let _get = server
            .mock("GET", "/alphas/A1/submit")
            .with_status(200)
            .with_header("retry-after", "1.0")
            .create_async()
            .await;

        let client = client_for(&server);
        let id = AlphaId::from("A1");
        assert_eq!(
            client.submit_alpha(&id).await.unwrap(),
            AcceptResponse::Rejected
        );
        assert_eq!(
            client.check_submission(&id).await.unwrap(),
            SubmissionCheck::Pending {
                retry_after_secs: 1.0
            }
        );
    }

    #[tokio::test]
    async fn unreadable_submission_hint_is_a_protocol_error() {
        let mut server = Server::new_async().await;
        let _get = server
            .mock("GET", "/alphas/A1/submit")
            .with_status(200)
            .with_header("retry-after", "Wed, 21 Oct 2026 07:28:00 GMT")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .check_submission(&AlphaId::from("A1"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Protocol(_)));
    }
}
