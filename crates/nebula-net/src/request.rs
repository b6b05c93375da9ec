//! Blocking HTTP requests.

use std::io::Read;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use nebula_config::HttpConfig;

use crate::error::RequestError;
use crate::tls::unverified_client_config;
use crate::url::encode_url;

const READ_CHUNK: usize = 16 * 1024;

/// Receives the notifications of [`HttpRequest::run`].
///
/// `on_progress(0.0)` always comes first. Exactly one of `on_complete` and
/// `on_error` is called last.
pub trait RequestObserver {
    /// Fraction of the body received, in `0.0..=1.0`.
    fn on_progress(&mut self, _progress: f32) {}

    /// The request failed. `code` is the HTTP status, or 0 without a response.
    fn on_error(&mut self, _code: u16, _message: &str) {}

    /// The whole body was received.
    fn on_complete(&mut self, _body: &[u8]) {}
}

impl RequestObserver for () {}

/// A GET request for one asset.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    url: String,
    credentials: Option<(String, String)>,
    headers: Vec<(String, String)>,
    config: HttpConfig,
    verify_peer: bool,
}

impl HttpRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            credentials: None,
            headers: Vec::new(),
            config: HttpConfig::default(),
            verify_peer: true,
        }
    }

    /// Use basic authentication. An empty username disables it.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        let username = username.into();
        self.credentials = (!username.is_empty()).then(|| (username, password.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_config(mut self, config: HttpConfig) -> Self {
        self.config = config;
        self
    }

    /// Check the server certificate on HTTPS requests. On by default.
    pub fn with_verify_peer(mut self, verify_peer: bool) -> Self {
        self.verify_peer = verify_peer;
        self
    }

    pub fn verify_peer(&self) -> bool {
        self.verify_peer
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the body, reporting to `observer` along the way.
    ///
    /// Only 200 and 206 count as success.
    pub fn run(&self, observer: &mut impl RequestObserver) -> Result<Vec<u8>, RequestError> {
        observer.on_progress(0.0);
        match self.fetch(observer) {
            Ok(body) => {
                tracing::debug!(url = %self.url, bytes = body.len(), "http request complete");
                observer.on_progress(1.0);
                observer.on_complete(&body);
                Ok(body)
            }
            Err(error) => {
                tracing::error!(url = %self.url, %error, "http request failed");
                observer.on_error(error.code(), &error.to_string());
                Err(error)
            }
        }
    }

    /// Whether the resource exists, as reported by a `HEAD` request.
    /// Only status 200 counts.
    pub fn exists(&self) -> bool {
        let result = self
            .request("HEAD")
            .and_then(|request| request.call().map_err(RequestError::from))
            .and_then(|response| match response.status() {
                200 => Ok(()),
                code => Err(RequestError::Status { code }),
            });
        match result {
            Ok(()) => true,
            Err(error) => {
                tracing::error!(url = %self.url, %error, "http existence check failed");
                false
            }
        }
    }

    /// `HEAD` check of `url` with the default configuration.
    pub fn file_exists(url: &str) -> bool {
        Self::new(url).exists()
    }

    fn fetch(&self, observer: &mut impl RequestObserver) -> Result<Vec<u8>, RequestError> {
        let response = self.request("GET")?.call()?;
        let code = response.status();
        if code != 200 && code != 206 {
            return Err(RequestError::Status { code });
        }

        let total = response
            .header("Content-Length")
            .and_then(|length| length.parse::<usize>().ok())
            .filter(|&length| length > 0);
        let mut reader = response.into_reader();
        let mut body = Vec::with_capacity(total.unwrap_or(0));
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            let read = reader.read(&mut chunk).map_err(|error| RequestError::Transport {
                code,
                detail: error.to_string(),
            })?;
            if read == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..read]);
            if let Some(total) = total
                && body.len() < total
            {
                observer.on_progress(body.len() as f32 / total as f32);
            }
        }
        Ok(body)
    }

    fn request(&self, method: &str) -> Result<ureq::Request, RequestError> {
        let mut builder = ureq::AgentBuilder::new()
            .user_agent(&self.config.user_agent)
            .redirects(self.config.max_redirects);
        if self.config.timeout_seconds > 0 {
            builder = builder.timeout(Duration::from_secs(u64::from(self.config.timeout_seconds)));
        }
        if !self.verify_peer {
            let tls = unverified_client_config().map_err(|error| RequestError::Transport {
                code: 0,
                detail: error.to_string(),
            })?;
            builder = builder.tls_config(tls);
        }

        let mut request = builder.build().request(method, &encode_url(&self.url));
        if let Some((username, password)) = &self.credentials {
            let token = STANDARD.encode(format!("{username}:{password}"));
            request = request.set("Authorization", &format!("Basic {token}"));
        }
        for (name, value) in &self.headers {
            request = request.set(name, value);
        }
        Ok(request)
    }
}
