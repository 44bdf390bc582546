//! Resource Loader
//!
//! Request builder and the blocking HTTP client, driven from smol's
//! blocking thread pool so the event loop never waits on a socket.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use url::Url;

use crate::{NetError, Response};

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        }
    }
}

/// Request configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn get(url: &str) -> Self {
        Self {
            method: Method::Get,
            url: url.to_string(),
            ..Default::default()
        }
    }

    pub fn post(url: &str) -> Self {
        Self {
            method: Method::Post,
            url: url.to_string(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_json(self, json: Vec<u8>) -> Self {
        self.with_header("Content-Type", "application/json")
            .with_header("Accept", "application/json")
            .with_body(json)
    }
}

/// Something that can carry a [`Request`] and hand back a [`Response`].
///
/// Non-2xx statuses are returned as responses, not errors; only transport
/// failures are errors.
pub trait Transport {
    fn send(&self, request: Request) -> impl Future<Output = Result<Response, NetError>>;
}

/// Loader configuration
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// User agent string
    pub user_agent: String,
    /// Whole-request timeout
    pub request_timeout: Duration,
    /// Headers added to every request
    pub default_headers: Vec<(String, String)>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("Waypoint/{}", env!("CARGO_PKG_VERSION")),
            request_timeout: Duration::from_secs(5),
            default_headers: Vec::new(),
        }
    }
}

impl LoaderConfig {
    /// Same configuration with a different whole-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Load resources from network
#[derive(Debug, Clone)]
pub struct ResourceLoader {
    client: reqwest::blocking::Client,
    default_headers: Vec<(String, String)>,
}

impl ResourceLoader {
    pub fn new(config: LoaderConfig) -> Result<Self, NetError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.request_timeout)
            .build()
            .map_err(network_error)?;

        Ok(Self {
            client,
            default_headers: config.default_headers,
        })
    }

    /// Make an HTTP request
    pub async fn request(&self, req: Request) -> Result<Response, NetError> {
        let builder = self.prepare(req)?;

        smol::unblock(move || {
            let resp = builder.send().map_err(network_error)?;
            let status = resp.status().as_u16();
            let headers = resp
                .headers()
                .iter()
                .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or_default().to_string()))
                .collect();
            let body = resp
                .bytes()
                .map_err(network_error)?
                .to_vec();

            Ok(Response { status, headers, body })
        })
        .await
    }

    fn prepare(&self, req: Request) -> Result<reqwest::blocking::RequestBuilder, NetError> {
        // Query strings may carry credentials; they stay out of logs and errors
        let url = Url::parse(&req.url).map_err(|e| NetError::InvalidUrl(e.to_string()))?;
        tracing::debug!("HTTP {} {}{}", req.method.as_str(), url.host_str().unwrap_or_default(), url.path());

        let mut builder = self.client.request(req.method.into(), url);
        let default_headers = self.default_headers.iter().map(|(name, value)| (name, value));
        for (name, value) in default_headers.chain(req.headers.iter()) {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = req.body {
            builder = builder.body(body);
        }
        Ok(builder)
    }
}

/// reqwest errors name the full URL, token included
fn network_error(e: reqwest::Error) -> NetError {
    NetError::Network(e.without_url().to_string())
}

impl Transport for ResourceLoader {
    async fn send(&self, request: Request) -> Result<Response, NetError> {
        self.request(request).await
    }
}
