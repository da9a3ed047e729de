use crate::helpers::DriveTimeError;

use reqwest::header::HeaderMap;
use reqwest::{Client as InnerClient, RequestBuilder};
use reqwest::{Error, Response as InnerResponse, StatusCode};
use serde::de::DeserializeOwned;

/// Thin wrapper over reqwest so call sites read the same on native and wasm.
#[derive(Debug, Clone)]
pub struct Client {
    inner: InnerClient,
}

#[derive(Debug)]
pub struct Request {
    inner: RequestBuilder,
}

#[derive(Debug)]
pub struct Response {
    inner: InnerResponse,
}

impl Client {
    pub fn new() -> Result<Client, DriveTimeError> {
        let builder = InnerClient::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.user_agent("drivetime");

        let client = builder
            .build()
            .map_err(|e| DriveTimeError::Network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { inner: client })
    }

    pub fn get(&self, url: &str) -> Request {
        Request {
            inner: self.inner.get(url),
        }
    }

    pub fn post(&self, url: &str) -> Request {
        Request {
            inner: self.inner.post(url),
        }
    }
}

impl Request {
    pub fn query<T: serde::Serialize + ?Sized>(mut self, query: &T) -> Self {
        self.inner = self.inner.query(query);
        self
    }

    /// Url-encoded form body.
    pub fn form<T: serde::Serialize + ?Sized>(mut self, form: &T) -> Self {
        self.inner = self.inner.form(form);
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.inner = self.inner.header(name, value);
        self
    }

    pub fn bearer_auth(mut self, token: &str) -> Self {
        self.inner = self.inner.bearer_auth(token);
        self
    }

    pub async fn send(self) -> Result<Response, Error> {
        let inner = self.inner.send().await?;
        Ok(Response { inner })
    }
}

impl Response {
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    pub async fn text(self) -> Result<String, Error> {
        self.inner.text().await
    }

    pub async fn json<T: DeserializeOwned>(self) -> Result<T, Error> {
        self.inner.json().await
    }
}
