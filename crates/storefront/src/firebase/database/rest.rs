//! Firebase Realtime Database over its REST API.
//!
//! Every location is reachable as `{database_url}/{path}.json`, with the
//! database credential (if any) in the `auth` query parameter:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | get | `GET` |
//! | push | `POST` (answers `{"name": "<push key>"}`) |
//! | update | `PATCH` |
//! | remove | `DELETE` |
//! | update many | `PATCH` on the root with `{"a/b": value, ...}` |
//! | subscribe | `GET` with `Accept: text/event-stream` |

use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{ACCEPT, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::instrument;
use url::Url;

use moon_bling_core::PushKey;

use super::sse::{StreamEvent, extract_sse_event, parse_sse_event};
use super::{DatabaseError, DbPath, RealtimeDatabase, ValueStream, tree};
use crate::config::FirebaseConfig;

/// Connect timeout for streaming requests (the body itself is unbounded).
const STREAM_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// REST client for one Realtime Database instance.
#[derive(Clone)]
pub struct RestDatabase {
    inner: Arc<RestInner>,
}

struct RestInner {
    /// Client with a request timeout, for request/response calls.
    client: reqwest::Client,
    /// Client without a total timeout, for event streams.
    stream_client: reqwest::Client,
    base_url: Url,
    secret: Option<SecretString>,
}

#[derive(Deserialize)]
struct PushResponse {
    name: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

impl RestDatabase {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the streaming HTTP client cannot be built.
    pub fn new(config: &FirebaseConfig, client: reqwest::Client) -> Result<Self, DatabaseError> {
        let stream_client = reqwest::Client::builder()
            .connect_timeout(STREAM_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(RestInner {
                client,
                stream_client,
                base_url: config.database_url.clone(),
                secret: config.database_secret.clone(),
            }),
        })
    }

    /// `{base}/{segments...}.json?auth=...`
    fn location_url(&self, path: &DbPath) -> Result<Url, DatabaseError> {
        let mut url = self.inner.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| DatabaseError::Status {
                    status: 0,
                    message: "database URL cannot be a base".to_string(),
                })?;
            segments.pop_if_empty();
            match path.segments().split_last() {
                Some((last, parents)) => {
                    segments.extend(parents);
                    segments.push(&format!("{last}.json"));
                }
                None => {
                    segments.push(".json");
                }
            }
        }
        if let Some(secret) = &self.inner.secret {
            url.query_pairs_mut()
                .append_pair("auth", secret.expose_secret());
        }
        Ok(url)
    }

    /// Turn a response into its JSON body, mapping error statuses.
    async fn read_json(response: reqwest::Response) -> Result<Value, DatabaseError> {
        let status = response.status();
        let response_text = response.text().await?;

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(DatabaseError::PermissionDenied);
        }
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&response_text).map_or_else(
                |_| response_text.chars().take(200).collect(),
                |e| e.error,
            );
            tracing::error!(status = %status, message = %message, "Database returned non-success status");
            return Err(DatabaseError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if response_text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&response_text)?)
    }
}

#[async_trait]
impl RealtimeDatabase for RestDatabase {
    #[instrument(skip(self), fields(path = %path))]
    async fn get(&self, path: &DbPath) -> Result<Value, DatabaseError> {
        let response = self
            .inner
            .client
            .get(self.location_url(path)?)
            .send()
            .await?;
        Self::read_json(response).await
    }

    #[instrument(skip(self, value), fields(path = %path))]
    async fn push(&self, path: &DbPath, value: Value) -> Result<PushKey, DatabaseError> {
        let response = self
            .inner
            .client
            .post(self.location_url(path)?)
            .json(&value)
            .send()
            .await?;
        let body: PushResponse = serde_json::from_value(Self::read_json(response).await?)?;
        Ok(PushKey::parse(&body.name)?)
    }

    #[instrument(skip(self, fields), fields(path = %path))]
    async fn update(&self, path: &DbPath, fields: Map<String, Value>) -> Result<(), DatabaseError> {
        let response = self
            .inner
            .client
            .patch(self.location_url(path)?)
            .json(&fields)
            .send()
            .await?;
        Self::read_json(response).await.map(drop)
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn remove(&self, path: &DbPath) -> Result<(), DatabaseError> {
        let response = self
            .inner
            .client
            .delete(self.location_url(path)?)
            .send()
            .await?;
        Self::read_json(response).await.map(drop)
    }

    #[instrument(skip(self, writes), fields(count = writes.len()))]
    async fn update_many(&self, writes: Vec<(DbPath, Value)>) -> Result<(), DatabaseError> {
        let body: Map<String, Value> = writes
            .into_iter()
            .map(|(path, value)| (path.to_string(), value))
            .collect();

        let response = self
            .inner
            .client
            .patch(self.location_url(&DbPath::root())?)
            .json(&body)
            .send()
            .await?;
        Self::read_json(response).await.map(drop)
    }

    fn subscribe(&self, path: &DbPath) -> ValueStream {
        let url = self.location_url(path);
        let client = self.inner.stream_client.clone();
        let path = path.clone();

        Box::pin(stream! {
            let url = match url {
                Ok(url) => url,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            let response = match client
                .get(url)
                .header(ACCEPT, HeaderValue::from_static("text/event-stream"))
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    yield Err(DatabaseError::Http(e));
                    return;
                }
            };

            let status = response.status();
            if !status.is_success() {
                yield Err(match Self::read_json(response).await {
                    Err(e) => e,
                    Ok(_) => DatabaseError::Status {
                        status: status.as_u16(),
                        message: "unexpected stream response".to_string(),
                    },
                });
                return;
            }

            tracing::debug!(path = %path, "Database stream opened");

            let mut mirror = Value::Null;
            let mut buffer: Vec<u8> = Vec::new();
            let mut byte_stream = std::pin::pin!(response.bytes_stream());

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(DatabaseError::Http(e));
                        return;
                    }
                };
                buffer.extend(chunk.iter().filter(|&&b| b != b'\r'));

                while let Some(event) = extract_sse_event(&mut buffer) {
                    match parse_sse_event(&event) {
                        None | Some(Ok(StreamEvent::KeepAlive)) => {}
                        Some(Ok(StreamEvent::Cancel)) => {
                            yield Err(DatabaseError::PermissionDenied);
                            return;
                        }
                        Some(Ok(StreamEvent::AuthRevoked)) => {
                            yield Err(DatabaseError::Cancelled("credential revoked".to_string()));
                            return;
                        }
                        Some(Ok(change)) => {
                            change.apply(&mut mirror);
                            yield Ok(tree::normalize(mirror.clone()));
                        }
                        Some(Err(e)) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }

            tracing::debug!(path = %path, "Database stream closed by server");
            yield Err(DatabaseError::Cancelled("stream closed".to_string()));
        })
    }
}
