use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response};

use crate::config::ChatApiConfig;
use crate::decode::StreamTextDecoder;
use crate::error::{parse_error_message, ChatApiError};
use crate::headers::{build_headers, HEADER_SESSION_ID};
use crate::payload::{AskRequest, HistoryRecord, HistoryResponse, SessionRecord, SessionsResponse};
use crate::url::{ask_stream_url, history_url, normalize_base_url, session_url, sessions_url};

type ByteChunks = BoxStream<'static, Result<Vec<u8>, reqwest::Error>>;

/// HTTP client for the conversation service endpoints.
#[derive(Debug)]
pub struct ChatApiClient {
    http: Client,
    config: ChatApiConfig,
}

impl ChatApiClient {
    pub fn new(config: ChatApiConfig) -> Result<Self, ChatApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ChatApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ChatApiConfig {
        &self.config
    }

    pub fn normalized_base_url(&self) -> String {
        normalize_base_url(&self.config.base_url)
    }

    fn header_map(&self) -> Result<HeaderMap, ChatApiError> {
        let headers = build_headers(&self.config, None);
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                    ChatApiError::InvalidHeader(format!("invalid header key: {key}"))
                })?,
                HeaderValue::from_str(&value).map_err(|_| {
                    ChatApiError::InvalidHeader(format!("invalid header value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    pub fn build_ask_request(
        &self,
        request: &AskRequest,
    ) -> Result<reqwest::RequestBuilder, ChatApiError> {
        if request.user_input.trim().is_empty() {
            return Err(ChatApiError::EmptyUserInput);
        }

        let headers = self.header_map()?;
        Ok(self
            .http
            .post(ask_stream_url(&self.config.base_url))
            .headers(headers)
            .json(request))
    }

    /// Open the streaming reply for one exchange.
    ///
    /// The returned stream reports the server-assigned session id (when the
    /// response carries one) before any chunk is consumed.
    pub async fn open_ask_stream(&self, request: &AskRequest) -> Result<AskStream, ChatApiError> {
        let response = self
            .build_ask_request(request)?
            .send()
            .await
            .map_err(ChatApiError::from)?;
        let response = check_status(response).await?;
        Ok(AskStream::from_response(response))
    }

    pub async fn list_sessions(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<SessionRecord>, ChatApiError> {
        let mut request = self
            .http
            .get(sessions_url(&self.config.base_url))
            .headers(self.header_map()?);
        if let Some(user_id) = user_id {
            request = request.query(&[("user_id", user_id)]);
        }

        let response = check_status(request.send().await?).await?;
        let parsed = response.json::<SessionsResponse>().await?;
        Ok(parsed.sessions)
    }

    pub async fn fetch_history(
        &self,
        session_id: &str,
    ) -> Result<Vec<HistoryRecord>, ChatApiError> {
        let request = self
            .http
            .get(history_url(&self.config.base_url, session_id))
            .headers(self.header_map()?);

        let response = check_status(request.send().await?).await?;
        let parsed = response.json::<HistoryResponse>().await?;
        Ok(parsed.history)
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<(), ChatApiError> {
        let request = self
            .http
            .delete(session_url(&self.config.base_url, session_id))
            .headers(self.header_map()?);

        check_status(request.send().await?).await?;
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response, ChatApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_else(|_| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });
    Err(ChatApiError::Status(status, parse_error_message(status, &body)))
}

/// Incremental view over one streaming reply body.
pub struct AskStream {
    assigned_session_id: Option<String>,
    bytes: ByteChunks,
    decoder: StreamTextDecoder,
    finished: bool,
}

impl AskStream {
    fn from_response(response: Response) -> Self {
        let assigned_session_id = response
            .headers()
            .get(HEADER_SESSION_ID)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned);
        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed();

        Self {
            assigned_session_id,
            bytes,
            decoder: StreamTextDecoder::default(),
            finished: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_parts(assigned_session_id: Option<String>, bytes: ByteChunks) -> Self {
        Self {
            assigned_session_id,
            bytes,
            decoder: StreamTextDecoder::default(),
            finished: false,
        }
    }

    /// Session id the service bound this exchange to, when provided.
    pub fn assigned_session_id(&self) -> Option<&str> {
        self.assigned_session_id.as_deref()
    }

    /// Next decoded text chunk in arrival order, or `None` at end of stream.
    ///
    /// Chunks that decode to nothing (a lone partial sequence) are skipped
    /// rather than surfaced as empty strings.
    pub async fn next_chunk(&mut self) -> Option<Result<String, ChatApiError>> {
        if self.finished {
            return None;
        }

        while let Some(chunk) = self.bytes.next().await {
            match chunk {
                Ok(bytes) => {
                    let text = self.decoder.feed(&bytes);
                    if !text.is_empty() {
                        return Some(Ok(text));
                    }
                }
                Err(error) => {
                    self.finished = true;
                    return Some(Err(ChatApiError::from(error)));
                }
            }
        }

        self.finished = true;
        let tail = self.decoder.finish();
        if tail.is_empty() {
            None
        } else {
            Some(Ok(tail))
        }
    }
}
