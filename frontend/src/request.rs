use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }

    /// Mutating verbs must carry the CSRF token.
    pub fn needs_csrf(&self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        HttpRequest {
            url: url.into(),
            method,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json_body(self, body: String) -> Self {
        let mut request = self.header("Content-Type", "application/json");
        request.body = Some(body);
        request
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A response as it came off the wire, before any decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|content_type| content_type.to_ascii_lowercase().contains("json"))
            .unwrap_or(false)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
    Json(serde_json::Value),
    Text(String),
}

impl fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Json(value) => write!(f, "{}", value),
            ResponseBody::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error("network error: {0}")]
    Network(String),

    #[error("server rejected request ({status}): {body}")]
    Rejected { status: u16, body: ResponseBody },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("csrf token field {0} not found")]
    MissingCsrfToken(String),

    #[error("browser error: {0}")]
    Browser(String),
}

pub type RequestResult<T> = Result<T, RequestError>;

/// Sends a request and hands back whatever the server answered. Only fails
/// when no response was produced at all.
#[async_trait(?Send)]
pub trait Transport {
    async fn send(&self, request: &HttpRequest) -> RequestResult<RawResponse>;
}

pub trait CsrfSource {
    fn csrf_token(&self) -> Option<String>;
}

pub fn decode_response(response: RawResponse) -> RequestResult<ResponseBody> {
    let success = response.is_success();
    let status = response.status;

    let body = if response.is_json() {
        let value = serde_json::from_str(&response.body)
            .map_err(|err| RequestError::Decode(err.to_string()))?;
        ResponseBody::Json(value)
    } else {
        ResponseBody::Text(response.body)
    };

    if success {
        Ok(body)
    } else {
        Err(RequestError::Rejected { status, body })
    }
}

pub struct RequestHelper {
    transport: Rc<dyn Transport>,
    csrf: Rc<dyn CsrfSource>,
    csrf_header: String,
    csrf_field_name: String,
}

impl RequestHelper {
    pub fn new(
        transport: Rc<dyn Transport>,
        csrf: Rc<dyn CsrfSource>,
        csrf_header: impl Into<String>,
        csrf_field_name: impl Into<String>,
    ) -> Self {
        RequestHelper {
            transport,
            csrf,
            csrf_header: csrf_header.into(),
            csrf_field_name: csrf_field_name.into(),
        }
    }

    pub async fn send(&self, mut request: HttpRequest) -> RequestResult<ResponseBody> {
        if request.method.needs_csrf() {
            let token = self
                .csrf
                .csrf_token()
                .ok_or_else(|| RequestError::MissingCsrfToken(self.csrf_field_name.clone()))?;
            request = request.header(self.csrf_header.clone(), token);
        }

        log::info!("{} {}", request.method, request.url);

        let response = self.transport.send(&request).await?;
        log::debug!(
            "{} {} -> {} ({:?})",
            request.method,
            request.url,
            response.status,
            response.content_type
        );

        decode_response(response)
    }
}
