use std::fmt;

use crate::request::ResponseBody;

/// Opaque identifier of a rendered post, taken verbatim from its `data-id`.
#[derive(Hash, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PostId(String);

impl PostId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PostId {
    fn from(id: &str) -> Self {
        PostId(id.to_owned())
    }
}

impl From<String> for PostId {
    fn from(id: String) -> Self {
        PostId(id)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which of the two views of a post is visible. Never both, never neither.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewMode {
    Content,
    Editing,
}

impl Default for ViewMode {
    fn default() -> Self {
        ViewMode::Content
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct EditRequest {
    pub content: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct EditResponse {
    pub content: String,
}

impl EditResponse {
    pub fn from_body(body: ResponseBody) -> Result<Self, String> {
        match body {
            ResponseBody::Json(value) => serde_json::from_value(value)
                .map_err(|err| format!("edit response is missing content: {}", err)),
            ResponseBody::Text(text) => Err(format!("expected json edit response, got text: {}", text)),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
struct LikesObject {
    likes: String,
}

/// The likes fragment returned by the like/unlike endpoints. Servers either
/// send the markup as text, as a JSON string, or as `{"likes": "..."}`.
pub fn likes_markup(body: ResponseBody) -> Result<String, String> {
    match body {
        ResponseBody::Text(markup) => Ok(markup),
        ResponseBody::Json(serde_json::Value::String(markup)) => Ok(markup),
        ResponseBody::Json(value) => serde_json::from_value::<LikesObject>(value.clone())
            .map(|likes| likes.likes)
            .map_err(|_err| format!("unexpected likes payload: {}", value)),
    }
}
