use crate::post::PostId;

pub const POST_SELECTOR: &'static str = ".post";
pub const POST_ID_ATTRIBUTE: &'static str = "data-id";
pub const CSRF_FIELD_NAME: &'static str = "csrfmiddlewaretoken";
pub const CSRF_HEADER: &'static str = "X-CSRFToken";

/// Placeholder replaced with the post id in endpoint templates.
pub const ID_PLACEHOLDER: &'static str = "{id}";

/// Everything about the page markup and the server routes the controllers
/// depend on. Any field left out of a JSON override keeps its default.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ControllerConfig {
    pub post_selector: String,
    pub id_attribute: String,
    pub content_container_selector: String,
    pub content_selector: String,
    pub edit_field_selector: String,
    pub edit_form_selector: String,
    pub likes_selector: String,
    pub feedback_selector: String,

    pub like_class: String,
    pub unlike_class: String,
    pub edit_class: String,
    pub cancel_edit_class: String,

    pub like_path: String,
    pub unlike_path: String,
    pub edit_path: String,

    pub csrf_field_name: String,
    pub csrf_header: String,

    /// `log` level name, e.g. `"debug"`. Unknown names fall back to info.
    pub log_level: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            post_selector: POST_SELECTOR.into(),
            id_attribute: POST_ID_ATTRIBUTE.into(),
            content_container_selector: ".content-container".into(),
            content_selector: "p".into(),
            edit_field_selector: "textarea".into(),
            edit_form_selector: "form".into(),
            likes_selector: "div.likes-container".into(),
            feedback_selector: ".post-feedback".into(),

            like_class: "like-post".into(),
            unlike_class: "unlike-post".into(),
            edit_class: "edit-post".into(),
            cancel_edit_class: "cancel-edit-post".into(),

            like_path: "/posts/{id}/like".into(),
            unlike_path: "/posts/{id}/unlike".into(),
            edit_path: "/posts/{id}/edit".into(),

            csrf_field_name: CSRF_FIELD_NAME.into(),
            csrf_header: CSRF_HEADER.into(),

            log_level: "info".into(),
        }
    }
}

impl ControllerConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn like_url(&self, id: &PostId) -> String {
        expand_path(&self.like_path, id)
    }

    pub fn unlike_url(&self, id: &PostId) -> String {
        expand_path(&self.unlike_path, id)
    }

    pub fn edit_url(&self, id: &PostId) -> String {
        expand_path(&self.edit_path, id)
    }

    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }

    /// Attribute selector for the hidden CSRF input, e.g.
    /// `[name=csrfmiddlewaretoken]`.
    pub fn csrf_selector(&self) -> String {
        format!("[name={}]", self.csrf_field_name)
    }
}

fn expand_path(template: &str, id: &PostId) -> String {
    template.replace(ID_PLACEHOLDER, id.as_str())
}
