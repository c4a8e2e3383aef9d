use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::action::PostAction;
use crate::config::ControllerConfig;
use crate::post::{likes_markup, EditRequest, EditResponse, PostId, ViewMode};
use crate::request::{HttpRequest, Method, RequestError, RequestHelper};
use crate::view::PostView;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("unexpected response: {0}")]
    UnexpectedPayload(String),

    #[error("could not encode request: {0}")]
    Encode(String),

    #[error("post is not being edited")]
    NotEditing,
}

pub type ActionResult = Result<(), ActionError>;

/// Owns the view state of one post and drives its like, unlike and edit
/// requests. No borrow of the view is held across an await, so several
/// requests for the same post may be in flight at once.
pub struct PostController<V: PostView> {
    id: PostId,
    view: RefCell<V>,
    confirmed_content: RefCell<String>,
    requests: Rc<RequestHelper>,
    config: Rc<ControllerConfig>,
}

impl<V: PostView> PostController<V> {
    pub fn new(
        id: PostId,
        mut view: V,
        requests: Rc<RequestHelper>,
        config: Rc<ControllerConfig>,
    ) -> Self {
        view.show(ViewMode::Content);
        let confirmed_content = RefCell::new(view.displayed_content());

        PostController {
            id,
            view: RefCell::new(view),
            confirmed_content,
            requests,
            config,
        }
    }

    pub fn id(&self) -> &PostId {
        &self.id
    }

    pub fn mode(&self) -> ViewMode {
        self.view.borrow().mode()
    }

    #[cfg(test)]
    pub(crate) fn view(&self) -> std::cell::Ref<'_, V> {
        self.view.borrow()
    }

    #[cfg(test)]
    pub(crate) fn view_mut(&self) -> std::cell::RefMut<'_, V> {
        self.view.borrow_mut()
    }

    pub fn enter_edit_mode(&self) {
        let mut view = self.view.borrow_mut();
        if view.mode() == ViewMode::Editing {
            log::debug!("post {}: already editing", self.id);
            return;
        }

        let content = view.displayed_content();
        view.set_edit_text(&content);
        view.show(ViewMode::Editing);
        log::debug!("post {}: editing", self.id);
    }

    pub fn cancel_edit_mode(&self) {
        let mut view = self.view.borrow_mut();
        if view.mode() == ViewMode::Content {
            log::debug!("post {}: not editing, nothing to cancel", self.id);
            return;
        }

        view.set_edit_text(&self.confirmed_content.borrow());
        view.show(ViewMode::Content);
        log::debug!("post {}: edit cancelled", self.id);
    }

    pub async fn submit_edit(&self) -> ActionResult {
        let (url, content) = {
            let view = self.view.borrow();
            if view.mode() != ViewMode::Editing {
                log::debug!("post {}: submit ignored, not editing", self.id);
                return Err(ActionError::NotEditing);
            }

            let url = view
                .edit_action()
                .filter(|action| !action.trim().is_empty())
                .unwrap_or_else(|| self.config.edit_url(&self.id));
            (url, view.edit_text())
        };

        match self.send_edit(url, content).await {
            Ok(updated) => {
                let mut view = self.view.borrow_mut();
                view.set_displayed_content(&updated.content);
                view.set_edit_text(&updated.content);
                view.show(ViewMode::Content);
                view.clear_failure();
                *self.confirmed_content.borrow_mut() = updated.content;
                log::debug!("post {}: edit saved", self.id);
                Ok(())
            }
            Err(err) => Err(self.report("save your edit", err)),
        }
    }

    async fn send_edit(&self, url: String, content: String) -> Result<EditResponse, ActionError> {
        let body = serde_json::to_string(&EditRequest { content })
            .map_err(|err| ActionError::Encode(err.to_string()))?;

        let response = self
            .requests
            .send(HttpRequest::new(Method::Put, url).json_body(body))
            .await?;

        EditResponse::from_body(response).map_err(ActionError::UnexpectedPayload)
    }

    pub async fn toggle_like(&self) -> ActionResult {
        let url = self.config.like_url(&self.id);
        self.update_likes(url, "like this post").await
    }

    pub async fn toggle_unlike(&self) -> ActionResult {
        let url = self.config.unlike_url(&self.id);
        self.update_likes(url, "unlike this post").await
    }

    /// Whatever the server sends back replaces the likes section, whatever
    /// it showed before.
    async fn update_likes(&self, url: String, what: &str) -> ActionResult {
        let result = match self.requests.send(HttpRequest::new(Method::Post, url)).await {
            Ok(body) => likes_markup(body).map_err(ActionError::UnexpectedPayload),
            Err(err) => Err(err.into()),
        };

        match result {
            Ok(markup) => {
                let mut view = self.view.borrow_mut();
                view.set_likes_markup(&markup);
                view.clear_failure();
                Ok(())
            }
            Err(err) => Err(self.report(what, err)),
        }
    }

    pub async fn dispatch(&self, action: PostAction) -> ActionResult {
        match action {
            PostAction::Like => self.toggle_like().await,
            PostAction::Unlike => self.toggle_unlike().await,
            PostAction::Edit => {
                self.enter_edit_mode();
                Ok(())
            }
            PostAction::CancelEdit => {
                self.cancel_edit_mode();
                Ok(())
            }
        }
    }

    fn report(&self, what: &str, err: ActionError) -> ActionError {
        log::warn!("post {}: could not {}: {}", self.id, what, err);

        let message = format!("Could not {}: {}", what, err);
        let shown = self.view.borrow_mut().notify_failure(&message);
        if !shown {
            V::alert(&message);
        }
        err
    }
}
