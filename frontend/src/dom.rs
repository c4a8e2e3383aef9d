use std::rc::Rc;

use async_trait::async_trait;
use thiserror::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    Document, Element, Event, Headers, HtmlElement, HtmlFormElement, HtmlInputElement,
    HtmlTextAreaElement, Request, RequestInit, Response, Window,
};

use crate::action::{ActionTable, ControlElement, PostAction};
use crate::config::ControllerConfig;
use crate::controller::PostController;
use crate::post::{PostId, ViewMode};
use crate::request::{
    CsrfSource, HttpRequest, RawResponse, RequestError, RequestHelper, RequestResult, Transport,
};
use crate::view::PostView;

pub type DomController = PostController<DomPostView>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("no element matches {0}")]
    MissingElement(String),

    #[error("element has no {0} attribute")]
    MissingAttribute(String),

    #[error("{0} is not the expected element type")]
    WrongElementType(String),

    #[error("browser error: {0}")]
    Browser(String),
}

impl From<DomError> for JsValue {
    fn from(err: DomError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

pub fn js_error(value: &JsValue) -> String {
    match value.dyn_ref::<js_sys::Error>() {
        Some(err) => String::from(err.message()),
        None => value.as_string().unwrap_or_else(|| format!("{:?}", value)),
    }
}

pub fn window_and_document() -> Result<(Window, Document), DomError> {
    let window = web_sys::window().ok_or_else(|| DomError::Browser("no window".into()))?;
    let document = window
        .document()
        .ok_or_else(|| DomError::Browser("no document".into()))?;

    Ok((window, document))
}

fn query(parent: &Element, selector: &str) -> Result<Element, DomError> {
    parent
        .query_selector(selector)
        .map_err(|err| DomError::Browser(js_error(&err)))?
        .ok_or_else(|| DomError::MissingElement(selector.to_owned()))
}

fn cast<T: JsCast>(element: Element, what: &str) -> Result<T, DomError> {
    element
        .dyn_into::<T>()
        .map_err(|_el| DomError::WrongElementType(what.to_owned()))
}

fn set_displayed(element: &HtmlElement, visible: bool) {
    let display = if visible { "block" } else { "none" };
    if let Err(err) = element.style().set_property("display", display) {
        log::warn!("could not set display to {}: {}", display, js_error(&err));
    }
}

impl ControlElement for Element {
    fn has_class(&self, class: &str) -> bool {
        self.class_list().contains(class)
    }

    fn parent(&self) -> Option<Self> {
        self.parent_element()
    }
}

/// A post rendered as
///
/// ```html
/// <div class="post" data-id="..">
///   <div class="content-container">
///     <div><form><textarea></textarea>..</form></div>  <!-- editing view -->
///     <div><p>content</p>..</div>                      <!-- content view -->
///   </div>
///   <div class="likes-container">..</div>
/// </div>
/// ```
pub struct DomPostView {
    editing_view: HtmlElement,
    content_view: HtmlElement,
    content: Element,
    edit_field: HtmlTextAreaElement,
    form: HtmlFormElement,
    likes: Element,
    feedback: Option<HtmlElement>,
    mode: ViewMode,
}

impl DomPostView {
    pub fn from_post(post: &Element, config: &ControllerConfig) -> Result<(PostId, Self), DomError> {
        let id = post
            .get_attribute(&config.id_attribute)
            .ok_or_else(|| DomError::MissingAttribute(config.id_attribute.clone()))?;

        let container = query(post, &config.content_container_selector)?;
        let children = container.children();
        let editing_view = children.item(0).ok_or_else(|| {
            DomError::MissingElement(format!("{} > editing view", config.content_container_selector))
        })?;
        let content_view = children.item(1).ok_or_else(|| {
            DomError::MissingElement(format!("{} > content view", config.content_container_selector))
        })?;

        let content = query(&content_view, &config.content_selector)?;
        let edit_field = cast(query(&editing_view, &config.edit_field_selector)?, "edit field")?;
        let form = cast(query(&editing_view, &config.edit_form_selector)?, "edit form")?;
        let likes = query(post, &config.likes_selector)?;
        let feedback = post
            .query_selector(&config.feedback_selector)
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<HtmlElement>().ok());

        let view = DomPostView {
            editing_view: cast(editing_view, "editing view")?,
            content_view: cast(content_view, "content view")?,
            content,
            edit_field,
            form,
            likes,
            feedback,
            mode: ViewMode::Content,
        };

        Ok((PostId::from(id), view))
    }

    pub fn form(&self) -> &HtmlFormElement {
        &self.form
    }
}

impl PostView for DomPostView {
    fn mode(&self) -> ViewMode {
        self.mode
    }

    fn show(&mut self, mode: ViewMode) {
        let editing = mode == ViewMode::Editing;
        set_displayed(&self.editing_view, editing);
        set_displayed(&self.content_view, !editing);
        self.mode = mode;
    }

    fn displayed_content(&self) -> String {
        self.content.text_content().unwrap_or_default()
    }

    fn set_displayed_content(&mut self, content: &str) {
        self.content.set_text_content(Some(content));
    }

    fn edit_text(&self) -> String {
        self.edit_field.value()
    }

    fn set_edit_text(&mut self, text: &str) {
        self.edit_field.set_value(text);
    }

    fn set_likes_markup(&mut self, markup: &str) {
        self.likes.set_inner_html(markup);
    }

    fn edit_action(&self) -> Option<String> {
        self.form.get_attribute("action")
    }

    fn notify_failure(&mut self, message: &str) -> bool {
        match &self.feedback {
            Some(feedback) => {
                feedback.set_text_content(Some(message));
                set_displayed(feedback, true);
                true
            }
            None => false,
        }
    }

    fn clear_failure(&mut self) {
        if let Some(feedback) = &self.feedback {
            feedback.set_text_content(None);
            set_displayed(feedback, false);
        }
    }

    fn alert(message: &str) {
        let alerted = web_sys::window().map(|window| window.alert_with_message(message));
        if !matches!(alerted, Some(Ok(()))) {
            log::warn!("could not show notification: {}", message);
        }
    }
}

/// Reads the CSRF token from the page each time it is asked for.
pub struct DocumentCsrf {
    document: Document,
    selector: String,
}

impl DocumentCsrf {
    pub fn new(document: Document, config: &ControllerConfig) -> Self {
        DocumentCsrf {
            document,
            selector: config.csrf_selector(),
        }
    }
}

impl CsrfSource for DocumentCsrf {
    fn csrf_token(&self) -> Option<String> {
        let field = self.document.query_selector(&self.selector).ok().flatten()?;
        match field.dyn_ref::<HtmlInputElement>() {
            Some(input) => Some(input.value()),
            None => field.get_attribute("value"),
        }
    }
}

pub struct FetchTransport;

#[async_trait(?Send)]
impl Transport for FetchTransport {
    async fn send(&self, request: &HttpRequest) -> RequestResult<RawResponse> {
        let browser_error = |err: JsValue| RequestError::Browser(js_error(&err));

        let window = web_sys::window().ok_or_else(|| RequestError::Browser("no window".into()))?;

        let headers = Headers::new().map_err(browser_error)?;
        for (name, value) in &request.headers {
            headers.append(name, value).map_err(browser_error)?;
        }

        let init = RequestInit::new();
        init.set_method(request.method.as_str());
        init.set_headers(&headers);
        if let Some(body) = &request.body {
            init.set_body(&JsValue::from_str(body));
        }

        let fetch_request =
            Request::new_with_str_and_init(&request.url, &init).map_err(browser_error)?;

        // fetch only rejects when no response could be produced at all
        let response: Response = JsFuture::from(window.fetch_with_request(&fetch_request))
            .await
            .map_err(|err| RequestError::Network(js_error(&err)))?
            .dyn_into()
            .map_err(|_val| RequestError::Browser("fetch did not yield a Response".into()))?;

        let content_type = response
            .headers()
            .get("content-type")
            .map_err(browser_error)?;
        let body = JsFuture::from(response.text().map_err(browser_error)?)
            .await
            .map_err(|err| RequestError::Network(js_error(&err)))?
            .as_string()
            .unwrap_or_default();

        Ok(RawResponse {
            status: response.status(),
            content_type,
            body,
        })
    }
}

fn handle_action(controller: &Rc<DomController>, action: PostAction) {
    match action {
        PostAction::Edit => controller.enter_edit_mode(),
        PostAction::CancelEdit => controller.cancel_edit_mode(),
        PostAction::Like | PostAction::Unlike => {
            let controller = controller.clone();
            spawn_local(async move {
                if let Err(err) = controller.dispatch(action).await {
                    log::debug!("post {}: {:?} abandoned: {}", controller.id(), action, err);
                }
            });
        }
    }
}

/// Builds the controller for one post element and installs its click and
/// submit handlers.
pub fn attach_post(
    post: &Element,
    config: Rc<ControllerConfig>,
    requests: Rc<RequestHelper>,
) -> Result<Rc<DomController>, DomError> {
    let post_el: HtmlElement = cast(post.clone(), "post")?;
    let (id, view) = DomPostView::from_post(post, &config)?;
    let form = view.form().clone();
    let table = ActionTable::from_config(&config);

    let controller = Rc::new(PostController::new(id, view, requests, config));

    let controller0 = controller.clone();
    let onclick = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        let target = match event.target().and_then(|t| t.dyn_into::<Element>().ok()) {
            Some(target) => target,
            None => return,
        };

        if let Some(action) = table.classify(&target) {
            handle_action(&controller0, action);
        }
    });
    post_el.set_onclick(Some(onclick.as_ref().unchecked_ref()));
    onclick.forget();

    let controller1 = controller.clone();
    let onsubmit = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        event.prevent_default();

        let controller = controller1.clone();
        spawn_local(async move {
            if let Err(err) = controller.submit_edit().await {
                log::debug!("post {}: edit abandoned: {}", controller.id(), err);
            }
        });
    });
    form.set_onsubmit(Some(onsubmit.as_ref().unchecked_ref()));
    onsubmit.forget();

    log::debug!("attached post {}", controller.id());
    Ok(controller)
}

/// Attaches every post under `root`. A malformed post is skipped with a
/// warning so the others keep working.
pub fn attach_all(
    root: &Element,
    config: Rc<ControllerConfig>,
    requests: Rc<RequestHelper>,
) -> Result<Vec<Rc<DomController>>, DomError> {
    let posts = root
        .query_selector_all(&config.post_selector)
        .map_err(|err| DomError::Browser(js_error(&err)))?;

    let mut controllers = Vec::new();
    for index in 0..posts.length() {
        let post = match posts.item(index).and_then(|node| node.dyn_into::<Element>().ok()) {
            Some(post) => post,
            None => continue,
        };

        match attach_post(&post, config.clone(), requests.clone()) {
            Ok(controller) => controllers.push(controller),
            Err(err) => log::warn!("skipping post #{}: {}", index, err),
        }
    }

    Ok(controllers)
}

/// Request helper wired to the page's CSRF field and the browser's fetch.
pub fn page_request_helper(document: &Document, config: &ControllerConfig) -> RequestHelper {
    RequestHelper::new(
        Rc::new(FetchTransport),
        Rc::new(DocumentCsrf::new(document.clone(), config)),
        config.csrf_header.clone(),
        config.csrf_field_name.clone(),
    )
}
