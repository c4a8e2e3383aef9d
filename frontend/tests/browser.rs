#![cfg(target_arch = "wasm32")]

extern crate async_trait;
extern crate js_sys;
extern crate network_frontend;
extern crate wasm_bindgen;
extern crate wasm_bindgen_futures;
extern crate wasm_bindgen_test;
extern crate web_sys;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use async_trait::async_trait;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;
use web_sys::{Document, Element, Event, EventInit, HtmlElement, HtmlFormElement, HtmlTextAreaElement};

use network_frontend::action::{ActionTable, PostAction};
use network_frontend::config::ControllerConfig;
use network_frontend::dom::{
    attach_all, attach_post, DocumentCsrf, DomController, DomError, DomPostView,
};
use network_frontend::post::ViewMode;
use network_frontend::request::{
    CsrfSource, HttpRequest, Method, RawResponse, RequestHelper, RequestResult, Transport,
};
use network_frontend::view::PostView;

wasm_bindgen_test_configure!(run_in_browser);

const POST_MARKUP: &'static str = r#"
  <div class="content-container">
    <div>
      <form>
        <textarea></textarea>
        <button class="save-edit-post" type="submit">Save</button>
        <button class="cancel-edit-post" type="button">Cancel</button>
      </form>
    </div>
    <div>
      <p>first post</p>
      <button class="edit-post">Edit</button>
    </div>
  </div>
  <div class="likes-container">
    <button class="like-post"><i class="icon-heart"></i></button>
  </div>
  <div class="post-feedback"></div>
"#;

#[derive(Default)]
struct CannedTransport {
    sent: RefCell<Vec<HttpRequest>>,
    replies: RefCell<VecDeque<RawResponse>>,
}

#[async_trait(?Send)]
impl Transport for CannedTransport {
    async fn send(&self, request: &HttpRequest) -> RequestResult<RawResponse> {
        self.sent.borrow_mut().push(request.clone());
        Ok(self.replies.borrow_mut().pop_front().expect("no reply queued"))
    }
}

struct FixedToken;

impl CsrfSource for FixedToken {
    fn csrf_token(&self) -> Option<String> {
        Some("browser-token".into())
    }
}

fn document() -> Document {
    web_sys::window().unwrap().document().unwrap()
}

fn render_post(id: &str) -> Element {
    let document = document();
    let post = document.create_element("div").unwrap();
    post.set_class_name("post");
    post.set_attribute("data-id", id).unwrap();
    post.set_inner_html(POST_MARKUP);
    document.body().unwrap().append_child(&post).unwrap();
    post
}

/// Waits for a timer tick, so every task queued by an event handler has run.
async fn settle() {
    let tick = js_sys::Promise::new(&mut |resolve, _reject| {
        web_sys::window()
            .unwrap()
            .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, 0)
            .unwrap();
    });
    JsFuture::from(tick).await.unwrap();
}

fn requests_with(transport: Rc<CannedTransport>) -> Rc<RequestHelper> {
    Rc::new(RequestHelper::new(
        transport,
        Rc::new(FixedToken),
        "X-CSRFToken",
        "csrfmiddlewaretoken",
    ))
}

fn display_of(post: &Element, child: u32) -> String {
    let container = post.query_selector(".content-container").unwrap().unwrap();
    let view: HtmlElement = container.children().item(child).unwrap().dyn_into().unwrap();
    view.style().get_property_value("display").unwrap()
}

fn attach(post: &Element, replies: Vec<RawResponse>) -> (Rc<DomController>, Rc<CannedTransport>) {
    let transport = Rc::new(CannedTransport::default());
    transport.replies.borrow_mut().extend(replies);

    let controller = attach_post(
        post,
        Rc::new(ControllerConfig::default()),
        requests_with(transport.clone()),
    )
    .unwrap();

    (controller, transport)
}

#[wasm_bindgen_test]
fn parses_post_layout() {
    let post = render_post("1");
    let (id, mut view) = DomPostView::from_post(&post, &ControllerConfig::default()).unwrap();

    assert_eq!(id.as_str(), "1");
    assert_eq!(view.displayed_content(), "first post");

    view.show(ViewMode::Editing);
    assert_eq!(display_of(&post, 0), "block");
    assert_eq!(display_of(&post, 1), "none");

    view.show(ViewMode::Content);
    assert_eq!(display_of(&post, 0), "none");
    assert_eq!(display_of(&post, 1), "block");
}

#[wasm_bindgen_test]
fn missing_id_is_reported() {
    let post = render_post("2");
    post.remove_attribute("data-id").unwrap();

    assert!(DomPostView::from_post(&post, &ControllerConfig::default()).is_err());
}

#[wasm_bindgen_test]
fn icon_click_classifies_as_like() {
    let post = render_post("3");
    let table = ActionTable::from_config(&ControllerConfig::default());
    let icon = post.query_selector(".icon-heart").unwrap().unwrap();
    let button = post.query_selector(".like-post").unwrap().unwrap();

    assert_eq!(table.classify(&icon), Some(PostAction::Like));
    assert_eq!(table.classify(&button), Some(PostAction::Like));
}

#[wasm_bindgen_test]
fn edit_and_cancel_buttons_toggle_views() {
    let post = render_post("4");
    let (controller, transport) = attach(&post, vec![]);
    assert_eq!(display_of(&post, 0), "none");

    let edit: HtmlElement = post.query_selector(".edit-post").unwrap().unwrap().dyn_into().unwrap();
    edit.click();
    assert_eq!(controller.mode(), ViewMode::Editing);
    assert_eq!(display_of(&post, 0), "block");
    assert_eq!(display_of(&post, 1), "none");

    let textarea: HtmlTextAreaElement =
        post.query_selector("textarea").unwrap().unwrap().dyn_into().unwrap();
    assert_eq!(textarea.value(), "first post");
    textarea.set_value("draft");

    let cancel: HtmlElement = post
        .query_selector(".cancel-edit-post")
        .unwrap()
        .unwrap()
        .dyn_into()
        .unwrap();
    cancel.click();
    assert_eq!(controller.mode(), ViewMode::Content);
    assert_eq!(textarea.value(), "first post");
    assert_eq!(post.query_selector("p").unwrap().unwrap().text_content().unwrap(), "first post");
    assert!(transport.sent.borrow().is_empty());
}

#[wasm_bindgen_test]
async fn like_patches_likes_container() {
    let post = render_post("42");
    let (controller, transport) = attach(
        &post,
        vec![RawResponse {
            status: 200,
            content_type: Some("text/html".into()),
            body: "<span>3 likes</span>".into(),
        }],
    );

    controller.toggle_like().await.unwrap();

    let sent = transport.sent.borrow();
    assert_eq!(sent[0].method, Method::Post);
    assert_eq!(sent[0].url, "/posts/42/like");
    assert_eq!(sent[0].header_value("X-CSRFToken"), Some("browser-token"));
    let likes = post.query_selector("div.likes-container").unwrap().unwrap();
    assert_eq!(likes.inner_html(), "<span>3 likes</span>");
}

#[wasm_bindgen_test]
async fn submit_edit_updates_paragraph() {
    let post = render_post("7");
    let (controller, transport) = attach(
        &post,
        vec![RawResponse {
            status: 200,
            content_type: Some("application/json".into()),
            body: r#"{"content":"hello!"}"#.into(),
        }],
    );

    controller.enter_edit_mode();
    let textarea: HtmlTextAreaElement =
        post.query_selector("textarea").unwrap().unwrap().dyn_into().unwrap();
    textarea.set_value("hello");
    controller.submit_edit().await.unwrap();

    assert_eq!(transport.sent.borrow()[0].method, Method::Put);
    assert_eq!(
        transport.sent.borrow()[0].body.as_deref(),
        Some(r#"{"content":"hello"}"#)
    );
    assert_eq!(post.query_selector("p").unwrap().unwrap().text_content().unwrap(), "hello!");
    assert_eq!(controller.mode(), ViewMode::Content);
}

#[wasm_bindgen_test]
async fn rejected_edit_shows_feedback() {
    let post = render_post("8");
    let (controller, _transport) = attach(
        &post,
        vec![RawResponse {
            status: 401,
            content_type: Some("text/html".into()),
            body: "Unauthorized".into(),
        }],
    );

    controller.enter_edit_mode();
    assert!(controller.submit_edit().await.is_err());

    assert_eq!(controller.mode(), ViewMode::Editing);
    assert_eq!(display_of(&post, 0), "block");
    let feedback = post.query_selector(".post-feedback").unwrap().unwrap();
    assert!(feedback.text_content().unwrap().contains("Unauthorized"));
}

#[wasm_bindgen_test]
fn csrf_token_read_from_hidden_input() {
    let document = document();
    let input = document.create_element("input").unwrap();
    input.set_attribute("type", "hidden").unwrap();
    input.set_attribute("name", "csrfmiddlewaretoken").unwrap();
    input.set_attribute("value", "abc123").unwrap();
    document.body().unwrap().append_child(&input).unwrap();

    let csrf = DocumentCsrf::new(document, &ControllerConfig::default());
    assert_eq!(csrf.csrf_token(), Some("abc123".into()));

    input.remove();
}

#[wasm_bindgen_test]
async fn clicking_like_icon_sends_like() {
    let post = render_post("42");
    let (_controller, transport) = attach(
        &post,
        vec![RawResponse {
            status: 200,
            content_type: Some("text/html".into()),
            body: "<span>3 likes</span>".into(),
        }],
    );

    let icon: HtmlElement = post.query_selector(".icon-heart").unwrap().unwrap().dyn_into().unwrap();
    icon.click();
    settle().await;

    let sent = transport.sent.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, Method::Post);
    assert_eq!(sent[0].url, "/posts/42/like");
    assert_eq!(sent[0].header_value("X-CSRFToken"), Some("browser-token"));
    let likes = post.query_selector("div.likes-container").unwrap().unwrap();
    assert_eq!(likes.inner_html(), "<span>3 likes</span>");
}

#[wasm_bindgen_test]
async fn form_submit_is_intercepted_and_saved() {
    let post = render_post("11");
    let (controller, transport) = attach(
        &post,
        vec![RawResponse {
            status: 200,
            content_type: Some("application/json".into()),
            body: r#"{"content":"saved"}"#.into(),
        }],
    );

    controller.enter_edit_mode();
    let textarea: HtmlTextAreaElement =
        post.query_selector("textarea").unwrap().unwrap().dyn_into().unwrap();
    textarea.set_value("typed");

    let form: HtmlFormElement = post.query_selector("form").unwrap().unwrap().dyn_into().unwrap();
    let init = EventInit::new();
    init.set_bubbles(true);
    init.set_cancelable(true);
    let submit = Event::new_with_event_init_dict("submit", &init).unwrap();

    let not_prevented = form.dispatch_event(&submit).unwrap();
    assert!(!not_prevented);
    assert!(submit.default_prevented());

    settle().await;

    let sent = transport.sent.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, Method::Put);
    assert_eq!(sent[0].url, "/posts/11/edit");
    assert_eq!(sent[0].body.as_deref(), Some(r#"{"content":"typed"}"#));
    assert_eq!(post.query_selector("p").unwrap().unwrap().text_content().unwrap(), "saved");
    assert_eq!(controller.mode(), ViewMode::Content);
}

#[wasm_bindgen_test]
fn sibling_layout_post_is_skipped() {
    let document = document();
    let page = document.create_element("section").unwrap();
    document.body().unwrap().append_child(&page).unwrap();

    let good = document.create_element("div").unwrap();
    good.set_class_name("post");
    good.set_attribute("data-id", "20").unwrap();
    good.set_inner_html(POST_MARKUP);
    page.append_child(&good).unwrap();

    let sibling = document.create_element("div").unwrap();
    sibling.set_class_name("post");
    sibling.set_attribute("data-id", "21").unwrap();
    sibling.set_inner_html(
        r#"<div class="edit-form"><form><textarea></textarea></form></div>
           <div class="content"><p>old layout</p></div>
           <div class="likes-container"></div>"#,
    );
    page.append_child(&sibling).unwrap();

    assert!(matches!(
        DomPostView::from_post(&sibling, &ControllerConfig::default()),
        Err(DomError::MissingElement(_))
    ));

    let controllers = attach_all(
        &page,
        Rc::new(ControllerConfig::default()),
        requests_with(Rc::new(CannedTransport::default())),
    )
    .unwrap();

    assert_eq!(controllers.len(), 1);
    assert_eq!(controllers[0].id().as_str(), "20");

    page.remove();
}
