use crate::post::ViewMode;

/// The parts of one rendered post the controller reads and patches.
pub trait PostView {
    fn mode(&self) -> ViewMode;

    /// Hides the other view and shows `mode`'s view.
    fn show(&mut self, mode: ViewMode);

    fn displayed_content(&self) -> String;
    fn set_displayed_content(&mut self, content: &str);

    fn edit_text(&self) -> String;
    fn set_edit_text(&mut self, text: &str);

    fn set_likes_markup(&mut self, markup: &str);

    /// Action URL declared by the edit form, if any.
    fn edit_action(&self) -> Option<String>;

    /// Shows `message` inside the post. False when the post has nowhere to
    /// put it.
    fn notify_failure(&mut self, message: &str) -> bool;
    fn clear_failure(&mut self);

    /// Page-level fallback for a failure the post could not show itself.
    /// Called with no borrow of the view outstanding.
    fn alert(message: &str)
    where
        Self: Sized;
}
