use crate::config::ControllerConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostAction {
    Like,
    Unlike,
    Edit,
    CancelEdit,
}

/// Anything a click can land on: it has classes and maybe a parent.
pub trait ControlElement: Sized {
    fn has_class(&self, class: &str) -> bool;
    fn parent(&self) -> Option<Self>;
}

/// Class name to action lookup used for click delegation on a post.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionTable {
    entries: Vec<(String, PostAction)>,
}

impl ActionTable {
    pub fn new(entries: Vec<(String, PostAction)>) -> Self {
        ActionTable { entries }
    }

    pub fn from_config(config: &ControllerConfig) -> Self {
        ActionTable::new(vec![
            (config.like_class.clone(), PostAction::Like),
            (config.unlike_class.clone(), PostAction::Unlike),
            (config.edit_class.clone(), PostAction::Edit),
            (config.cancel_edit_class.clone(), PostAction::CancelEdit),
        ])
    }

    fn lookup<E: ControlElement>(&self, element: &E) -> Option<PostAction> {
        self.entries
            .iter()
            .find(|(class, _)| element.has_class(class))
            .map(|(_, action)| *action)
    }

    /// The target itself wins over its parent, so a control nested in
    /// another control resolves to the innermost one. The parent check lets
    /// a click on an icon inside a button count as a click on the button.
    pub fn classify<E: ControlElement>(&self, target: &E) -> Option<PostAction> {
        self.lookup(target)
            .or_else(|| target.parent().and_then(|parent| self.lookup(&parent)))
    }
}
