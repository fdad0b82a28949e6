use std::cell::RefCell;
use std::rc::Rc;

/// Source of the program text.
///
/// The session re-reads `value()` on every render, so implementations should
/// return the latest text rather than a snapshot.
pub trait Editor {
    fn value(&self) -> String;

    /// Replaces the whole text (preset selection).
    fn set_value(&mut self, text: &str);
}

impl<E: Editor + ?Sized> Editor for Box<E> {
    fn value(&self) -> String {
        (**self).value()
    }

    fn set_value(&mut self, text: &str) {
        (**self).set_value(text);
    }
}

/// Shared handle, for hosts that keep editing while a session owns the editor.
impl<E: Editor> Editor for Rc<RefCell<E>> {
    fn value(&self) -> String {
        self.borrow().value()
    }

    fn set_value(&mut self, text: &str) {
        self.borrow_mut().set_value(text);
    }
}

/// In-memory editor.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct EditorBuffer {
    text: String,
}

impl EditorBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl Editor for EditorBuffer {
    fn value(&self) -> String {
        self.text.clone()
    }

    fn set_value(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
    }
}
