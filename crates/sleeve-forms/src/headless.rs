//! In-memory elements
//!
//! [`MemoryElement`] and [`MemoryContainer`] implement the element
//! capabilities without any UI toolkit behind them. They back the test
//! suite and let non-browser callers drive a [`Form`](crate::Form) by
//! setting values directly.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::element::{
    read_value, ChangeListener, ChangeSource, Container, ElementKind, ElementRef, FieldElement,
};
use crate::error::FormResult;

struct ElementState {
    kind: ElementKind,
    attributes: RefCell<BTreeMap<String, String>>,
    value: RefCell<Option<String>>,
    text: RefCell<Option<String>>,
    listeners: RefCell<Vec<Rc<dyn Fn(String)>>>,
}

/// Shared handle to an in-memory element; clones refer to the same element
#[derive(Clone)]
pub struct MemoryElement {
    state: Rc<ElementState>,
}

impl MemoryElement {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            state: Rc::new(ElementState {
                kind,
                attributes: RefCell::new(BTreeMap::new()),
                value: RefCell::new(None),
                text: RefCell::new(None),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    /// An empty input carrying `name="{name}"`
    pub fn input(name: &str) -> Self {
        Self::new(ElementKind::Input)
            .with_attribute("name", name)
            .with_value("")
    }

    pub fn with_attribute(self, name: &str, value: &str) -> Self {
        self.state
            .attributes
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_value(self, value: &str) -> Self {
        *self.state.value.borrow_mut() = Some(value.to_string());
        self
    }

    pub fn with_text(self, text: &str) -> Self {
        *self.state.text.borrow_mut() = Some(text.to_string());
        self
    }

    /// Set the value property and fire the change signal
    pub fn set_value(&self, value: &str) {
        *self.state.value.borrow_mut() = Some(value.to_string());
        self.fire_change();
    }

    /// Set the text content and fire the change signal
    pub fn set_text(&self, text: &str) {
        *self.state.text.borrow_mut() = Some(text.to_string());
        self.fire_change();
    }

    /// Notify every listener with the current value
    pub fn fire_change(&self) {
        let value = read_value(self);
        // Listeners may subscribe again while being notified
        let listeners = self.state.listeners.borrow().clone();
        for listener in listeners {
            listener(value.clone());
        }
    }

    pub fn listener_count(&self) -> usize {
        self.state.listeners.borrow().len()
    }
}

impl ChangeSource for MemoryElement {
    fn subscribe(&self, listener: ChangeListener) -> FormResult<()> {
        self.state.listeners.borrow_mut().push(Rc::from(listener));
        Ok(())
    }
}

impl FieldElement for MemoryElement {
    fn kind(&self) -> ElementKind {
        self.state.kind
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.state.attributes.borrow().get(name).cloned()
    }

    fn value(&self) -> Option<String> {
        self.state.value.borrow().clone()
    }

    fn text_content(&self) -> Option<String> {
        self.state.text.borrow().clone()
    }
}

impl From<MemoryElement> for ElementRef {
    fn from(element: MemoryElement) -> Self {
        Rc::new(element)
    }
}

/// In-memory container; `None` children model an object with no child
/// collection
#[derive(Clone)]
pub struct MemoryContainer {
    children: Option<Vec<MemoryElement>>,
}

impl MemoryContainer {
    pub fn new(children: Vec<MemoryElement>) -> Self {
        Self {
            children: Some(children),
        }
    }

    /// A container without traversable children
    pub fn opaque() -> Self {
        Self { children: None }
    }

    pub fn push(&mut self, child: MemoryElement) {
        self.children.get_or_insert_with(Vec::new).push(child);
    }
}

impl Container for MemoryContainer {
    fn is_traversable(&self) -> bool {
        self.children.is_some()
    }

    fn descendants_with_attribute(&self, attribute: &str) -> Vec<ElementRef> {
        self.children
            .iter()
            .flatten()
            .filter(|child| child.attribute(attribute).is_some())
            .map(|child| ElementRef::from(child.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_set_value_notifies_listeners() {
        let element = MemoryElement::input("qty");
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&seen);
        element
            .subscribe(Box::new(move |value| sink.borrow_mut().push(value)))
            .unwrap();

        element.set_value("1");
        element.set_value("12");
        assert_eq!(*seen.borrow(), vec!["1".to_string(), "12".to_string()]);
        assert_eq!(element.listener_count(), 1);
    }

    #[test]
    fn test_clones_share_state() {
        let element = MemoryElement::input("qty");
        let calls = Rc::new(Cell::new(0));

        let counter = Rc::clone(&calls);
        element
            .clone()
            .subscribe(Box::new(move |_| counter.set(counter.get() + 1)))
            .unwrap();

        element.set_value("5");
        assert_eq!(calls.get(), 1);
        assert_eq!(element.value().as_deref(), Some("5"));
    }

    #[test]
    fn test_opaque_container_is_not_traversable() {
        assert!(!MemoryContainer::opaque().is_traversable());
        assert!(MemoryContainer::new(Vec::new()).is_traversable());

        let mut container = MemoryContainer::opaque();
        container.push(MemoryElement::input("email"));
        assert!(container.is_traversable());
        assert_eq!(container.descendants_with_attribute("name").len(), 1);
    }
}
