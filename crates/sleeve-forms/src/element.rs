// File: sleeve-forms/src/element.rs
// Purpose: Capabilities a UI toolkit provides so forms can bind to its elements

use std::rc::Rc;

use crate::error::FormResult;

/// Kind discriminator for a bound element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Native input control; its value property is authoritative
    Input,
    TextArea,
    Select,
    /// Any other content-bearing element
    Other,
}

impl ElementKind {
    /// Map an HTML tag name (any case) to a kind
    pub fn from_tag_name(tag: &str) -> Self {
        match tag.to_ascii_uppercase().as_str() {
            "INPUT" => ElementKind::Input,
            "TEXTAREA" => ElementKind::TextArea,
            "SELECT" => ElementKind::Select,
            _ => ElementKind::Other,
        }
    }
}

/// Called with the element's freshly read value whenever it changes
pub type ChangeListener = Box<dyn Fn(String)>;

/// Something that can report value changes
pub trait ChangeSource {
    /// Attach a listener for the native value-change signal. Listeners stay
    /// attached for the lifetime of the source.
    fn subscribe(&self, listener: ChangeListener) -> FormResult<()>;
}

/// An input-like element a field can be bound to
pub trait FieldElement: ChangeSource {
    fn kind(&self) -> ElementKind;

    fn attribute(&self, name: &str) -> Option<String>;

    /// The value property, if the element has one
    fn value(&self) -> Option<String>;

    fn text_content(&self) -> Option<String>;
}

pub type ElementRef = Rc<dyn FieldElement>;

/// A child-bearing element fields are discovered in
pub trait Container {
    /// False when the object has no child collection at all
    fn is_traversable(&self) -> bool;

    /// Every descendant carrying `attribute`, in document order
    fn descendants_with_attribute(&self, attribute: &str) -> Vec<ElementRef>;
}

/// Current textual value of an element.
///
/// Inputs report their value property. Other elements report a non-empty
/// value property when they have one and fall back to their text content.
pub fn read_value(element: &dyn FieldElement) -> String {
    match element.kind() {
        ElementKind::Input => element.value().unwrap_or_default(),
        _ => element
            .value()
            .filter(|value| !value.is_empty())
            .or_else(|| element.text_content())
            .unwrap_or_default(),
    }
}

/// Collect `(name, element)` pairs for every descendant carrying
/// `attribute`. Elements whose attribute is empty are skipped.
pub fn discover_fields(container: &dyn Container, attribute: &str) -> Vec<(String, ElementRef)> {
    container
        .descendants_with_attribute(attribute)
        .into_iter()
        .filter_map(|element| {
            let name = element.attribute(attribute)?;
            (!name.is_empty()).then_some((name, element))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{MemoryContainer, MemoryElement};

    #[test]
    fn test_kind_from_tag_name() {
        assert_eq!(ElementKind::from_tag_name("INPUT"), ElementKind::Input);
        assert_eq!(ElementKind::from_tag_name("textarea"), ElementKind::TextArea);
        assert_eq!(ElementKind::from_tag_name("Select"), ElementKind::Select);
        assert_eq!(ElementKind::from_tag_name("div"), ElementKind::Other);
    }

    #[test]
    fn test_input_reads_value_only() {
        let input = MemoryElement::input("email").with_text("ignored");
        assert_eq!(read_value(&input), "");

        input.set_value("a@b.com");
        assert_eq!(read_value(&input), "a@b.com");
    }

    #[test]
    fn test_other_elements_fall_back_to_text() {
        let span = MemoryElement::new(ElementKind::Other).with_text("hello");
        assert_eq!(read_value(&span), "hello");

        let with_value = MemoryElement::new(ElementKind::Other)
            .with_value("from value")
            .with_text("from text");
        assert_eq!(read_value(&with_value), "from value");

        let empty_value = MemoryElement::new(ElementKind::Other)
            .with_value("")
            .with_text("from text");
        assert_eq!(read_value(&empty_value), "from text");

        assert_eq!(read_value(&MemoryElement::new(ElementKind::Other)), "");
    }

    #[test]
    fn test_discover_skips_empty_names() {
        let container = MemoryContainer::new(vec![
            MemoryElement::input("email"),
            MemoryElement::input(""),
            MemoryElement::new(ElementKind::Other),
            MemoryElement::new(ElementKind::Select).with_attribute("name", "country"),
        ]);

        let names: Vec<String> = discover_fields(&container, "name")
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["email".to_string(), "country".to_string()]);
    }
}
