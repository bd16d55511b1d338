// File: sleeve-forms/src/field.rs
// Purpose: One named, validated input tracked by a form

use std::fmt;
use std::rc::Rc;

use crate::element::{read_value, ElementKind, ElementRef};
use crate::rules::Rule;

/// A bound element together with its current value and validity
#[derive(Clone)]
pub struct Field {
    name: String,
    element: ElementRef,
    value: String,
    rule: Rule,
    is_valid: bool,
    /// Identifies the registration whose listener may update this field
    pub(crate) binding: u64,
}

impl Field {
    /// Read the element's current value and validate it against `rule`
    pub fn create(name: impl Into<String>, element: ElementRef, rule: Rule) -> Self {
        let value = read_value(element.as_ref());
        let is_valid = rule.test(&value);
        Self {
            name: name.into(),
            element,
            value,
            rule,
            is_valid,
            binding: 0,
        }
    }

    pub(crate) fn with_binding(mut self, binding: u64) -> Self {
        self.binding = binding;
        self
    }

    /// Store a new value and recompute validity. Returns the new validity.
    pub fn revalidate(&mut self, new_value: impl Into<String>) -> bool {
        self.value = new_value.into();
        self.is_valid = self.rule.test(&self.value);
        self.is_valid
    }

    /// Swap the live rule. Validity is left as is until the next revalidation.
    pub fn set_rule(&mut self, rule: Rule) {
        self.rule = rule;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn element(&self) -> &ElementRef {
        &self.element
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn rule_pattern(&self) -> &str {
        self.rule.pattern()
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn kind(&self) -> ElementKind {
        self.element.kind()
    }

    /// True if this field is bound to exactly `element`
    pub fn is_bound_to(&self, element: &ElementRef) -> bool {
        Rc::ptr_eq(&self.element, element)
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.element.kind())
            .field("value", &self.value)
            .field("rule", &self.rule.pattern())
            .field("is_valid", &self.is_valid)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::MemoryElement;
    use crate::rules::{Rule, POSITIVE_INTEGER};

    #[test]
    fn test_create_reads_current_value() {
        let element = MemoryElement::input("qty").with_value("12a");
        let field = Field::create("qty", element.into(), Rule::new(POSITIVE_INTEGER).unwrap());

        assert_eq!(field.name(), "qty");
        assert_eq!(field.value(), "12a");
        assert!(!field.is_valid());
        assert_eq!(field.kind(), ElementKind::Input);
    }

    #[test]
    fn test_revalidate_tracks_rule() {
        let element = MemoryElement::input("qty");
        let mut field = Field::create("qty", element.into(), Rule::new(POSITIVE_INTEGER).unwrap());

        assert!(field.revalidate("5"));
        assert_eq!(field.value(), "5");
        assert!(!field.revalidate("-5"));
        assert!(!field.is_valid());
    }

    #[test]
    fn test_set_rule_defers_validation() {
        let element = MemoryElement::input("code").with_value("abc");
        let mut field = Field::create("code", element.into(), Rule::fallback());
        assert!(field.is_valid());

        field.set_rule(Rule::new(POSITIVE_INTEGER).unwrap());
        assert!(field.is_valid());
        assert_eq!(field.rule_pattern(), POSITIVE_INTEGER);

        field.revalidate("abc");
        assert!(!field.is_valid());
    }

    #[test]
    fn test_is_bound_to() {
        let element: ElementRef = MemoryElement::input("a").into();
        let other: ElementRef = MemoryElement::input("a").into();
        let field = Field::create("a", Rc::clone(&element), Rule::fallback());

        assert!(field.is_bound_to(&element));
        assert!(!field.is_bound_to(&other));
    }
}
