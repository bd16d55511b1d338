//! # sleeve-forms
//!
//! Regex-driven form validation. A [`Form`] binds to a container, registers
//! every descendant carrying a field-name attribute, and re-validates a
//! field each time its element reports a change. After every change the
//! caller's callback receives the aggregate validity (logical AND of all
//! fields) together with the fields themselves.
//!
//! ## Quick Start
//!
//! ```rust
//! use sleeve_forms::headless::{MemoryContainer, MemoryElement};
//! use sleeve_forms::Form;
//!
//! let email = MemoryElement::input("email");
//! let qty = MemoryElement::input("qty");
//! let container = MemoryContainer::new(vec![email.clone(), qty.clone()]);
//!
//! let form = Form::new();
//! form.set_rule_presets([("email", "email-address"), ("qty", "positive-integer")])
//!     .unwrap();
//! form.bind(Some(&container)).unwrap();
//! form.set_on_change(|is_valid, fields| {
//!     for (name, field) in fields {
//!         println!("{name}: {:?} valid={}", field.value(), field.is_valid());
//!     }
//!     println!("form valid: {is_valid}");
//! });
//!
//! email.set_value("a@b.com");
//! qty.set_value("5");
//! assert!(form.is_valid());
//! ```
//!
//! ## Architecture
//!
//! - **`rules`** - compiled [`Rule`]s and the named preset [`RuleRegistry`]
//! - **`element`** - capabilities a UI toolkit implements ([`FieldElement`],
//!   [`ChangeSource`], [`Container`]) plus value access and discovery
//! - **`field`** - the per-input [`Field`] model
//! - **`form`** - the [`Form`] controller
//! - **`config`** - [`FormConfig`], loadable from TOML
//! - **`headless`** - in-memory elements for tests and non-browser use
//!
//! The browser binding lives in the `sleeve-forms-wasm` crate.

pub mod config;
pub mod element;
pub mod error;
pub mod field;
pub mod form;
pub mod headless;
pub mod rules;

pub use config::{FormConfig, RuleSpec, GENERAL_RULE_KEY};
pub use element::{
    discover_fields, read_value, ChangeListener, ChangeSource, Container, ElementKind, ElementRef,
    FieldElement,
};
pub use error::{FormError, FormResult};
pub use field::Field;
pub use form::{BindState, Fields, Form};
pub use rules::{Rule, RuleRegistry};
