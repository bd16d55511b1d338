// File: sleeve-forms/src/form.rs
// Purpose: Form controller - registers fields, listens for changes, aggregates validity

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::config::{FormConfig, GENERAL_RULE_KEY};
use crate::element::{discover_fields, Container, ElementRef};
use crate::error::{FormError, FormResult};
use crate::field::Field;
use crate::rules::{Rule, RuleRegistry};

/// Registered fields keyed by name
pub type Fields = BTreeMap<String, Field>;

type OnChange = Rc<dyn Fn(bool, &Fields)>;

/// Whether a form has completed a `bind` or `set_fields`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindState {
    Unbound,
    Bound,
}

struct FormInner {
    field_attribute: String,
    registry: RuleRegistry,
    /// Per-field rules plus the general rule under `GENERAL_RULE_KEY`
    rules: BTreeMap<String, Rule>,
    fields: Fields,
    on_change: OnChange,
    /// Set by the first successful `bind` or `set_fields`
    bound: bool,
    next_binding: u64,
}

impl FormInner {
    fn rule_for(&self, name: &str) -> Rule {
        self.rules
            .get(name)
            .or_else(|| self.rules.get(GENERAL_RULE_KEY))
            .cloned()
            .unwrap_or_else(Rule::fallback)
    }

    fn is_valid(&self) -> bool {
        self.fields.values().all(Field::is_valid)
    }
}

/// Form controller
///
/// A cheap handle: clones share the same fields, rules and callback.
/// Everything runs on the caller's thread; each change event is handled to
/// completion (value read, revalidation, aggregate, callback) before the
/// next one.
///
/// ```
/// use sleeve_forms::headless::{MemoryContainer, MemoryElement};
/// use sleeve_forms::Form;
///
/// let qty = MemoryElement::input("qty");
/// let form = Form::new();
/// form.set_rules([("qty", r"^\d+$")]).unwrap();
/// form.bind(Some(&MemoryContainer::new(vec![qty.clone()]))).unwrap();
///
/// form.set_on_change(|is_valid, fields| {
///     println!("valid: {is_valid}, qty: {:?}", fields["qty"].value());
/// });
/// qty.set_value("5");
/// assert!(form.is_valid());
/// ```
#[derive(Clone)]
pub struct Form {
    inner: Rc<RefCell<FormInner>>,
}

impl Form {
    /// A form with the built-in presets and the default `name` attribute
    pub fn new() -> Self {
        Self::from_parts("name".to_string(), RuleRegistry::builtin(), BTreeMap::new())
    }

    /// A form whose registry, discovery attribute and initial rules come
    /// from `config`. Every rule is compiled here.
    pub fn with_config(config: FormConfig) -> FormResult<Self> {
        if config.field_attribute.trim().is_empty() {
            return Err(FormError::Configuration(
                "field attribute must not be empty".to_string(),
            ));
        }

        let registry = config.registry()?;
        let rules = config.compile_rules(&registry)?;
        Ok(Self::from_parts(config.field_attribute, registry, rules))
    }

    fn from_parts(
        field_attribute: String,
        registry: RuleRegistry,
        rules: BTreeMap<String, Rule>,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(FormInner {
                field_attribute,
                registry,
                rules,
                fields: BTreeMap::new(),
                on_change: Rc::new(|_, _| {}),
                bound: false,
                next_binding: 0,
            })),
        }
    }

    /// Discover and register every descendant of `container` carrying the
    /// field attribute, replacing the current field set.
    ///
    /// Elements sharing a name (radio groups, for example) all feed the same
    /// field, which keeps the last of them as its element. The field set is
    /// only replaced once every element accepted its change listener; on
    /// error the previous fields stay in place.
    ///
    /// Listeners are never detached from elements. Rebinding the same
    /// elements adds a fresh listener to each while the earlier ones stay
    /// attached and are ignored, so repeated rebinds grow the listener lists.
    pub fn bind(&self, container: Option<&dyn Container>) -> FormResult<()> {
        let Some(container) = container else {
            return Err(FormError::Configuration(
                "the form element must be a valid element".to_string(),
            ));
        };

        if !container.is_traversable() {
            warn!("Refusing to bind a container without children");
            return Err(FormError::Configuration(
                "the form element must have traversable children".to_string(),
            ));
        }

        let attribute = self.inner.borrow().field_attribute.clone();
        let discovered = discover_fields(container, &attribute);
        debug!(
            "Binding form: {} field(s) carry [{}]",
            discovered.len(),
            attribute
        );

        let binding = self.next_binding();
        let mut fields = Fields::new();
        for (name, element) in discovered {
            let field = self.register(name, element, binding)?;
            fields.insert(field.name().to_string(), field);
        }

        let mut inner = self.inner.borrow_mut();
        inner.fields = fields;
        inner.bound = true;
        Ok(())
    }

    /// Store rules by field name. Registered fields switch to their new rule
    /// right away but keep their validity until their next change. The key
    /// `"general"` sets the rule for fields without one of their own.
    ///
    /// Either every pattern compiles and all rules are applied, or nothing is.
    pub fn set_rules<I, K, P>(&self, rules: I) -> FormResult<()>
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: AsRef<str>,
    {
        let compiled = rules
            .into_iter()
            .map(|(name, pattern)| -> FormResult<(String, Rule)> {
                Ok((name.into(), Rule::new(pattern.as_ref())?))
            })
            .collect::<FormResult<Vec<(String, Rule)>>>()?;

        self.apply_rules(compiled);
        Ok(())
    }

    /// Like [`set_rules`](Self::set_rules), with rules named by preset
    pub fn set_rule_presets<I, K, N>(&self, presets: I) -> FormResult<()>
    where
        I: IntoIterator<Item = (K, N)>,
        K: Into<String>,
        N: AsRef<str>,
    {
        let compiled = {
            let inner = self.inner.borrow();
            presets
                .into_iter()
                .map(|(name, preset)| -> FormResult<(String, Rule)> {
                    Ok((name.into(), inner.registry.rule(preset.as_ref())?))
                })
                .collect::<FormResult<Vec<(String, Rule)>>>()?
        };

        self.apply_rules(compiled);
        Ok(())
    }

    fn apply_rules(&self, rules: Vec<(String, Rule)>) {
        let mut inner = self.inner.borrow_mut();
        for (name, rule) in rules {
            if let Some(field) = inner.fields.get_mut(&name) {
                debug!("Updating live rule of field {}: {}", name, rule);
                field.set_rule(rule.clone());
            }
            inner.rules.insert(name, rule);
        }
    }

    /// Register elements under explicit names, bypassing discovery. Existing
    /// fields with other names are kept. Nothing is registered unless every
    /// element accepts its change listener.
    pub fn set_fields<I, K, E>(&self, fields: I) -> FormResult<()>
    where
        I: IntoIterator<Item = (K, E)>,
        K: Into<String>,
        E: Into<ElementRef>,
    {
        let binding = self.next_binding();
        let registered = fields
            .into_iter()
            .map(|(name, element)| self.register(name.into(), element.into(), binding))
            .collect::<FormResult<Vec<Field>>>()?;

        let mut inner = self.inner.borrow_mut();
        for field in registered {
            inner.fields.insert(field.name().to_string(), field);
        }
        inner.bound = true;
        Ok(())
    }

    /// Assign the callback invoked after every change with the aggregate
    /// validity and all fields
    pub fn set_on_change<F>(&self, on_change: F)
    where
        F: Fn(bool, &Fields) + 'static,
    {
        self.inner.borrow_mut().on_change = Rc::new(on_change);
    }

    /// Revert to the no-op callback
    pub fn clear_on_change(&self) {
        self.inner.borrow_mut().on_change = Rc::new(|_, _| {});
    }

    /// Apply a new value to a field as if its element had changed, then
    /// notify the callback. Returns the aggregate validity.
    pub fn handle_change(&self, name: &str, value: impl Into<String>) -> FormResult<bool> {
        let binding = self
            .inner
            .borrow()
            .fields
            .get(name)
            .map(|field| field.binding)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;

        Ok(self.dispatch(name, binding, value.into()).unwrap_or(false))
    }

    /// Logical AND of every field's validity (true when no fields are bound)
    pub fn is_valid(&self) -> bool {
        self.inner.borrow().is_valid()
    }

    pub fn fields(&self) -> Fields {
        self.inner.borrow().fields.clone()
    }

    pub fn field(&self, name: &str) -> Option<Field> {
        self.inner.borrow().fields.get(name).cloned()
    }

    pub fn field_names(&self) -> Vec<String> {
        self.inner.borrow().fields.keys().cloned().collect()
    }

    /// The rule a field registered under `name` right now would get
    pub fn rule_for(&self, name: &str) -> Rule {
        self.inner.borrow().rule_for(name)
    }

    pub fn registry(&self) -> RuleRegistry {
        self.inner.borrow().registry.clone()
    }

    pub fn field_attribute(&self) -> String {
        self.inner.borrow().field_attribute.clone()
    }

    pub fn state(&self) -> BindState {
        if self.inner.borrow().bound {
            BindState::Bound
        } else {
            BindState::Unbound
        }
    }

    fn next_binding(&self) -> u64 {
        let mut inner = self.inner.borrow_mut();
        inner.next_binding += 1;
        inner.next_binding
    }

    /// Build the field for `element` and attach its change listener. The
    /// caller stores the field; until then its listener is ignored.
    fn register(&self, name: String, element: ElementRef, binding: u64) -> FormResult<Field> {
        let rule = self.inner.borrow().rule_for(&name);
        let field = Field::create(name.clone(), Rc::clone(&element), rule).with_binding(binding);

        let form: Weak<RefCell<FormInner>> = Rc::downgrade(&self.inner);
        let field_name = name.clone();
        element
            .subscribe(Box::new(move |value| {
                if let Some(inner) = form.upgrade() {
                    Form { inner }.dispatch(&field_name, binding, value);
                }
            }))
            .map_err(|err| match err {
                FormError::Subscription { .. } => err,
                other => FormError::Subscription {
                    field: name.clone(),
                    reason: other.to_string(),
                },
            })?;

        debug!(
            "Registered field {} ({:?}) with rule {}, valid: {}",
            name,
            field.kind(),
            field.rule_pattern(),
            field.is_valid()
        );
        Ok(field)
    }

    /// Handle one change for the registration `binding` of field `name`,
    /// using the value read from whichever element fired. Returns the
    /// aggregate validity, or `None` if the registration has since been
    /// replaced.
    fn dispatch(&self, name: &str, binding: u64, value: String) -> Option<bool> {
        let (is_valid, fields, on_change) = {
            let Ok(mut inner) = self.inner.try_borrow_mut() else {
                warn!("Dropping change of field {} raised while the form was busy", name);
                return None;
            };

            let Some(field) = inner.fields.get_mut(name) else {
                trace!("Ignoring change of unregistered field {}", name);
                return None;
            };
            if field.binding != binding {
                trace!("Ignoring change from replaced element of field {}", name);
                return None;
            }

            let field_valid = field.revalidate(value);
            let is_valid = inner.is_valid();
            trace!(
                "Field {} changed, valid: {}, form valid: {}",
                name,
                field_valid,
                is_valid
            );
            (is_valid, inner.fields.clone(), Rc::clone(&inner.on_change))
        };

        // No borrow is held here, so the callback may use the form freely
        on_change(is_valid, &fields);
        Some(is_valid)
    }
}

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Form")
            .field("field_attribute", &inner.field_attribute)
            .field("rules", &inner.rules)
            .field("fields", &inner.fields)
            .finish()
    }
}
