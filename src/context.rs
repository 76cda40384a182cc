use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config;
use crate::error::Result;
use crate::resolver::Resolver;
use crate::types::{InterfaceType, ValueType};
use crate::value::{EnumType, Value};

/// Text-to-value converter registered for a target type
pub type Editor = Arc<dyn Fn(&str) -> Result<Value> + Send + Sync>;

/// Per-evaluation state.
///
/// Holds the variables identifiers resolve to, the lambda argument scopes,
/// the "property resolved" flag, and the resolver hook. A context is mutated
/// only by the evaluation using it and must not be shared between concurrent
/// evaluations; a parsed expression can be.
///
/// # Examples
///
/// ```
/// use elexpr::{EvalContext, Value};
///
/// let mut ctx = EvalContext::new().with_variable("answer", Value::Long(42));
/// assert_eq!(ctx.variable("answer"), Some(&Value::Long(42)));
/// ctx.set_variable("answer", Value::Long(43));
/// assert_eq!(ctx.variable("answer"), Some(&Value::Long(43)));
/// ```
#[derive(Default, Clone)]
pub struct EvalContext {
    variables: HashMap<String, Value>,
    lambda_scopes: Vec<HashMap<String, Value>>,
    property_resolved: Cell<bool>,
    resolver: Option<Arc<dyn Resolver>>,
    coerce_to_zero: Option<bool>,
    editors: HashMap<String, Editor>,
    enums: HashMap<String, Arc<EnumType>>,
    interfaces: HashMap<String, Arc<InterfaceType>>,
}

impl fmt::Debug for EvalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalContext")
            .field("variables", &self.variables)
            .field("lambda_scopes", &self.lambda_scopes)
            .field("property_resolved", &self.property_resolved.get())
            .field("has_resolver", &self.resolver.is_some())
            .field("coerce_to_zero", &self.coerce_to_zero)
            .finish()
    }
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Pin the coerce-to-zero mode for this context, ignoring the
    /// process-wide setting
    pub fn with_coerce_to_zero(mut self, enabled: bool) -> Self {
        self.coerce_to_zero = Some(enabled);
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set_variable(name, value);
        self
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub(crate) fn variable_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.variables.get_mut(name)
    }

    pub fn variables(&self) -> &HashMap<String, Value> {
        &self.variables
    }

    pub fn resolver(&self) -> Option<&Arc<dyn Resolver>> {
        self.resolver.as_ref()
    }

    pub fn coerce_to_zero(&self) -> bool {
        self.coerce_to_zero.unwrap_or_else(config::coerce_to_zero)
    }

    /// Make an enumeration visible to `instanceof` and type names
    pub fn register_enum(&mut self, ty: Arc<EnumType>) {
        self.enums.insert(ty.name().to_string(), ty);
    }

    pub fn register_interface(&mut self, iface: Arc<InterfaceType>) {
        self.interfaces.insert(iface.name().to_string(), iface);
    }

    /// Register a text converter used when a string must become `target`
    /// and no built-in rule applies.
    pub fn register_editor<F>(&mut self, target: &ValueType, editor: F)
    where
        F: Fn(&str) -> Result<Value> + Send + Sync + 'static,
    {
        self.editors.insert(target.to_string(), Arc::new(editor));
    }

    pub fn editor(&self, target: &ValueType) -> Option<&Editor> {
        self.editors.get(&target.to_string())
    }

    /// Resolve a type name: built-in names, registered enumerations and
    /// interfaces, then the resolver.
    pub fn resolve_type(&self, name: &str) -> Result<Option<ValueType>> {
        if let Some(ty) = ValueType::from_name(name) {
            return Ok(Some(ty));
        }
        if let Some(ty) = self.enums.get(name) {
            return Ok(Some(ValueType::Enum(Arc::clone(ty))));
        }
        if let Some(iface) = self.interfaces.get(name) {
            return Ok(Some(ValueType::Interface(Arc::clone(iface))));
        }
        match &self.resolver {
            Some(resolver) => resolver.resolve_type(self, name),
            None => Ok(None),
        }
    }

    // Resolution flag

    pub fn is_property_resolved(&self) -> bool {
        self.property_resolved.get()
    }

    pub fn set_property_resolved(&self, resolved: bool) {
        self.property_resolved.set(resolved);
    }

    /// Offer a conversion to the resolver.
    ///
    /// The flag is cleared for the duration of the offer and restored on
    /// every exit path. A resolver claims the conversion by returning `Some`
    /// or by setting the flag.
    pub fn offer_conversion(&self, value: &Value, target: &ValueType) -> Result<Option<Value>> {
        let Some(resolver) = &self.resolver else {
            return Ok(None);
        };
        let _guard = ResolutionGuard::enter(self);
        let converted = resolver.convert_to_type(self, value, target)?;
        let claimed = match converted {
            Some(value) => Some(value),
            None if self.property_resolved.get() => Some(Value::Null),
            None => None,
        };
        if claimed.is_some() {
            debug!(target_type = %target, source = %value.kind_name(), "resolver claimed conversion");
        }
        Ok(claimed)
    }

    /// Run a resolver lookup that claims by returning `Some`; the flag is
    /// left reflecting the outcome.
    pub(crate) fn claim<T>(
        &self,
        lookup: impl FnOnce(&dyn Resolver) -> Result<Option<T>>,
    ) -> Result<Option<T>> {
        self.property_resolved.set(false);
        let Some(resolver) = &self.resolver else {
            return Ok(None);
        };
        let found = lookup(resolver.as_ref())?;
        if found.is_some() {
            self.property_resolved.set(true);
        }
        Ok(found)
    }

    // Lambda scopes

    pub(crate) fn push_lambda_scope(&mut self, scope: HashMap<String, Value>) {
        self.lambda_scopes.push(scope);
    }

    pub(crate) fn pop_lambda_scope(&mut self) {
        self.lambda_scopes.pop();
    }

    /// Innermost binding of a lambda argument
    pub fn lambda_argument(&self, name: &str) -> Option<&Value> {
        self.lambda_scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// All visible lambda arguments, inner scopes shadowing outer ones
    pub(crate) fn visible_arguments(&self) -> HashMap<String, Value> {
        let mut visible = HashMap::new();
        for scope in &self.lambda_scopes {
            visible.extend(scope.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        visible
    }

    /// Detach the shareable parts of the context, for values that outlive
    /// this evaluation
    pub fn snapshot(&self) -> BoundContext {
        BoundContext {
            variables: self.variables.clone(),
            arguments: self.visible_arguments(),
            resolver: self.resolver.clone(),
            coerce_to_zero: self.coerce_to_zero,
            editors: self.editors.clone(),
            enums: self.enums.clone(),
            interfaces: self.interfaces.clone(),
        }
    }
}

/// A thread-safe copy of an [`EvalContext`], used by lambda adapters to
/// evaluate in the context they were created in.
#[derive(Clone)]
pub struct BoundContext {
    variables: HashMap<String, Value>,
    arguments: HashMap<String, Value>,
    resolver: Option<Arc<dyn Resolver>>,
    coerce_to_zero: Option<bool>,
    editors: HashMap<String, Editor>,
    enums: HashMap<String, Arc<EnumType>>,
    interfaces: HashMap<String, Arc<InterfaceType>>,
}

impl fmt::Debug for BoundContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundContext")
            .field("variables", &self.variables)
            .field("arguments", &self.arguments)
            .finish()
    }
}

impl BoundContext {
    pub fn to_context(&self) -> EvalContext {
        let mut lambda_scopes = vec![];
        if !self.arguments.is_empty() {
            lambda_scopes.push(self.arguments.clone());
        }
        EvalContext {
            variables: self.variables.clone(),
            lambda_scopes,
            property_resolved: Cell::new(false),
            resolver: self.resolver.clone(),
            coerce_to_zero: self.coerce_to_zero,
            editors: self.editors.clone(),
            enums: self.enums.clone(),
            interfaces: self.interfaces.clone(),
        }
    }
}

/// Clears the resolved flag and puts the previous state back when dropped.
struct ResolutionGuard<'a> {
    ctx: &'a EvalContext,
    saved: bool,
}

impl<'a> ResolutionGuard<'a> {
    fn enter(ctx: &'a EvalContext) -> Self {
        let saved = ctx.property_resolved.replace(false);
        ResolutionGuard { ctx, saved }
    }
}

impl Drop for ResolutionGuard<'_> {
    fn drop(&mut self) {
        self.ctx.property_resolved.set(self.saved);
    }
}

#[test]
fn test_flag_restored_after_offer() {
    use crate::error::EvalError;

    struct Failing;
    impl Resolver for Failing {
        fn convert_to_type(&self, ctx: &EvalContext, _: &Value, _: &ValueType) -> Result<Option<Value>> {
            ctx.set_property_resolved(true);
            Err(EvalError::Host("boom".into()))
        }
    }

    let ctx = EvalContext::new().with_resolver(Arc::new(Failing));
    ctx.set_property_resolved(true);
    assert!(ctx.offer_conversion(&Value::Long(1), &ValueType::String).is_err());
    assert!(ctx.is_property_resolved());

    ctx.set_property_resolved(false);
    assert!(ctx.offer_conversion(&Value::Long(1), &ValueType::String).is_err());
    assert!(!ctx.is_property_resolved());
}
