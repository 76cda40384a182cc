use std::sync::Arc;

use tracing::trace;

use crate::context::BoundContext;
use crate::error::{EvalError, Result};
use crate::evaluator::Evaluator;
use crate::types::InterfaceType;
use crate::value::{LambdaValue, Value};

/// A lambda standing in for a single-abstract-method interface.
///
/// The adapter answers exactly one method, the interface's abstract one, by
/// invoking the lambda with the received arguments in the context the
/// adapter was created in.
///
/// # Examples
///
/// ```
/// use elexpr::{coerce_to_type, EvalContext, Expression, InterfaceType, Value, ValueType};
///
/// let mut ctx = EvalContext::new();
/// let lambda = Expression::compile("${x -> x * 2}").unwrap().evaluate(&mut ctx).unwrap();
///
/// let doubler = ValueType::Interface(InterfaceType::functional("Doubler", "apply", 1));
/// let Value::Adapter(adapter) = coerce_to_type(&ctx, &lambda, &doubler).unwrap() else {
///     panic!("expected an adapter");
/// };
/// assert_eq!(adapter.invoke("apply", &[Value::Long(21)]).unwrap(), Value::Long(42));
/// ```
#[derive(Debug)]
pub struct LambdaAdapter {
    lambda: Arc<LambdaValue>,
    interface: Arc<InterfaceType>,
    bound: BoundContext,
}

impl LambdaAdapter {
    pub fn new(lambda: Arc<LambdaValue>, interface: Arc<InterfaceType>, bound: BoundContext) -> Self {
        LambdaAdapter {
            lambda,
            interface,
            bound,
        }
    }

    pub fn interface(&self) -> &Arc<InterfaceType> {
        &self.interface
    }

    /// Name of the method this adapter implements
    pub fn method_name(&self) -> Option<&str> {
        self.interface
            .single_abstract_method()
            .map(|method| method.name.as_str())
    }

    /// Invoke the adapted method by name
    pub fn invoke(&self, method: &str, args: &[Value]) -> Result<Value> {
        if self.method_name() != Some(method) {
            return Err(EvalError::MethodNotFound {
                base: self.interface.name().to_string(),
                method: method.to_string(),
            });
        }
        self.call(args)
    }

    /// Invoke the lambda directly
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        trace!(interface = self.interface.name(), args = args.len(), "adapter call");
        let mut ctx = self.bound.to_context();
        Evaluator::new(&mut ctx).invoke_lambda(&self.lambda, args)
    }
}
