//! Validate and evaluate expressions

use std::sync::Arc;

use super::{CliError, is_template, json_to_value, value_to_json};
use crate::{EvalContext, Expression, StandardResolver};

/// Options for the eval command
#[derive(Debug, Clone, Default)]
pub struct EvalOptions {
    /// Template or bare expression
    pub expression: String,
    /// JSON object whose members become variables
    pub vars: Option<String>,
    /// Type name the result is coerced to
    pub expect: Option<String>,
    /// Coerce null and empty to zero for this evaluation
    pub coerce_to_zero: bool,
}

/// Result of a check or eval operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Expression evaluated successfully
    Success(serde_json::Value),
}

fn compile(source: &str) -> Result<Expression, CliError> {
    let expression = if is_template(source) {
        Expression::compile(source)?
    } else {
        Expression::compile_standalone(source)?
    };
    Ok(expression)
}

/// Parse only
pub fn execute_check(source: &str) -> Result<CheckResult, CliError> {
    compile(source)?;
    Ok(CheckResult::SyntaxValid)
}

/// Evaluate with [`StandardResolver`] and the given variables
pub fn execute_eval(options: &EvalOptions) -> Result<CheckResult, CliError> {
    let expression = compile(&options.expression)?;

    let mut ctx = EvalContext::new().with_resolver(Arc::new(StandardResolver));
    if options.coerce_to_zero {
        ctx = ctx.with_coerce_to_zero(true);
    }
    if let Some(vars) = &options.vars {
        let serde_json::Value::Object(members) = serde_json::from_str(vars)? else {
            return Err(CliError::VariablesNotObject);
        };
        for (name, value) in members {
            ctx.set_variable(name, json_to_value(value));
        }
    }

    let result = match &options.expect {
        Some(name) => {
            let expected = ctx
                .resolve_type(name)?
                .ok_or_else(|| CliError::UnknownType(name.clone()))?;
            expression.evaluate_as(&mut ctx, &expected)?
        }
        None => expression.evaluate(&mut ctx)?,
    };
    Ok(CheckResult::Success(value_to_json(&result)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_and_template_forms() {
        let options = EvalOptions {
            expression: "a + 1".into(),
            vars: Some(r#"{"a": 41}"#.into()),
            ..Default::default()
        };
        match execute_eval(&options).unwrap() {
            CheckResult::Success(json) => assert_eq!(json, serde_json::json!(42)),
            other => panic!("unexpected {:?}", other),
        }

        let options = EvalOptions {
            expression: "n = ${a}".into(),
            vars: Some(r#"{"a": 1}"#.into()),
            ..Default::default()
        };
        match execute_eval(&options).unwrap() {
            CheckResult::Success(json) => assert_eq!(json, serde_json::json!("n = 1")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_vars_must_be_object() {
        let options = EvalOptions {
            expression: "1".into(),
            vars: Some("[1, 2]".into()),
            ..Default::default()
        };
        assert!(matches!(execute_eval(&options), Err(CliError::VariablesNotObject)));
    }
}
