//! Built-in expression functions.
//!
//! Arguments arrive already evaluated. Each function casts them to the types
//! it expects; `null` is a valid value of every type.

use serde_json::Value;

use crate::expr::{
    ExprContext, ExprError,
    value::{cast_boolean, cast_number, cast_string, pick_simple_value},
};

const FUNCTIONS: &[&str] = &[
    "equals",
    "notEquals",
    "not",
    "greaterThan",
    "greaterThanEq",
    "lessThan",
    "lessThanEq",
    "concat",
    "and",
    "or",
    "if",
    "instanceContext",
    "frontendSettings",
    "component",
    "dataModel",
    "contains",
    "notContains",
    "startsWith",
    "endsWith",
    "stringLength",
    "commaContains",
    "lowerCase",
    "upperCase",
    "round",
];

pub(super) fn is_known(name: &str) -> bool {
    FUNCTIONS.contains(&name)
}

pub(super) fn call(name: &str, args: &[Value], ctx: &ExprContext<'_>) -> Result<Value, ExprError> {
    match name {
        "equals" => {
            let [a, b] = exactly::<2>(name, args)?;
            Ok(Value::Bool(cast_string(a)? == cast_string(b)?))
        }
        "notEquals" => {
            let [a, b] = exactly::<2>(name, args)?;
            Ok(Value::Bool(cast_string(a)? != cast_string(b)?))
        }
        "not" => {
            let [a] = exactly::<1>(name, args)?;
            Ok(Value::Bool(!cast_boolean(a)?.unwrap_or(false)))
        }
        "greaterThan" => compare(name, args, |a, b| a > b),
        "greaterThanEq" => compare(name, args, |a, b| a >= b),
        "lessThan" => compare(name, args, |a, b| a < b),
        "lessThanEq" => compare(name, args, |a, b| a <= b),
        "concat" => {
            let mut out = String::new();
            for arg in args {
                out.push_str(&cast_string(arg)?.unwrap_or_default());
            }
            Ok(Value::String(out))
        }
        "and" | "or" => {
            if args.is_empty() {
                return Err(argument_count(name, "at least 1", 0));
            }
            let values = args
                .iter()
                .map(|arg| cast_boolean(arg).map(|b| b.unwrap_or(false)))
                .collect::<Result<Vec<_>, _>>()?;
            let result = if name == "and" {
                values.into_iter().all(|b| b)
            } else {
                values.into_iter().any(|b| b)
            };
            Ok(Value::Bool(result))
        }
        "if" => if_else(args),
        "instanceContext" => {
            let [key] = exactly::<1>(name, args)?;
            let key = cast_string(key)?.unwrap_or_default();
            let context = ctx.data_sources().instance_context.clone().unwrap_or_default();
            match context.get(&key) {
                Some(value) => Ok(value.map_or(Value::Null, |v| Value::String(v.to_string()))),
                None => Err(ExprError::UnknownInstanceContext(key)),
            }
        }
        "frontendSettings" => {
            let [key] = exactly::<1>(name, args)?;
            let key = cast_string(key)?
                .ok_or_else(|| ExprError::argument(name, "key cannot be null"))?;
            Ok(ctx
                .data_sources()
                .application_settings
                .get(&key)
                .cloned()
                .unwrap_or(Value::Null))
        }
        "component" => {
            let [id] = exactly::<1>(name, args)?;
            let id = cast_string(id)?
                .ok_or_else(|| ExprError::argument(name, "cannot look up component null"))?;
            component_value(&id, ctx)
        }
        "dataModel" => {
            let [path] = exactly::<1>(name, args)?;
            let path = cast_string(path)?
                .ok_or_else(|| ExprError::argument(name, "cannot look up data model path null"))?;
            let path = match ctx.node() {
                Some(node) => node.transpose_data_model(&path),
                None => path,
            };
            Ok(pick_simple_value(&ctx.data_sources().form_data, &path))
        }
        "contains" => strings(name, args, false, |s, needle| s.contains(needle)),
        "notContains" => strings(name, args, true, |s, needle| !s.contains(needle)),
        "startsWith" => strings(name, args, false, |s, prefix| s.starts_with(prefix)),
        "endsWith" => strings(name, args, false, |s, suffix| s.ends_with(suffix)),
        "commaContains" => strings(name, args, false, |list, needle| {
            list.split(',').any(|part| part.trim() == needle)
        }),
        "stringLength" => {
            let [s] = exactly::<1>(name, args)?;
            let length = cast_string(s)?.map_or(0, |s| s.encode_utf16().count());
            Ok(Value::from(length))
        }
        "lowerCase" => {
            let [s] = exactly::<1>(name, args)?;
            Ok(cast_string(s)?.map_or(Value::Null, |s| Value::String(s.to_lowercase())))
        }
        "upperCase" => {
            let [s] = exactly::<1>(name, args)?;
            Ok(cast_string(s)?.map_or(Value::Null, |s| Value::String(s.to_uppercase())))
        }
        "round" => round(args),
        other => Err(ExprError::UnknownFunction(other.to_string())),
    }
}

fn argument_count(function: &str, expected: &'static str, found: usize) -> ExprError {
    ExprError::ArgumentCount {
        function: function.to_string(),
        expected,
        found,
    }
}

fn exactly<'a, const N: usize>(function: &str, args: &'a [Value]) -> Result<&'a [Value; N], ExprError> {
    args.try_into().map_err(|_| {
        let expected = match N {
            1 => "1",
            2 => "2",
            _ => "a fixed number of",
        };
        argument_count(function, expected, args.len())
    })
}

fn compare(name: &str, args: &[Value], op: fn(f64, f64) -> bool) -> Result<Value, ExprError> {
    let [a, b] = exactly::<2>(name, args)?;
    let result = match (cast_number(a)?, cast_number(b)?) {
        (Some(a), Some(b)) => op(a, b),
        _ => false,
    };
    Ok(Value::Bool(result))
}

fn strings(
    name: &str,
    args: &[Value],
    on_null: bool,
    op: fn(&str, &str) -> bool,
) -> Result<Value, ExprError> {
    let [a, b] = exactly::<2>(name, args)?;
    let result = match (cast_string(a)?, cast_string(b)?) {
        (Some(a), Some(b)) => op(&a, &b),
        _ => on_null,
    };
    Ok(Value::Bool(result))
}

fn if_else(args: &[Value]) -> Result<Value, ExprError> {
    match args {
        [condition, then] => Ok(if cast_boolean(condition)? == Some(true) {
            then.clone()
        } else {
            Value::Null
        }),
        [condition, then, keyword, otherwise] => {
            if keyword.as_str() != Some("else") {
                return Err(ExprError::argument(
                    "if",
                    "expected third argument to be \"else\"",
                ));
            }
            Ok(if cast_boolean(condition)? == Some(true) {
                then.clone()
            } else {
                otherwise.clone()
            })
        }
        _ => Err(argument_count("if", "2 or 4", args.len())),
    }
}

fn round(args: &[Value]) -> Result<Value, ExprError> {
    let (number, decimals) = match args {
        [number] => (number, &Value::Null),
        [number, decimals] => (number, decimals),
        _ => return Err(argument_count("round", "1 or 2", args.len())),
    };

    let number = cast_number(number)?.unwrap_or(0.0);
    let decimals = cast_number(decimals)?.unwrap_or(0.0);
    if !(0.0..=100.0).contains(&decimals) || decimals.fract() != 0.0 {
        return Err(ExprError::argument(
            "round",
            format!("decimal points must be an integer between 0 and 100, got {decimals}"),
        ));
    }

    let decimals = decimals as usize;
    let factor = 10f64.powi(decimals as i32);
    let rounded = (number * factor).round() / factor;
    Ok(Value::String(format!("{rounded:.decimals$}")))
}

/// Value bound to the closest component with the given id.
fn component_value(id: &str, ctx: &ExprContext<'_>) -> Result<Value, ExprError> {
    let matching = |item: &trellis_core::ComponentDescriptor| item.matches_id(id);
    let found = ctx
        .node()
        .and_then(|node| node.closest(matching))
        .or_else(|| ctx.other_pages().iter().find_map(|page| page.closest(matching)));

    let Some(node) = found else {
        return Err(ExprError::ComponentNotFound(id.to_string()));
    };
    let Some(binding) = node.item().binding(trellis_core::component::SIMPLE_BINDING_KEY) else {
        return Err(ExprError::ComponentNotFound(id.to_string()));
    };

    if node.is_hidden(&ctx.data_sources().hidden_fields) {
        return Ok(Value::Null);
    }

    Ok(pick_simple_value(&ctx.data_sources().form_data, binding))
}
