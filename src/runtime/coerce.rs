//! Coercive assignment between value types

use crate::conv::{parse_float, parse_int};
use crate::error::{Error, Result};
use crate::runtime::access::{indirect, is_nil, unwrap_any, zero_of};
use crate::runtime::value::{FloatWidth, IntWidth, List, Map, Pointer, Type, Value};

/// Coerces `src` into the declared type of `dest` and stores it.
///
/// Returns `Ok(false)` when `src` is nil, leaving `dest` at its zero value.
/// `dest` must carry a type: writing into `Value::Invalid` is `Unaddressable`.
pub fn assign(dest: &mut Value, src: &Value) -> Result<bool> {
    if matches!(dest, Value::Invalid) {
        return Err(Error::Unaddressable);
    }
    let ty = dest.type_of();
    assign_as(dest, &ty, src)
}

/// Coerces `src` into `ty` and stores the result in `dest`
pub(crate) fn assign_as(dest: &mut Value, ty: &Type, src: &Value) -> Result<bool> {
    let src = unwrap_any(src);
    if is_nil(src) {
        *dest = zero_of(ty);
        return Ok(false);
    }

    match ty {
        Type::Invalid => return Err(Error::Unaddressable),
        Type::Any => {
            *dest = Value::any(src.clone());
            return Ok(true);
        }
        Type::Pointer(elem) => {
            if let Value::Pointer(ptr) = src {
                if ptr.elem_type() == elem.as_ref() {
                    *dest = src.clone();
                    return Ok(true);
                }
            }
            let inner = as_of(elem, src)?;
            *dest = Value::Pointer(Pointer::with_type((**elem).clone(), inner));
            return Ok(true);
        }
        _ => {}
    }

    let el = indirect(src);
    if el.type_of() == *ty {
        *dest = el;
        return Ok(true);
    }

    *dest = convert(ty, &el).ok_or_else(|| Error::CannotAssign {
        from: src.type_name(),
        to: ty.to_string(),
    })??;
    Ok(true)
}

/// Converts a base value of another type into `ty`; `None` when no rule applies
fn convert(ty: &Type, el: &Value) -> Option<Result<Value>> {
    let converted = match ty {
        Type::Int(w) => {
            let n = match el {
                Value::String(s) => parse_int(s),
                Value::Int(_, n) => *n,
                Value::Uint(_, n) => *n as i64,
                Value::Float(_, x) => *x as i64,
                _ => return None,
            };
            Value::Int(*w, w.wrap_signed(n))
        }
        Type::Uint(w) => {
            let n = match el {
                Value::String(s) => parse_int(s) as u64,
                Value::Uint(_, n) => *n,
                Value::Int(_, n) => *n as u64,
                Value::Float(_, x) => *x as u64,
                _ => return None,
            };
            Value::Uint(*w, w.wrap_unsigned(n))
        }
        Type::Float(w) => {
            let x = match el {
                Value::String(s) => parse_float(s),
                Value::Float(_, x) => *x,
                Value::Int(_, n) => *n as f64,
                Value::Uint(_, n) => *n as f64,
                _ => return None,
            };
            Value::Float(*w, w.round(x))
        }
        Type::String => Value::String(el.to_string()),
        Type::Bool => Value::Bool(!el.is_zero()),
        Type::List(elem) => match el {
            Value::List(items) | Value::Array(items) => {
                return Some(
                    List::from_values((**elem).clone(), items.iter().cloned()).map(Value::List),
                )
            }
            _ => return None,
        },
        Type::Array(elem, len) => match el {
            Value::List(items) | Value::Array(items) => {
                let values = (0..*len).map(|i| {
                    items.get(i).cloned().unwrap_or_else(|| zero_of(elem))
                });
                return Some(List::from_values((**elem).clone(), values).map(Value::Array));
            }
            _ => return None,
        },
        Type::Map(key, value) => match el {
            Value::Map(src) => {
                let mut map = Map::new((**key).clone(), (**value).clone());
                for (k, v) in src.iter() {
                    if let Err(err) = map.insert(k, v) {
                        return Some(Err(err));
                    }
                }
                Value::Map(map)
            }
            _ => return None,
        },
        _ => return None,
    };
    Some(Ok(converted))
}

/// Returns `value` coerced into `ty`; interface types box it unchanged
pub fn as_of(ty: &Type, value: &Value) -> Result<Value> {
    match ty {
        Type::Invalid => Ok(value.clone()),
        Type::Any => Ok(Value::any(unwrap_any(value).clone())),
        _ => {
            let mut dest = zero_of(ty);
            assign_as(&mut dest, ty, value)?;
            Ok(dest)
        }
    }
}

/// Truthiness: booleans as is, everything else by non-zero value
pub fn as_bool(value: &Value) -> bool {
    match indirect(value) {
        Value::Bool(b) => b,
        other => !other.is_zero(),
    }
}

/// String form; nil is the empty string
pub fn as_string(value: &Value) -> String {
    match indirect(value) {
        Value::Invalid => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Reads `value` as a 64-bit signed integer
pub fn as_i64(value: &Value) -> Result<i64> {
    match as_of(&Type::Int(IntWidth::W64), value)? {
        Value::Int(_, n) => Ok(n),
        _ => Ok(0),
    }
}

/// Reads `value` as a 64-bit unsigned integer
pub fn as_u64(value: &Value) -> Result<u64> {
    match as_of(&Type::Uint(IntWidth::W64), value)? {
        Value::Uint(_, n) => Ok(n),
        _ => Ok(0),
    }
}

/// Reads `value` as a 64-bit float
pub fn as_f64(value: &Value) -> Result<f64> {
    match as_of(&Type::Float(FloatWidth::F64), value)? {
        Value::Float(_, x) => Ok(x),
        _ => Ok(0.0),
    }
}

impl Value {
    /// See [`as_bool`]
    pub fn as_bool(&self) -> bool {
        as_bool(self)
    }

    /// See [`as_string`]
    pub fn as_string(&self) -> String {
        as_string(self)
    }

    /// See [`as_i64`]
    pub fn as_i64(&self) -> Result<i64> {
        as_i64(self)
    }

    /// See [`as_u64`]
    pub fn as_u64(&self) -> Result<u64> {
        as_u64(self)
    }

    /// See [`as_f64`]
    pub fn as_f64(&self) -> Result<f64> {
        as_f64(self)
    }
}
