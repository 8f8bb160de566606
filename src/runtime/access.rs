//! Kind inspection, indirection and path-based access over dynamic values

use crate::conv::split_path;
use crate::error::{Error, Result};
use crate::runtime::coerce::{as_i64, as_string, assign, assign_as};
use crate::runtime::record::Func;
use crate::runtime::value::{Kind, List, Map, Pointer, Type, Value};

static INVALID: Value = Value::Invalid;

/// Peels one interface slot; slots never nest
pub fn unwrap_any(value: &Value) -> &Value {
    match value {
        Value::Any(Some(inner)) => inner,
        Value::Any(None) => &INVALID,
        other => other,
    }
}

/// Kind of `value` without unwrapping
pub fn kind_of(value: &Value) -> Kind {
    value.kind()
}

/// Kind after stripping pointer and interface levels; nil pointers report their pointee kind
pub fn indirect_kind(value: &Value) -> Kind {
    indirect_type(value).kind()
}

/// Follows pointers and interface slots down to the base value; nil yields `Invalid`
pub fn indirect(value: &Value) -> Value {
    match value {
        Value::Pointer(ptr) => match ptr.get() {
            Some(inner) => indirect(&inner),
            None => Value::Invalid,
        },
        Value::Any(Some(inner)) => indirect(inner),
        Value::Any(None) => Value::Invalid,
        other => other.clone(),
    }
}

/// Base type after stripping pointer and interface levels
pub fn indirect_type(value: &Value) -> Type {
    match value {
        Value::Pointer(ptr) => match ptr.get() {
            Some(inner) => indirect_type(&inner),
            None => strip_pointers(ptr.elem_type()).clone(),
        },
        Value::Any(Some(inner)) => indirect_type(inner),
        Value::Any(None) => Type::Invalid,
        other => other.type_of(),
    }
}

fn strip_pointers(ty: &Type) -> &Type {
    match ty {
        Type::Pointer(elem) => strip_pointers(elem),
        other => other,
    }
}

/// Zero value of `ty`: nil pointers, nil slots and empty collections
pub fn zero_of(ty: &Type) -> Value {
    match ty {
        Type::Invalid | Type::Func => Value::Invalid,
        Type::Bool => Value::Bool(false),
        Type::Int(w) => Value::Int(*w, 0),
        Type::Uint(w) => Value::Uint(*w, 0),
        Type::Float(w) => Value::Float(*w, 0.0),
        Type::String => Value::String(String::new()),
        Type::List(elem) => Value::List(List::new((**elem).clone())),
        Type::Array(elem, len) => Value::Array(List::from_parts(
            (**elem).clone(),
            (0..*len).map(|_| zero_of(elem)).collect(),
        )),
        Type::Map(key, value) => Value::Map(Map::new((**key).clone(), (**value).clone())),
        Type::Record(rt) => Value::Record(rt.instance()),
        Type::Pointer(elem) => Value::Pointer(Pointer::null((**elem).clone())),
        Type::Any => Value::Any(None),
    }
}

/// Fresh value of `ty`; pointer types get one level of storage allocated
pub fn new_of(ty: &Type) -> Value {
    match ty {
        Type::Pointer(elem) => {
            Value::Pointer(Pointer::with_type((**elem).clone(), zero_of(elem)))
        }
        other => zero_of(other),
    }
}

/// Runs `f` on the base value behind `slot`, allocating nil pointers on the way
pub(crate) fn with_base_mut<R>(
    slot: &mut Value,
    f: impl FnOnce(&mut Value) -> Result<R>,
) -> Result<R> {
    match slot {
        Value::Pointer(ptr) => {
            let cell = ptr.cell_or_alloc();
            let mut guard = cell.write();
            with_base_mut(&mut *guard, f)
        }
        Value::Any(Some(inner)) => with_base_mut(inner, f),
        other => f(other),
    }
}

/// Resolves `path` against `src`, returning the slot value as stored.
///
/// Map keys are coerced into the map's key type, list indices must be in
/// bounds and record segments must name exported fields. Interface slots
/// along the way are unwrapped before the next segment.
pub fn field_of(src: &Value, path: &[Value]) -> Option<Value> {
    if path.is_empty() || is_basic(src) || is_nil(src) {
        return None;
    }
    let mut buf = src.clone();
    for key in path {
        let base = indirect(&buf);
        buf = match &base {
            Value::Map(map) => map.get(key)?.clone(),
            Value::Record(record) => record.get_exported(&as_string(key))?.clone(),
            Value::List(list) | Value::Array(list) => {
                let index = as_i64(key).ok()?;
                if index < 0 {
                    return None;
                }
                list.get(index as usize)?.clone()
            }
            _ => return None,
        };
    }
    Some(buf)
}

/// Like [`field_of`], with interface slots on the result unwrapped
pub fn prop_of(src: &Value, path: &[Value]) -> Option<Value> {
    field_of(src, path).map(|v| unwrap_any(&v).clone())
}

/// Resolves a dotted identifier; for maps the whole identifier is retried as one key
pub fn prop_of_id(src: &Value, ident: &str) -> Option<Value> {
    if is_basic(src) || is_nil(src) {
        return None;
    }
    let path = path_of(ident);
    if let Some(val) = prop_of(src, &path) {
        return Some(val);
    }
    if is_map(src) && path.len() > 1 {
        return prop_of(src, &[Value::from(ident)]);
    }
    None
}

/// Splits a dotted identifier into string path segments
pub fn path_of(ident: &str) -> Vec<Value> {
    split_path(ident).into_iter().map(Value::from).collect()
}

/// Declared type at `path`, falling back to a pure type walk when the value has no such slot
pub fn type_of_field(src: &Value, path: &[Value]) -> Option<Type> {
    if path.is_empty() {
        return None;
    }
    if !is_nil(src) {
        if let Some(val) = field_of(src, path) {
            return Some(unwrap_any(&val).type_of());
        }
    }
    type_of_path(&src.type_of(), path)
}

/// Walks `path` over a type descriptor: record fields by name, element types for collections
pub fn type_of_path(ty: &Type, path: &[Value]) -> Option<Type> {
    if path.is_empty() || *ty == Type::Invalid {
        return None;
    }
    let mut buf = ty.clone();
    for key in path {
        buf = match strip_pointers(&buf) {
            Type::Record(rt) => {
                let name = as_string(key);
                let i = rt.field_index(&name)?;
                rt.fields()[i].ty.clone()
            }
            Type::Array(elem, _) | Type::List(elem) | Type::Map(_, elem) => (**elem).clone(),
            _ => return None,
        };
    }
    Some(buf)
}

/// [`type_of_field`] over a dotted identifier
pub fn type_of_id(src: &Value, ident: &str) -> Option<Type> {
    type_of_field(src, &path_of(ident))
}

/// Writes `value` at `path` inside `dest`, creating missing map entries and pointer storage.
///
/// Returns `Ok(false)` when a segment cannot be resolved (unknown or private
/// field, index out of range). A basic `dest` is assigned directly.
pub fn set(dest: &mut Value, value: &Value, path: &[Value]) -> Result<bool> {
    if matches!(dest, Value::Invalid) {
        return Err(Error::Unaddressable);
    }
    if path.is_empty() || is_basic(dest) {
        return assign(dest, value);
    }
    let ty = dest.type_of();
    set_in(dest, &ty, value, path)
}

fn set_in(dest: &mut Value, ty: &Type, value: &Value, path: &[Value]) -> Result<bool> {
    let Some((key, rest)) = path.split_first() else {
        return assign_as(dest, ty, value);
    };
    if matches!(dest, Value::Any(None)) {
        return Ok(false);
    }
    with_base_mut(dest, |base| match base {
        Value::Map(map) => {
            if rest.is_empty() {
                map.insert(key, value)?;
                return Ok(true);
            }
            let value_ty = map.value_type().clone();
            if let Some(slot) = map.get_mut(key) {
                return set_in(slot, &value_ty, value, rest);
            }
            let mut child = match &value_ty {
                Type::Any => {
                    let hint = unwrap_any(&rest[0]);
                    let key_ty = match hint {
                        Value::String(_) | Value::Invalid => Type::String,
                        other => other.type_of(),
                    };
                    Value::any(Value::Map(Map::new(key_ty, Type::Any)))
                }
                other => new_of(other),
            };
            let done = set_in(&mut child, &value_ty, value, rest)?;
            map.insert(key, &child)?;
            Ok(done)
        }
        Value::Record(record) => {
            let name = as_string(key);
            let rt = record.record_type().clone();
            let Some(i) = rt.field_index(&name).filter(|i| rt.fields()[*i].exported) else {
                return Ok(false);
            };
            let field_ty = &rt.fields()[i].ty;
            set_in(&mut record.fields_mut()[i], field_ty, value, rest)
        }
        Value::List(list) | Value::Array(list) => {
            let Ok(index) = as_i64(key) else {
                return Ok(false);
            };
            let elem = list.elem_type().clone();
            if index < 0 {
                return Ok(false);
            }
            match list.get_mut(index as usize) {
                Some(slot) => set_in(slot, &elem, value, rest),
                None => Ok(false),
            }
        }
        _ => Ok(false),
    })
}

/// [`set`] over a dotted identifier; for maps the whole identifier is retried as one key
pub fn set_by_id(dest: &mut Value, value: &Value, ident: &str) -> Result<bool> {
    let path = path_of(ident);
    if set(dest, value, &path)? {
        return Ok(true);
    }
    if is_map(dest) && path.len() > 1 {
        return set(dest, value, &[Value::from(ident)]);
    }
    Ok(false)
}

/// Finds the method named by the last path segment on the receiver the rest
/// of the path resolves to.
///
/// The result is a callable bound to that receiver.
pub fn method_of(target: &Value, path: &[Value]) -> Option<Value> {
    if path.is_empty() || is_nil(target) || is_basic(target) {
        return None;
    }
    let (last, parents) = path.split_last()?;
    let owner = if parents.is_empty() {
        target.clone()
    } else {
        field_of(target, parents)?
    };
    let owner = unwrap_any(&owner).clone();
    let rt = match indirect_type(&owner) {
        Type::Record(rt) => rt,
        _ => return None,
    };
    let name = as_string(last);
    let method = rt.method(&name)?.clone();
    Some(Value::Func(Func::new(name, move |args| method(&owner, args))))
}

/// [`method_of`] over a dotted identifier
pub fn method_of_id(target: &Value, ident: &str) -> Option<Value> {
    method_of(target, &path_of(ident))
}

/// Visits `(key, value)` pairs: map entries, list indices, or exported record fields
pub fn for_each(target: &Value, mut f: impl FnMut(Value, Value)) {
    if is_basic(target) || is_nil(target) {
        return;
    }
    match indirect(target) {
        Value::Map(map) => {
            for (key, val) in map.iter() {
                f(key.clone(), unwrap_any(val).clone());
            }
        }
        Value::List(list) | Value::Array(list) => {
            for (i, val) in list.iter().enumerate() {
                f(Value::int(i as i64), unwrap_any(val).clone());
            }
        }
        Value::Record(record) => {
            for (name, val) in record.exported() {
                f(Value::from(name), unwrap_any(val).clone());
            }
        }
        _ => {}
    }
}

/// Flattens list arguments into one vector of items
pub fn as_list(values: &[Value]) -> Vec<Value> {
    let mut dest = Vec::new();
    for value in values {
        match indirect(value) {
            Value::List(list) | Value::Array(list) => {
                dest.extend(list.iter().map(|v| unwrap_any(v).clone()));
            }
            other => dest.push(other),
        }
    }
    dest
}

/// Nil pointer, nil slot, or absent value
pub fn is_nil(value: &Value) -> bool {
    match value {
        Value::Invalid | Value::Any(None) => true,
        Value::Pointer(ptr) => ptr.is_null(),
        _ => false,
    }
}

/// Absent value
pub fn is_invalid(value: &Value) -> bool {
    matches!(value, Value::Invalid)
}

/// Anything but records, maps, lists and arrays once indirected
pub fn is_basic(value: &Value) -> bool {
    !matches!(
        indirect_kind(value),
        Kind::Record | Kind::Map | Kind::List | Kind::Array
    )
}

/// Type-level [`is_basic`]
pub fn is_basic_type(ty: &Type) -> bool {
    !matches!(
        strip_pointers(ty).kind(),
        Kind::Record | Kind::Map | Kind::List | Kind::Array
    )
}

/// Integer or float
pub fn is_number(value: &Value) -> bool {
    indirect_kind(value).is_number()
}

/// Signed or unsigned integer
pub fn is_general_int(value: &Value) -> bool {
    indirect_kind(value).is_general_int()
}

/// Signed integer
pub fn is_signed_int(value: &Value) -> bool {
    indirect_kind(value).is_signed_int()
}

/// Unsigned integer
pub fn is_unsigned_int(value: &Value) -> bool {
    indirect_kind(value).is_unsigned_int()
}

/// 32- or 64-bit float
pub fn is_float(value: &Value) -> bool {
    indirect_kind(value).is_float()
}

/// String
pub fn is_string(value: &Value) -> bool {
    indirect_kind(value) == Kind::String
}

/// Boolean
pub fn is_bool(value: &Value) -> bool {
    indirect_kind(value) == Kind::Bool
}

/// Callable
pub fn is_func(value: &Value) -> bool {
    indirect_kind(value) == Kind::Func
}

/// Map
pub fn is_map(value: &Value) -> bool {
    indirect_kind(value) == Kind::Map
}

/// List or fixed-size array
pub fn is_list(value: &Value) -> bool {
    matches!(indirect_kind(value), Kind::List | Kind::Array)
}

/// Fixed-size array
pub fn is_array(value: &Value) -> bool {
    indirect_kind(value) == Kind::Array
}

/// Record
pub fn is_record(value: &Value) -> bool {
    indirect_kind(value) == Kind::Record
}

/// Pointer, without unwrapping
pub fn is_pointer(value: &Value) -> bool {
    matches!(value, Value::Pointer(_))
}

/// Interface slot, without unwrapping
pub fn is_any(value: &Value) -> bool {
    matches!(value, Value::Any(_))
}

/// Matches any of `kinds`; `Pointer` and `Any` test the outer level, others the indirect kind
pub fn is_any_of(value: &Value, kinds: &[Kind]) -> bool {
    let base = indirect_kind(value);
    kinds.iter().any(|kind| match kind {
        Kind::Pointer => is_pointer(value),
        Kind::Any => is_any(value),
        other => *other == base,
    })
}
