//! Deep clone, union-merge and generic comparison

use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::runtime::access::{
    indirect, is_basic, is_basic_type, is_nil, new_of, unwrap_any, with_base_mut, zero_of,
};
use crate::runtime::coerce::as_of;
use crate::runtime::record::Record;
use crate::runtime::value::{List, Pointer, Value};

/// Deep-copies `src` into `dest`.
///
/// `dest` is reset first, so a pointer destination gets fresh storage and never
/// aliases what it pointed at before. Pointers inside `src` are copied into new
/// cells and unexported record fields are left at zero. A nil `src` leaves
/// `dest` reset. The base types of both sides must match.
pub fn clone_into(dest: &mut Value, src: &Value) -> Result<()> {
    if matches!(dest, Value::Invalid) {
        return Err(Error::Unaddressable);
    }
    let ty = dest.type_of();
    *dest = new_of(&ty);
    let el = indirect(src);
    if is_nil(&el) {
        return Ok(());
    }
    if matches!(dest, Value::Any(_)) {
        *dest = Value::any(deep_copy(&el));
        return Ok(());
    }
    with_base_mut(dest, |target| {
        if target.type_of() != el.type_of() {
            return Err(Error::CannotClone {
                from: el.type_name(),
                to: target.type_name(),
            });
        }
        *target = deep_copy(&el);
        Ok(())
    })
}

/// Structural copy sharing no mutable storage with `value`
pub fn deep_copy(value: &Value) -> Value {
    match value {
        Value::List(list) => Value::List(copy_items(list)),
        Value::Array(list) => Value::Array(copy_items(list)),
        Value::Map(map) => Value::Map(map.map_values(deep_copy)),
        Value::Record(record) => {
            let rt = record.record_type().clone();
            let fields = rt
                .fields()
                .iter()
                .zip(record.fields())
                .map(|(def, v)| {
                    if def.exported {
                        deep_copy(v)
                    } else {
                        zero_of(&def.ty)
                    }
                })
                .collect();
            Value::Record(Record::from_parts(rt, fields))
        }
        Value::Pointer(ptr) => match ptr.get() {
            Some(inner) => {
                Value::Pointer(Pointer::with_type(ptr.elem_type().clone(), deep_copy(&inner)))
            }
            None => value.clone(),
        },
        Value::Any(Some(inner)) => Value::any(deep_copy(inner)),
        other => other.clone(),
    }
}

fn copy_items(list: &List) -> List {
    List::from_parts(
        list.elem_type().clone(),
        list.iter().map(deep_copy).collect(),
    )
}

/// Union-merges `src` into `dest`; zero values in `src` never overwrite.
///
/// - lists: `src` items are appended, coerced to the element type
/// - arrays: non-zero `src` items overwrite by position
/// - records: exported basic fields are overwritten when the `src` field is
///   non-zero, structured fields are merged recursively
/// - maps: entries present on both sides merge recursively when both values are
///   structured and of one type, otherwise a non-zero `src` value overwrites;
///   missing entries are inserted
/// - anything else: a non-zero `src` overwrites
///
/// Apart from list sources, both base types must match.
pub fn merge(dest: &mut Value, src: &Value) -> Result<()> {
    let from = indirect(src);
    if is_nil(&from) {
        return Ok(());
    }
    if matches!(dest, Value::Invalid) {
        return Err(Error::Unaddressable);
    }
    with_base_mut(dest, |to| merge_base(to, &from))
}

fn merge_base(to: &mut Value, from: &Value) -> Result<()> {
    let to_name = to.type_name();
    let mismatch = || Error::CannotMerge {
        from: from.type_name(),
        to: to_name.clone(),
    };

    match to {
        Value::Any(None) => {
            *to = Value::any(from.clone());
            return Ok(());
        }
        Value::List(list) => {
            let items = match from {
                Value::List(items) | Value::Array(items) => items,
                _ => return Err(mismatch()),
            };
            for item in items.iter() {
                list.push(unwrap_any(item))?;
            }
            return Ok(());
        }
        Value::Array(list) => {
            let items = match from {
                Value::List(items) | Value::Array(items) => items,
                _ => return Err(mismatch()),
            };
            let elem = list.elem_type().clone();
            for (i, item) in items.iter().enumerate().take(list.len()) {
                let item = unwrap_any(item);
                if !item.is_zero() {
                    if let Some(slot) = list.get_mut(i) {
                        *slot = as_of(&elem, item)?;
                    }
                }
            }
            return Ok(());
        }
        _ => {}
    }

    if to.type_of() != from.type_of() {
        return Err(mismatch());
    }

    match (to, from) {
        (Value::Record(left), Value::Record(right)) => {
            let rt = left.record_type().clone();
            let fields = left.fields_mut();
            for (i, def) in rt.fields().iter().enumerate() {
                if !def.exported {
                    continue;
                }
                let value = &right.fields()[i];
                if value.is_zero() {
                    continue;
                }
                if is_basic_type(&def.ty) {
                    fields[i] = value.clone();
                } else {
                    merge(&mut fields[i], value)?;
                }
            }
            Ok(())
        }
        (Value::Map(left), Value::Map(right)) => {
            let value_ty = left.value_type().clone();
            for (key, value) in right.iter() {
                let value = unwrap_any(value);
                match left.get_mut(key) {
                    Some(slot) => {
                        let current = unwrap_any(slot);
                        if !is_basic(current) && current.type_of() == value.type_of() {
                            merge(slot, value)?;
                        } else if !value.is_zero() {
                            *slot = as_of(&value_ty, value)?;
                        }
                    }
                    None => left.insert(key, value)?,
                }
            }
            Ok(())
        }
        (to, from) => {
            if !from.is_zero() {
                *to = from.clone();
            }
            Ok(())
        }
    }
}

/// Three-way comparison; `None` when the values are not comparable.
///
/// Integers compare exactly across signedness, mixed numbers as floats,
/// strings lexicographically. Anything else is `Equal` when structurally
/// equal and incomparable otherwise.
pub fn cmp(x: &Value, y: &Value) -> Option<Ordering> {
    let (a, b) = (indirect(x), indirect(y));
    if let (Value::String(s), Value::String(t)) = (&a, &b) {
        return Some(s.cmp(t));
    }
    if let (Some(i), Some(j)) = (wide_int(&a), wide_int(&b)) {
        return Some(i.cmp(&j));
    }
    if let (Some(f), Some(g)) = (wide_float(&a), wide_float(&b)) {
        return f.partial_cmp(&g);
    }
    if x == y {
        Some(Ordering::Equal)
    } else {
        None
    }
}

fn wide_int(value: &Value) -> Option<i128> {
    match value {
        Value::Int(_, n) => Some(i128::from(*n)),
        Value::Uint(_, n) => Some(i128::from(*n)),
        _ => None,
    }
}

fn wide_float(value: &Value) -> Option<f64> {
    match value {
        Value::Int(_, n) => Some(*n as f64),
        Value::Uint(_, n) => Some(*n as f64),
        Value::Float(_, x) => Some(*x),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::access::prop_of;
    use crate::runtime::record::RecordType;
    use crate::runtime::value::Type;
    use std::sync::Arc;

    fn profile() -> Arc<RecordType> {
        RecordType::builder("Profile")
            .field("Name", Type::String)
            .field("Age", Type::INT)
            .field("Tags", Type::list_of(Type::String))
            .field("Extra", Type::map_of(Type::String, Type::Any))
            .field("Next", Type::pointer_to(Type::INT))
            .private_field("secret", Type::String)
            .build()
    }

    fn tags(items: &[&str]) -> Value {
        Value::list(Type::String, items.iter().map(|s| Value::from(*s))).unwrap()
    }

    #[test]
    fn test_clone_detaches_pointers() {
        let src = Value::from(
            profile()
                .instance()
                .with("Name", "Allen")
                .unwrap()
                .with("Next", Value::pointer(Value::int(1)))
                .unwrap()
                .with("secret", "s")
                .unwrap(),
        );
        let mut dest = Value::from(profile().instance());
        clone_into(&mut dest, &src).unwrap();

        let next = |v: &Value| match prop_of(v, &[Value::from("Next")]) {
            Some(Value::Pointer(p)) => p,
            other => panic!("expected pointer, got {:?}", other),
        };
        assert!(!next(&dest).same_target(&next(&src)));
        assert_eq!(indirect(&Value::Pointer(next(&dest))), Value::int(1));

        match &dest {
            Value::Record(r) => assert_eq!(r.get("secret"), Some(&Value::from(""))),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_clone_type_mismatch() {
        let mut dest = Value::int(0);
        let err = clone_into(&mut dest, &Value::from("x")).unwrap_err();
        assert!(matches!(err, Error::CannotClone { .. }));
    }

    #[test]
    fn test_clone_into_fresh_pointer() {
        let old = Value::pointer(Value::int(5));
        let mut dest = old.clone();
        clone_into(&mut dest, &Value::int(9)).unwrap();
        assert_eq!(indirect(&dest), Value::int(9));
        assert_eq!(indirect(&old), Value::int(5));
    }

    #[test]
    fn test_merge_zero_never_overwrites() {
        let mut dest = Value::from(
            profile()
                .instance()
                .with("Name", "Allen")
                .unwrap()
                .with("Age", 30i64)
                .unwrap()
                .with("Tags", tags(&["a"]))
                .unwrap(),
        );
        let src = Value::from(
            profile()
                .instance()
                .with("Age", 31i64)
                .unwrap()
                .with("Tags", tags(&["b"]))
                .unwrap(),
        );
        merge(&mut dest, &src).unwrap();
        assert_eq!(prop_of(&dest, &[Value::from("Name")]), Some(Value::from("Allen")));
        assert_eq!(prop_of(&dest, &[Value::from("Age")]), Some(Value::int(31)));
        assert_eq!(prop_of(&dest, &[Value::from("Tags")]), Some(tags(&["a", "b"])));
    }

    #[test]
    fn test_merge_maps_recursively() {
        let mut dest = Value::str_map(vec![
            ("a", Value::str_map(vec![("x", Value::int(1))])),
            ("keep", Value::int(1)),
        ]);
        let src = Value::str_map(vec![
            ("a", Value::str_map(vec![("y", Value::int(2))])),
            ("keep", Value::int(0)),
            ("new", Value::from("n")),
        ]);
        merge(&mut dest, &src).unwrap();
        let expected = Value::str_map(vec![
            (
                "a",
                Value::str_map(vec![("x", Value::int(1)), ("y", Value::int(2))]),
            ),
            ("keep", Value::int(1)),
            ("new", Value::from("n")),
        ]);
        assert_eq!(dest, expected);
    }

    #[test]
    fn test_merge_array_by_position() {
        let mut dest = Value::array(Type::INT, vec![Value::int(1), Value::int(2)]).unwrap();
        let src = Value::any_list(vec![Value::int(0), Value::int(5), Value::int(9)]);
        merge(&mut dest, &src).unwrap();
        assert_eq!(
            dest,
            Value::array(Type::INT, vec![Value::int(1), Value::int(5)]).unwrap()
        );
    }

    #[test]
    fn test_merge_mismatch() {
        let mut dest = Value::str_map(vec![]);
        let err = merge(&mut dest, &Value::from(profile().instance())).unwrap_err();
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn test_cmp() {
        assert_eq!(cmp(&Value::int(-1), &Value::uint(u64::MAX)), Some(Ordering::Less));
        assert_eq!(cmp(&Value::int(2), &Value::float(1.5)), Some(Ordering::Greater));
        assert_eq!(cmp(&Value::from("a"), &Value::from("b")), Some(Ordering::Less));
        assert_eq!(
            cmp(&Value::any_list(vec![Value::int(1)]), &Value::any_list(vec![Value::int(1)])),
            Some(Ordering::Equal)
        );
        assert_eq!(cmp(&Value::from("1"), &Value::int(1)), None);
        assert_eq!(cmp(&Value::float(f64::NAN), &Value::float(1.0)), None);
    }
}
