use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::runtime::access::{unwrap_any, zero_of};
use crate::runtime::coerce::as_of;
use crate::runtime::record::{Func, Record, RecordType};

/// Storage width of an integer kind; `Size` is the platform word (`int`/`uint`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    /// 8 bits
    W8,
    /// 16 bits
    W16,
    /// 32 bits
    W32,
    /// 64 bits
    W64,
    /// Platform word, stored as 64 bits
    Size,
}

impl IntWidth {
    /// Truncates `v` to this width, sign-extending back to 64 bits
    pub fn wrap_signed(self, v: i64) -> i64 {
        match self {
            IntWidth::W8 => v as i8 as i64,
            IntWidth::W16 => v as i16 as i64,
            IntWidth::W32 => v as i32 as i64,
            IntWidth::W64 | IntWidth::Size => v,
        }
    }

    /// Truncates `v` to this width
    pub fn wrap_unsigned(self, v: u64) -> u64 {
        match self {
            IntWidth::W8 => v as u8 as u64,
            IntWidth::W16 => v as u16 as u64,
            IntWidth::W32 => v as u32 as u64,
            IntWidth::W64 | IntWidth::Size => v,
        }
    }
}

/// Storage width of a float kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatWidth {
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
}

impl FloatWidth {
    /// Rounds `v` to this width
    pub fn round(self, v: f64) -> f64 {
        match self {
            FloatWidth::F32 => v as f32 as f64,
            FloatWidth::F64 => v,
        }
    }
}

/// Flat kind tag of a value or type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Absent or untyped
    Invalid,
    /// Boolean
    Bool,
    /// Platform-width signed integer
    Int,
    /// 8-bit signed integer
    Int8,
    /// 16-bit signed integer
    Int16,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// Platform-width unsigned integer
    Uint,
    /// 8-bit unsigned integer
    Uint8,
    /// 16-bit unsigned integer
    Uint16,
    /// 32-bit unsigned integer
    Uint32,
    /// 64-bit unsigned integer
    Uint64,
    /// 32-bit float
    Float32,
    /// 64-bit float
    Float64,
    /// UTF-8 string
    String,
    /// Growable list
    List,
    /// Fixed-size array
    Array,
    /// Keyed map
    Map,
    /// Record with declared fields
    Record,
    /// Callable
    Func,
    /// Shared reference to another value
    Pointer,
    /// Interface slot holding any value
    Any,
}

impl Kind {
    /// Signed integer kinds
    pub fn is_signed_int(self) -> bool {
        matches!(
            self,
            Kind::Int | Kind::Int8 | Kind::Int16 | Kind::Int32 | Kind::Int64
        )
    }

    /// Unsigned integer kinds
    pub fn is_unsigned_int(self) -> bool {
        matches!(
            self,
            Kind::Uint | Kind::Uint8 | Kind::Uint16 | Kind::Uint32 | Kind::Uint64
        )
    }

    /// Signed or unsigned integer kinds
    pub fn is_general_int(self) -> bool {
        self.is_signed_int() || self.is_unsigned_int()
    }

    /// Float kinds
    pub fn is_float(self) -> bool {
        matches!(self, Kind::Float32 | Kind::Float64)
    }

    /// Integer or float kinds
    pub fn is_number(self) -> bool {
        self.is_general_int() || self.is_float()
    }
}

/// Type descriptor of a value
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// No type; the zero value is `Value::Invalid`
    Invalid,
    /// `bool`
    Bool,
    /// Signed integer of the given width
    Int(IntWidth),
    /// Unsigned integer of the given width
    Uint(IntWidth),
    /// Float of the given width
    Float(FloatWidth),
    /// `string`
    String,
    /// `[]elem`
    List(Box<Type>),
    /// `[len]elem`
    Array(Box<Type>, usize),
    /// `map[key]value`
    Map(Box<Type>, Box<Type>),
    /// Declared record type
    Record(Arc<RecordType>),
    /// Callable
    Func,
    /// `*elem`
    Pointer(Box<Type>),
    /// Interface slot (`any`)
    Any,
}

impl Type {
    /// `int`
    pub const INT: Type = Type::Int(IntWidth::Size);
    /// `int64`
    pub const INT64: Type = Type::Int(IntWidth::W64);
    /// `uint64`
    pub const UINT64: Type = Type::Uint(IntWidth::W64);
    /// `float64`
    pub const FLOAT64: Type = Type::Float(FloatWidth::F64);

    /// `[]elem`
    pub fn list_of(elem: Type) -> Type {
        Type::List(Box::new(elem))
    }

    /// `map[key]value`
    pub fn map_of(key: Type, value: Type) -> Type {
        Type::Map(Box::new(key), Box::new(value))
    }

    /// `*elem`
    pub fn pointer_to(elem: Type) -> Type {
        Type::Pointer(Box::new(elem))
    }

    /// Kind tag of this type
    pub fn kind(&self) -> Kind {
        match self {
            Type::Invalid => Kind::Invalid,
            Type::Bool => Kind::Bool,
            Type::Int(w) => match w {
                IntWidth::W8 => Kind::Int8,
                IntWidth::W16 => Kind::Int16,
                IntWidth::W32 => Kind::Int32,
                IntWidth::W64 => Kind::Int64,
                IntWidth::Size => Kind::Int,
            },
            Type::Uint(w) => match w {
                IntWidth::W8 => Kind::Uint8,
                IntWidth::W16 => Kind::Uint16,
                IntWidth::W32 => Kind::Uint32,
                IntWidth::W64 => Kind::Uint64,
                IntWidth::Size => Kind::Uint,
            },
            Type::Float(FloatWidth::F32) => Kind::Float32,
            Type::Float(FloatWidth::F64) => Kind::Float64,
            Type::String => Kind::String,
            Type::List(_) => Kind::List,
            Type::Array(..) => Kind::Array,
            Type::Map(..) => Kind::Map,
            Type::Record(_) => Kind::Record,
            Type::Func => Kind::Func,
            Type::Pointer(_) => Kind::Pointer,
            Type::Any => Kind::Any,
        }
    }

    /// Element type of lists, arrays, map values and pointers
    pub fn elem(&self) -> Option<&Type> {
        match self {
            Type::List(elem) | Type::Array(elem, _) | Type::Pointer(elem) => Some(elem),
            Type::Map(_, value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Type::Invalid => write!(f, "invalid"),
            Type::Bool => write!(f, "bool"),
            Type::Int(w) => match w {
                IntWidth::W8 => write!(f, "int8"),
                IntWidth::W16 => write!(f, "int16"),
                IntWidth::W32 => write!(f, "int32"),
                IntWidth::W64 => write!(f, "int64"),
                IntWidth::Size => write!(f, "int"),
            },
            Type::Uint(w) => match w {
                IntWidth::W8 => write!(f, "uint8"),
                IntWidth::W16 => write!(f, "uint16"),
                IntWidth::W32 => write!(f, "uint32"),
                IntWidth::W64 => write!(f, "uint64"),
                IntWidth::Size => write!(f, "uint"),
            },
            Type::Float(FloatWidth::F32) => write!(f, "float32"),
            Type::Float(FloatWidth::F64) => write!(f, "float64"),
            Type::String => write!(f, "string"),
            Type::List(elem) => write!(f, "[]{}", elem),
            Type::Array(elem, len) => write!(f, "[{}]{}", len, elem),
            Type::Map(key, value) => write!(f, "map[{}]{}", key, value),
            Type::Record(ty) => write!(f, "{}", ty.name()),
            Type::Func => write!(f, "func"),
            Type::Pointer(elem) => write!(f, "*{}", elem),
            Type::Any => write!(f, "any"),
        }
    }
}

/// Hashable form of a map key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    /// Boolean key
    Bool(bool),
    /// Signed integer key
    Int(i64),
    /// Unsigned integer key
    Uint(u64),
    /// Float key by bit pattern
    Float(u64),
    /// String key
    String(String),
}

impl MapKey {
    fn from_value(value: &Value) -> Result<MapKey> {
        match unwrap_any(value) {
            Value::Bool(b) => Ok(MapKey::Bool(*b)),
            Value::Int(_, n) => Ok(MapKey::Int(*n)),
            Value::Uint(_, n) => Ok(MapKey::Uint(*n)),
            Value::Float(_, x) => Ok(MapKey::Float(x.to_bits())),
            Value::String(s) => Ok(MapKey::String(s.clone())),
            other => Err(Error::TypeError {
                expected: "hashable map key".to_string(),
                got: other.type_name(),
            }),
        }
    }
}

/// Ordered sequence of values sharing one element type; backs lists and arrays
#[derive(Debug, Clone)]
pub struct List {
    elem: Type,
    items: Arc<Vec<Value>>,
}

impl List {
    /// Empty list of `elem`
    pub fn new(elem: Type) -> Self {
        List {
            elem,
            items: Arc::new(Vec::new()),
        }
    }

    /// Builds a list, coercing every item into `elem`
    pub fn from_values(elem: Type, values: impl IntoIterator<Item = Value>) -> Result<Self> {
        let items = values
            .into_iter()
            .map(|v| as_of(&elem, &v))
            .collect::<Result<Vec<_>>>()?;
        Ok(List {
            elem,
            items: Arc::new(items),
        })
    }

    /// Builds a list from items already of type `elem`
    pub(crate) fn from_parts(elem: Type, items: Vec<Value>) -> Self {
        List {
            elem,
            items: Arc::new(items),
        }
    }

    /// Element type
    pub fn elem_type(&self) -> &Type {
        &self.elem
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when there are no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item at `index`
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    /// Mutable item at `index`; detaches shared storage first
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        Arc::make_mut(&mut self.items).get_mut(index)
    }

    /// Appends `value` coerced into the element type
    pub fn push(&mut self, value: &Value) -> Result<()> {
        let item = as_of(&self.elem, value)?;
        Arc::make_mut(&mut self.items).push(item);
        Ok(())
    }

    /// Iterates items in index order
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }
}

/// Keyed collection with declared key and value types
#[derive(Debug, Clone)]
pub struct Map {
    key: Type,
    value: Type,
    entries: Arc<HashMap<MapKey, (Value, Value)>>,
}

impl Map {
    /// Empty `map[key]value`
    pub fn new(key: Type, value: Type) -> Self {
        Map {
            key,
            value,
            entries: Arc::new(HashMap::new()),
        }
    }

    /// Key type
    pub fn key_type(&self) -> &Type {
        &self.key
    }

    /// Value type
    pub fn value_type(&self) -> &Type {
        &self.value
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Coerces `key` into the key type and returns its stored form
    fn coerce_key(&self, key: &Value) -> Result<(MapKey, Value)> {
        let typed = as_of(&self.key, key)?;
        let typed = unwrap_any(&typed).clone();
        Ok((MapKey::from_value(&typed)?, typed))
    }

    /// Looks up `key` after coercing it into the key type
    pub fn get(&self, key: &Value) -> Option<&Value> {
        let (hashed, _) = self.coerce_key(key).ok()?;
        self.entries.get(&hashed).map(|(_, v)| v)
    }

    /// Mutable lookup; detaches shared storage first
    pub fn get_mut(&mut self, key: &Value) -> Option<&mut Value> {
        let (hashed, _) = self.coerce_key(key).ok()?;
        Arc::make_mut(&mut self.entries)
            .get_mut(&hashed)
            .map(|(_, v)| v)
    }

    /// True when `key` is present
    pub fn contains_key(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    /// Inserts `value` under `key`, coercing both into the declared types
    pub fn insert(&mut self, key: &Value, value: &Value) -> Result<()> {
        let (hashed, typed_key) = self.coerce_key(key)?;
        let typed_value = as_of(&self.value, value)?;
        Arc::make_mut(&mut self.entries).insert(hashed, (typed_key, typed_value));
        Ok(())
    }

    /// Removes `key`, returning its value
    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        let (hashed, _) = self.coerce_key(key).ok()?;
        Arc::make_mut(&mut self.entries)
            .remove(&hashed)
            .map(|(_, v)| v)
    }

    /// Stores `value` boxed under a string key; only valid on `map[string]any`
    pub(crate) fn put_any(&mut self, key: &str, value: Value) {
        Arc::make_mut(&mut self.entries).insert(
            MapKey::String(key.to_string()),
            (Value::from(key), Value::any(value)),
        );
    }

    /// Same keys with every value passed through `f`; `f` must keep the value type
    pub(crate) fn map_values(&self, mut f: impl FnMut(&Value) -> Value) -> Map {
        let entries = self
            .entries
            .iter()
            .map(|(hashed, (k, v))| (hashed.clone(), (k.clone(), f(v))))
            .collect();
        Map {
            key: self.key.clone(),
            value: self.value.clone(),
            entries: Arc::new(entries),
        }
    }

    /// Iterates `(key, value)` pairs in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.values().map(|(k, v)| (k, v))
    }
}

/// Shared, mutable reference to a value of a declared element type
#[derive(Clone)]
pub struct Pointer {
    elem: Type,
    cell: Option<Arc<RwLock<Value>>>,
}

impl Pointer {
    /// Allocates a new cell holding `value`
    pub fn new(value: Value) -> Self {
        Pointer {
            elem: value.type_of(),
            cell: Some(Arc::new(RwLock::new(value))),
        }
    }

    /// Allocates a cell of type `elem` holding `value` as is
    pub(crate) fn with_type(elem: Type, value: Value) -> Self {
        Pointer {
            elem,
            cell: Some(Arc::new(RwLock::new(value))),
        }
    }

    /// Nil pointer to `elem`
    pub fn null(elem: Type) -> Self {
        Pointer { elem, cell: None }
    }

    /// Pointee type
    pub fn elem_type(&self) -> &Type {
        &self.elem
    }

    /// True for a nil pointer
    pub fn is_null(&self) -> bool {
        self.cell.is_none()
    }

    /// Snapshot of the pointee
    pub fn get(&self) -> Option<Value> {
        self.cell.as_ref().map(|cell| cell.read().clone())
    }

    /// Replaces the pointee, allocating when nil
    pub fn store(&mut self, value: Value) {
        let cell = self.cell_or_alloc();
        *cell.write() = value;
    }

    /// True when both pointers share one cell
    pub fn same_target(&self, other: &Pointer) -> bool {
        match (&self.cell, &other.cell) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// The pointee cell, allocating a zero value when nil
    pub(crate) fn cell_or_alloc(&mut self) -> Arc<RwLock<Value>> {
        match &self.cell {
            Some(cell) => cell.clone(),
            None => {
                let cell = Arc::new(RwLock::new(zero_of(&self.elem)));
                self.cell = Some(cell.clone());
                cell
            }
        }
    }
}

impl fmt::Debug for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.cell {
            Some(cell) => write!(f, "Pointer(&{:?})", *cell.read()),
            None => write!(f, "Pointer(nil *{})", self.elem),
        }
    }
}

/// Runtime value representation
#[derive(Debug, Clone)]
pub enum Value {
    /// Absent or untyped value
    Invalid,
    /// Boolean value
    Bool(bool),
    /// Signed integer, stored widened and truncated to its width
    Int(IntWidth, i64),
    /// Unsigned integer, stored widened and truncated to its width
    Uint(IntWidth, u64),
    /// Float, stored widened and rounded to its width
    Float(FloatWidth, f64),
    /// String value
    String(String),
    /// Growable list
    List(List),
    /// Fixed-size array
    Array(List),
    /// Keyed map
    Map(Map),
    /// Record instance
    Record(Record),
    /// Callable
    Func(Func),
    /// Shared reference
    Pointer(Pointer),
    /// Interface slot, `None` when nil
    Any(Option<Box<Value>>),
}

impl Value {
    /// `int` value
    pub fn int(n: i64) -> Self {
        Value::Int(IntWidth::Size, n)
    }

    /// `uint` value
    pub fn uint(n: u64) -> Self {
        Value::Uint(IntWidth::Size, n)
    }

    /// `float64` value
    pub fn float(x: f64) -> Self {
        Value::Float(FloatWidth::F64, x)
    }

    /// Builds a `[]elem`, coercing each item
    pub fn list(elem: Type, values: impl IntoIterator<Item = Value>) -> Result<Self> {
        Ok(Value::List(List::from_values(elem, values)?))
    }

    /// Builds a `[]any`
    pub fn any_list(values: impl IntoIterator<Item = Value>) -> Self {
        let items = values.into_iter().map(Value::any).collect();
        Value::List(List {
            elem: Type::Any,
            items: Arc::new(items),
        })
    }

    /// Builds a `[len]elem` from exactly the given values
    pub fn array(elem: Type, values: impl IntoIterator<Item = Value>) -> Result<Self> {
        Ok(Value::Array(List::from_values(elem, values)?))
    }

    /// Builds a `map[string]any`
    pub fn str_map<'a>(entries: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
        let mut map = Map::new(Type::String, Type::Any);
        let slots = Arc::make_mut(&mut map.entries);
        for (key, value) in entries {
            slots.insert(
                MapKey::String(key.to_string()),
                (Value::from(key), Value::any(value)),
            );
        }
        Value::Map(map)
    }

    /// Boxes `value` into an interface slot, flattening nested slots
    pub fn any(value: Value) -> Self {
        match value {
            Value::Any(inner) => Value::Any(inner),
            Value::Invalid => Value::Any(None),
            other => Value::Any(Some(Box::new(other))),
        }
    }

    /// Allocates a pointer to `value`
    pub fn pointer(value: Value) -> Self {
        Value::Pointer(Pointer::new(value))
    }

    /// Wraps a host closure as a callable
    pub fn func(
        name: impl Into<String>,
        f: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Value::Func(Func::new(name, f))
    }

    /// Type descriptor of this value
    pub fn type_of(&self) -> Type {
        match self {
            Value::Invalid => Type::Invalid,
            Value::Bool(_) => Type::Bool,
            Value::Int(w, _) => Type::Int(*w),
            Value::Uint(w, _) => Type::Uint(*w),
            Value::Float(w, _) => Type::Float(*w),
            Value::String(_) => Type::String,
            Value::List(list) => Type::List(Box::new(list.elem.clone())),
            Value::Array(list) => Type::Array(Box::new(list.elem.clone()), list.len()),
            Value::Map(map) => Type::map_of(map.key.clone(), map.value.clone()),
            Value::Record(record) => Type::Record(record.record_type().clone()),
            Value::Func(_) => Type::Func,
            Value::Pointer(ptr) => Type::Pointer(Box::new(ptr.elem.clone())),
            Value::Any(_) => Type::Any,
        }
    }

    /// Kind tag without unwrapping pointers or interface slots
    pub fn kind(&self) -> Kind {
        match self {
            Value::Invalid => Kind::Invalid,
            Value::Pointer(_) => Kind::Pointer,
            Value::Any(_) => Kind::Any,
            Value::Array(_) => Kind::Array,
            other => other.type_of().kind(),
        }
    }

    /// Type name as a string
    pub fn type_name(&self) -> String {
        self.type_of().to_string()
    }

    /// Zero-value test: false, 0, "", empty collections, nil pointers and slots,
    /// records whose fields are all zero
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Invalid => true,
            Value::Bool(b) => !*b,
            Value::Int(_, n) => *n == 0,
            Value::Uint(_, n) => *n == 0,
            Value::Float(_, x) => *x == 0.0,
            Value::String(s) => s.is_empty(),
            Value::List(list) => list.is_empty(),
            Value::Array(list) => list.iter().all(Value::is_zero),
            Value::Map(map) => map.is_empty(),
            Value::Record(record) => record.fields().iter().all(Value::is_zero),
            Value::Func(_) => false,
            Value::Pointer(ptr) => ptr.is_null(),
            Value::Any(inner) => inner.is_none(),
        }
    }

    /// Builds a `map[string]any` / `[]any` tree from JSON
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Invalid,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::uint(u)
                } else {
                    Value::float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::any_list(items.iter().map(Value::from_json))
            }
            serde_json::Value::Object(fields) => Value::str_map(
                fields
                    .iter()
                    .map(|(k, v)| (k.as_str(), Value::from_json(v))),
            ),
        }
    }

    /// Renders this value as JSON; callables become null
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Invalid | Value::Func(_) | Value::Any(None) => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(_, n) => Json::from(*n),
            Value::Uint(_, n) => Json::from(*n),
            Value::Float(_, x) => Json::from(*x),
            Value::String(s) => Json::String(s.clone()),
            Value::List(list) | Value::Array(list) => {
                Json::Array(list.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
            Value::Record(record) => Json::Object(
                record
                    .exported()
                    .map(|(name, v)| (name.to_string(), v.to_json()))
                    .collect(),
            ),
            Value::Pointer(ptr) => ptr.get().map(|v| v.to_json()).unwrap_or(Json::Null),
            Value::Any(Some(inner)) => inner.to_json(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Invalid | Value::Any(None) => write!(f, "<nil>"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(_, n) => write!(f, "{}", n),
            Value::Uint(_, n) => write!(f, "{}", n),
            Value::Float(FloatWidth::F32, x) => write!(f, "{}", *x as f32),
            Value::Float(FloatWidth::F64, x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{}", s),
            Value::List(list) | Value::Array(list) => {
                write!(f, "[")?;
                for (i, val) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", val)?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                let mut pairs: Vec<String> =
                    map.iter().map(|(k, v)| format!("{}:{}", k, v)).collect();
                pairs.sort();
                write!(f, "map[{}]", pairs.join(" "))
            }
            Value::Record(record) => {
                write!(f, "{{")?;
                for (i, val) in record.fields().iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", val)?;
                }
                write!(f, "}}")
            }
            Value::Func(func) => write!(f, "<func {}>", func.name()),
            Value::Pointer(ptr) => match ptr.get() {
                Some(inner) => write!(f, "&{}", inner),
                None => write!(f, "<nil>"),
            },
            Value::Any(Some(inner)) => write!(f, "{}", inner),
        }
    }
}

/// Deep structural equality; interface slots compare by their contents
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Any(Some(a)), b) => a.as_ref() == b,
            (a, Value::Any(Some(b))) => a == b.as_ref(),
            (Value::Any(None), Value::Any(None) | Value::Invalid)
            | (Value::Invalid, Value::Any(None) | Value::Invalid) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(wa, a), Value::Int(wb, b)) => wa == wb && a == b,
            (Value::Uint(wa, a), Value::Uint(wb, b)) => wa == wb && a == b,
            (Value::Float(wa, a), Value::Float(wb, b)) => wa == wb && a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Array(a), Value::Array(b)) => {
                a.elem == b.elem && a.items == b.items
            }
            (Value::Map(a), Value::Map(b)) => {
                a.key == b.key
                    && a.value == b.value
                    && a.len() == b.len()
                    && a.entries
                        .iter()
                        .all(|(k, (_, v))| b.entries.get(k).map(|(_, w)| v == w).unwrap_or(false))
            }
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Func(a), Value::Func(b)) => a.same_fn(b),
            (Value::Pointer(a), Value::Pointer(b)) => {
                if a.same_target(b) {
                    return true;
                }
                match (a.get(), b.get()) {
                    (Some(x), Some(y)) => x == y,
                    (None, None) => a.elem == b.elem,
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

macro_rules! from_int {
    ($($ty:ty => $variant:ident($width:expr)),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::$variant($width, n as _)
                }
            }
        )*
    };
}

from_int! {
    i8 => Int(IntWidth::W8),
    i16 => Int(IntWidth::W16),
    i32 => Int(IntWidth::W32),
    i64 => Int(IntWidth::W64),
    isize => Int(IntWidth::Size),
    u8 => Uint(IntWidth::W8),
    u16 => Uint(IntWidth::W16),
    u32 => Uint(IntWidth::W32),
    u64 => Uint(IntWidth::W64),
    usize => Uint(IntWidth::Size),
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(FloatWidth::F32, f64::from(x))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(FloatWidth::F64, x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(map)
    }
}

impl From<Func> for Value {
    fn from(func: Func) -> Self {
        Value::Func(func)
    }
}

impl From<Pointer> for Value {
    fn from(ptr: Pointer) -> Self {
        Value::Pointer(ptr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Invalid.type_name(), "invalid");
        assert_eq!(Value::from(3i8).type_name(), "int8");
        assert_eq!(Value::uint(3).type_name(), "uint");
        assert_eq!(Value::any_list(vec![]).type_name(), "[]any");
        assert_eq!(Value::str_map(vec![]).type_name(), "map[string]any");
        assert_eq!(Value::pointer(Value::int(1)).type_name(), "*int");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Value::int(1).kind(), Kind::Int);
        assert_eq!(Value::from(1u16).kind(), Kind::Uint16);
        assert_eq!(Value::from(1.5f32).kind(), Kind::Float32);
        assert_eq!(Value::any(Value::int(1)).kind(), Kind::Any);
        assert!(Kind::Uint8.is_general_int());
        assert!(!Kind::Float64.is_general_int());
    }

    #[test]
    fn test_zero_values() {
        assert!(Value::Invalid.is_zero());
        assert!(Value::int(0).is_zero());
        assert!(Value::from("").is_zero());
        assert!(!Value::from("x").is_zero());
        assert!(Value::Any(None).is_zero());
        assert!(Value::Pointer(Pointer::null(Type::INT)).is_zero());
    }

    #[test]
    fn test_width_wrapping() {
        assert_eq!(IntWidth::W8.wrap_signed(300), 44);
        assert_eq!(IntWidth::W8.wrap_unsigned(300), 44);
        assert_eq!(IntWidth::W16.wrap_signed(-1), -1);
    }

    #[test]
    fn test_display() {
        let list = Value::any_list(vec![Value::int(1), Value::from("a")]);
        assert_eq!(list.to_string(), "[1 a]");
        let map = Value::str_map(vec![("b", Value::int(2)), ("a", Value::int(1))]);
        assert_eq!(map.to_string(), "map[a:1 b:2]");
        assert_eq!(Value::float(2.5).to_string(), "2.5");
        assert_eq!(Value::from(0.1f32).to_string(), "0.1");
    }

    #[test]
    fn test_any_equality_unwraps() {
        assert_eq!(Value::any(Value::int(5)), Value::int(5));
        assert_ne!(Value::int(5), Value::from(5i64));
        assert_eq!(Value::Any(None), Value::Invalid);
    }

    #[test]
    fn test_map_coerces_keys() {
        let mut map = Map::new(Type::INT, Type::String);
        map.insert(&Value::from("7"), &Value::int(42)).unwrap();
        assert_eq!(map.get(&Value::int(7)), Some(&Value::from("42")));
        assert_eq!(map.get(&Value::from(7u8)), Some(&Value::from("42")));
        assert!(map.remove(&Value::int(7)).is_some());
        assert!(map.is_empty());
    }

    #[test]
    fn test_json_round_trip() {
        let json = serde_json::json!({"name": "Allen", "tags": [1, 2], "ok": true});
        let value = Value::from_json(&json);
        assert_eq!(value.to_json(), json);
    }
}
