//! Declared record types, record instances and host callables

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::runtime::access::zero_of;
use crate::runtime::coerce::as_of;
use crate::runtime::value::{Type, Value};

/// Host closure backing a callable
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;

/// Host closure backing a record method; receives the record (or a pointer to it)
pub type MethodFn = dyn Fn(&Value, &[Value]) -> Result<Value> + Send + Sync;

/// Callable value
#[derive(Clone)]
pub struct Func {
    name: String,
    params: Option<Vec<Type>>,
    inner: Arc<NativeFn>,
}

impl Func {
    /// Variadic callable; arguments are passed through untouched
    pub fn new(
        name: impl Into<String>,
        f: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Func {
            name: name.into(),
            params: None,
            inner: Arc::new(f),
        }
    }

    /// Callable with declared parameter types; arguments are coerced before the call
    pub fn typed(
        name: impl Into<String>,
        params: Vec<Type>,
        f: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Func {
            name: name.into(),
            params: Some(params),
            inner: Arc::new(f),
        }
    }

    /// Name used in diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter types, if any
    pub fn params(&self) -> Option<&[Type]> {
        self.params.as_deref()
    }

    /// Invokes the callable
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        match &self.params {
            None => (self.inner)(args),
            Some(params) => {
                if params.len() != args.len() {
                    return Err(Error::ArityMismatch {
                        name: self.name.clone(),
                        expected: params.len(),
                        got: args.len(),
                    });
                }
                let coerced = params
                    .iter()
                    .zip(args)
                    .map(|(ty, arg)| as_of(ty, arg))
                    .collect::<Result<Vec<_>>>()?;
                (self.inner)(&coerced)
            }
        }
    }

    /// True when both values wrap the same closure
    pub fn same_fn(&self, other: &Func) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Func({})", self.name)
    }
}

/// Field declaration of a record type
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Declared type
    pub ty: Type,
    /// Visible to path access, merge and JSON rendering
    pub exported: bool,
}

/// Declared record type: ordered fields plus named methods
pub struct RecordType {
    name: String,
    fields: Vec<FieldDef>,
    methods: HashMap<String, Arc<MethodFn>>,
}

impl RecordType {
    /// Starts a record type declaration
    pub fn builder(name: impl Into<String>) -> RecordTypeBuilder {
        RecordTypeBuilder {
            ty: RecordType {
                name: name.into(),
                fields: Vec::new(),
                methods: HashMap::new(),
            },
        }
    }

    /// Type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field declarations in order
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Index of the field called `name`
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Method called `name`
    pub fn method(&self, name: &str) -> Option<&Arc<MethodFn>> {
        self.methods.get(name)
    }

    /// Zero-valued instance
    pub fn instance(self: &Arc<Self>) -> Record {
        Record::new(self.clone())
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other) || (self.name == other.name && self.fields == other.fields)
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut methods: Vec<&String> = self.methods.keys().collect();
        methods.sort();
        f.debug_struct("RecordType")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("methods", &methods)
            .finish()
    }
}

/// Builder for [`RecordType`]
pub struct RecordTypeBuilder {
    ty: RecordType,
}

impl RecordTypeBuilder {
    /// Adds an exported field
    pub fn field(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.ty.fields.push(FieldDef {
            name: name.into(),
            ty,
            exported: true,
        });
        self
    }

    /// Adds an unexported field; hidden from path access and zeroed by clone
    pub fn private_field(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.ty.fields.push(FieldDef {
            name: name.into(),
            ty,
            exported: false,
        });
        self
    }

    /// Adds a method
    pub fn method(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&Value, &[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.ty.methods.insert(name.into(), Arc::new(f));
        self
    }

    /// Finishes the declaration
    pub fn build(self) -> Arc<RecordType> {
        Arc::new(self.ty)
    }
}

/// Instance of a record type
#[derive(Debug, Clone)]
pub struct Record {
    ty: Arc<RecordType>,
    fields: Arc<Vec<Value>>,
}

impl Record {
    /// Zero-valued instance of `ty`
    pub fn new(ty: Arc<RecordType>) -> Self {
        let fields = ty.fields.iter().map(|f| zero_of(&f.ty)).collect();
        Record {
            ty,
            fields: Arc::new(fields),
        }
    }

    /// Instance from field values already of their declared types
    pub(crate) fn from_parts(ty: Arc<RecordType>, fields: Vec<Value>) -> Self {
        Record {
            ty,
            fields: Arc::new(fields),
        }
    }

    /// Builder-style field assignment
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Result<Self> {
        self.set(name, &value.into())?;
        Ok(self)
    }

    /// Record type
    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.ty
    }

    /// All field values in declaration order
    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    /// Field called `name`, exported or not
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.ty.field_index(name).map(|i| &self.fields[i])
    }

    /// Exported field called `name`
    pub fn get_exported(&self, name: &str) -> Option<&Value> {
        let i = self.ty.field_index(name)?;
        if self.ty.fields[i].exported {
            Some(&self.fields[i])
        } else {
            None
        }
    }

    /// Assigns field `name`, coercing into its declared type
    pub fn set(&mut self, name: &str, value: &Value) -> Result<()> {
        let i = self.ty.field_index(name).ok_or_else(|| {
            Error::runtime(format!("{} has no field {}", self.ty.name, name))
        })?;
        let coerced = as_of(&self.ty.fields[i].ty, value)?;
        Arc::make_mut(&mut self.fields)[i] = coerced;
        Ok(())
    }

    /// Exported `(name, value)` pairs in declaration order
    pub fn exported(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.ty
            .fields
            .iter()
            .zip(self.fields.iter())
            .filter(|(def, _)| def.exported)
            .map(|(def, v)| (def.name.as_str(), v))
    }

    pub(crate) fn fields_mut(&mut self) -> &mut Vec<Value> {
        Arc::make_mut(&mut self.fields)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && self.fields == other.fields
    }
}
