//! Dynamic values, path access and expression evaluation

pub mod access;
pub mod coerce;
mod environment;
mod evaluator;
mod record;
pub mod structural;
mod value;

pub use access::{
    field_of, indirect, method_of, method_of_id, prop_of, prop_of_id, set, set_by_id, zero_of,
};
pub use coerce::{as_bool, as_of, as_string, assign};
pub use environment::{set_cache_size, Context, Root, RootConfig, Scope};
pub use evaluator::{eval, eval_expr, Stack, Target};
pub use record::{FieldDef, Func, MethodFn, NativeFn, Record, RecordType, RecordTypeBuilder};
pub use structural::{clone_into, cmp, deep_copy, merge};
pub use value::{FloatWidth, IntWidth, Kind, List, Map, MapKey, Pointer, Type, Value};
