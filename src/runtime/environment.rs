//! Name resolution environments for expression evaluation
//!
//! A [`Scope`] resolves identifiers against its own bindings, then against
//! linked delegate objects, then against the top scope of its [`Root`]. The
//! root also owns the expression cache shared by every scope created from it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};

use crate::cache::{new_cache, Cache, CachePolicy};
use crate::error::Result;
use crate::parser::Expr;
use crate::runtime::access::{
    indirect_type, is_func, is_nil, method_of_id, prop_of_id, unwrap_any,
};
use crate::runtime::evaluator;
use crate::runtime::structural::merge;
use crate::runtime::value::{Map, Type, Value};

/// Capabilities the evaluator needs from its surroundings
///
/// Any type can stand in for a [`Scope`]. The cache methods default to a
/// permanent miss, which disables tree caching for that context.
pub trait Context {
    /// Resolves a plain value by (possibly dotted) name
    fn value_of(&self, name: &str) -> Option<Value>;

    /// Resolves a callable by (possibly dotted) name
    fn method_of(&self, name: &str) -> Option<Value>;

    /// Looks up a parsed tree for normalized expression text
    fn cache_of(&self, _text: &str) -> Option<Arc<Expr>> {
        None
    }

    /// Remembers a parsed tree for normalized expression text
    fn cache(&self, _text: &str, _expr: Arc<Expr>) {}
}

/// Root configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootConfig {
    /// Capacity of the shared expression cache (0 = unbounded)
    pub cache_size: usize,
    /// Eviction policy of the shared expression cache
    pub cache_policy: CachePolicy,
}

impl Default for RootConfig {
    fn default() -> Self {
        RootConfig {
            cache_size: 1000,
            cache_policy: CachePolicy::Lru,
        }
    }
}

type ExprCache = Arc<dyn Cache<String, Arc<Expr>>>;

/// Owner of a top scope and the expression cache behind it
pub struct Root {
    top: RwLock<Scope>,
    cache: RwLock<ExprCache>,
    policy: CachePolicy,
}

lazy_static::lazy_static! {
    /// Process-wide default root used by `Scope::new` and the free `eval`
    static ref GLOBAL_ROOT: Arc<Root> = Arc::new(Root::new(RootConfig::default()));
}

impl Root {
    /// Creates a root with an empty top scope
    pub fn new(config: RootConfig) -> Self {
        Root {
            top: RwLock::new(Scope::top()),
            cache: RwLock::new(new_cache(config.cache_policy, config.cache_size)),
            policy: config.cache_policy,
        }
    }

    /// Process-wide default root
    pub fn global() -> Arc<Root> {
        GLOBAL_ROOT.clone()
    }

    /// Current configuration
    pub fn config(&self) -> RootConfig {
        RootConfig {
            cache_size: self.cache.read().capacity(),
            cache_policy: self.policy,
        }
    }

    /// Read access to the top scope
    pub fn top(&self) -> RwLockReadGuard<'_, Scope> {
        self.top.read_recursive()
    }

    /// Write access to the top scope, e.g. to bind process-wide names.
    ///
    /// Blocks while any guard from [`Root::top`] is alive on this root.
    pub fn top_mut(&self) -> RwLockWriteGuard<'_, Scope> {
        self.top.write()
    }

    /// Current expression cache.
    ///
    /// A handle fetched before [`Root::set_cache_size`] keeps pointing at the
    /// replaced cache.
    pub fn cache(&self) -> ExprCache {
        self.cache.read().clone()
    }

    /// Replaces the expression cache with an empty one of capacity `size`
    pub fn set_cache_size(&self, size: usize) {
        *self.cache.write() = new_cache(self.policy, size);
        tracing::info!(size, policy = ?self.policy, "expression cache replaced");
    }

    /// Evaluates `text` against a snapshot of the top scope.
    ///
    /// No lock is held while the expression runs, so callables may rebind
    /// names through [`Root::top_mut`]; the change is seen by later evaluations.
    pub fn eval(&self, text: &str) -> Result<Value> {
        let top = self.top().clone();
        let ctx = TopContext {
            root: self,
            top: &top,
        };
        evaluator::eval(text, Some(&ctx))
    }
}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let cache = self.cache.read();
        f.debug_struct("Root")
            .field("policy", &self.policy)
            .field("cache_size", &cache.capacity())
            .field("cached", &cache.len())
            .finish()
    }
}

/// The top scope seen through its root, so top-level evaluation is cached too
struct TopContext<'a> {
    root: &'a Root,
    top: &'a Scope,
}

impl Context for TopContext<'_> {
    fn value_of(&self, name: &str) -> Option<Value> {
        self.top.value_of(name)
    }

    fn method_of(&self, name: &str) -> Option<Value> {
        self.top.method_of(name)
    }

    fn cache_of(&self, text: &str) -> Option<Arc<Expr>> {
        self.root.cache().get(&text.to_string())
    }

    fn cache(&self, text: &str, expr: Arc<Expr>) {
        self.root.cache().put(text.to_string(), expr);
    }
}

/// Replaces the default root's expression cache with one of capacity `size`
pub fn set_cache_size(size: usize) {
    GLOBAL_ROOT.set_cache_size(size);
}

/// Mutable naming environment
#[derive(Debug, Clone)]
pub struct Scope {
    /// Plain bindings, a `map[string]any`
    binds: Map,
    /// Values saved by `backup`, keyed by binding name
    backup: HashMap<String, Value>,
    /// Callable bindings
    callers: HashMap<String, Value>,
    /// Delegate objects, consulted in order
    vars: Vec<Value>,
    /// Owning root; `None` only for a root's own top scope
    root: Option<Arc<Root>>,
}

impl Scope {
    /// Empty scope chained to the default root
    pub fn new() -> Self {
        Scope::with_root(&Root::global())
    }

    /// Empty scope chained to `root`
    pub fn with_root(root: &Arc<Root>) -> Self {
        Scope {
            root: Some(root.clone()),
            ..Scope::top()
        }
    }

    /// Scope chained to the default root with `vars` linked as delegates
    pub fn of(vars: impl IntoIterator<Item = Value>) -> Self {
        let mut scope = Scope::new();
        scope.vars = vars.into_iter().collect();
        scope
    }

    fn top() -> Self {
        Scope {
            binds: Map::new(Type::String, Type::Any),
            backup: HashMap::new(),
            callers: HashMap::new(),
            vars: Vec::new(),
            root: None,
        }
    }

    /// True for a root's top scope, which has nothing to fall back to
    pub fn is_top(&self) -> bool {
        self.root.is_none()
    }

    /// Root this scope falls back to
    pub fn root(&self) -> Option<&Arc<Root>> {
        self.root.as_ref()
    }

    /// Delegate objects in lookup order
    pub fn vars(&self) -> &[Value] {
        &self.vars
    }

    /// Binds `name`; callables go to the callable bindings
    pub fn bind(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        if is_func(&value) {
            self.callers.insert(name.to_string(), unwrap_any(&value).clone());
        } else {
            self.binds.put_any(name, value);
        }
        self
    }

    /// Removes the binding of `name`
    pub fn unbind(&mut self, name: &str) -> &mut Self {
        self.binds.remove(&Value::from(name));
        self.callers.remove(name);
        self
    }

    /// Saves the current binding of `name`, if any, for a later `restore`
    pub fn backup(&mut self, name: &str) -> &mut Self {
        if let Some(val) = self.binds.get(&Value::from(name)) {
            let val = unwrap_any(val).clone();
            self.backup.insert(name.to_string(), val);
        }
        self
    }

    /// Puts back the binding saved by `backup`
    pub fn restore(&mut self, name: &str) -> &mut Self {
        if let Some(val) = self.backup.remove(name) {
            self.binds.put_any(name, val);
        }
        self
    }

    /// Prepends delegate objects, keeping their given order
    pub fn link(&mut self, items: impl IntoIterator<Item = Value>) -> &mut Self {
        let mut vars: Vec<Value> = items.into_iter().collect();
        if vars.is_empty() {
            return self;
        }
        vars.append(&mut self.vars);
        self.vars = vars;
        self
    }

    /// Removes the first delegate that is `obj`: the same target for pointers,
    /// an equal value otherwise
    pub fn unlink(&mut self, obj: &Value) -> &mut Self {
        if let Some(index) = self.vars.iter().position(|v| same_object(v, obj)) {
            self.vars.remove(index);
        }
        self
    }

    /// Absorbs a value: a `map[string]any` merges into the bindings, anything
    /// else non-nil is linked as a delegate
    pub fn merge(&mut self, value: &Value) -> Result<&mut Self> {
        if is_nil(value) {
            return Ok(self);
        }
        if indirect_type(value) == self.binds_type() {
            let mut binds = Value::Map(self.binds.clone());
            merge(&mut binds, value)?;
            if let Value::Map(map) = binds {
                self.binds = map;
            }
        } else {
            self.link([value.clone()]);
        }
        Ok(self)
    }

    /// Absorbs another scope's bindings and delegates
    pub fn merge_scope(&mut self, other: &Scope) -> Result<&mut Self> {
        let mut binds = Value::Map(self.binds.clone());
        merge(&mut binds, &Value::Map(other.binds.clone()))?;
        if let Value::Map(map) = binds {
            self.binds = map;
        }
        for (name, func) in &other.callers {
            self.callers.insert(name.clone(), func.clone());
        }
        for item in &other.vars {
            self.link([item.clone()]);
        }
        Ok(self)
    }

    /// Evaluates `text` in this scope
    pub fn eval(&self, text: &str) -> Result<Value> {
        evaluator::eval(text, Some(self))
    }

    fn binds_type(&self) -> Type {
        Type::map_of(Type::String, Type::Any)
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::new()
    }
}

impl Context for Scope {
    fn value_of(&self, name: &str) -> Option<Value> {
        if let Some(val) = prop_of_id(&Value::Map(self.binds.clone()), name) {
            return Some(val);
        }
        for obj in &self.vars {
            if let Some(val) = prop_of_id(obj, name) {
                return Some(val);
            }
        }
        let root = self.root.as_ref()?;
        let top = root.top();
        top.value_of(name)
    }

    fn method_of(&self, name: &str) -> Option<Value> {
        for obj in &self.vars {
            if let Some(method) = method_of_id(obj, name) {
                return Some(method);
            }
        }
        if let Some(method) = self.callers.get(name) {
            return Some(method.clone());
        }
        let root = self.root.as_ref()?;
        let top = root.top();
        top.method_of(name)
    }

    fn cache_of(&self, text: &str) -> Option<Arc<Expr>> {
        self.root.as_ref()?.cache().get(&text.to_string())
    }

    fn cache(&self, text: &str, expr: Arc<Expr>) {
        if let Some(root) = &self.root {
            root.cache().put(text.to_string(), expr);
        }
    }
}

fn same_object(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Pointer(p), Value::Pointer(q)) => p.same_target(q),
        (Value::Pointer(_), _) | (_, Value::Pointer(_)) => false,
        _ => a == b,
    }
}
