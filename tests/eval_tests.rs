//! End-to-end expression evaluation against scopes, records and maps
use dynexpr::runtime::Func;
use dynexpr::{eval, prop_of_id, Context, Error, RecordType, Root, RootConfig, Scope, Type, Value};
use std::sync::Arc;

fn user_map() -> Value {
    Value::str_map(vec![(
        "user",
        Value::str_map(vec![(
            "getName",
            Value::func("getName", |_| Ok(Value::from("Allen"))),
        )]),
    )])
}

fn local_map() -> Value {
    Value::str_map(vec![(
        "local",
        Value::str_map(vec![("users", Value::any_list(vec![user_map()]))]),
    )])
}

/// Pointer to a record with fields `A`, `B`, a callable field `GetAge` and a
/// method `GetName(add)`
fn person() -> Value {
    let ty = RecordType::builder("testEval")
        .field("A", Type::INT)
        .field("B", Type::String)
        .field("GetAge", Type::Func)
        .method("GetName", |_recv, args| {
            let add = args.first().map(|v| v.as_string()).unwrap_or_default();
            Ok(Value::from(format!("Allen{}", add)))
        })
        .build();
    let rec = ty
        .instance()
        .with("A", 25i64)
        .unwrap()
        .with("B", "30")
        .unwrap()
        .with("GetAge", Value::func("GetAge", |_| Ok(Value::int(21))))
        .unwrap();
    Value::pointer(Value::from(rec))
}

fn isolated_scope(vars: Vec<Value>) -> (Arc<Root>, Scope) {
    let root = Arc::new(Root::new(RootConfig::default()));
    let mut scope = Scope::with_root(&root);
    scope.link(vars);
    (root, scope)
}

#[test]
fn test_call_through_map_selector() {
    let result = Scope::of([user_map()]).eval("user.getName()").unwrap();
    assert_eq!(result, Value::from("Allen"));
}

#[test]
fn test_call_through_index_chain() {
    let scope = Scope::of([local_map()]);
    assert_eq!(
        scope.eval("local.users[0]['user']['getName']()").unwrap(),
        Value::from("Allen")
    );
    assert_eq!(
        scope.eval("local.users[0].user['getName']()").unwrap(),
        Value::from("Allen")
    );
    assert_eq!(
        scope.eval(r#"local.users[0]["user"].getName()"#).unwrap(),
        Value::from("Allen")
    );
}

#[test]
fn test_callable_field() {
    let result = Scope::of([person()]).eval("GetAge()").unwrap();
    assert_eq!(result, Value::int(21));
}

#[test]
fn test_record_method() {
    let scope = Scope::of([person()]);
    assert_eq!(
        scope.eval("GetName(' is 21')").unwrap(),
        Value::from("Allen is 21")
    );
    assert_eq!(
        scope.eval("GetName(' is ' + A)").unwrap(),
        Value::from("Allen is 25")
    );
}

#[test]
fn test_unknown_method_fails() {
    let err = Scope::of([person()])
        .eval("GetName0(' is ' + A)")
        .unwrap_err();
    assert_eq!(
        err,
        Error::UndefinedMethod {
            name: "GetName0".into()
        }
    );
}

#[test]
fn test_bound_callable() {
    let mut scope = Scope::new();
    scope.bind(
        "getName",
        Value::func("getName", |args| {
            Ok(Value::from(format!("Allen{}", args[0].as_string())))
        }),
    );
    assert_eq!(
        scope.eval("getName(' is 21')").unwrap(),
        Value::from("Allen is 21")
    );
    assert!(scope.eval("getName0(' is 21')").is_err());
}

#[test]
fn test_field_reads() {
    let scope = Scope::of([person()]);
    assert_eq!(scope.eval("A * 2").unwrap(), Value::Int(dynexpr::runtime::IntWidth::W64, 50));
    assert_eq!(scope.eval("B + A").unwrap(), Value::from("3025"));
    assert_eq!(scope.eval("A > 20 && B == '30'").unwrap(), Value::Bool(true));
}

#[test]
fn test_non_callable_field_under_call() {
    let err = Scope::of([person()]).eval("A()").unwrap_err();
    assert!(matches!(err, Error::UndefinedMethod { .. }));
}

#[test]
fn test_typed_callable_coerces_arguments() {
    let mut scope = Scope::new();
    scope.bind(
        "add",
        Value::Func(Func::typed("add", vec![Type::INT, Type::INT], |args| {
            Ok(Value::int(args[0].as_i64()? + args[1].as_i64()?))
        })),
    );
    assert_eq!(scope.eval("add('40', 2)").unwrap(), Value::int(42));
    assert!(matches!(
        scope.eval("add(1)"),
        Err(Error::ArityMismatch { .. })
    ));
}

#[test]
fn test_parsed_tree_is_shared_between_scopes() {
    let (root, first) = isolated_scope(vec![person()]);
    first.eval("GetAge()").unwrap();
    let cached = root.cache().get(&"GetAge()".to_string()).unwrap();

    let mut second = Scope::with_root(&root);
    second.bind("GetAge", Value::func("GetAge", |_| Ok(Value::int(7))));
    assert_eq!(second.eval("GetAge()").unwrap(), Value::int(7));
    let again = root.cache().get(&"GetAge()".to_string()).unwrap();
    assert!(Arc::ptr_eq(&cached, &again));
    assert_eq!(root.cache().len(), 1);
}

#[test]
fn test_cache_key_is_normalized_text() {
    let (root, scope) = isolated_scope(vec![]);
    scope.eval("  'a' + 'b'  ").unwrap();
    scope.eval("\"a\" + \"b\"").unwrap();
    assert_eq!(root.cache().len(), 1);
    assert!(root.cache().get(&"\"a\" + \"b\"".to_string()).is_some());
}

#[test]
fn test_resized_cache_starts_empty() {
    let (root, scope) = isolated_scope(vec![]);
    scope.eval("1 + 1").unwrap();
    root.set_cache_size(2);
    assert!(root.cache().is_empty());
    for text in ["1", "2", "3"] {
        scope.eval(text).unwrap();
    }
    assert_eq!(root.cache().len(), 2);
}

#[test]
fn test_root_eval_uses_top_scope() {
    let root = Arc::new(Root::new(RootConfig::default()));
    root.top_mut().bind("name", "top");
    assert_eq!(root.eval("name + '!'").unwrap(), Value::from("top!"));
    assert_eq!(root.cache().len(), 1);

    let scope = Scope::with_root(&root);
    assert_eq!(scope.eval("name").unwrap(), Value::from("top"));
}

#[test]
fn test_free_eval_without_context() {
    assert_eq!(eval("2 * (3 + 4)", None).unwrap(), Value::Int(dynexpr::runtime::IntWidth::W64, 14));
    assert_eq!(eval("", None), Err(Error::EmptyExpression));
}

/// Context resolving names against a tree node's children, with caching disabled
struct Node {
    attrs: Value,
}

impl Context for Node {
    fn value_of(&self, name: &str) -> Option<Value> {
        prop_of_id(&self.attrs, name)
    }

    fn method_of(&self, _name: &str) -> Option<Value> {
        None
    }
}

#[test]
fn test_custom_context() {
    let node = Node {
        attrs: Value::str_map(vec![("id", Value::from("n1")), ("depth", Value::int(3))]),
    };
    assert_eq!(
        eval("id + ':' + depth", Some(&node)).unwrap(),
        Value::from("n1:3")
    );
    assert_eq!(eval("depth >= 3", Some(&node)).unwrap(), Value::Bool(true));
}

#[test]
fn test_backup_restore_around_evaluation() {
    let (_root, mut scope) = isolated_scope(vec![]);
    scope.bind("item", 1i64);
    scope.backup("item").bind("item", 2i64);
    assert_eq!(scope.eval("item + 1").unwrap(), Value::Int(dynexpr::runtime::IntWidth::W64, 3));
    scope.restore("item");
    assert_eq!(scope.eval("item + 1").unwrap(), Value::Int(dynexpr::runtime::IntWidth::W64, 2));
}

#[test]
fn test_deeply_nested_expressions() {
    let (_root, scope) = isolated_scope(vec![]);
    let nested = format!("{}1 + 1{}", "(".repeat(200), ")".repeat(200));
    assert_eq!(scope.eval(&nested).unwrap().as_i64().unwrap(), 2);

    let runaway = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
    assert!(matches!(scope.eval(&runaway), Err(Error::SyntaxError { .. })));
    let negations = format!("{}true", "!".repeat(200_000));
    assert!(matches!(scope.eval(&negations), Err(Error::SyntaxError { .. })));
}

#[test]
fn test_hex_literals_with_prefix_like_digits() {
    let (_root, scope) = isolated_scope(vec![]);
    assert_eq!(scope.eval("0x0b + 1").unwrap().as_i64().unwrap(), 12);
    assert_eq!(scope.eval("0xa0b1").unwrap().as_i64().unwrap(), 0xa0b1);
    assert_eq!(scope.eval("0x0b.8").unwrap().as_f64().unwrap(), 11.5);
}
