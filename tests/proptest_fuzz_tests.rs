//! Property-based fuzzing tests for the scanner, parser, evaluator and caches
//!
//! These tests use proptest to generate random inputs and verify that:
//! 1. Scanning, parsing and evaluation never panic on arbitrary input
//! 2. Numeric literal parsing agrees with Rust's own formatting
//! 3. Arithmetic on literals matches 64-bit wrapping integer math
//! 4. Insertion-order caches keep exactly the last inserted keys

use dynexpr::cache::{Cache, SimpleCache};
use dynexpr::conv::{parse_float, parse_int};
use dynexpr::lexer::{normalize_quotes, Scanner};
use dynexpr::parser::{parse_expr, Parser};
use dynexpr::runtime::IntWidth;
use dynexpr::{eval, Root, RootConfig, Scope, Value};
use proptest::prelude::*;
use std::sync::Arc;

// =============================================================================
// STRATEGY GENERATORS
// =============================================================================

/// Generate random strings that might break the scanner
fn arbitrary_source_string() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[\x20-\x7E]{0,200}").unwrap()
}

/// Generate token soup that looks like expressions
fn expr_like_string() -> impl Strategy<Value = String> {
    prop::collection::vec(expr_token(), 0..40).prop_map(|tokens| tokens.join(" "))
}

fn expr_token() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("(".to_string()),
        Just(")".to_string()),
        Just("[".to_string()),
        Just("]".to_string()),
        Just(".".to_string()),
        Just(",".to_string()),
        Just("+".to_string()),
        Just("-".to_string()),
        Just("*".to_string()),
        Just("/".to_string()),
        Just("%".to_string()),
        Just("&&".to_string()),
        Just("||".to_string()),
        Just("!".to_string()),
        Just("==".to_string()),
        Just("<=".to_string()),
        Just("<<".to_string()),
        Just("&^".to_string()),
        Just("nil".to_string()),
        Just("true".to_string()),
        (-1000i64..1000i64).prop_map(|n| n.to_string()),
        (0.0f64..100.0f64).prop_map(|f| format!("{:.2}", f)),
        "'[a-z ]{0,10}'".prop_map(|s| s),
        r#""[a-z ]{0,10}""#.prop_map(|s| s),
        "[a-z][a-z0-9_]{0,8}".prop_map(|s| s),
    ]
}

fn isolated_scope() -> Scope {
    Scope::with_root(&Arc::new(Root::new(RootConfig::default())))
}

// =============================================================================
// SCANNER / PARSER ROBUSTNESS
// =============================================================================

proptest! {
    /// The scanner should never panic on arbitrary input
    #[test]
    fn scanner_never_panics(source in arbitrary_source_string()) {
        let _ = Scanner::new(&source).scan_tokens();
    }

    /// Quote normalization never panics and keeps quote-free text unchanged
    #[test]
    fn normalize_quotes_is_total(source in arbitrary_source_string()) {
        let normalized = normalize_quotes(&source);
        if !source.contains('\'') && !source.contains('"') {
            prop_assert_eq!(normalized, source);
        }
    }

    /// The parser should never panic on expression-like token soup
    #[test]
    fn parser_never_panics(source in expr_like_string()) {
        if let Ok(tokens) = Scanner::new(&source).scan_tokens() {
            let _ = Parser::new(tokens).parse();
        }
    }

    /// Deeply parenthesized expressions parse
    #[test]
    fn parser_handles_deep_nesting(depth in 1usize..64) {
        let source = format!("{}1 + 1{}", "(".repeat(depth), ")".repeat(depth));
        prop_assert!(parse_expr(&source).is_ok());
    }

    /// Evaluation reports failures instead of panicking
    #[test]
    fn eval_never_panics(source in expr_like_string()) {
        let _ = isolated_scope().eval(&source);
    }
}

// =============================================================================
// NUMERIC PROPERTIES
// =============================================================================

proptest! {
    /// Decimal formatting round-trips through integer parsing
    #[test]
    fn parse_int_matches_decimal(n in any::<i64>()) {
        prop_assert_eq!(parse_int(&n.to_string()), n);
    }

    /// Hex and binary prefixes select their base
    #[test]
    fn parse_int_matches_prefixed(n in 0i64..i64::MAX) {
        prop_assert_eq!(parse_int(&format!("0x{:x}", n)), n);
        prop_assert_eq!(parse_int(&format!("0b{:b}", n)), n);
        prop_assert_eq!(parse_int(&format!("0o{:o}", n)), n);
    }

    /// Short decimal fractions parse to the nearest float
    #[test]
    fn parse_float_matches_std(int in 0u32..100_000, frac in 0u32..10_000) {
        let text = format!("{}.{:04}", int, frac);
        let expected: f64 = text.parse().unwrap();
        prop_assert_eq!(parse_float(&text), expected);
    }

    /// Literal arithmetic follows 64-bit wrapping integer math
    #[test]
    fn eval_int_arithmetic(a in -1_000_000i64..1_000_000, b in 1i64..1000) {
        let scope = isolated_scope();
        let sum = scope.eval(&format!("{} + {}", a, b)).unwrap();
        prop_assert_eq!(sum, Value::Int(IntWidth::W64, a + b));
        let quo = scope.eval(&format!("{} / {}", a, b)).unwrap();
        prop_assert_eq!(quo, Value::Int(IntWidth::W64, a / b));
        let rem = scope.eval(&format!("({}) % {}", a, b)).unwrap();
        prop_assert_eq!(rem, Value::Int(IntWidth::W64, a % b));
    }

    /// Comparisons agree with integer ordering
    #[test]
    fn eval_comparisons(a in any::<i32>(), b in any::<i32>()) {
        let lt = eval(&format!("{} < {}", a, b), None).unwrap();
        prop_assert_eq!(lt, Value::Bool(a < b));
        let ge = eval(&format!("{} >= {}", a, b), None).unwrap();
        prop_assert_eq!(ge, Value::Bool(a >= b));
    }
}

// =============================================================================
// CACHE PROPERTIES
// =============================================================================

proptest! {
    /// After M > N distinct inserts an insertion-order cache holds the last N
    #[test]
    fn fifo_keeps_last_n(capacity in 1usize..32, extra in 1usize..64) {
        let cache = SimpleCache::new(capacity);
        let total = capacity + extra;
        for key in 0..total {
            cache.put(key, key);
        }
        prop_assert_eq!(cache.len(), capacity);
        prop_assert_eq!(cache.keys(), (extra..total).collect::<Vec<_>>());
    }
}
