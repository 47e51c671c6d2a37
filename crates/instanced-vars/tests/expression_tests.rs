//! Bound expression tests

use instanced_vars::*;
use pretty_assertions::assert_eq;

fn instanced_pair(a: f32, b: f32) -> (ValuePrototype<f32>, ValuePrototype<f32>, OwnerKey) {
    let owner = OwnerKey::new("calculator");
    let proto_a = ValuePrototype::new("a", 0.0);
    let proto_b = ValuePrototype::new("b", 0.0);

    Reference::instanced(proto_a.clone(), owner.clone()).set_value(a);
    Reference::instanced(proto_b.clone(), owner.clone()).set_value(b);

    (proto_a, proto_b, owner)
}

fn bound(
    source: &str,
    a: &ValuePrototype<f32>,
    b: &ValuePrototype<f32>,
    owner: &OwnerKey,
) -> BoundExpression<f32> {
    let mut expr = BoundExpression::new(source);
    expr.bind("a", Reference::instanced(a.clone(), owner.clone()));
    expr.bind("b", Reference::instanced(b.clone(), owner.clone()));
    expr
}

// ═══════════════════════════════════════════════════════════════════════
// Operators
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_operators_over_instanced_references() {
    let (a, b, owner) = instanced_pair(10.0, 2.0);

    let cases = [
        ("a + b", 12.0),
        ("a - b", 8.0),
        ("a * b", 20.0),
        ("a / b", 5.0),
        ("a ^ b", 100.0),
        ("((a + b) / 2) - b", 4.0),
    ];

    for (source, expected) in cases {
        let expr = bound(source, &a, &b, &owner);
        assert_eq!(expr.value().unwrap(), expected, "{}", source);
    }
}

#[test]
fn test_instances_are_independent_of_prototype_values() {
    let (a, b, owner) = instanced_pair(10.0, 2.0);
    a.set_value(1000.0);

    let expr = bound("a + b", &a, &b, &owner);

    assert_eq!(expr.value().unwrap(), 12.0);
}

#[test]
fn test_value_tracks_reference_changes() {
    let (a, b, owner) = instanced_pair(10.0, 2.0);
    let expr = bound("a * b", &a, &b, &owner);
    assert_eq!(expr.value().unwrap(), 20.0);

    a.get_instance(&owner).unwrap().set_value(3.0);

    assert_eq!(expr.value().unwrap(), 6.0);
}

#[test]
fn test_integer_results_truncate() {
    let mut expr = BoundExpression::new("a / b");
    expr.bind("a", Reference::constant(7));
    expr.bind("b", Reference::constant(2));

    assert_eq!(expr.value().unwrap(), 3);
}

#[test]
fn test_mixed_modes() {
    let shared = ValuePrototype::new("base", 4.0_f64);
    let mut expr = BoundExpression::new("-base + bonus * 2");
    expr.bind("base", Reference::shared(shared.clone()));
    expr.bind("bonus", Reference::constant(1.5));

    assert_eq!(expr.value().unwrap(), -1.0);
    shared.set_value(0.0);
    assert_eq!(expr.value().unwrap(), 3.0);
}

// ═══════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_unbound_name_is_an_error() {
    let mut expr = BoundExpression::new("a + c");
    expr.bind("a", Reference::constant(1.0_f64));

    assert_eq!(
        expr.value(),
        Err(ExpressionError::UnknownIdentifier {
            name: "c".to_string()
        })
    );
    assert_eq!(expr.unbound_names().unwrap(), vec!["c".to_string()]);
}

#[test]
fn test_syntax_errors() {
    let expr = BoundExpression::<f64>::new("(1 + 2");
    assert!(matches!(
        expr.value(),
        Err(ExpressionError::UnexpectedEnd { .. })
    ));

    let expr = BoundExpression::<f64>::new("1 $ 2");
    assert!(matches!(
        expr.value(),
        Err(ExpressionError::UnexpectedCharacter { ch: '$', .. })
    ));

    let expr = BoundExpression::<f64>::new("1 2");
    assert!(matches!(
        expr.value(),
        Err(ExpressionError::UnexpectedToken { .. })
    ));
}

#[test]
fn test_division_by_zero() {
    let mut expr = BoundExpression::new("a / b");
    expr.bind("a", Reference::constant(1.0_f64));
    expr.bind("b", Reference::constant(0.0));

    assert_eq!(expr.value(), Err(ExpressionError::DivisionByZero));
}

#[test]
fn test_nesting_limit_from_config() {
    let expr = BoundExpression::<f64>::with_config(
        "((((1))))",
        ExpressionConfig::with_max_depth(2),
    );

    assert!(matches!(
        expr.value(),
        Err(ExpressionError::NestingTooDeep { max: 2, .. })
    ));
}

#[test]
fn test_integer_overflow_is_an_error() {
    let mut expr = BoundExpression::new("a ^ b");
    expr.bind("a", Reference::constant(2));
    expr.bind("b", Reference::constant(40));

    assert!(matches!(
        expr.value(),
        Err(ExpressionError::NotRepresentable { value, .. }) if value == 2f64.powi(40)
    ));

    expr.bind("b", Reference::constant(30));
    assert_eq!(expr.value().unwrap(), 1 << 30);
}

#[test]
fn test_nan_is_an_error_for_integers_only() {
    let mut ints = BoundExpression::new("(0 - a) ^ 0.5");
    ints.bind("a", Reference::constant(4_i64));
    assert!(matches!(
        ints.value(),
        Err(ExpressionError::NotRepresentable { .. })
    ));

    let mut floats = BoundExpression::new("(0 - a) ^ 0.5");
    floats.bind("a", Reference::constant(4.0_f64));
    assert!(floats.value().unwrap().is_nan());
}

#[test]
fn test_long_flat_chain_is_rejected() {
    let source = vec!["a"; 20_000].join(" + ");
    let mut expr = BoundExpression::new(source);
    expr.bind("a", Reference::constant(1.0_f64));

    assert!(matches!(
        expr.value(),
        Err(ExpressionError::NestingTooDeep { .. })
    ));

    let mixed = vec!["a * a"; 5_000].join(" - ");
    expr.set_expression(mixed);
    assert!(matches!(
        expr.value(),
        Err(ExpressionError::NestingTooDeep { .. })
    ));
}

#[test]
fn test_chain_within_limit_evaluates() {
    let source = vec!["a"; 200].join(" + ");
    let mut expr = BoundExpression::new(source);
    expr.bind("a", Reference::constant(1.0_f64));

    assert_eq!(expr.value().unwrap(), 200.0);

    let wide = vec!["a"; 1_000].join(" + ");
    let mut limited =
        BoundExpression::with_config(wide, ExpressionConfig::with_max_depth(1_000));
    limited.bind("a", Reference::constant(1.0_f64));
    assert_eq!(limited.value().unwrap(), 1_000.0);
}

// ═══════════════════════════════════════════════════════════════════════
// Bindings and Caching
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_unbind_and_rebind() {
    let mut expr = BoundExpression::new("x + 1");
    expr.bind("x", Reference::constant(1));
    assert_eq!(expr.value().unwrap(), 2);

    assert!(expr.unbind("x").is_some());
    assert!(expr.value().is_err());

    expr.bind("x", Reference::constant(41));
    assert_eq!(expr.value().unwrap(), 42);
    assert_eq!(
        expr.bindings().map(|(name, _)| name).collect::<Vec<_>>(),
        vec!["x"]
    );
}

#[test]
fn test_caching_fans_out_to_bindings() {
    let (a, b, owner) = instanced_pair(10.0, 2.0);
    let expr = bound("a - b", &a, &b, &owner);

    expr.enable_caching();
    assert!(expr.binding("a").unwrap().is_caching());
    assert!(expr.binding("b").unwrap().is_caching());

    b.get_instance(&owner).unwrap().set_value(5.0);
    assert_eq!(expr.value().unwrap(), 5.0);

    expr.dispose();
    assert!(!expr.binding("a").unwrap().is_caching());
    assert_eq!(a.get_instance(&owner).unwrap().listener_count(), 0);
}
