use hyterm::prelude::*;

fn arithmetic() -> Environment {
    let env = Environment::new();
    let infix = |symbol: &str, attributes: BoundAttributes| {
        env.mutable_bind_with(symbol, unspecified(), attributes, unspecified());
    };
    infix("+", BoundAttributes::infix_left(BoundPrecedence::ADDITION));
    infix("-", BoundAttributes::infix_left(BoundPrecedence::ADDITION));
    infix("*", BoundAttributes::infix_left(BoundPrecedence::MULTIPLY));
    infix("->", BoundAttributes::infix_right(BoundPrecedence::LAMBDA));
    env
}

/// Left-nested juxtaposition, the shape a parser produces for `a b c ...`.
fn spine(items: &[&str]) -> Expr {
    let mut iter = items.iter().map(|item| variable(*item));
    let head = iter.next().unwrap();
    iter.fold(head, apply)
}

fn transposed(env: &Environment, expr: &Expr) -> String {
    let mut ctx = env.context();
    ctx.transpose(expr)
        .unwrap()
        .into_expr()
        .pretty_string(PrettyMode::Minimum)
}

#[test]
fn multiplication_binds_tighter() {
    let env = arithmetic();
    assert_eq!(
        transposed(&env, &spine(&["a", "+", "b", "*", "c"])),
        "+ a (* b c)"
    );
    assert_eq!(
        transposed(&env, &spine(&["a", "*", "b", "+", "c"])),
        "+ (* a b) c"
    );
}

#[test]
fn equal_precedence_follows_associativity() {
    let env = arithmetic();
    assert_eq!(
        transposed(&env, &spine(&["a", "-", "b", "-", "c"])),
        "- (- a b) c"
    );
    assert_eq!(
        transposed(&env, &spine(&["a", "->", "b", "->", "c"])),
        "-> a (-> b c)"
    );
}

#[test]
fn juxtaposition_binds_tightest() {
    let env = arithmetic();
    assert_eq!(
        transposed(&env, &spine(&["f", "x", "+", "g", "y"])),
        "+ (f x) (g y)"
    );
}

#[test]
fn operator_in_head_position_is_prefix() {
    let env = arithmetic();
    let expr = spine(&["+", "a", "b"]);
    let mut ctx = env.context();
    let rewrite = ctx.transpose(&expr).unwrap();
    assert!(!rewrite.changed());
    assert!(rewrite.expr().ptr_eq(&expr));
}

#[test]
fn trailing_operator_is_a_section() {
    let env = arithmetic();
    assert_eq!(transposed(&env, &spine(&["a", "+"])), "+ a");
    assert_eq!(transposed(&env, &spine(&["a", "*", "b", "+"])), "+ (* a b)");
}

#[test]
fn parameters_hide_operators() {
    let env = arithmetic();
    let expr = lambda(bound("+"), spine(&["a", "+", "b"]));
    let mut ctx = env.context();
    let rewrite = ctx.transpose(&expr).unwrap();
    assert!(!rewrite.changed());
}

#[test]
fn arguments_are_transposed_on_their_own() {
    let env = arithmetic();
    let expr = apply(variable("f"), spine(&["a", "+", "b"]));
    assert_eq!(transposed(&env, &expr), "f (+ a b)");
}

#[test]
fn plain_spines_are_shared() {
    let env = arithmetic();
    let expr = spine(&["f", "x", "y"]);
    let mut ctx = env.context();
    assert!(ctx.transpose(&expr).unwrap().expr().ptr_eq(&expr));
}

#[test]
fn infix_bindings_evaluate_after_transpose() {
    let env = Environment::new();
    let add = NativeMethod::new(
        "add",
        &[builtin::I32.clone(), builtin::I32.clone()],
        builtin::I32.clone(),
        |args| match args {
            [Value::I32(a), Value::I32(b)] => Ok(Value::I32(a + b)),
            _ => Err("add expects two i32".into()),
        },
    );
    let mul = NativeMethod::new(
        "mul",
        &[builtin::I32.clone(), builtin::I32.clone()],
        builtin::I32.clone(),
        |args| match args {
            [Value::I32(a), Value::I32(b)] => Ok(Value::I32(a * b)),
            _ => Err("mul expects two i32".into()),
        },
    );
    env.mutable_bind_with(
        "+",
        method(add),
        BoundAttributes::infix_left(BoundPrecedence::ADDITION),
        unspecified(),
    );
    env.mutable_bind_with(
        "*",
        method(mul),
        BoundAttributes::infix_left(BoundPrecedence::MULTIPLY),
        unspecified(),
    );

    // 1 + 2 * 3
    let expr = apply(
        apply(
            apply(apply(constant(1), variable("+")), constant(2)),
            variable("*"),
        ),
        constant(3),
    );
    assert_eq!(env.reduce(&expr).unwrap(), constant(7));
}
