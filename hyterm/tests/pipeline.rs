use hyterm::environment::scope::Lookup;
use hyterm::prelude::*;
use thiserror::Error;

fn int() -> Expr {
    type_term(builtin::I32.clone())
}

fn identity() -> Expr {
    lambda(bound("x"), variable("x"))
}

fn add_method() -> NativeMethod {
    NativeMethod::new(
        "add",
        &[builtin::I32.clone(), builtin::I32.clone()],
        builtin::I32.clone(),
        |args| match args {
            [Value::I32(a), Value::I32(b)] => Ok(Value::I32(a + b)),
            _ => Err("add expects two i32".into()),
        },
    )
}

fn negate_method() -> NativeMethod {
    NativeMethod::new("neg", &[builtin::I32.clone()], builtin::I32.clone(), |args| {
        match args {
            [Value::I32(a)] => Ok(Value::I32(-a)),
            _ => Err("neg expects one i32".into()),
        }
    })
}

/// Every placeholder reachable from `expr`, higher orders included.
fn placeholders(expr: &Expr, found: &mut Vec<PlaceholderIndex>) {
    if expr.is_dead_end() {
        return;
    }
    if let Some(index) = expr.as_placeholder() {
        found.push(index);
    }
    for child in expr.children() {
        placeholders(child, found);
    }
    placeholders(&expr.higher_order(), found);
}

#[test]
fn reduces_identity_application() {
    let env = Environment::new();
    let three = env.reduce(&apply(identity(), constant(3))).unwrap();
    assert_eq!(three, constant(3));
    assert_eq!(three.higher_order(), int());
}

#[test]
fn infers_the_type_of_an_application() {
    let env = Environment::new();
    let inferred = env.infer(&apply(identity(), constant(3))).unwrap();
    assert_eq!(inferred.expr_type(), ExprType::Apply);
    assert_eq!(inferred.higher_order(), int());

    let ExprKind::Apply { function: callee, .. } = inferred.kind() else {
        panic!("expected an application, got {inferred:?}");
    };
    assert_eq!(callee.higher_order(), function(int(), int()));
}

#[test]
fn reduces_curried_native_method() {
    let env = Environment::new();
    env.mutable_bind("add", method(add_method()));

    let five = env
        .reduce(&apply(apply(variable("add"), constant(2)), constant(3)))
        .unwrap();
    assert_eq!(five, constant(5));
    assert_eq!(five.higher_order(), int());
}

#[test]
fn reduces_method_term_directly() {
    let env = Environment::new();
    let five = env
        .reduce(&apply(apply(method(add_method()), constant(2)), constant(3)))
        .unwrap();
    assert_eq!(five, constant(5));
}

#[test]
fn partial_application_can_be_shared() {
    let env = Environment::new();
    env.mutable_bind("add", method(add_method()));
    env.mutable_bind("add2", apply(variable("add"), constant(2)));

    let five = env.reduce(&apply(variable("add2"), constant(3))).unwrap();
    let six = env.reduce(&apply(variable("add2"), constant(4))).unwrap();
    assert_eq!(five, constant(5));
    assert_eq!(six, constant(6));
}

#[test]
fn unifying_a_conjunction_resolves_the_placeholder() {
    let env = Environment::new();
    let p = env.create_placeholder(PlaceholderOrderHint::TypeOrAbove);
    let index = p.as_placeholder().unwrap();

    let mut ctx = env.context();
    ctx.unify(&and(p.clone(), int()), &int(), false).unwrap();
    ctx.normalize_aliases();
    assert_eq!(ctx.resolve(index), Some(int()));

    let typed = variable("x").with_higher_order(p.clone());
    let fixed = ctx.fixup(&typed);
    assert!(fixed.changed());
    assert_eq!(fixed.expr().higher_order(), int());

    let topology = env.unify(&and(p, int()), &int()).unwrap();
    assert_eq!(topology.get(index), Some(&int()));
}

#[test]
fn reduce_is_idempotent_on_normal_forms() {
    let env = Environment::new();
    for expr in [constant(3), constant("text"), int(), identity()] {
        let once = env.reduce(&expr).unwrap();
        let twice = env.reduce(&once).unwrap();
        assert_eq!(once, twice, "reducing {once:?} again changed it");
    }
}

#[test]
fn no_placeholder_chains_survive_fixup() {
    let env = Environment::new();
    env.mutable_bind("add", method(add_method()));
    let closed = [
        identity(),
        apply(identity(), constant(3)),
        lambda(bound("y"), apply(apply(variable("add"), variable("y")), constant(1))),
        apply(lambda(bound("f"), apply(variable("f"), constant(1))), identity()),
    ];

    for expr in closed {
        let inferred = env.infer(&expr).unwrap();
        let topology = env.last_topology().unwrap();
        let mut found = Vec::new();
        placeholders(&inferred, &mut found);
        for index in found {
            match topology.get(index) {
                None => {}
                Some(bound) => assert_eq!(
                    bound.as_placeholder(),
                    Some(index),
                    "{index} in {inferred:?} still points at {bound:?}"
                ),
            }
        }
    }
}

#[test]
fn lambda_parameter_is_typed_by_its_use() {
    let env = Environment::new();
    env.mutable_bind("neg", method(negate_method()));
    let expr = lambda(bound("y"), apply(variable("neg"), variable("y")));
    let inferred = env.infer(&expr).unwrap();
    assert_eq!(inferred.higher_order(), function(int(), int()));
}

#[test]
fn failed_inference_keeps_the_previous_topology() {
    let env = Environment::new();
    env.reduce(&apply(identity(), constant(3))).unwrap();
    let before = env.last_topology().unwrap();
    assert!(!before.is_empty());

    let err = env.reduce(&apply(constant(1), constant(2))).unwrap_err();
    assert!(matches!(err, TermError::Unification { .. }), "{err}");
    assert!(err.to_string().starts_with("Couldn't unify: "));

    let after = env.last_topology().unwrap();
    assert_eq!(after.len(), before.len());
}

#[test]
fn placeholders_cannot_be_unified_with_the_dead_end() {
    let env = Environment::new();
    env.unify(&int(), &int()).unwrap();
    let before = env.last_topology().unwrap();

    let p = env.create_placeholder(PlaceholderOrderHint::TypeOrAbove);
    for (from, to) in [(&p, &dead_end()), (&dead_end(), &p)] {
        let err = env.unify(from, to).unwrap_err();
        assert!(matches!(err, TermError::DeadEndBinding { .. }), "{err}");
    }
    assert_eq!(env.last_topology().unwrap().len(), before.len());

    // Terms at the top of the tower still infer.
    assert_eq!(env.reduce(&variable("#")).unwrap(), fourth());
}

#[test]
fn topology_can_be_disabled() {
    let env = Environment::with_config(EnvironmentConfig::default().with_retain_topology(false));
    env.reduce(&apply(identity(), constant(3))).unwrap();
    assert!(env.last_topology().is_none());
}

#[test]
fn non_constant_argument_is_rejected_at_call_time() {
    let env = Environment::new();
    env.mutable_bind("neg", method(negate_method()));
    let err = env
        .reduce(&apply(variable("neg"), variable("unknown")))
        .unwrap_err();
    assert!(matches!(err, TermError::InvalidArgument { .. }), "{err}");
}

#[test]
fn mistyped_argument_is_rejected_at_call_time() {
    let neg = method(negate_method());
    let err = neg
        .as_callable()
        .unwrap()
        .call(&constant("three"))
        .unwrap_err();
    assert!(matches!(err, TermError::ArgumentType { .. }), "{err}");
}

#[derive(Debug, Error)]
#[error("request failed")]
struct Wrapper(#[source] Root);

#[derive(Debug, Error)]
#[error("disk is full")]
struct Root;

#[test]
fn native_faults_report_their_innermost_cause() {
    let env = Environment::new();
    let failing = NativeMethod::new("save", &[builtin::I32.clone()], builtin::UNIT.clone(), |_| {
        Err(Wrapper(Root).into())
    });
    env.mutable_bind("save", method(failing));

    let err = env.reduce(&apply(variable("save"), constant(1))).unwrap_err();
    match &err {
        TermError::NativeInvocation { member, cause, .. } => {
            assert_eq!(member, "save");
            assert_eq!(cause, "disk is full");
        }
        other => panic!("unexpected error {other}"),
    }
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn properties_reduce_to_their_value() {
    let env = Environment::new();
    env.mutable_bind(
        "answer",
        property(NativeProperty::new("answer", builtin::I32.clone(), || {
            Ok(Value::I32(42))
        })),
    );
    let value = env.reduce(&variable("answer")).unwrap();
    assert_eq!(value, constant(42));
}

#[test]
fn zero_arity_methods_take_unit() {
    let env = Environment::new();
    let now = NativeMethod::new("now", &[], builtin::I64.clone(), |_| Ok(Value::I64(1_700_000_000)));
    env.mutable_bind("now", method(now));
    let value = env.reduce(&apply(variable("now"), unit())).unwrap();
    assert_eq!(value, constant(1_700_000_000i64));
}

#[test]
fn global_lambdas_are_expanded() {
    let env = Environment::new();
    env.mutable_bind("id", identity());
    env.mutable_bind(
        "twice",
        lambda(
            bound("f"),
            lambda(bound("v"), apply(variable("f"), apply(variable("f"), variable("v")))),
        ),
    );
    env.mutable_bind("neg", method(negate_method()));

    let same = env.reduce(&apply(variable("id"), constant("hi"))).unwrap();
    assert_eq!(same, constant("hi"));

    let back = env
        .reduce(&apply(apply(variable("twice"), variable("neg")), constant(7)))
        .unwrap();
    assert_eq!(back, constant(7));
}

#[test]
fn reducing_under_binders_avoids_capture() {
    let env = Environment::new();
    let constant_fn = lambda(bound("x"), lambda(bound("y"), variable("x")));
    let outer = lambda(bound("y"), apply(constant_fn, variable("y")));

    let direct = env
        .reduce(&apply(apply(outer.clone(), constant(1)), constant(2)))
        .unwrap();
    let normal = env.reduce(&outer).unwrap();
    let staged = env
        .reduce(&apply(apply(normal.clone(), constant(1)), constant(2)))
        .unwrap();
    assert_eq!(direct, constant(1));
    assert_eq!(staged, direct, "normal form {normal:?} changed the meaning");
}

#[test]
fn parameter_names_survive_reduction_when_nothing_is_captured() {
    let env = Environment::new();
    let expr = lambda(bound("y"), apply(identity(), variable("y")));
    let reduced = env.reduce(&expr).unwrap();
    assert_eq!(reduced, lambda(bound("y"), variable("y")));
}

#[test]
fn recursive_bindings_terminate() {
    let env = Environment::new();
    env.mutable_bind("loop", variable("loop"));
    let reduced = env.reduce(&variable("loop")).unwrap();
    assert_eq!(reduced, variable("loop"));
}

#[test]
fn child_scopes_see_parent_bindings() {
    let env = Environment::new();
    env.mutable_bind("x", constant(1));

    let child = env.create_scope();
    child.mutable_bind("y", variable("x"));
    assert_eq!(child.reduce(&variable("y")).unwrap(), constant(1));
    assert!(env.lookup("y").is_none());

    // Globals resolve when used, through the scope doing the reduction.
    child.mutable_bind("x", constant(2));
    assert_eq!(child.reduce(&variable("y")).unwrap(), constant(2));
    assert_eq!(child.reduce(&variable("x")).unwrap(), constant(2));
    assert_eq!(env.reduce(&variable("x")).unwrap(), constant(1));

    let before = env.last_placeholder_index();
    let p = child.create_placeholder(PlaceholderOrderHint::KindOrAbove);
    assert!(p.as_placeholder().unwrap().0 > before);
    assert_eq!(env.last_placeholder_index(), child.last_placeholder_index());
}

#[test]
fn default_bindings_cover_the_kind_tower() {
    let env = Environment::new();
    assert_eq!(env.reduce(&variable("*")).unwrap(), type_kind());
    assert_eq!(env.reduce(&variable("#")).unwrap(), fourth());
    assert!(env.lookup("_").is_some());
}

#[test]
fn lambda_parameters_shadow_globals() {
    let env = Environment::new();
    env.mutable_bind("x", constant(1));
    let shadowing = lambda(bound("x"), variable("x"));
    let reduced = env.reduce(&apply(shadowing, constant(2))).unwrap();
    assert_eq!(reduced, constant(2));

    let ctx = env.context();
    assert!(matches!(ctx.lookup("x"), Lookup::Bound { global: true, .. }));
    assert!(matches!(ctx.lookup("nothing"), Lookup::Free));
}

#[test]
fn registered_types_are_bound_by_name() {
    let registry = std::sync::Arc::new(TypeRegistry::new());
    let env = Environment::new().with_registry(registry.clone());
    assert_eq!(env.reduce(&variable("i32")).unwrap(), int());

    let animal = env
        .register_type("Animal", TypeCategory::Class, &[builtin::OBJECT.clone()])
        .unwrap();
    assert!(registry.get("Animal").is_some());
    assert_eq!(env.reduce(&variable("Animal")).unwrap(), type_term(animal));
}
