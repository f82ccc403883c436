use criterion::{Criterion, black_box, criterion_group, criterion_main};

use hyterm::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

fn add_method() -> NativeMethod {
    NativeMethod::new(
        "add",
        &[builtin::I32.clone(), builtin::I32.clone()],
        builtin::I32.clone(),
        |args| match args {
            [Value::I32(a), Value::I32(b)] => Ok(Value::I32(a.wrapping_add(*b))),
            _ => Err("add expects two i32".into()),
        },
    )
}

fn arithmetic_env() -> Environment {
    let env = Environment::new();
    env.mutable_bind_with(
        "+",
        method(add_method()),
        BoundAttributes::infix_left(BoundPrecedence::ADDITION),
        unspecified(),
    );
    env.mutable_bind("id", lambda(bound("x"), variable("x")));
    env
}

/// `id (1 + id (2 + ...))` as an unparsed spine.
fn build_sum(depth: usize) -> Expr {
    (0..depth).fold(constant(0), |acc, i| {
        let spine = apply(apply(constant(i as i32), variable("+")), acc);
        apply(variable("id"), spine)
    })
}

fn build_type_soup() -> Expr {
    // Random AND/OR/function combinations over builtin types. Seeded for determinism.
    let mut rng = ChaCha20Rng::seed_from_u64(0x42);
    let pool = builtin::all();

    fn next(budget: usize, rng: &mut impl Rng, pool: &[HostType]) -> Expr {
        if budget == 0 || rng.random_bool(0.2) {
            return type_term(pool[rng.random_range(0..pool.len())].clone());
        }
        let left = next(budget - 1, rng, pool);
        let right = next(budget - 1, rng, pool);
        match rng.random_range(0..=2) {
            0 => and(left, right),
            1 => or(left, right),
            _ => function(left, right),
        }
    }

    next(8, &mut rng, &pool)
}

fn bench_reduce(c: &mut Criterion) {
    let env = arithmetic_env();
    let small = build_sum(4);
    let large = build_sum(32);

    c.bench_function("reduce_sum_small", |b| {
        b.iter(|| black_box(env.reduce(&small).unwrap()))
    });
    c.bench_function("reduce_sum_large", |b| {
        b.iter(|| black_box(env.reduce(&large).unwrap()))
    });
}

fn bench_infer(c: &mut Criterion) {
    let env = arithmetic_env();
    let large = build_sum(32);

    c.bench_function("infer_sum_large", |b| {
        b.iter(|| black_box(env.infer(&large).unwrap()))
    });
}

fn bench_calculator(c: &mut Criterion) {
    let calculator = LogicalCalculator::types();
    let soup = build_type_soup();

    c.bench_function("calculator_compute_soup", |b| {
        b.iter(|| black_box(calculator.compute(&soup)))
    });
}

criterion_group!(benches, bench_reduce, bench_infer, bench_calculator);
criterion_main!(benches);
