use std::collections::BTreeSet;

use hyterm::prelude::*;

fn chain(expr: &Expr) -> Vec<PlaceholderIndex> {
    let mut indices = Vec::new();
    let mut current = expr.clone();
    while let Some(index) = current.as_placeholder() {
        indices.push(index);
        current = current.higher_order();
    }
    indices
}

#[test]
fn chains_stop_at_the_dead_end() {
    let env = Environment::new();
    for (hint, length) in [
        (PlaceholderOrderHint::VariableOrAbove, 3),
        (PlaceholderOrderHint::TypeOrAbove, 3),
        (PlaceholderOrderHint::KindOrAbove, 2),
        (PlaceholderOrderHint::Fourth, 1),
    ] {
        let placeholder = env.create_placeholder(hint);
        let indices = chain(&placeholder);
        assert_eq!(indices.len(), length, "{hint:?}");

        let mut top = placeholder.clone();
        for _ in 0..length {
            top = top.higher_order();
        }
        assert!(top.is_dead_end());
    }
    assert!(env.create_placeholder(PlaceholderOrderHint::DeadEnd).is_dead_end());
}

#[test]
fn indices_increase_along_a_chain() {
    let env = Environment::new();
    let indices = chain(&env.create_placeholder(PlaceholderOrderHint::VariableOrAbove));
    assert!(indices.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn concurrent_requests_never_overlap() {
    const THREADS: usize = 8;
    const REQUESTS: usize = 250;

    let env = Environment::new();
    let per_thread: Vec<Vec<PlaceholderIndex>> = crossbeam::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|_| {
                    let mut seen = Vec::new();
                    for _ in 0..REQUESTS {
                        seen.extend(chain(
                            &env.create_placeholder(PlaceholderOrderHint::TypeOrAbove),
                        ));
                    }
                    seen
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    })
    .unwrap();

    let mut all = BTreeSet::new();
    for indices in &per_thread {
        // Each thread observes its own indices in increasing order.
        assert!(indices.windows(2).all(|pair| pair[0] < pair[1]));
        for index in indices {
            assert!(all.insert(*index), "index {index} issued twice");
        }
    }
    assert_eq!(all.len(), THREADS * REQUESTS * 3);
    assert_eq!(env.last_placeholder_index(), THREADS * REQUESTS * 3);
}

#[test]
fn inference_consumes_fresh_indices() {
    let env = Environment::new();
    env.infer(&lambda(bound("x"), variable("x"))).unwrap();
    let after_first = env.last_placeholder_index();
    assert!(after_first > 0);
    env.infer(&lambda(bound("x"), variable("x"))).unwrap();
    assert!(env.last_placeholder_index() > after_first);
}
