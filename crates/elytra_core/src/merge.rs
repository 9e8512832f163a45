// SPDX-License-Identifier: MIT

//! The merge policy (spec.md §4.4): combines a job's partials into its
//! final result once every task has reported in. A pure function — no
//! I/O, no knowledge of jobs or connections, just `ops` and `partials` in.
//!
//! Dispatch reads only the terminal operation's *tag* (the "opaque
//! operation payloads" design note); the chosen strategy may then read
//! the tag's own payload, which is exactly what `reduce` does with its
//! reducer body and initial value.

use serde_json::Value;

use crate::error::ElytraError;
use crate::operation::{terminal_kind, Operation, OperationKind};

/// Combine `partials` (already ordered by ascending `chunkId`) per the
/// terminal operation of `ops`. Dispatch reads only [`terminal_kind`];
/// the chosen strategy then reaches into `ops.last()` for its own payload.
pub fn merge(ops: &[Operation], partials: Vec<Value>) -> Result<Value, ElytraError> {
    match terminal_kind(ops) {
        None => Ok(Value::Array(partials)),
        Some(OperationKind::Count) => sum_counts(&partials),
        Some(OperationKind::Reduce) => {
            let Some(Operation::Reduce { body, initial_value }) = ops.last() else {
                unreachable!("terminal_kind() and ops.last() must agree")
            };
            fold_reduce(body, initial_value, &partials)
        }
        Some(OperationKind::Map) | Some(OperationKind::Filter) => concat(partials),
    }
}

fn sum_counts(partials: &[Value]) -> Result<Value, ElytraError> {
    let mut total: i64 = 0;
    let mut as_float = 0.0f64;
    let mut saw_float = false;
    for partial in partials {
        match partial.as_i64() {
            Some(n) => {
                total += n;
                as_float += n as f64;
            }
            None => match partial.as_f64() {
                Some(f) => {
                    saw_float = true;
                    as_float += f;
                }
                None => {
                    return Err(ElytraError::Downstream(format!(
                        "count partial was not numeric: {partial}"
                    )))
                }
            },
        }
    }
    Ok(if saw_float { Value::from(as_float) } else { Value::from(total) })
}

/// Flatten each partial that is itself an array, and push every
/// non-array partial as a single element, preserving `chunkId` order
/// (spec.md §4.4: "concatenate the partials ... into a single flat
/// sequence").
fn concat(partials: Vec<Value>) -> Result<Value, ElytraError> {
    let mut flat = Vec::new();
    for partial in partials {
        match partial {
            Value::Array(items) => flat.extend(items),
            other => flat.push(other),
        }
    }
    Ok(Value::Array(flat))
}

/// Fold partials with the supplied reducer, in `chunkId` order, starting
/// from `initial_value`. The reducer body is a Rhai expression over two
/// bound variables, `a` (the running accumulator) and `b` (the next
/// partial) — see DESIGN.md for why Rhai and not the JS-flavored
/// arrow-function text the wire examples use as illustration.
fn fold_reduce(body: &str, initial_value: &Value, partials: &[Value]) -> Result<Value, ElytraError> {
    let engine = rhai::Engine::new();
    let ast = engine
        .compile_expression(body)
        .map_err(|e| ElytraError::Downstream(format!("invalid reducer expression: {e}")))?;

    let mut accumulator = initial_value.clone();
    for partial in partials {
        let mut scope = rhai::Scope::new();
        scope.push_dynamic("a", rhai::serde::to_dynamic(&accumulator).map_err(reducer_err)?);
        scope.push_dynamic("b", rhai::serde::to_dynamic(partial).map_err(reducer_err)?);
        let result: rhai::Dynamic = engine
            .eval_ast_with_scope(&mut scope, &ast)
            .map_err(|e| ElytraError::Downstream(format!("reducer evaluation failed: {e}")))?;
        accumulator = rhai::serde::from_dynamic(&result).map_err(reducer_err)?;
    }
    Ok(accumulator)
}

fn reducer_err(e: impl std::fmt::Display) -> ElytraError {
    ElytraError::Downstream(format!("reducer value conversion failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// spec.md §8: "Merge result for a `count` pipeline equals the
        /// sum of partials regardless of arrival order." Arrival order
        /// is modeled here as any permutation of the partials vector.
        #[test]
        fn count_merge_is_order_independent(mut partials in proptest::collection::vec(0i64..1000, 0..12)) {
            let ops = vec![Operation::Count];
            let expected: i64 = partials.iter().sum();
            let in_order = merge(&ops, partials.iter().map(|&n| Value::from(n)).collect()).unwrap();
            prop_assert_eq!(in_order, Value::from(expected));

            partials.reverse();
            let reversed = merge(&ops, partials.iter().map(|&n| Value::from(n)).collect()).unwrap();
            prop_assert_eq!(reversed, Value::from(expected));
        }

        /// spec.md §8: concatenation preserves `chunkId` order exactly —
        /// shuffling the partials vector must change the merged result
        /// unless all elements are identical.
        #[test]
        fn default_merge_preserves_partial_order(values in proptest::collection::vec(0i64..100, 1..8)) {
            let ops = vec![Operation::Map { body: "x => x".into() }];
            let partials: Vec<Value> = values.iter().map(|&n| Value::from(n)).collect();
            let merged = merge(&ops, partials).unwrap();
            let expected: Vec<Value> = values.into_iter().map(Value::from).collect();
            prop_assert_eq!(merged, Value::Array(expected));
        }
    }

    #[test]
    fn empty_pipeline_concatenates_as_an_array() {
        let merged = merge(&[], vec![Value::from(1), Value::from(2)]).unwrap();
        assert_eq!(merged, serde_json::json!([1, 2]));
    }

    #[test]
    fn count_sums_integer_partials() {
        let ops = vec![Operation::Count];
        let merged = merge(&ops, vec![Value::from(3), Value::from(4), Value::from(5)]).unwrap();
        assert_eq!(merged, serde_json::json!(12));
    }

    #[test]
    fn count_rejects_non_numeric_partials() {
        let ops = vec![Operation::Count];
        let err = merge(&ops, vec![Value::from("nope")]).unwrap_err();
        assert!(matches!(err, ElytraError::Downstream(_)));
    }

    #[test]
    fn default_merge_flattens_array_partials_in_order() {
        let ops = vec![Operation::Map { body: "x => x".into() }];
        let merged = merge(
            &ops,
            vec![serde_json::json!([1, 2]), serde_json::json!([3]), serde_json::json!([4, 5])],
        )
        .unwrap();
        assert_eq!(merged, serde_json::json!([1, 2, 3, 4, 5]));
    }

    #[test]
    fn default_merge_keeps_scalar_partials_as_elements() {
        let ops = vec![Operation::Filter { body: "x => true".into() }];
        let merged = merge(&ops, vec![Value::from(1), Value::from(2)]).unwrap();
        assert_eq!(merged, serde_json::json!([1, 2]));
    }

    #[test]
    fn reduce_folds_with_the_supplied_expression_in_chunk_order() {
        let ops = vec![Operation::Reduce { body: "a - b".into(), initial_value: Value::from(100) }];
        let merged = merge(&ops, vec![Value::from(10), Value::from(5), Value::from(1)]).unwrap();
        // 100 - 10 - 5 - 1 = 84, order-sensitive so this also guards
        // against an accidental swap of a/b.
        assert_eq!(merged, serde_json::json!(84));
    }

    #[test]
    fn reduce_with_an_invalid_expression_is_a_downstream_error_not_a_panic() {
        let ops = vec![Operation::Reduce { body: "a +".into(), initial_value: Value::from(0) }];
        let err = merge(&ops, vec![Value::from(1)]).unwrap_err();
        assert!(matches!(err, ElytraError::Downstream(_)));
    }
}
