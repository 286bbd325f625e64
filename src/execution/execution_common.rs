//! Shared MVCC helpers for the executors: version reconstruction, undo-chain
//! collection, and delta computation.

use crate::catalog::schema::Schema;
use crate::common::rid::RID;
use crate::concurrency::transaction::{Transaction, UndoLink, UndoLog};
use crate::concurrency::transaction_manager::TransactionManager;
use crate::execution::expressions::abstract_expression::ExpressionRef;
use crate::storage::table::tuple::{Tuple, TupleMeta};
use crate::types::value::Value;

/// Rebuilds the tuple version described by `undo_logs` (ordered newest to
/// oldest) on top of the base tuple. Returns `None` when the reconstructed
/// state is a deletion.
pub fn reconstruct_tuple(
    schema: &Schema,
    base_tuple: &Tuple,
    base_meta: &TupleMeta,
    undo_logs: &[UndoLog],
) -> Option<Tuple> {
    let col_len = schema.get_column_count();
    let mut deleted = base_meta.is_deleted();
    let mut values: Vec<Value> = if deleted {
        Vec::new()
    } else {
        base_tuple.get_values().to_vec()
    };

    for undo_log in undo_logs {
        assert_eq!(
            undo_log.modified_fields.len(),
            col_len,
            "modified_fields must cover every column"
        );
        if undo_log.is_deleted {
            deleted = true;
            values.clear();
            continue;
        }
        deleted = false;
        if values.is_empty() {
            values = schema
                .get_columns()
                .iter()
                .map(|col| Value::null(col.get_type()))
                .collect();
        }
        let mut partial_idx = 0;
        for (col_idx, modified) in undo_log.modified_fields.iter().enumerate() {
            if *modified {
                values[col_idx] = undo_log.tuple.get_value(partial_idx).clone();
                partial_idx += 1;
            }
        }
    }

    if deleted {
        None
    } else {
        Some(Tuple::new_with_rid(values, base_tuple.get_rid()))
    }
}

/// Collects the undo logs needed to roll the tuple at `rid` back to the
/// transaction's snapshot, newest first.
///
/// Returns `Some(vec![])` when the base version itself is visible (committed
/// at or before the read timestamp, or this transaction's own write), and
/// `None` when the chain is exhausted before any visible version appears.
pub fn collect_undo_logs(
    rid: RID,
    base_meta: &TupleMeta,
    txn: &Transaction,
    txn_mgr: &TransactionManager,
) -> Option<Vec<UndoLog>> {
    if base_meta.ts() == txn.temp_ts() || base_meta.ts() <= txn.get_read_ts() {
        return Some(Vec::new());
    }

    let mut logs = Vec::new();
    let mut link = txn_mgr.get_undo_link(rid);
    while let Some(current) = link.filter(UndoLink::is_valid) {
        let undo_log = txn_mgr.get_undo_log_optional(current)?;
        let ts = undo_log.ts;
        let prev = undo_log.prev_version;
        logs.push(undo_log);
        if ts <= txn.get_read_ts() {
            return Some(logs);
        }
        link = Some(prev);
    }
    None
}

/// Column-wise comparison of a new tuple against the old one; a column is
/// modified when its values are not equal under SQL semantics.
pub fn get_modified_fields(new_tuple: &Tuple, old_tuple: &Tuple, schema: &Schema) -> Vec<bool> {
    (0..schema.get_column_count())
        .map(|i| {
            !new_tuple
                .get_value(i)
                .compare_equals(old_tuple.get_value(i))
                .is_true()
        })
        .collect()
}

/// Extracts the partial pre-image tuple holding only the modified columns.
pub fn delta_tuple(base_tuple: &Tuple, modified_fields: &[bool]) -> Tuple {
    let values = modified_fields
        .iter()
        .enumerate()
        .filter(|(_, m)| **m)
        .map(|(i, _)| base_tuple.get_value(i).clone())
        .collect();
    Tuple::new(values)
}

/// Widens an existing undo log with a later self-modification: the modified
/// set becomes the union, columns already covered keep the old (earlier)
/// pre-image, and newly modified columns adopt the current pre-image from
/// `delta`.
pub fn cover_undo_log(
    delta: &Tuple,
    modified_fields: &[bool],
    undo_log: &UndoLog,
) -> UndoLog {
    let col_len = modified_fields.len();
    let old_modified = &undo_log.modified_fields;
    assert_eq!(old_modified.len(), col_len);

    let mut new_modified = Vec::with_capacity(col_len);
    let mut values = Vec::new();
    let mut old_idx = 0;
    let mut delta_idx = 0;
    for i in 0..col_len {
        let in_old = old_modified[i];
        let in_new = modified_fields[i];
        new_modified.push(in_old || in_new);
        let mut value = None;
        if in_new {
            value = Some(delta.get_value(delta_idx).clone());
            delta_idx += 1;
        }
        if in_old {
            value = Some(undo_log.tuple.get_value(old_idx).clone());
            old_idx += 1;
        }
        if let Some(value) = value {
            values.push(value);
        }
    }

    UndoLog {
        is_deleted: undo_log.is_deleted,
        modified_fields: new_modified,
        tuple: Tuple::new(values),
        ts: undo_log.ts,
        prev_version: undo_log.prev_version,
    }
}

/// Comparator over an ORDER BY list: the first entry whose values differ
/// decides; `Default` direction is ascending.
pub fn compare_by_order_bys(
    order_bys: &[(crate::execution::plans::abstract_plan::OrderByType, ExpressionRef)],
    schema: &Schema,
    a: &Tuple,
    b: &Tuple,
) -> std::cmp::Ordering {
    use crate::execution::plans::abstract_plan::OrderByType;
    use std::cmp::Ordering;

    for (order_by_type, expr) in order_bys {
        assert!(
            *order_by_type != OrderByType::Invalid,
            "invalid order by type"
        );
        let left = expr.evaluate(a, schema);
        let right = expr.evaluate(b, schema);
        if left.compare_not_equals(&right).is_true() {
            let ascending = left.compare_less_than(&right).is_true();
            return match order_by_type {
                OrderByType::Asc | OrderByType::Default => {
                    if ascending {
                        Ordering::Less
                    } else {
                        Ordering::Greater
                    }
                }
                OrderByType::Desc => {
                    if ascending {
                        Ordering::Greater
                    } else {
                        Ordering::Less
                    }
                }
                OrderByType::Invalid => unreachable!(),
            };
        }
    }
    std::cmp::Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::column::Column;
    use crate::types::type_id::TypeId;

    fn test_schema() -> Schema {
        Schema::new(vec![
            Column::new("a", TypeId::Integer),
            Column::new("b", TypeId::Integer),
            Column::new("c", TypeId::Integer),
        ])
    }

    fn full_tuple(a: i32, b: i32, c: i32) -> Tuple {
        Tuple::new(vec![Value::new(a), Value::new(b), Value::new(c)])
    }

    #[test]
    fn test_reconstruct_applies_partial_logs_newest_to_oldest() {
        let schema = test_schema();
        let base = full_tuple(1, 2, 3);
        let meta = TupleMeta::new(10, false);

        let logs = vec![
            UndoLog {
                is_deleted: false,
                modified_fields: vec![true, false, false],
                tuple: Tuple::new(vec![Value::new(100)]),
                ts: 5,
                prev_version: UndoLink::INVALID,
            },
            UndoLog {
                is_deleted: false,
                modified_fields: vec![false, true, false],
                tuple: Tuple::new(vec![Value::new(200)]),
                ts: 3,
                prev_version: UndoLink::INVALID,
            },
        ];

        let rebuilt = reconstruct_tuple(&schema, &base, &meta, &logs).unwrap();
        assert_eq!(rebuilt.get_value(0), &Value::new(100));
        assert_eq!(rebuilt.get_value(1), &Value::new(200));
        assert_eq!(rebuilt.get_value(2), &Value::new(3));
    }

    #[test]
    fn test_reconstruct_delete_marker_hides_tuple() {
        let schema = test_schema();
        let base = full_tuple(1, 2, 3);
        let meta = TupleMeta::new(10, false);

        let logs = vec![UndoLog {
            is_deleted: true,
            modified_fields: vec![false, false, false],
            tuple: Tuple::empty(),
            ts: 5,
            prev_version: UndoLink::INVALID,
        }];
        assert!(reconstruct_tuple(&schema, &base, &meta, &logs).is_none());
    }

    #[test]
    fn test_reconstruct_past_delete_reseeds_with_nulls() {
        let schema = test_schema();
        let base = full_tuple(1, 2, 3);
        let meta = TupleMeta::new(10, false);

        // Newest log deletes; the older log revives column a only. Columns
        // without a pre-image come back as NULL.
        let logs = vec![
            UndoLog {
                is_deleted: true,
                modified_fields: vec![false, false, false],
                tuple: Tuple::empty(),
                ts: 5,
                prev_version: UndoLink::INVALID,
            },
            UndoLog {
                is_deleted: false,
                modified_fields: vec![true, false, false],
                tuple: Tuple::new(vec![Value::new(7)]),
                ts: 2,
                prev_version: UndoLink::INVALID,
            },
        ];

        let rebuilt = reconstruct_tuple(&schema, &base, &meta, &logs).unwrap();
        assert_eq!(rebuilt.get_value(0), &Value::new(7));
        assert!(rebuilt.get_value(1).is_null());
        assert!(rebuilt.get_value(2).is_null());
    }

    #[test]
    fn test_deleted_base_without_logs_is_invisible() {
        let schema = test_schema();
        let base = full_tuple(1, 2, 3);
        let meta = TupleMeta::new(10, true);
        assert!(reconstruct_tuple(&schema, &base, &meta, &[]).is_none());
    }

    #[test]
    fn test_modified_fields_diff() {
        let schema = test_schema();
        let old = full_tuple(1, 2, 3);
        let new = full_tuple(1, 20, 3);
        assert_eq!(get_modified_fields(&new, &old, &schema), vec![false, true, false]);

        let delta = delta_tuple(&old, &[false, true, false]);
        assert_eq!(delta.get_values().len(), 1);
        assert_eq!(delta.get_value(0), &Value::new(2));
    }

    #[test]
    fn test_cover_undo_log_keeps_earlier_preimage() {
        // Existing log: column b's pre-image is 2.
        let old_log = UndoLog {
            is_deleted: false,
            modified_fields: vec![false, true, false],
            tuple: Tuple::new(vec![Value::new(2)]),
            ts: 4,
            prev_version: UndoLink::INVALID,
        };
        // Later self-update touches b (current pre-image 20) and c (3).
        let covered = cover_undo_log(
            &Tuple::new(vec![Value::new(20), Value::new(3)]),
            &[false, true, true],
            &old_log,
        );

        assert_eq!(covered.modified_fields, vec![false, true, true]);
        // b keeps the earlier pre-image; c adopts the current one.
        assert_eq!(covered.tuple.get_value(0), &Value::new(2));
        assert_eq!(covered.tuple.get_value(1), &Value::new(3));
        assert_eq!(covered.ts, 4);
    }
}
