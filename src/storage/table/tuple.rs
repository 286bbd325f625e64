use serde::{Deserialize, Serialize};

use crate::catalog::schema::Schema;
use crate::common::config::Timestamp;
use crate::common::rid::RID;
use crate::types::value::Value;

/// Per-tuple metadata: the version timestamp and the soft-delete marker.
/// A timestamp at or above `TXN_START_ID` is the temporary stamp of the
/// uncommitted transaction that last wrote the tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TupleMeta {
    ts: Timestamp,
    is_deleted: bool,
}

impl TupleMeta {
    pub fn new(ts: Timestamp, is_deleted: bool) -> Self {
        Self { ts, is_deleted }
    }

    pub fn ts(&self) -> Timestamp {
        self.ts
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }
}

/// A schema-typed row: a value per column plus the RID it lives at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple {
    values: Vec<Value>,
    rid: RID,
}

impl Tuple {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values,
            rid: RID::default(),
        }
    }

    pub fn new_with_rid(values: Vec<Value>, rid: RID) -> Self {
        Self { values, rid }
    }

    pub fn empty() -> Self {
        Self {
            values: Vec::new(),
            rid: RID::default(),
        }
    }

    pub fn get_value(&self, column_idx: usize) -> &Value {
        &self.values[column_idx]
    }

    pub fn get_values(&self) -> &[Value] {
        &self.values
    }

    pub fn get_rid(&self) -> RID {
        self.rid
    }

    pub fn set_rid(&mut self, rid: RID) {
        self.rid = rid;
    }

    /// Projects the key columns named by `key_attrs` into a tuple shaped by
    /// `key_schema`.
    pub fn key_from_tuple(&self, _schema: &Schema, key_schema: &Schema, key_attrs: &[usize]) -> Tuple {
        assert_eq!(key_schema.get_column_count(), key_attrs.len());
        let key_values = key_attrs
            .iter()
            .map(|&attr| self.values[attr].clone())
            .collect();
        Tuple::new(key_values)
    }

    pub fn to_string(&self, schema: &Schema) -> String {
        let parts: Vec<String> = self
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let name = schema
                    .get_column(i)
                    .map(|c| c.get_name().to_string())
                    .unwrap_or_else(|| i.to_string());
                format!("{}: {}", name, v)
            })
            .collect();
        format!("({})", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::column::Column;
    use crate::types::type_id::TypeId;

    #[test]
    fn test_key_from_tuple() {
        let schema = Schema::new(vec![
            Column::new("id", TypeId::Integer),
            Column::new("name", TypeId::Varchar),
            Column::new("age", TypeId::Integer),
        ]);
        let tuple = Tuple::new(vec![
            Value::new(1),
            Value::new("alice"),
            Value::new(30),
        ]);

        let key_schema = Schema::copy_schema(&schema, &[2]);
        let key = tuple.key_from_tuple(&schema, &key_schema, &[2]);
        assert_eq!(key.get_value(0), &Value::new(30));
    }
}
