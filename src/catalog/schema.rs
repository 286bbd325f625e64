use std::fmt;

use crate::catalog::column::Column;

/// Ordered list of columns describing the shape of a tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn get_columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn get_column(&self, idx: usize) -> Option<&Column> {
        self.columns.get(idx)
    }

    pub fn get_column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.get_name() == name)
    }

    /// Projects the subset of columns named by `attrs`, in that order.
    pub fn copy_schema(from: &Schema, attrs: &[usize]) -> Schema {
        let columns = attrs
            .iter()
            .map(|&i| from.columns[i].clone())
            .collect();
        Schema { columns }
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self { columns: Vec::new() }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cols: Vec<String> = self.columns.iter().map(|c| c.to_string()).collect();
        write!(f, "({})", cols.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::type_id::TypeId;

    #[test]
    fn test_copy_schema_subset() {
        let schema = Schema::new(vec![
            Column::new("id", TypeId::Integer),
            Column::new("name", TypeId::Varchar),
            Column::new("age", TypeId::Integer),
        ]);
        let partial = Schema::copy_schema(&schema, &[2, 0]);
        assert_eq!(partial.get_column_count(), 2);
        assert_eq!(partial.get_column(0).unwrap().get_name(), "age");
        assert_eq!(partial.get_column(1).unwrap().get_name(), "id");
    }
}
