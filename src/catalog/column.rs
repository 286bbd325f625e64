use std::fmt;

use crate::types::type_id::TypeId;

/// A single column of a schema: name plus SQL type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    type_id: TypeId,
}

impl Column {
    pub fn new(name: &str, type_id: TypeId) -> Self {
        Self {
            name: name.to_string(),
            type_id,
        }
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_type(&self) -> TypeId {
        self.type_id
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.type_id)
    }
}
