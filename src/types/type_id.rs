use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the SQL type of a column or value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeId {
    Invalid,
    Boolean,
    Integer,
    BigInt,
    Decimal,
    Varchar,
    Timestamp,
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeId::Invalid => "INVALID",
            TypeId::Boolean => "BOOLEAN",
            TypeId::Integer => "INTEGER",
            TypeId::BigInt => "BIGINT",
            TypeId::Decimal => "DECIMAL",
            TypeId::Varchar => "VARCHAR",
            TypeId::Timestamp => "TIMESTAMP",
        };
        write!(f, "{}", name)
    }
}
