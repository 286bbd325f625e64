//! Typed runtime values with SQL null semantics.
//!
//! Comparisons are three-valued: any comparison against NULL yields
//! `CmpBool::CmpNull`, which predicates treat as "not satisfied". Aggregate
//! arithmetic (`add`, `min`, `max`) ignores NULL inputs except `COUNT(*)`,
//! which the aggregation executor handles itself.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::types::type_id::TypeId;

/// Result of a three-valued SQL comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpBool {
    CmpFalse,
    CmpTrue,
    CmpNull,
}

impl CmpBool {
    pub fn is_true(self) -> bool {
        self == CmpBool::CmpTrue
    }
}

#[derive(Debug, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum Val {
    Boolean(bool),
    Integer(i32),
    BigInt(i64),
    Decimal(f64),
    Varchar(String),
    Timestamp(u64),
    Null,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Value {
    val: Val,
    type_id: TypeId,
}

impl Value {
    pub fn new<T: Into<Val>>(value: T) -> Self {
        let val = value.into();
        let type_id = match &val {
            Val::Boolean(_) => TypeId::Boolean,
            Val::Integer(_) => TypeId::Integer,
            Val::BigInt(_) => TypeId::BigInt,
            Val::Decimal(_) => TypeId::Decimal,
            Val::Varchar(_) => TypeId::Varchar,
            Val::Timestamp(_) => TypeId::Timestamp,
            Val::Null => TypeId::Invalid,
        };
        Self { val, type_id }
    }

    /// A NULL value carrying the type of the column it stands in for.
    pub fn null(type_id: TypeId) -> Self {
        Self {
            val: Val::Null,
            type_id,
        }
    }

    pub fn get_val(&self) -> &Val {
        &self.val
    }

    pub fn get_type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn is_null(&self) -> bool {
        matches!(self.val, Val::Null)
    }

    /// Interprets the value as a predicate result. NULL is not true.
    pub fn as_bool(&self) -> bool {
        matches!(self.val, Val::Boolean(true))
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.val {
            Val::Boolean(b) => Some(b as i64),
            Val::Integer(i) => Some(i as i64),
            Val::BigInt(i) => Some(i),
            Val::Timestamp(t) => Some(t as i64),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self.val {
            Val::Integer(i) => Some(i as f64),
            Val::BigInt(i) => Some(i as f64),
            Val::Decimal(d) => Some(d),
            _ => None,
        }
    }

    fn compare(&self, other: &Value) -> Option<Ordering> {
        if self.is_null() || other.is_null() {
            return None;
        }
        match (&self.val, &other.val) {
            (Val::Varchar(a), Val::Varchar(b)) => Some(a.cmp(b)),
            (Val::Boolean(a), Val::Boolean(b)) => Some(a.cmp(b)),
            (Val::Timestamp(a), Val::Timestamp(b)) => Some(a.cmp(b)),
            _ => {
                let a = self.as_f64()?;
                let b = other.as_f64()?;
                a.partial_cmp(&b)
            }
        }
    }

    pub fn compare_equals(&self, other: &Value) -> CmpBool {
        match self.compare(other) {
            Some(Ordering::Equal) => CmpBool::CmpTrue,
            Some(_) => CmpBool::CmpFalse,
            None => CmpBool::CmpNull,
        }
    }

    pub fn compare_not_equals(&self, other: &Value) -> CmpBool {
        match self.compare(other) {
            Some(Ordering::Equal) => CmpBool::CmpFalse,
            Some(_) => CmpBool::CmpTrue,
            None => CmpBool::CmpNull,
        }
    }

    pub fn compare_less_than(&self, other: &Value) -> CmpBool {
        match self.compare(other) {
            Some(Ordering::Less) => CmpBool::CmpTrue,
            Some(_) => CmpBool::CmpFalse,
            None => CmpBool::CmpNull,
        }
    }

    pub fn compare_less_than_equals(&self, other: &Value) -> CmpBool {
        match self.compare(other) {
            Some(Ordering::Greater) => CmpBool::CmpFalse,
            Some(_) => CmpBool::CmpTrue,
            None => CmpBool::CmpNull,
        }
    }

    pub fn compare_greater_than(&self, other: &Value) -> CmpBool {
        match self.compare(other) {
            Some(Ordering::Greater) => CmpBool::CmpTrue,
            Some(_) => CmpBool::CmpFalse,
            None => CmpBool::CmpNull,
        }
    }

    pub fn compare_greater_than_equals(&self, other: &Value) -> CmpBool {
        match self.compare(other) {
            Some(Ordering::Less) => CmpBool::CmpFalse,
            Some(_) => CmpBool::CmpTrue,
            None => CmpBool::CmpNull,
        }
    }

    /// Numeric addition; NULL operands propagate NULL.
    pub fn add(&self, other: &Value) -> Value {
        if self.is_null() || other.is_null() {
            return Value::null(self.type_id);
        }
        match (&self.val, &other.val) {
            (Val::Integer(a), Val::Integer(b)) => Value::new(a.wrapping_add(*b)),
            (Val::Decimal(_), _) | (_, Val::Decimal(_)) => {
                match (self.as_f64(), other.as_f64()) {
                    (Some(a), Some(b)) => Value::new(a + b),
                    _ => Value::null(self.type_id),
                }
            }
            _ => match (self.as_i64(), other.as_i64()) {
                (Some(a), Some(b)) => Value::new(a.wrapping_add(b)),
                _ => Value::null(self.type_id),
            },
        }
    }

    /// Numeric subtraction; NULL operands propagate NULL.
    pub fn subtract(&self, other: &Value) -> Value {
        if self.is_null() || other.is_null() {
            return Value::null(self.type_id);
        }
        match (&self.val, &other.val) {
            (Val::Integer(a), Val::Integer(b)) => Value::new(a.wrapping_sub(*b)),
            _ => match (self.as_i64(), other.as_i64()) {
                (Some(a), Some(b)) => Value::new(a.wrapping_sub(b)),
                _ => Value::null(self.type_id),
            },
        }
    }

    pub fn min(&self, other: &Value) -> Value {
        if self.is_null() {
            return other.clone();
        }
        if other.is_null() {
            return self.clone();
        }
        match self.compare(other) {
            Some(Ordering::Greater) => other.clone(),
            _ => self.clone(),
        }
    }

    pub fn max(&self, other: &Value) -> Value {
        if self.is_null() {
            return other.clone();
        }
        if other.is_null() {
            return self.clone();
        }
        match self.compare(other) {
            Some(Ordering::Less) => other.clone(),
            _ => self.clone(),
        }
    }
}

// Group-by and join keys hash values; Decimal participates by bit pattern.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (&self.val, &other.val) {
            (Val::Decimal(a), Val::Decimal(b)) => a.to_bits() == b.to_bits(),
            (Val::Null, Val::Null) => true,
            (a, b) => a == b,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.val {
            Val::Boolean(b) => b.hash(state),
            Val::Integer(i) => i.hash(state),
            Val::BigInt(i) => i.hash(state),
            Val::Decimal(d) => d.to_bits().hash(state),
            Val::Varchar(s) => s.hash(state),
            Val::Timestamp(t) => t.hash(state),
            Val::Null => 0u8.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.val {
            Val::Boolean(b) => write!(f, "{}", b),
            Val::Integer(i) => write!(f, "{}", i),
            Val::BigInt(i) => write!(f, "{}", i),
            Val::Decimal(d) => write!(f, "{}", d),
            Val::Varchar(s) => write!(f, "{}", s),
            Val::Timestamp(t) => write!(f, "{}", t),
            Val::Null => write!(f, "<NULL>"),
        }
    }
}

impl From<bool> for Val {
    fn from(v: bool) -> Self {
        Val::Boolean(v)
    }
}

impl From<i32> for Val {
    fn from(v: i32) -> Self {
        Val::Integer(v)
    }
}

impl From<i64> for Val {
    fn from(v: i64) -> Self {
        Val::BigInt(v)
    }
}

impl From<f64> for Val {
    fn from(v: f64) -> Self {
        Val::Decimal(v)
    }
}

impl From<&str> for Val {
    fn from(v: &str) -> Self {
        Val::Varchar(v.to_string())
    }
}

impl From<String> for Val {
    fn from(v: String) -> Self {
        Val::Varchar(v)
    }
}
