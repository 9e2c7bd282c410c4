//! Call Signatures and Argument Values

use crate::address::{Address, PageId};
use std::fmt;

/// Type of one parameter or of the result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Address,
    Int,
    PageId,
    Page,
    Void,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Address => "Address",
            ValueType::Int => "Int",
            ValueType::PageId => "PageId",
            ValueType::Page => "Page",
            ValueType::Void => "Void",
        };
        f.write_str(name)
    }
}

/// Parameter and result types of a call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    params: Vec<ValueType>,
    returns: ValueType,
}

impl Signature {
    pub fn new(params: impl Into<Vec<ValueType>>, returns: ValueType) -> Self {
        Self {
            params: params.into(),
            returns,
        }
    }

    /// `(Address) -> Int`
    pub fn element_get() -> Self {
        Self::new([ValueType::Address], ValueType::Int)
    }

    /// `(Address, Int) -> Void`
    pub fn element_set() -> Self {
        Self::new([ValueType::Address, ValueType::Int], ValueType::Void)
    }

    /// `(PageId) -> Page`
    pub fn page_lookup() -> Self {
        Self::new([ValueType::PageId], ValueType::Page)
    }

    pub fn params(&self) -> &[ValueType] {
        &self.params
    }

    pub fn returns(&self) -> ValueType {
        self.returns
    }

    /// Check if `args` have exactly the parameter types
    pub fn accepts(&self, args: &[Value]) -> bool {
        args.len() == self.params.len()
            && args
                .iter()
                .zip(&self.params)
                .all(|(arg, ty)| arg.value_type() == *ty)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ") -> {}", self.returns)
    }
}

/// Argument value presented at a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    Address(Address),
    Int(i32),
    PageId(PageId),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Address(_) => ValueType::Address,
            Value::Int(_) => ValueType::Int,
            Value::PageId(_) => ValueType::PageId,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Address(addr) => write!(f, "{:#010x}", addr),
            Value::Int(v) => write!(f, "{}", v),
            Value::PageId(id) => write!(f, "page {}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Signature::element_set().to_string(), "(Address, Int) -> Void");
        assert_eq!(Signature::page_lookup().to_string(), "(PageId) -> Page");
        assert_eq!(Value::Address(0x1004).to_string(), "0x00001004");
    }

    #[test]
    fn test_accepts() {
        let sig = Signature::element_set();
        assert!(sig.accepts(&[Value::Address(0), Value::Int(1)]));
        assert!(!sig.accepts(&[Value::Address(0)]));
        assert!(!sig.accepts(&[Value::Int(0), Value::Int(1)]));
        assert!(Signature::element_get().accepts(&[Value::Address(4)]));
    }
}
