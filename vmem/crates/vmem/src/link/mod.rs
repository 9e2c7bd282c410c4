//! Link Module - Operation Resolution and Guarded Accessors
//!
//! Components:
//! - [`operation`]: parsing of `VERB:NAMESPACE:TARGET` operation names
//! - [`signature`]: parameter/result types and argument values
//! - [`resolver`]: maps an operation to a specialized accessor
//! - [`accessor`]: guarded fast paths returning [`Access::Relink`] when
//!   their speculation no longer holds

pub mod accessor;
pub mod operation;
pub mod resolver;
pub mod signature;

pub use accessor::{Access, ElementGetter, ElementSetter, Guard, Linked, PageGetter};
pub use operation::{Namespace, Operation, OperationParseError, Verb};
pub use resolver::{resolve, resolve_named, MEMORY_TARGET, PAGES_TARGET};
pub use signature::{Signature, Value, ValueType};
