//! Operation Resolver
//!
//! Picks an accessor for an `(operation, signature, first-call args)`
//! triple:
//!
//! | Operation                   | Signature                | Accessor        |
//! |-----------------------------|--------------------------|-----------------|
//! | `GET` + `ELEMENT` + memory  | `(Address) -> Int`       | `ElementGetter` |
//! | `SET` + `ELEMENT` + memory  | `(Address, Int) -> Void` | `ElementSetter` |
//! | `GET` + `ELEMENT` + pages   | `(PageId) -> Page`       | `PageGetter`    |
//!
//! Anything else is not applicable (`Ok(None)`). The accessor speculates on
//! the kind of the page named by the first argument and is bound to the
//! snapshot current at resolution.

use super::accessor::{ElementGetter, ElementSetter, Guard, Linked, PageGetter};
use super::operation::{Namespace, Operation, Verb};
use super::signature::{Signature, Value};
use crate::address::{self, PageId};
use crate::error::{Result, VmemError};
use crate::logging::VmemEvent;
use crate::space::AddressSpace;

/// Target naming element access on the flat address space
pub const MEMORY_TARGET: &str = "memory";

/// Target naming page lookup by id
pub const PAGES_TARGET: &str = "pages";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    GetElement,
    SetElement,
    LookupPage,
}

impl Shape {
    fn classify(operation: &Operation, signature: &Signature) -> Option<Shape> {
        if !operation.has_namespace(Namespace::Element) {
            return None;
        }
        let shape = match (operation.verb(), operation.target()?) {
            (Verb::Get, MEMORY_TARGET) => Shape::GetElement,
            (Verb::Set, MEMORY_TARGET) => Shape::SetElement,
            (Verb::Get, PAGES_TARGET) => Shape::LookupPage,
            _ => return None,
        };
        if *signature != shape.signature() {
            return None;
        }
        Some(shape)
    }

    fn signature(&self) -> Signature {
        match self {
            Shape::GetElement => Signature::element_get(),
            Shape::SetElement => Signature::element_set(),
            Shape::LookupPage => Signature::page_lookup(),
        }
    }
}

/// Resolve an operation against `space`'s current snapshot
///
/// # Returns
/// * `Ok(Some(linked))` - accessor specialized to the first argument's page kind
/// * `Ok(None)` - no implementation for this operation and signature
/// * `Err(UnmappedAddress)` / `Err(UnmappedPage)` - the first argument names
///   no allocated page
pub fn resolve(
    space: &AddressSpace,
    operation: &Operation,
    signature: &Signature,
    args: &[Value],
) -> Result<Option<Linked>> {
    let shape = match Shape::classify(operation, signature) {
        Some(shape) if signature.accepts(args) => shape,
        _ => {
            reject(space, &operation.to_string());
            return Ok(None);
        }
    };

    let page_id: PageId = match args.first() {
        Some(Value::Address(addr)) => address::page_id(*addr),
        Some(Value::PageId(id)) => *id,
        _ => {
            reject(space, &operation.to_string());
            return Ok(None);
        }
    };

    let table = space.current_snapshot();
    let kind = match table.kind_of(page_id) {
        Some(kind) => kind,
        None => {
            let err = match args.first() {
                Some(Value::Address(addr)) => VmemError::UnmappedAddress { address: *addr },
                _ => VmemError::UnmappedPage { page_id },
            };
            log::debug!("link {} in space {}: {}", operation, space.id(), err);
            return Err(err);
        }
    };

    let generation = table.generation();
    let guard = Guard::new(space.id(), table, kind);
    let linked = match shape {
        Shape::GetElement => Linked::Get(ElementGetter::specialize(guard)),
        Shape::SetElement => Linked::Set(ElementSetter::specialize(guard)),
        Shape::LookupPage => Linked::Page(PageGetter::specialize(guard)),
    };

    log::debug!(
        "link {} {} in space {}: {} pages, snapshot {}",
        operation,
        signature,
        space.id(),
        kind,
        generation
    );
    space.stats().record_link();
    space.emit(VmemEvent::Linked {
        space: space.id().as_u64(),
        operation: operation.to_string(),
        kind,
        generation,
    });

    Ok(Some(linked))
}

/// Parse `name` and resolve it
///
/// A name that does not parse is not applicable.
pub fn resolve_named(
    space: &AddressSpace,
    name: &str,
    signature: &Signature,
    args: &[Value],
) -> Result<Option<Linked>> {
    match name.parse::<Operation>() {
        Ok(operation) => resolve(space, &operation, signature, args),
        Err(err) => {
            log::debug!("link {}: {}", name, err);
            reject(space, name);
            Ok(None)
        }
    }
}

fn reject(space: &AddressSpace, operation: &str) {
    log::debug!("link {} in space {}: not applicable", operation, space.id());
    space.stats().record_link_rejected();
    space.emit(VmemEvent::LinkRejected {
        space: space.id().as_u64(),
        operation: operation.to_string(),
    });
}
