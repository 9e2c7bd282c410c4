//! Call Sites - Resolve Once, Relink on Demand
//!
//! A `CallSite` is a caller-owned cache slot for one operation name. The
//! first call resolves an accessor; later calls go straight to its fast
//! path. When the fast path reports [`Access::Relink`] the accessor is
//! dropped and the operation is resolved again against the current
//! snapshot, then retried.
//!
//! ```rust
//! use vmem::{AddressSpace, GetSite, PageKind, SetSite};
//!
//! let space = AddressSpace::default();
//! let base = space.allocate_page(Some(PageKind::Heap)).unwrap();
//!
//! let mut set = SetSite::new("SET:ELEMENT:memory").unwrap();
//! let mut get = GetSite::new("GET:ELEMENT:memory").unwrap();
//! set.set(&space, base + 4, 7).unwrap();
//! assert_eq!(get.get(&space, base + 4).unwrap(), 7);
//! ```

use crate::address::{Address, PageId};
use crate::error::{Result, VmemError};
use crate::link::{
    self, Access, ElementGetter, ElementSetter, Linked, Operation, PageGetter, Signature, Value,
};
use crate::logging::VmemEvent;
use crate::page::PageHandle;
use crate::space::AddressSpace;

/// Accessor type a call site can cache
pub trait Linkable: Sized {
    /// Arguments of one call
    type Args: Copy;

    /// Result of one call
    type Output;

    /// Signature resolved for this accessor
    fn signature() -> Signature;

    /// Arguments as resolver values
    fn values(args: Self::Args) -> Vec<Value>;

    /// Take this accessor out of a resolver result
    fn from_linked(linked: Linked) -> Option<Self>;

    /// Run the guarded fast path
    fn invoke(&self, space: &AddressSpace, args: Self::Args) -> Access<Self::Output>;
}

impl Linkable for ElementGetter {
    type Args = Address;
    type Output = i32;

    fn signature() -> Signature {
        Signature::element_get()
    }

    fn values(addr: Address) -> Vec<Value> {
        vec![Value::Address(addr)]
    }

    fn from_linked(linked: Linked) -> Option<Self> {
        match linked {
            Linked::Get(getter) => Some(getter),
            _ => None,
        }
    }

    #[inline(always)]
    fn invoke(&self, space: &AddressSpace, addr: Address) -> Access<i32> {
        self.get(space, addr)
    }
}

impl Linkable for ElementSetter {
    type Args = (Address, i32);
    type Output = ();

    fn signature() -> Signature {
        Signature::element_set()
    }

    fn values((addr, value): (Address, i32)) -> Vec<Value> {
        vec![Value::Address(addr), Value::Int(value)]
    }

    fn from_linked(linked: Linked) -> Option<Self> {
        match linked {
            Linked::Set(setter) => Some(setter),
            _ => None,
        }
    }

    #[inline(always)]
    fn invoke(&self, space: &AddressSpace, (addr, value): (Address, i32)) -> Access<()> {
        self.set(space, addr, value)
    }
}

impl Linkable for PageGetter {
    type Args = PageId;
    type Output = PageHandle;

    fn signature() -> Signature {
        Signature::page_lookup()
    }

    fn values(page_id: PageId) -> Vec<Value> {
        vec![Value::PageId(page_id)]
    }

    fn from_linked(linked: Linked) -> Option<Self> {
        match linked {
            Linked::Page(pages) => Some(pages),
            _ => None,
        }
    }

    fn invoke(&self, space: &AddressSpace, page_id: PageId) -> Access<PageHandle> {
        self.get(space, page_id)
    }
}

/// Cache slot for one operation
#[derive(Debug)]
pub struct CallSite<L: Linkable> {
    name: String,
    operation: Operation,
    signature: Signature,
    cached: Option<L>,
    relinks: u64,
}

/// Element read call site
pub type GetSite = CallSite<ElementGetter>;

/// Element write call site
pub type SetSite = CallSite<ElementSetter>;

/// Page lookup call site
pub type PageSite = CallSite<PageGetter>;

impl<L: Linkable> CallSite<L> {
    /// Create an unlinked call site for `name`
    ///
    /// Fails with `UnsupportedOperation` if the name does not parse.
    pub fn new(name: &str) -> Result<Self> {
        let operation: Operation = name
            .parse()
            .map_err(|err: link::OperationParseError| VmemError::unsupported(name, err.to_string()))?;
        Ok(Self {
            name: name.to_string(),
            operation,
            signature: L::signature(),
            cached: None,
            relinks: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Check if an accessor is cached
    pub fn is_linked(&self) -> bool {
        self.cached.is_some()
    }

    /// Stale accessors discarded so far
    pub fn relink_count(&self) -> u64 {
        self.relinks
    }

    /// Drop the cached accessor
    pub fn unlink(&mut self) {
        self.cached = None;
    }

    /// Perform the operation
    pub fn call(&mut self, space: &AddressSpace, args: L::Args) -> Result<L::Output> {
        loop {
            if let Some(accessor) = &self.cached {
                match accessor.invoke(space, args) {
                    Access::Value(value) => return Ok(value),
                    Access::Relink => self.discard(space),
                }
            }
            self.relink(space, args)?;
        }
    }

    fn discard(&mut self, space: &AddressSpace) {
        self.cached = None;
        self.relinks += 1;
        space.stats().record_relink();
        log::trace!(
            "{} relinking in space {} ({} so far)",
            self.name,
            space.id(),
            self.relinks
        );
        space.emit(VmemEvent::Relinked {
            space: space.id().as_u64(),
            operation: self.name.clone(),
            relinks: self.relinks,
        });
    }

    fn relink(&mut self, space: &AddressSpace, args: L::Args) -> Result<()> {
        let linked = space
            .link(&self.operation, &self.signature, &L::values(args))?
            .ok_or_else(|| {
                VmemError::unsupported(
                    self.name.as_str(),
                    format!("no implementation for {}", self.signature),
                )
            })?;
        let accessor = L::from_linked(linked).ok_or_else(|| {
            VmemError::Internal(format!("{} resolved to the wrong accessor", self.name))
        })?;
        self.cached = Some(accessor);
        Ok(())
    }
}

impl CallSite<ElementGetter> {
    /// Read the element at `addr`
    #[inline]
    pub fn get(&mut self, space: &AddressSpace, addr: Address) -> Result<i32> {
        self.call(space, addr)
    }
}

impl CallSite<ElementSetter> {
    /// Write the element at `addr`
    #[inline]
    pub fn set(&mut self, space: &AddressSpace, addr: Address, value: i32) -> Result<()> {
        self.call(space, (addr, value))
    }
}

impl CallSite<PageGetter> {
    /// Look up page `page_id`
    pub fn page(&mut self, space: &AddressSpace, page_id: PageId) -> Result<PageHandle> {
        self.call(space, page_id)
    }
}
