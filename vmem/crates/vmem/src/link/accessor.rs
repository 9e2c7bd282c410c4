//! Guarded Accessors - Specialized Fast Paths with a Relink Signal
//!
//! An accessor is a function pointer monomorphized for one page
//! representation plus the guard it was linked under.
//!
//! Fast Path Logic:
//! ```text
//! if guard.owner != space.id       return Relink
//! if !guard.table.is_valid()       return Relink   // snapshot superseded
//! page_id = addr >> INDEX_BITS
//! if kinds[page_id] != KIND        return Relink   // also covers page_id >= len
//! return page.words[offset >> 2]
//! ```
//!
//! A stale accessor is never repaired in place. The holder drops it and
//! resolves again against the current snapshot (see [`crate::CallSite`]).

use crate::address::{self, Address, PageId};
use crate::page::{DirectPage, HeapPage, PageHandle, PageKind, PageRepr};
use crate::space::{AddressSpace, SpaceId};
use crate::table::PageTable;
use std::fmt;
use std::sync::Arc;

/// Outcome of a guarded access
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access<T> {
    /// Guard held; the access was performed
    Value(T),
    /// Guard failed; nothing was read or written
    Relink,
}

impl<T> Access<T> {
    pub fn is_relink(&self) -> bool {
        matches!(self, Access::Relink)
    }

    pub fn value(self) -> Option<T> {
        match self {
            Access::Value(v) => Some(v),
            Access::Relink => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Access<U> {
        match self {
            Access::Value(v) => Access::Value(f(v)),
            Access::Relink => Access::Relink,
        }
    }
}

/// Conditions an accessor was linked under
#[derive(Clone)]
pub struct Guard {
    owner: SpaceId,
    table: Arc<PageTable>,
    kind: PageKind,
}

impl Guard {
    pub(crate) fn new(owner: SpaceId, table: Arc<PageTable>, kind: PageKind) -> Self {
        Self { owner, table, kind }
    }

    /// Check that `space` is the owner and the bound snapshot is current
    #[inline(always)]
    pub fn holds(&self, space: &AddressSpace) -> bool {
        self.owner == space.id() && self.table.is_valid()
    }

    /// Speculated page kind
    pub fn kind(&self) -> PageKind {
        self.kind
    }

    pub fn owner(&self) -> SpaceId {
        self.owner
    }

    /// Bound snapshot
    pub fn table(&self) -> &Arc<PageTable> {
        &self.table
    }

    /// Page `page_id` if it is an `R` page of the bound snapshot
    #[inline(always)]
    fn page<R: PageRepr>(&self, page_id: PageId) -> Option<&R> {
        if self.table.kind_of(page_id)? != R::KIND {
            return None;
        }
        self.table.page(page_id).and_then(R::from_page)
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("owner", &self.owner)
            .field("generation", &self.table.generation())
            .field("kind", &self.kind)
            .finish()
    }
}

#[inline(always)]
fn get_element<R: PageRepr>(guard: &Guard, addr: Address) -> Access<i32> {
    match guard.page::<R>(address::page_id(addr)) {
        Some(page) => Access::Value(page.get_int(address::element_index(addr))),
        None => Access::Relink,
    }
}

#[inline(always)]
fn set_element<R: PageRepr>(guard: &Guard, addr: Address, value: i32) -> Access<()> {
    match guard.page::<R>(address::page_id(addr)) {
        Some(page) => {
            page.set_int(address::element_index(addr), value);
            Access::Value(())
        }
        None => Access::Relink,
    }
}

fn lookup_page<R: PageRepr>(guard: &Guard, page_id: PageId) -> Access<PageHandle> {
    if guard.page::<R>(page_id).is_none() {
        return Access::Relink;
    }
    match guard.table.page(page_id) {
        Some(page) => Access::Value(page.expose()),
        None => Access::Relink,
    }
}

/// Reads one element
#[derive(Clone)]
pub struct ElementGetter {
    guard: Guard,
    fast: fn(&Guard, Address) -> Access<i32>,
}

impl ElementGetter {
    pub(crate) fn specialize(guard: Guard) -> Self {
        let fast: fn(&Guard, Address) -> Access<i32> = match guard.kind {
            PageKind::Heap => get_element::<HeapPage>,
            PageKind::Direct => get_element::<DirectPage>,
        };
        Self { guard, fast }
    }

    #[inline]
    pub fn get(&self, space: &AddressSpace, addr: Address) -> Access<i32> {
        if !self.guard.holds(space) {
            return Access::Relink;
        }
        (self.fast)(&self.guard, addr)
    }

    pub fn guard(&self) -> &Guard {
        &self.guard
    }
}

/// Writes one element
#[derive(Clone)]
pub struct ElementSetter {
    guard: Guard,
    fast: fn(&Guard, Address, i32) -> Access<()>,
}

impl ElementSetter {
    pub(crate) fn specialize(guard: Guard) -> Self {
        let fast: fn(&Guard, Address, i32) -> Access<()> = match guard.kind {
            PageKind::Heap => set_element::<HeapPage>,
            PageKind::Direct => set_element::<DirectPage>,
        };
        Self { guard, fast }
    }

    #[inline]
    pub fn set(&self, space: &AddressSpace, addr: Address, value: i32) -> Access<()> {
        if !self.guard.holds(space) {
            return Access::Relink;
        }
        (self.fast)(&self.guard, addr, value)
    }

    pub fn guard(&self) -> &Guard {
        &self.guard
    }
}

/// Looks up a page by id
#[derive(Clone)]
pub struct PageGetter {
    guard: Guard,
    fast: fn(&Guard, PageId) -> Access<PageHandle>,
}

impl PageGetter {
    pub(crate) fn specialize(guard: Guard) -> Self {
        let fast: fn(&Guard, PageId) -> Access<PageHandle> = match guard.kind {
            PageKind::Heap => lookup_page::<HeapPage>,
            PageKind::Direct => lookup_page::<DirectPage>,
        };
        Self { guard, fast }
    }

    pub fn get(&self, space: &AddressSpace, page_id: PageId) -> Access<PageHandle> {
        if !self.guard.holds(space) {
            return Access::Relink;
        }
        (self.fast)(&self.guard, page_id)
    }

    pub fn guard(&self) -> &Guard {
        &self.guard
    }
}

macro_rules! impl_accessor_debug {
    ($($ty:ident),*) => {
        $(
            impl fmt::Debug for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.debug_struct(stringify!($ty))
                        .field("guard", &self.guard)
                        .finish()
                }
            }
        )*
    };
}

impl_accessor_debug!(ElementGetter, ElementSetter, PageGetter);

/// Accessor produced by the resolver
#[derive(Debug, Clone)]
pub enum Linked {
    Get(ElementGetter),
    Set(ElementSetter),
    Page(PageGetter),
}

impl Linked {
    pub fn guard(&self) -> &Guard {
        match self {
            Linked::Get(a) => a.guard(),
            Linked::Set(a) => a.guard(),
            Linked::Page(a) => a.guard(),
        }
    }

    /// Speculated page kind
    pub fn kind(&self) -> PageKind {
        self.guard().kind()
    }
}
