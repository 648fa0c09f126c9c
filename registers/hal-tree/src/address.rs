// Licensed under the Apache-2.0 license

//! Address resolution and bus folding.
//!
//! A *bus* is an addrmap whose present children are all addrmaps. Buses carry
//! no registers of their own, so the emitted hierarchy can drop them: when a
//! traversal runs with `skip_buses`, a bus is replaced by its children and its
//! address offset is added to theirs through the bus offset. Nested buses
//! compound, so a register's parent always ends up with its address relative
//! to the nearest kept ancestor.
//!
//! ```text
//! top                          top
//! └── periph (bus) @ 0x1000    ├── uart0 @ 0x1000  (bus offset 0x1000)
//!     ├── uart0 @ 0x0     →    └── uart1 @ 0x1100  (bus offset 0x1000)
//!     └── uart1 @ 0x100
//! ```
//!
//! The top node is never a bus, so the generation root is always kept.

use crate::error::{HalError, HalResult};
use crate::traversal::{flat_index, NodeRef};
use crate::types::{HalTree, NodeIdx, NodeKind};
use crate::util::hex_const;
use log::debug;

impl<'t> NodeRef<'t> {
    /// Whether this is the generation root.
    pub fn is_top(&self) -> bool {
        self.node().parent.is_none()
    }

    /// Whether this addrmap only groups other addrmaps.
    ///
    /// Absent children do not count. Re-evaluated on each call.
    pub fn is_bus(&self) -> bool {
        if self.kind() != NodeKind::AddrMap || self.is_top() {
            return false;
        }
        let tree = self.tree();
        self.node()
            .children
            .iter()
            .map(|c| tree.node(*c))
            .filter(|c| c.present)
            .all(|c| c.kind() == NodeKind::AddrMap)
    }

    /// Offset from the parent as elaborated, moved to this instance's array
    /// position when the node was unrolled. Fields have no offset.
    pub fn local_offset(&self) -> u64 {
        let node = self.node();
        if node.kind() == NodeKind::Field {
            return 0;
        }
        match self.current_index() {
            Some(index) => {
                let flat = flat_index(&node.array_dimensions, index) as u64;
                node.local_offset + flat * node.array_stride
            }
            None => node.local_offset,
        }
    }

    pub(crate) fn resolved_offset(&self) -> Option<u64> {
        match self.kind() {
            NodeKind::Field => Some(0),
            _ if self.is_resolved() => Some(self.bus_offset() + self.local_offset()),
            _ => None,
        }
    }

    /// Address offset relative to the parent in the emitted hierarchy.
    ///
    /// Fields always report 0. Array nodes must be unrolled first.
    pub fn address_offset(&self) -> HalResult<u64> {
        self.resolved_offset()
            .ok_or_else(|| HalError::UnresolvedArrayAddress { path: self.path() })
    }

    /// Parent this node hangs under in the hierarchy it was visited in.
    ///
    /// A bus ancestor is skipped only when the traversal that produced this
    /// visit folded it, so the parent always matches the base in
    /// [`Self::address_offset`]. A node built with [`NodeRef::new`] reports
    /// its arena parent.
    pub fn emitted_parent(&self) -> Option<NodeRef<'t>> {
        self.emitted_parent_idx()
            .map(|p| NodeRef::new(self.tree(), p))
    }
}

impl HalTree {
    /// Arena indices of every bus addrmap, in construction order.
    pub fn buses(&self) -> Vec<NodeIdx> {
        let buses: Vec<NodeIdx> = (0..self.len())
            .filter(|idx| NodeRef::new(self, *idx).is_bus())
            .collect();
        for bus in &buses {
            debug!(
                "Bus '{}' at offset {}",
                self.path(*bus),
                hex_const(self.node(*bus).local_offset)
            );
        }
        buses
    }
}
