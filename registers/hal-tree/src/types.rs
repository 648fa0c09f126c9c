// Licensed under the Apache-2.0 license

//! Core data types for the HAL tree.
//!
//! The [`HalTree`] struct owns every node of one elaborated design. Nodes are
//! stored in an arena and refer to each other by index, so parents own their
//! children top-down while the child-to-parent link is a plain index.
//!
//! ```text
//! HalTree
//! ├── arena: Vec<HalNode>      # All nodes, in construction order
//! │   ├── AddrMap              # Address maps (the top node is always one)
//! │   ├── RegFile              # Register file containers
//! │   ├── Reg                  # Registers, made of fields
//! │   ├── Field                # Bit fields within registers
//! │   └── Mem                  # Memory regions
//! │
//! └── top: NodeIdx             # The generation root
//! ```
//!
//! Signals from the elaborated input have no counterpart here: they are
//! dropped while the tree is built.

use crate::elaborated::{ElabEnum, ElabKind, ElabNode};
use crate::error::{HalError, HalResult};
use log::{debug, warn};

/// Index into the node arena.
pub type NodeIdx = usize;

/// The five node kinds that make it into the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    AddrMap,
    RegFile,
    Reg,
    Field,
    Mem,
}

impl NodeKind {
    /// All node kinds, for dispatch in the emitter.
    pub const ALL: [NodeKind; 5] = [
        NodeKind::AddrMap,
        NodeKind::RegFile,
        NodeKind::Reg,
        NodeKind::Field,
        NodeKind::Mem,
    ];

    /// Whether nodes of this kind have an address of their own.
    pub fn is_addressable(self) -> bool {
        self != NodeKind::Field
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::AddrMap => write!(f, "addrmap"),
            NodeKind::RegFile => write!(f, "regfile"),
            NodeKind::Reg => write!(f, "reg"),
            NodeKind::Field => write!(f, "field"),
            NodeKind::Mem => write!(f, "mem"),
        }
    }
}

//=============================================================================
// Per-kind node data
//=============================================================================

/// A bit field within a register.
#[derive(Clone, Debug)]
pub struct FieldNode {
    pub lsb: usize,
    pub msb: usize,
    pub sw_readable: bool,
    pub sw_writable: bool,
    pub encode: Option<ElabEnum>,
}

/// A register. Access flags are the elaborator's aggregate over all fields.
#[derive(Clone, Debug)]
pub struct RegNode {
    pub has_sw_readable: bool,
    pub has_sw_writable: bool,
}

#[derive(Clone, Debug)]
pub struct RegFileNode;

/// A memory region.
#[derive(Clone, Debug)]
pub struct MemNode {
    /// Number of entries.
    pub entries: u64,
    /// Width of each entry in bits.
    pub width: u64,
}

impl MemNode {
    /// Total size in bytes, or `None` if it does not fit in 64 bits.
    pub fn size_bytes(&self) -> Option<u64> {
        self.entries.checked_mul(self.width).map(|bits| bits / 8)
    }
}

#[derive(Clone, Debug)]
pub struct AddrMapNode;

/// Kind-specific part of a node.
#[derive(Clone, Debug)]
pub enum AllNode {
    AddrMap(AddrMapNode),
    RegFile(RegFileNode),
    Reg(RegNode),
    Field(FieldNode),
    Mem(MemNode),
}

impl AllNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            AllNode::AddrMap(_) => NodeKind::AddrMap,
            AllNode::RegFile(_) => NodeKind::RegFile,
            AllNode::Reg(_) => NodeKind::Reg,
            AllNode::Field(_) => NodeKind::Field,
            AllNode::Mem(_) => NodeKind::Mem,
        }
    }

    pub fn as_field(&self) -> Option<&FieldNode> {
        if let AllNode::Field(field) = self {
            Some(field)
        } else {
            None
        }
    }

    pub fn as_reg(&self) -> Option<&RegNode> {
        if let AllNode::Reg(reg) = self {
            Some(reg)
        } else {
            None
        }
    }

    pub fn as_mem(&self) -> Option<&MemNode> {
        if let AllNode::Mem(mem) = self {
            Some(mem)
        } else {
            None
        }
    }
}

//=============================================================================
// HalNode - one arena entry
//=============================================================================

/// A node of the tree, as elaborated. Derived per-visit state (array index,
/// bus offset) lives in [`crate::traversal::NodeRef`], never here.
#[derive(Clone, Debug)]
pub struct HalNode {
    pub inst_name: String,
    pub orig_type_name: String,
    pub type_name: String,
    /// Offset from the parent as elaborated. For arrays, offset of element 0.
    pub local_offset: u64,
    pub array_dimensions: Vec<usize>,
    pub array_stride: u64,
    pub present: bool,
    pub desc: Option<String>,
    pub parent: Option<NodeIdx>,
    pub children: Vec<NodeIdx>,
    pub body: AllNode,
}

impl HalNode {
    pub fn kind(&self) -> NodeKind {
        self.body.kind()
    }

    pub fn is_array(&self) -> bool {
        !self.array_dimensions.is_empty()
    }
}

//=============================================================================
// HalTree - the arena
//=============================================================================

/// The whole node tree of one generation run.
///
/// Built once from the elaborated input and never modified afterwards.
#[derive(Clone, Debug)]
pub struct HalTree {
    arena: Vec<HalNode>,
    top: NodeIdx,
}

impl HalTree {
    /// Build the tree from the elaborated top node, which must be an addrmap.
    pub fn build(top: &ElabNode) -> HalResult<HalTree> {
        if top.kind != ElabKind::AddrMap {
            return Err(HalError::UnsupportedNodeKind {
                path: top.inst_name.clone(),
                kind: top.kind.to_string(),
            });
        }
        // The top node is always the first arena entry.
        let mut tree = HalTree {
            arena: Vec::new(),
            top: 0,
        };
        tree.add_node(top, None)?;
        debug!(
            "Built tree for '{}' with {} nodes",
            top.inst_name,
            tree.arena.len()
        );
        Ok(tree)
    }

    /// Wrap one elaborated node and its subtree. Returns `None` for signals.
    fn add_node(
        &mut self,
        elab: &ElabNode,
        parent: Option<NodeIdx>,
    ) -> HalResult<Option<NodeIdx>> {
        let body = match &elab.kind {
            ElabKind::AddrMap => AllNode::AddrMap(AddrMapNode),
            ElabKind::RegFile => AllNode::RegFile(RegFileNode),
            ElabKind::Reg => AllNode::Reg(RegNode {
                has_sw_readable: elab.sw_readable,
                has_sw_writable: elab.sw_writable,
            }),
            ElabKind::Field => AllNode::Field(FieldNode {
                lsb: elab.lsb,
                msb: elab.msb,
                sw_readable: elab.sw_readable,
                sw_writable: elab.sw_writable,
                encode: elab.encode.clone(),
            }),
            ElabKind::Mem => AllNode::Mem(MemNode {
                entries: elab.mementries,
                width: elab.memwidth,
            }),
            ElabKind::Signal => {
                warn!(
                    "Skipping signal '{}': signals are not supported",
                    elab.inst_name
                );
                return Ok(None);
            }
            ElabKind::Other(kind) => {
                let path = match parent {
                    Some(p) => format!("{}.{}", self.path(p), elab.inst_name),
                    None => elab.inst_name.clone(),
                };
                return Err(HalError::UnsupportedNodeKind {
                    path,
                    kind: kind.clone(),
                });
            }
        };

        let idx = self.arena.len();
        self.arena.push(HalNode {
            inst_name: elab.inst_name.clone(),
            orig_type_name: elab.orig_type_name().to_string(),
            type_name: elab.resolved_type_name().to_string(),
            local_offset: elab.address_offset,
            array_dimensions: elab.array_dimensions.clone(),
            array_stride: elab.array_stride,
            present: elab.ispresent,
            desc: elab.desc.clone(),
            parent,
            children: Vec::new(),
            body,
        });

        if !elab.ispresent {
            debug!("'{}' is not present", self.path(idx));
        }

        for child in &elab.children {
            if let Some(child_idx) = self.add_node(child, Some(idx))? {
                self.arena[idx].children.push(child_idx);
            }
        }

        if self.arena[idx].kind() == NodeKind::AddrMap {
            self.check_memory_container(idx)?;
        }
        Ok(Some(idx))
    }

    /// An addrmap holding a memory may hold nothing else addressable.
    fn check_memory_container(&self, addrmap: NodeIdx) -> HalResult<()> {
        let children = &self.arena[addrmap].children;
        let mem = children
            .iter()
            .copied()
            .find(|c| self.arena[*c].kind() == NodeKind::Mem);
        if let Some(mem) = mem {
            let sibling = children
                .iter()
                .copied()
                .find(|c| *c != mem && self.arena[*c].kind().is_addressable());
            if let Some(sibling) = sibling {
                return Err(HalError::InvalidContainerShape {
                    path: self.path(mem),
                    sibling: self.arena[sibling].inst_name.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn top(&self) -> NodeIdx {
        self.top
    }

    pub fn node(&self, idx: NodeIdx) -> &HalNode {
        &self.arena[idx]
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Dotted hierarchical path of a node, starting with the top instance name.
    pub fn path(&self, idx: NodeIdx) -> String {
        let mut names = vec![self.arena[idx].inst_name.as_str()];
        let mut current = self.arena[idx].parent;
        while let Some(p) = current {
            names.push(&self.arena[p].inst_name);
            current = self.arena[p].parent;
        }
        names.reverse();
        names.join(".")
    }

    /// Look up a node by dotted path, e.g. `"soc.uart0.ctrl"`.
    pub fn find(&self, path: &str) -> Option<NodeIdx> {
        let mut parts = path.split('.');
        if parts.next()? != self.arena[self.top].inst_name {
            return None;
        }
        let mut current = self.top;
        for part in parts {
            current = self.arena[current]
                .children
                .iter()
                .copied()
                .find(|c| self.arena[*c].inst_name == part)?;
        }
        Some(current)
    }

    /// Nearest addrmap strictly above `idx`.
    pub fn owning_addrmap(&self, idx: NodeIdx) -> HalResult<NodeIdx> {
        let mut current = self.arena[idx].parent;
        while let Some(p) = current {
            if self.arena[p].kind() == NodeKind::AddrMap {
                return Ok(p);
            }
            current = self.arena[p].parent;
        }
        Err(HalError::NoOwningAddrMap {
            path: self.path(idx),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn soc() -> ElabNode {
        ElabNode::addrmap("soc", 0).with_children(vec![
            ElabNode::addrmap("uart0", 0x1000).with_children(vec![
                ElabNode::reg("ctrl", 0x0)
                    .with_children(vec![ElabNode::field("en", 0, 0).sw(true, true)]),
                ElabNode::signal("irq"),
            ]),
            ElabNode::addrmap("sram", 0x8000)
                .with_children(vec![ElabNode::mem("data", 0, 256, 32)]),
        ])
    }

    #[test]
    fn test_build_drops_signals() {
        let tree = HalTree::build(&soc()).unwrap();
        // soc, uart0, ctrl, en, sram, data
        assert_eq!(tree.len(), 6);
        let uart = tree.find("soc.uart0").unwrap();
        assert_eq!(tree.node(uart).children.len(), 1);
        assert!(tree.find("soc.uart0.irq").is_none());
    }

    #[test]
    fn test_paths_and_parents() {
        let tree = HalTree::build(&soc()).unwrap();
        let en = tree.find("soc.uart0.ctrl.en").unwrap();
        assert_eq!(tree.path(en), "soc.uart0.ctrl.en");
        assert_eq!(tree.node(en).kind(), NodeKind::Field);
        assert_eq!(tree.owning_addrmap(en).unwrap(), tree.find("soc.uart0").unwrap());
        assert!(tree.node(tree.top()).parent.is_none());
        assert!(tree.find("other.uart0").is_none());
    }

    #[test]
    fn test_top_has_no_owning_addrmap() {
        let tree = HalTree::build(&soc()).unwrap();
        let err = tree.owning_addrmap(tree.top()).unwrap_err();
        assert_eq!(
            err,
            HalError::NoOwningAddrMap {
                path: "soc".to_string()
            }
        );
    }

    #[test]
    fn test_unsupported_kind() {
        let top = ElabNode::addrmap("soc", 0).with_children(vec![ElabNode::addrmap("blk", 0)
            .with_children(vec![ElabNode::new(ElabKind::Other("constraint".into()), "c")])]);
        let err = HalTree::build(&top).unwrap_err();
        assert_eq!(
            err,
            HalError::UnsupportedNodeKind {
                path: "soc.blk.c".to_string(),
                kind: "constraint".to_string(),
            }
        );

        let err = HalTree::build(&ElabNode::reg("r", 0)).unwrap_err();
        assert_eq!(err.path(), "r");
    }

    #[test]
    fn test_memory_must_be_alone() {
        let top = ElabNode::addrmap("soc", 0).with_children(vec![ElabNode::addrmap("sram", 0)
            .with_children(vec![
                ElabNode::mem("data", 0, 16, 32),
                ElabNode::reg("cfg", 0x100)
                    .with_children(vec![ElabNode::field("f", 0, 0).sw(true, true)]),
            ])]);
        let err = HalTree::build(&top).unwrap_err();
        assert_eq!(
            err,
            HalError::InvalidContainerShape {
                path: "soc.sram.data".to_string(),
                sibling: "cfg".to_string(),
            }
        );

        let top = ElabNode::addrmap("soc", 0).with_children(vec![
            ElabNode::mem("a", 0, 16, 32),
            ElabNode::mem("b", 0x40, 16, 32),
        ]);
        assert!(matches!(
            HalTree::build(&top),
            Err(HalError::InvalidContainerShape { .. })
        ));
    }

    #[test]
    fn test_memory_size() {
        let tree = HalTree::build(&soc()).unwrap();
        let data = tree.find("soc.sram.data").unwrap();
        let mem = tree.node(data).body.as_mem().unwrap();
        assert_eq!(mem.size_bytes(), Some(1024));
    }

    #[test]
    fn test_memory_size_odd_width() {
        let mem = MemNode {
            entries: 4,
            width: 12,
        };
        assert_eq!(mem.size_bytes(), Some(6));
        let huge = MemNode {
            entries: u64::MAX / 4,
            width: 32,
        };
        assert_eq!(huge.size_bytes(), None);
    }
}
