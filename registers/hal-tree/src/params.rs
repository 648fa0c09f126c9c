// Licensed under the Apache-2.0 license

//! Generic parameters of the type generated for each node.
//!
//! The parameters are returned as data; rendering them into a concrete
//! generic-parameter syntax is up to the emitter.
//!
//! | Kind            | Parameters                              |
//! |-----------------|-----------------------------------------|
//! | AddrMap         | `BASE`, `PARENT_TYPE`                   |
//! | AddrMap (top)   | `BASE`, `PARENT_TYPE` (default `none`)  |
//! | RegFile         | `BASE`, `PARENT_TYPE`                   |
//! | Reg             | `BASE`, `WIDTH`, `PARENT_TYPE`          |
//! | Mem             | `BASE`, `SIZE`, `PARENT_TYPE`           |
//! | Field           | none                                    |

use crate::error::{HalError, HalResult};
use crate::traversal::NodeRef;
use crate::types::{AllNode, NodeKind};

/// Default for the parent type of the top addrmap.
pub const NO_PARENT: &str = "none";

/// What a generic parameter stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamRole {
    /// Base address of the node.
    Base,
    /// Register width in bits.
    Width,
    /// Memory size in bytes.
    Size,
    /// Type of the enclosing node.
    Parent,
}

/// One generic parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TemplateParam {
    pub name: &'static str,
    pub role: ParamRole,
    pub default: Option<&'static str>,
}

const BASE: TemplateParam = TemplateParam {
    name: "BASE",
    role: ParamRole::Base,
    default: None,
};

const WIDTH: TemplateParam = TemplateParam {
    name: "WIDTH",
    role: ParamRole::Width,
    default: None,
};

const SIZE: TemplateParam = TemplateParam {
    name: "SIZE",
    role: ParamRole::Size,
    default: None,
};

const PARENT: TemplateParam = TemplateParam {
    name: "PARENT_TYPE",
    role: ParamRole::Parent,
    default: None,
};

const TOP_PARENT: TemplateParam = TemplateParam {
    default: Some(NO_PARENT),
    ..PARENT
};

/// Ordered generic parameters for a node kind.
pub fn template_params(kind: NodeKind, is_top: bool) -> Vec<TemplateParam> {
    match kind {
        NodeKind::AddrMap if is_top => vec![BASE, TOP_PARENT],
        NodeKind::AddrMap | NodeKind::RegFile => vec![BASE, PARENT],
        NodeKind::Reg => vec![BASE, WIDTH, PARENT],
        NodeKind::Mem => vec![BASE, SIZE, PARENT],
        NodeKind::Field => vec![],
    }
}

/// Value bound to a generic parameter for one node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgValue {
    Int(u64),
    Type(String),
}

/// A generic parameter together with its value for one node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateArg {
    pub param: TemplateParam,
    pub value: ArgValue,
}

impl NodeRef<'_> {
    pub fn template_params(&self) -> Vec<TemplateParam> {
        template_params(self.kind(), self.is_top())
    }

    /// Bind each generic parameter to this node's value.
    ///
    /// The parent type is the emitted parent's type name, so it names a bus
    /// exactly when the base is relative to that bus.
    pub fn template_args(&self) -> HalResult<Vec<TemplateArg>> {
        self.template_params()
            .into_iter()
            .map(|param| -> HalResult<TemplateArg> {
                let value = match param.role {
                    ParamRole::Base => ArgValue::Int(self.address_offset()?),
                    ParamRole::Width => ArgValue::Int(self.width()? as u64),
                    ParamRole::Size => ArgValue::Int(match &self.node().body {
                        AllNode::Mem(mem) => mem
                            .size_bytes()
                            .ok_or_else(|| HalError::MemorySizeOverflow { path: self.path() })?,
                        _ => 0,
                    }),
                    ParamRole::Parent => ArgValue::Type(match self.emitted_parent() {
                        Some(parent) => parent.type_name().to_string(),
                        None => param.default.unwrap_or(NO_PARENT).to_string(),
                    }),
                };
                Ok(TemplateArg { param, value })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elaborated::ElabNode;
    use crate::traversal::Traversal;
    use crate::types::HalTree;

    fn names(params: &[TemplateParam]) -> Vec<&'static str> {
        params.iter().map(|p| p.name).collect()
    }

    #[test]
    fn test_params_per_kind() {
        assert_eq!(names(&template_params(NodeKind::AddrMap, false)), ["BASE", "PARENT_TYPE"]);
        assert_eq!(names(&template_params(NodeKind::RegFile, false)), ["BASE", "PARENT_TYPE"]);
        assert_eq!(
            names(&template_params(NodeKind::Reg, false)),
            ["BASE", "WIDTH", "PARENT_TYPE"]
        );
        assert_eq!(
            names(&template_params(NodeKind::Mem, false)),
            ["BASE", "SIZE", "PARENT_TYPE"]
        );
        assert!(template_params(NodeKind::Field, false).is_empty());

        let top = template_params(NodeKind::AddrMap, true);
        assert_eq!(top[1].role, ParamRole::Parent);
        assert_eq!(top[1].default, Some(NO_PARENT));
        assert_eq!(template_params(NodeKind::AddrMap, false)[1].default, None);
    }

    #[test]
    fn test_template_args() {
        let tree = HalTree::build(&ElabNode::addrmap("soc", 0).type_name("soc_t").with_children(vec![
            ElabNode::addrmap("bus", 0x4000_0000).with_children(vec![ElabNode::addrmap("spi", 0x100)
                .type_name("spi_t")
                .with_children(vec![ElabNode::reg("ctrl", 0x8).with_children(vec![
                    ElabNode::field("en", 0, 0).sw(true, true),
                    ElabNode::field("mode", 4, 5).sw(true, true),
                ])])]),
            ElabNode::addrmap("sram", 0x2000_0000)
                .with_children(vec![ElabNode::mem("data", 0x0, 1024, 32)]),
        ]))
        .unwrap();

        let top = NodeRef::top(&tree);
        let args = top.template_args().unwrap();
        assert_eq!(args[0].value, ArgValue::Int(0));
        assert_eq!(args[1].value, ArgValue::Type("none".to_string()));

        let ctrl = NodeRef::new(&tree, tree.find("soc.bus.spi.ctrl").unwrap());
        let values: Vec<_> = ctrl.template_args().unwrap().into_iter().map(|a| a.value).collect();
        assert_eq!(
            values,
            vec![
                ArgValue::Int(0x8),
                ArgValue::Int(6),
                ArgValue::Type("spi_t".to_string())
            ]
        );

        let spi = NodeRef::new(&tree, tree.find("soc.bus.spi").unwrap());
        let args = spi.template_args().unwrap();
        assert_eq!(args[0].value, ArgValue::Int(0x100));
        assert_eq!(args[1].value, ArgValue::Type("bus".to_string()));

        let folded = Traversal::new().skip_buses(true);
        let spi = top.children_of_type(NodeKind::AddrMap, folded).next().unwrap();
        let args = spi.template_args().unwrap();
        assert_eq!(args[0].value, ArgValue::Int(0x4000_0100));
        assert_eq!(args[1].value, ArgValue::Type("soc_t".to_string()));

        let data = NodeRef::new(&tree, tree.find("soc.sram.data").unwrap());
        assert_eq!(data.template_args().unwrap()[1].value, ArgValue::Int(4096));
    }

    #[test]
    fn test_memory_size_overflow() {
        let tree = HalTree::build(&ElabNode::addrmap("soc", 0).with_children(vec![
            ElabNode::addrmap("sram", 0).with_children(vec![ElabNode::mem("data", 0, u64::MAX, 64)]),
        ]))
        .unwrap();
        let data = NodeRef::new(&tree, tree.find("soc.sram.data").unwrap());
        assert_eq!(
            data.template_args(),
            Err(HalError::MemorySizeOverflow {
                path: "soc.sram.data".to_string()
            })
        );
    }

    #[test]
    fn test_template_args_need_resolved_node() {
        let tree = HalTree::build(&ElabNode::addrmap("soc", 0).with_children(vec![ElabNode::reg("r", 0)
            .array(&[4], 4)
            .with_children(vec![ElabNode::field("f", 0, 0).sw(true, false)])]))
        .unwrap();
        let r = NodeRef::new(&tree, tree.find("soc.r").unwrap());
        assert!(matches!(
            r.template_args(),
            Err(HalError::UnresolvedArrayAddress { .. })
        ));
        let first = r.unrolled().next().unwrap();
        assert_eq!(first.template_args().unwrap()[0].value, ArgValue::Int(0));
    }
}
