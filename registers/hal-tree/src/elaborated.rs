// Licensed under the Apache-2.0 license

//! Elaborated input tree.
//!
//! The elaborator resolves parameters, array sizes and addresses before this
//! crate runs. What it hands over is an owned [`ElabNode`] tree: every address
//! is already a number, every array dimension is known and every property has
//! been evaluated. The tree can be built in code with the constructors below or
//! loaded from a JSON dump with [`ElabNode::from_json`].
//!
//! ```
//! use registers_hal_tree::elaborated::ElabNode;
//!
//! let top = ElabNode::addrmap("soc", 0).with_children(vec![
//!     ElabNode::reg("ctrl", 0x0).with_children(vec![
//!         ElabNode::field("enable", 0, 0).sw(true, true),
//!     ]),
//! ]);
//! assert_eq!(top.children[0].children[0].width(), 1);
//! ```

use serde::{Deserialize, Serialize};

/// Kind of an elaborated node, as reported by the elaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElabKind {
    AddrMap,
    RegFile,
    Reg,
    Field,
    Mem,
    /// Signals carry no addressable state and are dropped during tree construction.
    Signal,
    /// Anything else the elaborator knows about but this crate does not.
    Other(String),
}

impl std::fmt::Display for ElabKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElabKind::AddrMap => write!(f, "addrmap"),
            ElabKind::RegFile => write!(f, "regfile"),
            ElabKind::Reg => write!(f, "reg"),
            ElabKind::Field => write!(f, "field"),
            ElabKind::Mem => write!(f, "mem"),
            ElabKind::Signal => write!(f, "signal"),
            ElabKind::Other(s) => write!(f, "{}", s),
        }
    }
}

/// One member of an enumeration encoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElabEnumMember {
    pub name: String,
    pub value: u64,
    #[serde(default)]
    pub desc: Option<String>,
}

/// An enumeration attached to a field through the `encode` property.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElabEnum {
    pub name: String,
    pub members: Vec<ElabEnumMember>,
}

impl ElabEnum {
    pub fn new(name: &str, members: &[(&str, u64)]) -> Self {
        Self {
            name: name.to_string(),
            members: members
                .iter()
                .map(|(name, value)| ElabEnumMember {
                    name: name.to_string(),
                    value: *value,
                    desc: None,
                })
                .collect(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// A fully elaborated hardware node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElabNode {
    pub kind: ElabKind,
    pub inst_name: String,

    /// Type name as written in the source, before parameter substitution.
    #[serde(default)]
    pub orig_type_name: Option<String>,

    /// Type name extended with parameter values. Falls back to `orig_type_name`.
    #[serde(default)]
    pub type_name: Option<String>,

    /// Byte offset from the parent. For arrays this is the offset of element 0.
    #[serde(default)]
    pub address_offset: u64,

    /// Array dimensions, empty if the node is not an array.
    #[serde(default)]
    pub array_dimensions: Vec<usize>,

    /// Byte distance between two consecutive array elements.
    #[serde(default)]
    pub array_stride: u64,

    #[serde(default = "default_true")]
    pub ispresent: bool,

    #[serde(default)]
    pub desc: Option<String>,

    /// Field: software read access. Register: any field is software readable.
    #[serde(default)]
    pub sw_readable: bool,

    /// Field: software write access. Register: any field is software writable.
    #[serde(default)]
    pub sw_writable: bool,

    /// Field low bit.
    #[serde(default)]
    pub lsb: usize,

    /// Field high bit.
    #[serde(default)]
    pub msb: usize,

    /// Memory entry count.
    #[serde(default)]
    pub mementries: u64,

    /// Memory entry width in bits.
    #[serde(default)]
    pub memwidth: u64,

    #[serde(default)]
    pub encode: Option<ElabEnum>,

    #[serde(default)]
    pub children: Vec<ElabNode>,
}

impl ElabNode {
    /// Create a node of the given kind with everything else defaulted.
    pub fn new(kind: ElabKind, inst_name: &str) -> Self {
        Self {
            kind,
            inst_name: inst_name.to_string(),
            orig_type_name: None,
            type_name: None,
            address_offset: 0,
            array_dimensions: vec![],
            array_stride: 0,
            ispresent: true,
            desc: None,
            sw_readable: false,
            sw_writable: false,
            lsb: 0,
            msb: 0,
            mementries: 0,
            memwidth: 0,
            encode: None,
            children: vec![],
        }
    }

    pub fn addrmap(inst_name: &str, offset: u64) -> Self {
        Self::new(ElabKind::AddrMap, inst_name).at(offset)
    }

    pub fn regfile(inst_name: &str, offset: u64) -> Self {
        Self::new(ElabKind::RegFile, inst_name).at(offset)
    }

    pub fn reg(inst_name: &str, offset: u64) -> Self {
        Self::new(ElabKind::Reg, inst_name).at(offset)
    }

    /// A field occupying bits `lsb..=msb`.
    pub fn field(inst_name: &str, lsb: usize, msb: usize) -> Self {
        let mut node = Self::new(ElabKind::Field, inst_name);
        node.lsb = lsb;
        node.msb = msb;
        node
    }

    pub fn mem(inst_name: &str, offset: u64, entries: u64, width: u64) -> Self {
        let mut node = Self::new(ElabKind::Mem, inst_name).at(offset);
        node.mementries = entries;
        node.memwidth = width;
        node
    }

    pub fn signal(inst_name: &str) -> Self {
        Self::new(ElabKind::Signal, inst_name)
    }

    pub fn at(mut self, offset: u64) -> Self {
        self.address_offset = offset;
        self
    }

    pub fn array(mut self, dimensions: &[usize], stride: u64) -> Self {
        self.array_dimensions = dimensions.to_vec();
        self.array_stride = stride;
        self
    }

    pub fn sw(mut self, readable: bool, writable: bool) -> Self {
        self.sw_readable = readable;
        self.sw_writable = writable;
        self
    }

    pub fn present(mut self, ispresent: bool) -> Self {
        self.ispresent = ispresent;
        self
    }

    pub fn desc(mut self, desc: &str) -> Self {
        self.desc = Some(desc.to_string());
        self
    }

    pub fn type_name(mut self, orig: &str) -> Self {
        self.orig_type_name = Some(orig.to_string());
        self
    }

    pub fn encode(mut self, encode: ElabEnum) -> Self {
        self.encode = Some(encode);
        self
    }

    /// Attach children. A register also takes the union of its fields'
    /// software access as its own aggregate access.
    pub fn with_children(mut self, children: Vec<ElabNode>) -> Self {
        if self.kind == ElabKind::Reg {
            let fields = children.iter().filter(|c| c.kind == ElabKind::Field);
            for field in fields {
                self.sw_readable |= field.sw_readable;
                self.sw_writable |= field.sw_writable;
            }
        }
        self.children = children;
        self
    }

    /// Field width in bits.
    pub fn width(&self) -> usize {
        self.msb + 1 - self.lsb
    }

    pub fn is_array(&self) -> bool {
        !self.array_dimensions.is_empty()
    }

    /// Original type name, or the instance name for anonymous declarations.
    pub fn orig_type_name(&self) -> &str {
        self.orig_type_name.as_deref().unwrap_or(&self.inst_name)
    }

    /// Parameter-resolved type name.
    pub fn resolved_type_name(&self) -> &str {
        self.type_name
            .as_deref()
            .unwrap_or_else(|| self.orig_type_name())
    }

    /// Load an elaborated tree from its JSON dump.
    pub fn from_json(json: &str) -> Result<ElabNode, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reg_access_is_union_of_fields() {
        let reg = ElabNode::reg("status", 0).with_children(vec![
            ElabNode::field("a", 0, 0).sw(true, false),
            ElabNode::field("b", 1, 1).sw(false, true),
        ]);
        assert!(reg.sw_readable);
        assert!(reg.sw_writable);

        let reg = ElabNode::reg("ro", 0)
            .with_children(vec![ElabNode::field("a", 0, 3).sw(true, false)]);
        assert!(reg.sw_readable);
        assert!(!reg.sw_writable);
    }

    #[test]
    fn test_type_name_fallbacks() {
        let anon = ElabNode::reg("ctrl", 0);
        assert_eq!(anon.orig_type_name(), "ctrl");
        assert_eq!(anon.resolved_type_name(), "ctrl");

        let typed = ElabNode::reg("ctrl", 0).type_name("ctrl_t");
        assert_eq!(typed.orig_type_name(), "ctrl_t");
        assert_eq!(typed.resolved_type_name(), "ctrl_t");
    }

    #[test]
    fn test_from_json() {
        let json = r#"
        {
            "kind": "addrmap",
            "inst_name": "spi",
            "children": [
                {
                    "kind": "reg",
                    "inst_name": "ctrl",
                    "address_offset": 4,
                    "sw_readable": true,
                    "children": [
                        { "kind": "field", "inst_name": "en", "lsb": 0, "msb": 0, "sw_readable": true }
                    ]
                },
                { "kind": "signal", "inst_name": "irq" },
                { "kind": { "other": "constraint" }, "inst_name": "c0" }
            ]
        }"#;
        let top = ElabNode::from_json(json).unwrap();
        assert_eq!(top.kind, ElabKind::AddrMap);
        assert!(top.ispresent);
        assert_eq!(top.children.len(), 3);
        assert_eq!(top.children[0].address_offset, 4);
        assert_eq!(top.children[1].kind, ElabKind::Signal);
        assert_eq!(
            top.children[2].kind,
            ElabKind::Other("constraint".to_string())
        );
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(ElabNode::from_json("{ \"kind\": 3 }").is_err());
    }
}
