// Licensed under the Apache-2.0 license

//! Software access classification for fields and registers.

use crate::error::{HalError, HalResult};
use crate::traversal::NodeRef;
use crate::types::AllNode;

/// Software access rights of a field or register.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessRights {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl AccessRights {
    /// Classify a (readable, writable) pair. Neither is not a valid access.
    pub fn classify(readable: bool, writable: bool) -> Option<AccessRights> {
        match (readable, writable) {
            (true, true) => Some(AccessRights::ReadWrite),
            (false, true) => Some(AccessRights::WriteOnly),
            (true, false) => Some(AccessRights::ReadOnly),
            (false, false) => None,
        }
    }

    /// Short suffix used in generated type names.
    pub fn suffix(self) -> &'static str {
        match self {
            AccessRights::ReadOnly => "RO",
            AccessRights::WriteOnly => "WO",
            AccessRights::ReadWrite => "RW",
        }
    }

    pub fn is_readable(self) -> bool {
        self != AccessRights::WriteOnly
    }

    pub fn is_writable(self) -> bool {
        self != AccessRights::ReadOnly
    }
}

/// What the emitter dispatches on to pick a base type for a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessDescriptor {
    Field(AccessRights),
    Reg(AccessRights),
    /// Register files do not have access rights of their own; the registers
    /// inside them do. This descriptor only selects the regfile base type.
    RegFile,
}

impl AccessDescriptor {
    pub fn rights(self) -> Option<AccessRights> {
        match self {
            AccessDescriptor::Field(rights) | AccessDescriptor::Reg(rights) => Some(rights),
            AccessDescriptor::RegFile => None,
        }
    }
}

impl std::fmt::Display for AccessDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessDescriptor::Field(rights) => write!(f, "Field{}", rights.suffix()),
            AccessDescriptor::Reg(rights) => write!(f, "Reg{}", rights.suffix()),
            AccessDescriptor::RegFile => write!(f, "RegfileNode"),
        }
    }
}

impl NodeRef<'_> {
    /// Access descriptor of this node.
    ///
    /// Addrmaps and memories are not classified and return `None`.
    pub fn access(&self) -> HalResult<Option<AccessDescriptor>> {
        let no_access = || HalError::NoAccessRights { path: self.path() };
        match &self.node().body {
            AllNode::Field(field) => AccessRights::classify(field.sw_readable, field.sw_writable)
                .map(|rights| Some(AccessDescriptor::Field(rights)))
                .ok_or_else(no_access),
            AllNode::Reg(reg) => AccessRights::classify(reg.has_sw_readable, reg.has_sw_writable)
                .map(|rights| Some(AccessDescriptor::Reg(rights)))
                .ok_or_else(no_access),
            AllNode::RegFile(_) => Ok(Some(AccessDescriptor::RegFile)),
            AllNode::AddrMap(_) | AllNode::Mem(_) => Ok(None),
        }
    }
}
