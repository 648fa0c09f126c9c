// Licensed under the Apache-2.0 license

//! Errors raised while building and querying the HAL tree.
//!
//! Every variant names the hierarchical path of the offending node. None of
//! these are recoverable: they abort generation of the current top node.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HalError {
    /// The elaborator handed over a node kind this generator does not handle.
    #[error("{path}: unsupported node kind '{kind}'")]
    UnsupportedNodeKind { path: String, kind: String },

    /// A field or register can neither be read nor written by software.
    #[error("{path}: node has no software access rights")]
    NoAccessRights { path: String },

    /// An addrmap holding a memory also holds another addressable node.
    #[error("{path}: addrmaps containing a memory may not contain any other addressable node (found '{sibling}')")]
    InvalidContainerShape { path: String, sibling: String },

    /// Address queried on an array node that has not been unrolled.
    #[error("{path}: array node has no single address, unroll it first")]
    UnresolvedArrayAddress { path: String },

    /// No addrmap encloses the node.
    #[error("{path}: no enclosing addrmap")]
    NoOwningAddrMap { path: String },

    /// Two different encodings share a name.
    #[error("{path}: enumeration '{name}' is already declared with different members")]
    EnumNamespaceCollision { path: String, name: String },

    /// Memory size does not fit in 64 bits.
    #[error("{path}: memory size overflows")]
    MemorySizeOverflow { path: String },

    /// A register without any present field has no width.
    #[error("{path}: register has no fields")]
    EmptyRegister { path: String },
}

impl HalError {
    /// Hierarchical path of the node that caused the error.
    pub fn path(&self) -> &str {
        match self {
            HalError::UnsupportedNodeKind { path, .. }
            | HalError::NoAccessRights { path }
            | HalError::InvalidContainerShape { path, .. }
            | HalError::UnresolvedArrayAddress { path }
            | HalError::NoOwningAddrMap { path }
            | HalError::EnumNamespaceCollision { path, .. }
            | HalError::MemorySizeOverflow { path }
            | HalError::EmptyRegister { path } => path,
        }
    }
}

pub type HalResult<T> = Result<T, HalError>;
