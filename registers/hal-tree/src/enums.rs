// Licensed under the Apache-2.0 license

//! Field enumerations and their per-addrmap namespaces.
//!
//! Every generated addrmap opens its own namespace, and an enumeration is
//! declared in the namespace of the nearest addrmap enclosing the field that
//! uses it. The [`EnumRegistry`] belongs to one generation run and records,
//! for each encoding name, the first descriptor registered under it and the
//! addrmaps that already declared it:
//!
//! - first use of a name: registered, reported as [`EnumLookup::Added`];
//! - same name again in an addrmap that declared it: [`EnumLookup::AlreadyPresent`],
//!   the emitter must not declare it twice;
//! - same name and members in another addrmap: [`EnumLookup::Added`] for that
//!   addrmap's namespace;
//! - same name with different members anywhere: [`HalError::EnumNamespaceCollision`].

use crate::elaborated::ElabEnum;
use crate::error::{HalError, HalResult};
use crate::traversal::NodeRef;
use crate::types::NodeIdx;
use log::debug;
use std::collections::HashMap;

/// Bit width reported for an enumeration whose largest value is zero.
pub const MIN_ENUM_BIT_WIDTH: u32 = 1;

/// One enumeration member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumMember {
    pub name: String,
    pub value: u64,
    pub desc: Option<String>,
}

/// An enumeration ready for emission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumDescriptor {
    pub name: String,
    pub members: Vec<EnumMember>,
    /// Bits needed to hold the largest member value.
    pub bit_width: u32,
}

impl EnumDescriptor {
    pub fn from_encode(encode: &ElabEnum) -> Self {
        let members: Vec<EnumMember> = encode
            .members
            .iter()
            .map(|m| EnumMember {
                name: m.name.clone(),
                value: m.value,
                desc: m.desc.clone(),
            })
            .collect();
        let max = members.iter().map(|m| m.value).max().unwrap_or(0);
        Self {
            name: encode.name.clone(),
            members,
            bit_width: bit_width(max),
        }
    }

    /// Same name and same (name, value) pairs, in order. Descriptions are not
    /// compared.
    pub fn same_encoding(&self, other: &EnumDescriptor) -> bool {
        self.name == other.name
            && self.members.len() == other.members.len()
            && self
                .members
                .iter()
                .zip(&other.members)
                .all(|(a, b)| a.name == b.name && a.value == b.value)
    }
}

/// Bit length of `value`, but at least [`MIN_ENUM_BIT_WIDTH`].
pub fn bit_width(value: u64) -> u32 {
    (u64::BITS - value.leading_zeros()).max(MIN_ENUM_BIT_WIDTH)
}

/// Outcome of resolving a field's enumeration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnumLookup {
    /// The field has no `encode` property.
    None,
    /// First declaration in the owning addrmap's namespace.
    Added(EnumDescriptor),
    /// Already declared in the owning addrmap's namespace.
    AlreadyPresent(EnumDescriptor),
}

impl EnumLookup {
    pub fn descriptor(&self) -> Option<&EnumDescriptor> {
        match self {
            EnumLookup::None => None,
            EnumLookup::Added(d) | EnumLookup::AlreadyPresent(d) => Some(d),
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, EnumLookup::Added(_))
    }
}

#[derive(Clone, Debug)]
struct RegisteredEnum {
    descriptor: EnumDescriptor,
    /// Addrmaps whose namespace declares this enumeration, first registrant first.
    owners: Vec<NodeIdx>,
}

/// Enumeration namespaces of one generation run.
#[derive(Clone, Debug, Default)]
pub struct EnumRegistry {
    enums: HashMap<String, RegisteredEnum>,
}

impl EnumRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the enumeration of `field` in its owning addrmap's namespace.
    pub fn resolve(&mut self, field: &NodeRef<'_>) -> HalResult<EnumLookup> {
        let Some(descriptor) = field.enum_descriptor() else {
            return Ok(EnumLookup::None);
        };
        let owner = field.tree().owning_addrmap(field.idx())?;

        match self.enums.get_mut(&descriptor.name) {
            None => {
                debug!(
                    "Enum '{}' registered by '{}'",
                    descriptor.name,
                    field.tree().path(owner)
                );
                self.enums.insert(
                    descriptor.name.clone(),
                    RegisteredEnum {
                        descriptor: descriptor.clone(),
                        owners: vec![owner],
                    },
                );
                Ok(EnumLookup::Added(descriptor))
            }
            Some(registered) if !registered.descriptor.same_encoding(&descriptor) => {
                Err(HalError::EnumNamespaceCollision {
                    path: field.path(),
                    name: descriptor.name,
                })
            }
            Some(registered) if registered.owners.contains(&owner) => {
                Ok(EnumLookup::AlreadyPresent(registered.descriptor.clone()))
            }
            Some(registered) => {
                registered.owners.push(owner);
                Ok(EnumLookup::Added(registered.descriptor.clone()))
            }
        }
    }

    /// Enumerations declared in one addrmap's namespace, sorted by name.
    pub fn namespace(&self, addrmap: NodeIdx) -> Vec<&EnumDescriptor> {
        let mut declared: Vec<&EnumDescriptor> = self
            .enums
            .values()
            .filter(|e| e.owners.contains(&addrmap))
            .map(|e| &e.descriptor)
            .collect();
        declared.sort_by(|a, b| a.name.cmp(&b.name));
        declared
    }

    /// The addrmap that first registered `name`.
    pub fn first_owner(&self, name: &str) -> Option<NodeIdx> {
        self.enums.get(name).and_then(|e| e.owners.first().copied())
    }

    pub fn get(&self, name: &str) -> Option<&EnumDescriptor> {
        self.enums.get(name).map(|e| &e.descriptor)
    }

    pub fn len(&self) -> usize {
        self.enums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enums.is_empty()
    }
}

impl NodeRef<'_> {
    /// Enumeration of this field, without registering it anywhere.
    pub fn enum_descriptor(&self) -> Option<EnumDescriptor> {
        self.node()
            .body
            .as_field()
            .and_then(|f| f.encode.as_ref())
            .map(EnumDescriptor::from_encode)
    }
}
