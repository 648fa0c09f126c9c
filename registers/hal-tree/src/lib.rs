// Licensed under the Apache-2.0 license

//! Normalized register-map tree for HAL code generation.
//!
//! This crate takes an already elaborated register description (address maps,
//! register files, registers, memories and fields with resolved addresses and
//! array sizes) and turns it into a tree that a code emitter can consume
//! directly: bus address maps folded away, addresses resolved per array
//! element, access rights classified, enumerations deduplicated per address
//! map namespace and generic parameters described per node kind.
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use registers_hal_tree::{
//!     ElabNode, ExportConfig, HalExporter, HalTree, RenderContext, Renderer,
//! };
//!
//! struct Listing;
//!
//! impl Renderer for Listing {
//!     fn render(&mut self, ctx: &mut RenderContext<'_, '_>) -> anyhow::Result<String> {
//!         let mut out = ctx.utils.generate_file_header();
//!         for reg in ctx.node.descendants(ctx.traversal) {
//!             out += &format!("{}\n", reg.path());
//!         }
//!         Ok(out)
//!     }
//! }
//!
//! let json = std::fs::read_to_string("soc.json").unwrap();
//! let tree = HalTree::build(&ElabNode::from_json(&json).unwrap()).unwrap();
//! let exporter = HalExporter::new(&tree, ExportConfig::new().add_ext_module("gpio0"));
//! for file in exporter.render(&mut Listing, Path::new("out")).unwrap() {
//!     std::fs::write(&file.path, file.contents).unwrap();
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`elaborated`]: Input tree as handed over by the elaborator ([`ElabNode`])
//! - [`types`]: Node arena and tree construction ([`HalTree`])
//! - [`traversal`]: Filtered, unrolling, bus-skipping iteration ([`NodeRef`])
//! - [`address`]: Bus detection and address resolution
//! - [`access`]: Software access classification
//! - [`enums`]: Enumeration namespaces ([`EnumRegistry`])
//! - [`params`]: Generic parameter descriptors per node kind
//! - [`config`]: Export configuration ([`ExportConfig`])
//! - [`output`]: Renderer hand-off and file naming ([`HalExporter`])
//! - [`util`]: Naming and formatting helpers
//! - [`error`]: Error type ([`HalError`])

pub mod access;
pub mod address;
pub mod config;
pub mod elaborated;
pub mod enums;
pub mod error;
pub mod output;
pub mod params;
pub mod traversal;
pub mod types;
pub mod util;

pub use access::{AccessDescriptor, AccessRights};
pub use config::ExportConfig;
pub use elaborated::{ElabEnum, ElabKind, ElabNode};
pub use enums::{EnumDescriptor, EnumLookup, EnumRegistry};
pub use error::{HalError, HalResult};
pub use output::{GeneratedFile, HalExporter, HalUtils, RenderContext, Renderer};
pub use params::{ArgValue, ParamRole, TemplateArg, TemplateParam};
pub use traversal::{NodeRef, Traversal};
pub use types::{HalTree, NodeIdx, NodeKind};
