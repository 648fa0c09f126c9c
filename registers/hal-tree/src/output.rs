// Licensed under the Apache-2.0 license

//! Hand-off to the emission layer.
//!
//! The tree is turned into files by an external [`Renderer`] (a template
//! engine, typically). This module decides which addrmaps get a file, how
//! those files are named, and what each render call can see:
//!
//! ```text
//! HalTree ──► HalExporter::retained_addrmaps()
//!               │
//!               ├── list_files(outdir)   → paths only, nothing rendered
//!               └── render(renderer)     → RenderContext per addrmap
//!                                           ├── node      (NodeRef)
//!                                           ├── kinds     (NodeKind::ALL)
//!                                           ├── utils     (HalUtils)
//!                                           └── enums     (EnumRegistry)
//! ```

use crate::config::ExportConfig;
use crate::enums::{EnumDescriptor, EnumLookup, EnumRegistry};
use crate::error::HalResult;
use crate::traversal::{NodeRef, Traversal};
use crate::types::{HalTree, NodeKind};
use crate::util::{desc_lines, hal_name};
use anyhow::Context;
use chrono::{DateTime, Local};
use log::{debug, info};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

//=============================================================================
// Naming and lookup helpers
//=============================================================================

/// Helpers handed to the renderer.
#[derive(Clone, Copy, Debug)]
pub struct HalUtils<'c> {
    config: &'c ExportConfig,
}

impl<'c> HalUtils<'c> {
    pub fn new(config: &'c ExportConfig) -> Self {
        Self { config }
    }

    /// Lower-cased instance name with the `_hal` suffix.
    pub fn hal_name(&self, node: &NodeRef<'_>) -> String {
        hal_name(node.inst_name())
    }

    /// Whether the node is listed as having hand-written extensions.
    pub fn has_extern(&self, node: &NodeRef<'_>) -> bool {
        self.config.has_extern(node.inst_name())
    }

    /// Name under which the node is exposed: the extension's name when it has
    /// one, the generated HAL name otherwise.
    pub fn extern_name(&self, node: &NodeRef<'_>) -> String {
        if self.has_extern(node) {
            node.inst_name().to_string()
        } else {
            self.hal_name(node)
        }
    }

    /// Stem of the file a parent includes for this node, without extension.
    pub fn include_stem(&self, node: &NodeRef<'_>) -> String {
        if self.has_extern(node) {
            format!("{}_ext", node.inst_name().to_lowercase())
        } else {
            self.hal_name(node)
        }
    }

    /// [`Self::include_stem`] plus the configured extension.
    pub fn include_file(&self, node: &NodeRef<'_>) -> String {
        format!("{}.{}", self.include_stem(node), self.config.file_extension)
    }

    /// Name of the file generated for an addrmap.
    pub fn file_name(&self, node: &NodeRef<'_>) -> String {
        format!("{}.{}", self.hal_name(node), self.config.file_extension)
    }

    /// Header comment for generated files, stamped with the current user and
    /// local time.
    pub fn generate_file_header(&self) -> String {
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string());
        self.file_header(&user, Local::now())
    }

    pub fn file_header(&self, user: &str, at: DateTime<Local>) -> String {
        format!(
            "// Generated with {}\n// By user: {} at: {}\n",
            self.config.tool_name,
            user,
            at.format("%Y-%m-%d %H:%M:%S")
        )
    }

    /// Description of the node split into comment lines, empty without one.
    pub fn doc_lines<'t>(&self, node: &NodeRef<'t>) -> Vec<&'t str> {
        node.desc().map(desc_lines).unwrap_or_default()
    }

    /// One node per type name, keeping the first node seen for each.
    pub fn unique_type_nodes<'t>(
        &self,
        nodes: impl IntoIterator<Item = NodeRef<'t>>,
    ) -> Vec<NodeRef<'t>> {
        let mut seen = HashSet::new();
        nodes
            .into_iter()
            .filter(|node| seen.insert(node.type_name()))
            .collect()
    }

    /// Register a field's enumeration in its addrmap's namespace.
    pub fn node_enum(
        &self,
        enums: &mut EnumRegistry,
        field: &NodeRef<'_>,
    ) -> HalResult<EnumLookup> {
        enums.resolve(field)
    }

    /// Enumerations declared so far in an addrmap's namespace.
    pub fn namespace_enums<'e>(
        &self,
        enums: &'e EnumRegistry,
        addrmap: &NodeRef<'_>,
    ) -> Vec<&'e EnumDescriptor> {
        enums.namespace(addrmap.idx())
    }
}

//=============================================================================
// Rendering
//=============================================================================

/// Everything a renderer sees while producing one addrmap's file.
#[derive(Debug)]
pub struct RenderContext<'a, 't> {
    /// The addrmap being rendered.
    pub node: NodeRef<'t>,
    /// Node kinds to dispatch on.
    pub kinds: &'static [NodeKind],
    pub utils: HalUtils<'a>,
    /// Enumerations of the whole run.
    pub enums: &'a mut EnumRegistry,
    /// Options to use when walking below `node`.
    pub traversal: Traversal,
}

impl RenderContext<'_, '_> {
    /// Resolve a field's enumeration against the run's registry.
    pub fn node_enum(&mut self, field: &NodeRef<'_>) -> HalResult<EnumLookup> {
        self.utils.node_enum(self.enums, field)
    }
}

/// Turns one addrmap into the text of its generated file.
pub trait Renderer {
    fn render(&mut self, ctx: &mut RenderContext<'_, '_>) -> anyhow::Result<String>;
}

/// A rendered file, not yet written anywhere.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub contents: String,
}

//=============================================================================
// Exporter
//=============================================================================

/// Drives a [`Renderer`] over the addrmaps of a tree.
#[derive(Debug)]
pub struct HalExporter<'t> {
    tree: &'t HalTree,
    config: ExportConfig,
}

impl<'t> HalExporter<'t> {
    pub fn new(tree: &'t HalTree, config: ExportConfig) -> Self {
        Self { tree, config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn utils(&self) -> HalUtils<'_> {
        HalUtils::new(&self.config)
    }

    /// Traversal options used to find and walk emitted addrmaps.
    pub fn traversal(&self) -> Traversal {
        Traversal::new().skip_buses(!self.config.keep_buses)
    }

    /// Addrmaps that get a file of their own: every present addrmap below the
    /// top (buses folded away unless kept), followed by the top itself.
    pub fn retained_addrmaps(&self) -> Vec<NodeRef<'t>> {
        let top = NodeRef::top(self.tree);
        let mut retained: Vec<NodeRef<'t>> = top
            .descendants_of_type(NodeKind::AddrMap, self.traversal())
            .collect();
        retained.push(top);
        for node in &retained {
            debug!("Retained addrmap '{}' (bus: {})", node.path(), node.is_bus());
        }
        retained
    }

    /// Paths that an export into `outdir` would produce: support headers
    /// first, then one file per retained addrmap.
    pub fn list_files(&self, outdir: &Path) -> Vec<PathBuf> {
        let utils = self.utils();
        let support = self
            .config
            .support_files
            .iter()
            .map(|f| outdir.join(&self.config.include_dir).join(f));
        let generated = self
            .retained_addrmaps()
            .into_iter()
            .map(|node| outdir.join(utils.file_name(&node)));
        let files: Vec<PathBuf> = support.chain(generated).collect();
        for file in &files {
            info!("{}", file.display());
        }
        files
    }

    /// Render every retained addrmap into a file under `outdir`.
    ///
    /// One enumeration registry is shared across the whole run.
    pub fn render(
        &self,
        renderer: &mut dyn Renderer,
        outdir: &Path,
    ) -> anyhow::Result<Vec<GeneratedFile>> {
        let utils = self.utils();
        let mut enums = EnumRegistry::new();
        let mut files = vec![];
        for node in self.retained_addrmaps() {
            let path = outdir.join(utils.file_name(&node));
            let mut ctx = RenderContext {
                node: node.clone(),
                kinds: &NodeKind::ALL,
                utils,
                enums: &mut enums,
                traversal: self.traversal(),
            };
            let contents = renderer
                .render(&mut ctx)
                .with_context(|| format!("Failed to render addrmap '{}'", node.path()))?;
            info!("Generated {}", path.display());
            files.push(GeneratedFile { path, contents });
        }
        Ok(files)
    }
}
