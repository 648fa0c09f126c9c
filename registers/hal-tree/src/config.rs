// Licensed under the Apache-2.0 license

//! Configuration for HAL export.
//!
//! [`ExportConfig`] controls which addrmaps are emitted, how generated files
//! are named and which support headers accompany them.

/// Configuration for a HAL export run.
///
/// # Example
///
/// ```
/// use registers_hal_tree::config::ExportConfig;
///
/// let config = ExportConfig::new()
///     .keep_buses(true)
///     .add_ext_module("gpio0")
///     .file_extension("hpp");
/// assert!(config.has_extern("gpio0"));
/// assert!(!config.has_extern("uart0"));
/// assert_eq!(config.file_extension, "hpp");
/// ```
#[derive(Clone, Debug)]
pub struct ExportConfig {
    /// Emit bus addrmaps (addrmaps containing only addrmaps) instead of
    /// folding them into their children.
    pub keep_buses: bool,

    /// Addrmap instance names that have hand-written extensions.
    pub ext_modules: Vec<String>,

    /// Extension of generated files, without the dot.
    pub file_extension: String,

    /// Subdirectory of the output directory holding the support headers.
    pub include_dir: String,

    /// Static support headers copied next to the generated files.
    pub support_files: Vec<String>,

    /// Tool name written into generated file headers.
    pub tool_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            keep_buses: false,
            ext_modules: vec![],
            file_extension: "h".to_string(),
            include_dir: "include".to_string(),
            support_files: vec!["halcpp_base.h".to_string()],
            tool_name: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

impl ExportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keep_buses(mut self, keep: bool) -> Self {
        self.keep_buses = keep;
        self
    }

    /// Mark an addrmap instance as having hand-written extensions.
    pub fn add_ext_module(mut self, inst_name: &str) -> Self {
        self.ext_modules.push(inst_name.to_string());
        self
    }

    pub fn file_extension(mut self, extension: &str) -> Self {
        self.file_extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn include_dir(mut self, dir: &str) -> Self {
        self.include_dir = dir.to_string();
        self
    }

    /// Replace the list of support headers.
    pub fn support_files(mut self, files: &[&str]) -> Self {
        self.support_files = files.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn tool_name(mut self, name: &str) -> Self {
        self.tool_name = name.to_string();
        self
    }

    /// Whether the addrmap instance is listed as having extensions.
    pub fn has_extern(&self, inst_name: &str) -> bool {
        self.ext_modules.iter().any(|m| m == inst_name)
    }
}
