//! Construction-time settings for the two backends.

use std::path::{Path, PathBuf};

/// Banner lines the shell prints before the header when the payload starts
/// with the extension-load statement: the `load_extension(..)` header and
/// its NULL result row.
pub const HEADER_OFFSET_WITH_EXTENSION: usize = 2;

/// Banner lines before the header when no extension-load statement is sent.
///
/// Only the interactive shell prints a multi-line startup banner. A shell
/// given its SQL as an argument, as every invocation here is, prints none,
/// so the header is the first line. Shells that print one need
/// [`ShellConfig::with_header_offsets`].
pub const HEADER_OFFSET_WITHOUT_EXTENSION: usize = 0;

/// Directory holding the bundled shell and extension module.
pub const DEFAULT_INSTALL_DIR: &str = "bin/x64";

const SHELL_BINARY: &str = if cfg!(windows) { "sqlite3.exe" } else { "sqlite3" };
const EXTENSION_MODULE: &str = "mod_spatialite";

/// Settings for [`crate::drivers::ShellDriver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub binary: PathBuf,
    /// Module loaded by prefixing every payload with `SELECT load_extension(..);`.
    pub extension: Option<PathBuf>,
    pub header_offset_with_extension: usize,
    pub header_offset_without_extension: usize,
    /// Run `InitSpatialMetadata()` when the database file does not exist yet.
    pub init_spatial_metadata: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self::installed_in(DEFAULT_INSTALL_DIR)
    }
}

impl ShellConfig {
    /// Shell and extension module from `dir`.
    pub fn installed_in(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            binary: dir.join(SHELL_BINARY),
            extension: Some(dir.join(EXTENSION_MODULE)),
            header_offset_with_extension: HEADER_OFFSET_WITH_EXTENSION,
            header_offset_without_extension: HEADER_OFFSET_WITHOUT_EXTENSION,
            init_spatial_metadata: true,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_extension(mut self, extension: impl Into<PathBuf>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    /// Send payloads without the extension-load prefix, e.g. for a shell
    /// with the spatial functions compiled in.
    pub fn without_extension(mut self) -> Self {
        self.extension = None;
        self
    }

    pub fn with_header_offsets(mut self, with_extension: usize, without_extension: usize) -> Self {
        self.header_offset_with_extension = with_extension;
        self.header_offset_without_extension = without_extension;
        self
    }

    pub fn with_init_spatial_metadata(mut self, init: bool) -> Self {
        self.init_spatial_metadata = init;
        self
    }

    /// The header offset that applies to every invocation under this config.
    pub fn header_offset(&self) -> usize {
        if self.extension.is_some() {
            self.header_offset_with_extension
        } else {
            self.header_offset_without_extension
        }
    }
}

/// Settings for [`crate::drivers::NativeDriver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeConfig {
    /// Module path or bare name resolved by the dynamic loader.
    pub extension: Option<PathBuf>,
    pub init_spatial_metadata: bool,
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            extension: Some(PathBuf::from(EXTENSION_MODULE)),
            init_spatial_metadata: true,
        }
    }
}

impl NativeConfig {
    pub fn with_extension(mut self, extension: impl Into<PathBuf>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn without_extension(mut self) -> Self {
        self.extension = None;
        self
    }

    pub fn with_init_spatial_metadata(mut self, init: bool) -> Self {
        self.init_spatial_metadata = init;
        self
    }
}
