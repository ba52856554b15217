//! Configuration options for the terrafs VFS.

use std::time::Duration;

/// Remote tree mounted when no server is configured.
pub const DEFAULT_BASE_URL: &str = "http://flightgear.sourceforge.net/scenery";

/// Top-level directories synthesized in static-root mode.
pub const STATIC_ROOT_DIRS: [&str; 4] = ["Airports", "Objects", "Models", "Terrain"];

/// Kernel attribute/entry cache options.
///
/// The remote tree is immutable for the mount's lifetime, so these only bound
/// how often the kernel asks again.
#[derive(Debug, Clone)]
pub struct KernelCacheOptions {
    /// Attribute cache timeout in seconds.
    pub attr_timeout_secs: u64,
    /// Directory entry cache timeout in seconds.
    pub entry_timeout_secs: u64,
}

impl Default for KernelCacheOptions {
    fn default() -> Self {
        Self {
            attr_timeout_secs: 1,
            entry_timeout_secs: 1,
        }
    }
}

impl KernelCacheOptions {
    /// Attribute TTL as a duration.
    pub fn attr_ttl(&self) -> Duration {
        Duration::from_secs(self.attr_timeout_secs)
    }

    /// Entry TTL as a duration.
    pub fn entry_ttl(&self) -> Duration {
        Duration::from_secs(self.entry_timeout_secs)
    }
}

/// Configuration for the terrafs VFS.
#[derive(Debug, Clone)]
pub struct VfsOptions {
    /// Root URL of the remote tree, without trailing `/`.
    pub base_url: String,
    /// Synthesize the fixed top-level directories instead of fetching `/`.
    pub static_root: bool,
    /// Kernel cache TTLs.
    pub kernel_cache: KernelCacheOptions,
}

impl Default for VfsOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            static_root: false,
            kernel_cache: KernelCacheOptions::default(),
        }
    }
}

impl VfsOptions {
    /// Set the remote base URL. Trailing slashes are removed.
    ///
    /// # Arguments
    /// * `base_url` - Root URL of the remote tree
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let url: String = base_url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Enable or disable static-root mode.
    ///
    /// # Arguments
    /// * `static_root` - Whether to synthesize the top-level directories
    pub fn with_static_root(mut self, static_root: bool) -> Self {
        self.static_root = static_root;
        self
    }

    /// Set kernel cache options.
    ///
    /// # Arguments
    /// * `kernel_cache` - Kernel cache TTLs
    pub fn with_kernel_cache(mut self, kernel_cache: KernelCacheOptions) -> Self {
        self.kernel_cache = kernel_cache;
        self
    }

    /// Check if `path` is one of the synthesized static-root directories.
    ///
    /// # Arguments
    /// * `path` - Absolute virtual path
    pub fn is_static_root_dir(&self, path: &str) -> bool {
        self.static_root
            && path
                .strip_prefix('/')
                .is_some_and(|name| STATIC_ROOT_DIRS.contains(&name))
    }
}
