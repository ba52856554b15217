//! Example: Mount a remote scenery tree as a FUSE filesystem.
//!
//! Usage:
//!   cargo run -p terrafs-vfs --features fuse --example mount_terrafs -- <mountpoint> [options]
//!
//! Example:
//!   cargo run -p terrafs-vfs --features fuse --example mount_terrafs -- \
//!       ~/scenery --static-root --stats
//!
//!   # Legacy mount option spelling:
//!   cargo run -p terrafs-vfs --features fuse --example mount_terrafs -- \
//!       ~/scenery -o server=http://example.org/scenery,staticroot

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use terrafs_storage::{HttpClient, ReqwestHttpClient, TransportSettings};
use terrafs_vfs::{
    KernelCacheOptions, TerraFs, TerraVfs, VfsOptions, VfsStats, VfsStatsCollector,
    DEFAULT_BASE_URL,
};
use tracing_subscriber::EnvFilter;

/// Mount a read-only view of a remote .dirindex tree.
#[derive(Debug, Parser)]
#[command(name = "mount_terrafs", version)]
struct Args {
    /// Directory to mount at.
    mountpoint: PathBuf,

    /// Base URL of the remote tree.
    #[arg(long)]
    server: Option<String>,

    /// Present Airports, Objects, Models and Terrain at the root without a root listing.
    #[arg(long, overrides_with = "no_static_root")]
    static_root: bool,

    /// Read the root from the server's root listing.
    #[arg(long, overrides_with = "static_root")]
    no_static_root: bool,

    /// Per-request timeout in seconds (none by default).
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Kernel attribute and entry cache TTL in seconds.
    #[arg(long, default_value_t = 1)]
    cache_ttl_secs: u64,

    /// Show live statistics dashboard.
    #[arg(long)]
    stats: bool,

    /// Let other users access the mount.
    #[arg(long)]
    allow_other: bool,

    /// Legacy mount options: server=<url>, staticroot, nostaticroot.
    #[arg(short = 'o', value_delimiter = ',')]
    mount_options: Vec<String>,
}

impl Args {
    /// Build filesystem options from flags and legacy `-o` options.
    ///
    /// Explicit flags win over `-o` spellings.
    fn vfs_options(&self) -> VfsOptions {
        let mut server: String = DEFAULT_BASE_URL.to_string();
        let mut static_root: bool = false;

        for option in &self.mount_options {
            match option.as_str() {
                "staticroot" => static_root = true,
                "nostaticroot" => static_root = false,
                other => match other.strip_prefix("server=") {
                    Some(url) => server = url.to_string(),
                    None => tracing::warn!("Ignoring unknown mount option: {}", other),
                },
            }
        }

        if let Some(url) = &self.server {
            server = url.clone();
        }
        if self.static_root {
            static_root = true;
        }
        if self.no_static_root {
            static_root = false;
        }

        VfsOptions::default()
            .with_base_url(server)
            .with_static_root(static_root)
            .with_kernel_cache(KernelCacheOptions {
                attr_timeout_secs: self.cache_ttl_secs,
                entry_timeout_secs: self.cache_ttl_secs,
            })
    }

    /// Build transport settings.
    fn transport_settings(&self) -> TransportSettings {
        let settings: TransportSettings = TransportSettings::default();
        match self.timeout_secs {
            Some(secs) => settings.with_timeout(Duration::from_secs(secs)),
            None => settings,
        }
    }
}

/// Truncate a path for display.
///
/// # Arguments
/// * `path` - Path to truncate
/// * `max_len` - Maximum length
///
/// # Returns
/// Truncated path string.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.len() <= max_len {
        path.to_string()
    } else {
        let cut: usize = path.len() - (max_len - 3);
        let start: usize = (cut..path.len())
            .find(|&i| path.is_char_boundary(i))
            .unwrap_or(path.len());
        format!("...{}", &path[start..])
    }
}

/// Print VFS statistics dashboard.
///
/// # Arguments
/// * `stats` - Collected VFS stats
fn print_stats(stats: &VfsStats) {
    // Clear screen and move cursor to top
    print!("\x1B[2J\x1B[H");

    let listing = &stats.listing_stats;
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                  terrafs Statistics Dashboard                     ║");
    println!("╠══════════════════════════════════════════════════════════════════╣");
    println!(
        "║ Uptime: {:>5}s                                                   ║",
        stats.uptime_secs
    );
    println!("╠══════════════════════════════════════════════════════════════════╣");
    println!("║ FILESYSTEM                                                        ║");
    println!(
        "║   Inodes: {:>10}                                              ║",
        stats.inode_count
    );
    println!(
        "║   Open files: {:>6}                                              ║",
        stats.open_files
    );
    println!("╠══════════════════════════════════════════════════════════════════╣");
    println!("║ LISTINGS                                                          ║");
    println!(
        "║   Cached: {:>6} present, {:>6} absent                          ║",
        listing.present, listing.absent
    );
    println!(
        "║   Hits: {:>10}  Fetches: {:>10}                           ║",
        listing.hits, listing.fetches
    );
    println!(
        "║   Hit rate: {:>6.2}%   In flight: {:>4}                           ║",
        listing.hit_rate(),
        listing.pending_fetches
    );
    println!("╠══════════════════════════════════════════════════════════════════╣");

    if stats.open_files > 0 {
        println!("║ OPEN FILES                                                        ║");
        for (i, file) in stats.open_file_list.iter().take(10).enumerate() {
            println!(
                "║   {:>2}. {:50} {:>8} ║",
                i + 1,
                truncate_path(&file.path, 50),
                file.size
            );
        }
        if stats.open_files > 10 {
            println!(
                "║   ... and {} more                                               ║",
                stats.open_files - 10
            );
        }
    } else {
        println!("║ OPEN FILES: (none)                                                ║");
    }

    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!("\nPress Ctrl+C to unmount and exit.");
}

/// Spawn a background thread that prints stats periodically.
///
/// # Arguments
/// * `collector` - Stats collector to query
/// * `running` - Atomic flag to control thread lifetime
/// * `interval_secs` - Interval between stats updates
///
/// # Returns
/// Handle to the spawned thread.
fn spawn_stats_thread(
    collector: VfsStatsCollector,
    running: Arc<AtomicBool>,
    interval_secs: u64,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while running.load(Ordering::SeqCst) {
            let stats: VfsStats = collector.collect();
            print_stats(&stats);
            thread::sleep(Duration::from_secs(interval_secs));
        }
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    // The dashboard redraws the whole terminal, so logging stays off with it
    if !args.stats {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }

    let options: VfsOptions = args.vfs_options();
    if !args.mountpoint.exists() {
        std::fs::create_dir_all(&args.mountpoint)?;
    }

    let runtime: tokio::runtime::Runtime = tokio::runtime::Runtime::new()?;
    let _guard = runtime.enter();

    let client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new(args.transport_settings())?);
    tracing::info!(
        "Mounting {} at {} (static root: {})",
        options.base_url,
        args.mountpoint.display(),
        options.static_root
    );

    let running: Arc<AtomicBool> = Arc::new(AtomicBool::new(true));
    let r: Arc<AtomicBool> = running.clone();
    ctrlc::set_handler(move || {
        println!("\nReceived SIGINT, unmounting...");
        r.store(false, Ordering::SeqCst);
    })?;

    let fs: Arc<TerraFs> = Arc::new(TerraFs::new(client, options));
    let vfs: TerraVfs = TerraVfs::new(fs)?;
    let stats_collector: VfsStatsCollector = vfs.stats_collector();
    let session = terrafs_vfs::spawn_mount(vfs, &args.mountpoint, args.allow_other)?;

    let stats_handle: Option<thread::JoinHandle<()>> = if args.stats {
        Some(spawn_stats_thread(stats_collector, running.clone(), 2))
    } else {
        println!("Press Ctrl+C to unmount and exit.");
        None
    };

    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(100));
    }

    drop(session);

    if let Some(handle) = stats_handle {
        let _ = handle.join();
    }

    Ok(())
}
