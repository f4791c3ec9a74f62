//! Spotify release radar library.
//!
//! Discovers new releases of the user's followed artists on Spotify, classifies
//! them into extended categories (EP, remix, live and re-release on top of the
//! native album groups) and routes their tracks into a managed playlist per
//! category.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints of the service (health, OAuth callback, crawl trigger)
//! - `cli` - Command-line interface implementations
//! - `config` - Environment loading and the explicit [`config::Config`]
//! - `crawler` - Single-flight crawl orchestrator
//! - `discovery` - Followed artists, album discovery and track resolution
//! - `error` - Typed error kinds of the pipeline
//! - `executor` - Bounded fetch worker pool
//! - `filter` - Release candidate filters
//! - `forward` - Optional result forwarding
//! - `management` - File-backed persistence of caches, token and playlist state
//! - `playlist` - Playlist writer, notifier and purge
//! - `remap` - Extended category classifiers and routing
//! - `server` - Local HTTP server
//! - `spotify` - Spotify Web API client and rate-limited gateway
//! - `types` - Data structures and type definitions
//! - `utils` - Date handling and PKCE helpers

pub mod api;
pub mod cli;
pub mod config;
pub mod crawler;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod filter;
pub mod forward;
pub mod management;
pub mod playlist;
pub mod remap;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for application glue that may fail.
///
/// The pipeline itself returns the typed errors of [`error`]; this alias is
/// used where heterogeneous failures are only reported to the user.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Starting crawl...");
/// info!("Found {} candidates", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("{} [{}] {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"), "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("{} [{}] {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"), "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only used for fatal startup failures of the command-line interface. Errors
/// inside the crawl pipeline are reported with [`warning!`] and recovered from.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("{} [{}] {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"), "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for every recoverable failure: skipped fetch tasks, failed cache
/// writes, rejected playlist writes and aborted crawls.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("{} [{}] {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"), "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
