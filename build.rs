//! Build script for the sporlradar service.
//!
//! Copies the `.env.example` configuration template into the platform-specific
//! local data directory so a fresh installation has a ready-to-edit template
//! next to the location where `config::load_env` expects the real `.env` file:
//!
//! - Linux: `~/.local/share/sporlradar/.env.example`
//! - macOS: `~/Library/Application Support/sporlradar/.env.example`
//! - Windows: `%LOCALAPPDATA%/sporlradar/.env.example`
//!
//! A missing template only produces a cargo warning. Failing to create the
//! directory or write the file fails the build.

use std::{env, fs, path::PathBuf};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let env_example_path = manifest_dir.join(".env.example");

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("sporlradar");
    fs::create_dir_all(&out_dir)?;

    if env_example_path.is_file() {
        let contents = fs::read_to_string(&env_example_path)?;
        fs::write(out_dir.join(".env.example"), contents)?;
    } else {
        println!(
            "cargo:warning=.env.example not found at {}",
            env_example_path.display()
        );
    }

    Ok(())
}
