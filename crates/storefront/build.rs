//! Build script for the storefront crate.
//!
//! Fingerprints the stylesheet and the page script so both can be served
//! with immutable caching: each is copied to `derived/<name>.<hash>.<ext>`
//! next to the original and the hash is exported as a compile-time
//! environment variable.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

fn main() {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");
    let static_dir = Path::new(&manifest_dir).join("static");

    fingerprint(&static_dir.join("css"), "main", "css", "CSS_HASH");
    fingerprint(&static_dir.join("js"), "storefront", "js", "JS_HASH");
}

/// Hash `<dir>/<stem>.<ext>`, copy it to `<dir>/derived/<stem>.<hash>.<ext>`
/// and set `env_var` to the hash (empty if the file is missing).
fn fingerprint(dir: &Path, stem: &str, ext: &str, env_var: &str) {
    let source = dir.join(format!("{stem}.{ext}"));
    println!("cargo:rerun-if-changed={}", source.display());

    let content = match fs::read(&source) {
        Ok(content) => content,
        Err(e) => {
            println!("cargo:warning=Could not read {}: {e}", source.display());
            println!("cargo:rustc-env={env_var}=");
            return;
        }
    };

    // First 8 hex chars of SHA-256
    let hash = format!("{:x}", Sha256::digest(&content));
    let short_hash: String = hash.chars().take(8).collect();
    println!("cargo:rustc-env={env_var}={short_hash}");

    let derived_dir = dir.join("derived");
    fs::create_dir_all(&derived_dir).expect("Failed to create derived asset directory");
    fs::copy(&source, derived_dir.join(format!("{stem}.{short_hash}.{ext}")))
        .expect("Failed to copy asset to derived directory");
}
