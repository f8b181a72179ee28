use std::env;

fn main() {
    // Prefer RAILNAV_VERSION from the environment (set by CI), fall back to the package version
    let version = env::var("RAILNAV_VERSION")
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "dev".to_string()));

    println!("cargo:rustc-env=RAILNAV_VERSION={}", version);
    println!("cargo:rerun-if-env-changed=RAILNAV_VERSION");
    println!("cargo:rerun-if-changed=Cargo.toml");
}
