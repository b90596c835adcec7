fn main() {
    // The mod catalog is embedded with include_str!, rebuild when it changes.
    println!("cargo:rerun-if-changed=resources/catalog.json");

    #[cfg(feature = "desktop")]
    tauri_build::build();
}
