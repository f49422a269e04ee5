fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Device builds need the ESP-IDF environment forwarded to rustc.
    // Host builds (simulation + tests) have nothing to emit.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
