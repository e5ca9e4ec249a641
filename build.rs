use std::env;

fn main() {
    // Exposes the compilation target so system-probe mode can report the host triple.
    println!("cargo:rerun-if-changed=build.rs");
    let target = env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=QTPREP_HOST_TRIPLE={}", target);
}
