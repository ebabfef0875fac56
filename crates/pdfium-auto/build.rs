// With the `bundled` feature, copy the library named by PDFIUM_BUNDLE_LIB into
// OUT_DIR and generate `bundled.rs`, which embeds it as `PDFIUM_BYTES`.
// `include_bytes!` needs a literal path, hence the generated file.

use std::env;
use std::fs;
use std::path::PathBuf;

const GENERATED: &str = "\
/// pdfium shared library embedded at build time.
pub static PDFIUM_BYTES: &[u8] = include_bytes!(\"pdfium.bin\");
";

fn main() {
    println!("cargo:rerun-if-env-changed=PDFIUM_BUNDLE_LIB");
    if env::var_os("CARGO_FEATURE_BUNDLED").is_none() {
        return;
    }

    let src = match env::var_os("PDFIUM_BUNDLE_LIB") {
        Some(p) if !p.is_empty() => PathBuf::from(p),
        _ => panic!(
            "the `bundled` feature needs PDFIUM_BUNDLE_LIB=/path/to/libpdfium \
             (.so, .dylib or .dll, see https://github.com/bblanchon/pdfium-binaries)"
        ),
    };
    if !src.is_file() {
        panic!("PDFIUM_BUNDLE_LIB does not name a file: {}", src.display());
    }
    println!("cargo:rerun-if-changed={}", src.display());

    let out = PathBuf::from(env::var_os("OUT_DIR").expect("cargo sets OUT_DIR"));
    fs::copy(&src, out.join("pdfium.bin"))
        .unwrap_or_else(|e| panic!("copy {}: {e}", src.display()));
    fs::write(out.join("bundled.rs"), GENERATED)
        .unwrap_or_else(|e| panic!("write bundled.rs: {e}"));
}
