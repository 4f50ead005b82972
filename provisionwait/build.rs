// Reject lint-suppression attributes ("#[" + "allow" + ...) in provisionwait sources.
// Lints are configured once in the workspace manifest; call sites fix the code instead.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CHECKED_DIRS: [&str; 2] = ["src", "tests"];

fn main() {
    for dir in CHECKED_DIRS {
        println!("cargo:rerun-if-changed={dir}");
    }
    println!("cargo:rerun-if-env-changed=CHECK_NO_ALLOW");

    // Escape hatch for local experiments (CHECK_NO_ALLOW=0).
    if env::var("CHECK_NO_ALLOW").is_ok_and(|v| v == "0") {
        return;
    }

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("manifest dir"));

    let mut violations = Vec::new();
    for dir in CHECKED_DIRS {
        let path = manifest_dir.join(dir);
        if path.exists() {
            scan_path(&path, &mut violations);
        }
    }

    if violations.is_empty() {
        return;
    }

    eprintln!("ERROR: lint suppression attributes found in provisionwait:");
    for (file, line, content) in &violations {
        eprintln!("  {}:{}: {}", file.display(), line, content.trim());
    }
    panic!("{} lint suppression attribute(s) found", violations.len());
}

fn scan_path(path: &Path, violations: &mut Vec<(PathBuf, usize, String)>) {
    if path.is_dir() {
        if path.ends_with("target") {
            return;
        }
        for entry in fs::read_dir(path).expect("read dir") {
            let entry = entry.expect("dir entry");
            scan_path(&entry.path(), violations);
        }
        return;
    }

    if path.extension().map_or(true, |ext| ext != "rs") {
        return;
    }

    let Ok(content) = fs::read_to_string(path) else {
        return;
    };
    let needle_outer = concat!("#[", "allow");
    let needle_inner = concat!("#![", "allow");
    for (idx, line) in content.lines().enumerate() {
        if line.contains(needle_outer) || line.contains(needle_inner) {
            violations.push((path.to_path_buf(), idx + 1, line.to_string()));
        }
    }
}
