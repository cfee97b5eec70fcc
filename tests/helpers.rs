//! Shared test utilities for imgcheck tests.
//!
//! The stand-in image tool is `tar`: an "image" is a tar archive of the
//! tree. build-image and image-spec go through the real `imgcheck` binary
//! (`stage` and `image-spec from`), so the rule engine is exercised end to
//! end the same way the real tool's `-m`/`-f` options are.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use imgcheck::config::{ExisoToolchain, Toolchain};
use imgcheck::process::CommandTemplate;

/// Temporary source tree plus room for outputs.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Source tree the rules are resolved against
    pub source: PathBuf,
    /// Scratch area for images and staged trees
    pub work: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let source = temp_dir.path().join("source");
        let work = temp_dir.path().join("work");

        fs::create_dir_all(&source).expect("Failed to create source dir");
        fs::create_dir_all(&work).expect("Failed to create work dir");

        Self {
            _temp_dir: temp_dir,
            source,
            work,
        }
    }

    /// Write `(relative path, content)` files under the source tree.
    pub fn write_source(&self, files: &[(&str, &str)]) {
        write_files(&self.source, files);
    }
}

pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).expect("Failed to create parent dir");
        fs::write(&path, content).expect("Failed to write fixture file");
    }
}

pub fn assert_file_contains(path: &Path, expected: &str) {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    assert!(
        content.contains(expected),
        "{} does not contain {:?}:\n{}",
        path.display(),
        expected,
        content
    );
}

/// Path to the built `imgcheck` binary.
pub fn imgcheck_bin() -> &'static str {
    env!("CARGO_BIN_EXE_imgcheck")
}

fn argv(args: &[&str]) -> CommandTemplate {
    CommandTemplate::from_argv(args.iter().map(|a| a.to_string()).collect())
        .expect("valid command template")
}

/// `sh -c SCRIPT sh ARGS...`
fn script(body: &str, args: &[&str]) -> CommandTemplate {
    let mut full = vec!["sh", "-c", body, "sh"];
    full.extend_from_slice(args);
    argv(&full)
}

pub fn tar_pack() -> CommandTemplate {
    argv(&["tar", "-C", "{input}", "-cf", "{output}", "."])
}

pub fn tar_unpack() -> CommandTemplate {
    argv(&["tar", "-C", "{output}", "-xf", "{input}"])
}

/// Unpack that silently drops a file named `b`.
pub fn lossy_unpack() -> CommandTemplate {
    script(
        r#"tar -C "$2" -xf "$1" && rm -f "$2/b""#,
        &["{input}", "{output}"],
    )
}

fn tar_repack() -> CommandTemplate {
    script(
        r#"d=$(mktemp -d) && tar -C "$d" -xf "$1" && tar -C "$d" -cf "$2" .; rc=$?; rm -rf "$d"; exit $rc"#,
        &["{input}", "{output}"],
    )
}

fn tar_repack_in_place() -> CommandTemplate {
    script(
        r#"d=$(mktemp -d) && tar -C "$d" -xf "$1" && tar -C "$d" -cf "$1" .; rc=$?; rm -rf "$d"; exit $rc"#,
        &["{input}"],
    )
}

fn tar_copy_out() -> CommandTemplate {
    script(
        r#"d=$(mktemp -d) && tar -C "$d" -xf "$1" && cp -R "$d/${2#/}" "$3"; rc=$?; rm -rf "$d"; exit $rc"#,
        &["{input}", "{options}", "{output}"],
    )
}

fn staged_build_image() -> CommandTemplate {
    let body = format!(
        r#"out=$1; src=$2; shift 2; d=$(mktemp -d) && "{bin}" stage "$@" "$src" "$d/root" >/dev/null && tar -C "$d/root" -cf "$out" .; rc=$?; rm -rf "$d"; exit $rc"#,
        bin = imgcheck_bin()
    );
    script(&body, &["{output}", "{input}", "{options}"])
}

fn image_spec_from() -> CommandTemplate {
    argv(&[imgcheck_bin(), "image-spec", "from", "{options}", "{output}"])
}

/// A complete toolchain backed by `tar` and the imgcheck binary.
pub fn tar_toolchain() -> Toolchain {
    Toolchain {
        pack: tar_pack(),
        unpack: tar_unpack(),
        repack: tar_repack(),
        build_image: staged_build_image(),
        image_spec: image_spec_from(),
        copy_out: tar_copy_out(),
        exiso: ExisoToolchain {
            pack: tar_pack(),
            unpack_x: tar_unpack(),
            unpack_plain: tar_unpack(),
            repack_in_place: tar_repack_in_place(),
        },
    }
}
