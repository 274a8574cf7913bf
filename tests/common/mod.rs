#![allow(dead_code)]

use assert_cmd::Command;
use assert_fs::TempDir;
use derive_new::new;
use rstest::fixture;
use std::path::{Path, PathBuf};

pub const HELLO: &str = "8c01d89ae06311834ee4b1fab2f0414d35f01102";
pub const HELLO_TREE: &str = "da192267bbf8163c9762634196c8e5e1d70b684d";

#[derive(Debug, Clone, Eq, PartialEq, new)]
pub struct FileSpec {
    pub path: PathBuf,
    pub content: String,
}

impl FileSpec {
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// The `odb` binary, run from `dir` with no inherited repository override.
pub fn odb(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("odb").expect("odb binary is built");
    cmd.current_dir(dir).env_remove("GIT_DIR").env_remove("RUST_LOG");
    cmd
}

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

#[fixture]
pub fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    odb(repository_dir.path()).arg("init").assert().success();
    repository_dir
}

/// Run `hash-object` on `input` fed through stdin and return the printed hash.
pub fn hash_stdin(dir: &Path, args: &[&str], input: impl Into<Vec<u8>>) -> String {
    let output = odb(dir)
        .arg("hash-object")
        .args(args)
        .arg("--stdin")
        .write_stdin(input)
        .output()
        .expect("Failed to run hash-object");
    assert!(
        output.status.success(),
        "hash-object failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    String::from_utf8(output.stdout)
        .expect("hash-object printed non-UTF-8")
        .trim_end()
        .to_string()
}

pub fn write_file(file_spec: &FileSpec) {
    if let Some(parent) = file_spec.path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("Failed to create directory {:?}: {}", parent, e));
    }

    std::fs::write(&file_spec.path, &file_spec.content)
        .unwrap_or_else(|e| panic!("Failed to write file {:?}: {}", file_spec.path, e));
}

pub fn write_generated_files(dir: &Path, files_count: usize) -> Vec<FileSpec> {
    use fake::{
        Fake,
        faker::lorem::en::{Word, Words},
    };

    (0..files_count)
        .map(|i| {
            let file_name = format!("{i}-{}.txt", Word().fake::<String>());
            let file_content = Words(5..10).fake::<Vec<String>>().join(" ");

            let file_spec = FileSpec::new(dir.join(file_name), file_content);
            write_file(&file_spec);

            file_spec
        })
        .collect::<Vec<_>>()
}
