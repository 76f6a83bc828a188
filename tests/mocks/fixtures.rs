//! Description files and external providers written to temporary directories.

use board_doc::registry::external::MANIFEST_FILE;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary workspace holding a description file and providers.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Workspace {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `board.yml` with `yaml` and return its path.
    pub fn config(&self, yaml: &str) -> PathBuf {
        let path = self.dir.path().join("board.yml");
        fs::write(&path, yaml).expect("write description");
        path
    }

    /// Write an external provider under `providers/<dir_name>`.
    ///
    /// `checks` pairs a check name with a shell script run via `sh -c`.
    pub fn provider(&self, dir_name: &str, module: &str, required: &[&str], checks: &[(&str, &str)]) -> PathBuf {
        let dir = self.dir.path().join("providers").join(dir_name);
        fs::create_dir_all(&dir).expect("create provider dir");

        let mut manifest = format!("name: {}\nrequired: [{}]\nchecks:\n", module, required.join(", "));
        for (name, script) in checks {
            manifest.push_str(&format!(
                "  - name: {}\n    description: \"{} check for {{channel}}\"\n    run: [\"sh\", \"-c\", '{}']\n",
                name,
                module,
                script.replace('\'', "''")
            ));
        }
        fs::write(dir.join(MANIFEST_FILE), manifest).expect("write manifest");
        dir
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

/// The two-group description used across the full-run tests.
pub const REFERENCE_CONFIG: &str = r#"
base:
  i2c:
    - bus: 1
      addresses: [0x3c, 0x50]
  gpio:
    - number: 20
      value: 1
    - number: 21
      value: 0
additional:
  camera:
    - device: /dev/video0
      camera_name: USB Camera
      driver_name: uvcvideo
"#;
