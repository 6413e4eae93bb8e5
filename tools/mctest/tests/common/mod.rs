//! Shared fixtures for end-to-end tests.
//!
//! A fixture is a throwaway suite wired to a fake toolchain made of shell
//! scripts:
//!
//! - `make` copies `mccomp.in` to `mccomp` in its working directory.
//! - `mccomp` rejects sources containing `badcode`, exits 0 without output
//!   for `noemit`, and otherwise turns everything after the header into a
//!   `/bin/sh` script named `output.ll`.
//! - `cc` refuses sources containing `linkerror` and otherwise copies the
//!   intermediate to the requested output.
//!
//! Test programs are therefore shell snippets, e.g. `printf '5\n10\n'`.

#![allow(dead_code, reason = "shared between test binaries; each uses a subset")]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use mctest::{HarnessError, RunSummary, RunnerConfig, TestRunner};
use tempfile::TempDir;

const FAKE_MAKE: &str = "#!/bin/sh\ncp mccomp.in mccomp\n";

const FAKE_COMPILER: &str = r#"#!/bin/sh
grep -q badcode "$1" && exit 1
grep -q noemit "$1" && exit 0
{ echo '#!/bin/sh'; grep -v '^//' "$1"; } > output.ll
exit 0
"#;

const FAKE_CC: &str = r#"#!/bin/sh
[ -f "$1" ] || exit 1
[ -f "$2" ] || exit 1
grep -q linkerror "$2" && exit 1
cp "$2" "$4" && chmod +x "$4"
"#;

static SERIAL: Mutex<()> = Mutex::new(());

/// Serialize tests that write and then execute scripts.
///
/// Executing a file while another thread forks with that file still open for
/// writing fails with `ETXTBSY`.
pub fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Fixture {
    dir: TempDir,
    pub config: RunnerConfig,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let suite = dir.path().join("suite");
        let build = dir.path().join("build");
        let bin = dir.path().join("bin");
        fs::create_dir_all(suite.join("tests")).unwrap();
        fs::create_dir(&build).unwrap();
        fs::create_dir(&bin).unwrap();

        fs::write(suite.join("driver.cpp"), "extern \"C\" void runner(void);\n").unwrap();
        fs::write(build.join("Makefile"), "mccomp: mccomp.cpp\n").unwrap();
        write_script(&build.join("mccomp.in"), FAKE_COMPILER);
        write_script(&bin.join("make"), FAKE_MAKE);
        write_script(&bin.join("cc"), FAKE_CC);

        let config = RunnerConfig {
            suite_root: suite,
            build_tool: path_string(&bin.join("make")),
            native_compiler: path_string(&bin.join("cc")),
            timeout: Some(Duration::from_secs(10)),
            ..RunnerConfig::default()
        };

        Fixture { dir, config }
    }

    pub fn suite_root(&self) -> PathBuf {
        self.dir.path().join("suite")
    }

    pub fn makefile(&self) -> PathBuf {
        self.dir.path().join("build").join("Makefile")
    }

    pub fn workspace(&self) -> PathBuf {
        self.suite_root().join("tmp")
    }

    pub fn fake_make(&self) -> PathBuf {
        self.dir.path().join("bin").join("make")
    }

    pub fn fake_cc(&self) -> PathBuf {
        self.dir.path().join("bin").join("cc")
    }

    /// Add `tests/<name>.c` with the given content.
    pub fn add_test(&self, name: &str, content: &str) -> PathBuf {
        let path = self.suite_root().join("tests").join(format!("{name}.c"));
        fs::write(&path, content).unwrap();
        path
    }

    /// Replace the fake build tool with one that fails.
    pub fn break_build(&self) {
        write_script(&self.fake_make(), "#!/bin/sh\necho 'mccomp.cpp:1: error' >&2\nexit 2\n");
    }

    /// Run the suite through the library, capturing the report.
    pub fn run(&self) -> (Result<RunSummary, HarnessError>, String) {
        let mut out = Vec::new();
        let result = TestRunner::with_config(self.config.clone()).run(&self.makefile(), &mut out);
        (result, String::from_utf8(out).unwrap())
    }
}

fn write_script(path: &Path, content: &str) {
    use std::os::unix::fs::PermissionsExt;

    fs::write(path, content).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

fn path_string(path: &Path) -> String {
    path.to_str().unwrap().to_string()
}
