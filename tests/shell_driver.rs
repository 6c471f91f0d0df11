//! Shell driver tests against fake `sqlite3` executables that replay canned
//! output and record the arguments they were given.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use spatialrs::drivers::ShellDriver;
use spatialrs::error::SpatialError;
use spatialrs::types::{GeometryEncoding, GeometryValue, SqlValue};
use spatialrs::{ShellConfig, SpatialDriver};
use tempfile::TempDir;

const US: char = '\u{1f}';
const RS: &str = "\u{1e}";
const EXTENSION: &str = "/opt/spatialite/mod_spatialite";

// Writing an executable while another test thread forks can leave the file
// busy (ETXTBSY) at spawn time; serialize every test that spawns.
static SPAWN_LOCK: Mutex<()> = Mutex::new(());

fn spawn_lock() -> MutexGuard<'static, ()> {
    SPAWN_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

struct FakeShell {
    dir: TempDir,
    binary: PathBuf,
}

impl FakeShell {
    fn new(stdout: &str, stderr: &str, exit_code: i32) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("sqlite3");
        fs::write(dir.path().join("stdout"), stdout).unwrap();
        fs::write(dir.path().join("stderr"), stderr).unwrap();
        let script = format!(
            "#!/bin/sh\n\
             dir=$(dirname \"$0\")\n\
             n=0\n\
             for arg in \"$@\"; do printf '%s' \"$arg\" > \"$dir/arg$n\"; n=$((n+1)); done\n\
             echo $n > \"$dir/argc\"\n\
             cat \"$dir/stdout\"\n\
             cat \"$dir/stderr\" >&2\n\
             exit {exit_code}\n"
        );
        fs::write(&binary, script).unwrap();
        fs::set_permissions(&binary, fs::Permissions::from_mode(0o755)).unwrap();
        Self { dir, binary }
    }

    fn ok(stdout: &str) -> Self {
        Self::new(stdout, "", 0)
    }

    fn db_path(&self) -> PathBuf {
        self.dir.path().join("spatialite.sqlite")
    }

    fn config(&self) -> ShellConfig {
        ShellConfig::default()
            .with_binary(&self.binary)
            .with_extension(EXTENSION)
            .with_init_spatial_metadata(false)
    }

    fn driver(&self) -> ShellDriver {
        ShellDriver::with_config(self.db_path(), self.config()).unwrap()
    }

    fn argc(&self) -> usize {
        fs::read_to_string(self.dir.path().join("argc"))
            .unwrap()
            .trim()
            .parse()
            .unwrap()
    }

    fn arg(&self, index: usize) -> String {
        fs::read_to_string(self.dir.path().join(format!("arg{index}"))).unwrap()
    }

    fn payload(&self) -> String {
        self.arg(self.argc() - 1)
    }

    fn was_run(&self) -> bool {
        self.dir.path().join("argc").exists()
    }
}

fn banner() -> String {
    format!("load_extension('{EXTENSION}')\n{RS}\n")
}

fn load_statement() -> String {
    format!("SELECT load_extension('{EXTENSION}');")
}

#[test]
fn test_invocation_shape() {
    let _lock = spawn_lock();
    let shell = FakeShell::ok(&banner());
    let driver = shell.driver();

    driver.exec("CREATE TABLE t (id INTEGER)").unwrap();

    assert_eq!(shell.argc(), 7);
    assert_eq!(shell.arg(0), "-separator");
    assert_eq!(shell.arg(1), US.to_string());
    assert_eq!(shell.arg(2), "-nullvalue");
    assert_eq!(shell.arg(3), RS);
    assert_eq!(shell.arg(4), "-header");
    assert_eq!(shell.arg(5), shell.db_path().to_string_lossy());
    assert_eq!(
        shell.payload(),
        format!("{}CREATE TABLE t (id INTEGER)", load_statement())
    );
}

#[test]
fn test_query_skips_extension_banner() {
    let _lock = spawn_lock();
    let shell = FakeShell::ok(&format!(
        "{}id{US}label{US}geom\n1{US}cafe{US}POINT(1 2)\n2{US}{US}{RS}\n",
        banner()
    ));

    let rows = shell.driver().query("SELECT id, label, geom FROM pois").unwrap();

    assert_eq!(rows.columns(), ["id", "label", "geom"]);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows.rows()[0].get("geom").unwrap(), Some("POINT(1 2)"));
    assert_eq!(rows.rows()[1].get("label").unwrap(), Some(""));
    assert_eq!(rows.rows()[1].get("geom").unwrap(), None);
}

#[test]
fn test_query_without_extension_has_no_banner() {
    let _lock = spawn_lock();
    let shell = FakeShell::ok("n\n42\n");
    let driver =
        ShellDriver::with_config(shell.db_path(), shell.config().without_extension()).unwrap();

    assert_eq!(
        driver.fetch_column("SELECT 42 AS n", false).unwrap(),
        Some("42".to_string())
    );
    assert_eq!(shell.payload(), "SELECT 42 AS n");
}

#[test]
fn test_empty_result_after_banner() {
    let _lock = spawn_lock();
    let shell = FakeShell::ok(&banner());
    let driver = shell.driver();
    assert!(driver.query("SELECT * FROM pois WHERE 0").unwrap().is_empty());
    assert!(driver.fetch_row("SELECT * FROM pois WHERE 0", false).unwrap().is_none());
}

#[test]
fn test_query_raw_returns_output_verbatim() {
    let _lock = spawn_lock();
    let output = format!("{}a\n1\n", banner());
    let shell = FakeShell::ok(&output);
    assert_eq!(shell.driver().query_raw("SELECT 1 AS a").unwrap(), output);
}

#[test]
fn test_non_zero_exit_is_transport_error() {
    let _lock = spawn_lock();
    // well-formed rows on stdout must not leak through a failed run
    let shell = FakeShell::new(
        &format!("{}id\n1\n", banner()),
        "Error: in prepare, no such table: pois\n",
        1,
    );

    match shell.driver().query("SELECT id FROM pois") {
        Err(SpatialError::Transport {
            command,
            reason,
            output,
        }) => {
            assert!(command.contains(&shell.binary.to_string_lossy().into_owned()));
            assert!(command.contains("SELECT id FROM pois"));
            assert!(reason.contains("exited"));
            assert!(output.contains("no such table: pois"));
        }
        other => panic!("Expected Transport error, got {other:?}"),
    }
}

#[test]
fn test_stderr_output_is_transport_error() {
    let _lock = spawn_lock();
    let shell = FakeShell::new(&format!("{}id\n1\n", banner()), "Warning: something\n", 0);
    match shell.driver().query("SELECT id FROM pois") {
        Err(SpatialError::Transport { reason, .. }) => assert!(reason.contains("stderr")),
        other => panic!("Expected Transport error, got {other:?}"),
    }
}

#[test]
fn test_missing_banner_is_parse_error() {
    let _lock = spawn_lock();
    let shell = FakeShell::ok("id\n");
    assert!(matches!(
        shell.driver().query("SELECT id FROM pois"),
        Err(SpatialError::Parse { .. })
    ));
}

#[test]
fn test_overridden_header_offset() {
    let _lock = spawn_lock();
    let shell = FakeShell::ok(&format!("{}extra banner line\nid\n5\n", banner()));
    let config = shell.config().with_header_offsets(3, 0);
    let driver = ShellDriver::with_config(shell.db_path(), config).unwrap();
    assert_eq!(driver.fetch_column("SELECT 5 AS id", false).unwrap(), Some("5".to_string()));
}

#[test]
fn test_insert_is_one_batched_invocation() {
    let _lock = spawn_lock();
    let shell = FakeShell::ok(&format!("{}max(`id`)\n7\n", banner()));
    let geom = GeometryValue::with_srid("POINT(1 2)", GeometryEncoding::Wkt, 4326).unwrap();

    let id = shell
        .driver()
        .insert(
            "pois",
            &[("label", SqlValue::from("cafe")), ("Geometry", geom.into())],
            "id",
            false,
        )
        .unwrap();

    assert_eq!(id, 7);
    assert_eq!(
        shell.payload(),
        format!(
            "{}BEGIN;\nINSERT INTO `pois` (`label`, `Geometry`) VALUES \
             ('cafe', GeomFromText('POINT(1 2)', 4326));\n\
             SELECT max(`id`) FROM `pois`;\nEND;",
            load_statement()
        )
    );
}

#[test]
fn test_new_database_gets_spatial_metadata() {
    let _lock = spawn_lock();
    let shell = FakeShell::ok(&format!("{}InitSpatialMetadata()\n1\n", banner()));
    let config = shell.config().with_init_spatial_metadata(true);

    ShellDriver::with_config(shell.db_path(), config).unwrap();

    assert_eq!(
        shell.payload(),
        format!("{}SELECT InitSpatialMetadata()", load_statement())
    );
}

#[test]
fn test_existing_database_is_not_initialised() {
    let _lock = spawn_lock();
    let shell = FakeShell::ok(&banner());
    fs::write(shell.db_path(), b"").unwrap();
    let config = shell.config().with_init_spatial_metadata(true);

    ShellDriver::with_config(shell.db_path(), config).unwrap();

    assert!(!shell.was_run());
}

#[test]
fn test_open_uses_installation_layout() {
    let _lock = spawn_lock();
    let dir = tempfile::tempdir().unwrap();
    let db: &Path = &dir.path().join("db.sqlite");
    let err = ShellDriver::with_config(
        db,
        ShellConfig::installed_in(dir.path().join("bin/x64")),
    )
    .unwrap_err();
    match err {
        SpatialError::Transport { command, .. } => {
            assert!(command.contains("bin/x64/sqlite3"));
            assert!(command.contains("InitSpatialMetadata"));
        }
        other => panic!("Expected Transport error, got {other:?}"),
    }
}
