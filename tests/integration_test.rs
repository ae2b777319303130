use assert_cmd::Command;
use assert_cmd::cargo;
use flate2::Compression;
use flate2::write::GzEncoder;
use mockito::Server;
use predicates::prelude::*;
use sha2::{Digest, Sha256};
use std::io::prelude::*;
use std::path::Path;
use tar::Builder;
use tempfile::tempdir;

const SCRIPT: &str = "#!/bin/sh\necho \"kaytu version v0.9.0\"\n";

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn checksum_args(body: &[u8]) -> Vec<String> {
    let digest = sha256_hex(body);
    ["darwin-amd64", "darwin-arm64", "linux-arm64", "linux-amd64"]
        .iter()
        .flat_map(|p| ["--sha256".to_string(), format!("{}={}", p, digest)])
        .collect()
}

fn create_tar_gz_with_executable(files: &[(&str, &str, u32)]) -> Vec<u8> {
    let mut tar_builder = Builder::new(Vec::new());
    for (name, content, mode) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_path(name).unwrap();
        header.set_mode(*mode);
        header.set_cksum();
        tar_builder.append(&header, content.as_bytes()).unwrap();
    }
    let tar = tar_builder.into_inner().unwrap();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar).unwrap();
    encoder.finish().unwrap()
}

/// Release name of the running host, e.g. `linux-amd64`
fn host_platform() -> String {
    let os = match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    };
    let arch = match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        other => other,
    };
    format!("{}-{}", os, arch)
}

/// A single linux-amd64 artifact catalog written to `dir`
fn write_catalog(dir: &Path, url: &str, sha256: &str, format: &str) -> std::path::PathBuf {
    write_catalog_for(dir, "linux-amd64", url, sha256, format)
}

/// A single-artifact catalog for `platform` (`<os>-<arch>`) written to `dir`
fn write_catalog_for(
    dir: &Path,
    platform: &str,
    url: &str,
    sha256: &str,
    format: &str,
) -> std::path::PathBuf {
    let (os, arch) = platform.split_once('-').unwrap();
    let catalog = format!(
        r#"{{
            "name": "kaytu",
            "version": "0.9.0",
            "artifacts": [
                {{
                    "os": "{}",
                    "arch": "{}",
                    "url": "{}",
                    "sha256": "{}",
                    "format": "{}",
                    "entry": "ktucli-linux-amd64"
                }}
            ]
        }}"#,
        os, arch, url, sha256, format
    );
    let path = dir.join("catalog.json");
    std::fs::write(&path, catalog).unwrap();
    path
}

fn kaytu_install() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("kaytu-install"));
    cmd.env_remove("KAYTU_BIN_DIR")
        .env_remove("KAYTU_CATALOG")
        .env_remove("KAYTU_TIMEOUT")
        .env_remove("GITHUB_TOKEN");
    cmd
}

#[test]
fn test_catalog_lists_every_platform() {
    kaytu_install()
        .arg("catalog")
        .arg("--version")
        .arg("v0.9.0")
        .args(checksum_args(b"kaytu"))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "https://github.com/kaytu-io/kaytu/releases/download/v0.9.0/kaytu-darwin-amd64",
        ))
        .stdout(predicate::str::contains("kaytu-darwin-arm64"))
        .stdout(predicate::str::contains("kaytu-linux-arm64"))
        .stdout(predicate::str::contains("kaytu-linux-amd64"))
        .stdout(predicate::str::contains("ktucli-macos-arm64"));
}

#[test]
fn test_catalog_missing_checksum_fails() {
    let mut args = checksum_args(b"kaytu");
    args.truncate(6);

    kaytu_install()
        .arg("catalog")
        .arg("--version")
        .arg("0.9.0")
        .args(args)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Missing checksum for linux-amd64"));
}

#[test]
fn test_resolve_linux_amd64() {
    kaytu_install()
        .arg("resolve")
        .arg("--version")
        .arg("0.9.0")
        .args(checksum_args(b"kaytu"))
        .arg("--os")
        .arg("linux")
        .arg("--arch")
        .arg("x86_64")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "https://github.com/kaytu-io/kaytu/releases/download/v0.9.0/kaytu-linux-amd64",
        ))
        .stdout(predicate::str::contains("ktucli-linux-amd64"));
}

#[test]
fn test_resolve_unsupported_platform() {
    kaytu_install()
        .arg("resolve")
        .arg("--version")
        .arg("0.9.0")
        .args(checksum_args(b"kaytu"))
        .arg("--os")
        .arg("windows")
        .arg("--arch")
        .arg("amd64")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("UnsupportedPlatform"))
        .stderr(predicate::str::contains("windows-amd64"));
}

#[test]
fn test_install_unsupported_platform_touches_nothing() {
    let dir = tempdir().unwrap();
    let bin_dir = dir.path().join("bin");

    kaytu_install()
        .arg("--bin-dir")
        .arg(&bin_dir)
        .arg("install")
        .arg("--version")
        .arg("0.9.0")
        .args(checksum_args(b"kaytu"))
        .arg("--base-url")
        .arg("http://127.0.0.1:9")
        .arg("--os")
        .arg("freebsd")
        .assert()
        .code(2);

    assert!(!bin_dir.exists());
}

#[cfg(all(
    unix,
    any(target_os = "linux", target_os = "macos"),
    any(target_arch = "x86_64", target_arch = "aarch64")
))]
#[test]
fn test_end_to_end_install() {
    use std::os::unix::fs::PermissionsExt;

    let mut server = Server::new();
    let mock = server
        .mock("GET", format!("/v0.9.0/kaytu-{}", host_platform()).as_str())
        .with_status(200)
        .with_body(SCRIPT)
        .expect(1)
        .create();

    let dir = tempdir().unwrap();
    let bin_dir = dir.path().join("bin");

    kaytu_install()
        .arg("install")
        .arg("--version")
        .arg("0.9.0")
        .args(checksum_args(SCRIPT.as_bytes()))
        .arg("--base-url")
        .arg(server.url())
        .env("KAYTU_BIN_DIR", &bin_dir)
        .env("PATH", "/usr/bin:/bin")
        .assert()
        .success()
        .stdout(predicate::str::contains("kaytu version v0.9.0"))
        .stdout(predicate::str::contains("is not on your PATH"));

    mock.assert();

    let installed = bin_dir.join("kaytu");
    assert_eq!(std::fs::read_to_string(&installed).unwrap(), SCRIPT);
    let mode = std::fs::metadata(&installed).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);

    // Only the installed binary remains
    let entries: Vec<_> = std::fs::read_dir(&bin_dir).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[cfg(unix)]
#[test]
fn test_install_from_tar_gz_catalog() {
    let host = host_platform();
    let archive = create_tar_gz_with_executable(&[
        ("README.md", "kaytu", 0o644),
        ("ktucli-linux-amd64", SCRIPT, 0o755),
    ]);

    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/kaytu-linux-amd64.tar.gz")
        .with_status(200)
        .with_body(&archive)
        .create();

    let dir = tempdir().unwrap();
    let bin_dir = dir.path().join("bin");
    let catalog = write_catalog_for(
        dir.path(),
        &host,
        &format!("{}/kaytu-linux-amd64.tar.gz", server.url()),
        &sha256_hex(&archive),
        "tar.gz",
    );

    kaytu_install()
        .arg("--bin-dir")
        .arg(&bin_dir)
        .arg("install")
        .env("KAYTU_CATALOG", &catalog)
        .assert()
        .success()
        .stdout(predicate::str::contains("verified kaytu"));

    assert_eq!(
        std::fs::read_to_string(bin_dir.join("kaytu")).unwrap(),
        SCRIPT
    );
    assert!(!bin_dir.join("README.md").exists());
}

#[test]
fn test_install_checksum_mismatch() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/kaytu-linux-amd64")
        .with_status(200)
        .with_body("tampered")
        .create();

    let dir = tempdir().unwrap();
    let bin_dir = dir.path().join("bin");
    let catalog = write_catalog(
        dir.path(),
        &format!("{}/kaytu-linux-amd64", server.url()),
        &sha256_hex(SCRIPT.as_bytes()),
        "raw-binary",
    );

    kaytu_install()
        .arg("--bin-dir")
        .arg(&bin_dir)
        .arg("install")
        .arg("--catalog")
        .arg(&catalog)
        .arg("--os")
        .arg("linux")
        .arg("--arch")
        .arg("amd64")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("IntegrityCheckFailed"));

    let leftovers: Vec<_> = std::fs::read_dir(&bin_dir)
        .map(|entries| entries.collect())
        .unwrap_or_default();
    assert!(leftovers.is_empty());
}

#[test]
fn test_install_not_found() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/kaytu-linux-amd64")
        .with_status(404)
        .create();

    let dir = tempdir().unwrap();
    let catalog = write_catalog(
        dir.path(),
        &format!("{}/kaytu-linux-amd64", server.url()),
        &sha256_hex(SCRIPT.as_bytes()),
        "raw-binary",
    );

    kaytu_install()
        .arg("--bin-dir")
        .arg(dir.path().join("bin"))
        .arg("install")
        .arg("--catalog")
        .arg(&catalog)
        .arg("--os")
        .arg("linux")
        .arg("--arch")
        .arg("amd64")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("DownloadFailed"));
}

#[cfg(unix)]
#[test]
fn test_self_test_failure_keeps_binary() {
    let host = host_platform();
    let broken = "#!/bin/sh\necho 'segfault' >&2\nexit 3\n";

    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/kaytu-linux-amd64")
        .with_status(200)
        .with_body(broken)
        .create();

    let dir = tempdir().unwrap();
    let bin_dir = dir.path().join("bin");
    let catalog = write_catalog_for(
        dir.path(),
        &host,
        &format!("{}/kaytu-linux-amd64", server.url()),
        &sha256_hex(broken.as_bytes()),
        "raw-binary",
    );

    kaytu_install()
        .arg("--bin-dir")
        .arg(&bin_dir)
        .arg("install")
        .arg("--catalog")
        .arg(&catalog)
        .assert()
        .code(6)
        .stderr(predicate::str::contains("exit status 3: segfault"));

    assert!(bin_dir.join("kaytu").exists());
}

#[cfg(unix)]
#[test]
fn test_install_for_other_platform_skips_self_test() {
    let foreign = ["linux-amd64", "linux-arm64", "darwin-arm64"]
        .into_iter()
        .find(|p| *p != host_platform())
        .unwrap();
    let broken = "#!/bin/sh\nexit 3\n";

    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/kaytu")
        .with_status(200)
        .with_body(broken)
        .create();

    let dir = tempdir().unwrap();
    let bin_dir = dir.path().join("bin");
    let catalog = write_catalog_for(
        dir.path(),
        foreign,
        &format!("{}/kaytu", server.url()),
        &sha256_hex(broken.as_bytes()),
        "raw-binary",
    );
    let (os, arch) = foreign.split_once('-').unwrap();

    kaytu_install()
        .arg("--bin-dir")
        .arg(&bin_dir)
        .arg("install")
        .arg("--catalog")
        .arg(&catalog)
        .arg("--os")
        .arg(os)
        .arg("--arch")
        .arg(arch)
        .assert()
        .success()
        .stdout(predicate::str::contains("verified").not());

    assert!(bin_dir.join("kaytu").exists());
}

#[test]
fn test_usage_error_exit_code_differs_from_unsupported_platform() {
    kaytu_install()
        .arg("resolve")
        .arg("--version")
        .arg("0.9.0")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--sha256"));

    kaytu_install().arg("--help").assert().success();
}

#[test]
fn test_explicit_version_wins_over_exported_catalog() {
    let dir = tempdir().unwrap();

    kaytu_install()
        .arg("resolve")
        .arg("--version")
        .arg("0.9.0")
        .args(checksum_args(b"kaytu"))
        .arg("--os")
        .arg("linux")
        .arg("--arch")
        .arg("arm64")
        .env("KAYTU_CATALOG", dir.path().join("missing.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("/v0.9.0/kaytu-linux-arm64"));
}

#[test]
fn test_missing_catalog_source() {
    kaytu_install()
        .arg("resolve")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("KAYTU_CATALOG"));
}

#[test]
fn test_cli_version() {
    kaytu_install()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("kaytu-install "));
}
