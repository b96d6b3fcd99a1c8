use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn invalid_runtime_mode_aborts_startup() -> Result<(), Box<dyn std::error::Error>> {
    #[allow(deprecated)]
    Command::cargo_bin("album-server")?
        .env("ALBUM_ENV", "invalid")
        .env("ALBUM_ADDR", "127.0.0.1:0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid runtime mode: invalid"));
    Ok(())
}

#[test]
fn invalid_mode_in_config_file_aborts_startup() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("album.yml"), "mode: staging\n")?;

    #[allow(deprecated)]
    Command::cargo_bin("album-server")?
        .current_dir(dir.path())
        .env_remove("ALBUM_ENV")
        .args(["--config", "album.yml", "--listen-addr", "127.0.0.1:0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("staging"));
    Ok(())
}

#[test]
fn broken_catalog_aborts_startup() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(
        dir.path().join("photos.json"),
        r#"[{"id": 1, "url": "/a.png"}, {"id": 1, "url": "/b.png"}]"#,
    )?;

    #[allow(deprecated)]
    Command::cargo_bin("album-server")?
        .current_dir(dir.path())
        .env_remove("ALBUM_ENV")
        .args(["--catalog", "photos.json", "--listen-addr", "127.0.0.1:0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Duplicate photo id"));
    Ok(())
}
