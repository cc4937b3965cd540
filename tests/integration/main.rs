//! Integration tests for expiring-cache
//!
//! Every invocation is a separate process, so these also exercise
//! cross-process sharing through the storage and lock directories.

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::{Path, PathBuf};
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    fn expiring_cache(root: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("expiring-cache");
        cmd.env_remove("EXPIRING_CACHE_NAME")
            .env_remove("EXPIRING_CACHE_STORAGE_DIR")
            .env_remove("EXPIRING_CACHE_LOCK_DIR")
            .arg("--config")
            .arg(root.join("config.toml"))
            .arg("--storage-dir")
            .arg(root.join("storage"))
            .arg("--lock-dir")
            .arg(root.join("locks"));
        cmd
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        expiring_cache(temp.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("expiring cache"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        expiring_cache(temp.path())
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("expiring-cache"));
    }

    #[test]
    fn set_in_one_process_get_in_another() {
        let temp = TempDir::new().unwrap();

        expiring_cache(temp.path())
            .args(["set", "--name", "plugins", "reporter", "{\"enabled\":true}"])
            .assert()
            .success();

        expiring_cache(temp.path())
            .args(["get", "--name", "plugins", "reporter"])
            .assert()
            .success()
            .stdout(predicate::str::contains("{\"enabled\":true}"));

        assert!(temp.path().join("storage").join("plugins.json").exists());
    }

    #[test]
    fn get_missing_key_fails() {
        let temp = TempDir::new().unwrap();
        expiring_cache(temp.path())
            .args(["get", "--name", "plugins", "nope"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Key not found: nope"));
    }

    #[test]
    fn missing_storage_name_fails_with_hint() {
        let temp = TempDir::new().unwrap();
        expiring_cache(temp.path())
            .args(["get", "anything"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("requires a storage name"))
            .stderr(predicate::str::contains("EXPIRING_CACHE_NAME"));
    }

    #[test]
    fn entries_expire_across_processes() {
        let temp = TempDir::new().unwrap();

        expiring_cache(temp.path())
            .args(["set", "-n", "results", "--ttl-ms", "50", "k", "v"])
            .assert()
            .success();

        thread::sleep(Duration::from_millis(150));

        expiring_cache(temp.path())
            .args(["has", "-n", "results", "k"])
            .assert()
            .success()
            .stdout(predicate::str::diff("false\n"));
    }

    #[test]
    fn expires_reports_never() {
        let temp = TempDir::new().unwrap();

        expiring_cache(temp.path())
            .args(["set", "-n", "results", "--no-expiry", "k", "v"])
            .assert()
            .success();

        expiring_cache(temp.path())
            .args(["expires", "-n", "results", "k"])
            .assert()
            .success()
            .stdout(predicate::str::diff("never\n"));
    }

    #[test]
    fn expires_prints_epoch_millis() {
        let temp = TempDir::new().unwrap();

        expiring_cache(temp.path())
            .args(["set", "-n", "results", "--ttl-ms", "60000", "k", "v"])
            .assert()
            .success();

        let output = expiring_cache(temp.path())
            .args(["expires", "-n", "results", "--epoch-ms", "k"])
            .output()
            .unwrap();
        assert!(output.status.success());
        let deadline: i64 = String::from_utf8(output.stdout)
            .unwrap()
            .trim()
            .parse()
            .unwrap();
        assert!(deadline > 0);

        expiring_cache(temp.path())
            .args(["set", "-n", "results", "--no-expiry", "forever", "v"])
            .assert()
            .success();
        expiring_cache(temp.path())
            .args(["expires", "-n", "results", "--epoch-ms", "forever"])
            .assert()
            .success()
            .stdout(predicate::str::diff("null\n"));
    }

    #[test]
    fn list_json_includes_deadline() {
        let temp = TempDir::new().unwrap();

        expiring_cache(temp.path())
            .args(["set", "-n", "results", "--no-expiry", "a", "1"])
            .assert()
            .success();

        expiring_cache(temp.path())
            .args(["list", "-n", "results", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"key\": \"a\""))
            .stdout(predicate::str::contains("\"validUntil\": null"));
    }

    #[test]
    fn purge_removes_backing_file() {
        let temp = TempDir::new().unwrap();
        let file: PathBuf = temp.path().join("storage").join("results.json");

        expiring_cache(temp.path())
            .args(["set", "-n", "results", "k", "v"])
            .assert()
            .success();
        assert!(file.exists());

        expiring_cache(temp.path())
            .args(["purge", "-n", "results"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Removed storage"));
        assert!(!file.exists());
    }

    #[test]
    fn concurrent_writers_lose_nothing() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();

        let writers: Vec<_> = (0..6)
            .map(|i| {
                let root = root.clone();
                thread::spawn(move || {
                    let key = format!("shard-{i}");
                    expiring_cache(&root)
                        .args(["set", "-n", "shards", key.as_str(), "done"])
                        .assert()
                        .success();
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let output = expiring_cache(&root)
            .args(["list", "-n", "shards", "--format", "plain"])
            .output()
            .unwrap();
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert_eq!(stdout.lines().count(), 6);
    }

    #[test]
    fn config_path_honors_flag() {
        let temp = TempDir::new().unwrap();
        expiring_cache(temp.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        expiring_cache(temp.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[lock]"));
    }
}
