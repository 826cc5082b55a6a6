//! Integration tests for Kiln

mod support;

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use kiln::cache::{ArtifactCache, CacheEntry, FileCache};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn kiln() -> Command {
        cargo_bin_cmd!("kiln")
    }

    /// Command with an isolated config file pointing the cache into `temp`
    fn kiln_in(temp: &TempDir) -> Command {
        let config = temp.path().join("config.toml");
        let cache = temp.path().join("cache");
        std::fs::write(
            &config,
            format!("[cache]\ndir = {:?}\n", cache.to_string_lossy()),
        )
        .unwrap();

        let mut cmd = kiln();
        cmd.env("KILN_CONFIG", &config).env("KILN_PLAIN", "1");
        cmd
    }

    fn seed_cache(dir: &Path) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let cache = FileCache::new(dir);
            cache
                .set("some-org:some-repo", CacheEntry::new("v1.2.0", "/artifacts/v1.2.0.tgz"))
                .await
                .unwrap();
        });
    }

    #[test]
    fn help_displays() {
        kiln()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Fetch or build the latest release artifact"));
    }

    #[test]
    fn version_displays() {
        kiln()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("kiln"));
    }

    #[test]
    fn config_path_honours_env() {
        let temp = TempDir::new().unwrap();
        kiln_in(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        kiln_in(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[packager]"))
            .stdout(predicate::str::contains("jam"));
    }

    #[test]
    fn config_init_writes_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("fresh").join("config.toml");
        kiln()
            .env("KILN_CONFIG", &path)
            .args(["config", "init"])
            .assert()
            .success();
        assert!(path.is_file());
    }

    #[test]
    fn cache_dir_from_config() {
        let temp = TempDir::new().unwrap();
        kiln_in(&temp)
            .args(["cache", "dir"])
            .assert()
            .success()
            .stdout(predicate::str::contains("cache"));
    }

    #[test]
    fn cache_list_empty() {
        let temp = TempDir::new().unwrap();
        kiln_in(&temp)
            .args(["cache", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached artifacts"));
    }

    #[test]
    fn cache_list_json() {
        let temp = TempDir::new().unwrap();
        seed_cache(&temp.path().join("cache"));
        kiln_in(&temp)
            .args(["cache", "list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"key\": \"some-org:some-repo\""))
            .stdout(predicate::str::contains("v1.2.0"));
    }

    #[test]
    fn cache_clear_yes() {
        let temp = TempDir::new().unwrap();
        let cache = temp.path().join("cache");
        seed_cache(&cache);
        kiln_in(&temp)
            .args(["cache", "clear", "--yes"])
            .assert()
            .success();
        assert!(!cache.join("index.json").exists());
    }

    #[test]
    fn get_rejects_malformed_package() {
        let temp = TempDir::new().unwrap();
        kiln_in(&temp)
            .args(["get", "not-a-package"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn invalid_config_fails() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("config.toml");
        std::fs::write(&config, "[cache\n").unwrap();
        kiln()
            .env("KILN_CONFIG", &config)
            .args(["cache", "dir"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }
}
