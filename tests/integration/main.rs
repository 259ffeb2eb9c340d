//! Integration tests for iac-cache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use predicates::prelude::*;
    use std::io::Write;
    use tar::{Builder, EntryType, Header};
    use tempfile::TempDir;

    /// Command isolated from the user's config and state directories
    fn iac_cache(home: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("iac-cache");
        cmd.env("IAC_CACHE_CONFIG", home.path().join("config.toml"))
            .env("HOME", home.path())
            .env("XDG_STATE_HOME", home.path().join("state"))
            .env("XDG_DATA_HOME", home.path().join("data"))
            .env_remove("IAC_CACHE_ORG")
            .env_remove("IAC_CACHE_TOKEN")
            .env_remove("IAC_CACHE_BUNDLE_URL")
            .env_remove("IAC_CACHE_API")
            .env("CI", "true");
        cmd
    }

    /// Home whose config turns telemetry off
    fn quiet_home() -> TempDir {
        let home = TempDir::new().unwrap();
        std::fs::write(
            home.path().join("config.toml"),
            "[general]\ntelemetry = false\n",
        )
        .unwrap();
        home
    }

    fn bundle(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = Builder::new(Vec::new());
        for (path, content) in files {
            let mut header = Header::new_gnu();
            header.set_path(path).unwrap();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_entry_type(EntryType::Regular);
            header.set_cksum();
            builder.append(&header, &content[..]).unwrap();
        }
        let tar = builder.into_inner().unwrap();

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&tar).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn help_displays() {
        let home = TempDir::new().unwrap();
        iac_cache(&home)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("compiled policy bundles"));
    }

    #[test]
    fn version_displays() {
        let home = TempDir::new().unwrap();
        iac_cache(&home)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("iac-cache"));
    }

    #[test]
    fn path_plain_lists_both_artifacts() {
        let home = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();

        iac_cache(&home)
            .args(["path", "k8s", "--format", "plain", "-C"])
            .arg(work.path())
            .assert()
            .success()
            .stdout(predicate::str::contains(".iac-data"))
            .stdout(predicate::str::contains("k8s_policy.wasm"))
            .stdout(predicate::str::contains("k8s_data.json"));
    }

    #[test]
    fn path_rejects_unknown_platform() {
        let home = TempDir::new().unwrap();
        iac_cache(&home).args(["path", "ansible"]).assert().failure();
    }

    #[test]
    fn clean_without_cache_succeeds() {
        let home = quiet_home();
        let work = TempDir::new().unwrap();

        iac_cache(&home)
            .arg("clean")
            .arg("-C")
            .arg(work.path())
            .assert()
            .success();
        assert!(!work.path().join(".iac-data").exists());
    }

    #[test]
    fn init_then_clean() {
        let home = quiet_home();
        let work = TempDir::new().unwrap();

        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/bundle.tar.gz")
            .with_status(200)
            .with_body(bundle(&[
                ("k8s_policy.wasm", b"wasm"),
                ("k8s_data.json", b"{}"),
            ]))
            .create();

        iac_cache(&home)
            .arg("init")
            .arg("-C")
            .arg(work.path())
            .arg("--bundle-url")
            .arg(format!("{}/bundle.tar.gz", server.url()))
            .assert()
            .success()
            .stdout(predicate::str::contains("Policy cache ready"));

        mock.assert();
        let cache = work.path().join(".iac-data");
        assert_eq!(std::fs::read(cache.join("k8s_policy.wasm")).unwrap(), b"wasm");

        iac_cache(&home)
            .args(["status", "--format", "plain", "-C"])
            .arg(work.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("kubernetes"))
            .stdout(predicate::str::contains("terraform").not());

        iac_cache(&home)
            .arg("clean")
            .arg("-C")
            .arg(work.path())
            .assert()
            .success();
        assert!(!cache.exists());
    }

    #[test]
    fn init_reports_download_failure() {
        let home = quiet_home();
        let work = TempDir::new().unwrap();

        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/bundle.tar.gz")
            .with_status(404)
            .create();

        iac_cache(&home)
            .arg("init")
            .arg("-C")
            .arg(work.path())
            .arg("--bundle-url")
            .arg(format!("{}/bundle.tar.gz", server.url()))
            .assert()
            .failure()
            .stderr(predicate::str::contains("unable to download the security rules"));

        mock.assert();
    }

    #[test]
    fn init_survives_custom_rules_failure() {
        let home = quiet_home();
        let work = TempDir::new().unwrap();

        let mut server = mockito::Server::new();
        let rules = server
            .mock("GET", "/api/custom-rules")
            .match_query(mockito::Matcher::UrlEncoded("org".into(), "acme".into()))
            .with_status(500)
            .create();
        let default = server
            .mock("GET", "/bundle.tar.gz")
            .with_status(200)
            .with_body(bundle(&[("tf_policy.wasm", b"wasm"), ("tf_data.json", b"{}")]))
            .create();

        iac_cache(&home)
            .args(["init", "--org", "acme", "--token", "secret", "-C"])
            .arg(work.path())
            .arg("--api-url")
            .arg(format!("{}/api", server.url()))
            .arg("--bundle-url")
            .arg(format!("{}/bundle.tar.gz", server.url()))
            .assert()
            .success()
            .stdout(predicate::str::contains("custom rules configured for organization acme"));

        rules.assert();
        default.assert();
        assert!(work.path().join(".iac-data/tf_policy.wasm").is_file());
    }

    #[test]
    fn config_path() {
        let home = TempDir::new().unwrap();
        iac_cache(&home)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_init_and_show() {
        let home = TempDir::new().unwrap();
        iac_cache(&home).args(["config", "init"]).assert().success();
        assert!(home.path().join("config.toml").is_file());

        iac_cache(&home)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[bundle]"));
    }

    #[test]
    fn config_show_masks_token() {
        let home = TempDir::new().unwrap();
        iac_cache(&home)
            .args(["--token", "super-secret", "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("super-secret").not());
    }

    #[test]
    fn disabled_telemetry_leaves_state_untouched() {
        let home = quiet_home();
        let work = TempDir::new().unwrap();

        let mut server = mockito::Server::new();
        server
            .mock("GET", "/bundle.tar.gz")
            .with_status(200)
            .with_body(bundle(&[("k8s_policy.wasm", b"wasm"), ("k8s_data.json", b"{}")]))
            .create();

        // No token, so the custom rules pass degrades and would emit an event
        iac_cache(&home)
            .args(["init", "--org", "acme", "-C"])
            .arg(work.path())
            .arg("--bundle-url")
            .arg(format!("{}/bundle.tar.gz", server.url()))
            .assert()
            .success();

        iac_cache(&home)
            .arg("clean")
            .arg("-C")
            .arg(work.path())
            .assert()
            .success();

        assert!(!home.path().join("state").join("iac-cache").exists());
        assert!(!home.path().join("data").join("iac-cache").exists());
    }
}
