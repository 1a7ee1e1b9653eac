//! Integration tests for iconpack

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const STAR: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="16" height="16" viewBox="0 0 16 16"><!-- star --><path d="M8 0l2 6h6l-5 4 2 6-5-4-5 4 2-6-5-4h6z"/></svg>"#;

    fn iconpack() -> Command {
        cargo_bin_cmd!("iconpack")
    }

    /// A project directory with its own config, cache and icon folder
    struct Project {
        dir: TempDir,
    }

    impl Project {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            fs::create_dir_all(dir.path().join("icons")).unwrap();
            fs::create_dir_all(dir.path().join("src")).unwrap();
            let project = Self { dir };
            project.config("");
            project
        }

        fn path(&self) -> &Path {
            self.dir.path()
        }

        fn config(&self, extra: &str) {
            let cache = self.path().join(".cache");
            let content = format!(
                "{extra}\n[resolve]\nsource_dir = \"icons\"\n\n[cache]\ndir = {:?}\n",
                cache.display().to_string()
            );
            fs::write(self.path().join("iconpack.toml"), content).unwrap();
        }

        fn icon(&self, key: &str, body: &str) {
            let path = self.path().join("icons").join(format!("{key}.svg"));
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }

        fn source(&self, name: &str, body: &str) {
            fs::write(self.path().join("src").join(name), body).unwrap();
        }

        fn cmd(&self) -> Command {
            let mut cmd = iconpack();
            cmd.current_dir(self.path())
                .env_remove("ICONPACK_CONFIG")
                .env("XDG_CONFIG_HOME", self.path().join(".xdg"))
                .env("HOME", self.path());
            cmd
        }
    }

    #[test]
    fn help_displays() {
        iconpack()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Icon asset pipeline"));
    }

    #[test]
    fn version_displays() {
        iconpack()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("iconpack"));
    }

    #[test]
    fn scan_lists_keys_in_order() {
        let project = Project::new();
        project.source(
            "app.jsx",
            r#"<Icon uri="ui/menu" /><Icon uri={"star"} /><Icon uri="ui/menu" />"#,
        );

        project
            .cmd()
            .args(["scan", "src"])
            .assert()
            .success()
            .stdout("ui/menu\nstar\n");
    }

    #[test]
    fn compile_emits_project_and_bundled_icons() {
        let project = Project::new();
        project.icon("star", STAR);
        project.source("app.jsx", r#"<Icon uri="star" /><Icon uri="ui/close" />"#);

        project
            .cmd()
            .args(["compile", "src"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with(
                "// Generated by iconpack. Do not edit.\n",
            ))
            .stdout(predicate::str::contains("mode: \"vector\""))
            .stdout(predicate::str::contains("\"star\": {"))
            .stdout(predicate::str::contains("props: {viewBox: \"0 0 16 16\"}"))
            .stdout(predicate::str::contains("\"ui/close\": {"))
            .stdout(predicate::str::contains("<!--").not())
            .stdout(predicate::str::contains("<title>").not());
    }

    #[test]
    fn project_icon_overrides_bundled_one() {
        let project = Project::new();
        project.icon("ui/close", STAR);

        project
            .cmd()
            .args(["compile", "--key", "ui/close"])
            .assert()
            .success()
            .stdout(predicate::str::contains("0 0 16 16"));
    }

    #[test]
    fn compile_is_deterministic() {
        let project = Project::new();
        project.icon("star", STAR);
        project.source("app.jsx", r#"<Icon uri="star" /><Icon uri="ui/menu" />"#);

        let first = project.cmd().args(["compile", "src"]).output().unwrap();
        let second = project.cmd().args(["compile", "src"]).output().unwrap();

        assert!(first.status.success());
        assert_eq!(first.stdout, second.stdout);
        assert!(project.path().join(".cache").read_dir().unwrap().next().is_some());
    }

    #[test]
    fn missing_icon_warns_but_succeeds() {
        let project = Project::new();
        project.icon("star", STAR);

        project
            .cmd()
            .args(["compile", "-k", "star", "-k", "nope/missing"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"star\""))
            .stdout(predicate::str::contains("nope/missing").not())
            .stderr(predicate::str::contains("warning:"))
            .stderr(predicate::str::contains("nope/missing"));
    }

    #[test]
    fn strict_fails_on_missing_icon() {
        let project = Project::new();

        project
            .cmd()
            .args(["compile", "--strict", "-k", "nope/missing"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Compile failed"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn compile_writes_out_file() {
        let project = Project::new();
        project.icon("star", STAR);
        let out = project.path().join("build/icons.js");

        project
            .cmd()
            .args(["compile", "-k", "star", "--no-cache", "--out"])
            .arg(&out)
            .assert()
            .success()
            .stdout("");

        let written = fs::read_to_string(out).unwrap();
        assert!(written.contains("\"star\""));
    }

    #[test]
    fn raster_without_rasterizer_fails_with_hint() {
        let project = Project::new();
        project.config("mode = \"raster\"\n\n[raster]\nrasterizer = \"iconpack-no-such-program-8f3a\"\n");

        project
            .cmd()
            .args(["compile", "-k", "star"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("iconpack-no-such-program-8f3a"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn config_path_reports_local_file() {
        let project = Project::new();

        project
            .cmd()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("iconpack.toml"));
    }

    #[test]
    fn config_show() {
        let project = Project::new();

        project
            .cmd()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("mode = \"vector\""))
            .stdout(predicate::str::contains("[general]"));
    }

    #[test]
    fn invalid_config_is_reported() {
        let project = Project::new();
        fs::write(project.path().join("iconpack.toml"), "mode = \"bitmap\"\n").unwrap();

        project
            .cmd()
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn explicit_missing_config_fails() {
        let project = Project::new();

        project
            .cmd()
            .args(["scan", "src", "--config", "does-not-exist.toml"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Configuration file not found"));
    }
}
