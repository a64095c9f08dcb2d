use super::*;

struct Fixture {
    root: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            root: tempfile::tempdir().expect("tempdir"),
        }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root.path().join(rel)
    }

    fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    fn mkdir(&self, rel: &str) -> PathBuf {
        let path = self.path(rel);
        fs::create_dir_all(&path).expect("create dir");
        path
    }

    /// A locator whose host locations all live inside the fixture.
    fn locator(&self) -> ToolLocator {
        ToolLocator::with_paths(
            self.path("cache/tool_cache.json"),
            self.path("launcher/LauncherInstalled.dat"),
            vec![self.path("engines")],
            self.path("vs/fixed/devenv_fixed"),
            self.path("vs/installs"),
        )
        .expect("build locator")
    }
}

#[test]
fn cached_build_tool_path_wins_when_it_still_exists() {
    let fx = Fixture::new();
    let cached = fx.write("somewhere/UnrealVersionSelector_cached", "");
    fx.write(
        "cache/tool_cache.json",
        &format!(
            r#"{{"schema_version": 1, "build_tool_path": {}}}"#,
            serde_json::to_string(&cached).expect("encode path")
        ),
    );
    let mut locator = fx.locator();
    let found = locator.locate_build_tool("5.3").expect("locate");
    assert_eq!(found, cached);
}

#[test]
fn stale_cache_entry_triggers_rediscovery() {
    let fx = Fixture::new();
    fx.write(
        "cache/tool_cache.json",
        r#"{"schema_version": 1, "build_tool_path": "/definitely/gone"}"#,
    );
    let expected = fx.write(
        &format!("engines/UE_5.3/Engine/Binaries/{BUILD_TOOL_EXECUTABLE}"),
        "",
    );
    let mut locator = fx.locator();
    let found = locator.locate_build_tool("5.3").expect("locate");
    assert_eq!(found, expected);
    assert_eq!(locator.cache().build_tool_path.as_deref(), Some(expected.as_path()));
}

#[test]
fn launcher_metadata_resolves_the_install_root() {
    let fx = Fixture::new();
    let install = fx.mkdir("custom/UE_5.1");
    let expected = fx.write(&format!("custom/UE_5.1/Binaries/{BUILD_TOOL_EXECUTABLE}"), "");
    fx.write(
        "launcher/LauncherInstalled.dat",
        &format!(
            r#"{{"InstallationList": [{{"AppName": "UE_5.1", "InstallLocation": {}}}]}}"#,
            serde_json::to_string(&install).expect("encode path")
        ),
    );
    let mut locator = fx.locator();
    let found = locator.locate_build_tool("5.1").expect("locate");
    assert_eq!(found, expected);

    // Discovery persists for the next run.
    let reloaded = fx.locator();
    assert_eq!(
        reloaded.cache().build_tool_path.as_deref(),
        Some(expected.as_path())
    );
}

#[test]
fn empty_install_subtree_fails_and_leaves_cache_unmodified() {
    let fx = Fixture::new();
    fx.mkdir("engines/UE_5.3/Engine/Binaries");
    let mut locator = fx.locator();
    let err = locator.locate_build_tool("5.3").expect_err("nothing to find");
    assert!(err.to_string().contains("--set-build-tool-dir"));
    assert!(locator.cache().build_tool_path.is_none());
    assert!(!fx.path("cache/tool_cache.json").exists());
}

#[test]
fn unknown_engine_version_names_the_override_flag() {
    let fx = Fixture::new();
    let mut locator = fx.locator();
    let err = locator.locate_build_tool("4.27").expect_err("no installs");
    assert!(err.to_string().contains("4.27"));
    assert!(err.to_string().contains("--set-build-tool-dir"));
}

#[test]
fn ide_fixed_path_is_preferred() {
    let fx = Fixture::new();
    let fixed = fx.write("vs/fixed/devenv_fixed", "");
    let mut locator = fx.locator();
    let found = locator.locate_ide_executable().expect("locate");
    assert_eq!(found, fixed);
}

#[test]
fn ide_version_scan_picks_the_highest_numbered_directory() {
    let fx = Fixture::new();
    fx.write(&format!("vs/installs/17/Common7/IDE/{IDE_EXECUTABLE}"), "");
    let expected = fx.write(&format!("vs/installs/2022/Common7/IDE/{IDE_EXECUTABLE}"), "");
    fx.mkdir("vs/installs/Preview");
    let mut locator = fx.locator();
    let found = locator.locate_ide_executable().expect("locate");
    assert_eq!(found, expected);
    assert_eq!(
        locator.cache().ide_executable_path.as_deref(),
        Some(expected.as_path())
    );
}

#[test]
fn highest_numbered_subdir_ignores_non_numeric_names() {
    let fx = Fixture::new();
    fx.mkdir("vs/installs/17");
    fx.mkdir("vs/installs/2022");
    fx.mkdir("vs/installs/Preview");
    fx.write("vs/installs/99", ""); // a file, not a version directory
    let picked = highest_numbered_subdir(&fx.path("vs/installs")).expect("pick");
    assert_eq!(picked, fx.path("vs/installs/2022"));
}

#[test]
fn find_executable_is_breadth_first_and_lexicographic() {
    let fx = Fixture::new();
    let shallow = fx.write("tree/tool", "");
    fx.write("tree/aaa/deep/tool", "");
    assert_eq!(
        find_executable(&fx.path("tree"), "tool").expect("find"),
        shallow
    );

    fx.mkdir("forest");
    fx.write("forest/beta/tool", "");
    let alpha = fx.write("forest/alpha/tool", "");
    assert_eq!(
        find_executable(&fx.path("forest"), "tool").expect("find"),
        alpha
    );
}

#[test]
fn find_executable_requires_an_exact_name() {
    let fx = Fixture::new();
    fx.write("tree/tool.bak", "");
    fx.write("tree/tools", "");
    assert!(find_executable(&fx.path("tree"), "tool").is_none());
}

#[test]
fn user_override_persists_only_on_a_hit() {
    let fx = Fixture::new();
    let mut locator = fx.locator();

    let empty = fx.mkdir("override/empty");
    let err = locator
        .record_user_override(ToolKind::Ide, &empty)
        .expect_err("nothing inside");
    assert!(err.to_string().contains(IDE_EXECUTABLE));
    assert!(locator.cache().ide_executable_path.is_none());
    assert!(!fx.path("cache/tool_cache.json").exists());

    let expected = fx.write(&format!("override/vs/Common7/IDE/{IDE_EXECUTABLE}"), "");
    let found = locator
        .record_user_override(ToolKind::Ide, &fx.path("override/vs"))
        .expect("record override");
    assert_eq!(found, expected);
    let reloaded = fx.locator();
    assert_eq!(
        reloaded.cache().ide_executable_path.as_deref(),
        Some(expected.as_path())
    );
}

#[test]
fn corrupt_launcher_metadata_falls_back_to_the_engine_roots() {
    let fx = Fixture::new();
    fx.write("launcher/LauncherInstalled.dat", "not json");
    let expected = fx.write(&format!("engines/UE_5.2/{BUILD_TOOL_EXECUTABLE}"), "");
    let mut locator = fx.locator();
    let found = locator.locate_build_tool("5.2").expect("locate");
    assert_eq!(found, expected);
}
