// rt-core/tests/repository_integration_tests.rs
use anyhow::Result;
use std::fs::{self, File};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::{tempdir, TempDir};
use test_log::test;

use rt_core::builtin::BuiltinFile;
use rt_core::{
    BuiltinSet, CacheMiss, FilterRepository, FilterSource, LoadOrigin, RepositoryPaths,
};

fn builtins(status_body: &str) -> BuiltinSet {
    BuiltinSet::from_files(vec![
        BuiltinFile {
            path: "git/status.toml".to_string(),
            contents: status_body.to_string(),
        },
        BuiltinFile {
            path: "cargo/test.toml".to_string(),
            contents: "command = \"cargo test\"\n".to_string(),
        },
    ])
}

fn repository(dir: &TempDir, builtins: BuiltinSet) -> FilterRepository {
    FilterRepository::new(
        RepositoryPaths::new(dir.path().join("filters"), dir.path().join("cache").join("filters.bin")),
        builtins,
    )
}

fn write_user_filter(root: &Path, name: &str, body: &str) -> Result<std::path::PathBuf> {
    let path = root.join(format!("{name}.toml"));
    fs::create_dir_all(path.parent().unwrap())?;
    fs::write(&path, body)?;
    Ok(path)
}

#[test]
fn test_user_definition_shadows_builtin() -> Result<()> {
    let dir = tempdir()?;
    let repo = repository(&dir, builtins("command = \"git status\"\n"));
    write_user_filter(&repo.paths().user_dir, "git/status", "command = [\"git status\", \"git st\"]\n")?;

    let filters = repo.load()?;
    let statuses: Vec<_> = filters.iter().filter(|f| f.name == "git/status").collect();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].source, FilterSource::User);
    assert_eq!(statuses[0].commands, vec!["git status", "git st"]);

    let names: Vec<&str> = filters.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["cargo/test", "git/status"]);
    Ok(())
}

#[test]
fn test_missing_user_directory_is_not_an_error() -> Result<()> {
    let dir = tempdir()?;
    let repo = repository(&dir, builtins("command = \"git status\"\n"));
    let filters = repo.load()?;
    assert_eq!(filters.len(), 2);
    assert!(filters.iter().all(|f| f.source == FilterSource::Builtin));
    Ok(())
}

#[test]
fn test_unparsable_user_file_is_skipped() -> Result<()> {
    let dir = tempdir()?;
    let repo = repository(&dir, BuiltinSet::empty());
    write_user_filter(&repo.paths().user_dir, "good", "command = \"make\"\n")?;
    write_user_filter(&repo.paths().user_dir, "bad", "command = \"make\"\nbogus_key = 1\n")?;
    fs::write(repo.paths().user_dir.join("notes.txt"), "not a filter")?;

    let filters = repo.load()?;
    let names: Vec<&str> = filters.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["good"]);
    Ok(())
}

#[test]
fn test_second_load_is_served_from_snapshot() -> Result<()> {
    let dir = tempdir()?;
    let repo = repository(&dir, builtins("command = \"git status\"\n"));
    write_user_filter(&repo.paths().user_dir, "make", "command = \"make\"\n")?;

    let first = repo.load_with_outcome()?;
    assert!(matches!(first.origin, LoadOrigin::Sources(CacheMiss::Missing)));
    assert!(repo.paths().cache_file.exists());

    let second = repo.load_with_outcome()?;
    assert!(matches!(second.origin, LoadOrigin::Snapshot));
    assert_eq!(first.filters, second.filters);
    Ok(())
}

#[test]
fn test_modified_user_file_invalidates_snapshot() -> Result<()> {
    let dir = tempdir()?;
    let repo = repository(&dir, BuiltinSet::empty());
    let path = write_user_filter(&repo.paths().user_dir, "make", "command = \"make\"\n")?;
    repo.load()?;

    // T1 > T0: the file is modified after the snapshot was built.
    fs::write(&path, "command = \"make all\"\n")?;
    File::options()
        .write(true)
        .open(&path)?
        .set_modified(SystemTime::now() + Duration::from_secs(60))?;

    let outcome = repo.load_with_outcome()?;
    assert!(matches!(outcome.origin, LoadOrigin::Sources(CacheMiss::Stale { .. })));
    assert_eq!(outcome.filters[0].commands, vec!["make all"]);
    Ok(())
}

#[test]
fn test_corrupt_snapshot_falls_back_to_sources() -> Result<()> {
    let dir = tempdir()?;
    let repo = repository(&dir, builtins("command = \"git status\"\n"));
    fs::create_dir_all(repo.paths().cache_file.parent().unwrap())?;
    fs::write(&repo.paths().cache_file, b"definitely not a snapshot")?;

    let outcome = repo.load_with_outcome()?;
    assert!(matches!(outcome.origin, LoadOrigin::Sources(CacheMiss::Corrupt(_))));
    assert_eq!(outcome.filters.len(), 2);

    // The corrupt artifact was replaced.
    assert!(matches!(repo.load_with_outcome()?.origin, LoadOrigin::Snapshot));
    Ok(())
}

#[test]
fn test_changed_builtins_invalidate_snapshot() -> Result<()> {
    let dir = tempdir()?;
    repository(&dir, builtins("command = \"git status\"\n")).load()?;

    let upgraded = repository(&dir, builtins("command = [\"git status\", \"git st\"]\n"));
    let outcome = upgraded.load_with_outcome()?;
    assert!(matches!(outcome.origin, LoadOrigin::Sources(CacheMiss::BuiltinsChanged)));
    let status = outcome.filters.iter().find(|f| f.name == "git/status").unwrap();
    assert_eq!(status.commands, vec!["git status", "git st"]);
    Ok(())
}

#[test]
fn test_clear_cache_and_info() -> Result<()> {
    let dir = tempdir()?;
    let repo = repository(&dir, builtins("command = \"git status\"\n"));
    assert!(repo.cache_info().is_none());
    assert!(!repo.clear_cache()?);

    repo.load()?;
    let info = repo.cache_info().unwrap();
    assert_eq!(info.filter_count, Some(2));
    assert!(info.size > 0);
    assert!(info.built_at.is_some());

    assert!(repo.clear_cache()?);
    assert!(!repo.paths().cache_file.exists());
    Ok(())
}

#[test]
fn test_definition_source_prefers_user_file() -> Result<()> {
    let dir = tempdir()?;
    let repo = repository(&dir, builtins("command = \"git status\"\n"));

    let (source, text) = repo.definition_source("git/status").unwrap();
    assert_eq!(source, FilterSource::Builtin);
    assert_eq!(text, "command = \"git status\"\n");

    write_user_filter(&repo.paths().user_dir, "git/status", "command = \"git st\"\n")?;
    let (source, text) = repo.definition_source("git/status").unwrap();
    assert_eq!(source, FilterSource::User);
    assert_eq!(text, "command = \"git st\"\n");

    assert!(repo.definition_source("nope").is_none());
    Ok(())
}

#[test]
fn test_dotted_user_name_is_found_again() -> Result<()> {
    let dir = tempdir()?;
    let repo = repository(&dir, builtins("command = \"git status\"\n"));
    write_user_filter(&repo.paths().user_dir, "docker.compose", "command = \"docker compose\"\n")?;

    let filters = repo.load()?;
    assert!(filters.iter().any(|f| f.name == "docker.compose"));

    let (source, text) = repo.definition_source("docker.compose").unwrap();
    assert_eq!(source, FilterSource::User);
    assert_eq!(text, "command = \"docker compose\"\n");
    Ok(())
}

#[test]
fn test_user_path_that_is_a_file_means_no_user_filters() -> Result<()> {
    let dir = tempdir()?;
    let repo = repository(&dir, builtins("command = \"git status\"\n"));
    fs::write(&repo.paths().user_dir, "not a directory")?;

    let filters = repo.load()?;
    let names: Vec<&str> = filters.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["cargo/test", "git/status"]);
    assert!(filters.iter().all(|f| f.source == FilterSource::Builtin));
    Ok(())
}
