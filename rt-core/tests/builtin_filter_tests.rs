// rt-core/tests/builtin_filter_tests.rs
//! End-to-end checks of the embedded filters through the public API.

use test_log::test;

use rt_core::{headless_filter, BuiltinSet, FilterEngine, PipelineEngine};

fn builtin_filters() -> Vec<rt_core::FilterDefinition> {
    BuiltinSet::embedded().definitions()
}

#[test]
fn test_git_status_clean_tree_short_circuits() {
    let raw = "On branch main\nYour branch is up to date with 'origin/main'.\n\nnothing to commit, working tree clean\n";
    let outcome = headless_filter(&builtin_filters(), "git status", raw, 0);
    assert_eq!(outcome.filter_name.as_deref(), Some("git/status"));
    assert_eq!(outcome.output, "clean");
}

#[test]
fn test_git_status_dirty_tree_is_condensed() {
    let raw = "On branch main\n\
Your branch is up to date with 'origin/main'.\n\
\n\
Changes not staged for commit:\n\
  (use \"git add <file>...\" to update what will be committed)\n\
\tmodified:   src/lib.rs\n";
    let outcome = headless_filter(&builtin_filters(), "git status", raw, 0);
    assert_eq!(
        outcome.output,
        "branch: main\ntracking: origin/main (up to date)\nChanges not staged for commit:\n\tmodified:   src/lib.rs"
    );
}

#[test]
fn test_unknown_command_passes_through() {
    let raw = "a\nb\n";
    let outcome = headless_filter(&builtin_filters(), "frobnicate --all", raw, 3);
    assert_eq!(outcome.filter_name, None);
    assert_eq!(outcome.output, raw);
}

#[test]
fn test_specific_pattern_beats_shorter_one() {
    let filters = builtin_filters();
    let chosen = rt_core::match_filter(&filters, "cargo test --workspace").unwrap();
    assert_eq!(chosen.name, "cargo/test");
}

#[test]
fn test_engine_shares_its_cache_between_runs() {
    let filters = builtin_filters();
    let status = filters.iter().find(|f| f.name == "git/status").unwrap();
    let engine = PipelineEngine::new();

    engine.apply(status, "On branch main\n", 0);
    let compiled = engine.regex_cache().len();
    assert!(compiled > 0);

    engine.apply(status, "On branch dev\n", 0);
    assert_eq!(engine.regex_cache().len(), compiled);
}
