//! Tests for the Includer
//!
//! Includer flattens nested `%include` directives from files, URLs and glob
//! patterns into one staged stream of lines.

use std::collections::BTreeSet;
use std::env;
use std::io::Cursor;

use includer::fetch::NoFetcher;
use includer::{IncludeError, IncludeOptions, Includer, Location, Source};
use serial_test::serial;
use url::Url;

use crate::common::{MapFetcher, TestDir, chomp};

fn expand(source: impl Into<Source>, options: IncludeOptions) -> Result<Vec<String>, IncludeError> {
    let inc = Includer::with_fetcher(source, options, &NoFetcher)?;
    let lines = inc.read_lines()?;
    inc.close()?;
    Ok(chomp(lines))
}

// =============================================================================
// Flattening Tests
// =============================================================================

#[test]
fn flattens_single_include() {
    let dir = TestDir::new();
    let other = dir.add_file("other.txt", "line-2a\nline-2b\n");
    let root = dir.add_file(
        "root.txt",
        &format!("line-1\n%include \"{}\"\nline-3\n", other.display()),
    );

    let lines = expand(root, IncludeOptions::default()).unwrap();
    assert_eq!(lines, vec!["line-1", "line-2a", "line-2b", "line-3"]);
}

#[test]
fn nested_includes_are_depth_first() {
    let dir = TestDir::new();
    dir.add_file("c.txt", "c1\n");
    dir.add_file("b.txt", "b1\n%include \"c.txt\"\nb2\n");
    let root = dir.add_file("a.txt", "a1\n%include \"b.txt\"\na2\n%include \"c.txt\"\na3\n");

    let lines = expand(root, IncludeOptions::default()).unwrap();
    assert_eq!(lines, vec!["a1", "b1", "c1", "b2", "a2", "c1", "a3"]);
}

#[test]
fn line_terminators_are_preserved() {
    let dir = TestDir::new();
    dir.add_file("part.txt", "windows\r\nlast-no-newline");
    let root = dir.add_file("root.txt", "first\n%include \"part.txt\"\nafter\n");

    let inc = Includer::new(root, IncludeOptions::default()).unwrap();
    let lines = inc.read_lines().unwrap();
    // An included file without a final newline runs into the next line
    assert_eq!(lines, vec!["first\n", "windows\r\n", "last-no-newlineafter\n"]);
}

#[test]
fn directive_only_matches_at_line_start() {
    let dir = TestDir::new();
    let root = dir.add_file("root.txt", "  %include \"nope.txt\"\nx %include \"nope.txt\"\n");

    let lines = expand(root, IncludeOptions::default()).unwrap();
    assert_eq!(lines, vec!["  %include \"nope.txt\"", "x %include \"nope.txt\""]);
}

#[test]
fn custom_include_pattern() {
    let dir = TestDir::new();
    dir.add_file("defs.h", "#define X 1\n");
    let root = dir.add_file("main.c", "#include <defs.h>\nint x = X;\n");

    let options = IncludeOptions::default().include_pattern("^#include <([^>]+)>");
    let lines = expand(root, options).unwrap();
    assert_eq!(lines, vec!["#define X 1", "int x = X;"]);
}

#[test]
fn file_url_source() {
    let dir = TestDir::new();
    let other = dir.add_file("other.txt", "one-2\ntwo-2\n");
    let root = dir.add_file(
        "root.txt",
        &format!("one-1\n%include \"{}\"\ntwo-1\n", other.display()),
    );
    let url = Url::from_file_path(&root).unwrap();

    let inc = Includer::new(url.clone(), IncludeOptions::default()).unwrap();
    assert_eq!(inc.path(), Some(&Location::Url(url)));
    assert_eq!(chomp(inc.read_lines().unwrap()), vec!["one-1", "one-2", "two-2", "two-1"]);
}

#[test]
fn relative_include_inside_file_url_stays_a_file_url() {
    let dir = TestDir::new();
    dir.add_file("sub/part.txt", "part\n");
    let root = dir.add_file("sub/root.txt", "%include \"part.txt\"\n");
    let url = Url::from_file_path(&root).unwrap();

    let lines = expand(url, IncludeOptions::default()).unwrap();
    assert_eq!(lines, vec!["part"]);
}

// =============================================================================
// Relative Resolution Tests
// =============================================================================

#[test]
fn relative_targets_resolve_against_including_file() {
    let dir = TestDir::new();
    dir.add_file("a/b/part.txt", "from a/b\n");
    dir.add_file("a/shared.txt", "from a\n");
    dir.add_file("a/b/root.txt", "%include \"part.txt\"\n%include \"../shared.txt\"\n");

    let lines = expand(dir.join("a/b/root.txt"), IncludeOptions::default()).unwrap();
    assert_eq!(lines, vec!["from a/b", "from a"]);
}

#[test]
fn nested_file_resolves_against_its_own_directory() {
    let dir = TestDir::new();
    dir.add_file("lib/inner.txt", "inner\n");
    dir.add_file("lib/outer.txt", "%include \"inner.txt\"\n");
    let root = dir.add_file("root.txt", "%include \"lib/outer.txt\"\n");

    let lines = expand(root, IncludeOptions::default()).unwrap();
    assert_eq!(lines, vec!["inner"]);
}

#[test]
#[serial]
fn anonymous_source_resolves_against_current_dir() {
    let dir = TestDir::new();
    dir.add_file("part.txt", "from cwd\n");
    let original = env::current_dir().unwrap();
    env::set_current_dir(dir.path()).unwrap();

    let result = expand(
        Source::lines(Cursor::new("%include \"part.txt\"\n")),
        IncludeOptions::default(),
    );

    env::set_current_dir(original).unwrap();
    assert_eq!(result.unwrap(), vec!["from cwd"]);
}

#[test]
#[serial]
fn anonymous_source_does_not_inherit_previous_file_location() {
    let files = TestDir::new();
    files.add_file("first.txt", "first\n");
    files.add_file("second.txt", "second\n");
    let empty = TestDir::new();
    let original = env::current_dir().unwrap();
    env::set_current_dir(empty.path()).unwrap();

    let text = format!(
        "%include \"{}\"\n%include \"second.txt\"\n",
        files.join_str("first.txt")
    );
    let result = expand(Source::lines(Cursor::new(text)), IncludeOptions::default());

    env::set_current_dir(original).unwrap();
    assert!(matches!(result, Err(IncludeError::Open { .. })));
}

#[test]
fn anonymous_source_has_no_path() {
    let inc = Includer::new(Source::lines(Cursor::new("x\n")), IncludeOptions::default()).unwrap();
    assert!(inc.path().is_none());
    assert_eq!(chomp(inc.read_lines().unwrap()), vec!["x"]);
}

#[test]
fn path_reports_original_file() {
    let dir = TestDir::new();
    let root = dir.add_file("root.txt", "x\n");
    let inc = Includer::new(root.clone(), IncludeOptions::default()).unwrap();
    assert_eq!(inc.path(), Some(&Location::File(root)));
}

// =============================================================================
// Nesting Depth Tests
// =============================================================================

#[test]
fn self_inclusion_hits_default_limit() {
    let dir = TestDir::new();
    let path = dir.join_str("loop.txt");
    dir.add_file("loop.txt", &format!("%include \"{path}\"\n"));

    match expand(path.as_str(), IncludeOptions::default()) {
        Err(IncludeError::TooManyIncludes { depth, line }) => {
            assert_eq!(depth, 100);
            assert_eq!(line, format!("%include \"{path}\""));
        },
        other => panic!("expected TooManyIncludes, got {other:?}"),
    }
}

#[test]
fn indirect_cycle_hits_limit() {
    let dir = TestDir::new();
    dir.add_file("ping.txt", "ping\n%include \"pong.txt\"\n");
    dir.add_file("pong.txt", "pong\n%include \"ping.txt\"\n");

    let options = IncludeOptions::default().max_nesting(7);
    let result = expand(dir.join("ping.txt"), options);
    assert!(matches!(result, Err(IncludeError::TooManyIncludes { depth: 7, .. })));
}

#[test]
fn chain_up_to_limit_succeeds() {
    let dir = TestDir::new();
    dir.add_file("c.txt", "c\n");
    dir.add_file("b.txt", "%include \"c.txt\"\n");
    dir.add_file("a.txt", "%include \"b.txt\"\n");

    let options = IncludeOptions::default().max_nesting(3);
    assert_eq!(expand(dir.join("a.txt"), options).unwrap(), vec!["c"]);
}

#[test]
fn chain_past_limit_fails() {
    let dir = TestDir::new();
    dir.add_file("d.txt", "d\n");
    dir.add_file("c.txt", "%include \"d.txt\"\n");
    dir.add_file("b.txt", "%include \"c.txt\"\n");
    dir.add_file("a.txt", "%include \"b.txt\"\n");

    let options = IncludeOptions::default().max_nesting(3);
    let err = expand(dir.join("a.txt"), options).unwrap_err();
    assert!(matches!(err, IncludeError::TooManyIncludes { depth: 3, .. }));
    assert!(err.to_string().contains("d.txt"));
}

#[test]
fn max_nesting_one_forbids_any_include() {
    let dir = TestDir::new();
    dir.add_file("b.txt", "b\n");
    let root = dir.add_file("a.txt", "a\n%include \"b.txt\"\n");

    let options = IncludeOptions::default().max_nesting(1);
    assert!(matches!(
        expand(root, options),
        Err(IncludeError::TooManyIncludes { depth: 1, .. })
    ));
}

#[test]
fn deep_limit_does_not_overflow_stack() {
    let dir = TestDir::new();
    let path = dir.join_str("loop.txt");
    dir.add_file("loop.txt", &format!("%include \"{path}\"\n"));

    let options = IncludeOptions::default().max_nesting(500);
    assert!(matches!(
        expand(path.as_str(), options),
        Err(IncludeError::TooManyIncludes { depth: 500, .. })
    ));
}

// =============================================================================
// Scheme Dispatch Tests
// =============================================================================

#[test]
fn remote_schemes_go_to_fetcher() {
    let fetcher = MapFetcher::default()
        .with_page("http://example.com/a.txt", "http\n")
        .with_page("https://example.com/b.txt", "https\n")
        .with_page("ftp://example.com/c.txt", "ftp\n");
    let text = "%include \"http://example.com/a.txt\"\n\
                %include \"https://example.com/b.txt\"\n\
                %include \"ftp://example.com/c.txt\"\n";

    let inc = Includer::with_fetcher(
        Source::lines(Cursor::new(text)),
        IncludeOptions::default(),
        &fetcher,
    )
    .unwrap();

    assert_eq!(chomp(inc.read_lines().unwrap()), vec!["http", "https", "ftp"]);
    assert_eq!(
        fetcher.requested(),
        vec![
            "http://example.com/a.txt",
            "https://example.com/b.txt",
            "ftp://example.com/c.txt"
        ]
    );
}

#[test]
fn relative_include_inside_url_uses_url_directory() {
    let fetcher = MapFetcher::default()
        .with_page("http://example.com/docs/main.txt", "top\n%include \"part.txt\"\n%include \"/root.txt\"\n")
        .with_page("http://example.com/docs/part.txt", "part\n")
        .with_page("http://example.com/root.txt", "root\n");

    let inc = Includer::with_fetcher(
        "http://example.com/docs/main.txt",
        IncludeOptions::default(),
        &fetcher,
    )
    .unwrap();

    assert_eq!(chomp(inc.read_lines().unwrap()), vec!["top", "part", "root"]);
}

#[test]
fn unsupported_scheme_fails() {
    let result = expand(
        Source::lines(Cursor::new("%include \"gopher://example.com/x\"\n")),
        IncludeOptions::default(),
    );
    match result {
        Err(IncludeError::UnsupportedScheme(scheme)) => assert_eq!(scheme, "gopher"),
        other => panic!("expected UnsupportedScheme, got {other:?}"),
    }
}

#[test]
fn remote_without_fetcher_fails_to_open() {
    let result = expand(
        Source::lines(Cursor::new("%include \"http://example.com/x\"\n")),
        IncludeOptions::default(),
    );
    assert!(matches!(result, Err(IncludeError::Open { .. })));
}

// =============================================================================
// Glob Tests
// =============================================================================

fn glob_fixture() -> TestDir {
    let dir = TestDir::new();
    dir.add_file("parts/b.txt", "b\n");
    dir.add_file("parts/a.txt", "a\n");
    dir.add_file("parts/c.txt", "c\n");
    dir.add_file("root.txt", "start\n%include \"parts/*.txt\"\nend\n");
    dir
}

#[test]
fn sorted_glob_is_lexicographic() {
    let dir = glob_fixture();
    let options = IncludeOptions::default().allow_glob(true);
    let lines = expand(dir.join("root.txt"), options).unwrap();
    assert_eq!(lines, vec!["start", "a", "b", "c", "end"]);
}

#[test]
fn unsorted_glob_includes_every_match() {
    let dir = glob_fixture();
    let options = IncludeOptions::default().allow_glob(true).sort_glob(false);
    let lines = expand(dir.join("root.txt"), options).unwrap();

    assert_eq!(lines.first().map(String::as_str), Some("start"));
    assert_eq!(lines.last().map(String::as_str), Some("end"));
    let middle: BTreeSet<_> = lines[1..lines.len() - 1].iter().cloned().collect();
    assert_eq!(middle, BTreeSet::from(["a".to_string(), "b".to_string(), "c".to_string()]));
}

#[test]
fn glob_without_matches_is_empty() {
    let dir = TestDir::new();
    let root = dir.add_file("root.txt", "x\n%include \"missing/*.txt\"\ny\n");
    let options = IncludeOptions::default().allow_glob(true);
    assert_eq!(expand(root, options).unwrap(), vec!["x", "y"]);
}

#[test]
fn glob_disabled_treats_pattern_literally() {
    let dir = glob_fixture();
    let result = expand(dir.join("root.txt"), IncludeOptions::default());
    assert!(matches!(result, Err(IncludeError::Open { .. })));
}

#[test]
fn glob_matches_resolve_relative_to_themselves() {
    let dir = TestDir::new();
    dir.add_file("parts/one.txt", "one\n%include \"inner.inc\"\n");
    dir.add_file("parts/inner.inc", "inner\n");
    let root = dir.add_file("root.txt", "%include \"parts/*.txt\"\n");

    let options = IncludeOptions::default().allow_glob(true);
    assert_eq!(expand(root, options).unwrap(), vec!["one", "inner"]);
}

#[test]
fn glob_mode_still_requires_root_to_exist() {
    let dir = TestDir::new();
    let options = IncludeOptions::default().allow_glob(true);
    match expand(dir.join("absent.txt"), options) {
        Err(IncludeError::Open { location, .. }) => {
            assert_eq!(location, Location::File(dir.join("absent.txt")));
        },
        other => panic!("expected Open, got {other:?}"),
    }
}

#[test]
fn glob_mode_opens_root_literally() {
    let dir = glob_fixture();
    let pattern = dir.join_str("parts/*.txt");
    let options = IncludeOptions::default().allow_glob(true);
    assert!(matches!(
        expand(pattern.as_str(), options),
        Err(IncludeError::Open { .. })
    ));
}

#[test]
fn glob_metacharacters_in_parent_directory_are_literal() {
    let dir = TestDir::new();
    dir.add_file("proj [v1]/part.txt", "part\n");
    dir.add_file("proj [v1]/more/x.inc", "x\n");
    let root = dir.add_file(
        "proj [v1]/root.txt",
        "a\n%include \"part.txt\"\n%include \"more/*.inc\"\nb\n",
    );

    let options = IncludeOptions::default().allow_glob(true);
    assert_eq!(expand(root, options).unwrap(), vec!["a", "part", "x", "b"]);
}

#[test]
fn bad_glob_pattern_fails() {
    let dir = TestDir::new();
    let root = dir.add_file("root.txt", "%include \"[unclosed\"\n");
    let options = IncludeOptions::default().allow_glob(true);
    assert!(matches!(expand(root, options), Err(IncludeError::BadGlob { .. })));
}

// =============================================================================
// Error Tests
// =============================================================================

#[test]
fn missing_top_level_file_fails_to_open() {
    let dir = TestDir::new();
    let result = expand(dir.join("absent.txt"), IncludeOptions::default());
    assert!(matches!(result, Err(IncludeError::Open { .. })));
}

#[test]
fn missing_nested_file_aborts_everything() {
    let dir = TestDir::new();
    let root = dir.add_file("root.txt", "ok\n%include \"absent.txt\"\n");
    match expand(root, IncludeOptions::default()) {
        Err(IncludeError::Open { location, .. }) => {
            assert_eq!(location, Location::File(dir.join("absent.txt")));
        },
        other => panic!("expected Open, got {other:?}"),
    }
}

#[test]
fn directory_target_fails_to_open() {
    let dir = TestDir::new();
    std::fs::create_dir(dir.join("subdir")).unwrap();
    let root = dir.add_file("root.txt", "%include \"subdir\"\n");
    match expand(root, IncludeOptions::default()) {
        Err(IncludeError::Open { location, .. }) => {
            assert_eq!(location, Location::File(dir.join("subdir")));
        },
        other => panic!("expected Open, got {other:?}"),
    }
}

#[test]
fn empty_source_is_bad_input() {
    assert!(matches!(
        expand("", IncludeOptions::default()),
        Err(IncludeError::BadInput(_))
    ));
}

#[test]
fn invalid_regex_is_rejected() {
    let options = IncludeOptions::default().include_pattern("^%include (");
    let result = expand(Source::lines(Cursor::new("x\n")), options);
    assert!(matches!(result, Err(IncludeError::InvalidPattern { .. })));
}

// =============================================================================
// Staged Result Tests
// =============================================================================

#[test]
fn each_line_can_repeat() {
    let dir = TestDir::new();
    let root = dir.add_file("root.txt", "a\nb\n");
    let inc = Includer::new(root, IncludeOptions::default()).unwrap();

    let mut first = Vec::new();
    inc.each_line(|line| first.push(line.to_string())).unwrap();
    let mut second = Vec::new();
    inc.each_line(|line| second.push(line.to_string())).unwrap();

    assert_eq!(first, vec!["a\n", "b\n"]);
    assert_eq!(first, second);
}

#[test]
fn close_removes_staged_file() {
    let dir = TestDir::new();
    let root = dir.add_file("root.txt", "a\n");
    let inc = Includer::new(root, IncludeOptions::default()).unwrap();

    let staged = inc.staged_path().to_path_buf();
    assert!(staged.exists());
    inc.close().unwrap();
    assert!(!staged.exists());
}

#[test]
fn staged_result_survives_source_changes() {
    let dir = TestDir::new();
    let root = dir.add_file("root.txt", "before\n");
    let inc = Includer::new(root.clone(), IncludeOptions::default()).unwrap();

    std::fs::write(&root, "after\n").unwrap();
    assert_eq!(chomp(inc.read_lines().unwrap()), vec!["before"]);
}
