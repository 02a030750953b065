// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line-prefix marker parsing for review/test specialist output (spec §6
//! "Specialist output marker protocol").

use std::sync::LazyLock;

use regex::Regex;

/// Matches the UUID-like resume token an assistant process prints to its
/// own pane on first startup. The control plane never invents session ids
/// (spec §6): it only captures whatever token shows up in captured output.
static SESSION_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .expect("static session id pattern is valid")
});

/// Scans captured pane output for the first UUID-like token, per spec §6
/// "a UUID-like string matched by a simple regex from pane output".
pub fn extract_session_id(output: &str) -> Option<String> {
    SESSION_ID_RE.find(output).map(|m| m.as_str().to_string())
}

/// Parsed `REVIEW_RESULT` verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewResult {
    Approved,
    ChangesRequested,
    Commented,
}

impl ReviewResult {
    fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "APPROVED" => Some(ReviewResult::Approved),
            "CHANGES_REQUESTED" => Some(ReviewResult::ChangesRequested),
            "COMMENTED" => Some(ReviewResult::Commented),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewResult::Approved => "APPROVED",
            ReviewResult::ChangesRequested => "CHANGES_REQUESTED",
            ReviewResult::Commented => "COMMENTED",
        }
    }
}

/// Everything the coordinator extracts from a review-agent's captured
/// output, per spec §4.4 review-agent contract.
#[derive(Debug, Clone, Default)]
pub struct ReviewReport {
    pub result: Option<ReviewResult>,
    pub files_reviewed: Vec<String>,
    pub security_issues: Vec<String>,
    pub performance_issues: Vec<String>,
    pub notes: Option<String>,
}

/// Splits a `none | comma,separated,items` marker value.
fn parse_list_or_none(value: &str) -> Vec<String> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return Vec::new();
    }
    value.split(',').map(|s| s.trim().to_string()).collect()
}

/// Recognizes marker lines by prefix after trimming; unknown prefixes are
/// ignored (spec §6).
pub fn parse_review_report(output: &str) -> ReviewReport {
    let mut report = ReviewReport::default();
    for raw_line in output.lines() {
        let line = raw_line.trim();
        if let Some(rest) = line.strip_prefix("REVIEW_RESULT:") {
            report.result = ReviewResult::parse(rest);
        } else if let Some(rest) = line.strip_prefix("FILES_REVIEWED:") {
            report.files_reviewed = parse_list_or_none(rest);
        } else if let Some(rest) = line.strip_prefix("SECURITY_ISSUES:") {
            report.security_issues = parse_list_or_none(rest);
        } else if let Some(rest) = line.strip_prefix("PERFORMANCE_ISSUES:") {
            report.performance_issues = parse_list_or_none(rest);
        } else if let Some(rest) = line.strip_prefix("NOTES:") {
            report.notes = Some(rest.trim().to_string());
        }
    }
    report
}

/// Parsed `TEST_RESULT` verdict, analogous to `ReviewResult` (spec §4.4:
/// "analogous; emits pass/fail markers").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestVerdict {
    Pass,
    Fail,
}

#[derive(Debug, Clone, Default)]
pub struct TestReport {
    pub result: Option<TestVerdict>,
    pub notes: Option<String>,
}

pub fn parse_test_report(output: &str) -> TestReport {
    let mut report = TestReport::default();
    for raw_line in output.lines() {
        let line = raw_line.trim();
        if let Some(rest) = line.strip_prefix("TEST_RESULT:") {
            report.result = match rest.trim() {
                "PASS" => Some(TestVerdict::Pass),
                "FAIL" => Some(TestVerdict::Fail),
                _ => None,
            };
        } else if let Some(rest) = line.strip_prefix("TEST_NOTES:") {
            report.notes = Some(rest.trim().to_string());
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Looking at the diff now.
REVIEW_RESULT: CHANGES_REQUESTED
FILES_REVIEWED: src/lib.rs,src/main.rs
SECURITY_ISSUES: none
PERFORMANCE_ISSUES: unbounded loop in src/lib.rs
NOTES: please add a bound check
";

    #[test]
    fn parses_a_full_review_report() {
        let report = parse_review_report(SAMPLE);
        assert_eq!(report.result, Some(ReviewResult::ChangesRequested));
        assert_eq!(report.files_reviewed, vec!["src/lib.rs", "src/main.rs"]);
        assert!(report.security_issues.is_empty());
        assert_eq!(report.performance_issues, vec!["unbounded loop in src/lib.rs"]);
        assert_eq!(report.notes.as_deref(), Some("please add a bound check"));
    }

    #[test]
    fn unknown_prefixes_are_ignored() {
        let report = parse_review_report("FOO: bar\nREVIEW_RESULT: APPROVED\n");
        assert_eq!(report.result, Some(ReviewResult::Approved));
    }

    #[test]
    fn missing_markers_leave_report_empty() {
        let report = parse_review_report("just some chatter, no markers here");
        assert!(report.result.is_none());
        assert!(report.notes.is_none());
    }

    #[test]
    fn extracts_a_session_id_from_pane_chatter() {
        let pane = "Booting up...\nsession: 3fa85f64-5717-4562-b3fc-2c963f66afa6\nready\n";
        assert_eq!(
            extract_session_id(pane).as_deref(),
            Some("3fa85f64-5717-4562-b3fc-2c963f66afa6")
        );
    }

    #[test]
    fn no_session_id_in_output_is_none() {
        assert!(extract_session_id("just some chatter, no uuid here").is_none());
    }

    #[test]
    fn parses_test_pass_fail_markers() {
        assert_eq!(
            parse_test_report("TEST_RESULT: PASS\n").result,
            Some(TestVerdict::Pass)
        );
        assert_eq!(
            parse_test_report("TEST_RESULT: FAIL\nTEST_NOTES: 3 failures\n").notes.as_deref(),
            Some("3 failures")
        );
    }
}
