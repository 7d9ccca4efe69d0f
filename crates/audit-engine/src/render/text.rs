//! 구조화된 텍스트 렌더링
//!
//! ```text
//! Container Report: api
//! Container ID: 3f2a...
//! Image: python:3.12
//! Generated At: 2026-03-01T12:00:00Z
//! ============================================================
//!
//! Environment:
//!   DB_PASSWORD=secret
//!
//! Config Files:
//!   /app/config.yml
//!
//! Large Files:
//!   None found
//! ...
//! ```
//!
//! 같은 입력이면 `Generated At` 줄을 제외하고 바이트 단위로 동일한 출력을 만듭니다.

use std::fmt::Write;

use crate::report::Report;

/// 헤더와 본문을 구분하는 줄
pub const RULE: &str = "============================================================";

/// 빈 섹션에 출력되는 문구
pub const NONE_FOUND: &str = "None found";

/// 발견 항목 들여쓰기
const INDENT: &str = "  ";

/// 리포트 제목 줄
pub fn title(report: &Report) -> String {
    format!("Container Report: {}", report.container().name())
}

/// 리포트 헤더 줄들 (제목 제외)
pub fn header_lines(report: &Report) -> Vec<String> {
    let container = report.container();
    vec![
        format!("Container ID: {}", container.id()),
        format!("Image: {}", container.image()),
        format!("Generated At: {}", report.generated_at_rfc3339()),
    ]
}

/// 리포트를 텍스트로 렌더링합니다.
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();

    // String에 대한 write!는 실패하지 않음
    let _ = writeln!(out, "{}", title(report));
    for line in header_lines(report) {
        let _ = writeln!(out, "{line}");
    }
    let _ = writeln!(out, "{RULE}");

    for result in report.results() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}:", result.kind().title());
        if result.is_empty() {
            let _ = writeln!(out, "{INDENT}{NONE_FOUND}");
        } else {
            for line in result.lines() {
                let _ = writeln!(out, "{INDENT}{line}");
            }
        }
    }

    out
}
