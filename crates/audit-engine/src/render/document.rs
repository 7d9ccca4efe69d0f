//! 문서 페이지 배치
//!
//! [`paginate`]는 리포트를 페이지 단위 줄 목록([`DocumentLayout`])으로 배치하는
//! 순수 함수입니다. PDF 인코딩은 [`super::pdf`]가 담당합니다.
//!
//! # 배치 규칙
//!
//! - 한 페이지는 최대 `page_lines`줄을 가집니다.
//! - `line_width`보다 긴 발견 항목은 이어지는 줄로 나뉩니다. 내용은 잘리지 않습니다.
//! - 섹션이 다음 페이지로 넘어가면 새 페이지는 `"<Title> (continued)"` 제목으로 시작합니다.
//! - 섹션 제목은 첫 항목 없이 페이지 끝에 홀로 남지 않습니다.

use dockaudit_core::types::ProbeKind;

use super::text::{self, NONE_FOUND};
use crate::report::Report;

/// 페이지당 최소 줄 수
pub const MIN_PAGE_LINES: usize = 10;

/// 문서 한 줄의 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    /// 리포트 제목
    Title,
    /// 헤더 메타데이터 (ID, 이미지, 생성 시각)
    Meta,
    /// 섹션 제목
    Heading,
    /// 발견 항목의 첫 줄
    Finding,
    /// 나뉜 발견 항목의 이어지는 줄
    Continuation,
    /// 빈 섹션 표시 (`None found`)
    NoneFound,
    /// 빈 줄
    Blank,
}

/// 배치된 한 줄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocLine {
    pub style: LineStyle,
    pub text: String,
    /// 이 줄이 속한 섹션 (헤더 영역은 `None`)
    pub section: Option<ProbeKind>,
}

impl DocLine {
    fn new(style: LineStyle, text: impl Into<String>, section: Option<ProbeKind>) -> Self {
        Self {
            style,
            text: text.into(),
            section,
        }
    }
}

/// 한 페이지
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    lines: Vec<DocLine>,
}

impl Page {
    pub fn lines(&self) -> &[DocLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// 페이지 배치 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLayout {
    pages: Vec<Page>,
    page_lines: usize,
    line_width: usize,
}

impl DocumentLayout {
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// 페이지당 최대 줄 수
    pub fn page_lines(&self) -> usize {
        self.page_lines
    }

    /// 줄당 최대 문자 수
    pub fn line_width(&self) -> usize {
        self.line_width
    }

    /// 모든 페이지에 흩어진 섹션 항목을 원래 발견 항목으로 다시 조립합니다.
    ///
    /// 이어지는 줄은 앞 항목에 붙이고, `None found` 표시는 제외합니다.
    pub fn section_lines(&self, kind: ProbeKind) -> Vec<String> {
        let mut findings: Vec<String> = Vec::new();
        for line in self.pages.iter().flat_map(|p| p.lines.iter()) {
            if line.section != Some(kind) {
                continue;
            }
            match line.style {
                LineStyle::Finding => findings.push(line.text.clone()),
                LineStyle::Continuation => match findings.last_mut() {
                    Some(last) => last.push_str(&line.text),
                    None => findings.push(line.text.clone()),
                },
                _ => {}
            }
        }
        findings
    }
}

/// 긴 줄을 `width` 문자 단위로 나눕니다. 이어 붙이면 원래 문자열이 됩니다.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(width.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

struct Paginator {
    pages: Vec<Page>,
    current: Page,
    page_lines: usize,
}

impl Paginator {
    fn remaining(&self) -> usize {
        self.page_lines.saturating_sub(self.current.len())
    }

    fn break_page(&mut self) {
        let full = std::mem::take(&mut self.current);
        self.pages.push(full);
    }

    fn push(&mut self, line: DocLine) {
        self.current.lines.push(line);
    }

    /// 섹션 본문 한 줄을 추가합니다. 페이지가 가득 차면 이어지는 제목과 함께 새 페이지를 시작합니다.
    fn push_body(&mut self, kind: ProbeKind, line: DocLine) {
        if self.remaining() == 0 {
            self.break_page();
            self.push(DocLine::new(
                LineStyle::Heading,
                format!("{} (continued)", kind.title()),
                Some(kind),
            ));
        }
        self.push(line);
    }

    fn finish(mut self) -> Vec<Page> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.break_page();
        }
        self.pages
    }
}

/// 리포트를 페이지 단위로 배치합니다.
///
/// `page_lines`는 [`MIN_PAGE_LINES`] 미만이면 그 값으로 올립니다.
pub fn paginate(report: &Report, page_lines: usize, line_width: usize) -> DocumentLayout {
    let page_lines = page_lines.max(MIN_PAGE_LINES);
    let line_width = line_width.max(1);

    let mut p = Paginator {
        pages: Vec::new(),
        current: Page::default(),
        page_lines,
    };

    // 헤더 (첫 페이지, MIN_PAGE_LINES 안에 항상 들어감)
    for chunk in wrap(&text::title(report), line_width) {
        if p.remaining() == 0 {
            p.break_page();
        }
        p.push(DocLine::new(LineStyle::Title, chunk, None));
    }
    for meta in text::header_lines(report) {
        for chunk in wrap(&meta, line_width) {
            if p.remaining() == 0 {
                p.break_page();
            }
            p.push(DocLine::new(LineStyle::Meta, chunk, None));
        }
    }

    for result in report.results() {
        let kind = result.kind();

        // 빈 줄 + 제목 + 첫 줄이 들어갈 자리가 없으면 새 페이지 (페이지 맨 위에는 빈 줄 없음)
        if !p.current.is_empty() {
            if p.remaining() >= 3 {
                p.push(DocLine::new(LineStyle::Blank, "", None));
            } else {
                p.break_page();
            }
        }
        p.push(DocLine::new(LineStyle::Heading, kind.title(), Some(kind)));

        if result.is_empty() {
            p.push_body(kind, DocLine::new(LineStyle::NoneFound, NONE_FOUND, Some(kind)));
            continue;
        }

        for finding in result.lines() {
            for (i, chunk) in wrap(finding, line_width).into_iter().enumerate() {
                let style = if i == 0 {
                    LineStyle::Finding
                } else {
                    LineStyle::Continuation
                };
                p.push_body(kind, DocLine::new(style, chunk, Some(kind)));
            }
        }
    }

    DocumentLayout {
        pages: p.finish(),
        page_lines,
        line_width,
    }
}
