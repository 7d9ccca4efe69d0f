//! 리포트 렌더러 -- [`Report`]를 텍스트 또는 페이지 문서 아티팩트로 변환합니다.
//!
//! # 형식
//!
//! - [`ReportFormat::Text`]: 구조화된 텍스트 (`<name>-report.txt`)
//! - [`ReportFormat::Document`]: 페이지 단위 PDF 문서 (`<name>-report.pdf`)
//!
//! 두 형식 모두 섹션 순서는 `Environment, Config Files, Large Files, Database Files`로
//! 고정됩니다. 렌더링은 바이트 생성([`Renderer::render_to_bytes`])과
//! 원자적 기록([`Renderer::render`])으로 나뉩니다.
//!
//! # 파일 이름
//!
//! `<output_dir>/<sanitized name>-report.<ext>`. 정규화 결과가 같은 두 컨테이너는
//! 나중에 렌더링된 쪽이 앞의 아티팩트를 덮어씁니다.

pub mod document;
pub mod pdf;
pub mod text;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use dockaudit_core::metrics as m;
use dockaudit_core::types::ContainerDescriptor;

use crate::artifact;
use crate::error::AuditEngineError;
use crate::report::Report;

/// 아티팩트 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// 구조화된 텍스트
    Text,
    /// 페이지 단위 문서 (PDF)
    Document,
}

impl ReportFormat {
    /// 지원하는 모든 형식
    pub const ALL: [ReportFormat; 2] = [ReportFormat::Text, ReportFormat::Document];

    /// 설정 파일/CLI에서 쓰는 이름으로 형식을 찾습니다.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "document" | "pdf" => Some(Self::Document),
            _ => None,
        }
    }

    /// 형식 이름 (`text`, `document`)
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Document => "document",
        }
    }

    /// 파일 확장자
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Document => "pdf",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn sanitize(raw: &str) -> String {
    let cleaned: String = raw
        .trim_start_matches('/')
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => String::new(),
        _ => cleaned,
    }
}

/// 컨테이너 이름을 파일 이름에 안전한 형태로 정규화합니다.
///
/// 앞의 `/`를 제거하고 `[A-Za-z0-9._-]` 밖의 문자를 `_`로 바꿉니다.
/// 결과가 비어 있거나 `.`/`..`이면 컨테이너 ID를 사용합니다.
pub fn sanitize_name(container: &ContainerDescriptor) -> String {
    let name = sanitize(container.name());
    if !name.is_empty() {
        return name;
    }
    let id = sanitize(container.id());
    if id.is_empty() {
        "container".to_owned()
    } else {
        id
    }
}

/// 아티팩트의 최종 경로를 계산합니다.
pub fn artifact_path(
    output_dir: &Path,
    container: &ContainerDescriptor,
    format: ReportFormat,
) -> PathBuf {
    output_dir.join(format!(
        "{}-report.{}",
        sanitize_name(container),
        format.extension()
    ))
}

/// 리포트 렌더러
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    page_lines: usize,
    line_width: usize,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(60, 100)
    }
}

impl Renderer {
    /// 문서 페이지 크기(줄 수, 줄당 문자 수)로 렌더러를 생성합니다.
    pub fn new(page_lines: usize, line_width: usize) -> Self {
        Self {
            page_lines: page_lines.max(document::MIN_PAGE_LINES),
            line_width: line_width.max(1),
        }
    }

    /// 리포트를 지정한 형식의 바이트로 변환합니다. 파일 I/O는 하지 않습니다.
    pub fn render_to_bytes(&self, report: &Report, format: ReportFormat) -> Vec<u8> {
        match format {
            ReportFormat::Text => text::render_text(report).into_bytes(),
            ReportFormat::Document => {
                let layout = document::paginate(report, self.page_lines, self.line_width);
                pdf::encode(&layout, &text::title(report))
            }
        }
    }

    /// 리포트를 렌더링하여 `output_dir`에 원자적으로 기록합니다.
    ///
    /// # Errors
    ///
    /// 디렉토리를 만들 수 없거나 파일을 쓸 수 없으면
    /// `AuditEngineError::RenderFailure`를 반환합니다.
    pub async fn render(
        &self,
        report: &Report,
        format: ReportFormat,
        output_dir: &Path,
    ) -> Result<PathBuf, AuditEngineError> {
        let path = artifact_path(output_dir, report.container(), format);
        let bytes = self.render_to_bytes(report, format);
        let size = bytes.len();

        let target = path.clone();
        let written =
            tokio::task::spawn_blocking(move || artifact::write_atomic(&target, &bytes)).await;

        let failure = |reason: String| AuditEngineError::RenderFailure {
            container: report.container().name().to_owned(),
            path: path.display().to_string(),
            reason,
        };

        match written {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(failure(e.to_string())),
            Err(e) => return Err(failure(format!("write task failed: {e}"))),
        }

        metrics::counter!(m::ARTIFACTS_WRITTEN_TOTAL, m::LABEL_FORMAT => format.name())
            .increment(1);
        debug!(path = %path.display(), bytes = size, format = %format, "artifact written");
        info!(
            container = %report.container().name(),
            path = %path.display(),
            "report generated for container"
        );

        Ok(path)
    }
}
