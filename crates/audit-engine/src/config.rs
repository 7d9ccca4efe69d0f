//! 감사 엔진 설정
//!
//! [`AuditEngineConfig`]는 core의 [`AuditConfig`](dockaudit_core::config::AuditConfig)를
//! 기반으로 엔진 전용 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use dockaudit_core::config::AuditConfig;
//! use dockaudit_engine::config::AuditEngineConfig;
//!
//! let core_config = AuditConfig::default();
//! let config = AuditEngineConfig::from_core(&core_config)?;
//! ```

use std::time::Duration;

use dockaudit_core::config::{AuditConfig, ProbeConfig};

use crate::error::AuditEngineError;
use crate::render::ReportFormat;

/// 설정 상한값 상수
const MAX_EXEC_TIMEOUT_SECS: u64 = 600;
const MAX_CONCURRENCY: usize = 256;
const MIN_PAGE_LINES: usize = 10;
const MIN_LINE_WIDTH: usize = 20;

/// 감사 엔진 설정
#[derive(Debug, Clone)]
pub struct AuditEngineConfig {
    /// 프로브 1회 실행 제한 시간 (초)
    pub exec_timeout_secs: u64,
    /// 동시에 감사할 최대 컨테이너 수 (0 = 가용 병렬성)
    pub concurrency: usize,
    /// 프로브 규칙
    pub probes: ProbeConfig,
    /// 컨테이너마다 생성할 아티팩트 형식
    pub formats: Vec<ReportFormat>,
    /// 문서 한 페이지의 줄 수
    pub page_lines: usize,
    /// 문서 한 줄의 최대 문자 수
    pub line_width: usize,
}

impl Default for AuditEngineConfig {
    fn default() -> Self {
        Self {
            exec_timeout_secs: 30,
            concurrency: 0,
            probes: ProbeConfig::default(),
            formats: vec![ReportFormat::Text, ReportFormat::Document],
            page_lines: 60,
            line_width: 100,
        }
    }
}

impl AuditEngineConfig {
    /// core의 `AuditConfig`에서 엔진 설정을 생성합니다.
    pub fn from_core(core: &AuditConfig) -> Result<Self, AuditEngineError> {
        let formats = core
            .report
            .formats
            .iter()
            .map(|name| {
                ReportFormat::from_name(name).ok_or_else(|| AuditEngineError::Config {
                    field: "report.formats".to_owned(),
                    reason: format!("unknown format '{name}'"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let config = Self {
            exec_timeout_secs: core.runtime.exec_timeout_secs,
            concurrency: core.audit.concurrency,
            probes: core.probes.clone(),
            formats,
            page_lines: core.report.page_lines,
            line_width: core.report.line_width,
        };
        config.validate()?;
        Ok(config)
    }

    /// 프로브 실행 제한 시간
    pub fn exec_timeout(&self) -> Duration {
        Duration::from_secs(self.exec_timeout_secs)
    }

    /// 실제 적용될 동시성 한도를 반환합니다.
    ///
    /// `concurrency`가 0이면 가용 병렬성을 사용합니다.
    pub fn effective_concurrency(&self) -> usize {
        if self.concurrency > 0 {
            return self.concurrency;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), AuditEngineError> {
        if self.exec_timeout_secs == 0 || self.exec_timeout_secs > MAX_EXEC_TIMEOUT_SECS {
            return Err(config_error(
                "exec_timeout_secs",
                format!("must be 1-{MAX_EXEC_TIMEOUT_SECS}"),
            ));
        }

        if self.concurrency > MAX_CONCURRENCY {
            return Err(config_error(
                "concurrency",
                format!("must be 0-{MAX_CONCURRENCY}"),
            ));
        }

        if self.formats.is_empty() {
            return Err(config_error(
                "formats",
                "at least one format is required".to_owned(),
            ));
        }

        if self.page_lines < MIN_PAGE_LINES {
            return Err(config_error(
                "page_lines",
                format!("must be at least {MIN_PAGE_LINES}"),
            ));
        }

        if self.line_width < MIN_LINE_WIDTH {
            return Err(config_error(
                "line_width",
                format!("must be at least {MIN_LINE_WIDTH}"),
            ));
        }

        if self.probes.secret_keywords.iter().all(|k| k.is_empty()) {
            return Err(config_error(
                "probes.secret_keywords",
                "must contain at least one non-empty keyword".to_owned(),
            ));
        }

        if self.probes.config_extensions.is_empty() || self.probes.database_extensions.is_empty()
        {
            return Err(config_error(
                "probes.extensions",
                "extension lists must not be empty".to_owned(),
            ));
        }

        if !self.probes.search_root.starts_with('/') {
            return Err(config_error(
                "probes.search_root",
                "must be an absolute path".to_owned(),
            ));
        }

        Ok(())
    }
}

fn config_error(field: &str, reason: String) -> AuditEngineError {
    AuditEngineError::Config {
        field: field.to_owned(),
        reason,
    }
}

/// 감사 엔진 설정 빌더
#[derive(Default)]
pub struct AuditEngineConfigBuilder {
    config: AuditEngineConfig,
}

impl AuditEngineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 프로브 제한 시간(초)을 설정합니다.
    pub fn exec_timeout_secs(mut self, secs: u64) -> Self {
        self.config.exec_timeout_secs = secs;
        self
    }

    /// 동시 감사 컨테이너 수를 설정합니다.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// 프로브 규칙 전체를 교체합니다.
    pub fn probes(mut self, probes: ProbeConfig) -> Self {
        self.config.probes = probes;
        self
    }

    /// 비밀 키워드 목록을 설정합니다.
    pub fn secret_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.probes.secret_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// 대용량 파일 기준(바이트)을 설정합니다.
    pub fn large_file_threshold_bytes(mut self, bytes: u64) -> Self {
        self.config.probes.large_file_threshold_bytes = bytes;
        self
    }

    /// 생성할 아티팩트 형식을 설정합니다.
    pub fn formats(mut self, formats: Vec<ReportFormat>) -> Self {
        self.config.formats = formats;
        self
    }

    /// 문서 한 페이지의 줄 수를 설정합니다.
    pub fn page_lines(mut self, lines: usize) -> Self {
        self.config.page_lines = lines;
        self
    }

    /// 문서 한 줄의 최대 문자 수를 설정합니다.
    pub fn line_width(mut self, width: usize) -> Self {
        self.config.line_width = width;
        self
    }

    /// 설정을 검증하고 `AuditEngineConfig`를 생성합니다.
    pub fn build(self) -> Result<AuditEngineConfig, AuditEngineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
