//! 설정 관리 -- dockaudit.toml 파싱 및 런타임 설정
//!
//! [`AuditConfig`]는 모든 컴포넌트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`DOCKAUDIT_RUNTIME_EXEC_TIMEOUT_SECS=10` 형식)
//! 3. 설정 파일 (`dockaudit.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), dockaudit_core::error::AuditError> {
//! use dockaudit_core::config::AuditConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = AuditConfig::load("dockaudit.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = AuditConfig::parse("[runtime]\nexec_timeout_secs = 10")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AuditError, ConfigError};

/// 기본 비밀 키워드 (대소문자 무시)
pub const DEFAULT_SECRET_KEYWORDS: &[&str] = &["password", "user"];

/// 기본 설정 파일 확장자
pub const DEFAULT_CONFIG_EXTENSIONS: &[&str] = &[".conf", ".yml", ".json"];

/// 기본 데이터베이스 파일 확장자
pub const DEFAULT_DATABASE_EXTENSIONS: &[&str] = &[".db", ".sqlite", ".mdb"];

/// 대용량 파일 기준 (100 MiB, 초과해야 매칭)
pub const DEFAULT_LARGE_FILE_THRESHOLD_BYTES: u64 = 100 * 1024 * 1024;

/// 지원하는 리포트 형식 이름
pub const REPORT_FORMATS: &[&str] = &["text", "document"];

const MAX_EXEC_TIMEOUT_SECS: u64 = 600;
const MIN_PAGE_LINES: usize = 10;
const MIN_LINE_WIDTH: usize = 20;

/// dockaudit 통합 설정
///
/// `dockaudit.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 컨테이너 런타임 연결 설정
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// 프로브 설정
    #[serde(default)]
    pub probes: ProbeConfig,
    /// 리포트 설정
    #[serde(default)]
    pub report: ReportConfig,
    /// 오케스트레이터 설정
    #[serde(default)]
    pub audit: AuditRunConfig,
}

impl AuditConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 기본값에 환경변수 오버라이드만 적용한 설정을 생성합니다.
    ///
    /// 설정 파일이 없을 때 CLI가 사용합니다.
    pub fn from_env() -> Result<Self, AuditError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AuditError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                AuditError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, AuditError> {
        toml::from_str(toml_str).map_err(|e| {
            AuditError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `DOCKAUDIT_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "DOCKAUDIT_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "DOCKAUDIT_GENERAL_LOG_FORMAT");

        // Runtime
        override_string(
            &mut self.runtime.docker_socket,
            "DOCKAUDIT_RUNTIME_DOCKER_SOCKET",
        );
        override_u64(
            &mut self.runtime.connect_timeout_secs,
            "DOCKAUDIT_RUNTIME_CONNECT_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.runtime.exec_timeout_secs,
            "DOCKAUDIT_RUNTIME_EXEC_TIMEOUT_SECS",
        );

        // Probes
        override_csv(
            &mut self.probes.secret_keywords,
            "DOCKAUDIT_PROBES_SECRET_KEYWORDS",
        );
        override_csv(
            &mut self.probes.config_extensions,
            "DOCKAUDIT_PROBES_CONFIG_EXTENSIONS",
        );
        override_csv(
            &mut self.probes.database_extensions,
            "DOCKAUDIT_PROBES_DATABASE_EXTENSIONS",
        );
        override_u64(
            &mut self.probes.large_file_threshold_bytes,
            "DOCKAUDIT_PROBES_LARGE_FILE_THRESHOLD_BYTES",
        );
        override_string(&mut self.probes.search_root, "DOCKAUDIT_PROBES_SEARCH_ROOT");
        override_usize(&mut self.probes.max_depth, "DOCKAUDIT_PROBES_MAX_DEPTH");
        override_csv(
            &mut self.probes.excluded_paths,
            "DOCKAUDIT_PROBES_EXCLUDED_PATHS",
        );
        override_usize(
            &mut self.probes.max_output_bytes,
            "DOCKAUDIT_PROBES_MAX_OUTPUT_BYTES",
        );

        // Report
        override_string(&mut self.report.output_dir, "DOCKAUDIT_REPORT_OUTPUT_DIR");
        override_csv(&mut self.report.formats, "DOCKAUDIT_REPORT_FORMATS");
        override_usize(&mut self.report.page_lines, "DOCKAUDIT_REPORT_PAGE_LINES");
        override_usize(&mut self.report.line_width, "DOCKAUDIT_REPORT_LINE_WIDTH");
        override_bool(
            &mut self.report.fail_on_container_failure,
            "DOCKAUDIT_REPORT_FAIL_ON_CONTAINER_FAILURE",
        );

        // Audit
        override_usize(&mut self.audit.concurrency, "DOCKAUDIT_AUDIT_CONCURRENCY");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), AuditError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.runtime.exec_timeout_secs == 0
            || self.runtime.exec_timeout_secs > MAX_EXEC_TIMEOUT_SECS
        {
            return Err(invalid(
                "runtime.exec_timeout_secs",
                format!("must be 1-{MAX_EXEC_TIMEOUT_SECS}"),
            ));
        }

        if self.runtime.connect_timeout_secs == 0 {
            return Err(invalid(
                "runtime.connect_timeout_secs",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.probes.secret_keywords.is_empty()
            || self.probes.secret_keywords.iter().any(|k| k.is_empty())
        {
            return Err(invalid(
                "probes.secret_keywords",
                "must contain at least one non-empty keyword".to_owned(),
            ));
        }

        validate_extensions("probes.config_extensions", &self.probes.config_extensions)?;
        validate_extensions(
            "probes.database_extensions",
            &self.probes.database_extensions,
        )?;

        if !self.probes.search_root.starts_with('/') {
            return Err(invalid(
                "probes.search_root",
                "must be an absolute path".to_owned(),
            ));
        }

        if self.probes.max_output_bytes == 0 {
            return Err(invalid(
                "probes.max_output_bytes",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.report.formats.is_empty() {
            return Err(invalid(
                "report.formats",
                "at least one format is required".to_owned(),
            ));
        }
        if let Some(unknown) = self
            .report
            .formats
            .iter()
            .find(|f| !REPORT_FORMATS.contains(&f.as_str()))
        {
            return Err(invalid(
                "report.formats",
                format!(
                    "unknown format '{unknown}', expected one of: {}",
                    REPORT_FORMATS.join(", ")
                ),
            ));
        }

        if self.report.page_lines < MIN_PAGE_LINES {
            return Err(invalid(
                "report.page_lines",
                format!("must be at least {MIN_PAGE_LINES}"),
            ));
        }

        if self.report.line_width < MIN_LINE_WIDTH {
            return Err(invalid(
                "report.line_width",
                format!("must be at least {MIN_LINE_WIDTH}"),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> AuditError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

fn validate_extensions(field: &str, extensions: &[String]) -> Result<(), AuditError> {
    if extensions.is_empty() {
        return Err(invalid(field, "must contain at least one extension".to_owned()));
    }
    for ext in extensions {
        if ext.len() < 2 || !ext.starts_with('.') {
            return Err(invalid(
                field,
                format!("extension '{ext}' must start with '.'"),
            ));
        }
        if ext.contains(['/', '*', '?', '[', '\'']) {
            return Err(invalid(
                field,
                format!("extension '{ext}' contains a forbidden character"),
            ));
        }
    }
    Ok(())
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 컨테이너 런타임 연결 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Docker 소켓 경로 (비어 있으면 플랫폼 기본값)
    pub docker_socket: String,
    /// 연결 타임아웃 (초)
    pub connect_timeout_secs: u64,
    /// 프로브 1회 실행 제한 시간 (초)
    pub exec_timeout_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            docker_socket: String::new(),
            connect_timeout_secs: 120,
            exec_timeout_secs: 30,
        }
    }
}

/// 프로브 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// 환경변수 키/값에서 찾을 키워드 (대소문자 무시)
    pub secret_keywords: Vec<String>,
    /// 설정 파일 확장자
    pub config_extensions: Vec<String>,
    /// 데이터베이스 파일 확장자
    pub database_extensions: Vec<String>,
    /// 대용량 파일 기준 (바이트, 초과 시 매칭)
    pub large_file_threshold_bytes: u64,
    /// 컨테이너 내부 탐색 시작 경로
    pub search_root: String,
    /// 최대 탐색 깊이 (0 = 제한 없음)
    pub max_depth: usize,
    /// 탐색에서 제외할 경로
    pub excluded_paths: Vec<String>,
    /// 프로브당 수집할 최대 stdout 크기 (바이트)
    pub max_output_bytes: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            secret_keywords: to_owned_vec(DEFAULT_SECRET_KEYWORDS),
            config_extensions: to_owned_vec(DEFAULT_CONFIG_EXTENSIONS),
            database_extensions: to_owned_vec(DEFAULT_DATABASE_EXTENSIONS),
            large_file_threshold_bytes: DEFAULT_LARGE_FILE_THRESHOLD_BYTES,
            search_root: "/".to_owned(),
            max_depth: 0,
            excluded_paths: to_owned_vec(&["/proc", "/sys", "/dev"]),
            max_output_bytes: 8 * 1024 * 1024, // 8MB
        }
    }
}

/// 리포트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// 아티팩트 출력 디렉토리
    pub output_dir: String,
    /// 생성할 리포트 형식 (text, document)
    pub formats: Vec<String>,
    /// 문서 한 페이지의 줄 수
    pub page_lines: usize,
    /// 문서 한 줄의 최대 문자 수 (초과 시 줄바꿈)
    pub line_width: usize,
    /// 컨테이너 실패가 있으면 CLI를 비정상 종료 코드로 끝낼지 여부
    pub fail_on_container_failure: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: "./docker_container_reports".to_owned(),
            formats: to_owned_vec(REPORT_FORMATS),
            page_lines: 60,
            line_width: 100,
            fail_on_container_failure: false,
        }
    }
}

/// 오케스트레이터 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditRunConfig {
    /// 동시에 감사할 최대 컨테이너 수 (0 = 가용 병렬성)
    pub concurrency: usize,
}

fn to_owned_vec(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
