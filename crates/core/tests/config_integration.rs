//! 설정 로딩 통합 테스트
//!
//! 실제 TOML 파일과 환경변수를 사용하여 로딩 우선순위를 검증합니다.

use std::fs;

use dockaudit_core::config::AuditConfig;
use dockaudit_core::error::{AuditError, ConfigError};
use tempfile::TempDir;

// =============================================================================
// 파일 로딩 테스트
// =============================================================================

#[tokio::test]
async fn load_full_config_file() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("dockaudit.toml");
    fs::write(
        &path,
        r#"
[general]
log_level = "debug"
log_format = "json"

[runtime]
docker_socket = "/run/docker.sock"
exec_timeout_secs = 15

[probes]
secret_keywords = ["password", "user", "token"]
config_extensions = [".conf", ".yaml"]
database_extensions = [".db"]
large_file_threshold_bytes = 1048576
search_root = "/srv"
max_depth = 8
excluded_paths = ["/proc"]

[report]
output_dir = "/tmp/reports"
formats = ["text"]
page_lines = 40
fail_on_container_failure = true

[audit]
concurrency = 4
"#,
    )
    .expect("should write config");

    let config = AuditConfig::load(&path).await.expect("should load");
    assert_eq!(config.general.log_format, "json");
    assert_eq!(config.runtime.docker_socket, "/run/docker.sock");
    assert_eq!(config.runtime.exec_timeout_secs, 15);
    assert_eq!(config.probes.secret_keywords.len(), 3);
    assert_eq!(config.probes.database_extensions, vec![".db"]);
    assert_eq!(config.probes.max_depth, 8);
    assert_eq!(config.report.formats, vec!["text"]);
    assert!(config.report.fail_on_container_failure);
    assert_eq!(config.audit.concurrency, 4);
    // 지정하지 않은 필드는 기본값
    assert_eq!(config.report.line_width, 100);
}

#[tokio::test]
async fn load_empty_file_uses_defaults() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("empty.toml");
    fs::write(&path, "").expect("should write file");

    let config = AuditConfig::load(&path).await.expect("empty file is valid");
    assert_eq!(config.runtime.exec_timeout_secs, 30);
}

#[tokio::test]
async fn load_rejects_invalid_values() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[report]\nformats = [\"html\"]\n").expect("should write file");

    let err = AuditConfig::load(&path).await.unwrap_err();
    assert!(matches!(
        err,
        AuditError::Config(ConfigError::InvalidValue { .. })
    ));
}

#[tokio::test]
async fn load_malformed_file_fails_to_parse() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[runtime\nexec_timeout_secs = 1").expect("should write file");

    let err = AuditConfig::load(&path).await.unwrap_err();
    assert!(matches!(
        err,
        AuditError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[tokio::test]
async fn load_missing_file_reports_path() {
    let err = AuditConfig::load("/nonexistent/dockaudit.toml")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("/nonexistent/dockaudit.toml"));
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

fn with_env<T>(key: &str, value: &str, f: impl FnOnce() -> T) -> T {
    let original = std::env::var(key).ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe { std::env::set_var(key, value) };
    let result = f();
    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var(key, val),
            None => std::env::remove_var(key),
        }
    }
    result
}

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let config = with_env("DOCKAUDIT_RUNTIME_EXEC_TIMEOUT_SECS", "7", || {
        let mut config =
            AuditConfig::parse("[runtime]\nexec_timeout_secs = 20\n").expect("should parse");
        config.apply_env_overrides();
        config
    });
    assert_eq!(config.runtime.exec_timeout_secs, 7);
}

#[test]
#[serial_test::serial]
fn env_override_csv_for_keywords() {
    let config = with_env("DOCKAUDIT_PROBES_SECRET_KEYWORDS", "secret, api_key", || {
        let mut config = AuditConfig::parse("").expect("should parse");
        config.apply_env_overrides();
        config
    });
    assert_eq!(config.probes.secret_keywords, vec!["secret", "api_key"]);
}

#[test]
#[serial_test::serial]
fn env_override_invalid_number_is_ignored() {
    let config = with_env("DOCKAUDIT_AUDIT_CONCURRENCY", "many", || {
        let mut config = AuditConfig::parse("").expect("should parse");
        config.apply_env_overrides();
        config
    });
    assert_eq!(config.audit.concurrency, 0);
}

#[test]
#[serial_test::serial]
fn from_env_validates_overrides() {
    let result = with_env("DOCKAUDIT_GENERAL_LOG_FORMAT", "xml", AuditConfig::from_env);
    assert!(result.is_err(), "invalid log format must fail validation");
}
