//! 에러 타입 -- 워크스페이스 공통 에러 정의

/// dockaudit 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 컨테이너 런타임(Docker 엔진)에 연결할 수 없음
    #[error("container runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    /// 컨테이너 내부 프로브 실행 실패
    #[error("probe failed: {0}")]
    Probe(String),

    /// 리포트 아티팩트 생성 실패
    #[error("render failed for container '{container}': {reason}")]
    Render { container: String, reason: String },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_into_audit_error() {
        let err: AuditError = ConfigError::FileNotFound {
            path: "dockaudit.toml".to_owned(),
        }
        .into();
        assert!(matches!(err, AuditError::Config(_)));
        assert!(err.to_string().contains("dockaudit.toml"));
    }

    #[test]
    fn invalid_value_display_names_field() {
        let err = ConfigError::InvalidValue {
            field: "runtime.exec_timeout_secs".to_owned(),
            reason: "must be 1-600".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("runtime.exec_timeout_secs"));
        assert!(msg.contains("must be 1-600"));
    }

    #[test]
    fn render_error_display() {
        let err = AuditError::Render {
            container: "api".to_owned(),
            reason: "permission denied".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("api"));
        assert!(msg.contains("permission denied"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: AuditError = io_err.into();
        assert!(matches!(err, AuditError::Io(_)));
    }
}
