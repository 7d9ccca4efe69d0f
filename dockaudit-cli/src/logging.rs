//! 로깅 초기화
//!
//! tracing-subscriber로 JSON 또는 pretty 형식의 구조화 로그를 stderr에 출력합니다.
//! stdout은 명령 출력(텍스트/JSON)에 사용되므로 로그와 섞이지 않습니다.

use dockaudit_core::config::GeneralConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 설정에 따라 tracing subscriber를 초기화합니다.
///
/// `RUST_LOG` 환경변수가 있으면 우선 적용되고, 없으면 `--log-level` 인자,
/// 그 다음 `general.log_level` 순으로 사용합니다.
pub fn init_tracing(general: &GeneralConfig, level_override: Option<&str>) -> anyhow::Result<()> {
    let level = level_override.unwrap_or(&general.log_level);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match general.log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_current_span(true),
                )
                .try_init()
                .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr)
                        .with_target(true),
                )
                .try_init()
                .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;
        }
    }

    Ok(())
}
