//! 메트릭 상수 및 설명 등록
//!
//! 감사 파이프라인이 기록하는 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! recorder가 설치되지 않은 경우 `metrics` 매크로 호출은 아무 동작도 하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `dockaudit_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)

use metrics::{describe_counter, describe_histogram};

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 프로브 종류 레이블 키 (env_secrets, config_files, large_files, database_files)
pub const LABEL_PROBE: &str = "probe";

/// 실패 사유 레이블 키 (timeout, denied)
pub const LABEL_REASON: &str = "reason";

/// 아티팩트 형식 레이블 키 (text, document)
pub const LABEL_FORMAT: &str = "format";

// ─── 감사 메트릭 ────────────────────────────────────────────────────

/// 감사가 완료된 컨테이너 수 (counter)
pub const CONTAINERS_AUDITED_TOTAL: &str = "dockaudit_containers_audited_total";

/// 프로브 soft failure 수 (counter, label: probe, reason)
pub const PROBE_FAILURES_TOTAL: &str = "dockaudit_probe_failures_total";

/// 프로브 실행 시간 (histogram, label: probe)
pub const PROBE_DURATION_SECONDS: &str = "dockaudit_probe_duration_seconds";

/// 기록된 아티팩트 수 (counter, label: format)
pub const ARTIFACTS_WRITTEN_TOTAL: &str = "dockaudit_artifacts_written_total";

/// 렌더링 실패 수 (counter)
pub const RENDER_FAILURES_TOTAL: &str = "dockaudit_render_failures_total";

/// 모든 메트릭의 설명을 등록합니다.
///
/// recorder 설치 직후 한 번 호출합니다. recorder가 없어도 안전합니다.
pub fn describe_all() {
    describe_counter!(
        CONTAINERS_AUDITED_TOTAL,
        "Total number of containers whose audit pipeline completed"
    );
    describe_counter!(
        PROBE_FAILURES_TOTAL,
        "Total number of probes that degraded to an empty result"
    );
    describe_histogram!(
        PROBE_DURATION_SECONDS,
        "Time spent executing a single probe inside a container in seconds"
    );
    describe_counter!(
        ARTIFACTS_WRITTEN_TOTAL,
        "Total number of report artifacts written to the output directory"
    );
    describe_counter!(
        RENDER_FAILURES_TOTAL,
        "Total number of containers whose report could not be written"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_METRIC_NAMES: &[&str] = &[
        CONTAINERS_AUDITED_TOTAL,
        PROBE_FAILURES_TOTAL,
        PROBE_DURATION_SECONDS,
        ARTIFACTS_WRITTEN_TOTAL,
        RENDER_FAILURES_TOTAL,
    ];

    #[test]
    fn all_metrics_start_with_prefix() {
        for name in ALL_METRIC_NAMES {
            assert!(
                name.starts_with("dockaudit_"),
                "Metric '{}' does not start with 'dockaudit_' prefix",
                name
            );
        }
    }

    #[test]
    fn describe_all_does_not_panic() {
        describe_all();
    }

    #[test]
    fn label_keys_are_lowercase() {
        for label in [LABEL_PROBE, LABEL_REASON, LABEL_FORMAT] {
            assert_eq!(label.to_lowercase(), label);
        }
    }
}
