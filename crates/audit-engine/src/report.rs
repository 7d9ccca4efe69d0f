//! 발견 항목 집계 -- 프로브 결과를 불변 [`Report`] 값으로 접습니다.
//!
//! `Report.results`는 항상 `ProbeKind`마다 정확히 하나의 항목을 가집니다.
//! 이 불변식은 [`aggregate`]에서 강제되며, 누락된 종류는 빈 결과로 채워집니다.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::warn;

use dockaudit_core::types::{ContainerDescriptor, ProbeKind, ProbeResult};

/// 컨테이너 하나의 감사 리포트
///
/// 생성 후에는 변경되지 않습니다. 렌더러는 읽기만 합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    container: ContainerDescriptor,
    results: BTreeMap<ProbeKind, ProbeResult>,
    generated_at: DateTime<Utc>,
}

impl Report {
    /// 감사 대상 컨테이너
    pub fn container(&self) -> &ContainerDescriptor {
        &self.container
    }

    /// 집계 시각
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// 집계 시각 (RFC 3339, 초 단위, UTC)
    pub fn generated_at_rfc3339(&self) -> String {
        self.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// 해당 종류의 프로브 결과
    pub fn result(&self, kind: ProbeKind) -> Option<&ProbeResult> {
        self.results.get(&kind)
    }

    /// 해당 종류의 발견 항목 (없으면 빈 슬라이스)
    pub fn lines(&self, kind: ProbeKind) -> &[String] {
        self.results
            .get(&kind)
            .map(ProbeResult::lines)
            .unwrap_or_default()
    }

    /// 고정된 섹션 순서로 프로브 결과를 순회합니다.
    pub fn results(&self) -> impl Iterator<Item = &ProbeResult> {
        self.results.values()
    }

    /// 결과 항목 수 (항상 `ProbeKind::ALL.len()`)
    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    /// 모든 섹션의 발견 항목 수 합계
    pub fn total_findings(&self) -> usize {
        self.results.values().map(|r| r.lines().len()).sum()
    }
}

/// 프로브 결과로 리포트를 생성하고 현재 시각을 기록합니다.
pub fn aggregate(container: &ContainerDescriptor, results: Vec<ProbeResult>) -> Report {
    aggregate_at(container, results, Utc::now())
}

/// 지정한 시각으로 리포트를 생성합니다.
///
/// 같은 입력에는 같은 `Report`를 반환합니다. 같은 종류가 여러 번 들어오면
/// 처음 것을 유지합니다.
pub fn aggregate_at(
    container: &ContainerDescriptor,
    results: Vec<ProbeResult>,
    generated_at: DateTime<Utc>,
) -> Report {
    let mut by_kind = BTreeMap::new();

    for result in results {
        let kind = result.kind();
        if by_kind.contains_key(&kind) {
            warn!(
                container = %container.name(),
                probe = %kind,
                "duplicate probe result ignored"
            );
            continue;
        }
        by_kind.insert(kind, result);
    }

    for kind in ProbeKind::ALL {
        by_kind
            .entry(kind)
            .or_insert_with(|| ProbeResult::empty(kind));
    }

    Report {
        container: container.clone(),
        results: by_kind,
        generated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn container() -> ContainerDescriptor {
        ContainerDescriptor::new("abc123", "api", "python:3.12").unwrap()
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn aggregate_fills_missing_kinds() {
        let report = aggregate(&container(), Vec::new());
        assert_eq!(report.result_count(), 4);
        for kind in ProbeKind::ALL {
            assert!(report.result(kind).unwrap().is_empty());
        }
    }

    #[test]
    fn aggregate_keeps_provided_results() {
        let results = vec![
            ProbeResult::new(ProbeKind::ConfigFiles, vec!["/app/config.yml".to_owned()]),
            ProbeResult::new(ProbeKind::EnvSecrets, vec!["DB_PASSWORD=x".to_owned()]),
        ];
        let report = aggregate(&container(), results);
        assert_eq!(report.result_count(), 4);
        assert_eq!(report.lines(ProbeKind::ConfigFiles), ["/app/config.yml"]);
        assert_eq!(report.lines(ProbeKind::EnvSecrets), ["DB_PASSWORD=x"]);
        assert!(report.lines(ProbeKind::LargeFiles).is_empty());
        assert_eq!(report.total_findings(), 2);
    }

    #[test]
    fn aggregate_keeps_first_duplicate() {
        let results = vec![
            ProbeResult::new(ProbeKind::LargeFiles, vec!["first".to_owned()]),
            ProbeResult::new(ProbeKind::LargeFiles, vec!["second".to_owned()]),
        ];
        let report = aggregate(&container(), results);
        assert_eq!(report.lines(ProbeKind::LargeFiles), ["first"]);
        assert_eq!(report.result_count(), 4);
    }

    #[test]
    fn results_iterate_in_section_order() {
        let results = vec![
            ProbeResult::empty(ProbeKind::DatabaseFiles),
            ProbeResult::empty(ProbeKind::EnvSecrets),
        ];
        let report = aggregate(&container(), results);
        let kinds: Vec<_> = report.results().map(ProbeResult::kind).collect();
        assert_eq!(kinds, ProbeKind::ALL.to_vec());
    }

    #[test]
    fn aggregate_at_is_deterministic() {
        let results = || vec![ProbeResult::new(ProbeKind::EnvSecrets, vec!["USER=a".to_owned()])];
        let a = aggregate_at(&container(), results(), fixed_time());
        let b = aggregate_at(&container(), results(), fixed_time());
        assert_eq!(a, b);
        assert_eq!(a.generated_at_rfc3339(), "2026-03-01T12:00:00Z");
    }

    #[test]
    fn report_serializes_to_json() {
        let report = aggregate_at(&container(), Vec::new(), fixed_time());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["container"]["name"], "api");
        assert!(json["results"]["env_secrets"]["lines"].as_array().unwrap().is_empty());
    }
}
