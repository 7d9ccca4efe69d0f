//! 도메인 타입 -- 감사 파이프라인 전역에서 사용되는 공통 타입
//!
//! 런타임 클라이언트가 만든 [`ContainerDescriptor`]가 프로브 실행기로 전달되고,
//! 각 프로브는 [`ProbeResult`] 하나를 생성합니다.

use std::fmt;

use serde::Serialize;

/// 감사 대상 컨테이너 식별 정보
///
/// 열거 시점에 생성되며 이후 변경되지 않습니다.
/// `id`는 항상 비어 있지 않고, `name`이 비어 있으면 `id`로 대체됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ContainerDescriptor {
    id: String,
    name: String,
    image: String,
}

impl ContainerDescriptor {
    /// 새 디스크립터를 생성합니다.
    ///
    /// `id`가 비어 있으면 `None`을 반환합니다. 런타임이 빈 이름을 보고하면
    /// (앞의 `/`를 제거한 뒤) `id`를 이름으로 사용합니다.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        image: impl Into<String>,
    ) -> Option<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return None;
        }
        let name = name.into();
        let name = name.trim_start_matches('/').trim();
        let name = if name.is_empty() {
            id.clone()
        } else {
            name.to_owned()
        };
        Some(Self {
            id,
            name,
            image: image.into(),
        })
    }

    /// 런타임이 부여한 컨테이너 ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 컨테이너 이름
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 컨테이너 이미지 참조
    pub fn image(&self) -> &str {
        &self.image
    }

    /// 로그 출력용 축약 ID (앞 12자)
    pub fn short_id(&self) -> &str {
        self.id.get(..12).unwrap_or(&self.id)
    }
}

impl fmt::Display for ContainerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.short_id())
    }
}

/// 프로브 종류
///
/// 닫힌 집합이며 런타임에 확장되지 않습니다. 선언 순서가 리포트의 섹션 순서입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    /// 프로세스 환경변수 중 자격 증명으로 보이는 항목
    EnvSecrets,
    /// 설정 파일 (.conf, .yml, .json)
    ConfigFiles,
    /// 임계값보다 큰 파일
    LargeFiles,
    /// 임베디드 데이터베이스 파일 (.db, .sqlite, .mdb)
    DatabaseFiles,
}

impl ProbeKind {
    /// 모든 프로브 종류 (리포트 섹션 순서)
    pub const ALL: [ProbeKind; 4] = [
        ProbeKind::EnvSecrets,
        ProbeKind::ConfigFiles,
        ProbeKind::LargeFiles,
        ProbeKind::DatabaseFiles,
    ];

    /// 리포트 섹션 제목
    pub fn title(&self) -> &'static str {
        match self {
            Self::EnvSecrets => "Environment",
            Self::ConfigFiles => "Config Files",
            Self::LargeFiles => "Large Files",
            Self::DatabaseFiles => "Database Files",
        }
    }

    /// 로그 필드와 메트릭 레이블에 쓰이는 고정 이름
    pub fn label(&self) -> &'static str {
        match self {
            Self::EnvSecrets => "env_secrets",
            Self::ConfigFiles => "config_files",
            Self::LargeFiles => "large_files",
            Self::DatabaseFiles => "database_files",
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 프로브 한 번의 실행 결과
///
/// `lines`가 비어 있으면 "발견 없음"을 뜻합니다. 실패한 프로브도 빈 결과로 표현됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    kind: ProbeKind,
    lines: Vec<String>,
}

impl ProbeResult {
    /// 발견 항목으로 결과를 생성합니다.
    pub fn new(kind: ProbeKind, lines: Vec<String>) -> Self {
        Self { kind, lines }
    }

    /// 빈 결과를 생성합니다.
    pub fn empty(kind: ProbeKind) -> Self {
        Self {
            kind,
            lines: Vec::new(),
        }
    }

    pub fn kind(&self) -> ProbeKind {
        self.kind
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_rejects_empty_id() {
        assert!(ContainerDescriptor::new("", "web", "nginx").is_none());
        assert!(ContainerDescriptor::new("   ", "web", "nginx").is_none());
    }

    #[test]
    fn descriptor_name_defaults_to_id() {
        let d = ContainerDescriptor::new("abc123", "", "nginx").unwrap();
        assert_eq!(d.name(), "abc123");

        let d = ContainerDescriptor::new("abc123", "/", "nginx").unwrap();
        assert_eq!(d.name(), "abc123");
    }

    #[test]
    fn descriptor_strips_leading_slash() {
        let d = ContainerDescriptor::new("abc123", "/web-server", "nginx:latest").unwrap();
        assert_eq!(d.name(), "web-server");
        assert_eq!(d.image(), "nginx:latest");
    }

    #[test]
    fn descriptor_short_id() {
        let d = ContainerDescriptor::new("abc123def4567890", "web", "nginx").unwrap();
        assert_eq!(d.short_id(), "abc123def456");

        let d = ContainerDescriptor::new("abc", "web", "nginx").unwrap();
        assert_eq!(d.short_id(), "abc");
    }

    #[test]
    fn descriptor_display() {
        let d = ContainerDescriptor::new("abc123def4567890", "web", "nginx").unwrap();
        assert_eq!(d.to_string(), "web (abc123def456)");
    }

    #[test]
    fn probe_kind_order_matches_section_order() {
        let mut kinds = ProbeKind::ALL.to_vec();
        kinds.reverse();
        kinds.sort();
        assert_eq!(kinds, ProbeKind::ALL.to_vec());
        let titles: Vec<_> = ProbeKind::ALL.iter().map(|k| k.title()).collect();
        assert_eq!(
            titles,
            vec!["Environment", "Config Files", "Large Files", "Database Files"]
        );
    }

    #[test]
    fn probe_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ProbeKind::DatabaseFiles).unwrap();
        assert_eq!(json, "\"database_files\"");
        assert_eq!(ProbeKind::EnvSecrets.to_string(), "env_secrets");
    }

    #[test]
    fn probe_result_empty() {
        let r = ProbeResult::empty(ProbeKind::LargeFiles);
        assert!(r.is_empty());
        assert_eq!(r.kind(), ProbeKind::LargeFiles);
        assert!(r.lines().is_empty());
    }

    #[test]
    fn probe_result_keeps_line_order() {
        let r = ProbeResult::new(
            ProbeKind::ConfigFiles,
            vec!["/b.json".to_owned(), "/a.conf".to_owned()],
        );
        assert_eq!(r.lines(), ["/b.json", "/a.conf"]);
    }
}
