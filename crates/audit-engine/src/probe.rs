//! 프로브 실행기 -- 컨테이너 하나에 대해 네 가지 프로브를 실행합니다.
//!
//! 각 프로브는 컨테이너 안에서 읽기 전용 POSIX 명령(`printenv`, `find`, `du`)을
//! 실행하고, 출력의 해석과 필터링은 Rust 쪽에서 수행합니다.
//!
//! # 실패 격리
//!
//! 프로브 하나의 실패(시간 초과, 실행 거부)는 나머지 세 프로브나 리포트 생성을
//! 막지 않습니다. 실패한 프로브는 빈 [`ProbeResult`]로 대체되고
//! [`SoftFailure`]로 기록됩니다.
//!
//! ```text
//! ContainerDescriptor
//!        │
//!        ├── EnvSecrets    : printenv            → keyword filter
//!        ├── ConfigFiles   : find -name ...       → extension filter
//!        ├── LargeFiles    : find -size +Nc du -k -l → human size
//!        └── DatabaseFiles : find -name ... du -k -l → extension filter + human size
//!        │
//!        ▼
//!     ProbeRun { results (4), soft_failures }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use dockaudit_core::config::ProbeConfig;
use dockaudit_core::metrics as m;
use dockaudit_core::types::{ContainerDescriptor, ProbeKind, ProbeResult};

use crate::error::AuditEngineError;
use crate::runtime::RuntimeClient;

/// 프로브 하나가 빈 결과로 대체된 기록
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftFailure {
    /// 실패한 프로브
    pub kind: ProbeKind,
    /// 실패 사유
    pub reason: String,
}

/// 컨테이너 하나에 대한 프로브 실행 결과
#[derive(Debug, Clone)]
pub struct ProbeRun {
    /// 프로브 결과 (`ProbeKind::ALL` 순서, 항상 4개)
    pub results: Vec<ProbeResult>,
    /// 빈 결과로 대체된 프로브 목록
    pub soft_failures: Vec<SoftFailure>,
}

/// 프로브 실행기
///
/// 런타임 클라이언트와 프로브 규칙을 보유하며, 여러 워커 태스크에서
/// `Arc`로 공유됩니다.
pub struct ProbeRunner<R: RuntimeClient> {
    client: Arc<R>,
    rules: ProbeConfig,
    timeout: Duration,
}

impl<R: RuntimeClient> ProbeRunner<R> {
    /// 새 프로브 실행기를 생성합니다.
    pub fn new(client: Arc<R>, rules: ProbeConfig, timeout: Duration) -> Self {
        Self {
            client,
            rules,
            timeout,
        }
    }

    /// 프로브 규칙
    pub fn rules(&self) -> &ProbeConfig {
        &self.rules
    }

    /// 네 가지 프로브를 동시에 실행합니다.
    ///
    /// 이 함수는 실패하지 않습니다. 모든 프로브 에러는 빈 결과와
    /// `SoftFailure`로 흡수됩니다.
    pub async fn run(&self, container: &ContainerDescriptor) -> ProbeRun {
        let (env, config, large, database) = tokio::join!(
            self.probe(container, ProbeKind::EnvSecrets),
            self.probe(container, ProbeKind::ConfigFiles),
            self.probe(container, ProbeKind::LargeFiles),
            self.probe(container, ProbeKind::DatabaseFiles),
        );

        let mut results = Vec::with_capacity(ProbeKind::ALL.len());
        let mut soft_failures = Vec::new();

        for (kind, outcome) in [
            (ProbeKind::EnvSecrets, env),
            (ProbeKind::ConfigFiles, config),
            (ProbeKind::LargeFiles, large),
            (ProbeKind::DatabaseFiles, database),
        ] {
            match outcome {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(
                        container = %container.name(),
                        probe = %kind,
                        error = %e,
                        "probe failed, using empty result"
                    );
                    metrics::counter!(
                        m::PROBE_FAILURES_TOTAL,
                        m::LABEL_PROBE => kind.label(),
                        m::LABEL_REASON => e.reason_label()
                    )
                    .increment(1);
                    soft_failures.push(SoftFailure {
                        kind,
                        reason: e.to_string(),
                    });
                    results.push(ProbeResult::empty(kind));
                }
            }
        }

        ProbeRun {
            results,
            soft_failures,
        }
    }

    async fn probe(
        &self,
        container: &ContainerDescriptor,
        kind: ProbeKind,
    ) -> Result<ProbeResult, AuditEngineError> {
        let command = self.command_for(kind);
        let started = Instant::now();
        let output = self
            .client
            .exec(container.id(), &command, self.timeout)
            .await;
        metrics::histogram!(m::PROBE_DURATION_SECONDS, m::LABEL_PROBE => kind.label())
            .record(started.elapsed().as_secs_f64());
        let output = output?;

        if let Some(code) = output.exit_code.filter(|c| *c != 0) {
            // find는 읽을 수 없는 하위 트리가 있으면 0이 아닌 코드로 끝납니다.
            debug!(
                container = %container.name(),
                probe = %kind,
                exit_code = code,
                "probe command exited nonzero, keeping partial output"
            );
        }

        let lines = match kind {
            ProbeKind::EnvSecrets => filter_env(&output.stdout, &self.rules.secret_keywords),
            ProbeKind::ConfigFiles => {
                filter_by_extension(output_lines(&output.stdout), &self.rules.config_extensions)
            }
            ProbeKind::LargeFiles => output_lines(&output.stdout).map(format_du_line).collect(),
            ProbeKind::DatabaseFiles => output_lines(&output.stdout)
                .filter(|line| {
                    has_extension(du_path(line), &self.rules.database_extensions)
                })
                .map(format_du_line)
                .collect(),
        };

        debug!(
            container = %container.name(),
            probe = %kind,
            findings = lines.len(),
            "probe completed"
        );

        Ok(ProbeResult::new(kind, lines))
    }

    /// 프로브 종류에 해당하는 컨테이너 내부 명령을 생성합니다.
    pub fn command_for(&self, kind: ProbeKind) -> Vec<String> {
        match kind {
            ProbeKind::EnvSecrets => vec!["printenv".to_owned()],
            ProbeKind::ConfigFiles => {
                find_command(&self.rules, &self.rules.config_extensions, &["-print"])
            }
            ProbeKind::LargeFiles => {
                // `c` 단위는 바이트 그대로 비교합니다. `k`는 파일 크기를 KiB로 올림합니다.
                let size = format!("+{}c", self.rules.large_file_threshold_bytes);
                let mut action = vec!["-size", size.as_str()];
                action.extend_from_slice(DU_ACTION);
                find_command(&self.rules, &[], &action)
            }
            ProbeKind::DatabaseFiles => {
                find_command(&self.rules, &self.rules.database_extensions, DU_ACTION)
            }
        }
    }
}

/// 찾은 파일마다 디스크 사용량을 출력합니다.
///
/// `-l`이 없으면 `du`는 하드 링크된 inode를 한 번만 출력합니다.
const DU_ACTION: &[&str] = &["-exec", "du", "-k", "-l", "{}", "+"];

/// `find` 명령 인자를 생성합니다.
///
/// `-name` 대안들은 항상 괄호로 묶으므로 뒤따르는 동작이 모든 대안에 적용됩니다.
fn find_command(rules: &ProbeConfig, extensions: &[String], action: &[&str]) -> Vec<String> {
    let mut cmd = vec!["find".to_owned(), rules.search_root.clone()];

    if rules.max_depth > 0 {
        cmd.push("-maxdepth".to_owned());
        cmd.push(rules.max_depth.to_string());
    }

    if !rules.excluded_paths.is_empty() {
        cmd.push("(".to_owned());
        for (i, path) in rules.excluded_paths.iter().enumerate() {
            if i > 0 {
                cmd.push("-o".to_owned());
            }
            cmd.push("-path".to_owned());
            cmd.push(path.clone());
        }
        cmd.push(")".to_owned());
        cmd.push("-prune".to_owned());
        cmd.push("-o".to_owned());
    }

    cmd.push("-type".to_owned());
    cmd.push("f".to_owned());

    if !extensions.is_empty() {
        cmd.push("(".to_owned());
        for (i, ext) in extensions.iter().enumerate() {
            if i > 0 {
                cmd.push("-o".to_owned());
            }
            cmd.push("-name".to_owned());
            cmd.push(format!("*{ext}"));
        }
        cmd.push(")".to_owned());
    }

    cmd.extend(action.iter().map(|s| (*s).to_owned()));
    cmd
}

fn output_lines(stdout: &str) -> impl Iterator<Item = &str> {
    stdout
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
}

/// 환경 변수 출력 중 키 또는 값에 키워드가 포함된 줄만 남깁니다.
///
/// 대소문자를 구분하지 않으며, `=`가 없는 줄은 줄 전체로 비교합니다.
pub fn filter_env(stdout: &str, keywords: &[String]) -> Vec<String> {
    let keywords: Vec<String> = keywords
        .iter()
        .filter(|k| !k.is_empty())
        .map(|k| k.to_lowercase())
        .collect();

    output_lines(stdout)
        .filter(|line| {
            let (key, value) = line.split_once('=').unwrap_or((line, ""));
            let key = key.to_lowercase();
            let value = value.to_lowercase();
            keywords
                .iter()
                .any(|k| key.contains(k.as_str()) || value.contains(k.as_str()))
        })
        .map(str::to_owned)
        .collect()
}

fn has_extension(path: &str, extensions: &[String]) -> bool {
    extensions.iter().any(|ext| path.ends_with(ext.as_str()))
}

/// 경로 목록을 확장자로 거릅니다 (`find -name`과 같이 대소문자 구분).
pub fn filter_by_extension<'a>(
    paths: impl Iterator<Item = &'a str>,
    extensions: &[String],
) -> Vec<String> {
    paths
        .filter(|path| has_extension(path, extensions))
        .map(str::to_owned)
        .collect()
}

/// `du -k` 출력 한 줄에서 경로 부분을 꺼냅니다.
fn du_path(line: &str) -> &str {
    line.split_once('\t').map_or(line, |(_, path)| path)
}

/// `du -k` 출력 한 줄(`<KiB>\t<path>`)을 `<사람이 읽는 크기>\t<path>`로 바꿉니다.
///
/// 형식이 맞지 않는 줄은 그대로 유지합니다.
pub fn format_du_line(line: &str) -> String {
    match line.split_once('\t') {
        Some((size, path)) => match size.trim().parse::<u64>() {
            Ok(kib) => format!("{}\t{path}", human_size_kib(kib)),
            Err(_) => line.to_owned(),
        },
        None => line.to_owned(),
    }
}

/// KiB 단위 크기를 `du -h` 형식(`4.0K`, `1.5M`, `120M`, `2.0G`)으로 표시합니다.
///
/// 입력은 `du -k`가 보고한 디스크 사용량(할당된 블록)이며 파일 길이가 아닙니다.
/// 1100바이트 파일도 4 KiB 블록 하나를 차지하면 `4.0K`로 표시됩니다.
/// 10 미만은 소수점 한 자리, 그 이상은 정수로 올림합니다.
pub fn human_size_kib(kib: u64) -> String {
    const UNITS: [char; 5] = ['K', 'M', 'G', 'T', 'P'];

    if kib == 0 {
        return "0".to_owned();
    }

    let kib = u128::from(kib);
    let mut unit = 0;
    let mut divisor: u128 = 1;
    while kib >= divisor * 1024 && unit < UNITS.len() - 1 {
        divisor *= 1024;
        unit += 1;
    }

    let tenths = (kib * 10).div_ceil(divisor);
    if tenths < 100 {
        format!("{}.{}{}", tenths / 10, tenths % 10, UNITS[unit])
    } else {
        format!("{}{}", kib.div_ceil(divisor), UNITS[unit])
    }
}
