//! 아티팩트 원자적 기록
//!
//! 출력 디렉토리 안에 임시 파일을 만들어 내용을 모두 쓴 뒤 최종 경로로
//! rename합니다. 중간에 취소되거나 실패해도 최종 경로에는 완전한 파일만
//! 존재합니다. 같은 이름의 기존 파일은 덮어씁니다.

use std::io::Write;
use std::path::Path;

/// `contents`를 `path`에 원자적으로 기록합니다.
///
/// 상위 디렉토리가 없으면 생성합니다. blocking I/O이므로 async 컨텍스트에서는
/// `spawn_blocking` 안에서 호출해야 합니다.
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".dockaudit-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_file_and_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("api-report.txt");

        write_atomic(&path, b"hello").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api-report.txt");
        std::fs::write(&path, b"old content that is longer").unwrap();

        write_atomic(&path, b"new").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn leaves_no_temporary_files() {
        let dir = tempfile::tempdir().unwrap();
        write_atomic(&dir.path().join("a.txt"), b"a").unwrap();
        write_atomic(&dir.path().join("b.txt"), b"b").unwrap();

        let mut names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn fails_when_directory_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("out");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = write_atomic(&blocker.join("api-report.txt"), b"x");
        assert!(result.is_err());
    }
}
