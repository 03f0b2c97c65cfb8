#![cfg(unix)]

use std::path::{Path, PathBuf};

use track_downloader::config::ExtractorConfig;
use track_downloader::resolver::{MediaResolver, ResolveError, YoutubeDlResolver};

const PAGE_URL: &str = "https://soundcloud.com/artist/track";

// 用 sh 脚本模拟提取器：$1 是模式参数
fn fake_extractor(dir: &Path, body: &str) -> (YoutubeDlResolver, PathBuf) {
    let script = dir.join("fake-ytdl.sh");
    std::fs::write(&script, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let scratch = dir.join("scratch");
    std::fs::create_dir_all(&scratch).unwrap();

    let mut config = ExtractorConfig::new("sh");
    config.base_args = vec![script.display().to_string()];
    config.scratch_root = Some(scratch.clone());
    (YoutubeDlResolver::new(config), scratch)
}

fn is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

#[tokio::test]
async fn test_resolve_reads_and_removes_sidecar() {
    let dir = tempfile::tempdir().unwrap();
    let (resolver, scratch) = fake_extractor(
        dir.path(),
        r#"case "$1" in
--get-filename) echo 'Song [123].mp3' ;;
--write-info-json) printf '%s' '{"url": "https://cdn.example.com/song.mp3", "fulltitle": "AC/DC Live", "filesize": 4242}' > 'Song [123].info.json' ;;
esac"#,
    );

    let media = resolver.resolve(PAGE_URL).await.unwrap();
    assert_eq!(media.media_url, "https://cdn.example.com/song.mp3");
    assert_eq!(media.title, "AC/DC Live");
    assert_eq!(media.suggested_filename.as_deref(), Some("Song [123].mp3"));
    assert_eq!(media.file_name("mp3"), "AC_DC Live.mp3");
    assert!(is_empty(&scratch));
}

#[tokio::test]
async fn test_filename_failure_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let (resolver, _) = fake_extractor(
        dir.path(),
        r#"case "$1" in
--get-filename) exit 1 ;;
--write-info-json) printf '%s' '{"url": "https://cdn.example.com/a.mp3", "title": "Only Title"}' > 'a.info.json' ;;
esac"#,
    );

    let media = resolver.resolve(PAGE_URL).await.unwrap();
    assert_eq!(media.suggested_filename, None);
    // 没有 fulltitle 时使用 title
    assert_eq!(media.title, "Only Title");
}

#[tokio::test]
async fn test_filename_query_keeps_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let (resolver, scratch) = fake_extractor(
        dir.path(),
        r#"case "$1" in
--get-filename) echo 'ERROR: Unable to extract filename' >&2; exit 2 ;;
esac"#,
    );

    match resolver.query_filename(PAGE_URL, &scratch).await {
        Err(ResolveError::ExtractorProcess { code, stderr }) => {
            assert_eq!(code, Some(2));
            assert_eq!(stderr, "ERROR: Unable to extract filename");
        }
        other => panic!("期望 ExtractorProcess, 实际: {:?}", other),
    }
}

#[tokio::test]
async fn test_extractor_failure_cleans_scratch_dir() {
    let dir = tempfile::tempdir().unwrap();
    let (resolver, scratch) = fake_extractor(
        dir.path(),
        r#"case "$1" in
--write-info-json) echo '{' > 'partial.info.json'; echo 'ERROR: Unsupported URL' >&2; exit 3 ;;
esac"#,
    );

    match resolver.resolve(PAGE_URL).await {
        Err(ResolveError::ExtractorProcess { code, stderr }) => {
            assert_eq!(code, Some(3));
            assert!(stderr.contains("Unsupported URL"));
        }
        other => panic!("期望 ExtractorProcess, 实际: {:?}", other),
    }
    assert!(is_empty(&scratch));
}

#[tokio::test]
async fn test_missing_sidecar() {
    let dir = tempfile::tempdir().unwrap();
    let (resolver, _) = fake_extractor(dir.path(), "exit 0");

    let err = resolver.resolve(PAGE_URL).await.unwrap_err();
    assert!(matches!(err, ResolveError::MetadataNotFound(_)));
}

#[tokio::test]
async fn test_multiple_sidecars_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (resolver, scratch) = fake_extractor(
        dir.path(),
        r#"case "$1" in
--write-info-json) echo '{}' > 'a.info.json'; echo '{}' > 'b.info.json' ;;
esac"#,
    );

    match resolver.resolve(PAGE_URL).await {
        Err(ResolveError::AmbiguousMetadata(paths)) => assert_eq!(paths.len(), 2),
        other => panic!("期望 AmbiguousMetadata, 实际: {:?}", other),
    }
    assert!(is_empty(&scratch));
}

#[tokio::test]
async fn test_sidecar_without_url() {
    let dir = tempfile::tempdir().unwrap();
    let (resolver, _) = fake_extractor(
        dir.path(),
        r#"case "$1" in
--write-info-json) printf '%s' '{"fulltitle": "No Url"}' > 'x.info.json' ;;
esac"#,
    );

    let err = resolver.resolve(PAGE_URL).await.unwrap_err();
    assert!(matches!(err, ResolveError::MetadataParse(_)));
}

#[tokio::test]
async fn test_invalid_json() {
    let dir = tempfile::tempdir().unwrap();
    let (resolver, _) = fake_extractor(
        dir.path(),
        r#"case "$1" in
--write-info-json) echo 'not json' > 'x.info.json' ;;
esac"#,
    );

    let err = resolver.resolve(PAGE_URL).await.unwrap_err();
    assert!(matches!(err, ResolveError::MetadataParse(_)));
}

#[tokio::test]
async fn test_missing_extractor_binary() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ExtractorConfig::new(dir.path().join("no-such-ytdl").display().to_string());
    config.scratch_root = Some(dir.path().to_path_buf());
    let resolver = YoutubeDlResolver::new(config);

    let err = resolver.resolve(PAGE_URL).await.unwrap_err();
    assert!(matches!(err, ResolveError::ExtractorSpawn { .. }));
}
