//! Integration tests for extraction and stage execution

#[cfg(test)]
mod tests {
    use lxpkg_builder::*;
    use lxpkg_errors::{BuildError, Error, ExtractError};
    use lxpkg_events::{channel, AppEvent, JobEvent};
    use lxpkg_types::Stage;
    use std::io::Write;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::tempdir;
    use tokio::io::AsyncWriteExt;

    fn tar_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            builder.append_data(&mut header, path, data.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap()
    }

    async fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = async_compression::tokio::write::GzipEncoder::new(Vec::new());
        encoder.write_all(data).await.unwrap();
        encoder.shutdown().await.unwrap();
        encoder.into_inner()
    }

    fn drain_status(rx: &mut lxpkg_events::EventReceiver) -> Vec<String> {
        let mut status = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let AppEvent::Job(JobEvent::Status { message }) = event {
                status.push(message);
            }
        }
        status
    }

    #[tokio::test]
    async fn test_extract_single_root_tarball() {
        let (tx, _rx) = channel();
        let temp = tempdir().unwrap();
        let artifact = temp.path().join("pkg-1.0.tar.gz");
        let tar = tar_bytes(&[
            ("pkg-1.0/configure", "#!/bin/sh\n"),
            ("pkg-1.0/src/main.c", "int main(void) { return 0; }\n"),
        ]);
        tokio::fs::write(&artifact, gzip(&tar).await).await.unwrap();

        let build = temp.path().join("build");
        let src = extract(&artifact, &build, &tx).await.unwrap();

        assert_eq!(src, build.join("pkg-1.0"));
        assert!(src.join("configure").is_file());
        assert!(src.join("src/main.c").is_file());
    }

    #[tokio::test]
    async fn test_extract_flat_tarball_gets_own_directory() {
        let (tx, _rx) = channel();
        let temp = tempdir().unwrap();
        // no archive suffix: format comes from the ustar magic
        let artifact = temp.path().join("download");
        tokio::fs::write(
            &artifact,
            tar_bytes(&[("Makefile", "all:\n"), ("src/a.c", "")]),
        )
        .await
        .unwrap();

        let build = temp.path().join("build");
        let src = extract(&artifact, &build, &tx).await.unwrap();

        assert_eq!(src, build.join("download"));
        assert!(src.join("Makefile").is_file());
        assert!(src.join("src/a.c").is_file());
    }

    #[tokio::test]
    async fn test_extract_ignores_preexisting_directories() {
        let (tx, _rx) = channel();
        let temp = tempdir().unwrap();
        let build = temp.path().join("build");
        // leftovers from an earlier failed job
        std::fs::create_dir_all(build.join("aaa-old")).unwrap();

        let artifact = temp.path().join("zzz-2.0.tar");
        tokio::fs::write(&artifact, tar_bytes(&[("zzz-2.0/README", "hi")]))
            .await
            .unwrap();

        let src = extract(&artifact, &build, &tx).await.unwrap();
        assert_eq!(src, build.join("zzz-2.0"));
    }

    #[tokio::test]
    async fn test_extract_empty_archive_fails() {
        let (tx, _rx) = channel();
        let temp = tempdir().unwrap();
        let artifact = temp.path().join("empty.tar");
        tokio::fs::write(&artifact, tar_bytes(&[])).await.unwrap();

        let err = extract(&artifact, &temp.path().join("build"), &tx)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Extract(ExtractError::Failed { .. })));
    }

    #[tokio::test]
    async fn test_extract_directory_only_archive_fails() {
        let (tx, _rx) = channel();
        let temp = tempdir().unwrap();
        let artifact = temp.path().join("pkg-1.0.tar");

        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Directory);
        header.set_size(0);
        header.set_mode(0o755);
        builder
            .append_data(&mut header, "pkg-1.0/", std::io::empty())
            .unwrap();
        tokio::fs::write(&artifact, builder.into_inner().unwrap())
            .await
            .unwrap();

        let err = extract(&artifact, &temp.path().join("build"), &tx)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Extract(ExtractError::Failed { .. })));
    }

    #[tokio::test]
    async fn test_extract_next_to_suffixless_artifact() {
        let (tx, _rx) = channel();
        let temp = tempdir().unwrap();
        let build = temp.path().join("build");
        std::fs::create_dir_all(&build).unwrap();

        // fetched from `.../download` into the build root
        let artifact = build.join("download");
        tokio::fs::write(
            &artifact,
            tar_bytes(&[("Makefile", "all:\n"), ("src/a.c", "")]),
        )
        .await
        .unwrap();

        let src = extract(&artifact, &build, &tx).await.unwrap();
        assert_eq!(src, build.join("download-src"));
        assert!(src.join("Makefile").is_file());
        assert!(artifact.is_file());

        // a single top-level directory with the artifact's name
        tokio::fs::write(&artifact, tar_bytes(&[("download/README", "hi")]))
            .await
            .unwrap();
        std::fs::remove_dir_all(&src).unwrap();
        let src = extract(&artifact, &build, &tx).await.unwrap();
        assert_eq!(src, build.join("download-src/download"));
        assert!(src.join("README").is_file());
    }

    #[tokio::test]
    async fn test_extract_zip() {
        let (tx, _rx) = channel();
        let temp = tempdir().unwrap();
        let artifact = temp.path().join("tool-0.3.zip");

        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        writer.add_directory("tool-0.3/", options).unwrap();
        writer.start_file("tool-0.3/build.sh", options).unwrap();
        writer.write_all(b"echo built\n").unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        tokio::fs::write(&artifact, bytes).await.unwrap();

        let build = temp.path().join("build");
        let src = extract(&artifact, &build, &tx).await.unwrap();
        assert_eq!(src, build.join("tool-0.3"));
        assert_eq!(
            std::fs::read_to_string(src.join("build.sh")).unwrap(),
            "echo built\n"
        );
    }

    #[tokio::test]
    async fn test_extract_unsupported_format() {
        let (tx, _rx) = channel();
        let temp = tempdir().unwrap();
        let artifact = temp.path().join("notes.txt");
        tokio::fs::write(&artifact, b"plain text").await.unwrap();

        let err = extract(&artifact, &temp.path().join("build"), &tx)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Extract(ExtractError::Unsupported { .. })
        ));
    }

    #[tokio::test]
    async fn test_extract_corrupt_archive() {
        let (tx, _rx) = channel();
        let temp = tempdir().unwrap();
        let artifact = temp.path().join("broken.tar.gz");
        tokio::fs::write(&artifact, [0x1f, 0x8b, 0x08, 0x00, 0xde, 0xad, 0xbe, 0xef])
            .await
            .unwrap();

        let err = extract(&artifact, &temp.path().join("build"), &tx)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Extract(ExtractError::Failed { .. })));
    }

    fn executor(tx: lxpkg_events::EventSender) -> StageExecutor {
        StageExecutor::new("sh", Arc::new(Passthrough), tx).unwrap()
    }

    #[tokio::test]
    async fn test_run_stage_reports_status() {
        let (tx, mut rx) = channel();
        let temp = tempdir().unwrap();

        let commands = vec!["touch one".to_string(), "touch two".to_string()];
        executor(tx)
            .run_stage(Stage::Compile, temp.path(), &commands)
            .await
            .unwrap();

        assert!(temp.path().join("one").exists());
        assert!(temp.path().join("two").exists());
        assert_eq!(
            drain_status(&mut rx),
            vec![
                "Compiling: touch one".to_string(),
                "Compiling: touch two".to_string(),
                "Compiling done".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_build_failure_carries_stderr() {
        let (tx, mut rx) = channel();
        let temp = tempdir().unwrap();

        let commands = vec![
            "true".to_string(),
            "echo boom >&2; exit 3".to_string(),
            "touch never".to_string(),
        ];
        let err = executor(tx)
            .run_stage(Stage::Configure, temp.path(), &commands)
            .await
            .unwrap_err();

        match err {
            Error::Build(BuildError::StageFailed {
                stage,
                command,
                stderr,
            }) => {
                assert_eq!(stage, "configure");
                assert_eq!(command, "echo boom >&2; exit 3");
                assert_eq!(stderr, "boom\n");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!temp.path().join("never").exists());

        let status = drain_status(&mut rx);
        assert!(!status.contains(&"Configuring done".to_string()));
    }

    #[tokio::test]
    async fn test_commands_run_in_source_dir() {
        let (tx, _rx) = channel();
        let temp = tempdir().unwrap();
        let src = temp.path().join("pkg-1.0");
        std::fs::create_dir(&src).unwrap();

        executor(tx)
            .run_stage(Stage::Install, &src, &["pwd > where".to_string()])
            .await
            .unwrap();

        let recorded = std::fs::read_to_string(src.join("where")).unwrap();
        assert_eq!(
            Path::new(recorded.trim()).canonicalize().unwrap(),
            src.canonicalize().unwrap()
        );
    }

    #[tokio::test]
    async fn test_privileged_command_is_rewritten() {
        let (tx, _rx) = channel();
        let temp = tempdir().unwrap();

        // `env` stands in for a polkit front end: it just runs its arguments
        let strategy = Arc::new(FrontEnd::new("env").unwrap());
        let exec = StageExecutor::new("sh", strategy, tx).unwrap();
        exec.run_stage(
            Stage::Install,
            temp.path(),
            &["sudo touch installed".to_string()],
        )
        .await
        .unwrap();

        assert!(temp.path().join("installed").exists());
    }

    #[tokio::test]
    async fn test_missing_shell_is_spawn_error() {
        let (tx, _rx) = channel();
        let temp = tempdir().unwrap();
        let exec =
            StageExecutor::new("/nonexistent/lxpkg-shell", Arc::new(Passthrough), tx).unwrap();

        let err = exec
            .run_stage(Stage::Compile, temp.path(), &["true".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Build(BuildError::Spawn { .. })));
    }
}
