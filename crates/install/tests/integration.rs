//! Integration tests for manifest-driven removal

#[cfg(test)]
mod tests {
    use lxpkg_errors::{Error, InstallError};
    use lxpkg_events::{channel, AppEvent, UninstallEvent};
    use lxpkg_install::*;
    use std::fs;
    use tempfile::tempdir;

    fn manifest(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|e| (*e).to_string()).collect()
    }

    #[tokio::test]
    async fn test_remove_skips_missing_files() {
        let (tx, mut rx) = channel();
        let root = tempdir().unwrap();
        fs::create_dir_all(root.path().join("bin")).unwrap();
        fs::write(root.path().join("bin/a"), "a").unwrap();
        fs::write(root.path().join("bin/c"), "c").unwrap();

        let report = remove_manifest(
            root.path(),
            "pkg",
            &manifest(&["/bin/a", "bin/b", "/bin/c"]),
            &tx,
        )
        .await
        .unwrap();

        assert!(!root.path().join("bin/a").exists());
        assert!(!root.path().join("bin/c").exists());
        assert_eq!(
            report.removed,
            vec![root.path().join("bin/a"), root.path().join("bin/c")]
        );
        assert_eq!(report.missing, vec![root.path().join("bin/b")]);

        let mut removed_events = 0;
        let mut completed = None;
        while let Ok(event) = rx.try_recv() {
            match event {
                AppEvent::Uninstall(UninstallEvent::FileRemoved { .. }) => removed_events += 1,
                AppEvent::Uninstall(UninstallEvent::Completed {
                    removed, missing, ..
                }) => completed = Some((removed, missing)),
                _ => {}
            }
        }
        assert_eq!(removed_events, 2);
        assert_eq!(completed, Some((2, 1)));
    }

    #[tokio::test]
    async fn test_remove_is_repeatable() {
        let (tx, _rx) = channel();
        let root = tempdir().unwrap();
        fs::write(root.path().join("x"), "x").unwrap();
        let entries = manifest(&["x"]);

        let first = remove_manifest(root.path(), "pkg", &entries, &tx).await.unwrap();
        let second = remove_manifest(root.path(), "pkg", &entries, &tx).await.unwrap();
        assert_eq!(first.removed.len(), 1);
        assert!(second.removed.is_empty());
        assert_eq!(second.missing.len(), 1);
    }

    #[tokio::test]
    async fn test_escaping_entry_deletes_nothing() {
        let (tx, _rx) = channel();
        let root = tempdir().unwrap();
        fs::write(root.path().join("keep"), "k").unwrap();

        let err = remove_manifest(root.path(), "pkg", &manifest(&["keep", "../outside"]), &tx)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Install(InstallError::PathEscape { .. })
        ));
        assert!(root.path().join("keep").exists());
    }

    #[tokio::test]
    async fn test_symlink_is_removed_not_followed() {
        let (tx, _rx) = channel();
        let root = tempdir().unwrap();
        let target = root.path().join("real");
        fs::write(&target, "data").unwrap();
        #[cfg(unix)]
        std::os::unix::fs::symlink(&target, root.path().join("link")).unwrap();
        #[cfg(not(unix))]
        fs::write(root.path().join("link"), "stand-in").unwrap();

        let report = remove_manifest(root.path(), "pkg", &manifest(&["link"]), &tx)
            .await
            .unwrap();
        assert_eq!(report.removed.len(), 1);
        assert!(target.exists());
    }

    #[tokio::test]
    async fn test_non_empty_directory_stops_removal() {
        let (tx, _rx) = channel();
        let root = tempdir().unwrap();
        fs::write(root.path().join("first"), "1").unwrap();
        fs::create_dir_all(root.path().join("share/doc")).unwrap();
        fs::write(root.path().join("share/doc/README"), "r").unwrap();
        fs::write(root.path().join("last"), "2").unwrap();

        let err = remove_manifest(
            root.path(),
            "pkg",
            &manifest(&["first", "share/doc", "last"]),
            &tx,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            Error::Install(InstallError::RemoveFailed { .. })
        ));
        // earlier deletions stay, later entries are untouched
        assert!(!root.path().join("first").exists());
        assert!(root.path().join("last").exists());
    }
}
