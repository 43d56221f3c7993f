//! Integration tests for error types

#[cfg(test)]
mod tests {
    use lxpkg_errors::*;

    #[test]
    fn test_error_conversion() {
        let err: Error = FetchError::Http {
            url: "https://example.org/pkg.tar.gz".into(),
            status: 404,
        }
        .into();
        assert!(matches!(err, Error::Fetch(_)));
        assert_eq!(err.user_code(), Some("fetch.http_error"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_build_error_detail_is_raw_stderr() {
        let err: Error = BuildError::StageFailed {
            stage: "Compiling".into(),
            command: "make".into(),
            stderr: "make: *** No targets specified.\n".into(),
        }
        .into();
        assert_eq!(err.diagnostic_detail(), "make: *** No targets specified.\n");
        assert_eq!(err.user_message(), "Compiling stage failed running `make`");
    }

    #[test]
    fn test_non_build_detail_is_display_text() {
        let err: Error = DescriptorError::NotFound { name: "jq".into() }.into();
        assert_eq!(err.diagnostic_detail(), err.to_string());
        assert!(err.user_hint().is_some());
    }

    #[test]
    fn test_error_clone() {
        let err = InstallError::RemoveFailed {
            path: "/usr/bin/jq".into(),
            message: "Permission denied".into(),
        };
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_concurrent_job_is_retryable() {
        let err: Error = JobError::AlreadyRunning {
            active: "zlib".into(),
        }
        .into();
        assert!(err.is_retryable());
        assert_eq!(err.user_code(), Some("job.concurrent"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let err: Error = io_err.into();
        assert!(matches!(
            err,
            Error::Io {
                kind: std::io::ErrorKind::PermissionDenied,
                ..
            }
        ));
    }
}
