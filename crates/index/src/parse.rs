//! TOML descriptor parsing

use lxpkg_errors::{DescriptorError, Error};
use lxpkg_types::PackageDescriptor;
use serde::Deserialize;
use std::path::Path;

/// On-disk layout of a descriptor file. Unknown keys are ignored.
#[derive(Debug, Deserialize)]
struct RawDescriptor {
    package: Option<RawPackage>,
    #[serde(default)]
    build: RawBuild,
    #[serde(default)]
    install: RawInstall,
}

#[derive(Debug, Deserialize)]
struct RawPackage {
    name: Option<String>,
    #[serde(default)]
    src: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawBuild {
    configure: Option<Vec<String>>,
    compile: Option<Vec<String>>,
    install: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawInstall {
    #[serde(default)]
    files: Vec<String>,
}

/// Read and validate the descriptor at `path`
///
/// # Errors
///
/// Returns `DescriptorError::Parse` if the file cannot be read, is not
/// valid TOML, or lacks a non-empty `package.name` or `package.src`.
pub fn load(path: &Path) -> Result<PackageDescriptor, Error> {
    let contents = std::fs::read_to_string(path).map_err(|e| parse_error(path, e.to_string()))?;
    parse(path, &contents)
}

/// Validate descriptor `contents`; `path` is used only for error reporting
///
/// # Errors
///
/// See [`load`].
pub fn parse(path: &Path, contents: &str) -> Result<PackageDescriptor, Error> {
    let raw: RawDescriptor =
        toml::from_str(contents).map_err(|e| parse_error(path, e.message().to_string()))?;

    let package = raw
        .package
        .ok_or_else(|| parse_error(path, "missing [package] table"))?;

    let name = package
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| parse_error(path, "package.name is missing or empty"))?;

    if package.src.is_empty() || package.src[0].trim().is_empty() {
        return Err(parse_error(path, "package.src is missing or empty"));
    }

    Ok(PackageDescriptor {
        name,
        sources: package.src,
        configure: raw.build.configure,
        compile: raw.build.compile,
        install: raw.build.install,
        manifest: raw.install.files,
    })
}

/// Declared `package.name`, without full validation. Used while indexing.
pub(crate) fn declared_name(contents: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct NameOnly {
        package: Option<NameOnlyPackage>,
    }
    #[derive(Deserialize)]
    struct NameOnlyPackage {
        name: Option<String>,
    }

    toml::from_str::<NameOnly>(contents)
        .ok()?
        .package?
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

fn parse_error(path: &Path, message: impl Into<String>) -> Error {
    DescriptorError::Parse {
        path: path.display().to_string(),
        message: message.into(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lxpkg_types::Stage;

    const FULL: &str = r#"
[package]
name = "hello"
src = ["https://example.org/hello-2.12.tar.gz", "https://mirror.example.org/hello-2.12.tar.gz"]
homepage = "https://example.org"

[build]
install = ["sudo make install"]
configure = ["./configure --prefix=/usr"]
compile = ["make"]

[install]
files = ["/usr/bin/hello", "usr/share/man/man1/hello.1"]
"#;

    fn path() -> &'static Path {
        Path::new("hello.toml")
    }

    #[test]
    fn test_parse_full_descriptor() {
        let desc = parse(path(), FULL).unwrap();
        assert_eq!(desc.name, "hello");
        assert_eq!(
            desc.primary_source(),
            Some("https://example.org/hello-2.12.tar.gz")
        );
        assert_eq!(desc.manifest.len(), 2);
        // file order of [build] keys does not matter
        let stages: Vec<Stage> = desc.declared_stages().map(|(s, _)| s).collect();
        assert_eq!(stages, Stage::ALL.to_vec());
    }

    #[test]
    fn test_build_and_install_tables_are_optional() {
        let desc = parse(
            path(),
            "[package]\nname = \"tiny\"\nsrc = [\"https://example.org/tiny.tar\"]\n",
        )
        .unwrap();
        assert_eq!(desc.declared_stages().count(), 0);
        assert!(desc.manifest.is_empty());
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let err = parse(path(), "[package]\nsrc = [\"https://example.org/a.tar\"]\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Descriptor(DescriptorError::Parse { ref message, .. }) if message.contains("name")
        ));
    }

    #[test]
    fn test_empty_src_is_rejected() {
        let err = parse(path(), "[package]\nname = \"a\"\nsrc = []\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Descriptor(DescriptorError::Parse { ref message, .. }) if message.contains("src")
        ));
    }

    #[test]
    fn test_malformed_toml_is_rejected() {
        assert!(parse(path(), "[package\nname=").is_err());
    }

    #[test]
    fn test_declared_name_tolerates_incomplete_files() {
        assert_eq!(
            declared_name("[package]\nname = \"zlib\"\n"),
            Some("zlib".to_string())
        );
        assert_eq!(declared_name("not toml at all ["), None);
    }
}
