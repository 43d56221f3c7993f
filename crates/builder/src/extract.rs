//! Archive extraction
//!
//! The format is detected from magic bytes, falling back to the file
//! extension. Compressed tarballs are decompressed with async-compression
//! into a temporary file and unpacked on the blocking pool.

use lxpkg_errors::{Error, ExtractError};
use lxpkg_events::{AppEvent, BuildEvent, EventEmitter, EventSender};
use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Component, Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};

/// Archive formats the extractor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Tar,
    TarGzip,
    TarBzip2,
    TarXz,
    TarZstd,
    Zip,
}

impl ArchiveFormat {
    /// Detect from the leading bytes of a file
    #[must_use]
    pub fn from_magic(header: &[u8]) -> Option<Self> {
        const USTAR_OFFSET: usize = 257;

        if header.starts_with(&[0x1f, 0x8b]) {
            Some(Self::TarGzip)
        } else if header.starts_with(b"BZh") {
            Some(Self::TarBzip2)
        } else if header.starts_with(&[0xfd, b'7', b'z', b'X', b'Z', 0x00]) {
            Some(Self::TarXz)
        } else if header.starts_with(&[0x28, 0xb5, 0x2f, 0xfd]) {
            Some(Self::TarZstd)
        } else if header.starts_with(b"PK\x03\x04") || header.starts_with(b"PK\x05\x06") {
            Some(Self::Zip)
        } else if header.len() >= USTAR_OFFSET + 5
            && &header[USTAR_OFFSET..USTAR_OFFSET + 5] == b"ustar"
        {
            Some(Self::Tar)
        } else {
            None
        }
    }

    /// Detect from the file name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        let (_, format) = SUFFIXES
            .iter()
            .find(|(suffix, _)| name.ends_with(suffix))?;
        Some(*format)
    }
}

const SUFFIXES: &[(&str, ArchiveFormat)] = &[
    (".tar.gz", ArchiveFormat::TarGzip),
    (".tgz", ArchiveFormat::TarGzip),
    (".tar.bz2", ArchiveFormat::TarBzip2),
    (".tbz2", ArchiveFormat::TarBzip2),
    (".tbz", ArchiveFormat::TarBzip2),
    (".tar.xz", ArchiveFormat::TarXz),
    (".txz", ArchiveFormat::TarXz),
    (".tar.zst", ArchiveFormat::TarZstd),
    (".tzst", ArchiveFormat::TarZstd),
    (".tar", ArchiveFormat::Tar),
    (".zip", ArchiveFormat::Zip),
];

/// Artifact file name with its archive suffix removed (`pkg-1.0.tar.gz` → `pkg-1.0`)
#[must_use]
pub fn artifact_stem(artifact: &Path) -> String {
    let name = artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let lower = name.to_ascii_lowercase();
    SUFFIXES
        .iter()
        .find(|(suffix, _)| lower.ends_with(suffix) && lower.len() > suffix.len())
        .map_or_else(
            || {
                artifact
                    .file_stem()
                    .map_or_else(|| name.clone(), |s| s.to_string_lossy().into_owned())
            },
            |(suffix, _)| name[..name.len() - suffix.len()].to_string(),
        )
}

/// How the entries of an archive are laid out
#[derive(Debug, Clone, PartialEq, Eq)]
enum Layout {
    /// No file entries at all, only directories or nothing
    Empty,
    /// Every entry sits under this one top-level directory
    SingleRoot(PathBuf),
    /// Several top-level entries, or files at top level
    Flat,
}

/// Classify archive entries by their (normalized) paths
fn layout<'a>(entries: impl Iterator<Item = (&'a Path, bool)>) -> Layout {
    let mut tops = BTreeSet::new();
    let mut top_is_file = false;
    let mut any_file = false;

    for (path, is_dir) in entries {
        let mut components = path.components();
        let Some(first) = components.next() else {
            continue;
        };
        any_file |= !is_dir;
        if components.next().is_none() && !is_dir {
            top_is_file = true;
        }
        tops.insert(first.as_os_str().to_os_string());
    }

    if !any_file {
        return Layout::Empty;
    }
    match (tops.len(), top_is_file) {
        (1, false) => tops
            .into_iter()
            .next()
            .map_or(Layout::Flat, |d| Layout::SingleRoot(PathBuf::from(d))),
        _ => Layout::Flat,
    }
}

/// Drop `.` components; `None` for paths that are absolute or climb out
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(out)
}

/// Where to unpack, and which directory becomes the source root
///
/// Returns `(target, source_dir)`. A directory that would land on an
/// existing non-directory, such as the artifact itself when its URL has no
/// archive suffix, is moved aside to a fresh name.
fn placement(artifact: &Path, dest_dir: &Path, layout: Layout) -> Result<(PathBuf, PathBuf), Error> {
    match layout {
        Layout::Empty => Err(failed(artifact, "archive contains no files")),
        Layout::SingleRoot(root) => {
            let source_dir = dest_dir.join(&root);
            if occupied(&source_dir) {
                let target = unpack_dir(artifact, dest_dir);
                Ok((target.clone(), target.join(root)))
            } else {
                Ok((dest_dir.to_path_buf(), source_dir))
            }
        }
        Layout::Flat => {
            let dir = unpack_dir(artifact, dest_dir);
            Ok((dir.clone(), dir))
        }
    }
}

/// `dest_dir/<artifact stem>`, or the first free `<stem>-src[-N]` variant
fn unpack_dir(artifact: &Path, dest_dir: &Path) -> PathBuf {
    let stem = artifact_stem(artifact);
    let mut dir = dest_dir.join(&stem);
    let mut attempt = 0u32;
    while occupied(&dir) {
        attempt += 1;
        let name = if attempt == 1 {
            format!("{stem}-src")
        } else {
            format!("{stem}-src-{attempt}")
        };
        dir = dest_dir.join(name);
    }
    dir
}

/// Something other than a directory already sits at `path`
fn occupied(path: &Path) -> bool {
    path.symlink_metadata().is_ok_and(|meta| !meta.is_dir())
}

/// Extract `artifact` under `dest_dir` and return the source root
///
/// When every entry lives under one top-level directory `D`, entries are
/// unpacked into `dest_dir` and `dest_dir/D` is returned. Otherwise they
/// are unpacked into `dest_dir/<artifact stem>`, which is returned.
///
/// # Errors
///
/// Returns `ExtractError::Unsupported` for unknown formats and
/// `ExtractError::Failed` for unreadable or corrupt archives, archives
/// without a single file, and entries that would land outside the
/// destination.
pub async fn extract(artifact: &Path, dest_dir: &Path, tx: &EventSender) -> Result<PathBuf, Error> {
    let format = detect(artifact).await?;
    tracing::debug!(artifact = %artifact.display(), ?format, "extracting archive");
    tx.emit_debug(format!("{} is a {format:?} archive", artifact.display()));

    tokio::fs::create_dir_all(dest_dir)
        .await
        .map_err(|e| failed(artifact, format!("failed to create destination: {e}")))?;

    let (source_dir, entries) = match format {
        ArchiveFormat::Zip => {
            let (src, dest) = (artifact.to_path_buf(), dest_dir.to_path_buf());
            blocking(artifact, move || unpack_zip(&src, &dest)).await?
        }
        ArchiveFormat::Tar => {
            let (src, dest) = (artifact.to_path_buf(), dest_dir.to_path_buf());
            blocking(artifact, move || unpack_tar(&src, &src, &dest)).await?
        }
        compressed => extract_compressed_tar(artifact, compressed, dest_dir).await?,
    };

    tx.emit(AppEvent::Build(BuildEvent::Extracted {
        artifact: artifact.to_path_buf(),
        source_dir: source_dir.clone(),
        entries,
    }));
    Ok(source_dir)
}

async fn detect(artifact: &Path) -> Result<ArchiveFormat, Error> {
    let mut file = tokio::fs::File::open(artifact)
        .await
        .map_err(|e| failed(artifact, format!("failed to open archive: {e}")))?;
    let mut header = vec![0u8; 512];
    let mut filled = 0;
    while filled < header.len() {
        let n = file
            .read(&mut header[filled..])
            .await
            .map_err(|e| failed(artifact, format!("failed to read archive: {e}")))?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    header.truncate(filled);

    ArchiveFormat::from_magic(&header)
        .or_else(|| {
            artifact
                .file_name()
                .and_then(|n| ArchiveFormat::from_name(&n.to_string_lossy()))
        })
        .ok_or_else(|| {
            ExtractError::Unsupported {
                path: artifact.display().to_string(),
            }
            .into()
        })
}

/// Decompress into a temporary tar file, then unpack it
async fn extract_compressed_tar(
    artifact: &Path,
    format: ArchiveFormat,
    dest_dir: &Path,
) -> Result<(PathBuf, usize), Error> {
    use async_compression::tokio::bufread::{BzDecoder, GzipDecoder, XzDecoder, ZstdDecoder};

    let temp_dir = tempfile::tempdir()
        .map_err(|e| failed(artifact, format!("failed to create temp directory: {e}")))?;
    let temp_path = temp_dir.path().join("archive.tar");

    {
        let input = tokio::fs::File::open(artifact)
            .await
            .map_err(|e| failed(artifact, format!("failed to open archive: {e}")))?;
        let mut output = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| failed(artifact, format!("failed to create temp file: {e}")))?;
        let reader = BufReader::new(input);

        let copied = match format {
            ArchiveFormat::TarGzip => {
                tokio::io::copy(&mut GzipDecoder::new(reader), &mut output).await
            }
            ArchiveFormat::TarBzip2 => {
                tokio::io::copy(&mut BzDecoder::new(reader), &mut output).await
            }
            ArchiveFormat::TarXz => tokio::io::copy(&mut XzDecoder::new(reader), &mut output).await,
            ArchiveFormat::TarZstd => {
                tokio::io::copy(&mut ZstdDecoder::new(reader), &mut output).await
            }
            ArchiveFormat::Tar | ArchiveFormat::Zip => {
                return Err(Error::internal("not a compressed tar format"))
            }
        };
        copied.map_err(|e| failed(artifact, format!("failed to decompress: {e}")))?;
        output
            .flush()
            .await
            .map_err(|e| failed(artifact, format!("failed to flush temp file: {e}")))?;
    }

    let (src, dest) = (artifact.to_path_buf(), dest_dir.to_path_buf());
    let result = blocking(artifact, move || unpack_tar(&src, &temp_path, &dest)).await;

    // temp_dir must outlive the unpack
    drop(temp_dir);
    result
}

async fn blocking<F>(artifact: &Path, f: F) -> Result<(PathBuf, usize), Error>
where
    F: FnOnce() -> Result<(PathBuf, usize), Error> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| failed(artifact, format!("task join error: {e}")))?
}

/// Unpack the tar at `tar_path`; `artifact` names the original file in errors
fn unpack_tar(artifact: &Path, tar_path: &Path, dest_dir: &Path) -> Result<(PathBuf, usize), Error> {
    let open = || {
        File::open(tar_path)
            .map(tar::Archive::new)
            .map_err(|e| failed(artifact, format!("failed to open tar: {e}")))
    };

    // first pass: inspect entry paths
    let mut paths = Vec::new();
    let mut archive = open()?;
    let entries = archive
        .entries()
        .map_err(|e| failed(artifact, format!("failed to read tar: {e}")))?;
    for entry in entries {
        let entry = entry.map_err(|e| failed(artifact, format!("corrupt tar entry: {e}")))?;
        if is_metadata(&entry) {
            continue;
        }
        let raw = entry
            .path()
            .map_err(|e| failed(artifact, format!("invalid entry path: {e}")))?;
        let path = normalize(&raw)
            .ok_or_else(|| failed(artifact, format!("entry escapes destination: {}", raw.display())))?;
        paths.push((path, entry.header().entry_type().is_dir()));
    }

    let (target, source_dir) = placement(
        artifact,
        dest_dir,
        layout(paths.iter().map(|(p, d)| (p.as_path(), *d))),
    )?;
    std::fs::create_dir_all(&target)
        .map_err(|e| failed(artifact, format!("failed to create {}: {e}", target.display())))?;

    // second pass: unpack
    let mut archive = open()?;
    archive.set_preserve_permissions(true);
    let entries = archive
        .entries()
        .map_err(|e| failed(artifact, format!("failed to read tar: {e}")))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| failed(artifact, format!("corrupt tar entry: {e}")))?;
        if is_metadata(&entry) {
            continue;
        }
        let unpacked = entry
            .unpack_in(&target)
            .map_err(|e| failed(artifact, format!("failed to extract entry: {e}")))?;
        if !unpacked {
            return Err(failed(artifact, "entry escapes destination"));
        }
    }

    Ok((source_dir, paths.len()))
}

fn is_metadata<R: std::io::Read>(entry: &tar::Entry<'_, R>) -> bool {
    let kind = entry.header().entry_type();
    kind.is_pax_global_extensions() || kind.is_pax_local_extensions() || kind.is_gnu_longname()
}

fn unpack_zip(artifact: &Path, dest_dir: &Path) -> Result<(PathBuf, usize), Error> {
    let file =
        File::open(artifact).map_err(|e| failed(artifact, format!("failed to open archive: {e}")))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| failed(artifact, format!("failed to read zip archive: {e}")))?;

    let mut paths = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| failed(artifact, format!("failed to read zip entry: {e}")))?;
        let path = entry
            .enclosed_name()
            .ok_or_else(|| failed(artifact, format!("entry escapes destination: {}", entry.name())))?;
        paths.push((path, entry.is_dir()));
    }

    let (target, source_dir) = placement(
        artifact,
        dest_dir,
        layout(paths.iter().map(|(p, d)| (p.as_path(), *d))),
    )?;

    for (i, (rel, is_dir)) in paths.iter().enumerate() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| failed(artifact, format!("failed to read zip entry: {e}")))?;
        let outpath = target.join(rel);

        if *is_dir {
            std::fs::create_dir_all(&outpath)
                .map_err(|e| failed(artifact, format!("failed to create directory: {e}")))?;
        } else {
            if let Some(parent) = outpath.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    failed(artifact, format!("failed to create parent directory: {e}"))
                })?;
            }
            let mut outfile = File::create(&outpath)
                .map_err(|e| failed(artifact, format!("failed to create file: {e}")))?;
            std::io::copy(&mut entry, &mut outfile)
                .map_err(|e| failed(artifact, format!("failed to extract file: {e}")))?;
        }

        // Set permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode)).ok();
            }
        }
    }

    Ok((source_dir, paths.len()))
}

fn failed(artifact: &Path, message: impl Into<String>) -> Error {
    ExtractError::Failed {
        path: artifact.display().to_string(),
        message: message.into(),
    }
    .into()
}
