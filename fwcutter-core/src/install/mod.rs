//! Two-phase firmware installation: copy files, then recreate links
//!
//! The copy phase writes every matched file exactly once, even when
//! several entries reference the same relative path. The link phase only
//! starts after the copy phase finishes, so every symlink target is
//! already on disk. Installation is not transactional: a hard error
//! aborts the run and leaves already-written files in place, and a re-run
//! against an unchanged source reproduces the same tree.

use anyhow::Context;
use std::collections::HashSet;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, Entry, File, Query};
use crate::error::{FwcutterError, Result};

mod compression;

pub use compression::Compression;

/// Counters reported after an install run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InstallReport {
    pub entries_processed: usize,
    pub files_copied: usize,
    pub links_created: usize,
    pub bytes_written: u64,
}

/// Installs a filtered catalog subset from a source tree into a
/// destination tree
pub struct Installer {
    source_root: PathBuf,
    dest_root: PathBuf,
    compression: Compression,
}

impl Installer {
    pub fn new(source_root: &Path, dest_root: &Path, compression: Compression) -> Self {
        Self {
            source_root: source_root.to_path_buf(),
            dest_root: dest_root.to_path_buf(),
            compression,
        }
    }

    /// Install every file and link of the entries matching `query`.
    ///
    /// A missing source file aborts the run immediately; an empty
    /// selection succeeds with an all-zero report.
    pub fn install(&self, catalog: &Catalog, query: &Query) -> Result<InstallReport> {
        let entries = catalog.select(query);
        let mut report = InstallReport {
            entries_processed: entries.len(),
            ..Default::default()
        };

        let mut installed: HashSet<&str> = HashSet::new();
        for entry in &entries {
            for file in &entry.files {
                if !installed.insert(file.name.as_str()) {
                    debug!("Skipping {}: already installed", file.name);
                    continue;
                }
                report.bytes_written += self.install_file(entry, file)?;
                report.files_copied += 1;
            }
        }

        let mut linked: HashSet<&str> = HashSet::new();
        for entry in &entries {
            for file in &entry.files {
                for link in &file.links {
                    if !linked.insert(link.as_str()) {
                        continue;
                    }
                    self.install_link(file, link)?;
                    report.links_created += 1;
                }
            }
        }

        Ok(report)
    }

    /// Codec actually applied to a file (per-file opt-out respected)
    fn file_codec(&self, file: &File) -> Compression {
        if file.compress {
            self.compression
        } else {
            Compression::None
        }
    }

    /// Copy one file into the destination, normalizing its compression
    /// state to exactly the requested codec.
    ///
    /// Returns the number of bytes written to the destination.
    fn install_file(&self, entry: &Entry, file: &File) -> Result<u64> {
        let (source_path, source_codec) =
            resolve_source(&self.source_root, &file.name).ok_or_else(|| {
                FwcutterError::MissingSource {
                    entry: entry.name.clone(),
                    path: file.name.clone(),
                }
            })?;

        let codec = self.file_codec(file);
        let dest_path = self.dest_root.join(codec.apply_extension(&file.name));
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        if dest_path.exists() {
            warn!("Target file {} exists, overwriting", dest_path.display());
            fs::remove_file(&dest_path)?;
        }

        info!("Copying {} to {}", file.name, dest_path.display());
        if source_codec == codec {
            // Source is already in the requested state; plain byte copy
            fs::copy(&source_path, &dest_path)
                .with_context(|| format!("Failed to copy {}", source_path.display()))?;
        } else {
            let source_fd = fs::File::open(&source_path)
                .with_context(|| format!("Failed to open {}", source_path.display()))?;
            let mut reader = source_codec.decompress(Box::new(BufReader::new(source_fd)))?;

            let dest_fd = fs::File::create(&dest_path)
                .with_context(|| format!("Failed to create {}", dest_path.display()))?;
            let mut writer = BufWriter::new(dest_fd);
            codec.compress(reader.as_mut(), &mut writer)?;
            writer.flush()?;
        }

        Ok(fs::metadata(&dest_path)?.len())
    }

    /// Create one symlink pointing at its installed target file.
    ///
    /// The link is relative, carries the same compression extension as the
    /// target, and is recreated fresh so repeated installs are idempotent.
    fn install_link(&self, file: &File, link: &str) -> Result<()> {
        let codec = self.file_codec(file);
        let target_name = codec.apply_extension(&file.name);
        let link_path = self.dest_root.join(codec.apply_extension(link));

        if let Some(parent) = link_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        // symlink_metadata so a dangling leftover link is still replaced
        if link_path.symlink_metadata().is_ok() {
            warn!("Target link {} exists, overwriting", link_path.display());
            fs::remove_file(&link_path)?;
        }

        let link_dir = Path::new(link).parent().unwrap_or_else(|| Path::new(""));
        let target = relative_to(Path::new(&target_name), link_dir);
        info!("Making link {} to {}", link_path.display(), target.display());
        std::os::unix::fs::symlink(&target, &link_path)?;

        Ok(())
    }
}

/// Locate `name` under `root`, accepting a pre-compressed variant.
///
/// The exact path wins; otherwise a recognized compressed sibling
/// (`name.gz`, `name.xz`, `name.zst`) is returned along with the codec
/// needed to read it.
pub fn resolve_source(root: &Path, name: &str) -> Option<(PathBuf, Compression)> {
    let exact = root.join(name);
    if exact.is_file() {
        return Some((exact, Compression::None));
    }
    for codec in [Compression::Gzip, Compression::Xz, Compression::Zstd] {
        let candidate = root.join(codec.apply_extension(name));
        if candidate.is_file() {
            return Some((candidate, codec));
        }
    }
    None
}

/// Relative path from `dir` to `target`, walking up where needed.
///
/// Both paths are relative to the same root. `target` is a file path,
/// `dir` a directory path.
fn relative_to(target: &Path, dir: &Path) -> PathBuf {
    let target_parts: Vec<_> = target.components().collect();
    let dir_parts: Vec<_> = dir.components().collect();

    let common = target_parts
        .iter()
        .zip(dir_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..dir_parts.len() {
        relative.push("..");
    }
    for part in &target_parts[common..] {
        relative.push(part);
    }
    relative
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn catalog(yaml: &str) -> Catalog {
        Catalog::from_yaml(yaml).unwrap()
    }

    const BASIC: &str = r#"
metadata:
  format_version: "3"
  firmware_version: "1"
entries:
  - name: rtl8xxxu
    vendor: Realtek
    license:
      name: LICENCE.rtlwifi_firmware.txt
    files:
      - name: rtlwifi/rtl8723aufw_A.bin
      - name: rtlwifi/rtl8192eu_nic.bin
        links:
          - rtlwifi/rtl8192eefw.bin
      - name: rtlwifi/rtl8723bs_nic.bin
"#;

    /// Write a plain file under `root`, creating parents
    fn put(root: &Path, name: &str, content: &[u8]) {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn read(path: &Path) -> Vec<u8> {
        fs::read(path).unwrap()
    }

    fn seed_basic_source(source: &Path) {
        put(source, "rtlwifi/rtl8723aufw_A.bin", b"fw-a");
        put(source, "rtlwifi/rtl8192eu_nic.bin", b"fw-nic");
        put(source, "rtlwifi/rtl8723bs_nic.bin", b"fw-bs");
    }

    #[test]
    fn installs_files_and_links() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        seed_basic_source(source.path());

        let installer = Installer::new(source.path(), dest.path(), Compression::None);
        let query = Query {
            vendors: vec!["Realtek".into()],
            ..Default::default()
        };
        let report = installer.install(&catalog(BASIC), &query).unwrap();

        assert_eq!(report.entries_processed, 1);
        assert_eq!(report.files_copied, 3);
        assert_eq!(report.links_created, 1);
        assert_eq!(report.bytes_written, 4 + 6 + 5);

        assert_eq!(read(&dest.path().join("rtlwifi/rtl8723aufw_A.bin")), b"fw-a");

        // Reading through the link yields the target's bytes
        let link = dest.path().join("rtlwifi/rtl8192eefw.bin");
        assert!(link.symlink_metadata().unwrap().file_type().is_symlink());
        assert_eq!(
            fs::read_link(&link).unwrap(),
            PathBuf::from("rtl8192eu_nic.bin"),
            "link is relative to its own directory"
        );
        assert_eq!(read(&link), b"fw-nic");
    }

    #[test]
    fn empty_selection_installs_nothing() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        seed_basic_source(source.path());

        let installer = Installer::new(source.path(), dest.path(), Compression::None);
        let query = Query {
            licenses: vec!["GPL-2".into(), "GPL-3".into()],
            ..Default::default()
        };
        let report = installer.install(&catalog(BASIC), &query).unwrap();

        assert_eq!(report, InstallReport::default());
        assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_source_file_is_a_hard_error() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        put(source.path(), "rtlwifi/rtl8723aufw_A.bin", b"fw-a");

        let installer = Installer::new(source.path(), dest.path(), Compression::None);
        let err = installer
            .install(&catalog(BASIC), &Query::default())
            .unwrap_err();

        assert!(
            matches!(err, FwcutterError::MissingSource { ref entry, ref path }
                if entry == "rtl8xxxu" && path == "rtlwifi/rtl8192eu_nic.bin")
        );
        // The file copied before the failure stays on disk
        assert!(dest.path().join("rtlwifi/rtl8723aufw_A.bin").exists());
    }

    #[test]
    fn duplicate_path_across_entries_is_written_once() {
        let yaml = r#"
metadata:
  format_version: "3"
  firmware_version: "1"
entries:
  - name: first
    license:
      name: Unknown
    files:
      - name: files/common.bin
  - name: second
    license:
      name: Unknown
    files:
      - name: files/common.bin
"#;
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        put(source.path(), "files/common.bin", b"shared");

        let installer = Installer::new(source.path(), dest.path(), Compression::None);
        let report = installer.install(&catalog(yaml), &Query::default()).unwrap();

        assert_eq!(report.entries_processed, 2);
        assert_eq!(report.files_copied, 1);
        assert_eq!(report.bytes_written, 6);
    }

    #[test]
    fn install_is_idempotent() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        seed_basic_source(source.path());

        let installer = Installer::new(source.path(), dest.path(), Compression::Gzip);
        let first = installer.install(&catalog(BASIC), &Query::default()).unwrap();
        let first_bytes = read(&dest.path().join("rtlwifi/rtl8192eu_nic.bin.gz"));

        let second = installer.install(&catalog(BASIC), &Query::default()).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first_bytes,
            read(&dest.path().join("rtlwifi/rtl8192eu_nic.bin.gz"))
        );
        assert_eq!(
            fs::read_link(dest.path().join("rtlwifi/rtl8192eefw.bin.gz")).unwrap(),
            PathBuf::from("rtl8192eu_nic.bin.gz")
        );
    }

    #[test]
    fn compressed_install_appends_extension_and_round_trips() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        seed_basic_source(source.path());

        for (codec, ext) in [
            (Compression::Gzip, "gz"),
            (Compression::Xz, "xz"),
            (Compression::Zstd, "zst"),
        ] {
            let dest = dest.path().join(ext);
            let installer = Installer::new(source.path(), &dest, codec);
            installer.install(&catalog(BASIC), &Query::default()).unwrap();

            let path = dest.join(format!("rtlwifi/rtl8192eu_nic.bin.{ext}"));
            let fd = fs::File::open(&path).unwrap();
            let mut restored = Vec::new();
            codec
                .decompress(Box::new(fd))
                .unwrap()
                .read_to_end(&mut restored)
                .unwrap();
            assert_eq!(restored, b"fw-nic", "{codec:?} output decodes to the source bytes");
        }
    }

    #[test]
    fn precompressed_source_is_normalized_not_double_compressed() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();

        // Source tree only carries rtl8723aufw_A.bin.gz
        let mut gz = Vec::new();
        Compression::Gzip
            .compress(&mut b"fw-a".as_slice(), &mut gz)
            .unwrap();
        put(source.path(), "rtlwifi/rtl8723aufw_A.bin.gz", &gz);
        put(source.path(), "rtlwifi/rtl8192eu_nic.bin", b"fw-nic");
        put(source.path(), "rtlwifi/rtl8723bs_nic.bin", b"fw-bs");

        // Requested state: uncompressed
        let installer = Installer::new(source.path(), dest.path(), Compression::None);
        installer.install(&catalog(BASIC), &Query::default()).unwrap();
        assert_eq!(read(&dest.path().join("rtlwifi/rtl8723aufw_A.bin")), b"fw-a");

        // Requested state: xz; the gzip source must not nest codecs
        let dest2 = TempDir::new().unwrap();
        let installer = Installer::new(source.path(), dest2.path(), Compression::Xz);
        installer.install(&catalog(BASIC), &Query::default()).unwrap();

        let fd = fs::File::open(dest2.path().join("rtlwifi/rtl8723aufw_A.bin.xz")).unwrap();
        let mut restored = Vec::new();
        Compression::Xz
            .decompress(Box::new(fd))
            .unwrap()
            .read_to_end(&mut restored)
            .unwrap();
        assert_eq!(restored, b"fw-a");
    }

    #[test]
    fn compress_false_files_stay_uncompressed() {
        let yaml = r#"
metadata:
  format_version: "3"
  firmware_version: "1"
entries:
  - name: mixed
    license:
      name: Unknown
    files:
      - name: mixed/raw.bin
        compress: false
      - name: mixed/packed.bin
"#;
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        put(source.path(), "mixed/raw.bin", b"raw");
        put(source.path(), "mixed/packed.bin", b"packed");

        let installer = Installer::new(source.path(), dest.path(), Compression::Zstd);
        installer.install(&catalog(yaml), &Query::default()).unwrap();

        assert_eq!(read(&dest.path().join("mixed/raw.bin")), b"raw");
        assert!(dest.path().join("mixed/packed.bin.zst").exists());
        assert!(!dest.path().join("mixed/raw.bin.zst").exists());
    }

    #[test]
    fn link_into_another_directory_walks_up() {
        let yaml = r#"
metadata:
  format_version: "3"
  firmware_version: "1"
entries:
  - name: cross
    license:
      name: Unknown
    files:
      - name: a/fw.bin
        links:
          - b/alias.bin
"#;
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        put(source.path(), "a/fw.bin", b"cross");

        let installer = Installer::new(source.path(), dest.path(), Compression::None);
        installer.install(&catalog(yaml), &Query::default()).unwrap();

        let link = dest.path().join("b/alias.bin");
        assert_eq!(fs::read_link(&link).unwrap(), PathBuf::from("../a/fw.bin"));
        assert_eq!(read(&link), b"cross");
    }

    #[test]
    fn relative_to_walks_up_shared_prefixes() {
        let rel = |target: &str, dir: &str| relative_to(Path::new(target), Path::new(dir));
        assert_eq!(rel("rtlwifi/fw.bin", "rtlwifi"), PathBuf::from("fw.bin"));
        assert_eq!(rel("a/fw.bin", "b"), PathBuf::from("../a/fw.bin"));
        assert_eq!(rel("fw.bin", ""), PathBuf::from("fw.bin"));
        assert_eq!(rel("a/b/fw.bin", "a/c/d"), PathBuf::from("../../b/fw.bin"));
    }

    #[test]
    fn resolve_source_prefers_the_exact_path() {
        let source = TempDir::new().unwrap();
        put(source.path(), "fw.bin", b"plain");
        put(source.path(), "fw.bin.xz", b"not really xz");

        let (path, codec) = resolve_source(source.path(), "fw.bin").unwrap();
        assert_eq!(path, source.path().join("fw.bin"));
        assert_eq!(codec, Compression::None);

        assert!(resolve_source(source.path(), "absent.bin").is_none());
    }
}
