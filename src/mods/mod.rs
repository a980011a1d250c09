use std::cmp::Ordering;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use flate2::read::GzDecoder;
use futures_util::StreamExt;
use log::{debug, info, warn};
use reqwest::Client;
use sha2::{Digest, Sha256};
use tar::Archive;
use tokio::io::AsyncWriteExt;
use zip::read::ZipArchive;

use crate::engine::models::ModInfo;
use crate::env;
use crate::util::{TransferMeter, format_size};

pub mod version;

use self::version::{compare_versions, normalize_version};

/// Version reported when no mod is installed yet.
const MISSING_VERSION: &str = "0.0.0";
const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct ModService {
    client: Client,
    reference_version: String,
    expected_sha256: Option<String>,
}

impl ModService {
    pub fn new(reference_version: impl Into<String>, expected_sha256: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30 * 60))
            .build()
            .unwrap_or_else(|err| {
                warn!(
                    "mods: failed to build HTTP client ({}); using default configuration",
                    err
                );
                Client::new()
            });
        Self {
            client,
            reference_version: normalize_version(&reference_version.into()),
            expected_sha256,
        }
    }

    /// Compare the installed mod version against the reference version.
    pub async fn installed_info(&self, install_dir: &Path) -> Result<ModInfo, String> {
        let mod_dir = env::mod_dir(install_dir);
        let version_file = env::mod_version_file(install_dir);
        let installed = match tokio::fs::read_to_string(&version_file).await {
            Ok(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    MISSING_VERSION.to_owned()
                } else {
                    trimmed.to_owned()
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("mods: no version file at {}", version_file.display());
                return Ok(ModInfo {
                    version: MISSING_VERSION.to_owned(),
                    path: mod_dir.display().to_string(),
                    needs_update: true,
                });
            }
            Err(err) => {
                warn!(
                    "mods: unreadable version file {} ({err}); treating as {MISSING_VERSION}",
                    version_file.display()
                );
                MISSING_VERSION.to_owned()
            }
        };

        let needs_update = compare_versions(&installed, &self.reference_version) == Ordering::Less;
        debug!(
            "mods: installed={} reference={} needs_update={}",
            installed, self.reference_version, needs_update
        );
        Ok(ModInfo {
            version: installed,
            path: mod_dir.display().to_string(),
            needs_update,
        })
    }

    /// Download the mod package from `url` and unpack it into the install directory.
    pub async fn install_package(&self, install_dir: &Path, url: &str) -> Result<(), String> {
        if !install_dir.is_dir() {
            return Err(format!(
                "install directory {} does not exist",
                install_dir.display()
            ));
        }
        let staging =
            tempfile::tempdir().map_err(|e| format!("failed to create temp directory: {e}"))?;
        let kind = guess_archive_kind(url);
        let archive_path = staging.path().join(format!("mod{}", kind.extension()));

        info!("mods: downloading {} to {}", url, archive_path.display());
        self.download_file(url, &archive_path).await?;

        if let Some(expected) = self.expected_sha256.clone() {
            let path = archive_path.clone();
            run_blocking(move || verify_sha256(&path, &expected)).await?;
        }

        let target = install_dir.to_path_buf();
        let source = archive_path.clone();
        run_blocking(move || extract_archive(&source, &target, kind)).await?;
        info!("mods: package installed into {}", install_dir.display());
        Ok(())
    }

    async fn download_file(&self, url: &str, dest: &Path) -> Result<(), String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("mod download failed: {e}"))?
            .error_for_status()
            .map_err(|e| format!("mod download status error: {e}"))?;
        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| format!("failed to create mod file: {e}"))?;
        let mut meter = TransferMeter::new(resp.content_length(), PROGRESS_INTERVAL);
        let mut stream = resp.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| format!("mod stream error: {e}"))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| format!("mod write error: {e}"))?;
            if let Some(line) = meter.record(chunk.len()) {
                debug!("mods: {line}");
            }
        }

        file.flush()
            .await
            .map_err(|e| format!("mod flush error: {e}"))?;
        if let Some(missing) = meter.shortfall() {
            return Err(format!(
                "mod download incomplete: {} bytes missing after {}",
                missing,
                format_size(meter.received())
            ));
        }
        Ok(())
    }
}

async fn run_blocking<F>(job: F) -> Result<(), String>
where
    F: FnOnce() -> Result<(), String> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| format!("mod install task failed: {e}"))?
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ArchiveKind {
    Zip,
    TarGz,
}

impl ArchiveKind {
    fn extension(self) -> &'static str {
        match self {
            ArchiveKind::Zip => ".zip",
            ArchiveKind::TarGz => ".tar.gz",
        }
    }
}

fn guess_archive_kind(url: &str) -> ArchiveKind {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    if path.ends_with(".tar.gz") || path.ends_with(".tgz") {
        ArchiveKind::TarGz
    } else {
        ArchiveKind::Zip
    }
}

fn verify_sha256(path: &Path, expected: &str) -> Result<(), String> {
    let mut file = fs::File::open(path).map_err(|e| format!("checksum open error: {e}"))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let read = file
            .read(&mut buf)
            .map_err(|e| format!("checksum read error: {e}"))?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    let actual = format!("{:x}", hasher.finalize());
    if actual != expected.trim().to_lowercase() {
        return Err(format!(
            "checksum mismatch: expected {expected}, got {actual}"
        ));
    }
    Ok(())
}

fn extract_archive(archive_path: &Path, dest: &Path, kind: ArchiveKind) -> Result<(), String> {
    info!("mods: extracting {} as {:?}", archive_path.display(), kind);
    match kind {
        ArchiveKind::Zip => extract_zip(archive_path, dest),
        ArchiveKind::TarGz => extract_targz(archive_path, dest),
    }
}

fn extract_targz(archive_path: &Path, dest: &Path) -> Result<(), String> {
    let file = fs::File::open(archive_path).map_err(|e| format!("tar.gz open error: {e}"))?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive
        .unpack(dest)
        .map_err(|e| format!("tar.gz extract error: {e}"))
}

fn extract_zip(archive_path: &Path, dest: &Path) -> Result<(), String> {
    let file = fs::File::open(archive_path).map_err(|e| format!("zip open error: {e}"))?;
    let mut archive = ZipArchive::new(file).map_err(|e| format!("zip parse error: {e}"))?;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| format!("zip entry error: {e}"))?;
        let Some(relative) = entry.enclosed_name().map(PathBuf::from) else {
            warn!("mods: skipping unsafe zip entry {}", entry.name());
            continue;
        };
        let out_path = dest.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| format!("zip dir create error: {e}"))?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("zip parent dir error: {e}"))?;
        }
        let mut out_file =
            fs::File::create(&out_path).map_err(|e| format!("zip create file error: {e}"))?;
        io::copy(&mut entry, &mut out_file).map_err(|e| format!("zip write error: {e}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        for (name, body) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(body).unwrap();
        }
        writer.finish().unwrap();
    }

    #[tokio::test]
    async fn missing_version_file_needs_update() {
        let dir = tempfile::tempdir().unwrap();
        let service = ModService::new("1.0.0", None);
        let info = service.installed_info(dir.path()).await.unwrap();
        assert_eq!(info.version, "0.0.0");
        assert!(info.needs_update);
        assert!(info.path.ends_with("modpack"));
    }

    #[tokio::test]
    async fn compares_installed_version_with_reference() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(env::mod_dir(dir.path())).unwrap();
        fs::write(env::mod_version_file(dir.path()), "1.2.0\n").unwrap();

        let current = ModService::new("1.2.0", None);
        let info = current.installed_info(dir.path()).await.unwrap();
        assert_eq!(info.version, "1.2.0");
        assert!(!info.needs_update);

        let newer = ModService::new("v1.3", None);
        assert!(newer.installed_info(dir.path()).await.unwrap().needs_update);
    }

    #[test]
    fn extracts_zip_entries_into_destination() {
        let staging = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        let archive = staging.path().join("mod.zip");
        write_zip(
            &archive,
            &[
                ("modpack/version.txt", b"2.0.0"),
                ("modpack/data/cars.ide", b"ide"),
            ],
        );

        extract_archive(&archive, dest.path(), ArchiveKind::Zip).unwrap();

        let version = fs::read_to_string(env::mod_version_file(dest.path())).unwrap();
        assert_eq!(version, "2.0.0");
        assert!(dest.path().join("modpack/data/cars.ide").exists());
    }

    #[test]
    fn guesses_archive_kind_from_url() {
        assert_eq!(guess_archive_kind("https://x/mod.zip"), ArchiveKind::Zip);
        assert_eq!(
            guess_archive_kind("https://x/mod.tar.gz?token=1"),
            ArchiveKind::TarGz
        );
        assert_eq!(guess_archive_kind("https://x/download"), ArchiveKind::Zip);
    }

    #[test]
    fn checksum_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob");
        fs::write(&path, b"abc").unwrap();
        let abc = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
        assert!(verify_sha256(&path, abc).is_ok());
        assert!(verify_sha256(&path, &abc.to_uppercase()).is_ok());
        assert!(verify_sha256(&path, "00").is_err());
    }

    #[tokio::test]
    async fn install_rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let service = ModService::new("1.0.0", None);
        let err = service
            .install_package(&dir.path().join("absent"), "http://127.0.0.1:9/mod.zip")
            .await
            .unwrap_err();
        assert!(err.contains("does not exist"), "{err}");
    }
}
