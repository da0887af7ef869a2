//! Binding the pdfium library.
//!
//! pdfium is a native library; the crate needs it twice per run (reading
//! invoice text, painting the plan). [`bind_engine`] finds it in this order:
//!
//! 1. `PDFIUM_LIB_PATH`, when it names an existing file;
//! 2. the per-version cache, `<cache_dir>/zahlungsplan/pdfium-<VERSION>/`
//!    (base directory overridable with `PDFIUM_AUTO_CACHE_DIR`);
//! 3. a library installed system-wide;
//! 4. a one-time download of the platform archive from
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries),
//!    extracted into the cache. Skipped when downloads are not allowed.

use crate::error::PlanError;
use flate2::read::GzDecoder;
use pdfium_render::prelude::Pdfium;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tar::Archive;
use tracing::{debug, info, warn};

/// pdfium-binaries release tag (`chromium/<VERSION>`).
pub const PDFIUM_VERSION: &str = "7690";

const RELEASE_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";
const LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";
const CACHE_DIR_ENV: &str = "PDFIUM_AUTO_CACHE_DIR";

/// Progress callback: `(bytes_downloaded, total_bytes)`.
pub type DownloadProgress<'a> = &'a dyn Fn(u64, Option<u64>);

struct Platform {
    archive: &'static str,
    member: &'static str,
    lib_name: &'static str,
}

const fn platform(archive: &'static str, member: &'static str, lib_name: &'static str) -> Platform {
    Platform {
        archive,
        member,
        lib_name,
    }
}

fn current_platform() -> Result<Platform, PlanError> {
    let (os, arch) = (std::env::consts::OS, std::env::consts::ARCH);
    let so = "lib/libpdfium.so";
    let dylib = "lib/libpdfium.dylib";
    let dll = "bin/pdfium.dll";
    match (os, arch) {
        ("linux", "x86_64") => Ok(platform("pdfium-linux-x64.tgz", so, "libpdfium.so")),
        ("linux", "aarch64") => Ok(platform("pdfium-linux-arm64.tgz", so, "libpdfium.so")),
        ("macos", "x86_64") => Ok(platform("pdfium-mac-x64.tgz", dylib, "libpdfium.dylib")),
        ("macos", "aarch64") => Ok(platform("pdfium-mac-arm64.tgz", dylib, "libpdfium.dylib")),
        ("windows", "x86_64") => Ok(platform("pdfium-win-x64.tgz", dll, "pdfium.dll")),
        ("windows", "aarch64") => Ok(platform("pdfium-win-arm64.tgz", dll, "pdfium.dll")),
        ("windows", "x86") => Ok(platform("pdfium-win-x86.tgz", dll, "pdfium.dll")),
        _ => Err(PlanError::EngineUnavailable(format!(
            "no prebuilt pdfium for {os}/{arch}"
        ))),
    }
}

/// Directory holding the cached library for [`PDFIUM_VERSION`].
pub fn engine_cache_dir() -> PathBuf {
    let versioned = format!("pdfium-{PDFIUM_VERSION}");
    if let Ok(base) = std::env::var(CACHE_DIR_ENV) {
        return PathBuf::from(base).join(versioned);
    }
    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir)
        .join("zahlungsplan")
        .join(versioned)
}

fn env_library() -> Option<PathBuf> {
    let path = PathBuf::from(std::env::var_os(LIB_PATH_ENV)?);
    if path.exists() {
        Some(path)
    } else {
        warn!("{} '{}' does not exist; ignoring", LIB_PATH_ENV, path.display());
        None
    }
}

fn cached_library() -> Option<PathBuf> {
    let p = engine_cache_dir().join(current_platform().ok()?.lib_name);
    p.exists().then_some(p)
}

/// True when no download is needed to bind pdfium from a local file.
pub fn is_engine_cached() -> bool {
    env_library().is_some() || cached_library().is_some()
}

/// True when [`bind_engine`] would have to download pdfium: no local copy
/// and no system library.
pub fn needs_download() -> bool {
    download_required(is_engine_cached(), || {
        Pdfium::bind_to_system_library().is_ok()
    })
}

fn download_required(cached: bool, system_available: impl FnOnce() -> bool) -> bool {
    !cached && !system_available()
}

static RESOLVED: OnceLock<PathBuf> = OnceLock::new();

/// Path to a local pdfium library, downloading it into the cache if needed.
pub fn ensure_engine_library(on_progress: Option<DownloadProgress<'_>>) -> Result<PathBuf, PlanError> {
    if let Some(p) = RESOLVED.get() {
        return Ok(p.clone());
    }
    let path = match env_library().or_else(cached_library) {
        Some(p) => p,
        None => download_library(on_progress)?,
    };
    let _ = RESOLVED.set(path.clone());
    Ok(path)
}

/// Bind pdfium from an explicit library file.
pub fn bind_engine_from_path(path: &Path) -> Result<Pdfium, PlanError> {
    let bindings = Pdfium::bind_to_library(path).map_err(|e| {
        PlanError::EngineUnavailable(format!("'{}': {e}", path.display()))
    })?;
    debug!("Bound pdfium from {}", path.display());
    Ok(Pdfium::new(bindings))
}

/// Bind pdfium, trying local copies first and downloading only when
/// `allow_download` is set.
pub fn bind_engine(
    allow_download: bool,
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<Pdfium, PlanError> {
    if let Some(path) = RESOLVED.get().cloned().or_else(env_library).or_else(cached_library) {
        return bind_engine_from_path(&path);
    }

    match Pdfium::bind_to_system_library() {
        Ok(bindings) => {
            debug!("Bound system pdfium library");
            return Ok(Pdfium::new(bindings));
        }
        Err(e) => debug!("No system pdfium: {e}"),
    }

    if !allow_download {
        return Err(PlanError::EngineUnavailable(
            "no local copy found and downloading is disabled".into(),
        ));
    }
    let path = ensure_engine_library(on_progress)?;
    bind_engine_from_path(&path)
}

fn download_library(on_progress: Option<DownloadProgress<'_>>) -> Result<PathBuf, PlanError> {
    let platform = current_platform()?;
    let dir = engine_cache_dir();
    let target = dir.join(platform.lib_name);
    let url = format!("{RELEASE_URL}/chromium%2F{PDFIUM_VERSION}/{}", platform.archive);

    info!("Downloading pdfium {} from {}", PDFIUM_VERSION, url);
    std::fs::create_dir_all(&dir).map_err(|e| {
        PlanError::EngineUnavailable(format!("cannot create cache '{}': {e}", dir.display()))
    })?;

    let archive = fetch(&url, on_progress)?;
    unpack_member(&archive, platform.member, &target)?;
    info!("pdfium cached at {}", target.display());
    Ok(target)
}

fn fetch(url: &str, on_progress: Option<DownloadProgress<'_>>) -> Result<Vec<u8>, PlanError> {
    let failed = |reason: String| PlanError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("zahlungsplan/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let mut response = client.get(url).send().map_err(|e| failed(e.to_string()))?;
    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let total = response.content_length();
    let mut buf = Vec::with_capacity(total.unwrap_or(32 << 20) as usize);
    let mut chunk = vec![0u8; 64 << 10];
    loop {
        match response.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if let Some(cb) = on_progress {
                    cb(buf.len() as u64, total);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(failed(e.to_string())),
        }
    }
    Ok(buf)
}

/// Extract the single archive member `member` of a `.tgz` to `dest`.
fn unpack_member(archive: &[u8], member: &str, dest: &Path) -> Result<(), PlanError> {
    let broken = |detail: String| PlanError::EngineUnavailable(format!("bad pdfium archive: {detail}"));

    let mut tar = Archive::new(GzDecoder::new(archive));
    for entry in tar.entries().map_err(|e| broken(e.to_string()))? {
        let mut entry = entry.map_err(|e| broken(e.to_string()))?;
        let is_member = entry
            .path()
            .map(|p| p.to_string_lossy() == member)
            .map_err(|e| broken(e.to_string()))?;
        if is_member {
            entry.unpack(dest).map_err(|e| broken(e.to_string()))?;
            return Ok(());
        }
    }
    Err(broken(format!("'{member}' missing")))
}
