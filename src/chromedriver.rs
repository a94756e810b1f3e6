//! Finds the local Chrome install and keeps a matching chromedriver in the
//! user's data directory, downloading it from Chrome for Testing when needed.

use log::info;
use std::env;
use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use zip::ZipArchive;

use crate::error::DriverError;

const APP_DIR: &str = "daraz-scrape";
const CFT_LATEST_RELEASE: &str = "https://googlechromelabs.github.io/chrome-for-testing/LATEST_RELEASE_";
const CFT_DOWNLOADS: &str = "https://storage.googleapis.com/chrome-for-testing-public";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux64,
    MacX64,
    MacArm64,
    Win64,
}

impl Platform {
    pub fn current() -> Result<Self, DriverError> {
        match (env::consts::OS, env::consts::ARCH) {
            ("linux", _) => Ok(Platform::Linux64),
            ("macos", "aarch64") => Ok(Platform::MacArm64),
            ("macos", _) => Ok(Platform::MacX64),
            ("windows", _) => Ok(Platform::Win64),
            (os, _) => Err(DriverError::UnsupportedOs(os.to_string())),
        }
    }

    /// Platform name as used in Chrome for Testing download paths.
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Linux64 => "linux64",
            Platform::MacX64 => "mac-x64",
            Platform::MacArm64 => "mac-arm64",
            Platform::Win64 => "win64",
        }
    }

    pub fn driver_filename(self) -> &'static str {
        match self {
            Platform::Win64 => "chromedriver.exe",
            _ => "chromedriver",
        }
    }

    pub fn download_url(self, driver_version: &str) -> String {
        format!(
            "{}/{}/{}/chromedriver-{}.zip",
            CFT_DOWNLOADS,
            driver_version,
            self.as_str(),
            self.as_str()
        )
    }
}

pub fn driver_dir() -> Result<PathBuf, DriverError> {
    Ok(dirs::data_local_dir()
        .ok_or(DriverError::NoDataDir)?
        .join(APP_DIR)
        .join("chromedriver"))
}

/// Returns the path of a chromedriver whose major version matches the
/// installed Chrome, downloading one if the cached copy is missing or stale.
pub async fn ensure_chromedriver() -> Result<PathBuf, DriverError> {
    let platform = Platform::current()?;
    let dir = driver_dir()?;
    fs::create_dir_all(&dir)?;

    let chrome_version = chrome_version()?;
    let major = major_version(&chrome_version);
    info!("Detected Chrome version: {}", chrome_version);

    let driver_path = dir.join(platform.driver_filename());
    if driver_path.exists() {
        match existing_driver_version(&driver_path) {
            Ok(existing) if major_version(&existing) == major => {
                info!("Compatible chromedriver {} already present", existing);
                return Ok(driver_path);
            }
            Ok(existing) => info!(
                "Cached chromedriver {} does not match Chrome {}",
                existing, chrome_version
            ),
            Err(e) => info!("Cached chromedriver unusable: {}", e),
        }
    }

    download_chromedriver(&driver_path, major, platform).await?;
    Ok(driver_path)
}

async fn download_chromedriver(
    driver_path: &Path,
    major: &str,
    platform: Platform,
) -> Result<(), DriverError> {
    let client = reqwest::Client::new();

    let driver_version = client
        .get(format!("{}{}", CFT_LATEST_RELEASE, major))
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?
        .trim()
        .to_string();
    info!("Downloading chromedriver {}", driver_version);

    let bytes = client
        .get(platform.download_url(&driver_version))
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    let contents = extract_driver(&bytes, platform.driver_filename())?;
    fs::write(driver_path, contents)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(driver_path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(driver_path, perms)?;
    }

    info!("Chromedriver saved to {:?}", driver_path);
    Ok(())
}

/// Reads the driver binary out of a Chrome for Testing zip, where it sits
/// under a `chromedriver-<platform>/` folder.
fn extract_driver(zip_bytes: &[u8], filename: &str) -> Result<Vec<u8>, DriverError> {
    let mut archive = ZipArchive::new(Cursor::new(zip_bytes))?;
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let is_driver = file
            .name()
            .rsplit('/')
            .next()
            .is_some_and(|name| name == filename);
        if is_driver {
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            return Ok(contents);
        }
    }
    Err(DriverError::Archive(zip::result::ZipError::FileNotFound))
}

fn existing_driver_version(driver_path: &Path) -> Result<String, DriverError> {
    let output = Command::new(driver_path).arg("--version").output()?;
    let text = String::from_utf8_lossy(&output.stdout);
    parse_version(&text).ok_or_else(|| DriverError::Version(text.to_string()))
}

pub fn find_chrome_executable() -> Result<PathBuf, DriverError> {
    let candidates: Vec<PathBuf> = match env::consts::OS {
        "windows" => {
            let mut paths = vec![
                PathBuf::from(r"C:\Program Files\Google\Chrome\Application\chrome.exe"),
                PathBuf::from(r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe"),
            ];
            if let Some(local) = dirs::data_local_dir() {
                paths.push(local.join(r"Google\Chrome\Application\chrome.exe"));
            }
            paths
        }
        "macos" => vec![PathBuf::from(
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        )],
        "linux" => [
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
        ]
        .iter()
        .map(PathBuf::from)
        .collect(),
        os => return Err(DriverError::UnsupportedOs(os.to_string())),
    };

    if let Some(found) = candidates.into_iter().find(|p| p.exists()) {
        return Ok(found);
    }

    let (lookup, name) = if cfg!(windows) {
        ("where", "chrome.exe")
    } else {
        ("which", "google-chrome")
    };
    if let Ok(output) = Command::new(lookup).arg(name).output() {
        let path = String::from_utf8_lossy(&output.stdout);
        if let Some(first) = path.lines().next().map(str::trim).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(first));
        }
    }

    Err(DriverError::ChromeNotFound)
}

pub fn chrome_version() -> Result<String, DriverError> {
    #[cfg(target_os = "windows")]
    {
        if let Ok(output) = Command::new("reg")
            .args([
                "query",
                r"HKEY_CURRENT_USER\Software\Google\Chrome\BLBeacon",
                "/v",
                "version",
            ])
            .output()
        {
            if output.status.success() {
                let text = String::from_utf8_lossy(&output.stdout);
                if let Some(version) = text
                    .lines()
                    .find_map(|line| line.split("REG_SZ").nth(1))
                    .map(str::trim)
                {
                    return Ok(version.to_string());
                }
            }
        }
    }

    let chrome = find_chrome_executable()?;
    info!("Found Chrome at {:?}", chrome);

    let output = Command::new(&chrome).arg("--version").output()?;
    let text = String::from_utf8_lossy(&output.stdout);
    parse_version(&text).ok_or_else(|| DriverError::Version(text.to_string()))
}

/// First dotted numeric token, e.g. `120.0.6099.109` out of
/// `Google Chrome 120.0.6099.109` or `ChromeDriver 120.0.6099.109 (abc)`.
pub fn parse_version(output: &str) -> Option<String> {
    output
        .split_whitespace()
        .find(|token| {
            token.contains('.')
                && token.starts_with(|c: char| c.is_ascii_digit())
                && token.chars().all(|c| c.is_ascii_digit() || c == '.')
        })
        .map(str::to_string)
}

pub fn major_version(version: &str) -> &str {
    version.split('.').next().unwrap_or(version)
}
