//! Locating nginx access logs
//!
//! Candidates come from well-known install locations and from `access_log`
//! directives in nginx configuration files.

use regex::Regex;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, warn};

static ACCESS_LOG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"access_log\s+["']?([^\s;"']+)"#).expect("access_log regex is valid")
});

static SERVER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"server_name\s+([^\s;]+)").expect("server_name regex is valid")
});

const COMMON_LOG_FILES: &[&str] = &[
    "/var/log/nginx/access.log",
    "/var/log/nginx/access.log.1",
    "/usr/local/nginx/logs/access.log",
    "/opt/nginx/logs/access.log",
];

const COMMON_LOG_DIRS: &[&str] = &["/var/log/nginx"];

const NGINX_CONFIGS: &[&str] = &[
    "/etc/nginx/nginx.conf",
    "/usr/local/nginx/conf/nginx.conf",
    "/opt/nginx/conf/nginx.conf",
];

const SENSITIVE_FILES: &[&str] = &["/etc/shadow", "/etc/passwd", "/etc/sudoers"];

const TYPICAL_LOG_DIRS: &[&str] = &["/var/log", "/usr/local/nginx", "/opt/nginx", "/tmp"];

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DetectError {
    #[error("no nginx log files found")]
    NoLogFiles,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LogPathError {
    #[error("log file '{}' does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("cannot resolve '{path}': {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("access denied: '{}' is a sensitive system file", .0.display())]
    Sensitive(PathBuf),

    #[error("'{}' is a directory, not a log file", .0.display())]
    IsDirectory(PathBuf),
}

/// A discovered access log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    pub path: PathBuf,
    /// `server_name` of the block declaring this log, if any
    pub server_name: Option<String>,
    pub size: u64,
}

impl LogFile {
    fn is_rotated(&self) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                ext == "gz" || (!ext.is_empty() && ext.bytes().all(|b| b.is_ascii_digit()))
            })
    }

    fn is_access_log(&self) -> bool {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with("access.log"))
    }
}

/// Where to look for logs
#[derive(Debug, Clone)]
pub struct Detector {
    log_files: Vec<PathBuf>,
    log_dirs: Vec<PathBuf>,
    config_files: Vec<PathBuf>,
}

impl Default for Detector {
    fn default() -> Self {
        Self::with_roots(
            COMMON_LOG_FILES.iter().map(PathBuf::from).collect(),
            COMMON_LOG_DIRS.iter().map(PathBuf::from).collect(),
            NGINX_CONFIGS.iter().map(PathBuf::from).collect(),
        )
    }
}

impl Detector {
    /// Search explicit locations instead of the system defaults
    #[must_use]
    pub fn with_roots(
        log_files: Vec<PathBuf>,
        log_dirs: Vec<PathBuf>,
        config_files: Vec<PathBuf>,
    ) -> Self {
        Self {
            log_files,
            log_dirs,
            config_files,
        }
    }

    /// Every existing log file, well-known locations first
    pub fn detect(&self) -> Result<Vec<LogFile>, DetectError> {
        let mut candidates: Vec<(PathBuf, Option<String>)> = self
            .log_files
            .iter()
            .cloned()
            .map(|path| (path, None))
            .collect();

        for dir in &self.log_dirs {
            let mut logs = list_dir(dir, |name| name.ends_with(".log"));
            logs.sort();
            candidates.extend(logs.into_iter().map(|path| (path, None)));
        }

        for config in &self.config_files {
            if !config.is_file() {
                continue;
            }
            candidates.extend(parse_config(config));
            let Some(config_dir) = config.parent() else {
                continue;
            };
            let mut includes = list_dir(&config_dir.join("sites-enabled"), |_| true);
            includes.extend(list_dir(&config_dir.join("conf.d"), |name| {
                name.ends_with(".conf")
            }));
            includes.sort();
            for include in includes {
                candidates.extend(parse_config(&include));
            }
        }

        let mut seen = HashSet::new();
        let logs: Vec<LogFile> = candidates
            .into_iter()
            .filter_map(|(path, server_name)| {
                let metadata = std::fs::metadata(&path).ok()?;
                if !metadata.is_file() || !seen.insert(path.clone()) {
                    return None;
                }
                Some(LogFile {
                    path,
                    server_name,
                    size: metadata.len(),
                })
            })
            .collect();

        if logs.is_empty() {
            return Err(DetectError::NoLogFiles);
        }
        debug!("Detected {} nginx log files", logs.len());
        Ok(logs)
    }
}

/// Detect logs in the standard system locations
pub fn detect_log_files() -> Result<Vec<LogFile>, DetectError> {
    Detector::default().detect()
}

/// Prefer the live (non-rotated) access log, otherwise the largest file
#[must_use]
pub fn best_log_file(logs: &[LogFile]) -> Option<&LogFile> {
    logs.iter()
        .find(|log| log.is_access_log() && !log.is_rotated())
        .or_else(|| logs.iter().max_by_key(|log| log.size))
}

fn list_dir(dir: &Path, keep: impl Fn(&str) -> bool) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_str().is_some_and(&keep))
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect()
}

/// `access_log` targets of a config file, paired with the latest `server_name`
fn parse_config(path: &Path) -> Vec<(PathBuf, Option<String>)> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!("Failed to read nginx config {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let mut server_name = None;
    let mut logs = Vec::new();
    for line in contents.lines().map(str::trim) {
        if line.starts_with('#') {
            continue;
        }
        if let Some(caps) = SERVER_NAME.captures(line) {
            server_name = Some(caps[1].to_string());
        }
        if let Some(caps) = ACCESS_LOG.captures(line) {
            let target = &caps[1];
            if target == "off" || target.starts_with("syslog:") {
                continue;
            }
            logs.push((PathBuf::from(target), server_name.clone()));
        }
    }
    logs
}

/// Resolve a user supplied log path and refuse files that must not be read
///
/// Returns the canonical path. Files outside the usual log directories are
/// allowed but logged.
pub fn validate_log_path(path: &Path) -> Result<PathBuf, LogPathError> {
    let absolute = std::path::absolute(path).map_err(|source| LogPathError::Resolve {
        path: path.to_path_buf(),
        source,
    })?;
    let resolved = match absolute.canonicalize() {
        Ok(resolved) => resolved,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(LogPathError::NotFound(absolute));
        }
        Err(source) => {
            return Err(LogPathError::Resolve {
                path: absolute,
                source,
            });
        }
    };

    if is_sensitive(&absolute) || is_sensitive(&resolved) {
        return Err(LogPathError::Sensitive(resolved));
    }
    if resolved.is_dir() {
        return Err(LogPathError::IsDirectory(resolved));
    }

    let cwd = std::env::current_dir().ok();
    let typical = TYPICAL_LOG_DIRS
        .iter()
        .map(Path::new)
        .chain(cwd.as_deref())
        .any(|dir| resolved.starts_with(dir) || absolute.starts_with(dir));
    if !typical {
        warn!(
            "Reading log file from unusual location: {}",
            resolved.display()
        );
    }

    Ok(resolved)
}

fn is_sensitive(path: &Path) -> bool {
    SENSITIVE_FILES.iter().any(|file| path == Path::new(file))
        || path
            .components()
            .any(|c| matches!(c, Component::Normal(name) if name == ".ssh"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn log(path: &str, size: u64) -> LogFile {
        LogFile {
            path: PathBuf::from(path),
            server_name: None,
            size,
        }
    }

    #[test]
    fn test_best_prefers_live_access_log() {
        let logs = vec![
            log("/var/log/nginx/access.log.1", 900),
            log("/var/log/nginx/error.log", 5000),
            log("/var/log/nginx/access.log", 10),
        ];
        assert_eq!(
            best_log_file(&logs).unwrap().path,
            Path::new("/var/log/nginx/access.log")
        );
    }

    #[test]
    fn test_best_falls_back_to_largest() {
        let logs = vec![
            log("/var/log/nginx/access.log.1", 900),
            log("/var/log/nginx/site.log", 5000),
        ];
        assert_eq!(best_log_file(&logs).unwrap().size, 5000);
        assert!(best_log_file(&[]).is_none());
    }

    #[test]
    fn test_detect_files_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let access = dir.path().join("access.log");
        fs::write(&access, "x").unwrap();
        fs::write(dir.path().join("api.log"), "xyz").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("dir.log")).unwrap();

        let detector = Detector::with_roots(
            vec![access.clone(), dir.path().join("missing.log")],
            vec![dir.path().to_path_buf()],
            vec![],
        );
        let logs = detector.detect().unwrap();
        let paths: Vec<_> = logs.iter().map(|l| l.path.clone()).collect();
        assert_eq!(paths, vec![access, dir.path().join("api.log")]);
        assert_eq!(logs[1].size, 3);
    }

    #[test]
    fn test_detect_from_configs() {
        let dir = tempfile::tempdir().unwrap();
        let site_log = dir.path().join("site.access.log");
        let api_log = dir.path().join("api.log");
        fs::write(&site_log, "").unwrap();
        fs::write(&api_log, "").unwrap();

        let conf = dir.path().join("nginx.conf");
        fs::write(
            &conf,
            format!(
                "http {{\n  # access_log /commented/out.log;\n  access_log off;\n  access_log syslog:server=127.0.0.1;\n  server {{\n    server_name example.com;\n    access_log {} combined;\n  }}\n}}\n",
                site_log.display()
            ),
        )
        .unwrap();
        fs::create_dir(dir.path().join("conf.d")).unwrap();
        fs::write(
            dir.path().join("conf.d").join("api.conf"),
            format!(
                "server {{ server_name api.example.com; }}\naccess_log \"{}\";\n",
                api_log.display()
            ),
        )
        .unwrap();

        let detector = Detector::with_roots(vec![], vec![], vec![conf]);
        let logs = detector.detect().unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].path, site_log);
        assert_eq!(logs[0].server_name.as_deref(), Some("example.com"));
        assert_eq!(logs[1].path, api_log);
        assert_eq!(logs[1].server_name.as_deref(), Some("api.example.com"));
    }

    #[test]
    fn test_detect_dedupes() {
        let dir = tempfile::tempdir().unwrap();
        let access = dir.path().join("access.log");
        fs::write(&access, "").unwrap();
        let detector = Detector::with_roots(
            vec![access.clone(), access],
            vec![dir.path().to_path_buf()],
            vec![],
        );
        assert_eq!(detector.detect().unwrap().len(), 1);
    }

    #[test]
    fn test_detect_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let detector = Detector::with_roots(vec![], vec![dir.path().to_path_buf()], vec![]);
        assert!(matches!(detector.detect(), Err(DetectError::NoLogFiles)));
    }

    #[test]
    fn test_validate_accepts_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("access.log");
        fs::write(&path, "").unwrap();
        let resolved = validate_log_path(&path).unwrap();
        assert_eq!(resolved, path.canonicalize().unwrap());
    }

    #[test]
    fn test_validate_rejects() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            validate_log_path(&dir.path().join("missing.log")),
            Err(LogPathError::NotFound(_))
        ));
        assert!(matches!(
            validate_log_path(dir.path()),
            Err(LogPathError::IsDirectory(_))
        ));

        let ssh = dir.path().join(".ssh");
        fs::create_dir(&ssh).unwrap();
        fs::write(ssh.join("id_rsa"), "").unwrap();
        assert!(matches!(
            validate_log_path(&ssh.join("id_rsa")),
            Err(LogPathError::Sensitive(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_rejects_symlink_to_sensitive() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("innocent.log");
        std::os::unix::fs::symlink("/etc/passwd", &link).unwrap();
        assert!(matches!(
            validate_log_path(&link),
            Err(LogPathError::Sensitive(_))
        ));
    }

    #[test]
    fn test_is_sensitive() {
        assert!(is_sensitive(Path::new("/etc/shadow")));
        assert!(is_sensitive(Path::new("/home/alice/.ssh/authorized_keys")));
        assert!(!is_sensitive(Path::new("/etc/shadow.log")));
        assert!(!is_sensitive(Path::new("/var/log/nginx/access.log")));
    }
}
