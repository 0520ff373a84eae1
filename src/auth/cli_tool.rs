//! Locating the Salesforce CLI and building its argument vectors.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use super::error::AuthError;

/// Executables searched for on `PATH`, in preference order.
const CANDIDATES: &[&str] = &["sf.cmd", "sf", "sfdx.cmd", "sfdx"];

/// Which generation of the CLI was found; they take different arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliFlavor {
    Sf,
    Sfdx,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SfCli {
    pub program: PathBuf,
    pub flavor: CliFlavor,
}

impl SfCli {
    pub fn new(program: impl Into<PathBuf>, flavor: CliFlavor) -> Self {
        Self {
            program: program.into(),
            flavor,
        }
    }

    /// Find the first supported CLI on the process `PATH`.
    pub fn discover() -> Result<Self, AuthError> {
        let path_var = std::env::var_os("PATH").unwrap_or_default();
        Self::discover_in(&path_var)
    }

    pub fn discover_in(path_var: &OsStr) -> Result<Self, AuthError> {
        let dirs: Vec<PathBuf> = std::env::split_paths(path_var).collect();
        for name in CANDIDATES {
            if let Some(found) = dirs.iter().map(|d| d.join(name)).find(|p| is_executable(p)) {
                let flavor = if name.starts_with("sfdx") {
                    CliFlavor::Sfdx
                } else {
                    CliFlavor::Sf
                };
                tracing::debug!("Using Salesforce CLI at {}", found.display());
                return Ok(Self::new(found, flavor));
            }
        }
        Err(AuthError::CliNotFound)
    }

    pub fn display_args(&self, alias: &str) -> Vec<String> {
        let args: &[&str] = match self.flavor {
            CliFlavor::Sf => &["org", "display", "--json", "--target-org", alias],
            CliFlavor::Sfdx => &["force:org:display", "--json", "-u", alias],
        };
        args.iter().map(|s| s.to_string()).collect()
    }

    pub fn login_args(&self, alias: &str, login_url: Option<&str>) -> Vec<String> {
        let (base, url_flag): (&[&str], &str) = match self.flavor {
            CliFlavor::Sf => (&["org", "login", "web", "--alias", alias], "--instance-url"),
            CliFlavor::Sfdx => (&["force:auth:web:login", "-a", alias], "-r"),
        };
        let mut args: Vec<String> = base.iter().map(|s| s.to_string()).collect();
        if let Some(url) = login_url {
            args.push(url_flag.to_string());
            args.push(url.to_string());
        }
        args
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
