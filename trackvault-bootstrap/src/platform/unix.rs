// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Unix Platform Implementation
//!
//! POSIX implementation backing [`super::Platform`] on Linux and macOS.
//! Memory figures are read from `/proc/self/statm` and `/proc/meminfo` on
//! Linux (both present on every kernel in practice; absence is treated as
//! `NotSupported` rather than guessed at) and via `libc::sysconf` elsewhere.

use super::{Platform, PlatformError};
use async_trait::async_trait;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

pub struct UnixPlatform;

impl UnixPlatform {
    pub fn new() -> Self {
        Self
    }

    fn read_meminfo_kb(key: &str) -> Option<u64> {
        let contents = std::fs::read_to_string("/proc/meminfo").ok()?;
        contents.lines().find_map(|line| {
            let (name, rest) = line.split_once(':')?;
            if name != key {
                return None;
            }
            rest.split_whitespace().next()?.parse::<u64>().ok()
        })
    }
}

impl Default for UnixPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Platform for UnixPlatform {
    fn page_size(&self) -> usize {
        // SAFETY: sysconf(_SC_PAGESIZE) has no preconditions and never fails
        // in practice on a running process.
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if size > 0 {
            size as usize
        } else {
            4096
        }
    }

    fn cpu_count(&self) -> usize {
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    }

    fn total_memory(&self) -> Result<u64, PlatformError> {
        Self::read_meminfo_kb("MemTotal")
            .map(|kb| kb * 1024)
            .ok_or_else(|| PlatformError::NotSupported("/proc/meminfo MemTotal unavailable".to_string()))
    }

    fn available_memory(&self) -> Result<u64, PlatformError> {
        Self::read_meminfo_kb("MemAvailable")
            .map(|kb| kb * 1024)
            .ok_or_else(|| PlatformError::NotSupported("/proc/meminfo MemAvailable unavailable".to_string()))
    }

    fn line_separator(&self) -> &'static str {
        "\n"
    }

    fn path_separator(&self) -> char {
        ':'
    }

    fn platform_name(&self) -> &'static str {
        if cfg!(target_os = "macos") {
            "macos"
        } else {
            "linux"
        }
    }

    fn temp_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }

    fn is_elevated(&self) -> bool {
        // SAFETY: geteuid takes no arguments and cannot fail.
        unsafe { libc::geteuid() == 0 }
    }

    fn set_permissions(&self, path: &Path, mode: u32) -> Result<(), PlatformError> {
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))?;
        Ok(())
    }

    fn is_executable(&self, path: &Path) -> bool {
        std::fs::metadata(path)
            .map(|meta| meta.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    async fn sync_file(&self, file: &tokio::fs::File) -> Result<(), PlatformError> {
        file.sync_all().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_at_least_one_cpu() {
        let platform = UnixPlatform::new();
        assert!(platform.cpu_count() >= 1);
    }

    #[test]
    fn page_size_is_plausible() {
        let platform = UnixPlatform::new();
        let size = platform.page_size();
        assert!(size >= 512 && size <= 65536);
    }

    #[test]
    fn platform_constants() {
        let platform = UnixPlatform::new();
        assert_eq!(platform.line_separator(), "\n");
        assert_eq!(platform.path_separator(), ':');
    }
}
