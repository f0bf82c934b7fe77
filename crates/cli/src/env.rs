// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the reef binary.

use std::path::PathBuf;
use std::time::Duration;

/// Temp root for extraction directories and transient report files:
/// `REEF_TEMP_DIR` > `<system temp>/reef`.
pub fn temp_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("REEF_TEMP_DIR") {
        return PathBuf::from(dir);
    }
    std::env::temp_dir().join("reef")
}

/// Artifact store root: `REEF_STORAGE_DIR` > `XDG_DATA_HOME/reef` >
/// `~/.local/share/reef`. `None` when no home is resolvable.
pub fn storage_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("REEF_STORAGE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return Some(PathBuf::from(xdg).join("reef"));
    }
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".local/share/reef"))
}

/// Versions table override file.
pub fn versions_file() -> Option<PathBuf> {
    std::env::var("REEF_VERSIONS_FILE").ok().map(PathBuf::from)
}

/// HTTP timeout for downloads and the upstream post.
pub fn http_timeout() -> Duration {
    std::env::var("REEF_HTTP_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(30))
}

/// Capacity of the channels linking pipeline stages.
pub fn channel_capacity() -> usize {
    std::env::var("REEF_CHANNEL_CAPACITY")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(reef_engine::DEFAULT_CHANNEL_CAPACITY)
}
