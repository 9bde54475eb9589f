//! Path utilities for VPK archives
//!
//! VPK directory trees store forward-slash separated, case-sensitive paths.
//! This module normalizes caller-supplied paths for lookup and storage.

/// Normalize a path for storage in a VPK archive
///
/// Converts backslashes to forward slashes to match VPK conventions.
///
/// # Examples
///
/// ```
/// use source_vpk::path::normalize_vpk_path;
///
/// assert_eq!(normalize_vpk_path("particles\\fire.pcf"), "particles/fire.pcf");
/// assert_eq!(normalize_vpk_path("particles/fire.pcf"), "particles/fire.pcf");
/// ```
pub fn normalize_vpk_path(path: &str) -> String {
    path.replace('\\', "/")
}
