//! Entry points for callers that just want "scan" and "restore".

use crate::control::Shell;
use crate::enumerator::{try_enumerate, ScanOptions};
use crate::errors::LayoutError;
use crate::layout::LayoutSet;
use crate::restorer::{restore, RestoreOutcome};

/// Locate the icon list and capture every icon.
///
/// Unlike [`crate::enumerator::enumerate`] this reports why nothing was
/// captured, so an empty desktop can be told apart from a missing one.
pub fn scan<S: Shell>(shell: &S, options: &ScanOptions) -> Result<LayoutSet, LayoutError> {
    let handle = shell.locate().ok_or(LayoutError::LocatorNotFound)?;
    try_enumerate(shell, &handle, options)
}

pub fn restore_layout<S: Shell>(
    shell: &S,
    saved: &LayoutSet,
    options: &ScanOptions,
) -> RestoreOutcome {
    match shell.locate() {
        Some(handle) => restore(shell, &handle, saved, options),
        None => {
            tracing::info!("desktop icon list not found; nothing restored");
            RestoreOutcome::TotalFailure(LayoutError::LocatorNotFound)
        }
    }
}

#[cfg(windows)]
pub fn scan_desktop(options: &ScanOptions) -> Result<LayoutSet, LayoutError> {
    scan(&crate::win32::Win32Shell, options)
}

#[cfg(not(windows))]
pub fn scan_desktop(_options: &ScanOptions) -> Result<LayoutSet, LayoutError> {
    Err(LayoutError::LocatorNotFound)
}

#[cfg(windows)]
pub fn restore_desktop(saved: &LayoutSet, options: &ScanOptions) -> RestoreOutcome {
    restore_layout(&crate::win32::Win32Shell, saved, options)
}

#[cfg(not(windows))]
pub fn restore_desktop(_saved: &LayoutSet, _options: &ScanOptions) -> RestoreOutcome {
    RestoreOutcome::TotalFailure(LayoutError::LocatorNotFound)
}
