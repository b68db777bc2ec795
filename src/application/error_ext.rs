//! Error conversion helpers for common I/O operations
//!
//! Provides extension traits for cleaner error handling with path context.

use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    ///
    /// # Example
    /// ```ignore
    /// fs.read_to_string(&roster_path)
    ///     .with_path_context("read roster", &roster_path)?;
    /// ```
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ApplicationError::RosterNotFound(path.to_path_buf()),
            _ => ApplicationError::OperationFailed {
                context: format!("{}: {}", action, path.display()),
                source: Box::new(e),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_not_found_maps_to_roster_not_found() {
        let res: io::Result<()> = Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let err = res.with_path_context("read roster", Path::new("army.txt")).unwrap_err();
        assert!(matches!(err, ApplicationError::RosterNotFound(p) if p == PathBuf::from("army.txt")));
    }

    #[test]
    fn test_other_errors_keep_context() {
        let res: io::Result<()> = Err(io::Error::new(io::ErrorKind::PermissionDenied, "nope"));
        let err = res.with_path_context("read roster", Path::new("army.txt")).unwrap_err();
        assert_eq!(err.to_string(), "operation failed: read roster: army.txt");
    }
}
