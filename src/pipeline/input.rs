//! Input resolution: validate a user-supplied local PDF path.
//!
//! The rest of the pipeline assumes an existing, readable PDF. Validating
//! the `%PDF` magic bytes up front gives callers a meaningful error rather
//! than a parser crash deeper in.

use crate::error::Pdf2MarpError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate that `path` exists, is readable, and starts with `%PDF`.
pub fn resolve_input(path: &Path) -> Result<PathBuf, Pdf2MarpError> {
    if !path.exists() {
        return Err(Pdf2MarpError::NotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(Pdf2MarpError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2MarpError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(Pdf2MarpError::NotFound {
                path: path.to_path_buf(),
            });
        }
    }

    debug!("Resolved input PDF: {}", path.display());
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_not_found() {
        let err = resolve_input(Path::new("/no/such/file.pdf")).unwrap_err();
        assert!(matches!(err, Pdf2MarpError::NotFound { .. }));
    }

    #[test]
    fn non_pdf_magic_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"GIF89a not a pdf")
            .unwrap();
        let err = resolve_input(&path).unwrap_err();
        assert!(matches!(err, Pdf2MarpError::NotAPdf { .. }));
    }

    #[test]
    fn pdf_magic_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.pdf");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"%PDF-1.5\n%")
            .unwrap();
        assert_eq!(resolve_input(&path).unwrap(), path);
    }
}
