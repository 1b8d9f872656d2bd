//! Small path helpers shared by the watcher and the state machine.

use std::path::Path;

/// Whether `path` names a PDF, judged by its extension.
///
/// The comparison ignores case because scanners commonly emit `.PDF`.
///
/// # Examples
///
/// ```
/// use pdfcollate::utils::is_pdf;
/// use std::path::Path;
///
/// assert!(is_pdf(Path::new("/files/scan.pdf")));
/// assert!(is_pdf(Path::new("/files/SCAN.PDF")));
/// assert!(!is_pdf(Path::new("/files/scan.pdf.part")));
/// ```
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}
