//! Serialize a [`ReleaseNoteDocument`] to text
//!
//! ```text
//! ## Alpha
//! - 2.4.0
//! - Bug #10: Crash on save
//! - Feature #20: Export to CSV
//!
//! ```

use crate::core::error::{NotesResult, ResultExt};
use crate::notes::assembler::ReleaseNoteDocument;
use crate::utils::capitalize_first;
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// UTF-8 byte-order mark written at the start of the file
pub const BOM: &str = "\u{feff}";

/// Render the document body (without BOM)
pub fn render_to_string(document: &ReleaseNoteDocument) -> String {
  let mut out = String::new();

  for section in &document.sections {
    let _ = writeln!(out, "## {}", capitalize_first(&section.name));
    let _ = writeln!(out, "- {}", section.version);
    for issue in &section.issues {
      let _ = writeln!(out, "- {}", issue.summary());
    }
    out.push('\n');
  }

  out
}

/// Replace `path` with the rendered document, BOM first
///
/// The text goes to a temporary file in the same directory which is then
/// renamed over the target, so readers never observe a partial file.
pub fn write_document(document: &ReleaseNoteDocument, path: &Path) -> NotesResult<()> {
  let dir = match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent,
    _ => Path::new("."),
  };

  let mut file =
    NamedTempFile::new_in(dir).with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;

  file
    .write_all(BOM.as_bytes())
    .and_then(|_| file.write_all(render_to_string(document).as_bytes()))
    .and_then(|_| file.flush())
    .with_context(|| format!("Failed to write release notes to {}", path.display()))?;

  file
    .persist(path)
    .with_context(|| format!("Failed to replace {}", path.display()))?;

  Ok(())
}
