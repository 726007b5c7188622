//! Small string and path helpers shared by the pipeline

use std::path::Path;

/// Check if a repository location is on the local filesystem (not a network URL)
///
/// Local: `/srv/git/alpha.git`, `./mirrors/alpha.git`, `C:\git\alpha.git`,
/// `file:///srv/git/alpha.git`.
/// Remote: `https://host/group/alpha.git`, `git@host:group/alpha.git`.
///
/// Bare names are treated as remote so that credentials are still required.
pub fn is_local_path(location: &str) -> bool {
  if location.starts_with("file://") {
    return true;
  }

  if location.starts_with("./") || location.starts_with("../") {
    return true;
  }

  // Windows drive letter (C:\ or C:/), checked before the URL test since it contains ':'
  let bytes = location.as_bytes();
  if bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && (bytes[2] == b'\\' || bytes[2] == b'/')
  {
    return true;
  }

  // UNC share
  if location.starts_with("\\\\") {
    return true;
  }

  if location.contains("://") || location.contains('@') {
    return false;
  }

  location.starts_with('/') || Path::new(location).is_absolute()
}

/// Uppercase the first character, leaving the rest untouched
pub fn capitalize_first(text: &str) -> String {
  let mut chars = text.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}
