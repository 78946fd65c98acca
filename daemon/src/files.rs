/// Request-path resolution against the site root.
///
/// Every request path is decoded and checked for traversal before any
/// filesystem call; a rejected path never reaches the disk.
use std::path::{Component, Path, PathBuf};

/// Percent-decode a request path. Rejects malformed escapes and embedded
/// NUL bytes outright.
pub fn percent_decode(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hi = bytes.get(i + 1).and_then(|b| (*b as char).to_digit(16))?;
                let lo = bytes.get(i + 2).and_then(|b| (*b as char).to_digit(16))?;
                out.push((hi * 16 + lo) as u8);
                i += 3;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    if out.contains(&0) {
        return None;
    }
    String::from_utf8(out).ok()
}

/// Resolve a raw request path to a file under `root`, rewriting `/` to
/// the index file. Returns `None` when the path must be refused
/// (traversal, malformed escapes, absolute components).
pub fn resolve_request(root: &Path, index_file: &str, raw_path: &str) -> Option<PathBuf> {
    // Query string and fragment are not part of the file path
    let path = raw_path.split(['?', '#']).next().unwrap_or(raw_path);
    let decoded = percent_decode(path)?;

    if !decoded.starts_with('/') {
        return None;
    }

    let relative = decoded.trim_start_matches('/');
    if relative.is_empty() {
        return Some(root.join(index_file));
    }

    let candidate = Path::new(relative);
    for component in candidate.components() {
        match component {
            Component::Normal(_) => {}
            // `.` is harmless but the rest escape or re-anchor the root
            Component::CurDir => {}
            _ => return None,
        }
    }

    Some(root.join(candidate))
}

/// Content type from the file extension. Unknown extensions fall back to
/// a generic byte stream.
pub fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("wasm") => "application/wasm",
        Some("woff2") => "font/woff2",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
