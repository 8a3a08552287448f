//! Precache manifest.

use url::Url;

use crate::error::{OfflineError, Result};

/// Resources that must be cached before the controller can serve offline.
pub const PRECACHE_MANIFEST: &[&str] = &[
    "/",
    "/index.html",
    "/index.tsx",
    "/manifest.json",
    "/icon.svg",
];

/// Resolves root-relative manifest paths against `origin`, dropping
/// duplicates while keeping the first occurrence's position.
pub fn resolve(origin: &Url, paths: &[&str]) -> Result<Vec<Url>> {
    let mut urls: Vec<Url> = Vec::with_capacity(paths.len());
    for path in paths {
        let url = origin
            .join(path)
            .map_err(|e| OfflineError::InvalidRequest(format!("{}: {}", path, e)))?;
        if !urls.contains(&url) {
            urls.push(url);
        }
    }
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_manifest() {
        let origin = Url::parse("http://app.test").unwrap();
        let urls = resolve(&origin, PRECACHE_MANIFEST).unwrap();

        let urls: Vec<&str> = urls.iter().map(Url::as_str).collect();
        assert_eq!(
            urls,
            vec![
                "http://app.test/",
                "http://app.test/index.html",
                "http://app.test/index.tsx",
                "http://app.test/manifest.json",
                "http://app.test/icon.svg",
            ]
        );
    }

    #[test]
    fn test_resolve_ignores_origin_path() {
        // Root-relative paths replace any path on the origin
        let origin = Url::parse("http://app.test/nested/page").unwrap();
        let urls = resolve(&origin, &["/icon.svg"]).unwrap();
        assert_eq!(urls[0].as_str(), "http://app.test/icon.svg");
    }

    #[test]
    fn test_resolve_dedupes() {
        let origin = Url::parse("http://app.test").unwrap();
        let urls = resolve(&origin, &["/", "/index.html", "/"]).unwrap();
        assert_eq!(urls.len(), 2);
    }
}
