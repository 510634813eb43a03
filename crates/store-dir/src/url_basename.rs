use url::Url;

/// Extract the last segment of the path component of `url`.
///
/// Query strings and fragments are not part of the result. Trailing slashes are ignored,
/// so `https://example.com/a/b/` yields `b`.
///
/// Returns `None` when `url` cannot be parsed or has no path segment to name a file after
/// (such as `https://example.com/`). Such URLs are not fetchable artifacts.
pub fn url_basename(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    let basename = url.path().trim_end_matches('/').rsplit('/').next()?;
    (!basename.is_empty()).then(|| basename.to_string())
}
