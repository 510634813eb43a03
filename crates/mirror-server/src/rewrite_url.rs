use vaultwrap_store_dir::url_basename;

/// Redirect artifact URLs of one registry to a mirror server.
#[derive(Debug, Clone, Copy)]
pub struct RewriteUrl<'a> {
    /// Only URLs starting with this prefix are redirected.
    pub registry: &'a str,
    /// Host of the mirror server.
    pub host: &'a str,
    /// Port of the mirror server.
    pub port: u16,
}

impl RewriteUrl<'_> {
    /// Map `url` to `http://{host}:{port}/{basename}` if it points at the registry.
    ///
    /// Any other URL, including one without a basename, is returned unchanged.
    pub fn apply(self, url: &str) -> String {
        let RewriteUrl { registry, host, port } = self;
        if !url.starts_with(registry) {
            return url.to_string();
        }
        let Some(basename) = url_basename(url) else {
            return url.to_string();
        };
        if host.contains(':') {
            format!("http://[{host}]:{port}/{basename}")
        } else {
            format!("http://{host}:{port}/{basename}")
        }
    }
}
