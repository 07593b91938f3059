use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use wayback_mirror::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.org/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.org".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if `host` is `domain` itself or any subdomain of it
///
/// This is a label-aligned suffix comparison: `blog.example.org` is inside
/// `example.org`, while `notexample.org` and `example.org.evil.net` are not.
pub fn host_in_domain(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// The set of hosts that belong to the mirrored site
///
/// Built from the configured apex domain; the apex, its `www.` form and any
/// other subdomain are in scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteScope {
    domain: String,
}

impl SiteScope {
    /// Creates a scope for the given domain
    ///
    /// A leading `www.` is removed so both host forms are in scope.
    pub fn new(domain: &str) -> Self {
        let domain = domain.trim().trim_end_matches('.').to_lowercase();
        let domain = domain
            .strip_prefix("www.")
            .map(str::to_string)
            .unwrap_or(domain);
        Self { domain }
    }

    /// The apex domain of the site
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns true if the host belongs to the site
    pub fn contains_host(&self, host: &str) -> bool {
        host_in_domain(&host.to_lowercase(), &self.domain)
    }

    /// Returns true if the parsed URL belongs to the site
    pub fn contains_url(&self, url: &Url) -> bool {
        extract_domain(url).is_some_and(|host| host_in_domain(&host, &self.domain))
    }

    /// Returns true if the absolute URL belongs to the site
    ///
    /// Relative references and unparsable strings are never in scope; callers
    /// resolve references against their document first.
    pub fn contains(&self, url: &str) -> bool {
        Url::parse(url).is_ok_and(|parsed| self.contains_url(&parsed))
    }

    /// URL prefixes used to query the archive index: `www` form first, then apex
    pub fn index_patterns(&self) -> [String; 2] {
        [format!("www.{}/*", self.domain), format!("{}/*", self.domain)]
    }
}
