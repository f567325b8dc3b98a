use crate::UrlError;
use url::Url;

/// Resolves a raw asset reference to an absolute URL
///
/// References already starting with `http` are returned unchanged. Anything
/// else is parsed as a URL-reference and joined onto `base` following
/// RFC 3986 relative resolution.
///
/// # Resolution Rules
///
/// - Surrounding whitespace is trimmed
/// - Empty references are rejected (they would resolve to the page itself)
/// - The joined URL must be http or https; `data:`, `javascript:` and the
///   like are rejected
///
/// # Arguments
///
/// * `reference` - The raw attribute or inline-style value
/// * `base` - The URL of the page the reference was found on
///
/// # Returns
///
/// * `Ok(String)` - The absolute URL
/// * `Err(UrlError)` - The reference cannot be fetched and should be dropped
///
/// # Examples
///
/// ```
/// use elmo::url::resolve_reference;
/// use url::Url;
///
/// let base = Url::parse("http://test.com/dir/page.html").unwrap();
/// assert_eq!(
///     resolve_reference("/a/b.png", &base).unwrap(),
///     "http://test.com/a/b.png"
/// );
/// ```
pub fn resolve_reference(reference: &str, base: &Url) -> Result<String, UrlError> {
    let reference = reference.trim();

    if reference.is_empty() {
        return Err(UrlError::Empty);
    }

    if reference.starts_with("http") {
        return Ok(reference.to_string());
    }

    let absolute = base.join(reference).map_err(|source| UrlError::Parse {
        reference: reference.to_string(),
        source,
    })?;

    match absolute.scheme() {
        "http" | "https" => Ok(absolute.into()),
        _ => Err(UrlError::UnsupportedScheme(reference.to_string())),
    }
}
