//! URL canonicalization.
//!
//! Every component compares and groups bookmarks by the string this module
//! produces, so [`normalize_url`] must be idempotent.

use url::Url;

/// Text of an absolute URL as the user wrote it, split after the authority.
///
/// `url::Url` re-encodes the path, query and fragment, so those pieces are cut
/// from the input instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawParts<'a> {
    pub userinfo: Option<&'a str>,
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub fragment: Option<&'a str>,
}

/// Splits `input` at its authority, then at the first `#` and the first `?` before it.
///
/// Returns `None` when there is no `scheme:` prefix.
pub fn raw_parts(input: &str) -> Option<RawParts<'_>> {
    let colon = input.find(':')?;
    let rest = input[colon + 1..].trim_start_matches(['/', '\\']);
    let authority_end = rest.find(['/', '\\', '?', '#']).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);

    let (before_fragment, fragment) = match tail.split_once('#') {
        Some((head, fragment)) => (head, Some(fragment)),
        None => (tail, None),
    };
    let (path, query) = match before_fragment.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (before_fragment, None),
    };

    Some(RawParts {
        userinfo: authority.rsplit_once('@').map(|(userinfo, _)| userinfo),
        path,
        query,
        fragment,
    })
}

/// Canonicalizes a URL for comparison.
///
/// Lowercases the host, drops the scheme's default port, strips trailing
/// slashes from the path and drops an empty query or fragment. Trailing
/// whitespace is removed from the end of the result. Path, query,
/// fragment and userinfo are copied from the input byte for byte. Input that
/// does not parse as an absolute URL with a host is returned unchanged.
pub fn normalize_url(raw: &str) -> String {
    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(url = raw, error = %e, "leaving unparsable URL as-is");
            return raw.to_string();
        }
    };
    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_ascii_lowercase(),
        _ => {
            tracing::warn!(url = raw, "leaving URL without host as-is");
            return raw.to_string();
        }
    };
    // Same leading and trailing characters the parser ignores.
    let trimmed = raw.trim_matches(|c: char| c <= ' ');
    let parts = match raw_parts(trimmed) {
        Some(parts) => parts,
        None => return raw.to_string(),
    };

    let mut out = String::with_capacity(trimmed.len());
    out.push_str(url.scheme());
    out.push_str("://");

    if let Some(userinfo) = parts.userinfo.filter(|u| !u.is_empty()) {
        out.push_str(userinfo);
        out.push('@');
    }

    out.push_str(&host);
    // `Url::port` is already `None` for the scheme's default port.
    if let Some(port) = url.port() {
        out.push(':');
        out.push_str(&port.to_string());
    }

    // Whitespace ending the output would be trimmed by the next parse, so the
    // last component present drops it to keep the result idempotent.
    let fragment = parts.fragment.map(trim_end_blank).filter(|f| !f.is_empty());
    let query = match fragment {
        Some(_) => parts.query,
        None => parts.query.map(trim_end_blank),
    }
    .filter(|q| !q.is_empty());

    out.push_str(parts.path.trim_end_matches(|c: char| c == '/' || c <= ' '));
    if let Some(query) = query {
        out.push('?');
        out.push_str(query);
    }
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

fn trim_end_blank(s: &str) -> &str {
    s.trim_end_matches(|c: char| c <= ' ')
}

/// True when `raw` parses as an absolute URL with a non-empty host.
pub fn is_valid_url(raw: &str) -> bool {
    Url::parse(raw.trim())
        .map(|url| url.host_str().map_or(false, |h| !h.is_empty()))
        .unwrap_or(false)
}

/// `scheme://host[:port]` of a URL, without path, query or fragment.
pub fn base_url(url: &Url) -> Option<String> {
    let host = url.host_str().filter(|h| !h.is_empty())?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host.to_ascii_lowercase(), port),
        None => format!("{}://{}", url.scheme(), host.to_ascii_lowercase()),
    })
}
