//! Path grammar: `"//" segment ("/" segment)*`
//!
//! The first segment is an organization's display name, or `_` for
//! organizationless projects. Segments are percent-escaped, leaving only the
//! RFC 3986 unreserved characters (`A-Z a-z 0-9 - . _ ~`) as they are.

use crate::error::{HierarchyError, HierarchyResult};

/// Root segment for projects outside any organization
pub const ORGANIZATIONLESS_ROOT: &str = "_";

const PATH_PREFIX: &str = "//";

/// Percent-escape one display name
pub fn escape_segment(display_name: &str) -> String {
    urlencoding::encode(display_name).into_owned()
}

/// Join already-escaped segments into a path
pub fn join_segments<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut path = String::from(PATH_PREFIX);
    for (i, segment) in segments.into_iter().enumerate() {
        if i > 0 {
            path.push('/');
        }
        path.push_str(segment.as_ref());
    }
    path
}

/// Split a path into unescaped segments. At least the root segment is
/// required and no segment may be empty.
pub fn parse_path(path: &str) -> HierarchyResult<Vec<String>> {
    let malformed = |reason: &str| HierarchyError::MalformedPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let body = path
        .strip_prefix(PATH_PREFIX)
        .ok_or_else(|| malformed("paths start with '//'"))?;
    if body.is_empty() {
        return Err(malformed("missing root segment"));
    }

    body.split('/')
        .map(|raw| {
            if raw.is_empty() {
                return Err(malformed("empty segment"));
            }
            urlencoding::decode(raw)
                .map(|s| s.into_owned())
                .map_err(|_| malformed("segment does not decode to UTF-8"))
        })
        .collect()
}
