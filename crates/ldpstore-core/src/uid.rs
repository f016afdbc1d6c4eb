//! # UID Layout
//!
//! UIDs are `/`-rooted hierarchical paths. The path determines containment;
//! the URI is the `info:fcres` namespace prefix followed by the UID.

use crate::primitives::{ROOT_UID, VERSIONS_LABEL};
use crate::vocab::FCRES;
use crate::LdpError;
use oxigraph::model::{NamedNode, NamedNodeRef};

/// URI of the resource at `uid`.
#[must_use]
pub fn uid_to_uri(uid: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("{FCRES}{uid}"))
}

/// UID of an internal resource URI. Fragments are stripped.
pub fn uri_to_uid(uri: NamedNodeRef<'_>) -> Result<String, LdpError> {
    let iri = uri.as_str();
    let rest = iri
        .strip_prefix(FCRES)
        .filter(|r| r.starts_with('/'))
        .ok_or_else(|| LdpError::invalid(iri, "not an internal resource URI"))?;
    let path = rest.split('#').next().unwrap_or(rest);
    if path == ROOT_UID {
        return Ok(ROOT_UID.to_string());
    }
    Ok(path.trim_end_matches('/').to_string())
}

/// Whether an IRI lies in the internal resource namespace.
#[must_use]
pub fn is_internal(iri: &str) -> bool {
    iri.strip_prefix(FCRES).is_some_and(|r| r.starts_with('/'))
}

/// IRI with any fragment and trailing slash removed.
#[must_use]
pub fn defrag(iri: &str) -> &str {
    let base = iri.split('#').next().unwrap_or(iri);
    match base.strip_prefix(FCRES) {
        Some(ROOT_UID) => base,
        _ => base.trim_end_matches('/'),
    }
}

/// Path-wise parent of `uid`. The root has no parent.
#[must_use]
pub fn parent_uid(uid: &str) -> Option<String> {
    if uid == ROOT_UID {
        return None;
    }
    let trimmed = uid.trim_start_matches('/');
    match trimmed.rsplit_once('/') {
        Some((parent, _)) => Some(format!("/{parent}")),
        None => Some(ROOT_UID.to_string()),
    }
}

/// Prefix shared by every UID nested under `uid`.
#[must_use]
pub fn child_prefix(uid: &str) -> String {
    format!("{}/", uid.trim_end_matches('/'))
}

/// UID of the container holding the versions of `uid`.
#[must_use]
pub fn versions_uid(uid: &str) -> String {
    format!("{}{VERSIONS_LABEL}", child_prefix(uid))
}

/// UID of the version snapshot `label` of `uid`.
#[must_use]
pub fn version_uid(uid: &str, label: &str) -> String {
    format!("{}/{label}", versions_uid(uid))
}

/// Whether `uid` addresses a version snapshot (or the versions container).
#[must_use]
pub fn is_version_uid(uid: &str) -> bool {
    uid.split('/').any(|segment| segment == VERSIONS_LABEL)
}

/// Rewrite `iri` from the `from` domain to the `to` domain.
///
/// Only the resource itself and its hash URIs are rewritten.
#[must_use]
pub fn replace_domain(iri: &str, from: &str, to: &str) -> Option<String> {
    let rest = iri.strip_prefix(from)?;
    if rest.is_empty() || rest.starts_with('#') {
        Some(format!("{to}{rest}"))
    } else {
        None
    }
}

/// Check that `uid` is a well-formed resource path.
///
/// The root is valid. Any other UID starts with `/`, has no empty segments
/// or trailing slash, no fragment, and no reserved versions segment.
pub fn validate(uid: &str) -> Result<(), LdpError> {
    if uid == ROOT_UID {
        return Ok(());
    }
    if !uid.starts_with('/') {
        return Err(LdpError::invalid(uid, "UID must start with a slash"));
    }
    if uid.contains('#') || uid.chars().any(char::is_whitespace) {
        return Err(LdpError::invalid(uid, "UID contains illegal characters"));
    }
    if uid[1..].split('/').any(str::is_empty) {
        return Err(LdpError::invalid(uid, "UID contains empty path segments"));
    }
    if is_version_uid(uid) {
        return Err(LdpError::invalid(uid, "UID uses the reserved versions segment"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_round_trip() {
        let uri = uid_to_uri("/a/b");
        assert_eq!(uri.as_str(), "info:fcres/a/b");
        assert_eq!(uri_to_uid(uri.as_ref()).expect("uid"), "/a/b");
    }

    #[test]
    fn root_uri() {
        let uri = uid_to_uri(ROOT_UID);
        assert_eq!(uri.as_str(), "info:fcres/");
        assert_eq!(uri_to_uid(uri.as_ref()).expect("uid"), "/");
    }

    #[test]
    fn uri_to_uid_strips_fragment() {
        let uri = NamedNode::new_unchecked("info:fcres/a/b#frag");
        assert_eq!(uri_to_uid(uri.as_ref()).expect("uid"), "/a/b");
    }

    #[test]
    fn uri_to_uid_rejects_foreign_uri() {
        let uri = NamedNode::new_unchecked("http://example.org/a");
        assert!(matches!(
            uri_to_uid(uri.as_ref()),
            Err(LdpError::InvalidResource { .. })
        ));
    }

    #[test]
    fn parent_resolution() {
        assert_eq!(parent_uid("/"), None);
        assert_eq!(parent_uid("/a").as_deref(), Some("/"));
        assert_eq!(parent_uid("/a/b/c").as_deref(), Some("/a/b"));
    }

    #[test]
    fn version_layout() {
        assert_eq!(version_uid("/a", "v1"), "/a/fcr:versions/v1");
        assert_eq!(version_uid("/", "v1"), "/fcr:versions/v1");
        assert!(is_version_uid("/a/fcr:versions/v1"));
        assert!(!is_version_uid("/a/b"));
    }

    #[test]
    fn domain_replacement_only_touches_own_terms() {
        assert_eq!(
            replace_domain("info:fcres/a#x", "info:fcres/a", "info:fcres/a/fcr:versions/v"),
            Some("info:fcres/a/fcr:versions/v#x".to_string())
        );
        assert_eq!(replace_domain("info:fcres/ab", "info:fcres/a", "urn:x"), None);
    }

    #[test]
    fn defrag_strips_fragment_and_slash() {
        assert_eq!(defrag("info:fcres/a/#x"), "info:fcres/a");
        assert_eq!(defrag("info:fcres/"), "info:fcres/");
    }

    #[test]
    fn uid_validation() {
        assert!(validate("/").is_ok());
        assert!(validate("/a/b").is_ok());
        assert!(validate("a").is_err());
        assert!(validate("/a/").is_err());
        assert!(validate("/a//b").is_err());
        assert!(validate("/a#frag").is_err());
        assert!(validate("/a/fcr:versions/v1").is_err());
    }
}
