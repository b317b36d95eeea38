use regex::Regex;
use std::sync::LazyLock;

use crate::error::{Result, SyncError};

const DEFAULT_NAMESPACE: &str = "library";
const OFFICIAL_INDEX_HOSTS: [&str; 2] = ["docker.io", "index.docker.io"];

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").unwrap());

/// Convert a docker image reference into a root filesystem locator.
///
/// `user/repo:tag` becomes `docker:///user/repo#tag`, `registry:5000/repo`
/// becomes `docker://registry:5000/repo` and `repo@sha256:..` becomes
/// `docker:///library/repo#sha256:..`. Single-segment repositories on the
/// official index get the `library/` namespace.
pub fn resolve(reference: &str) -> Result<String> {
    if reference.is_empty() {
        return Err(invalid(reference, "reference is empty"));
    }
    if SCHEME_RE.is_match(reference) || reference.contains("://") {
        return Err(invalid(reference, "reference must not include a scheme"));
    }

    let (host, remainder) = split_host(reference);
    let (path, fragment) = split_fragment(remainder);

    if path.is_empty() || path.split('/').any(str::is_empty) {
        return Err(invalid(reference, "empty repository path segment"));
    }
    if fragment == Some("") {
        return Err(invalid(reference, "empty tag or digest"));
    }

    let needs_namespace = !path.contains('/') && host.map_or(true, is_official_index);
    let path = if needs_namespace {
        format!("{DEFAULT_NAMESPACE}/{path}")
    } else {
        path.to_string()
    };

    let mut locator = match host {
        Some(host) => format!("docker://{host}/{path}"),
        None => format!("docker:///{path}"),
    };
    if let Some(fragment) = fragment {
        locator.push('#');
        locator.push_str(fragment);
    }
    Ok(locator)
}

/// The first segment is a registry host when it looks like a hostname or
/// carries a port.
fn split_host(reference: &str) -> (Option<&str>, &str) {
    match reference.split_once('/') {
        Some((first, rest))
            if first.contains('.') || first.contains(':') || first == "localhost" =>
        {
            (Some(first), rest)
        }
        _ => (None, reference),
    }
}

/// Split off an `@digest`, or failing that a `:tag`. A digest wins over a tag.
fn split_fragment(remainder: &str) -> (&str, Option<&str>) {
    match remainder.split_once('@') {
        Some((named, digest)) => (split_tag(named).0, Some(digest)),
        None => split_tag(remainder),
    }
}

/// Split off a `:tag` from the final path segment only.
fn split_tag(remainder: &str) -> (&str, Option<&str>) {
    let last_segment = remainder.rfind('/').map_or(0, |i| i + 1);
    match remainder[last_segment..].find(':') {
        Some(i) => {
            let colon = last_segment + i;
            (&remainder[..colon], Some(&remainder[colon + 1..]))
        }
        None => (remainder, None),
    }
}

fn is_official_index(host: &str) -> bool {
    OFFICIAL_INDEX_HOSTS.contains(&host)
}

fn invalid(reference: &str, reason: &str) -> SyncError {
    SyncError::InvalidDockerImage {
        reference: reference.to_string(),
        reason: reason.to_string(),
    }
}
