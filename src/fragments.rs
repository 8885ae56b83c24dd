// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Lookup fragments: which strings to hash for one URL.
//!
//! A list entry can block a whole domain, a directory or one exact page, so a
//! single URL is checked under several host/path combinations. Input is an
//! already-canonicalized `host/path?query` spec (no scheme, no fragment);
//! canonicalization itself belongs to the caller.
//!
//! For `a.b.c/1/2.html?param=1` the fragments are, in order:
//!
//! ```text
//! a.b.c/1/2.html    a.b.c/1/    a.b.c/1/2.html?param=1    a.b.c/
//! b.c/1/2.html      b.c/1/      b.c/1/2.html?param=1      b.c/
//! ```

use std::collections::HashSet;

/// Hosts are checked using at most this many trailing components.
pub const MAX_HOST_COMPONENTS: usize = 5;

/// Paths are checked using at most this many leading components.
pub const MAX_PATH_COMPONENTS: usize = 4;

/// True for a dotted-quad IPv4 address with every field at most 255.
///
/// Canonicalization leaves IP hosts in exactly this shape, so nothing more
/// lenient is needed.
pub fn is_canonicalized_ip(host: &str) -> bool {
    let fields: Vec<&str> = host.split('.').collect();
    fields.len() == 4
        && fields.iter().all(|field| {
            !field.is_empty()
                && field.bytes().all(|b| b.is_ascii_digit())
                && field.parse::<u32>().is_ok_and(|value| value <= 255)
        })
}

/// All fragments to hash for a canonicalized URL spec.
///
/// Hosts: the exact host, then (unless it is an IP address) the suffixes made
/// of the last 2, 3, 4 and 5 components that are shorter than the host.
///
/// Paths: the path without its query (if it has one), up to three directory
/// prefixes from the root, the exact path with query, and the empty path.
///
/// Each fragment is `host/path`, deduplicated keeping the first occurrence.
/// A spec without a `/` has no host part and yields nothing.
pub fn lookup_fragments(spec: &str) -> Vec<String> {
    let Some((host, path)) = spec.split_once('/') else {
        return Vec::new();
    };

    let hosts = lookup_hosts(host);
    let paths = lookup_paths(path);

    let mut seen = HashSet::with_capacity(hosts.len() * paths.len());
    let mut fragments = Vec::with_capacity(hosts.len() * paths.len());
    for host in &hosts {
        for path in &paths {
            let fragment = format!("{}/{}", host, path);
            if seen.insert(fragment.clone()) {
                fragments.push(fragment);
            }
        }
    }
    fragments
}

/// Keys identifying the host part of a spec, each ending in `/`.
///
/// An IP host gives the single key `ip/`. A domain gives its last two
/// components and, when it has more than two, its last three. Hosts with fewer
/// than two components give none.
pub fn host_keys(spec: &str) -> Vec<String> {
    let Some((host, _)) = spec.split_once('/') else {
        return Vec::new();
    };

    if is_canonicalized_ip(host) {
        return vec![format!("{}/", host)];
    }

    let components: Vec<&str> = host.split('.').filter(|c| !c.is_empty()).collect();
    let n = components.len();
    if n < 2 {
        return Vec::new();
    }

    let mut keys = vec![format!("{}/", components[n - 2..].join("."))];
    if n > 2 {
        keys.push(format!("{}/", components[n - 3..].join(".")));
    }
    keys
}

fn lookup_hosts(host: &str) -> Vec<&str> {
    let mut hosts = vec![host];
    if is_canonicalized_ip(host) {
        return hosts;
    }

    // The suffix after the k-th dot from the right has k components. The
    // top-level domain alone (k = 1) is never checked.
    hosts.extend(
        host.rmatch_indices('.')
            .take(MAX_HOST_COMPONENTS)
            .skip(1)
            .map(|(dot, _)| &host[dot + 1..]),
    );
    hosts
}

fn lookup_paths(path: &str) -> Vec<&str> {
    let mut paths = Vec::new();
    let mut last_added = "";

    let base = match path.find('?') {
        Some(query) => {
            let base = &path[..query];
            paths.push(base);
            last_added = base;
            base
        }
        None => path,
    };

    for (slash, _) in base.match_indices('/').take(MAX_PATH_COMPONENTS - 1) {
        let dir = &base[..=slash];
        paths.push(dir);
        last_added = dir;
    }

    if last_added != path {
        paths.push(path);
    }
    if !paths.contains(&"") {
        paths.push("");
    }
    paths
}
