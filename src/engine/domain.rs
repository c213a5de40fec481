// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;

use crate::errors::{ScannerError, ScannerResult};

static HOSTNAME_LABEL: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?$").ok());

static SCHEME: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[a-z][a-z0-9+.-]*://").ok());

/// Reduce user input to a bare hostname or IP literal.
///
/// Trims and lowercases, then drops the scheme, userinfo, path, query,
/// fragment, port and trailing dot. Anything that is not a valid hostname
/// or IP afterwards is a validation error.
pub fn normalize_domain(input: &str) -> ScannerResult<String> {
    let lowered = input.trim().to_ascii_lowercase();

    let without_scheme = match SCHEME.as_ref().and_then(|re| re.find(&lowered)) {
        Some(m) => &lowered[m.end()..],
        None => lowered.as_str(),
    };

    let authority = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let authority = authority.rsplit('@').next().unwrap_or_default();

    let host = if let Some(rest) = authority.strip_prefix('[') {
        rest.split(']').next().unwrap_or_default()
    } else if authority.matches(':').count() == 1 {
        authority.split(':').next().unwrap_or_default()
    } else {
        authority
    };
    let host = host.trim_end_matches('.');

    if host.is_empty() {
        return Err(ScannerError::Validation(format!(
            "No domain in input: {:?}",
            input
        )));
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip.to_string());
    }

    if is_valid_hostname(host) {
        Ok(host.to_string())
    } else {
        Err(ScannerError::Validation(format!("Invalid domain: {:?}", input)))
    }
}

fn is_valid_hostname(host: &str) -> bool {
    let Some(label_re) = HOSTNAME_LABEL.as_ref() else {
        return false;
    };

    host.len() <= 253 && host.split('.').all(|label| label_re.is_match(label))
}
