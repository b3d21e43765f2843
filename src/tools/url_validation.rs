//! Network destination checks for tools that fetch URLs.
//!
//! Hosts are classified purely from their literal text. No DNS resolution
//! happens here, so a public hostname that resolves to a private address is
//! not caught by these checks.

/// Strict dotted-quad parser.
///
/// Exactly four non-empty, all-digit segments, each at most 255. Leading
/// zeros are accepted (`01.02.03.04` is `1.2.3.4`).
pub fn parse_ipv4(host: &str) -> Option<[u8; 4]> {
    let mut octets = [0u8; 4];
    let mut count = 0;

    for segment in host.split('.') {
        if count == octets.len()
            || segment.is_empty()
            || !segment.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        let value = segment.bytes().try_fold(0u16, |acc, b| {
            let next = acc * 10 + u16::from(b - b'0');
            (next <= 255).then_some(next)
        })?;
        octets[count] = u8::try_from(value).ok()?;
        count += 1;
    }

    (count == octets.len()).then_some(octets)
}

/// `127.0.0.0/8`, `::1` and `localhost`.
pub fn is_loopback(host: &str) -> bool {
    if host == "::1" || host == "localhost" {
        return true;
    }
    parse_ipv4(host).is_some_and(|[a, ..]| a == 127)
}

/// `169.254.0.0/16`, or anything starting with `fe80`.
pub fn is_link_local(host: &str) -> bool {
    if host.starts_with("fe80") {
        return true;
    }
    parse_ipv4(host).is_some_and(|[a, b, ..]| a == 169 && b == 254)
}

/// Loopback, link-local, RFC 1918, `0.0.0.0`, or an `fc`/`fd` prefix on a
/// non-IPv4 host (IPv6 unique-local). Every other host counts as public.
pub fn is_private_ip(host: &str) -> bool {
    if is_loopback(host) || is_link_local(host) {
        return true;
    }
    match parse_ipv4(host) {
        Some([10, ..]) => true,
        Some([172, b, ..]) => (16..=31).contains(&b),
        Some([192, 168, ..]) => true,
        Some([0, 0, 0, 0]) => true,
        Some(_) => false,
        None => host.starts_with("fc") || host.starts_with("fd"),
    }
}

/// Pull the host out of a URL.
///
/// Skips a leading `scheme://`, cuts the authority at the first `/`, `?` or
/// `#`, drops userinfo up to the last `@`, then drops a `:port`. Bracketed
/// IPv6 literals lose their brackets; an unbracketed host with several
/// colons is taken as a bare IPv6 literal and kept whole.
pub fn extract_host(url: &str) -> Option<&str> {
    let rest = match url.find("://") {
        Some(idx) if !url[..idx].contains(['/', '?', '#']) => &url[idx + 3..],
        _ => url,
    };

    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority
        .rsplit_once('@')
        .map_or(authority, |(_, host)| host);

    let host = if let Some(bracketed) = host_port.strip_prefix('[') {
        bracketed.split_once(']').map_or(bracketed, |(host, _)| host)
    } else if host_port.matches(':').count() > 1 {
        host_port
    } else {
        host_port
            .rsplit_once(':')
            .map_or(host_port, |(host, _port)| host)
    };

    (!host.is_empty()).then_some(host)
}

/// True when `url` names a host that is safe to contact.
///
/// Fails closed: a URL without an extractable host is unsafe. The host is
/// compared case-insensitively, so `LOCALHOST` is as private as `localhost`.
/// Whitespace or control characters anywhere in the URL reject it, since
/// URL parsers strip tab and newline before connecting.
pub fn validate_url(url: &str) -> bool {
    if url.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }
    let Some(host) = extract_host(url) else {
        return false;
    };
    !is_private_ip(&host.to_ascii_lowercase())
}
