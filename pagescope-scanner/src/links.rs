use crate::document::{PageDocument, authority};
use crate::result::LinkSet;
use tracing::{debug, warn};
use url::{ParseError, Url};

/// Split every `<a href>` of the document into internal and external links.
///
/// Hostless hrefs are internal and get the page's scheme and host prepended
/// verbatim (`{scheme}://{host}/{href}`), including `mailto:` and `tel:`
/// targets. Hrefs on the page's own host are kept as written. The exception
/// prefixes only remove links that carry a foreign host.
pub fn classify_links(document: &PageDocument, exceptions: &[String]) -> LinkSet {
    let base = document.base_url();
    let base_host = authority(base);
    let mut links = LinkSet::default();

    for element in document.elements_named("a") {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let host = match reference_host(base, href) {
            Ok(host) => host,
            Err(e) => {
                warn!("Dropping malformed href {:?}: {}", href, e);
                links.dropped += 1;
                continue;
            }
        };

        if host.is_empty() {
            links
                .internal
                .push(format!("{}://{}/{}", base.scheme(), base_host, href));
        } else if host == base_host {
            links.internal.push(href.to_string());
        } else if is_exception(href, exceptions) {
            debug!("Skipping excepted href {}", href);
            links.dropped += 1;
        } else {
            links.external.push(href.to_string());
        }
    }

    debug!(
        "Classified {} internal, {} external, {} dropped links on {}",
        links.internal.len(),
        links.external.len(),
        links.dropped,
        base
    );

    links
}

/// Host component of an href, empty for relative references and hostless
/// schemes.
///
/// Only an authority written out after `//` gives a host, so `https:foo` and
/// `///foo` are hostless. A written host is compared in its parsed form:
/// lowercase, with default ports elided.
fn reference_host(base: &Url, href: &str) -> Result<String, ParseError> {
    let resolved = match Url::parse(href) {
        Ok(url) => url,
        Err(ParseError::RelativeUrlWithoutBase) => base.join(href)?,
        Err(e) => return Err(e),
    };

    if written_host(href).is_empty() {
        Ok(String::new())
    } else {
        Ok(authority(&resolved))
    }
}

/// The host exactly as written in the href's authority, or `""`.
fn written_host(href: &str) -> &str {
    let rest = match split_scheme(href) {
        Some((_, rest)) => rest,
        // Without a scheme, `///path` is a path, not an empty authority
        None if href.starts_with("///") => return "",
        None => href,
    };

    let Some(after_slashes) = rest.strip_prefix("//") else {
        return "";
    };

    let end = after_slashes
        .find(['/', '?', '#'])
        .unwrap_or(after_slashes.len());
    let authority = &after_slashes[..end];

    match authority.rfind('@') {
        Some(at) => &authority[at + 1..],
        None => authority,
    }
}

fn split_scheme(href: &str) -> Option<(&str, &str)> {
    let colon = href.find(':')?;
    let scheme = &href[..colon];
    let mut chars = scheme.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let valid = starts_with_letter
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

    valid.then(|| (scheme, &href[colon + 1..]))
}

fn is_exception(href: &str, exceptions: &[String]) -> bool {
    exceptions.iter().any(|prefix| href.starts_with(prefix.as_str()))
}
