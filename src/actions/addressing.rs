use tracing::debug;

use crate::{error::CliError, url_resolver::UrlResolver};

/// URL of a cell; `trailing_slash` selects the form used on the wire
pub fn resolve(
    resolver: &UrlResolver,
    identifier: &str,
    trailing_slash: bool,
) -> Result<String, CliError> {
    let url = if trailing_slash {
        resolver.tenant_url(identifier)?
    } else {
        resolver.resolve(identifier)?
    };
    debug!("{} resolves to {}", identifier, url);
    Ok(url)
}

pub fn extract(resolver: &UrlResolver, url: &str) -> Result<String, CliError> {
    Ok(resolver.extract_identifier(url)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url_resolver::AddressingPolicy;

    #[test]
    fn test_resolve_and_extract() {
        let resolver =
            UrlResolver::new("https://unit.example/", AddressingPolicy::Subdomain).unwrap();
        assert_eq!(
            resolve(&resolver, "alice", false).unwrap(),
            "https://alice.unit.example"
        );
        assert_eq!(
            resolve(&resolver, "alice", true).unwrap(),
            "https://alice.unit.example/"
        );
        assert_eq!(
            extract(&resolver, "https://alice.unit.example/").unwrap(),
            "alice"
        );
    }
}
