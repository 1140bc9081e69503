//! Decoding of trans-cell bearer assertions.
//!
//! A trans-cell token is a base64 encoded SAML assertion. The cell that must
//! accept it is named by its `Audience` element, and that cell's token
//! endpoint is where the assertion has to be exchanged.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use quick_xml::{escape::resolve_predefined_entity, events::Event, Reader};
use tracing::trace;

use crate::error::ClientError;

const AUDIENCE: &[u8] = b"Audience";

const PADDING_OPTIONAL: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, PADDING_OPTIONAL);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, PADDING_OPTIONAL);

fn decode_failure(message: impl Into<String>) -> ClientError {
    ClientError::auth(Some(400), message)
}

/// Returns the audience URL of a base64 encoded SAML assertion.
///
/// Line breaks inside the token are ignored and padding is optional, in
/// either the standard or the URL-safe alphabet.
pub fn audience(assertion: &str) -> Result<String, ClientError> {
    let compact: String = assertion
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD_LENIENT
        .decode(&compact)
        .or_else(|_| URL_SAFE_LENIENT.decode(&compact))
        .map_err(|e| decode_failure(format!("bearer assertion is not valid base64: {}", e)))?;
    let xml = String::from_utf8(bytes)
        .map_err(|e| decode_failure(format!("bearer assertion is not UTF-8: {}", e)))?;

    audience_from_xml(&xml)
}

fn audience_from_xml(xml: &str) -> Result<String, ClientError> {
    let mut reader = Reader::from_str(xml);

    let mut in_audience = false;
    let mut value = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) if start.local_name().as_ref() == AUDIENCE => {
                in_audience = true;
            }
            Ok(Event::Text(text)) if in_audience => {
                value.push_str(&String::from_utf8_lossy(&text));
            }
            Ok(Event::CData(data)) if in_audience => {
                value.push_str(&String::from_utf8_lossy(&data));
            }
            Ok(Event::GeneralRef(reference)) if in_audience => {
                let resolved = reference.resolve_char_ref().map_err(|e| {
                    decode_failure(format!("bearer assertion has a bad character reference: {}", e))
                })?;
                match resolved {
                    Some(ch) => value.push(ch),
                    None => {
                        let name = String::from_utf8_lossy(&reference).into_owned();
                        let text = resolve_predefined_entity(&name).ok_or_else(|| {
                            decode_failure(format!("bearer assertion uses unknown entity &{};", name))
                        })?;
                        value.push_str(text);
                    }
                }
            }
            Ok(Event::End(end)) if in_audience && end.local_name().as_ref() == AUDIENCE => {
                let value = value.trim().to_string();
                if value.is_empty() {
                    return Err(decode_failure("bearer assertion has an empty Audience"));
                }
                trace!("Bearer assertion audience: {}", value);
                return Ok(value);
            }
            Ok(Event::Eof) => {
                return Err(decode_failure("bearer assertion has no Audience element"));
            }
            Ok(_) => {}
            Err(e) => {
                return Err(decode_failure(format!(
                    "bearer assertion is not well-formed XML: {}",
                    e
                )));
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn encode_assertion(audience: &str) -> String {
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><Assertion xmlns="urn:oasis:names:tc:SAML:2.0:assertion" ID="a1" Version="2.0"><Issuer>https://unit.example/alice/</Issuer><Subject><NameID>https://unit.example/alice/#me</NameID></Subject><Conditions><AudienceRestriction><Audience>{}</Audience></AudienceRestriction></Conditions></Assertion>"#,
        audience
    );
    base64::engine::general_purpose::STANDARD.encode(xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};

    #[test]
    fn test_audience_is_extracted() {
        let assertion = encode_assertion("https://unit.example/bob/");
        assert_eq!(audience(&assertion).unwrap(), "https://unit.example/bob/");
    }

    #[test]
    fn test_prefixed_audience_element() {
        let xml = r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"><saml:Audience> https://bob.unit.example/ </saml:Audience></saml:Assertion>"#;
        assert_eq!(
            audience(&STANDARD.encode(xml)).unwrap(),
            "https://bob.unit.example/"
        );
    }

    #[test]
    fn test_invalid_base64_is_an_auth_error() {
        assert!(matches!(
            audience("***not base64***"),
            Err(ClientError::Auth {
                status: Some(400),
                ..
            })
        ));
    }

    #[test]
    fn test_missing_audience_is_an_auth_error() {
        let assertion = STANDARD.encode("<Assertion><Issuer>x</Issuer></Assertion>");
        assert!(matches!(audience(&assertion), Err(ClientError::Auth { .. })));
    }

    #[test]
    fn test_malformed_xml_is_an_auth_error() {
        let assertion = STANDARD.encode("<Assertion><Audience>x</Issuer>");
        assert!(matches!(audience(&assertion), Err(ClientError::Auth { .. })));
    }

    #[test]
    fn test_escaped_audience_is_unescaped() {
        let assertion = encode_assertion("https://unit.example/a&amp;b&#47;c&#x2F;");
        assert_eq!(audience(&assertion).unwrap(), "https://unit.example/a&b/c/");
    }

    #[test]
    fn test_unknown_entity_is_an_auth_error() {
        let assertion = encode_assertion("https://unit.example/&nbsp;bob/");
        assert!(matches!(
            audience(&assertion),
            Err(ClientError::Auth {
                status: Some(400),
                ..
            })
        ));
    }

    #[test]
    fn test_unpadded_standard_token() {
        let xml = "<Assertion><Audience>https://unit.example/bob/</Audience></Assertion>\n";
        let padded = STANDARD.encode(xml);
        assert!(padded.ends_with('='));
        assert!(padded.contains('+'));

        let unpadded = padded.trim_end_matches('=');
        assert_eq!(audience(unpadded).unwrap(), "https://unit.example/bob/");
    }

    #[test]
    fn test_url_safe_unpadded_token() {
        let xml = "<Assertion><Audience>https://unit.example/bob/</Audience></Assertion>\n";
        assert_eq!(
            audience(&URL_SAFE_NO_PAD.encode(xml)).unwrap(),
            "https://unit.example/bob/"
        );
    }

    #[test]
    fn test_line_wrapped_token() {
        let assertion = encode_assertion("https://unit.example/bob/");
        let wrapped = assertion
            .as_bytes()
            .chunks(76)
            .map(|line| std::str::from_utf8(line).unwrap())
            .collect::<Vec<_>>()
            .join("\r\n");
        assert!(wrapped.contains("\r\n"));

        assert_eq!(
            audience(&format!("{}\r\n", wrapped)).unwrap(),
            "https://unit.example/bob/"
        );
    }
}
