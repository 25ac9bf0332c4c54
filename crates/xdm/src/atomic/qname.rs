use super::string::is_valid_name;
use crate::consts::XML_URI;
use crate::error::{Error, ErrorCode};
use crate::types::XdmType;
use core::fmt;
use core::hash::{Hash, Hasher};

/// Expanded QName. The prefix is carried for serialization only and takes no
/// part in equality or hashing.
#[derive(Clone, Debug)]
pub struct QNameValue {
    pub prefix: Option<String>,
    pub ns_uri: Option<String>,
    pub local: String,
}

impl QNameValue {
    pub fn new(prefix: Option<&str>, ns_uri: Option<&str>, local: &str) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            ns_uri: ns_uri.filter(|u| !u.is_empty()).map(str::to_string),
            local: local.to_string(),
        }
    }

    pub fn local(local: &str) -> Self {
        Self::new(None, None, local)
    }

    /// Accepts `Q{uri}local` or an unprefixed NCName. A prefixed name cannot
    /// be resolved without in-scope namespaces and fails with `FONS0004`.
    pub fn parse(input: &str) -> Result<Self, Error> {
        Self::resolve(input, |_| None)
    }

    /// Like [`QNameValue::parse`], binding prefixes through `lookup`. The
    /// `xml` prefix is always bound.
    pub fn resolve(input: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let s = input.trim();
        if let Some(rest) = s.strip_prefix("Q{") {
            let Some((uri, local)) = rest.split_once('}') else {
                return Err(Error::invalid_lexical(XdmType::QName, input, "unterminated 'Q{'"));
            };
            if !is_valid_name(local, false) {
                return Err(Error::invalid_lexical(
                    XdmType::QName,
                    input,
                    format!("'{local}' is not an NCName"),
                ));
            }
            return Ok(Self::new(None, Some(uri), local));
        }
        match s.split_once(':') {
            None if is_valid_name(s, false) => Ok(Self::local(s)),
            Some((prefix, local)) if is_valid_name(prefix, false) && is_valid_name(local, false) => {
                let uri = if prefix == "xml" { Some(XML_URI.to_string()) } else { lookup(prefix) };
                match uri {
                    Some(uri) => Ok(Self::new(Some(prefix), Some(&uri), local)),
                    None => Err(Error::cast(
                        ErrorCode::FONS0004,
                        format!("no namespace bound to prefix '{prefix}'"),
                    )
                    .with_operand(XdmType::String, s)),
                }
            }
            _ => Err(Error::invalid_lexical(XdmType::QName, input, "not a QName")),
        }
    }

    pub fn to_lexical(&self) -> String {
        match &self.prefix {
            Some(p) if !p.is_empty() => format!("{p}:{}", self.local),
            _ => self.local.clone(),
        }
    }

    /// `Q{uri}local`, independent of the prefix.
    pub fn to_eqname(&self) -> String {
        format!("Q{{{}}}{}", self.ns_uri.as_deref().unwrap_or(""), self.local)
    }
}

impl PartialEq for QNameValue {
    fn eq(&self, other: &Self) -> bool {
        self.ns_uri == other.ns_uri && self.local == other.local
    }
}

impl Eq for QNameValue {}

impl Hash for QNameValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ns_uri.hash(state);
        self.local.hash(state);
    }
}

impl fmt::Display for QNameValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_lexical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_ignored_by_equality() {
        let a = QNameValue::new(Some("a"), Some("urn:x"), "n");
        let b = QNameValue::new(Some("b"), Some("urn:x"), "n");
        assert_eq!(a, b);
        assert_eq!(a.to_lexical(), "a:n");
        assert_eq!(b.to_eqname(), "Q{urn:x}n");
    }

    #[test]
    fn parse_forms() {
        assert_eq!(
            QNameValue::parse("Q{urn:x}n").unwrap(),
            QNameValue::new(None, Some("urn:x"), "n")
        );
        assert_eq!(QNameValue::parse("n").unwrap().ns_uri, None);
        assert_eq!(QNameValue::parse("p:n").unwrap_err().code, ErrorCode::FONS0004);
        assert_eq!(QNameValue::parse("1n").unwrap_err().code, ErrorCode::FORG0001);
    }

    #[test]
    fn prefixes_resolve_through_lookup() {
        let lookup = |p: &str| (p == "a").then(|| "urn:a".to_string());
        let q = QNameValue::resolve("a:n", lookup).unwrap();
        assert_eq!(q.to_eqname(), "Q{urn:a}n");
        assert_eq!(q.to_lexical(), "a:n");
        assert_eq!(QNameValue::resolve("xml:lang", lookup).unwrap().ns_uri.as_deref(), Some(XML_URI));
        assert_eq!(QNameValue::resolve("b:n", lookup).unwrap_err().code, ErrorCode::FONS0004);
    }
}
