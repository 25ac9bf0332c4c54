//! `xs:string` and the types derived from it by restriction.

use crate::error::Error;
use crate::types::XdmType;
use core::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StringKind {
    String,
    NormalizedString,
    Token,
    Language,
    NmToken,
    Name,
    NcName,
    Id,
    IdRef,
    Entity,
}

/// Whitespace facet applied before validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Whitespace {
    Preserve,
    Replace,
    Collapse,
}

impl StringKind {
    pub fn xdm_type(self) -> XdmType {
        match self {
            StringKind::String => XdmType::String,
            StringKind::NormalizedString => XdmType::NormalizedString,
            StringKind::Token => XdmType::Token,
            StringKind::Language => XdmType::Language,
            StringKind::NmToken => XdmType::NmToken,
            StringKind::Name => XdmType::Name,
            StringKind::NcName => XdmType::NcName,
            StringKind::Id => XdmType::Id,
            StringKind::IdRef => XdmType::IdRef,
            StringKind::Entity => XdmType::Entity,
        }
    }

    pub fn from_type(t: XdmType) -> Option<Self> {
        Some(match t {
            XdmType::String => StringKind::String,
            XdmType::NormalizedString => StringKind::NormalizedString,
            XdmType::Token => StringKind::Token,
            XdmType::Language => StringKind::Language,
            XdmType::NmToken => StringKind::NmToken,
            XdmType::Name => StringKind::Name,
            XdmType::NcName => StringKind::NcName,
            XdmType::Id => StringKind::Id,
            XdmType::IdRef => StringKind::IdRef,
            XdmType::Entity => StringKind::Entity,
            _ => return None,
        })
    }

    pub fn whitespace(self) -> Whitespace {
        match self {
            StringKind::String => Whitespace::Preserve,
            StringKind::NormalizedString => Whitespace::Replace,
            _ => Whitespace::Collapse,
        }
    }

    fn accepts(self, s: &str) -> bool {
        match self {
            StringKind::String | StringKind::NormalizedString | StringKind::Token => true,
            StringKind::Language => is_valid_language(s),
            StringKind::NmToken => is_valid_nmtoken(s),
            StringKind::Name => is_valid_name(s, true),
            StringKind::NcName | StringKind::Id | StringKind::IdRef | StringKind::Entity => {
                is_valid_name(s, false)
            }
        }
    }
}

/// A string tagged with the derived type it was validated against.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StringValue {
    value: String,
    kind: StringKind,
}

impl StringValue {
    /// Plain `xs:string`; never fails.
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: StringKind::String,
        }
    }

    /// Applies the whitespace facet of `kind` and validates the result.
    pub fn new(kind: StringKind, input: &str) -> Result<Self, Error> {
        let value = match kind.whitespace() {
            Whitespace::Preserve => input.to_string(),
            Whitespace::Replace => replace_xml_whitespace(input),
            Whitespace::Collapse => collapse_xml_whitespace(input),
        };
        if !kind.accepts(&value) {
            return Err(Error::invalid_lexical(
                kind.xdm_type(),
                input,
                format!("'{value}' is not a valid {}", kind.xdm_type()),
            ));
        }
        Ok(Self { value, kind })
    }

    pub fn kind(&self) -> StringKind {
        self.kind
    }

    pub fn xdm_type(&self) -> XdmType {
        self.kind.xdm_type()
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value
    }
}

impl fmt::Display for StringValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

pub(crate) fn replace_xml_whitespace(input: &str) -> String {
    input
        .chars()
        .map(|ch| match ch {
            '\t' | '\n' | '\r' => ' ',
            other => other,
        })
        .collect()
}

pub(crate) fn collapse_xml_whitespace(input: &str) -> String {
    input
        .split([' ', '\t', '\n', '\r'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_valid_language(s: &str) -> bool {
    let mut parts = s.split('-');
    let Some(first) = parts.next() else {
        return false;
    };
    if !(1..=8).contains(&first.len()) || !first.chars().all(|c| c.is_ascii_alphabetic()) {
        return false;
    }
    parts.all(|part| (1..=8).contains(&part.len()) && part.chars().all(|c| c.is_ascii_alphanumeric()))
}

fn is_name_start_char(ch: char, allow_colon: bool) -> bool {
    (allow_colon && ch == ':') || ch == '_' || ch.is_alphabetic()
}

fn is_name_char(ch: char, allow_colon: bool) -> bool {
    ch.is_alphanumeric()
        || matches!(ch, '_' | '-' | '.' | '\u{B7}')
        || (allow_colon && ch == ':')
}

/// `Name` when `allow_colon`, otherwise `NCName`.
pub(crate) fn is_valid_name(s: &str, allow_colon: bool) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    is_name_start_char(first, allow_colon) && chars.all(|ch| is_name_char(ch, allow_colon))
}

fn is_valid_nmtoken(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|ch| is_name_char(ch, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(StringKind::Token, "  a \t b\n", "a b")]
    #[case(StringKind::NormalizedString, "a\tb\n", "a b ")]
    #[case(StringKind::String, " a\t", " a\t")]
    #[case(StringKind::Language, " en-US ", "en-US")]
    fn whitespace_facets(#[case] kind: StringKind, #[case] input: &str, #[case] want: &str) {
        assert_eq!(StringValue::new(kind, input).unwrap().as_str(), want);
    }

    #[rstest]
    #[case(StringKind::Language, "toolonglanguage")]
    #[case(StringKind::NcName, "a:b")]
    #[case(StringKind::Name, "1abc")]
    #[case(StringKind::NmToken, "a b")]
    #[case(StringKind::Id, "")]
    fn invalid_derived_strings(#[case] kind: StringKind, #[case] input: &str) {
        let err = StringValue::new(kind, input).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::FORG0001);
    }
}
