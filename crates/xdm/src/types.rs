//! Built-in type identifiers and the process-wide type registry.
//!
//! The registry is a read-only table mapping every built-in type to its
//! declared supertype. It is built lazily on first use and shared by
//! reference for the lifetime of the process.

use crate::error::Error;
use core::fmt;
use std::collections::HashMap;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum XdmType {
    Item,
    Node,
    Document,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
    Namespace,
    AnyAtomicType,
    UntypedAtomic,
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
    Boolean,
    Numeric,
    Decimal,
    Integer,
    NonPositiveInteger,
    NegativeInteger,
    Long,
    Int,
    Short,
    Byte,
    NonNegativeInteger,
    UnsignedLong,
    UnsignedInt,
    UnsignedShort,
    UnsignedByte,
    PositiveInteger,
    Float,
    Double,
    Duration,
    YearMonthDuration,
    DayTimeDuration,
    DateTime,
    Date,
    Time,
    GYear,
    GYearMonth,
    GMonth,
    GMonthDay,
    GDay,
    Base64Binary,
    HexBinary,
    AnyUri,
    QName,
    Empty,
}

impl XdmType {
    pub const ALL: [XdmType; 55] = [
        XdmType::Item,
        XdmType::Node,
        XdmType::Document,
        XdmType::Element,
        XdmType::Attribute,
        XdmType::Text,
        XdmType::Comment,
        XdmType::ProcessingInstruction,
        XdmType::Namespace,
        XdmType::AnyAtomicType,
        XdmType::UntypedAtomic,
        XdmType::String,
        XdmType::NormalizedString,
        XdmType::Token,
        XdmType::Language,
        XdmType::NmToken,
        XdmType::Name,
        XdmType::NcName,
        XdmType::Id,
        XdmType::IdRef,
        XdmType::Entity,
        XdmType::Boolean,
        XdmType::Numeric,
        XdmType::Decimal,
        XdmType::Integer,
        XdmType::NonPositiveInteger,
        XdmType::NegativeInteger,
        XdmType::Long,
        XdmType::Int,
        XdmType::Short,
        XdmType::Byte,
        XdmType::NonNegativeInteger,
        XdmType::UnsignedLong,
        XdmType::UnsignedInt,
        XdmType::UnsignedShort,
        XdmType::UnsignedByte,
        XdmType::PositiveInteger,
        XdmType::Float,
        XdmType::Double,
        XdmType::Duration,
        XdmType::YearMonthDuration,
        XdmType::DayTimeDuration,
        XdmType::DateTime,
        XdmType::Date,
        XdmType::Time,
        XdmType::GYear,
        XdmType::GYearMonth,
        XdmType::GMonth,
        XdmType::GMonthDay,
        XdmType::GDay,
        XdmType::Base64Binary,
        XdmType::HexBinary,
        XdmType::AnyUri,
        XdmType::QName,
        XdmType::Empty,
    ];

    /// Declared supertype; `None` only for `item()`.
    pub const fn declared_supertype(self) -> Option<XdmType> {
        use XdmType::*;
        Some(match self {
            Item => return None,
            Node | AnyAtomicType | Empty => Item,
            Document | Element | Attribute | Text | Comment | ProcessingInstruction | Namespace => {
                Node
            }
            UntypedAtomic | String | Boolean | Numeric | Duration | DateTime | Date | Time
            | GYear | GYearMonth | GMonth | GMonthDay | GDay | Base64Binary | HexBinary
            | AnyUri | QName => AnyAtomicType,
            NormalizedString => String,
            Token => NormalizedString,
            Language | NmToken | Name => Token,
            NcName => Name,
            Id | IdRef | Entity => NcName,
            Decimal | Float | Double => Numeric,
            Integer => Decimal,
            NonPositiveInteger | Long | NonNegativeInteger => Integer,
            NegativeInteger => NonPositiveInteger,
            Int => Long,
            Short => Int,
            Byte => Short,
            UnsignedLong | PositiveInteger => NonNegativeInteger,
            UnsignedInt => UnsignedLong,
            UnsignedShort => UnsignedInt,
            UnsignedByte => UnsignedShort,
            YearMonthDuration | DayTimeDuration => Duration,
        })
    }

    pub fn name(self) -> &'static str {
        use XdmType::*;
        match self {
            Item => "item()",
            Node => "node()",
            Document => "document-node()",
            Element => "element()",
            Attribute => "attribute()",
            Text => "text()",
            Comment => "comment()",
            ProcessingInstruction => "processing-instruction()",
            Namespace => "namespace-node()",
            AnyAtomicType => "xs:anyAtomicType",
            UntypedAtomic => "xs:untypedAtomic",
            String => "xs:string",
            NormalizedString => "xs:normalizedString",
            Token => "xs:token",
            Language => "xs:language",
            NmToken => "xs:NMTOKEN",
            Name => "xs:Name",
            NcName => "xs:NCName",
            Id => "xs:ID",
            IdRef => "xs:IDREF",
            Entity => "xs:ENTITY",
            Boolean => "xs:boolean",
            Numeric => "numeric",
            Decimal => "xs:decimal",
            Integer => "xs:integer",
            NonPositiveInteger => "xs:nonPositiveInteger",
            NegativeInteger => "xs:negativeInteger",
            Long => "xs:long",
            Int => "xs:int",
            Short => "xs:short",
            Byte => "xs:byte",
            NonNegativeInteger => "xs:nonNegativeInteger",
            UnsignedLong => "xs:unsignedLong",
            UnsignedInt => "xs:unsignedInt",
            UnsignedShort => "xs:unsignedShort",
            UnsignedByte => "xs:unsignedByte",
            PositiveInteger => "xs:positiveInteger",
            Float => "xs:float",
            Double => "xs:double",
            Duration => "xs:duration",
            YearMonthDuration => "xs:yearMonthDuration",
            DayTimeDuration => "xs:dayTimeDuration",
            DateTime => "xs:dateTime",
            Date => "xs:date",
            Time => "xs:time",
            GYear => "xs:gYear",
            GYearMonth => "xs:gYearMonth",
            GMonth => "xs:gMonth",
            GMonthDay => "xs:gMonthDay",
            GDay => "xs:gDay",
            Base64Binary => "xs:base64Binary",
            HexBinary => "xs:hexBinary",
            AnyUri => "xs:anyURI",
            QName => "xs:QName",
            Empty => "empty-sequence()",
        }
    }

    /// Looks a type up by its display name (`xs:integer`, `node()`, ...).
    pub fn from_name(name: &str) -> Option<XdmType> {
        XdmType::ALL.iter().copied().find(|t| t.name() == name)
    }

    pub fn is_node(self) -> bool {
        use XdmType::*;
        matches!(
            self,
            Node | Document | Element | Attribute | Text | Comment | ProcessingInstruction | Namespace
        )
    }

    pub fn is_atomic(self) -> bool {
        !matches!(self, XdmType::Item | XdmType::Empty) && !self.is_node()
    }

    /// Types that no value can carry directly.
    pub fn is_abstract(self) -> bool {
        matches!(
            self,
            XdmType::Item | XdmType::Node | XdmType::AnyAtomicType | XdmType::Numeric | XdmType::Empty
        )
    }

    pub fn is_integer(self) -> bool {
        use XdmType::*;
        matches!(
            self,
            Integer
                | NonPositiveInteger
                | NegativeInteger
                | Long
                | Int
                | Short
                | Byte
                | NonNegativeInteger
                | UnsignedLong
                | UnsignedInt
                | UnsignedShort
                | UnsignedByte
                | PositiveInteger
        )
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer()
            || matches!(
                self,
                XdmType::Numeric | XdmType::Decimal | XdmType::Float | XdmType::Double
            )
    }

    pub fn is_string_like(self) -> bool {
        use XdmType::*;
        matches!(
            self,
            String | NormalizedString | Token | Language | NmToken | Name | NcName | Id | IdRef | Entity
        )
    }

    pub fn is_duration(self) -> bool {
        matches!(
            self,
            XdmType::Duration | XdmType::YearMonthDuration | XdmType::DayTimeDuration
        )
    }

    pub fn is_temporal(self) -> bool {
        use XdmType::*;
        matches!(
            self,
            DateTime | Date | Time | GYear | GYearMonth | GMonth | GMonthDay | GDay
        )
    }

    /// Position in the integer → decimal → float → double promotion chain.
    pub fn numeric_rank(self) -> Option<u8> {
        match self {
            t if t.is_integer() => Some(0),
            XdmType::Decimal => Some(1),
            XdmType::Float => Some(2),
            XdmType::Double => Some(3),
            _ => None,
        }
    }

    /// Primitive numeric type reached by promoting `a` and `b` to a common
    /// representation; restricted integers collapse to `xs:integer`.
    pub fn numeric_promotion(a: XdmType, b: XdmType) -> Option<XdmType> {
        let rank = a.numeric_rank()?.max(b.numeric_rank()?);
        Some(match rank {
            0 => XdmType::Integer,
            1 => XdmType::Decimal,
            2 => XdmType::Float,
            _ => XdmType::Double,
        })
    }
}

impl fmt::Display for XdmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only supertype table for the built-in types.
#[derive(Debug)]
pub struct TypeRegistry {
    supertypes: HashMap<XdmType, Option<XdmType>>,
}

static REGISTRY: LazyLock<TypeRegistry> = LazyLock::new(TypeRegistry::builtin);

/// Shared registry instance.
pub fn registry() -> &'static TypeRegistry {
    &REGISTRY
}

impl TypeRegistry {
    fn builtin() -> Self {
        let supertypes: HashMap<_, _> = XdmType::ALL
            .iter()
            .map(|t| (*t, t.declared_supertype()))
            .collect();
        tracing::debug!(types = supertypes.len(), "type registry initialized");
        Self { supertypes }
    }

    /// Declared supertype of `t`. A type missing from the table is a registry bug.
    pub fn supertype(&self, t: XdmType) -> Result<Option<XdmType>, Error> {
        self.supertypes
            .get(&t)
            .copied()
            .ok_or_else(|| Error::internal(format!("type {t} is not registered")))
    }

    pub fn subtype_of(&self, sub: XdmType, sup: XdmType) -> Result<bool, Error> {
        // validate presence first so a bad table never hides behind a shortcut
        self.supertype(sub)?;
        if sub == sup {
            return Ok(true);
        }
        if sub == XdmType::Empty || sup == XdmType::Empty {
            return Ok(false);
        }
        if sup == XdmType::Item {
            return Ok(true);
        }
        let mut cur = self.supertype(sub)?;
        while let Some(t) = cur {
            if t == sup {
                return Ok(true);
            }
            cur = self.supertype(t)?;
        }
        Ok(false)
    }

    /// `t` followed by each of its ancestors up to `item()`.
    pub fn ancestors(&self, t: XdmType) -> Result<Vec<XdmType>, Error> {
        let mut chain = vec![t];
        let mut cur = self.supertype(t)?;
        while let Some(s) = cur {
            chain.push(s);
            cur = self.supertype(s)?;
        }
        Ok(chain)
    }

    /// Narrowest type both `a` and `b` derive from.
    pub fn common_supertype(&self, a: XdmType, b: XdmType) -> Result<XdmType, Error> {
        if a == b {
            self.supertype(a)?;
            return Ok(a);
        }
        let other = self.ancestors(b)?;
        for t in self.ancestors(a)? {
            if other.contains(&t) {
                return Ok(t);
            }
        }
        Ok(XdmType::Item)
    }
}
