use crate::atomic::{AtomicValue, QNameValue};
use crate::consts::ERR_NS;
use crate::types::XdmType;
use core::fmt;
use smallvec::SmallVec;
use std::sync::Arc;

/// W3C error codes raised by the data model, plus a marker for defects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Arithmetic
    FOAR0001, // division by zero
    FOAR0002, // numeric operation overflow/underflow
    // Casting
    FOCA0001, // input value too large for decimal
    FOCA0002, // invalid lexical value / NaN or INF to integer
    FOCA0003, // input value too large for integer
    FOCA0005, // NaN supplied as float/double value
    FOCH0002, // unsupported collation
    // Date/time
    FODT0001, // overflow/underflow in date/time operation
    FODT0002, // overflow/underflow in duration operation
    FODT0003, // invalid timezone value
    FOER0000, // unidentified error (multi-root document order)
    FONS0004, // no namespace found for prefix
    FORG0001, // invalid value for cast/constructor
    FORG0006, // invalid argument type (effective boolean value)
    XPTY0004, // type error
    // Implementation defect, never a query error
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::FOAR0001 => "FOAR0001",
            ErrorCode::FOAR0002 => "FOAR0002",
            ErrorCode::FOCA0001 => "FOCA0001",
            ErrorCode::FOCA0002 => "FOCA0002",
            ErrorCode::FOCA0003 => "FOCA0003",
            ErrorCode::FOCA0005 => "FOCA0005",
            ErrorCode::FOCH0002 => "FOCH0002",
            ErrorCode::FODT0001 => "FODT0001",
            ErrorCode::FODT0002 => "FODT0002",
            ErrorCode::FODT0003 => "FODT0003",
            ErrorCode::FOER0000 => "FOER0000",
            ErrorCode::FONS0004 => "FONS0004",
            ErrorCode::FORG0001 => "FORG0001",
            ErrorCode::FORG0006 => "FORG0006",
            ErrorCode::XPTY0004 => "XPTY0004",
            ErrorCode::Internal => "INTERNAL",
        }
    }

    /// Parses `err:LOCAL` or a bare local part.
    pub fn from_code(s: &str) -> Option<Self> {
        use ErrorCode::*;
        let local = s.strip_prefix("err:").unwrap_or(s);
        Some(match local {
            "FOAR0001" => FOAR0001,
            "FOAR0002" => FOAR0002,
            "FOCA0001" => FOCA0001,
            "FOCA0002" => FOCA0002,
            "FOCA0003" => FOCA0003,
            "FOCA0005" => FOCA0005,
            "FOCH0002" => FOCH0002,
            "FODT0001" => FODT0001,
            "FODT0002" => FODT0002,
            "FODT0003" => FODT0003,
            "FOER0000" => FOER0000,
            "FONS0004" => FONS0004,
            "FORG0001" => FORG0001,
            "FORG0006" => FORG0006,
            "XPTY0004" => XPTY0004,
            "INTERNAL" => Internal,
            _ => return None,
        })
    }

    /// Returns the QName for this code in the xqt-errors namespace.
    pub fn qname(&self) -> QNameValue {
        QNameValue::new(Some("err"), Some(ERR_NS), self.as_str())
    }
}

/// Broad classification used by the evaluator to decide how to surface an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Source/target mismatch or malformed lexical input.
    Cast,
    /// Incomparable operands or ordering an unordered type.
    Comparison,
    /// Division by zero, overflow, out-of-range timezone, NaN/INF to integer.
    Domain,
    /// Illegal field combination for a date/time kind.
    Construction,
    /// Operand of the wrong type for an operation.
    Type,
    /// Registry miss, indeterminate ordering, mutation after freeze.
    Internal,
}

/// Type and lexical form of a value that took part in a failed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    pub ty: XdmType,
    pub lexical: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub struct Error {
    pub code: ErrorCode,
    pub kind: ErrorKind,
    pub message: String,
    pub operands: SmallVec<[Operand; 2]>,
    #[source]
    pub source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind, code: ErrorCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            kind,
            message: msg.into(),
            operands: SmallVec::new(),
            source: None,
        }
    }

    pub fn cast(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cast, code, msg)
    }

    pub fn comparison(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Comparison, ErrorCode::XPTY0004, msg)
    }

    pub fn domain(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Domain, code, msg)
    }

    pub fn construction(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Construction, ErrorCode::FORG0001, msg)
    }

    pub fn type_error(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, code, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, ErrorCode::Internal, msg)
    }

    /// `FORG0001` for a lexical form that does not match `target`.
    pub fn invalid_lexical(target: XdmType, lexical: &str, detail: impl fmt::Display) -> Self {
        Self::cast(
            ErrorCode::FORG0001,
            format!("invalid lexical form for {}: {detail}", target.name()),
        )
        .with_operand(XdmType::String, lexical)
    }

    /// `XPTY0004` for a (source, target) pair with no casting rule.
    pub fn unsupported_cast(from: &AtomicValue, to: XdmType) -> Self {
        Self::cast(
            ErrorCode::XPTY0004,
            format!("cannot cast {} to {}", from.xdm_type().name(), to.name()),
        )
        .with_value(from)
    }

    /// `XPTY0004` for a pair of values with no comparison rule.
    pub fn incomparable(a: &AtomicValue, b: &AtomicValue) -> Self {
        Self::comparison(format!(
            "cannot compare {} with {}",
            a.xdm_type().name(),
            b.xdm_type().name()
        ))
        .with_value(a)
        .with_value(b)
    }

    pub fn with_operand(mut self, ty: XdmType, lexical: impl Into<String>) -> Self {
        self.operands.push(Operand {
            ty,
            lexical: lexical.into(),
        });
        self
    }

    pub fn with_value(self, value: &AtomicValue) -> Self {
        let ty = value.xdm_type();
        self.with_operand(ty, value.to_lexical())
    }

    /// Compose an error with a source cause.
    pub fn with_source(
        mut self,
        source: impl Into<Option<Arc<dyn std::error::Error + Send + Sync>>>,
    ) -> Self {
        self.source = source.into();
        self
    }

    pub fn is_internal(&self) -> bool {
        self.kind == ErrorKind::Internal
    }

    /// Format the code as `err:LOCAL`.
    pub fn format_code(&self) -> String {
        format!("err:{}", self.code.as_str())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error: {} ({})", self.message, self.format_code())?;
        for (i, op) in self.operands.iter().enumerate() {
            let sep = if i == 0 { " [" } else { ", " };
            write!(f, "{sep}{} \"{}\"", op.ty.name(), op.lexical)?;
        }
        if !self.operands.is_empty() {
            f.write_str("]")?;
        }
        Ok(())
    }
}

impl From<chrono::OutOfRangeError> for Error {
    fn from(e: chrono::OutOfRangeError) -> Self {
        Error::domain(ErrorCode::FODT0002, "duration out of range")
            .with_source(Some(Arc::new(e) as Arc<dyn std::error::Error + Send + Sync>))
    }
}
