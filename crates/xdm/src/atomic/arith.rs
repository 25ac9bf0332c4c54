//! Arithmetic on atomic values: numerics after promotion, date/time and
//! duration combinations, and duration scaling.

use super::numeric::{Numeric, unify};
use super::{ArithmeticOp, AtomicValue, DecimalValue};
use crate::context::XdmContext;
use crate::error::{Error, ErrorCode};
use crate::temporal::{DateTimeKind, DurationKind, DurationValue};
use crate::types::XdmType;
use std::borrow::Cow;

fn no_rule(op: ArithmeticOp, a: &AtomicValue, b: &AtomicValue) -> Error {
    Error::type_error(
        ErrorCode::XPTY0004,
        format!(
            "operator '{}' is not defined for {} and {}",
            op.as_str(),
            a.xdm_type(),
            b.xdm_type()
        ),
    )
    .with_value(a)
    .with_value(b)
}

/// `xs:untypedAtomic` operands take part in arithmetic as `xs:double`.
fn untyped_to_double(v: &AtomicValue) -> Result<Cow<'_, AtomicValue>, Error> {
    match v {
        AtomicValue::UntypedAtomic(_) => v.cast_to(XdmType::Double).map(Cow::Owned),
        _ => Ok(Cow::Borrowed(v)),
    }
}

fn numeric_op(op: ArithmeticOp, a: Numeric, b: Numeric) -> Result<AtomicValue, Error> {
    use ArithmeticOp as Op;
    Ok(match unify(a, b) {
        (Numeric::Integer(x), Numeric::Integer(y)) => match op {
            Op::Add => x.add(&y).into(),
            Op::Subtract => x.sub(&y).into(),
            Op::Multiply => x.mul(&y).into(),
            Op::Divide => x.div(&y)?.into(),
            Op::IntegerDivide => x.idiv(&y)?.into(),
            Op::Modulus => x.rem(&y)?.into(),
        },
        (Numeric::Decimal(x), Numeric::Decimal(y)) => match op {
            Op::Add => x.add(&y).into(),
            Op::Subtract => x.sub(&y).into(),
            Op::Multiply => x.mul(&y).into(),
            Op::Divide => x.div(&y)?.into(),
            Op::IntegerDivide => x.idiv(&y)?.into(),
            Op::Modulus => x.rem(&y)?.into(),
        },
        (Numeric::Float(x), Numeric::Float(y)) => match op {
            Op::Add => AtomicValue::Float(x.add(y)),
            Op::Subtract => AtomicValue::Float(x.sub(y)),
            Op::Multiply => AtomicValue::Float(x.mul(y)),
            Op::Divide => AtomicValue::Float(x.div(y)),
            Op::IntegerDivide => x.idiv(y)?.into(),
            Op::Modulus => AtomicValue::Float(x.rem(y)),
        },
        (x, y) => {
            let (x, y) = (
                super::DoubleValue(x.to_f64()),
                super::DoubleValue(y.to_f64()),
            );
            match op {
                Op::Add => AtomicValue::Double(x.add(y)),
                Op::Subtract => AtomicValue::Double(x.sub(y)),
                Op::Multiply => AtomicValue::Double(x.mul(y)),
                Op::Divide => AtomicValue::Double(x.div(y)),
                Op::IntegerDivide => x.idiv(y)?.into(),
                Op::Modulus => AtomicValue::Double(x.rem(y)),
            }
        }
    })
}

fn scale_duration(d: &DurationValue, n: &Numeric, divide: bool) -> Result<DurationValue, Error> {
    match n {
        Numeric::Float(_) | Numeric::Double(_) => {
            let x = n.to_f64();
            if divide { d.divide_by(x) } else { d.multiply_by(x) }
        }
        Numeric::Integer(i) => {
            let x = i.to_decimal();
            if divide {
                d.divide_by_decimal(x.as_big())
            } else {
                d.multiply_by_decimal(x.as_big())
            }
        }
        Numeric::Decimal(x) => {
            if divide {
                d.divide_by_decimal(x.as_big())
            } else {
                d.multiply_by_decimal(x.as_big())
            }
        }
    }
}

fn is_arithmetic_kind(kind: DateTimeKind) -> bool {
    matches!(kind, DateTimeKind::DateTime | DateTimeKind::Date | DateTimeKind::Time)
}

impl AtomicValue {
    /// Applies a binary arithmetic operator.
    pub fn arithmetic(
        &self,
        op: ArithmeticOp,
        other: &AtomicValue,
        ctx: &XdmContext,
    ) -> Result<AtomicValue, Error> {
        use ArithmeticOp as Op;
        use AtomicValue as V;
        let a = untyped_to_double(self)?;
        let b = untyped_to_double(other)?;
        let (a, b) = (a.as_ref(), b.as_ref());
        if let (Some(x), Some(y)) = (Numeric::classify(a), Numeric::classify(b)) {
            return numeric_op(op, x, y);
        }
        match (a, b, op) {
            (V::DateTime(t), V::Duration(d), Op::Add | Op::Subtract)
            | (V::Duration(d), V::DateTime(t), Op::Add)
                if is_arithmetic_kind(t.kind()) && d.kind() != DurationKind::Duration =>
            {
                let r = if op == Op::Add {
                    t.add_duration(d)?
                } else {
                    t.subtract_duration(d)?
                };
                Ok(V::DateTime(r))
            }
            (V::DateTime(x), V::DateTime(y), Op::Subtract)
                if x.kind() == y.kind() && is_arithmetic_kind(x.kind()) =>
            {
                Ok(V::Duration(x.difference(y, ctx.implicit_timezone())?))
            }
            (V::Duration(x), V::Duration(y), Op::Add) => Ok(V::Duration(x.add(y)?)),
            (V::Duration(x), V::Duration(y), Op::Subtract) => Ok(V::Duration(x.subtract(y)?)),
            (V::Duration(x), V::Duration(y), Op::Divide) => Ok(V::Decimal(DecimalValue::new(
                x.divide_by_duration(y)?,
            ))),
            (V::Duration(d), n, Op::Multiply | Op::Divide) | (n, V::Duration(d), Op::Multiply)
                if n.is_numeric() =>
            {
                let n = Numeric::classify(n).ok_or_else(|| no_rule(op, a, b))?;
                Ok(V::Duration(scale_duration(d, &n, op == Op::Divide)?))
            }
            _ => Err(no_rule(op, a, b)),
        }
    }

    /// Unary minus on numerics and ordered durations.
    pub fn negate(&self) -> Result<AtomicValue, Error> {
        match self {
            AtomicValue::Integer(i) => Ok(i.negate().into()),
            AtomicValue::Decimal(d) => Ok(d.negate().into()),
            AtomicValue::Float(f) => Ok(AtomicValue::Float(f.negate())),
            AtomicValue::Double(d) => Ok(AtomicValue::Double(d.negate())),
            AtomicValue::UntypedAtomic(_) => self.cast_to(XdmType::Double)?.negate(),
            AtomicValue::Duration(d) => d.negate().map(AtomicValue::Duration),
            _ => Err(Error::type_error(
                ErrorCode::XPTY0004,
                format!("unary minus is not defined for {}", self.xdm_type()),
            )
            .with_value(self)),
        }
    }
}
