use quarry_xdm::collation::SimpleCaseCollation;
use quarry_xdm::{
    ArithmeticOp, AtomicValue, ComparisonOp, ErrorCode, ErrorKind, IntegerValue, XdmContext, XdmType,
};
use rstest::{fixture, rstest};

#[fixture]
fn ctx() -> XdmContext {
    XdmContext::builder().with_implicit_timezone(0).try_build().unwrap()
}

fn v(lexical: &str, ty: XdmType) -> AtomicValue {
    AtomicValue::parse(lexical, ty).unwrap()
}

#[rstest]
fn integer_division_by_zero_is_foar0001() {
    let err = IntegerValue::from_i64(5).div(&IntegerValue::from_i64(0)).unwrap_err();
    assert_eq!(err.code, ErrorCode::FOAR0001);
    assert_eq!(err.kind, ErrorKind::Domain);
}

#[rstest]
#[case(ArithmeticOp::Divide, "5", "2", XdmType::Decimal, "2.5")]
#[case(ArithmeticOp::IntegerDivide, "-7", "2", XdmType::Integer, "-3")]
#[case(ArithmeticOp::Modulus, "-7", "2", XdmType::Integer, "-1")]
#[case(ArithmeticOp::Add, "1", "2", XdmType::Integer, "3")]
#[case(ArithmeticOp::Multiply, "3", "0.5", XdmType::Decimal, "1.5")]
fn numeric_results(
    ctx: XdmContext,
    #[case] op: ArithmeticOp,
    #[case] a: &str,
    #[case] b: &str,
    #[case] ty: XdmType,
    #[case] expected: &str,
) {
    let typed = |s: &str| v(s, if s.contains('.') { XdmType::Decimal } else { XdmType::Integer });
    let r = typed(a).arithmetic(op, &typed(b), &ctx).unwrap();
    assert_eq!(r.xdm_type(), ty);
    assert_eq!(r.to_lexical(), expected);
}

#[rstest]
fn double_division_by_zero_is_infinite(ctx: XdmContext) {
    let r = AtomicValue::double(1.0)
        .arithmetic(ArithmeticOp::Divide, &AtomicValue::integer(0), &ctx)
        .unwrap();
    assert_eq!(r.to_lexical(), "INF");
    let err = AtomicValue::double(1.0)
        .arithmetic(ArithmeticOp::IntegerDivide, &AtomicValue::integer(0), &ctx)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::FOAR0001);
}

#[rstest]
fn untyped_operands_act_as_double(ctx: XdmContext) {
    let r = AtomicValue::untyped("1.5")
        .arithmetic(ArithmeticOp::Add, &AtomicValue::integer(1), &ctx)
        .unwrap();
    assert_eq!(r.xdm_type(), XdmType::Double);
    assert_eq!(r.to_lexical(), "2.5");
}

#[rstest]
fn string_arithmetic_has_no_rule(ctx: XdmContext) {
    let err = AtomicValue::string("1")
        .arithmetic(ArithmeticOp::Add, &AtomicValue::integer(1), &ctx)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::XPTY0004);
}

#[rstest]
#[case("2024-01-31", "P1M", "2024-02-29")]
#[case("2023-03-31", "-P1M", "2023-02-28")]
#[case("2024-12-31", "P1D", "2025-01-01")]
fn date_plus_duration(ctx: XdmContext, #[case] date: &str, #[case] dur: &str, #[case] expected: &str) {
    let ty = if dur.contains('M') && !dur.contains('T') { XdmType::YearMonthDuration } else { XdmType::DayTimeDuration };
    let r = v(date, XdmType::Date)
        .arithmetic(ArithmeticOp::Add, &v(dur, ty), &ctx)
        .unwrap();
    assert_eq!(r.to_lexical(), expected);
}

#[rstest]
fn date_time_difference_is_day_time(ctx: XdmContext) {
    let a = v("2024-03-01T12:00:00Z", XdmType::DateTime);
    let b = v("2024-02-28T10:30:00Z", XdmType::DateTime);
    let r = a.arithmetic(ArithmeticOp::Subtract, &b, &ctx).unwrap();
    assert_eq!(r.xdm_type(), XdmType::DayTimeDuration);
    assert_eq!(r.to_lexical(), "P2DT1H30M");
}

#[rstest]
#[case("P1Y", 1.5, "P1Y6M")]
#[case("P1M", 0.5, "P1M")]
#[case("PT1S", 0.25, "PT0.25S")]
fn duration_scaling(ctx: XdmContext, #[case] dur: &str, #[case] factor: f64, #[case] expected: &str) {
    let ty = if dur.contains('T') { XdmType::DayTimeDuration } else { XdmType::YearMonthDuration };
    let r = v(dur, ty)
        .arithmetic(ArithmeticOp::Multiply, &AtomicValue::double(factor), &ctx)
        .unwrap();
    assert_eq!(r.to_lexical(), expected);
}

#[rstest]
fn duration_by_nan_and_zero(ctx: XdmContext) {
    let d = v("PT1H", XdmType::DayTimeDuration);
    let nan = d
        .arithmetic(ArithmeticOp::Multiply, &AtomicValue::double(f64::NAN), &ctx)
        .unwrap_err();
    assert_eq!(nan.code, ErrorCode::FOCA0005);
    let zero = d
        .arithmetic(ArithmeticOp::Divide, &AtomicValue::double(0.0), &ctx)
        .unwrap_err();
    assert_eq!(zero.code, ErrorCode::FODT0002);
    let ratio = d.arithmetic(ArithmeticOp::Divide, &v("PT30M", XdmType::DayTimeDuration), &ctx).unwrap();
    assert_eq!(ratio.to_lexical(), "2");
}

#[rstest]
#[case(ComparisonOp::Eq, true)]
#[case(ComparisonOp::Ne, false)]
#[case(ComparisonOp::Lt, false)]
#[case(ComparisonOp::Ge, true)]
fn integer_equals_decimal(ctx: XdmContext, #[case] op: ComparisonOp, #[case] expected: bool) {
    let a = AtomicValue::integer(1);
    let b = v("1.0", XdmType::Decimal);
    assert_eq!(a.compare(&b, op, &ctx, None).unwrap(), expected);
}

#[rstest]
#[case(ComparisonOp::Eq, false)]
#[case(ComparisonOp::Ne, true)]
#[case(ComparisonOp::Lt, false)]
#[case(ComparisonOp::Gt, false)]
fn nan_compares_false_except_ne(ctx: XdmContext, #[case] op: ComparisonOp, #[case] expected: bool) {
    let nan = AtomicValue::double(f64::NAN);
    assert_eq!(nan.compare(&nan, op, &ctx, None).unwrap(), expected);
}

#[rstest]
fn base_durations_only_compare_for_equality(ctx: XdmContext) {
    let a = v("P1Y", XdmType::Duration);
    let b = v("P12M", XdmType::Duration);
    assert!(a.compare(&b, ComparisonOp::Eq, &ctx, None).unwrap());
    let err = a.compare(&b, ComparisonOp::Lt, &ctx, None).unwrap_err();
    assert_eq!(err.code, ErrorCode::XPTY0004);
    let ym = v("P1Y", XdmType::YearMonthDuration);
    let dt = v("P365D", XdmType::DayTimeDuration);
    assert!(!ym.compare(&dt, ComparisonOp::Eq, &ctx, None).unwrap());
    assert!(ym.compare(&dt, ComparisonOp::Gt, &ctx, None).is_err());
}

#[rstest]
fn strings_use_the_supplied_collation(ctx: XdmContext) {
    let a = AtomicValue::string("Hello");
    let b = AtomicValue::untyped("hello");
    assert!(!a.compare(&b, ComparisonOp::Eq, &ctx, None).unwrap());
    assert!(a.compare(&b, ComparisonOp::Eq, &ctx, Some(&SimpleCaseCollation)).unwrap());
}

#[rstest]
fn incomparable_types(ctx: XdmContext) {
    let err = AtomicValue::string("1")
        .compare(&AtomicValue::integer(1), ComparisonOp::Eq, &ctx, None)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::XPTY0004);
    assert_eq!(err.operands.len(), 2);
}

#[rstest]
fn timezones_are_compared_as_instants(ctx: XdmContext) {
    let a = v("2024-01-01T12:00:00+02:00", XdmType::DateTime);
    let b = v("2024-01-01T10:00:00Z", XdmType::DateTime);
    assert!(a.value_eq(&b, &ctx).unwrap());
    let local = v("2024-01-01T10:00:00", XdmType::DateTime);
    assert!(local.value_eq(&b, &ctx).unwrap());
}

#[rstest]
fn implicit_timezone_out_of_range_is_fodt0003() {
    let err = XdmContext::builder().with_implicit_timezone(15 * 60).try_build().unwrap_err();
    assert_eq!(err.code, ErrorCode::FODT0003);
    let AtomicValue::DateTime(dt) = v("2024-01-01T00:00:00", XdmType::DateTime) else {
        panic!("dateTime expected");
    };
    assert_eq!(dt.adjusted_to_timezone(Some(-841)).unwrap_err().code, ErrorCode::FODT0003);
    assert_eq!(
        dt.adjusted_to_timezone(Some(60)).unwrap().to_lexical(),
        "2024-01-01T00:00:00+01:00"
    );
}

#[rstest]
#[case("3.9", XdmType::Double, XdmType::Integer, "3")]
#[case("-3.9", XdmType::Decimal, XdmType::Integer, "-3")]
#[case("255", XdmType::Integer, XdmType::UnsignedByte, "255")]
#[case("1", XdmType::Integer, XdmType::Boolean, "true")]
#[case("0.1", XdmType::Decimal, XdmType::Double, "0.1")]
#[case("true", XdmType::Boolean, XdmType::Float, "1")]
#[case("2024-05-06T07:08:09Z", XdmType::DateTime, XdmType::GYearMonth, "2024-05Z")]
#[case("2024-05-06", XdmType::Date, XdmType::DateTime, "2024-05-06T00:00:00")]
#[case("P1Y2M3DT4H", XdmType::Duration, XdmType::DayTimeDuration, "P3DT4H")]
#[case("P1Y2M3DT4H", XdmType::Duration, XdmType::YearMonthDuration, "P1Y2M")]
#[case("SGVsbG8=", XdmType::Base64Binary, XdmType::HexBinary, "48656C6C6F")]
#[case("42", XdmType::Integer, XdmType::String, "42")]
fn casts(#[case] input: &str, #[case] from: XdmType, #[case] to: XdmType, #[case] expected: &str) {
    let r = v(input, from).cast_to(to).unwrap();
    assert_eq!(r.xdm_type(), to);
    assert_eq!(r.to_lexical(), expected);
}

#[rstest]
#[case("NaN", XdmType::Double, XdmType::Integer, "FOCA0002")]
#[case("INF", XdmType::Float, XdmType::Decimal, "FOCA0002")]
#[case("256", XdmType::Integer, XdmType::UnsignedByte, "FORG0001")]
#[case("12:00:00", XdmType::Time, XdmType::Date, "XPTY0004")]
#[case("true", XdmType::Boolean, XdmType::Date, "XPTY0004")]
#[case("P1D", XdmType::DayTimeDuration, XdmType::Boolean, "XPTY0004")]
fn failing_casts(#[case] input: &str, #[case] from: XdmType, #[case] to: XdmType, #[case] code: &str) {
    let value = v(input, from);
    let err = value.cast_to(to).unwrap_err();
    assert_eq!(err.code.as_str(), code);
    assert!(!value.castable_as(to));
}

#[rstest]
fn abstract_targets_accept_subtypes() {
    let byte = v("7", XdmType::Byte);
    assert_eq!(byte.cast_to(XdmType::AnyAtomicType).unwrap(), byte);
    assert!(byte.cast_to(XdmType::Numeric).is_ok());
    assert!(AtomicValue::string("x").cast_to(XdmType::Numeric).is_err());
}
