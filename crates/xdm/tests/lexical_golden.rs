use quarry_xdm::{AtomicValue, XdmType};
use rstest::rstest;

fn canon(lexical: &str, ty: XdmType) -> String {
    AtomicValue::parse(lexical, ty).unwrap().to_lexical()
}

#[rstest]
#[case("10.500", "10.5")]
#[case("+0001.000", "1")]
#[case("-0.0", "0")]
#[case(".5", "0.5")]
#[case("123456789012345678901234567890.0100", "123456789012345678901234567890.01")]
fn decimal_canonical(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(canon(input, XdmType::Decimal), expected);
}

#[rstest]
#[case("1e6", "1.0E6")]
#[case("1000000", "1.0E6")]
#[case("123.5", "123.5")]
#[case("0.000001", "0.000001")]
#[case("0.0000001", "1.0E-7")]
#[case("INF", "INF")]
#[case("-INF", "-INF")]
#[case("NaN", "NaN")]
#[case("-0", "-0")]
#[case("2.5E10", "2.5E10")]
fn double_canonical(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(canon(input, XdmType::Double), expected);
}

#[rstest]
#[case("PT90S", XdmType::DayTimeDuration, "PT1M30S")]
#[case("P25M", XdmType::YearMonthDuration, "P2Y1M")]
#[case("PT0S", XdmType::DayTimeDuration, "PT0S")]
#[case("P0Y", XdmType::YearMonthDuration, "P0M")]
#[case("P0D", XdmType::Duration, "PT0S")]
#[case("PT36H", XdmType::DayTimeDuration, "P1DT12H")]
#[case("-PT1.50S", XdmType::DayTimeDuration, "-PT1.5S")]
#[case("P1Y13MT3600S", XdmType::Duration, "P2Y1MT1H")]
fn duration_canonical(#[case] input: &str, #[case] ty: XdmType, #[case] expected: &str) {
    assert_eq!(canon(input, ty), expected);
}

#[rstest]
#[case("2024-02-29T24:00:00", XdmType::DateTime, "2024-03-01T00:00:00")]
#[case("2024-01-02T03:04:05.500+00:00", XdmType::DateTime, "2024-01-02T03:04:05.5Z")]
#[case("0000-06-01", XdmType::Date, "0000-06-01")]
#[case("13:20:00-05:00", XdmType::Time, "13:20:00-05:00")]
#[case("--12-25", XdmType::GMonthDay, "--12-25")]
#[case("---07Z", XdmType::GDay, "---07Z")]
fn date_time_canonical(#[case] input: &str, #[case] ty: XdmType, #[case] expected: &str) {
    assert_eq!(canon(input, ty), expected);
}

#[rstest]
#[case("1", XdmType::Boolean, "true")]
#[case(" false ", XdmType::Boolean, "false")]
#[case("0fb7", XdmType::HexBinary, "0FB7")]
#[case("  a  b  ", XdmType::Token, "a b")]
#[case("Q{urn:x}local", XdmType::QName, "local")]
fn other_canonical(#[case] input: &str, #[case] ty: XdmType, #[case] expected: &str) {
    assert_eq!(canon(input, ty), expected);
}

#[rstest]
#[case("1.2.3", XdmType::Decimal)]
#[case("1e", XdmType::Double)]
#[case("yes", XdmType::Boolean)]
#[case("P1Y2H", XdmType::Duration)]
#[case("2023-02-29", XdmType::Date)]
#[case("25:00:00", XdmType::Time)]
#[case("P1D", XdmType::YearMonthDuration)]
#[case("300", XdmType::Byte)]
#[case("abc", XdmType::HexBinary)]
fn malformed_input_is_forg0001(#[case] input: &str, #[case] ty: XdmType) {
    let err = AtomicValue::parse(input, ty).unwrap_err();
    assert_eq!(err.code.as_str(), "FORG0001", "{input} as {ty}: {err}");
}
