use core::cmp::Ordering;
use proptest::prelude::*;
use quarry_xdm::atomic::numeric::promote;
use quarry_xdm::{AtomicValue, DurationKind, DurationValue, XdmContext, XdmType, registry};
use rstest::rstest;

fn ctx(offset: i32) -> XdmContext {
    XdmContext::builder().with_implicit_timezone(offset).try_build().unwrap()
}

prop_compose! {
    fn arb_decimal_text()(neg in any::<bool>(), int in "[0-9]{1,20}", frac in "[0-9]{0,12}") -> String {
        let sign = if neg { "-" } else { "" };
        if frac.is_empty() { format!("{sign}{int}") } else { format!("{sign}{int}.{frac}") }
    }
}

prop_compose! {
    fn arb_tz()(tz in prop::option::of(-840i32..=840)) -> String {
        match tz {
            None => String::new(),
            Some(0) => "Z".to_string(),
            Some(m) => format!("{}{:02}:{:02}", if m < 0 { '-' } else { '+' }, m.abs() / 60, m.abs() % 60),
        }
    }
}

prop_compose! {
    fn arb_date_time()(
        y in 1i64..9999, mo in 1u8..=12, d in 1u8..=28,
        h in 0u8..24, mi in 0u8..60, s in 0u8..60, ms in prop::option::of(0u32..1000),
        tz in arb_tz(),
    ) -> String {
        let frac = ms.map(|m| format!(".{m:03}")).unwrap_or_default();
        format!("{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:{s:02}{frac}{tz}")
    }
}

prop_compose! {
    fn arb_day_time()(neg in any::<bool>(), d in 0u32..400, h in 0u32..100, m in 0u32..200, s in 0u32..5000, ms in 0u32..1000) -> String {
        format!("{}P{d}DT{h}H{m}M{s}.{ms:03}S", if neg { "-" } else { "" })
    }
}

prop_compose! {
    fn arb_numeric()(i in any::<i32>(), sel in 0u8..4, frac in 0u16..1000) -> AtomicValue {
        let text = format!("{i}.{frac:03}");
        match sel {
            0 => AtomicValue::integer(i64::from(i)),
            1 => AtomicValue::parse(&text, XdmType::Decimal).unwrap(),
            2 => AtomicValue::parse(&text, XdmType::Float).unwrap(),
            _ => AtomicValue::parse(&text, XdmType::Double).unwrap(),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[rstest]
    fn decimal_round_trip(text in arb_decimal_text()) {
        let v = AtomicValue::parse(&text, XdmType::Decimal).unwrap();
        let again = AtomicValue::parse(&v.to_lexical(), XdmType::Decimal).unwrap();
        prop_assert!(v.value_eq(&again, &XdmContext::default()).unwrap());
        prop_assert_eq!(v.to_lexical(), again.to_lexical());
    }

    #[rstest]
    fn double_round_trip(x in any::<f64>().prop_filter("finite", |x| x.is_finite())) {
        let v = AtomicValue::double(x);
        let again = AtomicValue::parse(&v.to_lexical(), XdmType::Double).unwrap();
        prop_assert_eq!(v, again);
    }

    #[rstest]
    fn date_time_round_trip(text in arb_date_time()) {
        let v = AtomicValue::parse(&text, XdmType::DateTime).unwrap();
        let again = AtomicValue::parse(&v.to_lexical(), XdmType::DateTime).unwrap();
        prop_assert_eq!(v.to_lexical(), again.to_lexical());
        prop_assert!(v.value_eq(&again, &ctx(0)).unwrap());
    }

    #[rstest]
    fn duration_canonicalization_is_idempotent(text in arb_day_time()) {
        let d = DurationValue::parse(DurationKind::DayTime, &text).unwrap();
        let once = d.canonicalize();
        let twice = once.canonicalize();
        prop_assert_eq!(once.to_lexical(), twice.to_lexical());
        prop_assert_eq!(d.to_lexical(), once.to_lexical());
        prop_assert!(d.value_eq(&twice));
        let reparsed = DurationValue::parse(DurationKind::DayTime, &d.to_lexical()).unwrap();
        prop_assert!(reparsed.value_eq(&d));
    }

    #[rstest]
    fn date_time_order_is_total(a in arb_date_time(), b in arb_date_time(), c in arb_date_time(), implicit in -840i32..=840) {
        let ctx = ctx(implicit);
        let [a, b, c] = [a, b, c].map(|t| AtomicValue::parse(&t, XdmType::DateTime).unwrap());
        let ab = a.order_compare(&b, &ctx, None).unwrap();
        let ba = b.order_compare(&a, &ctx, None).unwrap();
        prop_assert_eq!(ab, ba.reverse());
        let bc = b.order_compare(&c, &ctx, None).unwrap();
        if ab != Ordering::Greater && bc != Ordering::Greater {
            prop_assert_ne!(a.order_compare(&c, &ctx, None).unwrap(), Ordering::Greater);
        }
    }

    #[rstest]
    fn promotion_is_associative(a in arb_numeric(), b in arb_numeric(), c in arb_numeric()) {
        let t = |x: &AtomicValue| x.xdm_type();
        let left = XdmType::numeric_promotion(XdmType::numeric_promotion(t(&a), t(&b)).unwrap(), t(&c));
        let right = XdmType::numeric_promotion(t(&a), XdmType::numeric_promotion(t(&b), t(&c)).unwrap());
        prop_assert_eq!(left, right);
        let target = left.unwrap();
        for v in [&a, &b, &c] {
            let promoted = promote(v, target).unwrap();
            prop_assert_eq!(promoted.xdm_type(), target);
        }
    }

    #[rstest]
    fn numeric_order_matches_index_keys(a in arb_numeric(), b in arb_numeric()) {
        let ctx = XdmContext::default();
        let ord = a.order_compare(&b, &ctx, None).unwrap();
        let (ka, kb) = (a.index_key(&ctx).unwrap(), b.index_key(&ctx).unwrap());
        if ka < kb {
            prop_assert_ne!(ord, Ordering::Greater);
        } else if ka > kb {
            prop_assert_ne!(ord, Ordering::Less);
        }
    }

    #[rstest]
    fn common_supertype_is_symmetric(i in 0usize..XdmType::ALL.len(), j in 0usize..XdmType::ALL.len()) {
        let (a, b) = (XdmType::ALL[i], XdmType::ALL[j]);
        prop_assume!(a != XdmType::Empty && b != XdmType::Empty);
        let reg = registry();
        let ab = reg.common_supertype(a, b).unwrap();
        prop_assert_eq!(ab, reg.common_supertype(b, a).unwrap());
        prop_assert!(reg.subtype_of(a, ab).unwrap());
        prop_assert!(reg.subtype_of(b, ab).unwrap());
        if reg.subtype_of(a, b).unwrap() {
            prop_assert_eq!(ab, b);
        }
    }
}

#[rstest]
#[case(XdmType::Byte, XdmType::Integer, true)]
#[case(XdmType::Integer, XdmType::Byte, false)]
#[case(XdmType::Id, XdmType::String, true)]
#[case(XdmType::DayTimeDuration, XdmType::Duration, true)]
#[case(XdmType::Element, XdmType::Node, true)]
#[case(XdmType::Element, XdmType::AnyAtomicType, false)]
#[case(XdmType::Double, XdmType::Item, true)]
#[case(XdmType::Empty, XdmType::Item, false)]
fn subtype_table(#[case] sub: XdmType, #[case] sup: XdmType, #[case] expected: bool) {
    assert_eq!(registry().subtype_of(sub, sup).unwrap(), expected);
}

#[rstest]
#[case(XdmType::Byte, XdmType::UnsignedByte, XdmType::Integer)]
#[case(XdmType::Float, XdmType::Integer, XdmType::Numeric)]
#[case(XdmType::Element, XdmType::Text, XdmType::Node)]
#[case(XdmType::Text, XdmType::String, XdmType::Item)]
#[case(XdmType::NcName, XdmType::Language, XdmType::Token)]
fn common_supertypes(#[case] a: XdmType, #[case] b: XdmType, #[case] expected: XdmType) {
    assert_eq!(registry().common_supertype(a, b).unwrap(), expected);
}

#[rstest]
fn demotion_is_refused() {
    let err = promote(&AtomicValue::double(1.0), XdmType::Decimal).unwrap_err();
    assert_eq!(err.code.as_str(), "XPTY0004");
}
