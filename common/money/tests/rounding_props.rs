use bigdecimal::BigDecimal;
use common_money::{from_minor_units, normalize_scale, to_minor_units};
use proptest::prelude::*;
use std::str::FromStr;

proptest! {
    // Any whole number of cents survives decimal -> minor units -> decimal unchanged.
    #[test]
    fn two_decimal_values_round_trip(cents in -1_000_000_000i64..1_000_000_000) {
        let major = from_minor_units(cents);
        prop_assert_eq!(to_minor_units(&major).unwrap(), cents);
        prop_assert_eq!(from_minor_units(to_minor_units(&major).unwrap()), major);
    }

    // Values written with 2 decimals from a string (as the host sends them) convert exactly.
    #[test]
    fn string_amounts_convert_exactly(whole in 0i64..10_000_000, frac in 0i64..100) {
        let text = format!("{whole}.{frac:02}");
        let amount = BigDecimal::from_str(&text).unwrap();
        prop_assert_eq!(to_minor_units(&amount).unwrap(), whole * 100 + frac);
    }

    // A third decimal digit rounds to the nearest cent; an exact half cent goes to the even cent.
    #[test]
    fn third_decimal_rounds_half_even(cents in 0i64..1_000_000, thousandth in 0i64..10) {
        let text = format!("{}.{:02}{}", cents / 100, cents % 100, thousandth);
        let amount = BigDecimal::from_str(&text).unwrap();
        let expected = match thousandth {
            0..=4 => cents,
            5 if cents % 2 == 0 => cents,
            _ => cents + 1,
        };
        prop_assert_eq!(to_minor_units(&amount).unwrap(), expected);
        prop_assert!((to_minor_units(&normalize_scale(&amount)).unwrap() - expected).abs() <= 1);
    }

    // Negative amounts mirror positive ones.
    #[test]
    fn sign_is_symmetric(cents in 0i64..1_000_000, thousandth in 0i64..10) {
        let text = format!("{}.{:02}{}", cents / 100, cents % 100, thousandth);
        let positive = BigDecimal::from_str(&text).unwrap();
        let negative = BigDecimal::from_str(&format!("-{text}")).unwrap();
        prop_assert_eq!(to_minor_units(&negative).unwrap(), -to_minor_units(&positive).unwrap());
    }
}
