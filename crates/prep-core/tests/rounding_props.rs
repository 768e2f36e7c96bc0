use prep_core::numeric::{format_number, gaussian_round, parse_float};
use proptest::prelude::*;

proptest! {
    #[test]
    fn rounding_stays_within_half_a_unit(value in -1.0e6f64..1.0e6, digits in 0u32..5) {
        let rounded = gaussian_round(value, digits);
        let unit = 10f64.powi(-(digits as i32));
        prop_assert!((rounded - value).abs() <= unit / 2.0 + 1e-9 * value.abs().max(1.0));
    }

    #[test]
    fn rounding_is_idempotent(value in -1.0e6f64..1.0e6, digits in 0u32..5) {
        let once = gaussian_round(value, digits);
        prop_assert_eq!(gaussian_round(once, digits), once);
    }

    #[test]
    fn exact_halves_round_to_even(whole in -10_000i64..10_000) {
        let rounded = gaussian_round(whole as f64 + 0.5, 0);
        prop_assert_eq!(rounded.rem_euclid(2.0), 0.0);
    }

    #[test]
    fn integers_render_and_parse_back(whole in -1_000_000i64..1_000_000) {
        let rendered = format_number(whole as f64);
        prop_assert_eq!(rendered.clone(), whole.to_string());
        prop_assert_eq!(parse_float(&rendered), whole as f64);
    }
}
