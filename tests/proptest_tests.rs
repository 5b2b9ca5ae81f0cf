//! Property-based tests for the access-key check digit and related
//! invariants.
//!
//! Run with: `cargo test --test proptest_tests`

use chrono::{DateTime, FixedOffset, TimeZone};
use notafiscal::core::*;
use proptest::prelude::*;

fn issued(year: i32, month: u32) -> DateTime<FixedOffset> {
    FixedOffset::west_opt(3 * 3600)
        .unwrap()
        .with_ymd_and_hms(year, month, 1, 12, 0, 0)
        .unwrap()
}

/// An arbitrary 43-digit key prefix.
fn prefix_strategy() -> impl Strategy<Value = String> {
    proptest::collection::vec(0u8..10, 43)
        .prop_map(|digits| digits.iter().map(|d| (b'0' + d) as char).collect())
}

proptest! {
    #[test]
    fn check_digit_is_a_single_digit(prefix in prefix_strategy()) {
        let dv = check_digit(&prefix).unwrap();
        prop_assert!(dv <= 9);
    }

    #[test]
    fn check_digit_is_deterministic(prefix in prefix_strategy()) {
        prop_assert_eq!(check_digit(&prefix).unwrap(), check_digit(&prefix).unwrap());
    }

    #[test]
    fn completed_key_always_parses(prefix in prefix_strategy()) {
        let dv = check_digit(&prefix).unwrap();
        let full = format!("{prefix}{dv}");
        prop_assert!(AccessKey::parse(&full).is_ok());
    }

    #[test]
    fn generated_keys_parse_and_echo_inputs(
        series in 1u16..=999,
        number in 1u64..=999_999_999,
        nonce in 0u32..=99_999_999,
        month in 1u32..=12,
    ) {
        let key = AccessKey::generate(
            Uf::Mg,
            &issued(2026, month),
            "11222333000181",
            Model::Receipt,
            series,
            number,
            EmissionType::Normal,
            nonce,
        ).unwrap();

        let s = key.as_str();
        prop_assert_eq!(s.len(), 44);
        prop_assert_eq!(&s[0..2], "31"); // Minas Gerais
        prop_assert_eq!(&s[20..22], "65");
        let series_str = format!("{series:03}");
        let number_str = format!("{number:09}");
        let nonce_str = format!("{nonce:08}");
        prop_assert_eq!(&s[22..25], series_str.as_str());
        prop_assert_eq!(&s[25..34], number_str.as_str());
        prop_assert_eq!(&s[35..43], nonce_str.as_str());
        prop_assert!(AccessKey::parse(s).is_ok());
        prop_assert_eq!(key.uf(), Some(Uf::Mg));
    }

    #[test]
    fn out_of_range_numbers_are_rejected(number in prop_oneof![Just(0u64), 1_000_000_000u64..u64::MAX]) {
        let result = AccessKey::generate(
            Uf::Sp,
            &issued(2026, 1),
            "11222333000181",
            Model::Invoice,
            1,
            number,
            EmissionType::Normal,
            0,
        );
        prop_assert!(result.is_err());
    }

    #[test]
    fn uf_codes_round_trip(idx in 0usize..27) {
        let all = [
            Uf::Ac, Uf::Al, Uf::Ap, Uf::Am, Uf::Ba, Uf::Ce, Uf::Df, Uf::Es, Uf::Go,
            Uf::Ma, Uf::Mt, Uf::Ms, Uf::Mg, Uf::Pa, Uf::Pb, Uf::Pr, Uf::Pe, Uf::Pi,
            Uf::Rj, Uf::Rn, Uf::Rs, Uf::Ro, Uf::Rr, Uf::Sc, Uf::Sp, Uf::Se, Uf::To,
        ];
        let uf = all[idx];
        prop_assert_eq!(Uf::from_code(uf.code()), Some(uf));
        prop_assert_eq!(Uf::from_sigla(uf.sigla()), Some(uf));
    }
}

#[test]
fn check_digit_rejects_wrong_length() {
    assert!(check_digit("123").is_err());
    assert!(check_digit(&"0".repeat(44)).is_err());
}

#[test]
fn check_digit_rejects_non_digits() {
    assert!(check_digit(&"a".repeat(43)).is_err());
}
