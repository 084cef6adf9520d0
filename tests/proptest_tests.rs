//! Property-based tests for tax-ID validation and amount parsing.

use boleto::core::*;
use proptest::prelude::*;
use rust_decimal::Decimal;

fn mod11(sum: u32) -> u32 {
    match sum % 11 {
        r if r < 2 => 0,
        r => 11 - r,
    }
}

fn weighted(digits: &[u32], weights: impl Iterator<Item = u32>) -> u32 {
    digits.iter().zip(weights).map(|(d, w)| d * w).sum()
}

fn complete_cpf(base: &[u32]) -> String {
    let mut digits = base.to_vec();
    let d1 = mod11(weighted(&digits, (2..=10).rev()));
    digits.push(d1);
    let d2 = mod11(weighted(&digits, (2..=11).rev()));
    digits.push(d2);
    digits.iter().map(|d| d.to_string()).collect()
}

fn complete_cnpj(base: &[u32]) -> String {
    const W1: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
    const W2: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
    let mut digits = base.to_vec();
    let d1 = mod11(weighted(&digits, W1.into_iter()));
    digits.push(d1);
    let d2 = mod11(weighted(&digits, W2.into_iter()));
    digits.push(d2);
    digits.iter().map(|d| d.to_string()).collect()
}

fn all_equal(s: &str) -> bool {
    s.bytes().all(|b| b == s.as_bytes()[0])
}

fn with_thousands(n: u64, sep: char) -> String {
    let s = n.to_string();
    let mut out = String::new();
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}

proptest! {
    #[test]
    fn generated_cpf_validates(base in prop::collection::vec(0u32..10, 9)) {
        let cpf = complete_cpf(&base);
        prop_assume!(!all_equal(&cpf));
        let (identity, kind) = validate_tax_id(&cpf).unwrap();
        prop_assert_eq!(kind, TaxIdKind::Cpf);
        prop_assert_eq!(&identity, &cpf);

        // Same number, formatted
        let formatted = format!("{}.{}.{}-{}", &cpf[..3], &cpf[3..6], &cpf[6..9], &cpf[9..]);
        prop_assert!(validate_tax_id(&formatted).is_ok());
    }

    #[test]
    fn mutated_cpf_check_digit_fails(
        base in prop::collection::vec(0u32..10, 9),
        position in 9usize..11,
        delta in 1u8..10,
    ) {
        let cpf = complete_cpf(&base);
        let mut bytes = cpf.into_bytes();
        bytes[position] = b'0' + (bytes[position] - b'0' + delta) % 10;
        let mutated = String::from_utf8(bytes).unwrap();
        prop_assert!(validate_tax_id(&mutated).is_err());
    }

    #[test]
    fn generated_cnpj_validates(base in prop::collection::vec(0u32..10, 12)) {
        let cnpj = complete_cnpj(&base);
        prop_assume!(!all_equal(&cnpj));
        let (_, kind) = validate_tax_id(&cnpj).unwrap();
        prop_assert_eq!(kind, TaxIdKind::Cnpj);
    }

    #[test]
    fn mutated_cnpj_check_digit_fails(
        base in prop::collection::vec(0u32..10, 12),
        position in 12usize..14,
        delta in 1u8..10,
    ) {
        let cnpj = complete_cnpj(&base);
        let mut bytes = cnpj.into_bytes();
        bytes[position] = b'0' + (bytes[position] - b'0' + delta) % 10;
        let mutated = String::from_utf8(bytes).unwrap();
        prop_assert!(validate_tax_id(&mutated).is_err());
    }

    #[test]
    fn all_equal_digits_always_fail(d in 0u8..10, cnpj in any::<bool>()) {
        let len = if cnpj { 14 } else { 11 };
        let s: String = std::iter::repeat_n(char::from(b'0' + d), len).collect();
        let is_format_error = matches!(
            validate_tax_id(&s),
            Err(TaxIdError::InvalidFormat { .. })
        );
        prop_assert!(is_format_error);
    }

    #[test]
    fn other_lengths_are_format_errors(digits in "[0-9]{1,20}") {
        prop_assume!(digits.len() != 11 && digits.len() != 14);
        let is_format_error = matches!(
            validate_tax_id(&digits),
            Err(TaxIdError::InvalidFormat { .. })
        );
        prop_assert!(is_format_error);
    }

    #[test]
    fn monetary_formats_are_equivalent(reais in 0u64..100_000_000, cents in 0u64..100) {
        let expected = Decimal::new((reais * 100 + cents) as i64, 2);

        let brazilian = format!("{},{cents:02}", with_thousands(reais, '.'));
        let american = format!("{}.{cents:02}", with_thousands(reais, ','));
        let plain = format!("{reais}.{cents:02}");
        let symbol = format!("R$ {brazilian}");

        prop_assert_eq!(parse_amount(brazilian.as_str()).unwrap(), expected);
        prop_assert_eq!(parse_amount(american.as_str()).unwrap(), expected);
        prop_assert_eq!(parse_amount(plain.as_str()).unwrap(), expected);
        prop_assert_eq!(parse_amount(symbol.as_str()).unwrap(), expected);
        prop_assert_eq!(to_cents(expected), Some((reais * 100 + cents) as i64));
    }

    #[test]
    fn parse_amount_never_panics(s in "\\PC*") {
        let _ = parse_amount(s.as_str());
    }
}
