//! CPF (Brazilian national identifier) normalization and checksum validation
//!
//! A CPF is 11 digits: a 9 digit base followed by two check digits, each a
//! weighted sum modulo 11. Validation normalizes the value in place, so the
//! canonical form is what gets persisted.

use std::sync::LazyLock;

use regex::Regex;

use super::result::{AccountError, Result};

/// Length of a normalized CPF
pub const CPF_SIZE: usize = 11;

const MODULUS: u32 = 11;

const FIRST_DIGIT_WEIGHTS: [u32; 9] = [10, 9, 8, 7, 6, 5, 4, 3, 2];
const SECOND_DIGIT_WEIGHTS: [u32; 10] = [11, 10, 9, 8, 7, 6, 5, 4, 3, 2];

/// Repeated-digit sequences pass the checksum but are never issued
const KNOWN_INVALID: [&str; 10] = [
    "00000000000",
    "11111111111",
    "22222222222",
    "33333333333",
    "44444444444",
    "55555555555",
    "66666666666",
    "77777777777",
    "88888888888",
    "99999999999",
];

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]+").unwrap());

/// Strip everything that is not an ASCII letter or digit
///
/// Letters are kept on purpose: they only fail later, at the length or
/// checksum step.
pub fn normalize(cpf: &str) -> String {
    NON_ALPHANUMERIC.replace_all(cpf, "").into_owned()
}

/// Normalize `cpf` in place and check its size, blocklist and check digits
///
/// The value is left normalized even when validation fails.
pub fn validate(cpf: &mut String) -> Result<()> {
    *cpf = normalize(cpf);

    if cpf.len() != CPF_SIZE {
        return Err(AccountError::IdentifierSizeInvalid);
    }

    if KNOWN_INVALID.contains(&cpf.as_str()) {
        return Err(AccountError::IdentifierInvalid);
    }

    if !check_digits_match(cpf) {
        return Err(AccountError::IdentifierInvalid);
    }

    Ok(())
}

/// Compute both check digits for a 9 character base
///
/// Non-digit characters weigh nothing. A base of the wrong length sums to
/// zero, which yields check digits `(0, 0)`.
pub fn check_digits(base: &str) -> (u32, u32) {
    let first = check_digit(weighted_sum(base, &FIRST_DIGIT_WEIGHTS));
    let second = check_digit(weighted_sum(
        &format!("{base}{first}"),
        &SECOND_DIGIT_WEIGHTS,
    ));
    (first, second)
}

fn check_digits_match(cpf: &str) -> bool {
    // normalized input is ASCII, so byte slicing is on char boundaries
    let base = &cpf[..9];
    let (first, second) = check_digits(base);
    format!("{base}{first}{second}") == cpf
}

fn check_digit(sum: u32) -> u32 {
    let rest = sum % MODULUS;
    if rest < 2 {
        0
    } else {
        MODULUS - rest
    }
}

fn weighted_sum(value: &str, weights: &[u32]) -> u32 {
    if value.len() != weights.len() {
        return 0;
    }

    value
        .chars()
        .zip(weights)
        .filter_map(|(c, weight)| c.to_digit(10).map(|digit| digit * weight))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validated(raw: &str) -> (String, Result<()>) {
        let mut cpf = raw.to_string();
        let result = validate(&mut cpf);
        (cpf, result)
    }

    #[test]
    fn test_punctuated_cpf_is_normalized_and_valid() {
        let (cpf, result) = validated("123.456.789-09");
        assert_eq!(cpf, "12345678909");
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_known_valid_cpfs() {
        for raw in ["52998224725", "111.444.777-35", " 529 982 247 25 "] {
            let (_, result) = validated(raw);
            assert_eq!(result, Ok(()), "{raw}");
        }
    }

    #[test]
    fn test_repeated_digits_are_rejected() {
        for digit in 0..=9 {
            let raw = digit.to_string().repeat(CPF_SIZE);
            let (_, result) = validated(&raw);
            assert_eq!(result, Err(AccountError::IdentifierInvalid), "{raw}");
        }
    }

    #[test]
    fn test_wrong_size_is_rejected() {
        for raw in ["", "1234567890", "123456789012", "123.456.789", "---"] {
            let (_, result) = validated(raw);
            assert_eq!(result, Err(AccountError::IdentifierSizeInvalid), "{raw:?}");
        }
    }

    #[test]
    fn test_wrong_check_digit_is_rejected() {
        let (_, result) = validated("12345678900");
        assert_eq!(result, Err(AccountError::IdentifierInvalid));

        let (_, result) = validated("12345678919");
        assert_eq!(result, Err(AccountError::IdentifierInvalid));
    }

    #[test]
    fn test_letters_survive_normalization_but_fail_checksum() {
        let (cpf, result) = validated("123.456.789-0a");
        assert_eq!(cpf, "1234567890a");
        assert_eq!(result, Err(AccountError::IdentifierInvalid));
    }

    #[test]
    fn test_letters_in_base_weigh_nothing() {
        // "a" contributes 0, so the digits are those of base "000000000"
        let (first, second) = check_digits("a00000000");
        assert_eq!((first, second), check_digits("000000000"));
    }

    #[test]
    fn test_check_digits() {
        assert_eq!(check_digits("123456789"), (0, 9));
        assert_eq!(check_digits("529982247"), (2, 5));
        assert_eq!(check_digits("111444777"), (3, 5));
        assert_eq!(check_digits("12345"), (0, 0));
    }

    #[test]
    fn test_validation_is_deterministic() {
        for raw in ["123.456.789-09", "123.456.789-00", "9999", "111.444.777/35"] {
            let (first_cpf, first) = validated(raw);
            let (second_cpf, second) = validated(raw);
            assert_eq!(first_cpf, second_cpf);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_normalize_keeps_ascii_alphanumerics_only() {
        assert_eq!(normalize("a.b-c 1/2\t3"), "abc123");
        assert_eq!(normalize("çpf 1"), "pf1");
    }
}
