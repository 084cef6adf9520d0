//! CPF and CNPJ check-digit validation.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::TaxIdError;

const CPF_LEN: usize = 11;
const CNPJ_LEN: usize = 14;

const CNPJ_WEIGHTS_FIRST: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_WEIGHTS_SECOND: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// National tax identifier family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaxIdKind {
    /// Cadastro de Pessoas Físicas: 11 digits, individuals.
    Cpf,
    /// Cadastro Nacional da Pessoa Jurídica: 14 digits, companies.
    Cnpj,
}

impl TaxIdKind {
    /// Wire code ("CPF" / "CNPJ").
    pub fn code(&self) -> &'static str {
        match self {
            Self::Cpf => "CPF",
            Self::Cnpj => "CNPJ",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "CPF" => Some(Self::Cpf),
            "CNPJ" => Some(Self::Cnpj),
            _ => None,
        }
    }

    /// Number of digits an identifier of this kind has.
    pub fn digit_count(&self) -> usize {
        match self {
            Self::Cpf => CPF_LEN,
            Self::Cnpj => CNPJ_LEN,
        }
    }

    fn from_len(len: usize) -> Option<Self> {
        match len {
            CPF_LEN => Some(Self::Cpf),
            CNPJ_LEN => Some(Self::Cnpj),
            _ => None,
        }
    }
}

impl fmt::Display for TaxIdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A validated CPF or CNPJ, stored as bare digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TaxId {
    identity: String,
    kind: TaxIdKind,
}

impl TaxId {
    /// Validate a tax ID, inferring CPF/CNPJ from the digit count.
    pub fn parse(raw: &str) -> Result<Self, TaxIdError> {
        let (identity, kind) = validate_tax_id(raw)?;
        Ok(Self { identity, kind })
    }

    /// Validate a tax ID that must be of the given kind.
    pub fn with_kind(raw: &str, kind: TaxIdKind) -> Result<Self, TaxIdError> {
        let stripped = strip_formatting(raw);
        if stripped.len() != kind.digit_count() {
            return Err(TaxIdError::InvalidFormat {
                value: raw.to_string(),
                reason: format!("{kind} must have {} digits", kind.digit_count()),
            });
        }
        Self::parse(&stripped)
    }

    /// The bare digits (no punctuation).
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn kind(&self) -> TaxIdKind {
        self.kind
    }

    /// Human-readable form: `000.000.000-00` or `00.000.000/0000-00`.
    pub fn formatted(&self) -> String {
        let d = &self.identity;
        match self.kind {
            TaxIdKind::Cpf => format!("{}.{}.{}-{}", &d[..3], &d[3..6], &d[6..9], &d[9..]),
            TaxIdKind::Cnpj => format!(
                "{}.{}.{}/{}-{}",
                &d[..2],
                &d[2..5],
                &d[5..8],
                &d[8..12],
                &d[12..]
            ),
        }
    }
}

impl fmt::Display for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

/// Remove the punctuation commonly used when writing tax IDs (`.`, `-`, `/`, whitespace).
pub fn strip_formatting(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '.' | '-' | '/') && !c.is_whitespace())
        .collect()
}

/// Validate a CPF or CNPJ and return its bare digits and kind.
///
/// Length and character checks run before any checksum math: an identifier of
/// the wrong length is always `InvalidFormat`, never `ChecksumMismatch`.
pub fn validate_tax_id(raw: &str) -> Result<(String, TaxIdKind), TaxIdError> {
    let identity = strip_formatting(raw);

    let Some(kind) = TaxIdKind::from_len(identity.chars().count()) else {
        return Err(TaxIdError::InvalidFormat {
            value: raw.to_string(),
            reason: format!(
                "invalid length: expected 11 (CPF) or 14 (CNPJ) digits, got {}",
                identity.chars().count()
            ),
        });
    };

    if !identity.chars().all(|c| c.is_ascii_digit()) {
        return Err(TaxIdError::InvalidFormat {
            value: raw.to_string(),
            reason: "must contain only digits".into(),
        });
    }

    let digits: Vec<u32> = identity.bytes().map(|b| u32::from(b - b'0')).collect();

    if digits.iter().all(|&d| d == digits[0]) {
        return Err(TaxIdError::InvalidFormat {
            value: raw.to_string(),
            reason: "all digits are equal".into(),
        });
    }

    let valid = match kind {
        TaxIdKind::Cpf => cpf_check_digits(&digits) == (digits[9], digits[10]),
        TaxIdKind::Cnpj => cnpj_check_digits(&digits) == (digits[12], digits[13]),
    };

    if !valid {
        return Err(TaxIdError::ChecksumMismatch {
            value: raw.to_string(),
            kind,
        });
    }

    Ok((identity, kind))
}

/// Mod-11 rule shared by both formats: remainder < 2 gives 0, otherwise 11 - remainder.
fn mod11_digit(sum: u32) -> u32 {
    let rem = sum % 11;
    if rem < 2 { 0 } else { 11 - rem }
}

/// Expected CPF check digits for the first nine digits of `digits`.
fn cpf_check_digits(digits: &[u32]) -> (u32, u32) {
    let first = mod11_digit(
        digits[..9]
            .iter()
            .zip((2..=10u32).rev())
            .map(|(d, w)| d * w)
            .sum(),
    );
    let second = mod11_digit(
        digits[..9]
            .iter()
            .chain(std::iter::once(&first))
            .zip((2..=11u32).rev())
            .map(|(d, w)| d * w)
            .sum(),
    );
    (first, second)
}

/// Expected CNPJ check digits for the first twelve digits of `digits`.
fn cnpj_check_digits(digits: &[u32]) -> (u32, u32) {
    let first = mod11_digit(
        digits[..12]
            .iter()
            .zip(CNPJ_WEIGHTS_FIRST)
            .map(|(d, w)| d * w)
            .sum(),
    );
    let second = mod11_digit(
        digits[..12]
            .iter()
            .chain(std::iter::once(&first))
            .zip(CNPJ_WEIGHTS_SECOND)
            .map(|(d, w)| d * w)
            .sum(),
    );
    (first, second)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_cpf_formatted() {
        let id = TaxId::parse("529.982.247-25").unwrap();
        assert_eq!(id.identity(), "52998224725");
        assert_eq!(id.kind(), TaxIdKind::Cpf);
    }

    #[test]
    fn valid_cnpj_formatted() {
        let id = TaxId::parse("11.222.333/0001-81").unwrap();
        assert_eq!(id.identity(), "11222333000181");
        assert_eq!(id.kind(), TaxIdKind::Cnpj);
    }

    #[test]
    fn cpf_wrong_check_digit() {
        assert!(matches!(
            TaxId::parse("529.982.247-26"),
            Err(TaxIdError::ChecksumMismatch { kind: TaxIdKind::Cpf, .. })
        ));
    }

    #[test]
    fn cnpj_wrong_check_digit() {
        assert!(matches!(
            TaxId::parse("11.222.333/0001-82"),
            Err(TaxIdError::ChecksumMismatch { kind: TaxIdKind::Cnpj, .. })
        ));
    }

    #[test]
    fn repeated_digits_rejected() {
        // 000.000.000-00 satisfies the checksum but is not a real CPF
        assert!(matches!(
            TaxId::parse("00000000000"),
            Err(TaxIdError::InvalidFormat { .. })
        ));
        assert!(matches!(
            TaxId::parse("11111111111111"),
            Err(TaxIdError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn letters_rejected() {
        assert!(matches!(
            TaxId::parse("5299822472A"),
            Err(TaxIdError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn with_kind_length_mismatch() {
        assert!(matches!(
            TaxId::with_kind("529.982.247-25", TaxIdKind::Cnpj),
            Err(TaxIdError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn formatted_round_trip() {
        assert_eq!(
            TaxId::parse("52998224725").unwrap().formatted(),
            "529.982.247-25"
        );
        assert_eq!(
            TaxId::parse("11222333000181").unwrap().to_string(),
            "11.222.333/0001-81"
        );
    }

    #[test]
    fn kind_codes() {
        assert_eq!(TaxIdKind::from_code("cpf"), Some(TaxIdKind::Cpf));
        assert_eq!(TaxIdKind::from_code("CNPJ"), Some(TaxIdKind::Cnpj));
        assert_eq!(TaxIdKind::from_code("RG"), None);
    }
}
