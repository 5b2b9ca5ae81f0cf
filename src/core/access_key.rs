use chrono::{DateTime, Datelike, FixedOffset};
use serde::{Deserialize, Serialize};

use super::error::FiscalError;
use super::types::{EmissionType, Model};
use super::uf::Uf;

/// The 44-digit key uniquely identifying one fiscal document:
///
/// ```text
/// UU YYMM IIIIIIIIIIIIII MM SSS NNNNNNNNN E CCCCCCCC D
/// ```
///
/// region(2) + year/month(4) + issuer CNPJ(14) + model(2) + series(3) +
/// number(9) + emission type(1) + nonce(8) + check digit(1). The check digit
/// is validated by the authority; any deviation from the mod-11 algorithm
/// causes document rejection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessKey(String);

impl AccessKey {
    /// Derive the key from its components. Deterministic except for the
    /// caller-supplied nonce.
    #[allow(clippy::too_many_arguments)]
    pub fn generate(
        uf: Uf,
        issued_at: &DateTime<FixedOffset>,
        cnpj: &str,
        model: Model,
        series: u16,
        number: u64,
        emission: EmissionType,
        nonce: u32,
    ) -> Result<Self, FiscalError> {
        if cnpj.len() != 14 || !cnpj.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FiscalError::Validation(format!(
                "issuer tax id must be 14 digits, got {cnpj:?}"
            )));
        }
        if series > 999 {
            return Err(FiscalError::Validation(format!(
                "series {series} exceeds 3 digits"
            )));
        }
        if number == 0 || number > 999_999_999 {
            return Err(FiscalError::Validation(format!(
                "document number {number} out of range 1..=999999999"
            )));
        }
        if nonce > 99_999_999 {
            return Err(FiscalError::Validation(format!(
                "nonce {nonce} exceeds 8 digits"
            )));
        }

        let year = issued_at.year() % 100;
        let month = issued_at.month();
        let prefix = format!(
            "{:02}{:02}{:02}{}{}{:03}{:09}{}{:08}",
            uf.code(),
            year,
            month,
            cnpj,
            model.code(),
            series,
            number,
            emission.code(),
            nonce,
        );
        debug_assert_eq!(prefix.len(), 43);
        let dv = check_digit(&prefix)?;
        Ok(Self(format!("{prefix}{dv}")))
    }

    /// Parse and validate an existing 44-digit key, including its check
    /// digit.
    pub fn parse(s: &str) -> Result<Self, FiscalError> {
        if s.len() != 44 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FiscalError::Validation(format!(
                "access key must be 44 digits, got {:?}",
                s
            )));
        }
        let expected = check_digit(&s[..43])?;
        let actual = s.as_bytes()[43] - b'0';
        if expected != actual {
            return Err(FiscalError::Validation(format!(
                "access key check digit mismatch: expected {expected}, found {actual}"
            )));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// IBGE code of the issuing state (first two digits).
    pub fn uf(&self) -> Option<Uf> {
        self.0[..2].parse::<u8>().ok().and_then(Uf::from_code)
    }

    /// Check digit (last digit).
    pub fn check_digit(&self) -> u8 {
        self.0.as_bytes()[43] - b'0'
    }
}

impl std::fmt::Display for AccessKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mod-11 check digit over a 43-digit prefix: weights cycle 2..=9 from the
/// rightmost digit; remainder < 2 maps to 0, otherwise 11 − remainder.
pub fn check_digit(prefix: &str) -> Result<u8, FiscalError> {
    if prefix.len() != 43 || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FiscalError::Validation(format!(
            "check digit input must be 43 digits, got {} chars",
            prefix.len()
        )));
    }
    let mut weight: u32 = 2;
    let mut sum: u32 = 0;
    for b in prefix.bytes().rev() {
        sum += u32::from(b - b'0') * weight;
        weight = if weight == 9 { 2 } else { weight + 1 };
    }
    let remainder = sum % 11;
    Ok(if remainder < 2 {
        0
    } else {
        (11 - remainder) as u8
    })
}
