use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

/// Brazilian federative unit (state or federal district).
///
/// The numeric codes are the two-digit IBGE codes embedded in access keys
/// and carried in the `cUF` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Uf {
    Ro,
    Ac,
    Am,
    Rr,
    Pa,
    Ap,
    To,
    Ma,
    Pi,
    Ce,
    Rn,
    Pb,
    Pe,
    Al,
    Se,
    Ba,
    Mg,
    Es,
    Rj,
    Sp,
    Pr,
    Sc,
    Rs,
    Ms,
    Mt,
    Go,
    Df,
}

impl Uf {
    /// Two-digit IBGE numeric code.
    pub fn code(&self) -> u8 {
        match self {
            Self::Ro => 11,
            Self::Ac => 12,
            Self::Am => 13,
            Self::Rr => 14,
            Self::Pa => 15,
            Self::Ap => 16,
            Self::To => 17,
            Self::Ma => 21,
            Self::Pi => 22,
            Self::Ce => 23,
            Self::Rn => 24,
            Self::Pb => 25,
            Self::Pe => 26,
            Self::Al => 27,
            Self::Se => 28,
            Self::Ba => 29,
            Self::Mg => 31,
            Self::Es => 32,
            Self::Rj => 33,
            Self::Sp => 35,
            Self::Pr => 41,
            Self::Sc => 42,
            Self::Rs => 43,
            Self::Ms => 50,
            Self::Mt => 51,
            Self::Go => 52,
            Self::Df => 53,
        }
    }

    /// Parse from the IBGE numeric code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            11 => Some(Self::Ro),
            12 => Some(Self::Ac),
            13 => Some(Self::Am),
            14 => Some(Self::Rr),
            15 => Some(Self::Pa),
            16 => Some(Self::Ap),
            17 => Some(Self::To),
            21 => Some(Self::Ma),
            22 => Some(Self::Pi),
            23 => Some(Self::Ce),
            24 => Some(Self::Rn),
            25 => Some(Self::Pb),
            26 => Some(Self::Pe),
            27 => Some(Self::Al),
            28 => Some(Self::Se),
            29 => Some(Self::Ba),
            31 => Some(Self::Mg),
            32 => Some(Self::Es),
            33 => Some(Self::Rj),
            35 => Some(Self::Sp),
            41 => Some(Self::Pr),
            42 => Some(Self::Sc),
            43 => Some(Self::Rs),
            50 => Some(Self::Ms),
            51 => Some(Self::Mt),
            52 => Some(Self::Go),
            53 => Some(Self::Df),
            _ => None,
        }
    }

    /// Two-letter state abbreviation (the `UF` element value).
    pub fn sigla(&self) -> &'static str {
        match self {
            Self::Ro => "RO",
            Self::Ac => "AC",
            Self::Am => "AM",
            Self::Rr => "RR",
            Self::Pa => "PA",
            Self::Ap => "AP",
            Self::To => "TO",
            Self::Ma => "MA",
            Self::Pi => "PI",
            Self::Ce => "CE",
            Self::Rn => "RN",
            Self::Pb => "PB",
            Self::Pe => "PE",
            Self::Al => "AL",
            Self::Se => "SE",
            Self::Ba => "BA",
            Self::Mg => "MG",
            Self::Es => "ES",
            Self::Rj => "RJ",
            Self::Sp => "SP",
            Self::Pr => "PR",
            Self::Sc => "SC",
            Self::Rs => "RS",
            Self::Ms => "MS",
            Self::Mt => "MT",
            Self::Go => "GO",
            Self::Df => "DF",
        }
    }

    /// Parse from the two-letter abbreviation (case-insensitive).
    pub fn from_sigla(sigla: &str) -> Option<Self> {
        let upper = sigla.to_ascii_uppercase();
        [
            Self::Ro,
            Self::Ac,
            Self::Am,
            Self::Rr,
            Self::Pa,
            Self::Ap,
            Self::To,
            Self::Ma,
            Self::Pi,
            Self::Ce,
            Self::Rn,
            Self::Pb,
            Self::Pe,
            Self::Al,
            Self::Se,
            Self::Ba,
            Self::Mg,
            Self::Es,
            Self::Rj,
            Self::Sp,
            Self::Pr,
            Self::Sc,
            Self::Rs,
            Self::Ms,
            Self::Mt,
            Self::Go,
            Self::Df,
        ]
        .into_iter()
        .find(|uf| uf.sigla() == upper)
    }

    /// Fixed UTC offset used for emission timestamps in this state.
    ///
    /// Brazil abolished daylight saving in 2019, so the offsets are fixed:
    /// UTC-5 for Acre, UTC-4 for the western states, UTC-3 elsewhere.
    pub fn utc_offset(&self) -> FixedOffset {
        let hours = match self {
            Self::Ac => 5,
            Self::Am | Self::Rr | Self::Ro | Self::Mt | Self::Ms => 4,
            _ => 3,
        };
        FixedOffset::west_opt(hours * 3600).expect("offset within valid range")
    }
}

impl std::fmt::Display for Uf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.sigla())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_round_trip() {
        for code in 0..=99u8 {
            if let Some(uf) = Uf::from_code(code) {
                assert_eq!(uf.code(), code);
            }
        }
    }

    #[test]
    fn sigla_round_trip() {
        assert_eq!(Uf::from_sigla("sp"), Some(Uf::Sp));
        assert_eq!(Uf::from_sigla("RS"), Some(Uf::Rs));
        assert_eq!(Uf::from_sigla("XX"), None);
        assert_eq!(Uf::Mg.sigla(), "MG");
    }

    #[test]
    fn offsets() {
        assert_eq!(Uf::Sp.utc_offset().local_minus_utc(), -3 * 3600);
        assert_eq!(Uf::Am.utc_offset().local_minus_utc(), -4 * 3600);
        assert_eq!(Uf::Ac.utc_offset().local_minus_utc(), -5 * 3600);
    }
}
