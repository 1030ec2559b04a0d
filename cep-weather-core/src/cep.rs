use std::fmt;

use crate::error::WeatherError;

/// A Brazilian postal code: exactly eight ASCII digits, no separators.
///
/// The only way to get one is [`Cep::parse`], so anything holding a `Cep`
/// has already passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cep(String);

impl Cep {
    pub const LEN: usize = 8;

    pub fn parse(raw: &str) -> Result<Self, WeatherError> {
        if raw.len() == Self::LEN && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(raw.to_owned()))
        } else {
            Err(WeatherError::InvalidZipCode)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for Cep {
    type Error = WeatherError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_eight_digits() {
        let cep = Cep::parse("01001000").expect("valid cep");
        assert_eq!(cep.as_str(), "01001000");
        assert_eq!(cep.to_string(), "01001000");
    }

    #[test]
    fn rejects_everything_else() {
        let bad = [
            "",
            "12345",
            "1234567",
            "123456789",
            "01001-000",
            "0100100a",
            " 01001000",
            "01001000 ",
            "0100 1000",
            // Arabic-Indic digits are digits, just not ASCII ones.
            "٠١٠٠١٠٠٠",
        ];

        for raw in bad {
            let err = Cep::parse(raw).unwrap_err();
            assert!(matches!(err, WeatherError::InvalidZipCode), "accepted {raw:?}");
        }
    }

    #[test]
    fn try_from_matches_parse() {
        assert!(Cep::try_from("99999999").is_ok());
        assert!(Cep::try_from("9999999").is_err());
    }
}
