//! Packed two-letter country codes.

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// A two-letter ISO country code packed into 16 bits.
///
/// The first letter is the high byte and the second letter the low byte, so
/// `"CN"` packs to `0x434E`. The packed value is both the sort key of the
/// range table and the on-disk identifier, which keeps codes readable in a
/// hex dump of the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CountryCode(u16);

impl CountryCode {
    /// China, the default selection of the generator.
    pub const CN: Self = Self(u16::from_be_bytes(*b"CN"));

    /// Pack two ASCII letters into a country code.
    ///
    /// Lowercase letters are normalised to uppercase.
    pub fn pack(code: &str) -> Result<Self, Error> {
        let bytes = code.as_bytes();
        if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(Error::InvalidCountryCode(code.to_string()));
        }
        Ok(Self(u16::from_be_bytes([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
        ])))
    }

    /// Wrap an already packed value, e.g. one read back from a database file.
    ///
    /// Returns `None` if either byte is not an uppercase ASCII letter.
    pub fn from_packed(value: u16) -> Option<Self> {
        let [hi, lo] = value.to_be_bytes();
        if hi.is_ascii_uppercase() && lo.is_ascii_uppercase() {
            Some(Self(value))
        } else {
            None
        }
    }

    /// The packed 16-bit value.
    pub fn packed(self) -> u16 {
        self.0
    }

    /// The two letters of the code.
    pub fn unpack(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    /// The code as an owned string.
    pub fn as_string(self) -> String {
        let [hi, lo] = self.unpack();
        [hi as char, lo as char].iter().collect()
    }
}

impl FromStr for CountryCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::pack(s.trim())
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [hi, lo] = self.unpack();
        write!(f, "{}{}", hi as char, lo as char)
    }
}
