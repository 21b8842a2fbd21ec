use std::fmt;
use std::str::FromStr;

/// A worksheet column, stored as a 1-based index (`A` = 1).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Column(u32);

impl Column {
    pub fn new(index: u32) -> Option<Self> {
        (index > 0).then_some(Column(index))
    }

    pub fn index(self) -> u32 {
        self.0
    }

    /// A1 reference for this column on the given 1-based row, e.g. `H15`.
    pub fn cell(self, row: u32) -> String {
        format!("{self}{row}")
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid column `{0}`: expected letters (e.g. `H`) or a 1-based number")]
pub struct ParseColumnError(pub String);

impl FromStr for Column {
    type Err = ParseColumnError;

    /// Accepts `H`, `h`, `AA` or `8`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let err = || ParseColumnError(s.to_string());

        if raw.is_empty() {
            return Err(err());
        }

        if raw.bytes().all(|b| b.is_ascii_digit()) {
            let index: u32 = raw.parse().map_err(|_| err())?;
            return Column::new(index).ok_or_else(err);
        }

        let mut index: u32 = 0;
        for b in raw.bytes() {
            if !b.is_ascii_alphabetic() {
                return Err(err());
            }
            let digit = (b.to_ascii_uppercase() - b'A' + 1) as u32;
            index = index
                .checked_mul(26)
                .and_then(|i| i.checked_add(digit))
                .ok_or_else(err)?;
        }
        Column::new(index).ok_or_else(err)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut n = self.0;
        let mut letters = Vec::new();
        while n > 0 {
            let rem = (n - 1) % 26;
            letters.push(b'A' + rem as u8);
            n = (n - 1) / 26;
        }
        letters.reverse();
        f.write_str(&String::from_utf8_lossy(&letters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_letters_and_numbers() {
        assert_eq!("D".parse::<Column>().unwrap().index(), 4);
        assert_eq!("h".parse::<Column>().unwrap().index(), 8);
        assert_eq!("AA".parse::<Column>().unwrap().index(), 27);
        assert_eq!(" 8 ".parse::<Column>().unwrap().index(), 8);
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<Column>().is_err());
        assert!("0".parse::<Column>().is_err());
        assert!("H1".parse::<Column>().is_err());
        assert!("Ñ".parse::<Column>().is_err());
    }

    #[test]
    fn displays_as_letters() {
        assert_eq!(Column::new(1).unwrap().to_string(), "A");
        assert_eq!(Column::new(26).unwrap().to_string(), "Z");
        assert_eq!(Column::new(27).unwrap().to_string(), "AA");
        assert_eq!(Column::new(8).unwrap().cell(15), "H15");
    }
}
