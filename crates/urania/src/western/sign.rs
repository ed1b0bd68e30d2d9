//! Zodiac signs with their element, modality and rulers.

use super::body::Body;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Fire,
    Earth,
    Air,
    Water,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Cardinal,
    Fixed,
    Mutable,
}

impl Sign {
    pub const ALL: [Sign; 12] = [
        Sign::Aries,
        Sign::Taurus,
        Sign::Gemini,
        Sign::Cancer,
        Sign::Leo,
        Sign::Virgo,
        Sign::Libra,
        Sign::Scorpio,
        Sign::Sagittarius,
        Sign::Capricorn,
        Sign::Aquarius,
        Sign::Pisces,
    ];

    /// Sign at a cyclic index; any index wraps modulo 12.
    pub fn from_index(index: usize) -> Sign {
        Sign::ALL[index % 12]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        const NAMES: [&str; 12] = [
            "aries", "taurus", "gemini", "cancer",
            "leo", "virgo", "libra", "scorpio",
            "sagittarius", "capricorn", "aquarius", "pisces",
        ];
        NAMES[self.index()]
    }

    /// Elements cycle fire, earth, air, water from Aries.
    pub fn element(self) -> Element {
        match self.index() % 4 {
            0 => Element::Fire,
            1 => Element::Earth,
            2 => Element::Air,
            _ => Element::Water,
        }
    }

    /// Modalities cycle cardinal, fixed, mutable from Aries.
    pub fn modality(self) -> Modality {
        match self.index() % 3 {
            0 => Modality::Cardinal,
            1 => Modality::Fixed,
            _ => Modality::Mutable,
        }
    }

    pub fn opposite(self) -> Sign {
        Sign::from_index(self.index() + 6)
    }

    /// Planetary ruler. Modern rulership hands Scorpio, Aquarius and Pisces to the outer planets.
    pub fn ruler(self, modern: bool) -> Body {
        match (self, modern) {
            (Sign::Aries, _) => Body::Mars,
            (Sign::Taurus, _) | (Sign::Libra, _) => Body::Venus,
            (Sign::Gemini, _) | (Sign::Virgo, _) => Body::Mercury,
            (Sign::Cancer, _) => Body::Moon,
            (Sign::Leo, _) => Body::Sun,
            (Sign::Scorpio, true) => Body::Pluto,
            (Sign::Scorpio, false) => Body::Mars,
            (Sign::Sagittarius, _) => Body::Jupiter,
            (Sign::Capricorn, _) => Body::Saturn,
            (Sign::Aquarius, true) => Body::Uranus,
            (Sign::Aquarius, false) => Body::Saturn,
            (Sign::Pisces, true) => Body::Neptune,
            (Sign::Pisces, false) => Body::Jupiter,
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_and_modality_cycles() {
        assert_eq!(Sign::Leo.element(), Element::Fire);
        assert_eq!(Sign::Capricorn.element(), Element::Earth);
        assert_eq!(Sign::Aquarius.element(), Element::Air);
        assert_eq!(Sign::Pisces.element(), Element::Water);
        assert_eq!(Sign::Libra.modality(), Modality::Cardinal);
        assert_eq!(Sign::Scorpio.modality(), Modality::Fixed);
        assert_eq!(Sign::Sagittarius.modality(), Modality::Mutable);
    }

    #[test]
    fn test_sign_ruler_traditional() {
        assert_eq!(Sign::Aries.ruler(false), Body::Mars);
        assert_eq!(Sign::Cancer.ruler(false), Body::Moon);
        assert_eq!(Sign::Leo.ruler(false), Body::Sun);
        assert_eq!(Sign::Scorpio.ruler(false), Body::Mars);
    }

    #[test]
    fn test_sign_ruler_modern() {
        assert_eq!(Sign::Scorpio.ruler(true), Body::Pluto);
        assert_eq!(Sign::Aquarius.ruler(true), Body::Uranus);
        assert_eq!(Sign::Pisces.ruler(true), Body::Neptune);
    }
}
