use crate::western::{Element, Modality, Sign};
use serde::{Deserialize, Serialize};

/// Bodies per element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElementBalance {
    pub fire: u32,
    pub earth: u32,
    pub air: u32,
    pub water: u32,
}

impl ElementBalance {
    pub fn from_signs<I: IntoIterator<Item = Sign>>(signs: I) -> Self {
        let mut balance = Self::default();
        for sign in signs {
            match sign.element() {
                Element::Fire => balance.fire += 1,
                Element::Earth => balance.earth += 1,
                Element::Air => balance.air += 1,
                Element::Water => balance.water += 1,
            }
        }
        balance
    }

    pub fn count(&self, element: Element) -> u32 {
        match element {
            Element::Fire => self.fire,
            Element::Earth => self.earth,
            Element::Air => self.air,
            Element::Water => self.water,
        }
    }

    pub fn total(&self) -> u32 {
        self.fire + self.earth + self.air + self.water
    }

    /// Element with the most bodies; the earlier element wins a tie. `None` when empty.
    pub fn dominant(&self) -> Option<Element> {
        [Element::Fire, Element::Earth, Element::Air, Element::Water]
            .into_iter()
            .filter(|e| self.count(*e) > 0)
            .fold(None, |best: Option<Element>, e| match best {
                Some(b) if self.count(b) >= self.count(e) => Some(b),
                _ => Some(e),
            })
    }
}

/// Bodies per modality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModalityBalance {
    pub cardinal: u32,
    pub fixed: u32,
    pub mutable: u32,
}

impl ModalityBalance {
    pub fn from_signs<I: IntoIterator<Item = Sign>>(signs: I) -> Self {
        let mut balance = Self::default();
        for sign in signs {
            match sign.modality() {
                Modality::Cardinal => balance.cardinal += 1,
                Modality::Fixed => balance.fixed += 1,
                Modality::Mutable => balance.mutable += 1,
            }
        }
        balance
    }

    pub fn count(&self, modality: Modality) -> u32 {
        match modality {
            Modality::Cardinal => self.cardinal,
            Modality::Fixed => self.fixed,
            Modality::Mutable => self.mutable,
        }
    }

    pub fn total(&self) -> u32 {
        self.cardinal + self.fixed + self.mutable
    }

    pub fn dominant(&self) -> Option<Modality> {
        [Modality::Cardinal, Modality::Fixed, Modality::Mutable]
            .into_iter()
            .filter(|m| self.count(*m) > 0)
            .fold(None, |best: Option<Modality>, m| match best {
                Some(b) if self.count(b) >= self.count(m) => Some(b),
                _ => Some(m),
            })
    }
}
