//! Element data for the atoms that occur in peptoid monomers and reagents.

/// A chemical element with the data needed for valence bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    pub atomic_number: u8,
    pub symbol: &'static str,
    pub atomic_weight: f64,
    /// Allowed neutral valences, smallest first. Empty means "do not check".
    pub valences: &'static [u8],
}

static ELEMENTS: &[Element] = &[
    Element { atomic_number: 1, symbol: "H", atomic_weight: 1.008, valences: &[1] },
    Element { atomic_number: 3, symbol: "Li", atomic_weight: 6.941, valences: &[1] },
    Element { atomic_number: 5, symbol: "B", atomic_weight: 10.81, valences: &[3] },
    Element { atomic_number: 6, symbol: "C", atomic_weight: 12.011, valences: &[4] },
    Element { atomic_number: 7, symbol: "N", atomic_weight: 14.007, valences: &[3, 5] },
    Element { atomic_number: 8, symbol: "O", atomic_weight: 15.999, valences: &[2] },
    Element { atomic_number: 9, symbol: "F", atomic_weight: 18.998, valences: &[1] },
    Element { atomic_number: 11, symbol: "Na", atomic_weight: 22.990, valences: &[1] },
    Element { atomic_number: 12, symbol: "Mg", atomic_weight: 24.305, valences: &[2] },
    Element { atomic_number: 14, symbol: "Si", atomic_weight: 28.086, valences: &[4] },
    Element { atomic_number: 15, symbol: "P", atomic_weight: 30.974, valences: &[3, 5, 7] },
    Element { atomic_number: 16, symbol: "S", atomic_weight: 32.06, valences: &[2, 4, 6] },
    Element { atomic_number: 17, symbol: "Cl", atomic_weight: 35.45, valences: &[1] },
    Element { atomic_number: 19, symbol: "K", atomic_weight: 39.098, valences: &[1] },
    Element { atomic_number: 20, symbol: "Ca", atomic_weight: 40.078, valences: &[2] },
    Element { atomic_number: 26, symbol: "Fe", atomic_weight: 55.845, valences: &[] },
    Element { atomic_number: 29, symbol: "Cu", atomic_weight: 63.546, valences: &[] },
    Element { atomic_number: 30, symbol: "Zn", atomic_weight: 65.38, valences: &[] },
    Element { atomic_number: 33, symbol: "As", atomic_weight: 74.922, valences: &[3, 5] },
    Element { atomic_number: 34, symbol: "Se", atomic_weight: 78.96, valences: &[2, 4, 6] },
    Element { atomic_number: 35, symbol: "Br", atomic_weight: 79.904, valences: &[1] },
    Element { atomic_number: 53, symbol: "I", atomic_weight: 126.904, valences: &[1, 3, 5] },
];

/// Look up an element by its symbol (e.g. "C", "Br").
pub fn element_by_symbol(symbol: &str) -> Option<&'static Element> {
    ELEMENTS.iter().find(|e| e.symbol == symbol)
}

/// Look up an element by its atomic number.
pub fn element_by_number(n: u8) -> Option<&'static Element> {
    ELEMENTS.iter().find(|e| e.atomic_number == n)
}

/// Allowed valences for an atom with the given formal charge.
///
/// Charged p-block atoms take the valences of their isoelectronic neighbour
/// in the same period, so `[N+]` behaves like carbon and `[O-]` like fluorine.
pub fn valences_for(atomic_number: u8, formal_charge: i8) -> &'static [u8] {
    let own = element_by_number(atomic_number).map(|e| e.valences).unwrap_or(&[]);
    if formal_charge == 0 {
        return own;
    }
    let shifted = atomic_number as i16 - formal_charge as i16;
    let same_period = |z: i16| match atomic_number {
        5..=9 => (5..=9).contains(&z),
        13..=17 => (13..=17).contains(&z),
        31..=35 => (31..=35).contains(&z),
        _ => false,
    };
    if same_period(shifted) {
        element_by_number(shifted as u8).map(|e| e.valences).unwrap_or(own)
    } else {
        own
    }
}

/// Whether the element can be written without brackets in SMILES.
pub fn is_organic_subset(atomic_number: u8, aromatic: bool) -> bool {
    if aromatic {
        matches!(atomic_number, 5 | 6 | 7 | 8 | 15 | 16)
    } else {
        matches!(atomic_number, 5 | 6 | 7 | 8 | 9 | 15 | 16 | 17 | 35 | 53)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_symbol_and_number() {
        let br = element_by_symbol("Br").unwrap();
        assert_eq!(br.atomic_number, 35);
        assert_eq!(element_by_number(7).unwrap().symbol, "N");
        assert!(element_by_symbol("Zz").is_none());
        assert!(element_by_number(0).is_none());
    }

    #[test]
    fn charged_atoms_shift_valence() {
        assert_eq!(valences_for(7, 1), &[4]);
        assert_eq!(valences_for(8, -1), &[1]);
        assert_eq!(valences_for(8, 1), &[3, 5]);
        assert_eq!(valences_for(6, 0), &[4]);
        // sodium has no isoelectronic partner in the table
        assert_eq!(valences_for(11, 1), &[1]);
    }

    #[test]
    fn organic_subset() {
        assert!(is_organic_subset(35, false));
        assert!(!is_organic_subset(35, true));
        assert!(is_organic_subset(7, true));
        assert!(!is_organic_subset(11, false));
    }
}
