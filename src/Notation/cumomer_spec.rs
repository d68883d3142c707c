use crate::Notation::GrammarError;
use crate::Notation::atom_mask::{AtomMask, LIMIT_MAX_ATOMS};
use crate::Notation::lexer::{Lexeme, Scanner};
use serde::{Deserialize, Serialize};

/// Parsed generic cumomer notation `Pool#[01x]+`, one character per
/// atom position: `1` fixes a labeled position, `0` an unlabeled one,
/// `x`/`X` marks a position to be varied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CumomerSpec {
    pub pool: String,
    /// positions marked `x` (to be varied)
    pub xmask: AtomMask,
    /// positions fixed at `1`
    pub mask: AtomMask,
}

impl CumomerSpec {
    /// number of atom positions covered by the configuration string
    pub fn num_atoms(&self) -> usize {
        self.mask.len()
    }
}

/// Parser for the generic labeling notation `Pool#[01x]+`.
pub fn parse_cumomer_spec(s: &str) -> Result<CumomerSpec, GrammarError> {
    let mut sc = Scanner::new(s);
    let pool = match sc.next_lexeme() {
        Lexeme::Id(id) => id.to_string(),
        _ => return Err(GrammarError::ParseError(s.to_string())),
    };
    if !sc.accept(Lexeme::Hash) {
        return Err(GrammarError::ParseError(s.to_string()));
    }
    let body = sc.rest();
    if body.len() > LIMIT_MAX_ATOMS {
        return Err(GrammarError::InvalidRange(s.to_string()));
    }
    let mut mask = AtomMask::new(body.len());
    let mut xmask = AtomMask::new(body.len());
    for (i, c) in body.chars().enumerate() {
        match c {
            '1' => mask.set(i),
            'x' | 'X' => xmask.set(i),
            '0' => {}
            _ => return Err(GrammarError::ParseError(s.to_string())),
        }
    }
    Ok(CumomerSpec { pool, xmask, mask })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cumomer_spec() {
        let c = parse_cumomer_spec("Glc#1x0x01").unwrap();
        assert_eq!(c.pool, "Glc");
        assert_eq!(c.num_atoms(), 6);
        assert!(c.mask.get(0) && c.mask.get(5));
        assert_eq!(c.mask.count_ones(), 2);
        assert!(c.xmask.get(1) && c.xmask.get(3));
        assert_eq!(c.xmask.count_ones(), 2);
    }

    #[test]
    fn test_upper_case_x() {
        let c = parse_cumomer_spec("A#X1").unwrap();
        assert!(c.xmask.get(0));
        assert!(c.mask.get(1));
    }

    #[test]
    fn test_rejects_stray_characters() {
        assert!(parse_cumomer_spec("Glc#012").is_err());
        assert!(parse_cumomer_spec("#01").is_err());
    }
}
