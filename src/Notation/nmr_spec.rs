use crate::Notation::GrammarError;
use crate::Notation::lexer::{Lexeme, Scanner};
use serde::{Deserialize, Serialize};

/// Multiplet types of the 13C-NMR notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Nmr13CType {
    /// S — singlet
    Singlet,
    /// DL — doublet, coupling to the left neighbour
    DoubletLeft,
    /// DR — doublet, coupling to the right neighbour
    DoubletRight,
    /// DD — double doublet
    DoubleDoublet,
    /// T — triplet
    Triplet,
}

impl Nmr13CType {
    /// historical numeric encoding S=1, DL=2, DR=3, DD=4, T=5
    pub fn code(&self) -> u8 {
        match self {
            Nmr13CType::Singlet => 1,
            Nmr13CType::DoubletLeft => 2,
            Nmr13CType::DoubletRight => 3,
            Nmr13CType::DoubleDoublet => 4,
            Nmr13CType::Triplet => 5,
        }
    }

    pub fn letter(&self) -> &'static str {
        match self {
            Nmr13CType::Singlet => "S",
            Nmr13CType::DoubletLeft => "DL",
            Nmr13CType::DoubletRight => "DR",
            Nmr13CType::DoubleDoublet => "DD",
            Nmr13CType::Triplet => "T",
        }
    }
}

/// Parsed 1H-NMR notation `Pool#P1,2,...` (1-based atom positions,
/// sorted, duplicate-free).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nmr1HSpec {
    pub pool: String,
    pub positions: Vec<u32>,
}

/// Parsed 13C-NMR notation `Pool#S1,DL2,DD3,...`. A multiplet letter
/// sticks for subsequent bare positions (`Glc#S1,2` means S at 1 and 2).
/// Positions are sorted within each run of equal type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nmr13CSpec {
    pub pool: String,
    pub entries: Vec<(u32, Nmr13CType)>,
}

/// Parser for the 1H-NMR position notation.
/// Error codes: 1 bad pool name, 2 bad position list, 3 duplicate
/// position.
pub fn parse_1hnmr_spec(s: &str) -> Result<Nmr1HSpec, GrammarError> {
    let mut sc = Scanner::new(s);
    let pool = match sc.next_lexeme() {
        Lexeme::Id(id) => id.to_string(),
        _ => return Err(GrammarError::ParseError(s.to_string())),
    };
    if !sc.accept(Lexeme::Hash) || !sc.rest().starts_with('P') {
        return Err(GrammarError::ParseError(s.to_string()));
    }
    sc.bump(1);

    let expected = sc.rest().chars().filter(|&c| c == ',').count() + 1;
    let mut positions = Vec::with_capacity(expected);
    loop {
        let v = sc
            .integer()
            .ok_or_else(|| GrammarError::InvalidRange(s.to_string()))?;
        if v == 0 {
            return Err(GrammarError::InvalidRange(s.to_string()));
        }
        positions.push(v as u32);
        if positions.len() == expected {
            break;
        }
        if !sc.accept(Lexeme::Comma) {
            return Err(GrammarError::InvalidRange(s.to_string()));
        }
        // a repeated P marker after the comma is tolerated: Ala#P1,P2
        if sc.rest().starts_with('P') {
            sc.bump(1);
        }
    }
    if !sc.at_end() {
        return Err(GrammarError::InvalidRange(s.to_string()));
    }
    positions.sort_unstable();
    if positions.windows(2).any(|w| w[0] == w[1]) {
        return Err(GrammarError::DuplicatePosition(s.to_string()));
    }
    Ok(Nmr1HSpec { pool, positions })
}

/// Parser for the 13C-NMR multiplet notation.
/// Error codes: 1 bad pool name, 2 bad position list (position 0, DL or
/// T at position 1, unknown multiplet letter), 3 duplicate position
/// within one multiplet type.
pub fn parse_13cnmr_spec(s: &str) -> Result<Nmr13CSpec, GrammarError> {
    let mut sc = Scanner::new(s);
    let pool = match sc.next_lexeme() {
        Lexeme::Id(id) => id.to_string(),
        _ => return Err(GrammarError::ParseError(s.to_string())),
    };
    if !sc.accept(Lexeme::Hash) {
        return Err(GrammarError::ParseError(s.to_string()));
    }

    let expected = sc.rest().chars().filter(|&c| c == ',').count() + 1;
    let mut entries: Vec<(u32, Nmr13CType)> = Vec::with_capacity(expected);
    let mut prev_type: Option<Nmr13CType> = None;
    loop {
        let rest = sc.rest();
        let newtype = if rest.starts_with('S') {
            sc.bump(1);
            Some(Nmr13CType::Singlet)
        } else if rest.starts_with('T') {
            sc.bump(1);
            Some(Nmr13CType::Triplet)
        } else if rest.starts_with("DL") {
            sc.bump(2);
            Some(Nmr13CType::DoubletLeft)
        } else if rest.starts_with("DR") {
            sc.bump(2);
            Some(Nmr13CType::DoubletRight)
        } else if rest.starts_with("DD") {
            sc.bump(2);
            Some(Nmr13CType::DoubleDoublet)
        } else if rest.starts_with('D') {
            return Err(GrammarError::InvalidRange(s.to_string()));
        } else {
            None
        };
        // the type letter sticks for subsequent bare positions
        let ty = match newtype.or(prev_type) {
            Some(ty) => ty,
            None => return Err(GrammarError::InvalidRange(s.to_string())),
        };
        prev_type = Some(ty);

        let v = sc
            .integer()
            .ok_or_else(|| GrammarError::InvalidRange(s.to_string()))?;
        // position 0 never exists; DL and T couple to the left, so
        // position 1 is impossible for them regardless of the pool
        if v == 0
            || ((ty == Nmr13CType::DoubletLeft || ty == Nmr13CType::Triplet) && v == 1)
        {
            return Err(GrammarError::InvalidRange(s.to_string()));
        }
        entries.push((v as u32, ty));
        if entries.len() == expected {
            break;
        }
        if !sc.accept(Lexeme::Comma) {
            return Err(GrammarError::InvalidRange(s.to_string()));
        }
    }
    if !sc.at_end() {
        return Err(GrammarError::InvalidRange(s.to_string()));
    }

    // sort positions within each run of equal multiplet type and check
    // for duplicates there
    let mut i = 0;
    while i < entries.len() {
        let mut k = i;
        while k + 1 < entries.len() && entries[k + 1].1 == entries[i].1 {
            k += 1;
        }
        entries[i..=k].sort_unstable_by_key(|e| e.0);
        if entries[i..=k].windows(2).any(|w| w[0].0 == w[1].0) {
            return Err(GrammarError::DuplicatePosition(s.to_string()));
        }
        i = k + 1;
    }
    Ok(Nmr13CSpec { pool, entries })
}

/// Semantic boundary rule for 13C multiplets, enforced by the consumer
/// once the pool's atom count is known: DL cannot sit on the first
/// atom, DR cannot sit on the last, DD and T can sit on neither; every
/// position must exist in the pool.
pub fn check_13cnmr_boundaries(spec: &Nmr13CSpec, natoms: usize) -> Result<(), GrammarError> {
    for &(pos, ty) in &spec.entries {
        let pos = pos as usize;
        if pos > natoms {
            return Err(GrammarError::InvalidRange(format!(
                "{}: position {} exceeds {} atoms",
                spec.pool, pos, natoms
            )));
        }
        let at_first = pos == 1;
        let at_last = pos == natoms;
        let illegal = match ty {
            Nmr13CType::Singlet => false,
            Nmr13CType::DoubletLeft => at_first,
            Nmr13CType::DoubletRight => at_last,
            Nmr13CType::DoubleDoublet | Nmr13CType::Triplet => at_first || at_last,
        };
        if illegal {
            return Err(GrammarError::InvalidRange(format!(
                "{}: multiplet type {} impossible at position {}",
                spec.pool,
                ty.letter(),
                pos
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_1hnmr_spec() {
        let nmr = parse_1hnmr_spec("Ala#P1,3,2").unwrap();
        assert_eq!(nmr.pool, "Ala");
        assert_eq!(nmr.positions, vec![1, 2, 3]);
    }

    #[test]
    fn test_1hnmr_repeated_marker() {
        let nmr = parse_1hnmr_spec("Ala#P1,P2").unwrap();
        assert_eq!(nmr.positions, vec![1, 2]);
    }

    #[test]
    fn test_1hnmr_errors() {
        assert_eq!(parse_1hnmr_spec("#P1").unwrap_err().code(), 1);
        assert_eq!(parse_1hnmr_spec("Ala#P0").unwrap_err().code(), 2);
        assert_eq!(parse_1hnmr_spec("Ala#P1,1").unwrap_err().code(), 3);
    }

    #[test]
    fn test_parse_13cnmr_spec() {
        let nmr = parse_13cnmr_spec("Glc#S1,DL3,DR2").unwrap();
        assert_eq!(nmr.pool, "Glc");
        assert_eq!(
            nmr.entries,
            vec![
                (1, Nmr13CType::Singlet),
                (3, Nmr13CType::DoubletLeft),
                (2, Nmr13CType::DoubletRight),
            ]
        );
    }

    #[test]
    fn test_13cnmr_sticky_type() {
        let nmr = parse_13cnmr_spec("Glc#S3,1,2").unwrap();
        // bare positions inherit S; positions sorted within the run
        assert_eq!(
            nmr.entries,
            vec![
                (1, Nmr13CType::Singlet),
                (2, Nmr13CType::Singlet),
                (3, Nmr13CType::Singlet),
            ]
        );
    }

    #[test]
    fn test_13cnmr_dl_and_t_rejected_at_position_one() {
        assert_eq!(parse_13cnmr_spec("Glc#DL1").unwrap_err().code(), 2);
        assert_eq!(parse_13cnmr_spec("Glc#T1").unwrap_err().code(), 2);
    }

    #[test]
    fn test_13cnmr_duplicate_within_type_run() {
        assert_eq!(parse_13cnmr_spec("Glc#S1,1").unwrap_err().code(), 3);
        // the same position under different types is allowed by the grammar
        assert!(parse_13cnmr_spec("Glc#S2,DR2").is_ok());
    }

    #[test]
    fn test_13cnmr_boundary_semantics() {
        let spec = parse_13cnmr_spec("Glc#DR3").unwrap();
        assert!(check_13cnmr_boundaries(&spec, 3).is_err());
        assert!(check_13cnmr_boundaries(&spec, 4).is_ok());

        let spec = parse_13cnmr_spec("Glc#DD2,T3").unwrap();
        assert!(check_13cnmr_boundaries(&spec, 4).is_ok());
        assert!(check_13cnmr_boundaries(&spec, 3).is_err());

        let spec = parse_13cnmr_spec("Glc#S5").unwrap();
        assert!(check_13cnmr_boundaries(&spec, 3).is_err());
    }
}
