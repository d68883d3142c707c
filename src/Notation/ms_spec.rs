use crate::Notation::GrammarError;
use crate::Notation::atom_mask::{AtomMask, LIMIT_MAX_ATOMS, range_entry};
use crate::Notation::lexer::{Lexeme, Scanner};
use serde::{Deserialize, Serialize};

/// Parsed MS fragment notation `Pool[ranges]#Mw0,w1,...`.
/// Weights come out sorted ascending and duplicate-free.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsSpec {
    pub pool: String,
    pub weights: Vec<i64>,
    /// labelable positions covered by the range spec (all positions up
    /// to the capacity limit when no range is given)
    pub mask: AtomMask,
}

/// Parsed multi-isotope MS notation `Pool[ranges]#M(u,v,w),...`.
/// One weight per tracked isotope in each tuple; tuples sorted
/// lexicographically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MimsSpec {
    pub pool: String,
    pub num_isotopes: usize,
    pub weights: Vec<Vec<i64>>,
    pub mask: AtomMask,
}

/// Parsed tandem MS/MS notation `Pool[frag:subfrag]#M(u,v),...` with
/// the fragment mask and the sub-fragment mask (a subset of the first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsMsSpec {
    pub pool: String,
    pub weights: Vec<(i64, i64)>,
    pub mask1: AtomMask,
    pub mask2: AtomMask,
}

// historical error codes of the MS notation family
fn ms_err(code: u8, s: &str) -> GrammarError {
    match code {
        1 => GrammarError::ParseError(s.to_string()),
        2 => GrammarError::InvalidRange(s.to_string()),
        3 => GrammarError::OverlappingRange(s.to_string()),
        4 => GrammarError::InsufficientPositions(s.to_string()),
        _ => GrammarError::InvalidWeightSpec(s.to_string()),
    }
}

// comma-separated range entries accumulated into `mask`; returns the
// number of covered positions and the (consumed) terminating lexeme
fn range_list<'a>(
    sc: &mut Scanner<'a>,
    s: &str,
    mask: &mut AtomMask,
) -> Result<(usize, Lexeme<'a>), GrammarError> {
    let mut catoms = 0usize;
    loop {
        let (lo, hi) = range_entry(sc).map_err(|c| ms_err(c, s))?;
        let before = mask.count_ones();
        mask.set_range(lo - 1, hi - 1);
        if before + (hi - lo + 1) > mask.count_ones() {
            return Err(ms_err(3, s));
        }
        catoms += hi - lo + 1;
        match sc.next_lexeme() {
            Lexeme::Comma => continue,
            term => return Ok((catoms, term)),
        }
    }
}

// `Pool` and the optional `[ranges]` prefix shared by all three MS
// grammars; returns (pool, covered position count, mask)
fn ms_prefix(sc: &mut Scanner, s: &str) -> Result<(String, usize, AtomMask), GrammarError> {
    let pool = match sc.next_lexeme() {
        Lexeme::Id(id) => id.to_string(),
        _ => return Err(ms_err(1, s)),
    };
    let mut mask = AtomMask::new(LIMIT_MAX_ATOMS);
    let catoms;
    if sc.accept(Lexeme::OBracket) {
        let (acc, term) = range_list(sc, s, &mut mask)?;
        if term != Lexeme::CBracket {
            return Err(ms_err(1, s));
        }
        if acc == 0 {
            return Err(ms_err(2, s));
        }
        catoms = acc;
    } else {
        // without a range the pool is assumed to have the maximum
        // number of atoms; verified later against the pool definition
        catoms = LIMIT_MAX_ATOMS;
        mask.set_all();
    }
    // #M
    if !sc.accept(Lexeme::Hash) || !sc.rest().starts_with('M') {
        return Err(ms_err(1, s));
    }
    sc.bump(1);
    Ok((pool, catoms, mask))
}

/// Parser for the MS fragment notation:
/// `Pool#Mn`, `Pool#Mn,m,...`, `Pool[m,n-o,p]#Mu,v,w`.
pub fn parse_ms_spec(s: &str) -> Result<MsSpec, GrammarError> {
    let mut sc = Scanner::new(s);
    let (pool, catoms, mask) = ms_prefix(&mut sc, s)?;

    // number of weights = number of commas + 1
    let expected = sc.rest().chars().filter(|&c| c == ',').count() + 1;
    let mut weights = Vec::with_capacity(expected);
    loop {
        let w = sc.integer().ok_or_else(|| ms_err(5, s))?;
        if w > catoms as i64 {
            return Err(ms_err(4, s));
        }
        weights.push(w);
        if weights.len() == expected {
            break;
        }
        if !sc.accept(Lexeme::Comma) {
            return Err(ms_err(5, s));
        }
    }
    weights.sort_unstable();
    if weights.windows(2).any(|w| w[0] == w[1]) {
        return Err(ms_err(5, s));
    }
    if !sc.at_end() {
        return Err(ms_err(1, s));
    }
    Ok(MsSpec { pool, weights, mask })
}

/// Parser for the multi-isotope MS notation with one weight per tracked
/// isotope: `Pool[ranges]#M(u,v,w),(x,y,z),...`. The tuple arity is
/// taken from the first tuple and enforced for the rest.
pub fn parse_mims_spec(s: &str) -> Result<MimsSpec, GrammarError> {
    let mut sc = Scanner::new(s);
    let (pool, catoms, mask) = ms_prefix(&mut sc, s)?;

    let rest = sc.rest();
    let ntuples = rest.chars().filter(|&c| c == ')').count();
    let num_isotopes = match rest.find(')') {
        Some(p) => rest[..p].chars().filter(|&c| c == ',').count() + 1,
        None => return Err(ms_err(5, s)),
    };

    let mut weights: Vec<Vec<i64>> = Vec::with_capacity(ntuples);
    loop {
        if !sc.accept(Lexeme::OParen) {
            return Err(ms_err(5, s));
        }
        let mut tup = Vec::with_capacity(num_isotopes);
        for k in 0..num_isotopes {
            let w = sc.integer().ok_or_else(|| ms_err(5, s))?;
            if w > catoms as i64 {
                return Err(ms_err(4, s));
            }
            tup.push(w);
            if k + 1 < num_isotopes && !sc.accept(Lexeme::Comma) {
                return Err(ms_err(5, s));
            }
        }
        if !sc.accept(Lexeme::CParen) {
            return Err(ms_err(5, s));
        }
        weights.push(tup);
        if weights.len() == ntuples {
            break;
        }
        if !sc.accept(Lexeme::Comma) {
            return Err(ms_err(5, s));
        }
    }
    weights.sort();
    if weights.windows(2).any(|w| w[0] == w[1]) {
        return Err(ms_err(5, s));
    }
    if !sc.at_end() {
        return Err(ms_err(1, s));
    }
    Ok(MimsSpec {
        pool,
        num_isotopes,
        weights,
        mask,
    })
}

/// Parser for the tandem MS/MS notation with a fragment and a
/// sub-fragment range: `Pool[m,n-o:a-b]#M(u,v),(w,x),...`. The second
/// range must select a subset of the first.
pub fn parse_msms_spec(s: &str) -> Result<MsMsSpec, GrammarError> {
    let mut sc = Scanner::new(s);
    let pool = match sc.next_lexeme() {
        Lexeme::Id(id) => id.to_string(),
        _ => return Err(ms_err(1, s)),
    };
    let mut mask1 = AtomMask::new(LIMIT_MAX_ATOMS);
    let mut mask2 = AtomMask::new(LIMIT_MAX_ATOMS);
    let catoms1;
    let catoms2;
    if sc.accept(Lexeme::OBracket) {
        let (acc1, term) = range_list(&mut sc, s, &mut mask1)?;
        if term != Lexeme::Colon {
            return Err(ms_err(2, s));
        }
        let (acc2, term) = range_list(&mut sc, s, &mut mask2)?;
        if term != Lexeme::CBracket {
            return Err(ms_err(1, s));
        }
        if acc1 == 0 || acc2 == 0 {
            return Err(ms_err(2, s));
        }
        // the sub-fragment must lie within the fragment
        if !mask2.is_subset_of(&mask1) {
            return Err(ms_err(3, s));
        }
        catoms1 = acc1;
        catoms2 = acc2;
    } else {
        catoms1 = LIMIT_MAX_ATOMS;
        catoms2 = LIMIT_MAX_ATOMS;
        mask1.set_all();
        mask2.set_all();
    }
    if !sc.accept(Lexeme::Hash) || !sc.rest().starts_with('M') {
        return Err(ms_err(1, s));
    }
    sc.bump(1);

    let npairs = sc.rest().chars().filter(|&c| c == ')').count();
    if npairs == 0 {
        return Err(ms_err(5, s));
    }
    let mut weights: Vec<(i64, i64)> = Vec::with_capacity(npairs);
    loop {
        if !sc.accept(Lexeme::OParen) {
            return Err(ms_err(5, s));
        }
        let u = sc.integer().ok_or_else(|| ms_err(5, s))?;
        if u > catoms1 as i64 {
            return Err(ms_err(4, s));
        }
        if !sc.accept(Lexeme::Comma) {
            return Err(ms_err(5, s));
        }
        let v = sc.integer().ok_or_else(|| ms_err(5, s))?;
        if v > catoms2 as i64 {
            return Err(ms_err(4, s));
        }
        if !sc.accept(Lexeme::CParen) {
            return Err(ms_err(5, s));
        }
        weights.push((u, v));
        if weights.len() == npairs {
            break;
        }
        if !sc.accept(Lexeme::Comma) {
            return Err(ms_err(5, s));
        }
    }
    weights.sort_unstable();
    if weights.windows(2).any(|w| w[0] == w[1]) {
        return Err(ms_err(5, s));
    }
    if !sc.at_end() {
        return Err(ms_err(1, s));
    }
    Ok(MsMsSpec {
        pool,
        weights,
        mask1,
        mask2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ms_spec() {
        let ms = parse_ms_spec("Glc[1,2,3]#M0,1,2").unwrap();
        assert_eq!(ms.pool, "Glc");
        assert_eq!(ms.weights, vec![0, 1, 2]);
        assert_eq!(ms.mask.count_ones(), 3);
        assert!(ms.mask.get(0) && ms.mask.get(1) && ms.mask.get(2));
    }

    #[test]
    fn test_ms_spec_without_range() {
        let ms = parse_ms_spec("Ala#M0,1").unwrap();
        assert_eq!(ms.pool, "Ala");
        // capacity fallback: every position labelable until verified
        assert_eq!(ms.mask.count_ones(), 64);
        assert_eq!(ms.weights, vec![0, 1]);
    }

    #[test]
    fn test_ms_spec_weights_are_sorted() {
        let ms = parse_ms_spec("Glc[1-3]#M2,0,1").unwrap();
        assert_eq!(ms.weights, vec![0, 1, 2]);
    }

    #[test]
    fn test_ms_spec_error_codes() {
        // 1: parse error
        assert_eq!(parse_ms_spec("#M0").unwrap_err().code(), 1);
        assert_eq!(parse_ms_spec("Glc[1-2]#N0").unwrap_err().code(), 1);
        // 2: invalid range
        assert_eq!(parse_ms_spec("Glc[3-1]#M0").unwrap_err().code(), 2);
        // 3: overlapping ranges
        assert_eq!(parse_ms_spec("Glc[1-3,2]#M0").unwrap_err().code(), 3);
        // 4: more weight than labelable positions
        assert_eq!(parse_ms_spec("Glc[1-3]#M4").unwrap_err().code(), 4);
        // 5: duplicate weight / malformed list
        assert_eq!(parse_ms_spec("Glc[1-3]#M1,1").unwrap_err().code(), 5);
        assert_eq!(parse_ms_spec("Glc[1-3]#M1,,2").unwrap_err().code(), 5);
    }

    #[test]
    fn test_parse_mims_spec() {
        let mims = parse_mims_spec("Glc[1-3]#M(0,1),(1,0),(1,1)").unwrap();
        assert_eq!(mims.pool, "Glc");
        assert_eq!(mims.num_isotopes, 2);
        assert_eq!(
            mims.weights,
            vec![vec![0, 1], vec![1, 0], vec![1, 1]]
        );
    }

    #[test]
    fn test_mims_duplicate_tuple() {
        assert_eq!(
            parse_mims_spec("Glc[1-3]#M(0,1),(0,1)").unwrap_err().code(),
            5
        );
    }

    #[test]
    fn test_mims_inconsistent_arity() {
        assert_eq!(
            parse_mims_spec("Glc[1-3]#M(0,1),(2)").unwrap_err().code(),
            5
        );
    }

    #[test]
    fn test_parse_msms_spec() {
        let msms = parse_msms_spec("Asp[1-4:2-3]#M(0,0),(1,1),(2,1)").unwrap();
        assert_eq!(msms.pool, "Asp");
        assert_eq!(msms.mask1.count_ones(), 4);
        assert_eq!(msms.mask2.count_ones(), 2);
        assert_eq!(msms.weights, vec![(0, 0), (1, 1), (2, 1)]);
        assert!(msms.mask2.is_subset_of(&msms.mask1));
    }

    #[test]
    fn test_msms_subfragment_must_be_subset() {
        // sub-fragment range outside the fragment range
        assert_eq!(
            parse_msms_spec("Asp[1-2:3-4]#M(0,0)").unwrap_err().code(),
            3
        );
    }

    #[test]
    fn test_msms_needs_double_range() {
        assert_eq!(parse_msms_spec("Asp[1-4]#M(0,0)").unwrap_err().code(), 2);
    }

    #[test]
    fn test_msms_weight_bounds() {
        // second weight checked against the sub-fragment capacity
        assert_eq!(
            parse_msms_spec("Asp[1-4:2-3]#M(1,3)").unwrap_err().code(),
            4
        );
    }
}
