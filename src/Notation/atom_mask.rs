use crate::Notation::GrammarError;
use crate::Notation::lexer::{Lexeme, Scanner};
use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitOr};

/// Hard limit on labelable atom positions per pool. Pool definitions
/// beyond this are rejected, which keeps every mask in a single word.
pub const LIMIT_MAX_ATOMS: usize = 64;

/// Fixed-capacity bit vector over the atom positions of one pool.
/// Position 0 is the first atom; the capacity is fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AtomMask {
    nbits: usize,
    bits: u64,
}

impl AtomMask {
    pub fn new(nbits: usize) -> Self {
        assert!(nbits <= LIMIT_MAX_ATOMS);
        AtomMask { nbits, bits: 0 }
    }

    /// mask of capacity `nbits` with every position set
    pub fn all_ones(nbits: usize) -> Self {
        let mut m = AtomMask::new(nbits);
        m.set_all();
        m
    }

    pub fn len(&self) -> usize {
        self.nbits
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn set(&mut self, i: usize) {
        assert!(i < self.nbits);
        self.bits |= 1u64 << i;
    }

    pub fn clear(&mut self, i: usize) {
        assert!(i < self.nbits);
        self.bits &= !(1u64 << i);
    }

    pub fn get(&self, i: usize) -> bool {
        i < self.nbits && (self.bits >> i) & 1 == 1
    }

    /// set all positions in `lo..=hi`
    pub fn set_range(&mut self, lo: usize, hi: usize) {
        assert!(lo <= hi && hi < self.nbits);
        for i in lo..=hi {
            self.bits |= 1u64 << i;
        }
    }

    pub fn set_all(&mut self) {
        if self.nbits == LIMIT_MAX_ATOMS {
            self.bits = u64::MAX;
        } else {
            self.bits = (1u64 << self.nbits) - 1;
        }
    }

    pub fn count_ones(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn is_subset_of(&self, other: &AtomMask) -> bool {
        self.bits & !other.bits == 0
    }

    /// raw bit pattern, low bit = first atom position
    pub fn as_u64(&self) -> u64 {
        self.bits
    }
}

impl BitOr for AtomMask {
    type Output = AtomMask;
    fn bitor(self, rhs: AtomMask) -> AtomMask {
        AtomMask {
            nbits: self.nbits.max(rhs.nbits),
            bits: self.bits | rhs.bits,
        }
    }
}

impl BitAnd for AtomMask {
    type Output = AtomMask;
    fn bitand(self, rhs: AtomMask) -> AtomMask {
        AtomMask {
            nbits: self.nbits.max(rhs.nbits),
            bits: self.bits & rhs.bits,
        }
    }
}

/// One entry of a range spec: a single 1-based position or an ascending
/// `a-b` range. The terminating token (comma, `]`, `:` or end) is left
/// unconsumed for the caller.
pub(crate) fn range_entry(sc: &mut Scanner) -> Result<(usize, usize), u8> {
    // error codes as everywhere in the notation family:
    // 1 = parse error, 2 = invalid range
    let lo = match sc.next_lexeme() {
        Lexeme::Integer(v) => v,
        _ => return Err(1),
    };
    let mark = sc.mark();
    let hi = match sc.next_lexeme() {
        Lexeme::Comma | Lexeme::CBracket | Lexeme::Colon | Lexeme::Etx => {
            sc.reset(mark);
            lo
        }
        Lexeme::Minus => match sc.next_lexeme() {
            Lexeme::Integer(v) => v,
            _ => return Err(1),
        },
        _ => return Err(1),
    };
    if lo < 1 || lo > hi || hi > LIMIT_MAX_ATOMS as i64 {
        return Err(2);
    }
    Ok((lo as usize, hi as usize))
}

/// Parser for the range notation, e.g. `1-3,5,7-9`. Positions are
/// 1-based; ranges must be ascending; entries must not overlap.
pub fn parse_range_spec(s: &str) -> Result<AtomMask, GrammarError> {
    let mut sc = Scanner::new(s);
    let mut mask = AtomMask::new(LIMIT_MAX_ATOMS);
    let mut catoms = 0usize;
    let mut status: Option<GrammarError> = None;

    loop {
        match range_entry(&mut sc) {
            Ok((lo, hi)) => {
                let before = mask.count_ones();
                mask.set_range(lo - 1, hi - 1);
                // on overlap the popcount grows less than the entry width
                if before + (hi - lo + 1) > mask.count_ones() {
                    status = Some(GrammarError::OverlappingRange(s.to_string()));
                    break;
                }
                catoms += hi - lo + 1;
            }
            Err(2) => {
                status = Some(GrammarError::InvalidRange(s.to_string()));
                break;
            }
            Err(_) => {
                status = Some(GrammarError::ParseError(s.to_string()));
                break;
            }
        }
        if !sc.accept(Lexeme::Comma) {
            break;
        }
    }
    if status.is_none() && !sc.at_end() {
        status = Some(GrammarError::ParseError(s.to_string()));
    }
    // an empty spec is an invalid range, whatever else went wrong
    if catoms == 0 {
        return Err(GrammarError::InvalidRange(s.to_string()));
    }
    match status {
        Some(e) => Err(e),
        None => Ok(mask),
    }
}

/// Renders a mask back into range notation, emitting maximal runs:
/// bits {0,1,2,4} become `1-3,5`. Inverse of [`parse_range_spec`] up to
/// formatting.
pub fn mask_to_range(mask: &AtomMask) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut i = 0;
    while i < mask.len() {
        if !mask.get(i) {
            i += 1;
            continue;
        }
        let mut j = i + 1;
        while j < mask.len() && mask.get(j) {
            j += 1;
        }
        let j = j - 1;
        if i != j {
            parts.push(format!("{}-{}", i + 1, j + 1));
        } else {
            parts.push(format!("{}", i + 1));
        }
        i = j + 1;
    }
    parts.join(",")
}
