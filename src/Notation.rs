use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The shared token scanner all compact-notation parsers are built on.
/// Tokens are integers, identifiers and the punctuation set `- , : # [ ] ( ) @`.
pub mod lexer;

/// Fixed-capacity bit mask over atom positions (hard limit 64) plus the
/// range notation parser and its inverse.
///
/// # Examples
/// ```
/// use IsoFlux::Notation::atom_mask::{parse_range_spec, mask_to_range};
/// let mask = parse_range_spec("1-3,5,7-9").unwrap();
/// assert_eq!(mask.count_ones(), 7);
/// let rendered = mask_to_range(&mask);
/// assert_eq!(parse_range_spec(&rendered).unwrap(), mask);
/// ```
pub mod atom_mask;

/// Parsers for the mass spectrometry fragment notations:
/// plain MS `Pool[ranges]#Mw,...`, multi-isotope MS with weight tuples
/// `Pool[ranges]#M(u,v,w),...` and tandem MS/MS with a double range and
/// weight pairs `Pool[frag:subfrag]#M(u,v),...`.
///
/// # Examples
/// ```
/// use IsoFlux::Notation::ms_spec::parse_ms_spec;
/// let ms = parse_ms_spec("Glc[1,2,3]#M0,1,2").unwrap();
/// assert_eq!(ms.pool, "Glc");
/// assert_eq!(ms.weights, vec![0, 1, 2]);
/// assert_eq!(ms.mask.count_ones(), 3);
/// ```
pub mod ms_spec;

/// Parsers for the NMR notations: 1H (`Pool#P1,2,...`) and 13C with the
/// multiplet type vocabulary S/DL/DR/DD/T (`Pool#S1,DL2,...`), plus the
/// consumer-side boundary check for the 13C multiplet types.
pub mod nmr_spec;

/// Parser for the generic cumomer notation `Pool#[01x]+` (one character
/// per atom position).
pub mod cumomer_spec;

/// Atom permutation specifications: the long tag grammar `C#3@6`,
/// short/long syntax identification, spec length and the per-side
/// syntax agreement check, plus the identifier grammar `is_varname`.
pub mod perm_spec;

/// Dispatcher that identifies which measurement notation a string
/// belongs to, trying the grammars in a fixed priority order.
pub mod classify;

/// Where in a notation string a parse failed, and how.  Every grammar in
/// this module reports one of these kinds; callers render diagnostics
/// from the offending substring carried in each variant.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrammarError {
    #[error("parse error in notation `{0}`")]
    ParseError(String),
    #[error("invalid position range in notation `{0}`")]
    InvalidRange(String),
    #[error("overlapping position ranges in notation `{0}`")]
    OverlappingRange(String),
    #[error("fewer labelable positions than requested weights in `{0}`")]
    InsufficientPositions(String),
    #[error("invalid weight specification in `{0}`")]
    InvalidWeightSpec(String),
    #[error("duplicate position in `{0}`")]
    DuplicatePosition(String),
}

impl GrammarError {
    /// Numeric code of the failure kind, matching the historical error
    /// codes of the notation parsers (1 parse error, 2 invalid range,
    /// 3 overlapping ranges, 4 insufficient positions, 5 invalid weight
    /// spec; duplicate positions report 3 in the NMR grammars).
    pub fn code(&self) -> u8 {
        match self {
            GrammarError::ParseError(_) => 1,
            GrammarError::InvalidRange(_) => 2,
            GrammarError::OverlappingRange(_) => 3,
            GrammarError::InsufficientPositions(_) => 4,
            GrammarError::InvalidWeightSpec(_) => 5,
            GrammarError::DuplicatePosition(_) => 3,
        }
    }
}
