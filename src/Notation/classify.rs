use crate::Notation::GrammarError;
use crate::Notation::cumomer_spec::parse_cumomer_spec;
use crate::Notation::ms_spec::{parse_mims_spec, parse_ms_spec, parse_msms_spec};
use crate::Notation::nmr_spec::{parse_13cnmr_spec, parse_1hnmr_spec};
use serde::{Deserialize, Serialize};

/// The measurement notation family a string belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecKind {
    Ms,
    MsMs,
    MultiIsotopeMs,
    Nmr1H,
    Nmr13C,
    /// generic cumomer notation `Pool#[01x]+`
    Generic,
}

/// Result of [`classify_spec`]: the structurally identified notation
/// kind, whether the string also parses as a semantically valid spec,
/// and if so the number of measurement values it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecClass {
    pub kind: SpecKind,
    pub valid: bool,
    /// expected measurement dimensionality (None when invalid)
    pub dim: Option<usize>,
    /// pool name, when the spec is valid
    pub pool: Option<String>,
}

// bracket content between '[' and ']' before the '#', if any
fn bracket_part(s: &str, hash: usize) -> Option<&str> {
    let open = s.find('[')?;
    if open > hash {
        return None;
    }
    let close = s.find(']')?;
    if close < open || close > hash {
        return None;
    }
    Some(&s[open + 1..close])
}

// arity of the first parenthesized weight tuple: commas between the
// first '(' and the first ')' plus one
fn first_tuple_arity(tail: &str) -> Option<usize> {
    let open = tail.find('(')?;
    let close = tail.find(')')?;
    if close < open {
        return None;
    }
    Some(tail[open + 1..close].matches(',').count() + 1)
}

/// Identifies which notation grammar a string belongs to, trying the
/// grammars in the fixed priority order MS, MS/MS, multi-isotope MS,
/// 1H-NMR, 13C-NMR, generic. The shape decides the kind; whether the
/// string is also a *valid* spec of that kind is reported separately
/// through `valid`/`dim`, so callers can tell "not this notation at
/// all" from "this notation, but malformed".
pub fn classify_spec(s: &str) -> Result<SpecClass, GrammarError> {
    let hash = match s.find('#') {
        Some(h) => h,
        None => return Err(GrammarError::ParseError(s.to_string())),
    };
    let tail = &s[hash + 1..];
    let bracket = bracket_part(s, hash);
    let bracket_has_colon = bracket.map(|b| b.contains(':')).unwrap_or(false);

    // MS: #M with a plain weight list
    if tail.starts_with('M') && !tail.contains('(') && !bracket_has_colon {
        return Ok(match parse_ms_spec(s) {
            Ok(ms) => SpecClass {
                kind: SpecKind::Ms,
                valid: true,
                dim: Some(ms.weights.len()),
                pool: Some(ms.pool),
            },
            Err(_) => invalid(SpecKind::Ms),
        });
    }
    // MS/MS: #M with weight pairs and (if present) a double range
    if tail.starts_with('M')
        && first_tuple_arity(tail) == Some(2)
        && (bracket.is_none() || bracket_has_colon)
    {
        return Ok(match parse_msms_spec(s) {
            Ok(msms) => SpecClass {
                kind: SpecKind::MsMs,
                valid: true,
                dim: Some(msms.weights.len()),
                pool: Some(msms.pool),
            },
            Err(_) => invalid(SpecKind::MsMs),
        });
    }
    // multi-isotope MS: #M with weight tuples of any arity
    if tail.starts_with('M') && first_tuple_arity(tail).is_some() && !bracket_has_colon {
        return Ok(match parse_mims_spec(s) {
            Ok(mims) => SpecClass {
                kind: SpecKind::MultiIsotopeMs,
                valid: true,
                dim: Some(mims.weights.len()),
                pool: Some(mims.pool),
            },
            Err(_) => invalid(SpecKind::MultiIsotopeMs),
        });
    }
    // 1H-NMR: #P position list
    if tail.starts_with('P') {
        return Ok(match parse_1hnmr_spec(s) {
            Ok(nmr) => SpecClass {
                kind: SpecKind::Nmr1H,
                valid: true,
                dim: Some(nmr.positions.len()),
                pool: Some(nmr.pool),
            },
            Err(_) => invalid(SpecKind::Nmr1H),
        });
    }
    // 13C-NMR: multiplet letter after the '#'
    if tail.starts_with('S') || tail.starts_with('D') || tail.starts_with('T') {
        return Ok(match parse_13cnmr_spec(s) {
            Ok(nmr) => SpecClass {
                kind: SpecKind::Nmr13C,
                valid: true,
                dim: Some(nmr.entries.len()),
                pool: Some(nmr.pool),
            },
            Err(_) => invalid(SpecKind::Nmr13C),
        });
    }
    // generic cumomer: one [01x] character per position
    if !tail.is_empty() && tail.chars().all(|c| matches!(c, '0' | '1' | 'x' | 'X')) {
        return Ok(match parse_cumomer_spec(s) {
            Ok(c) => SpecClass {
                kind: SpecKind::Generic,
                valid: true,
                dim: Some(1),
                pool: Some(c.pool),
            },
            Err(_) => invalid(SpecKind::Generic),
        });
    }
    Err(GrammarError::ParseError(s.to_string()))
}

fn invalid(kind: SpecKind) -> SpecClass {
    SpecClass {
        kind,
        valid: false,
        dim: None,
        pool: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_each_kind() {
        let c = classify_spec("Glc[1,2,3]#M0,1,2").unwrap();
        assert_eq!(c.kind, SpecKind::Ms);
        assert!(c.valid);
        assert_eq!(c.dim, Some(3));
        assert_eq!(c.pool.as_deref(), Some("Glc"));

        let c = classify_spec("Asp[1-4:2-3]#M(0,0),(1,1)").unwrap();
        assert_eq!(c.kind, SpecKind::MsMs);
        assert_eq!(c.dim, Some(2));

        let c = classify_spec("Glc[1-3]#M(0,1,0),(1,0,0)").unwrap();
        assert_eq!(c.kind, SpecKind::MultiIsotopeMs);
        assert_eq!(c.dim, Some(2));

        let c = classify_spec("Ala#P1,2").unwrap();
        assert_eq!(c.kind, SpecKind::Nmr1H);
        assert_eq!(c.dim, Some(2));

        let c = classify_spec("Glc#S1,DR2").unwrap();
        assert_eq!(c.kind, SpecKind::Nmr13C);
        assert_eq!(c.dim, Some(2));

        let c = classify_spec("Glc#1x0x01").unwrap();
        assert_eq!(c.kind, SpecKind::Generic);
        assert_eq!(c.dim, Some(1));
    }

    #[test]
    fn test_structurally_matched_but_invalid() {
        // 13C shape, but DL is impossible at position 1
        let c = classify_spec("Glc#DL1").unwrap();
        assert_eq!(c.kind, SpecKind::Nmr13C);
        assert!(!c.valid);
        assert_eq!(c.dim, None);

        // MS shape with a duplicate weight
        let c = classify_spec("Glc[1-3]#M1,1").unwrap();
        assert_eq!(c.kind, SpecKind::Ms);
        assert!(!c.valid);
    }

    #[test]
    fn test_unclassifiable() {
        assert!(classify_spec("no hash at all").is_err());
        assert!(classify_spec("Glc#q7").is_err());
    }

    // precedence pinning on syntactically overlapping inputs -- the
    // dispatch order is load bearing, do not reorder without updating
    // these expectations
    #[test]
    fn test_precedence_pinning() {
        // all-[01x] body is generic, even though "10" looks numeric
        assert_eq!(classify_spec("A#10").unwrap().kind, SpecKind::Generic);
        // pairs without any bracket go to MS/MS, not multi-isotope MS
        assert_eq!(classify_spec("A#M(0,1)").unwrap().kind, SpecKind::MsMs);
        // pairs behind a single range go to multi-isotope MS (the MS/MS
        // grammar wants the frag:subfrag double range)
        assert_eq!(
            classify_spec("A[1-2]#M(0,1)").unwrap().kind,
            SpecKind::MultiIsotopeMs
        );
        // plain weight list is MS even when every digit is 0/1
        assert_eq!(classify_spec("A#M0,1").unwrap().kind, SpecKind::Ms);
    }
}
