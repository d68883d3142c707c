use std::collections::HashMap;

/// Why an atom mapping failed. The two causes are reported separately
/// so the caller's diagnostics can tell a missing counterpart from an
/// ambiguous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchFailure {
    /// educt tags with no matching product tag
    Unmatched(Vec<String>),
    /// tag keys occurring more than once on a side
    Duplicate(Vec<String>),
}

/// One atom tag prepared for matching: the key identity is compared
/// across the sides, the display string appears in diagnostics (for
/// long syntax the key drops the `@posid` part, the display keeps it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTag {
    pub key: String,
    pub display: String,
}

impl MatchTag {
    pub fn same(s: &str) -> Self {
        MatchTag {
            key: s.to_string(),
            display: s.to_string(),
        }
    }
}

/// Builds the permutation vector mapping each educt atom position to
/// the product atom position carrying the same tag key. Both sides must
/// have the same length (ensured by the caller). The result is a
/// bijection on `[0, n)`.
pub fn build_permutation(
    educts: &[MatchTag],
    products: &[MatchTag],
) -> Result<Vec<usize>, MatchFailure> {
    debug_assert_eq!(educts.len(), products.len());

    // product-side key table; a key seen twice is already fatal
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(products.len());
    let mut duplicates: Vec<String> = Vec::new();
    for (j, tag) in products.iter().enumerate() {
        if index.insert(tag.key.as_str(), j).is_some() {
            duplicates.push(tag.display.clone());
        }
    }
    if !duplicates.is_empty() {
        return Err(MatchFailure::Duplicate(duplicates));
    }

    let mut perm = Vec::with_capacity(educts.len());
    let mut used = vec![false; products.len()];
    let mut unmatched: Vec<String> = Vec::new();
    for tag in educts {
        match index.get(tag.key.as_str()) {
            None => unmatched.push(tag.display.clone()),
            Some(&j) => {
                if used[j] {
                    // the same educt key resolved twice
                    duplicates.push(tag.display.clone());
                } else {
                    used[j] = true;
                    perm.push(j);
                }
            }
        }
    }
    // a missing counterpart outranks an ambiguous one in the report
    if !unmatched.is_empty() {
        return Err(MatchFailure::Unmatched(unmatched));
    }
    if !duplicates.is_empty() {
        return Err(MatchFailure::Duplicate(duplicates));
    }
    Ok(perm)
}

/// Uniqueness scan for efflux reactions: sort the tags and look for
/// adjacent duplicates. Without this, a duplicated educt atom in a sink
/// reaction would slip through unnoticed.
pub fn check_pairwise_unique(tags: &[MatchTag]) -> Result<(), MatchFailure> {
    let mut sorted: Vec<&MatchTag> = tags.iter().collect();
    sorted.sort_by(|a, b| a.key.cmp(&b.key));
    let dups: Vec<String> = sorted
        .windows(2)
        .filter(|w| w[0].key == w[1].key)
        .map(|w| w[1].display.clone())
        .collect();
    if dups.is_empty() {
        Ok(())
    } else {
        Err(MatchFailure::Duplicate(dups))
    }
}
