use crate::Network::atom_match::{MatchFailure, MatchTag, build_permutation, check_pairwise_unique};
use crate::Network::{NetworkError, PermutationError, Side, StructuralError};
use crate::Notation::perm_spec::{
    PermSyntax, check_perm_spec, parse_perm_spec_tag, perm_spec_length,
};
use crate::Utils::checksum::{CRC_REACTIONNETWORK, update_crc32};
use log::error;
use serde::{Deserialize, Serialize};

/// One appearance of a pool as educt or product of a reaction: the pool
/// name plus the atom configuration string in short or long notation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Isotopomer {
    pub name: String,
    pub atom_cfg: String,
}

impl Isotopomer {
    pub fn new(name: &str, atom_cfg: &str) -> Self {
        Isotopomer {
            name: name.to_string(),
            atom_cfg: atom_cfg.to_string(),
        }
    }

    /// the atom configuration is left out here; the reaction's
    /// permutation vector already covers it
    pub fn compute_checksum(&self, crc: u32) -> u32 {
        update_crc32(self.name.as_bytes(), crc)
    }
}

/// A reaction under construction and, after [`Reaction::finish`], a
/// complete one: educt and product occurrences in declaration order and
/// the permutation vector mapping educt atom positions to product atom
/// positions. Finishing is one-time; a failed finish leaves the
/// reaction poisoned (no permutation, size 0) and the caller discards
/// it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    name: String,
    bidirectional: bool,
    educts: Vec<Isotopomer>,
    products: Vec<Isotopomer>,
    permutation: Option<Vec<usize>>,
    size: usize,
}

impl Reaction {
    pub fn new(name: &str, bidirectional: bool) -> Result<Self, StructuralError> {
        if !crate::Notation::perm_spec::is_varname(name) {
            return Err(StructuralError::InvalidName(name.to_string()));
        }
        Ok(Reaction {
            name: name.to_string(),
            bidirectional,
            educts: Vec::new(),
            products: Vec::new(),
            permutation: None,
            size: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_bidirectional(&self) -> bool {
        self.bidirectional
    }

    pub fn educts(&self) -> &[Isotopomer] {
        &self.educts
    }

    pub fn products(&self) -> &[Isotopomer] {
        &self.products
    }

    /// number of atoms transported by the reaction (educt side total)
    pub fn num_atoms(&self) -> usize {
        self.size
    }

    pub fn is_finished(&self) -> bool {
        self.permutation.is_some()
    }

    pub fn permutation(&self) -> Option<&[usize]> {
        self.permutation.as_deref()
    }

    pub fn add_educt(&mut self, name: &str, cfg: &str) -> Result<(), StructuralError> {
        if self.is_finished() {
            return Err(StructuralError::ReactionFinished {
                reaction: self.name.clone(),
            });
        }
        self.educts.push(Isotopomer::new(name, cfg));
        Ok(())
    }

    pub fn add_product(&mut self, name: &str, cfg: &str) -> Result<(), StructuralError> {
        if self.is_finished() {
            return Err(StructuralError::ReactionFinished {
                reaction: self.name.clone(),
            });
        }
        self.products.push(Isotopomer::new(name, cfg));
        Ok(())
    }

    /// Computes the atom permutation and completes the reaction.
    /// The educt and product side must be balanced (or the product side
    /// empty for an efflux reaction) and must agree on one notation
    /// syntax. Any failure poisons the reaction.
    pub fn finish(&mut self) -> Result<(), NetworkError> {
        if self.is_finished() {
            return Err(StructuralError::ReactionFinished {
                reaction: self.name.clone(),
            }
            .into());
        }

        let size_in = self.side_length(&self.educts, Side::Educt)?;
        let size_out = self.side_length(&self.products, Side::Product)?;

        // the reaction must be balanced or be an efflux
        if size_out != size_in && size_out != 0 {
            return self.fail(
                PermutationError::SizeMismatch {
                    reaction: self.name.clone(),
                    size_in,
                    size_out,
                }
                .into(),
            );
        }
        self.size = size_in;

        // nothing to map for a reaction without atoms
        if size_in == 0 {
            self.permutation = Some(Vec::new());
            return Ok(());
        }

        let educt_cfgs: Vec<&str> = self.educts.iter().map(|i| i.atom_cfg.as_str()).collect();
        let syntax_in = match check_perm_spec(&educt_cfgs) {
            Ok(PermSyntax::Short) => PermSyntax::Short,
            Ok(PermSyntax::Long) => PermSyntax::Long,
            _ => {
                error!(
                    "illegal permutation on educt-side of reaction {}",
                    self.name
                );
                return self.fail(
                    PermutationError::EductSyntax {
                        reaction: self.name.clone(),
                    }
                    .into(),
                );
            }
        };
        if size_out != 0 {
            let product_cfgs: Vec<&str> =
                self.products.iter().map(|i| i.atom_cfg.as_str()).collect();
            match check_perm_spec(&product_cfgs) {
                Ok(syntax_out) if syntax_out == syntax_in => {}
                _ => {
                    error!(
                        "illegal permutation on product-side of reaction {}",
                        self.name
                    );
                    return self.fail(
                        PermutationError::ProductSyntax {
                            reaction: self.name.clone(),
                        }
                        .into(),
                    );
                }
            }
        }

        let educt_tags = collect_tags(&self.educts, syntax_in, &self.name, Side::Educt)?;
        if size_out != 0 {
            let product_tags = collect_tags(&self.products, syntax_in, &self.name, Side::Product)?;
            match build_permutation(&educt_tags, &product_tags) {
                Ok(perm) => self.permutation = Some(perm),
                Err(MatchFailure::Unmatched(tags)) => {
                    error!(
                        "illegal permutation -- {} unmatched in cfg of reaction {}",
                        tags.join(", "),
                        self.name
                    );
                    return self.fail(
                        PermutationError::Unmatched {
                            reaction: self.name.clone(),
                            tags,
                        }
                        .into(),
                    );
                }
                Err(MatchFailure::Duplicate(tags)) => {
                    error!(
                        "illegal permutation -- duplicate atoms in cfg of reaction {}",
                        self.name
                    );
                    return self.fail(
                        PermutationError::Duplicate {
                            reaction: self.name.clone(),
                            tags,
                        }
                        .into(),
                    );
                }
            }
        } else {
            // no product, but the educt tags still must be unique;
            // otherwise downstream errors become nearly untraceable
            if let Err(MatchFailure::Duplicate(tags)) = check_pairwise_unique(&educt_tags) {
                error!(
                    "illegal permutation -- duplicate atoms in cfg of efflux reaction {}",
                    self.name
                );
                return self.fail(
                    PermutationError::Duplicate {
                        reaction: self.name.clone(),
                        tags,
                    }
                    .into(),
                );
            }
            self.permutation = Some((0..self.size).collect());
        }
        Ok(())
    }

    fn side_length(&self, side: &[Isotopomer], which: Side) -> Result<usize, NetworkError> {
        let mut total = 0;
        for iso in side {
            total += perm_spec_length(&iso.atom_cfg).map_err(|source| NetworkError::Grammar {
                reaction: self.name.clone(),
                side: which,
                source,
            })?;
        }
        Ok(total)
    }

    // poisoned state: permutation absent, size reset
    fn fail(&mut self, err: NetworkError) -> Result<(), NetworkError> {
        self.permutation = None;
        self.size = 0;
        Err(err)
    }

    pub fn compute_checksum(&self, crc: u32, crc_scope: u32) -> u32 {
        let mut crc = crc;
        if crc_scope & CRC_REACTIONNETWORK != 0 {
            crc = update_crc32(self.name.as_bytes(), crc);
            if let Some(perm) = &self.permutation {
                for &p in perm {
                    crc = update_crc32(&(p as u32).to_le_bytes(), crc);
                }
            }
            for iso in self.educts.iter().chain(self.products.iter()) {
                crc = iso.compute_checksum(crc);
            }
            crc = update_crc32(&(self.size as u32).to_le_bytes(), crc);
        }
        crc
    }
}

// atom tags of one side, concatenated in declaration order
fn collect_tags(
    side: &[Isotopomer],
    syntax: PermSyntax,
    reaction: &str,
    which: Side,
) -> Result<Vec<MatchTag>, NetworkError> {
    let mut tags = Vec::new();
    for iso in side {
        match syntax {
            PermSyntax::Short => {
                for c in iso.atom_cfg.trim().chars() {
                    tags.push(MatchTag::same(&c.to_string()));
                }
            }
            _ => {
                for tok in iso.atom_cfg.split_whitespace() {
                    let tag =
                        parse_perm_spec_tag(tok).map_err(|source| NetworkError::Grammar {
                            reaction: reaction.to_string(),
                            side: which,
                            source,
                        })?;
                    tags.push(MatchTag {
                        key: tag.match_key(),
                        display: tok.to_string(),
                    });
                }
            }
        }
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_syntax_identity() {
        let mut r = Reaction::new("v1", true).unwrap();
        r.add_educt("Pool1", "abc").unwrap();
        r.add_product("Pool2", "abc").unwrap();
        r.finish().unwrap();
        assert_eq!(r.permutation(), Some(&[0, 1, 2][..]));
        assert_eq!(r.num_atoms(), 3);
    }

    #[test]
    fn test_short_syntax_rearrangement() {
        // transketolase-like carbon shuffle over two educts/products
        let mut r = Reaction::new("v2", true).unwrap();
        r.add_educt("A", "ab").unwrap();
        r.add_educt("B", "cd").unwrap();
        r.add_product("C", "cb").unwrap();
        r.add_product("D", "ad").unwrap();
        r.finish().unwrap();
        // educt atoms a,b,c,d sit at product positions 2,1,0,3
        assert_eq!(r.permutation(), Some(&[2, 1, 0, 3][..]));
    }

    #[test]
    fn test_long_syntax_mapping() {
        let mut r = Reaction::new("v3", true).unwrap();
        r.add_educt("A", "C#1@a C#2@b C#3@c").unwrap();
        r.add_product("B", "C#3@a C#1@b C#2@c").unwrap();
        r.finish().unwrap();
        // keys C#1,C#2,C#3 sit at product indices 1,2,0
        assert_eq!(r.permutation(), Some(&[1, 2, 0][..]));
    }

    #[test]
    fn test_unbalanced_reaction_is_rejected() {
        let mut r = Reaction::new("v4", true).unwrap();
        r.add_educt("A", "abc").unwrap();
        r.add_product("B", "ab").unwrap();
        let err = r.finish().unwrap_err();
        assert!(matches!(
            err,
            NetworkError::Permutation(PermutationError::SizeMismatch { .. })
        ));
        assert!(!r.is_finished());
        assert_eq!(r.num_atoms(), 0);
    }

    #[test]
    fn test_mixed_syntax_is_rejected() {
        let mut r = Reaction::new("v5", true).unwrap();
        r.add_educt("A", "ab").unwrap();
        r.add_product("B", "C#1@a C#2@b").unwrap();
        let err = r.finish().unwrap_err();
        assert!(matches!(
            err,
            NetworkError::Permutation(PermutationError::ProductSyntax { .. })
        ));
    }

    #[test]
    fn test_unmatched_tag() {
        let mut r = Reaction::new("v6", true).unwrap();
        r.add_educt("A", "abc").unwrap();
        r.add_product("B", "abd").unwrap();
        match r.finish().unwrap_err() {
            NetworkError::Permutation(PermutationError::Unmatched { tags, .. }) => {
                assert_eq!(tags, vec!["c".to_string()]);
            }
            other => panic!("expected Unmatched, got {:?}", other),
        }
    }

    #[test]
    fn test_efflux_identity() {
        let mut r = Reaction::new("v_out", false).unwrap();
        r.add_educt("A", "abc").unwrap();
        r.finish().unwrap();
        assert_eq!(r.permutation(), Some(&[0, 1, 2][..]));
        assert_eq!(r.num_atoms(), 3);
    }

    #[test]
    fn test_efflux_duplicate_educt_tags() {
        let mut r = Reaction::new("v_out", false).unwrap();
        r.add_educt("A", "ab").unwrap();
        r.add_educt("B", "bc").unwrap();
        match r.finish().unwrap_err() {
            NetworkError::Permutation(PermutationError::Duplicate { tags, .. }) => {
                assert_eq!(tags, vec!["b".to_string()]);
            }
            other => panic!("expected Duplicate, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_atom_reaction() {
        let mut r = Reaction::new("v_cof", true).unwrap();
        r.add_educt("ATP", "").unwrap();
        r.add_product("ADP", "").unwrap();
        r.finish().unwrap();
        assert_eq!(r.num_atoms(), 0);
        assert_eq!(r.permutation(), Some(&[][..]));
    }

    #[test]
    fn test_finish_is_one_time() {
        let mut r = Reaction::new("v7", true).unwrap();
        r.add_educt("A", "a").unwrap();
        r.add_product("B", "a").unwrap();
        r.finish().unwrap();
        assert!(r.finish().is_err());
        assert!(r.add_educt("C", "b").is_err());
    }

    #[test]
    fn test_grammar_error_carries_context() {
        let mut r = Reaction::new("v8", true).unwrap();
        r.add_educt("A", "C#1@a C#@b").unwrap();
        r.add_product("B", "C#1@a C#2@b").unwrap();
        match r.finish().unwrap_err() {
            NetworkError::Grammar {
                reaction, side, ..
            } => {
                assert_eq!(reaction, "v8");
                assert_eq!(side, Side::Educt);
            }
            other => panic!("expected Grammar, got {:?}", other),
        }
    }

    #[test]
    fn test_checksum_covers_permutation() {
        let mut a = Reaction::new("v9", true).unwrap();
        a.add_educt("A", "ab").unwrap();
        a.add_product("B", "ab").unwrap();
        a.finish().unwrap();
        let mut b = Reaction::new("v9", true).unwrap();
        b.add_educt("A", "ab").unwrap();
        b.add_product("B", "ba").unwrap();
        b.finish().unwrap();
        assert_ne!(
            a.compute_checksum(0, CRC_REACTIONNETWORK),
            b.compute_checksum(0, CRC_REACTIONNETWORK)
        );
    }
}
