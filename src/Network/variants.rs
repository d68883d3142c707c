use RustedSciThe::symbolic::symbolic_engine::Expr;
use crate::Network::constraints::{Configuration, ConstraintKind, Relation};
use crate::Network::pool::Pool;
use crate::Network::reaction::Reaction;
use crate::Network::{NetworkError, Side, StructuralError};
use crate::Notation::perm_spec::{identify_perm_spec, is_varname, perm_spec_length};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One labeling variant of a reactant: an atom configuration and an
/// optional probability ratio. Either no variant of a reactant carries
/// a ratio (uniform ratios are assigned) or all of them do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub cfg: String,
    pub ratio: Option<f64>,
}

impl Variant {
    pub fn new(cfg: &str) -> Self {
        Variant {
            cfg: cfg.to_string(),
            ratio: None,
        }
    }

    pub fn with_ratio(cfg: &str, ratio: f64) -> Self {
        Variant {
            cfg: cfg.to_string(),
            ratio: Some(ratio),
        }
    }
}

/// A reactant of a reaction declaration: pool name plus one or more
/// labeling variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactantDecl {
    pub name: String,
    pub variants: Vec<Variant>,
}

impl ReactantDecl {
    /// the common case of a single fixed configuration
    pub fn single(name: &str, cfg: &str) -> Self {
        ReactantDecl {
            name: name.to_string(),
            variants: vec![Variant::new(cfg)],
        }
    }

    pub fn with_variants(name: &str, variants: Vec<Variant>) -> Self {
        ReactantDecl {
            name: name.to_string(),
            variants,
        }
    }

    /// Ratio consistency per reactant: either none given (uniform
    /// 1/n), or all given, each within [0,1], summing to 1 within
    /// 1e-6; given ratios are normalized to an exact sum of 1.
    fn normalized_ratios(&self) -> Result<Vec<f64>, StructuralError> {
        let n = self.variants.len();
        let given = self.variants.iter().filter(|v| v.ratio.is_some()).count();
        if given == 0 {
            return Ok(vec![1.0 / n as f64; n]);
        }
        if given != n {
            return Err(StructuralError::VariantRatios {
                name: self.name.clone(),
            });
        }
        let mut ratios = Vec::with_capacity(n);
        let mut sum = 0.0;
        for v in &self.variants {
            let r = v.ratio.unwrap_or(0.0);
            if !(0.0..=1.0).contains(&r) {
                return Err(StructuralError::VariantRatioRange {
                    name: self.name.clone(),
                });
            }
            sum += r;
            ratios.push(r);
        }
        if (sum - 1.0).abs() > 1e-6 {
            return Err(StructuralError::VariantRatioSum {
                name: self.name.clone(),
            });
        }
        for r in &mut ratios {
            *r /= sum;
        }
        Ok(ratios)
    }
}

/// A reaction declaration as the document layer hands it over: one name
/// per variant combination, a direction flag and the two reactant
/// lists. `A, B -> C` with two labeling variants on one side declares
/// two sibling reactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionDecl {
    pub names: Vec<String>,
    pub bidirectional: bool,
    pub educts: Vec<ReactantDecl>,
    pub products: Vec<ReactantDecl>,
}

impl ReactionDecl {
    pub fn new(names: &[&str], bidirectional: bool) -> Self {
        ReactionDecl {
            names: names.iter().map(|s| s.to_string()).collect(),
            bidirectional,
            educts: Vec::new(),
            products: Vec::new(),
        }
    }

    pub fn num_combinations(&self) -> usize {
        self.educts
            .iter()
            .chain(self.products.iter())
            .map(|r| r.variants.len())
            .product()
    }

    /// A fresh lazy iterator over the Cartesian product of all variant
    /// lists, educts before products, first reactant cycling fastest.
    /// Call again to restart.
    pub fn combinations(&self) -> Result<VariantCombinations, StructuralError> {
        let mut slots = Vec::new();
        for r in self.educts.iter().chain(self.products.iter()) {
            let ratios = r.normalized_ratios()?;
            let cfgs: Vec<(String, f64)> = r
                .variants
                .iter()
                .map(|v| v.cfg.clone())
                .zip(ratios)
                .collect();
            slots.push((r.name.clone(), cfgs));
        }
        Ok(VariantCombinations {
            slots,
            neducts: self.educts.len(),
            index: vec![0; self.educts.len() + self.products.len()],
            done: false,
        })
    }
}

/// One concrete combination of variants: the educt and product
/// (pool, cfg) tuples plus the combined probability ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    pub educts: Vec<(String, String)>,
    pub products: Vec<(String, String)>,
    pub ratio: f64,
}

/// Lazy odometer over the variant lists of a reaction declaration.
pub struct VariantCombinations {
    slots: Vec<(String, Vec<(String, f64)>)>,
    neducts: usize,
    index: Vec<usize>,
    done: bool,
}

impl Iterator for VariantCombinations {
    type Item = Combination;

    fn next(&mut self) -> Option<Combination> {
        if self.done {
            return None;
        }
        let mut educts = Vec::with_capacity(self.neducts);
        let mut products = Vec::with_capacity(self.slots.len() - self.neducts);
        let mut ratio = 1.0;
        for (i, (pool, cfgs)) in self.slots.iter().enumerate() {
            let (cfg, r) = &cfgs[self.index[i]];
            ratio *= r;
            if i < self.neducts {
                educts.push((pool.clone(), cfg.clone()));
            } else {
                products.push((pool.clone(), cfg.clone()));
            }
        }
        // advance, first reactant fastest
        let mut i = 0;
        loop {
            if i == self.slots.len() {
                self.done = true;
                break;
            }
            self.index[i] += 1;
            if self.index[i] < self.slots[i].1.len() {
                break;
            }
            self.index[i] = 0;
            i += 1;
        }
        Some(Combination {
            educts,
            products,
            ratio,
        })
    }
}

/// Expands a reaction declaration into one finished [`Reaction`] per
/// name. Combinatorial siblings are tied together by `"scrambler"`
/// ratio constraints (the last one is redundant and omitted);
/// unidirectional declarations additionally get `"unidir"` constraints
/// per name. Any failure discards the whole declaration.
pub fn expand_reaction_declaration(
    decl: &ReactionDecl,
    pools: &[Pool],
    cfg: &mut Configuration,
) -> Result<Vec<Reaction>, NetworkError> {
    let joined = decl.names.join(",");
    for name in &decl.names {
        if !is_varname(name) {
            return Err(StructuralError::InvalidName(name.clone()).into());
        }
    }

    // every reactant must reference a known pool, and every variant
    // configuration must fit the pool's atom count
    let pool_map: HashMap<&str, &Pool> = pools.iter().map(|p| (p.name(), p)).collect();
    for (side, reactants) in [(Side::Educt, &decl.educts), (Side::Product, &decl.products)] {
        for r in reactants {
            let pool = match pool_map.get(r.name.as_str()) {
                Some(pool) => *pool,
                None => {
                    return Err(StructuralError::UnknownPool {
                        reaction: joined.clone(),
                        pool: r.name.clone(),
                    }
                    .into());
                }
            };
            for v in &r.variants {
                identify_perm_spec(&v.cfg).map_err(|source| NetworkError::Grammar {
                    reaction: joined.clone(),
                    side,
                    source,
                })?;
                let cfg_len =
                    perm_spec_length(&v.cfg).map_err(|source| NetworkError::Grammar {
                        reaction: joined.clone(),
                        side,
                        source,
                    })?;
                if cfg_len != pool.num_atoms() {
                    return Err(StructuralError::AtomCountMismatch {
                        reaction: joined.clone(),
                        pool: r.name.clone(),
                        cfg_len,
                        natoms: pool.num_atoms(),
                    }
                    .into());
                }
            }
        }
    }

    let nreact = decl.num_combinations();
    if nreact != decl.names.len() {
        return Err(StructuralError::VariantCount {
            reaction: joined,
            given: decl.names.len(),
            expected: nreact,
        }
        .into());
    }

    let mut out = Vec::with_capacity(nreact);
    let mut nconst = 1;
    for (name, combo) in decl.names.iter().zip(decl.combinations()?) {
        let mut reaction = Reaction::new(name, decl.bidirectional)?;
        for (pool, cfg_str) in &combo.educts {
            reaction.add_educt(pool, cfg_str)?;
        }
        for (pool, cfg_str) in &combo.products {
            reaction.add_product(pool, cfg_str)?;
        }
        reaction.finish()?;

        // ratio constraint tying this sibling to the whole family:
        // flux_i = ratio_i * (flux_1 + ... + flux_n); the last one
        // follows from the others and is left out
        if nconst < nreact {
            let mut family: Option<Expr> = None;
            for sibling in &decl.names {
                let var = Expr::Var(sibling.clone());
                family = Some(match family {
                    None => var,
                    Some(sum) => sum + var,
                });
            }
            if let Some(family) = family {
                let expr =
                    Expr::Var(name.clone()) - Expr::Const(combo.ratio) * family;
                cfg.create_constraint(
                    "scrambler",
                    expr.clone(),
                    ConstraintKind::Net,
                    Relation::EqZero,
                );
                cfg.create_constraint("scrambler", expr, ConstraintKind::Xch, Relation::EqZero);
            }
            nconst += 1;
        }
        out.push(reaction);
    }

    // a unidirectional flux pins the exchange to 0 and keeps the net
    // non-negative
    if !decl.bidirectional {
        for name in &decl.names {
            cfg.create_constraint(
                "unidir",
                Expr::Var(name.clone()),
                ConstraintKind::Xch,
                Relation::EqZero,
            );
            cfg.create_constraint(
                "unidir",
                Expr::Var(name.clone()),
                ConstraintKind::Net,
                Relation::GeqZero,
            );
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_single_variant_expansion() {
        let pools = vec![
            Pool::with_atoms("A", 2).unwrap(),
            Pool::with_atoms("B", 2).unwrap(),
        ];
        let mut decl = ReactionDecl::new(&["v1"], true);
        decl.educts.push(ReactantDecl::single("A", "ab"));
        decl.products.push(ReactantDecl::single("B", "ab"));
        let mut cfg = Configuration::new("default");
        let reactions = expand_reaction_declaration(&decl, &pools, &mut cfg).unwrap();
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].name(), "v1");
        assert!(reactions[0].is_finished());
        assert!(cfg.constraints().is_empty());
    }

    #[test]
    fn test_scrambler_expansion() {
        // symmetric molecule: the product picks up the educt atoms in
        // either orientation with equal probability
        let pools = vec![
            Pool::with_atoms("Fum", 4).unwrap(),
            Pool::with_atoms("Suc", 4).unwrap(),
        ];
        let mut decl = ReactionDecl::new(&["v_sym_a", "v_sym_b"], true);
        decl.educts.push(ReactantDecl::single("Fum", "abcd"));
        decl.products.push(ReactantDecl::with_variants(
            "Suc",
            vec![Variant::new("abcd"), Variant::new("dcba")],
        ));
        let mut cfg = Configuration::new("default");
        let reactions = expand_reaction_declaration(&decl, &pools, &mut cfg).unwrap();
        assert_eq!(reactions.len(), 2);
        assert_eq!(reactions[0].permutation(), Some(&[0, 1, 2, 3][..]));
        assert_eq!(reactions[1].permutation(), Some(&[3, 2, 1, 0][..]));

        // one scrambler pair for the first sibling, the second is
        // redundant and omitted
        let names: Vec<&str> = cfg.constraints().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["scrambler", "scrambler"]);
    }

    #[test]
    fn test_combination_order_and_ratios() {
        let mut decl = ReactionDecl::new(&["a", "b", "c", "d"], true);
        decl.educts.push(ReactantDecl::with_variants(
            "E",
            vec![
                Variant::with_ratio("ab", 0.25),
                Variant::with_ratio("ba", 0.75),
            ],
        ));
        decl.products.push(ReactantDecl::with_variants(
            "P",
            vec![Variant::new("ab"), Variant::new("ba")],
        ));
        let combos: Vec<Combination> = decl.combinations().unwrap().collect();
        assert_eq!(combos.len(), 4);
        // first reactant cycles fastest
        assert_eq!(combos[0].educts[0].1, "ab");
        assert_eq!(combos[1].educts[0].1, "ba");
        assert_eq!(combos[0].products[0].1, "ab");
        assert_eq!(combos[2].products[0].1, "ba");
        assert_relative_eq!(combos[0].ratio, 0.125);
        assert_relative_eq!(combos[1].ratio, 0.375);

        // the iterator restarts from the beginning
        let again: Vec<Combination> = decl.combinations().unwrap().collect();
        assert_eq!(combos, again);
    }

    #[test]
    fn test_ratio_consistency() {
        let mixed = ReactantDecl::with_variants(
            "E",
            vec![Variant::with_ratio("ab", 0.5), Variant::new("ba")],
        );
        assert!(matches!(
            mixed.normalized_ratios(),
            Err(StructuralError::VariantRatios { .. })
        ));

        let bad_sum = ReactantDecl::with_variants(
            "E",
            vec![
                Variant::with_ratio("ab", 0.5),
                Variant::with_ratio("ba", 0.2),
            ],
        );
        assert!(matches!(
            bad_sum.normalized_ratios(),
            Err(StructuralError::VariantRatioSum { .. })
        ));

        let uniform = ReactantDecl::with_variants(
            "E",
            vec![Variant::new("ab"), Variant::new("ba")],
        );
        let ratios = uniform.normalized_ratios().unwrap();
        assert_relative_eq!(ratios[0], 0.5);
        assert_relative_eq!(ratios[1], 0.5);
    }

    #[test]
    fn test_name_count_must_match_combinations() {
        let pools = vec![
            Pool::with_atoms("A", 2).unwrap(),
            Pool::with_atoms("B", 2).unwrap(),
        ];
        let mut decl = ReactionDecl::new(&["only_one"], true);
        decl.educts.push(ReactantDecl::with_variants(
            "A",
            vec![Variant::new("ab"), Variant::new("ba")],
        ));
        decl.products.push(ReactantDecl::single("B", "ab"));
        let mut cfg = Configuration::new("default");
        assert!(matches!(
            expand_reaction_declaration(&decl, &pools, &mut cfg).unwrap_err(),
            NetworkError::Structural(StructuralError::VariantCount { given: 1, expected: 2, .. })
        ));
    }

    #[test]
    fn test_unidirectional_declaration_constraints() {
        let pools = vec![
            Pool::with_atoms("A", 2).unwrap(),
            Pool::with_atoms("B", 2).unwrap(),
        ];
        let mut decl = ReactionDecl::new(&["v1"], false);
        decl.educts.push(ReactantDecl::single("A", "ab"));
        decl.products.push(ReactantDecl::single("B", "ab"));
        let mut cfg = Configuration::new("default");
        expand_reaction_declaration(&decl, &pools, &mut cfg).unwrap();
        let names: Vec<&str> = cfg.constraints().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["unidir", "unidir"]);
    }

    #[test]
    fn test_bad_cfg_is_located() {
        let pools = vec![
            Pool::with_atoms("A", 2).unwrap(),
            Pool::with_atoms("B", 2).unwrap(),
        ];
        let mut decl = ReactionDecl::new(&["v1"], true);
        decl.educts.push(ReactantDecl::single("A", "abc"));
        decl.products.push(ReactantDecl::single("B", "ab"));
        let mut cfg = Configuration::new("default");
        assert!(matches!(
            expand_reaction_declaration(&decl, &pools, &mut cfg).unwrap_err(),
            NetworkError::Structural(StructuralError::AtomCountMismatch { .. })
        ));
    }
}
