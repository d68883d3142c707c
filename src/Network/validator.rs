use RustedSciThe::symbolic::symbolic_engine::Expr;
use crate::Network::constraints::{Configuration, ConstraintKind, Relation};
use crate::Network::pool::Pool;
use crate::Network::reaction::Reaction;
use crate::Network::stoich::StoichMatrixInteger;
use crate::Network::{NetworkError, Side, StructuralError};
use crate::Notation::perm_spec::perm_spec_length;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Role of a pool derived from the network topology: a pool is an
/// input (substrate boundary) until it shows up as the product of some
/// reaction, which makes it an inner pool subject to mass balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolRole {
    Input,
    Inner,
}

/// Derived usage view produced by the referential validation phase.
/// This replaces mutable bookkeeping flags on the pools themselves: the
/// pool entities stay untouched, the report carries what the network
/// does with them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    pub used_in_reaction: HashMap<String, bool>,
    pub has_efflux: HashMap<String, bool>,
    /// whether any reaction of the network is a pure efflux
    pub network_has_efflux: bool,
    /// structural warnings in the order they were found
    pub warnings: Vec<String>,
}

/// The outcome of a successful validation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedNetwork {
    pub usage: UsageReport,
    pub roles: HashMap<String, PoolRole>,
    pub stoich: StoichMatrixInteger,
}

/// Three strictly ordered validation phases over the assembled pool and
/// reaction collections: referential checks, role classification with
/// stoichiometric matrix construction, and synthesis of the default
/// flux direction constraints. Warnings accumulate; the fatal error at
/// the end of a phase names everything found so far, so one run shows
/// all problems.
pub struct NetworkValidator<'a> {
    pools: &'a [Pool],
    reactions: &'a [Reaction],
}

impl<'a> NetworkValidator<'a> {
    pub fn new(pools: &'a [Pool], reactions: &'a [Reaction]) -> Self {
        NetworkValidator { pools, reactions }
    }

    /// Runs all three phases. Default constraints land in `cfg`.
    pub fn validate(&self, cfg: &mut Configuration) -> Result<ValidatedNetwork, NetworkError> {
        info!("____________VALIDATING POOLS AND REACTIONS____________");
        let usage = self.validate_pools_and_reactions()?;
        info!("____________POOL ROLES AND STOICHIOMETRY____________");
        let (roles, stoich) = self.validate_roles_and_stoichiometry()?;
        info!("____________DEFAULT FLUX CONSTRAINTS____________");
        self.set_input_output_constraints(&roles, cfg);
        Ok(ValidatedNetwork {
            usage,
            roles,
            stoich,
        })
    }

    /// Phase 1: every referenced pool must exist and its configuration
    /// length must match the pool's atom count. Produces the usage
    /// report; isolated pools or a network without any efflux are
    /// fatal after everything has been reported.
    pub fn validate_pools_and_reactions(&self) -> Result<UsageReport, NetworkError> {
        let pool_map: HashMap<&str, &Pool> =
            self.pools.iter().map(|p| (p.name(), p)).collect();
        let mut report = UsageReport::default();
        for p in self.pools {
            report.used_in_reaction.insert(p.name().to_string(), false);
            report.has_efflux.insert(p.name().to_string(), false);
        }

        for reaction in self.reactions {
            // a network without any efflux reaction is defective
            report.network_has_efflux |= reaction.products().is_empty();

            for (side, occurrences) in [
                (Side::Educt, reaction.educts()),
                (Side::Product, reaction.products()),
            ] {
                for occ in occurrences {
                    let pool = match pool_map.get(occ.name.as_str()) {
                        Some(pool) => *pool,
                        None => {
                            return Err(StructuralError::UnknownPool {
                                reaction: reaction.name().to_string(),
                                pool: occ.name.clone(),
                            }
                            .into());
                        }
                    };
                    let cfg_len = perm_spec_length(&occ.atom_cfg).map_err(|source| {
                        NetworkError::Grammar {
                            reaction: reaction.name().to_string(),
                            side,
                            source,
                        }
                    })?;
                    if pool.num_atoms() != cfg_len {
                        return Err(StructuralError::AtomCountMismatch {
                            reaction: reaction.name().to_string(),
                            pool: occ.name.clone(),
                            cfg_len,
                            natoms: pool.num_atoms(),
                        }
                        .into());
                    }
                    report
                        .used_in_reaction
                        .insert(occ.name.clone(), true);
                    // every pool needs to drain through some reaction,
                    // which means appearing at least once as an educt
                    if side == Side::Educt {
                        report.has_efflux.insert(occ.name.clone(), true);
                    }
                }
            }
        }

        // collect every problem before deciding to fail
        if !report.network_has_efflux {
            let msg = "network has no efflux".to_string();
            warn!("{}", msg);
            report.warnings.push(msg);
        }
        let mut invalid = !report.network_has_efflux;
        for pool in self.pools {
            if !report.used_in_reaction[pool.name()] {
                let msg = format!("pool \"{}\" is isolated", pool.name());
                warn!("{}", msg);
                report.warnings.push(msg);
                invalid = true;
            }
            if !report.has_efflux[pool.name()] {
                let msg = format!(
                    "pool \"{}\" has no efflux (set at least one incident exchange flux >0)",
                    pool.name()
                );
                warn!("{}", msg);
                report.warnings.push(msg);
            }
        }
        if invalid {
            return Err(StructuralError::InconsistentNetwork {
                problems: report.warnings.clone(),
            }
            .into());
        }
        Ok(report)
    }

    /// Phase 2: classify pools into input and inner roles, reject
    /// reactions mixing both on their educt side, and build the
    /// stoichiometric matrix over the inner pools.
    pub fn validate_roles_and_stoichiometry(
        &self,
    ) -> Result<(HashMap<String, PoolRole>, StoichMatrixInteger), NetworkError> {
        // every pool is an input pool until it appears as a product
        let mut roles: HashMap<String, PoolRole> = self
            .pools
            .iter()
            .map(|p| (p.name().to_string(), PoolRole::Input))
            .collect();
        for reaction in self.reactions {
            for product in reaction.products() {
                roles.insert(product.name.clone(), PoolRole::Inner);
            }
        }

        // substrate and non-substrate educts must not meet in one
        // reaction; that would make its reversibility meaningless
        for reaction in self.reactions {
            let mut educt_roles = reaction
                .educts()
                .iter()
                .filter_map(|e| roles.get(e.name.as_str()).copied());
            let first = match educt_roles.next() {
                Some(role) => role,
                None => continue,
            };
            if educt_roles.any(|r| r != first) {
                let mut substrate = Vec::new();
                let mut non_substrate = Vec::new();
                for educt in reaction.educts() {
                    match roles.get(educt.name.as_str()) {
                        Some(PoolRole::Input) => substrate.push(educt.name.clone()),
                        _ => non_substrate.push(educt.name.clone()),
                    }
                }
                return Err(StructuralError::MixedEductRoles {
                    reaction: reaction.name().to_string(),
                    substrate,
                    non_substrate,
                }
                .into());
            }
        }

        // inner pool names in declaration order
        let inner: Vec<String> = self
            .pools
            .iter()
            .filter(|p| roles.get(p.name()) == Some(&PoolRole::Inner))
            .map(|p| p.name().to_string())
            .collect();
        if inner.is_empty() {
            return Err(StructuralError::OnlyInputPools.into());
        }

        let reaction_names: Vec<String> = self
            .reactions
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        let mut stoich = StoichMatrixInteger::new(inner, reaction_names);
        for (col, reaction) in self.reactions.iter().enumerate() {
            // draining from an educt pool: -1; feeding a product: +1
            for educt in reaction.educts() {
                if let Some(row) = stoich.row_index(&educt.name) {
                    stoich.add(row, col, -1);
                }
            }
            for product in reaction.products() {
                if let Some(row) = stoich.row_index(&product.name) {
                    stoich.add(row, col, 1);
                }
            }
        }
        Ok((roles, stoich))
    }

    /// Phase 3: reactions touching an input pool, and pure efflux
    /// reactions, are forced irreversible (net >= 0, exchange = 0);
    /// every other reaction gets a non-negative exchange flux.
    pub fn set_input_output_constraints(
        &self,
        roles: &HashMap<String, PoolRole>,
        cfg: &mut Configuration,
    ) {
        for reaction in self.reactions {
            let touches_input = reaction
                .educts()
                .iter()
                .any(|e| roles.get(e.name.as_str()) == Some(&PoolRole::Input));
            let flux = Expr::Var(reaction.name().to_string());
            if touches_input || reaction.products().is_empty() {
                cfg.create_constraint(
                    "unidir I/O",
                    flux.clone(),
                    ConstraintKind::Net,
                    Relation::GeqZero,
                );
                cfg.create_constraint("unidir I/O", flux, ConstraintKind::Xch, Relation::EqZero);
            } else {
                cfg.create_constraint(
                    "pos. xch",
                    flux,
                    ConstraintKind::Xch,
                    Relation::GeqZero,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reaction(name: &str, educts: &[(&str, &str)], products: &[(&str, &str)]) -> Reaction {
        let mut r = Reaction::new(name, true).unwrap();
        for (pool, cfg) in educts {
            r.add_educt(pool, cfg).unwrap();
        }
        for (pool, cfg) in products {
            r.add_product(pool, cfg).unwrap();
        }
        r
    }

    #[test]
    fn test_input_inner_classification() {
        let pools = vec![
            Pool::with_atoms("A", 3).unwrap(),
            Pool::with_atoms("B", 3).unwrap(),
        ];
        let reactions = vec![
            reaction("v1", &[("A", "abc")], &[("B", "abc")]),
            reaction("v_out", &[("B", "abc")], &[]),
        ];
        let v = NetworkValidator::new(&pools, &reactions);
        let mut cfg = Configuration::new("default");
        let validated = v.validate(&mut cfg).unwrap();

        assert_eq!(validated.roles["A"], PoolRole::Input);
        assert_eq!(validated.roles["B"], PoolRole::Inner);
        // 1x2 matrix: (B, v1) = +1, (B, v_out) = -1
        assert_eq!(validated.stoich.nrows(), 1);
        assert_eq!(validated.stoich.ncols(), 2);
        assert_eq!(validated.stoich.get("B", "v1"), Some(1));
        assert_eq!(validated.stoich.get("B", "v_out"), Some(-1));
        // A is an input pool and stays out of the matrix
        assert_eq!(validated.stoich.get("A", "v1"), None);
    }

    #[test]
    fn test_isolated_pool_is_fatal() {
        let pools = vec![
            Pool::with_atoms("A", 3).unwrap(),
            Pool::with_atoms("B", 3).unwrap(),
            Pool::with_atoms("C", 2).unwrap(),
        ];
        let reactions = vec![
            reaction("v1", &[("A", "abc")], &[("B", "abc")]),
            reaction("v_out", &[("B", "abc")], &[]),
        ];
        let v = NetworkValidator::new(&pools, &reactions);
        match v.validate_pools_and_reactions().unwrap_err() {
            NetworkError::Structural(StructuralError::InconsistentNetwork { problems }) => {
                assert!(problems.iter().any(|p| p.contains("\"C\" is isolated")));
            }
            other => panic!("expected InconsistentNetwork, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_network_efflux_is_fatal() {
        let pools = vec![
            Pool::with_atoms("A", 2).unwrap(),
            Pool::with_atoms("B", 2).unwrap(),
        ];
        let reactions = vec![
            reaction("v1", &[("A", "ab")], &[("B", "ab")]),
            reaction("v2", &[("B", "ab")], &[("A", "ab")]),
        ];
        let v = NetworkValidator::new(&pools, &reactions);
        match v.validate_pools_and_reactions().unwrap_err() {
            NetworkError::Structural(StructuralError::InconsistentNetwork { problems }) => {
                assert!(problems.iter().any(|p| p.contains("network has no efflux")));
            }
            other => panic!("expected InconsistentNetwork, got {:?}", other),
        }
    }

    #[test]
    fn test_pool_without_efflux_is_only_a_warning() {
        // D receives but never drains; the network still has an efflux
        let pools = vec![
            Pool::with_atoms("A", 2).unwrap(),
            Pool::with_atoms("B", 2).unwrap(),
            Pool::with_atoms("D", 2).unwrap(),
        ];
        let reactions = vec![
            reaction("v1", &[("A", "ab")], &[("B", "ab")]),
            reaction("v2", &[("A", "ab")], &[("D", "ab")]),
            reaction("v_out", &[("B", "ab")], &[]),
        ];
        let v = NetworkValidator::new(&pools, &reactions);
        let report = v.validate_pools_and_reactions().unwrap();
        assert!(!report.has_efflux["D"]);
        assert!(
            report
                .warnings
                .iter()
                .any(|w| w.contains("\"D\" has no efflux"))
        );
    }

    #[test]
    fn test_unknown_pool_and_atom_mismatch() {
        let pools = vec![Pool::with_atoms("A", 2).unwrap()];
        let reactions = vec![reaction("v1", &[("A", "ab")], &[("X", "ab")])];
        let v = NetworkValidator::new(&pools, &reactions);
        assert!(matches!(
            v.validate_pools_and_reactions().unwrap_err(),
            NetworkError::Structural(StructuralError::UnknownPool { .. })
        ));

        let pools = vec![
            Pool::with_atoms("A", 2).unwrap(),
            Pool::with_atoms("B", 3).unwrap(),
        ];
        let reactions = vec![reaction("v1", &[("A", "abc")], &[("B", "abc")])];
        let v = NetworkValidator::new(&pools, &reactions);
        assert!(matches!(
            v.validate_pools_and_reactions().unwrap_err(),
            NetworkError::Structural(StructuralError::AtomCountMismatch { .. })
        ));
    }

    #[test]
    fn test_mixed_educt_roles() {
        let pools = vec![
            Pool::with_atoms("S", 2).unwrap(),
            Pool::with_atoms("B", 2).unwrap(),
            Pool::with_atoms("C", 4).unwrap(),
        ];
        let reactions = vec![
            reaction("v1", &[("S", "ab")], &[("B", "ab")]),
            // S is still an input pool, B is inner by now
            reaction("v2", &[("S", "ab"), ("B", "cd")], &[("C", "abcd")]),
            reaction("v_out", &[("C", "abcd")], &[]),
        ];
        let v = NetworkValidator::new(&pools, &reactions);
        match v.validate_roles_and_stoichiometry().unwrap_err() {
            NetworkError::Structural(StructuralError::MixedEductRoles {
                reaction,
                substrate,
                non_substrate,
            }) => {
                assert_eq!(reaction, "v2");
                assert_eq!(substrate, vec!["S".to_string()]);
                assert_eq!(non_substrate, vec!["B".to_string()]);
            }
            other => panic!("expected MixedEductRoles, got {:?}", other),
        }
    }

    #[test]
    fn test_only_input_pools_is_fatal() {
        let pools = vec![Pool::with_atoms("A", 2).unwrap()];
        let reactions = vec![reaction("v_out", &[("A", "ab")], &[])];
        let v = NetworkValidator::new(&pools, &reactions);
        assert!(matches!(
            v.validate_roles_and_stoichiometry().unwrap_err(),
            NetworkError::Structural(StructuralError::OnlyInputPools)
        ));
    }

    #[test]
    fn test_default_constraints() {
        let pools = vec![
            Pool::with_atoms("A", 2).unwrap(),
            Pool::with_atoms("B", 2).unwrap(),
            Pool::with_atoms("C", 2).unwrap(),
        ];
        let reactions = vec![
            reaction("v_upt", &[("A", "ab")], &[("B", "ab")]),
            reaction("v_int", &[("B", "ab")], &[("C", "ab")]),
            reaction("v_out", &[("C", "ab")], &[]),
        ];
        let v = NetworkValidator::new(&pools, &reactions);
        let mut cfg = Configuration::new("default");
        v.validate(&mut cfg).unwrap();

        // v_upt consumes an input pool, v_out is an efflux: two
        // constraints each; v_int gets a single pos. xch constraint
        assert_eq!(cfg.constraints().len(), 5);
        let names: Vec<&str> = cfg.constraints().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names.iter().filter(|n| **n == "unidir I/O").count(), 4);
        assert_eq!(names.iter().filter(|n| **n == "pos. xch").count(), 1);

        // a second pass must not duplicate anything
        v.validate(&mut cfg).unwrap();
        assert_eq!(cfg.constraints().len(), 5);
    }
}
