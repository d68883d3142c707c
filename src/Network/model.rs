use crate::Network::constraints::{Configuration, ConstraintKind, Relation};
use crate::Network::pool::Pool;
use crate::Network::reaction::Reaction;
use crate::Network::validator::{NetworkValidator, ValidatedNetwork};
use crate::Network::variants::{ReactionDecl, expand_reaction_declaration};
use crate::Network::{NetworkError, StructuralError};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// THE STRUCT NetworkModel COLLECTS THE WHOLE REACTION NETWORK UNDER
/// CONSTRUCTION: the pool list, the reaction list and the flux
/// configuration the default constraints are attached to.
/// The expected call order mirrors the document layer: pools first,
/// then reactions (directly or through variant declarations), then one
/// `validate()` call over the finished collections.
#[derive(Debug, Clone, Default)]
pub struct NetworkModel {
    pools: Vec<Pool>,
    reactions: Vec<Reaction>,
    pub configuration: Configuration,
}

impl NetworkModel {
    pub fn new() -> Self {
        NetworkModel {
            pools: Vec::new(),
            reactions: Vec::new(),
            configuration: Configuration::new("default"),
        }
    }

    pub fn pools(&self) -> &[Pool] {
        &self.pools
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    pub fn find_pool(&self, name: &str) -> Option<&Pool> {
        self.pools.iter().find(|p| p.name() == name)
    }

    pub fn find_reaction(&self, name: &str) -> Option<&Reaction> {
        self.reactions.iter().find(|r| r.name() == name)
    }

    pub fn add_pool(&mut self, pool: Pool) -> Result<(), StructuralError> {
        if self.find_pool(pool.name()).is_some() {
            return Err(StructuralError::DuplicatePool(pool.name().to_string()));
        }
        self.pools.push(pool);
        Ok(())
    }

    pub fn create_pool(
        &mut self,
        name: &str,
        natoms: usize,
        poolsize: f64,
        cfg: &str,
    ) -> Result<(), StructuralError> {
        self.add_pool(Pool::new(name, natoms, poolsize, cfg)?)
    }

    pub fn add_reaction(&mut self, reaction: Reaction) -> Result<(), StructuralError> {
        if self.find_reaction(reaction.name()).is_some() {
            return Err(StructuralError::DuplicateReaction(
                reaction.name().to_string(),
            ));
        }
        self.reactions.push(reaction);
        Ok(())
    }

    /// Expands a (possibly multi-name, multi-variant) reaction
    /// declaration into finished reactions and registers them together
    /// with their scrambler/unidir constraints.
    pub fn declare_reaction(&mut self, decl: &ReactionDecl) -> Result<(), NetworkError> {
        for name in &decl.names {
            if self.find_reaction(name).is_some() {
                return Err(StructuralError::DuplicateReaction(name.clone()).into());
            }
        }
        let reactions =
            expand_reaction_declaration(decl, &self.pools, &mut self.configuration)?;
        self.reactions.extend(reactions);
        Ok(())
    }

    /// Runs the three validation phases over the assembled network.
    /// Default flux constraints land in `self.configuration`.
    pub fn validate(&mut self) -> Result<ValidatedNetwork, NetworkError> {
        let validator = NetworkValidator::new(&self.pools, &self.reactions);
        validator.validate(&mut self.configuration)
    }

    /// Checksum over the whole model; scope flags select topology,
    /// annotations and constraint coverage independently.
    pub fn compute_checksum(&self, crc: u32, crc_scope: u32) -> u32 {
        let mut crc = crc;
        for pool in &self.pools {
            crc = pool.compute_checksum(crc, crc_scope);
        }
        for reaction in &self.reactions {
            crc = reaction.compute_checksum(crc, crc_scope);
        }
        self.configuration.compute_checksum(crc, crc_scope)
    }

    /// Serializable snapshot of the validated model.
    pub fn report(&self, validated: &ValidatedNetwork) -> NetworkReport {
        NetworkReport {
            pools: self
                .pools
                .iter()
                .map(|p| PoolSummary {
                    name: p.name().to_string(),
                    natoms: p.num_atoms(),
                    poolsize: p.pool_size(),
                    cfg: p.isotope_cfg().to_string(),
                })
                .collect(),
            reactions: self
                .reactions
                .iter()
                .map(|r| ReactionSummary {
                    name: r.name().to_string(),
                    bidirectional: r.is_bidirectional(),
                    educts: r
                        .educts()
                        .iter()
                        .map(|i| (i.name.clone(), i.atom_cfg.clone()))
                        .collect(),
                    products: r
                        .products()
                        .iter()
                        .map(|i| (i.name.clone(), i.atom_cfg.clone()))
                        .collect(),
                    permutation: r.permutation().map(|p| p.to_vec()),
                })
                .collect(),
            constraints: self
                .configuration
                .constraints()
                .iter()
                .map(|c| ConstraintSummary {
                    name: c.name.clone(),
                    kind: c.kind,
                    relation: c.relation,
                    expr: format!("{:?}", c.expr),
                })
                .collect(),
            validated: validated.clone(),
        }
    }
}

/// Pool entry of the serialized report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSummary {
    pub name: String,
    pub natoms: usize,
    pub poolsize: f64,
    pub cfg: String,
}

/// Reaction entry of the serialized report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionSummary {
    pub name: String,
    pub bidirectional: bool,
    pub educts: Vec<(String, String)>,
    pub products: Vec<(String, String)>,
    pub permutation: Option<Vec<usize>>,
}

/// Constraint entry of the serialized report; the expression is kept
/// as its rendered form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSummary {
    pub name: String,
    pub kind: ConstraintKind,
    pub relation: Relation,
    pub expr: String,
}

/// The validated network model in a JSON-serializable form: entities,
/// constraints, roles, usage report and the stoichiometric matrix.
/// This is the round-trip format the modeling core owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkReport {
    pub pools: Vec<PoolSummary>,
    pub reactions: Vec<ReactionSummary>,
    pub constraints: Vec<ConstraintSummary>,
    pub validated: ValidatedNetwork,
}

impl NetworkReport {
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), std::io::Error> {
        let mut file = File::create(path)?;
        file.write_all(serde_json::to_string_pretty(self)?.as_bytes())?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
