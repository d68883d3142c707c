use crate::Notation::GrammarError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Metabolite pool entity: validated name, labelable atom positions,
/// optional multi-isotope composition, pool size, checksum fold.
pub mod pool;

/// Reaction entity with its isotopomer occurrences and the one-time
/// `finish()` step that computes the atom permutation.
pub mod reaction;

/// The atom mapping itself: product-side key table, unmatched/duplicate
/// failure split, efflux uniqueness scan.
pub mod atom_match;

/// Multi-name reaction declarations with per-reactant labeling variants
/// and their Cartesian-product expansion into concrete reactions.
pub mod variants;

/// Stoichiometric matrix with named rows (inner pools) and columns
/// (reactions).
pub mod stoich;

/// The three-phase network consistency engine: referential validation,
/// role classification + stoichiometry, default flux constraints.
pub mod validator;

/// Named symbolic constraints (net / exchange) attached to a
/// configuration.
pub mod constraints;

/// The assembled network model: pool and reaction collections, variant
/// expansion, validation entry point and the serializable report.
///
/// # Examples
/// ```
/// use IsoFlux::Network::model::NetworkModel;
/// use IsoFlux::Network::reaction::Reaction;
///
/// let mut net = NetworkModel::new();
/// net.create_pool("A", 3, 1.0, "").unwrap();
/// net.create_pool("B", 3, 1.0, "").unwrap();
/// let mut upt = Reaction::new("v_upt", true).unwrap();
/// upt.add_educt("A", "abc").unwrap();
/// upt.add_product("B", "abc").unwrap();
/// upt.finish().unwrap();
/// net.add_reaction(upt).unwrap();
/// let mut out = Reaction::new("v_out", true).unwrap();
/// out.add_educt("B", "abc").unwrap();
/// out.finish().unwrap();
/// net.add_reaction(out).unwrap();
/// let validated = net.validate().unwrap();
/// assert_eq!(validated.stoich.nrows(), 1);
/// ```
pub mod model;


/// Which side of a reaction a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Educt,
    Product,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Educt => write!(f, "educt"),
            Side::Product => write!(f, "product"),
        }
    }
}

/// Atom-mapping failure, fatal to the reaction being finished.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermutationError {
    /// educt tags with no corresponding product tag
    #[error("illegal permutation -- {tags:?} unmatched in cfg of reaction {reaction}")]
    Unmatched { reaction: String, tags: Vec<String> },
    /// a tag key appears more than once where uniqueness is required
    #[error("illegal permutation -- duplicate atoms {tags:?} in cfg of reaction {reaction}")]
    Duplicate { reaction: String, tags: Vec<String> },
    #[error(
        "reaction {reaction} is unbalanced: {size_in} educt atoms vs {size_out} product atoms"
    )]
    SizeMismatch {
        reaction: String,
        size_in: usize,
        size_out: usize,
    },
    #[error("illegal permutation on educt side of reaction {reaction}")]
    EductSyntax { reaction: String },
    #[error("illegal permutation on product side of reaction {reaction}")]
    ProductSyntax { reaction: String },
}

/// Referential or topological inconsistency of the network, or a
/// malformed entity definition.
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum StructuralError {
    #[error("invalid name `{0}`: does not match [A-Za-z_][A-Za-z0-9_]*")]
    InvalidName(String),
    #[error("duplicate pool name `{0}`")]
    DuplicatePool(String),
    #[error("duplicate reaction name `{0}`")]
    DuplicateReaction(String),
    #[error("duplicate specification of the isotope `{element}` in pool `{pool}`")]
    DuplicateIsotope { pool: String, element: String },
    #[error("the number of atoms in pool `{pool}` is inconsistent with its cfg attribute")]
    AtomInconsistency { pool: String },
    #[error("pool `{pool}` declares {natoms} atom positions, beyond the limit of {limit}")]
    TooManyAtoms {
        pool: String,
        natoms: usize,
        limit: usize,
    },
    #[error("pool size of `{pool}` must be non-negative")]
    NegativePoolSize { pool: String },
    #[error("validation ({reaction}): pool {pool} does not exist")]
    UnknownPool { reaction: String, pool: String },
    #[error(
        "validation ({reaction}): pool {pool} shows mismatch in atom cfg ({cfg_len} positions vs {natoms} atoms)"
    )]
    AtomCountMismatch {
        reaction: String,
        pool: String,
        cfg_len: usize,
        natoms: usize,
    },
    #[error(
        "reaction \"{reaction}\" mixes substrate ({substrate:?}) and non-substrate pools ({non_substrate:?}) on its educt side"
    )]
    MixedEductRoles {
        reaction: String,
        substrate: Vec<String>,
        non_substrate: Vec<String>,
    },
    #[error("network contains only input pools")]
    OnlyInputPools,
    #[error("validation: inconsistent network structure: {problems:?}")]
    InconsistentNetwork { problems: Vec<String> },
    #[error("reaction {reaction} is already finished")]
    ReactionFinished { reaction: String },
    #[error(
        "reaction \"{reaction}\": number of reaction IDs ({given}) differs from number of variant combinations ({expected})"
    )]
    VariantCount {
        reaction: String,
        given: usize,
        expected: usize,
    },
    #[error("reactant `{name}`: inconsistent use of ratio attributes")]
    VariantRatios { name: String },
    #[error("reactant `{name}`: ratio attributes should sum to 1")]
    VariantRatioSum { name: String },
    #[error("reactant `{name}`: ratio must lie within [0,1]")]
    VariantRatioRange { name: String },
}

/// Umbrella error of the network layer. Grammar failures are wrapped
/// with the reaction and side they occurred on, so callers can report a
/// precise location.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NetworkError {
    #[error("in reaction `{reaction}` ({side} side): {source}")]
    Grammar {
        reaction: String,
        side: Side,
        #[source]
        source: GrammarError,
    },
    #[error(transparent)]
    Permutation(#[from] PermutationError),
    #[error(transparent)]
    Structural(#[from] StructuralError),
}
