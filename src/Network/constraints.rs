use RustedSciThe::symbolic::symbolic_engine::Expr;
use crate::Utils::checksum::{CRC_CONSTRAINTS, update_crc32};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which flux quantity a constraint binds: the net flux
/// (forward minus reverse) or the bidirectional exchange flux.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    Net,
    Xch,
}

/// Relation of the constraint expression to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    EqZero,
    GeqZero,
}

impl Relation {
    pub fn symbol(&self) -> &'static str {
        match self {
            Relation::EqZero => "=",
            Relation::GeqZero => ">=",
        }
    }
}

/// A named symbolic constraint on a flux configuration, e.g.
/// `"unidir I/O": v_upt >= 0 (net)`. The expression is compared against
/// zero under the given relation; satisfiability is someone else's
/// business.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub name: String,
    pub kind: ConstraintKind,
    pub relation: Relation,
    pub expr: Expr,
}

impl Constraint {
    /// human-readable rendering, also used as the deduplication key
    pub fn render(&self) -> String {
        format!(
            "[{:?}] {:?} {} 0 ({})",
            self.kind,
            self.expr,
            self.relation.symbol(),
            self.name
        )
    }
}

/// A flux configuration: the registry the validator and the variant
/// expansion attach their constraints to. Registering the same
/// constraint twice is a no-op, so a repeated validation pass does not
/// pile up duplicates.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    pub name: String,
    constraints: Vec<Constraint>,
    seen: HashSet<String>,
}

impl Configuration {
    pub fn new(name: &str) -> Self {
        Configuration {
            name: name.to_string(),
            constraints: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Registers a constraint; returns false when an identical one is
    /// already present.
    pub fn create_constraint(
        &mut self,
        name: &str,
        expr: Expr,
        kind: ConstraintKind,
        relation: Relation,
    ) -> bool {
        let c = Constraint {
            name: name.to_string(),
            kind,
            relation,
            expr,
        };
        if !self.seen.insert(c.render()) {
            return false;
        }
        self.constraints.push(c);
        true
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// constraints of one kind, in registration order
    pub fn constraints_of_kind(&self, kind: ConstraintKind) -> Vec<&Constraint> {
        self.constraints.iter().filter(|c| c.kind == kind).collect()
    }

    pub fn compute_checksum(&self, crc: u32, crc_scope: u32) -> u32 {
        let mut crc = crc;
        if crc_scope & CRC_CONSTRAINTS != 0 {
            crc = update_crc32(self.name.as_bytes(), crc);
            for c in &self.constraints {
                crc = update_crc32(c.render().as_bytes(), crc);
            }
        }
        crc
    }
}
