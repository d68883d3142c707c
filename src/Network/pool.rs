use crate::Network::StructuralError;
use crate::Notation::atom_mask::LIMIT_MAX_ATOMS;
use crate::Notation::perm_spec::is_varname;
use crate::Utils::checksum::{CRC_ALL_ANNOTATIONS, CRC_REACTIONNETWORK, update_crc32};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A metabolite pool: a named chemical species with a fixed number of
/// labelable atom positions. Immutable once constructed; whether it is
/// used in a reaction or has an efflux is a property of the network and
/// lives in the validation report, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    name: String,
    natoms: usize,
    poolsize: f64,
    /// raw isotope configuration attribute, e.g. "C6N1" (may be empty
    /// in single-element mode)
    cfg: String,
    /// parsed isotope composition in cfg order: (element, atom count)
    iso_cfg: Vec<(String, usize)>,
}

impl Pool {
    /// Creates a pool from name, atom count, pool size and the isotope
    /// configuration attribute. An empty `cfg` selects the legacy
    /// single-element mode where `natoms` is the whole story.
    pub fn new(
        name: &str,
        natoms: usize,
        poolsize: f64,
        cfg: &str,
    ) -> Result<Self, StructuralError> {
        if !is_varname(name) {
            return Err(StructuralError::InvalidName(name.to_string()));
        }
        if natoms > LIMIT_MAX_ATOMS {
            return Err(StructuralError::TooManyAtoms {
                pool: name.to_string(),
                natoms,
                limit: LIMIT_MAX_ATOMS,
            });
        }
        if poolsize < 0.0 {
            return Err(StructuralError::NegativePoolSize {
                pool: name.to_string(),
            });
        }
        let iso_cfg = parse_isotope_cfg(name, cfg)?;
        let pool = Pool {
            name: name.to_string(),
            natoms,
            poolsize,
            cfg: cfg.to_string(),
            iso_cfg,
        };
        if !pool.atom_consistency_check() {
            return Err(StructuralError::AtomInconsistency {
                pool: name.to_string(),
            });
        }
        Ok(pool)
    }

    /// Convenience constructor for the common case: default pool size
    /// 1.0, no multi-isotope configuration.
    pub fn with_atoms(name: &str, natoms: usize) -> Result<Self, StructuralError> {
        Pool::new(name, natoms, 1.0, "")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_atoms(&self) -> usize {
        self.natoms
    }

    pub fn pool_size(&self) -> f64 {
        self.poolsize
    }

    /// raw isotope configuration attribute
    pub fn isotope_cfg(&self) -> &str {
        &self.cfg
    }

    /// parsed isotope composition, in configuration order
    pub fn isotopes(&self) -> &[(String, usize)] {
        &self.iso_cfg
    }

    /// Atom count of one chemical element. Pools without a
    /// multi-isotope configuration fall back to the single total;
    /// otherwise an unknown element reports None.
    pub fn num_atoms_of_element(&self, element: &str) -> Option<usize> {
        if self.iso_cfg.is_empty() {
            return Some(self.natoms);
        }
        self.iso_cfg
            .iter()
            .find(|(e, _)| e == element)
            .map(|(_, n)| *n)
    }

    /// Number of isotopes actually used for labeling. Pools without a
    /// multi-isotope configuration report 1.
    pub fn active_isotope_count(&self) -> usize {
        if self.iso_cfg.is_empty() {
            return 1;
        }
        self.iso_cfg.iter().filter(|(_, n)| *n > 0).count()
    }

    /// The labeled atom count must match the pool's primary (first
    /// configured) element; the legacy mode without a configuration is
    /// always consistent.
    fn atom_consistency_check(&self) -> bool {
        match self.iso_cfg.first() {
            None => true,
            Some((_, n)) => *n == self.natoms,
        }
    }

    /// Folds the pool's identity-relevant bytes into a running CRC-32.
    /// The isotope annotation is only covered when the scope asks for
    /// annotations, so topology checksums stay independent of it.
    pub fn compute_checksum(&self, crc: u32, crc_scope: u32) -> u32 {
        let mut crc = crc;
        if crc_scope & CRC_REACTIONNETWORK != 0 {
            crc = update_crc32(self.name.as_bytes(), crc);
            crc = update_crc32(&(self.natoms as u32).to_le_bytes(), crc);
            crc = update_crc32(&self.poolsize.to_le_bytes(), crc);
        }
        if crc_scope & CRC_ALL_ANNOTATIONS != 0 {
            crc = update_crc32(self.cfg.as_bytes(), crc);
        }
        crc
    }
}

// isotope configuration attribute: repeats of element symbol + count,
// e.g. "C6N2H1"
fn parse_isotope_cfg(pool: &str, cfg: &str) -> Result<Vec<(String, usize)>, StructuralError> {
    let re = Regex::new(r"(?i)([CNH])([0-9]+)").unwrap();
    let mut iso_cfg: Vec<(String, usize)> = Vec::new();
    for cap in re.captures_iter(cfg) {
        let element = cap[1].to_string();
        let count: usize = cap[2].parse().unwrap_or(0);
        if iso_cfg.iter().any(|(e, _)| *e == element) {
            return Err(StructuralError::DuplicateIsotope {
                pool: pool.to_string(),
                element,
            });
        }
        iso_cfg.push((element, count));
    }
    Ok(iso_cfg)
}
