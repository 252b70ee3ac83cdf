use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MipError;

/// The four functional-annotation namespaces DeepFRI scores against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ontology {
    /// Biological Process (GO)
    Bp,
    /// Molecular Function (GO)
    Mf,
    /// Cellular Component (GO)
    Cc,
    /// Enzyme Commission
    Ec,
}

impl Ontology {
    /// Fixed iteration order; also the tie-break order when the same
    /// identifier exists in more than one ontology.
    pub const ALL: [Ontology; 4] = [Ontology::Bp, Ontology::Mf, Ontology::Cc, Ontology::Ec];

    pub fn as_str(&self) -> &'static str {
        match self {
            Ontology::Bp => "BP",
            Ontology::Mf => "MF",
            Ontology::Cc => "CC",
            Ontology::Ec => "EC",
        }
    }
}

impl fmt::Display for Ontology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One resolved function to search for: an identifier pinned to its column
/// in every shard of its ontology. Built once by the resolver, read-only
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionToken {
    pub ontology: Ontology,
    pub identifier: String,
    pub column: usize,
}

/// The `name:model:chain` triple TM-align prints for each chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDescriptor {
    pub name: String,
    pub model: String,
    pub chain: String,
}

impl fmt::Display for ChainDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.name, self.model, self.chain)
    }
}

impl FromStr for ChainDescriptor {
    type Err = MipError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut parts = value.split(':');
        let (Some(name), Some(model), Some(chain), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(MipError::InvalidChainDescriptor(format!(
                "not a name:model:chain triple: {value}"
            )));
        };
        if name.is_empty() || model.is_empty() || chain.is_empty() {
            return Err(MipError::InvalidChainDescriptor(format!(
                "empty component in {value}"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            model: model.to_string(),
            chain: chain.to_string(),
        })
    }
}

/// One TM-align result block, fully populated. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentRecord {
    pub chain1: ChainDescriptor,
    pub chain1_length: u32,
    pub chain2: ChainDescriptor,
    pub chain2_length: u32,
    pub aligned_length: u32,
    pub aligned_length_rmsd: f64,
    pub aligned_length_seq_ident: f64,
    pub tm_score_norm_chain1: f64,
    pub tm_score_norm_chain2: f64,
}
