use camino::Utf8Path;
use tracing::warn;

use crate::domain::{FunctionToken, Ontology};
use crate::error::MipError;
use crate::shard;

/// All four ontology catalogues, loaded once per run and immutable after.
/// Catalogue index k is column k of every shard in that ontology, so a
/// resolved token's column is valid for every shard by construction.
#[derive(Debug, Clone)]
pub struct FunctionCatalogue {
    ontologies: Vec<OntologyCatalogue>,
}

#[derive(Debug, Clone)]
struct OntologyCatalogue {
    ontology: Ontology,
    identifiers: Vec<String>,
    descriptions: Vec<String>,
}

impl FunctionCatalogue {
    /// Read the four reference files from the corpus directory, in the fixed
    /// BP, MF, CC, EC order.
    pub fn load(corpus_dir: &Utf8Path) -> Result<Self, MipError> {
        let mut ontologies = Vec::with_capacity(Ontology::ALL.len());
        for ontology in Ontology::ALL {
            let path = shard::reference_path(corpus_dir, ontology);
            let (identifiers, descriptions) = shard::read_catalogue_file(&path)?;
            ontologies.push(OntologyCatalogue {
                ontology,
                identifiers,
                descriptions,
            });
        }
        Ok(Self { ontologies })
    }

    /// Build a catalogue from in-memory lists, in `Ontology::ALL` order.
    /// Intended for tests and callers that already hold the reference data.
    pub fn from_parts(parts: [(Vec<String>, Vec<String>); 4]) -> Self {
        let ontologies = Ontology::ALL
            .into_iter()
            .zip(parts)
            .map(|(ontology, (identifiers, descriptions))| OntologyCatalogue {
                ontology,
                identifiers,
                descriptions,
            })
            .collect();
        Self { ontologies }
    }

    /// Resolve user-supplied function identifiers against the catalogues.
    /// An `EC:` prefix is stripped before lookup (the EC catalogue stores
    /// bare numbers). Lookup scans ontologies in BP, MF, CC, EC order and
    /// takes the first exact match. Unmatched tokens are dropped with a
    /// warning and produce no output file.
    pub fn resolve(&self, raw_tokens: &[String]) -> Vec<FunctionToken> {
        let mut resolved = Vec::new();
        for raw in raw_tokens {
            let query = raw.strip_prefix("EC:").unwrap_or(raw);
            match self.find(query) {
                Some(token) => resolved.push(token),
                None => warn!(token = %raw, "function not found in any catalogue, skipping"),
            }
        }
        resolved
    }

    fn find(&self, query: &str) -> Option<FunctionToken> {
        for cat in &self.ontologies {
            if let Some(column) = cat.identifiers.iter().position(|id| id == query) {
                return Some(FunctionToken {
                    ontology: cat.ontology,
                    identifier: query.to_string(),
                    column,
                });
            }
        }
        None
    }

    /// Human-readable description for a resolved token.
    pub fn description(&self, token: &FunctionToken) -> Option<&str> {
        self.ontologies
            .iter()
            .find(|cat| cat.ontology == token.ontology)
            .and_then(|cat| cat.descriptions.get(token.column))
            .map(String::as_str)
    }
}
