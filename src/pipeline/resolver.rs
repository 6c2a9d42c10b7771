//! Dependency resolver
//!
//! Corrects a requested layer set against the static layer table: invalid ids
//! are dropped, missing dependencies auto-added, and the result sorted
//! ascending. Never fails; worst case it returns the filtered input unchanged.

use crate::pipeline::layers::{self, LayerId};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerResolution {
    /// Corrected layer set, ascending, closed under the dependency relation.
    pub corrected: Vec<LayerId>,
    pub warnings: Vec<String>,
    /// Dependencies that were not requested but are required.
    pub auto_added: Vec<LayerId>,
}

#[derive(Debug, Clone, Default)]
pub struct DependencyResolver;

impl DependencyResolver {
    pub fn new() -> Self {
        DependencyResolver
    }

    /// Resolve the requested ids into a valid execution set.
    ///
    /// A single pass over the originally-requested ids suffices because the
    /// static table lists full transitive dependency sets per layer; that
    /// property is verified at registry build (`layers::verify_transitive`).
    pub fn resolve(&self, requested: &[u8]) -> LayerResolution {
        let mut resolution = LayerResolution::default();
        let mut working: BTreeSet<LayerId> = BTreeSet::new();
        let mut valid_requested: Vec<LayerId> = Vec::new();

        for raw in requested {
            let id = LayerId(*raw);
            match layers::layer_spec(id) {
                Some(_) => {
                    if working.insert(id) {
                        valid_requested.push(id);
                    }
                }
                None => {
                    resolution
                        .warnings
                        .push(format!("Unknown layer {} dropped from request", raw));
                }
            }
        }

        for id in &valid_requested {
            let spec = layers::layer_spec(*id).expect("validated above");
            for dep in spec.dependencies {
                if working.insert(*dep) {
                    resolution.auto_added.push(*dep);
                    resolution.warnings.push(format!(
                        "Layer {} ({}) requires layer {}; added automatically",
                        spec.id, spec.name, dep
                    ));
                }
            }
        }

        resolution.auto_added.sort();
        resolution.corrected = working.into_iter().collect();
        resolution
    }
}
