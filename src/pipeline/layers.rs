#![allow(clippy::result_large_err)]

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use serde::{Deserialize, Serialize};

/// Identifier of one fix layer. Valid ids are 1..=6.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LayerId(pub u8);

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Static description of one pipeline layer.
#[derive(Debug, Clone)]
pub struct LayerSpec {
    pub id: LayerId,
    pub name: &'static str,
    /// Full transitive dependency set, not just immediate parents. The
    /// resolver's single pass relies on this; `verify_transitive` checks it.
    pub dependencies: &'static [LayerId],
    pub critical: bool,
    pub estimated_duration_ms: u64,
}

/// The fixed, process-wide layer table.
pub const LAYER_TABLE: &[LayerSpec] = &[
    LayerSpec {
        id: LayerId(1),
        name: "config-modernization",
        dependencies: &[],
        critical: true,
        estimated_duration_ms: 120,
    },
    LayerSpec {
        id: LayerId(2),
        name: "pattern-cleanup",
        dependencies: &[LayerId(1)],
        critical: false,
        estimated_duration_ms: 250,
    },
    LayerSpec {
        id: LayerId(3),
        name: "component-correctness",
        dependencies: &[LayerId(1), LayerId(2)],
        critical: true,
        estimated_duration_ms: 900,
    },
    LayerSpec {
        id: LayerId(4),
        name: "runtime-safety",
        dependencies: &[LayerId(1), LayerId(2), LayerId(3)],
        critical: true,
        estimated_duration_ms: 600,
    },
    LayerSpec {
        id: LayerId(5),
        name: "router-idioms",
        dependencies: &[LayerId(1), LayerId(2), LayerId(3), LayerId(4)],
        critical: false,
        estimated_duration_ms: 400,
    },
    LayerSpec {
        id: LayerId(6),
        name: "test-quality",
        dependencies: &[LayerId(1), LayerId(2), LayerId(3), LayerId(4), LayerId(5)],
        critical: false,
        estimated_duration_ms: 700,
    },
];

/// Look up a layer by id.
pub fn layer_spec(id: LayerId) -> Option<&'static LayerSpec> {
    LAYER_TABLE.iter().find(|spec| spec.id == id)
}

/// All valid layer ids in ascending order.
pub fn all_layer_ids() -> Vec<LayerId> {
    LAYER_TABLE.iter().map(|spec| spec.id).collect()
}

/// Verify that every layer's declared dependency set is transitively closed:
/// each dependency is a valid layer, lower-numbered, and its own dependencies
/// are all listed too. Run once at registry build; the resolver's single-pass
/// correction is only correct under this property.
pub fn verify_transitive() -> Result<(), AppError> {
    for spec in LAYER_TABLE {
        for dep in spec.dependencies {
            let dep_spec = layer_spec(*dep).ok_or_else(|| {
                AppError::new(
                    ErrorCategory::InternalError,
                    format!("layer {} depends on unknown layer {}", spec.id, dep),
                )
                .with_code("LAM-TABLE-001")
            })?;
            if dep.0 >= spec.id.0 {
                return Err(AppError::new(
                    ErrorCategory::InternalError,
                    format!("layer {} depends on non-ancestor layer {}", spec.id, dep),
                )
                .with_code("LAM-TABLE-002"));
            }
            for transitive in dep_spec.dependencies {
                if !spec.dependencies.contains(transitive) {
                    return Err(AppError::new(
                        ErrorCategory::InternalError,
                        format!(
                            "layer {} is missing transitive dependency {} (via layer {})",
                            spec.id, transitive, dep
                        ),
                    )
                    .with_code("LAM-TABLE-003"));
                }
            }
        }
    }
    Ok(())
}
