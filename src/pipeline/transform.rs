#![allow(clippy::result_large_err)]

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use crate::pipeline::layers::{self, LayerId};
use async_trait::async_trait;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::OnceLock;

/// Options passed through to every layer transform. Kept as an ordered map so
/// the cache options digest is deterministic.
pub type TransformOptions = BTreeMap<String, String>;

/// Output of one layer transform run.
#[derive(Debug, Clone)]
pub struct TransformOutcome {
    pub code: String,
    /// Human-readable descriptors of what changed, surfaced as improvements.
    pub changes: Vec<String>,
}

impl TransformOutcome {
    pub fn unchanged(code: String) -> Self {
        TransformOutcome {
            code,
            changes: Vec::new(),
        }
    }
}

/// Trait implemented by per-layer transforms.
///
/// Implementations must be effectively pure for a given `(code, options)`
/// pair; cache validity depends on it.
#[async_trait]
pub trait LayerTransform: Send + Sync + 'static {
    /// The layer this transform implements.
    fn layer_id(&self) -> LayerId;

    /// Produce a candidate rewrite of `code`.
    async fn apply(
        &self,
        code: &str,
        options: &TransformOptions,
    ) -> Result<TransformOutcome, AppError>;
}

/// Builder used to register transforms before execution.
pub struct TransformRegistryBuilder {
    transforms: HashMap<LayerId, Arc<dyn LayerTransform>>,
}

impl Default for TransformRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformRegistryBuilder {
    pub fn new() -> Self {
        Self {
            transforms: HashMap::new(),
        }
    }

    pub fn register<T: LayerTransform>(&mut self, transform: T) -> &mut Self {
        let id = transform.layer_id();
        if self.transforms.contains_key(&id) {
            panic!("duplicate transform registered for layer {}", id);
        }
        self.transforms.insert(id, Arc::new(transform));
        self
    }

    /// Finalize the registry. Also verifies the layer table's transitivity
    /// invariant, which the resolver's single-pass correction depends on.
    pub fn build(self) -> Result<TransformRegistry, AppError> {
        layers::verify_transitive()?;
        Ok(TransformRegistry {
            inner: Arc::new(self.transforms),
        })
    }
}

/// Immutable registry of layer transforms, shared across workers.
#[derive(Clone)]
pub struct TransformRegistry {
    inner: Arc<HashMap<LayerId, Arc<dyn LayerTransform>>>,
}

impl TransformRegistry {
    pub fn builder() -> TransformRegistryBuilder {
        TransformRegistryBuilder::new()
    }

    /// Registry with the built-in reference transforms for all six layers.
    pub fn with_builtins() -> Result<Self, AppError> {
        let mut builder = TransformRegistryBuilder::new();
        register_builtins(&mut builder);
        builder.build()
    }

    pub fn get(&self, id: LayerId) -> Option<Arc<dyn LayerTransform>> {
        self.inner.get(&id).cloned()
    }
}

/// Register the built-in reference transforms.
///
/// These are deliberately simple textual stand-ins for the real per-layer fix
/// heuristics, which live behind this same trait in production use.
pub fn register_builtins(builder: &mut TransformRegistryBuilder) {
    builder
        .register(ConfigModernization)
        .register(PatternCleanup)
        .register(ComponentCorrectness)
        .register(RuntimeSafety)
        .register(RouterIdioms)
        .register(TestQuality);
}

fn replace_counted(
    code: &str,
    pattern: &str,
    replacement: &str,
    changes: &mut Vec<String>,
    note: &str,
) -> String {
    let count = code.matches(pattern).count();
    if count > 0 {
        changes.push(format!("{} ({} occurrence(s))", note, count));
        code.replace(pattern, replacement)
    } else {
        code.to_string()
    }
}

/// Layer 1: configuration modernization.
pub struct ConfigModernization;

#[async_trait]
impl LayerTransform for ConfigModernization {
    fn layer_id(&self) -> LayerId {
        LayerId(1)
    }

    async fn apply(
        &self,
        code: &str,
        _options: &TransformOptions,
    ) -> Result<TransformOutcome, AppError> {
        let mut changes = Vec::new();
        let code = replace_counted(
            code,
            "module.exports =",
            "export default",
            &mut changes,
            "Replaced CommonJS export with ES module export",
        );
        Ok(TransformOutcome { code, changes })
    }
}

/// Layer 2: text-pattern cleanup (encoded entities, debug prints).
pub struct PatternCleanup;

#[async_trait]
impl LayerTransform for PatternCleanup {
    fn layer_id(&self) -> LayerId {
        LayerId(2)
    }

    async fn apply(
        &self,
        code: &str,
        _options: &TransformOptions,
    ) -> Result<TransformOutcome, AppError> {
        static DEBUG_LINE: OnceLock<Regex> = OnceLock::new();
        let debug_line = DEBUG_LINE.get_or_init(|| {
            Regex::new(r"(?m)^\s*(console\.(log|debug|trace)\(.*\);?|debugger;?)\s*\n?")
                .expect("debug-line pattern")
        });

        let mut changes = Vec::new();
        let mut current = code.to_string();
        for (entity, plain, note) in [
            ("&quot;", "\"", "Decoded &quot; entities"),
            ("&#39;", "'", "Decoded &#39; entities"),
            ("&amp;", "&", "Decoded &amp; entities"),
            ("&lt;", "<", "Decoded &lt; entities"),
            ("&gt;", ">", "Decoded &gt; entities"),
        ] {
            current = replace_counted(&current, entity, plain, &mut changes, note);
        }

        let stripped = debug_line.replace_all(&current, "");
        if stripped != current {
            changes.push("Removed debug print statements".to_string());
            current = stripped.into_owned();
        }

        Ok(TransformOutcome {
            code: current,
            changes,
        })
    }
}

/// Layer 3: component correctness fixes.
pub struct ComponentCorrectness;

#[async_trait]
impl LayerTransform for ComponentCorrectness {
    fn layer_id(&self) -> LayerId {
        LayerId(3)
    }

    async fn apply(
        &self,
        code: &str,
        _options: &TransformOptions,
    ) -> Result<TransformOutcome, AppError> {
        let mut changes = Vec::new();
        let code = replace_counted(
            code,
            "class=\"",
            "className=\"",
            &mut changes,
            "Renamed class attribute to className",
        );
        let code = replace_counted(
            &code,
            "for=\"",
            "htmlFor=\"",
            &mut changes,
            "Renamed for attribute to htmlFor",
        );
        Ok(TransformOutcome { code, changes })
    }
}

/// Layer 4: runtime-safety guards.
pub struct RuntimeSafety;

#[async_trait]
impl LayerTransform for RuntimeSafety {
    fn layer_id(&self) -> LayerId {
        LayerId(4)
    }

    async fn apply(
        &self,
        code: &str,
        _options: &TransformOptions,
    ) -> Result<TransformOutcome, AppError> {
        static UNGUARDED_MAP: OnceLock<Regex> = OnceLock::new();
        let unguarded_map = UNGUARDED_MAP.get_or_init(|| {
            Regex::new(r"(\bprops\.[A-Za-z_][A-Za-z0-9_]*)\.map\(").expect("map-guard pattern")
        });

        let mut changes = Vec::new();
        let guarded = unguarded_map.replace_all(code, "$1?.map(");
        let code = if guarded != code {
            changes.push("Guarded prop collection access with optional chaining".to_string());
            guarded.into_owned()
        } else {
            code.to_string()
        };
        Ok(TransformOutcome { code, changes })
    }
}

/// Layer 5: routing-framework idioms.
pub struct RouterIdioms;

#[async_trait]
impl LayerTransform for RouterIdioms {
    fn layer_id(&self) -> LayerId {
        LayerId(5)
    }

    async fn apply(
        &self,
        code: &str,
        _options: &TransformOptions,
    ) -> Result<TransformOutcome, AppError> {
        let mut changes = Vec::new();
        let code = replace_counted(
            code,
            "useHistory()",
            "useNavigate()",
            &mut changes,
            "Migrated useHistory to useNavigate",
        );
        let code = replace_counted(
            &code,
            "history.push(",
            "navigate(",
            &mut changes,
            "Migrated history.push to navigate",
        );
        Ok(TransformOutcome { code, changes })
    }
}

/// Layer 6: test/quality improvements.
pub struct TestQuality;

#[async_trait]
impl LayerTransform for TestQuality {
    fn layer_id(&self) -> LayerId {
        LayerId(6)
    }

    async fn apply(
        &self,
        code: &str,
        _options: &TransformOptions,
    ) -> Result<TransformOutcome, AppError> {
        let mut changes = Vec::new();
        let code = replace_counted(
            code,
            "it.only(",
            "it(",
            &mut changes,
            "Removed focused it blocks",
        );
        let code = replace_counted(
            &code,
            "describe.only(",
            "describe(",
            &mut changes,
            "Removed focused describe blocks",
        );
        Ok(TransformOutcome { code, changes })
    }
}

/// Transform that always fails; useful for exercising failure capture.
pub struct FailingTransform {
    pub id: LayerId,
    pub message: String,
}

#[async_trait]
impl LayerTransform for FailingTransform {
    fn layer_id(&self) -> LayerId {
        self.id
    }

    async fn apply(
        &self,
        _code: &str,
        _options: &TransformOptions,
    ) -> Result<TransformOutcome, AppError> {
        Err(
            AppError::new(ErrorCategory::TransformError, self.message.clone())
                .with_code("LAM-XFORM-001"),
        )
    }
}
