pub mod executor;
pub mod layers;
pub mod resolver;
pub mod transform;
pub mod validate;

pub use executor::{LayerResult, PipelineExecutor, PipelineOptions, PipelineReport};
pub use layers::{LayerId, LayerSpec, LAYER_TABLE};
pub use resolver::{DependencyResolver, LayerResolution};
pub use transform::{
    LayerTransform, TransformOptions, TransformOutcome, TransformRegistry,
    TransformRegistryBuilder,
};
pub use validate::{ParseOutcome, SourceParser, ValidationVerdict, Validator};
