//! Cache key fingerprinting
//!
//! Keys look like `category:sortedLayerIds:contentHash:optionsHash`. The
//! category is a substring-sniffing locality hint; nothing branches on it.

use crate::pipeline::layers::LayerId;
use crate::pipeline::transform::TransformOptions;
use sha2::{Digest, Sha256};

/// Coarse best-effort content classification used to group related keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCategory {
    Config,
    ReactLike,
    Test,
    Module,
    Generic,
}

impl ContentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentCategory::Config => "config",
            ContentCategory::ReactLike => "react-like",
            ContentCategory::Test => "test",
            ContentCategory::Module => "module",
            ContentCategory::Generic => "generic",
        }
    }
}

/// Sniff a coarse category out of the code text. Strictly a locality hint.
pub fn classify(code: &str) -> ContentCategory {
    let head: String = code.chars().take(4096).collect();
    if head.contains("module.exports") && head.contains("config") {
        ContentCategory::Config
    } else if head.contains("describe(") || head.contains("it(") || head.contains("test(") {
        ContentCategory::Test
    } else if head.contains("useState") || head.contains("<") && head.contains("/>") {
        ContentCategory::ReactLike
    } else if head.contains("import ") || head.contains("export ") {
        ContentCategory::Module
    } else {
        ContentCategory::Generic
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Build the deterministic fingerprint for one stage consult: current code,
/// the remaining layer set, and the transform options.
pub fn fingerprint(code: &str, remaining_layers: &[LayerId], options: &TransformOptions) -> String {
    let mut ids: Vec<u8> = remaining_layers.iter().map(|id| id.0).collect();
    ids.sort_unstable();
    let layer_part = ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join("-");

    let mut options_buf = String::new();
    for (key, value) in options {
        options_buf.push_str(key);
        options_buf.push('=');
        options_buf.push_str(value);
        options_buf.push(';');
    }

    format!(
        "{}:{}:{}:{}",
        classify(code).as_str(),
        layer_part,
        sha256_hex(code.as_bytes()),
        sha256_hex(options_buf.as_bytes())
    )
}
