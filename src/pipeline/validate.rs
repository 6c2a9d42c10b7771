//! Stage validation
//!
//! Two distinct tiers decide whether a candidate rewrite is accepted or the
//! stage is rolled back. The fast path is a cheap textual heuristic for
//! layers with no parser collaborator; the parse-based tier gives the real
//! syntax guarantee when a parser is available. The tiers are never merged.

use crate::pipeline::layers::LayerId;
use regex::Regex;
use std::sync::OnceLock;

/// Decision for one stage candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationVerdict {
    pub should_revert: bool,
    pub reason: Option<String>,
}

impl ValidationVerdict {
    pub fn accept() -> Self {
        ValidationVerdict {
            should_revert: false,
            reason: None,
        }
    }

    pub fn revert<T: Into<String>>(reason: T) -> Self {
        ValidationVerdict {
            should_revert: true,
            reason: Some(reason.into()),
        }
    }
}

/// Result of a parse attempt by an external parser collaborator.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl ParseOutcome {
    pub fn ok() -> Self {
        ParseOutcome {
            success: true,
            error: None,
        }
    }

    pub fn failed<T: Into<String>>(error: T) -> Self {
        ParseOutcome {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// External parser/generator collaborator. Consumed only by the parse-based
/// validation tier and parser-backed layers.
pub trait SourceParser: Send + Sync {
    fn parse(&self, code: &str, filename: &str) -> ParseOutcome;
}

/// Import symbols that must never be dropped by a transform. Losing one of
/// these from the import block is treated as corruption.
const PROTECTED_IMPORT_SYMBOLS: &[&str] = &[
    "React",
    "Component",
    "useState",
    "useEffect",
    "useContext",
    "useRouter",
    "useNavigate",
    "render",
    "hydrateRoot",
];

struct CorruptionSignature {
    name: &'static str,
    pattern: &'static str,
}

/// Known bad-output textual signatures. A match in `after` that is absent
/// from `before` means the transform mangled the code.
const CORRUPTION_SIGNATURES: &[CorruptionSignature] = &[
    CorruptionSignature {
        name: "handler wrapped by a second invocation",
        pattern: r"=>\s*[A-Za-z_][A-Za-z0-9_]*\([^)]*\)\s*\(\s*\)",
    },
    CorruptionSignature {
        name: "import blocks concatenated without separation",
        pattern: r#"from\s+['"][^'"]+['"]\s*import\s"#,
    },
    CorruptionSignature {
        name: "duplicated export default",
        pattern: r"export\s+default[^;\n]*export\s+default",
    },
];

fn signature_regexes() -> &'static Vec<(&'static str, Regex)> {
    static REGEXES: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    REGEXES.get_or_init(|| {
        CORRUPTION_SIGNATURES
            .iter()
            .map(|sig| {
                (
                    sig.name,
                    Regex::new(sig.pattern).expect("corruption signature pattern"),
                )
            })
            .collect()
    })
}

#[derive(Debug, Clone, Default)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Validator
    }

    /// Decide whether a stage candidate is accepted.
    ///
    /// Runs exactly one tier: parse-based when `parser` is available for the
    /// layer, the textual fast path otherwise.
    pub fn validate(
        &self,
        before: &str,
        after: &str,
        layer_id: LayerId,
        parser: Option<&dyn SourceParser>,
    ) -> ValidationVerdict {
        if before == after {
            return ValidationVerdict::accept();
        }

        match parser {
            Some(parser) => self.validate_parsed(before, after, layer_id, parser),
            None => self.validate_fast_path(before, after),
        }
    }

    fn validate_parsed(
        &self,
        before: &str,
        after: &str,
        layer_id: LayerId,
        parser: &dyn SourceParser,
    ) -> ValidationVerdict {
        let filename = format!("layer-{}.source", layer_id);
        let before_parse = parser.parse(before, &filename);
        if !before_parse.success {
            // Cannot judge an already-invalid baseline.
            return ValidationVerdict::accept();
        }

        let after_parse = parser.parse(after, &filename);
        if !after_parse.success {
            let detail = after_parse
                .error
                .unwrap_or_else(|| "unknown parse failure".to_string());
            return ValidationVerdict::revert(format!("introduced syntax error: {}", detail));
        }

        ValidationVerdict::accept()
    }

    fn validate_fast_path(&self, before: &str, after: &str) -> ValidationVerdict {
        if let Some(reason) = check_bracket_balance(after) {
            return ValidationVerdict::revert(reason);
        }

        for (name, regex) in signature_regexes() {
            if regex.is_match(after) && !regex.is_match(before) {
                return ValidationVerdict::revert(format!("corruption signature: {}", name));
            }
        }

        if let Some(reason) = check_protected_imports(before, after) {
            return ValidationVerdict::revert(reason);
        }

        ValidationVerdict::accept()
    }
}

/// Pairwise counts of each bracket type must match. A cheap heuristic, not a
/// parse; strings and comments are deliberately not special-cased.
fn check_bracket_balance(code: &str) -> Option<String> {
    for (open, close, label) in [
        ('(', ')', "parentheses"),
        ('[', ']', "brackets"),
        ('{', '}', "braces"),
    ] {
        let opens = code.chars().filter(|c| *c == open).count();
        let closes = code.chars().filter(|c| *c == close).count();
        if opens != closes {
            return Some(format!(
                "syntax error: unbalanced {} ({} open, {} close)",
                label, opens, closes
            ));
        }
    }
    None
}

fn import_lines(code: &str) -> Vec<&str> {
    code.lines()
        .map(str::trim_start)
        .filter(|line| line.starts_with("import ") || line.contains("require("))
        .collect()
}

fn check_protected_imports(before: &str, after: &str) -> Option<String> {
    let before_imports = import_lines(before);
    if before_imports.is_empty() {
        return None;
    }
    let after_imports = import_lines(after);

    for symbol in PROTECTED_IMPORT_SYMBOLS {
        let present_before = before_imports.iter().any(|line| line.contains(symbol));
        if !present_before {
            continue;
        }
        let present_after = after_imports.iter().any(|line| line.contains(symbol));
        if !present_after {
            return Some(format!("critical import '{}' removed", symbol));
        }
    }
    None
}
