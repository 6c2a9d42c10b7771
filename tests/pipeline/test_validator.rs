use laminate::pipeline::layers::LayerId;
use laminate::pipeline::validate::{ParseOutcome, SourceParser, ValidationVerdict, Validator};

fn fast(before: &str, after: &str) -> ValidationVerdict {
    Validator::new().validate(before, after, LayerId(2), None)
}

#[test]
fn noop_change_is_always_accepted() {
    let code = "function броken(((";
    let verdict = fast(code, code);
    assert!(!verdict.should_revert, "identical input must pass");
}

#[test]
fn missing_closing_paren_reverts_with_syntax_reason() {
    let before = "const x = fn(a, b);\n";
    let after = "const x = fn(a, b;\n";
    let verdict = fast(before, after);
    assert!(verdict.should_revert);
    let reason = verdict.reason.unwrap();
    assert!(reason.contains("syntax error"), "reason: {}", reason);
    assert!(reason.contains("parentheses"), "reason: {}", reason);
}

#[test]
fn each_bracket_kind_is_checked_pairwise() {
    let before = "const a = { b: [1, 2] };";
    assert!(fast(before, "const a = { b: [1, 2 };").should_revert);
    assert!(fast(before, "const a = { b: [1, 2] ;").should_revert);
    assert!(!fast(before, "const a = { b: [1, 2, 3] };").should_revert);
}

#[test]
fn concatenated_import_blocks_are_corruption() {
    let before = "import a from 'a';\nimport b from 'b';\n";
    let after = "import a from 'a' import b from 'b';\n";
    let verdict = fast(before, after);
    assert!(verdict.should_revert);
    assert!(verdict.reason.unwrap().contains("corruption signature"));
}

#[test]
fn losing_a_hook_import_reverts() {
    let before = "import { useState, useEffect } from 'react';\nconst a = 1;\n";
    let after = "import { useEffect } from 'react';\nconst a = 1;\n";
    let verdict = fast(before, after);
    assert!(verdict.should_revert);
    assert!(verdict.reason.unwrap().contains("useState"));
}

#[test]
fn unprotected_import_may_be_dropped() {
    let before = "import leftPad from 'left-pad';\nconst a = 1;\n";
    let after = "const a = 1;\n";
    assert!(!fast(before, after).should_revert);
}

/// Toy parser that accepts only balanced-depth parentheses.
struct DepthParser;

impl SourceParser for DepthParser {
    fn parse(&self, code: &str, _filename: &str) -> ParseOutcome {
        let mut depth: i64 = 0;
        for c in code.chars() {
            match c {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                return ParseOutcome::failed("unexpected ')'");
            }
        }
        if depth == 0 {
            ParseOutcome::ok()
        } else {
            ParseOutcome::failed("unclosed '('")
        }
    }
}

#[test]
fn parse_mode_reverts_only_introduced_failures() {
    let validator = Validator::new();

    let verdict = validator.validate("fn(a)", "fn(a", LayerId(4), Some(&DepthParser));
    assert!(verdict.should_revert);
    assert!(verdict.reason.unwrap().contains("introduced syntax error"));

    // Already-broken baseline cannot be judged.
    let verdict = validator.validate("fn(a", "fn(a))", LayerId(4), Some(&DepthParser));
    assert!(!verdict.should_revert);
}

#[test]
fn parse_mode_does_not_apply_fast_path_rules() {
    // Dropping a protected import is only a fast-path concern; the parse
    // tier judges syntax alone.
    let before = "import React from 'react';\nrender();\n";
    let after = "render();\n";
    let verdict = Validator::new().validate(before, after, LayerId(4), Some(&DepthParser));
    assert!(!verdict.should_revert);
}
