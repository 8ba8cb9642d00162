//! Integration Test: Headless Core
//!
//! **Policy**: `court-core` MUST NOT depend on any UI framework. Drawing
//! belongs to surfaces implementing `Renderer`; the core only hands out
//! `DisplaySnapshot`s.

use std::fs;

use architectural_enforcement::{rust_sources, violations, workspace_root};

const UI_CRATES: &[&str] = &["ratatui", "crossterm"];

#[test]
fn test_core_manifest_has_no_ui_crates() {
    let manifest = fs::read_to_string(workspace_root().join("court/core/Cargo.toml"))
        .expect("court/core/Cargo.toml should be readable");

    let found: Vec<&str> = UI_CRATES
        .iter()
        .copied()
        .filter(|name| {
            manifest
                .lines()
                .any(|line| line.trim_start().starts_with(name))
        })
        .collect();

    assert!(found.is_empty(), "court-core depends on UI crates: {found:?}");
}

#[test]
fn test_core_sources_do_not_use_ui_crates() {
    let sources = rust_sources("court/core/src");
    assert!(!sources.is_empty(), "no sources found under court/core/src");

    let found = violations(&sources, |code| {
        UI_CRATES
            .iter()
            .any(|name| code.contains(&format!("{name}::")))
    });

    if !found.is_empty() {
        for violation in &found {
            eprintln!("  ❌ {violation}");
        }
        panic!("\nFound {} UI reference(s) in court-core", found.len());
    }
}
