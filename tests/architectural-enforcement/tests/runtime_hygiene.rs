//! Integration Test: Runtime Hygiene
//!
//! **Policy**: Everything runs on one current-thread tokio runtime. A
//! blocking sleep stalls polling and rendering alike, so production code
//! waits with `tokio::time` only. Production code in `court-core`
//! propagates errors instead of panicking.
//!
//! **Exceptions**: Test modules (everything after `#[cfg(test)]`).

use architectural_enforcement::{rust_sources, violations};

fn report(kind: &str, found: &[String]) {
    if found.is_empty() {
        return;
    }
    eprintln!("\n❌ {kind} found in production code!\n");
    for violation in found {
        eprintln!("  ❌ {violation}");
    }
    panic!("\nFound {} violation(s). Fix these before merging!", found.len());
}

#[test]
fn test_no_blocking_sleep() {
    let mut sources = rust_sources("court/core/src");
    sources.extend(rust_sources("tui/src"));

    let found = violations(&sources, |code| code.contains("thread::sleep("));
    report("Blocking sleep", &found);
}

#[test]
fn test_no_unwrap_in_core() {
    let sources = rust_sources("court/core/src");

    let found = violations(&sources, |code| {
        code.contains(".unwrap()") || code.contains(".expect(")
    });
    report("unwrap()/expect()", &found);
}

#[test]
fn test_no_std_io_reads_in_core_loop() {
    // Serial reads go through AsyncFd
    let sources = rust_sources("court/core/src");

    let found = violations(&sources, |code| {
        code.contains("std::io::stdin") || code.contains("read_to_end(")
    });
    report("Blocking read", &found);
}
