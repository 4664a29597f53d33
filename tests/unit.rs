//! Entry point wiring `tests/unit/*` into cargo's test harness.

#[path = "unit/mod.rs"]
mod unit;
