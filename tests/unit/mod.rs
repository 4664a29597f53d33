//! Unit/integration tests module

mod dispatch_test;
mod service_test;
