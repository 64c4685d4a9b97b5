// ABOUTME: Test helper module declarations
// ABOUTME: Exposes the axum oneshot request helper to integration tests

pub mod axum_test;
