// ABOUTME: Helper module index for integration tests
// ABOUTME: Exposes the axum request/response test utilities

pub mod axum_test;
