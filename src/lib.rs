// ABOUTME: Library root for the multi-provider AI chat portal backend
// ABOUTME: Exposes auth, storage, LLM adapter, and HTTP route modules
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # AI Chat Portal
//!
//! A multi-provider AI chat portal backend: authenticates users, persists
//! multi-turn conversations, forwards messages to one of four LLM providers
//! (OpenAI, Claude, Gemini, LM Studio), and offers simple analytics
//! (summarization, tagging, natural-language query) over chat history.
//!
//! ## Architecture
//!
//! - [`llm`] - provider adapter layer normalizing request/response shapes
//!   across the four external providers
//! - [`database`] - SQLite-backed document store for users and
//!   conversations (messages embedded inline)
//! - [`routes`] - REST endpoint handlers (auth, chat, analysis, health)
//! - [`auth`] - JWT token issuance/validation and password hashing
//! - [`server`] - router assembly and shared request state

#![warn(missing_docs)]

/// JWT-based authentication and password hashing
pub mod auth;
/// Environment-driven server configuration
pub mod config;
/// User and conversation stores over SQLite
pub mod database;
/// Unified error handling
pub mod errors;
/// LLM provider adapter layer
pub mod llm;
/// Logging configuration and setup
pub mod logging;
/// Core domain models (users, conversations, messages)
pub mod models;
/// HTTP route handlers organized by domain
pub mod routes;
/// Server assembly and shared resources
pub mod server;
