//! # ClearLaunch API Server Library
//!
//! HTTP surface for ClearLaunch: accounts, business profiles, launches and
//! their tasks, AI plan and copy generation, calendar export and billing.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `clients`: Outbound LLM, Stripe and Resend clients
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod routes;
