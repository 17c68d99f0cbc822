//! # Symmetria Application Library
//!
//! Everything the `symmetria` binary is made of, exposed as a library so the
//! integration tests can drive it without a process boundary.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                   apps/symmetria (THE BINARY)                 │
//! │                                                               │
//! │  ┌───────────┐   ┌──────────────┐   ┌──────────────────────┐  │
//! │  │   CLI     │   │   HTTP API   │   │   Line transport     │  │
//! │  │  (clap)   │   │   (axum)     │   │ (stdio / file+poll)  │  │
//! │  └─────┬─────┘   └──────┬───────┘   └──────────┬───────────┘  │
//! │        │                └──────────┬───────────┘              │
//! │        │                           ▼                          │
//! │        │                  ┌─────────────────┐                 │
//! │        └─────────────────▶│  CommandBridge  │                 │
//! │                           └────────┬────────┘                 │
//! │                                    ▼                          │
//! │                          ┌──────────────────┐                 │
//! │                          │  symmetria-core  │                 │
//! │                          │  (THE ENGINE)    │                 │
//! │                          └──────────────────┘                 │
//! └───────────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod bridge;
pub mod cli;
pub mod config;
pub mod levels;
