//! # Defensoría Bot
//!
//! Conversational front-end and action server for the Defensoría
//! case-information bot. The dialogue-management backend handles intent
//! recognition and conversation flow; this crate supplies everything
//! around it that needs server-side logic.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   POST /chat   ┌─────────┐   REST webhook   ┌──────────┐
//! │  Widget  │───────────────▶│  Relay  │─────────────────▶│ Dialogue  │
//! │ (browser)│◀───────────────│         │◀─────────────────│ backend   │
//! └──────────┘                └─────────┘                  └────┬─────┘
//!                                                              │ POST /webhook
//!                                                              ▼
//!                                                        ┌──────────┐
//!                                                        │  Action   │
//!                                                        │  server   │──▶ radicados.csv
//!                                                        └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Action-server wire types |
//! | [`store`] | CSV record store with a load-once cache |
//! | [`fields`] | Column aliases and field resolution |
//! | [`minor`] | Minor-status classification |
//! | [`lookup`] | Case lookup and privacy redaction |
//! | [`actions`] | Action trait, registry, built-in actions |
//! | [`forms`] | Form-field validation actions |
//! | [`server`] | Action server HTTP endpoint |
//! | [`relay`] | Chat relay HTTP endpoint |

pub mod actions;
pub mod config;
pub mod fields;
pub mod forms;
pub mod lookup;
pub mod minor;
pub mod models;
pub mod relay;
pub mod server;
pub mod store;
