//! Loreweave Engine: the NPC cognition and action core.
//!
//! Wires together the memory store, LLM client, capability model, context
//! builder, response parser, command executor, goal/plan manager,
//! evaluator registry, promotion rules, world tick scheduler, and trace
//! fabric described across spec §4. Modules follow the teacher's
//! hexagonal split: `application` holds ports (traits) and services (the
//! logic that depends only on ports), `infrastructure` holds the concrete
//! adapters (SQLite persistence, the bounded write queue, the HTTP LLM
//! client, the in-memory trace fabric).

pub mod application;
pub mod config;
pub mod infrastructure;

pub use config::EngineConfig;
