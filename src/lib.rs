//! # account-plan-rs
//!
//! Company-research pipeline and agent orchestrator that produces
//! structured account plans from web search, scraped documents, and an
//! LLM.
//!
//! ## Pipeline
//!
//! - **Retrieval**: search → scrape → preprocess → chunk → score → optional
//!   LLM enrichment → dedupe → vector store upsert ([`retrieval`]).
//! - **Tools**: entity extraction and cross-document conflict detection
//!   over retrieved chunks ([`tools`]).
//! - **Synthesis**: section-by-section account plan generation with
//!   per-failure retry policies and deterministic fallback text ([`llm`]).
//! - **Agent**: intent classification and workflow dispatch over a
//!   conversational session ([`agent`]).
//! - **Orchestration**: session memory, SERP caching, and query
//!   deduplication ([`orchestrator`]).
//!
//! Everything outside this core — auth, transport, document extraction,
//! PDF/email/voice delivery, concrete storage and model backends — is
//! represented only as an abstract trait interface in [`external`].

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![warn(unsafe_code)]

pub mod agent;
pub mod config;
pub mod core;
pub mod error;
pub mod external;
pub mod llm;
pub mod orchestrator;
pub mod processing;
pub mod retrieval;
pub mod tools;

pub use agent::{AgentController, AgentResponse, Intent};
pub use config::PipelineConfig;
pub use core::{AccountPlan, Chunk, ChunkMetadata, Conflict, Entities, Session};
pub use error::{Error, Result};
pub use retrieval::RetrievalPipeline;
