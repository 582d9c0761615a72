//! Core domain models for the research pipeline.
//!
//! These are pure data structures with no I/O dependencies: the vocabulary
//! every other module speaks.

pub mod account_plan;
pub mod chunk;
pub mod conflict;
pub mod entities;
pub mod job;
pub mod score;
pub mod session;
pub mod source;

pub use account_plan::{AccountPlan, CompetitorEntry, FinancialEntry, FinancialSummary, KeyPerson, Swot};
pub use chunk::{Chunk, ChunkMetadata, SourceOrigin};
pub use conflict::{Conflict, ConflictSource, ConflictTopic, Severity};
pub use entities::{EntityKind, Entities};
pub use job::{Job, JobStatus};
pub use score::Score;
pub use session::{Message, Session, SessionState};
pub use source::{SourceKind, SourceReference};
