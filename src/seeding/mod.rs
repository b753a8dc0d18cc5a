//! Synthetic data pipeline: allocation, identifiers, synthesis, quota,
//! bulk loading and the orchestrator that sequences them.

pub mod allocator;
pub mod backfill;
pub mod bulk_loader;
pub mod catalog;
pub mod identity;
pub mod orchestrator;
pub mod quota;
pub mod synthesizer;

pub use allocator::{allocate, company_for_partition};
pub use backfill::{backfill_terminals, BackfillReport};
pub use bulk_loader::{BatchWriter, BulkLoader};
pub use identity::{IdentityEncoder, SequenceCounter};
pub use orchestrator::{SeedOutcome, SeedPlan, SeedStage, SeedSummary, SeedingOrchestrator};
pub use quota::LoadQuotaEnforcer;
pub use synthesizer::EntitySynthesizer;
