// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod classify;
pub mod fingerprint;
pub mod heat;
pub mod ingest;
pub mod metrics;
pub mod normalize;
pub mod store;
pub mod symbols;
pub mod translate;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::heat::{compute_heat, HeatConfig};
pub use crate::ingest::{IngestEngine, IngestReport};
pub use crate::store::{ArticleStore, MemoryStore};
pub use crate::translate::{DisplayText, Lang, Translator};
