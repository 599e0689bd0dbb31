//! Dirigent-Routing: Intent Routing for Dirigent
//!
//! Routes free-text task descriptions to specialized agents:
//! - Weighted keyword confidence scoring (pure, deterministic)
//! - Optional semantic scoring raced against a hard deadline
//! - Threshold classification into auto-trigger / suggest bands
//!
//! Profile configuration is held as an immutable snapshot and swapped
//! whole on reload, so concurrent routing calls never observe a
//! partially-updated profile set.

pub mod error;
pub mod profile;
pub mod router;
pub mod scorer;
pub mod semantic;

pub use error::{RoutingError, RoutingResult};
pub use profile::{AgentProfile, ProfileSet, ProfileSource, TomlProfileSource, WeightedKeyword};
pub use router::{Decision, IntentRouter, RouterConfig, RoutingDecision, ScoreMethod};
pub use scorer::{keyword_score, KeywordMatch, KeywordScore};
pub use semantic::SemanticScorer;
