//! Domain models for the evolving store.
//!
//! # Core Concepts
//!
//! - [`Product`]: the occupant of one store slot. Slots are fixed at seed
//!   time; evolution replaces a slot's copy and bumps its version but never
//!   changes its id.
//! - [`StoreState`]: the persisted aggregate, all slots plus the
//!   generation counter and last-evolution timestamp.
//! - [`EvolutionDraft`]: what the generator proposes for a slot's next
//!   version, validated before it is applied.
//!
//! Operation responses ([`StoreView`], [`FavoriteReceipt`],
//! [`EvolutionOutcome`]) are shared by the HTTP and MCP transports.

mod product;
mod state;

pub use product::*;
pub use state::*;
