use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Product;

/// The full persisted store state: the fixed product slots plus evolution
/// bookkeeping. This is the single source of truth; every mutation is
/// written back through the state store before the operation returns.
///
/// # Invariants
/// - `products` has fixed cardinality after seeding; slots are never added
///   or removed except by reset.
/// - `generation` equals the number of successful evolutions since the last
///   reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreState {
    pub products: Vec<Product>,
    pub generation: u64,
    pub last_evolved_at: Option<DateTime<Utc>>,
}

impl StoreState {
    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn product_mut(&mut self, id: &str) -> Option<&mut Product> {
        self.products.iter_mut().find(|p| p.id == id)
    }

    /// Sum of favorite counts across every slot.
    pub fn total_favorites(&self) -> u64 {
        self.products.iter().map(|p| p.favorite_count).sum()
    }
}

/// State snapshot returned by the transports, with the active eligibility
/// policy echoed so clients can render progress toward the threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreView {
    pub favorites_to_evolve: u64,
    pub eligibility: String,
    #[serde(flatten)]
    pub state: StoreState,
}

/// Result of a favorite operation: the updated product plus whether the
/// store now satisfies the configured eligibility condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteReceipt {
    pub product: Product,
    pub ready_to_evolve: bool,
}

/// Result of an evolve operation.
///
/// For a dry run, `product` is the uncommitted candidate and `generation`
/// is the generation the store was at when the candidate was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionOutcome {
    pub evolved_from: Product,
    pub product: Product,
    pub evolution_note: String,
    pub generation: u64,
    pub dry_run: bool,
}
