//! The store engine: favorites, winner selection, debounced evolution,
//! reset.
//!
//! Every mutation is a read-modify-write of the persisted state under one
//! async mutation lock, so concurrent favorites never lose updates and
//! persistence writes are serialized. Evolution additionally sets an
//! `evolving` flag for its whole duration (generator call included): a
//! second evolve fails fast with [`StoreError::EvolutionInProgress`], while
//! favorites queue on the mutation lock and apply after the commit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::config::{EligibilityMode, StoreConfig};
use crate::error::StoreError;
use crate::generator::Generator;
use crate::models::{EvolutionOutcome, FavoriteReceipt, Product, StoreState, StoreView};
use crate::seeds::seed_state;
use crate::storage::{StateStore, StorageError};

pub struct StoreEngine {
    store: Arc<dyn StateStore>,
    generator: Generator,
    config: StoreConfig,
    generator_timeout: Duration,
    mutation: Mutex<()>,
    evolving: AtomicBool,
}

impl StoreEngine {
    pub fn new(
        store: Arc<dyn StateStore>,
        generator: Generator,
        config: StoreConfig,
        generator_timeout: Duration,
    ) -> Self {
        Self {
            store,
            generator,
            config,
            generator_timeout,
            mutation: Mutex::new(()),
            evolving: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Current state, seeding storage on first touch.
    pub async fn state(&self) -> Result<StoreState, StoreError> {
        let _guard = self.mutation.lock().await;
        self.load_or_seed()
    }

    /// State snapshot with the active policy echoed, for the transports.
    pub async fn view(&self) -> Result<StoreView, StoreError> {
        let state = self.state().await?;
        Ok(StoreView {
            favorites_to_evolve: self.config.favorites_to_evolve,
            eligibility: self.config.eligibility.as_str().to_string(),
            state,
        })
    }

    /// Record one favorite for `product_id` and persist.
    ///
    /// Each call counts as a distinct favorite; there is no deduplication
    /// by caller identity.
    pub async fn favorite(&self, product_id: &str) -> Result<FavoriteReceipt, StoreError> {
        let _guard = self.mutation.lock().await;
        let mut state = self.load_or_seed()?;

        let product = state
            .product_mut(product_id)
            .ok_or_else(|| StoreError::NotFound(product_id.to_string()))?;
        product.favorite_count += 1;
        let updated = product.clone();

        self.persist(&state)?;

        let ready_to_evolve = select_winner(
            &state,
            self.config.eligibility,
            self.config.favorites_to_evolve,
        )
        .is_some();

        tracing::info!(
            product_id = %updated.id,
            favorites = updated.favorite_count,
            ready_to_evolve,
            "favorited product"
        );

        Ok(FavoriteReceipt {
            product: updated,
            ready_to_evolve,
        })
    }

    /// Evolve a slot into its next version.
    ///
    /// Resolves the target (explicit id or the selected winner), applies
    /// the debounce window unless `force`, calls the generator, and commits
    /// atomically. With `dry_run` the candidate is returned without
    /// touching state or storage.
    pub async fn evolve(
        &self,
        target: Option<&str>,
        dry_run: bool,
        force: bool,
    ) -> Result<EvolutionOutcome, StoreError> {
        let _evolving = EvolveGuard::acquire(&self.evolving)?;
        let _mutation = self.mutation.lock().await;

        let mut state = self.load_or_seed()?;

        // Debounce comes before winner resolution: right after a commit the
        // winner's counter is zeroed, and a retry inside the window should
        // hear "too soon", not "nobody qualifies".
        if !force {
            self.check_debounce(&state)?;
        }

        let current = match target {
            Some(id) => {
                let product = state
                    .product(id)
                    .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
                if !self.is_eligible(&state, product) {
                    return Err(StoreError::NoEligibleWinner);
                }
                product.clone()
            }
            None => select_winner(
                &state,
                self.config.eligibility,
                self.config.favorites_to_evolve,
            )
            .cloned()
            .ok_or(StoreError::NoEligibleWinner)?,
        };

        tracing::info!(
            product_id = %current.id,
            version = current.version,
            backend = self.generator.name(),
            dry_run,
            "evolving product"
        );

        let draft = self
            .generator
            .propose(&current, self.generator_timeout)
            .await
            .map_err(|e| StoreError::GenerationFailed(e.to_string()))?;

        let candidate = current.evolved(&draft);

        if dry_run {
            return Ok(EvolutionOutcome {
                evolved_from: current,
                product: candidate,
                evolution_note: draft.evolution_note,
                generation: state.generation,
                dry_run: true,
            });
        }

        // Commit: replace the slot, bump the generation, stamp the clock.
        // Only the evolved slot's counter resets; the others keep counting.
        let slot = state
            .product_mut(&current.id)
            .ok_or_else(|| StoreError::NotFound(current.id.clone()))?;
        *slot = candidate.clone();
        state.generation += 1;
        state.last_evolved_at = Some(Utc::now());

        self.persist(&state)?;

        tracing::info!(
            product_id = %candidate.id,
            version = candidate.version,
            generation = state.generation,
            "evolution committed"
        );

        Ok(EvolutionOutcome {
            evolved_from: current,
            product: candidate,
            evolution_note: draft.evolution_note,
            generation: state.generation,
            dry_run: false,
        })
    }

    /// Reinitialize the store from the seed catalog.
    pub async fn reset(&self) -> Result<StoreState, StoreError> {
        let _guard = self.mutation.lock().await;
        let state = seed_state();
        self.persist(&state)?;
        tracing::info!("store reset to seed catalog");
        Ok(state)
    }

    fn is_eligible(&self, state: &StoreState, product: &Product) -> bool {
        match self.config.eligibility {
            EligibilityMode::ThresholdCount => {
                state.total_favorites() >= self.config.favorites_to_evolve
            }
            EligibilityMode::PerProduct => {
                product.favorite_count >= self.config.favorites_to_evolve
            }
        }
    }

    fn check_debounce(&self, state: &StoreState) -> Result<(), StoreError> {
        let Some(last) = state.last_evolved_at else {
            return Ok(());
        };
        let elapsed_secs = (Utc::now() - last).num_seconds();
        let window_secs = self.config.debounce.as_secs() as i64;
        if elapsed_secs < window_secs {
            return Err(StoreError::Debounced {
                remaining_secs: window_secs - elapsed_secs,
            });
        }
        Ok(())
    }

    fn load_or_seed(&self) -> Result<StoreState, StoreError> {
        match self.store.get().map_err(storage_unavailable)? {
            Some(state) => Ok(state),
            None => {
                tracing::info!("initializing store from seed catalog");
                let state = seed_state();
                self.persist(&state)?;
                Ok(state)
            }
        }
    }

    fn persist(&self, state: &StoreState) -> Result<(), StoreError> {
        self.store.put(state).map_err(storage_unavailable)
    }
}

fn storage_unavailable(e: StorageError) -> StoreError {
    StoreError::StorageUnavailable(e.to_string())
}

/// Pure winner selection over a state snapshot.
///
/// The winner is the slot with the maximum `favorite_count`; ties break to
/// the earliest slot index. Returns `None` when the eligibility condition
/// for the given mode is not met, or when every count is zero.
pub fn select_winner(
    state: &StoreState,
    eligibility: EligibilityMode,
    threshold: u64,
) -> Option<&Product> {
    match eligibility {
        EligibilityMode::ThresholdCount => {
            if state.total_favorites() < threshold {
                return None;
            }
            leader(state.products.iter())
        }
        EligibilityMode::PerProduct => {
            leader(state.products.iter().filter(|p| p.favorite_count >= threshold))
        }
    }
}

/// Max by favorite count, first occurrence winning ties; never a slot with
/// zero favorites.
fn leader<'a>(products: impl Iterator<Item = &'a Product>) -> Option<&'a Product> {
    let mut best: Option<&Product> = None;
    for product in products {
        if product.favorite_count == 0 {
            continue;
        }
        match best {
            Some(current) if product.favorite_count <= current.favorite_count => {}
            _ => best = Some(product),
        }
    }
    best
}

/// RAII guard for the evolution mutual-exclusion flag.
struct EvolveGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> EvolveGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, StoreError> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map(|_| Self { flag })
            .map_err(|_| StoreError::EvolutionInProgress)
    }
}

impl Drop for EvolveGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
