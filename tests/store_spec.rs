use chrono::Utc;
use evomart::config::EligibilityMode;
use evomart::engine::select_winner;
use evomart::error::StoreError;
use evomart::models::{EvolutionDraft, StoreState};
use evomart::seeds::{seed_products, seed_state};
use evomart::storage::{JsonFileStore, MemoryStore, StateStore};
use speculate2::speculate;

fn state_with_counts(counts: &[u64]) -> StoreState {
    let mut state = seed_state();
    for (product, count) in state.products.iter_mut().zip(counts) {
        product.favorite_count = *count;
    }
    state
}

speculate! {
    describe "seed catalog" {
        it "has six products at version 1 with zero favorites" {
            let products = seed_products();
            assert_eq!(products.len(), 6);
            assert!(products.iter().all(|p| p.version == 1));
            assert!(products.iter().all(|p| p.favorite_count == 0));
        }

        it "contains the expected products" {
            let names: Vec<String> = seed_products().into_iter().map(|p| p.name).collect();
            assert!(names.contains(&"Steam Bowl".to_string()));
            assert!(names.contains(&"The Uncertainty Lamp".to_string()));
            assert!(names.contains(&"Regret Pencil".to_string()));
            assert!(names.contains(&"Motivational Brick".to_string()));
            assert!(names.contains(&"Procrastination Clock".to_string()));
            assert!(names.contains(&"Existential Sponge".to_string()));
        }

        it "uses stable slot ids" {
            let ids: Vec<String> = seed_products().into_iter().map(|p| p.id).collect();
            assert_eq!(ids[0], "prod_001");
            assert_eq!(ids[5], "prod_006");
        }

        it "starts at generation zero with no evolution timestamp" {
            let state = seed_state();
            assert_eq!(state.generation, 0);
            assert!(state.last_evolved_at.is_none());
        }
    }

    describe "store state" {
        it "finds products by id" {
            let state = seed_state();
            assert!(state.product("prod_003").is_some());
            assert!(state.product("prod_999").is_none());
        }

        it "sums favorites across slots" {
            let state = state_with_counts(&[1, 2, 3, 0, 0, 0]);
            assert_eq!(state.total_favorites(), 6);
        }
    }

    describe "select_winner" {
        describe "threshold-count mode" {
            it "returns None while total favorites are below the threshold" {
                let state = state_with_counts(&[2, 2, 0, 0, 0, 0]);
                assert!(select_winner(&state, EligibilityMode::ThresholdCount, 5).is_none());
            }

            it "returns the leader once the total reaches the threshold" {
                let state = state_with_counts(&[2, 3, 0, 0, 0, 0]);
                let winner = select_winner(&state, EligibilityMode::ThresholdCount, 5)
                    .expect("expected a winner");
                assert_eq!(winner.id, "prod_002");
            }

            it "returns None when every count is zero, even at threshold zero" {
                let state = seed_state();
                assert!(select_winner(&state, EligibilityMode::ThresholdCount, 0).is_none());
            }

            it "breaks ties toward the earliest slot" {
                let state = state_with_counts(&[0, 3, 3, 0, 0, 0]);
                let winner = select_winner(&state, EligibilityMode::ThresholdCount, 5)
                    .expect("expected a winner");
                assert_eq!(winner.id, "prod_002");
            }
        }

        describe "per-product mode" {
            it "ignores slots below the individual threshold" {
                let state = state_with_counts(&[4, 1, 0, 0, 0, 0]);
                assert!(select_winner(&state, EligibilityMode::PerProduct, 5).is_none());
            }

            it "picks the qualifying slot with the most favorites" {
                let state = state_with_counts(&[5, 7, 3, 0, 0, 0]);
                let winner = select_winner(&state, EligibilityMode::PerProduct, 5)
                    .expect("expected a winner");
                assert_eq!(winner.id, "prod_002");
            }
        }
    }

    describe "product evolution" {
        it "keeps the id, bumps the version, and zeroes the counter" {
            let mut product = seed_products().remove(0);
            product.favorite_count = 9;

            let draft = EvolutionDraft {
                name: "Steam Bowl Deluxe".to_string(),
                tagline: "Twice the steam.".to_string(),
                description: "The bowl, but steamier.".to_string(),
                ascii_art: "(~~~)".to_string(),
                evolution_note: "Added a second steam.".to_string(),
            };

            let next = product.evolved(&draft);
            assert_eq!(next.id, product.id);
            assert_eq!(next.version, product.version + 1);
            assert_eq!(next.favorite_count, 0);
            assert_eq!(next.name, "Steam Bowl Deluxe");
        }
    }

    describe "persistence round-trip" {
        it "memory store returns an equal state" {
            let store = MemoryStore::new();
            let state = state_with_counts(&[9, 0, 1, 0, 4, 0]);

            store.put(&state).expect("put failed");
            assert_eq!(store.get().expect("get failed"), Some(state));
        }

        it "json file store returns an equal state" {
            let dir = tempfile::tempdir().expect("tempdir failed");
            let store = JsonFileStore::open(dir.path().join("store.json")).expect("open failed");

            let mut state = state_with_counts(&[0, 0, 2, 0, 0, 11]);
            state.generation = 3;
            state.last_evolved_at = Some(Utc::now());

            store.put(&state).expect("put failed");
            assert_eq!(store.get().expect("get failed"), Some(state));
        }

        it "json file store is empty before the first put" {
            let dir = tempfile::tempdir().expect("tempdir failed");
            let store = JsonFileStore::open(dir.path().join("store.json")).expect("open failed");
            assert!(store.get().expect("get failed").is_none());
        }

        it "json file store survives reopening" {
            let dir = tempfile::tempdir().expect("tempdir failed");
            let path = dir.path().join("store.json");
            let state = state_with_counts(&[1, 1, 1, 0, 0, 0]);

            JsonFileStore::open(path.clone())
                .expect("open failed")
                .put(&state)
                .expect("put failed");

            let reopened = JsonFileStore::open(path).expect("reopen failed");
            assert_eq!(reopened.get().expect("get failed"), Some(state));
        }
    }

    describe "error kinds" {
        it "marks generator and storage failures retryable" {
            assert!(StoreError::GenerationFailed("timeout".to_string()).is_retryable());
            assert!(StoreError::StorageUnavailable("disk".to_string()).is_retryable());
        }

        it "marks caller errors and policy rejections non-retryable" {
            assert!(!StoreError::NotFound("prod_999".to_string()).is_retryable());
            assert!(!StoreError::NoEligibleWinner.is_retryable());
            assert!(!StoreError::Debounced { remaining_secs: 3 }.is_retryable());
            assert!(!StoreError::EvolutionInProgress.is_retryable());
        }
    }

    describe "eligibility mode" {
        it "round-trips through its string form" {
            assert_eq!(
                EligibilityMode::from_str("threshold-count"),
                Some(EligibilityMode::ThresholdCount)
            );
            assert_eq!(
                EligibilityMode::from_str("per-product"),
                Some(EligibilityMode::PerProduct)
            );
            assert_eq!(EligibilityMode::ThresholdCount.as_str(), "threshold-count");
            assert!(EligibilityMode::from_str("majority").is_none());
        }
    }
}
