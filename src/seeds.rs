//! The seed catalog the store is (re)initialized from.

use crate::models::{Product, StoreState};

/// Build the six seed products, all at version 1 with zero favorites.
///
/// Slot ids are fixed so that reset is idempotent and persisted state from
/// a previous run always lines up with the same slots.
pub fn seed_products() -> Vec<Product> {
    vec![
        Product {
            id: "prod_001".to_string(),
            name: "Steam Bowl".to_string(),
            tagline: "A bowl. With steam.".to_string(),
            description: "A perfectly ordinary ceramic bowl that happens to emit a constant, \
                          gentle steam. Nobody knows why. Nobody asks."
                .to_string(),
            ascii_art: r"
    .-~~~-.
   /       \
  |  ~   ~  |
   \       /
    '-----'
   (  steam )
    ~~~~~~~~
"
            .to_string(),
            version: 1,
            favorite_count: 0,
        },
        Product {
            id: "prod_002".to_string(),
            name: "The Uncertainty Lamp".to_string(),
            tagline: "Is it on? Is it off? Yes.".to_string(),
            description: "A lamp that exists in a superposition of on and off states until you \
                          look directly at it. Then it's definitely one of those. Probably."
                .to_string(),
            ascii_art: r"
       ___
      /   \
     |     |
     |  ?  |
      \   /
       | |
      /   \
     /_____\
"
            .to_string(),
            version: 1,
            favorite_count: 0,
        },
        Product {
            id: "prod_003".to_string(),
            name: "Regret Pencil".to_string(),
            tagline: "Write now, apologize later.".to_string(),
            description: "Every mark this pencil makes automatically includes a tiny apology. \
                          Perfect for passive-aggressive note-leaving."
                .to_string(),
            ascii_art: r"
           __
          /  |
         /   |
        /    |
       /  __ |
      / /   \|
     /_/sorry\
"
            .to_string(),
            version: 1,
            favorite_count: 0,
        },
        Product {
            id: "prod_004".to_string(),
            name: "Motivational Brick".to_string(),
            tagline: "You can do it. Probably.".to_string(),
            description: "A brick that whispers encouragement when you hold it. The \
                          encouragement is vague and sometimes concerning."
                .to_string(),
            ascii_art: r"
    ___________
   /          /|
  /  YOU GOT / |
 /   THIS   /  |
|__________|   |
|          |  /
|  (maybe) | /
|__________|/
"
            .to_string(),
            version: 1,
            favorite_count: 0,
        },
        Product {
            id: "prod_005".to_string(),
            name: "Procrastination Clock".to_string(),
            tagline: "There's always tomorrow.".to_string(),
            description: "A clock that's perpetually 5 minutes behind schedule. Not broken, \
                          just not ready yet. Will sync up eventually. Probably."
                .to_string(),
            ascii_art: r"
      .---.
     /     \
    |  12   |
    | 9  3  |
    |   6   |
     \ ... /
      '---'
    (later)
"
            .to_string(),
            version: 1,
            favorite_count: 0,
        },
        Product {
            id: "prod_006".to_string(),
            name: "Existential Sponge".to_string(),
            tagline: "Absorbs liquids and meaning.".to_string(),
            description: "A sponge that quietly questions its purpose while cleaning. 'Am I \
                          removing dirt, or am I the dirt?' it wonders. Still works great on \
                          dishes."
                .to_string(),
            ascii_art: r"
    .--------.
   /  why?   /|
  /  ~~~~   / |
 |  o _ o  |  |
 | (     ) |  /
 |  ~~~~   | /
 |_________|/
"
            .to_string(),
            version: 1,
            favorite_count: 0,
        },
    ]
}

/// A fresh store state built from the seed catalog.
pub fn seed_state() -> StoreState {
    StoreState {
        products: seed_products(),
        generation: 0,
        last_evolved_at: None,
    }
}
