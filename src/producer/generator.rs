use chrono::NaiveDateTime;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::event::{Category, STORE_COUNT, SalesEvent, round_to_cents};

/// Largest sales amount a generated event can carry.
pub const MAX_SALES: f64 = 100.0;

/// Draws synthetic sales events from a caller-supplied random source.
pub struct EventGenerator<R> {
    rng: R,
}

impl EventGenerator<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> EventGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Category and store are uniform over their sets, sales uniform over
    /// `[0, 100]` and rounded to cents.
    pub fn next_event(&mut self, event_time: NaiveDateTime) -> SalesEvent {
        let category = Category::ALL[self.rng.gen_range(0..Category::ALL.len())];
        let store = self.rng.gen_range(1..=STORE_COUNT);
        let sales = round_to_cents(self.rng.gen_range(0.0..=MAX_SALES));
        SalesEvent {
            category,
            store_id: SalesEvent::store_id(store),
            event_time,
            sales,
        }
    }

    /// A fresh version 4 UUID, drawn from the same random source.
    pub fn partition_key(&mut self) -> String {
        uuid::Builder::from_random_bytes(self.rng.r#gen())
            .into_uuid()
            .hyphenated()
            .to_string()
    }
}
