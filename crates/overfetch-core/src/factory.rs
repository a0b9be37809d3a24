//! Random record generation for seeding.

use rand::{distributions::Alphanumeric, rngs::StdRng, Rng, SeedableRng};

use crate::{RecordId, TableWidth, WideRecord};

const EMAIL_LOCAL_LEN: usize = 12;
const EMAIL_DOMAINS: [&str; 4] = ["example.com", "example.net", "example.org", "mail.test"];
const FILLER_LEN: usize = 32;

/// Generates wide records filled with random payloads.
#[derive(Debug)]
pub struct RecordFactory<R: Rng = StdRng> {
    rng: R,
}

impl RecordFactory<StdRng> {
    /// A factory seeded from operating-system entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// A reproducible factory.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RecordFactory<R> {
    /// Wraps an existing random number generator.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// A random record with a random identity.
    pub fn create(&mut self, width: TableWidth) -> WideRecord {
        let id = RecordId::from_random_bytes(self.rng.gen());
        self.create_with_id(width, id)
    }

    /// A random record carrying the supplied identity.
    pub fn create_with_id(&mut self, width: TableWidth, id: RecordId) -> WideRecord {
        let email = self.email();
        let fields = (0..width.filler_count()).map(|_| self.filler()).collect();
        WideRecord {
            width,
            id,
            email,
            fields,
        }
    }

    /// `count` random records with distinct random identities.
    pub fn create_many(&mut self, width: TableWidth, count: usize) -> Vec<WideRecord> {
        (0..count).map(|_| self.create(width)).collect()
    }

    fn alphanumeric(&mut self, len: usize) -> String {
        (&mut self.rng)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }

    fn email(&mut self) -> String {
        let local = self.alphanumeric(EMAIL_LOCAL_LEN).to_ascii_lowercase();
        let domain = EMAIL_DOMAINS[self.rng.gen_range(0..EMAIL_DOMAINS.len())];
        format!("{local}@{domain}")
    }

    fn filler(&mut self) -> String {
        self.alphanumeric(FILLER_LEN)
    }
}
