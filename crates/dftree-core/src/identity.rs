use std::ops::RangeInclusive;

use sha2::{Digest, Sha256};

const SALT_RANGE: RangeInclusive<u32> = 100..=200;
const ID_OFFSET: usize = 12;
pub const ID_LEN: usize = 20;

/// Mints the top-level key of a build stage in stage-qualified output.
pub trait StageIdentity {
    fn identify(&mut self, stage: &str) -> String;
}

/// Fake container-id style identifiers: hex digits derived from the stage
/// value and a random salt. Not stable across runs.
#[derive(Debug, Default)]
pub struct RandomStageIdentity {
    minted: u64,
}

impl RandomStageIdentity {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StageIdentity for RandomStageIdentity {
    fn identify(&mut self, stage: &str) -> String {
        let salt = rand::random_range(SALT_RANGE);
        self.minted += 1;

        let mut hasher = Sha256::new();
        hasher.update(stage.as_bytes());
        hasher.update(salt.to_string().as_bytes());
        hasher.update(self.minted.to_le_bytes());
        let digest = hex::encode(hasher.finalize());
        digest[ID_OFFSET..ID_OFFSET + ID_LEN].to_string()
    }
}
