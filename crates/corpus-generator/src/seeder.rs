//! Deterministic per-item random streams.
//!
//! Workers never share a generator. Each item gets its own `StdRng` derived
//! from the global seed, the item index and a stream tag, which turns the
//! "shared RNG under concurrency" problem into a pure function.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// 2^64 / golden ratio, used to spread consecutive indices apart.
const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// Independent random streams for one item.
///
/// Keeping them separate means, for example, that turning on target-size
/// padding does not change any content byte or manifest field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    /// Payload bytes
    Content,
    /// Folder draw for the gaussian and exponential distributions
    Folder,
    /// Synthetic manifest fields (custodian, dates, ...)
    Fields,
    /// Target-size padding bytes
    Padding,
    /// Per-line choices made by the chaos engine
    Chaos,
    /// File type draw for mixed corpora
    FileType,
}

impl Stream {
    fn tag(self) -> u64 {
        match self {
            Stream::Content => 0x636f_6e74_656e_7401,
            Stream::Folder => 0x666f_6c64_6572_0002,
            Stream::Fields => 0x6669_656c_6473_0003,
            Stream::Padding => 0x7061_6464_696e_6704,
            Stream::Chaos => 0x6368_616f_7300_0005,
            Stream::FileType => 0x6674_7970_6500_0006,
        }
    }
}

/// SplitMix64 finalizer.
pub fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed picked by the process when the caller did not supply one.
///
/// Derived from the wall clock, so it must be logged and recorded for the run
/// to be replayable.
pub fn process_seed() -> u64 {
    let now = chrono::Utc::now();
    let nanos = now
        .timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros().wrapping_mul(1000));
    splitmix64(nanos as u64 ^ std::process::id() as u64)
}

/// Derives independent generators from `(seed, index, stream)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemSeeder {
    seed: u64,
}

impl ItemSeeder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Seed for one item's stream. Depends on nothing but the arguments.
    pub fn item_seed(&self, stream: Stream, index: u64) -> u64 {
        let base = splitmix64(self.seed ^ stream.tag());
        splitmix64(base.wrapping_add(index.wrapping_mul(GOLDEN_GAMMA)))
    }

    /// Fresh generator for one item's stream.
    pub fn rng_for(&self, stream: Stream, index: u64) -> StdRng {
        StdRng::seed_from_u64(self.item_seed(stream, index))
    }
}
