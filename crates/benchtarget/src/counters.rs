//! Call counters and the reset timer.
//!
//! `CounterBank` keeps one `u64` per [`Category`] plus the instant of the last
//! reset. Counters live in an epoch guarded by a `parking_lot::RwLock`:
//!
//! - `increment()` takes the shared side and bumps an atomic, so concurrent
//!   increments never serialize against each other.
//! - `reset_all()` takes the exclusive side, so every increment that started
//!   before the reset has landed before the counters are zeroed, and every
//!   increment that starts afterwards sees the new epoch. The cleared values
//!   are handed back to the caller.
//! - `snapshot()` also takes the exclusive side and therefore observes one
//!   cut across all counters together with the elapsed time.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Event category counted by the bank.
///
/// The write-attribute-hardware hook has no category of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    AlwaysExecutedHook,
    ReadAttributeHardware,
    ScalarRead,
    ScalarWrite,
    SpectrumRead,
    SpectrumWrite,
    ImageRead,
    ImageWrite,
    CommandCall,
    PipeRead,
    PipeWrite,
}

impl Category {
    /// Number of categories.
    pub const COUNT: usize = 11;

    /// Every category, in counter slot order.
    pub const ALL: [Category; Category::COUNT] = [
        Category::AlwaysExecutedHook,
        Category::ReadAttributeHardware,
        Category::ScalarRead,
        Category::ScalarWrite,
        Category::SpectrumRead,
        Category::SpectrumWrite,
        Category::ImageRead,
        Category::ImageWrite,
        Category::CommandCall,
        Category::PipeRead,
        Category::PipeWrite,
    ];

    /// Slot of this category in the counter array.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Short snake_case name, used as a metrics label.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AlwaysExecutedHook => "always_executed_hook",
            Self::ReadAttributeHardware => "read_attribute_hardware",
            Self::ScalarRead => "scalar_read",
            Self::ScalarWrite => "scalar_write",
            Self::SpectrumRead => "spectrum_read",
            Self::SpectrumWrite => "spectrum_write",
            Self::ImageRead => "image_read",
            Self::ImageWrite => "image_write",
            Self::CommandCall => "command_call",
            Self::PipeRead => "pipe_read",
            Self::PipeWrite => "pipe_write",
        }
    }

    /// Name of the read-only attribute that exposes this counter.
    pub fn attribute_name(&self) -> &'static str {
        match self {
            Self::AlwaysExecutedHook => "AlwaysExecutedHookCount",
            Self::ReadAttributeHardware => "ReadAttributeHardwareCount",
            Self::ScalarRead => "ScalarReadsCount",
            Self::ScalarWrite => "ScalarWritesCount",
            Self::SpectrumRead => "SpectrumReadsCount",
            Self::SpectrumWrite => "SpectrumWritesCount",
            Self::ImageRead => "ImageReadsCount",
            Self::ImageWrite => "ImageWritesCount",
            Self::CommandCall => "CommandCallsCount",
            Self::PipeRead => "PipeReadsCount",
            Self::PipeWrite => "PipeWritesCount",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Accepts either the snake_case name or the attribute name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s || c.attribute_name() == s)
            .ok_or_else(|| format!("Unknown counter category: {}", s))
    }
}

/// Counters belonging to one reset epoch.
#[derive(Debug)]
struct Epoch {
    started: Instant,
    counts: [AtomicU64; Category::COUNT],
}

impl Epoch {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            counts: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }

    /// Caller must hold the exclusive lock for the copy to be a single cut.
    fn snapshot(&self) -> CounterSnapshot {
        let mut counts = [0u64; Category::COUNT];
        for (slot, counter) in counts.iter_mut().zip(self.counts.iter()) {
            *slot = counter.load(Ordering::Relaxed);
        }
        CounterSnapshot {
            counts,
            elapsed: self.started.elapsed(),
        }
    }
}

/// Owner of every call counter and the reset timer.
#[derive(Debug)]
pub struct CounterBank {
    epoch: RwLock<Epoch>,
}

impl CounterBank {
    /// Creates a bank with all counters at zero and the timer started now.
    pub fn new() -> Self {
        Self {
            epoch: RwLock::new(Epoch::new()),
        }
    }

    /// Records one event of the given category.
    pub fn increment(&self, category: Category) {
        self.epoch.read().counts[category.index()].fetch_add(1, Ordering::Relaxed);
    }

    /// Current value of a single counter.
    pub fn get(&self, category: Category) -> u64 {
        self.epoch.read().counts[category.index()].load(Ordering::Relaxed)
    }

    /// Monotonic time since construction or the last reset.
    pub fn elapsed_since_reset(&self) -> Duration {
        self.epoch.read().started.elapsed()
    }

    /// Consistent view of every counter and the elapsed time.
    pub fn snapshot(&self) -> CounterSnapshot {
        self.epoch.write().snapshot()
    }

    /// Zeroes every counter and restarts the timer.
    ///
    /// Returns the values that were cleared, read under the same exclusive
    /// lock, so every increment lands either in the returned snapshot or in
    /// the new epoch.
    pub fn reset_all(&self) -> CounterSnapshot {
        let mut epoch = self.epoch.write();
        let cleared = epoch.snapshot();
        for counter in epoch.counts.iter() {
            counter.store(0, Ordering::Relaxed);
        }
        epoch.started = Instant::now();
        info!("Counters reset after {} calls", cleared.total());
        cleared
    }
}

impl Default for CounterBank {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable copy of the counter bank taken under a single lock.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterSnapshot {
    counts: [u64; Category::COUNT],
    elapsed: Duration,
}

impl CounterSnapshot {
    /// Value of one counter at snapshot time.
    pub fn get(&self, category: Category) -> u64 {
        self.counts[category.index()]
    }

    /// Time between the last reset and the snapshot.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Sum over every category.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Iterates `(category, value)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, u64)> + '_ {
        Category::ALL.iter().map(move |c| (*c, self.get(*c)))
    }
}

impl Serialize for CounterSnapshot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(Category::COUNT + 1))?;
        for (category, value) in self.iter() {
            map.serialize_entry(category.attribute_name(), &value)?;
        }
        map.serialize_entry("TimeSinceReset", &self.elapsed.as_secs_f64())?;
        map.end()
    }
}
