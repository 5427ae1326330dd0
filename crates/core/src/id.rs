//! Identifiers for records, fragments and client subscriptions.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// Identifier of a record in the normalized store.
pub type DataId = String;

const BASE62_ALPHABET: &[u8; 62] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Renders `n` in base 62 (`0-9a-zA-Z`), most significant digit first.
pub fn base62(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE62_ALPHABET[(n % 62) as usize]);
        n /= 62;
    }
    digits.reverse();
    digits.into_iter().map(char::from).collect()
}

/// Correlation token round-tripped through every subscription payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientSubscriptionId(String);

impl ClientSubscriptionId {
    /// Wraps an already rendered id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Renders a counter value as an id.
    pub fn from_counter(n: u64) -> Self {
        Self(base62(n))
    }

    /// Returns the textual id.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientSubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Process-wide client subscription counter. Starts at zero with the
/// process and is never reset.
static NEXT_CLIENT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(0);

/// Gets the next process-wide client subscription id.
pub fn next_client_subscription_id() -> ClientSubscriptionId {
    ClientSubscriptionId::from_counter(NEXT_CLIENT_SUBSCRIPTION_ID.fetch_add(1, Ordering::SeqCst))
}

/// A source of client subscription ids.
pub trait IdSource {
    /// Returns a fresh id; ids from one source never repeat.
    fn next_id(&self) -> ClientSubscriptionId;
}

/// Hands out ids from the process-wide counter.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlobalIdSource;

impl IdSource for GlobalIdSource {
    fn next_id(&self) -> ClientSubscriptionId {
        next_client_subscription_id()
    }
}

/// A private counter, for deterministic ids in tests and tools.
#[derive(Debug, Default)]
pub struct SequentialIdSource {
    next: AtomicU64,
}

impl SequentialIdSource {
    /// Creates a source whose first id renders `start`.
    pub fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }
}

impl IdSource for SequentialIdSource {
    fn next_id(&self) -> ClientSubscriptionId {
        ClientSubscriptionId::from_counter(self.next.fetch_add(1, Ordering::SeqCst))
    }
}

/// Identity of one fragment invocation.
///
/// Two fragments built from the same selections still get distinct ids;
/// clones of a built fragment share its id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentId(String);

static NEXT_FRAGMENT_ID: AtomicU64 = AtomicU64::new(0);

impl FragmentId {
    /// Allocates a fresh id for a fragment named `name`.
    pub fn allocate(name: &str) -> Self {
        let n = NEXT_FRAGMENT_ID.fetch_add(1, Ordering::SeqCst);
        Self(format!("_{}{}", name, base62(n)))
    }

    /// Id of the fragment that `owner` declares under `name`. Stable across
    /// rebuilds of the declaration, and never equal to an allocated id.
    pub fn declared(owner: &str, name: &str) -> Self {
        Self(format!("_{}.{}", owner, name))
    }

    /// Returns the textual id, used as a key inside fragment pointers.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
