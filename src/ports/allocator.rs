// ABOUTME: Write-through node port sequence for newly created services.
// ABOUTME: Wraps to lower+1 after the upper bound; a handed-out port is never reused.

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{CounterStore, PortError, StoreError};

/// Window of externally reachable ports: `lower` is exclusive, `upper` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodePortRange {
    lower: u16,
    upper: u16,
}

impl NodePortRange {
    pub const DEFAULT_LOWER: u16 = 30000;
    pub const DEFAULT_UPPER: u16 = 32767;

    pub fn new(lower: u16, upper: u16) -> Result<Self, PortError> {
        if lower >= upper {
            return Err(PortError::InvalidRange { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    pub fn lower(&self) -> u16 {
        self.lower
    }

    pub fn upper(&self) -> u16 {
        self.upper
    }

    /// First port of the cycle.
    pub fn first(&self) -> u16 {
        self.lower + 1
    }

    pub fn contains(&self, port: u16) -> bool {
        port > self.lower && port <= self.upper
    }

    /// Number of distinct ports handed out before the sequence wraps.
    pub fn len(&self) -> usize {
        usize::from(self.upper - self.lower)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn advance(&self, current: u16) -> u16 {
        if current < self.upper {
            current + 1
        } else {
            self.first()
        }
    }
}

impl Default for NodePortRange {
    fn default() -> Self {
        Self {
            lower: Self::DEFAULT_LOWER,
            upper: Self::DEFAULT_UPPER,
        }
    }
}

/// Owns the persisted counter. Allocation is serialized by an internal mutex,
/// but nothing guards against a second process sharing the same store.
pub struct NodePortAllocator<S> {
    range: NodePortRange,
    store: S,
    next: Mutex<u16>,
}

impl<S: CounterStore> NodePortAllocator<S> {
    /// Read the persisted counter once. Absent, malformed or out-of-range
    /// values start the sequence at `lower + 1`.
    pub fn initialize(range: NodePortRange, store: S) -> Result<Self, PortError> {
        let next = match store.read_counter() {
            Ok(Some(port)) if range.contains(port) => port,
            Ok(Some(port)) => {
                warn!(
                    port,
                    lower = range.lower(),
                    upper = range.upper(),
                    "persisted node port outside range, restarting sequence"
                );
                range.first()
            }
            Ok(None) => range.first(),
            Err(StoreError::Malformed(raw)) => {
                warn!(value = %raw, "persisted node port is malformed, restarting sequence");
                range.first()
            }
            Err(e) => return Err(e.into()),
        };

        debug!(node_port = next, "node port allocator initialized");

        Ok(Self {
            range,
            store,
            next: Mutex::new(next),
        })
    }

    /// Hand out the current port and persist its successor before returning.
    /// If the write fails nothing is handed out and the counter stays put.
    pub fn allocate(&self) -> Result<u16, PortError> {
        let mut next = self.next.lock();
        let port = *next;
        let advanced = self.range.advance(port);
        self.store.write_counter(advanced)?;
        *next = advanced;
        debug!(node_port = port, next = advanced, "allocated node port");
        Ok(port)
    }

    /// The port the next `allocate` would return.
    pub fn peek(&self) -> u16 {
        *self.next.lock()
    }

    pub fn range(&self) -> NodePortRange {
        self.range
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> std::fmt::Debug for NodePortAllocator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodePortAllocator")
            .field("range", &self.range)
            .field("next", &*self.next.lock())
            .finish()
    }
}
