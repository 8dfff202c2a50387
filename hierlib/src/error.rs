use std::io;
use thiserror::Error;

/// Why a single trace line could not be turned into a reference
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The line doesn't split into a kind, an address and an optional length, or the length isn't
    /// a positive decimal number
    #[error("malformed reference")]
    MalformedLine,
    #[error("unknown reference kind {0:?}")]
    UnknownReferenceKind(String),
    #[error("unparsable address {0:?}")]
    UnparsableAddress(String),
}

/// Errors produced while streaming a trace
///
/// Parse failures are recoverable, the offending line is skipped. Failing to read the trace at all
/// is not.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("line {line}: {source}: {raw:?}")]
    Parse {
        line: usize,
        raw: String,
        #[source]
        source: ParseError,
    },
    #[error("couldn't read the trace: {0}")]
    Io(#[from] io::Error),
}

impl TraceError {
    /// Whether replay can carry on past this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TraceError::Parse { .. })
    }
}

/// Fatal errors raised while replaying accesses through a hierarchy
#[derive(Debug, Error)]
pub enum SimError {
    /// A replacement policy was asked to pick a victim out of nothing. Cache levels only evict
    /// from full sets, so this means cache state is already corrupt.
    #[error("internal invariant violated: eviction requested from an empty set")]
    EvictionOnEmptySet,
    #[error("internal invariant violated: replacement policy chose {0:#010x}, which isn't resident in the set")]
    UnknownVictim(u64),
    #[error("couldn't emit memory event: {0}")]
    Sink(#[from] io::Error),
    #[error(transparent)]
    Trace(#[from] TraceError),
}

/// Problems with a cache or hierarchy configuration, reported before any simulation happens
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cache {0:?} has an associativity of zero")]
    ZeroAssociativity(String),
    #[error("cache {name:?} uses {bits} address bits, more than the 64 available")]
    AddressTooWide { name: String, bits: u32 },
    #[error("cache name {0:?} is used more than once")]
    DuplicateName(String),
    #[error("cache {child:?} names unknown parent {parent:?}")]
    UnknownParent { child: String, parent: String },
    #[error("cache {0:?} is part of a parent cycle")]
    Cycle(String),
    #[error("accesses are routed to unknown cache {0:?}")]
    UnknownRoute(String),
    #[error("couldn't parse the configuration: {0}")]
    Json(#[from] serde_json::Error),
}
