//! System-wide constants for Grove record stores.

// =============================================================================
// Identifier Allocator
// =============================================================================

/// Default number of identifiers read or written per free-list batch.
pub const DEFAULT_GRAB_SIZE: usize = 1024;

/// Size of the allocator file header: sticky flag (1) + high id (8).
pub const ID_HEADER_SIZE: usize = 9;

/// Size of one free-list entry in the allocator file.
pub const ID_ENTRY_SIZE: usize = 8;

/// Header sticky byte of a cleanly closed allocator file.
pub const ID_CLEAN: u8 = 0;

/// Header sticky byte while an allocator is open.
pub const ID_STICKY: u8 = 1;

/// Extension appended to a store's data path to name its allocator file.
pub const ID_FILE_EXTENSION: &str = "id";

// =============================================================================
// Record Stores
// =============================================================================

/// In-use flag byte of a live record.
pub const RECORD_IN_USE: u8 = 1;

/// In-use flag byte of a free record.
pub const RECORD_NOT_IN_USE: u8 = 0;

// =============================================================================
// Window Pool
// =============================================================================

/// Default number of windows per store.
pub const DEFAULT_WINDOW_COUNT: usize = 64;

/// Default number of records covered by one window.
pub const DEFAULT_RECORDS_PER_WINDOW: usize = 1024;
