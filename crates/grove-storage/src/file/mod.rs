//! Synchronous positional file I/O for Grove stores.
//!
//! Every on-disk structure in this crate (allocator files, record store
//! data files) goes through the [`FileHandle`] trait. Operations are
//! position-based (pread/pwrite style), so callers never share a cursor.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐
//! │ IdAllocator  │  │  WindowPool  │  │ FixedRecordStore │
//! └──────┬───────┘  └──────┬───────┘  └────────┬─────────┘
//!        └─────────────────┼───────────────────┘
//!                          ▼
//!              FileHandle (read_at, write_at,
//!                          sync, set_len)
//!                          │
//!                          ▼
//!              StandardFile (std::fs + Mutex)
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use grove_storage::file::{FileHandle, OpenMode, StandardFile};
//!
//! fn example() -> grove_storage::file::IoResult<()> {
//!     let file = StandardFile::open("data.db", OpenMode::CreateNew)?;
//!
//!     // third 9-byte record slot
//!     file.write_all_at(&[1, 0, 0, 0, 7, 0, 0, 0, 0], 18)?;
//!     file.sync()?;
//!     Ok(())
//! }
//! ```

mod error;
mod handle;
mod mode;
mod std_io;

pub use error::{IoError, IoResult};
pub use handle::FileHandle;
pub use mode::OpenMode;
pub use std_io::StandardFile;
