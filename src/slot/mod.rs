//! Slot Module
//!
//! A slot is a named bucket of records (usually a year/month key such as
//! `2024/01`). It exists on disk in one of two layouts:
//!
//! ```text
//! Directory layout              Flat layout
//! ┌──────────────────┐          ┌──────────────────────────┐
//! │ 2024/01/         │          │ intersect                │
//! │   ├── 1          │          │   record A               │
//! │   ├── 2          │          │                          │
//! │   └── 3          │          │   # comment (dropped)    │
//! └──────────────────┘          │                          │
//!                               │   record B               │
//!                               └──────────────────────────┘
//! ```
//!
//! ## Responsibilities
//! - Allocate monotonic record numbers (directory layout only)
//! - Enumerate records without the caller knowing the layout

mod allocator;
mod reader;

pub use allocator::SlotAllocator;
pub use reader::{split_records, Entries, SlotEntries, SlotEntry};
