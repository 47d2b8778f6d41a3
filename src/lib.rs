//! # rmalloc - A First-Fit Heap Allocator Library
//!
//! This crate provides a simple **first-fit heap allocator** implementation
//! in Rust that manages a single memory region obtained with the `mmap`
//! system call.
//!
//! ## Overview
//!
//! The allocator reserves one large mapping up front and carves it into
//! self-describing blocks:
//!
//! ```text
//!   First-Fit Heap Concept:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                     MAPPED REGION (one mmap call)                    │
//!   │                                                                      │
//!   │   ┌────┬───────┬────┬───────┬────┬──────────────────────────────┐    │
//!   │   │ H1 │ BUSY  │ H2 │ FREE  │ H3 │            FREE              │    │
//!   │   └────┴───────┴────┴───────┴────┴──────────────────────────────┘    │
//!   │     │             │             │                                    │
//!   │     └─────────────┴─────────────┴── headers chain the blocks in      │
//!   │                                     address order                    │
//!   │                                                                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   Allocation walks the chain and takes the FIRST free block that fits.
//!   Oversized blocks are split; released blocks merge with free neighbors.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rmalloc
//!   ├── align      - Alignment macros (align!, align_to!)
//!   ├── arena      - The mapped region, addressed by byte offset (internal)
//!   ├── block      - Block header structure (internal)
//!   └── heap       - Heap handle and allocator operations
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rmalloc::{Heap, print_heap};
//!
//! fn main() -> Result<(), rmalloc::HeapError> {
//!     let mut heap = Heap::init(0x10000)?;
//!
//!     // Allocate memory for an i32.
//!     let ptr = heap.allocate(size_of::<i32>()).expect("out of memory");
//!     let ptr = ptr.cast::<i32>();
//!
//!     unsafe {
//!         // Use the memory.
//!         ptr.as_ptr().write(42);
//!         println!("Value: {}", ptr.as_ptr().read());
//!
//!         // Release it again.
//!         heap.free(ptr.cast())?;
//!     }
//!
//!     // Inspect the block chain at any time.
//!     print_heap(&heap);
//!     Ok(())
//! }
//! ```
//!
//! ## How It Works
//!
//! `Heap::init` performs a single anonymous, private `mmap(2)` and formats
//! the whole region as one free block:
//!
//! ```text
//!   After init:
//!   ┌───────────────────────┬────────────────────────────────────────────┐
//!   │    Block Header       │              Free Payload                  │
//!   │  ┌─────────────────┐  │                                            │
//!   │  │ size: N         │  │        N = mapping size - header           │
//!   │  │ free: true      │  │                                            │
//!   │  │ next/prev: none │  │                                            │
//!   │  └─────────────────┘  │                                            │
//!   └───────────────────────┴────────────────────────────────────────────┘
//! ```
//!
//! Each allocation marks a block busy and returns the address right after
//! its header:
//!
//! ```text
//!   After allocate(n), n much smaller than N:
//!   ┌────────┬──────────────┬────────┬───────────────────────────────────┐
//!   │ Header │  User Data   │ Header │           Free Payload            │
//!   │ BUSY n │   n bytes    │ FREE   │                                   │
//!   └────────┴──────────────┴────────┴───────────────────────────────────┘
//!            ▲
//!            └── Pointer returned to user
//! ```
//!
//! Blocks stay physically contiguous: every header records where the next
//! one lives, and the next header always starts exactly where the previous
//! payload ends. `free` gives a block back and immediately merges it with
//! any free neighbor, so fragmentation from splitting heals itself.
//!
//! ## Features
//!
//! - **Simple implementation**: Easy to understand and modify
//! - **Direct OS interaction**: One `mmap` up front, no other platform calls
//! - **First-fit with splitting**: Oversized blocks are right-sized
//! - **Coalescing on free**: Adjacent free blocks never persist
//! - **Validated release**: Freeing an unknown pointer is an error, not UB
//!
//! ## Limitations
//!
//! - **Single-threaded only**: No synchronization primitives; wrap the heap
//!   in a mutex to share it
//! - **Fixed capacity**: The heap never grows; allocation past it fails
//! - **Word alignment only**: Payloads are aligned to the machine word, not
//!   to arbitrary layouts
//! - **Unix-only**: Requires `libc` and `mmap` (POSIX systems)
//!
//! ## Safety
//!
//! The allocator hands out raw payload pointers. Reading and writing them,
//! and releasing them with [`Heap::free`], requires `unsafe` blocks: the
//! caller is responsible for not touching a payload after freeing it.

pub mod align;
mod arena;
mod block;
mod heap;

pub use block::{HEADER_SIZE, MIN_BLOCK_SIZE};
pub use heap::{BlockInfo, Blocks, Heap, HeapError, print_heap};
