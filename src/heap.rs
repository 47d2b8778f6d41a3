use std::{error, fmt, io, ptr::NonNull};

use log::debug;

use crate::arena::Arena;
use crate::block::{Block, HEADER_SIZE, MIN_BLOCK_SIZE};
use crate::align;

/// Failures the allocator reports through `Result`.
///
/// Running out of free blocks is not one of them: [`Heap::allocate`]
/// signals exhaustion with `None`, since the caller can recover by
/// releasing memory and retrying.
#[derive(Debug)]
pub enum HeapError {
  /// The initial memory reservation could not be satisfied. Fatal: there
  /// is no heap to fall back to.
  Mapping(io::Error),
  /// A released pointer failed validation: it does not name a live
  /// allocation of this heap (foreign pointer, interior pointer, or
  /// double free). The heap is left untouched.
  CorruptedHeap,
}

impl fmt::Display for HeapError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      Self::Mapping(err) => write!(f, "memory mapping failed: {err}"),
      Self::CorruptedHeap => {
        write!(f, "pointer does not belong to a live allocation")
      }
    }
  }
}

impl error::Error for HeapError {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match self {
      Self::Mapping(err) => Some(err),
      Self::CorruptedHeap => None,
    }
  }
}

/// A first-fit heap carved out of one memory mapping.
///
/// The region is formatted as a chain of self-describing blocks, address
/// ordered and contiguous: every block's successor starts exactly
/// `HEADER_SIZE + size` bytes after it. Allocation walks the chain for the
/// first free block that fits, splitting off the unused tail when it is
/// large enough to stand on its own. Releasing a block merges it with any
/// free neighbor, so adjacent free blocks never persist.
#[derive(Debug)]
pub struct Heap {
  arena: Arena,
  head: usize,
}

impl Heap {
  /// Reserves `size` bytes from the operating system and formats them as
  /// a single free block.
  ///
  /// `size` must be a word multiple with room for at least one block
  /// (`HEADER_SIZE + MIN_BLOCK_SIZE`); both are asserted. Propagates
  /// [`HeapError::Mapping`] when the reservation itself fails; no
  /// half-initialized heap is ever returned.
  pub fn init(size: usize) -> Result<Self, HeapError> {
    assert!(
      size >= HEADER_SIZE + MIN_BLOCK_SIZE,
      "a {size} byte heap cannot hold a single block"
    );
    assert!(
      size % MIN_BLOCK_SIZE == 0,
      "heap size must be a multiple of the word size"
    );

    let mut arena = Arena::map(size)?;
    arena.write_block(0, Block::new(size - HEADER_SIZE, true));

    debug!("mapped a {size:#X} byte heap at {:#X}", arena.address_of(0));

    Ok(Self { arena, head: 0 })
  }

  /// Total bytes reserved from the operating system, headers included.
  pub fn size(&self) -> usize {
    self.arena.size()
  }

  /// Serves `size` bytes from the first free block that fits, or `None`
  /// when no block is large enough (out of memory; the heap never grows).
  ///
  /// The request is rounded up to the machine word size and the rounded
  /// size is what the block records, so returned payloads are always
  /// word aligned. Oversized blocks are split first when the tail left
  /// over would still be a representable block; otherwise the whole block
  /// is handed out and the extra bytes ride along as internal
  /// fragmentation.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Option<NonNull<u8>> {
    let size = align!(size.max(1));

    let Some(offset) = self.find_free_block(size) else {
      debug!("out of memory: no free block of {size:#X} bytes");
      return None;
    };

    if self.arena.block(offset).size >= size + HEADER_SIZE + MIN_BLOCK_SIZE {
      self.split_block(offset, size);
    }

    self.arena.block_mut(offset).free = false;

    debug!("allocated {size:#X} bytes at block {offset:#X}");

    NonNull::new(self.arena.payload(offset))
  }

  /// Releases the allocation that owns `address` and merges it with any
  /// free neighbor.
  ///
  /// The pointer is validated against the block chain before anything is
  /// mutated; an address that does not name a busy block of this heap
  /// fails with [`HeapError::CorruptedHeap`] and the heap stays as it
  /// was.
  ///
  /// # Safety
  ///
  /// `address` must have been returned by [`Heap::allocate`] on this
  /// heap, and the payload must not be read or written after this call.
  pub unsafe fn free(
    &mut self,
    address: NonNull<u8>,
  ) -> Result<(), HeapError> {
    let offset = self.owning_block(address)?;

    self.arena.block_mut(offset).free = true;

    debug!("freed block {offset:#X}");

    self.coalesce(offset);

    if let Some(prev) = self.arena.block(offset).prev() {
      self.coalesce(prev);
    }

    Ok(())
  }

  /// Address-ordered walk over the heap's blocks. Read only; two walks
  /// with no allocation in between report the same sequence.
  pub fn blocks(&self) -> Blocks<'_> {
    Blocks {
      heap: self,
      current: Some(self.head),
    }
  }

  /// First-fit search: the first free block with `size` bytes of payload
  /// wins, regardless of how tightly it fits.
  fn find_free_block(
    &self,
    size: usize,
  ) -> Option<usize> {
    let mut current = Some(self.head);

    while let Some(offset) = current {
      let block = self.arena.block(offset);

      if block.free && block.size >= size {
        return Some(offset);
      }
      current = block.next();
    }

    None
  }

  /// Partitions the free block at `offset` in place: the left part keeps
  /// the offset and shrinks to `left_size`, the rest becomes a new free
  /// block spliced into the chain right after it.
  ///
  /// Caller guarantees the block is free and large enough that the new
  /// block gets at least `MIN_BLOCK_SIZE` bytes of payload.
  fn split_block(
    &mut self,
    offset: usize,
    left_size: usize,
  ) {
    let (size, next) = {
      let block = self.arena.block(offset);
      (block.size, block.next())
    };

    debug_assert!(self.arena.block(offset).free);
    debug_assert!(size >= left_size + HEADER_SIZE + MIN_BLOCK_SIZE);

    let right = offset + HEADER_SIZE + left_size;
    let right_size = size - HEADER_SIZE - left_size;

    let mut new_block = Block::new(right_size, true);
    new_block.set_next(next);
    new_block.set_prev(Some(offset));
    self.arena.write_block(right, new_block);

    let block = self.arena.block_mut(offset);
    block.size = left_size;
    block.set_next(Some(right));

    if let Some(successor) = next {
      self.arena.block_mut(successor).set_prev(Some(right));
    }

    debug!("split block {offset:#X} into {left_size:#X} + {right_size:#X}");
  }

  /// Merges the block at `offset` with its successor when both are free,
  /// reclaiming the dropped header as payload.
  fn coalesce(
    &mut self,
    offset: usize,
  ) {
    let Some(next) = self.arena.block(offset).next() else {
      return;
    };

    if !self.arena.block(offset).free || !self.arena.block(next).free {
      return;
    }

    let (next_size, after) = {
      let block = self.arena.block(next);
      (block.size, block.next())
    };

    let block = self.arena.block_mut(offset);
    block.size += HEADER_SIZE + next_size;
    block.set_next(after);

    if let Some(after) = after {
      self.arena.block_mut(after).set_prev(Some(offset));
    }

    debug!("coalesced block {offset:#X} with block {next:#X}");
  }

  /// Maps a payload address back to its header, walking the chain to
  /// confirm the address names a live allocation.
  fn owning_block(
    &self,
    address: NonNull<u8>,
  ) -> Result<usize, HeapError> {
    let base = self.arena.address_of(self.head);

    let Some(target) = (address.as_ptr() as usize).checked_sub(base + HEADER_SIZE)
    else {
      return Err(HeapError::CorruptedHeap);
    };

    let mut current = Some(self.head);

    while let Some(offset) = current {
      let block = self.arena.block(offset);

      if offset == target {
        // Found, but releasing a free block is a double free.
        return if block.free {
          Err(HeapError::CorruptedHeap)
        } else {
          Ok(offset)
        };
      }
      current = block.next();
    }

    Err(HeapError::CorruptedHeap)
  }
}

/// One entry of the heap walk: the observable state of a single block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
  pub free: bool,
  /// Absolute address of the block's header.
  pub addr: usize,
  /// Payload capacity in bytes, header excluded.
  pub size: usize,
}

impl fmt::Display for BlockInfo {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(
      f,
      "{} start: {:#X}, size: {:#X}",
      if self.free { "FREE" } else { "BUSY" },
      self.addr,
      self.size
    )
  }
}

/// Iterator behind [`Heap::blocks`].
pub struct Blocks<'a> {
  heap: &'a Heap,
  current: Option<usize>,
}

impl Iterator for Blocks<'_> {
  type Item = BlockInfo;

  fn next(&mut self) -> Option<BlockInfo> {
    let offset = self.current?;
    let block = self.heap.arena.block(offset);

    self.current = block.next();

    Some(BlockInfo {
      free: block.free,
      addr: self.heap.arena.address_of(offset),
      size: block.size,
    })
  }
}

/// Prints the state of every block, one per line, in address order:
///
/// ```text
/// FREE start: 0x8000000, size: 0x1000
/// BUSY start: 0x8002000, size: 0x9000
/// ```
pub fn print_heap(heap: &Heap) {
  for block in heap.blocks() {
    println!("{block}");
  }
}
