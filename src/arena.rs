use std::{io, mem, ptr};

use libc::{MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE, c_void};

use crate::block::{Block, HEADER_SIZE};
use crate::heap::HeapError;

/// The mapped region backing a heap.
///
/// Block headers are addressed by byte offset from the base of the region,
/// never by raw pointer chasing; every accessor checks that the offset can
/// hold a header before touching memory. The region is reserved once, with
/// a single anonymous private mapping, and unmapped when the arena drops.
#[derive(Debug)]
pub struct Arena {
  base: *mut u8,
  size: usize,
}

impl Arena {
  /// Reserves `size` bytes of zero-initialized, read/write address space.
  pub fn map(size: usize) -> Result<Self, HeapError> {
    let address = unsafe {
      libc::mmap(
        ptr::null_mut(),
        size,
        PROT_READ | PROT_WRITE,
        MAP_PRIVATE | MAP_ANONYMOUS,
        -1,
        0,
      )
    };

    if address == MAP_FAILED {
      return Err(HeapError::Mapping(io::Error::last_os_error()));
    }

    Ok(Self {
      base: address as *mut u8,
      size,
    })
  }

  pub fn size(&self) -> usize {
    self.size
  }

  /// Absolute address of the header at `offset`.
  pub fn address_of(
    &self,
    offset: usize,
  ) -> usize {
    self.base as usize + offset
  }

  /// Pointer to the payload of the block at `offset`.
  pub fn payload(
    &self,
    offset: usize,
  ) -> *mut u8 {
    self.check(offset);
    unsafe { self.base.add(offset + HEADER_SIZE) }
  }

  pub fn block(
    &self,
    offset: usize,
  ) -> &Block {
    self.check(offset);
    unsafe { &*(self.base.add(offset) as *const Block) }
  }

  pub fn block_mut(
    &mut self,
    offset: usize,
  ) -> &mut Block {
    self.check(offset);
    unsafe { &mut *(self.base.add(offset) as *mut Block) }
  }

  /// Writes a fresh header at `offset`, overwriting whatever bytes were
  /// there.
  pub fn write_block(
    &mut self,
    offset: usize,
    block: Block,
  ) {
    self.check(offset);
    unsafe { ptr::write(self.base.add(offset) as *mut Block, block) };
  }

  fn check(
    &self,
    offset: usize,
  ) {
    assert!(
      offset % mem::align_of::<Block>() == 0,
      "misaligned block offset {offset:#X}"
    );
    assert!(
      offset + HEADER_SIZE <= self.size,
      "block offset {offset:#X} out of bounds for a {:#X} byte arena",
      self.size
    );
  }
}

impl Drop for Arena {
  fn drop(&mut self) {
    unsafe { libc::munmap(self.base as *mut c_void, self.size) };
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_map_is_zero_initialized() {
    let arena = Arena::map(4096).unwrap();

    for offset in 0..arena.size() {
      assert_eq!(unsafe { arena.base.add(offset).read() }, 0);
    }
  }

  #[test]
  fn test_block_round_trip() {
    let mut arena = Arena::map(4096).unwrap();

    arena.write_block(0, Block::new(64, true));
    arena.write_block(HEADER_SIZE + 64, Block::new(32, false));

    assert_eq!(arena.block(0).size, 64);
    assert!(arena.block(0).free);
    assert_eq!(arena.block(HEADER_SIZE + 64).size, 32);
    assert!(!arena.block(HEADER_SIZE + 64).free);

    arena.block_mut(0).free = false;
    assert!(!arena.block(0).free);
  }

  #[test]
  fn test_address_of_tracks_offsets() {
    let arena = Arena::map(4096).unwrap();

    assert_eq!(arena.address_of(64) - arena.address_of(0), 64);
    assert_eq!(arena.payload(0) as usize, arena.address_of(0) + HEADER_SIZE);
  }

  #[test]
  #[should_panic(expected = "out of bounds")]
  fn test_out_of_bounds_offset_panics() {
    let arena = Arena::map(4096).unwrap();

    arena.block(4096);
  }

  #[test]
  #[should_panic(expected = "misaligned")]
  fn test_misaligned_offset_panics() {
    let arena = Arena::map(4096).unwrap();

    arena.block(3);
  }
}
