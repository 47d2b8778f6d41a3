use std::mem;

use rmalloc::{Heap, HeapError, print_heap};

fn main() -> Result<(), HeapError> {
  // Reserve a 64 KiB heap. Everything below is served from this single
  // mapping; the process never asks the OS for memory again.
  let mut heap = Heap::init(0x10000)?;

  println!("[0] Initialized a {:#X} byte heap", heap.size());
  print_heap(&heap);
  println!();

  unsafe {
    // --------------------------------------------------------------------
    // 1) Allocate two ints. The single free block is split each time, so
    //    the walk shows two BUSY blocks followed by the FREE remainder.
    // --------------------------------------------------------------------
    let some_int = heap
      .allocate(mem::size_of::<i32>())
      .expect("out of memory")
      .cast::<i32>();
    let another_int = heap
      .allocate(mem::size_of::<i32>())
      .expect("out of memory")
      .cast::<i32>();

    some_int.as_ptr().write(3);
    another_int.as_ptr().write(7);

    println!("[1] Allocated two ints");
    print_heap(&heap);
    println!();

    println!(
      "[1] Values read back: {}, {}\n",
      some_int.as_ptr().read(),
      another_int.as_ptr().read()
    );

    // --------------------------------------------------------------------
    // 2) Release the first int. Its neighbors are busy, so it simply
    //    becomes a small FREE block waiting for reuse.
    // --------------------------------------------------------------------
    heap.free(some_int.cast())?;

    println!("[2] Freed the first int");
    print_heap(&heap);
    println!();

    // --------------------------------------------------------------------
    // 3) Allocate again at the same size. First fit lands on the block we
    //    just released, so the address comes back.
    // --------------------------------------------------------------------
    let recycled = heap
      .allocate(mem::size_of::<i32>())
      .expect("out of memory")
      .cast::<i32>();

    println!(
      "[3] Reallocated: {}\n",
      if recycled == some_int {
        "the freed block was reused"
      } else {
        "a different block was picked"
      }
    );

    // --------------------------------------------------------------------
    // 4) Release everything. Coalescing merges each block with its free
    //    neighbors, so the heap collapses back into one FREE block.
    // --------------------------------------------------------------------
    heap.free(recycled.cast())?;
    heap.free(another_int.cast())?;

    println!("[4] Freed everything, heap is whole again");
    print_heap(&heap);
  }

  Ok(())
}
