/// Rounds the given size up to the machine word size.
///
/// Payload sizes recorded in block headers are always word multiples, so
/// every payload a block hands out starts on a word boundary.
///
/// # Examples
///
/// ```rust
/// use rmalloc::align;
///
/// match std::mem::size_of::<usize>() {
///     8 => assert_eq!(align!(13), 16), // 64 bit machine.
///     4 => assert_eq!(align!(11), 12), // 32 bit machine.
///     _ => {},
/// };
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align_to!($value, ::std::mem::size_of::<usize>())
  };
}

/// Rounds the given size up to an arbitrary power-of-two alignment.
///
/// ```rust
/// use rmalloc::align_to;
///
/// assert_eq!(align_to!(13, 16), 16);
/// assert_eq!(align_to!(32, 16), 32);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $alignment:expr) => {
    ($value + $alignment - 1) & !($alignment - 1)
  };
}

#[cfg(test)]
mod tests {
  use std::mem;

  #[test]
  fn test_align() {
    let word = mem::size_of::<usize>();

    let mut alignments = Vec::new();

    for i in 0..10 {
      let sizes = (word * i + 1)..=(word * (i + 1));

      let expected_alignment = word * (i + 1);

      alignments.push((sizes, expected_alignment));
    }

    for (sizes, expected) in alignments {
      for size in sizes {
        assert_eq!(expected, align!(size));
      }
    }
  }

  #[test]
  fn test_align_to() {
    for (value, alignment, expected) in [
      (1, 16, 16),
      (16, 16, 16),
      (17, 16, 32),
      (3, 4, 4),
      (0, 8, 0),
      (255, 64, 256),
    ] {
      assert_eq!(expected, align_to!(value, alignment));
    }
  }

  #[test]
  fn test_align_is_idempotent() {
    for size in 1..=128 {
      assert_eq!(align!(size), align!(align!(size)));
    }
  }
}
