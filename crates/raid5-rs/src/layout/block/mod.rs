//! Block-sized byte buffers with the XOR kernel used for parity.

#[cfg(test)]
mod block_tests;

/// `xor_into` folds `src` into `dst` byte-wise: `dst[k] ^= src[k]`.
///
/// # Arguments
/// * `dst` - The accumulator.
/// * `src` - The bytes to fold in.
///
/// # Panics
/// Panics if the operands differ in length.
pub fn xor_into(dst: &mut [u8], src: &[u8]) {
    assert_eq!(dst.len(), src.len(), "XOR operands must be block-sized");
    for (a, b) in dst.iter_mut().zip(src.iter()) {
        *a ^= *b;
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
/// Block stores one block-sized heap buffer, reused across request loops.
pub struct Block(Box<[u8]>);

impl Block {
    /// `zeroed` returns a zero-initialized block of `len` bytes.
    #[must_use]
    pub fn zeroed(len: usize) -> Self {
        Self(vec![0u8; len].into_boxed_slice())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    /// `as_bytes` returns a shared view of the buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// `as_bytes_mut` returns a mutable view of the buffer.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }

    /// `fill_zero` resets every byte.
    pub fn fill_zero(&mut self) {
        self.0.fill(0);
    }

    /// `copy_from` replaces the contents with `src`.
    ///
    /// # Panics
    /// Panics if `src` length differs from the block length.
    pub fn copy_from(&mut self, src: &[u8]) {
        self.0.copy_from_slice(src);
    }

    /// `xor_in_place` folds `rhs` into this block.
    ///
    /// # Panics
    /// Panics if `rhs` length differs from the block length.
    pub fn xor_in_place(&mut self, rhs: &[u8]) {
        xor_into(&mut self.0, rhs);
    }
}
