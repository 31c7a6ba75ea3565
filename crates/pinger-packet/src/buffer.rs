/// A packet buffer, borrowed immutably or mutably.
///
/// Parsing wraps a received datagram without copying it, building wraps a
/// scratch buffer that the packet types write into.
#[derive(Debug)]
pub enum Buffer<'a> {
    Immutable(&'a [u8]),
    Mutable(&'a mut [u8]),
}

impl Buffer<'_> {
    /// The full buffer as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Self::Immutable(buf) => buf,
            Self::Mutable(buf) => buf,
        }
    }

    /// The full buffer as a mutable slice.
    ///
    /// # Panics
    ///
    /// Panics if the underlying buffer is immutable.
    pub fn as_slice_mut(&mut self) -> &mut [u8] {
        match self {
            Self::Immutable(_) => panic!("attempt to mutate an immutable buffer"),
            Self::Mutable(buf) => buf,
        }
    }

    /// Read the byte at `offset`.
    #[must_use]
    pub fn read(&self, offset: usize) -> u8 {
        self.as_slice()[offset]
    }

    /// Read `N` bytes starting at `offset`.
    #[must_use]
    pub fn get_bytes<const N: usize>(&self, offset: usize) -> [u8; N] {
        let mut bytes = [0_u8; N];
        bytes.copy_from_slice(&self.as_slice()[offset..offset + N]);
        bytes
    }

    /// A mutable reference to the byte at `offset`.
    pub fn write(&mut self, offset: usize) -> &mut u8 {
        &mut self.as_slice_mut()[offset]
    }

    /// Write `N` bytes starting at `offset`.
    pub fn set_bytes<const N: usize>(&mut self, offset: usize, bytes: [u8; N]) {
        self.as_slice_mut()[offset..offset + N].copy_from_slice(&bytes);
    }
}
