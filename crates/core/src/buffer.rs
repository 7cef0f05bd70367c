// SyncSPI - Interrupt-Driven USART SPI Master
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Fixed-capacity byte buffer with a wrap-around cursor.

/// Result of moving a cursor forward by one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// The cursor moved to the next slot.
    Advanced,
    /// The cursor reached the end and was reset to 0. One full cycle is done.
    Wrapped,
}

impl Progress {
    pub fn is_wrapped(self) -> bool {
        matches!(self, Progress::Wrapped)
    }
}

/// An ordered sequence of `N` bytes plus the index of the next slot to use.
///
/// The cursor is always in `0..N` between calls. It only reaches `N` inside
/// [`TransferBuffer::advance`], which resets it before returning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferBuffer<const N: usize> {
    data: [u8; N],
    cursor: usize,
}

impl<const N: usize> TransferBuffer<N> {
    const NON_EMPTY: () = assert!(N > 0, "a transfer buffer needs at least one slot");

    pub const fn new(data: [u8; N]) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_EMPTY;
        Self { data, cursor: 0 }
    }

    pub const fn zeroed() -> Self {
        Self::new([0; N])
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Byte at the cursor.
    #[inline]
    pub fn current(&self) -> u8 {
        self.data[self.cursor]
    }

    /// Overwrite the byte at the cursor.
    #[inline]
    pub fn store(&mut self, byte: u8) {
        self.data[self.cursor] = byte;
    }

    /// Step the cursor forward, wrapping to 0 when it hits the capacity.
    #[inline]
    pub fn advance(&mut self) -> Progress {
        self.cursor += 1;
        if self.cursor == N {
            self.cursor = 0;
            Progress::Wrapped
        } else {
            Progress::Advanced
        }
    }

    /// Move the cursor back to the first slot without touching the data.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_array(&self) -> &[u8; N] {
        &self.data
    }
}
