//! Buffer bank: slots × bands of fixed-length circular sample buffers
//!
//! The bank is one contiguous allocation made at startup. Offsets passed to
//! [`BufferBank::get`] / [`BufferBank::set`] are always reduced modulo the
//! buffer length, so any offset the address mapper produces is addressable.
//!
//! A bank is only obtainable through [`BankBuilder::build`], which refuses to
//! hand out a bank with any (slot, band) cell left unpopulated. This is the
//! single startup precondition the engine has.

use thiserror::Error;

use crate::types::Sample;

/// Errors raised while assembling a bank
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BankError {
    #[error("bank dimensions must be non-zero (slots={slots}, bands={bands}, len={len})")]
    EmptyShape { slots: usize, bands: usize, len: usize },

    #[error("cell (slot {slot}, band {band}) is outside a {slots}x{bands} bank")]
    OutOfRange {
        slot: usize,
        band: usize,
        slots: usize,
        bands: usize,
    },

    #[error("cell (slot {slot}, band {band}) expects {expected} samples, got {actual}")]
    LengthMismatch {
        slot: usize,
        band: usize,
        expected: usize,
        actual: usize,
    },

    #[error("cell (slot {slot}, band {band}) was never populated")]
    Unpopulated { slot: usize, band: usize },

    #[error("bank shape {actual:?} does not match configured shape {expected:?}")]
    ShapeMismatch { expected: BankShape, actual: BankShape },
}

/// Bank geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankShape {
    pub slots: usize,
    pub bands: usize,
    /// Samples per (slot, band) buffer
    pub len: usize,
}

impl BankShape {
    pub fn cells(&self) -> usize {
        self.slots * self.bands
    }

    pub fn total_samples(&self) -> usize {
        self.cells() * self.len
    }

    /// Approximate memory footprint in bytes
    pub fn memory_usage(&self) -> usize {
        self.total_samples() * std::mem::size_of::<Sample>()
    }

    fn check(&self) -> Result<(), BankError> {
        if self.slots == 0 || self.bands == 0 || self.len == 0 {
            return Err(BankError::EmptyShape {
                slots: self.slots,
                bands: self.bands,
                len: self.len,
            });
        }
        Ok(())
    }
}

/// The shared sample store
pub struct BufferBank {
    shape: BankShape,
    data: Box<[Sample]>,
}

impl BufferBank {
    /// A bank with every cell set to silence
    ///
    /// Silence is a legitimate "last written value", so this bank is fully
    /// populated. Used for fresh recording sessions and in tests.
    pub fn silent(shape: BankShape) -> Result<Self, BankError> {
        shape.check()?;
        Ok(Self {
            shape,
            data: vec![0.0; shape.total_samples()].into_boxed_slice(),
        })
    }

    #[inline]
    pub fn shape(&self) -> BankShape {
        self.shape
    }

    #[inline]
    pub fn buffer_len(&self) -> usize {
        self.shape.len
    }

    #[inline]
    fn cell_start(&self, slot: usize, band: usize) -> usize {
        debug_assert!(slot < self.shape.slots && band < self.shape.bands);
        (slot * self.shape.bands + band) * self.shape.len
    }

    /// Read one sample; `offset` wraps modulo the buffer length
    #[inline]
    pub fn get(&self, slot: usize, band: usize, offset: usize) -> Sample {
        self.data[self.cell_start(slot, band) + offset % self.shape.len]
    }

    /// Write one sample; `offset` wraps modulo the buffer length
    #[inline]
    pub fn set(&mut self, slot: usize, band: usize, offset: usize, value: Sample) {
        let idx = self.cell_start(slot, band) + offset % self.shape.len;
        self.data[idx] = value;
    }

    /// One (slot, band) buffer
    pub fn band(&self, slot: usize, band: usize) -> &[Sample] {
        let start = self.cell_start(slot, band);
        &self.data[start..start + self.shape.len]
    }

    pub fn band_mut(&mut self, slot: usize, band: usize) -> &mut [Sample] {
        let start = self.cell_start(slot, band);
        let len = self.shape.len;
        &mut self.data[start..start + len]
    }
}

impl std::fmt::Debug for BufferBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferBank").field("shape", &self.shape).finish()
    }
}

/// Assembles a [`BufferBank`] cell by cell and verifies full coverage
pub struct BankBuilder {
    bank: BufferBank,
    populated: Vec<bool>,
}

impl BankBuilder {
    pub fn new(shape: BankShape) -> Result<Self, BankError> {
        let bank = BufferBank::silent(shape)?;
        Ok(Self {
            bank,
            populated: vec![false; shape.cells()],
        })
    }

    pub fn shape(&self) -> BankShape {
        self.bank.shape
    }

    /// Copy one full buffer into (slot, band)
    pub fn fill(&mut self, slot: usize, band: usize, samples: &[Sample]) -> Result<(), BankError> {
        let shape = self.bank.shape;
        if slot >= shape.slots || band >= shape.bands {
            return Err(BankError::OutOfRange {
                slot,
                band,
                slots: shape.slots,
                bands: shape.bands,
            });
        }
        if samples.len() != shape.len {
            return Err(BankError::LengthMismatch {
                slot,
                band,
                expected: shape.len,
                actual: samples.len(),
            });
        }
        self.bank.band_mut(slot, band).copy_from_slice(samples);
        self.populated[slot * shape.bands + band] = true;
        Ok(())
    }

    /// Number of cells filled so far
    pub fn populated_cells(&self) -> usize {
        self.populated.iter().filter(|p| **p).count()
    }

    /// Finish the bank, failing on the first unpopulated cell
    pub fn build(self) -> Result<BufferBank, BankError> {
        let bands = self.bank.shape.bands;
        if let Some(idx) = self.populated.iter().position(|p| !p) {
            return Err(BankError::Unpopulated {
                slot: idx / bands,
                band: idx % bands,
            });
        }
        Ok(self.bank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape() -> BankShape {
        BankShape { slots: 2, bands: 3, len: 8 }
    }

    #[test]
    fn test_offsets_wrap_modulo_len() {
        let mut bank = BufferBank::silent(shape()).unwrap();
        bank.set(1, 2, 9, 0.5);
        assert_eq!(bank.get(1, 2, 1), 0.5);
        assert_eq!(bank.get(1, 2, 17), 0.5);
        assert_eq!(bank.band(1, 2)[1], 0.5);
        // Neighbouring cells untouched
        assert!(bank.band(1, 1).iter().all(|s| *s == 0.0));
        assert!(bank.band(0, 2).iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_empty_shape_rejected() {
        let err = BufferBank::silent(BankShape { slots: 0, bands: 3, len: 8 }).unwrap_err();
        assert!(matches!(err, BankError::EmptyShape { .. }));
    }

    #[test]
    fn test_builder_requires_every_cell() {
        let mut builder = BankBuilder::new(shape()).unwrap();
        let buf = [0.25; 8];
        for slot in 0..2 {
            for band in 0..3 {
                if (slot, band) != (1, 1) {
                    builder.fill(slot, band, &buf).unwrap();
                }
            }
        }
        assert_eq!(builder.populated_cells(), 5);
        assert_eq!(
            builder.build().unwrap_err(),
            BankError::Unpopulated { slot: 1, band: 1 }
        );
    }

    #[test]
    fn test_builder_validates_fill() {
        let mut builder = BankBuilder::new(shape()).unwrap();
        assert!(matches!(
            builder.fill(2, 0, &[0.0; 8]),
            Err(BankError::OutOfRange { slot: 2, .. })
        ));
        assert!(matches!(
            builder.fill(0, 0, &[0.0; 7]),
            Err(BankError::LengthMismatch { expected: 8, actual: 7, .. })
        ));
    }

    #[test]
    fn test_builder_complete_bank() {
        let mut builder = BankBuilder::new(shape()).unwrap();
        for slot in 0..2 {
            for band in 0..3 {
                let value = (slot * 10 + band) as f32;
                builder.fill(slot, band, &[value; 8]).unwrap();
            }
        }
        let bank = builder.build().unwrap();
        assert_eq!(bank.get(1, 2, 0), 12.0);
        assert_eq!(bank.get(0, 1, 7), 1.0);
        assert_eq!(bank.shape().memory_usage(), 2 * 3 * 8 * 4);
    }
}
