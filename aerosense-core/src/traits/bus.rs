//! Register bus abstraction
//!
//! ## Error Model
//!
//! - `Ok(n)` - `n` bytes were written into the front of the buffer. `n` may be
//!   less than the buffer length; the caller decides whether that is usable.
//! - `Err(nb::Error::WouldBlock)` - transaction not complete yet, skip the tick
//! - `Err(nb::Error::Other(e))` - the transaction failed (NACK, arbitration)
//!
//! ```rust
//! use aerosense_core::traits::RegisterBus;
//!
//! struct Loopback([u8; 4]);
//!
//! impl RegisterBus for Loopback {
//!     type Error = ();
//!
//!     fn read(&mut self, _address: u8, buf: &mut [u8]) -> nb::Result<usize, ()> {
//!         let n = buf.len().min(self.0.len());
//!         buf[..n].copy_from_slice(&self.0[..n]);
//!         Ok(n)
//!     }
//! }
//! ```

/// Byte-oriented read access to a device at a bus address
pub trait RegisterBus {
    /// Bus-specific failure
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes from the device at `address`
    fn read(&mut self, address: u8, buf: &mut [u8]) -> nb::Result<usize, Self::Error>;

    /// Check that a device answers at `address`
    ///
    /// The default does a zero-length read, which most controllers turn into
    /// an address-only transaction. A transaction still in flight counts as
    /// an answer.
    fn probe(&mut self, address: u8) -> Result<(), Self::Error> {
        match self.read(address, &mut []) {
            Ok(_) | Err(nb::Error::WouldBlock) => Ok(()),
            Err(nb::Error::Other(e)) => Err(e),
        }
    }
}
