//! Buffered SPI burst transfers for the Bridgetek/FTDI EVE family of
//! display controllers (FT81x, BT81x).
//!
//! EVE's coprocessor accepts a stream of 32-bit command words written to
//! `REG_CMDB_WRITE`. Sending them one transaction per word wastes most of
//! the SPI bandwidth on headers and chip select toggling, so this crate
//! collects them into *bursts*: one chip select assertion, one address
//! header, many words.
//!
//! Two burst engines implement [`BurstTransfer`]:
//!
//! - [`BlockingBurst`] transmits each word as soon as it's written, for
//!   targets without DMA.
//! - [`DmaBurst`] collects words in a statically-allocated buffer and hands
//!   the whole burst to a DMA channel, returning immediately. The target's
//!   DMA interrupt handler reports completion through a [`BurstSignal`].
//!
//! The crate contains no hardware-specific code. Each target implements
//! the small capability traits in [`transport`] instead; other crates with
//! the `eveburst` name prefix provide implementations for some common
//! environments.
#![cfg_attr(not(test), no_std)]

pub mod address;
pub mod burst;
pub mod config;
pub mod error;
pub mod host_commands;
pub mod transport;

mod blocking;
mod dma;
mod host;
mod signal;

#[cfg(test)]
pub(crate) mod testing;

pub use address::EveAddress;
pub use blocking::BlockingBurst;
pub use burst::{BurstTransfer, TransferMode};
pub use config::{BurstBuffer, BurstConfig, BURST_BUFFER_LEN, BURST_BUFFER_WORDS};
pub use dma::DmaBurst;
pub use error::BurstError;
pub use host::Host;
pub use host_commands::HostCmd;
pub use signal::{BurstSignal, BurstState, SharedChipSelect};
pub use transport::{ChipSelect, DmaChannel, SpiTransport};
