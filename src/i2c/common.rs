// Licensed under the Apache-2.0 license

//! Common types and constants for the R-Car I2C driver.
//!
//! This module provides shared definitions for bus speeds, device
//! configuration and the message descriptors consumed by the transfer
//! engine.

use fugit::MicrosDurationU32;

use crate::i2c::timing::Generation;

/// Longest payload a variable-length (SMBus block) read may declare.
pub const BLOCK_READ_MAX: u8 = 32;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum I2cSpeed {
    Standard = 100_000,
    Fast = 400_000,
    FastPlus = 1_000_000,
}

impl I2cSpeed {
    #[must_use]
    pub fn hz(self) -> u32 {
        self as u32
    }
}

/// How a transfer is driven to completion.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransferMode {
    /// Interrupt-driven: the caller dozes between controller interrupts.
    Blocking,
    /// The caller spins on the status register. For contexts that must not
    /// sleep (suspend paths, forced recovery). DMA is never used here.
    Polling,
}

/// SCL wire timing constants fed into the divisor calculation.
///
/// Defaults match the values the hardware documentation assumes when the
/// platform does not override them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimingConfig {
    pub scl_rise_ns: u32,
    pub scl_fall_ns: u32,
    pub scl_int_delay_ns: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            scl_rise_ns: 200,
            scl_fall_ns: 35,
            scl_int_delay_ns: 50,
        }
    }
}

pub struct I2cConfig {
    pub generation: Generation,
    pub speed: I2cSpeed,
    pub timing_config: TimingConfig,
    pub multi_master: bool,
    pub host_notify: bool,
    pub timeout: MicrosDurationU32,
}

pub struct I2cConfigBuilder {
    generation: Generation,
    speed: I2cSpeed,
    timing_config: TimingConfig,
    multi_master: bool,
    host_notify: bool,
    timeout: MicrosDurationU32,
}

impl Default for I2cConfigBuilder {
    fn default() -> Self {
        Self::new(Generation::Gen3)
    }
}

impl I2cConfigBuilder {
    #[must_use]
    pub fn new(generation: Generation) -> Self {
        Self {
            generation,
            speed: I2cSpeed::Standard,
            timing_config: TimingConfig::default(),
            multi_master: false,
            host_notify: false,
            timeout: MicrosDurationU32::secs(1),
        }
    }

    #[must_use]
    pub fn speed(mut self, speed: I2cSpeed) -> Self {
        self.speed = speed;
        self
    }

    #[must_use]
    pub fn timing_config(mut self, config: TimingConfig) -> Self {
        self.timing_config = config;
        self
    }

    #[must_use]
    pub fn multi_master(mut self, enabled: bool) -> Self {
        self.multi_master = enabled;
        self
    }

    #[must_use]
    pub fn host_notify(mut self, enabled: bool) -> Self {
        self.host_notify = enabled;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: MicrosDurationU32) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn build(self) -> I2cConfig {
        I2cConfig {
            generation: self.generation,
            speed: self.speed,
            timing_config: self.timing_config,
            multi_master: self.multi_master,
            host_notify: self.host_notify,
            timeout: self.timeout,
        }
    }
}

/// Payload of one message, fixing the transfer direction.
pub enum MessageBuf<'a> {
    Write(&'a [u8]),
    Read(&'a mut [u8]),
}

/// One addressed read or write within a transfer.
///
/// Messages are immutable while the engine processes them; even the
/// variable-length read protocol only adjusts a driver-local length, never
/// the caller's buffer size.
pub struct Message<'a> {
    pub addr: u8,
    /// First received byte declares the remaining payload length
    /// (SMBus block read). Only meaningful for reads.
    pub recv_len: bool,
    /// Buffer may be handed to the block transfer engine.
    pub dma_safe: bool,
    pub buf: MessageBuf<'a>,
}

impl<'a> Message<'a> {
    #[must_use]
    pub fn write(addr: u8, bytes: &'a [u8]) -> Self {
        Self {
            addr,
            recv_len: false,
            dma_safe: false,
            buf: MessageBuf::Write(bytes),
        }
    }

    #[must_use]
    pub fn read(addr: u8, buffer: &'a mut [u8]) -> Self {
        Self {
            addr,
            recv_len: false,
            dma_safe: false,
            buf: MessageBuf::Read(buffer),
        }
    }

    /// Variable-length read: the first received byte is stored at offset 0
    /// and declares how many bytes follow. `buffer` must be able to hold
    /// the length byte plus [`BLOCK_READ_MAX`] data bytes.
    #[must_use]
    pub fn read_block(addr: u8, buffer: &'a mut [u8]) -> Self {
        Self {
            addr,
            recv_len: true,
            dma_safe: false,
            buf: MessageBuf::Read(buffer),
        }
    }

    #[must_use]
    pub fn dma_safe(mut self, safe: bool) -> Self {
        self.dma_safe = safe;
        self
    }

    #[must_use]
    pub fn is_read(&self) -> bool {
        matches!(self.buf, MessageBuf::Read(_))
    }

    /// Size of the caller-supplied buffer.
    #[must_use]
    pub fn capacity(&self) -> usize {
        match &self.buf {
            MessageBuf::Write(b) => b.len(),
            MessageBuf::Read(b) => b.len(),
        }
    }

    pub(crate) fn byte_at(&self, pos: usize) -> Option<u8> {
        match &self.buf {
            MessageBuf::Write(b) => b.get(pos).copied(),
            MessageBuf::Read(_) => None,
        }
    }

    pub(crate) fn store_at(&mut self, pos: usize, value: u8) {
        if let MessageBuf::Read(b) = &mut self.buf {
            if let Some(slot) = b.get_mut(pos) {
                *slot = value;
            }
        }
    }
}
