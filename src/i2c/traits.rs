// Licensed under the Apache-2.0 license

//! Trait seams between the transfer engine, the platform, and clients.

use embedded_hal::i2c::SevenBitAddress;

use crate::i2c::common::{I2cSpeed, Message, TimingConfig, TransferMode};
use fugit::MicrosDurationU32;

/// Platform services the driver needs but cannot own: clocking, time and
/// the board-specific recovery hooks.
pub trait SystemControl {
    /// Functional clock rate feeding the I2C unit, in Hz.
    fn clock_rate(&self) -> u32;

    /// Monotonic microsecond timestamp for transfer deadlines.
    fn timestamp_us(&mut self) -> u64;

    /// Doze until the controller raises its interrupt line or `max` passes.
    /// Returns `true` if woken by the interrupt. Spurious wakeups are fine;
    /// the caller re-reads status either way.
    fn wait_irq(&mut self, max: MicrosDurationU32) -> bool;

    /// Pulse the module reset. Returns `false` if the platform has no reset
    /// line for this instance.
    fn reset_trigger(&mut self) -> bool {
        false
    }

    /// Whether the module reset is currently asserted.
    fn reset_asserted(&mut self) -> bool {
        false
    }

    /// Board-level bus recovery (clock pulsing via pinctrl or GPIO).
    /// Returns `true` once SDA is released.
    fn recover_bus(&mut self) -> bool {
        false
    }
}

/// Operations common to any I2C hardware this crate drives.
pub trait I2cHardwareCore {
    type Error: embedded_hal::i2c::Error + core::fmt::Debug;

    /// Recompute and latch divisor settings for a new bus speed. Returns
    /// the achieved SCL rate in Hz.
    fn configure_timing(
        &mut self,
        speed: I2cSpeed,
        timing: &TimingConfig,
    ) -> Result<u32, Self::Error>;

    /// Service a pending controller interrupt. Safe to call spuriously.
    fn handle_interrupt(&mut self);
}

/// Master-mode transfer interface.
pub trait I2cMaster<A = SevenBitAddress>: I2cHardwareCore {
    fn write(&mut self, addr: A, bytes: &[u8], mode: TransferMode) -> Result<(), Self::Error>;

    fn read(&mut self, addr: A, buffer: &mut [u8], mode: TransferMode) -> Result<(), Self::Error>;

    fn write_read(
        &mut self,
        addr: A,
        bytes: &[u8],
        buffer: &mut [u8],
        mode: TransferMode,
    ) -> Result<(), Self::Error>;

    /// Run a prepared message sequence as one bus transaction (repeated
    /// start between messages, stop after the last). Returns the number of
    /// messages fully completed.
    fn transaction_slice(
        &mut self,
        msgs: &mut [Message<'_>],
        mode: TransferMode,
    ) -> Result<usize, Self::Error>;
}

/// Reply to a byte pushed at a registered target.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TargetResponse {
    Ack,
    Nack,
}

/// Client backing the controller's target (slave) mode.
///
/// Callbacks run from interrupt dispatch; keep them short. Due to the
/// controller's one-byte transmit buffer, a `Nack` returned from
/// [`on_write_received`](I2cTarget::on_write_received) takes effect one
/// byte late on the wire.
pub trait I2cTarget {
    /// Remote master addressed us for read; produce the first byte.
    fn on_read_requested(&mut self) -> u8;

    /// Remote master addressed us for write. `Nack` rejects the transfer.
    fn on_write_requested(&mut self) -> TargetResponse;

    /// A data byte arrived. `Nack` asks the hardware to refuse further
    /// bytes.
    fn on_write_received(&mut self, value: u8) -> TargetResponse;

    /// Previous byte went out; produce the next one.
    fn on_read_processed(&mut self) -> u8;

    /// Stop condition seen while we were addressed.
    fn on_stop(&mut self);
}
