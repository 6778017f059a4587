// Licensed under the Apache-2.0 license

//! `embedded-hal` adapter over the native transfer interface.
//!
//! Generic client drivers speak `embedded_hal::i2c::I2c`; this wrapper
//! maps their operation lists onto the message-based transaction engine.

use embedded_hal::i2c::{ErrorType, I2c, Operation, SevenBitAddress};
use heapless::Vec;

use crate::common::{Logger, NoOpLogger};
use crate::i2c::common::{Message, TransferMode};
use crate::i2c::rcar_i2c::Error;
use crate::i2c::traits::{I2cHardwareCore, I2cMaster};

/// Longest operation list one `transaction` call can map onto a single
/// bus transaction.
pub const MAX_OPERATIONS: usize = 8;

/// Adapter binding an [`I2cMaster`] implementation to the
/// `embedded-hal` bus traits. Transfers run in the blocking execution
/// mode; callers needing the spinning mode use the native interface
/// directly.
pub struct I2cController<H, L = NoOpLogger>
where
    H: I2cMaster + I2cHardwareCore<Error = Error>,
    L: Logger,
{
    hardware: H,
    logger: L,
}

impl<H, L> I2cController<H, L>
where
    H: I2cMaster + I2cHardwareCore<Error = Error>,
    L: Logger,
{
    pub fn new(hardware: H, logger: L) -> Self {
        Self { hardware, logger }
    }

    /// Access the underlying controller, e.g. for target registration.
    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    pub fn release(self) -> H {
        self.hardware
    }
}

impl<H, L> ErrorType for I2cController<H, L>
where
    H: I2cMaster + I2cHardwareCore<Error = Error>,
    L: Logger,
{
    type Error = Error;
}

impl<H, L> I2c<SevenBitAddress> for I2cController<H, L>
where
    H: I2cMaster + I2cHardwareCore<Error = Error>,
    L: Logger,
{
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut msgs: Vec<Message<'_>, MAX_OPERATIONS> = Vec::new();
        for op in operations.iter_mut() {
            let msg = match op {
                Operation::Write(bytes) => Message::write(address, bytes),
                Operation::Read(buffer) => Message::read(address, buffer),
            };
            if msgs.push(msg).is_err() {
                self.logger.error(format_args!(
                    "i2c: transaction with more than {MAX_OPERATIONS} operations"
                ));
                return Err(Error::Invalid);
            }
        }
        self.hardware
            .transaction_slice(&mut msgs, TransferMode::Blocking)
            .map(drop)
    }
}
