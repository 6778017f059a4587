// Licensed under the Apache-2.0 license

//! Renesas R-Car I2C driver module.
//!
//! This module implements the interrupt-driven bus engine of the R-Car I2C
//! unit for bare-metal and `no_std` environments: clock timing calculation,
//! the master transfer state machine (byte-wise and DMA-assisted), and the
//! target-mode responder sharing the same interrupt line.

pub mod common;
pub mod controller;
pub mod dma;
pub mod rcar_i2c;
pub mod regs;
pub mod timing;
pub mod traits;

pub use common::{
    I2cConfig, I2cConfigBuilder, I2cSpeed, Message, MessageBuf, TimingConfig, TransferMode,
};
pub use controller::I2cController;
pub use rcar_i2c::{Error, RcarI2c};
pub use timing::{Generation, TimingParams, TimingRegs};
pub use traits::{I2cHardwareCore, I2cMaster, I2cTarget, SystemControl, TargetResponse};
