// Licensed under the Apache-2.0 license

//! Register map of the R-Car I2C unit.
//!
//! Offsets and bit positions follow the hardware manual. Access goes
//! through the [`RegisterIo`] trait so the transfer engine can be exercised
//! against a software model of the controller; [`Mmio`] is the production
//! implementation over a memory-mapped instance.

/* register offsets */
pub const ICSCR: usize = 0x00; /* slave ctrl */
pub const ICMCR: usize = 0x04; /* master ctrl */
pub const ICSSR: usize = 0x08; /* slave status */
pub const ICMSR: usize = 0x0C; /* master status */
pub const ICSIER: usize = 0x10; /* slave irq enable */
pub const ICMIER: usize = 0x14; /* master irq enable */
pub const ICCCR: usize = 0x18; /* clock dividers */
pub const ICSAR: usize = 0x1C; /* slave address */
pub const ICMAR: usize = 0x20; /* master address */
pub const ICRXTX: usize = 0x24; /* data port */
pub const ICCCR2: usize = 0x28; /* clock control 2 */
pub const ICMPR: usize = 0x2C; /* SCL mask control */
pub const ICHPR: usize = 0x30; /* SCL HIGH control */
pub const ICLPR: usize = 0x34; /* SCL LOW control */
pub const ICFBSCR: usize = 0x38; /* first bit setup cycle (Gen3) */
pub const ICDMAER: usize = 0x3C; /* DMA enable (Gen3) */

/* ICSCR */
pub const SDBS: u32 = 1 << 3; /* slave data buffer select */
pub const SIE: u32 = 1 << 2; /* slave interface enable */
pub const GCAE: u32 = 1 << 1; /* general call address enable */
pub const FNA: u32 = 1 << 0; /* forced non acknowledgment */

/* ICMCR */
pub const MDBS: u32 = 1 << 7; /* non-fifo mode switch */
pub const FSCL: u32 = 1 << 6; /* override SCL pin */
pub const FSDA: u32 = 1 << 5; /* override SDA pin */
pub const OBPC: u32 = 1 << 4; /* override pins */
pub const MIE: u32 = 1 << 3; /* master if enable */
pub const TSBE: u32 = 1 << 2;
pub const FSB: u32 = 1 << 1; /* force stop bit */
pub const ESG: u32 = 1 << 0; /* enable start bit gen */

/* ICSSR (also for ICSIER) */
pub const GCAR: u32 = 1 << 6; /* general call received */
pub const STM: u32 = 1 << 5; /* slave transmit mode */
pub const SSR: u32 = 1 << 4; /* stop received */
pub const SDE: u32 = 1 << 3; /* slave data empty */
pub const SDT: u32 = 1 << 2; /* slave data transmitted */
pub const SDR: u32 = 1 << 1; /* slave data received */
pub const SAR: u32 = 1 << 0; /* slave addr received */

/* ICMSR (also for ICMIER) */
pub const MNR: u32 = 1 << 6; /* nack received */
pub const MAL: u32 = 1 << 5; /* arbitration lost */
pub const MST: u32 = 1 << 4; /* sent a stop */
pub const MDE: u32 = 1 << 3;
pub const MDT: u32 = 1 << 2;
pub const MDR: u32 = 1 << 1;
pub const MAT: u32 = 1 << 0; /* slave addr xfer done */

/* ICDMAER */
pub const RSDMAE: u32 = 1 << 3; /* DMA slave received enable */
pub const TSDMAE: u32 = 1 << 2; /* DMA slave transmitted enable */
pub const RMDMAE: u32 = 1 << 1; /* DMA master received enable */
pub const TMDMAE: u32 = 1 << 0; /* DMA master transmitted enable */

/* ICCCR2 */
pub const FMPE: u32 = 1 << 7; /* fast mode plus enable */
pub const CDFD: u32 = 1 << 2; /* CDF disable */
pub const HLSE: u32 = 1 << 1; /* HIGH/LOW separate control enable */
pub const SME: u32 = 1 << 0; /* SCL mask enable */

/* ICFBSCR */
pub const TCYC17: u32 = 0x0f; /* 17*Tcyc delay 1st bit between SDA and SCL */

/// 32-bit access to one controller's register block.
pub trait RegisterIo {
    fn read(&self, reg: usize) -> u32;
    fn write(&mut self, reg: usize, value: u32);
}

/// Direct volatile access to a memory-mapped controller instance.
pub struct Mmio {
    base: *mut u8,
}

impl Mmio {
    /// # Safety
    ///
    /// `base` must be the mapped base address of an R-Car I2C register
    /// block, aligned and valid for the lifetime of the returned value, and
    /// no other code may access the same block concurrently.
    #[must_use]
    pub const unsafe fn new(base: *mut u8) -> Self {
        Self { base }
    }
}

impl RegisterIo for Mmio {
    fn read(&self, reg: usize) -> u32 {
        // SAFETY: offset stays within the register block per the
        // constructor contract.
        unsafe { core::ptr::read_volatile(self.base.add(reg).cast::<u32>()) }
    }

    fn write(&mut self, reg: usize, value: u32) {
        // SAFETY: see `read`.
        unsafe { core::ptr::write_volatile(self.base.add(reg).cast::<u32>(), value) }
    }
}

// The block belongs to exactly one driver instance.
unsafe impl Send for Mmio {}
