// Licensed under the Apache-2.0 license

//! Interrupt-driven transfer engine of the R-Car I2C unit.
//!
//! The controller has no FIFO; every byte raises a data interrupt and the
//! engine keeps the pipeline full from the interrupt front end. Phase
//! changes (start, repeated start, stop) must be staged one byte ahead of
//! the wire, which shapes most of the state machine below. Larger payloads
//! can be handed to a DMA channel pair, with the message edges always done
//! byte-wise: the first byte of a write and the final two bytes of a read
//! stay on the CPU so the address and stop phases line up.

use crate::common::Logger;
use crate::i2c::common::{
    I2cConfig, I2cSpeed, Message, MessageBuf, TimingConfig, TransferMode, BLOCK_READ_MAX,
};
use crate::i2c::dma::{DmaDirection, DmaPair, MIN_DMA_LEN};
use crate::i2c::regs::{
    RegisterIo, ESG, FNA, FSB, FSDA, ICDMAER, ICMAR, ICMCR, ICMIER, ICMSR, ICRXTX, ICSAR, ICSCR,
    ICSIER, ICSSR, MAL, MAT, MDBS, MDE, MDR, MIE, MNR, MST, RMDMAE, SAR, SDBS, SDE, SDR, SIE, SSR,
    STM, TMDMAE,
};
use crate::i2c::timing::{self, Generation, TimingParams, TimingRegs};
use crate::i2c::traits::{I2cHardwareCore, I2cMaster, I2cTarget, SystemControl, TargetResponse};
use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource, SevenBitAddress};
use fugit::MicrosDurationU32;

/* per-message state, cleared between messages */
const F_LAST_MSG: u32 = 1 << 0;
const F_REP_AFTER_RD: u32 = 1 << 1;
const F_DONE: u32 = 1 << 2;
const F_ARBLOST: u32 = 1 << 3;
const F_NACK: u32 = 1 << 4;
const F_EPROTO: u32 = 1 << 5;
/* persistent state, kept across messages and transfers */
const F_FMPLUS: u32 = 1 << 27;
const F_NOT_ATOMIC: u32 = 1 << 28;
const F_HOST_NOTIFY: u32 = 1 << 29;
const F_NO_RXDMA: u32 = 1 << 30;
const F_PM_BLOCKED: u32 = 1 << 31;
const F_PERSISTENT: u32 = 0xF800_0000;

const F_SLAVE_NACK: u8 = 1 << 0;

const PHASE_START: u32 = MDBS | MIE | ESG;
const PHASE_DATA: u32 = MDBS | MIE;
const PHASE_STOP: u32 = MDBS | MIE | FSB;

const IRQ_SEND: u32 = MNR | MAL | MST | MAT | MDE;
const IRQ_RECV: u32 = MNR | MAL | MST | MAT | MDR;
const IRQ_STOP: u32 = MST;

/// Driver error set, mapped onto `embedded_hal::i2c::ErrorKind` for
/// generic clients.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// No divisor setting reaches the requested SCL rate from the given
    /// functional clock.
    ClockUnattainable,
    /// SDA stayed low and recovery did not release it.
    BusBusy,
    /// Remote device did not acknowledge its address or a data byte.
    NotAcknowledged,
    ArbitrationLost,
    /// Malformed variable-length read (length byte of 0, above the block
    /// maximum, or beyond the caller's buffer).
    ProtocolError,
    Timeout,
    /// Module reset did not complete.
    ResetFailed,
    /// Reset required but a target instance is active.
    ResetBusy,
    /// A target instance is already registered.
    AlreadyRegistered,
    /// Only 7-bit addressing is supported.
    AddressModeUnsupported,
    /// Empty transfer or zero-length message.
    Invalid,
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::NotAcknowledged => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
            Error::ArbitrationLost => ErrorKind::ArbitrationLoss,
            Error::BusBusy => ErrorKind::Bus,
            _ => ErrorKind::Other,
        }
    }
}

/// One R-Car I2C controller instance.
///
/// `R` is the register block access, `S` the platform services, `D` the
/// DMA channel pair and `T` the optional target-mode client. Master
/// transfers are driven from [`transfer`](RcarI2c::transfer); the
/// interrupt front ends run from the calling context after
/// [`SystemControl::wait_irq`] returns, so exactly one writer touches the
/// engine state at a time.
pub struct RcarI2c<R, S, D, T, L = crate::common::NoOpLogger>
where
    R: RegisterIo,
    S: SystemControl,
    D: DmaPair,
    T: I2cTarget,
    L: Logger,
{
    regs: R,
    sys: S,
    dma: D,
    logger: L,
    config: I2cConfig,
    timing: TimingParams,
    flags: u32,
    pos: usize,
    msg_idx: usize,
    /// Wire length of the current message. Differs from the buffer size
    /// only for variable-length reads, where it grows once the length byte
    /// arrives.
    msg_len: usize,
    msgs_left: usize,
    total_msgs: usize,
    dma_direction: Option<DmaDirection>,
    slave: Option<T>,
    slave_flags: u8,
}

impl<R, S, D, T, L> RcarI2c<R, S, D, T, L>
where
    R: RegisterIo,
    S: SystemControl,
    D: DmaPair,
    T: I2cTarget,
    L: Logger,
{
    /// Set up the controller for the given configuration. Computes the
    /// divisors, programs them and disarms the target interface.
    pub fn new(regs: R, sys: S, dma: D, config: I2cConfig, logger: L) -> Result<Self, Error> {
        let timing = timing::calculate(
            config.generation,
            sys.clock_rate(),
            config.speed.hz(),
            &config.timing_config,
        )?;

        let mut flags = 0;
        if let TimingRegs::Separate { fm_plus: true, .. } = timing.regs {
            flags |= F_FMPLUS;
        }
        // The Gen3+ per-transfer hard reset would disturb a Host Notify
        // listener, so it is only offered on earlier generations.
        if config.host_notify && config.generation < Generation::Gen3 {
            flags |= F_HOST_NOTIFY;
        }
        // Bus monitoring and the Host Notify listener need the module to
        // stay powered and clocked between transfers.
        if config.multi_master || flags & F_HOST_NOTIFY != 0 {
            flags |= F_PM_BLOCKED;
        }

        let mut i2c = Self {
            regs,
            sys,
            dma,
            logger,
            config,
            timing,
            flags,
            pos: 0,
            msg_idx: 0,
            msg_len: 0,
            msgs_left: 0,
            total_msgs: 0,
            dma_direction: None,
            slave: None,
            slave_flags: 0,
        };
        i2c.logger.debug(format_args!(
            "i2c: bus speed {} Hz",
            i2c.timing.effective_hz
        ));
        i2c.init();
        i2c.reset_slave();
        Ok(i2c)
    }

    /// SCL rate the programmed divisors actually achieve.
    #[must_use]
    pub fn effective_rate(&self) -> u32 {
        self.timing.effective_hz
    }

    /// Messages of the current or last transfer not yet completed.
    #[must_use]
    pub fn messages_remaining(&self) -> usize {
        self.msgs_left
    }

    /// Whether the board-level Host Notify listener may be armed.
    #[must_use]
    pub fn host_notify_enabled(&self) -> bool {
        self.flags & F_HOST_NOTIFY != 0
    }

    /// Whether the platform must keep the module powered and clocked
    /// between transfers: multi-master bus monitoring, a Host Notify
    /// listener, or an armed target interface.
    #[must_use]
    pub fn power_hold_required(&self) -> bool {
        self.flags & F_PM_BLOCKED != 0
    }

    /// Reset master mode and start the bus clock.
    fn init(&mut self) {
        self.regs.write(ICMIER, 0);
        self.regs.write(ICMCR, MDBS);
        self.regs.write(ICMSR, 0);
        match self.timing.regs {
            TimingRegs::Legacy { icccr } => {
                self.regs.write(crate::i2c::regs::ICCCR, icccr);
            }
            TimingRegs::Separate {
                cdf,
                schd,
                scld,
                smd,
                ..
            } => {
                use crate::i2c::regs::{CDFD, FMPE, HLSE, ICCCR, ICCCR2, ICFBSCR, ICHPR, ICLPR, ICMPR, SME, TCYC17};
                let mut icccr2 = CDFD | HLSE | SME;
                if self.flags & F_FMPLUS != 0 {
                    icccr2 |= FMPE;
                }
                // Mode setup first, then the divisor and period values.
                self.regs.write(ICCCR2, icccr2);
                self.regs.write(ICCCR, cdf);
                self.regs.write(ICMPR, u32::from(smd));
                self.regs.write(ICHPR, u32::from(schd));
                self.regs.write(ICLPR, u32::from(scld));
                self.regs.write(ICFBSCR, TCYC17);
            }
        }
    }

    /// Disarm the target interface. ICSAR must be 0 while unused.
    fn reset_slave(&mut self) {
        self.regs.write(ICSIER, 0);
        self.regs.write(ICSSR, 0);
        self.regs.write(ICSCR, SDBS);
        self.regs.write(ICSAR, 0);
    }

    fn clear_irq(&mut self, bits: u32) {
        self.regs.write(ICMSR, !bits & 0x7f);
    }

    fn is_recv(&self, msgs: &[Message<'_>]) -> bool {
        msgs.get(self.msg_idx).is_some_and(Message::is_read)
    }

    fn prepare_msg(&mut self, msgs: &[Message<'_>]) {
        let Some(msg) = msgs.get(self.msg_idx) else {
            return;
        };
        let read = msg.is_read();

        self.pos = 0;
        self.msg_len = if msg.recv_len { 1 } else { msg.capacity() };
        if self.msgs_left == 1 {
            self.flags |= F_LAST_MSG;
        }

        self.regs
            .write(ICMAR, (u32::from(msg.addr) << 1) | u32::from(read));
        if self.flags & F_NOT_ATOMIC != 0 {
            self.regs
                .write(ICMIER, if read { IRQ_RECV } else { IRQ_SEND });
        }

        // After a read the repeated start was already staged from the
        // receive path; only the status bits need clearing then.
        if self.flags & F_REP_AFTER_RD != 0 {
            self.flags &= !F_REP_AFTER_RD;
            self.regs.write(ICMSR, 0);
        } else {
            self.regs.write(ICMCR, PHASE_START);
            self.regs.write(ICMSR, 0);
        }
    }

    fn first_msg(&mut self, msgs: &[Message<'_>]) {
        self.msg_idx = 0;
        self.msgs_left = self.total_msgs;
        self.flags &= F_PERSISTENT;
        self.prepare_msg(msgs);
    }

    fn next_msg(&mut self, msgs: &[Message<'_>]) {
        self.msg_idx += 1;
        self.msgs_left -= 1;
        self.flags &= F_PERSISTENT | F_REP_AFTER_RD;
        self.prepare_msg(msgs);
    }

    /// Try to hand the bulk of the current message to DMA. Returns `false`
    /// when the transfer must stay byte-wise.
    fn try_dma(&mut self, msgs: &mut [Message<'_>]) -> bool {
        let Some(msg) = msgs.get_mut(self.msg_idx) else {
            return false;
        };
        let read = msg.is_read();

        if self.flags & F_NOT_ATOMIC == 0
            || self.dma_direction.is_some()
            || !msg.dma_safe
            || self.msg_len < MIN_DMA_LEN
            || (read && self.flags & F_NO_RXDMA != 0)
        {
            return false;
        }

        let submitted = match &mut msg.buf {
            MessageBuf::Read(buf) => {
                if !self.dma.can_read() {
                    return false;
                }
                // The final two bytes are fetched byte-wise so the stop
                // phase can be staged in time. The region starts at the
                // current position; for variable-length reads that keeps
                // the already-received length byte intact.
                let end = self.msg_len - 2;
                match buf.get_mut(self.pos..end) {
                    Some(region) if !region.is_empty() => self.dma.submit_read(region),
                    _ => return false,
                }
            }
            MessageBuf::Write(bytes) => {
                if !self.dma.can_write() {
                    return false;
                }
                // First byte went out byte-wise alongside the address.
                match bytes.get(1..self.msg_len) {
                    Some(region) if !region.is_empty() => self.dma.submit_write(region),
                    _ => return false,
                }
            }
        };

        if !submitted {
            self.logger
                .debug(format_args!("i2c: dma setup failed, staying byte-wise"));
            return false;
        }

        self.dma_direction = Some(if read {
            DmaDirection::FromDevice
        } else {
            DmaDirection::ToDevice
        });
        self.regs
            .write(ICDMAER, if read { RMDMAE } else { TMDMAE });
        true
    }

    /// Collect a finished DMA operation and return to byte-wise transfer.
    fn poll_dma(&mut self) {
        if self.dma_direction.is_none() {
            return;
        }
        if let Some(len) = self.dma.poll_complete() {
            self.pos += len;
            self.cleanup_dma(false);
        }
    }

    fn cleanup_dma(&mut self, terminate: bool) {
        let Some(dir) = self.dma_direction.take() else {
            return;
        };
        if terminate {
            self.dma.terminate();
        }
        // Gen3+ allows only one receive DMA per transfer; the next one
        // needs the module reset first.
        if self.config.generation >= Generation::Gen3 && dir == DmaDirection::FromDevice {
            self.flags |= F_NO_RXDMA;
        }
        self.regs.write(ICDMAER, 0);
    }

    fn irq_send(&mut self, msgs: &mut [Message<'_>], msr: u32) {
        // Data-empty not actually set: spurious event, do nothing.
        if msr & MDE == 0 {
            return;
        }
        let mut ack = MDE;
        if msr & MAT != 0 {
            ack |= MAT;
        }

        // First byte is in the shift register; hand the rest to DMA.
        if self.pos == 1 && self.try_dma(msgs) {
            return;
        }

        if self.pos < self.msg_len {
            // Next byte goes to ICRXTX and from there to the shift
            // register while the current one is still on the wire.
            if let Some(byte) = msgs.get(self.msg_idx).and_then(|m| m.byte_at(self.pos)) {
                self.regs.write(ICRXTX, u32::from(byte));
            }
            self.pos += 1;
        } else if self.flags & F_LAST_MSG != 0 {
            // Last byte of the last message is in the shift register;
            // stage the stop condition now.
            self.regs.write(ICMCR, PHASE_STOP);
        } else {
            self.next_msg(msgs);
        }

        self.clear_irq(ack);
    }

    fn irq_recv(&mut self, msgs: &mut [Message<'_>], msr: u32) {
        if msr & MDR == 0 {
            return;
        }
        let mut ack = MDR;
        let mut recv_len_init =
            self.pos == 0 && msgs.get(self.msg_idx).is_some_and(|m| m.recv_len);

        if msr & MAT != 0 {
            ack |= MAT;
            // Address phase finished, no data yet. Try to let DMA receive.
            let _ = self.try_dma(msgs);
        } else if self.pos < self.msg_len {
            let data = (self.regs.read(ICRXTX) & 0xff) as u8;
            if recv_len_init {
                let total = 1 + usize::from(data);
                let capacity = msgs.get(self.msg_idx).map_or(0, Message::capacity);
                if data == 0 || data > BLOCK_READ_MAX || total > capacity {
                    self.flags |= F_DONE | F_EPROTO;
                    return;
                }
                if let Some(msg) = msgs.get_mut(self.msg_idx) {
                    msg.store_at(self.pos, data);
                }
                self.msg_len = total;
                self.pos += 1;
                // Length known now; enough left for DMA?
                if self.try_dma(msgs) {
                    return;
                }
                recv_len_init = false;
            } else {
                if let Some(msg) = msgs.get_mut(self.msg_idx) {
                    msg.store_at(self.pos, data);
                }
                self.pos += 1;
            }
        }

        // The next byte is the last one: stage the following phase before
        // it arrives. Not while a variable length is still unknown.
        if self.pos + 1 == self.msg_len && !recv_len_init {
            if self.flags & F_LAST_MSG != 0 {
                self.regs.write(ICMCR, PHASE_STOP);
            } else {
                self.regs.write(ICMCR, PHASE_START);
                self.flags |= F_REP_AFTER_RD;
            }
        }

        if self.pos == self.msg_len && self.flags & F_LAST_MSG == 0 {
            self.next_msg(msgs);
        }

        self.clear_irq(ack);
    }

    /// Shared interrupt back end for both bus generations and both
    /// execution modes. `msr` is already masked to the enabled sources.
    fn master_irq(&mut self, msgs: &mut [Message<'_>], msr: u32) {
        if msr == 0 {
            let _ = self.slave_irq();
            return;
        }

        if msr & MAL != 0 {
            self.flags |= F_DONE | F_ARBLOST;
        } else if msr & MNR != 0 {
            // The hardware sends the stop itself after a NACK; only the
            // stop event remains interesting.
            if self.flags & F_NOT_ATOMIC != 0 {
                self.regs.write(ICMIER, IRQ_STOP);
            }
            self.flags |= F_NACK;
        } else if msr & MST != 0 {
            // The message in flight made it as well.
            self.msgs_left = self.msgs_left.saturating_sub(1);
            self.flags |= F_DONE;
        } else if self.is_recv(msgs) {
            self.irq_recv(msgs, msr);
        } else {
            self.irq_send(msgs, msr);
        }

        if self.flags & F_DONE != 0 {
            self.regs.write(ICMIER, 0);
            self.regs.write(ICMSR, 0);
        }
    }

    /// Interrupt front end for blocking transfers, run from the caller
    /// after waking. The start/stop bits are cleared right away, except
    /// when a repeated start after a read is still staged.
    fn dispatch(&mut self, msgs: &mut [Message<'_>]) {
        if self.config.generation >= Generation::Gen3 {
            let msr = self.regs.read(ICMSR) & self.regs.read(ICMIER);
            if self.flags & F_REP_AFTER_RD == 0 && msr != 0 {
                self.regs.write(ICMCR, PHASE_DATA);
            }
            self.master_irq(msgs, msr);
        } else {
            if self.flags & F_REP_AFTER_RD == 0 {
                self.regs.write(ICMCR, PHASE_DATA);
            }
            let msr = self.regs.read(ICMSR) & self.regs.read(ICMIER);
            self.master_irq(msgs, msr);
        }
    }

    /// One status-register poll for the spinning execution mode, where
    /// ICMIER stays off and the mask is applied by software.
    fn poll_step(&mut self, msgs: &mut [Message<'_>]) {
        let mask = if self.flags & F_NACK != 0 {
            IRQ_STOP
        } else if self.is_recv(msgs) {
            IRQ_RECV
        } else {
            IRQ_SEND
        };
        let msr = self.regs.read(ICMSR) & mask;
        if msr == 0 {
            return;
        }
        if self.flags & F_REP_AFTER_RD == 0 {
            self.regs.write(ICMCR, PHASE_DATA);
        }
        self.master_irq(msgs, msr);
    }

    /// Wait for SDA to be released before claiming the bus. In a
    /// single-master setup a stuck line is handed to board-level
    /// recovery; with other masters present, busy is a normal condition.
    fn bus_barrier(&mut self) -> Result<(), Error> {
        let deadline = self
            .sys
            .timestamp_us()
            .saturating_add(u64::from(self.config.timeout.ticks()));
        loop {
            if self.regs.read(ICMCR) & FSDA == 0 {
                return Ok(());
            }
            if self.sys.timestamp_us() >= deadline {
                break;
            }
        }

        if !self.config.multi_master
            && self.sys.recover_bus()
            && self.regs.read(ICMCR) & FSDA == 0
        {
            return Ok(());
        }
        Err(Error::BusBusy)
    }

    /// Pulse the module reset and wait for it to deassert.
    fn do_reset(&mut self) -> Result<(), Error> {
        // Resetting would kill an active target instance.
        if self.slave.is_some() {
            return Err(Error::ResetBusy);
        }
        if !self.sys.reset_trigger() {
            return Err(Error::ResetFailed);
        }
        let deadline = self.sys.timestamp_us().saturating_add(100);
        while self.sys.reset_asserted() {
            if self.sys.timestamp_us() >= deadline {
                return Err(Error::ResetFailed);
            }
        }
        Ok(())
    }

    /// Run `msgs` as one bus transaction: start, repeated start between
    /// messages, stop after the last. Returns the number of messages
    /// fully completed.
    pub fn transfer(
        &mut self,
        msgs: &mut [Message<'_>],
        mode: TransferMode,
    ) -> Result<usize, Error> {
        if msgs.is_empty() {
            return Err(Error::Invalid);
        }
        for msg in msgs.iter() {
            if msg.capacity() == 0 {
                return Err(Error::Invalid);
            }
            if msg.addr > 0x7f {
                return Err(Error::AddressModeUnsupported);
            }
        }

        match mode {
            TransferMode::Blocking => self.flags |= F_NOT_ATOMIC,
            TransferMode::Polling => self.flags &= !F_NOT_ATOMIC,
        }

        // Check the bus state before reinitializing, the busy
        // information would be lost otherwise.
        self.bus_barrier()?;

        // Gen3+ needs a reset; that also re-allows one receive DMA.
        if mode == TransferMode::Blocking && self.config.generation >= Generation::Gen3 {
            self.flags &= !F_NO_RXDMA;
            self.do_reset()?;
        }

        self.init();

        self.total_msgs = msgs.len();
        self.first_msg(msgs);

        // Every queued message gets its own slice of the timeout budget.
        let budget = u64::from(self.config.timeout.ticks()) * msgs.len() as u64;
        let deadline = self.sys.timestamp_us().saturating_add(budget);
        let mut timed_out = false;

        while self.flags & F_DONE == 0 {
            let now = self.sys.timestamp_us();
            if now >= deadline {
                timed_out = true;
                break;
            }
            match mode {
                TransferMode::Blocking => {
                    let remaining = (deadline - now).min(u64::from(u32::MAX)) as u32;
                    let _ = self.sys.wait_irq(MicrosDurationU32::micros(remaining));
                    self.poll_dma();
                    self.dispatch(msgs);
                }
                TransferMode::Polling => self.poll_step(msgs),
            }
        }

        // DMA that could not finish must be torn down by hand.
        if self.dma_direction.is_some() {
            self.cleanup_dma(true);
        }

        if timed_out {
            self.logger.error(format_args!("i2c: transfer timed out"));
            // Controller state is undefined after an abandoned transfer.
            self.init();
            Err(Error::Timeout)
        } else if self.flags & F_NACK != 0 {
            Err(Error::NotAcknowledged)
        } else if self.flags & F_ARBLOST != 0 {
            Err(Error::ArbitrationLost)
        } else if self.flags & F_EPROTO != 0 {
            Err(Error::ProtocolError)
        } else {
            Ok(self.total_msgs - self.msgs_left)
        }
    }

    /// Arm the target interface at `addr` with `target` as the backing
    /// client. Only one instance per controller.
    pub fn register_target(&mut self, addr: u8, target: T) -> Result<(), Error> {
        if addr > 0x7f {
            return Err(Error::AddressModeUnsupported);
        }
        if self.slave.is_some() {
            return Err(Error::AlreadyRegistered);
        }

        self.slave = Some(target);
        self.slave_flags = 0;
        // Address detection needs the module active at all times.
        self.flags |= F_PM_BLOCKED;
        self.regs.write(ICSAR, u32::from(addr));
        self.regs.write(ICSSR, 0);
        self.regs.write(ICSIER, SAR);
        self.regs.write(ICSCR, SIE | SDBS);
        Ok(())
    }

    /// Disarm the target interface and hand the client back.
    pub fn unregister_target(&mut self) -> Option<T> {
        self.regs.write(ICSIER, 0);
        self.regs.write(ICSSR, 0);
        self.reset_slave();
        self.slave_flags = 0;
        if !self.config.multi_master && self.flags & F_HOST_NOTIFY == 0 {
            self.flags &= !F_PM_BLOCKED;
        }
        self.slave.take()
    }

    /// Service target-mode events. Returns `true` if any were pending.
    fn slave_irq(&mut self) -> bool {
        let Some(mut slave) = self.slave.take() else {
            return false;
        };
        let ssr_raw = self.regs.read(ICSSR) & 0xff;
        let ssr_filtered = ssr_raw & self.regs.read(ICSIER);
        if ssr_filtered == 0 {
            self.slave = Some(slave);
            return false;
        }

        /* address detected */
        if ssr_filtered & SAR != 0 {
            /* read or write request */
            if ssr_raw & STM != 0 {
                let value = slave.on_read_requested();
                self.regs.write(ICRXTX, u32::from(value));
                self.regs.write(ICSIER, SDE | SSR | SAR);
            } else {
                if slave.on_write_requested() == TargetResponse::Nack {
                    // The address byte is already acknowledged; latch the
                    // refusal and apply it from the first data byte on.
                    self.slave_flags |= F_SLAVE_NACK;
                }
                let _ = self.regs.read(ICRXTX); /* dummy read */
                self.regs.write(ICSIER, SDR | SSR | SAR);
            }

            /* clear SSR as well, stops meant for other targets latch it */
            self.regs.write(ICSSR, !(SAR | SSR) & 0xff);
        }

        /* remote master sent stop */
        if ssr_filtered & SSR != 0 {
            slave.on_stop();
            self.slave_flags &= !F_SLAVE_NACK;
            self.regs.write(ICSCR, SIE | SDBS); /* clear our NACK */
            self.regs.write(ICSIER, SAR);
            self.regs.write(ICSSR, !SSR & 0xff);
        }

        /* remote master wants to write to us */
        if ssr_filtered & SDR != 0 {
            let value = (self.regs.read(ICRXTX) & 0xff) as u8;
            if slave.on_write_received(value) == TargetResponse::Nack {
                self.slave_flags |= F_SLAVE_NACK;
            }
            // One-byte buffer: the refusal lands on the following byte.
            self.write_slave_ctrl();
            self.regs.write(ICSSR, !SDR & 0xff);
        }

        /* remote master wants to read from us */
        if ssr_filtered & SDE != 0 {
            let value = slave.on_read_processed();
            self.regs.write(ICRXTX, u32::from(value));
            self.regs.write(ICSSR, !SDE & 0xff);
        }

        self.slave = Some(slave);
        true
    }

    fn write_slave_ctrl(&mut self) {
        let nack = if self.slave_flags & F_SLAVE_NACK != 0 {
            FNA
        } else {
            0
        };
        self.regs.write(ICSCR, SIE | SDBS | nack);
    }
}

impl<R, S, D, T, L> I2cHardwareCore for RcarI2c<R, S, D, T, L>
where
    R: RegisterIo,
    S: SystemControl,
    D: DmaPair,
    T: I2cTarget,
    L: Logger,
{
    type Error = Error;

    fn configure_timing(
        &mut self,
        speed: I2cSpeed,
        timing: &TimingConfig,
    ) -> Result<u32, Error> {
        let params = timing::calculate(
            self.config.generation,
            self.sys.clock_rate(),
            speed.hz(),
            timing,
        )?;
        self.timing = params;
        self.config.speed = speed;
        self.config.timing_config = *timing;
        if matches!(params.regs, TimingRegs::Separate { fm_plus: true, .. }) {
            self.flags |= F_FMPLUS;
        } else {
            self.flags &= !F_FMPLUS;
        }
        self.init();
        Ok(params.effective_hz)
    }

    /// Master transfers are serviced from the transfer call itself; an
    /// out-of-band interrupt can only be a target-mode event.
    fn handle_interrupt(&mut self) {
        let _ = self.slave_irq();
    }
}

impl<R, S, D, T, L> I2cMaster<SevenBitAddress> for RcarI2c<R, S, D, T, L>
where
    R: RegisterIo,
    S: SystemControl,
    D: DmaPair,
    T: I2cTarget,
    L: Logger,
{
    fn write(
        &mut self,
        addr: SevenBitAddress,
        bytes: &[u8],
        mode: TransferMode,
    ) -> Result<(), Error> {
        let mut msgs = [Message::write(addr, bytes)];
        self.transfer(&mut msgs, mode).map(drop)
    }

    fn read(
        &mut self,
        addr: SevenBitAddress,
        buffer: &mut [u8],
        mode: TransferMode,
    ) -> Result<(), Error> {
        let mut msgs = [Message::read(addr, buffer)];
        self.transfer(&mut msgs, mode).map(drop)
    }

    fn write_read(
        &mut self,
        addr: SevenBitAddress,
        bytes: &[u8],
        buffer: &mut [u8],
        mode: TransferMode,
    ) -> Result<(), Error> {
        let mut msgs = [Message::write(addr, bytes), Message::read(addr, buffer)];
        self.transfer(&mut msgs, mode).map(drop)
    }

    fn transaction_slice(
        &mut self,
        msgs: &mut [Message<'_>],
        mode: TransferMode,
    ) -> Result<usize, Error> {
        self.transfer(msgs, mode)
    }
}
