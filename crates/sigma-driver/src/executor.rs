//! Action executor
//!
//! Interprets a validated firmware stream against a [`SigmaBus`], one
//! action at a time and strictly in file order.
//!
//! # State machine
//!
//! ```text
//! Running ──(DELAY / PLLWAIT sleep)──▶ Waiting ──▶ Running
//!    │                                                │
//!    ├──(END)──▶ Done                                 │
//!    └──(any error)──▶ Failed ◀───────────────────────┘
//! ```
//!
//! There is no rollback. A failed load leaves the device partly
//! configured, and callers must not treat it as ready.

use crate::bus::SigmaBus;
use crate::clock::Clock;
use crate::config::LoaderConfig;
use crate::error::{LoadError, Result, RuntimeError};
use sigma_firmware::{ActionRecord, FormatError, Opcode, ValidatedFirmware};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Executor state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecState {
    /// Dispatching actions
    Running,
    /// Suspended in a `DELAY` or between `PLLWAIT` polls
    Waiting,
    /// `END` reached
    Done,
    /// Aborted on an error
    Failed,
}

impl ExecState {
    /// True for `Done` and `Failed`; no further action is dispatched.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    const fn to_u8(self) -> u8 {
        match self {
            Self::Running => 0,
            Self::Waiting => 1,
            Self::Done => 2,
            Self::Failed => 3,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Running,
            1 => Self::Waiting,
            2 => Self::Done,
            _ => Self::Failed,
        }
    }
}

/// Shared view of an executor's state.
///
/// Cloned out of an [`Executor`] so another thread, or the clock during a
/// sleep, can see whether the load is running, waiting or finished.
#[derive(Debug, Clone)]
pub struct StatusHandle(Arc<AtomicU8>);

impl StatusHandle {
    fn new(state: ExecState) -> Self {
        Self(Arc::new(AtomicU8::new(state.to_u8())))
    }

    fn set(&self, state: ExecState) {
        self.0.store(state.to_u8(), Ordering::SeqCst);
    }

    /// Current state.
    pub fn get(&self) -> ExecState {
        ExecState::from_u8(self.0.load(Ordering::SeqCst))
    }
}

/// What the caller should do after one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Decode and run the next action
    Continue,
    /// `END` was executed; stop
    Done,
}

/// Statistics for one load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Actions executed, not counting `END`
    pub actions_executed: usize,

    /// Bus write transactions issued
    pub bus_writes: usize,

    /// Total bytes passed to the bus in writes
    pub bytes_written: usize,

    /// Bus read transactions issued
    pub bus_reads: usize,

    /// Status reads issued by `PLLWAIT` actions
    pub pll_polls: usize,

    /// Safeload transfers committed
    pub safeload_commits: usize,

    /// Time requested from the clock (delays and poll intervals)
    pub waited: Duration,

    /// Wall time of the whole load
    pub duration: Duration,
}

/// Runs firmware actions against a bus.
///
/// Generic over the transport and the time source so the same
/// interpreter drives real hardware, [`crate::VirtualDsp`] and test mocks.
#[derive(Debug)]
pub struct Executor<'c, B, C> {
    bus: B,
    clock: C,
    config: &'c LoaderConfig,
    status: StatusHandle,
    report: LoadReport,
}

impl<'c, B: SigmaBus, C: Clock> Executor<'c, B, C> {
    /// Create an executor in the `Running` state.
    pub fn new(bus: B, clock: C, config: &'c LoaderConfig) -> Self {
        Self {
            bus,
            clock,
            config,
            status: StatusHandle::new(ExecState::Running),
            report: LoadReport::default(),
        }
    }

    /// Current state.
    pub fn state(&self) -> ExecState {
        self.status.get()
    }

    /// Handle that tracks this executor's state.
    pub fn status(&self) -> StatusHandle {
        self.status.clone()
    }

    /// Statistics so far.
    pub const fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Release the bus and clock.
    pub fn into_parts(self) -> (B, C) {
        (self.bus, self.clock)
    }

    /// Execute every action up to `END`.
    ///
    /// Decoding and execution are interleaved: each record is decoded,
    /// checked against the cancellation flag, then dispatched, before the
    /// next one is looked at.
    ///
    /// # Errors
    ///
    /// Returns the first decode error or action failure. Actions that ran
    /// before it are not undone.
    pub fn run(mut self, firmware: &ValidatedFirmware<'_>) -> Result<LoadReport> {
        let start = Instant::now();
        info!(
            "Executing firmware ({} payload bytes)",
            firmware.payload().len()
        );

        for action in firmware.actions() {
            let action = match action {
                Ok(action) => action,
                Err(err) => {
                    self.status.set(ExecState::Failed);
                    warn!("Firmware decode failed: {err}");
                    return Err(err.into());
                }
            };

            if self.config.is_cancelled() {
                self.status.set(ExecState::Failed);
                warn!("Load cancelled before action {}", action.index);
                return Err(Self::fail(&action, RuntimeError::Cancelled));
            }

            match self.execute(&action) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Done) => {
                    self.report.duration = start.elapsed();
                    info!(
                        "✅ Firmware loaded: {} actions, {} writes ({} bytes), waited {:?}",
                        self.report.actions_executed,
                        self.report.bus_writes,
                        self.report.bytes_written,
                        self.report.waited
                    );
                    return Ok(self.report);
                }
                Err(source) => {
                    warn!(
                        "Action {} ({}) at {:#06x} failed: {source}",
                        action.index, action.opcode, action.address
                    );
                    return Err(Self::fail(&action, source));
                }
            }
        }

        // The decoder always ends on END or an error; this only guards the contract.
        self.status.set(ExecState::Failed);
        Err(FormatError::MissingEnd {
            actions: self.report.actions_executed,
        }
        .into())
    }

    /// Dispatch a single decoded action.
    ///
    /// # Errors
    ///
    /// Returns the runtime failure; the executor moves to `Failed`.
    /// Once the executor is `Done` or `Failed` every call returns
    /// [`RuntimeError::Finished`] without touching the bus.
    pub fn execute(&mut self, action: &ActionRecord<'_>) -> std::result::Result<Flow, RuntimeError> {
        let state = self.state();
        if state.is_terminal() {
            warn!(
                "Action {} ({}) rejected: executor is {state:?}",
                action.index, action.opcode
            );
            return Err(RuntimeError::Finished { state });
        }

        debug!(
            "Action {}: {} addr={:#06x} len={}",
            action.index, action.opcode, action.address, action.length
        );

        match self.dispatch(action) {
            Ok(Flow::Done) => {
                self.status.set(ExecState::Done);
                Ok(Flow::Done)
            }
            Ok(Flow::Continue) => {
                self.report.actions_executed += 1;
                Ok(Flow::Continue)
            }
            Err(err) => {
                self.status.set(ExecState::Failed);
                Err(err)
            }
        }
    }

    fn fail(action: &ActionRecord<'_>, source: RuntimeError) -> LoadError {
        LoadError::action(action.index, action.opcode, action.address, source)
    }

    fn dispatch(&mut self, action: &ActionRecord<'_>) -> std::result::Result<Flow, RuntimeError> {
        match action.opcode {
            Opcode::WriteXBytes | Opcode::WriteSingle => {
                self.write(action.address, action.payload)?;
            }
            Opcode::WriteSafeload => self.safeload(action.address, action.payload)?,
            Opcode::Delay => {
                let duration = self.config.delay_unit.duration(action.length);
                self.wait(duration);
            }
            Opcode::PllWait => self.pll_wait(action.address)?,
            Opcode::Noop => {}
            Opcode::End => return Ok(Flow::Done),
        }
        Ok(Flow::Continue)
    }

    fn write(&mut self, address: u16, data: &[u8]) -> std::result::Result<(), RuntimeError> {
        self.report.bus_writes += 1;
        self.bus
            .write(address, data)
            .map_err(|source| RuntimeError::BusWriteFailed { source })?;
        self.report.bytes_written += data.len();
        Ok(())
    }

    fn wait(&mut self, duration: Duration) {
        self.status.set(ExecState::Waiting);
        self.clock.sleep(duration);
        self.report.waited += duration;
        self.status.set(ExecState::Running);
    }

    /// Stage `payload` into the safeload slots, then commit.
    ///
    /// Size and alignment are checked before the first bus call.
    fn safeload(&mut self, address: u16, payload: &[u8]) -> std::result::Result<(), RuntimeError> {
        let declared = self.bus.safeload_registers();
        let capacity = declared.map_or(0, |regs| regs.capacity());
        let len = payload.len();

        let Some(regs) = declared.filter(|_| len <= capacity) else {
            return Err(RuntimeError::SafeloadTooLarge { len, capacity });
        };

        let word_len = usize::from(regs.word_len);
        if word_len == 0 || len % word_len != 0 {
            return Err(RuntimeError::SafeloadMisaligned { len, word_len });
        }

        let width = usize::from(regs.data_width).max(word_len);
        let mut slot_data = vec![0u8; width];
        for (slot, word) in (0u16..).zip(payload.chunks(word_len)) {
            slot_data.fill(0);
            slot_data[width - word_len..].copy_from_slice(word);
            let target = address.wrapping_add(slot);

            trace!("Safeload slot {slot}: {word:02x?} -> {target:#06x}");
            self.write(regs.data_base.wrapping_add(slot), &slot_data)?;
            self.write(regs.address_base.wrapping_add(slot), &target.to_be_bytes())?;
        }

        self.write(regs.commit_address, &regs.commit_value.to_be_bytes())?;
        self.report.safeload_commits += 1;
        Ok(())
    }

    /// Poll `address` until the lock bit appears or the budget runs out.
    fn pll_wait(&mut self, address: u16) -> std::result::Result<(), RuntimeError> {
        let pll = self.config.pll;
        if !pll.is_valid() {
            return Err(RuntimeError::InvalidPllPoll {
                status_len: pll.status_len,
                lock_byte: pll.lock_byte,
                max_attempts: pll.max_attempts,
            });
        }
        let mut status = vec![0u8; pll.status_len];
        let mut waited = Duration::ZERO;

        for attempt in 1..=pll.max_attempts {
            self.report.bus_reads += 1;
            self.report.pll_polls += 1;
            self.bus
                .read(address, &mut status)
                .map_err(|source| RuntimeError::BusReadFailed { source })?;

            if pll.is_locked(&status) {
                debug!("PLL locked after {attempt} poll(s)");
                return Ok(());
            }
            trace!("PLL poll {attempt}/{}: {status:02x?}", pll.max_attempts);

            if attempt < pll.max_attempts {
                self.wait(pll.interval);
                waited += pll.interval;
            }
        }

        Err(RuntimeError::PllLockTimeout {
            attempts: pll.max_attempts,
            waited,
        })
    }
}
