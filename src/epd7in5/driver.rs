//! Panel driver for the 7.5" V2 display
//!
//! [`Epd7in5`] owns a [`Bus`] and turns the controller's fixed command
//! sequences into method calls.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized --init*()--> Ready --sleep()--> Asleep
//!       ^                      |                  |
//!       +----shutdown()--------+                  |
//!       Ready <---------------init*()-------------+
//! ```
//!
//! - `init()` - legacy full init with the five register LUTs
//! - `init_fast()` - register+LUT blob, full quality ("all fresh")
//! - `init_part()` - register+LUT blob tuned for quick partial updates
//!
//! `display`, `display_partial`, `clear` and `sleep` are rejected with
//! [`HardwareError::InvalidState`] unless the panel is `Ready`.
//!
//! When an `init*` sequence or `sleep` fails after the bus was opened, the bus
//! is closed before the error is returned and the panel is `Uninitialized`.
//!
//! ## BUSY line
//!
//! The controller pulls BUSY low while it is working. Every wait sends the
//! status query (0x71) before each sample and gives up after
//! [`Config::busy_timeout_ms`].
//!
//! ## Data polarity
//!
//! Frames are in wire convention (`1` = black). A full update writes the
//! complement to the old frame register and the buffer itself to the new one.
//! Partial updates switch the data interval to `0xA9`, which inverts the
//! polarity, so the window bytes go out complemented.

use embedded_hal::digital::PinState;

use crate::epd7in5::cmd::Cmd;
use crate::epd7in5::error::HardwareError;
use crate::epd7in5::flag::Flag;
use crate::epd7in5::interface::{Bus, Pin};
use crate::epd7in5::lut::{self, Waveform, LUT_LEN};
use crate::epd7in5::{BUFFER_SIZE, HEIGHT, WIDTH};

/// Delay after power on and after each refresh trigger, before polling BUSY
const SETTLE_MS: u32 = 100;

/// Delay once BUSY has been released
const BUSY_RELEASE_MS: u32 = 20;

/// Time the controller needs to latch deep sleep before power is cut
const DEEP_SLEEP_MS: u32 = 2000;

/// Driver tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Give up on a BUSY wait after this long
    pub busy_timeout_ms: u32,
    /// Pause between two BUSY samples
    pub busy_poll_interval_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            busy_timeout_ms: 30_000,
            busy_poll_interval_ms: 10,
        }
    }
}

impl Config {
    /// Set the BUSY wait bound
    pub fn with_busy_timeout_ms(mut self, ms: u32) -> Self {
        self.busy_timeout_ms = ms;
        self
    }

    /// Set the pause between two BUSY samples, at least 1 ms
    pub fn with_busy_poll_interval_ms(mut self, ms: u32) -> Self {
        self.busy_poll_interval_ms = ms.max(1);
        self
    }
}

/// Where the panel is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    /// Bus closed or never initialized
    Uninitialized,
    /// Initialized and accepting frames
    Ready,
    /// In deep sleep, bus closed; needs one of the `init*` methods
    Asleep,
}

/// Partial refresh window, columns aligned to whole bytes
///
/// End coordinates are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    x_start: u32,
    y_start: u32,
    x_end: u32,
    y_end: u32,
}

impl Window {
    /// Round `x_start` down and `x_end` up to a multiple of 8
    ///
    /// The window must be non-empty and inside the panel.
    pub fn byte_aligned(
        x_start: u32,
        y_start: u32,
        x_end: u32,
        y_end: u32,
    ) -> Result<Window, HardwareError> {
        if x_start >= x_end || y_start >= y_end || x_end > WIDTH || y_end > HEIGHT {
            return Err(HardwareError::InvalidWindow {
                x_start,
                y_start,
                x_end,
                y_end,
            });
        }
        Ok(Window {
            x_start: x_start & !7,
            y_start,
            x_end: x_end.div_ceil(8) * 8,
            y_end,
        })
    }

    /// First column, multiple of 8
    pub fn x_start(&self) -> u32 {
        self.x_start
    }

    /// First row
    pub fn y_start(&self) -> u32 {
        self.y_start
    }

    /// Column after the last one, multiple of 8
    pub fn x_end(&self) -> u32 {
        self.x_end
    }

    /// Row after the last one
    pub fn y_end(&self) -> u32 {
        self.y_end
    }

    /// Bytes per window row
    pub fn byte_width(&self) -> usize {
        ((self.x_end - self.x_start) / 8) as usize
    }

    /// Rows in the window
    pub fn height(&self) -> usize {
        (self.y_end - self.y_start) as usize
    }

    /// Size of a buffer holding exactly the window
    pub fn buffer_len(&self) -> usize {
        self.byte_width() * self.height()
    }

    /// Payload of the partial window command (0x90), inclusive end coordinates
    fn register_bytes(&self) -> [u8; 9] {
        let [_, _, xs_hi, xs_lo] = self.x_start.to_be_bytes();
        let [_, _, xe_hi, xe_lo] = (self.x_end - 1).to_be_bytes();
        let [_, _, ys_hi, ys_lo] = self.y_start.to_be_bytes();
        let [_, _, ye_hi, ye_lo] = (self.y_end - 1).to_be_bytes();
        [
            xs_hi,
            xs_lo,
            xe_hi,
            xe_lo,
            ys_hi,
            ys_lo,
            ye_hi,
            ye_lo,
            Flag::PARTIAL_SCAN_INSIDE,
        ]
    }
}

/// 7.5" V2 e-paper driver
///
/// ## Type Parameters
///
/// - `B` - bus/pin adapter, owned exclusively by the driver
pub struct Epd7in5<B> {
    bus: B,
    config: Config,
    state: PanelState,
}

impl<B: Bus> Epd7in5<B> {
    /// Wrap a bus with the default [`Config`]; nothing is sent yet
    pub fn new(bus: B) -> Self {
        Self::with_config(bus, Config::default())
    }

    /// Wrap a bus with explicit tuning
    pub fn with_config(bus: B, config: Config) -> Self {
        Epd7in5 {
            bus,
            config,
            state: PanelState::Uninitialized,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> PanelState {
        self.state
    }

    /// Active tuning
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Borrow the bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Borrow the bus mutably, bypassing the state tracking
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Give the bus back without closing it
    pub fn release(self) -> B {
        self.bus
    }

    // ==================== Low level ====================

    /// Hardware reset: high 20 ms, low 2 ms, high 20 ms
    pub fn reset(&mut self) -> Result<(), HardwareError> {
        self.bus.write_pin(Pin::Reset, PinState::High)?;
        self.bus.delay_ms(20);
        self.bus.write_pin(Pin::Reset, PinState::Low)?;
        self.bus.delay_ms(2);
        self.bus.write_pin(Pin::Reset, PinState::High)?;
        self.bus.delay_ms(20);
        Ok(())
    }

    /// Send one command byte (DC low)
    pub fn send_command(&mut self, command: u8) -> Result<(), HardwareError> {
        self.bus.write_pin(Pin::DataCommand, PinState::Low)?;
        self.bus.spi_write(&[command])
    }

    /// Send one data byte (DC high)
    pub fn send_data(&mut self, data: u8) -> Result<(), HardwareError> {
        self.bus.write_pin(Pin::DataCommand, PinState::High)?;
        self.bus.spi_write(&[data])
    }

    /// Send a data payload of any size (DC high)
    pub fn send_data_bulk(&mut self, data: &[u8]) -> Result<(), HardwareError> {
        self.bus.write_pin(Pin::DataCommand, PinState::High)?;
        self.bus.spi_write_bulk(data)
    }

    fn cmd_with_data(&mut self, command: u8, data: &[u8]) -> Result<(), HardwareError> {
        log::debug!("cmd 0x{:02X} with {} data bytes", command, data.len());
        self.send_command(command)?;
        self.send_data_bulk(data)
    }

    /// Block until the BUSY line reports idle
    ///
    /// Sends the status query before every sample, then waits 20 ms once
    /// the line is released.
    pub fn wait_until_idle(&mut self) -> Result<(), HardwareError> {
        log::debug!("e-paper busy");
        let interval = self.config.busy_poll_interval_ms.max(1);
        let mut waited_ms = 0u32;

        loop {
            self.send_command(Cmd::GET_STATUS)?;
            if self.bus.read_busy()? {
                break;
            }
            if waited_ms >= self.config.busy_timeout_ms {
                log::error!("BUSY still low after {} ms", waited_ms);
                return Err(HardwareError::Timeout { waited_ms });
            }
            self.bus.delay_ms(interval);
            waited_ms = waited_ms.saturating_add(interval);
        }

        self.bus.delay_ms(BUSY_RELEASE_MS);
        log::debug!("e-paper busy release after {} ms", waited_ms);
        Ok(())
    }

    /// Write the five LUT tables to 0x20..=0x24
    pub fn load_lut(
        &mut self,
        vcom: &[u8; LUT_LEN],
        ww: &[u8; LUT_LEN],
        bw: &[u8; LUT_LEN],
        wb: &[u8; LUT_LEN],
        bb: &[u8; LUT_LEN],
    ) -> Result<(), HardwareError> {
        self.cmd_with_data(Cmd::LUT_VCOM, vcom)?;
        self.cmd_with_data(Cmd::LUT_WW, ww)?;
        self.cmd_with_data(Cmd::LUT_BW, bw)?;
        self.cmd_with_data(Cmd::LUT_WB, wb)?;
        self.cmd_with_data(Cmd::LUT_BB, bb)
    }

    fn power_on(&mut self) -> Result<(), HardwareError> {
        self.send_command(Cmd::POWER_ON)?;
        self.bus.delay_ms(SETTLE_MS);
        self.wait_until_idle()
    }

    fn refresh(&mut self) -> Result<(), HardwareError> {
        self.send_command(Cmd::DISPLAY_REFRESH)?;
        self.bus.delay_ms(SETTLE_MS);
        self.wait_until_idle()
    }

    fn resolution(&mut self) -> Result<(), HardwareError> {
        let [_, _, w_hi, w_lo] = WIDTH.to_be_bytes();
        let [_, _, h_hi, h_lo] = HEIGHT.to_be_bytes();
        self.cmd_with_data(Cmd::RESOLUTION_SETTING, &[w_hi, w_lo, h_hi, h_lo])
    }

    /// Close the bus when `result` is an error, keeping that error
    fn close_on_error<T>(
        &mut self,
        result: Result<T, HardwareError>,
    ) -> Result<T, HardwareError> {
        if let Err(e) = &result {
            log::error!("{}, closing the bus", e);
            self.state = PanelState::Uninitialized;
            if let Err(close_err) = self.bus.close() {
                log::error!("closing the bus failed: {}", close_err);
            }
        }
        result
    }

    fn require_ready(&self, operation: &'static str) -> Result<(), HardwareError> {
        if self.state != PanelState::Ready {
            return Err(HardwareError::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    // ==================== Initialization ====================

    /// Legacy full initialization with the register LUTs
    pub fn init(&mut self) -> Result<(), HardwareError> {
        log::info!("init: legacy full refresh");
        self.state = PanelState::Uninitialized;
        self.bus.open()?;
        let result = self.legacy_sequence();
        self.close_on_error(result)?;

        self.state = PanelState::Ready;
        Ok(())
    }

    fn legacy_sequence(&mut self) -> Result<(), HardwareError> {
        self.reset()?;

        let vf = &lut::VOLTAGE_FRAME;
        self.cmd_with_data(
            Cmd::POWER_SETTING,
            &[Flag::POWER_SETTING_INTERNAL, vf[6], vf[1], vf[2], vf[3]],
        )?;
        self.cmd_with_data(Cmd::VCOM_DC_SETTING, &[vf[4]])?;
        self.cmd_with_data(Cmd::BOOSTER_SOFT_START, &Flag::BOOSTER_LEGACY)?;
        self.cmd_with_data(Cmd::PLL_CONTROL, &[vf[0]])?;
        self.power_on()?;

        self.cmd_with_data(Cmd::PANEL_SETTING, &[Flag::PANEL_SETTING_KW_LUT_REG])?;
        self.resolution()?;
        self.cmd_with_data(Cmd::DUAL_SPI, &[Flag::DUAL_SPI_DISABLED])?;
        self.cmd_with_data(Cmd::VCOM_DATA_INTERVAL, &Flag::VCOM_INTERVAL_LEGACY)?;
        self.cmd_with_data(Cmd::TCON_SETTING, &[Flag::TCON_S2G_G2S])?;
        self.cmd_with_data(Cmd::GATE_SOURCE_START, &Flag::GATE_SOURCE_START_ORIGIN)?;

        self.load_lut(
            &lut::LUT_VCOM,
            &lut::LUT_WW,
            &lut::LUT_BW,
            &lut::LUT_WB,
            &lut::LUT_BB,
        )
    }

    /// Full quality init from the "all fresh" waveform
    pub fn init_fast(&mut self) -> Result<(), HardwareError> {
        log::info!("init: fast (all fresh waveform)");
        self.init_with_waveform(Waveform::ALL_FRESH)
    }

    /// Partial refresh init from the "partial" waveform
    pub fn init_part(&mut self) -> Result<(), HardwareError> {
        log::info!("init: partial waveform");
        self.init_with_waveform(Waveform::PARTIAL)
    }

    fn init_with_waveform(&mut self, waveform: Waveform<'_>) -> Result<(), HardwareError> {
        self.state = PanelState::Uninitialized;
        self.bus.open()?;
        let result = self.waveform_sequence(waveform);
        self.close_on_error(result)?;

        self.state = PanelState::Ready;
        Ok(())
    }

    fn waveform_sequence(&mut self, waveform: Waveform<'_>) -> Result<(), HardwareError> {
        self.reset()?;

        self.cmd_with_data(Cmd::PANEL_SETTING, &[Flag::PANEL_SETTING_KW_LUT_REG])?;
        self.cmd_with_data(Cmd::BOOSTER_SOFT_START, &Flag::BOOSTER_WAVEFORM)?;
        self.cmd_with_data(Cmd::VCOM_DATA_INTERVAL, &Flag::VCOM_INTERVAL_WAVEFORM)?;
        self.cmd_with_data(Cmd::TCON_SETTING, &[Flag::TCON_S2G_G2S])?;
        self.resolution()?;
        self.cmd_with_data(Cmd::GATE_SOURCE_START, &Flag::GATE_SOURCE_START_ORIGIN)?;
        self.power_on()?;

        self.apply_waveform(waveform)
    }

    fn apply_waveform(&mut self, waveform: Waveform<'_>) -> Result<(), HardwareError> {
        let regs = waveform.registers();
        log::debug!("waveform registers: {:?}", regs);

        self.cmd_with_data(Cmd::END_VOLTAGE_SETTING, &[regs.evs])?;
        self.cmd_with_data(Cmd::PLL_CONTROL, &[regs.pll])?;
        self.cmd_with_data(
            Cmd::POWER_SETTING,
            &[
                Flag::POWER_SETTING_INTERNAL,
                regs.vgh_vgl,
                regs.vsh,
                regs.vsl,
                regs.vshr,
            ],
        )?;
        self.cmd_with_data(Cmd::LUT_OPTION, &[regs.xon, regs.lut_option])?;
        self.cmd_with_data(Cmd::VCOM_DC_SETTING, &[regs.vcom])?;

        let tables = [Cmd::LUT_VCOM, Cmd::LUT_WW, Cmd::LUT_BW, Cmd::LUT_WB, Cmd::LUT_BB];
        for (index, command) in tables.into_iter().enumerate() {
            self.cmd_with_data(command, waveform.segment(index))?;
        }
        Ok(())
    }

    // ==================== Updates ====================

    /// Full refresh with a packed frame of [`BUFFER_SIZE`] bytes
    pub fn display(&mut self, buffer: &[u8]) -> Result<(), HardwareError> {
        self.require_ready("display")?;
        if buffer.len() != BUFFER_SIZE {
            return Err(HardwareError::BufferSize {
                required: BUFFER_SIZE,
                provided: buffer.len(),
            });
        }
        log::info!("display: full refresh");

        let old: Vec<u8> = buffer.iter().map(|b| !b).collect();
        self.cmd_with_data(Cmd::WRITE_OLD_DATA, &old)?;
        self.cmd_with_data(Cmd::WRITE_NEW_DATA, buffer)?;
        self.refresh()
    }

    /// Refresh a rectangle; `buffer` holds only the window rows
    ///
    /// The window is widened to whole bytes first (see [`Window::byte_aligned`]),
    /// and `buffer` must match the aligned window.
    pub fn display_partial(
        &mut self,
        buffer: &[u8],
        x_start: u32,
        y_start: u32,
        x_end: u32,
        y_end: u32,
    ) -> Result<(), HardwareError> {
        self.require_ready("display_partial")?;
        let window = Window::byte_aligned(x_start, y_start, x_end, y_end)?;
        if buffer.len() != window.buffer_len() {
            return Err(HardwareError::BufferSize {
                required: window.buffer_len(),
                provided: buffer.len(),
            });
        }
        log::info!(
            "display: partial refresh ({},{})..({},{})",
            window.x_start,
            window.y_start,
            window.x_end,
            window.y_end
        );

        self.cmd_with_data(Cmd::VCOM_DATA_INTERVAL, &Flag::VCOM_INTERVAL_PARTIAL)?;
        self.send_command(Cmd::PARTIAL_IN)?;
        self.cmd_with_data(Cmd::PARTIAL_WINDOW, &window.register_bytes())?;

        let inverted: Vec<u8> = buffer.iter().map(|b| !b).collect();
        self.cmd_with_data(Cmd::WRITE_NEW_DATA, &inverted)?;
        self.refresh()
    }

    /// Blank the panel to white
    pub fn clear(&mut self) -> Result<(), HardwareError> {
        self.require_ready("clear")?;
        log::info!("clear");
        self.cmd_with_data(Cmd::WRITE_OLD_DATA, &vec![Flag::FILL_BLACK; BUFFER_SIZE])?;
        self.cmd_with_data(Cmd::WRITE_NEW_DATA, &vec![Flag::FILL_WHITE; BUFFER_SIZE])?;
        self.refresh()
    }

    // ==================== Power ====================

    /// Power off, enter deep sleep and close the bus
    pub fn sleep(&mut self) -> Result<(), HardwareError> {
        self.require_ready("sleep")?;
        log::info!("sleep");
        let result = self.power_down();
        self.close_on_error(result)?;
        self.bus.close()?;
        self.state = PanelState::Asleep;
        Ok(())
    }

    fn power_down(&mut self) -> Result<(), HardwareError> {
        self.send_command(Cmd::POWER_OFF)?;
        self.wait_until_idle()?;
        self.cmd_with_data(Cmd::DEEP_SLEEP, &[Flag::DEEP_SLEEP_CHECK])?;
        self.bus.delay_ms(DEEP_SLEEP_MS);
        Ok(())
    }

    /// Drop the lines and the supply without talking to the controller
    ///
    /// Meant for interrupted runs; the panel keeps whatever it shows.
    pub fn shutdown(&mut self) -> Result<(), HardwareError> {
        log::info!("shutdown: releasing bus");
        self.state = PanelState::Uninitialized;
        self.bus.close()
    }
}
