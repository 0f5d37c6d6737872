/// Various flags and constants used with the UC8179 command set.
///
/// Values that come straight out of the Waveshare 7.5" V2 reference sequence
/// rather than being composed from register bit fields.
pub struct Flag;
#[allow(missing_docs)]
impl Flag {
    // Power Setting (0x01): BD_EN | VSR_EN | VS_EN | VG_EN, internal power
    pub const POWER_SETTING_INTERNAL: u8 = 0x17;

    // Panel Setting (0x00): KW mode, LUT from register, scan up, shift right, booster on
    pub const PANEL_SETTING_KW_LUT_REG: u8 = 0x3F;

    // Booster Soft Start (0x06) phase A, B, C1, C2
    pub const BOOSTER_LEGACY: [u8; 4] = [0x27, 0x27, 0x2F, 0x17];
    pub const BOOSTER_WAVEFORM: [u8; 4] = [0x17, 0x17, 0x28, 0x18];

    // VCOM and Data Interval (0x50): border + data polarity, CDI
    pub const VCOM_INTERVAL_LEGACY: [u8; 2] = [0x10, 0x07];
    pub const VCOM_INTERVAL_WAVEFORM: [u8; 2] = [0x22, 0x07];
    // DDX=01 flips data polarity, so partial windows are sent complemented
    pub const VCOM_INTERVAL_PARTIAL: [u8; 2] = [0xA9, 0x07];

    // TCON (0x60): S2G / G2S non-overlap periods
    pub const TCON_S2G_G2S: u8 = 0x22;

    // Dual SPI (0x15): single data line
    pub const DUAL_SPI_DISABLED: u8 = 0x00;

    // Gate/Source start (0x65): no offset
    pub const GATE_SOURCE_START_ORIGIN: [u8; 4] = [0x00, 0x00, 0x00, 0x00];

    // Deep Sleep (0x07) check code
    pub const DEEP_SLEEP_CHECK: u8 = 0xA5;

    // Partial Window (0x90) PT_SCAN: gates scan only inside the window
    pub const PARTIAL_SCAN_INSIDE: u8 = 0x01;

    // Frame fill values in wire convention (0 = white, 1 = black)
    pub const FILL_WHITE: u8 = 0x00;
    pub const FILL_BLACK: u8 = 0xFF;
}
