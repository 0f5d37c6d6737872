pub struct Cmd;
impl Cmd {
    // Init
    pub const PANEL_SETTING: u8 = 0x00;
    pub const POWER_SETTING: u8 = 0x01;
    pub const POWER_OFF: u8 = 0x02;
    pub const POWER_ON: u8 = 0x04;
    pub const BOOSTER_SOFT_START: u8 = 0x06;
    pub const DEEP_SLEEP: u8 = 0x07;
    pub const DUAL_SPI: u8 = 0x15;
    pub const PLL_CONTROL: u8 = 0x30;
    pub const VCOM_DATA_INTERVAL: u8 = 0x50;
    pub const END_VOLTAGE_SETTING: u8 = 0x52;
    pub const TCON_SETTING: u8 = 0x60;
    pub const RESOLUTION_SETTING: u8 = 0x61;
    pub const GATE_SOURCE_START: u8 = 0x65;
    pub const VCOM_DC_SETTING: u8 = 0x82;

    // Waveform
    pub const LUT_VCOM: u8 = 0x20;
    pub const LUT_WW: u8 = 0x21;
    pub const LUT_BW: u8 = 0x22;
    pub const LUT_WB: u8 = 0x23;
    pub const LUT_BB: u8 = 0x24;
    pub const LUT_OPTION: u8 = 0x2A;

    // Update
    pub const WRITE_OLD_DATA: u8 = 0x10;
    pub const DISPLAY_REFRESH: u8 = 0x12;
    pub const WRITE_NEW_DATA: u8 = 0x13;
    pub const GET_STATUS: u8 = 0x71;
    pub const PARTIAL_WINDOW: u8 = 0x90;
    pub const PARTIAL_IN: u8 = 0x91;
}

/*
Waveshare 7.5" V2 demo code used these:
0x01 - Power Setting (VGH/VGL, VSH, VSL, VSHR)
0x06 - Booster Soft Start
0x04 - Power ON, then poll BUSY_N through 0x71
0x00 - Panel Setting (KW mode, LUT from register)
0x61 - Resolution (source 800, gate 480)
0x10 / 0x13 - Old / New frame data
0x12 - Display Refresh
0x02 / 0x07 - Power OFF / Deep Sleep (check code 0xA5)
*/
