//! Canned waveforms for the 7.5" V2 panel
//!
//! Two kinds of data live here:
//!
//! - the legacy set used by [`Epd7in5::init`](crate::epd7in5::driver::Epd7in5::init):
//!   a 7 byte voltage frame and five 42 byte LUTs
//! - register+LUT blobs used by `init_fast` / `init_part`. The first
//!   [`HEADER_LEN`] bytes pack the power and timing registers as bit fields
//!   (see [`WaveformRegisters`]), followed by five [`LUT_LEN`] byte LUTs
//!   (VCOM, WW, BW, WB, BB) and a reserved tail that is never transmitted.

/// Length of one LUT table (7 phases of 6 bytes)
pub const LUT_LEN: usize = 42;

/// Register header at the start of a waveform blob
pub const HEADER_LEN: usize = 6;

/// Number of LUT tables, written to 0x20..=0x24
pub const LUT_COUNT: usize = 5;

/// Bytes of a waveform blob that are sent to the panel
pub const WAVEFORM_PAYLOAD_LEN: usize = HEADER_LEN + LUT_COUNT * LUT_LEN;

/// Full size of a waveform blob including the reserved tail
pub const WAVEFORM_LEN: usize = WAVEFORM_PAYLOAD_LEN + 31;

/// Legacy voltage frame: PLL, VSH, VSL, VSHR, VCOM, unused, VGH/VGL
pub const VOLTAGE_FRAME: [u8; 7] = [0x06, 0x3F, 0x3F, 0x11, 0x24, 0x07, 0x17];

/// Legacy VCOM LUT
#[rustfmt::skip]
pub const LUT_VCOM: [u8; LUT_LEN] = [
    0x00, 0x0F, 0x0F, 0x00, 0x00, 0x01,
    0x00, 0x0F, 0x01, 0x0F, 0x01, 0x02,
    0x00, 0x0F, 0x0F, 0x00, 0x00, 0x01,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Legacy white-to-white LUT
#[rustfmt::skip]
pub const LUT_WW: [u8; LUT_LEN] = [
    0x10, 0x0F, 0x0F, 0x00, 0x00, 0x01,
    0x84, 0x0F, 0x01, 0x0F, 0x01, 0x02,
    0x20, 0x0F, 0x0F, 0x00, 0x00, 0x01,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Legacy black-to-white LUT
#[rustfmt::skip]
pub const LUT_BW: [u8; LUT_LEN] = [
    0x10, 0x0F, 0x0F, 0x00, 0x00, 0x01,
    0x84, 0x0F, 0x01, 0x0F, 0x01, 0x02,
    0x20, 0x0F, 0x0F, 0x00, 0x00, 0x01,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Legacy white-to-black LUT
#[rustfmt::skip]
pub const LUT_WB: [u8; LUT_LEN] = [
    0x80, 0x0F, 0x0F, 0x00, 0x00, 0x01,
    0x84, 0x0F, 0x01, 0x0F, 0x01, 0x02,
    0x40, 0x0F, 0x0F, 0x00, 0x00, 0x01,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Legacy black-to-black LUT
#[rustfmt::skip]
pub const LUT_BB: [u8; LUT_LEN] = [
    0x80, 0x0F, 0x0F, 0x00, 0x00, 0x01,
    0x84, 0x0F, 0x01, 0x0F, 0x01, 0x02,
    0x40, 0x0F, 0x0F, 0x00, 0x00, 0x01,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Full quality waveform, visible flash
#[rustfmt::skip]
pub const WAVEFORM_ALL_FRESH: [u8; WAVEFORM_LEN] = [
    0x67, 0xBF, 0x3F, 0x0D, 0x00, 0x1C,
    // VCOM
    0x00, 0x32, 0x32, 0x00, 0x00, 0x01,
    0x00, 0x0A, 0x0A, 0x00, 0x00, 0x00,
    0x00, 0x28, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    // WW
    0x60, 0x32, 0x32, 0x00, 0x00, 0x01,
    0x60, 0x0A, 0x0A, 0x00, 0x00, 0x00,
    0x80, 0x28, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    // BW
    0x60, 0x32, 0x32, 0x00, 0x00, 0x01,
    0x60, 0x0A, 0x0A, 0x00, 0x00, 0x00,
    0x80, 0x28, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    // WB
    0x90, 0x32, 0x32, 0x00, 0x00, 0x01,
    0x60, 0x0A, 0x0A, 0x00, 0x00, 0x00,
    0x40, 0x28, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    // BB
    0x90, 0x32, 0x32, 0x00, 0x00, 0x01,
    0x60, 0x0A, 0x0A, 0x00, 0x00, 0x00,
    0x40, 0x28, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    // Reserved
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF,
];

/// Fast waveform for partial updates, leaves some ghosting
#[rustfmt::skip]
pub const WAVEFORM_PARTIAL: [u8; WAVEFORM_LEN] = [
    0x67, 0xBF, 0x3F, 0x0D, 0x00, 0x1C,
    // VCOM
    0x00, 0x14, 0x02, 0x00, 0x00, 0x01,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    // WW
    0x20, 0x14, 0x02, 0x00, 0x00, 0x01,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    // BW
    0x80, 0x14, 0x02, 0x00, 0x00, 0x01,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    // WB
    0x40, 0x14, 0x02, 0x00, 0x00, 0x01,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    // BB
    0x00, 0x14, 0x02, 0x00, 0x00, 0x01,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    // Reserved
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF,
];

/// Register values packed into the header of a waveform blob
///
/// The masks are fixed by the panel vendor and must not change:
///
/// | field      | source                                   | command |
/// |------------|------------------------------------------|---------|
/// | `evs`      | `(h[0] & 0x08) \| ((h[1] & 0xC0) >> 6)`  | 0x52    |
/// | `pll`      | `(h[0] & 0xF0) >> 4`                     | 0x30    |
/// | `vgh_vgl`  | `h[0] & 0x07`                            | 0x01    |
/// | `vsh`      | `h[1] & 0x3F`                            | 0x01    |
/// | `vsl`      | `h[2] & 0x3F`                            | 0x01    |
/// | `vshr`     | `h[3] & 0x3F`                            | 0x01    |
/// | `xon`      | `h[2] & 0xC0`                            | 0x2A    |
/// | `lut_option` | `h[4]`                                 | 0x2A    |
/// | `vcom`     | `h[5]`                                   | 0x82    |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveformRegisters {
    /// End voltage setting (VCEND | BDEND)
    pub evs: u8,
    /// Frame rate / PLL setting
    pub pll: u8,
    /// VGH/VGL voltage level selection
    pub vgh_vgl: u8,
    /// VSH for black
    pub vsh: u8,
    /// VSL for white
    pub vsl: u8,
    /// VSHR for red
    pub vshr: u8,
    /// Gate all-on option
    pub xon: u8,
    /// Second LUT option byte
    pub lut_option: u8,
    /// VCOM DC value
    pub vcom: u8,
}

impl WaveformRegisters {
    /// Extract the register fields from a blob header
    pub fn from_header(h: &[u8; HEADER_LEN]) -> Self {
        let vcend = h[0] & 0x08;
        let bdend = (h[1] & 0xC0) >> 6;
        WaveformRegisters {
            evs: vcend | bdend,
            pll: (h[0] & 0xF0) >> 4,
            vgh_vgl: h[0] & 0x07,
            vsh: h[1] & 0x3F,
            vsl: h[2] & 0x3F,
            vshr: h[3] & 0x3F,
            xon: h[2] & 0xC0,
            lut_option: h[4],
            vcom: h[5],
        }
    }
}

/// A register+LUT waveform blob
#[derive(Debug, Clone, Copy)]
pub struct Waveform<'a> {
    blob: &'a [u8; WAVEFORM_LEN],
}

impl<'a> Waveform<'a> {
    /// "All fresh" full quality waveform used by `init_fast`
    pub const ALL_FRESH: Waveform<'static> = Waveform {
        blob: &WAVEFORM_ALL_FRESH,
    };

    /// Partial waveform used by `init_part`
    pub const PARTIAL: Waveform<'static> = Waveform {
        blob: &WAVEFORM_PARTIAL,
    };

    /// Wrap an arbitrary blob
    pub const fn new(blob: &'a [u8; WAVEFORM_LEN]) -> Self {
        Waveform { blob }
    }

    /// Register fields decoded from the header
    pub fn registers(&self) -> WaveformRegisters {
        let mut header = [0u8; HEADER_LEN];
        header.copy_from_slice(&self.blob[..HEADER_LEN]);
        WaveformRegisters::from_header(&header)
    }

    /// LUT segment `index` (0 = VCOM, 1 = WW, 2 = BW, 3 = WB, 4 = BB)
    ///
    /// # Panics
    ///
    /// Panics if `index >= LUT_COUNT`.
    pub fn segment(&self, index: usize) -> &'a [u8] {
        assert!(index < LUT_COUNT);
        let start = HEADER_LEN + index * LUT_LEN;
        &self.blob[start..start + LUT_LEN]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_layout_adds_up() {
        assert_eq!(WAVEFORM_PAYLOAD_LEN, 216);
        assert_eq!(WAVEFORM_LEN, 247);
        assert!(WAVEFORM_ALL_FRESH[WAVEFORM_PAYLOAD_LEN..]
            .iter()
            .all(|&b| b == 0xFF));
        assert!(WAVEFORM_PARTIAL[WAVEFORM_PAYLOAD_LEN..]
            .iter()
            .all(|&b| b == 0xFF));
    }

    #[test]
    fn registers_use_documented_masks() {
        // every bit set in every byte so each mask shows up directly
        let regs = WaveformRegisters::from_header(&[0xFF; HEADER_LEN]);
        assert_eq!(regs.evs, 0x08 | 0x03);
        assert_eq!(regs.pll, 0x0F);
        assert_eq!(regs.vgh_vgl, 0x07);
        assert_eq!(regs.vsh, 0x3F);
        assert_eq!(regs.vsl, 0x3F);
        assert_eq!(regs.vshr, 0x3F);
        assert_eq!(regs.xon, 0xC0);
        assert_eq!(regs.lut_option, 0xFF);
        assert_eq!(regs.vcom, 0xFF);
    }

    #[test]
    fn registers_from_synthetic_header() {
        let regs = WaveformRegisters::from_header(&[0x5A, 0x81, 0xC4, 0xE9, 0x12, 0x34]);
        assert_eq!(regs.evs, 0x08 | 0x02);
        assert_eq!(regs.pll, 0x05);
        assert_eq!(regs.vgh_vgl, 0x02);
        assert_eq!(regs.vsh, 0x01);
        assert_eq!(regs.vsl, 0x04);
        assert_eq!(regs.vshr, 0x29);
        assert_eq!(regs.xon, 0xC0);
        assert_eq!(regs.lut_option, 0x12);
        assert_eq!(regs.vcom, 0x34);
    }

    #[test]
    fn both_canned_waveforms_share_the_register_header() {
        let fresh = Waveform::ALL_FRESH.registers();
        let partial = Waveform::PARTIAL.registers();
        assert_eq!(fresh, partial);
        assert_eq!(
            fresh,
            WaveformRegisters {
                evs: 0x02,
                pll: 0x06,
                vgh_vgl: 0x07,
                vsh: 0x3F,
                vsl: 0x3F,
                vshr: 0x0D,
                xon: 0x00,
                lut_option: 0x00,
                vcom: 0x1C,
            }
        );
    }

    #[test]
    fn segments_slice_the_payload() {
        let partial = Waveform::PARTIAL;
        assert_eq!(partial.segment(0), &WAVEFORM_PARTIAL[6..48]);
        assert_eq!(partial.segment(4), &WAVEFORM_PARTIAL[174..216]);
        assert_eq!(partial.segment(1)[0], 0x20);
        assert_eq!(partial.segment(3)[0], 0x40);
        assert_eq!(Waveform::ALL_FRESH.segment(2)[..3], [0x60, 0x32, 0x32]);
    }
}
