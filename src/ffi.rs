//! Raw kernel interfaces for the framebuffer and the Amlogic OSD
//!
//! Layouts and request numbers mirror `linux/fb.h` and the vendor `osd.h`.

use std::os::raw::c_ulong;

// linux/fb.h
pub const FBIOGET_VSCREENINFO: c_ulong = 0x4600;
pub const FBIOPUT_VSCREENINFO: c_ulong = 0x4601;
/// `_IOW('F', 0x20, __u32)`
pub const FBIO_WAITFORVSYNC: c_ulong = 0x4004_4620;

pub const FB_ACTIVATE_ALL: u32 = 64;

// Amlogic OSD (drivers/amlogic/media/osd/osd.h)
pub const FBIOPUT_OSD_SET_GBL_ALPHA: c_ulong = 0x4500;
pub const FBIOGET_OSD_GET_GBL_ALPHA: c_ulong = 0x4501;
pub const FBIOPUT_OSD_FREE_SCALE_ENABLE: c_ulong = 0x4504;
pub const FBIOPUT_OSD_ORDER: c_ulong = 0x4507;
pub const FBIOPUT_OSD_FREE_SCALE_AXIS: c_ulong = 0x4510;
pub const FBIOPUT_OSD_BLANK: c_ulong = 0x451c;

/// `struct fb_bitfield`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FbBitfield {
    pub offset: u32,
    pub length: u32,
    pub msb_right: u32,
}

/// `struct fb_var_screeninfo`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FbVarScreenInfo {
    pub xres: u32,
    pub yres: u32,
    pub xres_virtual: u32,
    pub yres_virtual: u32,
    pub xoffset: u32,
    pub yoffset: u32,
    pub bits_per_pixel: u32,
    pub grayscale: u32,
    pub red: FbBitfield,
    pub green: FbBitfield,
    pub blue: FbBitfield,
    pub transp: FbBitfield,
    pub nonstd: u32,
    pub activate: u32,
    pub height: u32,
    pub width: u32,
    pub accel_flags: u32,
    pub pixclock: u32,
    pub left_margin: u32,
    pub right_margin: u32,
    pub upper_margin: u32,
    pub lower_margin: u32,
    pub hsync_len: u32,
    pub vsync_len: u32,
    pub sync: u32,
    pub vmode: u32,
    pub rotate: u32,
    pub colorspace: u32,
    pub reserved: [u32; 4],
}

/// `glFinish` from libGLESv2
pub type GlFinishFn = unsafe extern "C" fn();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_screeninfo_layout() {
        // 40 u32 fields in the kernel struct
        assert_eq!(std::mem::size_of::<FbVarScreenInfo>(), 160);
    }

    #[test]
    fn test_waitforvsync_encoding() {
        let iow = (1 << 30) | (4 << 16) | ((b'F' as c_ulong) << 8) | 0x20;
        assert_eq!(FBIO_WAITFORVSYNC, iow);
    }
}
