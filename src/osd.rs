//! Amlogic OSD plane control
//!
//! Vendor ioctls on the framebuffer node. Request numbers live in `ffi`.

use crate::ffi;
use crate::framebuffer::{ioctl_ptr, open};
use crate::Result;
use std::path::Path;
use tracing::debug;

/// Free-scale output rectangle, in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleAxis {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl ScaleAxis {
    fn to_raw(self) -> [i32; 4] {
        [self.x, self.y, self.width, self.height]
    }
}

/// OSD layer stacking order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum OsdOrder {
    Osd1OverOsd2 = 1,
    Osd2OverOsd1 = 2,
}

pub fn set_global_alpha(path: &Path, alpha: u8) -> Result<()> {
    let fb = open(path)?;
    let mut value = alpha as u32;
    ioctl_ptr(&fb, ffi::FBIOPUT_OSD_SET_GBL_ALPHA, &mut value)?;
    debug!("OSD global alpha set to {}", alpha);
    Ok(())
}

pub fn global_alpha(path: &Path) -> Result<u8> {
    let fb = open(path)?;
    let mut value: u32 = 0;
    ioctl_ptr(&fb, ffi::FBIOGET_OSD_GET_GBL_ALPHA, &mut value)?;
    Ok(value.min(u8::MAX as u32) as u8)
}

pub fn set_blank(path: &Path, blank: bool) -> Result<()> {
    let fb = open(path)?;
    let mut value = blank as u32;
    ioctl_ptr(&fb, ffi::FBIOPUT_OSD_BLANK, &mut value)?;
    debug!("OSD blank: {}", blank);
    Ok(())
}

/// Enable free scaling of the OSD plane onto `axis`, or disable it with `None`
pub fn set_free_scale(path: &Path, axis: Option<ScaleAxis>) -> Result<()> {
    let fb = open(path)?;
    if let Some(axis) = axis {
        let mut raw = axis.to_raw();
        ioctl_ptr(&fb, ffi::FBIOPUT_OSD_FREE_SCALE_AXIS, &mut raw)?;
    }
    let mut enable = axis.is_some() as u32;
    ioctl_ptr(&fb, ffi::FBIOPUT_OSD_FREE_SCALE_ENABLE, &mut enable)?;
    debug!("OSD free scale: {:?}", axis);
    Ok(())
}

pub fn set_order(path: &Path, order: OsdOrder) -> Result<()> {
    let fb = open(path)?;
    let mut value = order as u32;
    ioctl_ptr(&fb, ffi::FBIOPUT_OSD_ORDER, &mut value)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::scratch_dir;
    use crate::Error;

    #[test]
    fn test_scale_axis_layout() {
        let axis = ScaleAxis {
            x: 0,
            y: 0,
            width: 1920,
            height: 1080,
        };
        assert_eq!(axis.to_raw(), [0, 0, 1920, 1080]);
    }

    #[test]
    fn test_ioctls_fail_without_device() {
        let dir = scratch_dir();
        let fb = dir.path().join("fb0");
        assert!(matches!(set_global_alpha(&fb, 255), Err(Error::Io(_))));
        assert!(matches!(global_alpha(&fb), Err(Error::Io(_))));
        assert!(matches!(set_blank(&fb, true), Err(Error::Io(_))));
        assert!(matches!(set_free_scale(&fb, None), Err(Error::Io(_))));
        assert!(matches!(set_order(&fb, OsdOrder::Osd1OverOsd2), Err(Error::Io(_))));
    }
}
