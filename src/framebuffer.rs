//! Linux framebuffer device control
//!
//! The device node is opened per call and closed on return, so nothing here
//! holds hardware state between calls.

use crate::ffi::{self, FbVarScreenInfo};
use crate::Result;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::raw::c_ulong;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use tracing::debug;

pub(crate) fn open(path: &Path) -> Result<File> {
    Ok(OpenOptions::new().read(true).write(true).open(path)?)
}

/// Issue an ioctl whose argument is a pointer to `arg`
pub(crate) fn ioctl_ptr<T>(file: &File, request: c_ulong, arg: &mut T) -> Result<()> {
    let ret = unsafe { libc::ioctl(file.as_raw_fd(), request as _, arg as *mut T) };
    if ret < 0 {
        return Err(io::Error::last_os_error().into());
    }
    Ok(())
}

/// Rewrite a screen info block for a `width` x `height` double-height
/// 32bpp layout
pub fn apply_resolution(vinfo: &mut FbVarScreenInfo, width: u32, height: u32) {
    vinfo.xres = width;
    vinfo.yres = height;
    vinfo.xres_virtual = width;
    vinfo.yres_virtual = height.saturating_mul(2);
    vinfo.bits_per_pixel = 32;
    vinfo.activate = ffi::FB_ACTIVATE_ALL;
}

pub fn screen_info(path: &Path) -> Result<FbVarScreenInfo> {
    let fb = open(path)?;
    let mut vinfo = FbVarScreenInfo::default();
    ioctl_ptr(&fb, ffi::FBIOGET_VSCREENINFO, &mut vinfo)?;
    Ok(vinfo)
}

/// Set the framebuffer resolution
pub fn set_resolution(path: &Path, width: u32, height: u32) -> Result<()> {
    let fb = open(path)?;
    let mut vinfo = FbVarScreenInfo::default();
    ioctl_ptr(&fb, ffi::FBIOGET_VSCREENINFO, &mut vinfo)?;

    apply_resolution(&mut vinfo, width, height);
    ioctl_ptr(&fb, ffi::FBIOPUT_VSCREENINFO, &mut vinfo)?;

    debug!("Set framebuffer resolution: {}x{}", width, height);
    Ok(())
}

/// Block until the next vertical refresh
pub fn wait_for_vsync(path: &Path) -> Result<()> {
    let fb = open(path)?;
    let mut crtc: u32 = 0;
    ioctl_ptr(&fb, ffi::FBIO_WAITFORVSYNC, &mut crtc)?;
    debug!("Wait for sync");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::scratch_dir;
    use crate::Error;

    #[test]
    fn test_apply_resolution() {
        let mut vinfo = FbVarScreenInfo {
            xres: 1920,
            yres: 1080,
            bits_per_pixel: 16,
            pixclock: 6734,
            ..Default::default()
        };

        apply_resolution(&mut vinfo, 1280, 720);

        assert_eq!((vinfo.xres, vinfo.yres), (1280, 720));
        assert_eq!((vinfo.xres_virtual, vinfo.yres_virtual), (1280, 1440));
        assert_eq!(vinfo.bits_per_pixel, 32);
        assert_eq!(vinfo.activate, ffi::FB_ACTIVATE_ALL);
        // Timing is left as the driver reported it
        assert_eq!(vinfo.pixclock, 6734);
    }

    #[test]
    fn test_apply_resolution_huge_height() {
        let mut vinfo = FbVarScreenInfo::default();
        apply_resolution(&mut vinfo, 1280, u32::MAX);
        assert_eq!(vinfo.yres, u32::MAX);
        assert_eq!(vinfo.yres_virtual, u32::MAX);
    }

    #[test]
    fn test_missing_device() {
        let dir = scratch_dir();
        let err = set_resolution(&dir.path().join("fb0"), 1280, 720).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(wait_for_vsync(&dir.path().join("fb0")).is_err());
    }

    #[test]
    fn test_not_a_framebuffer() {
        // A regular file rejects framebuffer ioctls with ENOTTY
        let dir = scratch_dir();
        let path = dir.path().join("fb0");
        std::fs::write(&path, b"").unwrap();
        match screen_info(&path) {
            Err(Error::Io(e)) => assert_eq!(e.raw_os_error(), Some(libc::ENOTTY)),
            other => panic!("expected ENOTTY, got {:?}", other),
        }
    }
}
