//! Types shared with the host multimedia library
//!
//! The host owns windows, displays and the GL attribute block; the backend
//! only sees them through these types and reports back through [`Host`].

use bitflags::bitflags;

/// Version of the host video API this backend is built against
pub const HOST_VERSION: Version = Version {
    major: 2,
    minor: 0,
    patch: 5,
};

/// Host-assigned window identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u32);

bitflags! {
    /// Window creation flags (subset the backend cares about)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WindowFlags: u32 {
        const FULLSCREEN = 1 << 0;
        const OPENGL = 1 << 1;
        const SHOWN = 1 << 2;
        const HIDDEN = 1 << 3;
        const BORDERLESS = 1 << 4;
    }
}

/// A window as handed to the backend by the host
#[derive(Debug, Clone)]
pub struct Window {
    pub id: WindowId,
    pub flags: WindowFlags,
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Window {
    pub fn new(id: WindowId, flags: WindowFlags, width: u32, height: u32) -> Self {
        Self {
            id,
            flags,
            width,
            height,
            title: String::new(),
        }
    }

    pub fn wants_gl(&self) -> bool {
        self.flags.contains(WindowFlags::OPENGL)
    }
}

/// Pixel formats the backend can announce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8888,
}

/// Display mode information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayMode {
    pub width: u32,
    pub height: u32,
    pub refresh_rate: u32, // In Hz
    pub format: PixelFormat,
}

/// A display announced to the host during video init
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDisplay {
    pub desktop_mode: DisplayMode,
    pub current_mode: DisplayMode,
}

/// Host-side OpenGL attribute block
///
/// Filled in by the application before context creation. Context creation
/// writes back what the hardware actually granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlAttributes {
    pub red_size: i32,
    pub green_size: i32,
    pub blue_size: i32,
    pub alpha_size: i32,
    pub buffer_size: i32,
    pub depth_size: i32,
    pub stencil_size: i32,
    pub multisample_buffers: i32,
    pub multisample_samples: i32,
    pub major_version: i32,
    pub minor_version: i32,
    pub double_buffer: bool,
    pub stereo: bool,
    /// `None` until a context has been created
    pub accelerated: Option<bool>,
}

impl Default for GlAttributes {
    fn default() -> Self {
        Self {
            red_size: 8,
            green_size: 8,
            blue_size: 8,
            alpha_size: 0,
            buffer_size: 0,
            depth_size: 16,
            stencil_size: 0,
            multisample_buffers: 0,
            multisample_samples: 0,
            major_version: 2,
            minor_version: 0,
            double_buffer: true,
            stereo: false,
            accelerated: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

/// Window-manager info query, versioned by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysWmInfo {
    pub version: Version,
}

/// Callbacks from the backend into the host
pub trait Host {
    /// Register a display discovered during video init
    fn add_video_display(&mut self, display: VideoDisplay);

    fn set_keyboard_focus(&mut self, window: Option<WindowId>);

    fn set_mouse_focus(&mut self, window: Option<WindowId>);
}
