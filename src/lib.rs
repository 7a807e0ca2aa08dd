//! Dreambox video backend
//!
//! Drives the OSD framebuffer of Dreambox set-top boxes through the
//! vendor's EGL / OpenGL ES stack. The host toolkit talks to the backend
//! through the [`VideoDriver`] trait; the backend in turn talks to the
//! kernel through `/proc/stb` files and framebuffer ioctls.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Host toolkit / application                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                     VideoDriver trait
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │              DreamboxDevice                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐ │
//! │  │ Window      │  │ EGL config  │  │ GL library loader   │ │
//! │  │ lifecycle   │  │ selector    │  │ (dlopen)            │ │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//!                │                             │
//!        EGL 1.4 (libEGL)          /proc/stb/*, /dev/fb0 ioctls
//!                │                             │
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Vendor GPU driver / OSD framebuffer            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use dreambox_video::{device, VideoDriver};
//!
//! let mut device = device::create()?;
//! device.video_init(&mut host)?;
//! device.create_window(&mut host, &window)?;
//! let context = device.gl_create_context(window.id, &mut attrs)?;
//! device.gl_swap_window(window.id)?;
//! ```

pub mod config;
pub mod device;
pub mod driver;
pub mod egl;
pub mod egl_config;
pub mod error;
pub mod ffi;
pub mod framebuffer;
pub mod gl;
pub mod host;
pub mod logging;
pub mod osd;
pub mod stb;

#[cfg(test)]
mod testing;

pub use config::BackendConfig;
pub use device::{DreamboxDevice, WindowState, BOOTSTRAP};
pub use driver::{Bootstrap, VideoDriver};
pub use egl::{EglApi, KhronosEgl};
pub use error::Error;

pub type Result<T> = std::result::Result<T, Error>;
