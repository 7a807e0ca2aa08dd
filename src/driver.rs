//! Video driver capability interface
//!
//! The host drives a backend exclusively through [`VideoDriver`]. Window
//! operations the hardware has no notion of default to no-ops.

use crate::host::{DisplayMode, GlAttributes, Host, SysWmInfo, VideoDisplay, Window, WindowId};
use crate::Result;
use std::fmt::Debug;
use std::os::raw::c_void;
use std::path::Path;

/// Static description of a backend, used by the host to pick one
#[derive(Debug, Clone, Copy)]
pub struct Bootstrap {
    pub name: &'static str,
    pub description: &'static str,
}

pub trait VideoDriver {
    /// Handle returned to the host for a GL context
    type Context: Copy + PartialEq + Debug;

    fn video_init(&mut self, host: &mut dyn Host) -> Result<()>;

    fn video_quit(&mut self);

    fn get_display_modes(&self, display: &VideoDisplay) -> Vec<DisplayMode>;

    fn set_display_mode(&mut self, display: &VideoDisplay, mode: &DisplayMode) -> Result<()>;

    fn create_window(&mut self, host: &mut dyn Host, window: &Window) -> Result<()>;

    /// Wrap a foreign native window
    fn create_window_from(&mut self, window: &Window, data: *const c_void) -> Result<()>;

    fn set_window_title(&mut self, _window: &Window) {}

    fn set_window_icon(&mut self, _window: &Window, _pixels: &[u8]) {}

    fn set_window_position(&mut self, _window: &Window) {}

    fn set_window_size(&mut self, _window: &Window) {}

    fn show_window(&mut self, window: &Window);

    fn hide_window(&mut self, window: &Window);

    fn raise_window(&mut self, _window: &Window) {}

    fn maximize_window(&mut self, _window: &Window) {}

    fn minimize_window(&mut self, _window: &Window) {}

    fn restore_window(&mut self, _window: &Window) {}

    fn set_window_grab(&mut self, _window: &Window, _grabbed: bool) {}

    fn destroy_window(&mut self, window: WindowId);

    fn get_window_wm_info(&self, window: WindowId, info: &mut SysWmInfo) -> Result<()>;

    fn gl_load_library(&mut self, path: Option<&Path>) -> Result<()>;

    fn gl_get_proc_address(&self, name: &str) -> Option<*const c_void>;

    fn gl_unload_library(&mut self);

    /// Create a context for `window`; granted attributes are written back
    /// into `attrs`
    fn gl_create_context(
        &mut self,
        window: WindowId,
        attrs: &mut GlAttributes,
    ) -> Result<Self::Context>;

    /// Bind `context` on `window`; `(None, None)` detaches the current one
    fn gl_make_current(
        &mut self,
        window: Option<WindowId>,
        context: Option<Self::Context>,
    ) -> Result<()>;

    fn gl_set_swap_interval(&mut self, interval: i32) -> Result<()>;

    fn gl_get_swap_interval(&self) -> i32;

    fn gl_swap_window(&mut self, window: WindowId) -> Result<()>;

    fn gl_delete_context(&mut self, context: Self::Context) -> Result<()>;

    fn pump_events(&mut self);
}
