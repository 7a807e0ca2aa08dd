//! EGL entry points used by the backend
//!
//! [`EglApi`] is the seam between the lifecycle code and the platform EGL.
//! [`KhronosEgl`] is the real implementation, loading `libEGL` at runtime.

use crate::{Error, Result};
use khronos_egl as egl;
use std::fmt::Debug;
use std::os::raw::c_void;
use std::path::Path;
use tracing::info;

/// The subset of EGL 1.4 the backend calls
pub trait EglApi {
    type Display: Copy + PartialEq + Debug;
    type Config: Copy + PartialEq + Debug;
    type Context: Copy + PartialEq + Debug;
    type Surface: Copy + PartialEq + Debug;

    /// Connection to the default native display
    fn get_display(&self) -> Option<Self::Display>;

    fn initialize(&self, display: Self::Display) -> Result<(i32, i32)>;

    fn terminate(&self, display: Self::Display) -> Result<()>;

    /// Configurations matching `attribs` (terminated by `EGL_NONE`), at most `max`
    fn choose_config(
        &self,
        display: Self::Display,
        attribs: &[i32],
        max: usize,
    ) -> Result<Vec<Self::Config>>;

    fn get_config_attrib(
        &self,
        display: Self::Display,
        config: Self::Config,
        attribute: i32,
    ) -> Result<i32>;

    fn create_context(
        &self,
        display: Self::Display,
        config: Self::Config,
        attribs: &[i32],
    ) -> Result<Self::Context>;

    /// Window surface on the native framebuffer window
    fn create_window_surface(
        &self,
        display: Self::Display,
        config: Self::Config,
    ) -> Result<Self::Surface>;

    fn destroy_context(&self, display: Self::Display, context: Self::Context) -> Result<()>;

    fn destroy_surface(&self, display: Self::Display, surface: Self::Surface) -> Result<()>;

    /// Bind `surface` for draw and read with `context`; `None` for both detaches
    fn make_current(
        &self,
        display: Self::Display,
        surface: Option<Self::Surface>,
        context: Option<Self::Context>,
    ) -> Result<()>;

    fn swap_buffers(&self, display: Self::Display, surface: Self::Surface) -> Result<()>;

    fn swap_interval(&self, display: Self::Display, interval: i32) -> Result<()>;

    fn wait_gl(&self) -> Result<()>;

    fn get_proc_address(&self, name: &str) -> Option<*const c_void>;
}

/// Platform EGL loaded through `khronos-egl`
pub struct KhronosEgl {
    instance: egl::DynamicInstance<egl::EGL1_4>,
}

impl KhronosEgl {
    /// Load `libEGL` from the system library path
    pub fn load() -> Result<Self> {
        let instance = unsafe { egl::DynamicInstance::<egl::EGL1_4>::load_required() }
            .map_err(|e| Error::Egl(format!("failed to load EGL: {:?}", e)))?;
        info!("Loaded EGL library");
        Ok(Self { instance })
    }

    /// Load EGL from a specific library file
    pub fn load_from(path: &Path) -> Result<Self> {
        let instance =
            unsafe { egl::DynamicInstance::<egl::EGL1_4>::load_required_from_filename(path) }
                .map_err(|e| {
                    Error::Egl(format!("failed to load EGL from {}: {:?}", path.display(), e))
                })?;
        info!("Loaded EGL library from {}", path.display());
        Ok(Self { instance })
    }
}

impl EglApi for KhronosEgl {
    type Display = egl::Display;
    type Config = egl::Config;
    type Context = egl::Context;
    type Surface = egl::Surface;

    fn get_display(&self) -> Option<egl::Display> {
        unsafe { self.instance.get_display(egl::DEFAULT_DISPLAY) }
    }

    fn initialize(&self, display: egl::Display) -> Result<(i32, i32)> {
        self.instance
            .initialize(display)
            .map_err(|e| Error::egl("eglInitialize", e))
    }

    fn terminate(&self, display: egl::Display) -> Result<()> {
        self.instance
            .terminate(display)
            .map_err(|e| Error::egl("eglTerminate", e))
    }

    fn choose_config(
        &self,
        display: egl::Display,
        attribs: &[i32],
        max: usize,
    ) -> Result<Vec<egl::Config>> {
        let mut configs = Vec::with_capacity(max);
        self.instance
            .choose_config(display, attribs, &mut configs)
            .map_err(|e| Error::egl("eglChooseConfig", e))?;
        Ok(configs)
    }

    fn get_config_attrib(
        &self,
        display: egl::Display,
        config: egl::Config,
        attribute: i32,
    ) -> Result<i32> {
        self.instance
            .get_config_attrib(display, config, attribute)
            .map_err(|e| Error::egl("eglGetConfigAttrib", e))
    }

    fn create_context(
        &self,
        display: egl::Display,
        config: egl::Config,
        attribs: &[i32],
    ) -> Result<egl::Context> {
        self.instance
            .create_context(display, config, None, attribs)
            .map_err(|e| Error::egl("eglCreateContext", e))
    }

    fn create_window_surface(
        &self,
        display: egl::Display,
        config: egl::Config,
    ) -> Result<egl::Surface> {
        // The framebuffer driver exposes a single native window, handle 0
        let native_window = std::ptr::null_mut::<c_void>() as egl::NativeWindowType;
        unsafe {
            self.instance
                .create_window_surface(display, config, native_window, None)
        }
        .map_err(|e| Error::egl("eglCreateWindowSurface", e))
    }

    fn destroy_context(&self, display: egl::Display, context: egl::Context) -> Result<()> {
        self.instance
            .destroy_context(display, context)
            .map_err(|e| Error::egl("eglDestroyContext", e))
    }

    fn destroy_surface(&self, display: egl::Display, surface: egl::Surface) -> Result<()> {
        self.instance
            .destroy_surface(display, surface)
            .map_err(|e| Error::egl("eglDestroySurface", e))
    }

    fn make_current(
        &self,
        display: egl::Display,
        surface: Option<egl::Surface>,
        context: Option<egl::Context>,
    ) -> Result<()> {
        self.instance
            .make_current(display, surface, surface, context)
            .map_err(|e| Error::egl("eglMakeCurrent", e))
    }

    fn swap_buffers(&self, display: egl::Display, surface: egl::Surface) -> Result<()> {
        self.instance
            .swap_buffers(display, surface)
            .map_err(|e| Error::egl("eglSwapBuffers", e))
    }

    fn swap_interval(&self, display: egl::Display, interval: i32) -> Result<()> {
        self.instance
            .swap_interval(display, interval)
            .map_err(|e| Error::egl("eglSwapInterval", e))
    }

    fn wait_gl(&self) -> Result<()> {
        self.instance
            .wait_gl()
            .map_err(|e| Error::egl("eglWaitGL", e))
    }

    fn get_proc_address(&self, name: &str) -> Option<*const c_void> {
        self.instance
            .get_proc_address(name)
            .map(|f| f as *const c_void)
    }
}
