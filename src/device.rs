//! Dreambox device context and window lifecycle
//!
//! One [`DreamboxDevice`] owns the shared EGL display and the per-window
//! EGL state. Window states move through
//! `Unrealized -> DisplayBound -> ContextCreated <-> Current -> Destroyed`.
//! A window's context and surface are always created and destroyed as a
//! pair. The display is only terminated when the device itself goes away.

use crate::config::{AlphaControl, BackendConfig};
use crate::driver::{Bootstrap, VideoDriver};
use crate::egl::{EglApi, KhronosEgl};
use crate::egl_config::{self, ConfigRequest};
use crate::gl::{self, GlLibrary};
use crate::host::{
    DisplayMode, GlAttributes, Host, SysWmInfo, VideoDisplay, Window, WindowId, HOST_VERSION,
};
use crate::{framebuffer, osd, stb, Error, Result};
use khronos_egl as egl;
use std::collections::HashMap;
use std::os::raw::c_void;
use std::path::Path;
use tracing::{debug, error, info, warn};

pub const BOOTSTRAP: Bootstrap = Bootstrap {
    name: "dreambox",
    description: "Dreambox Video Driver",
};

/// Whether this box is one the backend can drive
pub fn available(config: &BackendConfig) -> bool {
    match stb::probe_model(&config.model_path, &config.supported_models) {
        Some(model) => {
            info!("Dreambox available: {}", model);
            true
        }
        None => false,
    }
}

/// Load the configuration, probe the hardware and load EGL
pub fn create() -> Result<DreamboxDevice<KhronosEgl>> {
    create_with(BackendConfig::load()?)
}

pub fn create_with(config: BackendConfig) -> Result<DreamboxDevice<KhronosEgl>> {
    debug!("create");
    if !available(&config) {
        return Err(Error::Unavailable);
    }

    let egl = match &config.egl_library {
        Some(path) => KhronosEgl::load_from(path)?,
        None => KhronosEgl::load()?,
    };
    Ok(DreamboxDevice::new(config, egl))
}

/// One stage of presenting a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapStep {
    /// `glFinish`, which many applications never call themselves
    Finish,
    WaitGl,
    WaitForVsync,
    SwapBuffers,
}

/// Stages run for a buffer swap, in order
pub fn swap_steps(gl_loaded: bool, vsync: bool) -> Vec<SwapStep> {
    let mut steps = Vec::with_capacity(4);
    if gl_loaded {
        steps.push(SwapStep::Finish);
    }
    steps.push(SwapStep::WaitGl);
    if vsync {
        steps.push(SwapStep::WaitForVsync);
    }
    steps.push(SwapStep::SwapBuffers);
    steps
}

/// Lifecycle state of one window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// No EGL involvement (plain window)
    Unrealized,
    /// Holds a reference on the shared EGL display
    DisplayBound,
    /// Has a context/surface pair that is not current
    ContextCreated,
    /// Its context/surface pair is bound
    Current,
    Destroyed,
}

struct WindowData<E: EglApi> {
    uses_gles: bool,
    state: WindowState,
    config: Option<E::Config>,
    context: Option<E::Context>,
    surface: Option<E::Surface>,
}

impl<E: EglApi> WindowData<E> {
    fn new(uses_gles: bool) -> Self {
        Self {
            uses_gles,
            state: if uses_gles {
                WindowState::DisplayBound
            } else {
                WindowState::Unrealized
            },
            config: None,
            context: None,
            surface: None,
        }
    }
}

/// The device context: one per backend instance
pub struct DreamboxDevice<E: EglApi> {
    config: BackendConfig,
    egl: E,
    egl_display: Option<E::Display>,
    egl_refcount: u32,
    windows: HashMap<WindowId, WindowData<E>>,
    current: Option<WindowId>,
    swap_interval: i32,
    gl_library: Option<GlLibrary>,
}

impl<E: EglApi> DreamboxDevice<E> {
    pub fn new(config: BackendConfig, egl: E) -> Self {
        Self {
            config,
            egl,
            egl_display: None,
            egl_refcount: 0,
            windows: HashMap::new(),
            current: None,
            swap_interval: 0,
            gl_library: None,
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn window_state(&self, window: WindowId) -> Option<WindowState> {
        self.windows.get(&window).map(|data| data.state)
    }

    /// Number of OpenGL windows holding the EGL display
    pub fn egl_refcount(&self) -> u32 {
        self.egl_refcount
    }

    pub fn is_display_bound(&self) -> bool {
        self.egl_display.is_some()
    }

    pub fn current_window(&self) -> Option<WindowId> {
        self.current
    }

    /// Get and initialize the shared EGL display on first use
    fn bind_display(&mut self) -> Result<E::Display> {
        if let Some(display) = self.egl_display {
            return Ok(display);
        }

        let display = self
            .egl
            .get_display()
            .ok_or_else(|| Error::Egl("can't get connection to OpenGL ES".into()))?;
        let (major, minor) = self.egl.initialize(display)?;
        info!("EGL initialized: {}.{}", major, minor);

        self.egl_display = Some(display);
        Ok(display)
    }

    fn display(&self) -> Result<E::Display> {
        self.egl_display
            .ok_or_else(|| Error::Egl("EGL display is not initialized, no OpenGL ES support".into()))
    }

    /// Move the "current" marker to `window`, demoting the previous holder
    fn mark_current(&mut self, window: Option<WindowId>) {
        if let Some(previous) = self.current.take() {
            if let Some(data) = self.windows.get_mut(&previous) {
                if data.state == WindowState::Current {
                    data.state = WindowState::ContextCreated;
                }
            }
        }
        if let Some(id) = window {
            if let Some(data) = self.windows.get_mut(&id) {
                data.state = WindowState::Current;
            }
        }
        self.current = window;
    }

    /// Destroy a window's surface and context, detaching them first if
    /// they are current. Keeps going after a failure and reports the first.
    fn release_window_gl(&mut self, window: WindowId) -> Result<()> {
        let display = match self.egl_display {
            Some(display) => display,
            None => return Ok(()),
        };
        let data = match self.windows.get_mut(&window) {
            Some(data) => data,
            None => return Err(Error::UnknownWindow(window)),
        };

        let surface = data.surface.take();
        let context = data.context.take();
        data.config = None;
        if data.uses_gles {
            data.state = WindowState::DisplayBound;
        }

        let mut first_error = None;
        if self.current == Some(window) {
            if let Err(e) = self.egl.make_current(display, None, None) {
                first_error.get_or_insert(e);
            }
            self.current = None;
        }
        if let Some(surface) = surface {
            if let Err(e) = self.egl.destroy_surface(display, surface) {
                first_error.get_or_insert(e);
            }
        }
        if let Some(context) = context {
            if let Err(e) = self.egl.destroy_context(display, context) {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn set_plane_alpha(&self, level: u8) {
        let result = match self.config.alpha_control {
            AlphaControl::Procfs => stb::set_alpha(&self.config.alpha_path, level),
            AlphaControl::Osd => osd::set_global_alpha(&self.config.framebuffer, level),
        };
        if let Err(e) = result {
            warn!("Failed to set OSD alpha {}: {}", level, e);
        }
    }

    /// Release every EGL object and the display itself
    fn teardown(&mut self) {
        let ids: Vec<WindowId> = self.windows.keys().copied().collect();
        for id in ids {
            if let Err(e) = self.release_window_gl(id) {
                warn!("Failed to release EGL objects of {:?}: {}", id, e);
            }
        }
        self.windows.clear();
        self.egl_refcount = 0;

        if let Some(display) = self.egl_display.take() {
            match self.egl.terminate(display) {
                Ok(()) => info!("EGL display terminated"),
                Err(e) => warn!("Failed to terminate EGL display: {}", e),
            }
        }

        self.gl_library = None;
    }
}

impl<E: EglApi> VideoDriver for DreamboxDevice<E> {
    type Context = E::Context;

    fn video_init(&mut self, host: &mut dyn Host) -> Result<()> {
        debug!("videoinit");

        let mode = self.config.display_mode();

        if let Err(e) = stb::set_video_mode(&self.config.video_mode_path, &self.config.video_mode) {
            warn!("Failed to set video mode {}: {}", self.config.video_mode, e);
        }
        if let Err(e) = framebuffer::set_resolution(&self.config.framebuffer, mode.width, mode.height)
        {
            warn!("Failed to set framebuffer resolution: {}", e);
        }

        info!(
            "Display mode: {}x{} @ {}Hz",
            mode.width, mode.height, mode.refresh_rate
        );
        host.add_video_display(VideoDisplay {
            desktop_mode: mode.clone(),
            current_mode: mode,
        });
        Ok(())
    }

    fn video_quit(&mut self) {
        debug!("videoquit");
        self.teardown();
    }

    fn get_display_modes(&self, display: &VideoDisplay) -> Vec<DisplayMode> {
        vec![display.current_mode.clone()]
    }

    fn set_display_mode(&mut self, _display: &VideoDisplay, mode: &DisplayMode) -> Result<()> {
        debug!("setdisplaymode {}x{}", mode.width, mode.height);
        Ok(())
    }

    fn create_window(&mut self, host: &mut dyn Host, window: &Window) -> Result<()> {
        debug!("createwindow {:?}", window.id);

        if self.windows.contains_key(&window.id) {
            return Err(Error::WindowExists(window.id));
        }

        let uses_gles = window.wants_gl();
        if uses_gles {
            self.bind_display()?;
            self.egl_refcount += 1;
        }
        self.windows.insert(window.id, WindowData::new(uses_gles));

        // The remote control only routes to the keyboard; mouse focus is
        // left alone.
        host.set_keyboard_focus(Some(window.id));
        Ok(())
    }

    fn create_window_from(&mut self, _window: &Window, _data: *const c_void) -> Result<()> {
        Err(Error::Unsupported("creating a window from a native handle"))
    }

    fn show_window(&mut self, window: &Window) {
        debug!("showwindow {:?}", window.id);
        self.set_plane_alpha(stb::ALPHA_OPAQUE);
    }

    fn hide_window(&mut self, window: &Window) {
        debug!("hidewindow {:?}", window.id);
        self.set_plane_alpha(stb::ALPHA_TRANSPARENT);
    }

    fn destroy_window(&mut self, window: WindowId) {
        debug!("destroywindow {:?}", window);

        if !self.windows.contains_key(&window) {
            warn!("Destroying unknown window {:?}", window);
            return;
        }
        if let Err(e) = self.release_window_gl(window) {
            warn!("Failed to release EGL objects of {:?}: {}", window, e);
        }
        if let Some(mut data) = self.windows.remove(&window) {
            if data.uses_gles {
                self.egl_refcount = self.egl_refcount.saturating_sub(1);
            }
            data.state = WindowState::Destroyed;
            debug!("Window {:?} is now {:?}", window, data.state);
        }
    }

    fn get_window_wm_info(&self, _window: WindowId, info: &mut SysWmInfo) -> Result<()> {
        if info.version.major <= HOST_VERSION.major {
            Ok(())
        } else {
            Err(Error::VersionMismatch {
                major: HOST_VERSION.major,
                minor: HOST_VERSION.minor,
            })
        }
    }

    fn gl_load_library(&mut self, path: Option<&Path>) -> Result<()> {
        let path = gl::resolve_library_path(
            path,
            |name| std::env::var(name).ok(),
            &self.config.gl_library,
        );
        self.gl_library = Some(GlLibrary::open(&path)?);
        self.pump_events();
        Ok(())
    }

    fn gl_get_proc_address(&self, name: &str) -> Option<*const c_void> {
        debug!("gl_getprocaddress {}", name);
        self.egl
            .get_proc_address(name)
            .or_else(|| self.gl_library.as_ref()?.symbol(name))
    }

    fn gl_unload_library(&mut self) {
        self.gl_library = None;
    }

    fn gl_create_context(
        &mut self,
        window: WindowId,
        attrs: &mut GlAttributes,
    ) -> Result<E::Context> {
        debug!("createcontext {:?}", window);

        let display = self.display()?;
        let data = self
            .windows
            .get(&window)
            .ok_or(Error::UnknownWindow(window))?;
        if !data.uses_gles {
            return Err(Error::NotOpenGl(window));
        }
        if data.context.is_some() {
            return Err(Error::Unsupported("more than one OpenGL ES context per window"));
        }

        let request = ConfigRequest::from(&*attrs);
        let selection = egl_config::select_config(&self.egl, display, &request)?;

        let context_attribs = [egl::CONTEXT_CLIENT_VERSION, attrs.major_version.max(1), egl::NONE];
        let context = self
            .egl
            .create_context(display, selection.config, &context_attribs)?;

        let surface = match self.egl.create_window_surface(display, selection.config) {
            Ok(surface) => surface,
            Err(e) => {
                error!("eglCreateWindowSurface failed: {}", e);
                if let Err(e) = self.egl.destroy_context(display, context) {
                    warn!("Failed to destroy orphaned context: {}", e);
                }
                return Err(e);
            }
        };

        if let Err(e) = self.egl.make_current(display, Some(surface), Some(context)) {
            error!("Can't set OpenGL ES context on creation: {}", e);
            if let Err(e) = self.egl.destroy_surface(display, surface) {
                warn!("Failed to destroy surface: {}", e);
            }
            if let Err(e) = self.egl.destroy_context(display, context) {
                warn!("Failed to destroy context: {}", e);
            }
            return Err(e);
        }

        if let Some(data) = self.windows.get_mut(&window) {
            data.config = Some(selection.config);
            data.context = Some(context);
            data.surface = Some(surface);
            data.state = WindowState::ContextCreated;
        }
        self.mark_current(Some(window));

        attrs.accelerated = Some(true);
        // OpenGL ES has no stereo, and the framebuffer output is single
        // buffered from the client's point of view
        attrs.stereo = false;
        attrs.double_buffer = false;
        selection.granted.apply(attrs);

        info!("Created OpenGL ES context for {:?}", window);
        Ok(context)
    }

    fn gl_make_current(
        &mut self,
        window: Option<WindowId>,
        context: Option<E::Context>,
    ) -> Result<()> {
        debug!("makecurrent {:?}", window);

        match (window, context) {
            (None, None) => {
                let display = match self.egl_display {
                    Some(display) => display,
                    None => return Ok(()),
                };
                self.egl.make_current(display, None, None)?;
                self.mark_current(None);
                Ok(())
            }
            (Some(id), context) => {
                let display = self.display()?;
                let data = self.windows.get(&id).ok_or(Error::UnknownWindow(id))?;
                let surface = data.surface.ok_or(Error::NoSurface)?;
                let own = data.context.ok_or(Error::NoContext)?;
                if context != Some(own) {
                    return Err(Error::ContextMismatch);
                }

                self.egl.make_current(display, Some(surface), Some(own))?;
                self.mark_current(Some(id));
                Ok(())
            }
            (None, Some(_)) => Err(Error::ContextMismatch),
        }
    }

    fn gl_set_swap_interval(&mut self, interval: i32) -> Result<()> {
        debug!("setswapinterval {}", interval);
        let display = self.display()?;
        self.egl.swap_interval(display, interval)?;
        self.swap_interval = interval;
        Ok(())
    }

    fn gl_get_swap_interval(&self) -> i32 {
        self.swap_interval
    }

    fn gl_swap_window(&mut self, window: WindowId) -> Result<()> {
        let display = self.display()?;
        let surface = self
            .windows
            .get(&window)
            .ok_or(Error::UnknownWindow(window))?
            .surface
            .ok_or(Error::NoSurface)?;

        for step in swap_steps(self.gl_library.is_some(), self.config.vsync) {
            match step {
                SwapStep::Finish => {
                    if let Some(library) = &self.gl_library {
                        library.finish();
                    }
                }
                SwapStep::WaitGl => {
                    if let Err(e) = self.egl.wait_gl() {
                        warn!("eglWaitGL failed: {}", e);
                    }
                }
                SwapStep::WaitForVsync => {
                    if let Err(e) = framebuffer::wait_for_vsync(&self.config.framebuffer) {
                        warn!("Failed to wait for vsync: {}", e);
                    }
                }
                SwapStep::SwapBuffers => self.egl.swap_buffers(display, surface)?,
            }
        }
        Ok(())
    }

    fn gl_delete_context(&mut self, context: E::Context) -> Result<()> {
        debug!("deletecontext");

        let display = match self.egl_display {
            Some(display) => display,
            None => return Ok(()),
        };

        let owner = self
            .windows
            .iter()
            .find(|(_, data)| data.context == Some(context))
            .map(|(id, _)| *id);

        match owner {
            Some(id) => self.release_window_gl(id),
            None => {
                warn!("Deleting an OpenGL ES context no window owns");
                self.egl.destroy_context(display, context)
            }
        }
    }

    fn pump_events(&mut self) {
        // Input is read by the host's evdev layer
    }
}

impl<E: EglApi> Drop for DreamboxDevice<E> {
    fn drop(&mut self) {
        debug!("destroy");
        self.teardown();
    }
}
