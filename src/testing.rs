//! Test doubles: an in-memory EGL and a recording host

use crate::egl::EglApi;
use crate::host::{Host, VideoDisplay, WindowId};
use crate::{Error, Result};
use khronos_egl as egl;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::os::raw::c_void;
use std::rc::Rc;
use tempfile::TempDir;

pub const MOCK_DISPLAY: u32 = 1;

/// Fresh, empty directory removed when the guard drops
pub fn scratch_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("dreambox-video-")
        .tempdir()
        .expect("create scratch dir")
}

/// One configuration offered by the mock platform
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub id: u32,
    pub attrs: HashMap<i32, i32>,
}

impl MockConfig {
    pub fn rgba(id: u32, r: i32, g: i32, b: i32, a: i32, depth: i32, stencil: i32) -> Self {
        let attrs = HashMap::from([
            (egl::SURFACE_TYPE, egl::WINDOW_BIT),
            (egl::RED_SIZE, r),
            (egl::GREEN_SIZE, g),
            (egl::BLUE_SIZE, b),
            (egl::ALPHA_SIZE, a),
            (egl::BUFFER_SIZE, r + g + b + a),
            (egl::DEPTH_SIZE, depth),
            (egl::STENCIL_SIZE, stencil),
        ]);
        Self { id, attrs }
    }

    pub fn with(mut self, attribute: i32, value: i32) -> Self {
        self.attrs.insert(attribute, value);
        self
    }

    /// EGL matching rules: sizes are minimums, the surface type is a mask
    fn matches(&self, attribs: &[i32]) -> bool {
        attribs
            .chunks_exact(2)
            .take_while(|pair| pair[0] != egl::NONE)
            .all(|pair| {
                let (attribute, wanted) = (pair[0], pair[1]);
                let have = self.attrs.get(&attribute).copied().unwrap_or(0);
                if wanted == egl::DONT_CARE {
                    true
                } else if attribute == egl::SURFACE_TYPE {
                    have & wanted == wanted
                } else {
                    have >= wanted
                }
            })
    }
}

#[derive(Default)]
struct MockInner {
    configs: RefCell<Vec<MockConfig>>,
    queries: RefCell<Vec<Vec<i32>>>,
    calls: RefCell<Vec<&'static str>>,
    failing: RefCell<HashSet<&'static str>>,
    no_display: Cell<bool>,
    next_handle: Cell<u32>,
    contexts: RefCell<HashSet<u32>>,
    surfaces: RefCell<HashSet<u32>>,
    current: Cell<Option<(u32, u32)>>,
    initialized: Cell<u32>,
    terminated: Cell<u32>,
    swaps: Cell<u32>,
    swap_interval: Cell<Option<i32>>,
}

/// In-memory EGL; clones share state so tests can inspect after handing
/// one clone to the device
#[derive(Clone, Default)]
pub struct MockEgl {
    inner: Rc<MockInner>,
}

impl MockEgl {
    pub fn with_configs(configs: Vec<MockConfig>) -> Self {
        let mock = Self::default();
        *mock.inner.configs.borrow_mut() = configs;
        mock.inner.next_handle.set(100);
        mock
    }

    /// Make every subsequent call of the named EGL function fail
    pub fn fail(&self, call: &'static str) {
        self.inner.failing.borrow_mut().insert(call);
    }

    pub fn recover(&self, call: &'static str) {
        self.inner.failing.borrow_mut().remove(call);
    }

    pub fn set_no_display(&self, value: bool) {
        self.inner.no_display.set(value);
    }

    pub fn queries(&self) -> Vec<Vec<i32>> {
        self.inner.queries.borrow().clone()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.inner.calls.borrow().clone()
    }

    pub fn live_contexts(&self) -> usize {
        self.inner.contexts.borrow().len()
    }

    pub fn live_surfaces(&self) -> usize {
        self.inner.surfaces.borrow().len()
    }

    /// (surface, context) currently bound
    pub fn current(&self) -> Option<(u32, u32)> {
        self.inner.current.get()
    }

    pub fn initialized(&self) -> u32 {
        self.inner.initialized.get()
    }

    pub fn terminated(&self) -> u32 {
        self.inner.terminated.get()
    }

    pub fn swaps(&self) -> u32 {
        self.inner.swaps.get()
    }

    pub fn swap_interval(&self) -> Option<i32> {
        self.inner.swap_interval.get()
    }

    fn enter(&self, call: &'static str) -> Result<()> {
        self.inner.calls.borrow_mut().push(call);
        if self.inner.failing.borrow().contains(call) {
            return Err(Error::egl(call, "injected failure"));
        }
        Ok(())
    }

    fn handle(&self) -> u32 {
        let handle = self.inner.next_handle.get();
        self.inner.next_handle.set(handle + 1);
        handle
    }
}

impl EglApi for MockEgl {
    type Display = u32;
    type Config = u32;
    type Context = u32;
    type Surface = u32;

    fn get_display(&self) -> Option<u32> {
        self.inner.calls.borrow_mut().push("eglGetDisplay");
        (!self.inner.no_display.get()).then_some(MOCK_DISPLAY)
    }

    fn initialize(&self, _display: u32) -> Result<(i32, i32)> {
        self.enter("eglInitialize")?;
        self.inner.initialized.set(self.inner.initialized.get() + 1);
        Ok((1, 4))
    }

    fn terminate(&self, _display: u32) -> Result<()> {
        self.enter("eglTerminate")?;
        self.inner.terminated.set(self.inner.terminated.get() + 1);
        Ok(())
    }

    fn choose_config(&self, _display: u32, attribs: &[i32], max: usize) -> Result<Vec<u32>> {
        self.inner.queries.borrow_mut().push(attribs.to_vec());
        self.enter("eglChooseConfig")?;
        Ok(self
            .inner
            .configs
            .borrow()
            .iter()
            .filter(|config| config.matches(attribs))
            .take(max)
            .map(|config| config.id)
            .collect())
    }

    fn get_config_attrib(&self, _display: u32, config: u32, attribute: i32) -> Result<i32> {
        self.enter("eglGetConfigAttrib")?;
        self.inner
            .configs
            .borrow()
            .iter()
            .find(|c| c.id == config)
            .map(|c| c.attrs.get(&attribute).copied().unwrap_or(0))
            .ok_or_else(|| Error::egl("eglGetConfigAttrib", "bad config"))
    }

    fn create_context(&self, _display: u32, _config: u32, _attribs: &[i32]) -> Result<u32> {
        self.enter("eglCreateContext")?;
        let handle = self.handle();
        self.inner.contexts.borrow_mut().insert(handle);
        Ok(handle)
    }

    fn create_window_surface(&self, _display: u32, _config: u32) -> Result<u32> {
        self.enter("eglCreateWindowSurface")?;
        let handle = self.handle();
        self.inner.surfaces.borrow_mut().insert(handle);
        Ok(handle)
    }

    fn destroy_context(&self, _display: u32, context: u32) -> Result<()> {
        self.enter("eglDestroyContext")?;
        if !self.inner.contexts.borrow_mut().remove(&context) {
            return Err(Error::egl("eglDestroyContext", "bad context"));
        }
        Ok(())
    }

    fn destroy_surface(&self, _display: u32, surface: u32) -> Result<()> {
        self.enter("eglDestroySurface")?;
        if !self.inner.surfaces.borrow_mut().remove(&surface) {
            return Err(Error::egl("eglDestroySurface", "bad surface"));
        }
        Ok(())
    }

    fn make_current(&self, _display: u32, surface: Option<u32>, context: Option<u32>) -> Result<()> {
        self.enter("eglMakeCurrent")?;
        match (surface, context) {
            (Some(s), Some(c)) => self.inner.current.set(Some((s, c))),
            (None, None) => self.inner.current.set(None),
            _ => return Err(Error::egl("eglMakeCurrent", "bad match")),
        }
        Ok(())
    }

    fn swap_buffers(&self, _display: u32, surface: u32) -> Result<()> {
        self.enter("eglSwapBuffers")?;
        if !self.inner.surfaces.borrow().contains(&surface) {
            return Err(Error::egl("eglSwapBuffers", "bad surface"));
        }
        self.inner.swaps.set(self.inner.swaps.get() + 1);
        Ok(())
    }

    fn swap_interval(&self, _display: u32, interval: i32) -> Result<()> {
        self.enter("eglSwapInterval")?;
        self.inner.swap_interval.set(Some(interval));
        Ok(())
    }

    fn wait_gl(&self) -> Result<()> {
        self.enter("eglWaitGL")
    }

    fn get_proc_address(&self, _name: &str) -> Option<*const c_void> {
        None
    }
}

/// Host that remembers what the backend told it
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub displays: Vec<VideoDisplay>,
    pub keyboard_focus: Option<WindowId>,
    pub mouse_focus_calls: usize,
}

impl Host for RecordingHost {
    fn add_video_display(&mut self, display: VideoDisplay) {
        self.displays.push(display);
    }

    fn set_keyboard_focus(&mut self, window: Option<WindowId>) {
        self.keyboard_focus = window;
    }

    fn set_mouse_focus(&mut self, _window: Option<WindowId>) {
        self.mouse_focus_calls += 1;
    }
}
