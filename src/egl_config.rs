//! EGL framebuffer configuration negotiation
//!
//! The platform is first asked for an exact match of the requested color,
//! depth, stencil and multisample sizes. If nothing matches, the color sizes
//! are dropped and depth/stencil are walked down through fixed candidate
//! lists until some configuration turns up. Among the returned candidates
//! the first one that really carries the requested depth and stencil
//! buffers wins.

use crate::egl::EglApi;
use crate::host::GlAttributes;
use crate::{Error, Result};
use khronos_egl as egl;
use tracing::{debug, info};

/// Configurations requested per `eglChooseConfig` call
pub const CONFIG_QUERY_LIMIT: usize = 1;

/// Depth sizes tried by the relaxed search, in order of preference
pub const DEPTH_FALLBACK: [i32; 4] = [32, 24, 16, egl::DONT_CARE];

/// The relaxed search walks stencil sizes from this value down to 0
pub const STENCIL_FALLBACK_MAX: i32 = 16;

/// Framebuffer attributes requested for a new context
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigRequest {
    pub red_size: i32,
    pub green_size: i32,
    pub blue_size: i32,
    pub alpha_size: i32,
    pub buffer_size: i32,
    pub depth_size: i32,
    pub stencil_size: i32,
    pub samples: i32,
    pub sample_buffers: i32,
}

impl From<&GlAttributes> for ConfigRequest {
    fn from(attrs: &GlAttributes) -> Self {
        Self {
            red_size: attrs.red_size,
            green_size: attrs.green_size,
            blue_size: attrs.blue_size,
            alpha_size: attrs.alpha_size,
            buffer_size: attrs.buffer_size,
            depth_size: attrs.depth_size,
            stencil_size: attrs.stencil_size,
            samples: attrs.multisample_samples,
            sample_buffers: attrs.multisample_buffers,
        }
    }
}

/// `EGL_NONE`-terminated attribute list under construction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttribList(Vec<i32>);

impl AttribList {
    pub fn push(&mut self, attribute: i32, value: i32) -> &mut Self {
        self.0.push(attribute);
        self.0.push(value);
        self
    }

    /// Terminated list, ready for `eglChooseConfig`
    pub fn finish(mut self) -> Vec<i32> {
        self.0.push(egl::NONE);
        self.0
    }

    /// Value set for `attribute`, if any
    pub fn get(&self, attribute: i32) -> Option<i32> {
        self.0
            .chunks_exact(2)
            .find(|pair| pair[0] == attribute)
            .map(|pair| pair[1])
    }
}

/// Attributes actually provided by the chosen configuration
///
/// `None` means the attribute could not be read back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrantedAttributes {
    pub depth_size: Option<i32>,
    pub stencil_size: Option<i32>,
    pub samples: Option<i32>,
    pub sample_buffers: Option<i32>,
}

impl GrantedAttributes {
    /// Write the granted values into the host attribute block
    pub fn apply(&self, attrs: &mut GlAttributes) {
        if let Some(samples) = self.samples {
            attrs.multisample_samples = samples;
        }
        if let Some(buffers) = self.sample_buffers {
            attrs.multisample_buffers = buffers;
        }
        if let Some(depth) = self.depth_size {
            attrs.depth_size = depth;
        }
        if let Some(stencil) = self.stencil_size {
            attrs.stencil_size = stencil;
        }
    }
}

/// Result of a successful negotiation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection<C> {
    pub config: C,
    /// Position of `config` among the candidates the platform returned
    pub index: usize,
    pub granted: GrantedAttributes,
}

fn or_dont_care(value: i32) -> i32 {
    if value != 0 {
        value
    } else {
        egl::DONT_CARE
    }
}

/// Attribute list for the first, exact query
pub fn exact_attributes(request: &ConfigRequest) -> AttribList {
    let mut list = AttribList::default();
    list.push(egl::SURFACE_TYPE, egl::WINDOW_BIT)
        .push(egl::RED_SIZE, request.red_size)
        .push(egl::GREEN_SIZE, request.green_size)
        .push(egl::BLUE_SIZE, request.blue_size)
        .push(egl::ALPHA_SIZE, or_dont_care(request.alpha_size))
        .push(egl::BUFFER_SIZE, or_dont_care(request.buffer_size))
        .push(egl::DEPTH_SIZE, or_dont_care(request.depth_size))
        .push(egl::STENCIL_SIZE, or_dont_care(request.stencil_size));

    if request.samples != 0 {
        list.push(egl::SAMPLES, request.samples);
    }
    if request.sample_buffers != 0 {
        list.push(egl::SAMPLE_BUFFERS, request.sample_buffers);
    }
    list
}

/// Attribute list for one step of the relaxed search
pub fn relaxed_attributes(depth: i32, stencil: i32) -> AttribList {
    let mut list = AttribList::default();
    list.push(egl::SURFACE_TYPE, egl::WINDOW_BIT)
        .push(egl::RED_SIZE, egl::DONT_CARE)
        .push(egl::GREEN_SIZE, egl::DONT_CARE)
        .push(egl::BLUE_SIZE, egl::DONT_CARE)
        .push(egl::ALPHA_SIZE, egl::DONT_CARE)
        .push(egl::BUFFER_SIZE, egl::DONT_CARE)
        .push(egl::DEPTH_SIZE, depth)
        .push(egl::STENCIL_SIZE, stencil)
        .push(egl::SAMPLES, egl::DONT_CARE)
        .push(egl::SAMPLE_BUFFERS, egl::DONT_CARE);
    list
}

/// (depth, stencil) pairs of the relaxed search: depth outer, stencil inner
///
/// A size that was not requested stays `EGL_DONT_CARE` throughout.
pub fn fallback_candidates(request: &ConfigRequest) -> impl Iterator<Item = (i32, i32)> {
    let want_depth = request.depth_size != 0;
    let want_stencil = request.stencil_size != 0;

    DEPTH_FALLBACK.into_iter().flat_map(move |depth| {
        (0..=STENCIL_FALLBACK_MAX).rev().map(move |stencil| {
            (
                if want_depth { depth } else { egl::DONT_CARE },
                if want_stencil { stencil } else { egl::DONT_CARE },
            )
        })
    })
}

/// Negotiate a configuration for `request`
pub fn select_config<E: EglApi>(
    egl: &E,
    display: E::Display,
    request: &ConfigRequest,
) -> Result<Selection<E::Config>> {
    let exact = exact_attributes(request).finish();
    let mut candidates = egl.choose_config(display, &exact, CONFIG_QUERY_LIMIT)?;

    if candidates.is_empty() {
        debug!("No exact EGL config for {:?}, relaxing constraints", request);
        candidates = relaxed_search(egl, display, request)?;
    }

    let index = pick_best(egl, display, &candidates, request);
    let config = candidates[index];
    let granted = query_granted(egl, display, config);

    info!(
        "Chose EGL config {} of {}: depth={:?} stencil={:?} samples={:?}",
        index,
        candidates.len(),
        granted.depth_size,
        granted.stencil_size,
        granted.samples
    );

    Ok(Selection {
        config,
        index,
        granted,
    })
}

fn relaxed_search<E: EglApi>(
    egl: &E,
    display: E::Display,
    request: &ConfigRequest,
) -> Result<Vec<E::Config>> {
    for (depth, stencil) in fallback_candidates(request) {
        let attribs = relaxed_attributes(depth, stencil).finish();
        let found = egl.choose_config(display, &attribs, CONFIG_QUERY_LIMIT)?;
        if !found.is_empty() {
            debug!("Relaxed EGL config found at depth={} stencil={}", depth, stencil);
            return Ok(found);
        }
    }
    Err(Error::NoMatchingConfiguration)
}

/// Index of the first candidate with the requested depth and stencil
/// buffers present, or 0 if none has both
pub fn pick_best<E: EglApi>(
    egl: &E,
    display: E::Display,
    candidates: &[E::Config],
    request: &ConfigRequest,
) -> usize {
    let present = |config: E::Config, attribute: i32| {
        egl.get_config_attrib(display, config, attribute)
            .map(|value| value != 0)
            .unwrap_or(false)
    };

    candidates
        .iter()
        .position(|&config| {
            let stencil_found = request.stencil_size == 0 || present(config, egl::STENCIL_SIZE);
            let depth_found = request.depth_size == 0 || present(config, egl::DEPTH_SIZE);
            stencil_found && depth_found
        })
        .unwrap_or(0)
}

fn query_granted<E: EglApi>(egl: &E, display: E::Display, config: E::Config) -> GrantedAttributes {
    let read = |attribute| egl.get_config_attrib(display, config, attribute).ok();
    GrantedAttributes {
        depth_size: read(egl::DEPTH_SIZE),
        stencil_size: read(egl::STENCIL_SIZE),
        samples: read(egl::SAMPLES),
        sample_buffers: read(egl::SAMPLE_BUFFERS),
    }
}
