//! OpenGL ES client library loading

use crate::ffi::GlFinishFn;
use crate::{Error, Result};
use std::ffi::{CStr, CString};
use std::os::raw::c_void;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variables consulted, in order, when no path is given
pub const LIBRARY_ENV_VARS: [&str; 2] = ["SDL_OPENGL_LIBRARY", "SDL_OPENGLES_LIBRARY"];

/// Pick the GLES library: explicit path, then the environment, then `default`
pub fn resolve_library_path<F>(explicit: Option<&Path>, lookup_env: F, default: &Path) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    LIBRARY_ENV_VARS
        .iter()
        .find_map(|name| lookup_env(name).filter(|value| !value.is_empty()))
        .map(PathBuf::from)
        .unwrap_or_else(|| default.to_path_buf())
}

/// A `dlopen`ed libGLESv2
pub struct GlLibrary {
    handle: *mut c_void,
    path: PathBuf,
    finish: Option<GlFinishFn>,
}

impl GlLibrary {
    pub fn open(path: &Path) -> Result<Self> {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| Error::Library(format!("invalid path {}", path.display())))?;

        let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_GLOBAL) };
        if handle.is_null() {
            return Err(Error::Library(format!(
                "failed to load {}: {}",
                path.display(),
                last_dl_error()
            )));
        }

        let mut library = Self {
            handle,
            path: path.to_path_buf(),
            finish: None,
        };
        library.finish = library
            .symbol("glFinish")
            .map(|f| unsafe { std::mem::transmute::<*const c_void, GlFinishFn>(f) });

        info!("Loaded OpenGL ES library {}", path.display());
        Ok(library)
    }

    /// Look up an exported symbol
    pub fn symbol(&self, name: &str) -> Option<*const c_void> {
        let c_name = CString::new(name).ok()?;
        let sym = unsafe { libc::dlsym(self.handle, c_name.as_ptr()) };
        if sym.is_null() {
            None
        } else {
            Some(sym as *const c_void)
        }
    }

    /// `glFinish()`, if the library exports it
    pub fn finish(&self) {
        if let Some(finish) = self.finish {
            unsafe { finish() };
        }
    }
}

impl Drop for GlLibrary {
    fn drop(&mut self) {
        debug!("Unloading OpenGL ES library {}", self.path.display());
        unsafe { libc::dlclose(self.handle) };
    }
}

fn last_dl_error() -> String {
    let err = unsafe { libc::dlerror() };
    if err.is_null() {
        "unknown error".to_string()
    } else {
        unsafe { CStr::from_ptr(err) }.to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_explicit_path_wins() {
        let path = resolve_library_path(
            Some(Path::new("/opt/gles/libGLESv2.so")),
            |_| Some("/from/env.so".to_string()),
            Path::new("/usr/lib/libGLESv2.so"),
        );
        assert_eq!(path, PathBuf::from("/opt/gles/libGLESv2.so"));
    }

    #[test]
    fn test_resolve_env_order() {
        let path = resolve_library_path(
            None,
            |name| match name {
                "SDL_OPENGL_LIBRARY" => None,
                "SDL_OPENGLES_LIBRARY" => Some("/es/libGLESv2.so".to_string()),
                _ => None,
            },
            Path::new("/usr/lib/libGLESv2.so"),
        );
        assert_eq!(path, PathBuf::from("/es/libGLESv2.so"));

        let path = resolve_library_path(
            None,
            |_| Some("/gl/first.so".to_string()),
            Path::new("/usr/lib/libGLESv2.so"),
        );
        assert_eq!(path, PathBuf::from("/gl/first.so"));
    }

    #[test]
    fn test_resolve_default() {
        let path = resolve_library_path(None, |_| None, Path::new("/usr/lib/libGLESv2.so"));
        assert_eq!(path, PathBuf::from("/usr/lib/libGLESv2.so"));
    }

    #[test]
    fn test_open_missing_library() {
        let err = GlLibrary::open(Path::new("/nonexistent/libGLESv2.so")).err().unwrap();
        assert!(matches!(err, Error::Library(_)));
    }
}
