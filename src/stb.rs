//! Set-top box control files under `/proc/stb`
//!
//! Each call opens, writes and closes the file; no handle is kept.

use crate::Result;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// The model file is read the way the firmware tools do: one short line
const MODEL_READ_LIMIT: u64 = 32;

pub const ALPHA_OPAQUE: u8 = 255;
pub const ALPHA_TRANSPARENT: u8 = 0;

/// Read the box model and check it against the supported prefixes
///
/// Returns the trimmed model name on a match, `None` when the file is
/// missing or the model is not supported.
pub fn probe_model(path: &Path, supported: &[String]) -> Option<String> {
    let mut raw = String::new();
    File::open(path)
        .and_then(|f| f.take(MODEL_READ_LIMIT).read_to_string(&mut raw))
        .ok()?;

    let model = raw.lines().next().unwrap_or("").trim();
    if supported.iter().any(|prefix| model.starts_with(prefix.as_str())) {
        debug!("Dreambox model detected: {}", model);
        Some(model.to_string())
    } else {
        debug!("Unsupported model: {:?}", model);
        None
    }
}

/// Select the output video mode, e.g. `"1080p"`
pub fn set_video_mode(path: &Path, mode: &str) -> Result<()> {
    debug!("Setting video mode {}", mode);
    std::fs::write(path, mode)?;
    Ok(())
}

/// Set the OSD alpha level; 255 shows the graphics plane, 0 hides it
pub fn set_alpha(path: &Path, level: u8) -> Result<()> {
    debug!("Setting OSD alpha {}", level);
    std::fs::write(path, level.to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::scratch_dir;
    use crate::Error;

    fn supported() -> Vec<String> {
        vec!["dm820".into(), "dm900".into(), "dm7080".into()]
    }

    #[test]
    fn test_probe_supported_model() {
        let dir = scratch_dir();
        let path = dir.path().join("model");
        std::fs::write(&path, "dm900\n").unwrap();
        assert_eq!(probe_model(&path, &supported()), Some("dm900".to_string()));
    }

    #[test]
    fn test_probe_prefix_match() {
        let dir = scratch_dir();
        let path = dir.path().join("model");
        std::fs::write(&path, "dm7080hd\nsecond line\n").unwrap();
        assert_eq!(probe_model(&path, &supported()), Some("dm7080hd".to_string()));
    }

    #[test]
    fn test_probe_unsupported_or_missing() {
        let dir = scratch_dir();
        let path = dir.path().join("model");
        std::fs::write(&path, "dm500hd\n").unwrap();
        assert_eq!(probe_model(&path, &supported()), None);
        assert_eq!(probe_model(&dir.path().join("absent"), &supported()), None);
    }

    #[test]
    fn test_write_mode_and_alpha() {
        let dir = scratch_dir();
        let mode = dir.path().join("videomode");
        let alpha = dir.path().join("alpha");

        set_video_mode(&mode, "1080p").unwrap();
        set_alpha(&alpha, ALPHA_OPAQUE).unwrap();
        assert_eq!(std::fs::read_to_string(&mode).unwrap(), "1080p");
        assert_eq!(std::fs::read_to_string(&alpha).unwrap(), "255");

        set_alpha(&alpha, ALPHA_TRANSPARENT).unwrap();
        assert_eq!(std::fs::read_to_string(&alpha).unwrap(), "0");
    }

    #[test]
    fn test_write_missing_directory() {
        let dir = scratch_dir();
        let err = set_alpha(&dir.path().join("no/such/alpha"), 255).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
