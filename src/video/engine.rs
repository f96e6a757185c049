use std::path::Path;

use tracing::debug;

use crate::{
    error::Result,
    video::{encoding::EncodeParams, types::{ClipHandle, Frame}},
};

/// Decode/encode backend the pipeline talks to
///
/// Implementations must be usable from several threads at once when videos
/// are processed in parallel; each call works on its own clip.
pub trait MediaEngine: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Open a source file and read its stream metadata
    fn open(&self, path: &Path) -> Result<ClipHandle>;

    /// Decode the frame shown at `timestamp` seconds, after the clip's transforms
    fn get_frame(&self, clip: &ClipHandle, timestamp: f64) -> Result<Frame>;

    /// Encode `[start, end)` of the clip to `output`
    fn encode_range(
        &self,
        clip: &ClipHandle,
        start: f64,
        end: f64,
        output: &Path,
        params: &EncodeParams,
    ) -> Result<()>;

    /// Release anything held for the clip
    fn close(&self, clip: &ClipHandle) {
        let _ = clip;
    }
}

/// An opened clip that is closed when dropped
pub struct OpenClip<'a, E: MediaEngine + ?Sized> {
    engine: &'a E,
    clip: ClipHandle,
}

impl<'a, E: MediaEngine + ?Sized> OpenClip<'a, E> {
    pub fn open(engine: &'a E, path: &Path) -> Result<Self> {
        let clip = engine.open(path)?;
        Ok(Self { engine, clip })
    }

    pub fn clip(&self) -> &ClipHandle {
        &self.clip
    }
}

impl<E: MediaEngine + ?Sized> Drop for OpenClip<'_, E> {
    fn drop(&mut self) {
        debug!("Closing {}", self.clip.source.display());
        self.engine.close(&self.clip);
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedEngine;
    use super::*;

    #[test]
    fn test_open_clip_closes_on_drop() {
        let engine = ScriptedEngine::new(ClipHandle::new("x", 1920, 1080, 10.0, Some(30.0)));
        {
            let opened = OpenClip::open(&engine, Path::new("a.mov")).unwrap();
            assert_eq!(opened.clip().source, Path::new("a.mov"));
            assert_eq!(engine.close_count(), 0);
        }
        assert_eq!(engine.open_count(), 1);
        assert_eq!(engine.close_count(), 1);
    }

    #[test]
    fn test_failed_open_does_not_close() {
        let mut engine = ScriptedEngine::new(ClipHandle::new("x", 1920, 1080, 10.0, Some(30.0)));
        engine.unreadable.push("bad.mov".into());

        assert!(OpenClip::open(&engine, Path::new("bad.mov")).is_err());
        assert_eq!(engine.close_count(), 0);
    }
}
