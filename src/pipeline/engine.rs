use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::{
    config::Config,
    error::{BatchError, Result, SlicerError},
    pipeline::{
        discovery::{clip_output_path, discover_inputs, ensure_output_dir, output_collisions},
        report::{BatchReport, EncodeOutcome, Stage, VideoFailure, VideoReport},
        scheduler::SegmentScheduler,
    },
    reframe::{fps::repair_fps, normalize_fps, reframe_for_vertical},
    video::{ClipHandle, EncodeRequest, MediaEngine, OpenClip, Segment},
};

/// Drives the per-video pipeline over a batch of inputs
///
/// For every video:
/// 1. Open - read stream metadata, repair the frame rate
/// 2. Reframe - smart-crop to the target ratio and bound the size
/// 3. Schedule - split the duration into bounded segments
/// 4. Encode - write each segment in order, retrying once without audio
///    when the encoder rejects the parameters
///
/// A failure in any stage aborts that video only.
pub struct SlicingEngine<E: MediaEngine> {
    config: Config,
    engine: E,
    scheduler: SegmentScheduler,
}

impl<E: MediaEngine> SlicingEngine<E> {
    /// Create an engine; the configuration is validated here
    pub fn new(config: Config, engine: E) -> Result<Self> {
        config.validate()?;
        let scheduler = SegmentScheduler::from_config(&config.segments)?;
        debug!(
            "Clip lengths {:.1}-{:.1}s, output {}x{} max",
            scheduler.min_len(),
            scheduler.max_len(),
            config.reframe.max_width,
            config.reframe.max_height
        );
        Ok(Self {
            config,
            engine,
            scheduler,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn media(&self) -> &E {
        &self.engine
    }

    /// Discover inputs in the configured folder and process all of them
    pub fn run(&self) -> Result<BatchReport> {
        info!("Media engine: {}", self.engine.name());
        let inputs = discover_inputs(&self.config.paths.input_dir, &self.config.paths.extensions)?;
        self.process_inputs(&inputs)
    }

    /// Process the given inputs, in parallel if configured
    ///
    /// Errors here are only about the batch itself; per-video failures are
    /// recorded in the report.
    pub fn process_inputs(&self, inputs: &[PathBuf]) -> Result<BatchReport> {
        let jobs = self.config.batch.effective_jobs().min(inputs.len()).max(1);

        let claimed = output_collisions(inputs);
        let process = |(path, claimed_by): (&PathBuf, &Option<PathBuf>)| match claimed_by {
            Some(earlier) => Err(self.reject_collision(path, earlier)),
            None => self.process_logged(path),
        };

        let results: Vec<_> = if jobs > 1 {
            info!("Processing {} videos with {} workers", inputs.len(), jobs);
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .map_err(|e| BatchError::PoolFailed { reason: e.to_string() })?;
            pool.install(|| inputs.par_iter().zip(claimed.par_iter()).map(process).collect())
        } else {
            inputs.iter().zip(claimed.iter()).map(process).collect()
        };

        let report = BatchReport { results };
        report.log_summary();
        Ok(report)
    }

    /// Fail a video whose clip names are already taken by an earlier input
    fn reject_collision(&self, path: &Path, earlier: &Path) -> VideoFailure {
        let source = BatchError::OutputCollision {
            input: path.display().to_string(),
            claimed_by: earlier.display().to_string(),
        };
        error!("Skipping {}: {}", path.display(), source);
        VideoFailure::new(path, Stage::Output, source.into())
    }

    fn process_logged(&self, path: &Path) -> std::result::Result<VideoReport, VideoFailure> {
        let result = self.process_video(path);
        if let Err(failure) = &result {
            error!("Error processing video {}: {}", path.display(), failure);
        }
        result
    }

    /// Run the whole pipeline for one source video
    ///
    /// The source is closed on every path out of this function.
    pub fn process_video(&self, path: &Path) -> std::result::Result<VideoReport, VideoFailure> {
        let fail = |stage: Stage| move |e: SlicerError| VideoFailure::new(path, stage, e);

        info!("Starting to process video: {}", path.display());
        let opened = OpenClip::open(&self.engine, path).map_err(fail(Stage::Open))?;

        let clip = normalize_fps(opened.clip().clone(), Some(self.config.reframe.default_fps));
        debug!(
            "Video loaded successfully. Duration: {:.2} seconds, FPS: {:.3}, Size: {}x{}",
            clip.duration,
            clip.fps.unwrap_or_default(),
            clip.width,
            clip.height
        );

        let vertical = reframe_for_vertical(&self.engine, clip.clone(), &self.config.reframe)
            .map_err(fail(Stage::Reframe))?;
        debug!(
            "Video formatted for vertical output. New size: {}x{}, FPS: {:.3}",
            vertical.width,
            vertical.height,
            vertical.fps.unwrap_or_default()
        );

        let dry_run = self.config.batch.dry_run;
        let output_dir = &self.config.paths.output_dir;
        if !dry_run {
            ensure_output_dir(output_dir).map_err(fail(Stage::Output))?;
        }

        let segments = self.scheduler.schedule(vertical.duration);
        if segments.is_empty() {
            warn!("{} has no duration; nothing to write", path.display());
        }

        let mut clips = Vec::with_capacity(segments.len());
        for (i, &segment) in segments.iter().enumerate() {
            let index = i + 1;
            let output = clip_output_path(output_dir, path, index, &self.config.encoding.container);
            debug!(
                "Clip {}: Start time: {:.2}, Duration: {:.2}",
                index,
                segment.start,
                segment.duration()
            );

            let outcome = if dry_run {
                info!("[dry run] Would write clip {} to {}", index, output.display());
                EncodeOutcome {
                    path: output,
                    segment,
                    attempts: 0,
                    audio_dropped: false,
                }
            } else {
                self.encode_segment(&vertical, segment, index, output)
                    .map_err(fail(Stage::Encode(index)))?
            };
            clips.push(outcome);
        }

        info!("Finished processing video: {}", path.display());
        Ok(VideoReport {
            input: path.to_path_buf(),
            source_size: clip.size(),
            output_size: vertical.size(),
            duration: vertical.duration,
            fps: repair_fps(vertical.fps, None),
            segments,
            clips,
            dry_run,
        })
    }

    /// Encode one segment, falling back to an audio-less encode once
    fn encode_segment(
        &self,
        clip: &ClipHandle,
        segment: Segment,
        index: usize,
        output: PathBuf,
    ) -> Result<EncodeOutcome> {
        let sub = normalize_fps(clip.subclip(segment.start, segment.end), clip.fps);
        let fps = repair_fps(sub.fps, clip.fps);
        debug!(
            "Clip attributes: Duration: {:.2}, Size: {}x{}, FPS: {:.3}",
            sub.duration, sub.width, sub.height, fps
        );

        let request = EncodeRequest::new(segment, self.config.encoding.clone().with_fps(fps));
        let plan = request.attempt_plan();

        info!("Writing clip {} to {}", index, output.display());
        let started = Instant::now();
        let mut attempt = 0;
        loop {
            let params = &plan[attempt];
            match self
                .engine
                .encode_range(clip, segment.start, segment.end, &output, params)
            {
                Ok(()) => {
                    debug!(
                        "Clip {} written in {:.1}s ({} attempt{})",
                        index,
                        started.elapsed().as_secs_f64(),
                        attempt + 1,
                        if attempt == 0 { "" } else { "s" }
                    );
                    return Ok(EncodeOutcome {
                        path: output,
                        segment,
                        attempts: attempt + 1,
                        audio_dropped: request.params.has_audio() && !params.has_audio(),
                    });
                }
                Err(e) if e.is_parameter_incompatibility() && attempt + 1 < plan.len() => {
                    error!("Encoder rejected parameters for clip {}: {}", index, e);
                    warn!("Attempting to write clip {} without audio...", index);
                    attempt += 1;
                }
                Err(e) => {
                    error!("Failed to write clip {} after {} attempt(s): {}", index, attempt + 1, e);
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EncodeErrorKind;
    use crate::video::engine::testing::ScriptedEngine;
    use crate::video::Frame;
    use tempfile::{tempdir, TempDir};

    fn config_in(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.paths.input_dir = dir.path().join("Unedited");
        config.paths.output_dir = dir.path().join("Edited");
        config
    }

    fn vertical_clip(duration: f64, fps: Option<f64>) -> ClipHandle {
        ClipHandle::new("template", 1080, 1920, duration, fps)
    }

    fn output_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_segments_written_in_order_with_numbered_names() {
        let dir = tempdir().unwrap();
        let engine = ScriptedEngine::new(vertical_clip(32.0, None));
        let slicer = SlicingEngine::new(config_in(&dir), engine).unwrap();

        let report = slicer.process_video(Path::new("Unedited/IMG_0001.MOV")).unwrap();

        assert_eq!(report.segments, vec![Segment::new(0.0, 15.0), Segment::new(15.0, 32.0)]);
        assert_eq!(output_files(&dir.path().join("Edited")), vec!["IMG_0001_clip_1.mp4", "IMG_0001_clip_2.mp4"]);

        let attempts = slicer.media().attempts();
        assert_eq!(attempts.len(), 2);
        assert_eq!((attempts[0].start, attempts[0].end), (0.0, 15.0));
        assert_eq!((attempts[1].start, attempts[1].end), (15.0, 32.0));
        // Missing rate was repaired and carried into every encode
        assert!(attempts.iter().all(|a| a.fps == Some(30.0) && a.with_audio));
        assert_eq!(slicer.media().close_count(), 1);
    }

    #[test]
    fn test_parameter_failure_retries_without_audio() {
        let dir = tempdir().unwrap();
        let engine = ScriptedEngine::new(vertical_clip(10.0, Some(25.0)))
            .failing_encodes([EncodeErrorKind::ParameterIncompatibility]);
        let slicer = SlicingEngine::new(config_in(&dir), engine).unwrap();

        let report = slicer.process_video(Path::new("Unedited/a.mov")).unwrap();

        assert_eq!(report.clips.len(), 1);
        assert_eq!(report.clips[0].attempts, 2);
        assert!(report.clips[0].audio_dropped);
        assert_eq!(output_files(&dir.path().join("Edited")), vec!["a_clip_1.mp4"]);

        let attempts = slicer.media().attempts();
        assert_eq!(attempts.len(), 2);
        assert!(attempts[0].with_audio);
        assert!(!attempts[1].with_audio);
        assert_eq!(attempts[1].fps, Some(25.0));
    }

    #[test]
    fn test_other_encode_failure_is_not_retried() {
        let dir = tempdir().unwrap();
        let engine = ScriptedEngine::new(vertical_clip(40.0, Some(30.0)))
            .failing_encodes([EncodeErrorKind::Other]);
        let slicer = SlicingEngine::new(config_in(&dir), engine).unwrap();

        let failure = slicer.process_video(Path::new("Unedited/a.mov")).unwrap_err();

        assert_eq!(failure.stage, Stage::Encode(1));
        assert_eq!(slicer.media().attempts().len(), 1);
        assert_eq!(slicer.media().close_count(), 1);
    }

    #[test]
    fn test_retry_happens_at_most_once() {
        let dir = tempdir().unwrap();
        let engine = ScriptedEngine::new(vertical_clip(10.0, Some(30.0))).failing_encodes([
            EncodeErrorKind::ParameterIncompatibility,
            EncodeErrorKind::ParameterIncompatibility,
        ]);
        let slicer = SlicingEngine::new(config_in(&dir), engine).unwrap();

        let failure = slicer.process_video(Path::new("Unedited/a.mov")).unwrap_err();

        assert!(failure.source.is_parameter_incompatibility());
        assert_eq!(slicer.media().attempts().len(), 2);
        assert!(output_files(&dir.path().join("Edited")).is_empty());
    }

    #[test]
    fn test_failed_reframe_still_closes_clip() {
        let dir = tempdir().unwrap();
        // Wide source and no frame to sample
        let engine = ScriptedEngine::new(ClipHandle::new("template", 1920, 1080, 10.0, Some(30.0)));
        let slicer = SlicingEngine::new(config_in(&dir), engine).unwrap();

        let failure = slicer.process_video(Path::new("Unedited/a.mov")).unwrap_err();

        assert_eq!(failure.stage, Stage::Reframe);
        assert_eq!(slicer.media().open_count(), 1);
        assert_eq!(slicer.media().close_count(), 1);
    }

    #[test]
    fn test_wide_source_is_cropped_before_encoding() {
        let dir = tempdir().unwrap();
        let engine = ScriptedEngine::new(ClipHandle::new("template", 1280, 720, 5.0, Some(30.0)))
            .with_frame(Frame::new_filled(1280, 720, [40, 40, 40]));
        let slicer = SlicingEngine::new(config_in(&dir), engine).unwrap();

        let report = slicer.process_video(Path::new("Unedited/a.mp4")).unwrap();

        assert_eq!(report.source_size, (1280, 720));
        assert_eq!(report.output_size, (405, 720));
        assert_eq!(slicer.media().attempts()[0].size, (405, 720));
    }

    #[test]
    fn test_one_bad_video_does_not_stop_the_batch() {
        let dir = tempdir().unwrap();
        let mut engine = ScriptedEngine::new(vertical_clip(20.0, Some(30.0)));
        engine.unreadable.push(PathBuf::from("Unedited/broken.mov"));
        let slicer = SlicingEngine::new(config_in(&dir), engine).unwrap();

        let inputs = vec![
            PathBuf::from("Unedited/broken.mov"),
            PathBuf::from("Unedited/good.mov"),
        ];
        let report = slicer.process_inputs(&inputs).unwrap();

        assert_eq!(report.results.len(), 2);
        let failure = report.results[0].as_ref().unwrap_err();
        assert_eq!(failure.stage, Stage::Open);
        assert_eq!(report.results[1].as_ref().unwrap().clips.len(), 2);
        assert_eq!(report.clips_written(), 2);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = tempdir().unwrap();
        let mut config = config_in(&dir);
        config.batch.dry_run = true;
        let slicer = SlicingEngine::new(config, ScriptedEngine::new(vertical_clip(32.0, Some(30.0)))).unwrap();

        let report = slicer.process_video(Path::new("Unedited/a.mov")).unwrap();

        assert_eq!(report.clips.len(), 2);
        assert!(report.clips.iter().all(|c| c.attempts == 0));
        assert!(slicer.media().attempts().is_empty());
        assert!(!dir.path().join("Edited").exists());
    }

    #[test]
    fn test_zero_length_video_produces_no_clips() {
        let dir = tempdir().unwrap();
        let slicer = SlicingEngine::new(config_in(&dir), ScriptedEngine::new(vertical_clip(0.0, Some(30.0)))).unwrap();

        let report = slicer.process_video(Path::new("Unedited/a.mov")).unwrap();

        assert!(report.segments.is_empty());
        assert!(report.clips.is_empty());
    }

    #[test]
    fn test_run_discovers_and_processes_in_parallel() {
        let dir = tempdir().unwrap();
        let mut config = config_in(&dir);
        config.batch.parallel_jobs = 2;
        std::fs::create_dir(&config.paths.input_dir).unwrap();
        for name in ["c.mov", "a.MP4", "b.mov", "readme.txt"] {
            std::fs::write(config.paths.input_dir.join(name), b"").unwrap();
        }

        let slicer = SlicingEngine::new(config, ScriptedEngine::new(vertical_clip(4.0, Some(30.0)))).unwrap();
        let report = slicer.run().unwrap();

        let inputs: Vec<String> = report
            .succeeded()
            .map(|v| v.input.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(inputs, vec!["a.MP4", "b.mov", "c.mov"]);
        assert_eq!(
            output_files(&dir.path().join("Edited")),
            vec!["a_clip_1.mp4", "b_clip_1.mp4", "c_clip_1.mp4"]
        );
        assert_eq!(slicer.media().close_count(), 3);
    }

    #[test]
    fn test_inputs_sharing_a_stem_do_not_overwrite_each_other() {
        let dir = tempdir().unwrap();
        let mut config = config_in(&dir);
        config.batch.parallel_jobs = 2;
        std::fs::create_dir(&config.paths.input_dir).unwrap();
        for name in ["a.mov", "a.MP4", "b.mov"] {
            std::fs::write(config.paths.input_dir.join(name), b"").unwrap();
        }

        let slicer = SlicingEngine::new(config, ScriptedEngine::new(vertical_clip(4.0, Some(30.0)))).unwrap();
        let report = slicer.run().unwrap();

        assert_eq!(report.clips_written(), 2);
        assert_eq!(
            output_files(&dir.path().join("Edited")),
            vec!["a_clip_1.mp4", "b_clip_1.mp4"]
        );

        let failures: Vec<_> = report.failed().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].input.file_name().unwrap(), "a.mov");
        assert_eq!(failures[0].stage, Stage::Output);
        // The rejected video is never opened
        assert_eq!(slicer.media().open_count(), 2);
    }

    #[test]
    fn test_missing_input_dir_fails_the_run() {
        let dir = tempdir().unwrap();
        let slicer = SlicingEngine::new(config_in(&dir), ScriptedEngine::new(vertical_clip(4.0, None))).unwrap();
        assert!(slicer.run().is_err());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = tempdir().unwrap();
        let mut config = config_in(&dir);
        config.segments.max_len = 1.0;
        assert!(SlicingEngine::new(config, ScriptedEngine::new(vertical_clip(4.0, None))).is_err());
    }
}
