//! Turns sections of alternate takes into playable segment groups.
//!
//! Every section with at least one track becomes one group. For each track a
//! take is drawn at random from the items that have a file, so each rebuild is
//! a fresh remix of the arrangement. Inside a group every segment starts
//! `overlap` seconds before its predecessor ends; the first starts at zero.
//!
//! Decoding dominates build time, so the selected takes of a section are
//! analysed in parallel and stitched back together in track order.

use super::section::{AudioSource, Section};
use super::segment::{Segment, group_end_time};
use super::waveform::analyze_file;
use crate::constants::{DEFAULT_RMS_FRAMES_PER_SECOND, OVERLAP_SECONDS};
use crate::error::TrackError;
use crate::media::{FileSystemAccess, Lease, LocationAccess};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use std::sync::Arc;

/// The segments built from one section, in track order
#[derive(Debug, Clone, Default)]
pub struct SegmentGroup {
    pub title: String,
    pub segments: Vec<Segment>,
}

impl SegmentGroup {
    pub fn new(title: impl Into<String>, segments: Vec<Segment>) -> Self {
        Self {
            title: title.into(),
            segments,
        }
    }

    /// The last segment's end, or 0 when the group is empty
    pub fn end_time(&self) -> f64 {
        group_end_time(&self.segments)
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

pub struct TimelineBuilder {
    rms_frames_per_second: f64,
    overlap_seconds: f64,
    access: Arc<dyn LocationAccess>,
    rng: StdRng,
}

/// Duration and RMS of one analysed take
struct Analysis {
    source: Arc<AudioSource>,
    duration_seconds: f64,
    rms_values: Vec<f32>,
}

impl Default for TimelineBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_RMS_FRAMES_PER_SECOND)
    }
}

impl TimelineBuilder {
    pub fn new(rms_frames_per_second: f64) -> Self {
        Self {
            rms_frames_per_second,
            overlap_seconds: OVERLAP_SECONDS,
            access: Arc::new(FileSystemAccess),
            rng: StdRng::from_entropy(),
        }
    }

    /// Make take selection repeatable
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_overlap(mut self, overlap_seconds: f64) -> Self {
        self.overlap_seconds = overlap_seconds.max(0.0);
        self
    }

    pub fn with_access(mut self, access: Arc<dyn LocationAccess>) -> Self {
        self.access = access;
        self
    }

    pub fn rms_frames_per_second(&self) -> f64 {
        self.rms_frames_per_second
    }

    pub fn overlap_seconds(&self) -> f64 {
        self.overlap_seconds
    }

    pub fn access(&self) -> &Arc<dyn LocationAccess> {
        &self.access
    }

    /// Build one segment group per non-empty section.
    ///
    /// Tracks whose file cannot be accessed or decoded are skipped; the next
    /// track chains from the last segment that was built.
    pub fn build(&mut self, sections: &[Section]) -> Vec<SegmentGroup> {
        let mut groups = Vec::new();

        for section in sections {
            if section.tracks.is_empty() {
                continue;
            }

            let picks = self.pick_takes(section);
            let this = &*self;
            let analyses: Vec<Result<Analysis, TrackError>> = picks
                .par_iter()
                .map(|source| this.analyze_take(source))
                .collect();

            let mut group: Vec<Segment> = Vec::with_capacity(analyses.len());
            for (source, analysis) in picks.iter().zip(analyses) {
                let analysis = match analysis {
                    Ok(analysis) => analysis,
                    Err(e) => {
                        log::warn!(
                            "Skipping '{}' in section '{}': {e}",
                            source.display_name,
                            section.title
                        );
                        continue;
                    }
                };

                let playback_start_time = group
                    .last()
                    .map(|previous| previous.playback_end_time() - self.overlap_seconds)
                    .unwrap_or(0.0);

                match Segment::whole_file(
                    analysis.source,
                    analysis.duration_seconds,
                    playback_start_time,
                    analysis.rms_values,
                    self.rms_frames_per_second,
                ) {
                    Ok(segment) => group.push(segment),
                    Err(e) => log::warn!("Skipping '{}': {e}", source.display_name),
                }
            }

            log::info!(
                "Section '{}': {} of {} tracks ready",
                section.title,
                group.len(),
                section.tracks.len()
            );
            groups.push(SegmentGroup::new(section.title.clone(), group));
        }

        groups
    }

    /// One take per track that has any file assigned, in track order
    fn pick_takes(&mut self, section: &Section) -> Vec<Arc<AudioSource>> {
        section
            .tracks
            .iter()
            .filter_map(|track| {
                let candidates = track.populated();
                match candidates.len() {
                    0 => {
                        log::debug!("Track {} has no file assigned", track.id);
                        None
                    }
                    1 => Some(Arc::clone(candidates[0])),
                    _ => candidates.choose(&mut self.rng).map(|s| Arc::clone(*s)),
                }
            })
            .collect()
    }

    fn analyze_take(&self, source: &Arc<AudioSource>) -> Result<Analysis, TrackError> {
        let _lease = Lease::acquire(&self.access, &source.location)?;
        let waveform = analyze_file(&source.location, self.rms_frames_per_second)?;
        Ok(Analysis {
            source: Arc::clone(source),
            duration_seconds: waveform.duration_seconds,
            rms_values: waveform.rms_values,
        })
    }
}
