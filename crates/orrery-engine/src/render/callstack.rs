//! Assembly and execution of the render callstack.
//!
//! The callstack is a flat list of [`RenderStage`]s built per frame from the
//! enabled effects. Execution is a recursive walk: a stage receives the
//! slice after itself and may run it any number of times.

use crate::viewer::TransparencyMode;

use super::rendering::RenderingContext;
use super::stage::{RenderStage, Rest};

/// Which optional stages a frame needs.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct CallstackOptions {
    pub pixel_buffer: bool,
    pub antialias: u32,
    pub depth_of_field: f64,
    pub stereo: bool,
    pub transparency: TransparencyMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderCallstack {
    stages: Vec<RenderStage>,
}

impl RenderCallstack {
    pub fn assemble(opts: &CallstackOptions) -> Self {
        let mut stages = Vec::with_capacity(11);
        if opts.pixel_buffer {
            stages.push(RenderStage::PixelBuffer);
        }
        stages.push(RenderStage::InitialiseMatrices);
        if opts.antialias > 1 {
            stages.push(RenderStage::Antialias);
        }
        if opts.depth_of_field > 0.0 {
            stages.push(RenderStage::DepthOfField);
        }
        stages.push(RenderStage::Layers);
        stages.push(RenderStage::Background);
        stages.push(RenderStage::ModelviewLightsClipPlanes);
        if opts.stereo {
            stages.push(RenderStage::Stereo);
        }
        if opts.transparency != TransparencyMode::Fast {
            stages.push(RenderStage::Transparency(opts.transparency));
        }
        stages.push(RenderStage::ApplyProjection);
        stages.push(RenderStage::ExecuteScene);
        Self { stages }
    }

    #[inline]
    pub fn stages(&self) -> &[RenderStage] {
        &self.stages
    }

    /// Runs the whole callstack once.
    pub fn execute(&self, rc: &mut RenderingContext<'_>) -> bool {
        call_next(&self.stages, rc)
    }
}

/// Runs the first of `stages`, handing it the remainder.
pub(crate) fn call_next(stages: &[RenderStage], rc: &mut RenderingContext<'_>) -> bool {
    match stages.split_first() {
        Some((stage, rest)) => stage.run(rc, Rest(rest)),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_callstack() {
        let cs = RenderCallstack::assemble(&CallstackOptions::default());
        assert_eq!(
            cs.stages(),
            [
                RenderStage::InitialiseMatrices,
                RenderStage::Layers,
                RenderStage::Background,
                RenderStage::ModelviewLightsClipPlanes,
                RenderStage::ApplyProjection,
                RenderStage::ExecuteScene,
            ]
        );
    }

    #[test]
    fn every_option_in_fixed_order() {
        let cs = RenderCallstack::assemble(&CallstackOptions {
            pixel_buffer: true,
            antialias: 4,
            depth_of_field: 2.0,
            stereo: true,
            transparency: TransparencyMode::Slow,
        });
        assert_eq!(
            cs.stages(),
            [
                RenderStage::PixelBuffer,
                RenderStage::InitialiseMatrices,
                RenderStage::Antialias,
                RenderStage::DepthOfField,
                RenderStage::Layers,
                RenderStage::Background,
                RenderStage::ModelviewLightsClipPlanes,
                RenderStage::Stereo,
                RenderStage::Transparency(TransparencyMode::Slow),
                RenderStage::ApplyProjection,
                RenderStage::ExecuteScene,
            ]
        );
    }

    #[test]
    fn single_sample_antialias_adds_no_stage() {
        for antialias in [0, 1] {
            let cs = RenderCallstack::assemble(&CallstackOptions { antialias, ..Default::default() });
            assert!(!cs.stages().contains(&RenderStage::Antialias));
        }
    }
}
