//! Stroke state machine: pointer down → moves → exactly one end.

use glam::Vec2;

use crate::exposure::ExposureId;
use crate::mask::Mask;
use crate::mask::brush::{self, BrushSettings, Tool};

/// A stroke in progress.
#[derive(Debug, Clone)]
struct ActiveStroke {
    exposure: ExposureId,
    tool: Tool,
    last: Vec2,
    stamps: usize,
}

/// Summary of a stroke that has just ended.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedStroke {
    pub exposure: ExposureId,
    pub tool: Tool,
    pub stamps: usize,
}

/// Tracks the single active stroke and stamps incrementally as the pointer moves.
#[derive(Debug, Default)]
pub struct StrokeRecorder {
    active: Option<ActiveStroke>,
}

impl StrokeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a stroke is currently being painted.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Exposure targeted by the active stroke.
    pub fn target(&self) -> Option<&ExposureId> {
        self.active.as_ref().map(|s| &s.exposure)
    }

    /// Pointer down: start a stroke and stamp the first point.
    ///
    /// Returns `false` (and does nothing) if a stroke is already active.
    pub fn begin(
        &mut self,
        exposure: ExposureId,
        tool: Tool,
        position: Vec2,
        mask: &mut Mask,
        brush: &BrushSettings,
    ) -> bool {
        if self.active.is_some() {
            return false;
        }
        brush::stamp(mask, position, brush, tool);
        self.active = Some(ActiveStroke {
            exposure,
            tool,
            last: position,
            stamps: 1,
        });
        true
    }

    /// Pointer move: stamp along the segment from the previous sample.
    ///
    /// Returns the number of stamps applied; 0 when no stroke is active.
    pub fn extend(&mut self, position: Vec2, mask: &mut Mask, brush: &BrushSettings) -> usize {
        let Some(stroke) = self.active.as_mut() else {
            return 0;
        };
        let applied = brush::stamp_segment(mask, stroke.last, position, brush, stroke.tool);
        if applied > 0 {
            stroke.last = position;
            stroke.stamps += applied;
        }
        applied
    }

    /// Pointer up, leave or cancel. Yields the finished stroke exactly once.
    pub fn finish(&mut self) -> Option<FinishedStroke> {
        self.active.take().map(|s| FinishedStroke {
            exposure: s.exposure,
            tool: s.tool,
            stamps: s.stamps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stroke_ends_exactly_once() {
        let mut mask = Mask::new(16, 16);
        let brush = BrushSettings::default();
        let mut recorder = StrokeRecorder::new();

        assert!(recorder.begin("a".into(), Tool::Dodge, Vec2::new(4.0, 4.0), &mut mask, &brush));
        recorder.extend(Vec2::new(12.0, 4.0), &mut mask, &brush);

        let finished = recorder.finish().expect("first end commits");
        assert_eq!(finished.exposure, ExposureId::from("a"));
        assert!(finished.stamps > 1);
        assert!(recorder.finish().is_none(), "second end must be a no-op");
    }

    #[test]
    fn test_second_begin_is_ignored_while_active() {
        let mut mask = Mask::new(16, 16);
        let brush = BrushSettings::default();
        let mut recorder = StrokeRecorder::new();
        assert!(recorder.begin("a".into(), Tool::Dodge, Vec2::ZERO, &mut mask, &brush));
        assert!(!recorder.begin("b".into(), Tool::Erase, Vec2::ZERO, &mut mask, &brush));
        assert_eq!(recorder.target(), Some(&ExposureId::from("a")));
    }

    #[test]
    fn test_extend_without_stroke_does_nothing() {
        let mut mask = Mask::new(16, 16);
        let mut recorder = StrokeRecorder::new();
        let applied = recorder.extend(Vec2::new(8.0, 8.0), &mut mask, &BrushSettings::default());
        assert_eq!(applied, 0);
        assert!(mask.is_clear());
    }
}
