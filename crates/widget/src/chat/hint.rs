//! Contextual nudges derived from which page section sits under the viewport midline.

use crate::content::{FLOW_HINT, QA_HINT, SALARY_HINT};

/// Named page regions the widget watches while closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Landmark {
    Salary,
    Flow,
    Qa,
}

impl Landmark {
    /// Evaluation order; the first landmark crossing the midline wins.
    pub const PRIORITY: [Landmark; 3] = [Landmark::Salary, Landmark::Flow, Landmark::Qa];

    pub fn message(self) -> &'static str {
        match self {
            Self::Salary => SALARY_HINT,
            Self::Flow => FLOW_HINT,
            Self::Qa => QA_HINT,
        }
    }
}

/// Vertical extent of a landmark, relative to the top of the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkBounds {
    pub top: f32,
    pub bottom: f32,
}

impl LandmarkBounds {
    pub fn new(top: f32, bottom: f32) -> Self {
        Self { top, bottom }
    }

    /// Strict containment, so a section edge resting on the line does not count.
    pub fn crosses(&self, line: f32) -> bool {
        self.top < line && self.bottom > line
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub height: f32,
}

impl Viewport {
    pub fn new(height: f32) -> Self {
        Self { height }
    }

    pub fn midline(&self) -> f32 {
        self.height / 2.0
    }
}

/// Read-only view of the surrounding page's landmark regions.
pub trait LandmarkLookup {
    fn bounds(&self, landmark: Landmark) -> Option<LandmarkBounds>;
}

/// Picks the hint for the first landmark under the viewport midline, if any.
pub fn contextual_hint(lookup: &dyn LandmarkLookup, viewport: Viewport) -> Option<&'static str> {
    let midline = viewport.midline();
    Landmark::PRIORITY
        .into_iter()
        .find(|landmark| {
            lookup
                .bounds(*landmark)
                .is_some_and(|bounds| bounds.crosses(midline))
        })
        .map(Landmark::message)
}

/// Landmark bounds sampled on one scroll event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageScroll {
    pub viewport: Viewport,
    landmarks: Vec<(Landmark, LandmarkBounds)>,
}

impl PageScroll {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            landmarks: Vec::new(),
        }
    }

    pub fn with_landmark(mut self, landmark: Landmark, bounds: LandmarkBounds) -> Self {
        self.landmarks.retain(|(existing, _)| *existing != landmark);
        self.landmarks.push((landmark, bounds));
        self
    }
}

impl LandmarkLookup for PageScroll {
    fn bounds(&self, landmark: Landmark) -> Option<LandmarkBounds> {
        self.landmarks
            .iter()
            .find(|(candidate, _)| *candidate == landmark)
            .map(|(_, bounds)| *bounds)
    }
}

/// Static page layout measured in document coordinates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LandmarkLayout {
    sections: Vec<(Landmark, f32, f32)>,
}

impl LandmarkLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a section spanning `height` pixels starting at document offset `top`.
    pub fn with_section(mut self, landmark: Landmark, top: f32, height: f32) -> Self {
        self.sections.push((landmark, top, height.max(0.0)));
        self
    }

    /// Projects the layout into viewport coordinates for a given scroll offset.
    pub fn sample(&self, scroll_offset: f32, viewport: Viewport) -> PageScroll {
        self.sections
            .iter()
            .fold(PageScroll::new(viewport), |page, (landmark, top, height)| {
                let top = top - scroll_offset;
                page.with_landmark(*landmark, LandmarkBounds::new(top, top + height))
            })
    }
}
