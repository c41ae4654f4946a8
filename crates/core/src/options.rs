//! Conversion options.

/// Default upper bound (exclusive) on `y` for a text box to read as a title.
pub const DEFAULT_TITLE_MAX_Y: f64 = 50.0;

/// Default lower bound (exclusive) on the leading run's font size for a title.
pub const DEFAULT_TITLE_MIN_FONT_SIZE: f64 = 24.0;

/// Default limit on nested groups before a slide is reported as unreadable.
///
/// Real decks nest a handful of levels; the bound keeps pathological trees
/// from exhausting memory or the stack when they are dropped.
pub const DEFAULT_MAX_GROUP_DEPTH: usize = 4096;

/// Minimum number of slides to justify parallel synthesis.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 10;

/// Options controlling classification, extraction and assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    /// Text boxes anchored above this `y` are title candidates.
    pub title_max_y: f64,

    /// Text boxes whose first run is larger than this are title candidates.
    pub title_min_font_size: f64,

    /// Deepest group nesting accepted before the slide is degraded.
    pub max_group_depth: usize,

    /// Render speaker notes blocks.
    pub include_notes: bool,

    /// Synthesize slides on the rayon pool when there are enough of them.
    pub parallel: bool,

    /// Slide count at which parallel synthesis kicks in.
    pub parallel_threshold: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            title_max_y: DEFAULT_TITLE_MAX_Y,
            title_min_font_size: DEFAULT_TITLE_MIN_FONT_SIZE,
            max_group_depth: DEFAULT_MAX_GROUP_DEPTH,
            include_notes: true,
            parallel: true,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl ConvertOptions {
    /// Create options with the default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title_max_y(mut self, y: f64) -> Self {
        self.title_max_y = y;
        self
    }

    pub fn with_title_min_font_size(mut self, size: f64) -> Self {
        self.title_min_font_size = size;
        self
    }

    pub fn with_max_group_depth(mut self, depth: usize) -> Self {
        self.max_group_depth = depth.max(1); // Top-level groups must always work
        self
    }

    pub fn with_notes(mut self, include: bool) -> Self {
        self.include_notes = include;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }
}
