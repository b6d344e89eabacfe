//! Feed pager: scroll position, centered page and per-page render decision
//!
//! Per page state machine (only the centered page ever leaves THUMBNAIL):
//!
//! ```text
//! THUMBNAIL --settled on page, not already centered--> ACTIVATING (seek issued)
//! ACTIVATING --engine ready for this page--> PLAYING
//! any --another page settles--> THUMBNAIL
//! ```

/// Fraction of a page moved per animation tick. A power of two so positions stay exact.
pub const SCROLL_STEP: f32 = 0.25;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageState {
    Thumbnail,
    Activating,
    Playing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderTarget {
    Thumbnail,
    PlaybackSurface,
}

#[derive(Clone, Debug)]
pub struct FeedPager {
    page_count: usize,
    /// Scroll position in pages; integral when settled
    position: f32,
    target_page: usize,
    centered: Option<usize>,
    ready: bool,
}

impl FeedPager {
    pub fn new(page_count: usize) -> Self {
        Self {
            page_count,
            position: 0.0,
            target_page: 0,
            centered: None,
            ready: false,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// The page nearest the viewport centre.
    pub fn current_page(&self) -> usize {
        self.position.round() as usize
    }

    /// Signed distance of the current page from the viewport centre, in [-0.5, 0.5).
    pub fn offset_fraction(&self) -> f32 {
        self.position - self.current_page() as f32
    }

    pub fn centered_page(&self) -> Option<usize> {
        self.centered
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Scroll finished exactly on a page. Passing over a page mid-scroll does not count.
    pub fn is_settled(&self) -> bool {
        self.page_count > 0
            && self.offset_fraction() == 0.0
            && self.current_page() == self.target_page
    }

    pub fn scroll_by(&mut self, delta: isize) {
        if self.page_count == 0 {
            return;
        }
        let last = self.page_count as isize - 1;
        self.target_page = (self.target_page as isize + delta).clamp(0, last) as usize;
    }

    pub fn scroll_to(&mut self, page: usize) {
        if self.page_count == 0 {
            return;
        }
        self.target_page = page.min(self.page_count - 1);
    }

    /// Advance the scroll animation one step.
    ///
    /// Returns the page to activate when a page settles that is not already centered.
    pub fn tick(&mut self) -> Option<usize> {
        let target = self.target_page as f32;
        let distance = target - self.position;
        if distance.abs() <= SCROLL_STEP {
            self.position = target;
        } else {
            self.position += SCROLL_STEP * distance.signum();
        }
        self.settle()
    }

    fn settle(&mut self) -> Option<usize> {
        if !self.is_settled() {
            return None;
        }
        let page = self.current_page();
        if self.centered == Some(page) {
            return None;
        }

        tracing::debug!(page, previous = ?self.centered, "Page centered");
        self.centered = Some(page);
        self.ready = false;
        Some(page)
    }

    /// Engine reports `page` renderable. Ignored unless it is still the centered page.
    pub fn on_ready(&mut self, page: usize) -> bool {
        if self.centered == Some(page) {
            self.ready = true;
            true
        } else {
            tracing::trace!(page, centered = ?self.centered, "Stale ready signal ignored");
            false
        }
    }

    pub fn page_state(&self, page: usize) -> PageState {
        match (self.centered == Some(page), self.ready) {
            (false, _) => PageState::Thumbnail,
            (true, false) => PageState::Activating,
            (true, true) => PageState::Playing,
        }
    }

    pub fn render_target(&self, page: usize) -> RenderTarget {
        match self.page_state(page) {
            PageState::Playing => RenderTarget::PlaybackSurface,
            PageState::Thumbnail | PageState::Activating => RenderTarget::Thumbnail,
        }
    }

    /// Pages intersecting the viewport with the share of it each one covers.
    pub fn visible_pages(&self) -> Vec<(usize, f32)> {
        if self.page_count == 0 {
            return Vec::new();
        }
        let current = self.current_page();
        let offset = self.offset_fraction();

        if offset > 0.0 && current + 1 < self.page_count {
            vec![(current, 1.0 - offset), (current + 1, offset)]
        } else if offset < 0.0 && current > 0 {
            vec![(current - 1, -offset), (current, 1.0 + offset)]
        } else {
            vec![(current, 1.0)]
        }
    }
}
