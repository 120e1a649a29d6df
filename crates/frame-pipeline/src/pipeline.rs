//! End-to-end frame production: source -> rotate -> fit -> enhance.

use std::time::Duration;

use image::DynamicImage;
use tracing::{debug, info};

use crate::compose::{pad_with_blur, resize};
use crate::enhance::{EnhancementSettings, apply_enhancement};
use crate::fetch::ImageFetcher;
use crate::render::{ChromiumBackend, Renderer, ScreenshotBackend};
use crate::rotate::change_orientation;
use crate::{Dimensions, Orientation, RenderOutcome};

/// Flag enabling left/top anchored crops in the list form of image settings.
pub const KEEP_WIDTH_FLAG: &str = "keep-width";
/// Flag enabling blurred padding instead of cropping.
pub const PAD_BLUR_FLAG: &str = "pad-blur";

/// What to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderTarget {
    /// A literal HTML/CSS document.
    Html(String),
    /// A local path or URL the browser navigates to.
    Location(String),
}

/// How a source image is fitted and adjusted for the panel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImageSettings {
    pub keep_width: bool,
    pub pad_blur: bool,
    pub enhancement: EnhancementSettings,
}

impl ImageSettings {
    /// Build settings from a list of flags such as `["keep-width"]`.
    pub fn from_flags<S: AsRef<str>>(flags: &[S], enhancement: EnhancementSettings) -> Self {
        let has = |flag: &str| flags.iter().any(|f| f.as_ref() == flag);
        Self {
            keep_width: has(KEEP_WIDTH_FLAG),
            pad_blur: has(PAD_BLUR_FLAG),
            enhancement,
        }
    }
}

/// Produces panel-sized frames from URLs, HTML documents and render targets.
pub struct FramePipeline<B = ChromiumBackend> {
    fetcher: ImageFetcher,
    renderer: Renderer<B>,
    panel: Dimensions,
    orientation: Orientation,
    inverted: bool,
    settings: ImageSettings,
    timeout: Option<Duration>,
}

impl<B: ScreenshotBackend> FramePipeline<B> {
    pub fn new(renderer: Renderer<B>, panel: Dimensions) -> Self {
        Self {
            fetcher: ImageFetcher::new(),
            renderer,
            panel,
            orientation: Orientation::Horizontal,
            inverted: false,
            settings: ImageSettings::default(),
            timeout: None,
        }
    }

    pub fn with_fetcher(mut self, fetcher: ImageFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation, inverted: bool) -> Self {
        self.orientation = orientation;
        self.inverted = inverted;
        self
    }

    pub fn with_settings(mut self, settings: ImageSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Override the renderer's per-entry-point default timeouts.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn panel(&self) -> Dimensions {
        self.panel
    }

    /// Size HTML is laid out at: the panel as the viewer sees it.
    pub fn render_size(&self) -> Dimensions {
        self.panel.oriented(self.orientation)
    }

    /// Download an image and prepare it for the panel.
    pub async fn from_url(&self, url: &str) -> RenderOutcome {
        let img = self.fetcher.fetch(url).await?;
        Ok(self.finish(img))
    }

    /// Render an HTML document and prepare it for the panel.
    pub async fn from_html(&self, html: &str) -> RenderOutcome {
        let img = self
            .renderer
            .render_html(html, self.render_size(), self.timeout)
            .await?;
        Ok(self.finish(img))
    }

    /// Render a path or URL in the browser and prepare it for the panel.
    pub async fn from_target(&self, target: &str) -> RenderOutcome {
        let img = self
            .renderer
            .render_target(target, self.render_size(), self.timeout)
            .await?;
        Ok(self.finish(img))
    }

    pub async fn render(&self, target: &RenderTarget) -> RenderOutcome {
        match target {
            RenderTarget::Html(html) => self.from_html(html).await,
            RenderTarget::Location(location) => self.from_target(location).await,
        }
    }

    /// Rotate, fit and enhance `img`. The result is always exactly the panel size.
    pub fn finish(&self, img: DynamicImage) -> DynamicImage {
        debug!(
            w = img.width(),
            h = img.height(),
            panel = %self.panel,
            orientation = %self.orientation,
            inverted = self.inverted,
            "Preparing frame for panel"
        );

        let img = change_orientation(img, self.orientation, self.inverted);
        let img = if self.settings.pad_blur {
            pad_with_blur(img, self.panel)
        } else {
            resize(img, self.panel, self.settings.keep_width)
        };
        let img = apply_enhancement(img, &self.settings.enhancement);

        info!(panel = %self.panel, "Frame ready");
        img
    }
}
