use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use image::{Rgb, RgbImage, codecs::jpeg::JpegEncoder, imageops::FilterType};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::foundation::error::{ReelError, ReelResult};
use crate::storyboard::Storyboard;
use crate::viewport::{Raster, RasterFormat, ScrollHint, Viewport};

const BACKGROUND: Rgb<u8> = Rgb([17, 24, 39]);
const ROW: Rgb<u8> = Rgb([31, 41, 55]);
const ROW_HIGHLIGHT: Rgb<u8> = Rgb([3, 105, 161]);
const BORDER: Rgb<u8> = Rgb([55, 65, 81]);
const HEADER: Rgb<u8> = Rgb([31, 41, 55]);

/// Column widths of the editor table: shot, picture, framing, camera, movement, analysis.
const COLUMNS: [u32; 6] = [60, 120, 60, 60, 60, 240];
const THUMB_COLUMN: usize = 1;
const THUMB_PAD: u32 = 4;

/// Geometry of the rendered strip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StripLayout {
    /// Viewport width in pixels.
    pub width: u32,
    /// Viewport height in pixels, header included.
    pub height: u32,
    /// Height of the sticky header band.
    pub header_height: u32,
    /// Height of one storyboard row.
    pub row_height: u32,
    /// JPEG quality of snapshots (1..=100).
    pub jpeg_quality: u8,
}

impl Default for StripLayout {
    fn default() -> Self {
        Self {
            width: 600,
            height: 360,
            header_height: 32,
            row_height: 72,
            jpeg_quality: 85,
        }
    }
}

impl StripLayout {
    /// Check that the geometry leaves room for at least one row.
    pub fn validate(&self) -> ReelResult<()> {
        if self.width == 0 || self.row_height == 0 {
            return Err(ReelError::validation(
                "viewport width and row height must be non-zero",
            ));
        }
        if self.height <= self.header_height {
            return Err(ReelError::validation(
                "viewport height must exceed the header height",
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ReelError::validation("jpeg quality must be within 1..=100"));
        }
        Ok(())
    }

    fn body_height(&self) -> u32 {
        self.height - self.header_height
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct StripState {
    highlighted: usize,
    scroll_px: u32,
}

/// Viewport that renders storyboard rows as a scrolling table strip.
///
/// The highlighted row is tinted; rows with an attached image show a thumbnail in the picture
/// column. Scrolling mirrors the editor: the first two rows highlight in place, later rows are
/// scrolled up to sit one row below the top edge.
pub struct StripViewport {
    layout: StripLayout,
    rows: usize,
    thumbs: Arc<Vec<Option<RgbImage>>>,
    state: Mutex<StripState>,
}

impl StripViewport {
    /// Build a viewport for `storyboard`; relative image paths resolve against `assets_root`.
    ///
    /// Images that fail to load are skipped with a warning.
    pub fn new(
        storyboard: &Storyboard,
        assets_root: &Path,
        layout: StripLayout,
    ) -> ReelResult<Self> {
        layout.validate()?;

        let thumb_w = COLUMNS[THUMB_COLUMN].saturating_sub(2 * THUMB_PAD).max(1);
        let thumb_h = layout.row_height.saturating_sub(2 * THUMB_PAD).max(1);

        let thumbs = storyboard
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let rel = row.image_path()?;
                let path = assets_root.join(rel);
                match image::open(&path) {
                    Ok(img) => Some(
                        img.resize_to_fill(thumb_w, thumb_h, FilterType::Triangle)
                            .to_rgb8(),
                    ),
                    Err(e) => {
                        warn!(row = i, path = %path.display(), error = %e, "skipping row image");
                        None
                    }
                }
            })
            .collect();

        Ok(Self {
            layout,
            rows: storyboard.len(),
            thumbs: Arc::new(thumbs),
            state: Mutex::new(StripState::default()),
        })
    }

    /// Geometry in use.
    pub fn layout(&self) -> StripLayout {
        self.layout
    }

    /// Index of the highlighted row.
    pub async fn highlighted(&self) -> usize {
        self.state.lock().await.highlighted
    }

    /// Current vertical scroll offset of the table body.
    pub async fn scroll_offset(&self) -> u32 {
        self.state.lock().await.scroll_px
    }

    /// Render the current state without encoding it.
    pub async fn render(&self) -> RgbImage {
        let state = *self.state.lock().await;
        render_strip(&self.layout, self.rows, &self.thumbs, state)
    }

    fn max_scroll(&self) -> u32 {
        let content = self.layout.row_height.saturating_mul(self.rows as u32);
        content.saturating_sub(self.layout.body_height())
    }
}

#[async_trait]
impl Viewport for StripViewport {
    async fn snapshot(&self) -> ReelResult<Raster> {
        let state = *self.state.lock().await;
        let layout = self.layout;
        let rows = self.rows;
        let thumbs = Arc::clone(&self.thumbs);

        let bytes = tokio::task::spawn_blocking(move || {
            let img = render_strip(&layout, rows, &thumbs, state);
            let mut buf = Vec::new();
            JpegEncoder::new_with_quality(&mut buf, layout.jpeg_quality)
                .encode_image(&img)
                .map_err(|e| ReelError::snapshot(format!("jpeg encode failed: {e}")))?;
            Ok::<_, ReelError>(buf)
        })
        .await
        .map_err(|e| ReelError::snapshot(format!("snapshot task failed: {e}")))??;

        Raster::new(RasterFormat::Jpeg, bytes)
    }

    async fn scroll_to(&self, hint: ScrollHint) -> ReelResult<()> {
        let max_scroll = self.max_scroll();
        let mut state = self.state.lock().await;
        match hint {
            ScrollHint::Top => *state = StripState::default(),
            ScrollHint::Item(i) => {
                if i >= self.rows {
                    return Err(ReelError::playback(format!(
                        "row {i} is out of range ({} rows)",
                        self.rows
                    )));
                }
                state.highlighted = i;
                if i >= 2 {
                    let top = self.layout.row_height.saturating_mul(i as u32);
                    state.scroll_px = top
                        .saturating_sub(self.layout.row_height)
                        .min(max_scroll);
                }
            }
        }
        debug!(highlighted = state.highlighted, scroll = state.scroll_px, "viewport scrolled");
        Ok(())
    }
}

fn fill_rect(img: &mut RgbImage, x: u32, y: i64, w: u32, h: u32, color: Rgb<u8>) {
    let y0 = y.max(0) as u32;
    let y1 = (y + i64::from(h)).clamp(0, i64::from(img.height())) as u32;
    let x1 = x.saturating_add(w).min(img.width());
    for py in y0..y1 {
        for px in x.min(x1)..x1 {
            img.put_pixel(px, py, color);
        }
    }
}

fn render_strip(
    layout: &StripLayout,
    rows: usize,
    thumbs: &[Option<RgbImage>],
    state: StripState,
) -> RgbImage {
    let mut img = RgbImage::from_pixel(layout.width, layout.height, BACKGROUND);
    let header = i64::from(layout.header_height);
    let row_h = i64::from(layout.row_height);

    for i in 0..rows {
        let y = header + (i as i64) * row_h - i64::from(state.scroll_px);
        if y + row_h <= header || y >= i64::from(layout.height) {
            continue;
        }
        let color = if i == state.highlighted {
            ROW_HIGHLIGHT
        } else {
            ROW
        };
        fill_rect(&mut img, 0, y, layout.width, layout.row_height, color);
        fill_rect(&mut img, 0, y + row_h - 1, layout.width, 1, BORDER);

        if let Some(Some(thumb)) = thumbs.get(i) {
            let x = i64::from(COLUMNS[..THUMB_COLUMN].iter().sum::<u32>() + THUMB_PAD);
            image::imageops::overlay(&mut img, thumb, x, y + i64::from(THUMB_PAD));
        }
    }

    let mut x = 0u32;
    for w in &COLUMNS[..COLUMNS.len() - 1] {
        x += w;
        fill_rect(&mut img, x, header, 1, layout.body_height(), BORDER);
    }

    // The header is sticky and drawn over scrolled rows.
    fill_rect(&mut img, 0, 0, layout.width, layout.header_height, HEADER);
    fill_rect(&mut img, 0, header - 1, layout.width, 1, BORDER);

    img
}

#[cfg(test)]
#[path = "../../tests/unit/viewport/strip.rs"]
mod tests;
