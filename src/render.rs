//! Rendering of timing histograms.
use std::{
    error, fmt, io,
    path::{Path, PathBuf},
};

use plotters::{coord::Shift, prelude::*};
use tracing::info;

use crate::Histogram;

const CHART_TITLE: &str = "Distribution of timings to grow a Vec";
const X_LABEL: &str = "Time (seconds)";
const Y_LABEL: &str = "Frequency";
const BAR_ALPHA: f64 = 0.5;
const DEFAULT_IMAGE_SIZE: (u32, u32) = (1024, 640);
const DEFAULT_TEXT_WIDTH: usize = 40;

// Blue, then orange.
const PALETTE: [RGBColor; 2] = [RGBColor(31, 119, 180), RGBColor(255, 127, 14)];

/// A histogram with its title and axis labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    /// Chart title.
    pub title: String,
    /// Horizontal axis label.
    pub x_label: String,
    /// Vertical axis label.
    pub y_label: String,
    /// The binned series.
    pub histogram: Histogram,
}

impl Chart {
    /// Chart of append timings around threshold `threshold`.
    pub fn timings(threshold: usize, histogram: Histogram) -> Self {
        Self {
            title: format!("{} (S = {})", CHART_TITLE, threshold),
            x_label: X_LABEL.to_string(),
            y_label: Y_LABEL.to_string(),
            histogram,
        }
    }
}

/// Errors raised while rendering a chart.
#[derive(Debug)]
pub enum RenderError {
    /// The output path has no supported image extension.
    UnsupportedFormat(PathBuf),
    /// Writing the output failed.
    Io(io::Error),
    /// The drawing backend failed.
    Backend(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::UnsupportedFormat(path) => write!(
                f,
                "cannot render to {}: expected a .svg or .png file",
                path.display()
            ),
            RenderError::Io(e) => write!(f, "failed to write chart: {}", e),
            RenderError::Backend(e) => write!(f, "failed to draw chart: {}", e),
        }
    }
}

impl error::Error for RenderError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            RenderError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RenderError {
    fn from(e: io::Error) -> Self {
        RenderError::Io(e)
    }
}

fn backend<E: fmt::Display>(e: E) -> RenderError {
    RenderError::Backend(e.to_string())
}

/// Displays a chart.
pub trait Renderer {
    /// Renders `chart`, returning once it has been fully written out.
    fn render(&mut self, chart: &Chart) -> Result<(), RenderError>;
}

/// Image formats supported by [`PlotRenderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Scalable vector graphics.
    Svg,
    /// Portable network graphics.
    Png,
}

impl ImageFormat {
    /// Picks the format matching the extension of `path`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "svg" => Some(ImageFormat::Svg),
            "png" => Some(ImageFormat::Png),
            _ => None,
        }
    }
}

/// Draws overlaid histograms into an image file.
#[derive(Debug, Clone)]
pub struct PlotRenderer {
    path: PathBuf,
    format: ImageFormat,
    size: (u32, u32),
}

impl PlotRenderer {
    /// Creates a renderer writing to `path`, with the format taken from its extension.
    ///
    /// # Errors
    /// `RenderError::UnsupportedFormat` if the extension is neither `svg` nor `png`.
    pub fn for_path(path: impl Into<PathBuf>) -> Result<Self, RenderError> {
        let path = path.into();
        match ImageFormat::from_path(&path) {
            Some(format) => Ok(Self {
                path,
                format,
                size: DEFAULT_IMAGE_SIZE,
            }),
            None => Err(RenderError::UnsupportedFormat(path)),
        }
    }

    /// Sets the image size in pixels.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    /// The output path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The output format.
    pub fn format(&self) -> ImageFormat {
        self.format
    }
}

impl Renderer for PlotRenderer {
    fn render(&mut self, chart: &Chart) -> Result<(), RenderError> {
        match self.format {
            ImageFormat::Svg => {
                draw(&SVGBackend::new(&self.path, self.size).into_drawing_area(), chart)?
            }
            ImageFormat::Png => {
                draw(&BitMapBackend::new(&self.path, self.size).into_drawing_area(), chart)?
            }
        }
        info!(path = %self.path.display(), "chart written");
        Ok(())
    }
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    chart: &Chart,
) -> Result<(), RenderError> {
    let histogram = &chart.histogram;
    let (x_min, x_max) = histogram.range();
    let y_max = histogram.max_count() + histogram.max_count() / 10 + 1;

    root.fill(&WHITE).map_err(backend)?;
    let mut plot = ChartBuilder::on(root)
        .caption(&chart.title, ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, 0usize..y_max)
        .map_err(backend)?;

    plot.configure_mesh()
        .disable_x_mesh()
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .x_label_formatter(&|seconds| format!("{:.1e}", seconds))
        .draw()
        .map_err(backend)?;

    for (series, color) in histogram.series().iter().zip(PALETTE.iter().cycle()) {
        let fill = color.mix(BAR_ALPHA).filled();
        plot.draw_series(
            histogram
                .bars(series)
                .map(|(left, right, count)| Rectangle::new([(left, 0), (right, count)], fill)),
        )
        .map_err(backend)?
        .label(series.label.as_str())
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], fill));

        plot.draw_series(histogram.bars(series).map(|(left, right, count)| {
            Rectangle::new([(left, 0), (right, count)], BLACK.stroke_width(1))
        }))
        .map_err(backend)?;
    }

    plot.configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(backend)?;

    root.present().map_err(backend)
}

/// Prints overlaid histograms as text.
///
/// Each bin becomes one row per series, with bars scaled so the tallest bin spans the full
/// width.
pub struct TextRenderer<W> {
    out: W,
    width: usize,
}

impl<W: io::Write> TextRenderer<W> {
    /// Creates a text renderer writing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            width: DEFAULT_TEXT_WIDTH,
        }
    }

    /// Sets the width of the longest bar, in characters.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(1);
        self
    }

    /// Gets back the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: io::Write> Renderer for TextRenderer<W> {
    fn render(&mut self, chart: &Chart) -> Result<(), RenderError> {
        let histogram = &chart.histogram;
        let tallest = histogram.max_count().max(1);
        let marks = ['#', '='];

        writeln!(self.out, "{}", chart.title)?;
        for (series, mark) in histogram.series().iter().zip(marks.iter().cycle()) {
            writeln!(self.out, "  {} {}", mark, series.label)?;
        }
        writeln!(self.out, "{} / {}", chart.x_label, chart.y_label)?;

        for (bin, edge) in histogram.edges().windows(2).enumerate() {
            for (series, mark) in histogram.series().iter().zip(marks.iter().cycle()) {
                let count = series.counts[bin];
                let bar = (count * self.width + tallest - 1) / tallest;
                writeln!(
                    self.out,
                    "{:>10.3e} .. {:<10.3e} {:>6} {}",
                    edge[0],
                    edge[1],
                    count,
                    mark.to_string().repeat(bar)
                )?;
            }
        }

        self.out.flush()?;
        Ok(())
    }
}
