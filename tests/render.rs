use std::path::Path;

use growth_probe::{
    Chart, Histogram, ImageFormat, PlotRenderer, RenderError, Renderer, TextRenderer,
};

fn chart() -> Chart {
    let histogram = Histogram::new(
        3,
        &[
            ("Size S to S+1", vec![3e-7, 4e-7, 6e-7]),
            ("Size S-1 to S", vec![1e-7, 1e-7, 2e-7]),
        ],
    )
    .unwrap();
    Chart::timings(32, histogram)
}

#[test]
fn text_histogram() {
    let mut renderer = TextRenderer::new(Vec::new()).with_width(10);
    renderer.render(&chart()).unwrap();
    let text = String::from_utf8(renderer.into_inner()).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert!(lines[0].starts_with("Distribution of timings to grow a Vec"));
    assert!(lines[0].ends_with("(S = 32)"));
    assert_eq!(lines[1], "  # Size S to S+1");
    assert_eq!(lines[2], "  = Size S-1 to S");
    assert_eq!(lines[3], "Time (seconds) / Frequency");
    // One row per bin and series.
    assert_eq!(lines.len(), 4 + 3 * 2);

    // The tallest bin spans the full width.
    assert!(lines.iter().any(|line| line.ends_with(" 3 ==========")));
    assert!(!lines.iter().any(|line| line.contains("###########")));
}

#[test]
fn image_format_from_extension() {
    assert_eq!(
        ImageFormat::from_path(Path::new("timings.svg")),
        Some(ImageFormat::Svg)
    );
    assert_eq!(
        ImageFormat::from_path(Path::new("out/timings.PNG")),
        Some(ImageFormat::Png)
    );
    assert_eq!(ImageFormat::from_path(Path::new("timings.txt")), None);
    assert_eq!(ImageFormat::from_path(Path::new("timings")), None);
}

#[test]
fn plot_renderer_needs_image_extension() {
    let renderer = PlotRenderer::for_path("timings.svg").unwrap();
    assert_eq!(renderer.format(), ImageFormat::Svg);
    assert_eq!(renderer.path(), Path::new("timings.svg"));

    match PlotRenderer::for_path("timings.csv") {
        Err(RenderError::UnsupportedFormat(path)) => assert_eq!(path, Path::new("timings.csv")),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn svg_chart_contains_both_series() {
    let path = std::env::temp_dir().join(format!("growth-probe-{}.svg", std::process::id()));
    let mut renderer = PlotRenderer::for_path(path.clone()).unwrap();
    renderer.render(&chart()).unwrap();

    let svg = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert!(svg.contains("Size S to S+1"));
    assert!(svg.contains("Size S-1 to S"));
    // Every bin is drawn once filled and once outlined, for each series.
    assert!(svg.matches("<rect").count() >= 2 * 3 * 2);
}
