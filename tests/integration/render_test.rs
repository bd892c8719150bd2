// Compositor integration tests
//
// Render purity, exact colour reproduction, long-word layout and style
// validation at the render boundary.

use image::Rgba;
use rstest::rstest;
use textoverlay::compositor::fonts::{FontFace, FontRegistry};
use textoverlay::compositor::{layout, text_renderer, ShadowConfig};
use textoverlay::grid::cell_rect;
use textoverlay::{BlendMode, Compositor, OverlayError, Position, StyleConfig};

use super::fixtures::{noise, solid};

fn exact_style(color: &str) -> StyleConfig {
    StyleConfig::default()
        .with_text_color(color)
        .with_opacity(1.0)
        .with_blend_mode(BlendMode::Normal)
        .with_shadow(false)
        .with_font_size(48)
}

#[rstest]
#[case::top_left(Position::TopLeft)]
#[case::center(Position::Center)]
#[case::bottom_right(Position::BottomRight)]
#[case::bottom_center(Position::BottomCenter)]
fn test_render_is_pure(#[case] position: Position) {
    let image = noise(320, 240, 9);
    let original = image.clone();
    let style = StyleConfig::default();

    let first = textoverlay::render(&image, "Same input", position, &style).unwrap();
    let second = textoverlay::render(&image, "Same input", position, &style).unwrap();

    assert_eq!(first.as_rgba().as_raw(), second.as_rgba().as_raw());
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert_eq!(image, original, "input must not be modified");
}

#[test]
fn test_render_is_identical_across_threads() {
    let image = noise(400, 300, 2);
    let style = StyleConfig::default().with_font_size(40);
    let expected = textoverlay::render(&image, "Parallel", Position::Center, &style)
        .unwrap()
        .fingerprint();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    textoverlay::render(&image, "Parallel", Position::Center, &style)
                        .unwrap()
                        .fingerprint()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[rstest]
#[case::named("gold", [255, 215, 0])]
#[case::hex("#1DB954", [29, 185, 84])]
#[case::rgb("rgb(12, 34, 56)", [12, 34, 56])]
fn test_full_coverage_pixels_have_exact_color(#[case] color: &str, #[case] rgb: [u8; 3]) {
    let (width, height) = (300, 300);
    let image = solid(width, height, [90, 90, 90]);
    let style = exact_style(color);
    let rendered = textoverlay::render(&image, "HELLO", Position::Center, &style).unwrap();

    // Rebuild the coverage mask the compositor drew with
    let fonts = FontRegistry::builtin();
    let font = fonts.resolve(&style.font_family).unwrap();
    let cell = cell_rect(Position::Center, width, height);
    let text_layout = layout::layout(&font, style.font_size as f32, "HELLO", &cell, width, height);
    let mask = text_renderer::render_mask(&font, &text_layout, width, height);

    let mut full = 0;
    for (x, y, coverage) in mask.enumerate_pixels() {
        let pixel = rendered.as_rgba().get_pixel(x, y);
        match coverage.0[0] {
            255 => {
                assert_eq!(pixel, &Rgba([rgb[0], rgb[1], rgb[2], 255]), "({}, {})", x, y);
                full += 1;
            }
            0 => assert_eq!(pixel, &Rgba([90, 90, 90, 255])),
            _ => {}
        }
    }
    assert!(full > 100, "only {} fully covered pixels", full);
}

#[test]
fn test_long_word_is_not_truncated() {
    let word = "Incomprehensibilities";
    let (width, height) = (600, 200);
    let image = solid(width, height, [0, 0, 0]);
    let style = exact_style("white").with_font_size(24);

    let fonts = FontRegistry::builtin();
    let font = fonts.resolve(&style.font_family).unwrap();
    let cell = cell_rect(Position::Center, width, height);
    let text_layout = layout::layout(&font, 24.0, word, &cell, width, height);
    assert_eq!(text_layout.lines.len(), 1);
    assert_eq!(text_layout.lines[0].text, word);
    assert!(text_layout.block_width > cell.width as f32);

    let rendered = textoverlay::render(&image, word, Position::Center, &style).unwrap();
    let inked: Vec<u32> = rendered
        .as_rgba()
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] > 0)
        .map(|(x, _, _)| x)
        .collect();
    let min_x = *inked.iter().min().unwrap();
    let max_x = *inked.iter().max().unwrap();
    // Ink spills over both sides of the 200px centre column
    assert!(min_x < cell.x, "min x {}", min_x);
    assert!(max_x >= cell.x + cell.width, "max x {}", max_x);
}

#[test]
fn test_multi_word_text_wraps_inside_cell() {
    let (width, height) = (600, 600);
    let text = "a caption that is far too long for one line";
    let fonts = FontRegistry::builtin();
    let font = fonts.resolve("OpenSans-Regular").unwrap();
    let cell = cell_rect(Position::BottomLeft, width, height);
    let text_layout = layout::layout(&font, 32.0, text, &cell, width, height);

    assert!(text_layout.lines.len() > 1);
    for line in &text_layout.lines {
        assert!(line.width <= cell.width as f32);
    }
    let words: Vec<&str> = text_layout
        .lines
        .iter()
        .flat_map(|l| l.text.split(' '))
        .collect();
    assert_eq!(words.join(" "), text);
}

#[rstest]
#[case::too_large(StyleConfig::default().with_font_size(100))]
#[case::too_small(StyleConfig::default().with_font_size(8))]
#[case::transparent(StyleConfig::default().with_opacity(0.0))]
#[case::unknown_family(StyleConfig::default().with_font_family("Wingdings"))]
#[case::unknown_color(StyleConfig::default().with_text_color("plaid"))]
fn test_invalid_style_is_rejected(#[case] style: StyleConfig) {
    let err = textoverlay::render(&solid(100, 100, [0, 0, 0]), "Hi", Position::Center, &style)
        .unwrap_err();
    assert!(matches!(err, OverlayError::InvalidStyle(_)), "{:?}", err);
}

#[test]
fn test_empty_text_is_invalid_input() {
    let err = textoverlay::render(
        &solid(100, 100, [0, 0, 0]),
        "  ",
        Position::Center,
        &StyleConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, OverlayError::InvalidInput(_)));
}

#[test]
fn test_missing_font_file_is_render_failure() {
    let mut fonts = FontRegistry::builtin();
    fonts.register(
        "Missing-Regular",
        0.5,
        FontFace::from_path(std::path::Path::new("/nonexistent/missing.ttf")),
    );
    let compositor = Compositor::new(fonts, ShadowConfig::default());
    let err = compositor
        .render(
            &solid(100, 100, [0, 0, 0]),
            "Hi",
            Position::Center,
            &StyleConfig::default().with_font_family("Missing-Regular"),
        )
        .unwrap_err();
    assert!(matches!(err, OverlayError::RenderFailure(_)));
    assert!(!err.is_caller_error());
}

#[test]
fn test_shadow_darkens_around_text() {
    let image = solid(300, 300, [200, 200, 200]);
    let with_shadow = textoverlay::render(
        &image,
        "Shadow",
        Position::Center,
        &exact_style("white").with_shadow(true),
    )
    .unwrap();
    let without =
        textoverlay::render(&image, "Shadow", Position::Center, &exact_style("white")).unwrap();

    let darker = with_shadow
        .as_rgba()
        .pixels()
        .zip(without.as_rgba().pixels())
        .filter(|(a, b)| a.0[0] < b.0[0])
        .count();
    assert!(darker > 0);
}

#[test]
fn test_overlay_differs_from_normal() {
    let image = noise(300, 300, 4);
    let normal = textoverlay::render(
        &image,
        "Blend",
        Position::Center,
        &StyleConfig::default().with_blend_mode(BlendMode::Normal),
    )
    .unwrap();
    let overlay = textoverlay::render(
        &image,
        "Blend",
        Position::Center,
        &StyleConfig::default().with_blend_mode(BlendMode::Overlay),
    )
    .unwrap();
    assert_ne!(normal.fingerprint(), overlay.fingerprint());
}

#[test]
fn test_degenerate_cell_still_renders() {
    let rendered = textoverlay::render(
        &solid(2, 2, [0, 0, 0]),
        "x",
        Position::TopLeft,
        &StyleConfig::default(),
    )
    .unwrap();
    assert_eq!((rendered.width(), rendered.height()), (2, 2));
}
