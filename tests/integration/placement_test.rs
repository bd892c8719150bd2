// Placement analysis integration tests
//
// Covers the analyzer contract end to end:
// - complete results for every valid input, including degenerate images
// - determinism, also under concurrent use
// - quality buckets and font size monotonicity
// - the interchange shape of PlacementResult

use rstest::rstest;
use textoverlay::{
    Analyzer, CancellationToken, Engine, EngineConfig, OverlayError, PlacementResult, Position,
    Quality,
};

use textoverlay::compositor::fonts::FontRegistry;
use textoverlay::compositor::layout;
use textoverlay::grid::cell_rect;

use super::fixtures::{bright_top_left_busy_bottom_right, noise, solid};

fn assert_complete(result: &PlacementResult) {
    assert_eq!(result.len(), 9);
    let positions: Vec<Position> = result.iter().map(|c| c.position).collect();
    assert_eq!(positions, Position::ALL.to_vec());
    for c in result.iter() {
        assert!((0.0..=1.0).contains(&c.score), "{} scored {}", c.position, c.score);
        assert!((12..=72).contains(&c.recommended_font_size));
    }
}

#[rstest]
#[case::tiny(3, 3)]
#[case::wide(640, 90)]
#[case::tall(90, 640)]
#[case::large(1600, 1200)]
fn test_every_position_scored(#[case] width: u32, #[case] height: u32) {
    let result = textoverlay::analyze(&noise(width, height, 7), "Weekend sale").unwrap();
    assert_complete(&result);
}

#[test]
fn test_single_pixel_image_gives_complete_result() {
    let result = textoverlay::analyze(&solid(1, 1, [200, 10, 10]), "Hi").unwrap();
    assert_complete(&result);

    // Only the bottom-right cell has pixels; the rest are degenerate
    for c in result.iter().filter(|c| c.position != Position::BottomRight) {
        assert_eq!(c.score, 0.0);
        assert_eq!(c.quality, Quality::Fair);
    }
}

#[rstest]
#[case::empty("")]
#[case::spaces("   ")]
#[case::newlines("\n\t\n")]
fn test_blank_text_is_invalid_input(#[case] text: &str) {
    let err = textoverlay::analyze(&solid(10, 10, [0, 0, 0]), text).unwrap_err();
    assert!(matches!(err, OverlayError::InvalidInput(_)));
}

#[test]
fn test_analysis_is_deterministic() {
    let image = noise(700, 500, 3);
    let first = textoverlay::analyze(&image, "Deterministic").unwrap();
    let second = textoverlay::analyze(&image, "Deterministic").unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_concurrent_analyses_agree() {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let image = noise(400, 300, 11);
    let expected = engine.analyze(&image, "Shared image").unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| engine.analyze(&image, "Shared image").unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_quality_matches_score() {
    for seed in 0..3 {
        let result = textoverlay::analyze(&noise(300, 200, seed), "Quality").unwrap();
        for c in result.iter() {
            let expected = if c.score >= 0.8 {
                Quality::Excellent
            } else if c.score >= 0.6 {
                Quality::Good
            } else {
                Quality::Fair
            };
            assert_eq!(c.quality, expected, "{} at {}", c.position, c.score);
        }
    }
}

#[test]
fn test_font_size_non_increasing_with_text_length() {
    let image = solid(1200, 900, [40, 60, 90]);
    let mut previous: Option<PlacementResult> = None;
    for len in 1..=80 {
        let text = "W".repeat(len);
        let result = textoverlay::analyze(&image, &text).unwrap();
        if let Some(prev) = &previous {
            for p in Position::ALL {
                assert!(
                    result.get(p).recommended_font_size <= prev.get(p).recommended_font_size,
                    "{} grew at {} chars",
                    p,
                    len
                );
            }
        }
        previous = Some(result);
    }
    let last = previous.unwrap();
    assert_eq!(last.get(Position::Center).recommended_font_size, 12);
}

#[rstest]
#[case::wide_glyphs(900, "WWWWWW")]
#[case::caps(600, "SUMMER SALE")]
#[case::sentence(1200, "Fresh bread baked every morning")]
fn test_recommended_size_renders_on_one_line(#[case] side: u32, #[case] text: &str) {
    let result = textoverlay::analyze(&solid(side, side, [30, 30, 30]), text).unwrap();
    let fonts = FontRegistry::builtin();
    let font = fonts.resolve("OpenSans-Regular").unwrap();

    for p in Position::ALL {
        let size = result.get(p).recommended_font_size;
        if size == 12 {
            continue;
        }
        let cell = cell_rect(p, side, side);
        let text_layout = layout::layout(&font, size as f32, text, &cell, side, side);
        assert_eq!(text_layout.lines.len(), 1, "{} wrapped at {}px", p, size);
        assert!(
            text_layout.block_width <= 0.9 * cell.width as f32 + 0.5,
            "{} at {}px: {} > 90% of {}",
            p,
            size,
            text_layout.block_width,
            cell.width
        );
    }
}

#[test]
fn test_smaller_cells_get_smaller_fonts() {
    let big = textoverlay::analyze(&solid(1800, 1800, [0, 0, 0]), "Caption text").unwrap();
    let small = textoverlay::analyze(&solid(300, 300, [0, 0, 0]), "Caption text").unwrap();
    assert!(
        small.get(Position::Center).recommended_font_size
            < big.get(Position::Center).recommended_font_size
    );
}

#[test]
fn test_flat_bright_region_beats_dark_busy_region() {
    let image = bright_top_left_busy_bottom_right(1000, 2);
    let result = textoverlay::analyze(&image, "SALE").unwrap();
    let top_left = result.get(Position::TopLeft);
    let bottom_right = result.get(Position::BottomRight);
    assert!(
        top_left.score > bottom_right.score,
        "top_left {} <= bottom_right {}",
        top_left.score,
        bottom_right.score
    );
}

#[test]
fn test_saliency_follows_texture_after_downscaling() {
    // Forces a working copy much smaller than the image
    let mut config = EngineConfig::default();
    config.analysis_max_dimension = 200;
    let engine = Engine::new(config).unwrap();

    let image = bright_top_left_busy_bottom_right(900, 24);
    let analysis = engine.analyze_detailed(&image, "SALE", None).unwrap();
    assert!(
        analysis.cell(Position::TopLeft).mean_saliency
            < analysis.cell(Position::BottomRight).mean_saliency
    );
    assert_eq!(analysis.image_size, (900, 900));
    // Geometry stays at full resolution
    assert_eq!(analysis.cell(Position::BottomRight).rect.width, 300);
}

#[test]
fn test_ties_resolved_by_priority() {
    // Priors differ per position, so equal weights everywhere except the
    // prior produce no ties; zero the prior to force them
    let mut config = EngineConfig::default();
    config.scoring.weights.prior = 0.0;
    let engine = Engine::new(config).unwrap();

    let result = engine.analyze(&solid(900, 900, [255, 255, 255]), "Tie").unwrap();
    assert_eq!(result.best().position, Position::BottomRight);
    let ranked: Vec<Position> = result.ranked().map(|c| c.position).collect();
    assert_eq!(ranked, engine.analyzer().priority().as_slice());
}

#[test]
fn test_cancelled_analysis_yields_no_result() {
    let analyzer = Analyzer::default();
    let token = CancellationToken::new();
    token.cancel();
    let err = analyzer
        .analyze_with_cancel(&noise(200, 200, 1), "Cancel me", &token)
        .unwrap_err();
    assert_eq!(err, OverlayError::Cancelled);
}

#[test]
fn test_result_json_shape() {
    let result = textoverlay::analyze(&noise(300, 300, 5), "Shape").unwrap();
    let value = serde_json::to_value(&result).unwrap();
    let map = value.as_object().unwrap();
    assert_eq!(map.len(), 9);
    for p in Position::ALL {
        let entry = &map[p.as_str()];
        assert!(entry["score"].is_f64());
        assert!(entry["quality"].is_string());
        assert!(entry["recommended_font_size"].is_u64());
    }

    let parsed: PlacementResult = serde_json::from_value(value).unwrap();
    assert_eq!(parsed, result);
}
