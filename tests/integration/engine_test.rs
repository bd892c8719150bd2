// Engine and session integration tests
//
// Configuration loaded from disk, the one-shot pipeline, async analysis
// with last-call-wins semantics and the editing session state machine.

use std::io::Write;
use std::sync::Arc;

use tempfile::NamedTempFile;
use textoverlay::{
    AnalysisSlot, CancellationToken, Engine, EngineConfig, OverlayError, OverlaySession, Position,
    SessionState, StyleConfig,
};

use super::fixtures::{noise, solid};

fn engine() -> Engine {
    Engine::new(EngineConfig::default()).unwrap()
}

#[test]
fn test_engine_from_config_file() {
    let yaml = r#"
default_style:
  font_family: Roboto-Bold
  font_size: 40
  text_color: auto
  opacity: 1.0
  blend_mode: normal
fonts:
  - family: Poster
    avg_char_width: 0.62
    face: bold
logging:
  level: debug
  format: compact
"#;
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    let config = EngineConfig::from_file(file.path()).unwrap();
    let engine = Engine::new(config).unwrap();
    assert!(engine.compositor().fonts().contains("Poster"));
    assert!(engine.compositor().fonts().contains("OpenSans-Regular"));
    assert_eq!(engine.default_style().font_size, 40);

    // `auto` resolves against the chosen cell: dark background, light text
    let output = engine.run(&solid(800, 600, [15, 15, 20]), "Night", None).unwrap();
    assert!(output.style.text_color.starts_with('#'));
    assert_ne!(output.style.text_color, "#000000");
}

#[test]
fn test_invalid_config_file_is_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"analysis_max_dimension: [not, a, number]\n").unwrap();
    let err = EngineConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, OverlayError::Config(_)));
}

#[test]
fn test_run_honours_preferred_position() {
    let engine = engine();
    let image = noise(600, 400, 8);
    let output = engine.run(&image, "Preferred", Some(Position::TopLeft)).unwrap();
    assert_eq!(output.position, Position::TopLeft);
    let recommended = output.placements.get(Position::TopLeft).recommended_font_size;
    assert!(output.style.font_size <= recommended);
    assert_eq!((output.image.width(), output.image.height()), (600, 400));
}

#[test]
fn test_suggest_styles_ranked_by_contrast() {
    let engine = engine();
    let image = solid(600, 600, [250, 250, 250]);
    let styles = engine.suggest_styles(&image, "Hello", Position::Center, 3).unwrap();
    assert_eq!(styles.len(), 3);
    // A white background never suggests white text first
    assert_ne!(styles[0].text_color, "white");
    for style in &styles {
        assert_eq!(style.font_family, engine.default_style().font_family);
        assert!(textoverlay::render(&image, "Hello", Position::Center, style).is_ok());
    }
}

#[test]
fn test_style_json_shape() {
    let value = serde_json::to_value(StyleConfig::default()).unwrap();
    assert_eq!(value["font_family"], "OpenSans-Regular");
    assert_eq!(value["font_size"], 32);
    assert_eq!(value["text_color"], "white");
    assert_eq!(value["blend_mode"], "overlay");
    assert_eq!(value["shadow"], true);

    let partial: StyleConfig = serde_json::from_str(r#"{"font_size": 20}"#).unwrap();
    assert_eq!(partial.font_size, 20);
    assert_eq!(partial.font_family, "OpenSans-Regular");
}

#[tokio::test]
async fn test_analyze_async_matches_sync() {
    let engine = engine();
    let image = Arc::new(noise(400, 300, 6));
    let expected = engine.analyze(&image, "Async").unwrap();
    let result = engine
        .analyze_async(image, "Async".to_string(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result, expected);
}

#[tokio::test]
async fn test_cancelled_async_analysis() {
    let token = CancellationToken::new();
    token.cancel();
    let err = engine()
        .analyze_async(Arc::new(noise(200, 200, 1)), "Stop".to_string(), token)
        .await
        .unwrap_err();
    assert_eq!(err, OverlayError::Cancelled);
}

#[tokio::test]
async fn test_slot_keeps_only_latest_analysis() {
    let engine = engine();
    let slot = AnalysisSlot::new();
    let image = Arc::new(noise(300, 300, 2));

    let first = engine.analyze_in_slot(&slot, image.clone(), "First".to_string()).await.unwrap();
    assert!(first.is_some());

    // A ticket taken before a newer analysis starts is stale
    let stale = slot.begin();
    let latest = engine.analyze_in_slot(&slot, image, "Second".to_string()).await.unwrap();
    assert!(latest.is_some());
    assert!(!slot.is_current(&stale));
    assert!(stale.token().is_cancelled());
}

#[test]
fn test_session_happy_path() {
    let mut session = OverlaySession::new(engine());
    assert_eq!(session.state(), SessionState::Empty);

    session.load_image(noise(500, 400, 12)).unwrap();
    session.set_text("Summer sale").unwrap();
    assert_eq!(session.state(), SessionState::ImageLoaded);

    let best = session.analyze().unwrap().best().position;
    assert_eq!(session.state(), SessionState::Analyzed);
    assert_eq!(session.selected_position(), Some(best));

    session.select_position(Position::TopCenter).unwrap();
    let recommended = session
        .placements()
        .unwrap()
        .get(Position::TopCenter)
        .recommended_font_size;
    assert_eq!(session.style().font_size, recommended);

    let fingerprint = session.render().unwrap().fingerprint();
    assert_eq!(session.state(), SessionState::Rendered);

    // Same inputs through the free function give the same pixels
    let direct = textoverlay::render(
        session.image().unwrap(),
        "Summer sale",
        Position::TopCenter,
        session.style(),
    )
    .unwrap();
    assert_eq!(direct.fingerprint(), fingerprint);
}

#[test]
fn test_session_failed_render_keeps_state() {
    let mut session = OverlaySession::new(engine());
    session.load_image(noise(300, 300, 3)).unwrap();
    session.set_text("Caption").unwrap();
    session.analyze().unwrap();
    session.render().unwrap();
    let before = session.rendered().unwrap().fingerprint();

    session
        .set_style(StyleConfig::default().with_font_family("Unknown"))
        .unwrap();
    let err = session.render().unwrap_err();
    assert!(matches!(err, OverlayError::InvalidStyle(_)));
    assert_eq!(session.state(), SessionState::Analyzed);
    assert_eq!(session.rendered().unwrap().fingerprint(), before);
}

#[test]
fn test_session_rejects_out_of_order_calls() {
    let mut session = OverlaySession::new(engine());
    assert!(matches!(session.render(), Err(OverlayError::InvalidState(_))));
    assert!(matches!(
        session.select_position(Position::Center),
        Err(OverlayError::InvalidState(_))
    ));
    assert!(matches!(session.analyze(), Err(OverlayError::InvalidState(_))));
}

#[test]
fn test_session_text_change_invalidates_analysis() {
    let mut session = OverlaySession::new(engine());
    session.load_image(noise(300, 300, 4)).unwrap();
    session.set_text("One").unwrap();
    session.analyze().unwrap();

    session.set_text("Two words").unwrap();
    assert_eq!(session.state(), SessionState::ImageLoaded);
    assert!(matches!(session.render(), Err(OverlayError::InvalidState(_))));
}

#[test]
fn test_session_ignores_superseded_analysis() {
    let mut session = OverlaySession::new(engine());
    session.load_image(noise(300, 300, 5)).unwrap();
    session.set_text("Race").unwrap();

    let stale = session.begin_analysis().unwrap();
    let current = session.begin_analysis().unwrap();
    let eng = engine();

    let stale_result = eng.analyze(&stale.image, &stale.text);
    assert!(!session.complete_analysis(&stale.ticket, stale_result).unwrap());
    assert_eq!(session.state(), SessionState::Analyzing);

    let result = eng.analyze(&current.image, &current.text);
    assert!(session.complete_analysis(&current.ticket, result).unwrap());
    assert_eq!(session.state(), SessionState::Analyzed);
}
