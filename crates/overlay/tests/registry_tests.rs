//! Tests for loading the tile source registry from YAML.

use overlay::TileSourceRegistry;
use overlay_common::{LayerKind, OverlayError, SourceSpec};
use test_utils::{temp_config_file, REGISTRY_YAML};

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_registry_file() {
    let file = temp_config_file(REGISTRY_YAML);
    let registry = TileSourceRegistry::load_from_file(file.path()).unwrap();

    let wind = registry.primary(LayerKind::Wind).unwrap();
    assert!(matches!(wind.source(), SourceSpec::UrlTemplate { .. }));
    assert_eq!(wind.attribution(), "OpenWeatherMap");
    assert!(wind.has_fallback());
    assert!(!wind.is_live());

    let fallback = registry.fallback(LayerKind::Precipitation).unwrap();
    assert_eq!(fallback.opacity(), 0.3);
    assert_eq!(fallback.source(), &SourceSpec::Solid { rgba: [100, 100, 255, 77] });
}

#[test]
fn test_missing_file() {
    let result = TileSourceRegistry::load_from_file("/nonexistent/registry.yaml");
    assert!(matches!(result, Err(OverlayError::Config(_))));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_every_kind_is_required() {
    let yaml = r#"
layers:
  - kind: temperature
    primary:
      source: { type: live }
"#;
    let err = TileSourceRegistry::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("no entry for precipitation"), "{}", err);
}

#[test]
fn test_template_placeholders_are_checked() {
    let yaml = REGISTRY_YAML.replace("wind_new/{z}/{x}/{y}.png", "wind_new/{z}/{x}.png");
    let err = TileSourceRegistry::from_yaml(&yaml).unwrap_err();
    assert!(err.to_string().contains("{y}"), "{}", err);
}

#[test]
fn test_live_fallback_is_rejected() {
    let yaml = REGISTRY_YAML.replace(
        "source: { type: solid, rgba: [100, 255, 100, 77] }",
        "source: { type: live }",
    );
    assert!(matches!(
        TileSourceRegistry::from_yaml(&yaml),
        Err(OverlayError::Config(_))
    ));
}

#[test]
fn test_opacity_out_of_range() {
    let yaml = REGISTRY_YAML.replace("opacity: 0.6", "opacity: 1.6");
    assert!(matches!(
        TileSourceRegistry::from_yaml(&yaml),
        Err(OverlayError::InvalidParameter { .. })
    ));
}

#[test]
fn test_unknown_kind_is_a_parse_error() {
    let yaml = REGISTRY_YAML.replace("kind: wind", "kind: humidity");
    assert!(matches!(
        TileSourceRegistry::from_yaml(&yaml),
        Err(OverlayError::Config(_))
    ));
}

#[test]
fn test_empty_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.yaml");
    std::fs::write(&path, "").unwrap();

    assert!(TileSourceRegistry::load_from_file(&path).is_err());
}
