use affodent::ColorMap;
use affodent::annotation::normalize_label;

mod common;

use common::*;

#[test]
fn test_known_labels_resolve_regardless_of_spelling() {
    let map = ColorMap::default();
    let orange = Color::parse("orange").unwrap();

    assert_eq!(map.color_for("broken_tooth"), orange);
    assert_eq!(map.color_for("Broken Tooth"), orange);
    assert_eq!(map.color_for("  BROKEN TOOTH "), orange);
    assert_eq!(map.color_for("caries"), Color::rgb(255, 0, 0));
}

#[test]
fn test_unknown_labels_use_fallback() {
    let map = ColorMap::new(Color::rgb(128, 128, 128)).with_color("caries", Color::rgb(255, 0, 0));

    assert_eq!(map.color_for("gingivitis"), Color::rgb(128, 128, 128));
    assert_eq!(map.color_for(""), Color::rgb(128, 128, 128));
    assert_eq!(map.fallback(), Color::rgb(128, 128, 128));
}

#[test]
fn test_default_table_matches_demo_classes() {
    let map = ColorMap::default();
    assert_eq!(map.len(), 7);
    assert_eq!(map.fallback(), Color::WHITE);
    assert_eq!(map.color_for("stain"), Color::parse("brown").unwrap());
    assert_eq!(map.color_for("oral ulcer"), Color::parse("purple").unwrap());
}

#[test]
fn test_normalize_label() {
    assert_eq!(normalize_label("Oral Lesion"), "oral_lesion");
    assert_eq!(normalize_label(" missing tooth "), "missing_tooth");
    assert_eq!(normalize_label("calculus"), "calculus");
}

#[test]
fn test_color_parsing() {
    assert_eq!(Color::parse("#ff8000"), Some(Color::rgb(255, 128, 0)));
    assert_eq!(Color::parse("Red"), Some(Color::rgb(255, 0, 0)));
    assert_eq!(Color::parse("#ff80"), None);
    assert_eq!(Color::parse("#gg0000"), None);
    assert_eq!(Color::parse("not-a-color"), None);
    assert_eq!(Color::rgb(255, 128, 0).to_hex(), "#ff8000");
}
