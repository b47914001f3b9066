use std::collections::HashMap;

use crate::models::Color;

/// Lowercase, trim and replace spaces with underscores.
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase().replace(' ', "_")
}

/// Condition label -> display color, with one fallback for unknown labels.
#[derive(Debug, Clone)]
pub struct ColorMap {
    colors: HashMap<String, Color>,
    fallback: Color,
}

impl ColorMap {
    pub fn new(fallback: Color) -> Self {
        Self {
            colors: HashMap::new(),
            fallback,
        }
    }

    pub fn with_color(mut self, label: &str, color: Color) -> Self {
        self.insert(label, color);
        self
    }

    pub fn insert(&mut self, label: &str, color: Color) {
        self.colors.insert(normalize_label(label), color);
    }

    pub fn color_for(&self, label: &str) -> Color {
        self.colors
            .get(&normalize_label(label))
            .copied()
            .unwrap_or(self.fallback)
    }

    pub fn fallback(&self) -> Color {
        self.fallback
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Color)> {
        self.colors.iter().map(|(label, color)| (label.as_str(), *color))
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl Default for ColorMap {
    fn default() -> Self {
        let named = |name| Color::parse(name).unwrap_or(Color::WHITE);
        Self::new(Color::WHITE)
            .with_color("caries", named("red"))
            .with_color("broken_tooth", named("orange"))
            .with_color("missing_tooth", named("blue"))
            .with_color("oral_lesion", named("green"))
            .with_color("oral_ulcer", named("purple"))
            .with_color("calculus", named("yellow"))
            .with_color("stain", named("brown"))
    }
}
