/// Image filter interface
///
/// Perturbations (blur, glare, moire, ...) live outside the capture core.
/// They plug in through `ImageFilter` and are looked up by name.

use image::DynamicImage;
use std::collections::BTreeMap;

use crate::{Error, Result};

/// Valid severity levels
pub const LEVELS: [u8; 4] = [1, 2, 3, 4];

/// A validated severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Level(u8);

impl Level {
    pub fn new(level: u8) -> Result<Self> {
        if LEVELS.contains(&level) {
            Ok(Self(level))
        } else {
            Err(Error::InvalidConfig(format!(
                "filter level {} is not one of {:?}",
                level, LEVELS
            )))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

/// A named, stateless image perturbation
pub trait ImageFilter: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, level: Level, image: DynamicImage) -> DynamicImage;
}

/// No-op filter
#[derive(Debug, Default, Clone, Copy)]
pub struct Identity;

impl ImageFilter for Identity {
    fn name(&self) -> &str {
        "identity"
    }

    fn apply(&self, _level: Level, image: DynamicImage) -> DynamicImage {
        image
    }
}

/// Filters available by name
pub struct FilterRegistry {
    filters: BTreeMap<String, Box<dyn ImageFilter>>,
}

impl Default for FilterRegistry {
    /// Registry holding only the identity filter
    fn default() -> Self {
        let mut registry = Self {
            filters: BTreeMap::new(),
        };
        registry.register(Identity);
        registry
    }
}

impl FilterRegistry {
    /// Add a filter, replacing any filter with the same name
    pub fn register<F: ImageFilter + 'static>(&mut self, filter: F) {
        self.filters
            .insert(filter.name().to_string(), Box::new(filter));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Result<&dyn ImageFilter> {
        self.filters
            .get(name)
            .map(|f| f.as_ref())
            .ok_or_else(|| Error::UnknownFilter(name.to_string()))
    }

    /// Apply a single filter by name
    pub fn apply(&self, name: &str, level: Level, image: DynamicImage) -> Result<DynamicImage> {
        Ok(self.get(name)?.apply(level, image))
    }

    /// Apply several filters in order at the same level
    ///
    /// All names are resolved before any filter runs.
    pub fn apply_chain(
        &self,
        names: &[&str],
        level: Level,
        image: DynamicImage,
    ) -> Result<DynamicImage> {
        let chain = names
            .iter()
            .map(|name| self.get(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(chain
            .into_iter()
            .fold(image, |img, filter| filter.apply(level, img)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// Inverts every pixel; stands in for a real perturbation
    struct Invert;

    impl ImageFilter for Invert {
        fn name(&self) -> &str {
            "invert"
        }

        fn apply(&self, _level: Level, mut image: DynamicImage) -> DynamicImage {
            image.invert();
            image
        }
    }

    fn sample() -> DynamicImage {
        let mut img = RgbImage::new(2, 2);
        img.put_pixel(0, 0, Rgb([10, 20, 30]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_level_bounds() {
        assert!(Level::new(0).is_err());
        assert_eq!(Level::new(4).unwrap().get(), 4);
        assert!(Level::new(5).is_err());
    }

    #[test]
    fn test_identity_is_no_op() {
        let registry = FilterRegistry::default();
        let out = registry
            .apply("identity", Level::new(3).unwrap(), sample())
            .unwrap();
        assert_eq!(out, sample());
    }

    #[test]
    fn test_unknown_filter() {
        let registry = FilterRegistry::default();
        let err = registry
            .apply("moire", Level::new(1).unwrap(), sample())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownFilter(name) if name == "moire"));
    }

    #[test]
    fn test_chain_applies_in_order() {
        let mut registry = FilterRegistry::default();
        registry.register(Invert);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["identity", "invert"]);

        let level = Level::new(1).unwrap();
        let twice = registry
            .apply_chain(&["invert", "identity", "invert"], level, sample())
            .unwrap();
        assert_eq!(twice, sample());

        let once = registry.apply_chain(&["invert"], level, sample()).unwrap();
        assert_eq!(once.to_rgb8().get_pixel(0, 0), &Rgb([245, 235, 225]));
    }

    #[test]
    fn test_chain_resolves_names_first() {
        let registry = FilterRegistry::default();
        let result = registry.apply_chain(&["identity", "blur"], Level::new(1).unwrap(), sample());
        assert!(result.is_err());
    }
}
