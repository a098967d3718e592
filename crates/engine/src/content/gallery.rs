use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use image::ImageReader;
use tracing::warn;

use crate::app::rendering::PixelSurface;

const IMAGE_EXTENSIONS: [&str; 2] = ["png", "gif"];
const MAX_LOAD_ATTEMPTS: u32 = 3;
const PLACEHOLDER_SIDE: u32 = 16;

/// Category-organized image cache. Each category (TILESET, SPRITES, HEAD,
/// BODY, SWORD, ...) maps to a folder under the asset root; decoded images
/// are cached per key, failures are cached too so a missing file warns once
/// and then quietly serves the placeholder checker.
pub struct Gallery {
    root: PathBuf,
    categories: HashMap<String, String>,
    cache: HashMap<String, Option<PixelSurface>>,
    warned_missing: HashSet<String>,
    placeholder: PixelSurface,
}

impl Gallery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            categories: HashMap::new(),
            cache: HashMap::new(),
            warned_missing: HashSet::new(),
            placeholder: placeholder_surface(),
        }
    }

    pub fn register_category(&mut self, category: &str, folder: &str) {
        self.categories
            .insert(category.to_string(), folder.to_string());
    }

    pub fn placeholder(&self) -> &PixelSurface {
        &self.placeholder
    }

    /// Resolve an image, loading and caching on first use. Unknown
    /// categories and undecodable files degrade to the placeholder.
    pub fn image(&mut self, category: &str, name: &str) -> &PixelSurface {
        let key = format!("{category}/{name}");
        if !self.cache.contains_key(&key) {
            let loaded = self.load(category, name, &key);
            self.cache.insert(key.clone(), loaded);
        }
        match self.cache.get(&key).and_then(Option::as_ref) {
            Some(surface) => surface,
            None => &self.placeholder,
        }
    }

    fn load(&mut self, category: &str, name: &str, key: &str) -> Option<PixelSurface> {
        let Some(folder) = self.categories.get(category) else {
            if self.warned_missing.insert(key.to_string()) {
                warn!(category, name, "gallery_category_unregistered");
            }
            return None;
        };
        let folder = self.root.join(folder);

        for attempt in 1..=MAX_LOAD_ATTEMPTS {
            for extension in IMAGE_EXTENSIONS {
                let path = folder.join(format!("{name}.{extension}"));
                if !path.is_file() {
                    continue;
                }
                match decode_image(&path) {
                    Ok(surface) => return Some(surface),
                    Err(error) => {
                        warn!(path = %path.display(), attempt, %error, "gallery_decode_failed");
                    }
                }
            }
        }
        if self.warned_missing.insert(key.to_string()) {
            warn!(category, name, "gallery_image_missing");
        }
        None
    }
}

fn decode_image(path: &Path) -> Result<PixelSurface, String> {
    let image = ImageReader::open(path)
        .map_err(|error| error.to_string())?
        .decode()
        .map_err(|error| error.to_string())?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    PixelSurface::from_rgba(width, height, rgba.into_raw()).map_err(|error| error.to_string())
}

/// Magenta/black checker, the classic missing-asset look.
fn placeholder_surface() -> PixelSurface {
    let mut surface = PixelSurface::new(PLACEHOLDER_SIDE, PLACEHOLDER_SIDE);
    let half = PLACEHOLDER_SIDE / 2;
    for y in 0..PLACEHOLDER_SIDE {
        for x in 0..PLACEHOLDER_SIDE {
            let color = if (x < half) == (y < half) {
                [255, 0, 255, 255]
            } else {
                [30, 30, 30, 255]
            };
            surface.put_pixel(x, y, color);
        }
    }
    surface
}
