use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Sender, channel};
use std::thread;
use image::ImageReader;
use thiserror::Error;
use tiny_skia::{Pixmap, Transform};

/// File names looked up in a game directory, in order of preference.
pub const THUMBNAIL_NAMES: [&str; 3] = ["game_logo.png", "game_logo.jpg", "game_logo.svg"];

#[derive(Debug, Clone)]
pub enum Thumbnail {
    Image(Pixmap),
    /// The card draws its own stand-in.
    Placeholder,
}

#[derive(Error, Debug)]
enum AssetError {
    #[error("no thumbnail file")]
    Missing,
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("invalid image size")]
    Size,
}

/// Resolves the card image for a game directory. Never fails and never writes anything.
pub fn resolve_thumbnail(directory: &Path, width: u32, height: u32) -> Thumbnail {
    match load_first(directory, width, height) {
        Ok(pixmap) => Thumbnail::Image(pixmap),
        Err(e) => {
            log::debug!("Thumbnail for {:?} falls back to placeholder: {}", directory, e);
            Thumbnail::Placeholder
        }
    }
}

fn load_first(directory: &Path, width: u32, height: u32) -> Result<Pixmap, AssetError> {
    let path = THUMBNAIL_NAMES.iter()
        .map(|name| directory.join(name))
        .find(|p| p.is_file())
        .ok_or(AssetError::Missing)?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("svg") => load_svg(&path, width, height),
        _ => load_raster(&path, width, height),
    }
}

fn load_raster(path: &Path, width: u32, height: u32) -> Result<Pixmap, AssetError> {
    let img = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| AssetError::Decode(e.to_string()))?
        .decode()
        .map_err(|e| AssetError::Decode(e.to_string()))?;
    let img = img.resize_exact(width, height, image::imageops::FilterType::Lanczos3);
    let mut rgba = img.into_rgba8();

    // tiny-skia wants premultiplied alpha
    for pixel in rgba.chunks_exact_mut(4) {
        let a = pixel[3] as f32 / 255.0;
        pixel[0] = (pixel[0] as f32 * a) as u8;
        pixel[1] = (pixel[1] as f32 * a) as u8;
        pixel[2] = (pixel[2] as f32 * a) as u8;
    }

    let (w, h) = (rgba.width(), rgba.height());
    let size = tiny_skia::IntSize::from_wh(w, h).ok_or(AssetError::Size)?;
    Pixmap::from_vec(rgba.into_vec(), size).ok_or(AssetError::Size)
}

fn load_svg(path: &Path, width: u32, height: u32) -> Result<Pixmap, AssetError> {
    let opt = resvg::usvg::Options::default();
    let svg_data = fs::read(path).map_err(|e| AssetError::Decode(e.to_string()))?;
    let tree = resvg::usvg::Tree::from_data(&svg_data, &opt)
        .map_err(|e| AssetError::Decode(e.to_string()))?;

    let mut pixmap = Pixmap::new(width, height).ok_or(AssetError::Size)?;
    let transform = Transform::from_scale(
        width as f32 / tree.size().width(),
        height as f32 / tree.size().height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());
    Ok(pixmap)
}

/// Resolved thumbnails keyed by game directory, filled by a background thread.
pub struct ThumbnailCache {
    cache: HashMap<PathBuf, Thumbnail>,
    pending: HashSet<PathBuf>,
    size: (u32, u32),
    request_tx: Sender<PathBuf>,
}

impl ThumbnailCache {
    pub fn new(size: (u32, u32), response_tx: calloop::channel::Sender<(PathBuf, Thumbnail)>) -> Self {
        let (request_tx, request_rx) = channel::<PathBuf>();

        thread::spawn(move || {
            while let Ok(directory) = request_rx.recv() {
                let thumbnail = resolve_thumbnail(&directory, size.0, size.1);
                if response_tx.send((directory, thumbnail)).is_err() {
                    break;
                }
            }
        });

        Self {
            cache: HashMap::new(),
            pending: HashSet::new(),
            size,
            request_tx,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Returns the thumbnail if resolved, queueing it for the loader otherwise.
    pub fn get(&mut self, directory: &Path) -> Option<&Thumbnail> {
        if !self.cache.contains_key(directory) && !self.pending.contains(directory) {
            self.pending.insert(directory.to_path_buf());
            let _ = self.request_tx.send(directory.to_path_buf());
        }
        self.cache.get(directory)
    }

    pub fn insert(&mut self, directory: PathBuf, thumbnail: Thumbnail) {
        self.pending.remove(&directory);
        self.cache.insert(directory, thumbnail);
    }
}
