use tiny_skia::{Paint, Color, Rect, Transform, PixmapMut, PixmapPaint, PathBuilder, Stroke};
use cosmic_text::{Attrs, Buffer, FontSystem, Metrics, SwashCache};
use crate::state::{AppState, DetailsView};
use crate::ui::thumbnails::{Thumbnail, ThumbnailCache};
use crate::config::ThemeConfig;

/// Gap between a card's edge and its contents.
pub const CARD_INSET: u32 = 10;
const NAME_HEIGHT: f32 = 24.0;
const PLAY_HEIGHT: f32 = 32.0;
const HEADER_HEIGHT: f32 = 60.0;
const STATUS_HEIGHT: f32 = 28.0;

pub struct Renderer {
    font_system: FontSystem,
    swash_cache: SwashCache,
    pub thumbnails: ThumbnailCache,
}

/// Index of the first grid row to draw so that `selected_row` is on screen.
pub fn first_visible_row(selected_row: usize, visible_rows: usize) -> usize {
    let visible_rows = visible_rows.max(1);
    if selected_row >= visible_rows {
        selected_row + 1 - visible_rows
    } else {
        0
    }
}

/// Which part of a card a point falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardPart {
    /// Thumbnail and name; opens the details panel.
    Artwork,
    Play,
}

/// Card geometry for a window of a given height, shared by drawing and pointer hit-testing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub left: f32,
    pub top: f32,
    pub card_width: f32,
    pub card_height: f32,
    pub spacing: f32,
    pub columns: usize,
    pub visible_rows: usize,
}

impl GridLayout {
    pub fn new(theme: &ThemeConfig, height: f32, columns: usize) -> Self {
        let inset = CARD_INSET as f32;
        let top = HEADER_HEIGHT + theme.padding;
        let bottom = height - theme.padding - STATUS_HEIGHT;
        let card_height = inset + theme.thumbnail_height as f32 + inset + NAME_HEIGHT + inset + PLAY_HEIGHT + inset;
        let visible_rows = ((bottom - top + theme.spacing) / (card_height + theme.spacing)).floor().max(1.0) as usize;
        Self {
            left: theme.padding,
            top,
            card_width: theme.card_width as f32,
            card_height,
            spacing: theme.spacing,
            columns: columns.max(1),
            visible_rows,
        }
    }

    /// Position in the filtered list of the first card drawn while `selected` is selected.
    pub fn first_index(&self, selected: usize) -> usize {
        first_visible_row(selected / self.columns, self.visible_rows) * self.columns
    }

    /// Top-left corner of the card in on-screen slot `slot`.
    pub fn card_origin(&self, slot: usize) -> (f32, f32) {
        let x = self.left + (slot % self.columns) as f32 * (self.card_width + self.spacing);
        let y = self.top + (slot / self.columns) as f32 * (self.card_height + self.spacing);
        (x, y)
    }

    /// Offset of the play button from the top of a card.
    pub fn play_offset(&self) -> f32 {
        self.card_height - CARD_INSET as f32 - PLAY_HEIGHT
    }

    /// Maps a point to the card under it, as a position in the filtered list of `count` cards.
    pub fn hit_test(&self, x: f32, y: f32, selected: usize, count: usize) -> Option<(usize, CardPart)> {
        if x < self.left || y < self.top {
            return None;
        }
        let step_x = self.card_width + self.spacing;
        let step_y = self.card_height + self.spacing;
        let column = ((x - self.left) / step_x) as usize;
        let row = ((y - self.top) / step_y) as usize;
        if column >= self.columns || row >= self.visible_rows {
            return None;
        }

        let within_x = x - self.left - column as f32 * step_x;
        let within_y = y - self.top - row as f32 * step_y;
        if within_x > self.card_width || within_y > self.card_height {
            return None;
        }

        let index = self.first_index(selected) + row * self.columns + column;
        if index >= count {
            return None;
        }
        let part = if within_y >= self.play_offset() { CardPart::Play } else { CardPart::Artwork };
        Some((index, part))
    }
}

impl Renderer {
    pub fn new(thumbnails: ThumbnailCache) -> Self {
        Self {
            font_system: FontSystem::new(),
            swash_cache: SwashCache::new(),
            thumbnails,
        }
    }

    pub fn insert_thumbnail(&mut self, directory: std::path::PathBuf, thumbnail: Thumbnail) {
        self.thumbnails.insert(directory, thumbnail);
    }

    pub fn draw(&mut self, pixmap: &mut PixmapMut, state: &AppState) {
        let theme = state.config.theme.clone();
        let bg_color = ThemeConfig::parse_color(&theme.background);
        let header_color = ThemeConfig::parse_color(&theme.header);
        let text_color = ThemeConfig::parse_color(&theme.text);

        pixmap.fill(Color::TRANSPARENT);

        let width = pixmap.width() as f32;
        let height = pixmap.height() as f32;

        let Some(rect) = Rect::from_xywh(0.0, 0.0, width, height) else { return; };
        let border_color = ThemeConfig::parse_color(&theme.border_color);
        self.draw_rounded_rect(pixmap, rect, theme.border_radius, bg_color, Some(border_color));

        if let Some(header) = Rect::from_xywh(0.0, 0.0, width, HEADER_HEIGHT) {
            let mut paint = Paint::default();
            paint.set_color(header_color);
            pixmap.fill_rect(header, &paint, Transform::identity(), None);
        }
        self.draw_text(pixmap, "CHOKZ LAUNCHER", theme.padding, 14.0, 26.0, text_color);

        let search_text = if state.query.is_empty() {
            "Type to search...".to_string()
        } else {
            format!("> {}", state.query)
        };
        let search_color = if state.query.is_empty() {
            Color::from_rgba8(120, 130, 140, 255)
        } else {
            text_color
        };
        let search_x = (width / 2.0).max(theme.padding + 260.0);
        self.draw_text(pixmap, &search_text, search_x, 20.0, 18.0, search_color);

        let layout = GridLayout::new(&theme, height, state.columns);

        if state.games.is_empty() {
            self.draw_text(pixmap, "No games yet. Add one with: chokz add <directory>", theme.padding, layout.top, 16.0, text_color);
        } else if state.filtered_indices.is_empty() {
            self.draw_text(pixmap, "No results found", theme.padding, layout.top, 16.0, Color::from_rgba8(150, 100, 100, 255));
        } else {
            self.draw_grid(pixmap, state, &theme, &layout);
        }

        if let Some(view) = &state.details {
            self.draw_details(pixmap, view, &theme);
        }

        if let Some(status) = &state.status {
            let error_color = ThemeConfig::parse_color(&theme.error_text);
            self.draw_text(pixmap, status, theme.padding, height - theme.padding - 20.0, 15.0, error_color);
        }
    }

    fn draw_grid(&mut self, pixmap: &mut PixmapMut, state: &AppState, theme: &ThemeConfig, layout: &GridLayout) {
        let text_color = ThemeConfig::parse_color(&theme.text);
        let card_color = ThemeConfig::parse_color(&theme.card);
        let selection_color = ThemeConfig::parse_color(&theme.selection_background);
        let inset = CARD_INSET as f32;

        let first = layout.first_index(state.selected_index);
        for (i, &game_idx) in state.filtered_indices.iter().enumerate().skip(first).take(layout.visible_rows * layout.columns) {
            let (name, entry) = &state.games[game_idx];
            let (x, y) = layout.card_origin(i - first);

            let Some(card) = Rect::from_xywh(x, y, layout.card_width, layout.card_height) else { continue; };
            let outline = (i == state.selected_index).then_some(selection_color);
            self.draw_rounded_rect(pixmap, card, theme.border_radius, card_color, outline);

            let thumb_x = x + inset;
            let thumb_y = y + inset;
            match self.thumbnails.get(&entry.directory) {
                Some(Thumbnail::Image(image)) => {
                    pixmap.draw_pixmap(thumb_x as i32, thumb_y as i32, image.as_ref(), &PixmapPaint::default(), Transform::identity(), None);
                }
                _ => {
                    let (w, h) = self.thumbnails.size();
                    if let Some(placeholder) = Rect::from_xywh(thumb_x, thumb_y, w as f32, h as f32) {
                        let bg = ThemeConfig::parse_color(&theme.header);
                        self.draw_rounded_rect(pixmap, placeholder, theme.border_radius / 2.0, bg, None);
                    }
                    let initial: String = name.chars().next().map(|c| c.to_uppercase().collect()).unwrap_or_default();
                    self.draw_text(pixmap, &initial, thumb_x + w as f32 / 2.0 - 16.0, thumb_y + h as f32 / 2.0 - 32.0, 64.0, text_color);
                }
            }

            let name_y = thumb_y + theme.thumbnail_height as f32 + inset;
            self.draw_text(pixmap, name, thumb_x, name_y, 16.0, text_color);

            let play_y = y + layout.play_offset();
            if let Some(play) = Rect::from_xywh(thumb_x, play_y, layout.card_width - 2.0 * inset, PLAY_HEIGHT) {
                self.draw_rounded_rect(pixmap, play, theme.border_radius / 2.0, selection_color, None);
                self.draw_text(pixmap, "PLAY", thumb_x + play.width() / 2.0 - 20.0, play_y + 6.0, 16.0, text_color);
            }
        }
    }

    fn draw_details(&mut self, pixmap: &mut PixmapMut, view: &DetailsView, theme: &ThemeConfig) {
        let text_color = ThemeConfig::parse_color(&theme.text);
        let width = pixmap.width() as f32;
        let height = pixmap.height() as f32;

        if let Some(shade) = Rect::from_xywh(0.0, 0.0, width, height) {
            let mut paint = Paint::default();
            paint.set_color(Color::from_rgba8(0, 0, 0, 160));
            pixmap.fill_rect(shade, &paint, Transform::identity(), None);
        }

        let panel_w = (width - 4.0 * theme.padding).clamp(1.0, 560.0);
        let panel_h = 240.0_f32.min(height - 2.0 * theme.padding).max(1.0);
        let x = (width - panel_w) / 2.0;
        let y = (height - panel_h) / 2.0;
        let Some(panel) = Rect::from_xywh(x, y, panel_w, panel_h) else { return; };
        let card_color = ThemeConfig::parse_color(&theme.card);
        let border_color = ThemeConfig::parse_color(&theme.selection_background);
        self.draw_rounded_rect(pixmap, panel, theme.border_radius, card_color, Some(border_color));

        let left = x + theme.padding;
        self.draw_text(pixmap, &view.name, left, y + theme.padding, 22.0, text_color);
        self.draw_text(pixmap, &format!("Description: {}_", view.draft), left, y + theme.padding + 44.0, 16.0, text_color);
        self.draw_text(pixmap, &format!("Developer: {}", view.details.developer), left, y + theme.padding + 100.0, 16.0, text_color);
        self.draw_text(pixmap, &format!("Version: {}", view.details.version), left, y + theme.padding + 128.0, 16.0, text_color);

        let hint = Color::from_rgba8(120, 130, 140, 255);
        self.draw_text(pixmap, "Enter saves the description, Esc closes", left, y + panel_h - theme.padding - 20.0, 14.0, hint);
    }

    fn draw_rounded_rect(&self, pixmap: &mut PixmapMut, rect: Rect, radius: f32, fill: Color, stroke: Option<Color>) {
        let mut pb = PathBuilder::new();
        let x = rect.left();
        let y = rect.top();
        let w = rect.width();
        let h = rect.height();
        let radius = radius.min(w / 2.0).min(h / 2.0);

        pb.move_to(x + radius, y);
        pb.line_to(x + w - radius, y);
        pb.quad_to(x + w, y, x + w, y + radius);
        pb.line_to(x + w, y + h - radius);
        pb.quad_to(x + w, y + h, x + w - radius, y + h);
        pb.line_to(x + radius, y + h);
        pb.quad_to(x, y + h, x, y + h - radius);
        pb.line_to(x, y + radius);
        pb.quad_to(x, y, x + radius, y);
        pb.close();

        if let Some(path) = pb.finish() {
            let mut paint = Paint::default();
            paint.set_color(fill);
            paint.anti_alias = true;
            pixmap.fill_path(&path, &paint, tiny_skia::FillRule::Winding, Transform::identity(), None);

            if let Some(s_color) = stroke {
                let mut s_paint = Paint::default();
                s_paint.set_color(s_color);
                s_paint.anti_alias = true;
                let stroke_obj = Stroke { width: 3.0, ..Default::default() };
                pixmap.stroke_path(&path, &s_paint, &stroke_obj, Transform::identity(), None);
            }
        }
    }

    fn draw_text(&mut self, pixmap: &mut PixmapMut, text: &str, x: f32, y: f32, size: f32, color: Color) {
        let mut buffer = Buffer::new(&mut self.font_system, Metrics::new(size, size * 1.2));
        buffer.set_size(&mut self.font_system, Some(pixmap.width() as f32 - x), None);
        buffer.set_text(&mut self.font_system, text, Attrs::new(), cosmic_text::Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.font_system, false);

        let text_color = cosmic_text::Color::rgba(
            (color.red() * 255.0) as u8,
            (color.green() * 255.0) as u8,
            (color.blue() * 255.0) as u8,
            (color.alpha() * 255.0) as u8,
        );

        buffer.draw(&mut self.font_system, &mut self.swash_cache, text_color, |draw_x, draw_y, w, h, color| {
            let draw_x = draw_x + x as i32;
            let draw_y = draw_y + y as i32;
            if w == 0 || h == 0 { return; }
            if draw_x >= 0 && draw_y >= 0 && draw_x < pixmap.width() as i32 && draw_y < pixmap.height() as i32 {
                let paint = Paint {
                    shader: tiny_skia::Shader::SolidColor(tiny_skia::Color::from_rgba8(color.r(), color.g(), color.b(), color.a())),
                    ..Paint::default()
                };
                if let Some(r) = Rect::from_xywh(draw_x as f32, draw_y as f32, w as f32, h as f32) {
                    pixmap.fill_rect(r, &paint, Transform::identity(), None);
                }
            }
        });
    }
}
