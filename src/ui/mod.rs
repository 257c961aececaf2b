pub mod render;
pub mod thumbnails;
pub mod wayland;

use std::path::PathBuf;
use anyhow::{anyhow, Result};
use calloop::EventLoop;
use calloop_wayland_source::WaylandSource;
use smithay_client_toolkit::{
    shell::wlr_layer::{Anchor, KeyboardInteractivity, Layer},
    shell::WaylandSurface,
};
use wayland_client::{Connection, globals::registry_queue_init};
use crate::catalog::CatalogStore;
use crate::config::Config;
use crate::state::AppState;
use self::render::{Renderer, CARD_INSET};
use self::thumbnails::{Thumbnail, ThumbnailCache};
use self::wayland::WaylandApp;

/// Opens the game grid on a layer surface and runs until it is closed.
pub fn run(config: Config, store: CatalogStore) -> Result<()> {
    let mut event_loop: EventLoop<WaylandApp> = EventLoop::try_new()?;
    let conn = Connection::connect_to_env()?;
    let (globals, event_queue) = registry_queue_init::<WaylandApp>(&conn)?;
    let qh = event_queue.handle();

    let theme = &config.theme;
    let thumb_size = (theme.card_width.saturating_sub(2 * CARD_INSET).max(1), theme.thumbnail_height.max(1));
    let (tx_thumbs, rx_thumbs) = calloop::channel::channel::<(PathBuf, Thumbnail)>();
    let renderer = Renderer::new(ThumbnailCache::new(thumb_size, tx_thumbs));

    let (width, height) = (theme.width, theme.height);
    let app_state = AppState::new(config, store);
    let mut app = WaylandApp::new(&globals, &qh, app_state, renderer)?;

    let surface = app.compositor_state.create_surface(&qh);
    let layer_surface = app.layer_shell_state.create_layer_surface(
        &qh,
        surface,
        Layer::Overlay,
        Some("chokz"),
        None,
    );
    layer_surface.set_anchor(Anchor::empty());
    layer_surface.set_size(width, height);
    layer_surface.set_keyboard_interactivity(KeyboardInteractivity::Exclusive);
    layer_surface.commit();
    app.layer_surface = Some(layer_surface);

    event_loop.handle().insert_source(rx_thumbs, |event, _, app: &mut WaylandApp| {
        if let calloop::channel::Event::Msg((directory, thumbnail)) = event {
            app.renderer.insert_thumbnail(directory, thumbnail);
            app.draw();
        }
    }).map_err(|e| anyhow!("registering thumbnail channel: {}", e.error))?;

    event_loop.handle().insert_source(
        WaylandSource::new(conn.clone(), event_queue),
        |_, queue, app| queue.dispatch_pending(app),
    ).map_err(|e| anyhow!("registering wayland source: {}", e.error))?;

    log::info!("Grid window open with {} games", app.state.games.len());
    while !app.should_exit {
        event_loop.dispatch(None, &mut app)?;
    }
    Ok(())
}
