use anyhow::{Context, Result};
use smithay_client_toolkit::{
    compositor::{CompositorHandler, CompositorState},
    delegate_compositor, delegate_keyboard, delegate_output, delegate_pointer, delegate_registry,
    delegate_seat, delegate_shm, delegate_layer,
    output::{OutputHandler, OutputState},
    registry::{ProvidesRegistryState, RegistryState},
    seat::{
        keyboard::{KeyEvent, KeyboardHandler, Modifiers},
        pointer::{PointerEvent, PointerEventKind, PointerHandler},
        Capability, SeatHandler, SeatState,
    },
    shell::{
        wlr_layer::{
            LayerShell, LayerShellHandler, LayerSurface, LayerSurfaceConfigure,
        },
        WaylandSurface,
    },
    shm::{slot::SlotPool, Shm, ShmHandler},
};
use wayland_client::{
    globals::GlobalList,
    protocol::{wl_keyboard, wl_output, wl_pointer, wl_seat, wl_shm, wl_surface},
    Connection, QueueHandle,
};
use xkbcommon::xkb::{self, keysyms};
use crate::state::AppState;
use crate::ui::render::{CardPart, GridLayout, Renderer};

/// Linux input event code of the primary mouse button.
const BTN_LEFT: u32 = 0x110;

/// Grid navigation and editing commands decoded from a key press.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyAction {
    Close,
    Launch,
    Move(i32, i32),
    Details,
    DeleteChar,
    Type(String),
    Ignore,
}

pub fn key_action(raw_sym: u32, utf8: Option<&str>) -> KeyAction {
    match raw_sym {
        keysyms::KEY_Escape => KeyAction::Close,
        keysyms::KEY_Return | keysyms::KEY_KP_Enter => KeyAction::Launch,
        keysyms::KEY_Left => KeyAction::Move(-1, 0),
        keysyms::KEY_Right => KeyAction::Move(1, 0),
        keysyms::KEY_Up => KeyAction::Move(0, -1),
        keysyms::KEY_Down => KeyAction::Move(0, 1),
        keysyms::KEY_Tab => KeyAction::Details,
        keysyms::KEY_BackSpace => KeyAction::DeleteChar,
        _ => match utf8 {
            Some(text) if !text.is_empty() && !text.chars().any(|c| c.is_control()) => {
                KeyAction::Type(text.to_string())
            }
            _ => KeyAction::Ignore,
        },
    }
}

pub struct WaylandApp {
    pub registry_state: RegistryState,
    pub seat_state: SeatState,
    pub output_state: OutputState,
    pub compositor_state: CompositorState,
    pub shm_state: Shm,
    pub layer_shell_state: LayerShell,

    pub layer_surface: Option<LayerSurface>,
    pub pointer: Option<wl_pointer::WlPointer>,
    pub pool: Option<SlotPool>,
    pub width: u32,
    pub height: u32,
    pub first_configure: bool,
    pub should_exit: bool,

    pub state: AppState,
    pub renderer: Renderer,
}

impl WaylandApp {
    pub fn new(globals: &GlobalList, qh: &QueueHandle<Self>, state: AppState, renderer: Renderer) -> Result<Self> {
        let registry_state = RegistryState::new(globals);
        let seat_state = SeatState::new(globals, qh);
        let output_state = OutputState::new(globals, qh);
        let compositor_state = CompositorState::bind(globals, qh).context("wl_compositor not available")?;
        let shm_state = Shm::bind(globals, qh).context("wl_shm not available")?;
        let layer_shell_state = LayerShell::bind(globals, qh).context("zwlr_layer_shell_v1 not available")?;
        let (width, height) = (state.config.theme.width, state.config.theme.height);

        Ok(Self {
            registry_state,
            seat_state,
            output_state,
            compositor_state,
            shm_state,
            layer_shell_state,
            layer_surface: None,
            pointer: None,
            pool: None,
            width,
            height,
            first_configure: true,
            should_exit: false,
            state,
            renderer,
        })
    }

    pub fn draw(&mut self) {
        let Some(layer_surface) = &self.layer_surface else { return; };
        let (width, height) = (self.width, self.height);
        if width == 0 || height == 0 { return; }

        let Some(pool) = self.pool.as_mut() else { return; };

        let (buffer, canvas) = match pool.create_buffer(
            width as i32,
            height as i32,
            (width * 4) as i32,
            wl_shm::Format::Argb8888,
        ) {
            Ok(created) => created,
            Err(e) => {
                log::warn!("Could not create shm buffer: {}", e);
                return;
            }
        };

        if let Some(mut pixmap) = tiny_skia::PixmapMut::from_bytes(canvas, width, height) {
            self.renderer.draw(&mut pixmap, &self.state);

            // RGBA -> BGRA for Argb8888
            for chunk in canvas.chunks_exact_mut(4) {
                chunk.swap(0, 2);
            }

            let surface = layer_surface.wl_surface();
            surface.attach(Some(buffer.wl_buffer()), 0, 0);
            surface.damage(0, 0, width as i32, height as i32);
            surface.commit();
        }
    }

    fn handle_key(&mut self, action: KeyAction) {
        if self.state.details.is_some() {
            match action {
                KeyAction::Close | KeyAction::Details => self.state.close_details(),
                // A failed save stays visible in the status line.
                KeyAction::Launch => { let _ = self.state.save_details(); }
                KeyAction::DeleteChar => self.state.pop_description(),
                KeyAction::Type(text) => self.state.push_description(&text),
                KeyAction::Move(..) | KeyAction::Ignore => {}
            }
            return;
        }

        match action {
            KeyAction::Close => self.should_exit = true,
            KeyAction::Launch => self.launch_selected(),
            KeyAction::Move(dx, dy) => self.state.move_selection(dx, dy),
            KeyAction::Details => { let _ = self.state.open_details(); }
            KeyAction::DeleteChar => self.state.pop_query(),
            KeyAction::Type(text) => self.state.push_query(&text),
            KeyAction::Ignore => {}
        }
    }

    fn launch_selected(&mut self) {
        if self.state.get_selected().is_some()
            && self.state.launch_selected().is_ok()
            && self.state.config.general.close_on_launch
        {
            self.should_exit = true;
        }
    }

    fn handle_click(&mut self, x: f64, y: f64) {
        if self.state.details.is_some() {
            self.state.close_details();
            return;
        }

        let layout = GridLayout::new(&self.state.config.theme, self.height as f32, self.state.columns);
        let hit = layout.hit_test(x as f32, y as f32, self.state.selected_index, self.state.filtered_indices.len());
        let Some((index, part)) = hit else { return; };

        self.state.selected_index = index;
        match part {
            CardPart::Play => self.launch_selected(),
            CardPart::Artwork => { let _ = self.state.open_details(); }
        }
    }

    fn request_frame(&self, qh: &QueueHandle<Self>) {
        if let Some(layer_surface) = &self.layer_surface {
            layer_surface.wl_surface().frame(qh, layer_surface.wl_surface().clone());
            layer_surface.wl_surface().commit();
        }
    }
}

impl LayerShellHandler for WaylandApp {
    fn closed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _layer: &LayerSurface) {
        self.should_exit = true;
    }

    fn configure(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _layer: &LayerSurface,
        configure: LayerSurfaceConfigure,
        _serial: u32,
    ) {
        if configure.new_size.0 > 0 {
            self.width = configure.new_size.0;
        }
        if configure.new_size.1 > 0 {
            self.height = configure.new_size.1;
        }
        self.state.set_width(self.width);

        let needed = self.width as usize * self.height as usize * 4;
        if self.first_configure {
            self.first_configure = false;
            match SlotPool::new(needed, &self.shm_state) {
                Ok(pool) => self.pool = Some(pool),
                Err(e) => {
                    log::error!("Failed to create shm pool: {}", e);
                    self.should_exit = true;
                    return;
                }
            }
        }

        if let Some(pool) = &mut self.pool {
            if pool.len() < needed {
                if let Err(e) = pool.resize(needed) {
                    log::warn!("Failed to grow shm pool: {}", e);
                }
            }
        }

        self.draw();
    }
}

impl CompositorHandler for WaylandApp {
    fn scale_factor_changed(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &wl_surface::WlSurface, _: i32) {}

    fn transform_changed(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &wl_surface::WlSurface, _: wl_output::Transform) {}

    fn frame(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &wl_surface::WlSurface, _: u32) {
        self.draw();
    }

    fn surface_enter(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &wl_surface::WlSurface, _: &wl_output::WlOutput) {}

    fn surface_leave(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &wl_surface::WlSurface, _: &wl_output::WlOutput) {}
}

impl OutputHandler for WaylandApp {
    fn output_state(&mut self) -> &mut OutputState {
        &mut self.output_state
    }
    fn new_output(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_output::WlOutput) {}
    fn update_output(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_output::WlOutput) {}
    fn output_destroyed(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_output::WlOutput) {}
}

impl SeatHandler for WaylandApp {
    fn seat_state(&mut self) -> &mut SeatState {
        &mut self.seat_state
    }

    fn new_seat(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_seat::WlSeat) {}

    fn new_capability(&mut self, _: &Connection, qh: &QueueHandle<Self>, seat: wl_seat::WlSeat, capability: Capability) {
        if capability == Capability::Keyboard {
            if let Err(e) = self.seat_state.get_keyboard(qh, &seat, None) {
                log::warn!("Could not get keyboard: {}", e);
            }
        }
        if capability == Capability::Pointer && self.pointer.is_none() {
            match self.seat_state.get_pointer(qh, &seat) {
                Ok(pointer) => self.pointer = Some(pointer),
                Err(e) => log::warn!("Could not get pointer: {}", e),
            }
        }
    }

    fn remove_capability(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_seat::WlSeat, capability: Capability) {
        if capability == Capability::Pointer {
            if let Some(pointer) = self.pointer.take() {
                pointer.release();
            }
        }
    }

    fn remove_seat(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_seat::WlSeat) {}
}

impl KeyboardHandler for WaylandApp {
    fn enter(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_keyboard::WlKeyboard,
        _: &wl_surface::WlSurface,
        _: u32,
        _: &[u32],
        _: &[xkb::Keysym],
    ) {}

    fn leave(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &wl_keyboard::WlKeyboard, _: &wl_surface::WlSurface, _: u32) {}

    fn press_key(
        &mut self,
        _conn: &Connection,
        qh: &QueueHandle<Self>,
        _keyboard: &wl_keyboard::WlKeyboard,
        _serial: u32,
        event: KeyEvent,
    ) {
        let action = key_action(u32::from(event.keysym), event.utf8.as_deref());
        self.handle_key(action);
        self.request_frame(qh);
    }

    fn release_key(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &wl_keyboard::WlKeyboard, _: u32, _: KeyEvent) {}

    fn update_modifiers(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_keyboard::WlKeyboard,
        _serial: u32,
        _modifiers: Modifiers,
        _layout: u32,
    ) {}
}

impl PointerHandler for WaylandApp {
    fn pointer_frame(
        &mut self,
        _conn: &Connection,
        qh: &QueueHandle<Self>,
        _pointer: &wl_pointer::WlPointer,
        events: &[PointerEvent],
    ) {
        let mut clicked = false;
        for event in events {
            if let PointerEventKind::Press { button: BTN_LEFT, .. } = event.kind {
                self.handle_click(event.position.0, event.position.1);
                clicked = true;
            }
        }
        if clicked {
            self.request_frame(qh);
        }
    }
}

impl ShmHandler for WaylandApp {
    fn shm_state(&mut self) -> &mut Shm {
        &mut self.shm_state
    }
}

delegate_compositor!(WaylandApp);
delegate_output!(WaylandApp);
delegate_shm!(WaylandApp);
delegate_seat!(WaylandApp);
delegate_keyboard!(WaylandApp);
delegate_pointer!(WaylandApp);
delegate_layer!(WaylandApp);
delegate_registry!(WaylandApp);

impl ProvidesRegistryState for WaylandApp {
    fn registry(&mut self) -> &mut RegistryState {
        &mut self.registry_state
    }

    fn runtime_add_global(&mut self, _: &Connection, _: &QueueHandle<Self>, _: u32, _: &str, _: u32) {}
    fn runtime_remove_global(&mut self, _: &Connection, _: &QueueHandle<Self>, _: u32, _: &str) {}
}
