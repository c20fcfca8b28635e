use std::{cell::RefCell, io, rc::Rc};

use idle_fortune::game::save::LocalStorageSlot;
use idle_fortune::game::state::{TICKS_PER_SECOND, TICK_SECONDS};
use idle_fortune::game::{render, IdleGame};
use idle_fortune::input::{pixel_x_to_col, pixel_y_to_row, ClickState, InputEvent};
use idle_fortune::logging;
use idle_fortune::time::FrameClock;
use log::{debug, LevelFilter};
use ratzilla::event::{KeyCode, MouseButton, MouseEventKind};
use ratzilla::ratatui::Terminal;
use ratzilla::{DomBackend, WebRenderer};

/// Query the grid container's bounding rect and convert page pixels to a cell.
fn dom_pixel_to_cell(mouse_x: u32, mouse_y: u32, cs: &ClickState) -> Option<(u16, u16)> {
    let window = web_sys::window()?;
    let document = window.document()?;

    // DomBackend creates a <div> as the grid container inside <body>.
    let grid = document.query_selector("body > div").ok()??;
    let rect = grid.get_bounding_client_rect();

    let col = pixel_x_to_col(mouse_x as f64 - rect.left(), rect.width(), cs.terminal_cols)?;
    let row = pixel_y_to_row(mouse_y as f64 - rect.top(), rect.height(), cs.terminal_rows)?;
    Some((col, row))
}

/// Monotonic milliseconds for the frame clock.
fn performance_now() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

fn main() -> io::Result<()> {
    console_error_panic_hook::set_once();
    logging::init(if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });

    let game = Rc::new(RefCell::new(IdleGame::open(
        LocalStorageSlot::new(),
        js_sys::Date::now(),
    )));
    let clock = Rc::new(RefCell::new(FrameClock::new(TICKS_PER_SECOND)));
    let click_state = Rc::new(RefCell::new(ClickState::new()));
    let backend = DomBackend::new()?;
    let terminal = Terminal::new(backend)?;

    // Mouse/touch click handler
    terminal.on_mouse_event({
        let game = game.clone();
        let click_state = click_state.clone();
        move |mouse_event| {
            if mouse_event.event != MouseEventKind::Pressed
                || mouse_event.button != MouseButton::Left
            {
                return;
            }

            let cs = click_state.borrow();
            if cs.terminal_rows == 0 || cs.terminal_cols == 0 {
                return;
            }
            let action = dom_pixel_to_cell(mouse_event.x, mouse_event.y, &cs)
                .and_then(|(col, row)| cs.hit_test(col, row));
            drop(cs);

            debug!("click at ({}, {}) -> {:?}", mouse_event.x, mouse_event.y, action);
            if let Some(id) = action {
                game.borrow_mut().handle_input(&InputEvent::Click(id));
            }
        }
    });

    // Keyboard handler
    terminal.on_key_event({
        let game = game.clone();
        move |key_event| {
            let event = match key_event.code {
                KeyCode::Char(c) => InputEvent::Key(c.to_ascii_lowercase()),
                KeyCode::Enter => InputEvent::Key('\n'),
                KeyCode::Esc => InputEvent::Key('\u{1b}'),
                _ => return,
            };
            game.borrow_mut().handle_input(&event);
        }
    });

    terminal.draw_web({
        let click_state = click_state.clone();
        move |f| {
            let steps = clock.borrow_mut().update(performance_now());
            {
                let mut g = game.borrow_mut();
                g.observe_clock(js_sys::Date::now());
                // Whole ticks plus any background-tab lump, saved once per frame.
                g.tick(steps.elapsed_seconds(TICK_SECONDS));
            }

            let size = f.area();
            {
                let mut cs = click_state.borrow_mut();
                cs.terminal_cols = size.width;
                cs.terminal_rows = size.height;
                cs.clear_targets();
            }

            render::render(&*game.borrow(), f, size, &click_state);
        }
    });

    Ok(())
}
