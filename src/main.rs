//! Barrels entry point
//!
//! Handles platform-specific initialization and wires browser events to the
//! session.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::collections::{HashMap, VecDeque};
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::{JsFuture, spawn_local};
    use web_sys::{HtmlElement, KeyboardEvent, PointerEvent};

    use barrels::audio::{AudioManager, Clip};
    use barrels::consts::*;
    use barrels::game::{Command, Event, Session, TimerId, dispatch};
    use barrels::platform::Hover;
    use barrels::platform::web::Stage;
    use barrels::settings::Settings;

    /// Game instance holding all state
    struct App {
        session: Session,
        stage: Stage,
        audio: AudioManager,
        /// Browser timeout handles of armed timers
        timers: HashMap<TimerId, i32>,
        /// Clips whose end the session asked to hear about
        awaiting: HashMap<Clip, bool>,
        /// Times each clip was started, so a refusal of an older play is ignored
        plays: HashMap<Clip, u64>,
        hover: Hover,
    }

    /// Feed an event through the session and execute what it asks for.
    /// Events raised while executing are queued, never nested.
    fn send(app: &Rc<RefCell<App>>, event: Event) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            let cmds = dispatch(&mut app.borrow_mut().session, event);
            for cmd in cmds {
                execute(app, cmd, &mut queue);
            }
        }
    }

    fn execute(app: &Rc<RefCell<App>>, cmd: Command, queue: &mut VecDeque<Event>) {
        match cmd {
            Command::Play { clip, notify } => {
                let (promise, play) = {
                    let mut a = app.borrow_mut();
                    a.awaiting.insert(clip, notify);
                    let play = a.plays.entry(clip).or_insert(0);
                    *play += 1;
                    let play = *play;
                    (a.audio.play(clip), play)
                };
                match promise {
                    Some(promise) => {
                        let app_cb = app.clone();
                        spawn_local(async move {
                            if let Err(e) = JsFuture::from(promise).await {
                                log::warn!("{} was refused: {:?}", clip.name(), e);
                                let current = app_cb.borrow().plays.get(&clip).copied();
                                if current == Some(play) {
                                    clip_finished(&app_cb, clip);
                                }
                            }
                        });
                    }
                    None if notify => {
                        app.borrow_mut().awaiting.insert(clip, false);
                        queue.push_back(Event::ClipEnded(clip));
                    }
                    None => {}
                }
            }
            Command::StartTimer {
                id,
                timer,
                delay_ms,
            } => {
                let Some(window) = web_sys::window() else {
                    return;
                };
                let app_cb = app.clone();
                let callback = Closure::once_into_js(move || {
                    app_cb.borrow_mut().timers.remove(&id);
                    send(&app_cb, Event::TimerFired { id, timer });
                });
                match window.set_timeout_with_callback_and_timeout_and_arguments_0(
                    callback.unchecked_ref(),
                    delay_ms as i32,
                ) {
                    Ok(handle) => {
                        app.borrow_mut().timers.insert(id, handle);
                    }
                    Err(e) => log::error!("Failed to arm {:?}: {:?}", timer, e),
                }
            }
            Command::CancelTimer(id) => {
                if let Some(handle) = app.borrow_mut().timers.remove(&id) {
                    if let Some(window) = web_sys::window() {
                        window.clear_timeout_with_handle(handle);
                    }
                }
            }
            other => {
                let mut a = app.borrow_mut();
                a.hover.observe(&other);
                a.stage.apply(&other);
            }
        }
    }

    /// A clip stopped or will never start; tell the session if it asked
    fn clip_finished(app: &Rc<RefCell<App>>, clip: Clip) {
        let notify = app
            .borrow_mut()
            .awaiting
            .insert(clip, false)
            .unwrap_or(false);
        if notify {
            send(app, Event::ClipEnded(clip));
        }
    }

    /// Resolve after `ms` milliseconds
    async fn sleep(ms: u32) {
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            if let Some(window) = web_sys::window() {
                let _ = window
                    .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms as i32);
            }
        });
        let _ = JsFuture::from(promise).await;
    }

    /// Resolve on the next mouse press on `el`
    async fn click(el: &HtmlElement) {
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            el.set_onmousedown(Some(&resolve));
        });
        let _ = JsFuture::from(promise).await;
        el.set_onmousedown(None);
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Barrels starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let mut settings = Settings::load();
        let query = window.location().search().unwrap_or_default();
        settings.apply_query(&query);
        let settings = settings.validated();
        // Query overrides stick for later visits
        if !query.is_empty() {
            settings.save();
        }

        let stage = Stage::new(&document, settings.num_barrels)?;

        // Wait for audio
        let mut audio = AudioManager::new(settings.effective_volume());
        loop {
            audio.poll();
            stage.set_progress(&audio.bank().progress_message());
            if audio.bank().is_settled() {
                break;
            }
            sleep(MEDIA_POLL_MS).await;
        }

        let errors = audio.bank().errors();
        if errors > 0 {
            stage.set_progress(&format!("{} errors found, click to continue", errors));
            log::warn!("{} audio clips missing", errors);
            click(stage.startup()).await;
        } else {
            sleep(STARTUP_DELAY_MS).await;
        }

        let seed = js_sys::Date::now() as u64;
        let app = Rc::new(RefCell::new(App {
            session: Session::new(&settings, seed),
            stage,
            audio,
            timers: HashMap::new(),
            awaiting: HashMap::new(),
            plays: HashMap::new(),
            hover: Hover::new(),
        }));
        log::info!("Session created with seed: {}", seed);

        setup_audio_handlers(&app);
        setup_input_handlers(&app)?;

        let viewport = app.borrow().stage.viewport();
        send(&app, Event::Resize(viewport));
        send(&app, Event::Start);

        log::info!("Barrels running!");
        Ok(())
    }

    fn setup_audio_handlers(app: &Rc<RefCell<App>>) {
        for clip in Clip::ALL {
            let a = app.borrow();
            let Some(element) = a.audio.element(clip) else {
                continue;
            };
            let app_cb = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                clip_finished(&app_cb, clip);
            });
            let _ =
                element.add_event_listener_with_callback("ended", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_input_handlers(app: &Rc<RefCell<App>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let board = app.borrow().stage.board().clone();

        // Pointer down: a tap on whatever barrel is under it, then a dismiss
        // for the board itself (same order as DOM bubbling)
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.prevent_default();
                let hit = {
                    let a = app.borrow();
                    let point = a.stage.board_point(event.client_x(), event.client_y());
                    a.session.geometry.hit_test(point)
                };
                if let Some(index) = hit {
                    app.borrow_mut().hover.clear();
                    send(&app, Event::Tap(index));
                }
                send(&app, Event::Dismiss);
            });
            board.add_event_listener_with_callback(
                "pointerdown",
                closure.as_ref().unchecked_ref(),
            )?;
            closure.forget();
        }

        // Any key dismisses the plate
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                event.prevent_default();
                send(&app, Event::Dismiss);
            });
            board.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Hover highlight
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let events = {
                    let mut a = app.borrow_mut();
                    let point = a.stage.board_point(event.client_x(), event.client_y());
                    let hit = a.session.geometry.hit_test(point);
                    a.hover.moved(hit)
                };
                for event in events {
                    send(&app, event);
                }
            });
            board.add_event_listener_with_callback(
                "pointermove",
                closure.as_ref().unchecked_ref(),
            )?;
            closure.forget();
        }

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                let left = app.borrow_mut().hover.left();
                if let Some(event) = left {
                    send(&app, event);
                }
            });
            board.add_event_listener_with_callback(
                "pointerleave",
                closure.as_ref().unchecked_ref(),
            )?;
            closure.forget();
        }

        // Resize
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let viewport = app.borrow().stage.viewport();
                send(&app, Event::Resize(viewport));
            });
            window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // No context menu on long press
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
                event.prevent_default();
            });
            window
                .add_event_listener_with_callback("contextmenu", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run().await
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Barrels (native) starting...");
    log::info!("The board needs a browser - run with `trunk serve` for the web version");

    demo_round();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Play one headless round: knock on the marked barrel and wait out the plate
#[cfg(not(target_arch = "wasm32"))]
fn demo_round() {
    use barrels::game::{Event, Phase, Session};
    use barrels::layout::Viewport;
    use barrels::platform::Headless;
    use barrels::settings::Settings;

    let settings = Settings::load();
    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let mut rt = Headless::new(Session::new(&settings, seed));
    rt.send(Event::Resize(Viewport::new(1280.0, 800.0)));

    let plan = &rt.session.plan;
    println!(
        "{} barrels in rows {:?} ({} columns)",
        plan.len(),
        plan.rows(),
        plan.num_columns()
    );
    if let Some(g) = &rt.stage.geometry {
        println!("Radius at 1280x800: {}px", g.radius);
    }

    rt.send(Event::Start);
    while rt.session.phase == Phase::Startup && rt.step() {}

    let target = rt.session.target;
    println!(
        "Barrel {} shows hour {}, the secret is barrel {}",
        rt.session.marked_barrel(),
        rt.session.hour,
        target
    );
    rt.send(Event::Tap(target));
    while rt.session.phase != Phase::Waiting && rt.step() {}
    if let Some(verdict) = rt.stage.verdict {
        println!("Plate: {}", verdict.message());
    }

    // Nobody dismisses: the plate times out on its own
    while rt.session.phase == Phase::Waiting && rt.step() {}
    println!("Back to {:?} after {} ms", rt.session.phase, rt.now_ms());
}
