//! Browser stage
//!
//! Builds the DOM for the startup screen, the barrel wall and the plate, and
//! turns render commands into style changes. Audio and timers are handled by
//! the caller; this only draws.

use glam::Vec2;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement, HtmlImageElement};

use crate::game::{Command, PlatePose, PlateTransform, Transition, Verdict};
use crate::layout::{Geometry, Viewport};

const STYLE: &str = "
html, body { margin: 0; height: 100%; overflow: hidden; background: #2b1d0e; }
#startup { position: absolute; inset: 0; display: flex; align-items: center;
    justify-content: center; color: #e8d9b5; font: 18px sans-serif; }
#board { position: absolute; inset: 0; outline: none; }
.invisible { display: none; }
.visible { display: block; }
div.barrel { position: absolute; }
div.barrel img { position: absolute; left: 0; top: 0; width: 100%; height: 100%;
    -webkit-user-drag: none; user-select: none; pointer-events: none; }
img.barrel-image { transition: transform 1s; }
img.highlight { opacity: 0; }
#plate { position: absolute; left: 50%; bottom: 50%; transform: scale(0);
    background: url(images/plate.png) center / 100% 100% no-repeat;
    color: #3a2410; font-family: serif; display: flex; align-items: center; }
#plate-content { width: 100%; text-align: center; }
#plate-content.success { font-weight: bold; }
";

/// DOM handles for everything the game draws
pub struct Stage {
    document: Document,
    startup: HtmlElement,
    board: HtmlElement,
    barrels: Vec<HtmlElement>,
    images: Vec<HtmlElement>,
    highlights: Vec<HtmlElement>,
    plate: HtmlElement,
    content: HtmlElement,
    geometry: Option<Geometry>,
}

fn html(document: &Document, tag: &str) -> Result<HtmlElement, JsValue> {
    document.create_element(tag)?.dyn_into::<HtmlElement>().map_err(JsValue::from)
}

fn image(document: &Document, src: &str, class: &str) -> Result<HtmlImageElement, JsValue> {
    let img = document
        .create_element("img")?
        .dyn_into::<HtmlImageElement>()
        .map_err(JsValue::from)?;
    img.set_src(src);
    img.set_class_name(class);
    img.set_draggable(false);
    Ok(img)
}

fn px(v: f32) -> String {
    format!("{}px", v.round())
}

impl Stage {
    /// Build the page under `<body>`
    pub fn new(document: &Document, barrels: usize) -> Result<Self, JsValue> {
        let body = document.body().ok_or("no body")?;

        let style = document.create_element("style")?;
        style.set_text_content(Some(STYLE));
        body.append_child(&style)?;

        let startup = html(document, "div")?;
        startup.set_id("startup");
        body.append_child(&startup)?;

        let board = html(document, "div")?;
        board.set_id("board");
        board.set_class_name("invisible");
        // Focusable so key presses reach it
        board.set_tab_index(0);
        body.append_child(&board)?;

        let mut stage_barrels = Vec::with_capacity(barrels);
        let mut images = Vec::with_capacity(barrels);
        let mut highlights = Vec::with_capacity(barrels);
        for _ in 0..barrels {
            let barrel = html(document, "div")?;
            barrel.set_class_name("barrel");
            let img = image(document, "images/barrel.png", "barrel-image")?;
            let hl = image(document, "images/highlight.png", "highlight")?;
            barrel.append_child(&img)?;
            barrel.append_child(&hl)?;
            board.append_child(&barrel)?;
            stage_barrels.push(barrel);
            images.push(img.unchecked_into());
            highlights.push(hl.unchecked_into());
        }

        let plate = html(document, "div")?;
        plate.set_id("plate");
        let content = html(document, "div")?;
        content.set_id("plate-content");
        plate.append_child(&content)?;
        board.append_child(&plate)?;

        Ok(Self {
            document: document.clone(),
            startup,
            board,
            barrels: stage_barrels,
            images,
            highlights,
            plate,
            content,
            geometry: None,
        })
    }

    pub fn startup(&self) -> &HtmlElement {
        &self.startup
    }

    pub fn board(&self) -> &HtmlElement {
        &self.board
    }

    /// Text on the startup screen
    pub fn set_progress(&self, text: &str) {
        self.startup.set_text_content(Some(text));
    }

    /// Current board size in CSS pixels
    pub fn viewport(&self) -> Viewport {
        let body = self.document.body();
        let (w, h) = body
            .map(|b| (b.offset_width(), b.offset_height()))
            .unwrap_or((0, 0));
        Viewport::new(w as f32, h as f32)
    }

    /// Pointer position in board coordinates (bottom-left origin)
    pub fn board_point(&self, client_x: i32, client_y: i32) -> Vec2 {
        let rect = self.board.get_bounding_client_rect();
        Vec2::new(
            (client_x as f64 - rect.left()) as f32,
            (rect.bottom() - client_y as f64) as f32,
        )
    }

    /// Draw one command; audio and timer commands are ignored here
    pub fn apply(&mut self, cmd: &Command) {
        match cmd {
            Command::Reflow(geometry) => self.reflow(geometry),
            Command::RotateBarrel { index, degrees } => {
                if let Some(img) = self.images.get(*index) {
                    let _ = img
                        .style()
                        .set_property("transform", &format!("rotate({}deg)", degrees));
                }
            }
            Command::SetHighlight { index, opacity } => {
                if let Some(hl) = self.highlights.get(*index) {
                    let _ = hl.style().set_property("opacity", &opacity.to_string());
                }
            }
            Command::PlacePlate(pose) => self.place_plate(pose),
            Command::SetPlateTransition(t) => self.set_transition(*t),
            Command::ShowVerdict(verdict) => self.show_verdict(verdict),
            Command::ShowBoard => {
                self.startup.set_class_name("invisible");
                self.board.set_class_name("visible");
                let _ = self.board.focus();
            }
            Command::Play { .. } | Command::StartTimer { .. } | Command::CancelTimer(_) => {}
        }
    }

    fn reflow(&mut self, geometry: &Geometry) {
        let size = px(2.0 * geometry.radius);
        for (barrel, corner) in self.barrels.iter().zip(&geometry.corners) {
            let style = barrel.style();
            let _ = style.set_property("width", &size);
            let _ = style.set_property("height", &size);
            let _ = style.set_property("left", &px(corner.x));
            let _ = style.set_property("bottom", &px(corner.y));
        }

        let plate = &geometry.plate;
        let style = self.plate.style();
        let _ = style.set_property("width", &px(plate.width));
        let _ = style.set_property("height", &px(plate.height));
        let _ = style.set_property("font-size", &px(plate.font_size));
        let _ = self
            .content
            .style()
            .set_property("padding", &format!("0 {}", px(plate.padding)));
        self.geometry = Some(geometry.clone());
        self.refresh_message_size();
    }

    fn place_plate(&self, pose: &PlatePose) {
        let style = self.plate.style();
        match (pose.centered, &self.geometry) {
            (true, Some(g)) => {
                let margin = format!(
                    "-{} -{}",
                    px(g.plate.height / 2.0),
                    px(g.plate.width / 2.0)
                );
                let _ = style.set_property("margin", &margin);
            }
            (true, None) => {
                let _ = style.remove_property("margin");
            }
            (false, _) => {
                let _ = style.set_property("margin", "0");
            }
        }
        match pose.position {
            Some(p) => {
                let _ = style.set_property("left", &px(p.x));
                let _ = style.set_property("bottom", &px(p.y));
            }
            None => {
                let _ = style.remove_property("left");
                let _ = style.remove_property("bottom");
            }
        }
        match pose.transform {
            PlateTransform::Keep => {}
            PlateTransform::Reset => {
                let _ = style.remove_property("transform");
            }
            PlateTransform::Spin(deg) => {
                let _ = style.set_property("transform", &format!("rotate({}deg) scale(1)", deg));
            }
        }
    }

    fn set_transition(&self, transition: Option<Transition>) {
        let style = self.plate.style();
        let _ = match transition {
            Some(t) => style.set_property("transition", &t.css()),
            None => style.remove_property("transition").map(|_| ()),
        };
    }

    fn show_verdict(&self, verdict: &Verdict) {
        self.content.set_text_content(Some(&verdict.message()));
        self.content
            .set_class_name(if verdict.is_granted() { "success" } else { "" });
        self.refresh_message_size();
    }

    /// Success text is set larger than refusals
    fn refresh_message_size(&self) {
        let Some(g) = &self.geometry else {
            return;
        };
        let size = if self.content.class_name() == "success" {
            g.plate.success_font_size
        } else {
            g.plate.font_size
        };
        let _ = self.content.style().set_property("font-size", &px(size));
    }
}
