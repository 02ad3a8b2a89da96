//! Audio clips
//!
//! Four recorded clips, loaded through `<audio>` elements. A clip that fails to
//! load is dropped and every later attempt to play it completes at once, so the
//! game never waits on sound that will not come.

/// Named audio clips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clip {
    /// Played once when the board first opens
    Welcome,
    /// Knocking on a barrel
    Knock,
    /// The right barrel answers
    Granted,
    /// A wrong barrel answers
    Denied,
}

impl Clip {
    pub const ALL: [Clip; 4] = [Clip::Welcome, Clip::Knock, Clip::Granted, Clip::Denied];

    /// File stem under `audio/`
    pub fn name(&self) -> &'static str {
        match self {
            Clip::Welcome => "Welcome",
            Clip::Knock => "Knock",
            Clip::Granted => "Granted",
            Clip::Denied => "Denied",
        }
    }

    fn slot(&self) -> usize {
        match self {
            Clip::Welcome => 0,
            Clip::Knock => 1,
            Clip::Granted => 2,
            Clip::Denied => 3,
        }
    }
}

/// Encodings shipped with the game, in order of preference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Ogg,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 2] = [AudioFormat::Mp3, AudioFormat::Ogg];

    pub fn mime(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Ogg => "audio/ogg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Ogg => "ogg",
        }
    }

    /// First format the browser claims it can play
    pub fn pick(can_play: impl Fn(&str) -> bool) -> Option<Self> {
        Self::ALL.into_iter().find(|f| can_play(f.mime()))
    }

    /// Relative URL of a clip in this format
    pub fn url(&self, clip: Clip) -> String {
        format!("audio/{}.{}", clip.name(), self.extension())
    }
}

/// Loading state of one clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipStatus {
    #[default]
    Loading,
    Ready,
    /// Treated as absent from now on
    Failed,
}

/// Load bookkeeping for all clips
#[derive(Debug, Clone, Default)]
pub struct ClipBank {
    status: [ClipStatus; 4],
}

impl ClipBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bank where every clip loaded
    pub fn all_ready() -> Self {
        Self {
            status: [ClipStatus::Ready; 4],
        }
    }

    pub fn status(&self, clip: Clip) -> ClipStatus {
        self.status[clip.slot()]
    }

    pub fn set(&mut self, clip: Clip, status: ClipStatus) {
        if status == ClipStatus::Failed && self.status(clip) != ClipStatus::Failed {
            log::warn!("Audio clip {} failed to load", clip.name());
        }
        self.status[clip.slot()] = status;
    }

    /// Mark every clip absent (no playable format)
    pub fn fail_all(&mut self) {
        for clip in Clip::ALL {
            self.set(clip, ClipStatus::Failed);
        }
    }

    /// Whether playing this clip makes a sound
    pub fn is_available(&self, clip: Clip) -> bool {
        self.status(clip) == ClipStatus::Ready
    }

    /// Clips no longer loading (ready or given up on)
    pub fn settled(&self) -> usize {
        self.status
            .iter()
            .filter(|s| **s != ClipStatus::Loading)
            .count()
    }

    pub fn total(&self) -> usize {
        self.status.len()
    }

    pub fn errors(&self) -> usize {
        self.status
            .iter()
            .filter(|s| **s == ClipStatus::Failed)
            .count()
    }

    /// Nothing left to wait for
    pub fn is_settled(&self) -> bool {
        self.settled() == self.total()
    }

    /// Text for the startup screen
    pub fn progress_message(&self) -> String {
        let done = self.settled();
        let total = self.total();
        let percent = (done as f32 * 100.0 / total as f32).round() as u32;
        format!(
            "Barrels loading audio... {} of {} ({}%)",
            done, total, percent
        )
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use js_sys::Promise;
    use web_sys::{HtmlAudioElement, HtmlMediaElement};

    use super::{AudioFormat, Clip, ClipBank, ClipStatus};

    /// Audio manager for the game
    pub struct AudioManager {
        elements: [Option<HtmlAudioElement>; 4],
        bank: ClipBank,
        volume: f32,
    }

    impl AudioManager {
        /// Pick a format and start loading every clip
        pub fn new(volume: f32) -> Self {
            let mut bank = ClipBank::new();
            let probe = HtmlAudioElement::new().ok();
            let format = probe
                .as_ref()
                .and_then(|a| AudioFormat::pick(|mime| !a.can_play_type(mime).is_empty()));

            let Some(format) = format else {
                log::warn!("No supported audio format - audio disabled");
                bank.fail_all();
                return Self {
                    elements: [None, None, None, None],
                    bank,
                    volume,
                };
            };
            log::info!("Supported audio: {}", format.extension().to_uppercase());

            let elements = Clip::ALL.map(|clip| {
                let element = HtmlAudioElement::new_with_src(&format.url(clip)).ok();
                match &element {
                    Some(el) => el.load(),
                    None => bank.set(clip, ClipStatus::Failed),
                }
                element
            });

            Self {
                elements,
                bank,
                volume: volume.clamp(0.0, 1.0),
            }
        }

        /// Refresh load status; failed clips are released
        pub fn poll(&mut self) {
            for clip in Clip::ALL {
                let slot = clip.slot();
                let Some(el) = &self.elements[slot] else {
                    continue;
                };
                if el.ready_state() >= HtmlMediaElement::HAVE_CURRENT_DATA {
                    self.bank.set(clip, ClipStatus::Ready);
                } else if el.error().is_some() {
                    log::error!("ERROR loading audio from {}", el.src());
                    self.bank.set(clip, ClipStatus::Failed);
                    self.elements[slot] = None;
                }
            }
        }

        pub fn bank(&self) -> &ClipBank {
            &self.bank
        }

        /// Element behind a clip, for wiring `ended` listeners
        pub fn element(&self, clip: Clip) -> Option<&HtmlAudioElement> {
            self.elements[clip.slot()].as_ref()
        }

        /// Play a clip from the start. `None` when nothing will play, in which
        /// case no `ended` event follows. The returned promise rejects when the
        /// browser refuses playback (no user gesture yet, decode failure), and
        /// then no `ended` event follows either.
        pub fn play(&self, clip: Clip) -> Option<Promise> {
            if self.volume <= 0.0 || !self.bank.is_available(clip) {
                return None;
            }
            let el = self.element(clip)?;
            let _ = el.pause();
            el.set_current_time(0.0);
            el.set_volume(self.volume as f64);
            match el.play() {
                Ok(promise) => Some(promise),
                Err(e) => {
                    log::warn!("Could not play {}: {:?}", clip.name(), e);
                    None
                }
            }
        }
    }
}
