//! Show director
//!
//! The director owns the venue rig, one interpreter per fixture group and
//! source, and the color scheme animator. Each control tick the caller feeds
//! it a [`Frame`] with [`Director::step`] and then flushes the result with
//! [`Director::render`].
//!
//! Interpreters never write to the output directly. After each interpreter
//! steps, the bytes its fixtures would send are captured, and `render`
//! merges the captures with a loudest-wins rule so independent interpreters
//! sharing channels cannot mask each other.

pub mod mode;
pub mod mode_machine;
pub mod policy;
pub mod state;

pub use mode::{Mode, Phrase};
pub use mode_machine::ModeMachine;
pub use policy::{PolicyContext, PolicyEntry, PolicyRegistry, SceneRule};
pub use state::{ShowState, HYPE_LIMITER_ENVELOPE};

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::color_scheme::ColorScheme;
use crate::dmx::{dmx_clamp, DmxBuffer, DmxController, Universe};
use crate::fixtures::{FixtureId, FixtureKind, Rig};
use crate::frame::{Frame, FrameSignal};
use crate::interpreters::{Interpreter, InterpreterArgs};
use crate::lerp::LerpAnimator;
use crate::themes::{Theme, ThemeName};
use crate::venues::Venue;
use crate::{CoreError, Result};

/// Timing and selection parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectorConfig {
    /// Seconds over which output ramps up from dark after the first frame
    pub warmup_seconds: f64,
    /// Minimum seconds between timed shifts
    pub shift_after: f64,
    /// Shifts wait while `sustained_low` is at or above this
    pub shift_below_sustained: f32,
    /// Seconds a color scheme change takes
    pub color_transition: f64,
    /// Half-width of the hype bracket used when a shift regenerates a group
    pub shift_hype_spread: f32,
    /// Seed for every random choice. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            warmup_seconds: 40.0,
            shift_after: 60.0,
            shift_below_sustained: 0.2,
            color_transition: 4.0,
            shift_hype_spread: 30.0,
            seed: None,
        }
    }
}

/// Where an interpreter came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InterpreterSource {
    /// The current mode's policy table
    Mode,
    /// A weighted scene
    Scene(String),
}

/// Cache key: one interpreter per source and fixture group.
///
/// Groups are identified by the address and universe of their first fixture.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterpreterKey {
    /// Mode or scene
    pub source: InterpreterSource,
    /// Universe of the group's first fixture
    pub universe: Universe,
    /// Address of the group's first fixture
    pub address: u16,
}

/// A live interpreter plus the bytes its last step produced.
pub struct ActiveInterpreter {
    interpreter: Box<dyn Interpreter>,
    serial: u64,
    output: DmxBuffer,
}

impl ActiveInterpreter {
    /// The interpreter.
    pub fn interpreter(&self) -> &dyn Interpreter {
        self.interpreter.as_ref()
    }

    /// Build counter value; changes whenever the interpreter is replaced.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Bytes captured after the last step.
    pub fn output(&self) -> &DmxBuffer {
        &self.output
    }

    // Fixtures are shared between sources, so anything a previous source
    // left behind (color or position) must not leak into this capture.
    fn run(&mut self, rig: &mut Rig, frame: &Frame, scheme: &ColorScheme) {
        for id in self.interpreter.group() {
            rig.reset(*id);
        }
        self.interpreter.step(rig, frame, scheme);
        self.capture(rig);
    }

    fn capture(&mut self, rig: &mut Rig) {
        self.output.clear();
        for id in self.interpreter.group() {
            rig.render(*id, &mut self.output);
        }
    }
}

/// Selects, steps, mutates and renders interpreters for one venue.
pub struct Director {
    config: DirectorConfig,
    registry: PolicyRegistry,
    state: ShowState,
    rig: Rig,
    theme: Theme,
    scheme: LerpAnimator<ColorScheme>,
    groups: Vec<Vec<FixtureId>>,
    interpreters: BTreeMap<InterpreterKey, ActiveInterpreter>,
    scene_weights: BTreeMap<String, f32>,
    mode_machine: ModeMachine,
    rng: StdRng,
    next_serial: u64,
    start_time: Option<f64>,
    last_shift: Option<f64>,
    now: f64,
    last_frame: Frame,
}

impl Director {
    /// Patch `state.venue` and build the first set of interpreters.
    pub fn new(config: DirectorConfig, registry: PolicyRegistry, state: ShowState) -> Result<Self> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let rig = state.venue.patch()?;
        let theme = Theme::new(state.theme, &mut rng);
        let scheme = LerpAnimator::new(theme.random_scheme(&mut rng), config.color_transition);

        let mut director = Self {
            config,
            registry,
            state,
            rig,
            theme,
            scheme,
            groups: Vec::new(),
            interpreters: BTreeMap::new(),
            scene_weights: BTreeMap::new(),
            mode_machine: ModeMachine::new(),
            rng,
            next_serial: 0,
            start_time: None,
            last_shift: None,
            now: 0.0,
            last_frame: Frame::default(),
        };
        director.setup_patch();
        director.generate_interpreters()?;
        info!(
            "Director ready: {} at {}, {} groups",
            director.state.mode,
            director.state.venue,
            director.groups.len()
        );
        Ok(director)
    }

    /// Current show state.
    pub fn state(&self) -> &ShowState {
        &self.state
    }

    /// The patched fixtures.
    pub fn rig(&self) -> &Rig {
        &self.rig
    }

    /// Automatically controlled fixture groups.
    pub fn groups(&self) -> &[Vec<FixtureId>] {
        &self.groups
    }

    /// Active interpreters by key.
    pub fn interpreters(&self) -> &BTreeMap<InterpreterKey, ActiveInterpreter> {
        &self.interpreters
    }

    /// Active theme.
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Color scheme at the last stepped frame time.
    pub fn scheme(&self) -> ColorScheme {
        self.scheme.render(self.now)
    }

    /// Color scheme the animator is heading toward.
    pub fn target_scheme(&self) -> ColorScheme {
        *self.scheme.target()
    }

    /// Whether output has finished ramping up.
    pub fn warmup_complete(&self) -> bool {
        self.start_time
            .is_some_and(|start| self.now - start >= self.config.warmup_seconds)
    }

    /// Key for `group` under `source`.
    pub fn key_for(&self, source: InterpreterSource, group: &[FixtureId]) -> Option<InterpreterKey> {
        let first = self.rig.get(*group.first()?);
        Some(InterpreterKey {
            source,
            universe: first.base.universe,
            address: first.base.address,
        })
    }

    /// Rebuild the automatic groups from the rig.
    ///
    /// Explicit groups are kept as they are, manual groups are left alone and
    /// every other top-level fixture is grouped with others of its kind.
    pub fn setup_patch(&mut self) {
        let mut groups = Vec::new();
        let mut by_kind: Vec<(FixtureKind, Vec<FixtureId>)> = Vec::new();
        for id in self.rig.roots() {
            let fixture = self.rig.get(*id);
            if fixture.is_manual() {
                continue;
            }
            if fixture.is_group() {
                groups.push(fixture.children().to_vec());
                continue;
            }
            match by_kind.iter_mut().find(|(kind, _)| *kind == fixture.kind()) {
                Some((_, members)) => members.push(*id),
                None => by_kind.push((fixture.kind(), vec![*id])),
            }
        }
        groups.extend(by_kind.into_iter().map(|(_, members)| members));
        self.groups = groups;

        for group in self.rig.manual_groups() {
            self.rig.set_manual_dimmer(group, self.state.manual_dimmer);
        }
    }

    fn full_args(&self) -> InterpreterArgs {
        let rainbows = self.theme.allow_rainbows;
        match self.state.hype_envelope() {
            Some((lo, hi)) => InterpreterArgs::new(self.state.hype, rainbows, lo, hi),
            None => InterpreterArgs::wide(self.state.hype, rainbows),
        }
    }

    fn shift_args(&self) -> InterpreterArgs {
        InterpreterArgs::bracket(
            self.state.hype,
            self.theme.allow_rainbows,
            self.config.shift_hype_spread,
            self.state.hype_envelope(),
        )
    }

    fn exit_where(&mut self, pred: impl Fn(&InterpreterKey) -> bool) {
        let scheme = self.scheme.render(self.now);
        for (key, active) in self.interpreters.iter_mut() {
            if pred(key) {
                active.interpreter.exit(&mut self.rig, &self.last_frame, &scheme);
                active.capture(&mut self.rig);
            }
        }
    }

    fn install(&mut self, key: InterpreterKey, interpreter: Box<dyn Interpreter>) {
        self.next_serial += 1;
        let mut active = ActiveInterpreter {
            interpreter,
            serial: self.next_serial,
            output: DmxBuffer::new(),
        };
        active.capture(&mut self.rig);
        self.interpreters.insert(key, active);
    }

    fn install_mode(&mut self, group: &[FixtureId], args: &InterpreterArgs) -> Result<()> {
        let Some(key) = self.key_for(InterpreterSource::Mode, group) else {
            return Ok(());
        };
        let interpreter = self.registry.select_interpreter(
            self.state.mode,
            self.state.phrase,
            group,
            &self.rig,
            args,
            &mut self.rng,
        )?;
        self.install(key, interpreter);
        Ok(())
    }

    fn install_scene(&mut self, name: &str) -> Result<()> {
        let args = self.full_args();
        for group in self.groups.clone() {
            let Some(key) = self.key_for(InterpreterSource::Scene(name.to_string()), &group) else {
                continue;
            };
            let built =
                self.registry
                    .get_scene_interpreter(name, &group, &self.rig, &args, &mut self.rng)?;
            if let Some(interpreter) = built {
                self.install(key, interpreter);
            }
        }
        Ok(())
    }

    /// Replace every mode interpreter, calling `exit` on the old ones first.
    pub fn generate_interpreters(&mut self) -> Result<()> {
        self.exit_where(|key| key.source == InterpreterSource::Mode);
        self.interpreters
            .retain(|key, _| key.source != InterpreterSource::Mode);

        let args = self.full_args();
        for group in self.groups.clone() {
            self.install_mode(&group, &args)?;
        }
        debug!("Generated {} mode interpreters", self.groups.len());
        Ok(())
    }

    /// Switch mode and regenerate. No-op when unchanged.
    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        if self.state.mode == mode {
            return Ok(());
        }
        info!("Mode: {} -> {}", self.state.mode, mode);
        self.state.mode = mode;
        self.generate_interpreters()
    }

    /// Follow `phrase`'s table where it covers a group, or only the mode's
    /// when `None`. Regenerates on change.
    pub fn set_phrase(&mut self, phrase: Option<Phrase>) -> Result<()> {
        if self.state.phrase == phrase {
            return Ok(());
        }
        info!("Phrase: {:?} -> {:?}", self.state.phrase, phrase);
        self.state.phrase = phrase;
        self.generate_interpreters()
    }

    /// Switch venue: re-patch, regroup and rebuild every interpreter.
    pub fn set_venue(&mut self, venue: Venue) -> Result<()> {
        if self.state.venue == venue {
            return Ok(());
        }
        info!("Venue: {} -> {}", self.state.venue, venue);
        let rig = venue.patch()?;
        self.exit_where(|_| true);
        self.interpreters.clear();
        self.state.venue = venue;
        self.rig = rig;
        self.setup_patch();
        self.generate_interpreters()?;

        let scenes: Vec<String> = self
            .scene_weights
            .iter()
            .filter(|(_, w)| **w > 0.0)
            .map(|(name, _)| name.clone())
            .collect();
        for name in scenes {
            self.install_scene(&name)?;
        }
        Ok(())
    }

    /// Switch theme, start a transition to one of its schemes and regenerate
    /// so rainbow gating follows the new theme.
    pub fn set_theme(&mut self, theme: ThemeName) -> Result<()> {
        if self.state.theme == theme {
            return Ok(());
        }
        info!("Theme: {} -> {}", self.state.theme, theme);
        self.state.theme = theme;
        self.theme = Theme::new(theme, &mut self.rng);
        let scheme = self.theme.random_scheme(&mut self.rng);
        self.scheme.push(scheme, self.now);
        self.generate_interpreters()
    }

    /// Set global hype. Takes effect at the next selection.
    pub fn set_hype(&mut self, hype: f32) {
        self.state.set_hype(hype);
    }

    /// Engage or release the hype limiter.
    pub fn set_hype_limiter(&mut self, enabled: bool) {
        if self.state.hype_limiter != enabled {
            info!("Hype limiter {}", if enabled { "on" } else { "off" });
        }
        self.state.hype_limiter = enabled;
    }

    /// House light level, `0..=1`, applied to every manual group.
    pub fn set_manual_dimmer(&mut self, value: f32) {
        self.state.manual_dimmer = value.clamp(0.0, 1.0);
        for group in self.rig.manual_groups() {
            self.rig.set_manual_dimmer(group, self.state.manual_dimmer);
        }
    }

    /// Latch a manual signal.
    ///
    /// While engaged the latch is a floor: a frame carrying a lower value for
    /// the same signal, including an explicit 0, is raised to the latch.
    pub fn set_signal(&mut self, signal: FrameSignal, value: f32) {
        self.state.signal_states.set_signal(signal, value);
    }

    /// Current weight of `scene`, 0 when never set.
    pub fn scene_weight(&self, scene: &str) -> f32 {
        self.scene_weights.get(scene).copied().unwrap_or(0.0)
    }

    /// Set a scene's weight, `0..=1`. Interpreters for the scene are built
    /// the first time its weight goes above zero.
    pub fn set_scene_weight(&mut self, scene: &str, weight: f32) -> Result<()> {
        if !self.registry.has_scene(scene) {
            return Err(CoreError::UnknownScene(scene.to_string()));
        }
        let weight = weight.clamp(0.0, 1.0);
        let built = self
            .interpreters
            .keys()
            .any(|k| k.source == InterpreterSource::Scene(scene.to_string()));
        self.scene_weights.insert(scene.to_string(), weight);
        if weight > 0.0 && !built {
            self.install_scene(scene)?;
        }
        Ok(())
    }

    fn warmup_factor(&self, elapsed: f64) -> f32 {
        if self.config.warmup_seconds <= 0.0 {
            return 1.0;
        }
        (elapsed / self.config.warmup_seconds).clamp(0.0, 1.0) as f32
    }

    /// Advance every interpreter by one frame and shift when due.
    pub fn step(&mut self, frame: &Frame) -> Result<()> {
        let now = frame.time;
        self.now = now;
        let start = *self.start_time.get_or_insert(now);
        let last_shift = *self.last_shift.get_or_insert(now);

        let mut frame = frame * self.warmup_factor(now - start);
        let peak = self.mode_machine.step(&frame);
        frame.extend(self.mode_machine.signals());
        frame.raise(self.state.signal_states.active());

        let scheme = self.scheme.render(now);
        for (key, active) in self.interpreters.iter_mut() {
            if let InterpreterSource::Scene(name) = &key.source {
                if self.scene_weights.get(name).copied().unwrap_or(0.0) <= 0.0 {
                    continue;
                }
            }
            active.run(&mut self.rig, &frame, &scheme);
        }

        let due = now - last_shift > self.config.shift_after
            && frame[FrameSignal::SustainedLow] < self.config.shift_below_sustained;
        self.last_frame = frame;
        if peak || due {
            self.shift()?;
        }
        Ok(())
    }

    /// Replace one scheme color with a different color from the theme.
    pub fn shift_color_scheme(&mut self) {
        let mut colors = self.scheme.target().to_list();
        let index = self.rng.random_range(0..colors.len());
        let candidates: Vec<_> = self
            .theme
            .palette()
            .into_iter()
            .filter(|c| *c != colors[index])
            .collect();
        let Some(color) = candidates.choose(&mut self.rng) else {
            warn!("Theme {} has no alternative colors", self.theme.name);
            return;
        };
        colors[index] = *color;
        self.scheme.push(ColorScheme::from_list(colors), self.now);
    }

    /// Exit every mode interpreter, nudge the color scheme and regenerate one
    /// random group with a hype bracket around the current hype.
    pub fn shift(&mut self) -> Result<()> {
        info!("Shift at {:.1}s (hype {:.0})", self.now, self.state.hype);
        self.exit_where(|key| key.source == InterpreterSource::Mode);
        self.shift_color_scheme();

        if !self.groups.is_empty() {
            let index = self.rng.random_range(0..self.groups.len());
            let group = self.groups[index].clone();
            let args = self.shift_args();
            self.install_mode(&group, &args)?;
        }
        self.last_shift = Some(self.now);
        Ok(())
    }

    /// Merge every captured output with loudest-wins, add the manual groups
    /// and submit once.
    pub fn render(&mut self, sink: &mut dyn DmxController) -> Result<()> {
        let mut buffer = DmxBuffer::new();
        for (key, active) in &self.interpreters {
            let factor = match &key.source {
                InterpreterSource::Mode => 1.0,
                InterpreterSource::Scene(name) => self.scene_weights.get(name).copied().unwrap_or(0.0),
            };
            if factor <= 0.0 {
                continue;
            }
            for (universe, channel, value) in active.output.written() {
                buffer.set_max(channel, dmx_clamp(value as f32 * factor), universe);
            }
        }

        for (universe, channel, value) in buffer.written() {
            sink.set_channel(channel, value, universe);
        }
        for group in self.rig.manual_groups() {
            self.rig.render(group, sink);
        }
        sink.submit()
    }
}
