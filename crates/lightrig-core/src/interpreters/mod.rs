//! Interpreters turn frame signals into fixture writes.
//!
//! An interpreter is built for one fixture group and lives until the
//! director replaces it. Each frame it receives the (warm-up scaled) frame
//! and the current color scheme and writes through the rig's accumulating
//! setters. Behaviors are composed from small pieces with the combinators in
//! [`combinators`], described declaratively by [`InterpreterSpec`] and
//! instantiated by [`InterpreterSpec::build`].
//!
//! ```
//! use lightrig_core::interpreters::{combo, single, InterpreterArgs, InterpreterKind};
//! use lightrig_core::{ColorScheme, FixtureDef, Frame, Rig};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rig = Rig::new();
//! let par = rig.add(FixtureDef::led_par(1)).unwrap();
//! let spec = combo(vec![single(InterpreterKind::Dimmer255), single(InterpreterKind::ColorFg)]);
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let mut interp = spec
//!     .build(&[par], &rig, &InterpreterArgs::wide(50.0, true), &mut rng)
//!     .unwrap();
//! interp.step(&mut rig, &Frame::at(0.0), &ColorScheme::default());
//! assert_eq!(rig.get_dimmer(par), 255.0);
//! ```

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::color_scheme::ColorScheme;
use crate::fixtures::{FixtureId, Rig};
use crate::frame::Frame;

pub mod bulbs;
pub mod color;
pub mod combinators;
pub mod dimmer;
pub mod latched;
pub mod movement;
pub mod movers;
pub mod slow;
pub mod spatial;
pub mod spec;
pub mod strobe;

pub use combinators::{Combo, ForBulbs, HypeSwitch, Named, SignalSwitch};
pub use spec::{
    combo, for_bulbs, hype_switch, randomize, signal_switch, single, weighted_randomize,
    with_args, InterpreterKind, InterpreterSpec,
};

/// Highest hype rating an interpreter can report.
pub const MAX_HYPE: f32 = 100.0;

/// Gates which interpreter variants are eligible at the current energy level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpreterArgs {
    /// Global hype, `0..=100`
    pub hype: f32,
    /// Whether rainbow color effects fit the current theme
    pub allow_rainbows: bool,
    /// Lowest acceptable hype rating
    pub min_hype: f32,
    /// Highest acceptable hype rating
    pub max_hype: f32,
}

impl InterpreterArgs {
    /// Explicit bracket.
    pub fn new(hype: f32, allow_rainbows: bool, min_hype: f32, max_hype: f32) -> Self {
        Self {
            hype,
            allow_rainbows,
            min_hype,
            max_hype,
        }
    }

    /// Every hype rating is acceptable.
    pub fn wide(hype: f32, allow_rainbows: bool) -> Self {
        Self::new(hype, allow_rainbows, 0.0, MAX_HYPE)
    }

    /// `hype ± spread`, clamped to `0..=100`, then clamped into `envelope`
    /// when one is given.
    pub fn bracket(hype: f32, allow_rainbows: bool, spread: f32, envelope: Option<(f32, f32)>) -> Self {
        let mut min_hype = (hype - spread).clamp(0.0, MAX_HYPE);
        let mut max_hype = (hype + spread).clamp(0.0, MAX_HYPE);
        if let Some((lo, hi)) = envelope {
            min_hype = min_hype.clamp(lo, hi);
            max_hype = max_hype.clamp(lo, hi);
        }
        Self::new(hype, allow_rainbows, min_hype, max_hype)
    }
}

/// Eligibility of a single interpreter with the given rating.
///
/// A rating of 0 marks an interpreter that adds no energy of its own (colors,
/// movement, fixed levels). Those pass any bracket; everything else must fall
/// inside `min_hype..=max_hype`. Rainbow interpreters also need
/// `allow_rainbows`.
pub fn acceptable_test(args: &InterpreterArgs, hype: f32, has_rainbow: bool) -> bool {
    if has_rainbow && !args.allow_rainbows {
        return false;
    }
    hype == 0.0 || (args.min_hype..=args.max_hype).contains(&hype)
}

/// A stateful behavior bound to one fixture group.
pub trait Interpreter: Send {
    /// Fixtures this interpreter writes to.
    fn group(&self) -> &[FixtureId];

    /// Write this frame's values through the rig's setters.
    fn step(&mut self, rig: &mut Rig, frame: &Frame, scheme: &ColorScheme);

    /// Leave the hardware in a safe state. Called once, right before the
    /// interpreter is dropped or deactivated.
    fn exit(&mut self, _rig: &mut Rig, _frame: &Frame, _scheme: &ColorScheme) {}

    /// Energy rating, `0..=100`.
    fn get_hype(&self) -> f32 {
        0.0
    }

    /// Name used in logs.
    fn name(&self) -> String;
}

impl fmt::Display for dyn Interpreter + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl fmt::Debug for dyn Interpreter + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interpreter({})", self.name())
    }
}

/// Independent generator for interpreters that draw at step time, seeded from
/// the build generator so a seeded director stays reproducible.
pub(crate) fn fork_rng(rng: &mut StdRng) -> StdRng {
    StdRng::seed_from_u64(rng.random())
}
