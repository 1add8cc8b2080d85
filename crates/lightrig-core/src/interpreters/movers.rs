//! Moving-head specific interpreters.

use tracing::warn;

use crate::color_scheme::ColorScheme;
use crate::fixtures::{FixtureId, Rig};
use crate::frame::Frame;
use crate::interpreters::Interpreter;
use crate::{CoreError, Result};

/// Gobo that leaves the beam unshaped.
pub const OPEN_GOBO: &str = "open";

/// Holds a named gobo on every fixture with a gobo wheel.
pub struct MoverGobo {
    group: Vec<FixtureId>,
    gobo: String,
}

impl MoverGobo {
    /// Fails with [`CoreError::UnknownGobo`] when some fixture in `group` has
    /// a gobo wheel but no fixture knows `gobo`.
    pub fn new(group: &[FixtureId], rig: &Rig, gobo: &str) -> Result<Self> {
        let has_wheel = group.iter().any(|id| rig.has_gobo_wheel(*id));
        let known = group.iter().any(|id| rig.knows_gobo(*id, gobo));
        if has_wheel && !known {
            return Err(CoreError::UnknownGobo(gobo.to_string()));
        }
        Ok(Self {
            group: group.to_vec(),
            gobo: gobo.to_string(),
        })
    }
}

impl Interpreter for MoverGobo {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, _frame: &Frame, _scheme: &ColorScheme) {
        for id in &self.group {
            if let Err(e) = rig.set_gobo(*id, &self.gobo) {
                warn!("{}: {}", rig.get(*id), e);
            }
        }
    }

    fn name(&self) -> String {
        if self.gobo == OPEN_GOBO {
            "MoverNoGobo".to_string()
        } else {
            format!("MoverGobo({})", self.gobo)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::FixtureDef;

    #[test]
    fn test_unknown_gobo_is_rejected() {
        let mut rig = Rig::new();
        let spot = rig.add(FixtureDef::chauvet_spot_160(1)).unwrap();
        assert!(matches!(
            MoverGobo::new(&[spot], &rig, "unicorn"),
            Err(CoreError::UnknownGobo(_))
        ));
    }

    #[test]
    fn test_gobo_applied_to_wheel_fixtures() {
        let mut rig = Rig::new();
        let spot = rig.add(FixtureDef::chauvet_spot_120(1)).unwrap();
        let par = rig.add(FixtureDef::led_par(20)).unwrap();
        let mut interp = MoverGobo::new(&[spot, par], &rig, "starburst").unwrap();
        interp.step(&mut rig, &Frame::at(0.0), &ColorScheme::default());
        assert_eq!(rig.get(spot).base.gobo.as_deref(), Some("starburst"));
        assert_eq!(rig.get(par).base.gobo, None);
    }

    #[test]
    fn test_wheelless_group_accepts_any_gobo() {
        let mut rig = Rig::new();
        let par = rig.add(FixtureDef::led_par(1)).unwrap();
        assert!(MoverGobo::new(&[par], &rig, "starburst").is_ok());
    }
}
