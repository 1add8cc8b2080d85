use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lightrig_core::interpreters::{single, HypeSwitch, Interpreter, InterpreterArgs, InterpreterKind};
use lightrig_core::{
    ColorScheme, FixtureId, Frame, FrameSignal, Mode, Phrase, PolicyRegistry, Rig, Venue,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Counts how often it is told to exit.
struct ExitProbe {
    group: Vec<FixtureId>,
    exits: Arc<AtomicUsize>,
}

impl Interpreter for ExitProbe {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, _rig: &mut Rig, _frame: &Frame, _scheme: &ColorScheme) {}

    fn exit(&mut self, _rig: &mut Rig, _frame: &Frame, _scheme: &ColorScheme) {
        self.exits.fetch_add(1, Ordering::SeqCst);
    }

    fn name(&self) -> String {
        "ExitProbe".to_string()
    }
}

fn crux() -> Rig {
    Venue::CruxTest.patch().unwrap()
}

fn find(rig: &Rig, address: u16) -> FixtureId {
    rig.roots()
        .iter()
        .copied()
        .find(|id| rig.get(*id).base.address == address)
        .unwrap()
}

#[test]
fn test_hype_switch_exits_once_per_transition() {
    let mut rig = crux();
    let group = vec![find(&rig, 20)];
    let exits = Arc::new(AtomicUsize::new(0));
    let probe = |exits: &Arc<AtomicUsize>| {
        Box::new(ExitProbe {
            group: group.clone(),
            exits: exits.clone(),
        })
    };
    let mut switch = HypeSwitch::new(&group, probe(&exits), probe(&exits));
    let scheme = ColorScheme::default();

    for (time, hype) in [(0.0, 0.2), (1.0, 0.8), (2.0, 0.2)] {
        let frame = Frame::at(time).with(FrameSignal::Hype, hype);
        switch.step(&mut rig, &frame, &scheme);
    }
    assert_eq!(exits.load(Ordering::SeqCst), 2);
}

#[test]
fn test_scene_filters_by_address() {
    let rig = crux();
    let registry = PolicyRegistry::standard();
    let args = InterpreterArgs::wide(50.0, true);
    let mut rng = StdRng::seed_from_u64(3);

    let outside = registry
        .get_scene_interpreter("manual_fixtures_1_9", &[find(&rig, 10)], &rig, &args, &mut rng)
        .unwrap();
    assert!(outside.is_none());

    let inside = registry
        .get_scene_interpreter("manual_fixtures_1_9", &[find(&rig, 5)], &rig, &args, &mut rng)
        .unwrap()
        .unwrap();
    assert_eq!(inside.name(), "Dimmer255");
    assert_eq!(inside.group(), &[find(&rig, 5)]);
}

#[test]
fn test_get_interpreter_always_resolves() {
    let rig = crux();
    let registry = PolicyRegistry::standard();
    let mut rng = StdRng::seed_from_u64(11);
    // Nothing is rated this high, so every random choice falls back
    let args = InterpreterArgs::new(100.0, false, 99.0, 100.0);

    for id in rig.roots() {
        for mode in Mode::ALL {
            let interp = registry.get_interpreter(mode, &[*id], &rig, &args, &mut rng);
            assert!(interp.is_ok(), "{:?} on {}", mode, rig.describe(*id));
        }
        for phrase in Phrase::ALL {
            assert!(registry.get_interpreter(phrase, &[*id], &rig, &args, &mut rng).is_ok());
        }
    }
}

#[test]
fn test_empty_registry_holds_dark() {
    let mut rig = crux();
    let registry = PolicyRegistry::new();
    let mut rng = StdRng::seed_from_u64(1);
    let par = find(&rig, 20);

    let mut interp = registry
        .get_interpreter(Mode::Rave, &[par], &rig, &InterpreterArgs::wide(50.0, true), &mut rng)
        .unwrap();
    rig.begin(par);
    interp.step(&mut rig, &Frame::at(0.0), &ColorScheme::default());
    assert_eq!(interp.name(), "Dimmer0");
    assert_eq!(rig.get_dimmer(par), 0.0);
}

#[test]
fn test_spec_build_matches_kind_name() {
    let rig = crux();
    let mut rng = StdRng::seed_from_u64(5);
    let interp = single(InterpreterKind::Dimmer255)
        .build(&[find(&rig, 20)], &rig, &InterpreterArgs::wide(0.0, false), &mut rng)
        .unwrap();
    assert_eq!(interp.name(), "Dimmer255");
}
