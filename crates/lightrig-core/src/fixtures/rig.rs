//! Fixture arena and the accumulating setter contract.

use std::fmt;

use tracing::warn;

use crate::color::Color;
use crate::dmx::{DmxController, DMX_CHANNELS};
use crate::fixtures::base::{FixtureBase, FixtureTag};
use crate::fixtures::library::{BulbSlot, FixtureDef, FixtureParts};
use crate::fixtures::model::FixtureModel;
use crate::fixtures::FixtureKind;
use crate::{CoreError, Result};

/// Handle to a fixture node inside a [`Rig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixtureId(usize);

impl FixtureId {
    /// Position of the node in its rig.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A node in the rig: a fixture, bulb, group or manual group.
#[derive(Debug, Clone)]
pub struct Fixture {
    /// Addressing and accumulators
    pub base: FixtureBase,
    model: FixtureModel,
    kind: FixtureKind,
    children: Vec<FixtureId>,
    bulbs: Vec<FixtureId>,
    parent: Option<FixtureId>,
}

impl Fixture {
    /// Concrete fixture type.
    pub fn kind(&self) -> FixtureKind {
        self.kind
    }

    /// Translation model.
    pub fn model(&self) -> &FixtureModel {
        &self.model
    }

    /// Group members. Empty for leaf fixtures.
    pub fn children(&self) -> &[FixtureId] {
        &self.children
    }

    /// Bulbs inside this fixture.
    pub fn bulbs(&self) -> &[FixtureId] {
        &self.bulbs
    }

    /// Group or bulb owner.
    pub fn parent(&self) -> Option<FixtureId> {
        self.parent
    }

    /// Whether this node is a group (manual or not).
    pub fn is_group(&self) -> bool {
        matches!(self.kind, FixtureKind::Group | FixtureKind::ManualGroup)
    }

    /// Whether this node is a manual group.
    pub fn is_manual(&self) -> bool {
        self.kind == FixtureKind::ManualGroup
    }
}

impl fmt::Display for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.base.name, self.base.address)
    }
}

/// All fixtures patched for one venue.
#[derive(Debug, Clone, Default)]
pub struct Rig {
    fixtures: Vec<Fixture>,
    roots: Vec<FixtureId>,
}

impl Rig {
    /// An empty rig.
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch a top-level fixture.
    pub fn add(&mut self, def: FixtureDef) -> Result<FixtureId> {
        let id = self.insert(def, None)?;
        self.roots.push(id);
        Ok(id)
    }

    /// Patch a named group. Fails when `members` is empty.
    pub fn add_group(&mut self, name: &str, members: Vec<FixtureDef>) -> Result<FixtureId> {
        self.insert_group(name, members, FixtureModel::Group, FixtureKind::Group)
    }

    /// Patch a manual group. Children start white and dark.
    pub fn add_manual_group(&mut self, name: &str, members: Vec<FixtureDef>) -> Result<FixtureId> {
        let id = self.insert_group(
            name,
            members,
            FixtureModel::ManualGroup { manual_dimmer: 0.0 },
            FixtureKind::ManualGroup,
        )?;
        self.set_color(id, Color::white());
        Ok(id)
    }

    fn insert_group(
        &mut self,
        name: &str,
        members: Vec<FixtureDef>,
        model: FixtureModel,
        kind: FixtureKind,
    ) -> Result<FixtureId> {
        if members.is_empty() {
            return Err(CoreError::EmptyGroup(name.to_string()));
        }

        let id = FixtureId(self.fixtures.len());
        self.fixtures.push(Fixture {
            base: FixtureBase::unchecked(0, name.to_string(), 0),
            model,
            kind,
            children: Vec::new(),
            bulbs: Vec::new(),
            parent: None,
        });

        let mut children = Vec::with_capacity(members.len());
        for def in members {
            children.push(self.insert(def, Some(id))?);
        }

        let address = children
            .iter()
            .map(|c| self.fixtures[c.0].base.address)
            .min()
            .unwrap_or(0);
        let width = children.iter().map(|c| self.fixtures[c.0].base.width).sum();
        let universe = self.fixtures[children[0].0].base.universe;

        let node = &mut self.fixtures[id.0];
        node.base.address = address;
        node.base.width = width;
        node.base.universe = universe;
        node.children = children;

        self.roots.push(id);
        Ok(id)
    }

    fn insert(&mut self, def: FixtureDef, parent: Option<FixtureId>) -> Result<FixtureId> {
        let FixtureParts {
            kind,
            model,
            mut base,
            bulbs,
        } = def.into_parts()?;

        let id = FixtureId(self.fixtures.len());
        model.translate(&mut base);
        self.fixtures.push(Fixture {
            base,
            model,
            kind,
            children: Vec::new(),
            bulbs: Vec::new(),
            parent,
        });

        for BulbSlot {
            offset,
            model: bulb_model,
            width,
        } in bulbs
        {
            let bulb_id = FixtureId(self.fixtures.len());
            let name = format!("{} bulb {}", self.fixtures[id.0].base.name, offset);
            self.fixtures.push(Fixture {
                base: FixtureBase::unchecked(offset as u16, name, width),
                model: bulb_model,
                kind: FixtureKind::Bulb,
                children: Vec::new(),
                bulbs: Vec::new(),
                parent: Some(id),
            });
            self.fixtures[id.0].bulbs.push(bulb_id);
        }

        Ok(id)
    }

    /// Node behind `id`.
    pub fn get(&self, id: FixtureId) -> &Fixture {
        &self.fixtures[id.0]
    }

    /// Mutable node behind `id`.
    pub fn get_mut(&mut self, id: FixtureId) -> &mut Fixture {
        &mut self.fixtures[id.0]
    }

    /// Top-level patch entries in patch order.
    pub fn roots(&self) -> &[FixtureId] {
        &self.roots
    }

    /// Every node, including group members and bulbs.
    pub fn iter(&self) -> impl Iterator<Item = (FixtureId, &Fixture)> {
        self.fixtures.iter().enumerate().map(|(i, f)| (FixtureId(i), f))
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    /// Whether nothing is patched.
    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    /// Top-level manual groups.
    pub fn manual_groups(&self) -> Vec<FixtureId> {
        self.roots
            .iter()
            .copied()
            .filter(|id| self.get(*id).is_manual())
            .collect()
    }

    /// Bulbs of every fixture in `ids`, in order.
    pub fn bulbs_of(&self, ids: &[FixtureId]) -> Vec<FixtureId> {
        ids.iter()
            .flat_map(|id| self.get(*id).bulbs.iter().copied())
            .collect()
    }

    fn fan_out(&self, id: FixtureId) -> Vec<FixtureId> {
        let node = self.get(id);
        node.children.iter().chain(node.bulbs.iter()).copied().collect()
    }

    fn refresh(&mut self, id: FixtureId) {
        let node = &mut self.fixtures[id.0];
        node.model.translate(&mut node.base);
    }

    /// Reset dimmer and strobe on `id` and everything below it.
    pub fn begin(&mut self, id: FixtureId) {
        {
            let node = &mut self.fixtures[id.0];
            node.base.dimmer = 0.0;
            node.base.strobe = 0.0;
        }
        self.refresh(id);
        for child in self.fan_out(id) {
            self.begin(child);
        }
    }

    /// Return `id` and everything below it to rest: dark, black, strobe off,
    /// movement zeroed and no gobo.
    ///
    /// Unlike [`Rig::begin`] this also drops color and position, so the
    /// bytes rendered afterwards reflect only what is written from here on.
    pub fn reset(&mut self, id: FixtureId) {
        {
            let base = &mut self.fixtures[id.0].base;
            base.dimmer = 0.0;
            base.strobe = 0.0;
            base.color = Color::black();
            base.speed = 0.0;
            base.pan = 0.0;
            base.tilt = 0.0;
            base.gobo = None;
        }
        self.refresh(id);
        for child in self.fan_out(id) {
            self.reset(child);
        }
    }

    /// [`Rig::begin`] on every top-level entry.
    pub fn begin_all(&mut self) {
        for id in self.roots.clone() {
            self.begin(id);
        }
    }

    /// Raise the dimmer to at least `value` for this frame.
    pub fn set_dimmer(&mut self, id: FixtureId, value: f32) {
        {
            let node = &mut self.fixtures[id.0];
            node.base.dimmer = node.base.dimmer.max(value);
        }
        self.refresh(id);
        for child in self.fan_out(id) {
            self.set_dimmer(child, value);
        }
    }

    /// Overwrite the dimmer regardless of what was accumulated.
    pub fn force_dimmer(&mut self, id: FixtureId, value: f32) {
        self.fixtures[id.0].base.dimmer = value;
        self.refresh(id);
        for child in self.fan_out(id) {
            self.force_dimmer(child, value);
        }
    }

    /// Current dimmer, `0..=255`.
    pub fn get_dimmer(&self, id: FixtureId) -> f32 {
        let node = self.get(id);
        match node.model {
            FixtureModel::ManualGroup { manual_dimmer } => manual_dimmer * 255.0,
            _ => node.base.dimmer,
        }
    }

    /// Raise the strobe to at least `value` for this frame.
    pub fn set_strobe(&mut self, id: FixtureId, value: f32) {
        {
            let node = &mut self.fixtures[id.0];
            node.base.strobe = node.base.strobe.max(value);
        }
        self.refresh(id);
        for child in self.fan_out(id) {
            self.set_strobe(child, value);
        }
    }

    /// Overwrite the strobe regardless of what was accumulated. Used by
    /// `exit` to leave fixtures with strobe off.
    pub fn force_strobe(&mut self, id: FixtureId, value: f32) {
        self.fixtures[id.0].base.strobe = value;
        self.refresh(id);
        for child in self.fan_out(id) {
            self.force_strobe(child, value);
        }
    }

    /// Current strobe, `0..=255`.
    pub fn get_strobe(&self, id: FixtureId) -> f32 {
        self.get(id).base.strobe
    }

    /// Overwrite the color.
    pub fn set_color(&mut self, id: FixtureId, color: Color) {
        {
            let node = &mut self.fixtures[id.0];
            node.base.color = node.model.quantize_color(color);
        }
        self.refresh(id);
        for child in self.fan_out(id) {
            self.set_color(child, color);
        }
    }

    /// Current color.
    pub fn get_color(&self, id: FixtureId) -> Color {
        self.get(id).base.color
    }

    /// Overwrite pan, `0..=255`. Bulbs do not move on their own.
    pub fn set_pan(&mut self, id: FixtureId, value: f32) {
        self.fixtures[id.0].base.pan = value;
        self.refresh(id);
        for child in self.get(id).children.clone() {
            self.set_pan(child, value);
        }
    }

    /// Current pan.
    pub fn get_pan(&self, id: FixtureId) -> f32 {
        self.get(id).base.pan
    }

    /// Overwrite tilt, `0..=255`.
    pub fn set_tilt(&mut self, id: FixtureId, value: f32) {
        self.fixtures[id.0].base.tilt = value;
        self.refresh(id);
        for child in self.get(id).children.clone() {
            self.set_tilt(child, value);
        }
    }

    /// Current tilt.
    pub fn get_tilt(&self, id: FixtureId) -> f32 {
        self.get(id).base.tilt
    }

    /// Overwrite speed.
    pub fn set_speed(&mut self, id: FixtureId, value: f32) {
        self.fixtures[id.0].base.speed = value;
        self.refresh(id);
        for child in self.get(id).children.clone() {
            self.set_speed(child, value);
        }
    }

    /// Current speed.
    pub fn get_speed(&self, id: FixtureId) -> f32 {
        self.get(id).base.speed
    }

    /// Whether `name` is on the gobo wheel of `id` or, for groups, of any
    /// member.
    pub fn knows_gobo(&self, id: FixtureId, name: &str) -> bool {
        let node = self.get(id);
        let own = node
            .model
            .gobo_wheel()
            .is_some_and(|wheel| wheel.iter().any(|g| g.name == name));
        own || node.children.iter().any(|c| self.knows_gobo(*c, name))
    }

    /// Select a gobo by name.
    ///
    /// Fixtures without a gobo wheel ignore the call; group members without
    /// the gobo keep their current one. Fails when nothing under `id` has a
    /// gobo called `name` but something has a gobo wheel.
    pub fn set_gobo(&mut self, id: FixtureId, name: &str) -> Result<()> {
        if self.has_gobo_wheel(id) && !self.knows_gobo(id, name) {
            return Err(CoreError::UnknownGobo(name.to_string()));
        }
        self.apply_gobo(id, name);
        Ok(())
    }

    /// Whether `id` or any member has a gobo wheel.
    pub fn has_gobo_wheel(&self, id: FixtureId) -> bool {
        let node = self.get(id);
        node.model.gobo_wheel().is_some()
            || node.children.iter().any(|c| self.has_gobo_wheel(*c))
    }

    fn apply_gobo(&mut self, id: FixtureId, name: &str) {
        if self.knows_gobo(id, name) && self.get(id).model.gobo_wheel().is_some() {
            self.fixtures[id.0].base.gobo = Some(name.to_string());
            self.refresh(id);
        }
        for child in self.get(id).children.clone() {
            self.apply_gobo(child, name);
        }
    }

    /// Set the operator level of a manual group, `0..=1`.
    pub fn set_manual_dimmer(&mut self, id: FixtureId, value: f32) {
        let value = value.clamp(0.0, 1.0);
        if let FixtureModel::ManualGroup { manual_dimmer } = &mut self.fixtures[id.0].model {
            *manual_dimmer = value;
        } else {
            warn!("{} is not a manual group", self.get(id));
            return;
        }
        for child in self.get(id).children.clone() {
            self.force_dimmer(child, value * 255.0);
        }
    }

    /// Replace a fixture's room position.
    pub fn set_position(&mut self, id: FixtureId, position: Option<glam::Vec3>) {
        self.fixtures[id.0].base.position = position;
    }

    /// Write `id` and everything below it to `sink`.
    pub fn render(&mut self, id: FixtureId, sink: &mut dyn DmxController) {
        match self.get(id).model {
            FixtureModel::ManualGroup { manual_dimmer } => {
                for child in self.get(id).children.clone() {
                    self.force_dimmer(child, manual_dimmer * 255.0);
                    self.render(child, sink);
                }
            }
            FixtureModel::Group => {
                for child in self.get(id).children.clone() {
                    self.render(child, sink);
                }
            }
            _ => {
                self.compose_bulbs(id);
                self.write_values(id, sink);
            }
        }
    }

    /// Write every top-level entry to `sink`.
    pub fn render_all(&mut self, sink: &mut dyn DmxController) {
        for id in self.roots.clone() {
            self.render(id, sink);
        }
    }

    fn compose_bulbs(&mut self, id: FixtureId) {
        for bulb in self.get(id).bulbs.clone() {
            let node = self.get(bulb);
            let offset = node.base.address as usize;
            let bytes = node.model.bulb_bytes(&node.base);
            let values = &mut self.fixtures[id.0].base.values;
            for (i, byte) in bytes.into_iter().enumerate() {
                if let Some(slot) = values.get_mut(offset + i) {
                    *slot = byte;
                }
            }
        }
    }

    fn write_values(&self, id: FixtureId, sink: &mut dyn DmxController) {
        let base = &self.get(id).base;
        for (i, value) in base.values.iter().enumerate() {
            let channel = base.address as usize + i;
            if channel > DMX_CHANNELS {
                warn!(
                    "{} overflows DMX channel {}; skipping {} channels",
                    self.get(id),
                    DMX_CHANNELS,
                    base.values.len() - i
                );
                break;
            }
            sink.set_channel(channel as u16, *value, base.universe);
        }
    }

    /// Leaf fixtures under `id`, or `id` itself when it is a leaf.
    pub fn leaves(&self, id: FixtureId) -> Vec<FixtureId> {
        let node = self.get(id);
        if node.children.is_empty() {
            vec![id]
        } else {
            node.children.iter().flat_map(|c| self.leaves(*c)).collect()
        }
    }

    /// Display string for a group: `"{n} {Kind}s @ {address}"`.
    pub fn describe(&self, id: FixtureId) -> String {
        let node = self.get(id);
        match node.children.first() {
            Some(first) if node.is_group() => format!(
                "{} {}s @ {}",
                node.children.len(),
                self.get(*first).kind,
                node.base.address
            ),
            _ => node.to_string(),
        }
    }

    /// Whether `id` carries every tag in `tags`.
    pub fn has_all_tags(&self, id: FixtureId, tags: &[FixtureTag]) -> bool {
        self.get(id).base.has_all_tags(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dmx::{DmxBuffer, Universe};

    #[test]
    fn test_strobe_takes_max_within_frame() {
        let mut rig = Rig::new();
        let par = rig.add(FixtureDef::led_par(1)).unwrap();
        rig.begin(par);
        for v in [50.0, 30.0, 200.0, 100.0] {
            rig.set_strobe(par, v);
        }
        assert_eq!(rig.get_strobe(par), 200.0);

        rig.begin(par);
        assert_eq!(rig.get_strobe(par), 0.0);
        assert_eq!(rig.get_dimmer(par), 0.0);
    }

    #[test]
    fn test_color_is_last_write_wins() {
        let mut rig = Rig::new();
        let par = rig.add(FixtureDef::led_par(1)).unwrap();
        rig.set_color(par, Color::rgb(1.0, 0.0, 0.0));
        rig.set_color(par, Color::rgb(0.0, 0.0, 1.0));
        assert_eq!(rig.get_color(par), Color::rgb(0.0, 0.0, 1.0));
        rig.set_pan(par, 10.0);
        rig.set_pan(par, 5.0);
        assert_eq!(rig.get_pan(par), 5.0);
    }

    #[test]
    fn test_reset_clears_color_and_position() {
        let mut rig = Rig::new();
        let par = rig.add(FixtureDef::led_par(1)).unwrap();
        rig.set_dimmer(par, 255.0);
        rig.set_color(par, Color::white());
        rig.set_pan(par, 90.0);

        rig.begin(par);
        assert_eq!(rig.get_color(par), Color::white());

        rig.reset(par);
        assert_eq!(rig.get_dimmer(par), 0.0);
        assert_eq!(rig.get_color(par), Color::black());
        assert_eq!(rig.get_pan(par), 0.0);

        let mut out = DmxBuffer::new();
        rig.render(par, &mut out);
        assert!(out.written().all(|(_, _, value)| value == 0));
    }

    #[test]
    fn test_group_fans_out() {
        let mut rig = Rig::new();
        let group = rig
            .add_group("pars", vec![FixtureDef::led_par(1), FixtureDef::led_par(8)])
            .unwrap();
        let [a, b] = [rig.get(group).children()[0], rig.get(group).children()[1]];

        rig.set_dimmer(group, 0.5);
        assert_eq!(rig.get_dimmer(a), 0.5);
        assert_eq!(rig.get_dimmer(b), 0.5);
        assert_eq!(rig.get_dimmer(group), 0.5);

        assert_eq!(rig.get(group).base.address, 1);
        assert_eq!(rig.get(group).base.width, 14);
        assert_eq!(rig.describe(group), "2 LedPars @ 1");
    }

    #[test]
    fn test_empty_group_fails() {
        let mut rig = Rig::new();
        let err = rig.add_group("nothing", vec![]).unwrap_err();
        assert!(matches!(err, CoreError::EmptyGroup(_)));
    }

    #[test]
    fn test_begin_resets_descendants() {
        let mut rig = Rig::new();
        let group = rig
            .add_group("pars", vec![FixtureDef::led_par(1), FixtureDef::led_par(8)])
            .unwrap();
        rig.set_strobe(group, 100.0);
        rig.begin(group);
        for child in rig.get(group).children().to_vec() {
            assert_eq!(rig.get_strobe(child), 0.0);
        }
    }

    #[test]
    fn test_render_skips_channels_past_512() {
        let mut rig = Rig::new();
        let par = rig.add(FixtureDef::led_par(510)).unwrap();
        rig.set_dimmer(par, 255.0);
        rig.set_color(par, Color::white());

        let mut buf = DmxBuffer::new();
        rig.render(par, &mut buf);
        assert_eq!(buf.get(510, Universe::Default), 255);
        assert_eq!(buf.get(512, Universe::Default), 255);
        assert_eq!(buf.written().count(), 3);
    }

    #[test]
    fn test_bulbs_render_into_parent() {
        let mut rig = Rig::new();
        let strip = rig.add(FixtureDef::motionstrip38(1, 0.0, 256.0)).unwrap();
        assert_eq!(rig.get(strip).bulbs().len(), 8);

        rig.set_dimmer(strip, 255.0);
        rig.set_color(strip, Color::rgb(1.0, 0.0, 0.0));
        let first_bulb = rig.get(strip).bulbs()[0];
        assert_eq!(rig.get_dimmer(first_bulb), 255.0);

        let mut buf = DmxBuffer::new();
        rig.render(strip, &mut buf);
        // Master dimmer, then bulb 1 red at channel 7
        assert_eq!(buf.get(5, Universe::Default), 255);
        assert_eq!(buf.get(7, Universe::Default), 255);
        assert_eq!(buf.get(10, Universe::Default), 0);
    }

    #[test]
    fn test_manual_group_dimmer() {
        let mut rig = Rig::new();
        let manual = rig
            .add_manual_group("house", vec![FixtureDef::house_dimmer(1), FixtureDef::house_dimmer(2)])
            .unwrap();
        assert_eq!(rig.get_color(rig.get(manual).children()[0]), Color::white());

        rig.set_manual_dimmer(manual, 0.5);
        assert_eq!(rig.get_dimmer(manual), 127.5);

        let mut buf = DmxBuffer::new();
        rig.render(manual, &mut buf);
        assert_eq!(buf.get(1, Universe::Default), 127);
        assert_eq!(buf.get(2, Universe::Default), 127);

        rig.set_manual_dimmer(manual, 0.0);
        rig.render(manual, &mut buf);
        assert_eq!(buf.get(1, Universe::Default), 0);
    }

    #[test]
    fn test_unknown_gobo_is_an_error() {
        let mut rig = Rig::new();
        let spot = rig.add(FixtureDef::chauvet_spot_120(1)).unwrap();
        assert!(rig.set_gobo(spot, "spiral").is_ok());
        assert_eq!(rig.get(spot).base.gobo.as_deref(), Some("spiral"));
        assert!(matches!(
            rig.set_gobo(spot, "unicorn"),
            Err(CoreError::UnknownGobo(_))
        ));

        // Fixtures without a wheel ignore gobo requests
        let par = rig.add(FixtureDef::led_par(20)).unwrap();
        assert!(rig.set_gobo(par, "unicorn").is_ok());
    }

    #[test]
    fn test_mover_color_snaps_to_wheel() {
        let mut rig = Rig::new();
        let spot = rig.add(FixtureDef::chauvet_spot_120(1)).unwrap();
        rig.set_color(spot, Color::rgb(0.9, 0.05, 0.1));
        assert_eq!(rig.get_color(spot), Color::named("red").unwrap());
        // Color wheel channel
        assert_eq!(rig.get(spot).base.values[5], 40);
    }
}
