//! Channel translation: how each fixture model turns its accumulators into
//! DMX bytes.

use crate::color::Color;
use crate::dmx::dmx_clamp;
use crate::fixtures::base::FixtureBase;
use crate::fixtures::wheel::{closest_color, ColorWheelEntry, GoboWheelEntry};

/// Channel offsets for a wheel-based moving head.
#[derive(Debug, Clone, PartialEq)]
pub struct MoverLayout {
    /// Pan coarse channel
    pub pan_coarse: usize,
    /// Pan fine channel
    pub pan_fine: Option<usize>,
    /// Tilt coarse channel
    pub tilt_coarse: usize,
    /// Tilt fine channel
    pub tilt_fine: Option<usize>,
    /// Pan/tilt speed channel
    pub speed: usize,
    /// Color wheel channel
    pub color_wheel: usize,
    /// Gobo wheel channel
    pub gobo_wheel: usize,
    /// Dimmer channel
    pub dimmer: usize,
    /// Shutter/strobe channel
    pub shutter: usize,
}

/// Static description of a wheel-based moving head.
#[derive(Debug, Clone, PartialEq)]
pub struct MoverProfile {
    /// Channel layout
    pub layout: MoverLayout,
    /// Color wheel slots
    pub color_wheel: Vec<ColorWheelEntry>,
    /// Gobo wheel slots
    pub gobo_wheel: Vec<GoboWheelEntry>,
    /// Pan DMX range mapped from pan `0..=255`
    pub pan_range: (f32, f32),
    /// Tilt DMX range mapped from tilt `0..=255`
    pub tilt_range: (f32, f32),
    /// Dimmer value written for full brightness
    pub dimmer_upper: f32,
    /// Shutter value for "open"
    pub shutter_open: u8,
    /// Shutter values for slowest and fastest strobe
    pub strobe_shutter: (f32, f32),
}

impl MoverProfile {
    /// Convert pan/tilt angle limits in degrees into DMX ranges.
    ///
    /// Pan spans 540 degrees and tilt 270 degrees over the full DMX range.
    pub fn with_angles(mut self, pan: (f32, f32), tilt: (f32, f32)) -> Self {
        self.pan_range = (pan.0 / 540.0 * 255.0, pan.1 / 540.0 * 255.0);
        self.tilt_range = (tilt.0 / 270.0 * 255.0, tilt.1 / 270.0 * 255.0);
        self
    }
}

/// Translation rules for one fixture node.
#[derive(Debug, Clone, PartialEq)]
pub enum FixtureModel {
    /// Values are left as written
    Generic,
    /// `values[0]` is the dimmer
    HouseDimmer,
    /// Dimmer, RGB, strobe
    LedPar,
    /// RGB, amber, white, UV, strobe. No dimmer channel, so color is dimmed.
    ParRgbawu,
    /// Wheel-based moving head
    Mover(Box<MoverProfile>),
    /// Pan strip with a master dimmer and RGBW bulbs
    Motionstrip {
        /// Pan DMX value at pan 0
        pan_lower: f32,
        /// Pan DMX value at pan 255
        pan_upper: f32,
    },
    /// Five dimmable beams with pan/tilt
    FiveBeamLaser,
    /// Two beam laser switched by its mode channel
    TwoBeamLaser,
    /// Three 8-channel bulbs plus strobe and rotation
    Rotosphere,
    /// RGBW, strobe and rotation
    Derby,
    /// 4-channel RGBW bulb rendered into its parent
    RgbwBulb,
    /// 8-channel rotosphere bulb rendered into its parent
    RotosphereBulb,
    /// Fixture group
    Group,
    /// Group driven only by `manual_dimmer`
    ManualGroup {
        /// Operator level, `0..=1`
        manual_dimmer: f32,
    },
}

fn put(values: &mut [u8], index: usize, value: f32) {
    if let Some(slot) = values.get_mut(index) {
        *slot = dmx_clamp(value);
    }
}

fn put_rgbw(values: &mut [u8], start: usize, color: &Color) {
    let (r, g, b, w) = color.to_rgbw();
    put(values, start, r);
    put(values, start + 1, g);
    put(values, start + 2, b);
    put(values, start + 3, w);
}

impl FixtureModel {
    /// Recompute `base.values` from the accumulators.
    ///
    /// Bulb regions of a parent are left alone; bulbs write them at render.
    pub fn translate(&self, base: &mut FixtureBase) {
        let FixtureBase {
            values,
            color,
            dimmer,
            strobe,
            speed,
            pan,
            tilt,
            gobo,
            ..
        } = base;
        let (dimmer, strobe, speed, pan, tilt) = (*dimmer, *strobe, *speed, *pan, *tilt);

        match self {
            FixtureModel::Generic
            | FixtureModel::Group
            | FixtureModel::ManualGroup { .. }
            | FixtureModel::RgbwBulb
            | FixtureModel::RotosphereBulb => {}
            FixtureModel::HouseDimmer => put(values, 0, dimmer),
            FixtureModel::LedPar => {
                let (r, g, b) = color.to_dmx();
                put(values, 0, dimmer);
                put(values, 1, r);
                put(values, 2, g);
                put(values, 3, b);
                put(values, 4, strobe);
            }
            FixtureModel::ParRgbawu => {
                let dimmed = color.dim(dimmer / 255.0);
                let (r, g, b, w) = dimmed.to_rgbw();
                put(values, 0, r);
                put(values, 1, g);
                put(values, 2, b);
                put(values, 4, w);
                put(values, 5, b);
                put(values, 6, strobe.min(250.0));
            }
            FixtureModel::Mover(profile) => {
                let layout = &profile.layout;

                let (pan_lo, pan_hi) = profile.pan_range;
                let projected = pan_lo + (pan_hi - pan_lo) * pan / 255.0;
                put(values, layout.pan_coarse, projected.floor());
                if let Some(fine) = layout.pan_fine {
                    put(values, fine, (projected - projected.floor()) * 255.0);
                }

                let (tilt_lo, tilt_hi) = profile.tilt_range;
                let projected = tilt_lo + (tilt_hi - tilt_lo) * tilt / 255.0;
                put(values, layout.tilt_coarse, projected.floor());
                if let Some(fine) = layout.tilt_fine {
                    put(values, fine, (projected - projected.floor()) * 255.0);
                }

                put(values, layout.speed, speed);
                put(values, layout.dimmer, dimmer / 255.0 * profile.dimmer_upper);

                if let Some(slot) = closest_color(&profile.color_wheel, color) {
                    put(values, layout.color_wheel, slot.dmx_value as f32);
                }

                let gobo_value = gobo
                    .as_deref()
                    .and_then(|name| profile.gobo_wheel.iter().find(|g| g.name == name))
                    .map_or(0, |g| g.dmx_value);
                put(values, layout.gobo_wheel, gobo_value as f32);

                if strobe < 10.0 {
                    put(values, layout.shutter, profile.shutter_open as f32);
                } else {
                    let (lower, upper) = profile.strobe_shutter;
                    put(values, layout.shutter, lower + (upper - lower) * strobe / 255.0);
                }
            }
            FixtureModel::Motionstrip {
                pan_lower,
                pan_upper,
            } => {
                put(values, 0, pan_lower + (pan_upper - pan_lower) * pan / 255.0);
                // Pan speed
                put(values, 1, 128.0);
                put(values, 4, dimmer);
                put(values, 5, strobe);
            }
            FixtureModel::FiveBeamLaser => {
                // Manual mode, fixed pattern
                put(values, 0, 0.0);
                for i in 1..=5 {
                    put(values, i, dimmer);
                }
                put(values, 6, 50.0);
                put(values, 7, pan);
                put(values, 8, tilt);
            }
            FixtureModel::TwoBeamLaser => {
                put(values, 0, if dimmer > 0.0 { 69.0 } else { 0.0 });
                put(values, 1, 14.0);
                put(values, 2, 204.0);
                put(values, 3, 102.0);
                put(values, 4, 170.0);
                put(values, 5, 135.0);
            }
            FixtureModel::Rotosphere => {
                put(values, 24, strobe);
                put(values, 27, speed);
            }
            FixtureModel::Derby => {
                put_rgbw(values, 0, &color.dim(dimmer / 255.0));
                put(values, 4, strobe.min(250.0));
                put(values, 5, speed);
            }
        }
    }

    /// Color the fixture can actually produce for `color`.
    pub fn quantize_color(&self, color: Color) -> Color {
        match self {
            FixtureModel::Mover(profile) => closest_color(&profile.color_wheel, &color)
                .map_or(color, |slot| slot.color),
            _ => color,
        }
    }

    /// Gobo wheel, if this model has one.
    pub fn gobo_wheel(&self) -> Option<&[GoboWheelEntry]> {
        match self {
            FixtureModel::Mover(profile) => Some(&profile.gobo_wheel),
            _ => None,
        }
    }

    /// Bytes a bulb contributes to its parent's buffer.
    pub fn bulb_bytes(&self, bulb: &FixtureBase) -> Vec<u8> {
        let c = bulb.color.dim(bulb.dimmer / 255.0);
        match self {
            FixtureModel::RgbwBulb => {
                let mut out = vec![0; 4];
                put_rgbw(&mut out, 0, &c);
                out
            }
            FixtureModel::RotosphereBulb => {
                let mut out = vec![0; 8];
                let (r, g, b) = c.to_dmx();
                put(&mut out, 0, r);
                put(&mut out, 1, g);
                put(&mut out, 2, b);
                put(&mut out, 3, c.lightness() * 255.0);
                let hue = c.hue();
                let intensity = c.saturation() * c.lightness() * 255.0;
                for (i, emitter_hue) in [0.5, 5.0 / 6.0, 1.0 / 6.0, 1.0 / 12.0].iter().enumerate() {
                    put(&mut out, 4 + i, hue_weight(hue, *emitter_hue) * intensity);
                }
                out
            }
            _ => Vec::new(),
        }
    }
}

/// 1 when hues match, falling to 0 a quarter turn away.
fn hue_weight(a: f32, b: f32) -> f32 {
    let d = (a - b).abs();
    let d = d.min(1.0 - d);
    (1.0 - d * 4.0).clamp(0.0, 1.0)
}
