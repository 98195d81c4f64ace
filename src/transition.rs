//! Mask-driven texture transition.
//!
//! The ground plane blends texture A into texture B. A scalar `transition` in
//! `[0, 1]` drives the blend globally while a mask texture shifts, per pixel,
//! the moment at which that pixel crosses over. This produces a wipe that follows
//! the mask instead of a flat cross-fade.
//!
//! The blend weight for a pixel with mask value `m` is
//!
//! ```text
//! w = clamp(t + s * (t - m), 0, 1)
//! ```
//!
//! where `t` is the transition and `s` the strength. The grouping keeps both
//! endpoints exact in floating point: `t = 0` yields `w <= 0` and `t = 1` yields
//! `w >= 1` for every mask value in `[0, 1]`. With `s = 0` every pixel
//! shares the weight `t`. With larger `s` the low-mask pixels lead and the
//! high-mask pixels trail. A pixel is fully transitioned once
//! `t >= (1 + m * s) / (1 + s)`.
//!
//! [`blend`] is the CPU mirror of `pipelines/transition.wgsl`. The two must
//! stay arithmetically identical.

/// Tint applied to the material when no other colour is configured (`#0088FF`).
pub const DEFAULT_TINT: [f32; 3] = [0.0, 0x88 as f32 / 255.0, 1.0];

/// Shader inputs of the transition material that are not textures.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionParams {
    /// Global blend progress. Kept in `[0, 1]` by [`TransitionParams::set_transition`].
    transition: f32,
    /// How far the mask pulls pixels apart in time. Kept `>= 0`.
    strength: f32,
    pub tint: [f32; 3],
    /// Seconds of elapsed animation time. Uploaded but not used by the blend.
    pub time: f32,
}

impl TransitionParams {
    pub const MAX_STRENGTH: f32 = 2.0;

    pub fn new(transition: f32, strength: f32) -> Self {
        let mut params = Self {
            transition: 0.0,
            strength: 0.0,
            tint: DEFAULT_TINT,
            time: 0.0,
        };
        params.set_transition(transition);
        params.set_strength(strength);
        params
    }

    pub fn transition(&self) -> f32 {
        self.transition
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    /// Clamps to `[0, 1]`. NaN resets to `0`.
    pub fn set_transition(&mut self, value: f32) {
        self.transition = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        };
    }

    /// Clamps to `[0, MAX_STRENGTH]`. NaN resets to `0`.
    pub fn set_strength(&mut self, value: f32) {
        self.strength = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, Self::MAX_STRENGTH)
        };
    }

    pub fn to_uniform(&self) -> TransitionUniform {
        TransitionUniform {
            tint: self.tint,
            transition: self.transition,
            strength: self.strength,
            time: self.time,
            _padding: [0.0; 2],
        }
    }
}

impl Default for TransitionParams {
    fn default() -> Self {
        Self::new(0.0, 0.05)
    }
}

/// GPU layout of [`TransitionParams`]. Matches `TransitionUniform` in `transition.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransitionUniform {
    pub tint: [f32; 3],
    pub transition: f32,
    pub strength: f32,
    pub time: f32,
    // Uniform structs are padded to 16 bytes
    _padding: [f32; 2],
}

/// Blend weight towards texture B for a pixel with mask value `mask`.
pub fn weight(mask: f32, transition: f32, strength: f32) -> f32 {
    (transition + strength * (transition - mask)).clamp(0.0, 1.0)
}

/// The transition value at which a pixel with mask value `mask` shows pure texture B.
pub fn full_transition_at(mask: f32, strength: f32) -> f32 {
    (1.0 + mask * strength) / (1.0 + strength)
}

/// Colour of one pixel given the samples of both textures and the mask.
///
/// Alpha is blended like the colour channels so that transparent regions of
/// either texture stay see-through while the wipe passes.
pub fn blend(a: [f32; 4], b: [f32; 4], mask: f32, transition: f32, strength: f32) -> [f32; 4] {
    let w = weight(mask, transition, strength);
    let mut out = [0.0; 4];
    for i in 0..4 {
        out[i] = a[i] * (1.0 - w) + b[i] * w;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEA: [f32; 4] = [0.1, 0.35, 0.8, 1.0];
    const FIRE: [f32; 4] = [0.95, 0.3, 0.05, 0.6];
    const MASKS: [f32; 6] = [0.0, 0.1, 0.25, 0.5, 0.9, 1.0];
    const STRENGTHS: [f32; 5] = [0.0, 0.02, 0.05, 1.0, 2.0];

    #[test]
    fn zero_transition_shows_texture_a() {
        for m in MASKS {
            for s in STRENGTHS {
                assert_eq!(blend(SEA, FIRE, m, 0.0, s), SEA, "m={m} s={s}");
            }
        }
    }

    #[test]
    fn full_transition_shows_texture_b() {
        for m in MASKS {
            for s in STRENGTHS {
                assert_eq!(blend(SEA, FIRE, m, 1.0, s), FIRE, "m={m} s={s}");
            }
        }
    }

    #[test]
    fn weight_never_decreases_with_transition() {
        for m in MASKS {
            for s in STRENGTHS {
                let mut previous = 0.0;
                for step in 0..=100 {
                    let t = step as f32 / 100.0;
                    let w = weight(m, t, s);
                    assert!(w >= previous, "m={m} s={s} t={t}: {w} < {previous}");
                    previous = w;
                }
            }
        }
    }

    #[test]
    fn low_mask_values_finish_first() {
        let s = 0.5;
        for pair in MASKS.windows(2) {
            let (low, high) = (pair[0], pair[1]);
            assert!(full_transition_at(low, s) <= full_transition_at(high, s));
            for step in 0..=20 {
                let t = step as f32 / 20.0;
                assert!(weight(low, t, s) >= weight(high, t, s));
            }
        }
    }

    #[test]
    fn pixel_is_pure_b_from_its_threshold_on() {
        for m in MASKS {
            for s in STRENGTHS {
                let t = full_transition_at(m, s);
                assert!((weight(m, t, s) - 1.0).abs() < 1e-6, "m={m} s={s}");
            }
        }
    }

    #[test]
    fn zero_strength_is_a_uniform_cross_fade() {
        for m in MASKS {
            assert_eq!(weight(m, 0.3, 0.0), 0.3);
        }
    }

    #[test]
    fn blending_is_deterministic() {
        let first = blend(SEA, FIRE, 0.42, 0.37, 0.05);
        let second = blend(SEA, FIRE, 0.42, 0.37, 0.05);
        for (x, y) in first.iter().zip(second.iter()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }

    #[test]
    fn setters_clamp_out_of_range_values() {
        let mut params = TransitionParams::default();
        params.set_transition(1.5);
        assert_eq!(params.transition(), 1.0);
        params.set_transition(-0.2);
        assert_eq!(params.transition(), 0.0);
        params.set_transition(f32::NAN);
        assert_eq!(params.transition(), 0.0);
        params.set_strength(-1.0);
        assert_eq!(params.strength(), 0.0);
        params.set_strength(10.0);
        assert_eq!(params.strength(), TransitionParams::MAX_STRENGTH);
    }

    #[test]
    fn uniform_is_two_vec4s() {
        assert_eq!(std::mem::size_of::<TransitionUniform>(), 32);
        let uniform = TransitionParams::default().to_uniform();
        assert_eq!(uniform.strength, 0.05);
        assert_eq!(uniform.transition, 0.0);
        assert_eq!(uniform.tint, DEFAULT_TINT);
    }
}
