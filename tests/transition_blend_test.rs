use melon_scene::transition::{TransitionParams, blend, full_transition_at, weight};

const SEA: [f32; 4] = [0.1, 0.3, 0.8, 1.0];
const FIRE: [f32; 4] = [0.9, 0.4, 0.05, 0.5];

fn masks() -> impl Iterator<Item = f32> {
    (0..=20).map(|i| i as f32 / 20.0)
}

#[test]
fn endpoints_show_a_single_texture() {
    for strength in [0.0, 0.05, TransitionParams::MAX_STRENGTH] {
        for mask in masks() {
            assert_eq!(blend(SEA, FIRE, mask, 0.0, strength), SEA);
            assert_eq!(blend(SEA, FIRE, mask, 1.0, strength), FIRE);
        }
    }
}

#[test]
fn weight_grows_with_the_transition() {
    for mask in masks() {
        let mut last = 0.0;
        for step in 0..=50 {
            let w = weight(mask, step as f32 / 50.0, TransitionParams::MAX_STRENGTH);
            assert!(w >= last, "weight fell at mask {mask}");
            last = w;
        }
    }
}

#[test]
fn darker_mask_texels_switch_first() {
    let t = 0.5;
    assert!(weight(0.2, t, TransitionParams::MAX_STRENGTH) > weight(0.8, t, TransitionParams::MAX_STRENGTH));
}

#[test]
fn full_transition_point_reaches_texture_b() {
    for mask in masks() {
        let t = full_transition_at(mask, TransitionParams::MAX_STRENGTH);
        assert!((0.0..=1.0).contains(&t));
        assert!((weight(mask, t, TransitionParams::MAX_STRENGTH) - 1.0).abs() < 1e-5);
    }
}
