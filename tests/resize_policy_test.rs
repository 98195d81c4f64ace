use cgmath::Deg;
use melon_scene::{camera::Projection, config::ResizePolicy};

fn projection() -> Projection {
    Projection::new(800, 600, Deg(45.0), 0.1, 100.0)
}

#[test]
fn startup_aspect_is_kept_by_default() {
    assert_eq!(ResizePolicy::default(), ResizePolicy::KeepStartupAspect);

    let mut projection = projection();
    let before = projection.calc_matrix();
    assert!(!projection.surface_resized(ResizePolicy::KeepStartupAspect, 400, 600));
    assert_eq!(projection.aspect(), 800.0 / 600.0);
    assert_eq!(projection.calc_matrix(), before);
}

#[test]
fn tracking_follows_the_surface() {
    let mut projection = projection();
    assert!(projection.surface_resized(ResizePolicy::TrackSurface, 400, 600));
    assert_eq!(projection.aspect(), 400.0 / 600.0);
}

#[test]
fn tracking_the_same_aspect_reports_no_change() {
    let mut projection = projection();
    assert!(!projection.surface_resized(ResizePolicy::TrackSurface, 1600, 1200));
    assert_eq!(projection.aspect(), 800.0 / 600.0);
}
