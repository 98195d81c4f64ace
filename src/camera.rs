//! Perspective camera, orbit controller and the camera uniform.
//!
//! The controller orbits an [`OrbitCamera`] around its target. Pointer drags and
//! wheel steps only accumulate a pending delta; [`OrbitController::update`]
//! applies a damped fraction of it each frame so the camera keeps gliding
//! after the pointer stops.

use std::f32::consts::PI;

use cgmath::{InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector3};
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

use crate::config::{CameraSettings, ResizePolicy};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Keeps the polar angle away from the poles where `look_at` degenerates.
const POLE_EPSILON: f32 = 1e-6;

/// Vertical perspective projection.
///
/// The aspect ratio is captured from the surface size at startup. Whether it
/// follows later surface resizes is decided by [`crate::config::ResizePolicy`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Reacts to a new surface size. Returns whether the aspect changed.
    pub fn surface_resized(&mut self, policy: ResizePolicy, width: u32, height: u32) -> bool {
        match policy {
            ResizePolicy::KeepStartupAspect => false,
            ResizePolicy::TrackSurface => {
                let before = self.aspect;
                self.resize(width, height);
                before != self.aspect
            }
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Camera described in spherical coordinates around a target.
///
/// `phi` is the polar angle measured from +Y, `theta` the azimuth measured from
/// +Z towards +X.
#[derive(Clone, Copy, Debug)]
pub struct OrbitCamera {
    pub target: Point3<f32>,
    pub radius: f32,
    pub phi: f32,
    pub theta: f32,
}

impl OrbitCamera {
    /// Creates a camera at `eye` looking at `target`.
    pub fn looking_at(eye: Point3<f32>, target: Point3<f32>) -> Self {
        let offset = eye - target;
        let radius = offset.magnitude();
        let (phi, theta) = if radius == 0.0 {
            (PI / 2.0, 0.0)
        } else {
            ((offset.y / radius).clamp(-1.0, 1.0).acos(), offset.x.atan2(offset.z))
        };
        Self {
            target,
            radius,
            phi,
            theta,
        }
    }

    pub fn eye(&self) -> Point3<f32> {
        let sin_phi = self.phi.sin();
        self.target
            + Vector3::new(
                self.radius * sin_phi * self.theta.sin(),
                self.radius * self.phi.cos(),
                self.radius * sin_phi * self.theta.cos(),
            )
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.eye(), self.target, Vector3::unit_y())
    }
}

/// Orbit interaction with inertia.
#[derive(Clone, Debug)]
pub struct OrbitController {
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_polar: f32,
    pub max_polar: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    delta_theta: f32,
    delta_phi: f32,
    pending_scale: f32,
    is_rotating: bool,
    last_cursor: Option<PhysicalPosition<f64>>,
    viewport_height: f32,
}

impl OrbitController {
    pub fn new(settings: &CameraSettings, viewport_height: u32) -> Self {
        Self {
            damping_factor: settings.damping_factor,
            rotate_speed: settings.rotate_speed,
            zoom_speed: settings.zoom_speed,
            min_polar: settings.min_polar,
            max_polar: settings.max_polar,
            min_distance: settings.min_distance,
            max_distance: settings.max_distance,
            delta_theta: 0.0,
            delta_phi: 0.0,
            pending_scale: 1.0,
            is_rotating: false,
            last_cursor: None,
            viewport_height: viewport_height.max(1) as f32,
        }
    }

    pub fn set_viewport_height(&mut self, height: u32) {
        self.viewport_height = height.max(1) as f32;
    }

    /// Feeds a pointer drag of `dx`/`dy` pixels.
    pub fn handle_drag(&mut self, dx: f64, dy: f64) {
        let full_turn = 2.0 * PI * self.rotate_speed / self.viewport_height;
        self.delta_theta -= dx as f32 * full_turn;
        self.delta_phi -= dy as f32 * full_turn;
    }

    /// Feeds `steps` wheel notches. Positive steps move the camera closer.
    pub fn handle_scroll(&mut self, steps: f32) {
        self.pending_scale *= 0.95f32.powf(self.zoom_speed * steps);
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.is_rotating = *state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(last) = self.last_cursor {
                    if self.is_rotating {
                        self.handle_drag(position.x - last.x, position.y - last.y);
                    }
                }
                self.last_cursor = Some(*position);
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_cursor = None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    // Browsers and touchpads report pixels, roughly 100 per notch
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => *y as f32 / 100.0,
                };
                self.handle_scroll(steps);
            }
            _ => (),
        }
    }

    /// Advances the camera by one damped step.
    pub fn update(&mut self, camera: &mut OrbitCamera) {
        camera.theta += self.delta_theta * self.damping_factor;
        camera.phi += self.delta_phi * self.damping_factor;
        camera.phi = camera
            .phi
            .clamp(self.min_polar, self.max_polar)
            .clamp(POLE_EPSILON, PI - POLE_EPSILON);

        camera.radius = (camera.radius * self.pending_scale).clamp(self.min_distance, self.max_distance);
        self.pending_scale = 1.0;

        self.delta_theta *= 1.0 - self.damping_factor;
        self.delta_phi *= 1.0 - self.damping_factor;
    }

    pub fn is_settled(&self) -> bool {
        self.delta_theta.abs() < 1e-5 && self.delta_phi.abs() < 1e-5
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    /// Homogeneous eye position, `w` keeps the 16 byte alignment.
    pub view_position: [f32; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view: Matrix4::identity().into(),
            projection: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &OrbitCamera, projection: &Projection) {
        self.view_position = camera.eye().to_homogeneous().into();
        self.view = camera.calc_matrix().into();
        self.projection = projection.calc_matrix().into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// GPU side of the camera together with its CPU state.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: OrbitCamera,
    pub controller: OrbitController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    /// Steps the controller and uploads the new view.
    pub fn update(&mut self, queue: &wgpu::Queue, projection: &Projection) {
        self.controller.update(&mut self.camera);
        self.uniform.update_view_proj(&self.camera, projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> CameraSettings {
        CameraSettings::default()
    }

    #[test]
    fn spherical_round_trip_keeps_the_eye() {
        let camera = OrbitCamera::looking_at(Point3::new(1.5, 1.0, 2.0), Point3::new(0.0, 0.0, 0.0));
        let eye = camera.eye();
        assert!((eye.x - 1.5).abs() < 1e-5);
        assert!((eye.y - 1.0).abs() < 1e-5);
        assert!((eye.z - 2.0).abs() < 1e-5);
        assert!((camera.radius - 7.25f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn drag_keeps_gliding_and_settles() {
        let mut camera = OrbitCamera::looking_at(Point3::new(1.5, 1.0, 2.0), Point3::new(0.0, 0.0, 0.0));
        let mut controller = OrbitController::new(&settings(), 600);
        let start = camera.theta;
        controller.handle_drag(120.0, 0.0);

        controller.update(&mut camera);
        let after_one = camera.theta;
        controller.update(&mut camera);
        let after_two = camera.theta;
        assert!(after_one < start);
        assert!(after_two < after_one, "inertia should keep turning the camera");

        for _ in 0..1000 {
            controller.update(&mut camera);
        }
        assert!(controller.is_settled());
        // The damped steps sum up to the full drag
        let expected = start - 2.0 * PI * 120.0 / 600.0;
        assert!((camera.theta - expected).abs() < 1e-3);
    }

    #[test]
    fn polar_angle_never_passes_the_clamp() {
        let mut camera = OrbitCamera::looking_at(Point3::new(1.5, 1.0, 2.0), Point3::new(0.0, 0.0, 0.0));
        let mut controller = OrbitController::new(&settings(), 600);
        // Dragging upwards pushes the camera below the horizon
        controller.handle_drag(0.0, -5000.0);
        for _ in 0..500 {
            controller.update(&mut camera);
            assert!(camera.phi <= controller.max_polar + f32::EPSILON);
        }
        assert!(camera.eye().y > 0.0);
    }

    #[test]
    fn scrolling_dollies_within_bounds() {
        let mut camera = OrbitCamera::looking_at(Point3::new(0.0, 0.0, 2.0), Point3::new(0.0, 0.0, 0.0));
        let mut controller = OrbitController::new(&settings(), 600);
        controller.handle_scroll(1.0);
        controller.update(&mut camera);
        assert!((camera.radius - 1.9).abs() < 1e-5);

        controller.handle_scroll(-10_000.0);
        controller.update(&mut camera);
        assert_eq!(camera.radius, controller.max_distance);
    }

    #[test]
    fn drag_without_button_is_ignored() {
        let mut controller = OrbitController::new(&settings(), 600);
        let moved = |x: f64, y: f64| WindowEvent::CursorMoved {
            device_id: unsafe { winit::event::DeviceId::dummy() },
            position: PhysicalPosition::new(x, y),
        };
        controller.handle_window_events(&moved(10.0, 10.0));
        controller.handle_window_events(&moved(50.0, 10.0));
        assert!(controller.is_settled());
    }

    #[test]
    fn projection_keeps_aspect_until_resized() {
        let mut projection = Projection::new(800, 600, cgmath::Deg(75.0), 0.1, 1000.0);
        assert!((projection.aspect() - 800.0 / 600.0).abs() < 1e-6);
        projection.resize(1000, 500);
        assert_eq!(projection.aspect(), 2.0);
        projection.resize(10, 0);
        assert_eq!(projection.aspect(), 10.0);
    }
}
