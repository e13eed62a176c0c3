use glam::{Mat4, Vec3};

use crate::input::{InputFrame, InputState, Key, MouseButton};

/// Translation speed, world units per second.
pub const MOVE_SPEED: f32 = 4.0;
/// Degrees of rotation per pixel of pointer motion.
pub const LOOK_SENSITIVITY: f32 = 0.18;
pub const PITCH_LIMIT: f32 = 89.0;
pub const FOV_MIN: f32 = 15.0;
pub const FOV_MAX: f32 = 90.0;
pub const NEAR: f32 = 0.1;
pub const FAR: f32 = 100.0;

/// Free-fly camera. Angles are in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub world_up: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.5, 10.0),
            yaw: -90.0,
            pitch: -10.0,
            fov: 45.0,
            world_up: Vec3::Y,
        }
    }
}

impl Camera {
    pub fn front(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.front().cross(self.world_up).normalize()
    }

    pub fn up(&self) -> Vec3 {
        self.right().cross(self.front()).normalize()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front(), self.up())
    }

    /// Perspective projection with a [0, 1] depth range.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), aspect, NEAR, FAR)
    }

    /// Moves along the view axes. `forward`, `strafe` and `lift` are in
    /// [-1, 1]; `lift` follows the world up axis.
    pub fn translate(&mut self, forward: f32, strafe: f32, lift: f32, dt: f32) {
        let step = MOVE_SPEED * dt;
        self.position += self.front() * forward * step;
        self.position += self.right() * strafe * step;
        self.position += self.world_up * lift * step;
    }

    /// Rotates by a pointer delta in pixels (+y down).
    pub fn look(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * LOOK_SENSITIVITY;
        self.pitch = (self.pitch - dy * LOOK_SENSITIVITY).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Narrows the field of view by `lines` degrees of wheel motion.
    pub fn zoom(&mut self, lines: f32) {
        self.fov = (self.fov - lines).clamp(FOV_MIN, FOV_MAX);
    }

    /// Applies one frame of keyboard and mouse input.
    ///
    /// WASD moves in the view plane, E/Q rise and sink, dragging with the
    /// right button looks around, and the wheel zooms.
    pub fn update(&mut self, input: &InputState, frame: &InputFrame, dt: f32) {
        let axis = |pos: Key, neg: Key| (input.key_down(pos) as i32 - input.key_down(neg) as i32) as f32;
        let forward = axis(Key::W, Key::S);
        let strafe = axis(Key::D, Key::A);
        let lift = axis(Key::E, Key::Q);
        if forward != 0.0 || strafe != 0.0 || lift != 0.0 {
            self.translate(forward, strafe, lift, dt);
        }

        if input.button_down(MouseButton::Right) {
            let (dx, dy) = frame.pointer_delta;
            self.look(dx, dy);
        }

        let (_, wheel) = frame.wheel_lines;
        if wheel != 0.0 {
            self.zoom(wheel);
        }
    }
}
