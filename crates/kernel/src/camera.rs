use glam::{Mat4, Quat, Vec3};

/// Perspective camera owned by the world.
///
/// The scheduler recomputes position, orientation, and aspect from the
/// player entity every render; nothing here persists across frames except
/// the projection parameters.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Vec3,
    pub orientation: Quat,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    perspective: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            fov: 60.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
            perspective: false,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select perspective projection.
    pub fn set_perspective(&mut self) {
        self.perspective = true;
    }

    pub fn is_perspective(&self) -> bool {
        self.perspective
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position).inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
