use cgmath::{Deg, InnerSpace, Matrix4, SquareMatrix, Vector3};

/// World up axis shared by the look-at construction and the orbit axes.
pub const WORLD_UP: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);

/// Angle limit for the constrained update paths, in degrees.
const ANGLE_LIMIT: f32 = 89.0;

/// Free-look + orbit camera.
///
/// Look direction (pitch/yaw) and the orbited object's orientation
/// (phi/theta) are deliberately independent angle pairs, so the same
/// camera can fly first-person and spin a focal object arcball-style
/// without the two controls coupling. The combined view matrix is
/// always `camera_mat * object_mat`: the object rotation applies in
/// object space before the camera views it.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Vector3<f32>,
    pub front: Vector3<f32>,
    pub up: Vector3<f32>,
    pub right: Vector3<f32>,

    /// Free-look angles, degrees.
    pub pitch: f32,
    pub yaw: f32,
    /// Orbit angles for the focal object, degrees.
    pub phi: f32,
    pub theta: f32,

    camera_mat: Matrix4<f32>,
    object_mat: Matrix4<f32>,
    view_mat: Matrix4<f32>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    pub fn new() -> Self {
        let mut camera = Self {
            position: Vector3::new(0.0, 0.0, 1.0),
            front: Vector3::new(0.0, 0.0, -1.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            right: Vector3::new(1.0, 0.0, 0.0),
            pitch: 0.0,
            yaw: 0.0,
            phi: 0.0,
            theta: 0.0,
            camera_mat: Matrix4::identity(),
            object_mat: Matrix4::identity(),
            view_mat: Matrix4::identity(),
        };
        camera.compute_camera_mat();
        camera.compute_object_mat();
        camera.view_mat = camera.camera_mat * camera.object_mat;
        camera
    }

    /// World-to-camera transform including the object's orbit rotation.
    pub fn view_mat(&self) -> Matrix4<f32> {
        self.view_mat
    }

    /// The camera component alone, derived from position and pitch/yaw.
    pub fn camera_mat(&self) -> Matrix4<f32> {
        self.camera_mat
    }

    /// The orbited object's rotation, derived from phi/theta.
    pub fn object_mat(&self) -> Matrix4<f32> {
        self.object_mat
    }

    /// Adds pitch/yaw deltas (degrees) and rebuilds the view matrix.
    ///
    /// With `constrain` both angles clamp to [-89, 89] degrees, which
    /// keeps the spherical conversion away from the gimbal poles.
    pub fn update_look(&mut self, delta_pitch: f32, delta_yaw: f32, constrain: bool) {
        self.pitch += delta_pitch;
        self.yaw += delta_yaw;

        if constrain {
            self.pitch = self.pitch.clamp(-ANGLE_LIMIT, ANGLE_LIMIT);
            self.yaw = self.yaw.clamp(-ANGLE_LIMIT, ANGLE_LIMIT);
        }

        self.compute_camera_mat();
        self.view_mat = self.camera_mat * self.object_mat;
    }

    /// Adds phi/theta deltas (degrees) to the orbited object's angles.
    pub fn update_object(&mut self, delta_phi: f32, delta_theta: f32, constrain: bool) {
        self.phi += delta_phi;
        self.theta += delta_theta;

        if constrain {
            self.phi = self.phi.clamp(-ANGLE_LIMIT, ANGLE_LIMIT);
            self.theta = self.theta.clamp(-ANGLE_LIMIT, ANGLE_LIMIT);
        }

        self.compute_object_mat();
        self.view_mat = self.camera_mat * self.object_mat;
    }

    /// Moves the camera along its front vector by `delta`.
    ///
    /// The caller scales `delta` by elapsed time for constant-rate
    /// motion; negative values move backwards.
    pub fn update_forward(&mut self, delta: f32) {
        self.position += self.front * delta;
        self.camera_mat = Self::look_at(self.position, self.position + self.front, WORLD_UP);
        self.view_mat = self.camera_mat * self.object_mat;
    }

    /// Restores the construction-time pose and recomputes all matrices.
    pub fn reset(&mut self) {
        self.position = Vector3::new(0.0, 0.0, 1.0);
        self.front = Vector3::new(0.0, 0.0, -1.0);
        self.up = Vector3::new(0.0, 1.0, 0.0);
        self.right = Vector3::new(1.0, 0.0, 0.0);
        self.pitch = 0.0;
        self.yaw = 0.0;
        self.phi = 0.0;
        self.theta = 0.0;

        self.compute_camera_mat();
        self.compute_object_mat();
        self.view_mat = self.camera_mat * self.object_mat;
    }

    /// Rebuilds the front/right/up basis from pitch/yaw and the camera
    /// matrix from the basis.
    fn compute_camera_mat(&mut self) {
        let pitch = cgmath::Rad::from(Deg(self.pitch)).0;
        let yaw = cgmath::Rad::from(Deg(self.yaw)).0;

        // Spherical to Cartesian; yaw 0 looks down -Z.
        let direction = Vector3::new(
            pitch.cos() * yaw.sin(),
            pitch.sin(),
            -pitch.cos() * yaw.cos(),
        );

        self.front = direction.normalize();
        self.right = self.front.cross(WORLD_UP).normalize();
        self.up = self.right.cross(self.front).normalize();

        self.camera_mat = Self::look_at(self.position, self.position + self.front, WORLD_UP);
    }

    /// Rebuilds the object rotation: theta about world Y, then phi
    /// about the Y-rotated X axis.
    fn compute_object_mat(&mut self) {
        let theta = cgmath::Rad::from(Deg(self.theta)).0;
        let rotated_x = Vector3::new(theta.cos(), 0.0, -theta.sin());

        self.object_mat = Matrix4::from_axis_angle(Vector3::unit_y(), Deg(self.theta))
            * Matrix4::from_axis_angle(rotated_x, Deg(self.phi));
    }

    /// Stateless right-handed look-at: builds the camera-to-world
    /// frame {right, ortho-up, -direction} with translation `start`,
    /// then inverts it into a world-to-camera transform.
    pub fn look_at(start: Vector3<f32>, end: Vector3<f32>, up: Vector3<f32>) -> Matrix4<f32> {
        let direction = (end - start).normalize();
        let right = direction.cross(up).normalize();
        let ortho_up = right.cross(direction).normalize();

        let camera_to_world = Matrix4::from_cols(
            right.extend(0.0),
            ortho_up.extend(0.0),
            (-direction).extend(0.0),
            start.extend(1.0),
        );

        // Orthonormal basis plus translation is always invertible for
        // non-degenerate input.
        camera_to_world.invert().unwrap_or_else(Matrix4::identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector4;

    const EPS: f32 = 1e-4;

    fn assert_vec3_eq(a: Vector3<f32>, b: Vector3<f32>) {
        assert!(
            (a - b).magnitude() < EPS,
            "vectors differ: {:?} vs {:?}",
            a,
            b
        );
    }

    fn assert_mat4_eq(a: Matrix4<f32>, b: Matrix4<f32>) {
        for col in 0..4 {
            for row in 0..4 {
                assert!(
                    (a[col][row] - b[col][row]).abs() < EPS,
                    "matrices differ at [{}][{}]: {} vs {}",
                    col,
                    row,
                    a[col][row],
                    b[col][row]
                );
            }
        }
    }

    #[test]
    fn constrained_angles_stay_clamped() {
        let mut camera = Camera::new();
        camera.update_look(500.0, -500.0, true);
        assert_eq!(camera.pitch, 89.0);
        assert_eq!(camera.yaw, -89.0);

        for _ in 0..100 {
            camera.update_look(30.0, 30.0, true);
            camera.update_object(-45.0, 45.0, true);
            assert!(camera.pitch >= -89.0 && camera.pitch <= 89.0);
            assert!(camera.yaw >= -89.0 && camera.yaw <= 89.0);
            assert!(camera.phi >= -89.0 && camera.phi <= 89.0);
            assert!(camera.theta >= -89.0 && camera.theta <= 89.0);
        }
    }

    #[test]
    fn unconstrained_angles_accumulate() {
        let mut camera = Camera::new();
        camera.update_look(120.0, 200.0, false);
        assert_eq!(camera.pitch, 120.0);
        assert_eq!(camera.yaw, 200.0);
    }

    #[test]
    fn reset_restores_initial_pose() {
        let initial_view = Camera::new().view_mat();

        let mut camera = Camera::new();
        camera.update_look(20.0, -35.0, true);
        camera.update_object(10.0, 70.0, true);
        camera.update_forward(3.5);
        camera.reset();

        assert_vec3_eq(camera.position, Vector3::new(0.0, 0.0, 1.0));
        assert_vec3_eq(camera.front, Vector3::new(0.0, 0.0, -1.0));
        assert_vec3_eq(camera.up, Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(camera.pitch, 0.0);
        assert_eq!(camera.yaw, 0.0);
        assert_eq!(camera.phi, 0.0);
        assert_eq!(camera.theta, 0.0);
        assert_mat4_eq(camera.view_mat(), initial_view);
    }

    #[test]
    fn view_is_always_camera_times_object() {
        let mut camera = Camera::new();
        camera.update_look(12.0, -40.0, true);
        camera.update_object(25.0, 60.0, true);
        camera.update_forward(-1.5);

        assert_mat4_eq(camera.view_mat(), camera.camera_mat() * camera.object_mat());
    }

    #[test]
    fn object_updates_leave_camera_component_untouched() {
        let mut reference = Camera::new();
        reference.update_look(15.0, 30.0, true);

        let mut camera = Camera::new();
        camera.update_look(15.0, 30.0, true);
        camera.update_object(40.0, -20.0, true);
        camera.update_object(-5.0, 12.0, true);

        assert_mat4_eq(camera.camera_mat(), reference.camera_mat());
    }

    #[test]
    fn update_forward_moves_along_front() {
        let mut camera = Camera::new();
        camera.update_look(30.0, 45.0, true);
        let front = camera.front;
        let start = camera.position;

        camera.update_forward(2.0);
        assert_vec3_eq(camera.position, start + front * 2.0);

        camera.update_forward(-2.0);
        assert_vec3_eq(camera.position, start);
    }

    #[test]
    fn look_at_basis_is_orthonormal() {
        let start = Vector3::new(1.0, 2.0, 3.0);
        let end = Vector3::new(4.0, 0.0, -2.0);
        let view = Camera::look_at(start, end, Vector3::unit_y());

        let columns = [
            Vector3::new(view[0][0], view[0][1], view[0][2]),
            Vector3::new(view[1][0], view[1][1], view[1][2]),
            Vector3::new(view[2][0], view[2][1], view[2][2]),
        ];
        for (i, col) in columns.iter().enumerate() {
            assert!(
                (col.magnitude() - 1.0).abs() < EPS,
                "column {} not unit length",
                i
            );
        }
        assert!(columns[0].dot(columns[1]).abs() < EPS);
        assert!(columns[0].dot(columns[2]).abs() < EPS);
        assert!(columns[1].dot(columns[2]).abs() < EPS);
    }

    #[test]
    fn look_at_maps_eye_to_origin() {
        let start = Vector3::new(-2.0, 5.0, 1.5);
        let end = Vector3::new(3.0, -1.0, 0.0);
        let view = Camera::look_at(start, end, Vector3::unit_y());

        let mapped = view * Vector4::new(start.x, start.y, start.z, 1.0);
        assert!(mapped.x.abs() < EPS);
        assert!(mapped.y.abs() < EPS);
        assert!(mapped.z.abs() < EPS);
        assert!((mapped.w - 1.0).abs() < EPS);
    }
}
