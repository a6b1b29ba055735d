use spirv_std::glam::Vec3;

#[derive(Copy, Clone, Default, PartialEq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct Ray {
    origin: Vec3,
    dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    /// Creates a ray going from `origin` towards `point`.
    ///
    /// Degenerate rays (where both points are the same) get a zero direction.
    pub fn towards(origin: Vec3, point: Vec3) -> Self {
        Self::new(origin, (point - origin).normalize_or_zero())
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn dir(&self) -> Vec3 {
        self.dir
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.dir * distance
    }
}
