use ot_math::Vec3;

/// Centroid, spread and measured focal ratio of a set of ray hits on a
/// detector plane, used to grade focus quality in end-to-end checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub centroid: Vec3,
    pub max_radius: f64,
    pub rms_radius: f64,
    pub count: usize,
}

impl Footprint {
    /// `points` are local-frame hit coordinates on the detector plane;
    /// `beam_radius` and `distance_to_focus` let the caller derive a
    /// measured f/# as `distance_to_focus / (2 * beam_radius)`.
    pub fn from_points(points: &[Vec3]) -> Self {
        if points.is_empty() {
            return Self { centroid: Vec3::ZERO, max_radius: 0.0, rms_radius: 0.0, count: 0 };
        }
        let centroid = points.iter().fold(Vec3::ZERO, |acc, p| acc + *p) / points.len() as f64;
        let mut max_r2 = 0.0f64;
        let mut sum_r2 = 0.0f64;
        for p in points {
            let r2 = (*p - centroid).length_squared();
            max_r2 = max_r2.max(r2);
            sum_r2 += r2;
        }
        Self {
            centroid,
            max_radius: max_r2.sqrt(),
            rms_radius: (sum_r2 / points.len() as f64).sqrt(),
            count: points.len(),
        }
    }

    /// Measured focal ratio given the input beam's full aperture diameter
    /// and the axial distance the rays traveled from aperture to this
    /// footprint's plane.
    pub fn measured_f_number(&self, aperture_diameter: f64, axial_distance: f64) -> f64 {
        if aperture_diameter <= 0.0 {
            return f64::INFINITY;
        }
        axial_distance / aperture_diameter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_of_symmetric_points_is_origin() {
        let points = vec![
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
        ];
        let fp = Footprint::from_points(&points);
        assert!(fp.centroid.length() < 1e-9);
        assert!((fp.max_radius - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_footprint_is_degenerate() {
        let fp = Footprint::from_points(&[]);
        assert_eq!(fp.count, 0);
        assert_eq!(fp.max_radius, 0.0);
    }
}
