use std::fmt;

use geo::{coord, Point, Rect};
use thiserror::Error;

// Kilometres covered by one degree of latitude, and by one degree of
// longitude at the equator.
const KM_PER_DEGREE_LAT: f64 = 110.574235;
const KM_PER_DEGREE_LON_EQUATOR: f64 = 110.572833;

/// Invalid geographic input for a bounding box.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("latitude {0} is outside the open range (-90, 90)")]
    Latitude(f64),
    #[error("longitude {0} is outside the range [-180, 180]")]
    Longitude(f64),
    #[error("radius {0} km must be a positive finite number")]
    Radius(f64),
}

/// Rectangular lat/lon region used to scope an Overpass query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    rect: Rect<f64>,
}

impl BoundingBox {
    /// Builds the box spanning `radius_km` in each direction around `center`
    /// (x = longitude, y = latitude).
    ///
    /// Longitude degrees shrink toward the poles, so the poles themselves are
    /// rejected rather than producing an unbounded box.
    pub fn around(center: Point<f64>, radius_km: f64) -> Result<Self, DomainError> {
        let (lat, lon) = (center.y(), center.x());

        if !lat.is_finite() || lat <= -90.0 || lat >= 90.0 {
            return Err(DomainError::Latitude(lat));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(DomainError::Longitude(lon));
        }
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(DomainError::Radius(radius_km));
        }

        let km_per_degree_lon = KM_PER_DEGREE_LON_EQUATOR * lat.to_radians().cos();
        let delta_lat = radius_km / KM_PER_DEGREE_LAT;
        let delta_lon = radius_km / km_per_degree_lon;

        // Latitudes a hair away from the poles still blow up the division.
        if !delta_lon.is_finite() {
            return Err(DomainError::Latitude(lat));
        }

        Ok(Self {
            rect: Rect::new(
                coord! { x: lon - delta_lon, y: lat - delta_lat },
                coord! { x: lon + delta_lon, y: lat + delta_lat },
            ),
        })
    }

    pub fn min_lat(&self) -> f64 {
        self.rect.min().y
    }

    pub fn min_lon(&self) -> f64 {
        self.rect.min().x
    }

    pub fn max_lat(&self) -> f64 {
        self.rect.max().y
    }

    pub fn max_lon(&self) -> f64 {
        self.rect.max().x
    }

    pub fn rect(&self) -> Rect<f64> {
        self.rect
    }
}

// Overpass `bbox` order: south,west,north,east
impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_lat(),
            self.min_lon(),
            self.max_lat(),
            self.max_lon()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(40.017, -0.25, 7.0)]
    #[case(0.0, 0.0, 1.0)]
    #[case(-33.9, 151.2, 25.0)]
    #[case(89.5, 179.0, 0.5)]
    #[case(-89.9, -180.0, 3.0)]
    fn box_surrounds_center(#[case] lat: f64, #[case] lon: f64, #[case] km: f64) {
        let bbox = BoundingBox::around(Point::new(lon, lat), km).expect("valid input");

        assert!(bbox.min_lat() < lat && lat < bbox.max_lat());
        assert!(bbox.min_lon() < lon && lon < bbox.max_lon());
    }

    #[test]
    fn latitude_delta_uses_fixed_constant() {
        let bbox = BoundingBox::around(Point::new(-0.25, 40.017), 7.0).expect("valid input");
        let delta = 7.0 / KM_PER_DEGREE_LAT;

        assert!((bbox.max_lat() - (40.017 + delta)).abs() < 1e-12);
        assert!((bbox.min_lat() - (40.017 - delta)).abs() < 1e-12);
    }

    #[test]
    fn longitude_delta_widens_with_latitude() {
        let equator = BoundingBox::around(Point::new(0.0, 0.0), 10.0).expect("valid input");
        let north = BoundingBox::around(Point::new(0.0, 60.0), 10.0).expect("valid input");

        let equator_span = equator.max_lon() - equator.min_lon();
        let north_span = north.max_lon() - north.min_lon();
        // cos(60°) = 0.5
        assert!((north_span / equator_span - 2.0).abs() < 1e-9);
    }

    #[rstest]
    #[case(90.0)]
    #[case(-90.0)]
    #[case(91.0)]
    #[case(f64::NAN)]
    fn poles_and_out_of_range_latitudes_are_rejected(#[case] lat: f64) {
        let err = BoundingBox::around(Point::new(0.0, lat), 5.0).unwrap_err();
        assert!(matches!(err, DomainError::Latitude(_)));
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f64::INFINITY)]
    fn non_positive_radius_is_rejected(#[case] km: f64) {
        let err = BoundingBox::around(Point::new(0.0, 0.0), km).unwrap_err();
        assert!(matches!(err, DomainError::Radius(_)));
    }

    #[test]
    fn longitude_out_of_range_is_rejected() {
        let err = BoundingBox::around(Point::new(180.5, 0.0), 5.0).unwrap_err();
        assert_eq!(err, DomainError::Longitude(180.5));
    }

    #[test]
    fn display_uses_south_west_north_east_order() {
        let bbox = BoundingBox::around(Point::new(10.0, 20.0), 1.0).expect("valid input");
        let expected = format!(
            "{},{},{},{}",
            bbox.min_lat(),
            bbox.min_lon(),
            bbox.max_lat(),
            bbox.max_lon()
        );
        assert_eq!(bbox.to_string(), expected);
        assert!(bbox.min_lat() > 19.0 && bbox.min_lon() > 9.0);
    }
}
