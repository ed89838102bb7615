use crate::core::error::RouteError;

/// Rescales every dimension of the points to `[0, 1]` independently (min-max normalization).
///
/// A dimension on which all points agree carries no information and is set to `0.0` for every
/// point. Fails with [`RouteError::Empty`] if there are no points.
pub fn min_max_normalize<const N: usize>(points: &mut [[f64; N]]) -> Result<(), RouteError> {
    let first = *points.first().ok_or(RouteError::Empty)?;

    let (min, max) = points
        .iter()
        .fold((first, first), |(mut min, mut max), point| {
            for d in 0..N {
                min[d] = min[d].min(point[d]);
                max[d] = max[d].max(point[d]);
            }

            (min, max)
        });

    for point in points.iter_mut() {
        for d in 0..N {
            let range = max[d] - min[d];
            point[d] = if range > 0.0 {
                (point[d] - min[d]) / range
            } else {
                0.0
            };
        }
    }

    Ok(())
}
