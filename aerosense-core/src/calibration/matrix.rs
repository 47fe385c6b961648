//! Fixed-size matrix types for calibration
//!
//! Dense, row-major, `f32`, no heap. Only the operations the calibration
//! pipeline needs: matrix-vector product, matrix product, and conversion
//! to and from the flattened arrays kept in configuration.

/// Vector type
pub type Vector<const N: usize> = [f32; N];

/// 3-component vector (x, y, z)
pub type Vector3 = Vector<3>;

/// Homogeneous 4-component vector (x, y, z, 1)
pub type Vector4 = Vector<4>;

/// Row-major matrix with `R` rows and `C` columns
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix<const R: usize, const C: usize> {
    rows: [[f32; C]; R],
}

/// 3×3 rotation
pub type Matrix3 = Matrix<3, 3>;

/// 4×4 homogeneous affine transform
pub type Matrix4 = Matrix<4, 4>;

impl<const N: usize> Matrix<N, N> {
    /// Identity matrix
    pub fn identity() -> Self {
        let mut rows = [[0.0; N]; N];
        for (i, row) in rows.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        Self { rows }
    }
}

impl<const N: usize> Default for Matrix<N, N> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<const R: usize, const C: usize> Matrix<R, C> {
    /// Number of elements when flattened
    pub const LEN: usize = R * C;

    /// Build from rows
    pub fn from_rows(rows: [[f32; C]; R]) -> Self {
        Self { rows }
    }

    /// Build from a flattened row-major slice; `None` unless `values.len() == R*C`
    pub fn from_row_major(values: &[f32]) -> Option<Self> {
        if values.len() != Self::LEN {
            return None;
        }
        let mut rows = [[0.0; C]; R];
        for (i, row) in rows.iter_mut().enumerate() {
            row.copy_from_slice(&values[i * C..(i + 1) * C]);
        }
        Some(Self { rows })
    }

    /// Elements in flattened row-major order (index `i*C + j`)
    pub fn iter_row_major(&self) -> impl Iterator<Item = f32> + '_ {
        self.rows.iter().flat_map(|row| row.iter().copied())
    }

    /// Element at row `i`, column `j`
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.rows[i][j]
    }

    /// Rows of the matrix
    pub fn rows(&self) -> &[[f32; C]; R] {
        &self.rows
    }

    /// Matrix-vector product: y = A × x
    pub fn mul_vec(&self, x: &Vector<C>) -> Vector<R> {
        let mut y = [0.0; R];
        for (yi, row) in y.iter_mut().zip(self.rows.iter()) {
            for (a, b) in row.iter().zip(x.iter()) {
                *yi += a * b;
            }
        }
        y
    }
}

/// Extend a 3-vector with homogeneous coordinate 1
pub fn homogeneous(v: &Vector3) -> Vector4 {
    [v[0], v[1], v[2], 1.0]
}

/// Drop the homogeneous coordinate
pub fn truncate(v: &Vector4) -> Vector3 {
    [v[0], v[1], v[2]]
}

/// Componentwise a - b
pub fn sub(a: &Vector3, b: &Vector3) -> Vector3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Componentwise blend: wa·a + wb·b
pub fn blend(wa: f32, a: &Vector3, wb: f32, b: &Vector3) -> Vector3 {
    [
        wa * a[0] + wb * b[0],
        wa * a[1] + wb * b[1],
        wa * a[2] + wb * b[2],
    ]
}

/// Largest absolute component: max |v_i|
///
/// NaN if any component is NaN.
pub fn max_abs(v: &Vector3) -> f32 {
    v.iter().fold(0.0f32, |acc, x| {
        let a = libm::fabsf(*x);
        if a.is_nan() || a > acc {
            a
        } else {
            acc
        }
    })
}

/// Euclidean length
pub fn norm(v: &Vector3) -> f32 {
    libm::sqrtf(v[0] * v[0] + v[1] * v[1] + v[2] * v[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_neutral() {
        let v = [1.5, -2.0, 3.25];
        assert_eq!(Matrix3::identity().mul_vec(&v), v);
        assert_eq!(Matrix4::identity().mul_vec(&homogeneous(&v)), [1.5, -2.0, 3.25, 1.0]);
    }

    #[test]
    fn row_major_layout() {
        let m = Matrix3::from_row_major(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]).unwrap();
        assert_eq!(m.get(0, 2), 3.0);
        assert_eq!(m.get(2, 0), 7.0);
        assert_eq!(m.mul_vec(&[1.0, 0.0, 0.0]), [1.0, 4.0, 7.0]);

        let flat: heapless::Vec<f32, 9> = m.iter_row_major().collect();
        assert_eq!(flat.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn wrong_length_rejected() {
        assert!(Matrix3::from_row_major(&[0.0; 10]).is_none());
        assert!(Matrix4::from_row_major(&[0.0; 9]).is_none());
    }

    #[test]
    fn vector_helpers() {
        assert_eq!(max_abs(&[0.1, -0.7, 0.3]), 0.7);
        assert!(max_abs(&[0.1, f32::NAN, 0.3]).is_nan());
        assert_eq!(sub(&[1.0, 2.0, 3.0], &[0.5, 0.5, 0.5]), [0.5, 1.5, 2.5]);
        assert_eq!(norm(&[3.0, 4.0, 0.0]), 5.0);
    }
}
