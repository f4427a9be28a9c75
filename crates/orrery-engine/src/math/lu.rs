//! LU decomposition shared by the fixed-size matrix types.

/// Decomposes `a` in place into `L·U` with implicit-scaling partial pivoting.
///
/// Row swaps are recorded in `index`. Returns `None` when a row is entirely
/// zero or a pivot vanishes, which means `a` is singular.
pub(crate) fn decompose<const N: usize>(a: &mut [[f64; N]; N], index: &mut [usize; N]) -> Option<()> {
    let mut scale = [0.0f64; N];
    for (i, row) in a.iter().enumerate() {
        let big = row.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        if big == 0.0 {
            return None;
        }
        scale[i] = 1.0 / big;
    }

    for j in 0..N {
        for i in 0..j {
            let mut sum = a[i][j];
            for k in 0..i {
                sum -= a[i][k] * a[k][j];
            }
            a[i][j] = sum;
        }

        let mut big = 0.0;
        let mut imax = j;
        for i in j..N {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= a[i][k] * a[k][j];
            }
            a[i][j] = sum;
            let merit = scale[i] * sum.abs();
            if merit >= big {
                big = merit;
                imax = i;
            }
        }

        if imax != j {
            a.swap(imax, j);
            scale[imax] = scale[j];
        }
        index[j] = imax;

        let pivot = a[j][j];
        if pivot == 0.0 || !pivot.is_finite() {
            return None;
        }
        for i in (j + 1)..N {
            a[i][j] /= pivot;
        }
    }

    Some(())
}

/// Solves `A·x = b` in place given the output of [`decompose`].
pub(crate) fn back_substitute<const N: usize>(a: &[[f64; N]; N], index: &[usize; N], b: &mut [f64; N]) {
    let mut first_nonzero: Option<usize> = None;
    for i in 0..N {
        let ip = index[i];
        let mut sum = b[ip];
        b[ip] = b[i];
        if let Some(start) = first_nonzero {
            for j in start..i {
                sum -= a[i][j] * b[j];
            }
        } else if sum != 0.0 {
            first_nonzero = Some(i);
        }
        b[i] = sum;
    }

    for i in (0..N).rev() {
        let mut sum = b[i];
        for j in (i + 1)..N {
            sum -= a[i][j] * b[j];
        }
        b[i] = sum / a[i][i];
    }
}

/// Inverts a square matrix, column by column.
pub(crate) fn invert<const N: usize>(m: &[[f64; N]; N]) -> Option<[[f64; N]; N]> {
    let mut lu = *m;
    let mut index = [0usize; N];
    decompose(&mut lu, &mut index)?;

    let mut out = [[0.0f64; N]; N];
    for col in 0..N {
        let mut e = [0.0f64; N];
        e[col] = 1.0;
        back_substitute(&lu, &index, &mut e);
        for (row, v) in e.iter().enumerate() {
            if !v.is_finite() {
                return None;
            }
            out[row][col] = *v;
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn solves_small_system() {
        let mut a = [[2.0, 1.0], [1.0, 3.0]];
        let mut index = [0usize; 2];
        assert!(decompose(&mut a, &mut index).is_some());
        let mut b = [3.0, 5.0];
        back_substitute(&a, &index, &mut b);
        assert!(approx(b[0], 0.8));
        assert!(approx(b[1], 1.4));
    }

    #[test]
    fn pivoting_handles_zero_leading_entry() {
        let m = [[0.0, 1.0], [1.0, 0.0]];
        let inv = invert(&m).unwrap();
        assert_eq!(inv, [[0.0, 1.0], [1.0, 0.0]]);
    }

    #[test]
    fn zero_row_is_singular() {
        let m = [[1.0, 2.0, 3.0], [0.0, 0.0, 0.0], [4.0, 5.0, 6.0]];
        assert!(invert(&m).is_none());
    }

    #[test]
    fn dependent_rows_are_singular() {
        let m = [[1.0, 2.0], [2.0, 4.0]];
        assert!(invert(&m).is_none());
    }
}
