use crate::arith::GroupArith;
use crate::errors::GroupArithError;
use crate::params::Scalar;

/// Computes the Lagrange coefficient `λ_i = ∏_{j≠i} (eval_at - x_j) * (x_i - x_j)^-1`
/// for the `i`-th abscissa in `xs`, evaluated at `eval_at`.
///
/// Mirrors the shape of a polynomial-share reconstruction coefficient: `xs`
/// are the public abscissas of all participants, `i` is the index of the
/// coefficient being computed, and `eval_at` is the point the interpolated
/// polynomial is evaluated at (0 by default).
///
/// Fails with `NotInvertible` if `xs` contains a duplicate abscissa (the
/// denominator `x_i - x_j` vanishes for some `j`), which can only happen
/// when the caller supplied invalid (non-distinct) `PrivatePoint.x` values.
pub fn lagrange_coefficient(
    arith: &GroupArith,
    xs: &[Scalar],
    i: usize,
    eval_at: &Scalar,
) -> Result<Scalar, GroupArithError> {
    let x_i = &xs[i];

    let mut numerator = Scalar::from(1u64);
    let mut denominator = Scalar::from(1u64);
    for (j, x_j) in xs.iter().enumerate() {
        if j == i {
            continue;
        }
        numerator = arith.mul_scalar(&numerator, &arith.sub_scalar(eval_at, x_j));
        denominator = arith.mul_scalar(&denominator, &arith.sub_scalar(x_i, x_j));
    }

    let denominator_inv = arith.inv_scalar(&denominator)?;
    Ok(arith.mul_scalar(&numerator, &denominator_inv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::GroupParams;
    use rug::Integer;

    fn toy_arith() -> GroupArith {
        GroupArith::new(
            GroupParams::new(Integer::from(23), Integer::from(11), Integer::from(2)).unwrap(),
        )
    }

    /// Scenario 1 from the protocol's test vectors: N=3, p=23, q=11, g=2,
    /// inputs (1,4),(2,5),(3,6), eval_at=0 -> f(0) = 3.
    #[test]
    fn reconstructs_toy_vector() {
        let arith = toy_arith();
        let xs = [Scalar::from(1u64), Scalar::from(2u64), Scalar::from(3u64)];
        let ys = [Scalar::from(4u64), Scalar::from(5u64), Scalar::from(6u64)];
        let eval_at = Scalar::zero();

        let mut f = Scalar::zero();
        for i in 0..xs.len() {
            let lambda = lagrange_coefficient(&arith, &xs, i, &eval_at).unwrap();
            f = arith.add_scalar(&f, &arith.mul_scalar(&lambda, &ys[i]));
        }
        assert_eq!(f, Scalar::from(3u64));
    }

    #[test]
    fn duplicate_abscissa_is_not_invertible() {
        let arith = toy_arith();
        let xs = [Scalar::from(1u64), Scalar::from(1u64), Scalar::from(2u64)];
        assert!(lagrange_coefficient(&arith, &xs, 0, &Scalar::zero()).is_err());
    }

    #[test]
    fn reconstructs_at_nonzero_point() {
        let arith = toy_arith();
        // f(x) = 2 + 3x (mod 11); sample at x=1,2,3 -> y = 5,8,0(=11 mod 11)
        let f = |x: u64| (2 + 3 * x) % 11;
        let xs = [Scalar::from(1u64), Scalar::from(2u64), Scalar::from(3u64)];
        let ys = [Scalar::from(f(1)), Scalar::from(f(2)), Scalar::from(f(3))];
        let eval_at = Scalar::from(5u64);

        let mut result = Scalar::zero();
        for i in 0..xs.len() {
            let lambda = lagrange_coefficient(&arith, &xs, i, &eval_at).unwrap();
            result = arith.add_scalar(&result, &arith.mul_scalar(&lambda, &ys[i]));
        }
        assert_eq!(result, Scalar::from(f(5)));
    }

    /// Property from the protocol's testable invariants: for a random
    /// degree-`(n-1)` polynomial sampled at `n` distinct abscissas, the
    /// Lagrange-weighted sum of the samples reconstructs the polynomial's
    /// value at `eval_at` exactly, for any `n`.
    #[test_case::case(2; "n2")]
    #[test_case::case(3; "n3")]
    #[test_case::case(5; "n5")]
    #[test_case::case(7; "n7")]
    fn random_polynomial_reconstructs_via_lagrange(n: u64) {
        use rand::Rng;
        use rand_dev::DevRng;

        let arith = toy_arith();
        let q = 11u64;
        let mut rng = DevRng::new();

        let coefficients: Vec<u64> = (0..n).map(|_| rng.gen_range(0..q)).collect();
        let xs: Vec<Scalar> = (1..=n).map(Scalar::from).collect();
        let eval_at = Scalar::from(rng.gen_range(0..q));

        let evaluate = |x: &Scalar| -> Scalar {
            let mut acc = Scalar::zero();
            let mut power = Scalar::from(1u64);
            for &c in &coefficients {
                let term = arith.mul_scalar(&Scalar::from(c), &power);
                acc = arith.add_scalar(&acc, &term);
                power = arith.mul_scalar(&power, x);
            }
            acc
        };
        let ys: Vec<Scalar> = xs.iter().map(evaluate).collect();

        let mut reconstructed = Scalar::zero();
        for i in 0..xs.len() {
            let lambda = lagrange_coefficient(&arith, &xs, i, &eval_at).unwrap();
            reconstructed = arith.add_scalar(&reconstructed, &arith.mul_scalar(&lambda, &ys[i]));
        }

        assert_eq!(reconstructed, evaluate(&eval_at));
    }
}
