use super::SparseBlock;
use crate::StrError;
use russell_lab::Vector;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Holds a vector value together with its Jacobian blocks (automatic differentiation)
///
/// The Jacobian is split into blocks, one per group of primary variables (e.g., pressure,
/// water saturation, the mixed variable, solvent saturation, well rates, bottom-hole pressures).
/// Block `k` has `size()` rows and as many columns as the `k`-th variable group.
///
/// A constant carries no blocks at all. Combining a constant with a non-constant value treats
/// the missing blocks as zero blocks with the shapes of the other operand.
#[derive(Clone, Debug)]
pub struct Adb {
    val: Vector,
    jac: Vec<SparseBlock>,
}

impl Adb {
    /// Allocates a constant (no derivatives)
    pub fn constant(val: Vector) -> Self {
        Adb { val, jac: Vec::new() }
    }

    /// Allocates a constant filled with the same value
    pub fn constant_filled(n: usize, value: f64) -> Self {
        Adb::constant(Vector::filled(n, value))
    }

    /// Allocates a value with given Jacobian blocks
    ///
    /// Returns an error if some block has a number of rows different than the value size.
    pub fn function(val: Vector, jac: Vec<SparseBlock>) -> Result<Self, StrError> {
        if jac.iter().any(|b| b.dims().0 != val.dim()) {
            return Err("all Jacobian blocks must have as many rows as the value");
        }
        Ok(Adb { val, jac })
    }

    /// Allocates a set of independent variables
    ///
    /// The `k`-th result has an identity block at position `k` and zero blocks elsewhere.
    pub fn variables(initial: &[Vector]) -> Vec<Adb> {
        let sizes: Vec<usize> = initial.iter().map(|v| v.dim()).collect();
        initial
            .iter()
            .enumerate()
            .map(|(k, v)| {
                let jac = sizes
                    .iter()
                    .enumerate()
                    .map(|(m, &nm)| {
                        if m == k {
                            SparseBlock::identity(nm)
                        } else {
                            SparseBlock::zeros(v.dim(), nm)
                        }
                    })
                    .collect();
                Adb { val: v.clone(), jac }
            })
            .collect()
    }

    /// Returns the number of entries
    pub fn size(&self) -> usize {
        self.val.dim()
    }

    /// Returns the number of Jacobian blocks (zero for constants)
    pub fn num_blocks(&self) -> usize {
        self.jac.len()
    }

    /// Returns the number of columns of each Jacobian block
    pub fn block_pattern(&self) -> Vec<usize> {
        self.jac.iter().map(|b| b.dims().1).collect()
    }

    /// Returns true if this value carries no derivatives
    pub fn is_constant(&self) -> bool {
        self.jac.is_empty()
    }

    /// Returns the value
    pub fn value(&self) -> &Vector {
        &self.val
    }

    /// Returns the Jacobian blocks
    pub fn derivative(&self) -> &[SparseBlock] {
        &self.jac
    }

    /// Returns a copy without derivatives
    pub fn to_constant(&self) -> Adb {
        Adb::constant(self.val.clone())
    }

    /// Returns the value at entry i
    pub fn at(&self, i: usize) -> f64 {
        self.val[i]
    }

    /// Computes f(self) given a function returning (f(x), df/dx)
    pub fn apply<F>(&self, mut f: F) -> Adb
    where
        F: FnMut(f64) -> (f64, f64),
    {
        let n = self.size();
        let mut val = Vector::new(n);
        let mut der = vec![0.0; n];
        for i in 0..n {
            let (fi, dfi) = f(self.val[i]);
            val[i] = fi;
            der[i] = dfi;
        }
        let jac = self.jac.iter().map(|b| b.scale_rows(&der)).collect();
        Adb { val, jac }
    }

    /// Computes self^p with a constant exponent
    pub fn powf(&self, p: f64) -> Adb {
        self.apply(|x| (f64::powf(x, p), p * f64::powf(x, p - 1.0)))
    }

    /// Computes max(self, floor) entry-wise (the derivative vanishes where the floor is active)
    pub fn max_scalar(&self, floor: f64) -> Adb {
        self.apply(|x| if x >= floor { (x, 1.0) } else { (floor, 0.0) })
    }

    /// Computes (self + other) with scaled rows: diag(alpha)·self + diag(beta)·other
    fn lin_comb(alpha: &[f64], a: &Adb, beta: &[f64], b: &Adb, val: Vector) -> Adb {
        let jac = match (a.is_constant(), b.is_constant()) {
            (true, true) => Vec::new(),
            (false, true) => a.jac.iter().map(|ja| ja.scale_rows(alpha)).collect(),
            (true, false) => b.jac.iter().map(|jb| jb.scale_rows(beta)).collect(),
            (false, false) => {
                assert_eq!(a.num_blocks(), b.num_blocks(), "number of Jacobian blocks must match");
                a.jac
                    .iter()
                    .zip(b.jac.iter())
                    .map(|(ja, jb)| SparseBlock::lin_comb_rows(alpha, ja, beta, jb))
                    .collect()
            }
        };
        Adb { val, jac }
    }

    /// Returns the entries listed in `indices`
    pub fn subset(&self, indices: &[usize]) -> Adb {
        let val = Vector::from(&indices.iter().map(|i| self.val[*i]).collect::<Vec<_>>());
        let jac = self.jac.iter().map(|b| b.subset_rows(indices)).collect();
        Adb { val, jac }
    }

    /// Scatters the entries into a vector of size `n` (entry k goes to position `indices[k]`)
    pub fn superset(&self, indices: &[usize], n: usize) -> Result<Adb, StrError> {
        if indices.len() != self.size() {
            return Err("the number of indices must equal the size of the value");
        }
        let mut val = Vector::new(n);
        for (k, i) in indices.iter().enumerate() {
            if *i >= n {
                return Err("superset index is out of bounds");
            }
            val[*i] += self.val[k];
        }
        let mut jac = Vec::with_capacity(self.num_blocks());
        for b in &self.jac {
            jac.push(b.superset_rows(indices, n)?);
        }
        Ok(Adb { val, jac })
    }

    /// Concatenates values vertically
    pub fn vertcat(parts: &[&Adb]) -> Adb {
        let mut data = Vec::new();
        for p in parts {
            data.extend_from_slice(p.val.as_data());
        }
        let val = Vector::from(&data);
        let pattern = parts.iter().find(|p| !p.is_constant()).map(|p| p.block_pattern());
        let jac = match pattern {
            None => Vec::new(),
            Some(cols) => (0..cols.len())
                .map(|k| {
                    let zeros: Vec<SparseBlock> = parts
                        .iter()
                        .map(|p| {
                            if p.is_constant() {
                                SparseBlock::zeros(p.size(), cols[k])
                            } else {
                                p.jac[k].clone()
                            }
                        })
                        .collect();
                    let refs: Vec<&SparseBlock> = zeros.iter().collect();
                    SparseBlock::vstack(&refs)
                })
                .collect(),
        };
        Adb { val, jac }
    }

    /// Picks row i from `a` where `left[i]` is true, otherwise from `b`
    ///
    /// Rows that are not picked are never read.
    pub fn select_rows(left: &[bool], a: &Adb, b: &Adb) -> Adb {
        assert_eq!(a.size(), b.size(), "sizes of the operands must match");
        assert_eq!(left.len(), a.size());
        let data: Vec<f64> = (0..a.size())
            .map(|i| if left[i] { a.val[i] } else { b.val[i] })
            .collect();
        let val = Vector::from(&data);
        let jac = match (a.is_constant(), b.is_constant()) {
            (true, true) => Vec::new(),
            _ => {
                let cols = if a.is_constant() { b.block_pattern() } else { a.block_pattern() };
                cols.iter()
                    .enumerate()
                    .map(|(k, &nk)| {
                        let za;
                        let zb;
                        let ja = if a.is_constant() {
                            za = SparseBlock::zeros(a.size(), nk);
                            &za
                        } else {
                            &a.jac[k]
                        };
                        let jb = if b.is_constant() {
                            zb = SparseBlock::zeros(b.size(), nk);
                            &zb
                        } else {
                            &b.jac[k]
                        };
                        SparseBlock::select_rows(left, ja, jb)
                    })
                    .collect()
            }
        };
        Adb { val, jac }
    }

    /// Computes the sum of all entries (as a single-entry value)
    pub fn sum(&self) -> Result<Adb, StrError> {
        let triplets: Vec<(usize, usize, f64)> = (0..self.size()).map(|j| (0, j, 1.0)).collect();
        let ones = SparseBlock::from_triplets(1, self.size(), &triplets)?;
        Ok(&ones * self)
    }
}

/// Returns the entry-wise value of a binary operation
fn zip_vals<F>(a: &Vector, b: &Vector, f: F) -> Vector
where
    F: Fn(f64, f64) -> f64,
{
    assert_eq!(a.dim(), b.dim(), "sizes of the operands must match");
    let data: Vec<f64> = a.as_data().iter().zip(b.as_data().iter()).map(|(x, y)| f(*x, *y)).collect();
    Vector::from(&data)
}

impl<'a, 'b> Add<&'b Adb> for &'a Adb {
    type Output = Adb;
    fn add(self, rhs: &'b Adb) -> Adb {
        let val = zip_vals(&self.val, &rhs.val, |x, y| x + y);
        let ones = vec![1.0; self.size()];
        Adb::lin_comb(&ones, self, &ones, rhs, val)
    }
}

impl<'a, 'b> Sub<&'b Adb> for &'a Adb {
    type Output = Adb;
    fn sub(self, rhs: &'b Adb) -> Adb {
        let val = zip_vals(&self.val, &rhs.val, |x, y| x - y);
        let ones = vec![1.0; self.size()];
        let minus = vec![-1.0; self.size()];
        Adb::lin_comb(&ones, self, &minus, rhs, val)
    }
}

impl<'a, 'b> Mul<&'b Adb> for &'a Adb {
    type Output = Adb;
    fn mul(self, rhs: &'b Adb) -> Adb {
        let val = zip_vals(&self.val, &rhs.val, |x, y| x * y);
        // d(ab) = b da + a db
        Adb::lin_comb(rhs.val.as_data(), self, self.val.as_data(), rhs, val)
    }
}

impl<'a, 'b> Div<&'b Adb> for &'a Adb {
    type Output = Adb;
    fn div(self, rhs: &'b Adb) -> Adb {
        let val = zip_vals(&self.val, &rhs.val, |x, y| x / y);
        // d(a/b) = da/b − a db/b²
        let alpha: Vec<f64> = rhs.val.as_data().iter().map(|b| 1.0 / b).collect();
        let beta: Vec<f64> = self
            .val
            .as_data()
            .iter()
            .zip(rhs.val.as_data().iter())
            .map(|(a, b)| -a / (b * b))
            .collect();
        Adb::lin_comb(&alpha, self, &beta, rhs, val)
    }
}

impl<'a> Neg for &'a Adb {
    type Output = Adb;
    fn neg(self) -> Adb {
        self * -1.0
    }
}

impl Neg for Adb {
    type Output = Adb;
    fn neg(self) -> Adb {
        &self * -1.0
    }
}

impl<'a> Add<f64> for &'a Adb {
    type Output = Adb;
    fn add(self, rhs: f64) -> Adb {
        let data: Vec<f64> = self.val.as_data().iter().map(|x| x + rhs).collect();
        Adb {
            val: Vector::from(&data),
            jac: self.jac.clone(),
        }
    }
}

impl<'a> Sub<f64> for &'a Adb {
    type Output = Adb;
    fn sub(self, rhs: f64) -> Adb {
        self + (-rhs)
    }
}

impl<'a> Mul<f64> for &'a Adb {
    type Output = Adb;
    fn mul(self, rhs: f64) -> Adb {
        let data: Vec<f64> = self.val.as_data().iter().map(|x| x * rhs).collect();
        Adb {
            val: Vector::from(&data),
            jac: self.jac.iter().map(|b| b.scale(rhs)).collect(),
        }
    }
}

impl<'a> Div<f64> for &'a Adb {
    type Output = Adb;
    fn div(self, rhs: f64) -> Adb {
        self * (1.0 / rhs)
    }
}

impl<'a> Add<&'a Adb> for f64 {
    type Output = Adb;
    fn add(self, rhs: &'a Adb) -> Adb {
        rhs + self
    }
}

impl<'a> Sub<&'a Adb> for f64 {
    type Output = Adb;
    fn sub(self, rhs: &'a Adb) -> Adb {
        &(rhs * -1.0) + self
    }
}

impl<'a> Mul<&'a Adb> for f64 {
    type Output = Adb;
    fn mul(self, rhs: &'a Adb) -> Adb {
        rhs * self
    }
}

impl<'a> Div<&'a Adb> for f64 {
    type Output = Adb;
    fn div(self, rhs: &'a Adb) -> Adb {
        rhs.apply(|x| (self / x, -self / (x * x)))
    }
}

impl<'a, 'b> Mul<&'b Vector> for &'a Adb {
    type Output = Adb;
    fn mul(self, rhs: &'b Vector) -> Adb {
        let val = zip_vals(&self.val, rhs, |x, y| x * y);
        Adb {
            val,
            jac: self.jac.iter().map(|b| b.scale_rows(rhs.as_data())).collect(),
        }
    }
}

impl<'a, 'b> Mul<&'b Adb> for &'a Vector {
    type Output = Adb;
    fn mul(self, rhs: &'b Adb) -> Adb {
        rhs * self
    }
}

impl<'a, 'b> Add<&'b Vector> for &'a Adb {
    type Output = Adb;
    fn add(self, rhs: &'b Vector) -> Adb {
        Adb {
            val: zip_vals(&self.val, rhs, |x, y| x + y),
            jac: self.jac.clone(),
        }
    }
}

impl<'a, 'b> Sub<&'b Vector> for &'a Adb {
    type Output = Adb;
    fn sub(self, rhs: &'b Vector) -> Adb {
        Adb {
            val: zip_vals(&self.val, rhs, |x, y| x - y),
            jac: self.jac.clone(),
        }
    }
}

impl<'a, 'b> Mul<&'b Adb> for &'a SparseBlock {
    type Output = Adb;
    fn mul(self, rhs: &'b Adb) -> Adb {
        let val = Vector::from(&self.mul_vec(rhs.val.as_data()));
        Adb {
            val,
            jac: rhs.jac.iter().map(|b| self.product(b)).collect(),
        }
    }
}

/// Implements the owned variants of a binary operator in terms of the borrowed one
macro_rules! forward_binop {
    ($imp:ident, $method:ident) => {
        impl $imp<Adb> for Adb {
            type Output = Adb;
            fn $method(self, rhs: Adb) -> Adb {
                (&self).$method(&rhs)
            }
        }
        impl<'a> $imp<&'a Adb> for Adb {
            type Output = Adb;
            fn $method(self, rhs: &'a Adb) -> Adb {
                (&self).$method(rhs)
            }
        }
        impl<'a> $imp<Adb> for &'a Adb {
            type Output = Adb;
            fn $method(self, rhs: Adb) -> Adb {
                self.$method(&rhs)
            }
        }
        impl $imp<f64> for Adb {
            type Output = Adb;
            fn $method(self, rhs: f64) -> Adb {
                (&self).$method(rhs)
            }
        }
        impl $imp<Adb> for f64 {
            type Output = Adb;
            fn $method(self, rhs: Adb) -> Adb {
                self.$method(&rhs)
            }
        }
    };
}

forward_binop!(Add, add);
forward_binop!(Sub, sub);
forward_binop!(Mul, mul);
forward_binop!(Div, div);

impl<'a> Mul<&'a Vector> for Adb {
    type Output = Adb;
    fn mul(self, rhs: &'a Vector) -> Adb {
        (&self).mul(rhs)
    }
}

impl<'a> Mul<Adb> for &'a SparseBlock {
    type Output = Adb;
    fn mul(self, rhs: Adb) -> Adb {
        self * &rhs
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
