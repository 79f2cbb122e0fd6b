use crate::StrError;
use russell_lab::Matrix;

/// Holds a sparse matrix in compressed-row (CSR) format
///
/// This is the Jacobian "block" of an automatic-differentiation value with respect to one
/// group of primary variables. It is also used to represent the discrete operators (gradient,
/// divergence, face average, upwind selection, well-to-perforation maps) that act on such values.
///
/// **Notes:**
///
/// 1. The column indices of each row are sorted and unique
/// 2. Explicit zeros may be stored; they are kept to preserve the sparsity pattern
/// 3. A block with no stored entries represents the zero matrix with the given dimensions
#[derive(Clone, Debug, PartialEq)]
pub struct SparseBlock {
    nrow: usize,
    ncol: usize,
    row_ptr: Vec<usize>, // (nrow + 1)
    col_idx: Vec<usize>, // (nnz)
    values: Vec<f64>,    // (nnz)
}

impl SparseBlock {
    /// Allocates a zero (empty) matrix
    pub fn zeros(nrow: usize, ncol: usize) -> Self {
        SparseBlock {
            nrow,
            ncol,
            row_ptr: vec![0; nrow + 1],
            col_idx: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Allocates the identity matrix
    pub fn identity(n: usize) -> Self {
        SparseBlock {
            nrow: n,
            ncol: n,
            row_ptr: (0..=n).collect(),
            col_idx: (0..n).collect(),
            values: vec![1.0; n],
        }
    }

    /// Allocates a square diagonal matrix
    pub fn diagonal(diag: &[f64]) -> Self {
        let n = diag.len();
        SparseBlock {
            nrow: n,
            ncol: n,
            row_ptr: (0..=n).collect(),
            col_idx: (0..n).collect(),
            values: diag.to_vec(),
        }
    }

    /// Allocates a matrix from (i, j, aij) triplets
    ///
    /// Duplicate entries are summed up.
    pub fn from_triplets(nrow: usize, ncol: usize, triplets: &[(usize, usize, f64)]) -> Result<Self, StrError> {
        let mut rows: Vec<Vec<(usize, f64)>> = vec![Vec::new(); nrow];
        for (i, j, aij) in triplets {
            if *i >= nrow || *j >= ncol {
                return Err("triplet index is out of bounds");
            }
            rows[*i].push((*j, *aij));
        }
        let mut row_ptr = Vec::with_capacity(nrow + 1);
        let mut col_idx = Vec::with_capacity(triplets.len());
        let mut values = Vec::with_capacity(triplets.len());
        row_ptr.push(0);
        for row in rows.iter_mut() {
            row.sort_by_key(|(j, _)| *j);
            let start = col_idx.len();
            for (j, aij) in row.iter() {
                let n = col_idx.len();
                if n > start && col_idx[n - 1] == *j {
                    values[n - 1] += aij;
                } else {
                    col_idx.push(*j);
                    values.push(*aij);
                }
            }
            row_ptr.push(col_idx.len());
        }
        Ok(SparseBlock {
            nrow,
            ncol,
            row_ptr,
            col_idx,
            values,
        })
    }

    /// Returns the dimensions (nrow, ncol)
    pub fn dims(&self) -> (usize, usize) {
        (self.nrow, self.ncol)
    }

    /// Returns the number of stored entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no entries are stored
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the (i, j) entry (zero if not stored)
    ///
    /// # Panics
    ///
    /// This function will panic if the indices are out of bounds
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.nrow && j < self.ncol);
        let start = self.row_ptr[i];
        let end = self.row_ptr[i + 1];
        match self.col_idx[start..end].binary_search(&j) {
            Ok(p) => self.values[start + p],
            Err(_) => 0.0,
        }
    }

    /// Returns an iterator over the (column, value) entries of a row
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let start = self.row_ptr[i];
        let end = self.row_ptr[i + 1];
        self.col_idx[start..end]
            .iter()
            .copied()
            .zip(self.values[start..end].iter().copied())
    }

    /// Calls `f(i, j, aij)` for all stored entries
    pub fn for_each_entry<F>(&self, mut f: F) -> Result<(), StrError>
    where
        F: FnMut(usize, usize, f64) -> Result<(), StrError>,
    {
        for i in 0..self.nrow {
            for p in self.row_ptr[i]..self.row_ptr[i + 1] {
                f(i, self.col_idx[p], self.values[p])?;
            }
        }
        Ok(())
    }

    /// Returns a copy with all entries multiplied by alpha
    pub fn scale(&self, alpha: f64) -> Self {
        let mut res = self.clone();
        res.values.iter_mut().for_each(|v| *v *= alpha);
        res
    }

    /// Returns diag(d) · self
    pub fn scale_rows(&self, d: &[f64]) -> Self {
        assert_eq!(d.len(), self.nrow);
        let mut res = self.clone();
        for i in 0..self.nrow {
            for p in self.row_ptr[i]..self.row_ptr[i + 1] {
                res.values[p] *= d[i];
            }
        }
        res
    }

    /// Returns diag(alpha) · a + diag(beta) · b
    ///
    /// # Panics
    ///
    /// This function will panic if the dimensions do not match
    pub fn lin_comb_rows(alpha: &[f64], a: &SparseBlock, beta: &[f64], b: &SparseBlock) -> Self {
        assert_eq!(a.dims(), b.dims());
        assert_eq!(alpha.len(), a.nrow);
        assert_eq!(beta.len(), b.nrow);
        let mut row_ptr = Vec::with_capacity(a.nrow + 1);
        let mut col_idx = Vec::with_capacity(a.nnz() + b.nnz());
        let mut values = Vec::with_capacity(a.nnz() + b.nnz());
        row_ptr.push(0);
        for i in 0..a.nrow {
            let (mut p, p_end) = (a.row_ptr[i], a.row_ptr[i + 1]);
            let (mut q, q_end) = (b.row_ptr[i], b.row_ptr[i + 1]);
            while p < p_end || q < q_end {
                let cp = if p < p_end { a.col_idx[p] } else { usize::MAX };
                let cq = if q < q_end { b.col_idx[q] } else { usize::MAX };
                if cp == cq {
                    col_idx.push(cp);
                    values.push(alpha[i] * a.values[p] + beta[i] * b.values[q]);
                    p += 1;
                    q += 1;
                } else if cp < cq {
                    col_idx.push(cp);
                    values.push(alpha[i] * a.values[p]);
                    p += 1;
                } else {
                    col_idx.push(cq);
                    values.push(beta[i] * b.values[q]);
                    q += 1;
                }
            }
            row_ptr.push(col_idx.len());
        }
        SparseBlock {
            nrow: a.nrow,
            ncol: a.ncol,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Returns self + other
    pub fn plus(&self, other: &SparseBlock) -> Self {
        let ones = vec![1.0; self.nrow];
        SparseBlock::lin_comb_rows(&ones, self, &ones, other)
    }

    /// Returns self − other
    pub fn minus(&self, other: &SparseBlock) -> Self {
        let ones = vec![1.0; self.nrow];
        let minus = vec![-1.0; self.nrow];
        SparseBlock::lin_comb_rows(&ones, self, &minus, other)
    }

    /// Returns the matrix-matrix product self · other
    ///
    /// # Panics
    ///
    /// This function will panic if the dimensions are incompatible
    pub fn product(&self, other: &SparseBlock) -> Self {
        assert_eq!(self.ncol, other.nrow);
        let mut acc = vec![0.0; other.ncol];
        let mut flag = vec![usize::MAX; other.ncol];
        let mut cols: Vec<usize> = Vec::new();
        let mut row_ptr = Vec::with_capacity(self.nrow + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);
        for i in 0..self.nrow {
            cols.clear();
            for p in self.row_ptr[i]..self.row_ptr[i + 1] {
                let k = self.col_idx[p];
                let a_ik = self.values[p];
                for q in other.row_ptr[k]..other.row_ptr[k + 1] {
                    let j = other.col_idx[q];
                    if flag[j] != i {
                        flag[j] = i;
                        acc[j] = 0.0;
                        cols.push(j);
                    }
                    acc[j] += a_ik * other.values[q];
                }
            }
            cols.sort_unstable();
            for j in &cols {
                col_idx.push(*j);
                values.push(acc[*j]);
            }
            row_ptr.push(col_idx.len());
        }
        SparseBlock {
            nrow: self.nrow,
            ncol: other.ncol,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Returns the matrix-vector product self · x
    pub fn mul_vec(&self, x: &[f64]) -> Vec<f64> {
        assert_eq!(self.ncol, x.len());
        (0..self.nrow).map(|i| self.row(i).map(|(j, aij)| aij * x[j]).sum()).collect()
    }

    /// Returns the transposed matrix
    pub fn transpose(&self) -> Self {
        let mut count = vec![0; self.ncol + 1];
        for j in &self.col_idx {
            count[*j + 1] += 1;
        }
        for j in 0..self.ncol {
            count[j + 1] += count[j];
        }
        let row_ptr = count.clone();
        let mut next = count;
        let mut col_idx = vec![0; self.nnz()];
        let mut values = vec![0.0; self.nnz()];
        for i in 0..self.nrow {
            for p in self.row_ptr[i]..self.row_ptr[i + 1] {
                let j = self.col_idx[p];
                let q = next[j];
                col_idx[q] = i;
                values[q] = self.values[p];
                next[j] += 1;
            }
        }
        SparseBlock {
            nrow: self.ncol,
            ncol: self.nrow,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Returns the rows listed in `rows` (in that order)
    pub fn subset_rows(&self, rows: &[usize]) -> Self {
        let mut row_ptr = Vec::with_capacity(rows.len() + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);
        for r in rows {
            let start = self.row_ptr[*r];
            let end = self.row_ptr[*r + 1];
            col_idx.extend_from_slice(&self.col_idx[start..end]);
            values.extend_from_slice(&self.values[start..end]);
            row_ptr.push(col_idx.len());
        }
        SparseBlock {
            nrow: rows.len(),
            ncol: self.ncol,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Scatters the rows of self into a matrix with `nrow` rows
    ///
    /// Row `k` of self goes to row `rows[k]` of the result; repeated targets are summed up.
    pub fn superset_rows(&self, rows: &[usize], nrow: usize) -> Result<Self, StrError> {
        if rows.len() != self.nrow {
            return Err("the number of target rows must equal the number of rows");
        }
        let mut triplets = Vec::with_capacity(self.nnz());
        for (k, r) in rows.iter().enumerate() {
            for (j, aij) in self.row(k) {
                triplets.push((*r, j, aij));
            }
        }
        SparseBlock::from_triplets(nrow, self.ncol, &triplets)
    }

    /// Stacks matrices vertically
    ///
    /// # Panics
    ///
    /// This function will panic if the number of columns differ
    pub fn vstack(blocks: &[&SparseBlock]) -> Self {
        let ncol = blocks.first().map(|b| b.ncol).unwrap_or(0);
        let nrow = blocks.iter().map(|b| b.nrow).sum();
        let mut row_ptr = Vec::with_capacity(nrow + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);
        for b in blocks {
            assert_eq!(b.ncol, ncol);
            for i in 0..b.nrow {
                let start = b.row_ptr[i];
                let end = b.row_ptr[i + 1];
                col_idx.extend_from_slice(&b.col_idx[start..end]);
                values.extend_from_slice(&b.values[start..end]);
                row_ptr.push(col_idx.len());
            }
        }
        SparseBlock {
            nrow,
            ncol,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Selects rows: row i comes from `a` if `left[i]` is true, otherwise from `b`
    ///
    /// The rows of the operand that is not selected are never read; thus, rows holding
    /// non-finite values (e.g., from 0/0) are discarded safely.
    pub fn select_rows(left: &[bool], a: &SparseBlock, b: &SparseBlock) -> Self {
        assert_eq!(a.dims(), b.dims());
        assert_eq!(left.len(), a.nrow);
        let mut row_ptr = Vec::with_capacity(a.nrow + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);
        for i in 0..a.nrow {
            let src = if left[i] { a } else { b };
            let start = src.row_ptr[i];
            let end = src.row_ptr[i + 1];
            col_idx.extend_from_slice(&src.col_idx[start..end]);
            values.extend_from_slice(&src.values[start..end]);
            row_ptr.push(col_idx.len());
        }
        SparseBlock {
            nrow: a.nrow,
            ncol: a.ncol,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Returns a dense copy (useful for debugging and testing)
    pub fn as_dense(&self) -> Matrix {
        let mut dense = Matrix::new(self.nrow, self.ncol);
        for i in 0..self.nrow {
            for (j, aij) in self.row(i) {
                dense.set(i, j, aij);
            }
        }
        dense
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::SparseBlock;
    use russell_lab::approx_eq;

    #[test]
    fn from_triplets_handles_errors() {
        assert_eq!(
            SparseBlock::from_triplets(2, 2, &[(2, 0, 1.0)]).err(),
            Some("triplet index is out of bounds")
        );
    }

    #[test]
    fn from_triplets_sums_duplicates() {
        let a = SparseBlock::from_triplets(2, 3, &[(1, 2, 1.0), (0, 1, 2.0), (1, 2, 3.0), (1, 0, -1.0)]).unwrap();
        assert_eq!(a.dims(), (2, 3));
        assert_eq!(a.nnz(), 3);
        assert_eq!(a.get(0, 1), 2.0);
        assert_eq!(a.get(1, 2), 4.0);
        assert_eq!(a.get(1, 0), -1.0);
        assert_eq!(a.get(0, 0), 0.0);
    }

    #[test]
    fn mul_and_transpose_work() {
        // ┌     ┐   ┌       ┐
        // │ 1 2 │   │ 1 0 1 │
        // │ 0 3 │ · │ 0 2 0 │
        // └     ┘   └       ┘
        let a = SparseBlock::from_triplets(2, 2, &[(0, 0, 1.0), (0, 1, 2.0), (1, 1, 3.0)]).unwrap();
        let b = SparseBlock::from_triplets(2, 3, &[(0, 0, 1.0), (0, 2, 1.0), (1, 1, 2.0)]).unwrap();
        let c = a.product(&b);
        assert_eq!(c.dims(), (2, 3));
        assert_eq!(c.get(0, 0), 1.0);
        assert_eq!(c.get(0, 1), 4.0);
        assert_eq!(c.get(0, 2), 1.0);
        assert_eq!(c.get(1, 1), 6.0);
        assert_eq!(c.get(1, 0), 0.0);
        let ct = c.transpose();
        assert_eq!(ct.dims(), (3, 2));
        assert_eq!(ct.get(1, 0), 4.0);
        assert_eq!(ct.get(1, 1), 6.0);
        assert_eq!(a.mul_vec(&[1.0, 1.0]), &[3.0, 3.0]);
    }

    #[test]
    fn lin_comb_rows_works() {
        let a = SparseBlock::from_triplets(2, 2, &[(0, 0, 1.0), (1, 1, 1.0)]).unwrap();
        let b = SparseBlock::from_triplets(2, 2, &[(0, 1, 5.0), (1, 1, 2.0)]).unwrap();
        let c = SparseBlock::lin_comb_rows(&[2.0, 3.0], &a, &[1.0, -1.0], &b);
        assert_eq!(c.get(0, 0), 2.0);
        assert_eq!(c.get(0, 1), 5.0);
        assert_eq!(c.get(1, 0), 0.0);
        assert_eq!(c.get(1, 1), 1.0);
        let d = a.minus(&a);
        assert_eq!(d.nnz(), 2); // explicit zeros are kept
        approx_eq(d.get(1, 1), 0.0, 1e-15);
    }

    #[test]
    fn subset_superset_and_vstack_work() {
        let a = SparseBlock::diagonal(&[1.0, 2.0, 3.0]);
        let s = a.subset_rows(&[2, 0]);
        assert_eq!(s.dims(), (2, 3));
        assert_eq!(s.get(0, 2), 3.0);
        assert_eq!(s.get(1, 0), 1.0);
        let big = s.superset_rows(&[1, 1], 3).unwrap();
        assert_eq!(big.dims(), (3, 3));
        assert_eq!(big.get(1, 2), 3.0);
        assert_eq!(big.get(1, 0), 1.0);
        assert_eq!(big.get(0, 0), 0.0);
        assert_eq!(
            s.superset_rows(&[0], 3).err(),
            Some("the number of target rows must equal the number of rows")
        );
        let v = SparseBlock::vstack(&[&s, &SparseBlock::identity(3)]);
        assert_eq!(v.dims(), (5, 3));
        assert_eq!(v.get(4, 2), 1.0);
        assert_eq!(v.get(0, 2), 3.0);
    }

    #[test]
    fn select_rows_ignores_the_other_operand() {
        let a = SparseBlock::diagonal(&[1.0, f64::NAN]);
        let b = SparseBlock::diagonal(&[f64::NAN, 7.0]);
        let c = SparseBlock::select_rows(&[true, false], &a, &b);
        assert_eq!(c.get(0, 0), 1.0);
        assert_eq!(c.get(1, 1), 7.0);
        let dense = c.as_dense();
        assert_eq!(dense.get(1, 1), 7.0);
    }
}
