//! Tensor dimensions.

use smallvec::SmallVec;

/// Inline capacity covers every rank the shipped operators accept.
pub type Dims = SmallVec<[i64; 6]>;

/// Ordered, non-negative dimension sizes of a tensor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DDim(Dims);

impl DDim {
    pub fn new(dims: impl IntoIterator<Item = i64>) -> Self {
        Self(dims.into_iter().collect())
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Number of elements; 1 for a rank-0 shape.
    pub fn product(&self) -> i64 {
        self.0.iter().product()
    }

    /// Like [`DDim::product`] but `None` when the element count overflows `i64`.
    /// Any zero dimension makes the product zero regardless of the others.
    pub fn checked_product(&self) -> Option<i64> {
        if self.0.contains(&0) {
            return Some(0);
        }
        self.0.iter().try_fold(1i64, |acc, &dim| acc.checked_mul(dim))
    }

    pub fn numel(&self) -> usize {
        self.product().max(0) as usize
    }

    pub fn dims(&self) -> &[i64] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<i64> {
        self.0.to_vec()
    }

    /// Row-major strides in elements.
    pub fn strides(&self) -> Dims {
        let mut strides: Dims = SmallVec::from_elem(1, self.rank());
        for i in (0..self.rank().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * self.0[i + 1];
        }
        strides
    }
}

impl std::ops::Index<usize> for DDim {
    type Output = i64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl From<&[i64]> for DDim {
    fn from(dims: &[i64]) -> Self {
        Self(SmallVec::from_slice(dims))
    }
}

impl From<Vec<i64>> for DDim {
    fn from(dims: Vec<i64>) -> Self {
        Self(SmallVec::from_vec(dims))
    }
}

impl<const N: usize> From<[i64; N]> for DDim {
    fn from(dims: [i64; N]) -> Self {
        Self(dims.into_iter().collect())
    }
}

impl std::fmt::Display for DDim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, dim) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{dim}")?;
        }
        write!(f, "]")
    }
}

/// Level-of-detail offsets describing variable-length sequences packed in the
/// leading dimension.
pub type LoD = Vec<Vec<usize>>;
