use crate::errors::OmFilesError;
use crate::utils::divide_rounded_up;

/// The shape of an array variable: its overall dimensions and its chunk
/// shape, both rank-`n`. Generalizes the teacher's rank-2-only `Dimensions`
/// (`dim0`/`dim1`/`chunk0`/`chunk1`) to the arbitrary rank the container
/// format allows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimensions {
    pub dimensions: Vec<u64>,
    pub chunks: Vec<u64>,
}

impl Dimensions {
    pub fn new(dimensions: Vec<u64>, chunks: Vec<u64>) -> Result<Self, OmFilesError> {
        if dimensions.is_empty() || dimensions.len() != chunks.len() {
            return Err(OmFilesError::MismatchingCubeDimensionLength {
                got: chunks.len(),
                expected: dimensions.len(),
            });
        }
        for (&dim, &chunk) in dimensions.iter().zip(chunks.iter()) {
            if dim == 0 || chunk == 0 {
                return Err(OmFilesError::DimensionMustBeLargerThanZero);
            }
            if chunk > dim {
                return Err(OmFilesError::ChunkDimensionIsLargerThanDim {
                    chunk,
                    dimension: dim,
                });
            }
        }
        Ok(Self { dimensions, chunks })
    }

    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    /// Number of chunks along axis `i`: `ceil(dimensions[i] / chunks[i])`.
    pub fn chunks_in_axis(&self, i: usize) -> u64 {
        divide_rounded_up(self.dimensions[i], self.chunks[i])
    }

    pub fn chunks_per_axis(&self) -> Vec<u64> {
        (0..self.rank()).map(|i| self.chunks_in_axis(i)).collect()
    }

    /// `total_chunks = product(ceil(dimensions[i]/chunks[i]))`.
    pub fn total_chunks(&self) -> u64 {
        self.chunks_per_axis().into_iter().product()
    }

    pub fn total_elements(&self) -> u64 {
        self.dimensions.iter().product()
    }

    /// Number of elements in one fully-populated chunk (the scratch buffer
    /// sizing quantity; edge chunks hold fewer live elements but the scratch
    /// buffer is always sized for a full chunk).
    pub fn elements_per_chunk(&self) -> u64 {
        self.chunks.iter().product()
    }

    /// Validate that `offset[i] + count[i] <= dimensions[i]` for every axis.
    pub fn check_read_range(&self, offset: &[u64], count: &[u64]) -> Result<(), OmFilesError> {
        if offset.len() != self.rank() || count.len() != self.rank() {
            return Err(OmFilesError::MismatchingCubeDimensionLength {
                got: offset.len(),
                expected: self.rank(),
            });
        }
        for i in 0..self.rank() {
            let end = offset[i] + count[i];
            if end > self.dimensions[i] {
                return Err(OmFilesError::DimensionOutOfBounds {
                    range: offset[i]..end,
                    allowed: self.dimensions[i],
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_chunks_matches_product_of_ceil_divisions() {
        let d = Dimensions::new(vec![5, 5], vec![2, 2]).unwrap();
        assert_eq!(d.chunks_per_axis(), vec![3, 3]);
        assert_eq!(d.total_chunks(), 9);
    }

    #[test]
    fn rejects_chunk_larger_than_dimension() {
        assert!(Dimensions::new(vec![3], vec![5]).is_err());
    }

    #[test]
    fn rejects_zero_dimension() {
        assert!(Dimensions::new(vec![0], vec![1]).is_err());
    }

    #[test]
    fn check_read_range_rejects_overrun() {
        let d = Dimensions::new(vec![10, 10], vec![4, 4]).unwrap();
        assert!(d.check_read_range(&[8, 0], &[3, 1]).is_err());
        assert!(d.check_read_range(&[8, 0], &[2, 1]).is_ok());
    }
}
