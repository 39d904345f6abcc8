//! Per-sample, per-strand genotype calls and the derived strand matrices.
//!
//! Calls are stored marker-major: the call of `sample` on `strand` (0 = maternal,
//! 1 = paternal) at `marker` lives at `(marker * num_samples + sample) * 2 + strand`.

/// Missing genotype call sentinel.
pub const MISSING: i8 = -1;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenotypeMatrix {
    num_markers: usize,
    num_samples: usize,
    calls: Vec<i8>,
}

impl GenotypeMatrix {
    /// Create an empty matrix for `num_samples` samples
    pub fn new(num_samples: usize) -> Self {
        Self {
            num_markers: 0,
            num_samples,
            calls: Vec::new(),
        }
    }

    /// Build a matrix from rows of `[maternal, paternal]` pairs, one row per marker
    pub fn from_rows(num_samples: usize, rows: &[Vec<[i8; 2]>]) -> Self {
        let mut matrix = Self::new(num_samples);
        for row in rows {
            let flat: Vec<i8> = row.iter().flat_map(|pair| pair.iter().copied()).collect();
            matrix.push_marker(&flat);
        }
        matrix
    }

    pub fn num_markers(&self) -> usize {
        self.num_markers
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Append the calls of one marker, laid out as `[s0_mat, s0_pat, s1_mat, ...]`
    pub fn push_marker(&mut self, calls: &[i8]) {
        assert_eq!(
            calls.len(),
            self.num_samples * 2,
            "Marker has {} calls but {} samples need {}",
            calls.len(),
            self.num_samples,
            self.num_samples * 2
        );
        self.calls.extend_from_slice(calls);
        self.num_markers += 1;
    }

    /// All calls of a marker, two per sample
    pub fn marker(&self, marker: usize) -> &[i8] {
        assert!(
            marker < self.num_markers,
            "Marker index {} out of range ({} markers)",
            marker,
            self.num_markers
        );
        let width = self.num_samples * 2;
        &self.calls[marker * width..(marker + 1) * width]
    }

    /// `[maternal, paternal]` call of one sample at one marker
    pub fn get(&self, marker: usize, sample: usize) -> [i8; 2] {
        let row = self.marker(marker);
        [row[sample * 2], row[sample * 2 + 1]]
    }

    /// Keep the markers at `indexes`, in the order given
    pub fn select_markers(&self, indexes: &[usize]) -> Self {
        let mut selected = Self::new(self.num_samples);
        selected.calls.reserve(indexes.len() * self.num_samples * 2);
        for &idx in indexes {
            let row = self.marker(idx);
            selected.calls.extend_from_slice(row);
            selected.num_markers += 1;
        }
        selected
    }

    /// Keep the samples whose flag in `keep` is set
    pub fn select_samples(&self, keep: &[bool]) -> Self {
        assert_eq!(keep.len(), self.num_samples, "Sample mask length mismatch");
        let kept = keep.iter().filter(|&&k| k).count();
        let mut selected = Self::new(kept);
        selected.calls.reserve(self.num_markers * kept * 2);
        for marker in 0..self.num_markers {
            let row = self.marker(marker);
            for (sample, _) in keep.iter().enumerate().filter(|(_, k)| **k) {
                selected.calls.push(row[sample * 2]);
                selected.calls.push(row[sample * 2 + 1]);
            }
        }
        selected.num_markers = self.num_markers;
        selected
    }

    /// Invert every 0/1 call of a marker (`0 -> 1`, `1 -> 0`); any other value,
    /// including [`MISSING`], is left as is.
    ///
    /// Returns `(ones_before, zeros_after)`, which are equal for a correct inversion.
    pub fn invert_marker(&mut self, marker: usize) -> (usize, usize) {
        assert!(
            marker < self.num_markers,
            "Marker index {} out of range ({} markers)",
            marker,
            self.num_markers
        );
        let width = self.num_samples * 2;
        let row = &mut self.calls[marker * width..(marker + 1) * width];

        let ones_before = row.iter().filter(|&&c| c == 1).count();
        for call in row.iter_mut() {
            if *call == 0 || *call == 1 {
                *call ^= 1;
            }
        }
        let zeros_after = row.iter().filter(|&&c| c == 0).count();

        (ones_before, zeros_after)
    }

    /// Replace every call equal to `from` by `to`
    pub fn replace_calls(&mut self, from: i8, to: i8) -> usize {
        let mut replaced = 0;
        for call in self.calls.iter_mut().filter(|c| **c == from) {
            *call = to;
            replaced += 1;
        }
        replaced
    }

    /// Percentage of markers with at least one missing call
    pub fn missing_marker_percentage(&self) -> f64 {
        if self.num_markers == 0 {
            return 0.0;
        }
        let with_missing = (0..self.num_markers)
            .filter(|&m| self.marker(m).iter().any(|&c| c < 0))
            .count();
        with_missing as f64 / self.num_markers as f64 * 100.0
    }

    /// Reshape to (2 * num_samples, num_markers): even rows maternal, odd rows paternal
    pub fn split_strands(&self) -> StrandMatrix {
        let rows = self.num_samples * 2;
        let cols = self.num_markers;
        let mut data = vec![0i8; rows * cols];
        for marker in 0..cols {
            for (row, &call) in self.marker(marker).iter().enumerate() {
                data[row * cols + marker] = call;
            }
        }
        StrandMatrix { rows, cols, data }
    }
}

/// Row-major strand matrix, one row per sample strand and one column per marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrandMatrix {
    rows: usize,
    cols: usize,
    data: Vec<i8>,
}

impl StrandMatrix {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> i8 {
        self.data[row * self.cols + col]
    }

    /// Keep the marker columns at `indexes`, in the order given
    pub fn select_columns(&self, indexes: &[usize]) -> StrandMatrix {
        let cols = indexes.len();
        let mut data = Vec::with_capacity(self.rows * cols);
        for row in 0..self.rows {
            let base = row * self.cols;
            for &col in indexes {
                assert!(col < self.cols, "Column {} out of range ({})", col, self.cols);
                data.push(self.data[base + col]);
            }
        }
        StrandMatrix {
            rows: self.rows,
            cols,
            data,
        }
    }
}

/// Sample-by-marker matrix of averaged maternal/paternal calls.
///
/// A cell is `NaN` when either strand of that sample is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl CombinedMatrix {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    /// Mean of each column over the observed (non-`NaN`) cells; `None` if nothing was observed
    pub fn column_means(&self) -> Vec<Option<f64>> {
        (0..self.cols)
            .map(|col| {
                let (sum, n) = (0..self.rows)
                    .map(|row| self.get(row, col))
                    .filter(|v| !v.is_nan())
                    .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
                if n == 0 {
                    None
                } else {
                    Some(sum / n as f64)
                }
            })
            .collect()
    }
}

/// Average each adjacent maternal/paternal row pair of a strand matrix.
pub fn combine_strands(matrix: &StrandMatrix) -> CombinedMatrix {
    assert!(
        matrix.rows % 2 == 0,
        "Strand matrix has an odd number of rows ({}); strands are not paired",
        matrix.rows
    );
    let rows = matrix.rows / 2;
    let cols = matrix.cols;
    let mut data = Vec::with_capacity(rows * cols);
    for sample in 0..rows {
        for col in 0..cols {
            let maternal = matrix.get(sample * 2, col);
            let paternal = matrix.get(sample * 2 + 1, col);
            if maternal < 0 || paternal < 0 {
                data.push(f64::NAN);
            } else {
                data.push((maternal as f64 + paternal as f64) / 2.0);
            }
        }
    }

    let combined = CombinedMatrix { rows, cols, data };
    assert_eq!(combined.cols, matrix.cols, "Number of markers changed while combining strands");
    assert_eq!(combined.rows * 2, matrix.rows, "Number of samples changed while combining strands");
    combined
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_matrix() -> GenotypeMatrix {
        GenotypeMatrix::from_rows(
            2,
            &[
                vec![[0, 1], [1, 1]],
                vec![[1, 0], [MISSING, 0]],
                vec![[0, 0], [0, 1]],
            ],
        )
    }

    #[test]
    fn test_split_strands_layout() {
        let strands = sample_matrix().split_strands();
        assert_eq!(strands.rows(), 4);
        assert_eq!(strands.cols(), 3);
        // Sample 0 maternal / paternal
        assert_eq!((strands.get(0, 0), strands.get(1, 0)), (0, 1));
        // Sample 1 maternal at marker 1 is missing
        assert_eq!(strands.get(2, 1), MISSING);
        assert_eq!(strands.get(3, 2), 1);
    }

    #[test]
    fn test_combine_strands_averages_pairs() {
        let combined = combine_strands(&sample_matrix().split_strands());
        assert_eq!(combined.rows(), 2);
        assert_eq!(combined.cols(), 3);
        assert_eq!(combined.get(0, 0), 0.5);
        assert_eq!(combined.get(1, 0), 1.0);
        assert!(combined.get(1, 1).is_nan());
        assert_eq!(combined.get(1, 2), 0.5);
    }

    #[test]
    fn test_column_means_skip_missing() {
        let combined = combine_strands(&sample_matrix().split_strands());
        let means = combined.column_means();
        assert_eq!(means[0], Some(0.75));
        // Only sample 0 is observed at marker 1
        assert_eq!(means[1], Some(0.5));
        assert_eq!(means[2], Some(0.25));
    }

    #[test]
    #[should_panic(expected = "odd number of rows")]
    fn test_combine_strands_rejects_odd_rows() {
        let matrix = StrandMatrix {
            rows: 3,
            cols: 1,
            data: vec![0, 1, 0],
        };
        combine_strands(&matrix);
    }

    #[test]
    fn test_invert_marker_keeps_missing() {
        let mut matrix = sample_matrix();
        let (ones_before, zeros_after) = matrix.invert_marker(1);
        assert_eq!(ones_before, zeros_after);
        assert_eq!(matrix.get(1, 0), [0, 1]);
        assert_eq!(matrix.get(1, 1), [MISSING, 1]);
        // Other markers untouched
        assert_eq!(matrix.get(0, 1), [1, 1]);
    }

    #[test]
    fn test_select_markers_and_samples() {
        let matrix = sample_matrix();
        let markers = matrix.select_markers(&[2, 0]);
        assert_eq!(markers.num_markers(), 2);
        assert_eq!(markers.get(0, 1), [0, 1]);
        assert_eq!(markers.get(1, 0), [0, 1]);

        let samples = matrix.select_samples(&[false, true]);
        assert_eq!(samples.num_samples(), 1);
        assert_eq!(samples.num_markers(), 3);
        assert_eq!(samples.get(1, 0), [MISSING, 0]);
    }

    #[test]
    fn test_missing_marker_percentage() {
        let matrix = sample_matrix();
        let pct = matrix.missing_marker_percentage();
        assert!((pct - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(GenotypeMatrix::new(3).missing_marker_percentage(), 0.0);
    }
}
