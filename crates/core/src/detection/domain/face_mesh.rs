//! Dense per-face landmark set in frame-normalized coordinates.
//!
//! The mesh does not know its topology; callers pick points by index through
//! [`EyeCornerIndices`], which keeps model-specific numbering out of the
//! transforms.

use crate::detection::domain::eye_landmarks::{EyeCornerIndices, EyeLandmarkPair, NormalizedPoint};

#[derive(Clone, Debug, PartialEq)]
pub struct FaceMesh {
    points: Vec<NormalizedPoint>,
}

impl FaceMesh {
    pub fn new(points: Vec<NormalizedPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[NormalizedPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Eye landmarks at `indices`, or `None` if the mesh is too small.
    pub fn eye_pair(&self, indices: EyeCornerIndices) -> Option<EyeLandmarkPair> {
        let left = *self.points.get(indices.left)?;
        let right = *self.points.get(indices.right)?;
        Some(EyeLandmarkPair::new(left, right))
    }
}

/// Eye pairs of every mesh that has both indexed points.
pub fn eye_pairs(meshes: &[FaceMesh], indices: EyeCornerIndices) -> Vec<EyeLandmarkPair> {
    let pairs: Vec<EyeLandmarkPair> = meshes.iter().filter_map(|m| m.eye_pair(indices)).collect();
    if pairs.len() < meshes.len() {
        log::warn!(
            "{} of {} face meshes lack landmarks {} / {}",
            meshes.len() - pairs.len(),
            meshes.len(),
            indices.left,
            indices.right
        );
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Mesh of `n` points where point `i` sits at `(i / 1000, i / 2000)`.
    fn indexed_mesh(n: usize) -> FaceMesh {
        FaceMesh::new(
            (0..n)
                .map(|i| NormalizedPoint::new(i as f64 / 1000.0, i as f64 / 2000.0))
                .collect(),
        )
    }

    #[test]
    fn test_eye_pair_reads_default_indices() {
        let pair = indexed_mesh(468).eye_pair(EyeCornerIndices::default()).unwrap();
        assert_eq!(pair.left, NormalizedPoint::new(0.033, 0.0165));
        assert_eq!(pair.right, NormalizedPoint::new(0.263, 0.1315));
    }

    #[test]
    fn test_eye_pair_with_refined_mesh() {
        assert!(indexed_mesh(478).eye_pair(EyeCornerIndices::default()).is_some());
    }

    #[test]
    fn test_eye_pair_mesh_too_small() {
        assert!(indexed_mesh(263).eye_pair(EyeCornerIndices::default()).is_none());
        assert!(indexed_mesh(0).eye_pair(EyeCornerIndices::default()).is_none());
    }

    #[test]
    fn test_eye_pair_custom_indices() {
        let pair = indexed_mesh(5)
            .eye_pair(EyeCornerIndices { left: 0, right: 1 })
            .unwrap();
        assert_eq!(pair.left, NormalizedPoint::new(0.0, 0.0));
        assert_eq!(pair.right, NormalizedPoint::new(0.001, 0.0005));
    }

    #[test]
    fn test_eye_pairs_skips_small_meshes() {
        let meshes = vec![indexed_mesh(468), indexed_mesh(10), indexed_mesh(478)];
        assert_eq!(eye_pairs(&meshes, EyeCornerIndices::default()).len(), 2);
    }

    #[test]
    fn test_len_and_empty() {
        assert!(FaceMesh::new(Vec::new()).is_empty());
        assert_eq!(indexed_mesh(3).len(), 3);
    }
}
