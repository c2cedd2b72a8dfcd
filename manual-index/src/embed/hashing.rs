//! Signed feature hashing into a fixed number of buckets.

/// Projects arbitrary byte tokens into `dim` signed buckets.
pub(crate) struct HashProjector {
    dim: usize,
    seed: &'static [u8],
}

impl HashProjector {
    pub(crate) fn new(dim: usize, seed: &'static [u8]) -> Self {
        Self { dim, seed }
    }

    /// Adds `weight` to the bucket chosen for `token`, with a hash-derived sign.
    pub(crate) fn add(&self, out: &mut [f32], token: &[u8], weight: f32) {
        let mut h = blake3::Hasher::new();
        h.update(self.seed);
        h.update(token);
        let digest = h.finalize();
        let bytes = digest.as_bytes();

        let mut idx = [0u8; 8];
        idx.copy_from_slice(&bytes[..8]);
        let bucket = (u64::from_le_bytes(idx) % self.dim as u64) as usize;
        let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };

        out[bucket] += sign * weight;
    }
}

/// Scales `v` to unit length. Zero vectors stay zero.
pub(crate) fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
