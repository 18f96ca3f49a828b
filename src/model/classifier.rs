//! Embedding + average pooling + dense + sigmoid.

use candle_core::{DType, Device, Tensor, Var};
use rand::Rng;

use super::summary::{LayerSummary, ModelSummary};
use crate::error::{KinbagError, Result};

/// Probabilities are clamped to this distance from 0 and 1 so the output is
/// strictly inside the unit interval even when an `f32` sigmoid saturates.
const PROB_EPS: f64 = 1e-7;

/// Half-width of the uniform initialiser for embedding rows.
const EMBEDDING_INIT: f32 = 0.05;

/// Averaged bag-of-entities classifier.
///
/// Row 0 of the embedding matrix is reserved: it starts at zero and is never
/// produced by the encoder, but looking it up is valid.
pub struct BagOfEntities {
    /// Entity embeddings: [num_entities + 1, dim]
    embeddings: Var,
    /// Projection: [dim, num_relations]
    weight: Var,
    /// Bias: [num_relations]
    bias: Var,
    dim: usize,
    num_relations: usize,
    device: Device,
}

impl BagOfEntities {
    /// Create a randomly initialised classifier.
    ///
    /// # Arguments
    /// * `num_entities` - Vocabulary size, not counting the reserved row
    /// * `dim` - Embedding dimension
    /// * `num_relations` - Output width
    /// * `rng` - Seeded generator; the same seed gives the same weights
    /// * `device` - Compute device
    pub fn new<R: Rng + ?Sized>(
        num_entities: usize,
        dim: usize,
        num_relations: usize,
        rng: &mut R,
        device: &Device,
    ) -> Result<Self> {
        if dim == 0 || num_relations == 0 {
            return Err(KinbagError::Config(format!(
                "embedding dim and relation count must be positive, got dim={} relations={}",
                dim, num_relations
            )));
        }

        let rows = num_entities + 1;
        let mut emb = vec![0.0f32; rows * dim];
        for v in emb.iter_mut().skip(dim) {
            *v = rng.gen_range(-EMBEDDING_INIT..EMBEDDING_INIT);
        }

        // Glorot uniform
        let limit = (6.0 / (dim + num_relations) as f64).sqrt() as f32;
        let w: Vec<f32> = (0..dim * num_relations)
            .map(|_| rng.gen_range(-limit..limit))
            .collect();

        let embeddings = Tensor::from_vec(emb, (rows, dim), device)?;
        let weight = Tensor::from_vec(w, (dim, num_relations), device)?;
        let bias = Tensor::zeros(num_relations, DType::F32, device)?;

        Self::from_parts(embeddings, weight, bias)
    }

    /// Build a classifier from explicit parameter tensors.
    ///
    /// Expects embeddings `[rows, dim]`, weight `[dim, relations]` and bias
    /// `[relations]`, all `f32` on the same device.
    pub fn from_parts(embeddings: Tensor, weight: Tensor, bias: Tensor) -> Result<Self> {
        let (rows, dim) = match embeddings.dims() {
            &[r, d] if r > 0 && d > 0 => (r, d),
            other => {
                return Err(KinbagError::ShapeMismatch {
                    expected: "[rows, dim]".to_string(),
                    got: format!("{:?}", other),
                })
            }
        };
        let num_relations = match weight.dims() {
            &[d, r] if d == dim && r > 0 => r,
            other => {
                return Err(KinbagError::ShapeMismatch {
                    expected: format!("[{}, relations]", dim),
                    got: format!("{:?}", other),
                })
            }
        };
        if bias.dims() != [num_relations] {
            return Err(KinbagError::ShapeMismatch {
                expected: format!("[{}]", num_relations),
                got: format!("{:?}", bias.dims()),
            });
        }

        let device = embeddings.device().clone();
        tracing::debug!(rows, dim, num_relations, "initialised classifier");

        Ok(Self {
            embeddings: Var::from_tensor(&embeddings.to_dtype(DType::F32)?)?,
            weight: Var::from_tensor(&weight.to_dtype(DType::F32)?)?,
            bias: Var::from_tensor(&bias.to_dtype(DType::F32)?)?,
            dim,
            num_relations,
            device,
        })
    }

    /// Get the embedding dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn num_relations(&self) -> usize {
        self.num_relations
    }

    /// Rows in the embedding matrix, including the reserved row 0.
    pub fn rows(&self) -> usize {
        self.embeddings.as_tensor().dims()[0]
    }

    /// Entities the model can score (rows minus the reserved row).
    pub fn num_entities(&self) -> usize {
        self.rows() - 1
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Learnable parameters, for handing to an optimizer.
    pub fn vars(&self) -> Vec<Var> {
        vec![self.embeddings.clone(), self.weight.clone(), self.bias.clone()]
    }

    /// Embedding matrix as a tensor (for inference).
    pub fn embeddings(&self) -> Tensor {
        self.embeddings.as_tensor().clone()
    }

    pub fn weight(&self) -> Tensor {
        self.weight.as_tensor().clone()
    }

    pub fn bias(&self) -> Tensor {
        self.bias.as_tensor().clone()
    }

    fn index_tensor(&self, indices: &[usize]) -> Result<Tensor> {
        let rows = self.rows();
        let mut ids = Vec::with_capacity(indices.len());
        for &index in indices {
            if index >= rows {
                return Err(KinbagError::OutOfRange { index, rows });
            }
            ids.push(index as u32);
        }
        Ok(Tensor::from_vec(ids, indices.len(), &self.device)?)
    }

    /// Gather embedding rows: returns [indices.len(), dim].
    ///
    /// Fails with `OutOfRange` for any index past the last row; never clamps.
    pub fn lookup(&self, indices: &[usize]) -> Result<Tensor> {
        let idx = self.index_tensor(indices)?;
        Ok(self.embeddings.as_tensor().index_select(&idx, 0)?)
    }

    /// Score a batch of (head, tail) pairs.
    ///
    /// Returns probabilities [batch, num_relations], each strictly in (0, 1).
    /// `forward(h, t) == forward(t, h)` because the pair is averaged.
    pub fn forward(&self, heads: &[usize], tails: &[usize]) -> Result<Tensor> {
        if heads.len() != tails.len() {
            return Err(KinbagError::ShapeMismatch {
                expected: format!("{} tails", heads.len()),
                got: format!("{} tails", tails.len()),
            });
        }
        if heads.is_empty() {
            return Ok(Tensor::zeros((0, self.num_relations), DType::F32, &self.device)?);
        }

        let emb_heads = self.lookup(heads)?; // [n, dim]
        let emb_tails = self.lookup(tails)?; // [n, dim]

        let pooled = (emb_heads + emb_tails)?.affine(0.5, 0.0)?;
        let logits = pooled
            .matmul(self.weight.as_tensor())?
            .broadcast_add(self.bias.as_tensor())?;

        let probs = candle_nn::ops::sigmoid(&logits)?;
        Ok(probs.clamp(PROB_EPS, 1.0 - PROB_EPS)?)
    }

    /// Relation probabilities for a single pair.
    pub fn score(&self, head: usize, tail: usize) -> Result<Vec<f32>> {
        let probs = self.forward(&[head], &[tail])?;
        Ok(probs.squeeze(0)?.to_vec1::<f32>()?)
    }

    /// The `k` most probable relations for a pair, as (relation position,
    /// probability) in descending order.
    pub fn predict(&self, head: usize, tail: usize, k: usize) -> Result<Vec<(usize, f32)>> {
        let mut ranked: Vec<(usize, f32)> = self.score(head, tail)?.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(k);
        Ok(ranked)
    }

    /// Learned vectors for entities `1..=num_entities`, in index order.
    pub fn entity_vectors(&self) -> Result<Vec<Vec<f32>>> {
        let rows = self.rows();
        let emb = self.embeddings.as_tensor().narrow(0, 1, rows - 1)?;
        Ok(emb.to_vec2::<f32>()?)
    }

    /// The `k` entities closest to `index` by cosine similarity, excluding
    /// itself and the reserved row.
    pub fn nearest(&self, index: usize, k: usize) -> Result<Vec<(usize, f32)>> {
        let rows = self.rows();
        if index == 0 || index >= rows {
            return Err(KinbagError::OutOfRange { index, rows });
        }

        let vectors = self.entity_vectors()?;
        let query = &vectors[index - 1];
        let query_norm = norm(query);

        let mut sims: Vec<(usize, f32)> = vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i + 1, v))
            .filter(|(i, _)| *i != index)
            .map(|(i, v)| {
                let denom = query_norm * norm(v);
                let dot: f32 = query.iter().zip(v).map(|(a, b)| a * b).sum();
                (i, if denom > 0.0 { dot / denom } else { 0.0 })
            })
            .collect();

        sims.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        sims.truncate(k);
        Ok(sims)
    }

    /// Layer-by-layer shape and parameter summary.
    pub fn summary(&self) -> ModelSummary {
        let rows = self.rows();
        ModelSummary::new(vec![
            LayerSummary::new("embedding", "Embedding", format!("(None, 2, {})", self.dim), rows * self.dim),
            LayerSummary::new("average", "GlobalAveragePooling1D", format!("(None, {})", self.dim), 0),
            LayerSummary::new(
                "dense",
                "Dense",
                format!("(None, {})", self.num_relations),
                self.dim * self.num_relations + self.num_relations,
            ),
            LayerSummary::new("sigmoid", "Activation", format!("(None, {})", self.num_relations), 0),
        ])
    }
}

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
