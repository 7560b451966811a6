/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Distances re-expressed as bf16 matrix multiplies.
//!
//! Operands are rounded to bf16, packed row-major and multiplied with f32 accumulation.
//! Inner products map directly onto a GEMM. Squared L2 is recovered from the diagonal of
//! the Gram matrix of the query-candidate differences, which costs a full `TILE x TILE`
//! product per candidate tile and only pays off on hardware with dedicated matrix units.
//!
//! Every product has the same shape: one query against `TILE` candidate slots, zero padded.
//! Tiles start at multiples of `TILE` in absolute candidate positions, so a candidate always
//! lands in the same slot of an identically shaped product and its score does not depend on
//! how the caller splits the candidates into batches.

use avs_linalg::{Transpose, bf16_gemm};
use avs_utils::{Matrix, MatrixView};
use avs_vector::conversion::CastFromSlice;
use half::bf16;

use super::RuntimeContext;

/// Candidate slots per product.
const TILE: usize = 128;

fn to_bf16(x: &[f32]) -> Vec<bf16> {
    let mut out = vec![bf16::ZERO; x.len()];
    out.as_mut_slice().cast_from_slice(x);
    out
}

/// Split `n` candidates, the first at absolute position `offset`, into runs that do not
/// cross a tile boundary. Yields `(start, len, slot)`: candidates `start..start + len`
/// occupy slots `slot..slot + len` of their tile.
fn aligned_runs(offset: usize, n: usize) -> impl Iterator<Item = (usize, usize, usize)> {
    let mut start = 0;
    std::iter::from_fn(move || {
        if start >= n {
            return None;
        }
        let slot = (offset + start) % TILE;
        let len = (TILE - slot).min(n - start);
        let run = (start, len, slot);
        start += len;
        Some(run)
    })
}

/// `out = queries * candidates'`, where candidate 0 sits at absolute position `offset`.
pub(super) fn inner_product(
    ctx: &RuntimeContext,
    queries: MatrixView<'_, f32>,
    candidates: MatrixView<'_, f32>,
    offset: usize,
    out: &mut Matrix<f32>,
) {
    let dim = queries.ncols();
    let packed_queries = to_bf16(queries.as_slice());

    let mut packed = vec![bf16::ZERO; TILE * dim];
    let mut scores = vec![0.0f32; TILE];

    for (start, len, slot) in aligned_runs(offset, candidates.nrows()) {
        packed.fill(bf16::ZERO);
        packed[slot * dim..(slot + len) * dim]
            .cast_from_slice(&candidates.as_slice()[start * dim..(start + len) * dim]);

        for (query, row) in packed_queries
            .chunks_exact(dim)
            .zip(out.row_iter_mut())
        {
            bf16_gemm(
                ctx.parallelism(),
                Transpose::Ordinary,
                1,
                TILE,
                dim,
                query,
                &packed,
                &mut scores,
            );
            row[start..start + len].copy_from_slice(&scores[slot..slot + len]);
        }
    }
}

/// `out[i, j] = |queries[i] - candidates[j]|^2` via `diag(D * D')` where row `j` of `D` is
/// `queries[i] - candidates[j]`. Candidate 0 sits at absolute position `offset`.
pub(super) fn squared_l2(
    ctx: &RuntimeContext,
    queries: MatrixView<'_, f32>,
    candidates: MatrixView<'_, f32>,
    offset: usize,
    out: &mut Matrix<f32>,
) {
    let dim = queries.ncols();

    let mut diff = vec![0.0f32; TILE * dim];
    let mut packed = vec![bf16::ZERO; TILE * dim];
    let mut gram = vec![0.0f32; TILE * TILE];

    for (query, row) in queries.row_iter().zip(out.row_iter_mut()) {
        for (start, len, slot) in aligned_runs(offset, candidates.nrows()) {
            diff.fill(0.0);
            let block = candidates.rows(start, start + len);
            for (d, candidate) in diff[slot * dim..(slot + len) * dim]
                .chunks_exact_mut(dim)
                .zip(block.row_iter())
            {
                for ((d, q), c) in d.iter_mut().zip(query).zip(candidate) {
                    *d = q - c;
                }
            }

            packed.as_mut_slice().cast_from_slice(diff.as_slice());
            bf16_gemm(
                ctx.parallelism(),
                Transpose::Ordinary,
                TILE,
                TILE,
                dim,
                &packed,
                &packed,
                &mut gram,
            );

            for (i, score) in row[start..start + len].iter_mut().enumerate() {
                let s = slot + i;
                *score = gram[s * TILE + s];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_follow_absolute_tiles() {
        let runs: Vec<_> = aligned_runs(0, 300).collect();
        assert_eq!(runs, [(0, 128, 0), (128, 128, 0), (256, 44, 0)]);

        let runs: Vec<_> = aligned_runs(120, 20).collect();
        assert_eq!(runs, [(0, 8, 120), (8, 12, 0)]);

        let runs: Vec<_> = aligned_runs(129, 1).collect();
        assert_eq!(runs, [(0, 1, 1)]);

        assert_eq!(aligned_runs(5, 0).count(), 0);
    }
}
