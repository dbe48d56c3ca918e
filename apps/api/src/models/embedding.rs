//! Text codec for pgvector embeddings
//!
//! Embeddings cross the wire to PostgreSQL in pgvector's text form
//! (`[0.1,0.2,...]`). Profile embeddings are read back the same way via a
//! `::text` cast, so both directions live here.

/// Dimensionality of track and profile embeddings
pub const EMBEDDING_DIM: usize = 256;

/// Render an embedding in pgvector text form, suitable for `$n::vector`.
pub fn format_pgvector(embedding: &[f32]) -> String {
    let mut out = String::with_capacity(embedding.len() * 10 + 2);
    out.push('[');
    for (i, v) in embedding.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&v.to_string());
    }
    out.push(']');
    out
}

/// Parse pgvector text form back into an embedding.
///
/// Returns `None` for malformed input, the wrong dimensionality, or any
/// non-finite component.
pub fn parse_pgvector(text: &str) -> Option<Vec<f32>> {
    let inner = text.trim().strip_prefix('[')?.strip_suffix(']')?;
    if inner.trim().is_empty() {
        return None;
    }
    let values: Vec<f32> = inner
        .split(',')
        .map(|v| v.trim().parse::<f32>().ok().filter(|f| f.is_finite()))
        .collect::<Option<Vec<f32>>>()?;
    if values.len() == EMBEDDING_DIM {
        Some(values)
    } else {
        None
    }
}
