use std::collections::BTreeMap;

use crate::buffers::{RenderBuffers, POSITION};

/// Merges the buffers of many features into one set.
///
/// Columns are appended in input order. The indices of each bundle are shifted by the number
/// of `position` vertices contributed by all bundles before it, so they keep referencing their
/// own vertices. Columns are sized up front and filled with a single iterative pass.
#[tracing::instrument(skip_all)]
pub fn concat(bundles: Vec<RenderBuffers>) -> RenderBuffers {
    let mut sizes: BTreeMap<&str, usize> = BTreeMap::new();
    let mut index_count = 0;
    let mut has_indices = false;
    for bundle in &bundles {
        for (name, column) in &bundle.columns {
            *sizes.entry(name.as_str()).or_default() += column.len();
        }
        if let Some(indices) = &bundle.indices {
            index_count += indices.len();
            has_indices = true;
        }
    }

    let mut columns: BTreeMap<String, Vec<f32>> = sizes
        .into_iter()
        .map(|(name, size)| (name.to_string(), Vec::with_capacity(size)))
        .collect();
    let mut indices = has_indices.then(|| Vec::with_capacity(index_count));

    let mut vertex_offset: u32 = 0;
    for bundle in bundles {
        let vertices = bundle.column(POSITION).map_or(0, |p| p.len() / 2) as u32;

        if let (Some(out), Some(bundle_indices)) = (indices.as_mut(), bundle.indices) {
            out.extend(bundle_indices.into_iter().map(|index| index + vertex_offset));
        }
        for (name, column) in bundle.columns {
            if let Some(out) = columns.get_mut(&name) {
                out.extend(column);
            }
        }

        vertex_offset += vertices;
    }

    RenderBuffers { indices, columns }
}
