//! inference/infer.rs
//! Candidate narrowing by trial decode + file-name tie-break.

use tracing::{debug, info, trace, warn};

use crate::framing::collect_sample;
use crate::inference::compat::structurally_compatible;
use crate::inference::types::{Inference, InferenceError, Resolution};
use crate::schema::{SchemaError, SchemaId, SchemaRegistry};
use crate::stream::io::RecordSource;
use crate::utils::{base_name, local_name};

/// Pick the single schema that wrote `source`.
///
/// Reads the first `sample_size` records once each and keeps only the
/// candidates structurally compatible with all of them. When several survive,
/// the file name decides; anything other than exactly one winner is an
/// error, never a guess.
pub fn infer_schema<R, S>(
    registry: &R,
    source: &S,
    candidates: &[SchemaId],
    sample_size: usize,
) -> Result<Inference, InferenceError>
where
    R: SchemaRegistry,
    S: RecordSource + ?Sized,
{
    if candidates.is_empty() {
        return Err(InferenceError::NoCandidates);
    }

    let mut remaining = candidates
        .iter()
        .map(|id| registry.resolve(id).map(|schema| (id.clone(), schema)))
        .collect::<Result<Vec<_>, SchemaError>>()?;

    let sample = collect_sample(source, sample_size)?;
    debug!(
        candidates = remaining.len(),
        samples = sample.len(),
        "starting schema inference"
    );
    if sample.is_empty() {
        warn!("no complete records to sample, inference relies on candidates alone");
    }

    let mut buf = Vec::new();
    let mut sampled = 0usize;

    for loc in &sample {
        buf.resize(loc.len(), 0);
        source
            .read_exact_at(&mut buf, loc.offset)
            .map_err(|source| InferenceError::Read {
                offset: loc.offset,
                source,
            })?;
        sampled += 1;

        remaining.retain(|(id, schema)| {
            let ok = structurally_compatible(schema, &buf);
            if !ok {
                trace!(schema = %id, offset = loc.offset, "candidate rejected");
            }
            ok
        });

        if remaining.is_empty() {
            return Err(InferenceError::NoMatch { samples: sampled });
        }
    }

    let survivors: Vec<SchemaId> = remaining.into_iter().map(|(id, _)| id).collect();

    if let [only] = survivors.as_slice() {
        info!(schema = %only, samples = sampled, "inferred message type");
        return Ok(Inference {
            schema: only.clone(),
            resolution: Resolution::Structural,
            samples: sampled,
        });
    }

    info!(candidates = %survivors.join(", "), "multiple matches, attempting to match by file name");

    let by_name = narrow_by_file_name(&survivors, source.name());
    if let [only] = by_name.as_slice() {
        info!(schema = %only, samples = sampled, "inferred message type from file name");
        return Ok(Inference {
            schema: only.clone(),
            resolution: Resolution::FileName,
            samples: sampled,
        });
    }

    Err(InferenceError::Ambiguous { candidates: survivors })
}

/// Resolve a caller-supplied identifier without sampling.
pub fn resolve_explicit<R: SchemaRegistry>(registry: &R, id: &str) -> Result<Inference, SchemaError> {
    registry.resolve(id)?;
    Ok(Inference {
        schema: id.to_owned(),
        resolution: Resolution::Explicit,
        samples: 0,
    })
}

/// Keep candidates whose local name occurs in the file's base name,
/// compared case-insensitively.
pub fn narrow_by_file_name(candidates: &[SchemaId], file_name: Option<&str>) -> Vec<SchemaId> {
    let Some(file_name) = file_name else {
        return Vec::new();
    };
    let haystack = base_name(file_name).to_lowercase();

    candidates
        .iter()
        .filter(|id| {
            let needle = local_name(id).to_lowercase();
            !needle.is_empty() && haystack.contains(&needle)
        })
        .cloned()
        .collect()
}
