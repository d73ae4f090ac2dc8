//! # CLI Command Implementations
//!
//! Every command takes a `QuadStore` over any `IndexClient`, so the same code
//! runs against a remote index or an in-memory one.

use quadex_core::{
    Delta, Direction, IndexClient, PageSource, Quad, QuadStore, QuadexError, Value, WriteSummary,
    cursor::Cursor, quad_id,
};
use std::path::{Path, PathBuf};

// =============================================================================
// INPUT FILES
// =============================================================================

/// Maximum size of a quad file (100 MB).
const MAX_LOAD_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Canonicalize `path`, require a regular file, and enforce the size limit.
fn validate_input_file(path: &Path) -> Result<PathBuf, QuadexError> {
    let canonical = path.canonicalize().map_err(|e| {
        QuadexError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;
    let metadata = std::fs::metadata(&canonical)
        .map_err(|e| QuadexError::Io(format!("Cannot read file metadata: {}", e)))?;

    if !metadata.is_file() {
        return Err(QuadexError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }
    if metadata.len() > MAX_LOAD_FILE_SIZE {
        return Err(QuadexError::Io(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_LOAD_FILE_SIZE
        )));
    }
    Ok(canonical)
}

/// Parse tab-separated quads: `subject\tpredicate\tobject[\tlabel]`.
///
/// Blank lines and lines starting with `#` are ignored.
pub fn parse_quads(contents: &str) -> Result<Vec<Quad>, QuadexError> {
    let mut quads = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let quad = match fields.as_slice() {
            [s, p, o] => Quad::triple(*s, *p, *o),
            [s, p, o, c] => Quad::new(*s, *p, *o, *c),
            _ => {
                return Err(QuadexError::InvalidQuad(format!(
                    "line {}: expected 3 or 4 tab-separated fields, got {}",
                    idx + 1,
                    fields.len()
                )));
            }
        };
        quad.validate()
            .map_err(|e| QuadexError::InvalidQuad(format!("line {}: {}", idx + 1, e)))?;
        quads.push(quad);
    }
    Ok(quads)
}

/// Read and parse a quad file.
pub fn read_quads(path: &Path) -> Result<Vec<Quad>, QuadexError> {
    let validated = validate_input_file(path)?;
    let contents = std::fs::read_to_string(&validated)
        .map_err(|e| QuadexError::Io(format!("Cannot read '{}': {}", path.display(), e)))?;
    parse_quads(&contents)
}

// =============================================================================
// OUTPUT
// =============================================================================

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn print_summary(action: &str, summary: &WriteSummary, json_mode: bool) {
    if json_mode {
        print_json(&serde_json::json!({
            "action": action,
            "quads_written": summary.quads_written,
            "quads_removed": summary.quads_removed,
            "nodes_written": summary.nodes_written,
        }));
    } else {
        println!("{action}:");
        println!("  Quads written: {}", summary.quads_written);
        println!("  Quads removed: {}", summary.quads_removed);
        println!("  Nodes written: {}", summary.nodes_written);
    }
}

/// Pull up to `limit` results (0 for all), then close the cursor.
///
/// Quad cursors also return the decoded quad of each result.
pub async fn take_results<P: PageSource>(
    cursor: &mut Cursor<P>,
    limit: usize,
) -> Result<Vec<(Value, Option<Quad>)>, QuadexError> {
    let mut out = Vec::new();
    while limit == 0 || out.len() < limit {
        if !cursor.advance().await? {
            break;
        }
        let value = cursor.result()?.clone();
        let quad = cursor.result_quad().ok().cloned();
        out.push((value, quad));
    }
    cursor.close();
    Ok(out)
}

fn print_results(results: &[(Value, Option<Quad>)], total: u64, json_mode: bool) {
    if json_mode {
        let items: Vec<serde_json::Value> = results
            .iter()
            .map(|(value, quad)| match quad {
                Some(q) => serde_json::json!({ "id": value.as_str(), "quad": q }),
                None => serde_json::json!(value.as_str()),
            })
            .collect();
        print_json(&serde_json::json!({ "total": total, "results": items }));
        return;
    }

    for (value, quad) in results {
        match quad {
            Some(q) => println!("{}\t{}", value, q),
            None => println!("{}", value),
        }
    }
    if (results.len() as u64) < total {
        println!("... {} of {} shown", results.len(), total);
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Create the collections.
pub async fn cmd_init<C: IndexClient>(
    store: &QuadStore<C>,
    json_mode: bool,
) -> Result<(), QuadexError> {
    store.init().await?;
    let config = store.config();
    if json_mode {
        print_json(&serde_json::json!({
            "quad_collection": config.quad_collection,
            "node_collection": config.node_collection,
        }));
    } else {
        println!(
            "Collections ready: {} (quads), {} (nodes)",
            config.quad_collection, config.node_collection
        );
    }
    Ok(())
}

/// Add every quad in `file`, `chunk` quads per write batch.
pub async fn cmd_load<C: IndexClient>(
    store: &QuadStore<C>,
    file: &Path,
    chunk: usize,
    json_mode: bool,
) -> Result<(), QuadexError> {
    tracing::info!("Loading quads from {:?}", file);
    let deltas: Vec<Delta> = read_quads(file)?.into_iter().map(Delta::add).collect();
    let summary = apply_in_chunks(store, &deltas, chunk).await?;
    print_summary("load", &summary, json_mode);
    Ok(())
}

/// Remove every quad in `file`.
pub async fn cmd_remove<C: IndexClient>(
    store: &QuadStore<C>,
    file: &Path,
    json_mode: bool,
) -> Result<(), QuadexError> {
    tracing::info!("Removing quads listed in {:?}", file);
    let deltas: Vec<Delta> = read_quads(file)?.into_iter().map(Delta::remove).collect();
    let summary = store.apply_writes(&deltas).await?;
    print_summary("remove", &summary, json_mode);
    Ok(())
}

/// Apply `deltas` in batches of `chunk`, summing the per-batch counts.
pub async fn apply_in_chunks<C: IndexClient>(
    store: &QuadStore<C>,
    deltas: &[Delta],
    chunk: usize,
) -> Result<WriteSummary, QuadexError> {
    let mut total = WriteSummary::default();
    for (n, batch) in deltas.chunks(chunk.max(1)).enumerate() {
        let summary = store.apply_writes(batch).await?;
        total.quads_written += summary.quads_written;
        total.quads_removed += summary.quads_removed;
        total.nodes_written += summary.nodes_written;
        tracing::debug!(batch = n, quads = batch.len(), "batch written");
    }
    Ok(total)
}

/// Print the number of stored quads.
pub async fn cmd_size<C: IndexClient>(
    store: &QuadStore<C>,
    json_mode: bool,
) -> Result<(), QuadexError> {
    let quads = store.size().await?;
    let nodes = store.node_count().await?;
    if json_mode {
        print_json(&serde_json::json!({ "quads": quads, "nodes": nodes }));
    } else {
        println!("Quads: {}", quads);
        println!("Nodes: {}", nodes);
    }
    Ok(())
}

/// List node names.
pub async fn cmd_nodes<C: IndexClient>(
    store: &QuadStore<C>,
    limit: usize,
    json_mode: bool,
) -> Result<(), QuadexError> {
    let mut cursor = store.all_nodes().await?;
    let total = cursor.size();
    let results = take_results(&mut cursor, limit).await?;
    print_results(&results, total, json_mode);
    Ok(())
}

/// List stored quads.
pub async fn cmd_quads<C: IndexClient>(
    store: &QuadStore<C>,
    limit: usize,
    json_mode: bool,
) -> Result<(), QuadexError> {
    let mut cursor = store.all_quads().await?;
    let total = cursor.size();
    let results = take_results(&mut cursor, limit).await?;
    print_results(&results, total, json_mode);
    Ok(())
}

/// List quads whose `direction` field equals `value`.
pub async fn cmd_lookup<C: IndexClient>(
    store: &QuadStore<C>,
    direction: &str,
    value: &str,
    limit: usize,
    json_mode: bool,
) -> Result<(), QuadexError> {
    let direction = Direction::parse(direction)?;
    let mut cursor = store
        .quads_by_direction(direction, &store.value_of(value))
        .await?;
    let total = cursor.size();
    let results = take_results(&mut cursor, limit).await?;
    print_results(&results, total, json_mode);
    Ok(())
}

/// Show the quad stored under `id`.
pub async fn cmd_resolve<C: IndexClient>(
    store: &QuadStore<C>,
    id: &str,
    json_mode: bool,
) -> Result<(), QuadexError> {
    let quad = store.resolve_quad(&Value::new(id)).await?;
    if json_mode {
        print_json(&serde_json::json!({ "id": id, "quad": quad }));
    } else {
        println!("{}", quad);
    }
    Ok(())
}

/// Print the content address of a quad.
pub fn cmd_id(
    subject: &str,
    predicate: &str,
    object: &str,
    label: Option<&str>,
    json_mode: bool,
) -> Result<(), QuadexError> {
    let quad = Quad::new(subject, predicate, object, label.unwrap_or_default());
    let id = quad_id(&quad);
    if json_mode {
        print_json(&serde_json::json!({ "id": id.as_str(), "quad": quad }));
    } else {
        println!("{}", id);
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
