//! Loading fragment libraries and variables from disk.
//!
//! A fragment library is either a JSON file shaped like the tree accepted by
//! `GraphQLClient::fragment()`, or a directory of `.graphql` files whose
//! relative paths name the fragments: `auth/user.graphql` registers
//! `auth.user`.

use libgraphql_client::FragmentTree;
use libgraphql_client::Variables;
use std::collections::HashSet;
use std::path::Path;
use walkdir::WalkDir;

pub(crate) fn load_fragments(
    path: &Path,
    file_exts: &HashSet<String>,
) -> anyhow::Result<FragmentTree> {
    if path.is_file() {
        log::debug!("Loading fragment tree from {path:#?}.");
        let contents = std::fs::read_to_string(path)?;
        return Ok(serde_json::from_str(&contents)?);
    }

    let mut root = serde_json::Map::new();
    for entry in WalkDir::new(path).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        let file_path = entry.path();
        if !entry.file_type().is_file() {
            log::trace!("Skipping non-file: {file_path:#?}.");
            continue;
        }
        let Some(fragment_path) = fragment_path_for(path, file_path, file_exts) else {
            log::trace!("Skipping non-fragment file: {file_path:#?}.");
            continue;
        };

        let body = std::fs::read_to_string(file_path)?;
        log::trace!("Found fragment `{fragment_path}` at {file_path:#?}.");
        insert_fragment(&mut root, &fragment_path, body.trim())?;
    }

    Ok(serde_json::from_value(serde_json::Value::Object(root))?)
}

/// Parse `--variables`: inline JSON, or `@<path>` to read JSON from a file.
pub(crate) fn load_variables(arg: &str) -> anyhow::Result<Variables> {
    let contents =
        match arg.strip_prefix('@') {
            Some(path) => std::fs::read_to_string(path)?,
            None => arg.to_string(),
        };
    match serde_json::from_str(&contents)? {
        serde_json::Value::Object(variables) => Ok(variables),
        other => anyhow::bail!("Variables must be a JSON object, found `{other}`"),
    }
}

/// The dotted fragment path for `file_path`, relative to the library root
/// `root`, or `None` if its extension isn't one of `file_exts`.
fn fragment_path_for(
    root: &Path,
    file_path: &Path,
    file_exts: &HashSet<String>,
) -> Option<String> {
    let ext = file_path.extension()?.to_string_lossy();
    if !file_exts.contains(ext.trim_start_matches('.')) {
        return None;
    }

    let relative = file_path.strip_prefix(root).ok()?.with_extension("");
    let segments: Vec<String> =
        relative.components()
            .map(|component| component.as_os_str().to_string_lossy().into_owned())
            .collect();
    Some(segments.join("."))
}

fn insert_fragment(
    root: &mut serde_json::Map<String, serde_json::Value>,
    fragment_path: &str,
    body: &str,
) -> anyhow::Result<()> {
    let mut segments: Vec<&str> = fragment_path.split('.').collect();
    let Some(leaf) = segments.pop() else {
        anyhow::bail!("Empty fragment path");
    };

    let mut namespace = root;
    for segment in segments {
        let entry =
            namespace.entry(segment.to_string())
                .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
        namespace = match entry {
            serde_json::Value::Object(map) => map,
            _ => anyhow::bail!(
                "`{fragment_path}` is nested under `{segment}`, which is \
                already a fragment"
            ),
        };
    }
    namespace.insert(leaf.to_string(), serde_json::Value::String(body.to_string()));
    Ok(())
}
