//! Directory-as-namespace aggregation.

use anyhow::Result;
use std::collections::BTreeMap;
use tracing::debug;

use super::Resolver;
use crate::core::Consumer;
use crate::module::{DirectoryUnit, ModuleValue, Namespace};
use crate::source::PATH_SEPARATOR;

/// Resolve every eligible member of a directory and assemble the [`Namespace`].
///
/// Each member `F` of directory `D` is resolved as the independent dependency
/// `D/F`, with `D` appended to the ancestor chain - so a member that
/// transitively requires `D` again is a circular dependency, not infinite
/// recursion - and the directory's origin as the consumer label. Because
/// members go through the normal walk, a pre-seeded cache entry named `D/F`
/// overrides that member without touching the source, and each member value is
/// individually cached under its `D/F` name.
pub(crate) async fn aggregate_directory(
    resolver: &Resolver<'_>,
    name: &str,
    directory: &DirectoryUnit,
    ancestors: &[String],
) -> Result<ModuleValue> {
    let mut chain = ancestors.to_vec();
    chain.push(name.to_string());

    let mut entries = BTreeMap::new();
    for member in directory.members() {
        let dependency = format!("{name}{PATH_SEPARATOR}{member}");
        debug!(directory = name, member = member.as_str(), "resolving directory member");
        let resolved = resolver
            .resolve(
                vec![dependency.clone()],
                chain.clone(),
                Consumer::Module(directory.origin().to_string()),
            )
            .await?;
        let value = resolved
            .get(&dependency)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("directory member \"{dependency}\" did not resolve"))?;
        entries.insert(member.clone(), value);
    }

    Ok(ModuleValue::new(Namespace::from_entries(entries)))
}
