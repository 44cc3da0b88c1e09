//! Turns one build-info document into a [`CompilationUnit`].

use crate::{
    compiler::CompilerVersion,
    naming::{extract_name, Canonicalizer, Filename},
    unit::{CompilationUnit, Natspec},
};
use solnorm_artifacts_solc::{BuildInfo, Contract};
use solnorm_core::{
    error::{BuildError, Result},
    utils::JSON_EXTENSION,
};
use std::{path::Path, sync::Arc};

/// Derives the unit id of a build-info file: its file name without the `.json` extension.
pub fn artifact_id(path: &Path) -> Result<String> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| BuildError::malformed(path, "build-info file name is not valid UTF-8"))?;
    let suffix = format!(".{JSON_EXTENSION}");
    Ok(name.strip_suffix(suffix.as_str()).unwrap_or(name).to_string())
}

/// Reads and parses the build-info file at `artifact_path`.
///
/// `target` is the path the project was invoked on; it replaces every reported source path
/// for compilers with [`CompilerVersion::legacy_path_quirk`].
#[instrument(level = "debug", skip(canonicalizer, target))]
pub fn parse(
    artifact_path: &Path,
    artifact_id: &str,
    target: &Path,
    canonicalizer: &mut Canonicalizer,
) -> Result<CompilationUnit> {
    let build_info = BuildInfo::read(artifact_path)?;
    parse_build_info(build_info, artifact_id, target, canonicalizer)
}

/// Populates a unit from an already decoded build-info document.
pub fn parse_build_info(
    build_info: BuildInfo,
    artifact_id: &str,
    target: &Path,
    canonicalizer: &mut Canonicalizer,
) -> Result<CompilationUnit> {
    let BuildInfo { solc_version, input, output, .. } = build_info;
    let compiler_version =
        CompilerVersion::resolve(&solc_version, &input.language, input.settings.optimizer.enabled)?;
    debug!(%compiler_version, "resolved compiler");

    let legacy_path_quirk = compiler_version.legacy_path_quirk();
    let mut unit = CompilationUnit::new(artifact_id, compiler_version);

    if let Some(contracts) = output.contracts {
        for (source_key, contracts) in contracts {
            let filename = canonicalizer.canonicalize(&source_key);
            for (raw_name, contract) in contracts {
                add_contract(&mut unit, filename.clone(), extract_name(&raw_name), contract);
            }
        }
    }

    if let Some(sources) = output.sources {
        for (path, source) in sources {
            let filename = if legacy_path_quirk {
                legacy_source_filename(target, canonicalizer)
            } else {
                canonicalizer.canonicalize(&path)
            };
            unit.add_source(filename, source.ast);
        }
    }

    trace!(
        contracts = unit.contract_names.len(),
        sources = unit.filenames.len(),
        "parsed compilation unit"
    );
    Ok(unit)
}

fn add_contract(
    unit: &mut CompilationUnit,
    filename: Arc<Filename>,
    name: &str,
    contract: Contract,
) {
    let Contract { abi, evm, userdoc, devdoc } = contract;
    unit.add_contract(filename, name);
    unit.abis.insert(name.to_string(), abi);
    unit.srcmaps_init.insert(name.to_string(), evm.bytecode.source_map_entries());
    unit.srcmaps_runtime.insert(name.to_string(), evm.deployed_bytecode.source_map_entries());
    unit.bytecodes_init.insert(name.to_string(), evm.bytecode.object);
    unit.bytecodes_runtime.insert(name.to_string(), evm.deployed_bytecode.object);
    unit.natspec.insert(name.to_string(), Natspec::new(userdoc, devdoc));
}

/// solc 0.4.0 - 0.4.9 only: the reported source name is unusable for single-file targets, so
/// the project target stands in for it. Do not extend this to other versions.
fn legacy_source_filename(target: &Path, canonicalizer: &mut Canonicalizer) -> Arc<Filename> {
    canonicalizer.canonicalize(&target.to_string_lossy())
}
