//! End-to-end runs of the Hardhat driver against a fake toolchain.

use serde_json::json;
use solnorm::{
    BuildError, BuildOptions, Compilation, CompilerFamily, Hardhat, Result, ToolchainCommand,
    ToolchainOutput, ToolchainRunner,
};
use solnorm_core::test_utils::{tempdir, write_file, write_with_mtime};
use std::{
    cell::RefCell,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

const TOKEN: &str = include_str!("../../../test-data/build-info/token-0.8.20.json");
const LEGACY: &str = include_str!("../../../test-data/build-info/legacy-0.4.7.json");

const OZ_IERC20: &str = "@openzeppelin/contracts/token/ERC20/IERC20.sol";

/// Answers `console` with a canned paths object and `compile` with a canned exit code.
struct FakeHardhat {
    probe_stdout: String,
    probe_exit: i32,
    compile_exit: i32,
    compile_stderr: String,
    calls: RefCell<Vec<ToolchainCommand>>,
}

impl FakeHardhat {
    fn new(probe_stdout: impl Into<String>) -> Self {
        Self {
            probe_stdout: probe_stdout.into(),
            probe_exit: 0,
            compile_exit: 0,
            compile_stderr: String::new(),
            calls: RefCell::default(),
        }
    }

    fn reporting(root: &Path) -> Self {
        Self::new(
            json!({
                "root": root,
                "configFile": root.join("hardhat.config.js"),
                "sources": root.join("contracts"),
                "cache": root.join("cache"),
                "artifacts": root.join("artifacts"),
                "tests": root.join("test"),
            })
            .to_string(),
        )
    }

    fn commands(&self) -> Vec<String> {
        self.calls.borrow().iter().map(ToString::to_string).collect()
    }
}

impl ToolchainRunner for FakeHardhat {
    fn run(&self, cmd: &ToolchainCommand) -> Result<ToolchainOutput> {
        self.calls.borrow_mut().push(cmd.clone());
        let output = if cmd.args.first().map(String::as_str) == Some("console") {
            ToolchainOutput {
                stdout: self.probe_stdout.clone().into_bytes(),
                stderr: Vec::new(),
                exit_code: Some(self.probe_exit),
            }
        } else {
            ToolchainOutput {
                stdout: b"Compiled 2 Solidity files successfully".to_vec(),
                stderr: self.compile_stderr.clone().into_bytes(),
                exit_code: Some(self.compile_exit),
            }
        };
        Ok(output)
    }
}

/// A project with a local contract, an installed dependency and two build-info files.
fn project() -> (TempDir, PathBuf) {
    let tmp = tempdir("solnorm-hardhat").unwrap();
    let root = tmp.path().to_path_buf();
    write_file(root.join("hardhat.config.js"), "module.exports = {};").unwrap();
    write_file(root.join("contracts/Token.sol"), "contract Token {}").unwrap();
    write_file(root.join("node_modules").join(OZ_IERC20), "interface IERC20 {}").unwrap();
    let build_info = root.join("artifacts/build-info");
    write_with_mtime(build_info.join("token.json"), TOKEN, 2_000).unwrap();
    write_with_mtime(build_info.join("legacy.json"), LEGACY, 1_000).unwrap();
    (tmp, root)
}

fn compile_reporting(root: &Path) -> Compilation {
    Hardhat::new(root, BuildOptions::default()).compile(&FakeHardhat::reporting(root)).unwrap()
}

#[test]
fn compiles_and_normalizes_project() {
    let (_tmp, root) = project();
    let runner = FakeHardhat::reporting(&root);

    let compilation = Hardhat::new(&root, BuildOptions::default()).compile(&runner).unwrap();

    assert_eq!(
        runner.commands(),
        ["npx hardhat console --no-compile", "npx hardhat compile --force"]
    );
    let calls = runner.calls.borrow();
    assert_eq!(calls[0].stdin.as_deref(), Some("console.log(JSON.stringify(config.paths))"));
    assert!(calls.iter().all(|cmd| cmd.cwd == root));
    drop(calls);

    let ids: Vec<_> = compilation.units().map(|unit| unit.id()).collect();
    assert_eq!(ids, ["legacy", "token"]);
    assert_eq!(compilation.target(), root.as_path());

    let token = compilation.unit("token").unwrap();
    let version = token.compiler_version();
    assert_eq!(version.compiler, CompilerFamily::Solc);
    assert_eq!(version.version, "0.8.20");
    assert!(version.optimized);
    assert!(!version.legacy_path_quirk());

    let names: Vec<_> = token.contract_names().iter().map(String::as_str).collect();
    assert_eq!(names, ["IERC20", "Token"]);

    let local = token.filename_of_contract("Token").unwrap();
    assert_eq!(local.absolute(), root.join("contracts/Token.sol"));
    assert_eq!(local.short(), "contracts/Token.sol");
    assert_eq!(local.used(), "contracts/Token.sol");

    let dependency = token.filename_of_contract("IERC20").unwrap();
    assert_eq!(dependency.absolute(), root.join("node_modules").join(OZ_IERC20));
    assert_eq!(dependency.short(), format!("node_modules/{OZ_IERC20}"));
    assert_eq!(dependency.used(), OZ_IERC20);
    assert_eq!(
        token.contracts_in_file(dependency.absolute()).unwrap().iter().collect::<Vec<_>>(),
        ["IERC20"]
    );
}

#[test]
fn keeps_per_contract_artifacts() {
    let (_tmp, root) = project();
    let compilation = compile_reporting(&root);
    let token = compilation.unit("token").unwrap();

    let srcmap = &token.srcmaps_init()["Token"];
    assert_eq!(srcmap.len(), 20);
    assert_eq!(srcmap[0], "57:120:0:-:0");
    assert!(srcmap[1..].iter().all(String::is_empty));
    assert_eq!(token.srcmaps_runtime()["Token"].len(), 6);

    assert_eq!(token.bytecodes_runtime()["Token"], "6080604052600080fd");
    let init = token.bytecode_init_bytes("Token").unwrap().unwrap();
    assert_eq!(init.len(), 17);
    assert!(token.bytecode_runtime_bytes("IERC20").unwrap().unwrap().is_empty());

    let abi = token.json_abi("Token").unwrap().unwrap();
    assert!(abi.function("totalSupply").is_some());

    let natspec = &token.natspec()["Token"];
    assert_eq!(natspec.userdoc["notice"], "A fixed supply token.");
    assert_eq!(natspec.devdoc, json!({}));
    assert_eq!(token.natspec()["IERC20"].devdoc["details"], "Interface of the ERC20 standard.");

    let ast = token.ast(root.join("contracts/Token.sol")).unwrap();
    assert_eq!(ast["absolutePath"], "contracts/Token.sol");
    assert_eq!(token.asts().len(), 2);
}

#[test]
fn legacy_compiler_sources_point_at_target() {
    let (_tmp, root) = project();
    let compilation = compile_reporting(&root);
    let legacy = compilation.unit("legacy").unwrap();

    assert!(legacy.compiler_version().legacy_path_quirk());
    assert!(!legacy.compiler_version().optimized);
    assert!(legacy.ast(&root).is_some());
    assert!(legacy.ast(root.join("contracts/Legacy.sol")).is_none());
    let sources: Vec<_> = legacy.filenames().iter().map(|f| f.absolute()).collect();
    assert_eq!(sources, [root.as_path()]);
    let shorts: Vec<_> = legacy.filenames().iter().map(|f| f.to_string()).collect();
    assert_eq!(shorts, ["."]);

    // contracts keep their reported file
    let declared = legacy.filename_of_contract("Legacy").unwrap();
    assert_eq!(declared.absolute(), root.join("contracts/Legacy.sol"));
}

#[test]
fn global_filenames_are_the_union_of_units() {
    let (_tmp, root) = project();
    let compilation = compile_reporting(&root);

    // contract-only files are not source files
    let mut expected: Vec<PathBuf> = vec![
        root.clone(),
        root.join("contracts/Token.sol"),
        root.join("node_modules").join(OZ_IERC20),
    ];
    expected.sort();
    let actual: Vec<PathBuf> =
        compilation.filenames().iter().map(|f| f.absolute().to_path_buf()).collect();
    assert_eq!(actual, expected);

    for unit in compilation.units() {
        assert!(unit.filenames().is_subset(compilation.filenames()));
    }
}

#[test]
fn same_contract_in_two_units() {
    let (_tmp, root) = project();
    let build_info = root.join("artifacts/build-info");
    write_with_mtime(build_info.join("token-rebuilt.json"), TOKEN, 3_000).unwrap();

    let compilation = compile_reporting(&root);

    let found: Vec<_> = compilation.find_contract("Token").map(|(unit, _)| unit.id()).collect();
    assert_eq!(found, ["token", "token-rebuilt"]);
    let first = compilation.unit("token").unwrap();
    let second = compilation.unit("token-rebuilt").unwrap();
    assert_eq!(first.abis()["Token"], second.abis()["Token"]);
    assert!(std::ptr::eq(
        &**first.filename_of_contract("Token").unwrap(),
        &**second.filename_of_contract("Token").unwrap()
    ));
}

#[test]
fn ignore_compile_only_probes() {
    let (_tmp, root) = project();
    let runner = FakeHardhat::reporting(&root);
    let options = BuildOptions::default().with_ignore_compile(true).with_npx_disable(true);

    let compilation = Hardhat::new(&root, options).compile(&runner).unwrap();

    assert_eq!(runner.commands(), ["hardhat console --no-compile"]);
    assert_eq!(compilation.len(), 2);
}

#[test]
fn failed_compile_aborts_run() {
    let (_tmp, root) = project();
    let mut runner = FakeHardhat::reporting(&root);
    runner.compile_exit = 1;
    runner.compile_stderr = "Error HH600: Compilation failed".to_string();

    let err = Hardhat::new(&root, BuildOptions::default()).compile(&runner).unwrap_err();
    match err {
        BuildError::ToolchainExecutionFailed { command, stderr, .. } => {
            assert_eq!(command, "npx hardhat compile --force");
            assert!(stderr.contains("HH600"), "{stderr}");
        }
        err => panic!("unexpected error: {err}"),
    }
}

#[test]
fn failed_probe_aborts_run() {
    let (_tmp, root) = project();
    let mut runner = FakeHardhat::new("");
    runner.probe_exit = 1;

    let err = Hardhat::new(&root, BuildOptions::default()).compile(&runner).unwrap_err();
    assert!(matches!(err, BuildError::ToolchainExecutionFailed { .. }), "{err}");
    assert_eq!(runner.commands(), ["npx hardhat console --no-compile"]);
}

#[test]
fn unreadable_probe_output_falls_back_to_defaults() {
    let (_tmp, root) = project();
    let runner = FakeHardhat::new("Error: Cannot find module 'hardhat'\nnot json either");

    let compilation = Hardhat::new(&root, BuildOptions::default()).compile(&runner).unwrap();
    assert_eq!(compilation.len(), 2);
}

#[test]
fn reported_paths_pick_the_artifacts_dir() {
    let (_tmp, root) = project();
    write_with_mtime(root.join("build/build-info/only.json"), TOKEN, 1_000).unwrap();
    let probe = format!(
        "Welcome to Node.js\n{}\n",
        json!({ "root": root, "artifacts": root.join("build") })
    );

    let compilation =
        Hardhat::new(&root, BuildOptions::default()).compile(&FakeHardhat::new(probe)).unwrap();
    let ids: Vec<_> = compilation.units().map(|unit| unit.id()).collect();
    assert_eq!(ids, ["only"]);
}

#[test]
fn explicit_overrides_beat_reported_paths() {
    let (_tmp, root) = project();
    write_with_mtime(root.join("out/build-info/override.json"), TOKEN, 1_000).unwrap();
    let options = BuildOptions::default().with_artifacts_directory("out");

    let compilation =
        Hardhat::new(&root, options).compile(&FakeHardhat::reporting(&root)).unwrap();
    let ids: Vec<_> = compilation.units().map(|unit| unit.id()).collect();
    assert_eq!(ids, ["override"]);
}

#[test]
fn empty_build_info_dir_is_an_error() {
    let tmp = tempdir("solnorm-hardhat").unwrap();
    let root = tmp.path().to_path_buf();
    std::fs::create_dir_all(root.join("artifacts/build-info")).unwrap();

    let runner = FakeHardhat::reporting(&root);
    let err = Hardhat::new(&root, BuildOptions::default()).compile(&runner).unwrap_err();
    let expected = root.join("artifacts/build-info");
    assert!(matches!(err, BuildError::NoArtifactsFound(ref dir) if dir == &expected), "{err}");
}

#[test]
fn malformed_artifact_aborts_run() {
    let (_tmp, root) = project();
    let broken = write_with_mtime(
        root.join("artifacts/build-info/broken.json"),
        r#"{"solcVersion":"0.8.20","input":{"language":"Solidity"}}"#,
        1_500,
    )
    .unwrap();

    let err = Hardhat::new(&root, BuildOptions::default()).normalize().unwrap_err();
    match err {
        BuildError::MalformedArtifact { path, .. } => assert_eq!(path, broken),
        err => panic!("unexpected error: {err}"),
    }
}

#[test]
fn normalize_reads_existing_output() {
    let (_tmp, root) = project();
    let compilation = Hardhat::new(&root, BuildOptions::default()).normalize().unwrap();
    assert_eq!(compilation.len(), 2);
    assert!(compilation.find_contract("Legacy").next().is_some());
}

#[test]
fn working_dir_override_moves_source_resolution() {
    let (_tmp, root) = project();
    write_file(root.join("sub/contracts/Token.sol"), "contract Token {}").unwrap();
    let options: BuildOptions =
        serde_json::from_str(r#"{"hardhat_working_dir": "sub", "hardhat_ignore_compile": true}"#)
            .unwrap();

    let runner = FakeHardhat::reporting(&root);
    let compilation = Hardhat::new(&root, options).compile(&runner).unwrap();
    assert_eq!(runner.commands(), ["npx hardhat console --no-compile"]);

    let token = compilation.unit("token").unwrap();
    let local = token.filename_of_contract("Token").unwrap();
    assert_eq!(local.absolute(), root.join("sub/contracts/Token.sol"));
    assert_eq!(local.short(), "sub/contracts/Token.sol");
    assert_eq!(local.used(), "contracts/Token.sol");

    // not installed below the overridden root
    let dependency = token.filename_of_contract("IERC20").unwrap();
    assert_eq!(dependency.absolute(), root.join("sub").join(OZ_IERC20));
}
