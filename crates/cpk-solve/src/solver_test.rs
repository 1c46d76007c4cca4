// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::sync::Arc;

use cpk_config::{OptimizationCriterion, SolverConfig};
use cpk_hash::Digest;
use cpk_name::pkg_name;
use cpk_spec::{parse_spec_request, Arch, Compiler, Spec, VariantMap, VariantValue};
use cpk_storage::RepositoryHandle;
use cpk_version::parse_version;
use rstest::rstest;

use super::{make_repo, verify_answer_covers, Error, PackageSource, Solver};

fn test_config() -> SolverConfig {
    SolverConfig {
        reuse: false,
        compilers: vec![
            Compiler::new(pkg_name!("gcc"), parse_version("9.4.0").unwrap()),
            Compiler::new(pkg_name!("clang"), parse_version("13.0.1").unwrap()),
        ],
        arch: Some(Arch::new("linux", "centos7", "x86_64")),
        ..Default::default()
    }
}

/// The classic test corpus: an application over two layers of
/// libraries, with three providers for the mpi virtual.
fn mpi_repo() -> RepositoryHandle {
    make_repo!([
        {
            "pkg": "mpileaks",
            "versions": [{"version": "2.3"}, {"version": "2.2"}, {"version": "1.0"}],
            "variants": [{"name": "debug", "default": false}],
            "depends": [{"pkg": "mpi"}, {"pkg": "callpath"}]
        },
        {
            "pkg": "callpath",
            "versions": [{"version": "1.0"}, {"version": "0.9"}],
            "depends": [{"pkg": "dyninst"}, {"pkg": "mpi"}]
        },
        {
            "pkg": "dyninst",
            "versions": [{"version": "8.2"}, {"version": "8.1.2"}],
            "depends": [
                {"pkg": "libelf", "range": "0.8.13:"},
                {"pkg": "libdwarf", "depflag": ["build", "link"]}
            ]
        },
        {
            "pkg": "libdwarf",
            "versions": [{"version": "20130729"}],
            "depends": [{"pkg": "libelf"}]
        },
        {
            "pkg": "libelf",
            "versions": [{"version": "0.8.13"}, {"version": "0.8.12"}],
            "variants": [{"name": "shared", "default": true}]
        },
        {
            "pkg": "mpich",
            "versions": [{"version": "3.2"}, {"version": "3.0.4"}],
            "provides": [{"virtual": "mpi"}]
        },
        {
            "pkg": "openmpi",
            "versions": [{"version": "4.1.1"}, {"version": "2.1.1"}],
            "provides": [{"virtual": "mpi"}]
        },
        {
            "pkg": "zmpi",
            "versions": [{"version": "1.0"}],
            "provides": [{"virtual": "mpi"}],
            "depends": [{"pkg": "fake"}]
        },
        {"pkg": "fake", "versions": [{"version": "1.0"}]},
    ])
}

fn solver_with(repo: RepositoryHandle) -> Solver {
    let mut solver = Solver::new(test_config());
    solver.add_repository(repo);
    solver
}

#[rstest]
fn test_solve_dependency_closure() {
    let mut solver = solver_with(mpi_repo());
    solver.add_request(parse_spec_request("mpileaks").unwrap());
    let solution = solver.solve().unwrap();

    // the full closure is present, nothing else
    for expected in ["mpileaks", "callpath", "dyninst", "libdwarf", "libelf"] {
        assert!(solution.get(expected).is_some(), "{expected} must resolve");
    }
    assert!(solution.get("fake").is_none());
    assert!(solution.get("zmpi").is_none());

    // newest versions win under the default policy
    let mpileaks = solution.get("mpileaks").unwrap();
    assert_eq!(mpileaks.spec.version(), &parse_version("2.3").unwrap());
    assert_eq!(
        solution.get("libelf").unwrap().spec.version(),
        &parse_version("0.8.13").unwrap()
    );

    // the root's graph reaches its whole closure
    let reached: Vec<_> = mpileaks
        .spec
        .traverse()
        .map(|spec| spec.name().to_string())
        .collect();
    assert!(reached.contains(&"libelf".to_string()));
}

#[rstest]
fn test_virtual_resolution_is_deterministic() {
    let mut solver = solver_with(mpi_repo());
    solver.add_request(parse_spec_request("mpileaks").unwrap());
    let solution = solver.solve().unwrap();
    // providers tie under the default policy; the name tie-break
    // picks mpich, and must keep picking it
    assert!(solution.get("mpich").is_some());
    assert!(solution.get("openmpi").is_none());
}

#[rstest]
#[case("mpileaks ^mpich", "mpich")]
#[case("mpileaks ^openmpi", "openmpi")]
#[case("mpileaks ^zmpi", "zmpi")]
fn test_explicit_provider_choice(#[case] request: &str, #[case] provider: &str) {
    let mut solver = solver_with(mpi_repo());
    solver.add_request(parse_spec_request(request).unwrap());
    let solution = solver.solve().unwrap();
    assert!(solution.get(provider).is_some());
    if provider == "zmpi" {
        // zmpi drags in its own dependency
        assert!(solution.get("fake").is_some());
    }
}

#[rstest]
fn test_preferred_provider() {
    let mut config = test_config();
    config
        .preferred_providers
        .insert(pkg_name!("mpi"), pkg_name!("openmpi"));
    let mut solver = Solver::new(config);
    solver.add_repository(mpi_repo());
    solver.add_request(parse_spec_request("mpileaks").unwrap());
    let solution = solver.solve().unwrap();
    assert!(solution.get("openmpi").is_some());
    assert!(solution.get("mpich").is_none());
}

#[rstest]
fn test_concretization_is_deterministic() {
    let solve = || {
        let mut solver = solver_with(mpi_repo());
        solver.add_request(parse_spec_request("mpileaks+debug ^mpich@3:").unwrap());
        solver.solve().unwrap()
    };
    let first = solve();
    let second = solve();
    assert_eq!(first.len(), second.len());
    for solved in first.items() {
        let again = second.get(solved.spec.name().as_str()).unwrap();
        assert_eq!(solved.digest, again.digest, "{}", solved.spec.name());
    }
}

#[rstest]
fn test_version_constraints_apply_transitively() {
    let mut solver = solver_with(mpi_repo());
    solver.add_request(parse_spec_request("mpileaks@:2.2 ^dyninst@8.1.2").unwrap());
    let solution = solver.solve().unwrap();
    assert_eq!(
        solution.get("mpileaks").unwrap().spec.version(),
        &parse_version("2.2").unwrap()
    );
    assert_eq!(
        solution.get("dyninst").unwrap().spec.version(),
        &parse_version("8.1.2").unwrap()
    );
}

#[rstest]
fn test_variant_constraints() {
    let mut solver = solver_with(mpi_repo());
    solver.add_request(parse_spec_request("mpileaks+debug ^libelf~shared").unwrap());
    let solution = solver.solve().unwrap();
    assert_eq!(
        solution.get("mpileaks").unwrap().spec.variants().get("debug"),
        Some(&VariantValue::Bool(true))
    );
    assert_eq!(
        solution.get("libelf").unwrap().spec.variants().get("shared"),
        Some(&VariantValue::Bool(false))
    );
}

#[rstest]
fn test_unknown_variant_is_unsatisfiable() {
    let mut solver = solver_with(mpi_repo());
    solver.add_request(parse_spec_request("mpileaks+bogus").unwrap());
    match solver.solve() {
        Err(Error::FailedToResolve(report)) => {
            assert_eq!(report.pkg, "mpileaks");
            assert!(!report.inconclusive);
        }
        other => panic!("expected infeasibility, got {other:?}"),
    }
}

#[rstest]
fn test_unsat_is_reported_not_partial() {
    let mut solver = solver_with(mpi_repo());
    solver.add_request(parse_spec_request("mpileaks@9:").unwrap());
    match solver.solve() {
        Err(Error::FailedToResolve(report)) => {
            assert_eq!(report.pkg, "mpileaks");
            assert!(!report.inconclusive);
            assert!(!report.notes.is_empty());
            assert!(
                report.requested.iter().any(|r| r.contains("command line")),
                "requested constraints must carry their origin: {:?}",
                report.requested
            );
        }
        other => panic!("expected infeasibility, got {other:?}"),
    }
}

#[rstest]
fn test_contradictory_explicit_requests_rejected_before_solving() {
    let mut solver = solver_with(mpi_repo());
    solver.add_request(parse_spec_request("mpileaks@2.3").unwrap());
    solver.add_request(parse_spec_request("mpileaks@=1.0").unwrap());
    match solver.solve() {
        Err(Error::ConflictingRequests { pkg, .. }) => assert_eq!(pkg, "mpileaks"),
        other => panic!("expected a constraint error, got {other:?}"),
    }
}

#[rstest]
fn test_conflict_moves_to_second_compiler() {
    let repo = make_repo!([
        {
            "pkg": "pkga",
            "versions": [{"version": "1.0"}],
            "conflicts": [{"compiler": "gcc", "msg": "gcc miscompiles pkga"}]
        },
    ]);
    let mut solver = solver_with(repo);
    solver.add_request(parse_spec_request("pkga").unwrap());
    let solution = solver.solve().unwrap();
    assert_eq!(
        solution.get("pkga").unwrap().spec.compiler().name,
        "clang"
    );
}

#[rstest]
fn test_conflicting_dependency_is_excluded() {
    let repo = make_repo!([
        {
            "pkg": "app",
            "versions": [{"version": "1.0"}],
            "depends": [{"pkg": "lib"}],
            "conflicts": [{"dependency": "lib@2.0", "msg": "lib 2.0 broke the abi"}]
        },
        {
            "pkg": "lib",
            "versions": [{"version": "2.0"}, {"version": "1.9"}]
        },
    ]);
    let mut solver = solver_with(repo);
    solver.add_request(parse_spec_request("app").unwrap());
    let solution = solver.solve().unwrap();
    // lib@2.0 would be preferred by recency but is conflicted away
    assert_eq!(
        solution.get("lib").unwrap().spec.version(),
        &parse_version("1.9").unwrap()
    );
}

#[rstest]
fn test_backtracking_over_shared_dependency() {
    let repo = make_repo!([
        {
            "pkg": "liba",
            "versions": [{"version": "2.0"}, {"version": "1.0"}],
            "depends": [
                {"pkg": "libc", "range": "2:", "when": "2:"},
                {"pkg": "libc", "range": ":1", "when": ":1"}
            ]
        },
        {
            "pkg": "libb",
            "versions": [{"version": "1.0"}],
            "depends": [{"pkg": "libc", "range": ":1"}]
        },
        {
            "pkg": "libc",
            "versions": [{"version": "2.5"}, {"version": "1.5"}]
        },
    ]);
    let mut solver = solver_with(repo);
    solver.add_request(parse_spec_request("liba").unwrap());
    solver.add_request(parse_spec_request("libb").unwrap());
    let solution = solver.solve().unwrap();
    // liba@2.0 needs libc@2:, but libb forces libc@:1, so the
    // solver must step back to liba@1.0
    assert_eq!(
        solution.get("liba").unwrap().spec.version(),
        &parse_version("1.0").unwrap()
    );
    assert_eq!(
        solution.get("libc").unwrap().spec.version(),
        &parse_version("1.5").unwrap()
    );
}

#[rstest]
fn test_deprecated_versions_need_exact_pin() {
    let repo = make_repo!([
        {
            "pkg": "old",
            "versions": [{"version": "2.0", "deprecated": true}, {"version": "1.0"}]
        },
    ]);
    let mut solver = solver_with(repo);
    solver.add_request(parse_spec_request("old").unwrap());
    let solution = solver.solve().unwrap();
    assert_eq!(
        solution.get("old").unwrap().spec.version(),
        &parse_version("1.0").unwrap()
    );

    let mut solver = solver_with(make_repo!([
        {
            "pkg": "old",
            "versions": [{"version": "2.0", "deprecated": true}, {"version": "1.0"}]
        },
    ]));
    solver.add_request(parse_spec_request("old@=2.0").unwrap());
    let solution = solver.solve().unwrap();
    assert_eq!(
        solution.get("old").unwrap().spec.version(),
        &parse_version("2.0").unwrap()
    );
}

fn reusable_zlib(version: &str) -> Arc<Spec> {
    Arc::new(Spec::new(
        pkg_name!("zlib"),
        parse_version(version).unwrap(),
        Compiler::new(pkg_name!("gcc"), parse_version("9.4.0").unwrap()),
        Arch::new("linux", "centos7", "x86_64"),
        VariantMap::default(),
        Digest::default(),
    ))
}

fn zlib_repo() -> RepositoryHandle {
    make_repo!([
        {"pkg": "zlib", "versions": [{"version": "2.0"}, {"version": "1.0"}]},
    ])
}

#[rstest]
fn test_reuse_is_not_binding() {
    // a reusable zlib@1.0 exists, but the request admits 2.0 and
    // the default policy ranks version recency above reuse
    let mut config = test_config();
    config.reuse = true;
    let mut solver = Solver::new(config);
    solver.add_repository(zlib_repo());
    solver.add_reusable(reusable_zlib("1.0"));
    solver.add_request(parse_spec_request("zlib").unwrap());
    let solution = solver.solve().unwrap();
    let zlib = solution.get("zlib").unwrap();
    assert_eq!(zlib.source, PackageSource::Repository);
    assert_eq!(zlib.spec.version(), &parse_version("2.0").unwrap());
}

#[rstest]
fn test_reuse_breaks_ties_at_equal_version() {
    let mut config = test_config();
    config.reuse = true;
    let mut solver = Solver::new(config);
    solver.add_repository(zlib_repo());
    let reusable = reusable_zlib("2.0");
    solver.add_reusable(Arc::clone(&reusable));
    solver.add_request(parse_spec_request("zlib").unwrap());
    let solution = solver.solve().unwrap();
    let zlib = solution.get("zlib").unwrap();
    assert_eq!(zlib.source, PackageSource::Reused);
    assert_eq!(zlib.digest, reusable.dag_hash());
}

#[rstest]
fn test_reuse_first_policy_pins_older_version() {
    let mut config = test_config();
    config.reuse = true;
    config.criteria = vec![
        OptimizationCriterion::Reuse,
        OptimizationCriterion::NewestVersion,
        OptimizationCriterion::DefaultVariants,
        OptimizationCriterion::PreferredProvider,
        OptimizationCriterion::DefaultCompiler,
    ];
    let mut solver = Solver::new(config);
    solver.add_repository(zlib_repo());
    let reusable = reusable_zlib("1.0");
    solver.add_reusable(Arc::clone(&reusable));
    solver.add_request(parse_spec_request("zlib").unwrap());
    let solution = solver.solve().unwrap();
    let zlib = solution.get("zlib").unwrap();
    assert_eq!(zlib.source, PackageSource::Reused);
    assert_eq!(zlib.spec.version(), &parse_version("1.0").unwrap());
}

#[rstest]
fn test_reuse_respects_explicit_constraints() {
    // the reusable spec does not satisfy the request and must
    // not be chosen even under a reuse-first policy
    let mut config = test_config();
    config.reuse = true;
    config.criteria = vec![
        OptimizationCriterion::Reuse,
        OptimizationCriterion::NewestVersion,
    ];
    let mut solver = Solver::new(config);
    solver.add_repository(zlib_repo());
    solver.add_reusable(reusable_zlib("1.0"));
    solver.add_request(parse_spec_request("zlib@2:").unwrap());
    let solution = solver.solve().unwrap();
    let zlib = solution.get("zlib").unwrap();
    assert_eq!(zlib.source, PackageSource::Repository);
    assert_eq!(zlib.spec.version(), &parse_version("2.0").unwrap());
}

#[rstest]
fn test_all_facts_in_solve() {
    // every attr implied by the decoded specs must appear in the
    // raw answer set the backend returned
    let mut solver = solver_with(mpi_repo());
    solver.add_request(parse_spec_request("mpileaks+debug ^zmpi").unwrap());
    let (_, answer, solution) = solver.solve_full().unwrap();
    verify_answer_covers(&solution, &answer).unwrap();

    let mut config = test_config();
    config.reuse = true;
    let mut solver = Solver::new(config);
    solver.add_repository(zlib_repo());
    solver.add_reusable(reusable_zlib("2.0"));
    solver.add_request(parse_spec_request("zlib").unwrap());
    let (_, answer, solution) = solver.solve_full().unwrap();
    verify_answer_covers(&solution, &answer).unwrap();
}

#[rstest]
#[case("mpileaks ^mpich")]
#[case("mpileaks ^openmpi")]
#[case("mpileaks ^zmpi")]
fn test_concrete_spec_round_trips_through_text(#[case] request: &str) {
    let mut solver = solver_with(mpi_repo());
    solver.add_request(parse_spec_request(request).unwrap());
    let solution = solver.solve().unwrap();
    let spec = &solution.get("mpileaks").unwrap().spec;
    let reparsed = parse_spec_request(spec.to_string()).unwrap();
    let check = spec.satisfies(&reparsed);
    assert!(check.is_ok(), "{check}");
}

#[rstest]
fn test_step_limit_is_inconclusive() {
    let mut config = test_config();
    config.max_steps = 1;
    let mut solver = Solver::new(config);
    solver.add_repository(mpi_repo());
    solver.add_request(parse_spec_request("mpileaks").unwrap());
    match solver.solve() {
        Err(Error::FailedToResolve(report)) => assert!(report.inconclusive),
        other => panic!("expected a halted solve, got {other:?}"),
    }
}

#[rstest]
fn test_missing_package_is_a_setup_error() {
    let mut solver = solver_with(mpi_repo());
    solver.add_request(parse_spec_request("nosuchthing").unwrap());
    assert!(matches!(
        solver.solve(),
        Err(Error::PackageNotFound(name)) if name == "nosuchthing"
    ));
}

#[rstest]
fn test_no_compilers_is_a_setup_error() {
    let mut config = test_config();
    config.compilers.clear();
    let mut solver = Solver::new(config);
    solver.add_repository(mpi_repo());
    solver.add_request(parse_spec_request("mpileaks").unwrap());
    assert!(matches!(solver.solve(), Err(Error::NoCompilers)));
}

#[rstest]
fn test_empty_request_list_solves_to_nothing() {
    let solver = solver_with(mpi_repo());
    let solution = solver.solve().unwrap();
    assert!(solution.is_empty());
}
