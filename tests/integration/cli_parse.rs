//! Command-line argument contracts

use arbor::tooling::cli::{Cli, Commands};
use arbor::tree::LinkStrategy;
use clap::{CommandFactory, Parser};

#[test]
fn parse_valid_command_matrix() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["arbor", "import", "export.txt"],
        vec!["arbor", "import", "export.txt", "--name", "docs", "--batch-size", "100"],
        vec!["arbor", "import", "export.txt", "--resume", "42", "--strategy", "post-hoc"],
        vec!["arbor", "import", "export.txt", "--dry-run", "--format", "json"],
        vec!["arbor", "parse", "export.txt", "--format", "json"],
        vec!["arbor", "show", "7"],
        vec!["arbor", "list"],
        vec!["arbor", "check", "7", "--repair"],
        vec!["arbor", "delete", "7"],
        vec!["arbor", "--workspace", "/tmp", "--log-level", "debug", "list"],
    ];

    for args in cases {
        let parsed = Cli::try_parse_from(args.clone());
        assert!(parsed.is_ok(), "expected valid parse for args: {args:?}");
    }
}

#[test]
fn import_flags_are_typed() {
    let cli = Cli::try_parse_from([
        "arbor", "import", "x.txt", "--resume", "9", "--strategy", "post-hoc",
    ])
    .unwrap();
    match cli.command {
        Commands::Import {
            resume, strategy, ..
        } => {
            assert_eq!(resume, Some(9));
            assert_eq!(strategy, Some(LinkStrategy::PostHoc));
        }
        _ => panic!("expected import"),
    }
}

#[test]
fn parse_rejects_bad_values() {
    assert!(Cli::try_parse_from(["arbor", "import", "x.txt", "--strategy", "sideways"]).is_err());
    assert!(Cli::try_parse_from(["arbor", "show", "not-a-number"]).is_err());
    assert!(Cli::try_parse_from(["arbor", "import"]).is_err());
}

#[test]
fn command_definition_is_consistent() {
    Cli::command().debug_assert();
}
