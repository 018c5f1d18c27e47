//! # Command-Line Surface
//!
//! The `linhash` binary exposes one subcommand per engine operation:
//!
//! | Command | Description |
//! |---|---|
//! | `create NAME NATTRS NPAGES DEPTH CHOICEVEC` | Create a relation |
//! | `insert NAME` | Insert tuples read from standard input, one per line |
//! | `select NAME PATTERN` | Print tuples matching a partial-match pattern |
//! | `stats NAME` | Print global state and per-bucket fill |
//! | `drop NAME` | Remove the relation's files |
//!
//! `NAME` is a path stem: the relation's files are `NAME.info`,
//! `NAME.data` and `NAME.ovflow`. `CHOICEVEC` is a comma-separated list
//! of `attr:bit` pairs. `insert` echoes each tuple with the bucket it
//! landed in; `select` prints one matching tuple per line.
//!
//! The process exits 0 on success and 1 on any I/O or parse failure
//! (the binary maps the `eyre` error to an exit code). A failed `insert`
//! run still closes the relation so the tuples inserted before the
//! failure stay accounted for.

use std::io::Read;

use eyre::{bail, Result, WrapErr};

use crate::relation::{AccessMode, Relation};
use crate::storage::PageId;
use crate::tuple::{Pattern, Tuple};

/// Dispatches a parsed argument list (without the program name).
pub fn run(args: &[String]) -> Result<()> {
    let Some((command, rest)) = args.split_first() else {
        bail!("no command given");
    };
    match (command.as_str(), rest) {
        ("create", [name, nattrs, npages, depth, chvec]) => {
            let nattrs = parse_count(nattrs, "NATTRS")?;
            let npages = parse_count(npages, "NPAGES")?;
            let depth = parse_count(depth, "DEPTH")?;
            Relation::create(name, nattrs, npages, depth, chvec)
        }
        ("insert", [name]) => cmd_insert(name),
        ("select", [name, pattern]) => cmd_select(name, pattern),
        ("stats", [name]) => cmd_stats(name),
        ("drop", [name]) => Relation::remove(name),
        ("create" | "insert" | "select" | "stats" | "drop", _) => {
            bail!("wrong number of arguments for '{}'", command)
        }
        _ => bail!("unknown command '{}'", command),
    }
}

fn parse_count(arg: &str, what: &str) -> Result<u32> {
    arg.parse()
        .wrap_err_with(|| format!("{} must be a non-negative integer, got '{}'", what, arg))
}

fn cmd_insert(name: &str) -> Result<()> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .wrap_err("failed to read tuples from standard input")?;
    for (tuple, bucket) in insert_from(name, &input)? {
        println!("{} -> {}", tuple, bucket);
    }
    Ok(())
}

/// Inserts every non-empty line of `input` into the relation, returning
/// the bucket each tuple landed in. The relation is closed even when a
/// line fails, so earlier inserts are persisted either way.
pub(crate) fn insert_from(name: &str, input: &str) -> Result<Vec<(String, PageId)>> {
    let mut rel = Relation::open(name, AccessMode::ReadWrite)?;
    let mut placed = Vec::new();
    let mut outcome = Ok(());
    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match Tuple::parse(rel.nattrs(), line).and_then(|t| rel.insert(&t)) {
            Ok(bucket) => placed.push((line.to_string(), bucket)),
            Err(e) => {
                outcome = Err(e.wrap_err(format!("failed to insert '{}'", line)));
                break;
            }
        }
    }
    rel.close()?;
    outcome.map(|_| placed)
}

fn cmd_select(name: &str, pattern: &str) -> Result<()> {
    for tuple in select_all(name, pattern)? {
        println!("{}", tuple);
    }
    Ok(())
}

pub(crate) fn select_all(name: &str, pattern: &str) -> Result<Vec<String>> {
    let mut rel = Relation::open(name, AccessMode::ReadOnly)?;
    let pattern = Pattern::parse(rel.nattrs(), pattern)?;
    let mut out = Vec::new();
    let mut scan = rel.select(&pattern)?;
    while let Some(tuple) = scan.next_tuple()? {
        out.push(tuple.as_str().to_string());
    }
    Ok(out)
}

fn cmd_stats(name: &str) -> Result<()> {
    let mut rel = Relation::open(name, AccessMode::ReadOnly)?;
    print!("{}", rel.stats()?);
    Ok(())
}

pub fn usage() -> String {
    r#"linhash - multi-attribute linear-hashed file storage

USAGE:
    linhash <COMMAND> [ARGS]

COMMANDS:
    create NAME NATTRS NPAGES DEPTH CHOICEVEC
        Create relation NAME with NATTRS attributes per tuple, NPAGES
        initial buckets (must equal 2^DEPTH) and a choice vector of
        comma-separated attr:bit pairs, e.g. 0:0,1:0,0:1

    insert NAME
        Read tuples from standard input, one comma-separated tuple per
        line, and report the bucket each lands in

    select NAME PATTERN
        Print all tuples matching PATTERN; use ? for any attribute whose
        value is unknown, e.g. '?,smith,?'

    stats NAME
        Show relation metadata and per-bucket page fill

    drop NAME
        Remove the relation's files

OPTIONS:
    -h, --help         Print help information
    -v, --version      Print version information"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn unknown_commands_are_rejected() {
        assert!(run(&args(&["vacuum", "x"])).is_err());
        assert!(run(&[]).is_err());
        assert!(run(&args(&["create", "x"])).is_err());
    }

    #[test]
    fn create_insert_select_drop_round_trip() {
        let dir = tempdir().unwrap();
        let name = dir.path().join("emps").to_string_lossy().into_owned();

        run(&args(&[
            "create",
            &name,
            "3",
            "2",
            "1",
            "0:0,1:0,2:0,0:1,1:1,2:1",
        ]))
        .unwrap();

        let placed = insert_from(&name, "1,alice,dev\n2,bob,ops\n\n3,carol,dev\n").unwrap();
        assert_eq!(placed.len(), 3);

        let mut everyone = select_all(&name, "?,?,?").unwrap();
        everyone.sort();
        assert_eq!(everyone, vec!["1,alice,dev", "2,bob,ops", "3,carol,dev"]);

        let devs = select_all(&name, "?,?,dev").unwrap();
        assert_eq!(devs.len(), 2);

        run(&args(&["drop", &name])).unwrap();
        assert!(select_all(&name, "?,?,?").is_err());
    }

    #[test]
    fn insert_failure_keeps_earlier_tuples() {
        let dir = tempdir().unwrap();
        let name = dir.path().join("emps").to_string_lossy().into_owned();
        run(&args(&["create", &name, "2", "1", "0", "0:0,1:0"])).unwrap();

        // second line has the wrong arity
        assert!(insert_from(&name, "1,alice\n2,bob,extra\n3,carol\n").is_err());

        let mut stored = select_all(&name, "?,?").unwrap();
        stored.sort();
        assert_eq!(stored, vec!["1,alice"]);
    }

    #[test]
    fn create_validates_numeric_arguments() {
        let dir = tempdir().unwrap();
        let name = dir.path().join("emps").to_string_lossy().into_owned();
        assert!(run(&args(&["create", &name, "two", "1", "0", "0:0"])).is_err());
        assert!(run(&args(&["create", &name, "2", "1", "-1", "0:0"])).is_err());
    }
}
