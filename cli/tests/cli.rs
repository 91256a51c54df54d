#![allow(clippy::panic_in_result_fn)]

use anyhow::Result;
use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;

const TURTLE: &str = "@prefix ex: <http://example.com/> .\nex:s ex:p \"hello\"@en .\n";
const NTRIPLES: &str = "<http://example.com/s> <http://example.com/p> \"hello\"@en .\n";

fn cli_command() -> Result<Command> {
    Ok(Command::cargo_bin("rdf-formatter")?)
}

#[test]
fn cli_help() -> Result<()> {
    cli_command()?
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Extension\tMimetype"))
        .stdout(predicate::str::contains(".ttl\t\ttext/turtle"))
        .stdout(predicate::str::contains(".html\t\ttext/html"));
    Ok(())
}

#[test]
fn cli_convert_standard_streams() -> Result<()> {
    cli_command()?
        .args(["-i", "text/turtle", "-o", "nt", "-", "-"])
        .write_stdin(TURTLE)
        .assert()
        .success()
        .stdout(NTRIPLES);
    Ok(())
}

#[test]
fn cli_standard_input_requires_type() -> Result<()> {
    cli_command()?
        .args(["-", "out.nt"])
        .write_stdin(TURTLE)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Unable to determine mimetype of input file based on extension",
        ));
    Ok(())
}

#[test]
fn cli_convert_files() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.child("data.ttl");
    input.write_str(TURTLE)?;
    let output = dir.child("data.nq");
    cli_command()?
        .arg(input.path())
        .arg(output.path())
        .assert()
        .success();
    output.assert(NTRIPLES);
    Ok(())
}

#[test]
fn cli_convert_to_pretty_json_ld() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.child("data.nt");
    input.write_str(NTRIPLES)?;
    let output = dir.child("data.jsonld");
    cli_command()?
        .arg(input.path())
        .arg(output.path())
        .args(["--pretty", "--jsonld-shape", "flattened"])
        .assert()
        .success();
    output.assert(predicate::str::contains("\"@language\": \"en\""));
    Ok(())
}

#[test]
fn cli_html_is_not_an_output_format() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.child("data.ttl");
    input.write_str(TURTLE)?;
    let output = dir.child("data.html");
    cli_command()?
        .arg(input.path())
        .arg(output.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "text/html (RDFa) is not supported as an output format",
        ));
    output.assert(predicate::path::missing());
    Ok(())
}

#[test]
fn cli_unknown_extension() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.child("data.txt");
    input.write_str(TURTLE)?;
    cli_command()?
        .arg(input.path())
        .arg(dir.child("data.nt").path())
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Unable to determine mimetype of input file based on extension",
        ));
    Ok(())
}

#[test]
fn cli_unknown_media_type() -> Result<()> {
    cli_command()?
        .args(["-i", "text/csv", "-o", "nt", "-", "-"])
        .write_stdin(TURTLE)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported mimetype text/csv"));
    Ok(())
}

#[test]
fn cli_prefixes() -> Result<()> {
    let dir = TempDir::new()?;
    let prefixes = dir.child("prefixes.json");
    prefixes.write_str(r#"{"ex": "http://example.org/", "foo": "http://foo.com/"}"#)?;
    cli_command()?
        .args(["-i", "nt", "-o", "ttl", "-", "-", "--prefixes"])
        .arg(prefixes.path())
        .args(["--ns", "ex=http://example.com/"])
        .write_stdin(NTRIPLES)
        .assert()
        .success()
        .stdout(predicate::str::contains("@prefix ex: <http://example.com/> ."))
        .stdout(predicate::str::contains("ex:s ex:p \"hello\"@en ."));
    Ok(())
}

#[test]
fn cli_invalid_namespace_flag() -> Result<()> {
    cli_command()?
        .args(["-i", "nt", "-o", "ttl", "-", "-", "--ns", "ex"])
        .write_stdin(NTRIPLES)
        .assert()
        .failure()
        .stderr(predicate::str::contains("PREFIX=IRI"));
    Ok(())
}

#[test]
fn cli_syntax_error() -> Result<()> {
    cli_command()?
        .args(["-i", "ttl", "-o", "nt", "-", "-"])
        .write_stdin("@prefix ex: <http://example.com/> .\nex:s ex:p .\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to convert"));
    Ok(())
}

#[test]
fn cli_base_iri() -> Result<()> {
    cli_command()?
        .args(["-i", "ttl", "-o", "nt", "--base", "http://example.com/", "-", "-"])
        .write_stdin("<s> <p> <o> .")
        .assert()
        .success()
        .stdout("<http://example.com/s> <http://example.com/p> <http://example.com/o> .\n");
    Ok(())
}
