//! A simple CLI that turns judge contest results into a grading report.

#![warn(clippy::all, clippy::pedantic)]

extern crate grader_common;
use grader_common::classify::ContestClassifier;
use grader_common::client_api::{
    Client, build_client, get_contests, get_sheet_csv, get_submissions,
};
use grader_common::gradebook::Gradebook;
use grader_common::report::Report;
use grader_common::roster::Roster;
use grader_common::team::{merge_team_credit, read_team_rows};
use grader_common::{
    CLIENT_VERSION, COURSE_CODE, DEFAULT_OUTPUT_PATH, DEFAULT_TITLE_FILTER, JUDGE_BASE_URL,
    MOCK_EXAM_MARKER, ROSTER_SHEET, SheetRef, TeamSheet,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The base URL of the judge
    #[arg(long, default_value = JUDGE_BASE_URL, env = "GRADER_JUDGE_BASE")]
    judge_base: String,

    /// Only contests whose title contains this are graded
    #[arg(long, default_value = DEFAULT_TITLE_FILTER, env = "GRADER_TITLE_FILTER")]
    title_filter: String,

    /// Course code that marks a contest as part of the course
    #[arg(long, default_value = COURSE_CODE, env = "GRADER_COURSE_CODE")]
    course_code: String,

    /// Contests with this in their title are team mock exams
    #[arg(long, default_value = MOCK_EXAM_MARKER, env = "GRADER_MOCK_MARKER")]
    mock_marker: String,

    /// Registration sheet with handle and nusp columns, as DOC_ID:SHEET_ID
    #[arg(long, default_value_t = SheetRef::from(ROSTER_SHEET), env = "GRADER_ROSTER_SHEET")]
    roster_sheet: SheetRef,

    /// Team sheet and the contest it applies to, as DOC_ID:SHEET_ID=CONTEST (repeatable)
    #[arg(long = "team-sheet", default_values_t = TeamSheet::defaults())]
    team_sheets: Vec<TeamSheet>,

    /// Where to write the report
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH, env = "GRADER_OUTPUT")]
    output: PathBuf,

    /// Suppress progress output
    #[arg(short, long, env = "GRADER_QUIET")]
    quiet: bool,

    /// Show additional output
    #[arg(short, long, env = "GRADER_VERBOSE")]
    verbose: bool,
}

/// Fetch every contest and record its accepted submissions.
fn collect_contests(cli: &Cli, client: &Client) -> Result<Gradebook> {
    let contests = get_contests(client, &cli.judge_base, &cli.title_filter)
        .context("Failed to list contests")?;
    info!("Found {} contests matching {:?}", contests.len(), cli.title_filter);

    let mut gradebook = Gradebook::new();
    for contest in contests {
        if !cli.quiet {
            println!("{} - {}/contest/{}", contest.name, cli.judge_base, contest.id);
        }
        let submissions = get_submissions(client, &cli.judge_base, contest.id)
            .with_context(|| format!("Failed to fetch submissions of {}", contest.name))?;

        if cli.verbose {
            let accepted: usize = submissions.values().map(BTreeSet::len).sum();
            println!(
                "  {} handles, {} accepted problems",
                submissions.len(),
                accepted
            );
        }
        gradebook.add_contest(&contest.name, submissions);
    }
    Ok(gradebook)
}

fn run(cli: &Cli) -> Result<()> {
    let client = build_client()?;

    // Contest results
    let mut gradebook = collect_contests(cli, &client)?;

    // Registered handles
    let roster_csv = get_sheet_csv(&client, &cli.roster_sheet)
        .with_context(|| format!("Failed to download roster sheet {}", cli.roster_sheet))?;
    let (roster, _) = Roster::from_csv(roster_csv.as_bytes()).context("Failed to read roster")?;
    roster.check_participation(&gradebook);
    info!("Roster has {} registered IDs", roster.len());

    // Team credit
    for team_sheet in &cli.team_sheets {
        let team_csv = get_sheet_csv(&client, &team_sheet.sheet)
            .with_context(|| format!("Failed to download team sheet {}", team_sheet.sheet))?;
        let (rows, _) = read_team_rows(team_csv.as_bytes())
            .with_context(|| format!("Failed to read team sheet {}", team_sheet.sheet))?;
        let warnings = merge_team_credit(&rows, &team_sheet.contest, &roster, &mut gradebook);
        if cli.verbose {
            println!(
                "{}: {} teams, {} warnings",
                team_sheet.contest,
                rows.len(),
                warnings.len()
            );
        }
    }

    // Report
    let classifier = ContestClassifier::new(&cli.course_code, &cli.mock_marker);
    let report = Report::build(&gradebook, &roster, &classifier);
    let file = File::create(&cli.output)
        .with_context(|| format!("Failed to create {}", cli.output.display()))?;
    report.write_csv(BufWriter::new(file))?;

    if !cli.quiet {
        println!(
            "Wrote {} rows and {} contests to {}",
            report.rows.len(),
            report.columns.len(),
            cli.output.display()
        );
    }
    Ok(())
}

fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Set up logger, warnings are part of the normal output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if !cli.quiet {
        println!("Grader Client v{CLIENT_VERSION} started.");
    }
    if cli.verbose {
        println!("CLI Inputs: {cli:?}");
    }

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
