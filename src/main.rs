use clap::{Args, Parser, Subcommand};

use mcflow::config::{resolve_remote_settings, DEFAULT_MCURL};
use mcflow::display::{render_workflow, render_worksheets};
use mcflow::materialize::Materializer;
use mcflow::sheet::{validate_files_exist, LoadOutcome, Loader};
use mcflow::workflow::build_workflow;
use mcflow_client::{McApi, McClient};

/// Load Materials Commons experiment spreadsheets and materialize their
/// workflows through the Materials Commons API.
#[derive(Parser, Debug)]
#[command(name = "mcflow", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct SheetArgs {
    /// Comma-separated paths to the excel spreadsheets
    #[arg(short = 'f', long = "files", value_delimiter = ',', required = true)]
    files: Vec<String>,

    /// Number of rows to skip before the header row
    #[arg(short = 'r', long = "header-row", default_value_t = 0)]
    header_row: usize,

    /// Treat column 2 as the parent worksheet column
    #[arg(short = 't', long = "has-parent", default_value_t = false)]
    has_parent: bool,
}

#[derive(Args, Debug)]
struct RemoteArgs {
    /// Base URL of the API service
    #[arg(short = 'u', long = "mcurl", default_value = DEFAULT_MCURL)]
    mcurl: String,

    /// API key to pass in REST calls
    #[arg(short = 'k', long = "apikey", default_value = "")]
    apikey: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the spreadsheets and print the parsed worksheets and
    /// workflow. No ETL is performed.
    Display {
        #[command(flatten)]
        sheets: SheetArgs,
    },

    /// Check the spreadsheets for errors and report all of them. With a
    /// project and API key, also verify that referenced files exist in the
    /// project. No ETL is performed.
    Check {
        #[command(flatten)]
        sheets: SheetArgs,

        #[command(flatten)]
        remote: RemoteArgs,

        /// Project to check file references against
        #[arg(short = 'p', long = "project-id", default_value = "")]
        project_id: String,
    },

    /// Load the spreadsheets and create the workflow on the server.
    Load {
        #[command(flatten)]
        sheets: SheetArgs,

        #[command(flatten)]
        remote: RemoteArgs,

        /// Project to create the experiment in
        #[arg(short = 'p', long = "project-id", default_value = "")]
        project_id: String,

        /// Create a project with this name when no project id is given
        #[arg(short = 'm', long = "project-name", default_value = "")]
        project_name: String,

        /// Name of the experiment to create
        #[arg(short = 'n', long = "experiment-name", required = true)]
        experiment_name: String,

        /// Project directory prepended to file references
        #[arg(short = 'd', long = "project-base-dir", default_value = "")]
        project_base_dir: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Display { sheets } => cmd_display(&sheets),
        Commands::Check {
            sheets,
            remote,
            project_id,
        } => cmd_check(&sheets, &remote, &project_id).await,
        Commands::Load {
            sheets,
            remote,
            project_id,
            project_name,
            experiment_name,
            project_base_dir,
        } => {
            cmd_load(
                &sheets,
                &remote,
                &project_id,
                &project_name,
                &experiment_name,
                &project_base_dir,
            )
            .await
        }
    };
    std::process::exit(code);
}

/// Load the spreadsheets and print every diagnostic. Returns the outcome
/// only when there were no errors.
fn load_sheets(args: &SheetArgs) -> Result<LoadOutcome, i32> {
    let loader = Loader::new(args.has_parent, args.header_row, args.files.clone());
    let outcome = match loader.load() {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("{}", e);
            return Err(1);
        }
    };

    for diagnostic in outcome.report.diagnostics() {
        eprintln!("  {}", diagnostic);
    }
    if outcome.report.error_or_none().is_some() {
        eprintln!("Loading spreadsheet failed");
        return Err(1);
    }
    Ok(outcome)
}

fn cmd_display(sheets: &SheetArgs) -> i32 {
    let outcome = match load_sheets(sheets) {
        Ok(outcome) => outcome,
        Err(code) => return code,
    };
    print!("{}", render_worksheets(&outcome.worksheets));
    let workflow = build_workflow(&outcome.worksheets, sheets.has_parent);
    print!("{}", render_workflow(&workflow));
    0
}

async fn cmd_check(sheets: &SheetArgs, remote: &RemoteArgs, project_id: &str) -> i32 {
    let outcome = match load_sheets(sheets) {
        Ok(outcome) => outcome,
        Err(code) => return code,
    };

    let settings = resolve_remote_settings(&remote.mcurl, &remote.apikey);
    if project_id.is_empty() || settings.apikey.is_empty() {
        return 0;
    }

    let client = match McClient::new(&settings.mcurl, &settings.apikey) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{}", e);
            return 1;
        }
    };

    let report = validate_files_exist(&outcome.worksheets, project_id, &client).await;
    for diagnostic in report.diagnostics() {
        eprintln!("  {}", diagnostic);
    }
    if report.is_empty() {
        0
    } else {
        1
    }
}

async fn cmd_load(
    sheets: &SheetArgs,
    remote: &RemoteArgs,
    project_id: &str,
    project_name: &str,
    experiment_name: &str,
    project_base_dir: &str,
) -> i32 {
    let outcome = match load_sheets(sheets) {
        Ok(outcome) => outcome,
        Err(code) => return code,
    };

    let settings = resolve_remote_settings(&remote.mcurl, &remote.apikey);
    let client = match McClient::new(&settings.mcurl, &settings.apikey) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{}", e);
            return 1;
        }
    };

    let project_id = if project_id.is_empty() {
        if project_name.is_empty() {
            eprintln!("either a project id or a project name is required");
            return 1;
        }
        match client.create_project(project_name, "").await {
            Ok(project) => project.id,
            Err(e) => {
                eprintln!("{}", e);
                return 1;
            }
        }
    } else {
        project_id.to_string()
    };

    let workflow = build_workflow(&outcome.worksheets, sheets.has_parent);
    let mut materializer = Materializer::new(
        &client,
        project_id,
        experiment_name,
        "",
        project_base_dir,
    );

    match materializer.run(&workflow).await {
        Ok(summary) => {
            println!("Created experiment {}", summary.experiment_id);
            for (operation, count) in &summary.call_counts {
                println!("  {}: {}", operation, count);
            }
            0
        }
        Err(e) => {
            eprintln!("{}", e);
            1
        }
    }
}
