use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use folio::build::{build_site, load_site, Site};
use folio::config::Config;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

/// Builds the post registry, tag index and RSS feed of a static blog.
#[derive(Parser, Debug)]
#[command(name = "folio", author, version, about)]
struct Cli {
    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the site and write the feed.
    Build(ProjectArgs),

    /// List posts newest first.
    List {
        #[command(flatten)]
        project: ProjectArgs,

        /// Only list posts with this tag.
        #[arg(long)]
        tag: Option<String>,
    },

    /// List every tag with its post count.
    Tags(ProjectArgs),
}

#[derive(Args, Debug)]
struct ProjectArgs {
    /// A directory inside the project; `folio.yaml` is searched for here and
    /// in its parents.
    #[arg(short, long, default_value = ".")]
    project: PathBuf,

    /// The output directory.
    #[arg(short, long, default_value = "_site")]
    output: PathBuf,

    /// How many threads extract posts. Defaults to the project file's
    /// setting, then to the number of CPUs.
    #[arg(short, long)]
    threads: Option<usize>,
}

impl ProjectArgs {
    fn config(&self) -> Result<Config> {
        let config = Config::from_directory(&self.project, &self.output, self.threads)?;
        debug!(?config, "loaded configuration");
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    // Captured once: display dates are relative to the year the build ran.
    let today = chrono::Local::now().date_naive();

    match command {
        Command::Build(args) => {
            build_site(&args.config()?, today)?;
        }
        Command::List { project, tag } => {
            let site = load_site(&project.config()?, today)?;
            let posts = match &tag {
                Some(tag) => site.registry.by_tag(tag),
                None => site.registry.all(),
            };
            for post in posts {
                print_post(&site, post);
            }
        }
        Command::Tags(args) => {
            let site = load_site(&args.config()?, today)?;
            let index = site.tag_index();
            for tag in index.tags() {
                println!("{:>4}  {}", index.count_for(tag), tag);
            }
        }
    }
    Ok(())
}

fn print_post(site: &Site, post: &folio::post::Post) {
    println!(
        "{:<14} {:<32} {}",
        site.display_date(post),
        post.path(),
        post.title()
    );
}
