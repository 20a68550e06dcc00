use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dscexec")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Run declarative configuration through a DSC resource provider", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config directory (overrides DSCEXEC_CONFIG_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Find a usable provider executable
    Locate(LocateArgs),

    /// Read the current state of a resource
    Get(ResourceArgs),

    /// Test a resource against desired settings
    Test(ResourceArgs),

    /// Apply desired settings to a resource
    Set(ResourceArgs),

    /// Show what the provider knows about a resource type
    Details(DetailsArgs),

    /// Apply a configuration set file
    Apply(ApplyArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Locate
// ============================================================================

#[derive(Args)]
pub struct LocateArgs {
    /// Run the configured install commands when no usable provider is found
    #[arg(long)]
    pub install: bool,

    /// Installation root to scan instead of the platform default
    #[arg(long, value_name = "DIR")]
    pub install_root: Option<PathBuf>,
}

// ============================================================================
// Resource operations
// ============================================================================

#[derive(Args)]
pub struct ResourceArgs {
    /// Resource type (e.g. Microsoft.Windows/Registry)
    pub resource_type: String,

    /// Settings as a JSON object
    #[arg(short, long, value_name = "JSON", conflicts_with = "file")]
    pub input: Option<String>,

    /// Read settings from a JSON or TOML file
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Provider executable to use
    #[arg(long, value_name = "PATH")]
    pub executable: Option<PathBuf>,

    /// Print the raw result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct DetailsArgs {
    /// Resource type
    pub resource_type: String,

    /// How much to load
    #[arg(short, long, value_enum, default_value = "local")]
    pub level: DetailLevelArg,

    /// Provider executable to use
    #[arg(long, value_name = "PATH")]
    pub executable: Option<PathBuf>,

    /// Print details as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DetailLevelArg {
    /// Discovery only
    Local,
    /// Catalog information
    Catalog,
    /// Download information
    Download,
    /// Include the property schema
    Load,
}

// ============================================================================
// Apply
// ============================================================================

#[derive(Args)]
pub struct ApplyArgs {
    /// Configuration set file (.json or .toml)
    pub file: PathBuf,

    /// Preview changes without applying
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Parallel jobs for reading and testing
    #[arg(short, long, default_value = "4")]
    pub jobs: u16,

    /// Apply without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Only allow the units of this file, each once
    #[arg(long)]
    pub limit: bool,

    /// Provider executable to use
    #[arg(long, value_name = "PATH")]
    pub executable: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}
