use anyhow::Result;
use clap::{Parser, Subcommand};
use odb::areas::repository::Repository;
use odb::artifacts::objects::object_type::ObjectType;
use odb::commands::plumbing::cat_file::CatFileOptions;
use odb::commands::plumbing::hash_object::HashInput;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "odb",
    version = "0.1.0",
    author = "Sami Barbut-Dica",
    about = "Read and write git loose objects",
    long_about = "This tool reads and writes the loose objects of a git repository. \
    It understands blobs, trees and commits in their on-disk format, \
    and can create an empty repository to store them in.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Create an empty repository",
        long_about = "This command creates an empty repository in the current directory or at the specified path."
    )]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<PathBuf>,
        #[arg(long, help = "Create a bare repository")]
        bare: bool,
    },
    #[command(
        name = "cat-file",
        about = "Print the type, size or content of an object",
        long_about = "This command prints information about an object in the repository. \
        The object may be named by an abbreviated hash of at least two characters."
    )]
    CatFile {
        #[arg(short = 't', help = "Print the object type")]
        show_type: bool,
        #[arg(short = 's', help = "Print the object size")]
        show_size: bool,
        #[arg(short = 'p', help = "Print the object content, trees as text")]
        pretty_print: bool,
        #[arg(index = 1, help = "The object hash")]
        hash: String,
    },
    #[command(
        name = "hash-object",
        about = "Hash an object and optionally write it to the object database",
        long_about = "This command computes the object ID of a file or of standard input \
        and can write the object to the object database. Tree content is read as text lines."
    )]
    HashObject {
        #[arg(short, long, help = "Write the object to the object database")]
        write: bool,
        #[arg(short = 't', default_value = "blob", help = "The object type")]
        object_type: ObjectType,
        #[arg(long, conflicts_with = "file", help = "Read the object from standard input")]
        stdin: bool,
        #[arg(index = 1, required_unless_present = "stdin")]
        file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let pwd = std::env::current_dir()?;

    match cli.command {
        Commands::Init { path, bare } => {
            let root = path.unwrap_or(pwd);
            Repository::init(&root, bare, Box::new(std::io::stdout()))?;
        }
        Commands::CatFile {
            show_type,
            show_size,
            pretty_print,
            hash,
        } => {
            let repository = Repository::open(&pwd, Box::new(std::io::stdout()))?;
            let options = CatFileOptions {
                show_type,
                show_size,
                pretty_print,
            };

            repository.cat_file(&hash, options)?
        }
        Commands::HashObject {
            write,
            object_type,
            stdin,
            file,
        } => {
            let repository = Repository::open(&pwd, Box::new(std::io::stdout()))?;
            let input = match file {
                Some(file) if !stdin => HashInput::file(&file)?,
                _ => HashInput::stdin(),
            };

            repository.hash_object(input, object_type, write)?
        }
    }

    Ok(())
}
