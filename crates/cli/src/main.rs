use clap::{Parser, Subcommand};
use idmint_core::{
    constants::DEFAULT_DATA_DIR, mint::mint, CoreConfig, IdentifierStore, IdentifierUse, SetName,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "idmint")]
#[command(about = "Identifier authority: mint and look up error-resistant barcodes")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Mint new identifiers in an existing set
    Mint {
        /// Identifier set to mint into
        set_name: String,
        /// Number of new identifiers to mint
        count: usize,
        /// Suppress printing of new identifiers to stdout
        #[arg(long, short)]
        quiet: bool,
    },
    /// Look up an identifier by UUID or barcode
    Lookup {
        /// Full UUID or barcode
        id: String,
    },
    /// Correct the barcode of an existing identifier
    Correct {
        /// UUID of the identifier to correct
        uuid: String,
        /// The corrected barcode
        barcode: String,
    },
    /// Manage identifier sets
    Set {
        #[command(subcommand)]
        command: SetCommands,
    },
}

#[derive(Subcommand)]
enum SetCommands {
    /// List identifier sets
    Ls,
    /// Create (or update) an identifier set
    Create {
        /// Set name
        name: String,
        /// What the identifiers in this set will label
        /// (sample, collection, clia, kit, test-strip)
        #[arg(long = "use")]
        use_kind: String,
        /// Free-text description
        #[arg(long)]
        description: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let data_dir = std::env::var("IDMINT_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());
    let cfg = Arc::new(CoreConfig::with_defaults(PathBuf::from(data_dir))?);
    let store = IdentifierStore::open(cfg)?;

    match cli.command {
        Some(Commands::Mint {
            set_name,
            count,
            quiet,
        }) => {
            let set_name = SetName::new(&set_name)?;
            match mint(&store, &set_name, count, || Uuid::new_v4()) {
                Ok(batch) => {
                    if !quiet {
                        for identifier in &batch.identifiers {
                            println!("{}\t{}", identifier.barcode, identifier.uuid);
                        }
                    }
                    eprintln!(
                        "Minted {} identifiers with {} retries in {:.3}s \
                         (failures per slot: mean {:.2}, median {:.1}, max {})",
                        batch.identifiers.len(),
                        batch.stats.retries,
                        batch.stats.elapsed_seconds,
                        batch.stats.mean_failures_per_slot,
                        batch.stats.median_failures_per_slot,
                        batch.stats.max_failures_per_slot,
                    );
                }
                Err(e) => eprintln!("Error minting identifiers: {e}"),
            }
        }
        Some(Commands::Lookup { id }) => match store.lookup(&id) {
            Ok(record) => {
                println!("uuid:      {}", record.uuid);
                println!("barcode:   {}", record.barcode);
                println!("generated: {}", record.generated);
                println!("set:       {} ({})", record.set_name, record.set_use);
            }
            Err(e) => eprintln!("Error looking up identifier: {e}"),
        },
        Some(Commands::Correct { uuid, barcode }) => {
            let uuid = Uuid::from_str(&uuid)?;
            let barcode = idmint_core::Barcode::from_str(&barcode)?;
            match store.correct_barcode(&uuid, barcode) {
                Ok(identifier) => {
                    println!("Corrected {} to {}", identifier.uuid, identifier.barcode)
                }
                Err(e) => eprintln!("Error correcting barcode: {e}"),
            }
        }
        Some(Commands::Set { command }) => match command {
            SetCommands::Ls => match store.sets() {
                Ok(sets) if sets.is_empty() => println!("No identifier sets."),
                Ok(sets) => {
                    for set in sets {
                        println!(
                            "{}\t{}\t{}",
                            set.name,
                            set.use_kind,
                            set.description.as_deref().unwrap_or("")
                        );
                    }
                }
                Err(e) => eprintln!("Error listing identifier sets: {e}"),
            },
            SetCommands::Create {
                name,
                use_kind,
                description,
            } => {
                let name = SetName::new(&name)?;
                let use_kind = IdentifierUse::from_str(&use_kind)?;
                match store.create_set(&name, use_kind, description) {
                    Ok((set, true)) => println!("Created identifier set: {}", set.name),
                    Ok((set, false)) => println!("Updated identifier set: {}", set.name),
                    Err(e) => eprintln!("Error creating identifier set: {e}"),
                }
            }
        },
        None => {
            println!("Use 'idmint --help' for commands");
        }
    }

    Ok(())
}
