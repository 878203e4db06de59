use std::path::{
    Path,
    PathBuf,
};

use clap::{
    Parser,
    Subcommand,
};
use esp_partition_table_tool::{
    parse_size,
    table_digest,
    DecodeOptions,
    PartitionTable,
    PartitionTableFiles,
    TABLE_LENGTH,
};

#[derive(Parser)]
#[command(name = "esp-partition-table-tool")]
#[command(about = "ESP partition table generator and parser", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate partition table binary from CSV file
    Generate {
        /// Input CSV file path
        input: PathBuf,

        /// Output binary file path
        output: PathBuf,

        /// Skip the check for duplicate names and overlapping partitions
        #[arg(long)]
        no_verify: bool,
    },
    /// Parse partition table binary to CSV file
    Parse {
        /// Input binary file path
        input: PathBuf,

        /// Output CSV file path
        output: PathBuf,

        #[command(flatten)]
        read: ReadArgs,
    },
    /// Print the partitions of a partition table binary
    Show {
        /// Input binary file path
        input: PathBuf,

        #[command(flatten)]
        read: ReadArgs,
    },
}

#[derive(clap::Args)]
struct ReadArgs {
    /// Position of the table in the input file, e.g. 0x8000 for a full flash dump
    #[arg(short, long, value_parser = parse_offset, default_value = "0")]
    offset: usize,

    /// Reject entries without the 0xAA 0x50 magic bytes
    #[arg(long)]
    strict_magic: bool,
}

impl ReadArgs {
    fn load(&self, input: &Path) -> Result<PartitionTable, esp_partition_table_tool::Error> {
        let options = DecodeOptions {
            strict_magic: self.strict_magic,
        };
        PartitionTable::parse_partition_file(input, self.offset, options)
    }
}

fn parse_offset(s: &str) -> Result<usize, String> {
    parse_size(s)
        .and_then(|offset| usize::try_from(offset).ok())
        .ok_or_else(|| format!("invalid offset: {s}"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            input,
            output,
            no_verify,
        } => {
            println!("Parsing CSV file: {}", input.display());
            let table = PartitionTable::from_csv_file(&input)?;
            println!("Found {} partitions", table.len());

            if !no_verify {
                table.validate()?;
            }

            println!("Generating partition table binary...");
            table.generate_partition_file(&output)?;

            println!("Successfully generated partition table: {}", output.display());
            println!("Size: {} bytes", TABLE_LENGTH);

            Ok(())
        }
        Commands::Parse {
            input,
            output,
            read,
        } => {
            println!("Parsing binary file: {}", input.display());
            let table = read.load(&input)?;
            println!("Found {} partitions", table.len());

            println!("Writing CSV file...");
            table.to_csv_file(&output)?;

            println!(
                "Successfully parsed partition table to: {}",
                output.display()
            );

            Ok(())
        }
        Commands::Show { input, read } => {
            let table = read.load(&input)?;

            println!(
                "{:<16} {:<4} {:<8} {:<10} {:<10}",
                "Name", "Type", "SubType", "Offset", "Size"
            );
            for partition in &table {
                println!("{partition}");
            }
            println!("MD5: {}", hex::encode(table_digest(&table)?));

            Ok(())
        }
    }
}
