use clap::{Args, Subcommand};

#[derive(Subcommand)]
pub enum Commands {
    /// Print the SQL and arguments a model compiles to
    Compile(ModelArgs),
    /// Run a model and print its rows
    Run(ModelArgs),
    /// Count every row a model matches
    Count(ModelArgs),
    /// Run a model and print one page of rows with the total
    List(ListArgs),
    /// List the model IDs in the catalog
    Models,
    /// Open a catalog connection and probe it
    TestConn {
        #[arg(long, help = "Connection ID from the catalog")]
        conn: String,
    },
    /// Inspect the schema behind a catalog connection
    Source {
        #[command(subcommand)]
        command: SourceCommand,
    },
}

#[derive(Args)]
pub struct ModelArgs {
    #[arg(long, help = "Model ID")]
    pub model: String,

    #[arg(long, help = "Parameters as a JSON object, e.g. '{\"status\":\"active\"}'")]
    pub params: Option<String>,

    #[arg(
        long,
        help = "If specified, writes the JSON result to this file instead of stdout"
    )]
    pub output: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(long, help = "Model ID", required_unless_present = "code", conflicts_with = "code")]
    pub model: Option<String>,

    #[arg(long, help = "Model code, looked up instead of --model")]
    pub code: Option<String>,

    #[arg(long, help = "Parameters as a JSON object, e.g. '{\"status\":\"active\"}'")]
    pub params: Option<String>,

    #[arg(
        long,
        help = "Extra WHERE filters as a JSON array of {table_name, column_name, operator, value}"
    )]
    pub filters: Option<String>,

    #[arg(
        long,
        help = "If specified, writes the JSON result to this file instead of stdout"
    )]
    pub output: Option<String>,
}

#[derive(Subcommand)]
pub enum SourceCommand {
    /// List the schemas the connection can see
    Schemas {
        #[arg(long)]
        conn: String,
    },
    Tables {
        #[arg(long)]
        conn: String,

        #[arg(long, help = "Schema to list; defaults to the connection's current one")]
        schema: Option<String>,
    },
    Columns {
        #[arg(long)]
        conn: String,

        #[arg(long)]
        table: String,
    },
    Indexes {
        #[arg(long)]
        conn: String,

        #[arg(long)]
        table: String,
    },
    Preview {
        #[arg(long)]
        conn: String,

        #[arg(long)]
        table: String,

        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

impl SourceCommand {
    pub fn conn(&self) -> &str {
        match self {
            SourceCommand::Schemas { conn }
            | SourceCommand::Tables { conn, .. }
            | SourceCommand::Columns { conn, .. }
            | SourceCommand::Indexes { conn, .. }
            | SourceCommand::Preview { conn, .. } => conn,
        }
    }
}
