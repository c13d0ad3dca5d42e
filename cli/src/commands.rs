use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "campaigner")]
#[command(about = "Manage contacts, tags, organizations, fields and lists of a CRM account")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub connection: Connection,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Args)]
pub struct Connection {
    /// Account API address, e.g. https://acme.api-us1.com
    #[arg(long, env = "AC_BASE_URL", hide_env_values = true, global = true)]
    pub base_url: Option<String>,

    /// API token sent with every request
    #[arg(long, env = "AC_API_TOKEN", hide_env_values = true, global = true)]
    pub api_token: Option<String>,
}

#[derive(Args, Clone, Copy)]
pub struct PageArgs {
    /// Page size
    #[arg(long)]
    pub limit: Option<u32>,
    /// Records to skip
    #[arg(long)]
    pub offset: Option<u32>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Contact operations
    Contact {
        #[command(subcommand)]
        action: ContactCommands,
    },
    /// Tag operations
    Tag {
        #[command(subcommand)]
        action: TagCommands,
    },
    /// Organization operations
    Org {
        #[command(subcommand)]
        action: OrgCommands,
    },
    /// Custom field operations
    Field {
        #[command(subcommand)]
        action: FieldCommands,
    },
    /// List operations
    List {
        #[command(subcommand)]
        action: ListCommands,
    },
    /// Print PHP constants for every tag, field and list
    Generate {
        /// What to do when two names reduce to the same symbol
        #[arg(long, value_enum, default_value_t = OnCollision::Reject)]
        on_collision: OnCollision,
    },
}

#[derive(Subcommand)]
pub enum ContactCommands {
    /// List contacts
    List(PageArgs),
    /// Show one contact
    Read { id: u64 },
    /// Delete a contact
    Delete { id: u64 },
    /// Show the tags applied to a contact
    Tags { id: u64 },
    /// Search contacts by email
    Find { email: String },
}

#[derive(Subcommand)]
pub enum TagCommands {
    /// List tags
    List(PageArgs),
    /// Show one tag
    Read { id: u64 },
    /// Search tags by name
    Find { name: String },
    /// Create a tag
    Create {
        name: String,
        description: String,
        #[arg(long = "type", value_enum, default_value_t = TagKind::Contact)]
        tag_type: TagKind,
    },
    /// Delete a tag
    Delete { id: u64 },
}

#[derive(Subcommand)]
pub enum OrgCommands {
    /// List organizations
    List(PageArgs),
    /// Show one organization
    Read { id: u64 },
    /// Search organizations by name
    Find { name: String },
    /// Delete an organization
    Delete { id: u64 },
}

#[derive(Subcommand)]
pub enum FieldCommands {
    /// List custom fields
    List(PageArgs),
    /// Show one custom field
    Read { id: u64 },
}

#[derive(Subcommand)]
pub enum ListCommands {
    /// List mailing lists
    List(PageArgs),
    /// Show one list
    Read { id: u64 },
    /// Subscribe a contact to a list
    AddContact { list: u64, contact: u64 },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum TagKind {
    Contact,
    Template,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OnCollision {
    Reject,
    KeepFirst,
    KeepAll,
}
