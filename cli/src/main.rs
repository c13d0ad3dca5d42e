mod commands;

use anyhow::{Context, Result};
use campaigner_core::types::NewTag;
use campaigner_core::{
    Campaigner, CollisionPolicy, Config, Contact, Field, Generator, Id, List, Organization,
    Pagination, Tag, TagType, UreqTransport,
};
use clap::Parser;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    Cli, Commands, ContactCommands, FieldCommands, ListCommands, OnCollision, OrgCommands,
    PageArgs, TagCommands, TagKind,
};

fn main() -> Result<()> {
    // load environment variables from .env file, if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = Config::new(
        cli.connection.base_url.unwrap_or_default(),
        cli.connection.api_token.unwrap_or_default(),
    );
    debug!(?config, "starting");
    let client = Campaigner::new(&config, UreqTransport::new()).context("invalid configuration")?;

    run(&client, cli.command)
}

/// Logs go to stderr so generated output on stdout stays clean.
fn setup_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn page(args: PageArgs) -> Pagination {
    Pagination::new(args.limit, args.offset)
}

fn deleted(kind: &str, id: u64) -> Result<()> {
    print(&serde_json::json!({ "deleted": kind, "id": id }))
}

fn run(client: &Campaigner<UreqTransport>, command: Commands) -> Result<()> {
    match command {
        Commands::Contact { action } => match action {
            ContactCommands::List(args) => print(&client.list::<Contact>(page(args))?),
            ContactCommands::Read { id } => print(&client.read::<Contact>(Id::new(id))?),
            ContactCommands::Delete { id } => {
                client.delete::<Contact>(Id::new(id))?;
                deleted("contact", id)
            }
            ContactCommands::Tags { id } => print(&client.contact_tags(Id::new(id))?),
            ContactCommands::Find { email } => print(&client.find::<Contact>(&email)?),
        },
        Commands::Tag { action } => match action {
            TagCommands::List(args) => print(&client.list::<Tag>(page(args))?),
            TagCommands::Read { id } => print(&client.read::<Tag>(Id::new(id))?),
            TagCommands::Find { name } => print(&client.find::<Tag>(&name)?),
            TagCommands::Create {
                name,
                description,
                tag_type,
            } => {
                let tag_type = match tag_type {
                    TagKind::Contact => TagType::Contact,
                    TagKind::Template => TagType::Template,
                };
                print(&client.create::<Tag>(&NewTag::new(name, description, tag_type))?)
            }
            TagCommands::Delete { id } => {
                client.delete::<Tag>(Id::new(id))?;
                deleted("tag", id)
            }
        },
        Commands::Org { action } => match action {
            OrgCommands::List(args) => print(&client.list::<Organization>(page(args))?),
            OrgCommands::Read { id } => print(&client.read::<Organization>(Id::new(id))?),
            OrgCommands::Find { name } => print(&client.find::<Organization>(&name)?),
            OrgCommands::Delete { id } => {
                client.delete::<Organization>(Id::new(id))?;
                deleted("organization", id)
            }
        },
        Commands::Field { action } => match action {
            FieldCommands::List(args) => print(&client.list::<Field>(page(args))?),
            FieldCommands::Read { id } => print(&client.read::<Field>(Id::new(id))?),
        },
        Commands::List { action } => match action {
            ListCommands::List(args) => print(&client.list::<List>(page(args))?),
            ListCommands::Read { id } => print(&client.read::<List>(Id::new(id))?),
            ListCommands::AddContact { list, contact } => {
                print(&client.contact_list_add(Id::new(list), Id::new(contact))?)
            }
        },
        Commands::Generate { on_collision } => {
            let policy = match on_collision {
                OnCollision::Reject => CollisionPolicy::Reject,
                OnCollision::KeepFirst => CollisionPolicy::KeepFirst,
                OnCollision::KeepAll => CollisionPolicy::KeepAll,
            };
            let php = Generator::new(policy)?.generate(client)?;
            print!("{php}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_nested_subcommands() {
        let cli = Cli::try_parse_from([
            "campaigner",
            "--api-token",
            "t",
            "--base-url",
            "http://localhost:3000",
            "list",
            "add-contact",
            "3",
            "9",
        ])
        .unwrap();
        assert_eq!(cli.connection.api_token.as_deref(), Some("t"));
        assert!(matches!(
            cli.command,
            Commands::List {
                action: ListCommands::AddContact { list: 3, contact: 9 }
            }
        ));
    }

    #[test]
    fn generate_defaults_to_reject() {
        let cli = Cli::try_parse_from(["campaigner", "generate"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Generate {
                on_collision: OnCollision::Reject
            }
        ));

        let cli = Cli::try_parse_from(["campaigner", "generate", "--on-collision", "keep-first"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Generate {
                on_collision: OnCollision::KeepFirst
            }
        ));
    }

    #[test]
    fn tag_create_accepts_type() {
        let cli = Cli::try_parse_from([
            "campaigner",
            "tag",
            "create",
            "VIP",
            "Top",
            "--type",
            "template",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Tag {
                action: TagCommands::Create {
                    tag_type: TagKind::Template,
                    ..
                }
            }
        ));
    }
}
