//! Recycling Notes CLI
//!
//! Drives the PRN/PERN issuance workflow against the EPR backend: one
//! subcommand per page step, with the per-user session persisted between
//! invocations the way a browser session would be.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use recycling_notes::backend::create_backend;
use recycling_notes::note::{AccreditationScope, Note};
use recycling_notes::session::SessionStore;
use recycling_notes::workflow::{
    CheckOutcome, CreateForm, CreateOutcome, NoteWorkflow, Page, Redirect,
};
use recycling_notes::{config, Config};

#[derive(Parser)]
#[command(name = "recycling-notes")]
#[command(author, version, about = "Packaging recycling note issuance workflow")]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Bearer token for the backend API
    #[arg(long, global = true, env = "RECYCLING_NOTES_TOKEN")]
    token: Option<String>,

    /// Issuing organisation ID (overrides config)
    #[arg(long, global = true)]
    organisation: Option<String>,

    /// Registration ID (overrides config)
    #[arg(long, global = true)]
    registration: Option<String>,

    /// Accreditation ID (overrides config)
    #[arg(long, global = true)]
    accreditation: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a draft note and hold it in the session for review
    Create {
        /// Tonnage as a positive whole number
        #[arg(long)]
        tonnage: String,

        /// Recipient organisation ID
        #[arg(long)]
        recipient: String,

        /// Optional issuer notes
        #[arg(long, default_value = "")]
        notes: String,

        /// Material classification from the registration
        #[arg(long, default_value = "glass")]
        material: String,

        /// Nation classification from the registration
        #[arg(long, default_value = "england")]
        nation: String,

        /// Waste processing type (reprocessor or exporter)
        #[arg(long, default_value = "reprocessor")]
        processing_type: String,
    },

    /// Review a draft from the session, or view an existing note
    Check {
        /// Note ID
        note_id: String,
    },

    /// Confirm a reviewed draft (re-checks the waste balance)
    Confirm {
        /// Note ID
        note_id: String,
    },

    /// Issue an authorised note to its recipient
    Issue {
        /// Note ID
        note_id: String,
    },

    /// Delete a note that has not yet been issued
    Delete {
        /// Note ID
        note_id: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Confirm a cancellation the recipient requested
    Cancel {
        /// Note ID
        note_id: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Discard the in-progress draft
    Discard {
        /// Note ID
        note_id: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Show the post-confirmation success page
    Created {
        /// Note ID
        note_id: String,
    },

    /// Show the post-issue success page
    Issued {
        /// Note ID
        note_id: String,
    },

    /// List notes with the current waste balance
    List,

    /// Initialize .recycling-notes directory
    Init,

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load config
    let config = Config::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Init => {
            config::init()?;
            println!("Initialized .recycling-notes directory");
            return Ok(());
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
            return Ok(());
        }
        _ => {}
    }

    // Every note page sits behind the feature gate; checked once here,
    // at the dispatch boundary.
    config.ensure_notes_enabled()?;

    let scope = resolve_scope(&cli, &config)?;
    let token = cli
        .token
        .context("A bearer token is required (--token or RECYCLING_NOTES_TOKEN)")?;

    let backend = create_backend(&config, &token)?;
    let workflow = NoteWorkflow::new(
        backend.clone(),
        backend.clone(),
        backend.clone(),
        backend.clone(),
    );

    let session_path = config.session_path();
    let mut session = SessionStore::load(&session_path)?;

    match cli.command {
        Commands::Create {
            tonnage,
            recipient,
            notes,
            material,
            nation,
            processing_type,
        } => {
            let form = CreateForm {
                tonnage,
                recipient,
                notes,
                material,
                nation,
                waste_processing_type: processing_type,
            };

            match workflow.create(&scope, form, &mut session).await? {
                CreateOutcome::Created { redirect } => {
                    println!("Draft created");
                    print_redirect(&redirect, &scope);
                }
                CreateOutcome::Invalid { errors, .. } => {
                    println!("The form has errors:");
                    for (field, key) in errors.iter() {
                        println!("  {:?}: {:?}", field, key);
                    }
                }
            }
        }

        Commands::Check { note_id } => match workflow.check(&scope, &note_id, &session).await? {
            CheckOutcome::Review { draft } => {
                println!("Check your answers before creating:");
                println!("  Issued to: {}", draft.recipient_name);
                println!("  Tonnage:   {} ({})", draft.tonnage, draft.tonnage_in_words);
                println!("  Material:  {}", draft.material);
                if !draft.notes.is_empty() {
                    println!("  Notes:     {}", draft.notes);
                }
            }
            CheckOutcome::Detail { note, context } => {
                print_note(&note);
                if let Some(accreditation) = &context.accreditation {
                    if let Some(number) = &accreditation.accreditation_number {
                        println!("  Accreditation: {}", number);
                    }
                }
            }
        },

        Commands::Confirm { note_id } => {
            let redirect = workflow.confirm(&scope, &note_id, &mut session).await?;
            match &redirect {
                Redirect::Created { .. } => println!("Note created, awaiting authorisation"),
                Redirect::Create {
                    insufficient_balance: true,
                } => println!("Insufficient waste balance; the draft was discarded"),
                _ => {}
            }
            print_redirect(&redirect, &scope);
        }

        Commands::Issue { note_id } => {
            let redirect = workflow.issue(&scope, &note_id, &mut session).await?;
            match &redirect {
                Redirect::Issued { .. } => println!("Note issued"),
                Redirect::Error => println!("The backend rejected the issue request"),
                _ => {}
            }
            print_redirect(&redirect, &scope);
        }

        Commands::Delete { note_id, force } => {
            if !force {
                match workflow.delete_page(&scope, &note_id).await? {
                    Page::Show(note) => {
                        print_note(&note);
                        if !prompt_confirm("Delete this note?")? {
                            return Ok(());
                        }
                    }
                    Page::Redirect(redirect) => {
                        print_redirect(&redirect, &scope);
                        return Ok(());
                    }
                }
            }

            let redirect = workflow.delete(&scope, &note_id).await?;
            print_redirect(&redirect, &scope);
        }

        Commands::Cancel { note_id, force } => {
            if !force {
                match workflow.cancel_page(&scope, &note_id).await? {
                    Page::Show(note) => {
                        print_note(&note);
                        if !prompt_confirm("Confirm the cancellation?")? {
                            return Ok(());
                        }
                    }
                    Page::Redirect(redirect) => {
                        print_redirect(&redirect, &scope);
                        return Ok(());
                    }
                }
            }

            let redirect = workflow.cancel(&scope, &note_id).await?;
            print_redirect(&redirect, &scope);
        }

        Commands::Discard { note_id, force } => {
            if !force {
                match workflow.discard_page(&note_id, &session) {
                    Page::Show(draft) => {
                        println!(
                            "Draft for {} ({} tonnes of {})",
                            draft.recipient_name, draft.tonnage, draft.material
                        );
                        if !prompt_confirm("Discard this draft?")? {
                            return Ok(());
                        }
                    }
                    Page::Redirect(redirect) => {
                        print_redirect(&redirect, &scope);
                        return Ok(());
                    }
                }
            }

            let redirect = workflow.discard(&scope, &note_id, &mut session).await?;
            print_redirect(&redirect, &scope);
        }

        Commands::Created { note_id } => match workflow.created_page(&note_id, &mut session) {
            Page::Show(created) => {
                let note_type = created.waste_processing_type.note_type();
                println!("{} created", note_type);
                println!("  Tonnage: {} tonnes of {}", created.tonnage, created.material);
                println!("  Status:  {}", created.status.label());
            }
            Page::Redirect(redirect) => print_redirect(&redirect, &scope),
        },

        Commands::Issued { note_id } => {
            match workflow.issued_page(&scope, &note_id, &mut session).await? {
                Page::Show(view) => {
                    let note_type = view.note.waste_processing_type.note_type();
                    println!(
                        "{} issued to {}",
                        note_type,
                        view.note.issued_to_organisation.display_name()
                    );
                    match &view.prn_number {
                        Some(number) => println!("  {} number: {}", note_type, number),
                        None => println!("  {} number: pending", note_type),
                    }
                }
                Page::Redirect(redirect) => print_redirect(&redirect, &scope),
            }
        }

        Commands::List => {
            let view = workflow.list(&scope).await?;
            match view.balance {
                Some(balance) => {
                    println!("Waste balance: {} tonnes available", balance.available_amount)
                }
                None => println!("Waste balance: unavailable"),
            }
            for note in &view.notes {
                println!(
                    "  {}  {:<24} {:>6}t  {}",
                    note.id,
                    note.status.label(),
                    note.tonnage,
                    note.issued_to_organisation.display_name()
                );
            }
        }

        Commands::Init | Commands::Config => unreachable!("handled before dispatch"),
    }

    session.save(&session_path)?;
    info!("Session saved");

    Ok(())
}

fn resolve_scope(cli: &Cli, config: &Config) -> anyhow::Result<AccreditationScope> {
    let from_config = config.scope.as_ref();

    let organisation = cli
        .organisation
        .clone()
        .or_else(|| from_config.map(|s| s.organisation_id.clone()))
        .context("An organisation ID is required (--organisation or config)")?;
    let registration = cli
        .registration
        .clone()
        .or_else(|| from_config.map(|s| s.registration_id.clone()))
        .context("A registration ID is required (--registration or config)")?;
    let accreditation = cli
        .accreditation
        .clone()
        .or_else(|| from_config.map(|s| s.accreditation_id.clone()))
        .context("An accreditation ID is required (--accreditation or config)")?;

    Ok(AccreditationScope::new(organisation, registration, accreditation))
}

fn print_redirect(redirect: &Redirect, scope: &AccreditationScope) {
    println!("-> {}", redirect.path(scope));
}

fn print_note(note: &Note) {
    let note_type = note.waste_processing_type.note_type();
    println!("{} {}", note_type, note.id);
    if let Some(number) = &note.prn_number {
        println!("  Number:    {}", number);
    }
    println!("  Status:    {}", note.status.label());
    println!("  Issued to: {}", note.issued_to_organisation.display_name());
    println!("  Tonnage:   {} tonnes of {}", note.tonnage, note.material);
}

fn prompt_confirm(question: &str) -> anyhow::Result<bool> {
    print!("{} [y/N] ", question);
    use std::io::Write;
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}
