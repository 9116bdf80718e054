use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use bookwright_adapters::{AdapterError, ApiClient, FallbackRequest};
use bookwright_core::{
    BookStore, BookUpdate, CharacterDraft, CharacterId, CharacterUpdate, Config, ConfigError,
    ConfigStore, GenerationEngine, GenerationError, GenerationMode, LogLevel, LogRecord, LogSink,
    Manuscript, ManuscriptError, PageLayout, StdoutLogSink, StoreError, UnknownVariant,
};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let sink = StdoutLogSink::new();

    match cli.command {
        Command::Book(command) => handle_book(&cli.config, command),
        Command::Character(command) => handle_character(&cli.config, command),
        Command::Mode(args) => run_set_mode(&cli.config, args),
        Command::Outline(command) => handle_outline(&cli.config, command, &sink),
        Command::Chapter(command) => handle_chapter(&cli.config, command, &sink),
        Command::Status => run_status(&cli.config),
        Command::Reset(command) => handle_reset(&cli.config, command),
        Command::Export(args) => run_export(&cli.config, args),
        Command::Fallback(args) => run_fallback(&cli.config, args, &sink),
    }
}

fn handle_book(config_path: &Path, command: BookCommand) -> Result<(), CliError> {
    match command {
        BookCommand::Show => run_book_show(config_path),
        BookCommand::Set(args) => run_book_set(config_path, args),
    }
}

fn handle_character(config_path: &Path, command: CharacterCommand) -> Result<(), CliError> {
    match command {
        CharacterCommand::Add(args) => run_character_add(config_path, args),
        CharacterCommand::Update(args) => run_character_update(config_path, args),
        CharacterCommand::Remove(args) => run_character_remove(config_path, args),
        CharacterCommand::List => run_character_list(config_path),
    }
}

fn handle_outline(
    config_path: &Path,
    command: OutlineCommand,
    sink: &dyn LogSink,
) -> Result<(), CliError> {
    match command {
        OutlineCommand::Generate => run_outline_generate(config_path, sink),
        OutlineCommand::List => run_outline_list(config_path),
        OutlineCommand::Edit(args) => run_outline_edit(config_path, args),
        OutlineCommand::Reset(args) => run_outline_reset(config_path, args),
    }
}

fn handle_chapter(
    config_path: &Path,
    command: ChapterCommand,
    sink: &dyn LogSink,
) -> Result<(), CliError> {
    match command {
        ChapterCommand::Generate => run_chapter_generate(config_path, sink),
        ChapterCommand::Next => run_chapter_next(config_path, sink),
    }
}

fn handle_reset(config_path: &Path, command: ResetCommand) -> Result<(), CliError> {
    match command {
        ResetCommand::Generation(args) => run_reset_generation(config_path, args),
        ResetCommand::All(args) => run_reset_all(config_path, args),
    }
}

fn load_config(config_path: &Path) -> Result<Config, CliError> {
    Ok(ConfigStore::open(config_path.to_path_buf())?
        .config()
        .clone())
}

fn open_store(config: &Config) -> Result<BookStore, CliError> {
    Ok(BookStore::open(config.library_path())?)
}

fn run_book_show(config_path: &Path) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let book = store.book();

    println!("Title:    {}", display_or_dash(&book.title));
    println!("Genre:    {}", display_or_dash(&book.genre));
    println!("Tone:     {}", book.tone);
    println!("Chapters: {}", book.chapters);
    println!("Setting:  {}", display_or_dash(&book.setting));
    println!("World:    {}", display_or_dash(&book.world_description));
    println!("Plot:     {}", display_or_dash(&book.plot_summary));
    println!(
        "Characters: {} | Outlines: {} | Generated: {} | Mode: {}",
        book.characters.len(),
        store.outlines().len(),
        store.chapters().len(),
        store.mode()
    );
    Ok(())
}

fn run_book_set(config_path: &Path, args: BookSetArgs) -> Result<(), CliError> {
    let update = BookUpdate {
        title: args.title,
        genre: args.genre,
        tone: args.tone.as_deref().map(str::parse).transpose()?,
        chapters: args.chapters,
        plot_summary: args.plot,
        setting: args.setting,
        world_description: args.world,
    };
    if update.is_empty() {
        return Err(CliError::NothingToSet);
    }

    let config = load_config(config_path)?;
    let mut store = open_store(&config)?;
    store.update_book(update)?;
    println!("Book configuration updated.");
    Ok(())
}

fn run_character_add(config_path: &Path, args: CharacterAddArgs) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let mut store = open_store(&config)?;

    let draft = CharacterDraft {
        name: args.name,
        backstory: args.backstory.unwrap_or_default(),
        role: args
            .role
            .as_deref()
            .map(str::parse)
            .transpose()?
            .unwrap_or_default(),
        archetype: args
            .archetype
            .as_deref()
            .map(str::parse)
            .transpose()?
            .unwrap_or_default(),
    };
    let id = store.add_character(draft)?;
    println!("Added character with id {id}.");
    Ok(())
}

fn run_character_update(config_path: &Path, args: CharacterUpdateArgs) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let mut store = open_store(&config)?;

    let update = CharacterUpdate {
        name: args.name,
        backstory: args.backstory,
        role: args.role.as_deref().map(str::parse).transpose()?,
        archetype: args.archetype.as_deref().map(str::parse).transpose()?,
    };
    store.update_character(CharacterId::from_value(args.id), update)?;
    println!("Character {} updated.", args.id);
    Ok(())
}

fn run_character_remove(config_path: &Path, args: CharacterRemoveArgs) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let mut store = open_store(&config)?;
    let removed = store.remove_character(CharacterId::from_value(args.id))?;
    println!("Removed character `{}`.", display_or_dash(&removed.name));
    Ok(())
}

fn run_character_list(config_path: &Path) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;

    if store.book().characters.is_empty() {
        println!("No characters added yet.");
        return Ok(());
    }
    for character in &store.book().characters {
        println!(
            "#{} {} | {} ({})",
            character.id,
            display_or_dash(&character.name),
            character.role,
            character.archetype
        );
        if !character.backstory.trim().is_empty() {
            println!("    {}", character.backstory.trim());
        }
    }
    Ok(())
}

fn run_set_mode(config_path: &Path, args: ModeArgs) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let mut store = open_store(&config)?;
    let mode: GenerationMode = args.mode.parse()?;
    store.set_mode(mode)?;
    println!("Generation mode set to {mode}.");
    Ok(())
}

fn run_outline_generate(config_path: &Path, sink: &dyn LogSink) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let mut store = open_store(&config)?;
    let client = ApiClient::from_config(&config.api)?;
    let engine = engine_from_config(&config, sink);

    let installed = engine.generate_outlines(&client, &mut store)?;
    println!("Installed {installed} chapter outlines.");
    Ok(())
}

fn run_outline_list(config_path: &Path) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;

    if store.outlines().is_empty() {
        println!("No outlines yet; run `bookwright outline generate` first.");
        return Ok(());
    }
    for (index, outline) in store.outlines().iter().enumerate() {
        let edited = store
            .original_outlines()
            .get(index)
            .is_some_and(|original| original != outline);
        println!(
            "{:>3}. [{}] {}{}",
            index + 1,
            outline.phase,
            outline.title,
            if edited { " (edited)" } else { "" }
        );
        for line in outline
            .content
            .lines()
            .filter(|line| !line.trim().is_empty())
        {
            println!("     {line}");
        }
    }
    Ok(())
}

fn run_outline_edit(config_path: &Path, args: OutlineEditArgs) -> Result<(), CliError> {
    let content = match (args.content, args.file) {
        (Some(content), None) => content,
        (None, Some(path)) => fs::read_to_string(&path).map_err(|source| CliError::Io {
            path: path.clone(),
            source,
        })?,
        _ => return Err(CliError::ContentOrFile),
    };

    let config = load_config(config_path)?;
    let mut store = open_store(&config)?;
    store.update_outline_content(index_from_number(args.number)?, content)?;
    println!("Outline {} updated.", args.number);
    Ok(())
}

fn run_outline_reset(config_path: &Path, args: OutlineResetArgs) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let mut store = open_store(&config)?;
    store.reset_outline(index_from_number(args.number)?)?;
    println!("Outline {} restored to its generated version.", args.number);
    Ok(())
}

fn run_chapter_generate(config_path: &Path, sink: &dyn LogSink) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let mut store = open_store(&config)?;
    let client = ApiClient::from_config(&config.api)?;
    let engine = engine_from_config(&config, sink);

    let generated = engine.generate_book(&client, &mut store)?;
    match store.mode() {
        GenerationMode::Auto => println!(
            "Generated {generated} chapters; {} of {} done.",
            store.chapters().len(),
            store.outlines().len()
        ),
        GenerationMode::Manual => println!(
            "Generated chapter {} of {}. Run `bookwright chapter next` to continue.",
            store.chapters().len(),
            store.outlines().len()
        ),
    }
    Ok(())
}

fn run_chapter_next(config_path: &Path, sink: &dyn LogSink) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let mut store = open_store(&config)?;
    let client = ApiClient::from_config(&config.api)?;
    let engine = engine_from_config(&config, sink);

    let number = engine.generate_next_chapter(&client, &mut store)?;
    println!("Generated chapter {number} of {}.", store.outlines().len());
    Ok(())
}

fn run_status(config_path: &Path) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let status = store.status();

    println!("Step:     {}", status.current_step);
    println!("Progress: {}%", status.progress);
    println!(
        "Chapters: {} generated of {} outlined",
        store.chapters().len(),
        store.outlines().len()
    );
    println!("Mode:     {}", store.mode());
    if let Some(error) = &status.error {
        println!("Error:    {error}");
    }
    Ok(())
}

fn run_reset_generation(config_path: &Path, args: ConfirmArgs) -> Result<(), CliError> {
    if !args.yes {
        return Err(CliError::ConfirmationRequired {
            what: "reset generation",
        });
    }
    let config = load_config(config_path)?;
    let mut store = open_store(&config)?;
    store.reset_generation()?;
    println!("Outlines, chapters and status cleared; book configuration kept.");
    Ok(())
}

fn run_reset_all(config_path: &Path, args: ConfirmArgs) -> Result<(), CliError> {
    if !args.yes {
        return Err(CliError::ConfirmationRequired { what: "reset all" });
    }
    let config = load_config(config_path)?;
    let mut store = open_store(&config)?;
    store.reset_all()?;
    println!("Everything reset to defaults.");
    Ok(())
}

fn run_export(config_path: &Path, args: ExportArgs) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;

    let manuscript = Manuscript::from_store(&store, args.author)?;
    let layout = page_layout(args.lines_per_page, args.width);
    let rendered = manuscript.render_plain(&layout);

    fs::write(&args.output, rendered).map_err(|source| CliError::Io {
        path: args.output.clone(),
        source,
    })?;
    println!(
        "Exported {} chapters to {}.",
        manuscript.chapters.len(),
        args.output.display()
    );
    Ok(())
}

fn run_fallback(
    config_path: &Path,
    args: FallbackArgs,
    sink: &dyn LogSink,
) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let client = ApiClient::from_config(&config.api)?;

    sink.log(LogRecord::new(
        LogLevel::Info,
        "Requesting a one-shot book from the legacy endpoint...",
    ));
    let request = FallbackRequest::from_book(store.book(), args.author);
    let book = client.generate_fallback_book(&request)?;
    let manuscript = book.into_manuscript();

    let layout = page_layout(args.lines_per_page, args.width);
    let rendered = manuscript.render_plain(&layout);
    match args.output {
        Some(path) => {
            fs::write(&path, rendered).map_err(|source| CliError::Io {
                path: path.clone(),
                source,
            })?;
            println!(
                "Wrote fallback book ({} chapters) to {}.",
                manuscript.chapters.len(),
                path.display()
            );
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn engine_from_config<'a>(config: &Config, sink: &'a dyn LogSink) -> GenerationEngine<'a> {
    GenerationEngine::new(sink)
        .with_chapter_delay(Duration::from_millis(config.generation.chapter_delay_ms))
}

fn page_layout(lines_per_page: Option<usize>, width: Option<usize>) -> PageLayout {
    let mut layout = PageLayout::default();
    if let Some(lines) = lines_per_page {
        layout.lines_per_page = lines;
    }
    if let Some(width) = width {
        layout.text_width = width;
    }
    layout
}

fn index_from_number(number: usize) -> Result<usize, CliError> {
    number.checked_sub(1).ok_or(CliError::OutlineNumberFromZero)
}

fn display_or_dash(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        "(not set)"
    } else {
        trimmed
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error("config file error: {0}")]
    Config(#[from] ConfigError),
    #[error("library error: {0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Generation(#[from] GenerationError),
    #[error("service client error: {0}")]
    Adapter(#[from] AdapterError),
    #[error("{0}")]
    Manuscript(#[from] ManuscriptError),
    #[error(transparent)]
    UnknownVariant(#[from] UnknownVariant),
    #[error("failed to access `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("pass at least one field to set")]
    NothingToSet,
    #[error("pass exactly one of --content or --file")]
    ContentOrFile,
    #[error("outline numbers start at 1")]
    OutlineNumberFromZero,
    #[error("`{what}` discards generated content; re-run with --yes to confirm")]
    ConfirmationRequired { what: &'static str },
}

#[derive(Parser)]
#[command(
    name = "bookwright",
    version,
    about = "AI-assisted book drafting: outline first, then chapter by chapter"
)]
struct Cli {
    /// Path of the configuration file
    #[arg(long, global = true, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show or edit the book configuration
    #[command(subcommand)]
    Book(BookCommand),
    /// Manage the character list
    #[command(subcommand)]
    Character(CharacterCommand),
    /// Switch between manual and auto generation
    Mode(ModeArgs),
    /// Generate and curate chapter outlines
    #[command(subcommand)]
    Outline(OutlineCommand),
    /// Expand outlines into full chapters
    #[command(subcommand)]
    Chapter(ChapterCommand),
    /// Show the current generation status
    Status,
    /// Discard generated content
    #[command(subcommand)]
    Reset(ResetCommand),
    /// Export the finished book as paginated text
    Export(ExportArgs),
    /// Fetch a complete mock book from the legacy one-shot endpoint
    Fallback(FallbackArgs),
}

#[derive(Subcommand)]
enum BookCommand {
    /// Print the current configuration
    Show,
    /// Update configuration fields
    Set(BookSetArgs),
}

#[derive(Args)]
struct BookSetArgs {
    /// Book title
    #[arg(long)]
    title: Option<String>,
    /// Genre or genres, free text
    #[arg(long)]
    genre: Option<String>,
    /// Overall tone (serious, humorous, dark, ...)
    #[arg(long)]
    tone: Option<String>,
    /// Number of chapters (1-100)
    #[arg(long, value_name = "N")]
    chapters: Option<u32>,
    /// Plot summary
    #[arg(long)]
    plot: Option<String>,
    /// Story setting
    #[arg(long)]
    setting: Option<String>,
    /// World description
    #[arg(long)]
    world: Option<String>,
}

#[derive(Subcommand)]
enum CharacterCommand {
    /// Add a character
    Add(CharacterAddArgs),
    /// Update a character by id
    Update(CharacterUpdateArgs),
    /// Remove a character by id
    Remove(CharacterRemoveArgs),
    /// List all characters
    List,
}

#[derive(Args)]
struct CharacterAddArgs {
    /// Character name
    #[arg(long)]
    name: String,
    /// Backstory text
    #[arg(long)]
    backstory: Option<String>,
    /// Narrative role (protagonist, antagonist, ...)
    #[arg(long)]
    role: Option<String>,
    /// Character archetype (hero, mentor, dynamic, ...)
    #[arg(long)]
    archetype: Option<String>,
}

#[derive(Args)]
struct CharacterUpdateArgs {
    /// Character id
    #[arg(long)]
    id: u64,
    /// New name
    #[arg(long)]
    name: Option<String>,
    /// New backstory
    #[arg(long)]
    backstory: Option<String>,
    /// New narrative role
    #[arg(long)]
    role: Option<String>,
    /// New archetype
    #[arg(long)]
    archetype: Option<String>,
}

#[derive(Args)]
struct CharacterRemoveArgs {
    /// Character id
    #[arg(long)]
    id: u64,
}

#[derive(Args)]
struct ModeArgs {
    /// `manual` pauses after every chapter; `auto` runs them all
    mode: String,
}

#[derive(Subcommand)]
enum OutlineCommand {
    /// Request the outline sequence for the configured book
    Generate,
    /// List the current outlines
    List,
    /// Overwrite one outline's content
    Edit(OutlineEditArgs),
    /// Restore one outline to its generated version
    Reset(OutlineResetArgs),
}

#[derive(Args)]
struct OutlineEditArgs {
    /// 1-based outline number
    #[arg(long, value_name = "N")]
    number: usize,
    /// Replacement content
    #[arg(long)]
    content: Option<String>,
    /// Read the replacement content from a file
    #[arg(long, value_name = "FILE")]
    file: Option<PathBuf>,
}

#[derive(Args)]
struct OutlineResetArgs {
    /// 1-based outline number
    #[arg(long, value_name = "N")]
    number: usize,
}

#[derive(Subcommand)]
enum ChapterCommand {
    /// Generate chapters according to the current mode
    Generate,
    /// Manual mode: generate the next chapter
    Next,
}

#[derive(Subcommand)]
enum ResetCommand {
    /// Clear outlines and chapters, keep the book configuration
    Generation(ConfirmArgs),
    /// Clear everything, including the book configuration
    All(ConfirmArgs),
}

#[derive(Args)]
struct ConfirmArgs {
    /// Confirm the destructive reset
    #[arg(long)]
    yes: bool,
}

#[derive(Args)]
struct ExportArgs {
    /// Author attribution on the title page
    #[arg(long, default_value = "Anonymous Author")]
    author: String,
    /// Output file
    #[arg(long, value_name = "FILE")]
    output: PathBuf,
    /// Lines per page
    #[arg(long, value_name = "N")]
    lines_per_page: Option<usize>,
    /// Text width in characters
    #[arg(long, value_name = "N")]
    width: Option<usize>,
}

#[derive(Args)]
struct FallbackArgs {
    /// Author attribution
    #[arg(long, default_value = "Anonymous Author")]
    author: String,
    /// Write the book to a file instead of stdout
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
    /// Lines per page
    #[arg(long, value_name = "N")]
    lines_per_page: Option<usize>,
    /// Text width in characters
    #[arg(long, value_name = "N")]
    width: Option<usize>,
}
